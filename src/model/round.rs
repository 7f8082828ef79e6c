use super::question::Question;
use super::score::ScoringPolicy;
use crate::error::{GameError, GameResult};
use crate::ids::IdAllocator;
use crate::types::{AnswerId, PlayerId, RoundState, RoundType};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

/// One round of the game
///
/// Holds the questions built for the roster and the phase state. The methods
/// here are plain state transitions; waiting and broadcasting are done by
/// whoever drives the round.
#[derive(Debug, Clone)]
pub struct Round {
    name: String,
    round_type: RoundType,
    group_size: usize,
    questions: Vec<Question>,
    state: RoundState,
    time_left: u32,
}

impl Round {
    /// Build the questions for `roster`, consuming one prompt per player
    ///
    /// Every player answers `group_size` questions and no question has the same
    /// player twice. The prompt pool is only touched once all checks pass.
    pub fn build<R: Rng + ?Sized>(
        round_type: RoundType,
        name: impl Into<String>,
        roster: &[PlayerId],
        prompts: &mut Vec<String>,
        group_size: usize,
        ids: &IdAllocator,
        rng: &mut R,
    ) -> GameResult<Self> {
        if round_type == RoundType::Final {
            return Err(GameError::Unsupported(RoundType::Final));
        }
        if group_size == 0 || group_size > roster.len() {
            return Err(GameError::NotEnoughPlayers {
                needed: group_size.max(1),
                available: roster.len(),
            });
        }
        if prompts.len() < roster.len() {
            return Err(GameError::NotEnoughPrompts {
                needed: roster.len(),
                available: prompts.len(),
            });
        }

        // Each player appears `group_size` times; groups are drawn from this
        let mut pool: Vec<PlayerId> = (0..group_size)
            .flat_map(|_| roster.iter().copied())
            .collect();
        let mut questions = Vec::with_capacity(roster.len());

        for remaining in (1..=roster.len()).rev() {
            let mut group = Vec::with_capacity(group_size);

            // A player with a copy left for every remaining question must be
            // placed now or the last draws would run out of distinct players.
            for &player in roster {
                if pool.iter().filter(|&&p| p == player).count() == remaining {
                    take_one(&mut pool, player);
                    group.push(player);
                }
            }

            while group.len() < group_size {
                let candidates: Vec<usize> = pool
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| !group.contains(*p))
                    .map(|(i, _)| i)
                    .collect();
                let &pick = candidates
                    .choose(rng)
                    .ok_or(GameError::NotEnoughPlayers {
                        needed: group_size,
                        available: roster.len(),
                    })?;
                group.push(pool.swap_remove(pick));
            }
            group.shuffle(rng);

            let prompt = prompts.remove(rng.random_range(0..prompts.len()));
            questions.push(Question::new(prompt, &group, ids)?);
        }

        let round = Self {
            name: name.into(),
            round_type,
            group_size,
            questions,
            state: RoundState::Building,
            time_left: 0,
        };
        tracing::info!(
            "Built round '{}' with {} questions",
            round.name,
            round.questions.len()
        );
        Ok(round)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn round_type(&self) -> RoundType {
        self.round_type
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_mut(&mut self, index: usize) -> Option<&mut Question> {
        self.questions.get_mut(index)
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Seconds left in the active phase
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn set_time_left(&mut self, seconds: u32) {
        self.time_left = seconds;
    }

    /// Question currently open for votes
    pub fn current_question(&self) -> Option<(usize, &Question)> {
        match self.state {
            RoundState::Voting { question } => {
                self.questions.get(question).map(|q| (question, q))
            }
            _ => None,
        }
    }

    /// Index of the question that reserved `aid`
    pub fn locate(&self, aid: AnswerId) -> Option<usize> {
        self.questions.iter().position(|q| q.owns(aid))
    }

    /// Building -> Answering; returns the phase length in seconds
    ///
    /// The length depends only on configuration and group size, never on how
    /// many answers arrive.
    pub fn begin_answering(&mut self, answer_seconds: u32) -> GameResult<u32> {
        if self.state != RoundState::Building {
            return Err(self.invalid("answering"));
        }
        let duration = answer_seconds.saturating_mul(self.group_size as u32);
        self.state = RoundState::Answering;
        self.time_left = duration;
        Ok(duration)
    }

    /// Open question `index` for votes; returns the phase length in seconds
    pub fn begin_voting(&mut self, index: usize, vote_seconds: u32) -> GameResult<u32> {
        let allowed = match self.state {
            RoundState::Answering => index == 0,
            RoundState::Voting { question } => {
                index == question + 1 && self.questions[question].is_tallied()
            }
            _ => false,
        };
        if !allowed || index >= self.questions.len() {
            return Err(self.invalid("voting"));
        }

        let answers = self.questions[index].answers().len() as u32;
        let duration = vote_seconds.saturating_mul(answers);
        self.state = RoundState::Voting { question: index };
        self.time_left = duration;
        Ok(duration)
    }

    /// Tally the question being voted on
    pub fn finish_question(
        &mut self,
        total_players: usize,
        policy: &dyn ScoringPolicy,
    ) -> GameResult<Vec<(PlayerId, i64)>> {
        let RoundState::Voting { question } = self.state else {
            return Err(self.invalid("results"));
        };
        self.time_left = 0;
        self.questions[question].tally(total_players, policy)
    }

    /// Voting on the last question -> Complete
    pub fn complete(&mut self) -> GameResult<()> {
        match self.state {
            RoundState::Voting { question }
                if question + 1 == self.questions.len() && self.questions[question].is_tallied() =>
            {
                self.state = RoundState::Complete;
                self.time_left = 0;
                Ok(())
            }
            _ => Err(self.invalid("complete")),
        }
    }

    /// Abort from any unfinished state
    pub fn cancel(&mut self) {
        if !matches!(self.state, RoundState::Complete | RoundState::Cancelled) {
            self.state = RoundState::Cancelled;
            self.time_left = 0;
        }
    }

    fn invalid(&self, to: &'static str) -> GameError {
        GameError::InvalidTransition {
            from: self.state,
            to,
        }
    }
}

fn take_one(pool: &mut Vec<PlayerId>, player: PlayerId) {
    if let Some(pos) = pool.iter().position(|&p| p == player) {
        pool.swap_remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::score::VoteShare;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn roster(n: u32) -> Vec<PlayerId> {
        (0..n).map(PlayerId).collect()
    }

    fn prompts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("prompt {}", i)).collect()
    }

    #[test]
    fn test_build_assigns_distinct_groups_and_consumes_prompts() {
        for seed in 0..200 {
            for (players, group) in [(3u32, 2usize), (4, 3), (5, 2), (2, 2), (7, 4), (1, 1)] {
                let ids = IdAllocator::new();
                let roster = roster(players);
                let mut pool = prompts(players as usize + 3);
                let mut rng = StdRng::seed_from_u64(seed);

                let round = Round::build(
                    RoundType::Normal,
                    "Round 1",
                    &roster,
                    &mut pool,
                    group,
                    &ids,
                    &mut rng,
                )
                .unwrap();

                assert_eq!(round.questions().len(), players as usize);
                assert_eq!(pool.len(), 3);

                let mut used_prompts = HashSet::new();
                let mut appearances: HashMap<PlayerId, usize> = HashMap::new();
                for q in round.questions() {
                    assert!(used_prompts.insert(q.prompt().to_string()));
                    assert!(!pool.contains(&q.prompt().to_string()));
                    let responders: HashSet<_> = q.responders().collect();
                    assert_eq!(responders.len(), group);
                    for p in responders {
                        *appearances.entry(p).or_default() += 1;
                    }
                }
                assert!(appearances.values().all(|&n| n == group));
            }
        }
    }

    #[test]
    fn test_final_round_is_unsupported() {
        let ids = IdAllocator::new();
        let mut pool = prompts(5);
        let result = Round::build(
            RoundType::Final,
            "Final",
            &roster(3),
            &mut pool,
            2,
            &ids,
            &mut rand::rng(),
        );
        assert_eq!(result.unwrap_err(), GameError::Unsupported(RoundType::Final));
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_group_larger_than_roster_fails() {
        let ids = IdAllocator::new();
        let mut pool = prompts(5);
        let result = Round::build(
            RoundType::Normal,
            "R",
            &roster(2),
            &mut pool,
            3,
            &ids,
            &mut rand::rng(),
        );
        assert_eq!(
            result.unwrap_err(),
            GameError::NotEnoughPlayers {
                needed: 3,
                available: 2
            }
        );
    }

    #[test]
    fn test_short_prompt_pool_leaves_pool_untouched() {
        let ids = IdAllocator::new();
        let mut pool = prompts(2);
        let result = Round::build(
            RoundType::Normal,
            "R",
            &roster(3),
            &mut pool,
            2,
            &ids,
            &mut rand::rng(),
        );
        assert!(matches!(result, Err(GameError::NotEnoughPrompts { .. })));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_phase_sequence() {
        let ids = IdAllocator::new();
        let mut pool = prompts(3);
        let mut round = Round::build(
            RoundType::Normal,
            "R",
            &roster(2),
            &mut pool,
            2,
            &ids,
            &mut StdRng::seed_from_u64(7),
        )
        .unwrap();
        assert_eq!(round.state(), RoundState::Building);
        assert!(round.begin_voting(0, 5).is_err());

        assert_eq!(round.begin_answering(10).unwrap(), 20);
        assert_eq!(round.time_left(), 20);

        let slot = round.questions()[0].slots()[0];
        round
            .question_mut(0)
            .unwrap()
            .record_answer(slot.player, slot.aid, "hi", 80)
            .unwrap();

        assert_eq!(round.begin_voting(0, 5).unwrap(), 5);
        assert_eq!(round.current_question().map(|(i, _)| i), Some(0));
        // next question only after this one is tallied
        assert!(round.begin_voting(1, 5).is_err());
        round.finish_question(2, &VoteShare::default()).unwrap();
        assert!(round.complete().is_err());

        assert_eq!(round.begin_voting(1, 5).unwrap(), 0);
        round.finish_question(2, &VoteShare::default()).unwrap();
        round.complete().unwrap();
        assert_eq!(round.state(), RoundState::Complete);

        round.cancel();
        assert_eq!(round.state(), RoundState::Complete);
    }

    #[test]
    fn test_locate_finds_owning_question() {
        let ids = IdAllocator::new();
        let mut pool = prompts(3);
        let round = Round::build(
            RoundType::Normal,
            "R",
            &roster(3),
            &mut pool,
            2,
            &ids,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();

        for (index, q) in round.questions().iter().enumerate() {
            for slot in q.slots() {
                assert_eq!(round.locate(slot.aid), Some(index));
            }
        }
        assert_eq!(round.locate(AnswerId(10_000)), None);
    }
}
