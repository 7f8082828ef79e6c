use super::answer::Answer;
use super::score::ScoringPolicy;
use crate::error::{GameError, GameResult};
use crate::ids::IdAllocator;
use crate::types::{AnswerId, PlayerId};

/// A responder and the answer ID reserved for them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub player: PlayerId,
    pub aid: AnswerId,
}

/// One prompt, its fixed responder group and the answers they produced
#[derive(Debug, Clone)]
pub struct Question {
    prompt: String,
    slots: Vec<Slot>,
    answers: Vec<Answer>,
    tallied: bool,
}

impl Question {
    /// Create a question for `responders`, reserving one answer ID each
    ///
    /// The `Answer` records themselves appear only once a responder submits.
    pub fn new(prompt: String, responders: &[PlayerId], ids: &IdAllocator) -> GameResult<Self> {
        let mut slots: Vec<Slot> = Vec::with_capacity(responders.len());
        for &player in responders {
            if slots.iter().any(|s| s.player == player) {
                return Err(GameError::DuplicateResponder(player));
            }
            slots.push(Slot {
                player,
                aid: ids.next_answer(),
            });
        }

        Ok(Self {
            prompt,
            slots,
            answers: Vec::new(),
            tallied: false,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn responders(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.slots.iter().map(|s| s.player)
    }

    pub fn owns(&self, aid: AnswerId) -> bool {
        self.slots.iter().any(|s| s.aid == aid)
    }

    /// Answers collected so far, in submission order
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn answer_mut(&mut self, aid: AnswerId) -> Option<&mut Answer> {
        self.answers.iter_mut().find(|a| a.id() == aid)
    }

    pub fn is_tallied(&self) -> bool {
        self.tallied
    }

    /// Create or overwrite `player`'s answer in slot `aid`
    pub fn record_answer(
        &mut self,
        player: PlayerId,
        aid: AnswerId,
        text: &str,
        max_chars: usize,
    ) -> GameResult<AnswerId> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.aid == aid)
            .ok_or(GameError::UnknownAnswer(aid))?;
        if slot.player != player {
            return Err(GameError::NotAResponder { player, aid });
        }

        match self.answers.iter_mut().find(|a| a.id() == aid) {
            Some(answer) => answer.set_text(text, max_chars),
            None => {
                let mut answer = Answer::new(aid, player);
                answer.set_text(text, max_chars);
                self.answers.push(answer);
            }
        }
        Ok(aid)
    }

    /// Score every answer once voting on this question is over
    ///
    /// Returns the points earned by each author. A second call is rejected so
    /// points are never awarded twice.
    pub fn tally(
        &mut self,
        total_players: usize,
        policy: &dyn ScoringPolicy,
    ) -> GameResult<Vec<(PlayerId, i64)>> {
        if self.tallied {
            return Err(GameError::AlreadyTallied);
        }
        self.tallied = true;

        Ok(self
            .answers
            .iter_mut()
            .map(|answer| {
                answer.compute_score(policy, total_players);
                (answer.author(), answer.score())
            })
            .collect())
    }
}
