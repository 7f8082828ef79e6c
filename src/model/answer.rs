use super::player::VoteBudget;
use super::score::ScoringPolicy;
use crate::types::{AnswerId, PlayerId, Voter};
use std::collections::BTreeMap;

/// Shown in place of an empty answer
pub const DID_NOT_ANSWER: &str = "(Did not answer)";

/// Votes on one answer split into named players and the spectator lump
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteBreakdown {
    /// Per-player counts, ordered by player ID
    pub named: Vec<(PlayerId, u32)>,
    /// Sum of every spectator vote
    pub spectators: u32,
}

/// One player's response to one question
#[derive(Debug, Clone)]
pub struct Answer {
    id: AnswerId,
    author: PlayerId,
    text: String,
    votes: BTreeMap<Voter, u32>,
    score: i64,
    score_label: String,
}

impl Answer {
    pub fn new(id: AnswerId, author: PlayerId) -> Self {
        Self {
            id,
            author,
            text: String::new(),
            votes: BTreeMap::new(),
            score: 0,
            score_label: String::new(),
        }
    }

    pub fn id(&self) -> AnswerId {
        self.id
    }

    pub fn author(&self) -> PlayerId {
        self.author
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Store the canonical (upper-case) form, cut to `max_chars` characters
    pub fn set_text(&mut self, text: &str, max_chars: usize) {
        self.text = text.trim().to_uppercase().chars().take(max_chars).collect();
    }

    pub fn is_answered(&self) -> bool {
        !self.text.is_empty()
    }

    /// Text to show on screen
    pub fn display_text(&self) -> &str {
        if self.is_answered() {
            &self.text
        } else {
            DID_NOT_ANSWER
        }
    }

    /// Cast one vote from `voter`, paid from `budget`
    ///
    /// Returns the voter's accumulated count on this answer, or 0 when the
    /// budget is exhausted (the tally is left untouched).
    pub fn vote(&mut self, voter: Voter, budget: &mut VoteBudget) -> u32 {
        if !budget.try_spend() {
            return 0;
        }
        let count = self.votes.entry(voter).or_insert(0);
        *count += 1;
        *count
    }

    pub fn votes(&self) -> &BTreeMap<Voter, u32> {
        &self.votes
    }

    pub fn num_votes(&self) -> u32 {
        self.votes.values().sum()
    }

    pub fn breakdown(&self) -> VoteBreakdown {
        let mut breakdown = VoteBreakdown::default();
        for (voter, count) in &self.votes {
            match voter {
                Voter::Player(id) => breakdown.named.push((*id, *count)),
                Voter::Spectator(_) => breakdown.spectators += count,
            }
        }
        breakdown
    }

    /// Set score and label from the current tally
    ///
    /// Overwrites rather than accumulates, so repeated calls agree.
    pub fn compute_score(&mut self, policy: &dyn ScoringPolicy, total_players: usize) {
        let score = policy.score(&self.breakdown(), total_players);
        self.score = score.points;
        self.score_label = score.label;
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn score_label(&self) -> &str {
        &self.score_label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::score::VoteShare;
    use crate::types::SpectatorId;

    #[test]
    fn test_text_is_canonical_and_truncated() {
        let mut answer = Answer::new(AnswerId(0), PlayerId(0));
        answer.set_text("  a rubber duck ", 80);
        assert_eq!(answer.text(), "A RUBBER DUCK");

        answer.set_text("abcdefgh", 4);
        assert_eq!(answer.text(), "ABCD");
    }

    #[test]
    fn test_empty_answer_renders_placeholder() {
        let mut answer = Answer::new(AnswerId(0), PlayerId(0));
        answer.set_text("   ", 80);
        assert!(!answer.is_answered());
        assert_eq!(answer.display_text(), DID_NOT_ANSWER);
    }

    #[test]
    fn test_votes_accumulate_until_budget_runs_out() {
        let mut answer = Answer::new(AnswerId(1), PlayerId(0));
        let voter = Voter::Player(PlayerId(1));
        let mut budget = VoteBudget::new(2);

        assert_eq!(answer.vote(voter, &mut budget), 1);
        assert_eq!(answer.vote(voter, &mut budget), 2);
        assert_eq!(budget.left(), 0);

        assert_eq!(answer.vote(voter, &mut budget), 0);
        assert_eq!(answer.votes().get(&voter), Some(&2));
        assert_eq!(answer.num_votes(), 2);
    }

    #[test]
    fn test_breakdown_lumps_spectators_only() {
        let mut answer = Answer::new(AnswerId(1), PlayerId(0));
        let mut plenty = VoteBudget::new(100);
        answer.vote(Voter::Player(PlayerId(2)), &mut plenty);
        answer.vote(Voter::Player(PlayerId(1)), &mut plenty);
        answer.vote(Voter::Player(PlayerId(2)), &mut plenty);
        answer.vote(Voter::Spectator(SpectatorId(0)), &mut plenty);
        answer.vote(Voter::Spectator(SpectatorId(0)), &mut plenty);
        answer.vote(Voter::Spectator(SpectatorId(7)), &mut plenty);

        let breakdown = answer.breakdown();
        assert_eq!(breakdown.named, vec![(PlayerId(1), 1), (PlayerId(2), 2)]);
        assert_eq!(breakdown.spectators, 3);
        assert_eq!(answer.num_votes(), 6);
    }

    #[test]
    fn test_compute_score_is_idempotent() {
        let mut answer = Answer::new(AnswerId(1), PlayerId(0));
        let mut budget = VoteBudget::new(5);
        answer.vote(Voter::Player(PlayerId(1)), &mut budget);
        answer.vote(Voter::Player(PlayerId(2)), &mut budget);

        let policy = VoteShare::default();
        answer.compute_score(&policy, 3);
        let first = (answer.score(), answer.score_label().to_string());
        answer.compute_score(&policy, 3);
        assert_eq!((answer.score(), answer.score_label().to_string()), first);
        assert_eq!(answer.score(), 200);
    }
}
