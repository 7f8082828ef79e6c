//! Vote to points conversion
//!
//! Scoring is a policy object so the arithmetic can be swapped without
//! touching the round engine. Policies must be pure: the same tally and
//! player count always give the same points and label.

use super::answer::VoteBreakdown;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub points: i64,
    pub label: String,
}

pub trait ScoringPolicy: Send + Sync {
    fn score(&self, votes: &VoteBreakdown, total_players: usize) -> Score;
}

/// Default policy: a fixed number of points per vote from a named player
///
/// Spectator votes are shown but never scored. The label carries the points
/// and the share of the roster that voted for the answer at least once.
#[derive(Debug, Clone, Copy)]
pub struct VoteShare {
    pub points_per_vote: i64,
}

impl Default for VoteShare {
    fn default() -> Self {
        Self {
            points_per_vote: 100,
        }
    }
}

impl ScoringPolicy for VoteShare {
    fn score(&self, votes: &VoteBreakdown, total_players: usize) -> Score {
        let named_votes: u32 = votes.named.iter().map(|(_, count)| count).sum();
        let points = i64::from(named_votes) * self.points_per_vote;

        let share = if total_players == 0 {
            0
        } else {
            (votes.named.len() * 100 / total_players).min(100)
        };

        Score {
            points,
            label: format!("{} ({}%)", points, share),
        }
    }
}
