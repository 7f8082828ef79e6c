use crate::types::{colour_for, AnswerId, PlayerId, SpectatorId, Voter};
use std::net::IpAddr;

/// Remaining votes for one participant in the current round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteBudget {
    left: u32,
}

impl VoteBudget {
    pub fn new(votes: u32) -> Self {
        Self { left: votes }
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    /// Use one vote; false when nothing is left
    pub fn try_spend(&mut self) -> bool {
        if self.left == 0 {
            return false;
        }
        self.left -= 1;
        true
    }

    pub fn reset(&mut self, votes: u32) {
        self.left = votes;
    }
}

/// A scoring participant
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Address the player connected from, used to reconnect
    pub ip: IpAddr,
    pub color: &'static str,
    pub budget: VoteBudget,
    /// Answers submitted in the current round
    pub answers: Vec<AnswerId>,
    /// Points accumulated over the whole game
    pub points: i64,
}

impl Player {
    pub fn new(id: PlayerId, name: String, ip: IpAddr) -> Self {
        Self {
            id,
            name,
            ip,
            color: colour_for(id),
            budget: VoteBudget::default(),
            answers: Vec::new(),
            points: 0,
        }
    }

    pub fn voter(&self) -> Voter {
        Voter::Player(self.id)
    }

    pub fn has_submitted(&self) -> bool {
        !self.answers.is_empty()
    }

    pub(crate) fn note_submitted(&mut self, aid: AnswerId) {
        if !self.answers.contains(&aid) {
            self.answers.push(aid);
        }
    }

    /// Prepare for a new round: fresh budget, no answers
    pub fn reset_for_round(&mut self, votes: u32) {
        self.budget.reset(votes);
        self.answers.clear();
    }
}

/// A non-scoring participant whose votes are shown lumped together
#[derive(Debug, Clone)]
pub struct Spectator {
    pub id: SpectatorId,
    pub name: String,
    pub ip: IpAddr,
    pub budget: VoteBudget,
}

impl Spectator {
    pub fn new(id: SpectatorId, name: String, ip: IpAddr) -> Self {
        Self {
            id,
            name,
            ip,
            budget: VoteBudget::default(),
        }
    }

    pub fn voter(&self) -> Voter {
        Voter::Spectator(self.id)
    }
}
