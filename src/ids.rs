//! Identity allocation
//!
//! One monotonic counter per entity kind. The allocator is an ordinary value
//! handed to whatever constructs players, spectators and answers, so tests can
//! start from a fresh sequence.

use crate::types::{AnswerId, PlayerId, SpectatorId};
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Player,
    Spectator,
    Answer,
}

#[derive(Debug, Default)]
pub struct IdAllocator {
    players: AtomicU32,
    spectators: AtomicU32,
    answers: AtomicU32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next raw ID for `kind`; starts at 0 and never repeats
    pub fn next_id(&self, kind: IdKind) -> u32 {
        let counter = match kind {
            IdKind::Player => &self.players,
            IdKind::Spectator => &self.spectators,
            IdKind::Answer => &self.answers,
        };
        counter.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_player(&self) -> PlayerId {
        PlayerId(self.next_id(IdKind::Player))
    }

    pub fn next_spectator(&self) -> SpectatorId {
        SpectatorId(self.next_id(IdKind::Spectator))
    }

    pub fn next_answer(&self) -> AnswerId {
        AnswerId(self.next_id(IdKind::Answer))
    }
}
