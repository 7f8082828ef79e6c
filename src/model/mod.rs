//! Game data model: players, answers, questions and rounds
//!
//! Everything here is synchronous and free of I/O. Locking, timing and
//! broadcasting live in `state`.

pub mod answer;
pub mod player;
pub mod question;
pub mod round;
pub mod score;

pub use answer::{Answer, VoteBreakdown, DID_NOT_ANSWER};
pub use player::{Player, Spectator, VoteBudget};
pub use question::{Question, Slot};
pub use round::Round;
pub use score::{Score, ScoringPolicy, VoteShare};
