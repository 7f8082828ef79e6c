use crate::types::{AnswerId, PlayerId, RoundState, RoundType};

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors that can occur while building or running a round
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("{0:?} rounds are not implemented")]
    Unsupported(RoundType),

    #[error("Need at least {needed} players, only {available} joined")]
    NotEnoughPlayers { needed: usize, available: usize },

    #[error("Need {needed} prompts, pool only has {available}")]
    NotEnoughPrompts { needed: usize, available: usize },

    #[error("Player {0} assigned twice to the same question")]
    DuplicateResponder(PlayerId),

    #[error("Player {player} is not assigned to answer {aid}")]
    NotAResponder { player: PlayerId, aid: AnswerId },

    #[error("No answer with id {0}")]
    UnknownAnswer(AnswerId),

    #[error("Unknown player")]
    UnknownParticipant,

    #[error("Join the game first")]
    NotJoined,

    #[error("Answers are not being accepted right now")]
    AnsweringClosed,

    #[error("Voting is not open")]
    VotingClosed,

    #[error("Answer {0} is not part of the question being voted on")]
    NotCurrentQuestion(AnswerId),

    #[error("Question has already been tallied")]
    AlreadyTallied,

    #[error("Invalid round transition from {from:?} to {to}")]
    InvalidTransition { from: RoundState, to: &'static str },

    #[error("No round has been started")]
    NoRound,

    #[error("A round is already in progress")]
    RoundInProgress,

    #[error("Players cannot be removed while a round is running")]
    RoundActive,

    #[error("Round was cancelled")]
    Cancelled,
}

impl GameError {
    /// Stable code sent to clients in `error` messages
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Unsupported(_) => "UNSUPPORTED",
            GameError::NotEnoughPlayers { .. } => "NOT_ENOUGH_PLAYERS",
            GameError::NotEnoughPrompts { .. } => "NOT_ENOUGH_PROMPTS",
            GameError::DuplicateResponder(_) => "DUPLICATE_RESPONDER",
            GameError::NotAResponder { .. } => "NOT_A_RESPONDER",
            GameError::UnknownAnswer(_) => "UNKNOWN_ANSWER",
            GameError::UnknownParticipant => "UNKNOWN_PARTICIPANT",
            GameError::NotJoined => "NOT_JOINED",
            GameError::AnsweringClosed => "ANSWERING_CLOSED",
            GameError::VotingClosed => "VOTING_CLOSED",
            GameError::NotCurrentQuestion(_) => "NOT_CURRENT_QUESTION",
            GameError::AlreadyTallied => "ALREADY_TALLIED",
            GameError::InvalidTransition { .. } => "INVALID_TRANSITION",
            GameError::NoRound => "NO_ROUND",
            GameError::RoundInProgress => "ROUND_IN_PROGRESS",
            GameError::RoundActive => "ROUND_ACTIVE",
            GameError::Cancelled => "CANCELLED",
        }
    }
}
