use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join as a player or spectator (depending on the connection role)
    Join {
        name: String,
    },
    /// Submit or replace the answer for a delivered slot
    Answer {
        aid: AnswerId,
        answer: String,
    },
    /// Vote once for an answer of the question being voted on
    Vote {
        aid: AnswerId,
    },
    /// Ask for the current info snapshot
    Info,
    // Host-only messages
    HostStartRound {
        #[serde(default)]
        round_type: RoundType,
        #[serde(default)]
        name: Option<String>,
    },
    HostEndRound,
    HostRemovePlayer {
        pid: PlayerId,
    },
    HostAddPrompts {
        prompts: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        server_now: String,
    },
    /// Sent back after a successful join; spectators get a negative `pid`
    Joined {
        pid: i64,
        name: String,
        color: String,
    },
    /// Current phase and result state
    Info(Snapshot),
    /// An answer slot delivered to its responder
    Answer {
        time: u32,
        aid: AnswerId,
        question: String,
    },
    /// The answers open for votes on the current question
    Vote {
        time: u32,
        question: String,
        answers: Vec<VoteOption>,
    },
    AnswerAck {
        aid: AnswerId,
    },
    /// `count` is the voter's running total on this answer, 0 when out of votes
    VoteAck {
        aid: AnswerId,
        count: u32,
        votes_left: u32,
    },
    /// Roster changed
    Players {
        players: Vec<NameColor>,
    },
    RoundStarted {
        name: String,
        questions: usize,
    },
    RoundEnded,
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(e: &crate::error::GameError) -> Self {
        ServerMessage::Error {
            code: e.code().to_string(),
            msg: e.to_string(),
        }
    }
}

/// The broadcastable state object
///
/// `time` is present whenever a round is counting down.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Snapshot {
    #[serde(flatten)]
    pub view: InfoView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            view: InfoView::None,
            time: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "info", rename_all = "lowercase")]
pub enum InfoView {
    None,
    /// Players that have submitted at least one answer
    Answering { players: Vec<NameColor> },
    /// Results of one question
    Question {
        question: String,
        answers: Vec<AnswerResult>,
    },
    /// Standings, `name` formatted as "<name> - <points>"
    Round { players: Vec<NameColor> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NameColor {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnswerResult {
    pub player: NameColor,
    pub answer: String,
    pub score: String,
    pub votes: Vec<VoteEntry>,
}

/// One voter's count, `value` formatted as "<name> - <count>"
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VoteEntry {
    pub value: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VoteOption {
    pub aid: AnswerId,
    pub answer: String,
}

/// Phase label shown on the game-master display
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPhase {
    Lobby,
    Answering,
    Voting,
    QuestionResults,
    RoundResults,
    Cancelled,
}

/// Events pushed to the display sink
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DisplayEvent {
    Lobby {
        players: Vec<NameColor>,
    },
    PhaseChanged {
        phase: DisplayPhase,
        snapshot: Snapshot,
    },
    Tick {
        time: u32,
        snapshot: Snapshot,
    },
}

/// A message for one player only
#[derive(Debug, Clone)]
pub struct Directed {
    pub to: PlayerId,
    pub msg: ServerMessage,
}
