use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a scoring player (never negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

/// Identifier of a spectator; exposed on the wire as a negative number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpectatorId(pub u32);

/// Identifier of an answer slot, used as `aid` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Someone who can cast votes
///
/// Spectators are a separate variant rather than players with a special ID.
/// Ordering puts every named player before any spectator, which keeps vote
/// listings stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Voter {
    Player(PlayerId),
    Spectator(SpectatorId),
}

impl Voter {
    /// Wire identity: players keep their ID, spectators map to `-(id + 1)`
    pub fn wire_id(&self) -> i64 {
        match self {
            Voter::Player(id) => i64::from(id.0),
            Voter::Spectator(id) => -(i64::from(id.0) + 1),
        }
    }
}

/// Colours that can be used to assign a player
pub const COLOURS: [&str; 10] = [
    "#ff6666", "#66ff99", "#3366ff", "#d966ff", "#38e0ff", "#ffcc66", "#cc6600", "#cc33ff",
    "#009999", "#cccc00",
];

/// Colour of the synthetic voter that lumps all spectator votes together
pub const SPECTATOR_COLOUR: &str = "#999999";

/// Palette entry for a player ID
pub fn colour_for(id: PlayerId) -> &'static str {
    COLOURS[id.0 as usize % COLOURS.len()]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoundType {
    /// One question per player, each answered by a fixed-size responder group
    #[default]
    Normal,
    /// Every player answers the same question. Not implemented.
    Final,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RoundState {
    Building,
    Answering,
    Voting { question: usize },
    Complete,
    Cancelled,
}

impl RoundState {
    /// Whether clients should see a countdown for this state
    pub fn is_active(&self) -> bool {
        matches!(self, RoundState::Answering | RoundState::Voting { .. })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Display,
    Player,
    Spectator,
}
