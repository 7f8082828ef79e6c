//! WebSocket message dispatch
//!
//! Entry point for every parsed client message. Host-only commands are
//! checked here and then handed to the role-specific handler modules.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{PlayerId, Role, Voter};
use std::net::IpAddr;
use std::sync::Arc;

use super::{host, player};

/// Per-connection identity
#[derive(Debug, Clone)]
pub struct Session {
    pub role: Role,
    pub ip: IpAddr,
    /// Set by a successful `join`; answers and votes are attributed to it
    pub participant: Option<Voter>,
}

impl Session {
    pub fn new(role: Role, ip: IpAddr) -> Self {
        Self {
            role,
            ip,
            participant: None,
        }
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        match self.participant {
            Some(Voter::Player(id)) => Some(id),
            _ => None,
        }
    }
}

/// Macro to check host authorization and return early if unauthorized
macro_rules! check_host {
    ($session:expr, $action:expr) => {
        if $session.role != Role::Host {
            return Some(ServerMessage::Error {
                code: "UNAUTHORIZED".to_string(),
                msg: format!("Only host can {}", $action),
            });
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    session: &mut Session,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join { name } => player::handle_join(state, session, name).await,

        ClientMessage::Answer { aid, answer } => {
            player::handle_answer(state, session, aid, answer).await
        }

        ClientMessage::Vote { aid } => player::handle_vote(state, session, aid).await,

        ClientMessage::Info => Some(ServerMessage::Info(state.info().await)),

        // Host-only commands
        ClientMessage::HostStartRound { round_type, name } => {
            check_host!(session, "start rounds");
            host::handle_start_round(state, round_type, name).await
        }

        ClientMessage::HostEndRound => {
            check_host!(session, "end rounds");
            host::handle_end_round(state).await
        }

        ClientMessage::HostRemovePlayer { pid } => {
            check_host!(session, "remove players");
            host::handle_remove_player(state, pid).await
        }

        ClientMessage::HostAddPrompts { prompts } => {
            check_host!(session, "add prompts");
            host::handle_add_prompts(state, prompts).await
        }
    }
}
