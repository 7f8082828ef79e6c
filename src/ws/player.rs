//! Participant message handlers: joining, answering and voting

use super::handlers::Session;
use crate::error::GameError;
use crate::model::{Player, Spectator};
use crate::protocol::ServerMessage;
use crate::state::{AppState, VoteResult};
use crate::types::{AnswerId, Role, Voter, SPECTATOR_COLOUR};
use std::sync::Arc;

pub async fn handle_join(
    state: &Arc<AppState>,
    session: &mut Session,
    name: String,
) -> Option<ServerMessage> {
    // A bound connection keeps its identity; joining again only re-sends it
    match session.participant {
        Some(Voter::Player(pid)) => {
            if let Some(player) = state.player(pid).await {
                state.resend_pending(pid).await;
                return Some(joined_player(&player));
            }
        }
        Some(Voter::Spectator(id)) => {
            if let Some(spectator) = state.spectator(id).await {
                return Some(joined_spectator(&spectator));
            }
        }
        None => {}
    }

    match session.role {
        Role::Player => {
            let (player, reconnected) = state.join_player(&name, session.ip).await;
            session.participant = Some(player.voter());
            if reconnected {
                let resent = state.resend_pending(player.id).await;
                tracing::debug!("Re-sent {} pending messages to {}", resent, player.name);
            }
            Some(joined_player(&player))
        }
        Role::Spectator => {
            let (spectator, _) = state.join_spectator(&name, session.ip).await;
            session.participant = Some(spectator.voter());
            Some(joined_spectator(&spectator))
        }
        Role::Host | Role::Display => Some(ServerMessage::Error {
            code: "UNAUTHORIZED".to_string(),
            msg: "Only players and spectators can join".to_string(),
        }),
    }
}

fn joined_player(player: &Player) -> ServerMessage {
    ServerMessage::Joined {
        pid: player.voter().wire_id(),
        name: player.name.clone(),
        color: player.color.to_string(),
    }
}

fn joined_spectator(spectator: &Spectator) -> ServerMessage {
    ServerMessage::Joined {
        pid: spectator.voter().wire_id(),
        name: spectator.name.clone(),
        color: SPECTATOR_COLOUR.to_string(),
    }
}

pub async fn handle_answer(
    state: &Arc<AppState>,
    session: &Session,
    aid: AnswerId,
    answer: String,
) -> Option<ServerMessage> {
    let result = match session.participant {
        Some(Voter::Player(pid)) => state.submit_answer(pid, aid, &answer).await,
        Some(Voter::Spectator(_)) => Err(GameError::UnknownParticipant),
        None => Err(GameError::NotJoined),
    };

    match result {
        Ok(()) => Some(ServerMessage::AnswerAck { aid }),
        Err(e) => {
            tracing::warn!("Answer for {} rejected: {}", aid, e);
            Some(ServerMessage::error(&e))
        }
    }
}

pub async fn handle_vote(
    state: &Arc<AppState>,
    session: &Session,
    aid: AnswerId,
) -> Option<ServerMessage> {
    let Some(voter) = session.participant else {
        return Some(ServerMessage::error(&GameError::NotJoined));
    };

    match state.submit_vote(voter, aid).await {
        Ok(VoteResult::Recorded { count, votes_left }) => Some(ServerMessage::VoteAck {
            aid,
            count,
            votes_left,
        }),
        Ok(VoteResult::NoBudget) => Some(ServerMessage::VoteAck {
            aid,
            count: 0,
            votes_left: 0,
        }),
        Err(e) => {
            tracing::warn!("Vote for {} rejected: {}", aid, e);
            Some(ServerMessage::error(&e))
        }
    }
}
