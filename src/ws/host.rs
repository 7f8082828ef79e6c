//! Host-only command handlers
//!
//! Authorization is checked in the dispatch layer before calling these.
//! Successful commands answer through broadcasts, so most return nothing.

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{PlayerId, RoundType};
use std::sync::Arc;

pub async fn handle_start_round(
    state: &Arc<AppState>,
    round_type: RoundType,
    name: Option<String>,
) -> Option<ServerMessage> {
    tracing::info!("Host starting {:?} round", round_type);
    match state.start_round(round_type, name).await {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Could not start round: {}", e);
            Some(ServerMessage::error(&e))
        }
    }
}

pub async fn handle_end_round(state: &Arc<AppState>) -> Option<ServerMessage> {
    tracing::info!("Host ending round");
    state.end_round().await.err().map(|e| ServerMessage::error(&e))
}

pub async fn handle_remove_player(state: &Arc<AppState>, pid: PlayerId) -> Option<ServerMessage> {
    match state.remove_player(pid).await {
        Ok(_) => None,
        Err(e) => Some(ServerMessage::error(&e)),
    }
}

pub async fn handle_add_prompts(state: &Arc<AppState>, prompts: Vec<String>) -> Option<ServerMessage> {
    let count = prompts.len();
    let pool = state.add_prompts(prompts).await;
    tracing::info!("Host added {} prompts, pool now has {}", count, pool);
    None
}
