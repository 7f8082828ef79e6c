use super::round::vote_ballot;
use super::snapshot::name_color;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::model::{Player, Spectator};
use crate::protocol::{DisplayEvent, NameColor, ServerMessage};
use crate::types::{PlayerId, RoundState, SpectatorId};
use std::net::IpAddr;

/// Trimmed name, or a generated one when nothing usable was sent
fn name_or_petname(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        petname::petname(2, "-").unwrap_or_else(|| "anonymous".to_string())
    } else {
        trimmed.to_string()
    }
}

impl AppState {
    /// Join as a player, or re-attach to an existing one
    ///
    /// A player is re-attached when both the name (case-insensitive) and the
    /// address match; the returned flag is true in that case.
    pub async fn join_player(&self, name: &str, ip: IpAddr) -> (Player, bool) {
        let name = name_or_petname(name);
        let mut players = self.players.write().await;

        if let Some(existing) = players
            .iter()
            .find(|p| p.ip == ip && p.name.eq_ignore_ascii_case(&name))
        {
            tracing::info!("Player {} ({}) reconnected", existing.name, existing.id);
            return (existing.clone(), true);
        }

        let mut player = Player::new(self.ids.next_player(), name, ip);
        player.budget.reset(self.config.votes_per_player);
        players.push(player.clone());
        tracing::info!("Player {} joined as {}", player.name, player.id);
        drop(players);

        self.broadcast_roster().await;
        (player, false)
    }

    /// Join as a non-scoring spectator, or re-attach to an existing one
    ///
    /// Matching is by address plus name; an empty name re-attaches to the
    /// address's anonymous spectator, so a reconnect never refills a budget.
    pub async fn join_spectator(&self, name: &str, ip: IpAddr) -> (Spectator, bool) {
        let requested = name.trim();
        let mut spectators = self.spectators.write().await;

        if let Some(existing) = spectators
            .iter()
            .find(|s| s.ip == ip && (requested.is_empty() || s.name.eq_ignore_ascii_case(requested)))
        {
            tracing::info!(
                "Spectator {} ({}) reconnected",
                existing.name,
                existing.voter().wire_id()
            );
            return (existing.clone(), true);
        }

        let mut spectator = Spectator::new(self.ids.next_spectator(), name_or_petname(name), ip);
        spectator.budget.reset(self.config.votes_per_player);
        spectators.push(spectator.clone());
        tracing::info!(
            "Spectator {} joined ({})",
            spectator.name,
            spectator.voter().wire_id()
        );
        (spectator, false)
    }

    pub async fn player(&self, pid: PlayerId) -> Option<Player> {
        self.players.read().await.iter().find(|p| p.id == pid).cloned()
    }

    pub async fn spectator(&self, id: SpectatorId) -> Option<Spectator> {
        self.spectators.read().await.iter().find(|s| s.id == id).cloned()
    }

    /// Remove a player from the roster; only allowed between rounds
    pub async fn remove_player(&self, pid: PlayerId) -> GameResult<Player> {
        let removed = {
            let mut players = self.players.write().await;
            let round = self.round.read().await;
            if round
                .as_ref()
                .is_some_and(|r| matches!(r.state(), RoundState::Building) || r.state().is_active())
            {
                return Err(GameError::RoundActive);
            }
            let index = players
                .iter()
                .position(|p| p.id == pid)
                .ok_or(GameError::UnknownParticipant)?;
            players.remove(index)
        };
        tracing::info!("Removed player {} ({})", removed.name, removed.id);

        self.broadcast_roster().await;
        Ok(removed)
    }

    /// Roster in join order
    pub async fn roster(&self) -> Vec<NameColor> {
        self.players.read().await.iter().map(name_color).collect()
    }

    /// Push the roster to every client and to the display
    pub async fn broadcast_roster(&self) {
        let players = self.roster().await;
        self.broadcast_to_all(ServerMessage::Players {
            players: players.clone(),
        });
        self.notify_display(DisplayEvent::Lobby { players });
    }

    /// Re-send whatever a reconnecting player is expected to act on
    ///
    /// While answering that is their open slots; while a question is being
    /// voted on it is that question's ballot. Returns the number of messages.
    pub async fn resend_pending(&self, pid: PlayerId) -> usize {
        let pending: Vec<ServerMessage> = {
            let round = self.round.read().await;
            let Some(round) = round.as_ref() else {
                return 0;
            };
            match round.state() {
                RoundState::Answering => round
                    .questions()
                    .iter()
                    .flat_map(|q| {
                        q.slots()
                            .iter()
                            .filter(move |s| s.player == pid)
                            .map(move |s| ServerMessage::Answer {
                                time: round.time_left(),
                                aid: s.aid,
                                question: q.prompt().to_string(),
                            })
                    })
                    .collect(),
                RoundState::Voting { question } => round
                    .questions()
                    .get(question)
                    .filter(|q| !q.is_tallied())
                    .map(|q| vote_ballot(q, round.time_left()))
                    .into_iter()
                    .collect(),
                _ => Vec::new(),
            }
        };

        let count = pending.len();
        for msg in pending {
            self.send_to_player(pid, msg);
        }
        count
    }
}
