use super::snapshot::{answering_players, round_time};
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::types::{AnswerId, PlayerId, RoundState};

impl AppState {
    /// Store `pid`'s answer for slot `aid`, replacing any earlier text
    pub async fn submit_answer(&self, pid: PlayerId, aid: AnswerId, text: &str) -> GameResult<()> {
        let snapshot = {
            let mut players = self.players.write().await;
            let player = players
                .iter_mut()
                .find(|p| p.id == pid)
                .ok_or(GameError::UnknownParticipant)?;

            let mut guard = self.round.write().await;
            let round = guard.as_mut().ok_or(GameError::NoRound)?;
            if round.state() != RoundState::Answering {
                return Err(GameError::AnsweringClosed);
            }
            let index = round.locate(aid).ok_or(GameError::UnknownAnswer(aid))?;
            let question = round
                .question_mut(index)
                .ok_or(GameError::UnknownAnswer(aid))?;
            question.record_answer(pid, aid, text, self.config.max_answer_chars)?;
            player.note_submitted(aid);

            let time = round_time(Some(&*round));
            self.snapshot
                .refresh(RoundState::Answering, time, Some(answering_players(&players)))
                .await
        };
        tracing::debug!("Player {} answered {}", pid, aid);

        if let Some(snapshot) = snapshot {
            self.broadcast_to_all(ServerMessage::Info(snapshot));
        }
        Ok(())
    }
}
