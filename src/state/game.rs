use super::{AppState, RoundTask};
use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::timer::cancel_pair;
use crate::types::RoundType;
use std::sync::atomic::Ordering;

impl AppState {
    /// Build a round and start driving it in the background
    ///
    /// Only one round runs at a time. Answering is already open when this
    /// returns. Returns the number of questions.
    pub async fn start_round(&self, round_type: RoundType, name: Option<String>) -> GameResult<usize> {
        let mut task = self.round_task.lock().await;
        if task.as_ref().is_some_and(|t| !t.join.is_finished()) {
            return Err(GameError::RoundInProgress);
        }

        let number = self.rounds_started.load(Ordering::Relaxed) + 1;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Round {}", number));

        let questions = self.build_round(round_type, name.clone()).await?;
        self.rounds_started.fetch_add(1, Ordering::Relaxed);
        self.broadcast_to_all(ServerMessage::RoundStarted {
            name: name.clone(),
            questions,
        });

        let answer_seconds = match self.open_answering().await {
            Ok(seconds) => seconds,
            Err(e) => {
                tracing::error!("Failed to open answering for '{}': {}", name, e);
                self.abort_round().await;
                return Err(e);
            }
        };

        let (cancel, mut token) = cancel_pair();
        let state = self.clone();
        let join = tokio::spawn(async move {
            match state.run_round(answer_seconds, &mut token).await {
                Ok(()) => {}
                Err(GameError::Cancelled) => {
                    tracing::info!("Round '{}' was stopped", name);
                    state.abort_round().await;
                }
                Err(e) => {
                    tracing::error!("Round '{}' failed: {}", name, e);
                    state.abort_round().await;
                }
            }
        });

        *task = Some(RoundTask { cancel, join });
        Ok(questions)
    }

    /// Cancel the running round and wait for its driver to clean up
    pub async fn end_round(&self) -> GameResult<()> {
        let mut task = self.round_task.lock().await;
        match task.take() {
            Some(RoundTask { cancel, join }) if !join.is_finished() => {
                cancel.cancel();
                if let Err(e) = join.await {
                    tracing::error!("Round task panicked: {}", e);
                }
                Ok(())
            }
            _ => Err(GameError::NoRound),
        }
    }

    /// Wait for the running round, if any, to finish on its own
    pub async fn wait_round(&self) {
        let task = self.round_task.lock().await.take();
        if let Some(RoundTask { join, .. }) = task {
            if let Err(e) = join.await {
                tracing::error!("Round task panicked: {}", e);
            }
        }
    }

    /// Whether a round driver is currently live
    pub async fn round_running(&self) -> bool {
        self.round_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.join.is_finished())
    }
}
