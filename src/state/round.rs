use super::snapshot::{answering_players, question_view, round_view};
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::model::{Question, Round};
use crate::protocol::{DisplayEvent, DisplayPhase, InfoView, ServerMessage, Snapshot, VoteOption};
use crate::timer::{CancelToken, Countdown, TickSink};
use crate::types::{PlayerId, RoundState, RoundType};
use async_trait::async_trait;

/// The ballot sent when `question` opens for votes
pub(crate) fn vote_ballot(question: &Question, time: u32) -> ServerMessage {
    ServerMessage::Vote {
        time,
        question: question.prompt().to_string(),
        answers: question
            .answers()
            .iter()
            .map(|a| VoteOption {
                aid: a.id(),
                answer: a.display_text().to_string(),
            })
            .collect(),
    }
}

impl AppState {
    /// Build a round from the current roster and pool; returns the question count
    ///
    /// Every participant's vote budget and answer list are reset on success.
    pub(crate) async fn build_round(&self, round_type: RoundType, name: String) -> GameResult<usize> {
        let mut players = self.players.write().await;
        let mut spectators = self.spectators.write().await;
        let mut pool = self.prompt_pool.write().await;
        let mut guard = self.round.write().await;

        if guard
            .as_ref()
            .is_some_and(|r| r.state() == RoundState::Building || r.state().is_active())
        {
            return Err(GameError::RoundInProgress);
        }

        let roster: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        let round = {
            let mut rng = rand::rng();
            Round::build(
                round_type,
                name,
                &roster,
                &mut pool,
                self.config.responders_per_question,
                &self.ids,
                &mut rng,
            )?
        };

        let votes = self.config.votes_per_player;
        for player in players.iter_mut() {
            player.reset_for_round(votes);
        }
        for spectator in spectators.iter_mut() {
            spectator.budget.reset(votes);
        }

        let questions = round.questions().len();
        *guard = Some(round);
        Ok(questions)
    }

    /// Building -> Answering; hands every responder their slots
    pub(crate) async fn open_answering(&self) -> GameResult<u32> {
        let (seconds, deliveries) = {
            let players = self.players.read().await;
            let mut guard = self.round.write().await;
            let round = guard.as_mut().ok_or(GameError::NoRound)?;
            let seconds = round.begin_answering(self.config.answer_seconds)?;

            let deliveries: Vec<(PlayerId, ServerMessage)> = round
                .questions()
                .iter()
                .flat_map(|q| {
                    q.slots().iter().map(move |slot| {
                        (
                            slot.player,
                            ServerMessage::Answer {
                                time: seconds,
                                aid: slot.aid,
                                question: q.prompt().to_string(),
                            },
                        )
                    })
                })
                .collect();
            let snapshot = Snapshot {
                view: InfoView::Answering {
                    players: answering_players(&players),
                },
                time: Some(seconds),
            };
            self.enter_phase(DisplayPhase::Answering, snapshot, Some(round.state()))
                .await;
            (seconds, deliveries)
        };

        for (pid, msg) in deliveries {
            self.send_to_player(pid, msg);
        }
        Ok(seconds)
    }

    /// Open question `index` for votes and announce its answers
    async fn open_voting(&self, index: usize) -> GameResult<u32> {
        let (seconds, ballot) = {
            let mut guard = self.round.write().await;
            let round = guard.as_mut().ok_or(GameError::NoRound)?;
            let seconds = round.begin_voting(index, self.config.vote_seconds)?;
            let ballot = vote_ballot(&round.questions()[index], seconds);
            let snapshot = Snapshot {
                view: InfoView::None,
                time: Some(seconds),
            };
            self.enter_phase(DisplayPhase::Voting, snapshot, Some(round.state()))
                .await;
            (seconds, ballot)
        };

        self.broadcast_to_all(ballot);
        Ok(seconds)
    }

    /// Tally the current question, credit authors and show the results
    async fn close_question(&self) -> GameResult<()> {
        let mut players = self.players.write().await;
        let mut guard = self.round.write().await;
        let round = guard.as_mut().ok_or(GameError::NoRound)?;

        let awards = round.finish_question(players.len(), self.scoring.as_ref())?;
        for (pid, points) in awards {
            if let Some(player) = players.iter_mut().find(|p| p.id == pid) {
                player.points += points;
            }
        }

        let (_, question) = round
            .current_question()
            .ok_or(GameError::InvalidTransition {
                from: round.state(),
                to: "results",
            })?;
        let snapshot = Snapshot {
            view: question_view(question, &players, &self.config.spectator_label),
            time: None,
        };
        // Tallied questions take no further refreshes
        self.enter_phase(DisplayPhase::QuestionResults, snapshot, None)
            .await;
        Ok(())
    }

    /// Last question done: publish standings
    async fn finish_round(&self) -> GameResult<()> {
        {
            let players = self.players.read().await;
            let mut guard = self.round.write().await;
            let round = guard.as_mut().ok_or(GameError::NoRound)?;
            round.complete()?;
            tracing::info!("Round '{}' complete", round.name());
            let snapshot = Snapshot {
                view: round_view(&players),
                time: None,
            };
            self.enter_phase(DisplayPhase::RoundResults, snapshot, Some(round.state()))
                .await;
        }

        self.broadcast_to_all(ServerMessage::RoundEnded);
        Ok(())
    }

    /// Drive an answering round to completion
    ///
    /// Returns `Cancelled` as soon as `cancel` fires; the round is left in
    /// whatever phase it reached and must be cleaned up with `abort_round`.
    pub(crate) async fn run_round(&self, answer_seconds: u32, cancel: &mut CancelToken) -> GameResult<()> {
        let countdown = Countdown::seconds(self.config.grace());
        countdown.run(answer_seconds, cancel, self).await?;

        let questions = self
            .round
            .read()
            .await
            .as_ref()
            .map(|r| r.questions().len())
            .ok_or(GameError::NoRound)?;

        for index in 0..questions {
            let seconds = self.open_voting(index).await?;
            countdown.run(seconds, cancel, self).await?;
            self.close_question().await?;
            cancel.sleep(self.config.results_hold()).await?;
        }

        self.finish_round().await
    }

    /// Mark the round cancelled and clear what clients see
    pub(crate) async fn abort_round(&self) {
        {
            let mut guard = self.round.write().await;
            if let Some(round) = guard.as_mut() {
                round.cancel();
                tracing::info!("Round '{}' cancelled", round.name());
            }
            self.enter_phase(
                DisplayPhase::Cancelled,
                Snapshot::default(),
                Some(RoundState::Cancelled),
            )
            .await;
        }
        self.broadcast_to_all(ServerMessage::RoundEnded);
    }

    /// Replace the snapshot and tell everyone about it
    ///
    /// Callers hold the round write lock.
    async fn enter_phase(&self, phase: DisplayPhase, snapshot: Snapshot, state: Option<RoundState>) {
        let snapshot = self.snapshot.replace(snapshot, state).await;
        tracing::info!("Entering phase {:?}", phase);
        self.broadcast_to_all(ServerMessage::Info(snapshot.clone()));
        self.notify_display(DisplayEvent::PhaseChanged { phase, snapshot });
    }
}

#[async_trait]
impl TickSink for AppState {
    async fn on_tick(&self, remaining: u32) {
        let snapshot = {
            let players = self.players.read().await;
            let mut guard = self.round.write().await;
            let Some(round) = guard.as_mut() else {
                return;
            };
            round.set_time_left(remaining);
            self.snapshot
                .refresh(round.state(), Some(remaining), Some(answering_players(&players)))
                .await
        };
        let Some(snapshot) = snapshot else {
            tracing::debug!("Dropped stale tick ({}s left)", remaining);
            return;
        };
        tracing::debug!("Tick: {}s left", remaining);

        self.broadcast_to_all(ServerMessage::Info(snapshot.clone()));
        self.notify_display(DisplayEvent::Tick {
            time: remaining,
            snapshot,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::timer::cancel_pair;

    fn quick_config() -> GameConfig {
        GameConfig {
            answer_seconds: 2,
            vote_seconds: 1,
            responders_per_question: 2,
            votes_per_player: 2,
            grace_seconds: 1,
            results_seconds: 1,
            ..GameConfig::default()
        }
    }

    async fn ready_state(players: usize, prompts: usize) -> AppState {
        let state = AppState::new(quick_config());
        for i in 0..players {
            let ip = format!("10.0.0.{}", i + 1).parse().unwrap();
            state.join_player(&format!("P{}", i), ip).await;
        }
        state
            .add_prompts((0..prompts).map(|i| format!("prompt {}", i)))
            .await;
        state
    }

    #[tokio::test]
    async fn test_build_resets_budgets_and_answers() {
        let state = ready_state(3, 5).await;
        {
            let mut players = state.players.write().await;
            players[0].budget.reset(0);
            players[0].answers.push(crate::types::AnswerId(77));
        }

        let questions = state
            .build_round(RoundType::Normal, "R".to_string())
            .await
            .unwrap();

        assert_eq!(questions, 3);
        assert_eq!(state.prompt_pool.read().await.len(), 2);
        let players = state.players.read().await;
        assert_eq!(players[0].budget.left(), 2);
        assert!(players[0].answers.is_empty());
    }

    #[tokio::test]
    async fn test_build_rejects_while_round_running() {
        let state = ready_state(2, 6).await;
        state
            .build_round(RoundType::Normal, "A".to_string())
            .await
            .unwrap();
        assert_eq!(
            state
                .build_round(RoundType::Normal, "B".to_string())
                .await
                .unwrap_err(),
            GameError::RoundInProgress
        );
    }

    #[tokio::test]
    async fn test_final_round_leaves_state_untouched() {
        let state = ready_state(2, 4).await;
        assert_eq!(
            state
                .build_round(RoundType::Final, "F".to_string())
                .await
                .unwrap_err(),
            GameError::Unsupported(RoundType::Final)
        );
        assert!(state.round.read().await.is_none());
        assert_eq!(state.prompt_pool.read().await.len(), 4);
    }

    #[tokio::test]
    async fn test_open_answering_delivers_every_slot() {
        let state = ready_state(3, 3).await;
        let mut direct = state.direct.subscribe();
        state
            .build_round(RoundType::Normal, "R".to_string())
            .await
            .unwrap();

        let seconds = state.open_answering().await.unwrap();
        assert_eq!(seconds, 4);

        let mut per_player = [0usize; 3];
        for _ in 0..6 {
            let directed = direct.recv().await.unwrap();
            let ServerMessage::Answer { time, .. } = directed.msg else {
                panic!("expected answer delivery");
            };
            assert_eq!(time, 4);
            per_player[directed.to.0 as usize] += 1;
        }
        assert_eq!(per_player, [2, 2, 2]);
        assert_eq!(state.info().await.time, Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_round_to_completion() {
        let state = ready_state(2, 2).await;
        let mut display = state.display.subscribe();
        state
            .build_round(RoundType::Normal, "R".to_string())
            .await
            .unwrap();
        let seconds = state.open_answering().await.unwrap();

        let slots: Vec<_> = state.round.read().await.as_ref().unwrap().questions()[0]
            .slots()
            .to_vec();
        for slot in &slots {
            state
                .submit_answer(slot.player, slot.aid, "hello")
                .await
                .unwrap();
        }

        let (_handle, mut token) = cancel_pair();
        state.run_round(seconds, &mut token).await.unwrap();

        let round = state.round.read().await;
        let round = round.as_ref().unwrap();
        assert_eq!(round.state(), RoundState::Complete);
        assert!(round.questions().iter().all(|q| q.is_tallied()));
        assert!(matches!(state.info().await.view, InfoView::Round { .. }));

        let mut phases = Vec::new();
        while let Ok(event) = display.try_recv() {
            if let DisplayEvent::PhaseChanged { phase, .. } = event {
                phases.push(phase);
            }
        }
        assert_eq!(
            phases,
            vec![
                DisplayPhase::Answering,
                DisplayPhase::Voting,
                DisplayPhase::QuestionResults,
                DisplayPhase::Voting,
                DisplayPhase::QuestionResults,
                DisplayPhase::RoundResults,
            ]
        );
    }

    #[tokio::test]
    async fn test_late_tick_keeps_question_results() {
        let state = ready_state(2, 2).await;
        state
            .build_round(RoundType::Normal, "R".to_string())
            .await
            .unwrap();
        state.open_answering().await.unwrap();
        let slots: Vec<_> = state.round.read().await.as_ref().unwrap().questions()[0]
            .slots()
            .to_vec();
        for slot in &slots {
            state.submit_answer(slot.player, slot.aid, "hi").await.unwrap();
        }

        state.open_voting(0).await.unwrap();
        state.on_tick(1).await;
        assert_eq!(state.info().await.time, Some(1));

        state.close_question().await.unwrap();
        let results = state.info().await;
        assert!(matches!(results.view, InfoView::Question { .. }));

        // Final tick of the closed vote arriving after the tally
        state.on_tick(0).await;
        assert_eq!(state.info().await, results);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_round_is_reported() {
        let state = ready_state(2, 2).await;
        state
            .build_round(RoundType::Normal, "R".to_string())
            .await
            .unwrap();
        let seconds = state.open_answering().await.unwrap();

        let (handle, mut token) = cancel_pair();
        handle.cancel();
        assert_eq!(
            state.run_round(seconds, &mut token).await,
            Err(GameError::Cancelled)
        );

        state.abort_round().await;
        assert_eq!(
            state.round.read().await.as_ref().unwrap().state(),
            RoundState::Cancelled
        );
        assert_eq!(state.info().await, Snapshot::default());
    }
}
