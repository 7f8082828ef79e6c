use crate::model::{Player, Question, Round};
use crate::protocol::{AnswerResult, InfoView, NameColor, Snapshot, VoteEntry};
use crate::types::{RoundState, SPECTATOR_COLOUR};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The current snapshot and the round state it was built for
#[derive(Debug, Default)]
struct Tagged {
    snapshot: Snapshot,
    state: Option<RoundState>,
}

/// Holds what clients should currently see
///
/// Writers call this while holding the round lock, so writes land in round
/// order. Refreshes are also tagged with the round state they were computed
/// for and dropped if the phase has moved on.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCell {
    inner: Arc<Mutex<Tagged>>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Snapshot {
        self.inner.lock().await.snapshot.clone()
    }

    /// Overwrite the whole snapshot (phase transitions)
    pub async fn replace(&self, snapshot: Snapshot, state: Option<RoundState>) -> Snapshot {
        let mut guard = self.inner.lock().await;
        *guard = Tagged { snapshot, state };
        guard.snapshot.clone()
    }

    /// Refresh the time, and the submitted-player list when answering
    ///
    /// Returns `None` without touching anything when the snapshot belongs to
    /// a different round state than `state`.
    pub async fn refresh(
        &self,
        state: RoundState,
        time: Option<u32>,
        answering: Option<Vec<NameColor>>,
    ) -> Option<Snapshot> {
        let mut guard = self.inner.lock().await;
        if guard.state != Some(state) {
            return None;
        }
        if let Some(players) = answering {
            if matches!(guard.snapshot.view, InfoView::Answering { .. }) {
                guard.snapshot.view = InfoView::Answering { players };
            }
        }
        guard.snapshot.time = time;
        Some(guard.snapshot.clone())
    }
}

pub fn name_color(player: &Player) -> NameColor {
    NameColor {
        name: player.name.clone(),
        color: player.color.to_string(),
    }
}

/// Players (in roster order) that have submitted something this round
pub fn answering_players(players: &[Player]) -> Vec<NameColor> {
    players
        .iter()
        .filter(|p| p.has_submitted())
        .map(name_color)
        .collect()
}

/// Seconds to show for a round, if it is counting down
pub fn round_time(round: Option<&Round>) -> Option<u32> {
    round
        .filter(|r| r.state().is_active())
        .map(|r| r.time_left())
}

/// Results view for a tallied question
///
/// Named voters are listed individually in ID order; all spectator votes are
/// folded into a single entry under `spectator_label`.
pub fn question_view(question: &Question, players: &[Player], spectator_label: &str) -> InfoView {
    let lookup = |id| players.iter().find(|p| p.id == id);

    let answers = question
        .answers()
        .iter()
        .map(|answer| {
            let author = match lookup(answer.author()) {
                Some(p) => name_color(p),
                None => NameColor {
                    name: format!("Player {}", answer.author()),
                    color: SPECTATOR_COLOUR.to_string(),
                },
            };

            let breakdown = answer.breakdown();
            let mut votes: Vec<VoteEntry> = breakdown
                .named
                .iter()
                .map(|(id, count)| match lookup(*id) {
                    Some(p) => VoteEntry {
                        value: format!("{} - {}", p.name, count),
                        color: p.color.to_string(),
                    },
                    None => VoteEntry {
                        value: format!("Player {} - {}", id, count),
                        color: SPECTATOR_COLOUR.to_string(),
                    },
                })
                .collect();
            if breakdown.spectators > 0 {
                votes.push(VoteEntry {
                    value: format!("{} - {}", spectator_label, breakdown.spectators),
                    color: SPECTATOR_COLOUR.to_string(),
                });
            }

            AnswerResult {
                player: author,
                answer: answer.display_text().to_string(),
                score: answer.score_label().to_string(),
                votes,
            }
        })
        .collect();

    InfoView::Question {
        question: question.prompt().to_string(),
        answers,
    }
}

/// Standings view, one "<name> - <points>" entry per player
pub fn round_view(players: &[Player]) -> InfoView {
    InfoView::Round {
        players: players
            .iter()
            .map(|p| NameColor {
                name: format!("{} - {}", p.name, p.points),
                color: p.color.to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAllocator;
    use crate::model::{VoteBudget, VoteShare};
    use crate::types::{PlayerId, SpectatorId, Voter};

    fn players() -> Vec<Player> {
        let ip = "10.0.0.1".parse().unwrap();
        vec![
            Player::new(PlayerId(0), "Ann".to_string(), ip),
            Player::new(PlayerId(1), "Bo".to_string(), ip),
            Player::new(PlayerId(2), "Cy".to_string(), ip),
        ]
    }

    #[tokio::test]
    async fn test_refresh_keeps_non_answering_view() {
        let cell = SnapshotCell::new();
        let voting = RoundState::Voting { question: 0 };
        cell.replace(
            Snapshot {
                view: InfoView::None,
                time: Some(5),
            },
            Some(voting),
        )
        .await;

        let snap = cell.refresh(voting, Some(4), Some(vec![])).await.unwrap();
        assert_eq!(snap.view, InfoView::None);
        assert_eq!(snap.time, Some(4));
    }

    #[tokio::test]
    async fn test_refresh_updates_answering_players() {
        let cell = SnapshotCell::new();
        cell.replace(
            Snapshot {
                view: InfoView::Answering { players: vec![] },
                time: Some(10),
            },
            Some(RoundState::Answering),
        )
        .await;

        let mut roster = players();
        roster[1].answers.push(crate::types::AnswerId(0));
        let snap = cell
            .refresh(RoundState::Answering, Some(9), Some(answering_players(&roster)))
            .await
            .unwrap();

        assert_eq!(
            snap.view,
            InfoView::Answering {
                players: vec![NameColor {
                    name: "Bo".to_string(),
                    color: "#66ff99".to_string()
                }]
            }
        );
        assert_eq!(cell.get().await, snap);
    }

    #[tokio::test]
    async fn test_late_refresh_from_earlier_phase_is_dropped() {
        let cell = SnapshotCell::new();
        let voting = Snapshot {
            view: InfoView::None,
            time: Some(8),
        };
        cell.replace(voting.clone(), Some(RoundState::Voting { question: 0 }))
            .await;

        // An answer accepted at the end of the grace hold arrives after voting opened
        let late = cell
            .refresh(RoundState::Answering, Some(0), Some(answering_players(&players())))
            .await;
        assert!(late.is_none());

        // A tick for the previous question does not land on the next one
        cell.replace(voting.clone(), Some(RoundState::Voting { question: 1 }))
            .await;
        assert!(cell
            .refresh(RoundState::Voting { question: 0 }, Some(3), None)
            .await
            .is_none());
        assert_eq!(cell.get().await, voting);
    }

    #[test]
    fn test_question_view_lumps_spectators() {
        let ids = IdAllocator::new();
        let roster = players();
        let mut q = Question::new("Q".to_string(), &[PlayerId(0), PlayerId(1)], &ids).unwrap();
        let a0 = q.slots()[0].aid;
        let a1 = q.slots()[1].aid;
        q.record_answer(PlayerId(0), a0, "yes", 80).unwrap();
        q.record_answer(PlayerId(1), a1, "", 80).unwrap();

        let mut budget = VoteBudget::new(10);
        let answer = q.answer_mut(a0).unwrap();
        answer.vote(Voter::Player(PlayerId(2)), &mut budget);
        answer.vote(Voter::Player(PlayerId(2)), &mut budget);
        answer.vote(Voter::Player(PlayerId(1)), &mut budget);
        answer.vote(Voter::Spectator(SpectatorId(0)), &mut budget);
        answer.vote(Voter::Spectator(SpectatorId(1)), &mut budget);
        answer.vote(Voter::Spectator(SpectatorId(1)), &mut budget);
        q.tally(3, &VoteShare::default()).unwrap();

        let InfoView::Question { question, answers } = question_view(&q, &roster, "Crowd") else {
            panic!("expected question view");
        };
        assert_eq!(question, "Q");
        assert_eq!(answers[0].answer, "YES");
        assert_eq!(answers[0].score, "300 (66%)");
        let values: Vec<_> = answers[0].votes.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, vec!["Bo - 1", "Cy - 2", "Crowd - 3"]);
        assert_eq!(answers[1].answer, crate::model::DID_NOT_ANSWER);
        assert!(answers[1].votes.is_empty());
    }

    #[test]
    fn test_round_view_formats_points() {
        let mut roster = players();
        roster[2].points = 450;
        let InfoView::Round { players } = round_view(&roster) else {
            panic!("expected round view");
        };
        assert_eq!(players[2].name, "Cy - 450");
        assert_eq!(players[2].color, "#3366ff");
        assert_eq!(players[0].name, "Ann - 0");
    }
}
