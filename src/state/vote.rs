use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::{AnswerId, RoundState, Voter};

/// Outcome of a vote that reached an open question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteResult {
    /// `count` is the voter's running total on the answer
    Recorded { count: u32, votes_left: u32 },
    /// Budget exhausted; nothing changed
    NoBudget,
}

impl AppState {
    /// Cast one vote from `voter` for answer `aid` of the question being voted on
    pub async fn submit_vote(&self, voter: Voter, aid: AnswerId) -> GameResult<VoteResult> {
        let mut players = self.players.write().await;
        let mut spectators = self.spectators.write().await;
        let mut guard = self.round.write().await;

        let round = guard.as_mut().ok_or(GameError::VotingClosed)?;
        let RoundState::Voting { question: current } = round.state() else {
            return Err(GameError::VotingClosed);
        };
        let index = round.locate(aid).ok_or(GameError::UnknownAnswer(aid))?;
        if index != current {
            return Err(GameError::NotCurrentQuestion(aid));
        }
        let question = round
            .question_mut(index)
            .ok_or(GameError::UnknownAnswer(aid))?;
        if question.is_tallied() {
            return Err(GameError::VotingClosed);
        }
        // Reserved slots that were never answered cannot be voted for
        let answer = question
            .answer_mut(aid)
            .ok_or(GameError::UnknownAnswer(aid))?;

        let budget = match voter {
            Voter::Player(id) => players
                .iter_mut()
                .find(|p| p.id == id)
                .map(|p| &mut p.budget),
            Voter::Spectator(id) => spectators
                .iter_mut()
                .find(|s| s.id == id)
                .map(|s| &mut s.budget),
        }
        .ok_or(GameError::UnknownParticipant)?;

        let count = answer.vote(voter, budget);
        if count == 0 {
            tracing::debug!("Vote from {} rejected, no budget left", voter.wire_id());
            return Ok(VoteResult::NoBudget);
        }
        tracing::debug!("Vote from {} on {} (now {})", voter.wire_id(), aid, count);
        Ok(VoteResult::Recorded {
            count,
            votes_left: budget.left(),
        })
    }
}
