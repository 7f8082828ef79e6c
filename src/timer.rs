//! Cancellable countdown used to pace round phases
//!
//! Runs on tokio's clock, so tests can drive it with a paused runtime instead
//! of waiting in real time.

use crate::error::{GameError, GameResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

/// Receives every tick of a running countdown
#[async_trait]
pub trait TickSink: Send + Sync {
    async fn on_tick(&self, remaining: u32);
}

/// Side that requests cancellation
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Side that observes cancellation
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace works even with no receivers left
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; never resolves if the handle
    /// is dropped without cancelling
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|&cancelled| cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `duration` unless cancelled first
    pub async fn sleep(&mut self, duration: Duration) -> GameResult<()> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(GameError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    tick: Duration,
    grace: Duration,
}

impl Countdown {
    pub fn new(tick: Duration, grace: Duration) -> Self {
        Self { tick, grace }
    }

    /// One-second ticks with the given grace period
    pub fn seconds(grace: Duration) -> Self {
        Self::new(Duration::from_secs(1), grace)
    }

    /// Count `seconds` down to zero, then hold for the grace period
    ///
    /// `sink` sees exactly `seconds` ticks, each one lower than the last.
    pub async fn run(
        &self,
        seconds: u32,
        cancel: &mut CancelToken,
        sink: &dyn TickSink,
    ) -> GameResult<()> {
        if cancel.is_cancelled() {
            return Err(GameError::Cancelled);
        }

        let mut remaining = seconds;
        while remaining > 0 {
            cancel.sleep(self.tick).await?;
            remaining -= 1;
            sink.on_tick(remaining).await;
        }

        cancel.sleep(self.grace).await
    }
}
