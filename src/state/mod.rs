mod game;
mod player;
mod round;
pub mod snapshot;
mod submission;
mod vote;

pub use vote::VoteResult;

use crate::config::GameConfig;
use crate::ids::IdAllocator;
use crate::model::{Player, Round, ScoringPolicy, Spectator, VoteShare};
use crate::protocol::{Directed, DisplayEvent, ServerMessage, Snapshot};
use crate::timer::CancelHandle;
use snapshot::SnapshotCell;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Shared application state
///
/// Locks are always taken in field order (players, spectators, prompt pool,
/// round) and never held across a countdown wait. The snapshot has its own
/// mutex and is only locked after the others are released.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GameConfig>,
    pub ids: Arc<IdAllocator>,
    pub players: Arc<RwLock<Vec<Player>>>,
    pub spectators: Arc<RwLock<Vec<Spectator>>>,
    pub prompt_pool: Arc<RwLock<Vec<String>>>,
    pub round: Arc<RwLock<Option<Round>>>,
    pub snapshot: SnapshotCell,
    pub scoring: Arc<dyn ScoringPolicy>,
    /// Messages for every connected client
    pub broadcast: broadcast::Sender<ServerMessage>,
    /// Messages for a single player, filtered by each connection
    pub direct: broadcast::Sender<Directed>,
    /// Events for game-master display clients
    pub display: broadcast::Sender<DisplayEvent>,
    round_task: Arc<Mutex<Option<RoundTask>>>,
    rounds_started: Arc<AtomicU32>,
}

/// The live round driver and the handle that stops it
struct RoundTask {
    cancel: CancelHandle,
    join: JoinHandle<()>,
}

impl AppState {
    pub fn new(config: GameConfig) -> Self {
        Self::with_scoring(config, Arc::new(VoteShare::default()))
    }

    pub fn with_scoring(config: GameConfig, scoring: Arc<dyn ScoringPolicy>) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        let (direct_tx, _direct_rx) = broadcast::channel(256);
        let (display_tx, _display_rx) = broadcast::channel(256);
        Self {
            config: Arc::new(config),
            ids: Arc::new(IdAllocator::new()),
            players: Arc::new(RwLock::new(Vec::new())),
            spectators: Arc::new(RwLock::new(Vec::new())),
            prompt_pool: Arc::new(RwLock::new(Vec::new())),
            round: Arc::new(RwLock::new(None)),
            snapshot: SnapshotCell::new(),
            scoring,
            broadcast: tx,
            direct: direct_tx,
            display: display_tx,
            round_task: Arc::new(Mutex::new(None)),
            rounds_started: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Broadcast a message to every connected client
    pub fn broadcast_to_all(&self, msg: ServerMessage) {
        // Ignore send errors (no receivers connected is fine)
        let _ = self.broadcast.send(msg);
    }

    /// Queue a message for one player's connection(s)
    pub fn send_to_player(&self, to: crate::types::PlayerId, msg: ServerMessage) {
        let _ = self.direct.send(Directed { to, msg });
    }

    /// Fire-and-forget update for the display sink
    pub fn notify_display(&self, event: DisplayEvent) {
        let _ = self.display.send(event);
    }

    /// Current snapshot, as served to new or polling clients
    pub async fn info(&self) -> Snapshot {
        self.snapshot.get().await
    }

    /// Add prompts to the pool, skipping blanks; returns the new pool size
    pub async fn add_prompts(&self, prompts: impl IntoIterator<Item = String>) -> usize {
        let mut pool = self.prompt_pool.write().await;
        pool.extend(
            prompts
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        );
        pool.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
