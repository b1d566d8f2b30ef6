// ============================
// chatroom-backend-lib/src/sweeper.rs
// ============================
//! Presence sweeper: the recurring eviction task.
use chatroom_common::Message;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::AppError;
use crate::store::MessageStore;
use crate::AppState;

/// Handle to the running sweeper task; dropping it leaves the task
/// running, `shutdown` stops it cleanly.
pub struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweep loop and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the recurring presence sweep.
///
/// Each tick evicts participants whose heartbeat is older than the
/// configured inactivity threshold and appends one "left" status event per
/// eviction. A failed tick is logged and retried on the next tick; it
/// never terminates the task.
pub fn spawn_sweeper<S>(state: Arc<AppState<S>>) -> SweeperHandle
where
    S: MessageStore + 'static,
{
    let (stop, mut stopped) = watch::channel(false);
    let interval = state.settings.sweep_interval();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = sweep_once(&state).await {
                        tracing::warn!(%error, "presence sweep failed, retrying next tick");
                    }
                },
                _ = stopped.changed() => {
                    tracing::debug!("presence sweeper stopped");
                    break;
                },
            }
        }
    });

    SweeperHandle { stop, task }
}

/// Run a single sweep: evict stale participants and emit their "left"
/// status events as one batch. A tick that evicts nobody appends nothing.
pub async fn sweep_once<S: MessageStore>(state: &AppState<S>) -> Result<usize, AppError> {
    let now = Utc::now();
    let threshold = state.settings.inactivity_threshold();
    let evicted = state.registry.sweep_expired(now, threshold);
    if evicted.is_empty() {
        return Ok(0);
    }

    let farewells: Vec<Message> = evicted
        .iter()
        .map(|participant| Message::status(participant.name.clone(), "left"))
        .collect();
    let count = farewells.len();
    state.store.append_batch(farewells).await?;

    for participant in &evicted {
        tracing::info!(participant = %participant.name, "evicted inactive participant");
    }
    Ok(count)
}
