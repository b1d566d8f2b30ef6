// ============================
// chatroom-backend-lib/src/lib.rs
// ============================
//! Core engine for the chat room backend: participant presence,
//! message routing/visibility, and the eviction sweeper.

pub mod config;
pub mod error;
pub mod registry;
pub mod router;
pub mod store;
pub mod sweeper;

use std::sync::Arc;

use crate::config::Settings;
use crate::registry::ParticipantRegistry;
use crate::store::MessageStore;

/// Application state shared across all handlers and the sweeper task.
///
/// Constructed once at process start and passed by handle; there are no
/// ambient globals.
pub struct AppState<S: MessageStore> {
    /// Active participants and their heartbeats
    pub registry: Arc<ParticipantRegistry>,
    /// Append-only message log
    pub store: S,
    /// Settings manager
    pub settings: Arc<Settings>,
}

impl<S: MessageStore> AppState<S> {
    /// Create a new application state
    pub fn new(store: S, settings: Settings) -> Self {
        Self {
            registry: Arc::new(ParticipantRegistry::new()),
            store,
            settings: Arc::new(settings),
        }
    }
}
