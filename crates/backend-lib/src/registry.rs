// ============================
// chatroom-backend-lib/src/registry.rs
// ============================
//! Participant registry: identity, heartbeats, and eviction.
use chrono::{DateTime, Duration, Utc};
use chatroom_common::Participant;
use dashmap::{mapref::entry::Entry, DashMap};
use metrics::{counter, gauge};

use crate::error::AppError;

/// Registry of all currently active participants, keyed by display name.
///
/// Names are case-sensitive and unique among active participants. The map
/// is shard-locked, so `join`, `heartbeat` and `sweep_expired` on the same
/// name serialize against each other: whichever acquires the shard first
/// wins, and no operation ever observes a half-removed entry.
pub struct ParticipantRegistry {
    participants: DashMap<String, DateTime<Utc>>,
}

impl ParticipantRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ParticipantRegistry {
            participants: DashMap::new(),
        }
    }

    /// Register a participant, stamping `last_heartbeat = now`.
    ///
    /// Fails with `Validation` on an empty name and `Conflict` if the name
    /// is already active.
    pub fn join(&self, name: &str) -> Result<Participant, AppError> {
        if name.is_empty() {
            return Err(AppError::Validation(
                "participant name must be non-empty".to_string(),
            ));
        }

        let now = Utc::now();
        match self.participants.entry(name.to_string()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "participant '{name}' is already active"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(now);
                counter!("participant.joined").increment(1);
                gauge!("participant.active").set(self.participants.len() as f64);
                Ok(Participant {
                    name: name.to_string(),
                    last_heartbeat: now,
                })
            },
        }
    }

    /// Refresh a participant's heartbeat. Idempotent; fails with `NotFound`
    /// if the name is unknown or already evicted.
    pub fn heartbeat(&self, name: &str) -> Result<(), AppError> {
        match self.participants.get_mut(name) {
            Some(mut last) => {
                *last = Utc::now();
                Ok(())
            },
            None => Err(AppError::NotFound(format!("unknown participant '{name}'"))),
        }
    }

    /// Whether `name` is currently active
    pub fn contains(&self, name: &str) -> bool {
        self.participants.contains_key(name)
    }

    /// Snapshot of all active participants; iteration order is not meaningful.
    pub fn list(&self) -> Vec<Participant> {
        self.participants
            .iter()
            .map(|entry| Participant {
                name: entry.key().clone(),
                last_heartbeat: *entry.value(),
            })
            .collect()
    }

    /// Remove a participant outright, returning whether it was present.
    /// Used to roll back a join whose status append failed.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.participants.remove(name).is_some();
        if removed {
            gauge!("participant.active").set(self.participants.len() as f64);
        }
        removed
    }

    /// Atomically remove every participant whose heartbeat is older than
    /// `threshold` at time `now`, returning exactly the evicted set.
    ///
    /// `retain` holds each shard lock while deciding, so a heartbeat that
    /// races the sweep either lands before the check (participant survives)
    /// or after the removal (heartbeat reports `NotFound`).
    pub fn sweep_expired(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<Participant> {
        let mut evicted = Vec::new();
        self.participants.retain(|name, last_heartbeat| {
            if now.signed_duration_since(*last_heartbeat) > threshold {
                evicted.push(Participant {
                    name: name.clone(),
                    last_heartbeat: *last_heartbeat,
                });
                false
            } else {
                true
            }
        });

        if !evicted.is_empty() {
            counter!("participant.evicted").increment(evicted.len() as u64);
            gauge!("participant.active").set(self.participants.len() as f64);
        }
        evicted
    }
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::new()
    }
}
