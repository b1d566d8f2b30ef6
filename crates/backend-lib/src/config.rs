// ============================
// chatroom-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    /// Seconds between presence sweeps
    pub sweep_interval_secs: u64,
    /// Seconds of heartbeat silence before a participant is evicted
    pub inactivity_threshold_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".parse().unwrap(),
            log_level: "info".to_string(),
            sweep_interval_secs: 5,
            inactivity_threshold_secs: 10,
        }
    }
}

impl Settings {
    /// Sweeper tick period
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }

    /// Eviction threshold, compared against heartbeat age
    pub fn inactivity_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.inactivity_threshold_secs as i64)
    }
}

/// Load settings from config.toml and `CHATROOM_`-prefixed env vars,
/// falling back to defaults for anything unset.
pub fn load_settings() -> Result<Settings> {
    let settings = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file("config.toml"))
        .merge(Env::prefixed("CHATROOM_"))
        .extract()?;

    Ok(settings)
}
