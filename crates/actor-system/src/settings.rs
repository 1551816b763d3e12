//! # Actor System Settings
//!
//! Tuning knobs for mailboxes and the shared scheduler. Every field has a default, so a
//! partial TOML document is enough:
//!
//! ```toml
//! actor_throughput = 10
//! max_actor_init_attempts = 3
//! ```

use crate::error::ActorSystemError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActorSystemSettings {
    /// Messages processed per scheduled batch before the worker thread is yielded.
    pub actor_throughput: usize,
    /// Init attempts before an actor is stopped with `INIT_FAILED`. `0` means unlimited.
    pub max_actor_init_attempts: u32,
    /// Worker threads of the shared delayed-task scheduler.
    pub scheduler_pool_size: usize,
    /// How long a global stop waits for each dispatcher before abandoning its workers.
    pub dispatcher_shutdown_timeout_ms: u64,
}

impl Default for ActorSystemSettings {
    fn default() -> Self {
        Self {
            actor_throughput: 5,
            max_actor_init_attempts: 10,
            scheduler_pool_size: 1,
            dispatcher_shutdown_timeout_ms: 3000,
        }
    }
}

impl ActorSystemSettings {
    pub fn new(actor_throughput: usize, max_actor_init_attempts: u32, scheduler_pool_size: usize) -> Self {
        Self {
            actor_throughput,
            max_actor_init_attempts,
            scheduler_pool_size,
            ..Self::default()
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ActorSystemError> {
        let settings: Self = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ActorSystemError> {
        let raw = std::fs::read_to_string(path).map_err(ActorSystemError::SettingsIo)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ActorSystemError> {
        if self.actor_throughput == 0 {
            return Err(ActorSystemError::InvalidSettings(
                "actor_throughput must be at least 1".into(),
            ));
        }
        if self.scheduler_pool_size == 0 {
            return Err(ActorSystemError::InvalidSettings(
                "scheduler_pool_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn dispatcher_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatcher_shutdown_timeout_ms)
    }
}
