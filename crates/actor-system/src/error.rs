//! # Framework Errors
//!
//! Two error families live here:
//!
//! - [`ActorSystemError`] - what the registry API returns to callers (missing actors,
//!   dispatcher misconfiguration, bad settings).
//! - [`ActorError`] - what an actor callback returns. The mailbox converts it into a
//!   supervision decision; it never propagates to the dispatcher thread.

use crate::id::ActorId;

/// Boxed error produced by actor implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by the actor system API.
#[derive(Debug, thiserror::Error)]
pub enum ActorSystemError {
    /// Target (or parent) actor is not in the registry. Callers treat this as recoverable.
    #[error("Actor with id [{0}] is not registered")]
    ActorNotRegistered(ActorId),
    #[error("Dispatcher with id [{0}] is already registered")]
    DispatcherAlreadyRegistered(String),
    #[error("Dispatcher with id [{0}] is not registered")]
    DispatcherNotRegistered(String),
    #[error("Failed to create actor [{id}]: {source}")]
    ActorCreation {
        id: ActorId,
        #[source]
        source: ActorError,
    },
    #[error("Actor system is shut down")]
    SystemShutdown,
    #[error("Failed to build executor: {0}")]
    Executor(#[from] std::io::Error),
    #[error("Invalid actor system settings: {0}")]
    InvalidSettings(String),
    #[error("Failed to parse actor system settings: {0}")]
    SettingsParse(#[from] toml::de::Error),
    #[error("Failed to read actor system settings: {0}")]
    SettingsIo(#[source] std::io::Error),
}

impl ActorSystemError {
    pub fn is_actor_not_registered(&self) -> bool {
        matches!(self, ActorSystemError::ActorNotRegistered(_))
    }
}

/// Outcome of a failed actor callback.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// The actor must be torn down and wait for a re-init trigger, as if `init` had failed.
    #[error("Actor requires re-initialization: {0}")]
    ReinitRequired(String),
    #[error("Actor panicked: {0}")]
    Panicked(String),
    #[error("Actor failure: {0}")]
    Failed(#[source] BoxError),
}

impl ActorError {
    pub fn failed(err: impl Into<BoxError>) -> Self {
        ActorError::Failed(err.into())
    }

    pub fn reinit_required(reason: impl Into<String>) -> Self {
        ActorError::ReinitRequired(reason.into())
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, ActorError::Panicked(_))
    }
}

impl From<String> for ActorError {
    fn from(msg: String) -> Self {
        ActorError::Failed(msg.into())
    }
}

impl From<&str> for ActorError {
    fn from(msg: &str) -> Self {
        ActorError::Failed(msg.into())
    }
}
