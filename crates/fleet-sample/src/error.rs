use actor_system::{ActorSystemError, EntityId, StopReason};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Device {0} is not known to the tenant")]
    UnknownDevice(EntityId),

    #[error("Actor stopped before answering: {0}")]
    ActorStopped(StopReason),

    #[error("Invalid device profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid telemetry value for key '{key}'")]
    InvalidTelemetry { key: String },

    #[error("No response received")]
    NoResponse(#[from] tokio::sync::oneshot::error::RecvError),

    #[error(transparent)]
    System(#[from] ActorSystemError),
}
