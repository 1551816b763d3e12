//! # Message Contract
//!
//! An [`ActorSystem`](crate::ActorSystem) is generic over one message type `M: ActorMsg`,
//! usually an enum covering every message the platform's actors exchange. The framework
//! needs two things from a message:
//!
//! - a [`MsgType`] tag, used to recognise the re-init trigger after an init failure;
//! - an [`ActorMsg::on_actor_stopped`] hook, called instead of delivery when the target
//!   actor is terminating or gone. Requests carrying a response channel answer it there,
//!   so callers observe termination rather than silence.

use std::fmt;

/// Why an actor was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// `init` kept failing or the actor asked for re-initialization.
    InitFailed,
    /// Explicit stop, supervision stop or system shutdown.
    Stopped,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::InitFailed => f.write_str("INIT_FAILED"),
            StopReason::Stopped => f.write_str("STOPPED"),
        }
    }
}

/// Type discriminator carried by every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    /// Configuration of the component behind an actor changed.
    ComponentUpdated,
    SessionEvent,
    TransportToDevice,
    DeviceAttributesUpdate,
    DeviceRpcRequest,
    DeviceRpcResponse,
    RuleEngine,
    CalculatedField,
    PartitionChange,
    Housekeeping,
    Timeout,
    Other,
}

impl MsgType {
    /// A high-priority message of this type revives an actor stopped with
    /// [`StopReason::InitFailed`].
    pub fn is_reinit_trigger(&self) -> bool {
        matches!(self, MsgType::ComponentUpdated)
    }
}

/// Contract every message delivered through the actor system implements.
pub trait ActorMsg: Send + Sized + 'static {
    fn msg_type(&self) -> MsgType;

    /// Called when the message cannot be delivered because its target stopped.
    fn on_actor_stopped(self, _reason: StopReason) {}
}
