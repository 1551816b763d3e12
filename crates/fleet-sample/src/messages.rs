//! # Fleet Messages
//!
//! Every actor in the fleet speaks [`FleetMsg`]. Profile updates are broadcast to all
//! devices, so the enum is `Clone`; request variants carry a [`Reply`], a cloneable
//! one-shot responder where only the first answer is delivered.
//!
//! Requests that reach a stopped actor are answered with
//! [`FleetError::ActorStopped`] from [`ActorMsg::on_actor_stopped`], so a caller awaiting
//! a reply never hangs on a dead device.

use crate::error::FleetError;
use crate::model::{DeviceProfile, DeviceState, Telemetry};
use actor_system::{ActorMsg, EntityId, MsgType, StopReason};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;

/// One-shot responder that survives cloning. The first `send` wins.
pub struct Reply<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Reply<T> {
    pub fn channel() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Returns `false` when the reply was already sent or the caller went away.
    pub fn send(&self, value: T) -> bool {
        match self.sender.lock().take() {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }
}

impl<T> Clone for Reply<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Reply")
    }
}

#[derive(Debug, Clone)]
pub enum FleetMsg {
    /// Reading reported by a device. The tenant creates the device actor on first contact.
    Telemetry { device_id: EntityId, data: Telemetry },
    GetDeviceState {
        device_id: EntityId,
        respond_to: Reply<Result<DeviceState, FleetError>>,
    },
    /// Replaces the tenant's device profile and notifies every device.
    UpdateProfile(DeviceProfile),
    /// The tenant's device profile changed. Sent with high priority so it also revives
    /// devices whose init gave up.
    ProfileUpdated,
    DeleteDevice { device_id: EntityId },
    ListDevices { respond_to: Reply<Vec<EntityId>> },
    /// Periodic self-message of a device actor.
    InactivityCheck,
}

impl ActorMsg for FleetMsg {
    fn msg_type(&self) -> MsgType {
        match self {
            FleetMsg::Telemetry { .. } => MsgType::SessionEvent,
            FleetMsg::GetDeviceState { .. } | FleetMsg::ListDevices { .. } => MsgType::Other,
            FleetMsg::UpdateProfile(_) => MsgType::DeviceAttributesUpdate,
            FleetMsg::ProfileUpdated => MsgType::ComponentUpdated,
            FleetMsg::DeleteDevice { .. } => MsgType::Housekeeping,
            FleetMsg::InactivityCheck => MsgType::Timeout,
        }
    }

    fn on_actor_stopped(self, reason: StopReason) {
        match self {
            FleetMsg::GetDeviceState { respond_to, .. } => {
                respond_to.send(Err(FleetError::ActorStopped(reason)));
            }
            FleetMsg::ListDevices { respond_to } => {
                respond_to.send(Vec::new());
            }
            _ => {}
        }
    }
}
