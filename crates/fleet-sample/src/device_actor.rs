//! # Device Actor
//!
//! One actor per device, created lazily by the tenant on first telemetry. It keeps the
//! latest reading, counts accepted and rejected values, and marks itself inactive when no
//! telemetry arrived during a full inactivity period.
//!
//! The profile is read from a `watch` channel owned by the tenant. An empty profile name
//! makes `init` fail; the device then waits, stopped with `INIT_FAILED`, until the next
//! [`FleetMsg::ProfileUpdated`] revives it.

use crate::error::FleetError;
use crate::messages::FleetMsg;
use crate::model::{DeviceProfile, DeviceState, Telemetry};
use actor_system::{
    Actor, ActorCreator, ActorCtx, ActorError, ActorId, EntityId, InitFailureStrategy, StopReason,
};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct DeviceActor {
    device_id: EntityId,
    profiles: watch::Receiver<DeviceProfile>,
    profile: DeviceProfile,
    inactivity_timeout: Duration,
    telemetry_count: u64,
    rejected_count: u64,
    last_telemetry: Option<Telemetry>,
    active: bool,
    seen_since_check: bool,
    ctx: Option<ActorCtx<FleetMsg>>,
}

impl DeviceActor {
    pub fn new(device_id: EntityId, profiles: watch::Receiver<DeviceProfile>, inactivity_timeout: Duration) -> Self {
        let profile = profiles.borrow().clone();
        Self {
            device_id,
            profiles,
            profile,
            inactivity_timeout,
            telemetry_count: 0,
            rejected_count: 0,
            last_telemetry: None,
            active: false,
            seen_since_check: false,
            ctx: None,
        }
    }

    fn load_profile(&mut self) -> Result<(), FleetError> {
        let profile = self.profiles.borrow().clone();
        if profile.name.trim().is_empty() {
            return Err(FleetError::InvalidProfile("profile name is empty".to_string()));
        }
        self.profile = profile;
        Ok(())
    }

    fn on_telemetry(&mut self, data: Telemetry) -> Result<(), ActorError> {
        if !data.value.is_finite() {
            self.rejected_count += 1;
            return Err(ActorError::failed(FleetError::InvalidTelemetry { key: data.key }));
        }
        self.telemetry_count += 1;
        self.active = true;
        self.seen_since_check = true;
        self.last_telemetry = Some(data);
        Ok(())
    }

    fn on_inactivity_check(&mut self) {
        if self.active && !self.seen_since_check {
            info!(device_id = %self.device_id, "Device became inactive");
            self.active = false;
        }
        self.seen_since_check = false;
        self.schedule_inactivity_check();
    }

    fn schedule_inactivity_check(&self) {
        if let Some(ctx) = &self.ctx {
            ctx.schedule_to_self(FleetMsg::InactivityCheck, self.inactivity_timeout);
        }
    }

    fn state(&self) -> DeviceState {
        DeviceState {
            device_id: self.device_id,
            profile: self.profile.clone(),
            telemetry_count: self.telemetry_count,
            rejected_count: self.rejected_count,
            last_telemetry: self.last_telemetry.clone(),
            active: self.active,
        }
    }
}

impl Actor<FleetMsg> for DeviceActor {
    fn init(&mut self, ctx: ActorCtx<FleetMsg>) -> Result<(), ActorError> {
        self.load_profile().map_err(ActorError::failed)?;
        self.ctx = Some(ctx);
        self.schedule_inactivity_check();
        debug!(device_id = %self.device_id, profile = %self.profile.name, "Device actor initialized");
        Ok(())
    }

    fn process(&mut self, msg: FleetMsg) -> Result<(), ActorError> {
        match msg {
            FleetMsg::Telemetry { data, .. } => self.on_telemetry(data),
            FleetMsg::GetDeviceState { respond_to, .. } => {
                respond_to.send(Ok(self.state()));
                Ok(())
            }
            FleetMsg::ProfileUpdated => {
                self.load_profile()
                    .map_err(|err| ActorError::reinit_required(err.to_string()))?;
                debug!(device_id = %self.device_id, version = self.profile.version, "Profile reloaded");
                Ok(())
            }
            FleetMsg::InactivityCheck => {
                self.on_inactivity_check();
                Ok(())
            }
            other => {
                warn!(device_id = %self.device_id, msg = ?other, "Unexpected message for device");
                Ok(())
            }
        }
    }

    fn destroy(&mut self, reason: StopReason) {
        info!(device_id = %self.device_id, stop_reason = %reason, "Device actor stopped");
    }

    fn on_init_failure(&mut self, attempt: u32, error: &ActorError) -> InitFailureStrategy {
        // Only a profile change can fix a bad profile.
        warn!(device_id = %self.device_id, attempt, error = %error, "Device init failed");
        InitFailureStrategy::stop()
    }
}

pub struct DeviceCreator {
    device_id: EntityId,
    profiles: watch::Receiver<DeviceProfile>,
    inactivity_timeout: Duration,
}

impl DeviceCreator {
    pub fn new(device_id: EntityId, profiles: watch::Receiver<DeviceProfile>, inactivity_timeout: Duration) -> Self {
        Self {
            device_id,
            profiles,
            inactivity_timeout,
        }
    }
}

impl ActorCreator<FleetMsg> for DeviceCreator {
    fn create_actor_id(&self) -> ActorId {
        ActorId::entity(self.device_id)
    }

    fn create_actor(self) -> Result<Box<dyn Actor<FleetMsg>>, ActorError> {
        Ok(Box::new(DeviceActor::new(
            self.device_id,
            self.profiles,
            self.inactivity_timeout,
        )))
    }
}
