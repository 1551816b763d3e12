//! # Fleet Lifecycle
//!
//! [`FleetSystem`] is the conductor of the sample: it starts the actor system, registers
//! one dispatcher per actor tier and creates the tenant root actor. The rest of the
//! application only talks to the fleet through its methods.
//!
//! ## Dispatchers
//!
//! | Dispatcher            | Threads                        | Actors          |
//! |-----------------------|--------------------------------|-----------------|
//! | `tenant-dispatcher`   | 1                              | [`TenantActor`](crate::tenant_actor::TenantActor) |
//! | `device-dispatcher`   | [`FleetSettings::device_threads`] | [`DeviceActor`](crate::device_actor::DeviceActor) |
//!
//! ## Request / Response
//!
//! Queries such as [`FleetSystem::get_device_state`] send a message carrying a
//! [`Reply`] and await the matching receiver. If the device stops first, the message's
//! stopped-hook answers with [`FleetError::ActorStopped`].
//!
//! ## Shutdown
//!
//! [`FleetSystem::shutdown`] stops every dispatcher and the scheduler. Requests still
//! queued at that moment are answered with an error.

use crate::error::FleetError;
use crate::messages::{FleetMsg, Reply};
use crate::model::{DeviceProfile, DeviceState, Telemetry};
use crate::tenant_actor::TenantCreator;
use actor_system::{
    ActorId, ActorRef, ActorSystem, ActorSystemError, ActorSystemSettings, Dispatcher, EntityId, EntityType,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const TENANT_DISPATCHER: &str = "tenant-dispatcher";
pub const DEVICE_DISPATCHER: &str = "device-dispatcher";

#[derive(Debug, Clone)]
pub struct FleetSettings {
    pub actors: ActorSystemSettings,
    pub device_threads: usize,
    pub inactivity_timeout: Duration,
    pub profile: DeviceProfile,
}

impl Default for FleetSettings {
    fn default() -> Self {
        Self {
            actors: ActorSystemSettings::default(),
            device_threads: 4,
            inactivity_timeout: Duration::from_secs(30),
            profile: DeviceProfile::default(),
        }
    }
}

pub struct FleetSystem {
    system: Arc<ActorSystem<FleetMsg>>,
    tenant: ActorRef<FleetMsg>,
}

impl FleetSystem {
    pub fn new(settings: FleetSettings) -> Result<Self, FleetError> {
        let system = ActorSystem::new(settings.actors)?;
        system.create_dispatcher(
            TENANT_DISPATCHER,
            Dispatcher::fixed_thread_pool("tenant", 1).map_err(ActorSystemError::from)?,
        )?;
        system.create_dispatcher(
            DEVICE_DISPATCHER,
            Dispatcher::fixed_thread_pool("device", settings.device_threads).map_err(ActorSystemError::from)?,
        )?;

        let tenant_id = EntityId::random(EntityType::Tenant);
        let tenant = system.create_root_actor(
            TENANT_DISPATCHER,
            TenantCreator::new(
                tenant_id,
                DEVICE_DISPATCHER,
                settings.inactivity_timeout,
                settings.profile,
            ),
        )?;
        info!(tenant_id = %tenant_id, "Fleet system started");
        Ok(Self { system, tenant })
    }

    pub fn tenant_id(&self) -> &ActorId {
        self.tenant.id()
    }

    pub fn actor_system(&self) -> &Arc<ActorSystem<FleetMsg>> {
        &self.system
    }

    fn tell_tenant(&self, msg: FleetMsg) -> Result<(), FleetError> {
        self.system.tell(self.tenant.id(), msg)?;
        Ok(())
    }

    pub fn send_telemetry(&self, device_id: EntityId, data: Telemetry) -> Result<(), FleetError> {
        self.tell_tenant(FleetMsg::Telemetry { device_id, data })
    }

    pub async fn get_device_state(&self, device_id: EntityId) -> Result<DeviceState, FleetError> {
        let (respond_to, response) = Reply::channel();
        self.tell_tenant(FleetMsg::GetDeviceState { device_id, respond_to })?;
        response.await?
    }

    /// Publishes a new profile. Devices reload it, and devices stopped by a bad profile
    /// are initialized again.
    pub fn update_profile(&self, profile: DeviceProfile) -> Result<(), FleetError> {
        self.system
            .tell_with_high_priority(self.tenant.id(), FleetMsg::UpdateProfile(profile))?;
        Ok(())
    }

    pub fn delete_device(&self, device_id: EntityId) -> Result<(), FleetError> {
        self.tell_tenant(FleetMsg::DeleteDevice { device_id })
    }

    pub async fn list_devices(&self) -> Result<Vec<EntityId>, FleetError> {
        let (respond_to, response) = Reply::channel();
        self.tell_tenant(FleetMsg::ListDevices { respond_to })?;
        Ok(response.await?)
    }

    pub fn shutdown(&self) {
        info!(tenant_id = %self.tenant.id(), "Stopping fleet system");
        self.system.shutdown();
    }
}
