//! # Tenant Actor
//!
//! Root of a tenant's actor tree. Routes device traffic to per-device children, creating
//! them on first telemetry, and publishes profile changes to every device.

use crate::device_actor::DeviceCreator;
use crate::error::FleetError;
use crate::messages::FleetMsg;
use crate::model::DeviceProfile;
use actor_system::{Actor, ActorCreator, ActorCtx, ActorError, ActorId, ActorRef, EntityId, EntityType};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct TenantActor {
    tenant_id: EntityId,
    device_dispatcher: String,
    inactivity_timeout: Duration,
    profiles: watch::Sender<DeviceProfile>,
    ctx: Option<ActorCtx<FleetMsg>>,
}

impl TenantActor {
    fn ctx(&self) -> Result<&ActorCtx<FleetMsg>, ActorError> {
        self.ctx
            .as_ref()
            .ok_or_else(|| ActorError::reinit_required("tenant context missing"))
    }

    fn device_ref(&self, device_id: EntityId, create: bool) -> Result<Option<ActorRef<FleetMsg>>, ActorError> {
        let ctx = self.ctx()?;
        ctx.get_or_create_child_actor(
            &ActorId::entity(device_id),
            || self.device_dispatcher.clone(),
            || DeviceCreator::new(device_id, self.profiles.subscribe(), self.inactivity_timeout),
            || create,
        )
        .map_err(ActorError::failed)
    }

    fn devices(&self) -> Vec<EntityId> {
        self.ctx
            .as_ref()
            .map(|ctx| {
                ctx.filter_children(|id| id.entity_type() == Some(EntityType::Device))
                    .iter()
                    .filter_map(|id| id.entity_id().copied())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Actor<FleetMsg> for TenantActor {
    fn init(&mut self, ctx: ActorCtx<FleetMsg>) -> Result<(), ActorError> {
        self.ctx = Some(ctx);
        info!(tenant_id = %self.tenant_id, "Tenant actor started");
        Ok(())
    }

    fn process(&mut self, msg: FleetMsg) -> Result<(), ActorError> {
        match msg {
            FleetMsg::Telemetry { device_id, data } => {
                if let Some(device) = self.device_ref(device_id, true)? {
                    device.tell(FleetMsg::Telemetry { device_id, data });
                }
            }
            FleetMsg::GetDeviceState { device_id, respond_to } => match self.device_ref(device_id, false)? {
                Some(device) => device.tell(FleetMsg::GetDeviceState { device_id, respond_to }),
                None => {
                    respond_to.send(Err(FleetError::UnknownDevice(device_id)));
                }
            },
            FleetMsg::UpdateProfile(profile) => {
                debug!(tenant_id = %self.tenant_id, version = profile.version, "Broadcasting profile update to devices");
                self.profiles.send_replace(profile);
                self.ctx()?.broadcast_to_children_with_priority(FleetMsg::ProfileUpdated, true);
            }
            FleetMsg::DeleteDevice { device_id } => {
                info!(tenant_id = %self.tenant_id, device_id = %device_id, "Deleting device");
                self.ctx()?.stop(&ActorId::entity(device_id));
            }
            FleetMsg::ListDevices { respond_to } => {
                respond_to.send(self.devices());
            }
            other @ (FleetMsg::ProfileUpdated | FleetMsg::InactivityCheck) => {
                warn!(tenant_id = %self.tenant_id, msg = ?other, "Unexpected message for tenant");
            }
        }
        Ok(())
    }
}

pub struct TenantCreator {
    tenant_id: EntityId,
    device_dispatcher: String,
    inactivity_timeout: Duration,
    profile: DeviceProfile,
}

impl TenantCreator {
    pub fn new(
        tenant_id: EntityId,
        device_dispatcher: impl Into<String>,
        inactivity_timeout: Duration,
        profile: DeviceProfile,
    ) -> Self {
        Self {
            tenant_id,
            device_dispatcher: device_dispatcher.into(),
            inactivity_timeout,
            profile,
        }
    }
}

impl ActorCreator<FleetMsg> for TenantCreator {
    fn create_actor_id(&self) -> ActorId {
        ActorId::entity(self.tenant_id)
    }

    fn create_actor(self) -> Result<Box<dyn Actor<FleetMsg>>, ActorError> {
        Ok(Box::new(TenantActor {
            tenant_id: self.tenant_id,
            device_dispatcher: self.device_dispatcher,
            inactivity_timeout: self.inactivity_timeout,
            profiles: watch::channel(self.profile).0,
            ctx: None,
        }))
    }
}
