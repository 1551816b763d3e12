//! # Fleet Sample
//!
//! A small device-fleet service built on [`actor_system`].
//!
//! ## Core Components
//!
//! - **[model]**: plain data ([`Telemetry`](model::Telemetry), [`DeviceProfile`](model::DeviceProfile),
//!   [`DeviceState`](model::DeviceState)).
//! - **[messages]**: [`FleetMsg`](messages::FleetMsg), the single message type every actor in the
//!   fleet exchanges, and [`Reply`](messages::Reply) for request/response.
//! - **[tenant_actor]**: the root actor. It owns one child per device and fans profile updates out.
//! - **[device_actor]**: per-device state, inactivity tracking.
//! - **[lifecycle]**: [`FleetSystem`](lifecycle::FleetSystem) wires dispatchers, the tenant and the
//!   client-facing API together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleet_sample::lifecycle::{FleetSettings, FleetSystem};
//! use fleet_sample::model::Telemetry;
//! use actor_system::{EntityId, EntityType};
//!
//! # async fn run() -> Result<(), fleet_sample::error::FleetError> {
//! let fleet = FleetSystem::new(FleetSettings::default())?;
//! let device = EntityId::random(EntityType::Device);
//! fleet.send_telemetry(device, Telemetry::new(1, "temperature", 21.5))?;
//! let state = fleet.get_device_state(device).await?;
//! assert_eq!(state.telemetry_count, 1);
//! fleet.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod device_actor;
pub mod error;
pub mod lifecycle;
pub mod messages;
pub mod model;
pub mod tenant_actor;
