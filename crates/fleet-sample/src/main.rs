//! # Fleet Sample
//!
//! Runs a short device-fleet scenario on the actor system:
//!
//! 1. Starts a [`FleetSystem`] with one tenant.
//! 2. Streams telemetry from a handful of devices (one of them reports a broken value).
//! 3. Publishes a new device profile to every device.
//! 4. Deletes one device and lists the remaining ones.
//!
//! ```bash
//! RUST_LOG=info cargo run -p fleet-sample
//! RUST_LOG=debug cargo run -p fleet-sample
//! ```

use actor_system::tracing::setup_tracing;
use actor_system::{EntityId, EntityType};
use fleet_sample::error::FleetError;
use fleet_sample::lifecycle::{FleetSettings, FleetSystem};
use fleet_sample::model::{DeviceProfile, Telemetry};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), FleetError> {
    setup_tracing();

    let fleet = FleetSystem::new(FleetSettings::default())?;
    let devices: Vec<EntityId> = (0..3).map(|_| EntityId::random(EntityType::Device)).collect();

    let span = tracing::info_span!("telemetry");
    async {
        for (ts, device_id) in devices.iter().enumerate() {
            fleet.send_telemetry(*device_id, Telemetry::new(ts as u64, "temperature", 20.0 + ts as f64))?;
        }
        fleet.send_telemetry(devices[0], Telemetry::new(10, "temperature", f64::NAN))?;
        Ok::<_, FleetError>(())
    }
    .instrument(span)
    .await?;

    for device_id in &devices {
        match fleet.get_device_state(*device_id).await {
            Ok(state) => info!(
                device_id = %device_id,
                telemetry = state.telemetry_count,
                rejected = state.rejected_count,
                "Device state"
            ),
            Err(e) => error!(device_id = %device_id, error = %e, "Failed to read device state"),
        }
    }

    fleet.update_profile(DeviceProfile::new("thermostat", 2))?;
    let state = fleet.get_device_state(devices[1]).await?;
    info!(device_id = %devices[1], profile = %state.profile.name, version = state.profile.version, "Profile applied");

    fleet.delete_device(devices[2])?;
    let remaining = fleet.list_devices().await?;
    info!(count = remaining.len(), "Devices after deletion");

    fleet.shutdown();
    info!("Application completed successfully");
    Ok(())
}
