//! Plain data shared by the fleet actors.

use actor_system::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub ts: u64,
    pub key: String,
    pub value: f64,
}

impl Telemetry {
    pub fn new(ts: u64, key: impl Into<String>, value: f64) -> Self {
        Self {
            ts,
            key: key.into(),
            value,
        }
    }
}

/// Configuration every device of a tenant runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub version: u32,
}

impl DeviceProfile {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::new("default", 1)
    }
}

/// Snapshot returned by [`FleetMsg::GetDeviceState`](crate::messages::FleetMsg::GetDeviceState).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub device_id: EntityId,
    pub profile: DeviceProfile,
    pub telemetry_count: u64,
    pub rejected_count: u64,
    pub last_telemetry: Option<Telemetry>,
    pub active: bool,
}
