//! Host-facing entity adapters. Each one is a view over a shared
//! [`Coordinator`]; none of them keeps state of its own beyond identity.

pub mod binary_sensor;
pub mod climate;
pub mod sensor;

use serde::Serialize;

use crate::coordinator::Coordinator;

pub const DOMAIN: &str = "actron_air_neo";
pub const MANUFACTURER: &str = "ActronAir";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityCategory {
    Diagnostic,
}

/// Device registry record shared by every entity of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: (String, String),
    pub name: String,
    pub manufacturer: &'static str,
    pub model: Option<String>,
    pub sw_version: Option<String>,
}

impl DeviceInfo {
    pub fn for_coordinator(coordinator: &Coordinator) -> Self {
        let data = coordinator.data();
        let main = data.as_ref().map(|d| &d.main);
        Self {
            identifier: (DOMAIN.to_string(), coordinator.device_id().to_string()),
            name: coordinator.device().name.clone(),
            manufacturer: MANUFACTURER,
            model: main.and_then(|m| m.model.clone()),
            sw_version: main.and_then(|m| m.firmware_version.clone()),
        }
    }
}

pub trait Entity {
    fn coordinator(&self) -> &Coordinator;

    fn unique_id(&self) -> String;

    fn name(&self) -> String;

    /// Unavailable until the first good poll and after any failed one.
    fn available(&self) -> bool {
        self.coordinator().last_update_success() && self.coordinator().data().is_some()
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::for_coordinator(self.coordinator())
    }

    fn entity_category(&self) -> Option<EntityCategory> {
        None
    }
}
