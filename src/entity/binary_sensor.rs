use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::{Entity, EntityCategory};
use crate::coordinator::Coordinator;
use crate::normalize::{bool_at, device_state, string_at};
use crate::types::{FanMode, HvacMode, Peripheral};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySensorDeviceClass {
    Problem,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    FilterStatus,
    SystemStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDiagnostics {
    pub enabled: bool,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub peripheral: Option<Peripheral>,
}

/// Wi-Fi module state, from `SystemStatus_Local`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionDiagnostics {
    pub wifi_strength_of3: Option<u64>,
    pub wifi_firmware: Option<String>,
    pub uptime_s: Option<u64>,
}

/// Live running flags, from `LiveAircon`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceDiagnostics {
    pub fan_running: bool,
    pub system_on: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitInfo {
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub serial: Option<String>,
}

/// Wall controller, indoor and outdoor unit identity, from `AirconSystem`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HardwareDiagnostics {
    pub controller: UnitInfo,
    pub indoor: UnitInfo,
    pub outdoor: UnitInfo,
}

/// Extra attributes of the system status sensor. Fields the unit did not
/// report stay `None`, as do whole groups whose section is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemAttributes {
    pub operating_mode: Option<HvacMode>,
    pub fan_mode: Option<FanMode>,
    pub compressor_state: Option<String>,
    pub defrosting: bool,
    pub quiet_mode: bool,
    pub away_mode: bool,
    pub filter_clean_required: bool,
    pub firmware_version: Option<String>,
    pub last_status_update: Option<String>,
    pub zones: BTreeMap<String, ZoneDiagnostics>,
    pub connection: Option<ConnectionDiagnostics>,
    pub performance: Option<PerformanceDiagnostics>,
    pub hardware: Option<HardwareDiagnostics>,
}

fn object<'a>(v: &'a Value, key: &str) -> Option<&'a Value> {
    v.get(key).filter(|v| v.is_object())
}

fn unit_info(v: Option<&Value>, model: &str, firmware: &str, serial: &str) -> UnitInfo {
    let Some(v) = v else {
        return UnitInfo::default();
    };
    UnitInfo {
        model: string_at(v, model),
        firmware: string_at(v, firmware),
        serial: string_at(v, serial),
    }
}

fn connection(state: &Value) -> Option<ConnectionDiagnostics> {
    let local = object(state, "SystemStatus_Local")?;
    Some(ConnectionDiagnostics {
        wifi_strength_of3: local.get("WifiStrength_of3").and_then(Value::as_u64),
        wifi_firmware: object(local, "WiFi").and_then(|w| string_at(w, "FirmwareVersion")),
        uptime_s: local.get("Uptime_s").and_then(Value::as_u64),
    })
}

fn performance(state: &Value) -> Option<PerformanceDiagnostics> {
    let live = object(state, "LiveAircon")?;
    Some(PerformanceDiagnostics {
        fan_running: bool_at(live, "AmRunningFan"),
        system_on: bool_at(live, "SystemOn"),
    })
}

fn hardware(state: &Value) -> Option<HardwareDiagnostics> {
    let system = object(state, "AirconSystem")?;
    Some(HardwareDiagnostics {
        controller: unit_info(
            Some(system),
            "MasterWCModel",
            "MasterWCFirmwareVersion",
            "MasterSerial",
        ),
        indoor: unit_info(
            object(system, "IndoorUnit"),
            "NV_ModelNumber",
            "IndoorFW",
            "SerialNumber",
        ),
        outdoor: unit_info(
            object(system, "OutdoorUnit"),
            "ModelNumber",
            "SoftwareVersion",
            "SerialNumber",
        ),
    })
}

pub struct DiagnosticSensor {
    coordinator: Arc<Coordinator>,
    kind: DiagnosticKind,
}

impl DiagnosticSensor {
    pub fn new(coordinator: Arc<Coordinator>, kind: DiagnosticKind) -> Self {
        Self { coordinator, kind }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn device_class(&self) -> BinarySensorDeviceClass {
        match self.kind {
            DiagnosticKind::FilterStatus => BinarySensorDeviceClass::Problem,
            DiagnosticKind::SystemStatus => BinarySensorDeviceClass::Running,
        }
    }

    /// Filter: cleaning required. System: unit switched on. Defaults to
    /// false before the first poll.
    pub fn is_on(&self) -> bool {
        self.coordinator.data().is_some_and(|s| match self.kind {
            DiagnosticKind::FilterStatus => s.main.filter_clean_required,
            DiagnosticKind::SystemStatus => s.main.is_on,
        })
    }

    pub fn filter_status(&self) -> &'static str {
        let dirty = self
            .coordinator
            .data()
            .is_some_and(|s| s.main.filter_clean_required);
        if dirty { "Needs Cleaning" } else { "Clean" }
    }

    pub fn system_attributes(&self) -> SystemAttributes {
        let Some(status) = self.coordinator.data() else {
            return SystemAttributes::default();
        };
        let main = &status.main;
        let zones = status
            .zones
            .iter()
            .map(|(&id, zone)| {
                (
                    zone.name.clone(),
                    ZoneDiagnostics {
                        enabled: zone.is_enabled,
                        temperature: zone.temp,
                        humidity: zone.humidity,
                        peripheral: self.coordinator.zone_peripheral(id),
                    },
                )
            })
            .collect();
        let state = device_state(self.coordinator.device_id(), &status.raw_data);

        SystemAttributes {
            operating_mode: main.mode,
            fan_mode: main.fan_mode,
            compressor_state: main.compressor_state.clone(),
            defrosting: main.defrosting,
            quiet_mode: main.quiet_mode,
            away_mode: main.away_mode,
            filter_clean_required: main.filter_clean_required,
            firmware_version: main.firmware_version.clone(),
            last_status_update: status
                .raw_data
                .get("lastStatusUpdate")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            zones,
            connection: state.and_then(connection),
            performance: state.and_then(performance),
            hardware: state.and_then(hardware),
        }
    }
}

impl Entity for DiagnosticSensor {
    fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    fn unique_id(&self) -> String {
        let suffix = match self.kind {
            DiagnosticKind::FilterStatus => "filter_status",
            DiagnosticKind::SystemStatus => "system_status",
        };
        format!("{}_{suffix}", self.coordinator.device_id())
    }

    fn name(&self) -> String {
        match self.kind {
            DiagnosticKind::FilterStatus => "Filter Status".to_string(),
            DiagnosticKind::SystemStatus => "System Status".to_string(),
        }
    }

    fn entity_category(&self) -> Option<EntityCategory> {
        Some(EntityCategory::Diagnostic)
    }
}

pub fn setup_entry(coordinator: &Arc<Coordinator>, add_entities: impl FnOnce(Vec<DiagnosticSensor>)) {
    add_entities(vec![
        DiagnosticSensor::new(Arc::clone(coordinator), DiagnosticKind::FilterStatus),
        DiagnosticSensor::new(Arc::clone(coordinator), DiagnosticKind::SystemStatus),
    ]);
}
