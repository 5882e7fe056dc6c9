use std::sync::Arc;

use super::{Entity, EntityCategory, DOMAIN};
use crate::coordinator::Coordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDeviceClass {
    Temperature,
    Humidity,
    Battery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    IndoorTemperature,
    IndoorHumidity,
    OutdoorTemperature,
    ZoneTemperature(u8),
    ZoneHumidity(u8),
    ZoneBattery(u8),
}

impl SensorKind {
    pub fn device_class(&self) -> SensorDeviceClass {
        match self {
            SensorKind::IndoorTemperature
            | SensorKind::OutdoorTemperature
            | SensorKind::ZoneTemperature(_) => SensorDeviceClass::Temperature,
            SensorKind::IndoorHumidity | SensorKind::ZoneHumidity(_) => SensorDeviceClass::Humidity,
            SensorKind::ZoneBattery(_) => SensorDeviceClass::Battery,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self.device_class() {
            SensorDeviceClass::Temperature => "\u{00b0}C",
            SensorDeviceClass::Humidity | SensorDeviceClass::Battery => "%",
        }
    }

    fn key(&self) -> String {
        match self {
            SensorKind::IndoorTemperature => "indoor_temperature".to_string(),
            SensorKind::IndoorHumidity => "indoor_humidity".to_string(),
            SensorKind::OutdoorTemperature => "outdoor_temperature".to_string(),
            SensorKind::ZoneTemperature(id) => format!("zone_{id}_temperature"),
            SensorKind::ZoneHumidity(id) => format!("zone_{id}_humidity"),
            SensorKind::ZoneBattery(id) => format!("zone_{id}_battery"),
        }
    }
}

pub struct ActronSensor {
    coordinator: Arc<Coordinator>,
    kind: SensorKind,
}

impl ActronSensor {
    pub fn new(coordinator: Arc<Coordinator>, kind: SensorKind) -> Self {
        Self { coordinator, kind }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// `None` when the unit did not report the value.
    pub fn native_value(&self) -> Option<f64> {
        let status = self.coordinator.data()?;
        match self.kind {
            SensorKind::IndoorTemperature => status.main.indoor_temp,
            SensorKind::IndoorHumidity => status.main.indoor_humidity,
            SensorKind::OutdoorTemperature => status.main.outdoor_temp,
            SensorKind::ZoneTemperature(id) => status.zone(id)?.temp,
            SensorKind::ZoneHumidity(id) => status.zone(id)?.humidity,
            SensorKind::ZoneBattery(id) => self.coordinator.zone_peripheral(id)?.battery_pc,
        }
    }
}

impl Entity for ActronSensor {
    fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    fn unique_id(&self) -> String {
        format!("{DOMAIN}_{}_{}", self.coordinator.device_id(), self.kind.key())
    }

    fn name(&self) -> String {
        let device = &self.coordinator.device().name;
        let zone_name = |id: u8| {
            self.coordinator
                .data()
                .and_then(|s| s.zone(id).map(|z| z.name.clone()))
                .unwrap_or_else(|| format!("Zone {}", id + 1))
        };
        match self.kind {
            SensorKind::IndoorTemperature => format!("{device} Indoor Temperature"),
            SensorKind::IndoorHumidity => format!("{device} Indoor Humidity"),
            SensorKind::OutdoorTemperature => format!("{device} Outdoor Temperature"),
            SensorKind::ZoneTemperature(id) => format!("{device} {} Temperature", zone_name(id)),
            SensorKind::ZoneHumidity(id) => format!("{device} {} Humidity", zone_name(id)),
            SensorKind::ZoneBattery(id) => format!("{device} {} Battery", zone_name(id)),
        }
    }

    fn entity_category(&self) -> Option<EntityCategory> {
        match self.kind {
            SensorKind::ZoneBattery(_) => Some(EntityCategory::Diagnostic),
            _ => None,
        }
    }
}

/// System sensors, plus temperature and humidity per zone and a battery
/// sensor for every zone with an assigned wireless sensor.
pub fn setup_entry(coordinator: &Arc<Coordinator>, add_entities: impl FnOnce(Vec<ActronSensor>)) {
    let mut kinds = vec![
        SensorKind::IndoorTemperature,
        SensorKind::IndoorHumidity,
        SensorKind::OutdoorTemperature,
    ];
    if let Some(status) = coordinator.data() {
        for &id in status.zones.keys() {
            kinds.push(SensorKind::ZoneTemperature(id));
            kinds.push(SensorKind::ZoneHumidity(id));
            if coordinator.zone_peripheral(id).is_some() {
                kinds.push(SensorKind::ZoneBattery(id));
            }
        }
    }
    add_entities(
        kinds
            .into_iter()
            .map(|kind| ActronSensor::new(Arc::clone(coordinator), kind))
            .collect(),
    );
}
