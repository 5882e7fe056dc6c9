use std::sync::Arc;

use tracing::{debug, error, warn};

use super::Entity;
use crate::coordinator::Coordinator;
use crate::types::{FanMode, HvacMode, Status};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacAction {
    Off,
    Cooling,
    Heating,
    Fan,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    None,
    Away,
}

impl Preset {
    pub fn as_host_str(&self) -> &'static str {
        match self {
            Preset::None => "none",
            Preset::Away => "away",
        }
    }

    pub fn from_host_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Preset::None),
            "away" => Some(Preset::Away),
            _ => None,
        }
    }
}

/// Climate control for the whole system, or for one zone when `zone` is set.
///
/// Mode, fan and preset are system-wide either way; only temperatures and
/// setpoints are zone-scoped.
pub struct ActronClimate {
    coordinator: Arc<Coordinator>,
    zone: Option<u8>,
}

impl ActronClimate {
    pub fn system(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator, zone: None }
    }

    pub fn zone(coordinator: Arc<Coordinator>, zone_id: u8) -> Self {
        Self {
            coordinator,
            zone: Some(zone_id),
        }
    }

    pub fn zone_id(&self) -> Option<u8> {
        self.zone
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        &HvacMode::ALL
    }

    pub fn fan_modes(&self) -> &'static [FanMode] {
        &FanMode::ALL
    }

    pub fn preset_modes(&self) -> [Preset; 2] {
        [Preset::None, Preset::Away]
    }

    fn read<T>(&self, f: impl FnOnce(&Status) -> Option<T>) -> Option<T> {
        self.coordinator.data().and_then(|s| f(&s))
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.read(|s| match self.zone {
            Some(id) => s.zone(id)?.temp,
            None => s.main.indoor_temp,
        })
    }

    pub fn current_humidity(&self) -> Option<f64> {
        self.read(|s| match self.zone {
            Some(id) => s.zone(id)?.humidity,
            None => s.main.indoor_humidity,
        })
    }

    /// Setpoint for the current mode; `None` outside cool and heat.
    pub fn target_temperature(&self) -> Option<f64> {
        self.read(|s| {
            let cooling = match s.effective_mode() {
                HvacMode::Cool => true,
                HvacMode::Heat => false,
                _ => return None,
            };
            match (self.zone, cooling) {
                (Some(id), true) => s.zone(id)?.setpoint_cool,
                (Some(id), false) => s.zone(id)?.setpoint_heat,
                (None, true) => s.main.temp_setpoint_cool,
                (None, false) => s.main.temp_setpoint_heat,
            }
        })
    }

    pub fn hvac_mode(&self) -> HvacMode {
        self.read(|s| Some(s.effective_mode()))
            .unwrap_or(HvacMode::Off)
    }

    pub fn hvac_action(&self) -> HvacAction {
        match self.hvac_mode() {
            HvacMode::Off => HvacAction::Off,
            HvacMode::Cool => HvacAction::Cooling,
            HvacMode::Heat => HvacAction::Heating,
            HvacMode::FanOnly => HvacAction::Fan,
            HvacMode::Auto => HvacAction::Idle,
        }
    }

    pub fn fan_mode(&self) -> Option<FanMode> {
        self.read(|s| s.main.fan_mode)
    }

    pub fn preset_mode(&self) -> Preset {
        match self.read(|s| Some(s.main.away_mode)) {
            Some(true) => Preset::Away,
            _ => Preset::None,
        }
    }

    /// Writes the setpoint matching the *current* mode. In off, fan-only and
    /// auto nothing is written; a refresh is still requested and its failure
    /// only logged.
    pub async fn set_temperature(&self, value: f64) -> Result<()> {
        let cooling = match self.hvac_mode() {
            HvacMode::Cool => true,
            HvacMode::Heat => false,
            mode => {
                debug!(?mode, "no setpoint to write in this mode");
                if let Err(e) = self.coordinator.refresh().await {
                    warn!("refresh after ignored setpoint failed: {e}");
                }
                return Ok(());
            }
        };
        let result = match self.zone {
            Some(id) => self.coordinator.set_zone_temperature(id, value, cooling).await,
            None => self.coordinator.set_temperature(value, cooling).await,
        };
        result.inspect_err(|e| error!("failed to set temperature: {e}"))
    }

    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<()> {
        self.coordinator
            .set_hvac_mode(mode)
            .await
            .inspect_err(|e| error!("failed to set HVAC mode: {e}"))
    }

    pub async fn set_fan_mode(&self, mode: FanMode) -> Result<()> {
        self.coordinator
            .set_fan_mode(mode)
            .await
            .inspect_err(|e| error!("failed to set fan mode: {e}"))
    }

    pub async fn set_preset_mode(&self, preset: Preset) -> Result<()> {
        self.coordinator
            .set_away_mode(preset == Preset::Away)
            .await
            .inspect_err(|e| error!("failed to set preset mode: {e}"))
    }

    /// Host-vocabulary entry points.
    pub async fn set_hvac_mode_str(&self, mode: &str) -> Result<()> {
        let mode = HvacMode::from_host_str(mode).ok_or_else(|| Error::InvalidMode(mode.to_string()))?;
        self.set_hvac_mode(mode).await
    }

    pub async fn set_fan_mode_str(&self, mode: &str) -> Result<()> {
        let mode = FanMode::from_host_str(mode).ok_or_else(|| Error::InvalidMode(mode.to_string()))?;
        self.set_fan_mode(mode).await
    }

    pub async fn set_preset_mode_str(&self, preset: &str) -> Result<()> {
        let preset = Preset::from_host_str(preset).ok_or_else(|| Error::InvalidMode(preset.to_string()))?;
        self.set_preset_mode(preset).await
    }
}

impl Entity for ActronClimate {
    fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    fn unique_id(&self) -> String {
        match self.zone {
            Some(id) => format!("{}_{}_zone_{id}", super::DOMAIN, self.coordinator.device_id()),
            None => format!("{}_climate", self.coordinator.device_id()),
        }
    }

    fn name(&self) -> String {
        let zone_name = self
            .zone
            .and_then(|id| self.read(|s| s.zone(id).map(|z| z.name.clone())));
        match (self.zone, zone_name) {
            (Some(_), Some(name)) => format!("{} {name}", self.coordinator.device().name),
            (Some(id), None) => format!("{} Zone {}", self.coordinator.device().name, id + 1),
            (None, _) => self.coordinator.device().name.clone(),
        }
    }
}

/// One climate entity for the system plus one per zone in the current
/// snapshot.
pub fn setup_entry(coordinator: &Arc<Coordinator>, add_entities: impl FnOnce(Vec<ActronClimate>)) {
    let mut entities = vec![ActronClimate::system(Arc::clone(coordinator))];
    if let Some(status) = coordinator.data() {
        entities.extend(
            status
                .zones
                .keys()
                .map(|&id| ActronClimate::zone(Arc::clone(coordinator), id)),
        );
    }
    add_entities(entities);
}
