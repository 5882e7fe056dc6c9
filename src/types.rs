use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// An AC system registered on the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub serial: String,
    pub name: String,
    pub device_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HvacMode {
    Off,
    Auto,
    Cool,
    Heat,
    FanOnly,
}

impl HvacMode {
    pub const ALL: [HvacMode; 5] = [
        HvacMode::Off,
        HvacMode::Auto,
        HvacMode::Cool,
        HvacMode::Heat,
        HvacMode::FanOnly,
    ];

    pub fn as_actron_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "OFF",
            HvacMode::Auto => "AUTO",
            HvacMode::Cool => "COOL",
            HvacMode::Heat => "HEAT",
            HvacMode::FanOnly => "FAN",
        }
    }

    pub fn from_actron_str(s: &str) -> Option<Self> {
        match s {
            "OFF" => Some(HvacMode::Off),
            "AUTO" => Some(HvacMode::Auto),
            "COOL" => Some(HvacMode::Cool),
            "HEAT" => Some(HvacMode::Heat),
            "FAN" => Some(HvacMode::FanOnly),
            _ => None,
        }
    }

    /// Name used by the automation host.
    pub fn as_host_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Auto => "auto",
            HvacMode::Cool => "cool",
            HvacMode::Heat => "heat",
            HvacMode::FanOnly => "fan_only",
        }
    }

    pub fn from_host_str(s: &str) -> Option<Self> {
        HvacMode::ALL.into_iter().find(|m| m.as_host_str() == s)
    }
}

const CONTINUOUS_SUFFIX: &str = "+CONT";

/// True when a vendor fan mode string keeps the fan running between cycles.
pub fn is_continuous_fan(s: &str) -> bool {
    s.ends_with(CONTINUOUS_SUFFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FanMode {
    Auto,
    Low,
    Medium,
    High,
}

impl FanMode {
    pub const ALL: [FanMode; 4] = [FanMode::Auto, FanMode::Low, FanMode::Medium, FanMode::High];

    pub fn as_actron_str(&self) -> &'static str {
        match self {
            FanMode::Auto => "AUTO",
            FanMode::Low => "LOW",
            FanMode::Medium => "MEDIUM",
            FanMode::High => "HIGH",
        }
    }

    /// Vendor string for a command, with the continuous-fan suffix when
    /// `continuous` is set.
    pub fn command_str(&self, continuous: bool) -> String {
        if continuous {
            format!("{}{CONTINUOUS_SUFFIX}", self.as_actron_str())
        } else {
            self.as_actron_str().to_string()
        }
    }

    /// Parses a vendor fan mode. The continuous-fan suffix (`+CONT`) is
    /// dropped, see [`is_continuous_fan`], and the short spelling `MED` is
    /// accepted.
    pub fn from_actron_str(s: &str) -> Option<Self> {
        let base = s.strip_suffix(CONTINUOUS_SUFFIX).unwrap_or(s);
        match base {
            "AUTO" => Some(FanMode::Auto),
            "LOW" => Some(FanMode::Low),
            "MED" | "MEDIUM" => Some(FanMode::Medium),
            "HIGH" => Some(FanMode::High),
            _ => None,
        }
    }

    pub fn as_host_str(&self) -> &'static str {
        match self {
            FanMode::Auto => "auto",
            FanMode::Low => "low",
            FanMode::Medium => "medium",
            FanMode::High => "high",
        }
    }

    pub fn from_host_str(s: &str) -> Option<Self> {
        FanMode::ALL.into_iter().find(|m| m.as_host_str() == s)
    }
}

/// System-wide fields of a poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MainStatus {
    pub is_on: bool,
    pub mode: Option<HvacMode>,
    pub fan_mode: Option<FanMode>,
    /// Fan keeps running once the setpoint is reached (`+CONT`).
    pub fan_continuous: bool,
    pub away_mode: bool,
    pub quiet_mode: bool,
    pub indoor_temp: Option<f64>,
    pub indoor_humidity: Option<f64>,
    pub outdoor_temp: Option<f64>,
    pub temp_setpoint_cool: Option<f64>,
    pub temp_setpoint_heat: Option<f64>,
    pub filter_clean_required: bool,
    pub defrosting: bool,
    pub compressor_state: Option<String>,
    pub firmware_version: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneStatus {
    pub name: String,
    pub is_enabled: bool,
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
    pub setpoint_cool: Option<f64>,
    pub setpoint_heat: Option<f64>,
}

/// One normalized poll. Replaced as a whole; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Status {
    pub main: MainStatus,
    pub zones: BTreeMap<u8, ZoneStatus>,
    pub raw_data: Value,
}

impl Status {
    pub fn zone(&self, id: u8) -> Option<&ZoneStatus> {
        self.zones.get(&id)
    }

    /// The mode the host should display: `Off` whenever the system is off.
    pub fn effective_mode(&self) -> HvacMode {
        if !self.main.is_on {
            return HvacMode::Off;
        }
        self.main.mode.unwrap_or(HvacMode::Off)
    }
}

/// Wireless zone sensor diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Peripheral {
    pub serial: Option<String>,
    pub battery_pc: Option<f64>,
    pub signal_of3: Option<String>,
    pub connection_state: Option<String>,
    pub last_connection: Option<String>,
}

/// Field writes sent to the unit in a single request, keyed by vendor path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    fields: Map<String, Value>,
}

impl Command {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(path.into(), value.into());
        self
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.fields.get(path)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Command {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
