use serde_json::{json, Value};

use crate::types::{Command, Device};

pub const DEFAULT_BASE_URL: &str = "https://nimbus.actronair.com.au";
pub const DEFAULT_DEVICE_NAME: &str = "actron-neo";

/// Tag the cloud expects on every settings write.
pub const CMD_SET_SETTINGS: &str = "set-settings";

pub const PAIRING_PATH: &str = "/api/v0/client/user-devices";
pub const TOKEN_PATH: &str = "/api/v0/oauth/token";
pub const SYSTEMS_PATH: &str = "/api/v0/client/ac-systems";
pub const STATUS_PATH: &str = "/api/v0/client/ac-systems/status/latest";
pub const COMMAND_PATH: &str = "/api/v0/client/ac-systems/cmds/send";

const UNKNOWN: &str = "Unknown";
const UNKNOWN_DEVICE: &str = "Unknown Device";

// Writable vendor field paths.
pub const FIELD_IS_ON: &str = "UserAirconSettings.isOn";
pub const FIELD_MODE: &str = "UserAirconSettings.Mode";
pub const FIELD_FAN_MODE: &str = "UserAirconSettings.FanMode";
pub const FIELD_AWAY_MODE: &str = "UserAirconSettings.AwayMode";
pub const FIELD_SETPOINT_COOL: &str = "UserAirconSettings.TemperatureSetpoint_Cool_oC";
pub const FIELD_SETPOINT_HEAT: &str = "UserAirconSettings.TemperatureSetpoint_Heat_oC";

pub fn pairing_form<'a>(
    username: &'a str,
    password: &'a str,
    device_name: &'a str,
    device_id: &'a str,
) -> [(&'static str, &'a str); 5] {
    [
        ("username", username),
        ("password", password),
        ("client", "ios"),
        ("deviceName", device_name),
        ("deviceUniqueIdentifier", device_id),
    ]
}

pub fn token_form(pairing_token: &str) -> [(&'static str, &str); 3] {
    [
        ("grant_type", "refresh_token"),
        ("refresh_token", pairing_token),
        ("client_id", "app"),
    ]
}

pub fn systems_url(base: &str) -> String {
    format!("{base}{SYSTEMS_PATH}?includeNeo=true")
}

pub fn status_url(base: &str, serial: &str) -> String {
    format!("{base}{STATUS_PATH}?serial={serial}")
}

pub fn command_url(base: &str, serial: &str) -> String {
    format!("{base}{COMMAND_PATH}?serial={serial}")
}

/// Wraps field writes in the vendor command envelope.
pub fn command_message(command: &Command) -> Value {
    let mut fields = command.fields().clone();
    fields.insert("type".to_string(), Value::from(CMD_SET_SETTINGS));
    json!({ "command": fields })
}

pub fn zone_setpoint_field(zone_id: u8, cooling: bool) -> String {
    let kind = if cooling { "Cool" } else { "Heat" };
    format!("RemoteZoneInfo[{zone_id}].TemperatureSetpoint_{kind}_oC")
}

pub fn setpoint_field(cooling: bool) -> &'static str {
    if cooling {
        FIELD_SETPOINT_COOL
    } else {
        FIELD_SETPOINT_HEAT
    }
}

pub fn parse_devices(body: &Value) -> Vec<Device> {
    let systems = match body.pointer("/_embedded/ac-system") {
        Some(Value::Array(systems)) => systems,
        _ => return vec![],
    };
    systems
        .iter()
        .map(|system| Device {
            serial: str_or(system, "serial", UNKNOWN),
            name: str_or(system, "description", UNKNOWN_DEVICE),
            device_type: str_or(system, "type", UNKNOWN),
        })
        .collect()
}

fn str_or(v: &Value, key: &str, default: &str) -> String {
    v.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
        .to_string()
}

/// Key under `lastKnownState` holding a unit's state.
pub fn state_key(serial: &str) -> String {
    format!("<{}>", serial.to_uppercase())
}
