//! Flattens the vendor status document into [`Status`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::protocol::state_key;
use crate::types::*;
use crate::{Error, Result};

static NULL: Value = Value::Null;

fn f64_at(v: &Value, key: &str) -> Option<f64> {
    v.get(key).and_then(|v| v.as_f64())
}

pub(crate) fn bool_at(v: &Value, key: &str) -> bool {
    v.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

pub(crate) fn string_at(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn section<'a>(v: &'a Value, key: &str) -> &'a Value {
    v.get(key).unwrap_or(&NULL)
}

/// The unit's block inside `lastKnownState`. The cloud keys it as
/// `<SERIAL>`; a bare serial key is accepted as well.
pub fn device_state<'a>(serial: &str, raw: &'a Value) -> Option<&'a Value> {
    let known = raw.get("lastKnownState")?;
    known
        .get(state_key(serial))
        .or_else(|| known.get(serial))
        .filter(|v| v.is_object())
}

pub fn normalize(serial: &str, raw: &Value) -> Result<Status> {
    let state = device_state(serial, raw)
        .ok_or_else(|| Error::Protocol(format!("no lastKnownState for {serial}")))?;
    let settings = state
        .get("UserAirconSettings")
        .filter(|v| v.is_object())
        .ok_or_else(|| Error::Protocol("missing UserAirconSettings".to_string()))?;

    let master = section(state, "MasterInfo");
    let live = section(state, "LiveAircon");
    let alerts = section(state, "Alerts");
    let system = section(state, "AirconSystem");

    let main = MainStatus {
        is_on: bool_at(settings, "isOn"),
        mode: settings
            .get("Mode")
            .and_then(|v| v.as_str())
            .and_then(HvacMode::from_actron_str),
        fan_mode: settings
            .get("FanMode")
            .and_then(|v| v.as_str())
            .and_then(FanMode::from_actron_str),
        fan_continuous: settings
            .get("FanMode")
            .and_then(|v| v.as_str())
            .is_some_and(is_continuous_fan),
        away_mode: bool_at(settings, "AwayMode"),
        quiet_mode: bool_at(settings, "QuietMode"),
        indoor_temp: f64_at(master, "LiveTemp_oC"),
        indoor_humidity: f64_at(master, "LiveHumidity_pc"),
        outdoor_temp: f64_at(master, "LiveOutdoorTemp_oC"),
        temp_setpoint_cool: f64_at(settings, "TemperatureSetpoint_Cool_oC"),
        temp_setpoint_heat: f64_at(settings, "TemperatureSetpoint_Heat_oC"),
        filter_clean_required: bool_at(alerts, "CleanFilter"),
        defrosting: bool_at(alerts, "Defrosting") || bool_at(live, "Defrost"),
        compressor_state: string_at(live, "CompressorMode"),
        firmware_version: string_at(system, "MasterWCFirmwareVersion"),
        model: string_at(system, "MasterWCModel"),
    };

    let enabled = settings.get("EnabledZones").and_then(|v| v.as_array());
    let mut zones = BTreeMap::new();
    if let Some(Value::Array(remote)) = state.get("RemoteZoneInfo") {
        for (idx, zone) in remote.iter().enumerate() {
            let Ok(id) = u8::try_from(idx) else { break };
            if zone.get("NV_Exists").and_then(|v| v.as_bool()) == Some(false) {
                continue;
            }
            let name = zone
                .get("NV_Title")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Zone {}", idx + 1));
            zones.insert(
                id,
                ZoneStatus {
                    name,
                    is_enabled: enabled
                        .and_then(|e| e.get(idx))
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false),
                    temp: f64_at(zone, "LiveTemp_oC"),
                    humidity: f64_at(zone, "LiveHumidity_pc"),
                    setpoint_cool: f64_at(zone, "TemperatureSetpoint_Cool_oC"),
                    setpoint_heat: f64_at(zone, "TemperatureSetpoint_Heat_oC"),
                },
            );
        }
    }

    Ok(Status {
        main,
        zones,
        raw_data: raw.clone(),
    })
}

/// Finds the wireless sensor assigned to a zone. `ZoneAssignment` numbers
/// zones from 1.
pub fn zone_peripheral(serial: &str, raw: &Value, zone_id: u8) -> Option<Peripheral> {
    let state = device_state(serial, raw)?;
    let peripherals = state.pointer("/AirconSystem/Peripherals")?.as_array()?;
    let wanted = u64::from(zone_id) + 1;
    peripherals
        .iter()
        .find(|p| {
            p.get("ZoneAssignment")
                .and_then(|v| v.as_array())
                .is_some_and(|zones| zones.iter().any(|z| z.as_u64() == Some(wanted)))
        })
        .map(|p| Peripheral {
            serial: string_at(p, "SerialNumber"),
            battery_pc: f64_at(p, "RemainingBatteryCapacity_pc"),
            signal_of3: string_at(p, "Signal_of3"),
            connection_state: string_at(p, "ConnectionState"),
            last_connection: string_at(p, "LastConnectionTime"),
        })
}
