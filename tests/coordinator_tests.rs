use std::sync::{Arc, Mutex};
use std::time::Duration;

use actron_neo::{
    ActronApi, Coordinator, CoordinatorState, Device, Error, FanMode, HvacMode,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const SERIAL: &str = "ABC123";
const STATUS_PATH: &str = "/api/v0/client/ac-systems/status/latest";
const COMMAND_PATH: &str = "/api/v0/client/ac-systems/cmds/send";

fn status_doc(is_on: bool, mode: &str, away: bool) -> Value {
    json!({
        "lastStatusUpdate": "2024-11-02T10:00:00Z",
        "lastKnownState": {
            "<ABC123>": {
                "UserAirconSettings": {
                    "isOn": is_on,
                    "Mode": mode,
                    "FanMode": "AUTO",
                    "AwayMode": away,
                    "TemperatureSetpoint_Cool_oC": 24.0,
                    "TemperatureSetpoint_Heat_oC": 20.0,
                    "EnabledZones": [true, true]
                },
                "MasterInfo": {"LiveTemp_oC": 25.1, "LiveHumidity_pc": 48.0},
                "AirconSystem": {
                    "MasterWCModel": "NEO",
                    "MasterWCFirmwareVersion": "23.4.2",
                    "Peripherals": [
                        {"ZoneAssignment": [1], "RemainingBatteryCapacity_pc": 64, "ConnectionState": "Connected"}
                    ]
                },
                "RemoteZoneInfo": [
                    {"NV_Title": "Living", "LiveTemp_oC": 24.5, "LiveHumidity_pc": 47.0,
                     "TemperatureSetpoint_Cool_oC": 23.5, "TemperatureSetpoint_Heat_oC": 19.5},
                    {"NV_Title": "Study", "LiveTemp_oC": 26.0}
                ]
            }
        }
    })
}

async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v0/client/user-devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pairingToken": "pair-1"})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v0/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/client/ac-systems"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"ac-system": [
                {"serial": SERIAL, "description": "Home", "type": "neo"},
                {"serial": "OTHER1", "description": "Granny flat", "type": "neo"}
            ]}
        })))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, doc: Value) {
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .and(query_param("serial", SERIAL))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc))
        .mount(server)
        .await;
}

async fn mount_command_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(COMMAND_PATH))
        .and(query_param("serial", SERIAL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
}

fn api_for(server: &MockServer) -> ActronApi {
    ActronApi::builder("me@example.com", "pw")
        .base_url(server.uri())
        .build()
        .unwrap()
}

async fn ready_coordinator(server: &MockServer) -> Coordinator {
    mount_auth(server).await;
    Coordinator::builder(api_for(server))
        .connect()
        .await
        .expect("connect should succeed")
}

/// Commands and status polls in arrival order, skipping auth and discovery.
async fn device_traffic(server: &MockServer) -> Vec<(String, Option<Value>)> {
    let requests: Vec<Request> = server.received_requests().await.unwrap();
    requests
        .iter()
        .filter_map(|r| match r.url.path() {
            COMMAND_PATH => Some(("cmd".to_string(), r.body_json::<Value>().ok())),
            STATUS_PATH => Some(("status".to_string(), None)),
            _ => None,
        })
        .collect()
}

async fn sent_commands(server: &MockServer) -> Vec<Value> {
    device_traffic(server)
        .await
        .into_iter()
        .filter_map(|(kind, body)| if kind == "cmd" { body } else { None })
        .map(|body| body["command"].clone())
        .collect()
}

#[tokio::test]
async fn connect_binds_first_device_and_is_ready() {
    let server = MockServer::start().await;
    let coordinator = ready_coordinator(&server).await;
    assert_eq!(coordinator.state(), CoordinatorState::Ready);
    assert_eq!(coordinator.device_id(), SERIAL);
    assert_eq!(coordinator.device().name, "Home");
    assert!(coordinator.data().is_none());
    assert!(!coordinator.last_update_success());
}

#[tokio::test]
async fn connect_binds_configured_serial() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    let coordinator = Coordinator::builder(api_for(&server))
        .serial("other1")
        .connect()
        .await
        .unwrap();
    assert_eq!(coordinator.device_id(), "OTHER1");
}

#[tokio::test]
async fn connect_unknown_serial_is_no_device() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    let result = Coordinator::builder(api_for(&server))
        .serial("NOPE")
        .connect()
        .await;
    assert!(matches!(result, Err(Error::NoDevice)));
}

#[tokio::test]
async fn built_coordinator_starts_unauthenticated() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    let device = Device {
        serial: SERIAL.to_string(),
        name: "Home".to_string(),
        device_type: "neo".to_string(),
    };
    let coordinator = Coordinator::builder(api_for(&server)).build(device);
    assert_eq!(coordinator.state(), CoordinatorState::Unauthenticated);

    let err = coordinator.refresh().await.unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));

    coordinator.authenticate().await.unwrap();
    assert_eq!(coordinator.state(), CoordinatorState::Ready);
}

#[tokio::test]
async fn refresh_normalizes_status() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    let coordinator = ready_coordinator(&server).await;

    let status = coordinator.refresh().await.unwrap();
    assert!(status.main.is_on);
    assert_eq!(status.main.mode, Some(HvacMode::Cool));
    assert_eq!(status.main.indoor_temp, Some(25.1));
    assert_eq!(status.zone(0).unwrap().temp, Some(24.5));
    assert_eq!(status.zone(1).unwrap().name, "Study");
    assert!(coordinator.last_update_success());
    assert_eq!(coordinator.data().unwrap().main, status.main);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_doc(true, "HEAT", false)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    let coordinator = ready_coordinator(&server).await;
    let first = coordinator.refresh().await.unwrap();

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;
    let err = coordinator.refresh().await.unwrap_err();
    assert!(err.is_api());
    assert!(!coordinator.last_update_success());
    assert!(Arc::ptr_eq(&first, &coordinator.data().unwrap()));
}

#[tokio::test]
async fn malformed_document_fails_refresh() {
    let server = MockServer::start().await;
    mount_status(&server, json!({"lastKnownState": {}})).await;
    let coordinator = ready_coordinator(&server).await;
    let err = coordinator.refresh().await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
    assert!(coordinator.data().is_none());
}

#[tokio::test]
async fn set_temperature_cooling_writes_cool_setpoint() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    mount_command_ok(&server).await;
    let coordinator = ready_coordinator(&server).await;

    coordinator.set_temperature(22.5, true).await.unwrap();
    coordinator.set_temperature(18.0, false).await.unwrap();

    let commands = sent_commands(&server).await;
    assert_eq!(
        commands[0],
        json!({"UserAirconSettings.TemperatureSetpoint_Cool_oC": 22.5, "type": "set-settings"})
    );
    assert_eq!(
        commands[1],
        json!({"UserAirconSettings.TemperatureSetpoint_Heat_oC": 18.0, "type": "set-settings"})
    );
}

#[tokio::test]
async fn away_toggle_sends_opposite_payloads_each_followed_by_refresh() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    mount_command_ok(&server).await;
    let coordinator = ready_coordinator(&server).await;

    coordinator.set_away_mode(true).await.unwrap();
    coordinator.set_away_mode(false).await.unwrap();

    let traffic = device_traffic(&server).await;
    let kinds: Vec<&str> = traffic.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(kinds, ["cmd", "status", "cmd", "status"]);
    let first = traffic[0].1.as_ref().unwrap();
    let second = traffic[2].1.as_ref().unwrap();
    assert_eq!(first["command"]["UserAirconSettings.AwayMode"], true);
    assert_eq!(second["command"]["UserAirconSettings.AwayMode"], false);
}

#[tokio::test]
async fn hvac_mode_commands() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    mount_command_ok(&server).await;
    let coordinator = ready_coordinator(&server).await;

    coordinator.set_hvac_mode(HvacMode::Off).await.unwrap();
    coordinator.set_hvac_mode(HvacMode::Heat).await.unwrap();
    coordinator.set_hvac_mode(HvacMode::FanOnly).await.unwrap();

    let commands = sent_commands(&server).await;
    assert_eq!(
        commands[0],
        json!({"UserAirconSettings.isOn": false, "type": "set-settings"})
    );
    assert_eq!(
        commands[1],
        json!({"UserAirconSettings.isOn": true, "UserAirconSettings.Mode": "HEAT", "type": "set-settings"})
    );
    assert_eq!(commands[2]["UserAirconSettings.Mode"], "FAN");
}

#[tokio::test]
async fn fan_mode_command() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    mount_command_ok(&server).await;
    let coordinator = ready_coordinator(&server).await;

    coordinator.set_fan_mode(FanMode::Medium).await.unwrap();
    let commands = sent_commands(&server).await;
    assert_eq!(commands[0]["UserAirconSettings.FanMode"], "MEDIUM");
}

#[tokio::test]
async fn fan_mode_keeps_continuous_fan() {
    let server = MockServer::start().await;
    let mut doc = status_doc(true, "COOL", false);
    doc["lastKnownState"]["<ABC123>"]["UserAirconSettings"]["FanMode"] = json!("HIGH+CONT");
    mount_status(&server, doc).await;
    mount_command_ok(&server).await;
    let coordinator = ready_coordinator(&server).await;

    let status = coordinator.refresh().await.unwrap();
    assert_eq!(status.main.fan_mode, Some(FanMode::High));
    assert!(status.main.fan_continuous);

    coordinator.set_fan_mode(FanMode::High).await.unwrap();
    coordinator.set_fan_mode(FanMode::Low).await.unwrap();
    let commands = sent_commands(&server).await;
    assert_eq!(commands[0]["UserAirconSettings.FanMode"], "HIGH+CONT");
    assert_eq!(commands[1]["UserAirconSettings.FanMode"], "LOW+CONT");
}

#[tokio::test]
async fn zone_temperature_command_and_unknown_zone() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "HEAT", false)).await;
    mount_command_ok(&server).await;
    let coordinator = ready_coordinator(&server).await;
    coordinator.refresh().await.unwrap();

    coordinator.set_zone_temperature(1, 21.0, false).await.unwrap();
    let commands = sent_commands(&server).await;
    assert_eq!(commands[0]["RemoteZoneInfo[1].TemperatureSetpoint_Heat_oC"], 21.0);

    let err = coordinator.set_zone_temperature(7, 21.0, false).await.unwrap_err();
    assert!(matches!(err, Error::UnknownZone(7)));
}

#[tokio::test]
async fn failed_command_skips_refresh() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    Mock::given(method("POST"))
        .and(path(COMMAND_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("rejected"))
        .mount(&server)
        .await;
    let coordinator = ready_coordinator(&server).await;

    let err = coordinator.set_away_mode(true).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 400, .. }));
    let kinds: Vec<String> = device_traffic(&server).await.into_iter().map(|(k, _)| k).collect();
    assert_eq!(kinds, ["cmd"]);
}

#[tokio::test]
async fn refresh_failure_after_command_is_reported() {
    let server = MockServer::start().await;
    mount_command_ok(&server).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;
    let coordinator = ready_coordinator(&server).await;

    let err = coordinator.set_fan_mode(FanMode::Low).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 503, .. }));
    assert_eq!(sent_commands(&server).await.len(), 1);
}

#[tokio::test]
async fn update_callback_fires_on_refresh() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_status(&server, status_doc(true, "HEAT", true)).await;

    let seen: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(vec![]));
    let seen_clone = seen.clone();
    let coordinator = Coordinator::builder(api_for(&server))
        .on_update(move |status| {
            seen_clone.lock().unwrap().push(status.main.away_mode);
        })
        .connect()
        .await
        .unwrap();

    coordinator.refresh().await.unwrap();
    coordinator.refresh().await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![true, true]);
}

#[tokio::test]
async fn subscribers_see_refresh_and_close() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    let coordinator = ready_coordinator(&server).await;

    let mut rx = coordinator.subscribe();
    assert!(rx.borrow_and_update().is_none());

    let status = coordinator.refresh().await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(Arc::ptr_eq(rx.borrow_and_update().as_ref().unwrap(), &status));

    coordinator.close().await;
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_none());
}

#[tokio::test]
async fn zone_peripheral_from_last_poll() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    let coordinator = ready_coordinator(&server).await;
    assert!(coordinator.zone_peripheral(0).is_none());

    coordinator.refresh().await.unwrap();
    let peripheral = coordinator.zone_peripheral(0).unwrap();
    assert_eq!(peripheral.battery_pc, Some(64.0));
    assert_eq!(peripheral.connection_state.as_deref(), Some("Connected"));
    assert!(coordinator.zone_peripheral(1).is_none());
}

#[tokio::test]
async fn run_polls_until_shutdown() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    let coordinator = ready_coordinator(&server).await;

    coordinator
        .run(
            Duration::from_millis(20),
            tokio::time::sleep(Duration::from_millis(150)),
        )
        .await;

    let polls = device_traffic(&server)
        .await
        .into_iter()
        .filter(|(k, _)| k == "status")
        .count();
    assert!(polls >= 2, "expected repeated polls, got {polls}");
    assert!(coordinator.data().is_some());
}

#[tokio::test]
async fn close_discards_snapshot() {
    let server = MockServer::start().await;
    mount_status(&server, status_doc(true, "COOL", false)).await;
    let coordinator = ready_coordinator(&server).await;
    coordinator.refresh().await.unwrap();

    coordinator.close().await;
    assert!(coordinator.data().is_none());
    assert_eq!(coordinator.state(), CoordinatorState::Unauthenticated);
    assert!(matches!(coordinator.refresh().await, Err(Error::Closed)));
}
