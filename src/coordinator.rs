use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, trace, warn};

use crate::client::ActronApi;
use crate::diff::diff_json;
use crate::normalize::{normalize, zone_peripheral};
use crate::protocol::{
    setpoint_field, zone_setpoint_field, FIELD_AWAY_MODE, FIELD_FAN_MODE, FIELD_IS_ON, FIELD_MODE,
};
use crate::types::*;
use crate::{Error, Result};

type UpdateCallback = Box<dyn Fn(&Status) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Unauthenticated,
    Ready,
}

pub struct CoordinatorBuilder {
    api: ActronApi,
    serial: Option<String>,
    update_callbacks: Vec<UpdateCallback>,
}

impl CoordinatorBuilder {
    pub fn new(api: ActronApi) -> Self {
        Self {
            api,
            serial: None,
            update_callbacks: Vec::new(),
        }
    }

    /// Bind to this unit instead of the first one on the account.
    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    /// Called after every successful refresh with the new snapshot.
    pub fn on_update(mut self, f: impl Fn(&Status) + Send + Sync + 'static) -> Self {
        self.update_callbacks.push(Box::new(f));
        self
    }

    /// Authenticates, lists the account's units and binds to one of them.
    pub async fn connect(mut self) -> Result<Coordinator> {
        self.api.authenticate().await?;
        let devices = self.api.get_devices().await?;
        let device = match self.serial.as_deref() {
            Some(serial) => devices
                .into_iter()
                .find(|d| d.serial.eq_ignore_ascii_case(serial)),
            None => devices.into_iter().next(),
        }
        .ok_or(Error::NoDevice)?;
        debug!(serial = %device.serial, name = %device.name, "bound to AC system");

        let coordinator = self.build(device);
        coordinator.ready.store(true, Ordering::Release);
        Ok(coordinator)
    }

    /// Binds to a known unit without touching the network.
    pub fn build(self, device: Device) -> Coordinator {
        Coordinator {
            api: Mutex::new(self.api),
            device,
            data: watch::Sender::new(None),
            ready: AtomicBool::new(false),
            last_update_success: AtomicBool::new(false),
            update_callbacks: self.update_callbacks,
        }
    }
}

/// Owns the API client and the latest normalized snapshot for one unit.
///
/// All methods take `&self`; share it behind an `Arc`. Calls to the cloud are
/// serialized, and readers always see a whole snapshot.
pub struct Coordinator {
    api: Mutex<ActronApi>,
    device: Device,
    data: watch::Sender<Option<Arc<Status>>>,
    ready: AtomicBool,
    last_update_success: AtomicBool,
    update_callbacks: Vec<UpdateCallback>,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("device", &self.device)
            .field("state", &self.state())
            .field("last_update_success", &self.last_update_success())
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    pub fn builder(api: ActronApi) -> CoordinatorBuilder {
        CoordinatorBuilder::new(api)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn device_id(&self) -> &str {
        &self.device.serial
    }

    pub fn state(&self) -> CoordinatorState {
        if self.ready.load(Ordering::Acquire) {
            CoordinatorState::Ready
        } else {
            CoordinatorState::Unauthenticated
        }
    }

    pub fn data(&self) -> Option<Arc<Status>> {
        self.data.borrow().clone()
    }

    /// Receives every snapshot swapped in by a refresh, and `None` on close.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Status>>> {
        self.data.subscribe()
    }

    /// False until the first successful refresh, and after any failed one.
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::Acquire)
    }

    pub async fn authenticate(&self) -> Result<()> {
        self.api.lock().await.authenticate().await?;
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Polls the unit and swaps in a freshly normalized snapshot. On failure
    /// the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<Status>> {
        let result = {
            let mut api = self.api.lock().await;
            api.get_ac_status(&self.device.serial).await
        }
        .and_then(|raw| normalize(&self.device.serial, &raw));

        let status = match result {
            Ok(status) => Arc::new(status),
            Err(e) => {
                self.last_update_success.store(false, Ordering::Release);
                warn!(serial = %self.device.serial, "status refresh failed: {e}");
                return Err(e);
            }
        };

        if let Some(prev) = self.data() {
            let mut changes = Vec::new();
            diff_json(&prev.raw_data, &status.raw_data, "", &mut changes);
            trace!(count = changes.len(), "raw status changes since last poll");
        }

        // `send_replace` updates even with no receivers.
        self.data.send_replace(Some(Arc::clone(&status)));
        self.last_update_success.store(true, Ordering::Release);
        for cb in &self.update_callbacks {
            cb(&status);
        }
        Ok(status)
    }

    /// Sends the command, then refreshes. A failed refresh is reported but the
    /// command has already been applied.
    pub async fn send_command(&self, command: Command) -> Result<()> {
        {
            let mut api = self.api.lock().await;
            api.send_command(&self.device.serial, &command)
                .await
                .inspect_err(|e| error!(serial = %self.device.serial, "command failed: {e}"))?;
        }
        if let Err(e) = self.refresh().await {
            warn!("refresh after command failed: {e}");
            return Err(e);
        }
        Ok(())
    }

    pub async fn set_away_mode(&self, away: bool) -> Result<()> {
        self.send_command(Command::new().set(FIELD_AWAY_MODE, away))
            .await
    }

    /// Writes the cool setpoint when `is_cooling`, else the heat setpoint.
    /// Callers decide `is_cooling` from the current mode, not a target mode.
    pub async fn set_temperature(&self, value: f64, is_cooling: bool) -> Result<()> {
        self.send_command(Command::new().set(setpoint_field(is_cooling), value))
            .await
    }

    pub async fn set_zone_temperature(&self, zone_id: u8, value: f64, is_cooling: bool) -> Result<()> {
        if let Some(status) = self.data()
            && status.zone(zone_id).is_none()
        {
            return Err(Error::UnknownZone(zone_id));
        }
        self.send_command(Command::new().set(zone_setpoint_field(zone_id, is_cooling), value))
            .await
    }

    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<()> {
        let command = match mode {
            HvacMode::Off => Command::new().set(FIELD_IS_ON, false),
            other => Command::new()
                .set(FIELD_IS_ON, true)
                .set(FIELD_MODE, other.as_actron_str()),
        };
        self.send_command(command).await
    }

    /// Keeps the continuous-fan setting reported by the last poll.
    pub async fn set_fan_mode(&self, mode: FanMode) -> Result<()> {
        let continuous = self.data().is_some_and(|s| s.main.fan_continuous);
        self.send_command(Command::new().set(FIELD_FAN_MODE, mode.command_str(continuous)))
            .await
    }

    /// Diagnostics for the sensor assigned to a zone, from the last poll.
    pub fn zone_peripheral(&self, zone_id: u8) -> Option<Peripheral> {
        let status = self.data()?;
        zone_peripheral(&self.device.serial, &status.raw_data, zone_id)
    }

    /// Refreshes every `interval` until `shutdown` resolves. Failures are
    /// logged and the next tick tries again.
    pub async fn run(&self, interval: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        debug!("poll failed, retrying next interval: {e}");
                    }
                }
            }
        }
        debug!(serial = %self.device.serial, "polling stopped");
    }

    /// Drops the snapshot and releases the HTTP session.
    pub async fn close(&self) {
        self.api.lock().await.close();
        self.data.send_replace(None);
        self.ready.store(false, Ordering::Release);
        self.last_update_success.store(false, Ordering::Release);
    }
}
