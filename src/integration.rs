use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::client::ActronApi;
use crate::coordinator::Coordinator;
use crate::protocol::DEFAULT_DEVICE_NAME;
use crate::Result;

fn default_poll_interval() -> u64 {
    60
}

/// One configured account/unit pairing, as stored by the host.
#[derive(Clone, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub username: String,
    pub password: String,
    /// Unit to bind to; the first unit on the account when absent.
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub base_url: Option<String>,
    /// `deviceUniqueIdentifier` sent when pairing. Derived from the entry id
    /// when absent, so the account sees one device per entry.
    #[serde(default)]
    pub device_id: Option<String>,
}

impl fmt::Debug for ConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigEntry")
            .field("entry_id", &self.entry_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("serial", &self.serial)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("base_url", &self.base_url)
            .field("device_id", &self.device_id)
            .finish()
    }
}

impl ConfigEntry {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn device_id(&self) -> String {
        self.device_id
            .clone()
            .unwrap_or_else(|| format!("{DEFAULT_DEVICE_NAME}-{}", self.entry_id))
    }
}

/// Coordinators of every set-up config entry, keyed by entry id.
#[derive(Default)]
pub struct Integration {
    coordinators: HashMap<String, Arc<Coordinator>>,
}

impl Integration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticates, binds the unit and runs the first refresh. The entry
    /// is only registered once all three have succeeded.
    pub async fn setup_entry(&mut self, entry: &ConfigEntry) -> Result<Arc<Coordinator>> {
        info!(entry_id = %entry.entry_id, "setting up ActronAir Neo entry");
        let mut api = ActronApi::builder(&entry.username, &entry.password)
            .device_id(entry.device_id());
        if let Some(url) = &entry.base_url {
            api = api.base_url(url);
        }
        let mut builder = Coordinator::builder(api.build()?);
        if let Some(serial) = &entry.serial {
            builder = builder.serial(serial);
        }
        let coordinator = Arc::new(builder.connect().await?);
        coordinator.refresh().await?;

        if let Some(previous) = self
            .coordinators
            .insert(entry.entry_id.clone(), Arc::clone(&coordinator))
        {
            debug!(entry_id = %entry.entry_id, "replacing existing coordinator");
            previous.close().await;
        }
        Ok(coordinator)
    }

    pub fn coordinator(&self, entry_id: &str) -> Option<Arc<Coordinator>> {
        self.coordinators.get(entry_id).cloned()
    }

    pub fn entry_ids(&self) -> impl Iterator<Item = &str> {
        self.coordinators.keys().map(String::as_str)
    }

    /// Removes the entry and closes its client. Returns false if unknown.
    pub async fn unload_entry(&mut self, entry_id: &str) -> bool {
        match self.coordinators.remove(entry_id) {
            Some(coordinator) => {
                coordinator.close().await;
                info!(entry_id, "unloaded ActronAir Neo entry");
                true
            }
            None => false,
        }
    }
}
