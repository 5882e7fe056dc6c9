use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::diff::diff_json;

/// How poll responses are written to the message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLogMode {
    Full,
    /// First poll in full, then only the changed paths.
    Diffed,
}

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_state: Option<Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous_state: None,
        })
    }

    /// Request bodies are not logged; the token exchange carries credentials.
    pub fn log_request(&mut self, method: &str, path: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
        });
        self.write_line(&entry);
    }

    pub fn log_error(&mut self, path: &str, status: u16, body: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "err",
            "path": path,
            "status": status,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_command(&mut self, serial: &str, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "serial": serial,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_poll(&mut self, serial: &str, body: &Value) {
        let ts = Utc::now().to_rfc3339();
        let entry = match (self.mode, self.previous_state.as_ref()) {
            (MessageLogMode::Full, _) => json!({
                "ts": ts,
                "dir": "poll",
                "serial": serial,
                "body": body,
            }),
            (MessageLogMode::Diffed, None) => json!({
                "ts": ts,
                "dir": "poll",
                "serial": serial,
                "full": true,
                "body": body,
            }),
            (MessageLogMode::Diffed, Some(prev)) => {
                let mut changes = Vec::new();
                diff_json(prev, body, "", &mut changes);
                let change_entries: Vec<Value> = changes
                    .iter()
                    .map(|(path, old, new)| json!({ "path": path, "old": old, "new": new }))
                    .collect();
                json!({
                    "ts": ts,
                    "dir": "poll",
                    "serial": serial,
                    "changes": change_entries,
                })
            }
        };
        self.write_line(&entry);
        if self.mode == MessageLogMode::Diffed {
            self.previous_state = Some(body.clone());
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
