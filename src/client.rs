use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    command_message, command_url, pairing_form, parse_devices, status_url, systems_url,
    token_form, DEFAULT_BASE_URL, DEFAULT_DEVICE_NAME, PAIRING_PATH, TOKEN_PATH,
};
use crate::types::{Command, Device};
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

enum Body<'a> {
    Empty,
    Form(&'a [(&'static str, &'a str)]),
    Json(&'a Value),
}

pub struct ActronApiBuilder {
    username: String,
    password: String,
    base_url: String,
    device_name: String,
    device_id: Option<String>,
    timeout: Duration,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl ActronApiBuilder {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            device_id: None,
            timeout: DEFAULT_TIMEOUT,
            log_mode: None,
            log_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Name this client registers under on the user's account.
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Stable identifier for the pairing. Defaults to a fresh v4 UUID, so
    /// callers that persist across restarts should store and pass it back.
    pub fn device_id(mut self, id: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ActronApi> {
        let http = reqwest::Client::builder().timeout(self.timeout).build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        Ok(ActronApi {
            http: Some(http),
            base_url: self.base_url,
            username: self.username,
            password: self.password,
            device_name: self.device_name,
            device_id: self
                .device_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            bearer_token: None,
            logger,
        })
    }
}

/// HTTP client for the ActronAir Neo cloud.
pub struct ActronApi {
    http: Option<reqwest::Client>,
    base_url: String,
    username: String,
    password: String,
    device_name: String,
    device_id: String,
    bearer_token: Option<String>,
    logger: Option<MessageLogger>,
}

impl ActronApi {
    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> ActronApiBuilder {
        ActronApiBuilder::new(username, password)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token.is_some()
    }

    /// Exchanges username/password for a pairing token, then the pairing
    /// token for a bearer token. A failure leaves any previous token in place.
    pub async fn authenticate(&mut self) -> Result<()> {
        let result = match self.request_pairing_token().await {
            Ok(pairing_token) => self.request_bearer_token(&pairing_token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(token) => {
                self.bearer_token = Some(token);
                debug!("authenticated with ActronAir cloud");
                Ok(())
            }
            Err(e) => {
                error!("authentication failed: {e}");
                Err(match e {
                    Error::Authentication(msg) => Error::Authentication(msg),
                    other => Error::Authentication(other.to_string()),
                })
            }
        }
    }

    async fn request_pairing_token(&mut self) -> Result<String> {
        let url = format!("{}{PAIRING_PATH}", self.base_url);
        let username = self.username.clone();
        let password = self.password.clone();
        let device_name = self.device_name.clone();
        let device_id = self.device_id.clone();
        let form = pairing_form(&username, &password, &device_name, &device_id);
        debug!(url = %url, "requesting pairing token");
        let response = self
            .make_request(Method::POST, &url, Body::Form(&form), false)
            .await?;
        token_field(&response, "pairingToken")
    }

    async fn request_bearer_token(&mut self, pairing_token: &str) -> Result<String> {
        let url = format!("{}{TOKEN_PATH}", self.base_url);
        let form = token_form(pairing_token);
        debug!(url = %url, "requesting bearer token");
        let response = self
            .make_request(Method::POST, &url, Body::Form(&form), false)
            .await?;
        token_field(&response, "access_token")
    }

    pub async fn get_devices(&mut self) -> Result<Vec<Device>> {
        let url = systems_url(&self.base_url);
        debug!(url = %url, "fetching devices");
        let response = self.make_request(Method::GET, &url, Body::Empty, true).await?;
        let devices = parse_devices(&response);
        debug!(count = devices.len(), "found devices");
        Ok(devices)
    }

    /// Raw status document for one unit.
    pub async fn get_ac_status(&mut self, serial: &str) -> Result<Value> {
        let url = status_url(&self.base_url, serial);
        debug!(url = %url, "fetching AC status");
        let response = self.make_request(Method::GET, &url, Body::Empty, true).await?;
        if let Some(ref mut logger) = self.logger {
            logger.log_poll(serial, &response);
        }
        Ok(response)
    }

    pub async fn send_command(&mut self, serial: &str, command: &Command) -> Result<Value> {
        let url = command_url(&self.base_url, serial);
        let msg = command_message(command);
        debug!(url = %url, fields = command.fields().len(), "sending command");
        trace!(body = %msg, "command body");
        if let Some(ref mut logger) = self.logger {
            logger.log_command(serial, &msg);
        }
        self.make_request(Method::POST, &url, Body::Json(&msg), true)
            .await
    }

    /// Releases the HTTP session. Every later call fails with `Error::Closed`.
    pub fn close(&mut self) {
        self.http = None;
        self.bearer_token = None;
    }

    async fn make_request(
        &mut self,
        method: Method,
        url: &str,
        body: Body<'_>,
        auth_required: bool,
    ) -> Result<Value> {
        let http = self.http.as_ref().ok_or(Error::Closed)?;

        let mut request = http.request(method.clone(), url);
        if auth_required {
            let token = self.bearer_token.as_deref().ok_or(Error::NotAuthenticated)?;
            request = request.bearer_auth(token);
        }
        request = match body {
            Body::Empty => request,
            Body::Form(form) => request.form(form),
            Body::Json(json) => request.json(json),
        };

        let path = url.strip_prefix(self.base_url.as_str()).unwrap_or(url);
        if let Some(ref mut logger) = self.logger {
            logger.log_request(method.as_str(), path);
        }

        trace!(method = %method, url = %url, "making request");
        let resp = request.send().await.inspect_err(|e| {
            error!("network error during API request: {e}");
        })?;

        let status = resp.status().as_u16();
        if status == 200 {
            trace!(status, "request successful");
            return Ok(resp.json::<Value>().await?);
        }

        let text = resp.text().await.unwrap_or_default();
        error!(status, body = %text, "API request failed");
        if let Some(ref mut logger) = self.logger {
            logger.log_error(path, status, &text);
        }
        Err(Error::Api { status, body: text })
    }
}

fn token_field(response: &Value, field: &str) -> Result<String> {
    response
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Authentication(format!("response missing {field}")))
}
