use std::{env, fs, path::Path, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::ClientError;

pub const SETTINGS_FILENAME: &str = "settings.json";
pub const DEV_BASE_URL: &str = "http://localhost:3000/api/v1";

const BASE_URL_ENV: &str = "TASKBOARD_BASE_URL";
const ENVIRONMENT_ENV: &str = "TASKBOARD_ENVIRONMENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_prefs_path")]
    pub prefs_path: String,
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_prefs_path() -> String {
    "taskboard.redb".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            environment: Environment::Development,
            base_url: None,
            reconnect_delay_secs: default_reconnect_delay(),
            request_timeout_secs: default_request_timeout(),
            prefs_path: default_prefs_path(),
        }
    }
}

impl Settings {
    /// Read `settings.json` from the working directory, then apply env overrides.
    pub fn load() -> Result<Settings, ClientError> {
        Self::load_from(SETTINGS_FILENAME)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Settings, ClientError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ClientError::Settings(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut settings = Self::from_json(&content)?;
        settings.apply_env();
        Ok(settings)
    }

    pub fn from_json(content: &str) -> Result<Settings, ClientError> {
        serde_json::from_str(content)
            .map_err(|e| ClientError::Settings(format!("cannot parse settings: {e}")))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = env::var(BASE_URL_ENV) {
            self.base_url = Some(url);
        }
        match env::var(ENVIRONMENT_ENV).as_deref() {
            Ok("development") => self.environment = Environment::Development,
            Ok("production") => self.environment = Environment::Production,
            _ => {}
        }
    }

    /// REST base. Development always talks to the local backend.
    pub fn api_base(&self) -> Result<Url, ClientError> {
        let raw = match (self.environment, &self.base_url) {
            (Environment::Development, _) => DEV_BASE_URL,
            (Environment::Production, Some(url)) => url.as_str(),
            (Environment::Production, None) => {
                return Err(ClientError::Settings(format!(
                    "base_url (or {BASE_URL_ENV}) is required in production"
                )))
            }
        };
        parse_base(raw)
    }

    /// Push channel endpoint: the REST base with its scheme swapped to ws/wss.
    pub fn push_url(&self) -> Result<Url, ClientError> {
        push_url_for(&self.api_base()?)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse a base URL and make sure it ends with `/` so joins append.
pub fn parse_base(raw: &str) -> Result<Url, ClientError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| ClientError::Settings(format!("invalid base url {raw}: {e}")))
}

pub fn push_url_for(api_base: &Url) -> Result<Url, ClientError> {
    let scheme = match api_base.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(ClientError::Settings(format!(
                "cannot derive push url from scheme {other}"
            )))
        }
    };
    let swapped = format!("{scheme}{}", &api_base.as_str()[api_base.scheme().len()..]);
    let base = Url::parse(&swapped)
        .map_err(|e| ClientError::Settings(format!("invalid push url {swapped}: {e}")))?;
    base.join("notifications/ws")
        .map_err(|e| ClientError::Settings(e.to_string()))
}
