//! Configuration Management
//!
//! Handles persistent client configuration: which broker to talk to and how.

use crate::error::ClientError;
use crate::rest::transport::Credentials;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "https://openshift.redhat.com";
pub const DEFAULT_SERVICE_PATH: &str = "/broker/rest";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_service_path() -> String {
    DEFAULT_SERVICE_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("openshift-client/{}", env!("CARGO_PKG_VERSION"))
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Broker host
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Path of the REST service on the broker
    #[serde(default = "default_service_path")]
    pub service_path: String,
    /// Stored login; pair it with a password through [`ClientConfig::credentials`]
    #[serde(default)]
    pub login: Option<String>,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            service_path: default_service_path(),
            login: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("openshift-client").join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Basic-auth credentials for the stored login, if one is configured
    pub fn credentials(&self, password: &str) -> Option<Credentials> {
        self.login
            .as_deref()
            .filter(|login| !login.is_empty())
            .map(|login| Credentials::new(login, password))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Service root every relative link is resolved against
    pub fn base_url(&self) -> std::result::Result<Url, ClientError> {
        let joined = format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            self.service_path.trim_matches('/')
        );
        Url::parse(&joined).map_err(|e| ClientError::InvalidUrl {
            url: joined.clone(),
            reason: e.to_string(),
        })
    }
}
