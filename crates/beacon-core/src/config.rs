//! Application configuration

use crate::error::{BeaconError, BeaconResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use url::Url;

/// Cache generation used when nothing else is configured.
pub const DEFAULT_CACHE_NAME: &str = "pwa-cache-v1";

/// Icon referenced by notifications, vendor payloads and the manifest.
pub const DEFAULT_ICON: &str = "/icon-192x192.svg";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Push vendor settings
    pub push: PushConfig,

    /// Service worker settings
    pub worker: WorkerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    pub bind: SocketAddr,

    /// Directory served as static assets (worker script, icons)
    pub static_dir: PathBuf,

    /// Path of the worker script, served with `Service-Worker-Allowed: /`
    pub worker_script: String,
}

/// Push vendor (OneSignal) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Vendor application id
    pub app_id: Option<String>,

    /// Vendor REST API key
    #[serde(skip_serializing)]
    pub rest_api_key: Option<String>,

    /// Vendor API base URL
    pub api_url: String,

    /// Icon attached to outgoing notifications
    pub icon: String,
}

/// Service worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Current cache generation
    pub cache_name: String,

    /// URLs written into the cache on install
    pub precache: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            static_dir: PathBuf::from("public"),
            worker_script: "/sw.js".to_string(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            rest_api_key: None,
            api_url: "https://onesignal.com".to_string(),
            icon: DEFAULT_ICON.to_string(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            precache: vec![
                "/".to_string(),
                "/static/js/bundle.js".to_string(),
                "/static/css/main.css".to_string(),
                "/manifest.json".to_string(),
            ],
        }
    }
}

impl PushConfig {
    /// Both vendor credentials, if configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.app_id.as_deref(), self.rest_api_key.as_deref()) {
            (Some(app_id), Some(key)) if !app_id.is_empty() && !key.is_empty() => {
                Some((app_id, key))
            }
            _ => None,
        }
    }
}

impl AppConfig {
    /// Build configuration from the process environment.
    pub fn from_env() -> BeaconResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> BeaconResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(bind) = lookup("BEACON_BIND") {
            config.server.bind = bind
                .parse()
                .map_err(|e| BeaconError::config(format!("BEACON_BIND={bind}: {e}")))?;
        }
        if let Some(dir) = lookup("BEACON_STATIC_DIR") {
            config.server.static_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup("BEACON_CACHE_NAME") {
            config.worker.cache_name = name;
        }

        config.push.app_id = lookup("ONESIGNAL_APP_ID").filter(|v| !v.is_empty());
        config.push.rest_api_key = lookup("ONESIGNAL_REST_API_KEY").filter(|v| !v.is_empty());
        if let Some(api_url) = lookup("ONESIGNAL_API_URL") {
            Url::parse(&api_url)?;
            config.push.api_url = api_url.trim_end_matches('/').to_string();
        }

        Ok(config)
    }
}
