use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Remote API constants
// =============================================================================

/// Timeout for remote version requests in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// URL fragment identifying the default registry's bulk update-check endpoint
pub const DEFAULT_REGISTRY_UPDATE_CHECK: &str = "api.wordpress.org/plugins/update-check";

/// Priority of the outbound request hook (runs before most other filters)
pub const OUTBOUND_HOOK_PRIORITY: i32 = 5;

/// Priority of the update and detail hooks
pub const DEFAULT_HOOK_PRIORITY: i32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Updater configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdaterConfig {
    /// Base URL of the custom update API
    pub api_url: String,
    /// Path to the plugin's main file
    pub plugin_file: PathBuf,
    /// Credentials and extra parameters sent with every API call
    #[serde(default)]
    pub api_data: Option<ApiData>,
    #[serde(default)]
    pub http: HttpConfig,
    /// URL fragment of the default registry's bulk update-check endpoint
    #[serde(default = "default_registry_update_check")]
    pub registry_update_check: String,
}

/// Data sent along with every remote API call
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct ApiData {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub product: String,
    /// Installed version of the plugin
    #[serde(default)]
    pub version: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, String>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Verify the API server's TLS certificate. Turning this off accepts any
    /// certificate.
    pub verify_tls: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_registry_update_check() -> String {
    DEFAULT_REGISTRY_UPDATE_CHECK.to_string()
}

impl UpdaterConfig {
    /// Creates a configuration with default HTTP settings
    pub fn new(api_url: &str, plugin_file: impl Into<PathBuf>, api_data: Option<ApiData>) -> Self {
        Self {
            api_url: api_url.to_string(),
            plugin_file: plugin_file.into(),
            api_data,
            http: HttpConfig::default(),
            registry_update_check: default_registry_update_check(),
        }
    }

    /// Loads a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Returns the path to the data directory for remote-updater.
/// Uses $XDG_DATA_HOME/remote-updater if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/remote-updater,
/// or ./remote-updater if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("remote-updater.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("remote-updater")
}
