use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Remote API actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Latest available version, used by the periodic check
    LatestVersion,
    /// Full plugin information, used by the detail view
    Information,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::LatestVersion => "plugin_latest_version",
            Action::Information => "plugin_information",
        }
    }
}

/// Version information returned by a successful remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub new_version: String,
    /// Download URL of the new package
    pub package: String,
    pub slug: String,
    pub url: String,
}

/// Host-owned collection of pending plugin updates
///
/// The updater only ever writes the entry under its own full id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdates {
    /// Plugins with an update available, keyed by full id
    #[serde(default)]
    pub response: IndexMap<String, VersionInfo>,
    /// Installed versions the host checked, keyed by full id
    #[serde(default)]
    pub checked: IndexMap<String, String>,
}

impl PendingUpdates {
    pub fn is_empty(&self) -> bool {
        self.response.is_empty() && self.checked.is_empty()
    }
}

/// Arguments of a detail-view request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailArgs {
    #[serde(default)]
    pub slug: Option<String>,
}

impl DetailArgs {
    pub fn for_slug(slug: &str) -> Self {
        Self {
            slug: Some(slug.to_string()),
        }
    }
}

/// Data shown in the detail view: either ours or whatever the host had
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginDetails {
    Remote(VersionInfo),
    Host(serde_json::Value),
}

impl From<VersionInfo> for PluginDetails {
    fn from(info: VersionInfo) -> Self {
        PluginDetails::Remote(info)
    }
}

impl Default for PluginDetails {
    fn default() -> Self {
        PluginDetails::Host(serde_json::Value::Null)
    }
}
