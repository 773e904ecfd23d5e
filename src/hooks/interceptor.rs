//! Outbound request interceptor
//!
//! Strips this plugin from bulk-check requests sent to the default registry,
//! so the registry neither reports it missing nor offers a conflicting update.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::payload::filter::remove_component;
use crate::payload::{PLUGINS_KEY, Payload};

/// Outbound HTTP request as the host is about to send it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Form fields of the request body
    #[serde(default)]
    pub body: IndexMap<String, String>,
}

/// Removes the plugin living in `folder` from a bulk-check request
///
/// Requests to any URL not containing `registry_update_check` are returned
/// untouched, as are requests whose `plugins` field is missing, decodes to
/// nothing, or holds no entry for `folder`.
pub fn filter_outbound_request(
    mut request: OutboundRequest,
    url: &str,
    registry_update_check: &str,
    folder: &str,
) -> OutboundRequest {
    if !url.contains(registry_update_check) {
        return request;
    }

    let Some(raw) = request
        .body
        .get(PLUGINS_KEY)
        .filter(|raw| !raw.is_empty())
        .cloned()
    else {
        return request;
    };

    let Some(mut payload) = Payload::decode(&raw) else {
        debug!("Nothing decoded from bulk-check request to {}", url);
        return request;
    };

    let mut plugins = payload.plugins();
    match remove_component(&mut plugins, folder) {
        Some(removed) => debug!("Removed {} from bulk-check request to {}", removed, url),
        // A malformed legacy body decodes empty and is still written back emptied
        None if !payload.document().is_empty() => {
            debug!("No plugin in folder {} in bulk-check request", folder);
            return request;
        }
        None => {}
    }
    payload.set_plugins(plugins);

    request
        .body
        .insert(PLUGINS_KEY.to_string(), payload.encode());
    request
}
