//! Update decision engine
//!
//! Failures of the remote call never reach the host: the periodic check leaves
//! the pending updates untouched and the detail view falls back to the host's
//! own data.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::version::client::RemoteClient;
use crate::version::identity::ClientIdentity;
use crate::version::semver::is_update_available;
use crate::version::types::{Action, DetailArgs, PendingUpdates, VersionInfo};

pub struct UpdateChecker {
    identity: ClientIdentity,
    client: RemoteClient,
}

impl UpdateChecker {
    pub fn new(identity: ClientIdentity, client: RemoteClient) -> Self {
        Self { identity, client }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    fn own_params(&self) -> IndexMap<String, String> {
        IndexMap::from([("slug".to_string(), self.identity.slug().to_string())])
    }

    /// Adds this plugin to the host's pending updates when the API advertises
    /// a newer version
    ///
    /// Absent or empty state is returned as is; there is nothing to augment.
    pub async fn on_periodic_check(
        &self,
        pending: Option<PendingUpdates>,
    ) -> Option<PendingUpdates> {
        let mut pending = match pending {
            Some(pending) if !pending.is_empty() => pending,
            other => {
                debug!("No pending update data, skipping check for {}", self.identity.slug());
                return other;
            }
        };

        // Absorbed here: transport and empty-response errors mean "no update".
        let Ok(info) = self
            .client
            .check_remote(&self.identity, Action::LatestVersion, &self.own_params())
            .await
        else {
            return Some(pending);
        };

        if is_update_available(self.identity.version(), &info.new_version) {
            info!(
                "Update available for {}: {} -> {}",
                self.identity.full_id(),
                self.identity.version(),
                info.new_version
            );
            pending
                .response
                .insert(self.identity.full_id().to_string(), info);
        } else {
            debug!(
                "{} {} is up to date (remote {})",
                self.identity.full_id(),
                self.identity.version(),
                info.new_version
            );
        }

        Some(pending)
    }

    /// Replaces the detail-view data with the API's answer for this plugin
    ///
    /// Requests for other actions or other plugins get `fallback` back.
    pub async fn on_detail_request<T>(&self, action: &str, args: &DetailArgs, fallback: T) -> T
    where
        T: From<VersionInfo> + Send,
    {
        if action != Action::Information.as_str()
            || args.slug.as_deref() != Some(self.identity.slug())
        {
            return fallback;
        }

        // Absorbed here: the host keeps its own data on failure.
        match self
            .client
            .check_remote(&self.identity, Action::Information, &self.own_params())
            .await
        {
            Ok(info) => T::from(info),
            Err(_) => fallback,
        }
    }
}
