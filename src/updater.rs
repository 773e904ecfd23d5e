//! Updater assembled from configuration and attached to the host's hooks

use std::sync::Arc;

use tracing::info;

use crate::config::{
    ConfigError, DEFAULT_HOOK_PRIORITY, OUTBOUND_HOOK_PRIORITY, UpdaterConfig,
};
use crate::hooks::interceptor::{OutboundRequest, filter_outbound_request};
use crate::hooks::{HookEvent, HookRegistry, UpdateHooks};
use crate::version::checker::UpdateChecker;
use crate::version::client::RemoteClient;
use crate::version::identity::{ClientIdentity, RemoteCredentials};
use crate::version::transport::{ReqwestTransport, Transport};
use crate::version::types::{DetailArgs, PendingUpdates, PluginDetails, VersionInfo};

/// Update checker for one plugin
pub struct RemoteUpdater {
    checker: UpdateChecker,
    registry_update_check: String,
}

impl RemoteUpdater {
    /// Creates an updater talking to the configured API over HTTP
    pub fn new(config: &UpdaterConfig) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(&config.http)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates an updater using the given transport
    pub fn with_transport(config: &UpdaterConfig, transport: Arc<dyn Transport>) -> Self {
        let version = config
            .api_data
            .as_ref()
            .map(|data| data.version.as_str())
            .unwrap_or_default();
        let identity = ClientIdentity::new(&config.api_url, &config.plugin_file, version);
        let credentials = RemoteCredentials::new(config.api_data.as_ref());

        Self {
            checker: UpdateChecker::new(identity, RemoteClient::new(transport, credentials)),
            registry_update_check: config.registry_update_check.clone(),
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        self.checker.identity()
    }

    /// Attaches the three update hooks to the host registry
    ///
    /// Registering the same updater again is a no-op.
    pub fn register(self: &Arc<Self>, registry: &mut dyn HookRegistry) {
        let hooks: Arc<dyn UpdateHooks> = self.clone();
        let registrations = [
            (HookEvent::HttpRequestArgs, OUTBOUND_HOOK_PRIORITY),
            (HookEvent::UpdatePlugins, DEFAULT_HOOK_PRIORITY),
            (HookEvent::PluginsApi, DEFAULT_HOOK_PRIORITY),
        ];

        let mut added = 0;
        for (event, priority) in registrations {
            if registry.register(event, priority, Arc::clone(&hooks)) {
                added += 1;
            }
        }

        if added > 0 {
            info!(
                "Registered {} update hooks for {}",
                added,
                self.identity().full_id()
            );
        }
    }

    /// Removes this plugin from bulk-check requests to the default registry
    pub fn filter_outbound_request(&self, request: OutboundRequest, url: &str) -> OutboundRequest {
        filter_outbound_request(
            request,
            url,
            &self.registry_update_check,
            self.identity().folder(),
        )
    }

    pub async fn on_periodic_check(
        &self,
        pending: Option<PendingUpdates>,
    ) -> Option<PendingUpdates> {
        self.checker.on_periodic_check(pending).await
    }

    pub async fn on_detail_request<T>(&self, action: &str, args: &DetailArgs, fallback: T) -> T
    where
        T: From<VersionInfo> + Send,
    {
        self.checker.on_detail_request(action, args, fallback).await
    }
}

#[async_trait::async_trait]
impl UpdateHooks for RemoteUpdater {
    fn hook_id(&self) -> &str {
        self.identity().full_id()
    }

    fn filter_request(&self, request: OutboundRequest, url: &str) -> OutboundRequest {
        self.filter_outbound_request(request, url)
    }

    async fn check_updates(&self, pending: Option<PendingUpdates>) -> Option<PendingUpdates> {
        self.on_periodic_check(pending).await
    }

    async fn plugin_details(
        &self,
        details: PluginDetails,
        action: &str,
        args: &DetailArgs,
    ) -> PluginDetails {
        self.on_detail_request(action, args, details).await
    }
}
