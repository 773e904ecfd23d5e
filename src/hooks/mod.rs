//! Host hook integration
//!
//! The host exposes an interceptor registry; the updater attaches one handler
//! per [`HookEvent`]. [`HookTable`] is an in-process registry that dispatches
//! events to registered handlers in priority order.
//!
//! # Modules
//!
//! - [`interceptor`]: Rewrites outbound bulk-check requests

pub mod interceptor;

use std::sync::Arc;

use tracing::debug;

use crate::hooks::interceptor::OutboundRequest;
use crate::version::types::{DetailArgs, PendingUpdates, PluginDetails};

/// Host events the updater listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Before an outbound HTTP request is sent
    HttpRequestArgs,
    /// While the host computes its pending plugin updates
    UpdatePlugins,
    /// When the host needs detail-view data for a plugin
    PluginsApi,
}

impl HookEvent {
    /// Host-side name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::HttpRequestArgs => "http_request_args",
            HookEvent::UpdatePlugins => "pre_set_site_transient_update_plugins",
            HookEvent::PluginsApi => "plugins_api",
        }
    }
}

/// Callbacks a plugin updater provides to the host
#[async_trait::async_trait]
pub trait UpdateHooks: Send + Sync {
    /// Identity of the handler; registrations are unique per event and id
    fn hook_id(&self) -> &str;

    fn filter_request(&self, request: OutboundRequest, url: &str) -> OutboundRequest;

    async fn check_updates(&self, pending: Option<PendingUpdates>) -> Option<PendingUpdates>;

    async fn plugin_details(
        &self,
        details: PluginDetails,
        action: &str,
        args: &DetailArgs,
    ) -> PluginDetails;
}

/// Interceptor registry supplied by the host
pub trait HookRegistry {
    /// Registers `handler` for `event`
    ///
    /// Returns false when the same handler is already registered for the event.
    fn register(&mut self, event: HookEvent, priority: i32, handler: Arc<dyn UpdateHooks>)
    -> bool;
}

struct HookEntry {
    event: HookEvent,
    priority: i32,
    handler: Arc<dyn UpdateHooks>,
}

/// In-process hook registry and dispatcher
#[derive(Default)]
pub struct HookTable {
    entries: Vec<HookEntry>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers registered for `event`
    pub fn count(&self, event: HookEvent) -> usize {
        self.entries.iter().filter(|e| e.event == event).count()
    }

    /// Handlers for `event`, lowest priority first, registration order within
    /// a priority
    fn handlers(&self, event: HookEvent) -> Vec<Arc<dyn UpdateHooks>> {
        let mut entries: Vec<&HookEntry> =
            self.entries.iter().filter(|e| e.event == event).collect();
        entries.sort_by_key(|e| e.priority);
        entries.into_iter().map(|e| Arc::clone(&e.handler)).collect()
    }

    pub fn apply_request_filters(&self, request: OutboundRequest, url: &str) -> OutboundRequest {
        self.handlers(HookEvent::HttpRequestArgs)
            .iter()
            .fold(request, |request, handler| handler.filter_request(request, url))
    }

    pub async fn apply_update_checks(
        &self,
        mut pending: Option<PendingUpdates>,
    ) -> Option<PendingUpdates> {
        for handler in self.handlers(HookEvent::UpdatePlugins) {
            pending = handler.check_updates(pending).await;
        }
        pending
    }

    pub async fn apply_plugin_details(
        &self,
        mut details: PluginDetails,
        action: &str,
        args: &DetailArgs,
    ) -> PluginDetails {
        for handler in self.handlers(HookEvent::PluginsApi) {
            details = handler.plugin_details(details, action, args).await;
        }
        details
    }
}

impl HookRegistry for HookTable {
    fn register(
        &mut self,
        event: HookEvent,
        priority: i32,
        handler: Arc<dyn UpdateHooks>,
    ) -> bool {
        let duplicate = self
            .entries
            .iter()
            .any(|e| e.event == event && e.handler.hook_id() == handler.hook_id());
        if duplicate {
            debug!(
                "{} already registered for {}",
                handler.hook_id(),
                event.as_str()
            );
            return false;
        }

        self.entries.push(HookEntry {
            event,
            priority,
            handler,
        });
        true
    }
}
