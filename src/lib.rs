//! Client-side update checker for plugins served from a custom endpoint
//!
//! The host's update flow is driven through three hooks: the periodic
//! "pending updates" computation, the on-demand detail view, and the outbound
//! bulk-check request to the default registry, which is rewritten so the
//! registry never sees this plugin.

pub mod config;
pub mod hooks;
pub mod payload;
pub mod updater;
pub mod version;
