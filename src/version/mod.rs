//! Remote version layer
//!
//! Talks to the custom update API, compares the advertised version against the
//! installed one and decides what to hand back to the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Transport  │◀────│   Client    │◀────│   Checker   │
//! │ (HTTP POST) │     │   (RPC)     │     │ (decision)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │  Identity   │     │   Semver    │
//!                     │(slug, creds)│     │ (compare)   │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`checker`]: Update decision engine for the periodic and detail hooks
//! - [`client`]: Remote version RPC
//! - [`error`]: Error types for remote operations
//! - [`identity`]: Client identity and credentials derived at construction
//! - [`semver`]: Version comparison
//! - [`transport`]: Transport trait and the reqwest implementation
//! - [`types`]: `VersionInfo`, `PendingUpdates` and friends

pub mod checker;
pub mod client;
pub mod error;
pub mod identity;
pub mod semver;
pub mod transport;
pub mod types;
