//! Shared foundation for the volharness workspace.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`HarnessError`, `RemoteError`, `ConfigError`)
//! - [`types`]: Service and volume identities (`ServiceKind`, `VolumeId`, `UseRecord`)
//! - [`config`]: Harness configuration (`HarnessConfig`, TOML + env overrides)
//!
//! Cluster state is never cached here: services, containers, and volumes
//! live on the remote nodes and are probed on demand by the harness crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::HarnessConfig;
pub use error::{ConfigError, HarnessError, RemoteError};
pub use types::{ServiceKind, UseRecord, VolumeId};
