//! System-test harness for a distributed volume plugin cluster.
//!
//! The harness drives a small fleet of nodes running three cooperating
//! services (a master, a supervisor, and a per-node volume plugin) plus a
//! management CLI, all reached over a remote shell. It owns the fixture
//! lifecycle tests depend on: starting and stopping services in dependency
//! order, creating and purging volumes, uploading intent documents, and
//! resetting the whole cluster to a known baseline.
//!
//! # Module Structure
//!
//! - [`suite`]: The [`Harness`] entry point and its constructors
//! - [`poller`]: Deadline-bounded condition polling
//! - `lifecycle`: Service start / stop / readiness, per node and fleet-wide
//! - `volume`: Volume create, purge, and usage queries
//! - `intent`: Policy and global configuration uploads
//! - `reset`: The ordered cluster rebootstrap sequence and its sweeps
//!
//! All harness operations live as inherent methods on [`Harness`]; the
//! module split only groups them by concern.

pub mod poller;
pub mod suite;

mod intent;
mod lifecycle;
mod reset;
mod volume;

#[cfg(test)]
pub(crate) mod testutil;

pub use suite::Harness;

pub use volharness_core::config::HarnessConfig;
pub use volharness_core::error::{HarnessError, RemoteError};
pub use volharness_core::types::{ServiceKind, UseRecord, VolumeId};
pub use volharness_fleet::{Fleet, NodeClient, NodeReport, OpenSshNode, soak};
