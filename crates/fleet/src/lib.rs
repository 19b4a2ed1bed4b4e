//! Node command capability and per-node fan-out for volharness.
//!
//! # Module Structure
//!
//! - [`node`]: The [`NodeClient`] capability trait the harness core runs on
//! - [`ssh`]: Production implementation shelling out to OpenSSH
//! - [`fleet`]: Named node registry, structured fan-out ([`NodeReport`]),
//!   and the bounded-concurrency [`soak`] helper
//!
//! # Architecture
//!
//! ```text
//! Harness ----> Fleet<N> ----> NodeClient (trait)
//!                                 |
//!                                 v
//!                            OpenSshNode ----> sshd on remote node
//! ```
//!
//! Every call blocks the caller until the remote side responds; only a
//! background launch returns early, and then only once the launch command
//! itself was accepted. There is no cancellation of dispatched commands.

pub mod fleet;
pub mod node;
pub mod ssh;

pub use fleet::{Fleet, NodeReport, soak};
pub use node::NodeClient;
pub use ssh::OpenSshNode;
