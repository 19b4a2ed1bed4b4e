//! Harness entry point -- owns the fleet and the shared configuration.

use std::sync::Arc;

use volharness_core::config::HarnessConfig;
use volharness_core::error::{HarnessError, RemoteError};
use volharness_fleet::{Fleet, NodeClient, OpenSshNode};

/// Test harness for one volume plugin cluster.
///
/// Generic over the node transport so the whole harness runs unmodified
/// against simulated nodes in tests.
pub struct Harness<N: NodeClient> {
    pub(crate) fleet: Fleet<N>,
    pub(crate) config: HarnessConfig,
}

impl<N: NodeClient> Harness<N> {
    /// Build a harness over an already-constructed fleet.
    pub fn new(fleet: Fleet<N>, config: HarnessConfig) -> Self {
        Self { fleet, config }
    }

    /// The node registry.
    pub fn fleet(&self) -> &Fleet<N> {
        &self.fleet
    }

    /// The active configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The control node, host of the centralized operations (management
    /// CLI, coordination store, block-image pool).
    pub(crate) fn control(&self) -> Result<Arc<N>, RemoteError> {
        self.fleet.get(&self.config.cluster.control_node)
    }

    /// Run a management CLI subcommand on the control node and capture its
    /// output.
    pub async fn volcli(&self, subcommand: &str) -> Result<String, HarnessError> {
        let command = format!("{} {subcommand}", self.config.services.cli_binary);
        Ok(self.control()?.run_with_output(&command).await?)
    }
}

impl Harness<OpenSshNode> {
    /// Build the production harness: one ssh-backed client per configured
    /// cluster node.
    pub fn connect(config: HarnessConfig) -> Self {
        let nodes = OpenSshNode::from_config(&config);
        Self::new(Fleet::new(nodes), config)
    }
}

/// Quote a string for safe interpolation into a POSIX shell command line.
pub(crate) fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
