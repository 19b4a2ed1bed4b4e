//! Named node registry and structured per-node fan-out.
//!
//! An aggregate operation against the fleet attempts **every** node even
//! when some fail, and reports failure if any node failed
//! (first-error-wins, full-attempt guarantee). Whether a failure is fatal
//! is the caller's choice: [`NodeReport::into_result`] for required steps,
//! [`NodeReport::advisory`] for best-effort steps, which logs each failure
//! and hands it back instead of silently discarding it.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, warn};

use volharness_core::error::{HarnessError, RemoteError};

use crate::node::NodeClient;

/// Registry of the cluster's nodes, addressed by logical name.
pub struct Fleet<N> {
    nodes: Vec<Arc<N>>,
}

impl<N: NodeClient> Fleet<N> {
    /// Build a fleet from node clients. Order is preserved and defines the
    /// report order of fan-out results.
    pub fn new(nodes: impl IntoIterator<Item = N>) -> Self {
        Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
        }
    }

    /// Look up a node by name.
    pub fn get(&self, name: &str) -> Result<Arc<N>, RemoteError> {
        self.nodes
            .iter()
            .find(|n| n.name() == name)
            .cloned()
            .ok_or_else(|| RemoteError::UnknownNode(name.to_owned()))
    }

    /// Logical names of every node, in registry order.
    pub fn names(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.name().to_owned()).collect()
    }

    /// Number of nodes in the fleet.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Dispatch one operation per node concurrently and collect a named
    /// per-node result set.
    ///
    /// Every node is attempted regardless of other nodes' outcomes. The
    /// returned report preserves registry order.
    pub async fn broadcast<F, Fut>(&self, op: F) -> NodeReport
    where
        F: Fn(Arc<N>) -> Fut,
        Fut: Future<Output = Result<(), HarnessError>> + Send + 'static,
    {
        let mut set = JoinSet::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            let name = node.name().to_owned();
            let fut = op(Arc::clone(node));
            set.spawn(async move { (idx, name, fut.await) });
        }

        let mut by_idx: BTreeMap<usize, (String, Result<(), HarnessError>)> = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, name, result)) => {
                    by_idx.insert(idx, (name, result));
                }
                Err(e) => error!(error = %e, "fan-out task panicked"),
            }
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            by_idx.entry(idx).or_insert_with(|| {
                (
                    node.name().to_owned(),
                    Err(RemoteError::Transport {
                        node: node.name().to_owned(),
                        reason: "fan-out task panicked".to_owned(),
                    }
                    .into()),
                )
            });
        }

        NodeReport {
            entries: by_idx.into_values().collect(),
        }
    }
}

/// Named per-node result set from a fleet fan-out.
#[derive(Debug)]
pub struct NodeReport {
    entries: Vec<(String, Result<(), HarnessError>)>,
}

impl NodeReport {
    /// True when every node succeeded.
    pub fn is_ok(&self) -> bool {
        self.entries.iter().all(|(_, r)| r.is_ok())
    }

    /// Number of nodes attempted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no nodes were attempted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nodes that failed, with their errors.
    pub fn failures(&self) -> Vec<(&str, &HarnessError)> {
        self.entries
            .iter()
            .filter_map(|(name, r)| r.as_ref().err().map(|e| (name.as_str(), e)))
            .collect()
    }

    /// Collapse into a single result: first error wins. All nodes were
    /// already attempted by the time this is called.
    pub fn into_result(self) -> Result<(), HarnessError> {
        for (_, result) in self.entries {
            result?;
        }
        Ok(())
    }

    /// Treat failures as advisory: log each at `warn` and return them for
    /// optional inspection. Never fatal.
    pub fn advisory(self, action: &str) -> Vec<(String, HarnessError)> {
        let mut failed = Vec::new();
        for (node, result) in self.entries {
            if let Err(err) = result {
                warn!(node = %node, error = %err, "{action} failed; continuing");
                failed.push((node, err));
            }
        }
        failed
    }
}

/// Dispatch `iterations` invocations of one command on one node in
/// parallel batches of at most `batch`, collecting every result.
///
/// This is fan-out-with-aggregation for stress scenarios: there is no
/// ordering requirement between invocations, but every result is returned
/// so the caller can check each one.
pub async fn soak<N: NodeClient>(
    node: Arc<N>,
    command: &str,
    iterations: usize,
    batch: usize,
) -> Vec<Result<(), RemoteError>> {
    let batch = batch.max(1);
    let mut results = Vec::with_capacity(iterations);
    let mut remaining = iterations;
    while remaining > 0 {
        let this_batch = remaining.min(batch);
        let mut set = JoinSet::new();
        for i in 0..this_batch {
            let node = Arc::clone(&node);
            let command = command.to_owned();
            set.spawn(async move { (i, node.run(&command).await) });
        }
        let mut batch_results: Vec<(usize, Result<(), RemoteError>)> =
            Vec::with_capacity(this_batch);
        while let Some(joined) = set.join_next().await {
            if let Ok(entry) = joined {
                batch_results.push(entry);
            }
        }
        batch_results.sort_by_key(|(i, _)| *i);
        results.extend(batch_results.into_iter().map(|(_, r)| r));
        remaining -= this_batch;
    }
    results
}
