//! Scripted node doubles for unit tests.

use std::sync::{Arc, Mutex};

use volharness_core::config::HarnessConfig;
use volharness_core::error::RemoteError;
use volharness_fleet::{Fleet, NodeClient};

use crate::suite::Harness;

/// Chronological command log shared by every node in one test fleet, so
/// cross-node ordering can be asserted.
#[derive(Clone, Default)]
pub(crate) struct CommandLog(Arc<Mutex<Vec<(String, String)>>>);

impl CommandLog {
    pub fn record(&self, node: &str, command: &str) {
        self.0
            .lock()
            .unwrap()
            .push((node.to_owned(), command.to_owned()));
    }

    pub fn commands(&self) -> Vec<(String, String)> {
        self.0.lock().unwrap().clone()
    }

    /// Index of the first logged command containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .position(|(_, cmd)| cmd.contains(needle))
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.position(needle).is_some()
    }
}

struct Rule {
    needle: String,
    status: i32,
    output: String,
}

/// Node double that records every dispatched command and answers from a
/// list of substring-matched rules. Unmatched commands succeed with empty
/// output.
pub(crate) struct RecordingNode {
    name: String,
    log: CommandLog,
    rules: Mutex<Vec<Rule>>,
}

impl RecordingNode {
    pub fn new(name: &str, log: CommandLog) -> Self {
        Self {
            name: name.to_owned(),
            log,
            rules: Mutex::new(Vec::new()),
        }
    }

    /// Succeed with `output` for commands containing `needle`.
    pub fn respond(&self, needle: &str, output: &str) {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_owned(),
            status: 0,
            output: output.to_owned(),
        });
    }

    /// Fail with `status` and `output` for commands containing `needle`.
    pub fn fail_on(&self, needle: &str, status: i32, output: &str) {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_owned(),
            status,
            output: output.to_owned(),
        });
    }

    fn dispatch(&self, command: &str) -> Result<String, RemoteError> {
        self.log.record(&self.name, command);
        let rules = self.rules.lock().unwrap();
        match rules.iter().find(|r| command.contains(&r.needle)) {
            Some(rule) if rule.status != 0 => Err(RemoteError::CommandFailed {
                node: self.name.clone(),
                command: command.to_owned(),
                status: rule.status,
                output: rule.output.clone(),
            }),
            Some(rule) => Ok(rule.output.clone()),
            None => Ok(String::new()),
        }
    }
}

impl NodeClient for RecordingNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, command: &str) -> Result<(), RemoteError> {
        self.dispatch(command).map(|_| ())
    }

    async fn run_with_output(&self, command: &str) -> Result<String, RemoteError> {
        self.dispatch(command)
    }

    async fn run_background(&self, command: &str) -> Result<(), RemoteError> {
        self.dispatch(command).map(|_| ()).map_err(|err| {
            RemoteError::Launch {
                node: self.name.clone(),
                reason: err.to_string(),
            }
        })
    }
}

/// Harness over recording nodes; the first listed node is the control node.
/// Probe timing is tightened so paused-clock tests finish instantly.
pub(crate) fn recording_harness(nodes: &[&str]) -> (Harness<RecordingNode>, CommandLog) {
    let log = CommandLog::default();
    let mut config = HarnessConfig::default();
    config.cluster.nodes = nodes.iter().map(|n| (*n).to_owned()).collect();
    config.cluster.control_node = nodes[0].to_owned();
    config.services.ready_interval_ms = 10;
    config.services.ready_timeout_secs = 1;
    let fleet = Fleet::new(nodes.iter().map(|n| RecordingNode::new(n, log.clone())));
    (Harness::new(fleet, config), log)
}
