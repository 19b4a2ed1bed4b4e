//! Shared harness types -- service and volume identities.
//!
//! The harness never holds live cluster state; these types are names used
//! to address remote processes and volumes, not handles to them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One of the three cooperating services of the volume system under test.
///
/// Lifecycle state (stopped / starting / running) lives only in the remote
/// process table. The harness can observe "running" via a process probe and
/// never observes "starting" directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Cluster-wide volume state owner; must be reachable before anything
    /// else starts.
    Master,
    /// Supervision daemon; runs on the control node only.
    Supervisor,
    /// Per-node volume plugin; requires a reachable master and supervisor.
    Plugin,
}

impl ServiceKind {
    /// All service kinds, in dependency order (dependencies first).
    pub const ALL: [ServiceKind; 3] = [
        ServiceKind::Master,
        ServiceKind::Supervisor,
        ServiceKind::Plugin,
    ];
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceKind::Master => "master",
            ServiceKind::Supervisor => "supervisor",
            ServiceKind::Plugin => "plugin",
        };
        f.write_str(name)
    }
}

impl FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" => Ok(ServiceKind::Master),
            "supervisor" => Ok(ServiceKind::Supervisor),
            "plugin" => Ok(ServiceKind::Plugin),
            other => Err(ConfigError::InvalidValue {
                field: "service".to_owned(),
                reason: format!("unknown service '{other}', expected master, supervisor, or plugin"),
            }),
        }
    }
}

/// Volume identity: a policy name plus a volume name.
///
/// Rendered `policy/name` for the plugin and container-runtime CLIs, and
/// `policy.name` for the backing block image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeId {
    /// Policy governing the volume's provisioning rules.
    pub policy: String,
    /// Volume name within the policy.
    pub name: String,
}

impl VolumeId {
    /// Build a volume identity from policy and name.
    pub fn new(policy: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            name: name.into(),
        }
    }

    /// Name of the block image backing this volume (`policy.name`).
    pub fn image(&self) -> String {
        format!("{}.{}", self.policy, self.name)
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.policy, self.name)
    }
}

impl FromStr for VolumeId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((policy, name)) if !policy.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(VolumeId::new(policy, name))
            }
            _ => Err(ConfigError::InvalidValue {
                field: "volume".to_owned(),
                reason: format!("'{s}' is not of the form policy/name"),
            }),
        }
    }
}

/// Mount use-record returned by the plugin's `use get` query.
///
/// Only the fields the harness asserts on are decoded; the plugin returns
/// more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseRecord {
    /// Hostname the mounting plugin recorded, which is the plugin's
    /// host-label override when one was given.
    pub hostname: String,
}
