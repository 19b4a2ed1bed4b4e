//! Configuration -- `volharness.toml` parsing and runtime settings.
//!
//! [`HarnessConfig`] is the top-level structure; each section has serde
//! defaults so a partial file (or none at all) yields a usable config.
//!
//! # Load precedence
//! 1. CLI arguments (highest, applied by the binary)
//! 2. Environment variables (`VOLHARNESS_{SECTION}_{FIELD}`)
//! 3. TOML file (`volharness.toml`)
//! 4. Defaults
//!
//! ```no_run
//! # async fn example() -> Result<(), volharness_core::error::HarnessError> {
//! use volharness_core::config::HarnessConfig;
//!
//! let config = HarnessConfig::load("volharness.toml").await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, HarnessError};
use crate::types::ServiceKind;

/// Top-level harness configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Cluster membership.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Remote-shell transport settings.
    #[serde(default)]
    pub ssh: SshConfig,
    /// Service binaries and readiness-probe tuning.
    #[serde(default)]
    pub services: ServiceConfig,
    /// Fixture documents uploaded during rebootstrap.
    #[serde(default)]
    pub fixtures: FixtureConfig,
    /// Logging for the harness itself.
    #[serde(default)]
    pub log: LogConfig,
}

/// Cluster membership: node names and the control node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Logical names of every node in the test cluster.
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,
    /// Node used for centralized operations (plugin CLI, coordination
    /// store, block-image pool). Must be a member of `nodes`.
    #[serde(default = "default_control_node")]
    pub control_node: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            control_node: default_control_node(),
        }
    }
}

/// OpenSSH transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// Remote user.
    #[serde(default = "default_ssh_user")]
    pub user: String,
    /// Private key path; empty means the ssh agent / default keys.
    #[serde(default)]
    pub identity_file: String,
    /// Remote sshd port.
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: default_ssh_user(),
            identity_file: String::new(),
            port: default_ssh_port(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Service binaries and readiness-probe tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Master service binary name.
    #[serde(default = "default_master_binary")]
    pub master_binary: String,
    /// Supervisor service binary name.
    #[serde(default = "default_supervisor_binary")]
    pub supervisor_binary: String,
    /// Plugin service binary name.
    #[serde(default = "default_plugin_binary")]
    pub plugin_binary: String,
    /// Plugin management CLI binary name.
    #[serde(default = "default_cli_binary")]
    pub cli_binary: String,
    /// Volume driver name passed to the container runtime.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Directory on each node receiving per-service log files.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Interval between readiness probes, in milliseconds.
    #[serde(default = "default_ready_interval_ms")]
    pub ready_interval_ms: u64,
    /// Readiness deadline per service per node, in seconds.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            master_binary: default_master_binary(),
            supervisor_binary: default_supervisor_binary(),
            plugin_binary: default_plugin_binary(),
            cli_binary: default_cli_binary(),
            driver: default_driver(),
            log_dir: default_log_dir(),
            ready_interval_ms: default_ready_interval_ms(),
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    /// Binary name for a service kind.
    pub fn binary(&self, kind: ServiceKind) -> &str {
        match kind {
            ServiceKind::Master => &self.master_binary,
            ServiceKind::Supervisor => &self.supervisor_binary,
            ServiceKind::Plugin => &self.plugin_binary,
        }
    }

    /// Append-mode log file for a service kind.
    pub fn log_file(&self, kind: ServiceKind) -> String {
        format!("{}/{}.log", self.log_dir.trim_end_matches('/'), self.binary(kind))
    }

    /// Readiness probe interval.
    pub fn ready_interval(&self) -> Duration {
        Duration::from_millis(self.ready_interval_ms)
    }

    /// Readiness probe deadline.
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

/// Fixture documents for the baseline cluster state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// Local directory holding `<fixture>.json` documents.
    #[serde(default = "default_fixture_dir")]
    pub dir: PathBuf,
    /// Global configuration fixture uploaded at rebootstrap.
    #[serde(default = "default_global_fixture")]
    pub global: String,
    /// Name under which the baseline policy is uploaded.
    #[serde(default = "default_policy_name")]
    pub policy_name: String,
    /// Fixture file for the baseline policy document.
    #[serde(default = "default_policy_fixture")]
    pub policy_file: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            dir: default_fixture_dir(),
            global: default_global_fixture(),
            policy_name: default_policy_name(),
            policy_file: default_policy_fixture(),
        }
    }
}

/// Logging settings for the harness binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format: `json` or `pretty`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file and apply environment overrides.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file without environment overrides.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HarnessError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HarnessError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, HarnessError> {
        toml::from_str(toml_str).map_err(|e| {
            HarnessError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Apply `VOLHARNESS_{SECTION}_{FIELD}` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        override_csv(&mut self.cluster.nodes, "VOLHARNESS_CLUSTER_NODES");
        override_string(&mut self.cluster.control_node, "VOLHARNESS_CLUSTER_CONTROL_NODE");

        override_string(&mut self.ssh.user, "VOLHARNESS_SSH_USER");
        override_string(&mut self.ssh.identity_file, "VOLHARNESS_SSH_IDENTITY_FILE");
        override_u16(&mut self.ssh.port, "VOLHARNESS_SSH_PORT");
        override_u64(
            &mut self.ssh.connect_timeout_secs,
            "VOLHARNESS_SSH_CONNECT_TIMEOUT_SECS",
        );

        override_string(&mut self.services.master_binary, "VOLHARNESS_SERVICES_MASTER_BINARY");
        override_string(
            &mut self.services.supervisor_binary,
            "VOLHARNESS_SERVICES_SUPERVISOR_BINARY",
        );
        override_string(&mut self.services.plugin_binary, "VOLHARNESS_SERVICES_PLUGIN_BINARY");
        override_string(&mut self.services.cli_binary, "VOLHARNESS_SERVICES_CLI_BINARY");
        override_string(&mut self.services.driver, "VOLHARNESS_SERVICES_DRIVER");
        override_string(&mut self.services.log_dir, "VOLHARNESS_SERVICES_LOG_DIR");
        override_u64(
            &mut self.services.ready_interval_ms,
            "VOLHARNESS_SERVICES_READY_INTERVAL_MS",
        );
        override_u64(
            &mut self.services.ready_timeout_secs,
            "VOLHARNESS_SERVICES_READY_TIMEOUT_SECS",
        );

        override_path(&mut self.fixtures.dir, "VOLHARNESS_FIXTURES_DIR");
        override_string(&mut self.fixtures.global, "VOLHARNESS_FIXTURES_GLOBAL");
        override_string(&mut self.fixtures.policy_name, "VOLHARNESS_FIXTURES_POLICY_NAME");
        override_string(&mut self.fixtures.policy_file, "VOLHARNESS_FIXTURES_POLICY_FILE");

        override_string(&mut self.log.level, "VOLHARNESS_LOG_LEVEL");
        override_string(&mut self.log.format, "VOLHARNESS_LOG_FORMAT");
    }

    /// Validate the configuration, rejecting values the harness cannot run
    /// with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster.nodes.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "cluster.nodes".to_owned(),
                reason: "must list at least one node".to_owned(),
            });
        }
        if !self.cluster.nodes.contains(&self.cluster.control_node) {
            return Err(ConfigError::InvalidValue {
                field: "cluster.control_node".to_owned(),
                reason: format!(
                    "'{}' is not a member of cluster.nodes",
                    self.cluster.control_node
                ),
            });
        }
        if self.services.ready_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "services.ready_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.services.ready_timeout() <= self.services.ready_interval() {
            return Err(ConfigError::InvalidValue {
                field: "services.ready_timeout_secs".to_owned(),
                reason: "must exceed the probe interval".to_owned(),
            });
        }
        for (field, value) in [
            ("services.master_binary", &self.services.master_binary),
            ("services.supervisor_binary", &self.services.supervisor_binary),
            ("services.plugin_binary", &self.services.plugin_binary),
            ("services.cli_binary", &self.services.cli_binary),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "must not be empty".to_owned(),
                });
            }
        }
        match self.log.format.as_str() {
            "json" | "pretty" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "log.format".to_owned(),
                    reason: format!("unknown format '{other}', expected 'json' or 'pretty'"),
                });
            }
        }
        Ok(())
    }
}

fn override_string(target: &mut String, key: &str) {
    if let Ok(value) = std::env::var(key) {
        *target = value;
    }
}

fn override_path(target: &mut PathBuf, key: &str) {
    if let Ok(value) = std::env::var(key) {
        *target = PathBuf::from(value);
    }
}

fn override_csv(target: &mut Vec<String>, key: &str) {
    if let Ok(value) = std::env::var(key) {
        *target = value
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

fn override_u16(target: &mut u16, key: &str) {
    if let Ok(value) = std::env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(key, value, "ignoring unparseable env override"),
        }
    }
}

fn override_u64(target: &mut u64, key: &str) {
    if let Ok(value) = std::env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(key, value, "ignoring unparseable env override"),
        }
    }
}

fn default_nodes() -> Vec<String> {
    vec!["node0".to_owned(), "node1".to_owned(), "node2".to_owned()]
}

fn default_control_node() -> String {
    "node0".to_owned()
}

fn default_ssh_user() -> String {
    "vagrant".to_owned()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_master_binary() -> String {
    "volmaster".to_owned()
}

fn default_supervisor_binary() -> String {
    "volsupervisor".to_owned()
}

fn default_plugin_binary() -> String {
    "volplugin".to_owned()
}

fn default_cli_binary() -> String {
    "volcli".to_owned()
}

fn default_driver() -> String {
    "volplugin".to_owned()
}

fn default_log_dir() -> String {
    "/tmp".to_owned()
}

fn default_ready_interval_ms() -> u64 {
    100
}

fn default_ready_timeout_secs() -> u64 {
    10
}

fn default_fixture_dir() -> PathBuf {
    PathBuf::from("testdata")
}

fn default_global_fixture() -> String {
    "global1".to_owned()
}

fn default_policy_name() -> String {
    "policy1".to_owned()
}

fn default_policy_fixture() -> String {
    "intent1".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "pretty".to_owned()
}
