//! Error types -- harness-wide error taxonomy.
//!
//! Required fixture-setup steps fail with [`HarnessError::Setup`] (or a more
//! specific variant) and abort the enclosing sequence. Best-effort teardown
//! steps never surface here; they are reported through
//! `NodeReport::advisory` in the fleet crate and produce only log lines.

use std::time::Duration;

/// Top-level harness error type.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A required setup step failed. Carries the remote command's captured
    /// output for diagnosis.
    #[error("setup step '{step}' failed: {output}")]
    Setup {
        /// Human-readable name of the failing step.
        step: String,
        /// Captured remote output (stdout and stderr combined).
        output: String,
    },

    /// A readiness probe never succeeded within its deadline.
    ///
    /// Whether this is fatal is call-site policy: cluster startup treats it
    /// as fatal, resilient teardown paths discard it with a warning.
    #[error("timed out waiting for {what} after {waited:?}")]
    Timeout {
        /// What was being waited for.
        what: String,
        /// The configured deadline that elapsed.
        waited: Duration,
    },

    /// Volume creation failed, either at the container runtime or during
    /// verification through the plugin's own query command.
    #[error("volume create failed for '{volume}': {output}")]
    VolumeCreate {
        /// Volume in `policy/name` form.
        volume: String,
        /// Captured remote output.
        output: String,
    },

    /// A plugin query returned output that could not be decoded.
    #[error("malformed JSON from '{context}': {reason}")]
    Malformed {
        /// The query that produced the output.
        context: String,
        /// Decode failure detail.
        reason: String,
    },

    /// Remote command execution error.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A fixture document could not be read or is not valid JSON.
    #[error("fixture error: {path}: {reason}")]
    Fixture {
        /// Fixture file path.
        path: String,
        /// Read or parse failure detail.
        reason: String,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Captured remote output for errors that wrap one, the display string
    /// otherwise. Lets callers fold any failure into a diagnostic message.
    pub fn remote_output(&self) -> String {
        match self {
            HarnessError::Remote(remote) => remote.output(),
            other => other.to_string(),
        }
    }
}

/// Remote command capability errors.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// A dispatched command exited non-zero.
    #[error("command failed on '{node}' (exit {status}): {command}: {output}")]
    CommandFailed {
        /// Node the command ran on.
        node: String,
        /// The command line as dispatched.
        command: String,
        /// Remote exit status (-1 if terminated by signal).
        status: i32,
        /// Captured output (stdout and stderr combined).
        output: String,
    },

    /// A background launch was not accepted.
    #[error("background launch failed on '{node}': {reason}")]
    Launch {
        /// Node the launch targeted.
        node: String,
        /// Launch failure detail.
        reason: String,
    },

    /// The transport itself failed before the command could run.
    #[error("transport error on '{node}': {reason}")]
    Transport {
        /// Node the call targeted.
        node: String,
        /// Transport failure detail.
        reason: String,
    },

    /// A node name not present in the fleet.
    #[error("unknown node: {0}")]
    UnknownNode(String),
}

impl RemoteError {
    /// Captured remote output, when the error carries any.
    ///
    /// Used to surface command output inside [`HarnessError::Setup`] and
    /// [`HarnessError::VolumeCreate`].
    pub fn output(&self) -> String {
        match self {
            RemoteError::CommandFailed { output, .. } => output.clone(),
            other => other.to_string(),
        }
    }

    /// Remote exit status, when the command ran at all.
    pub fn status(&self) -> Option<i32> {
        match self {
            RemoteError::CommandFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: String,
    },

    /// Configuration could not be parsed.
    #[error("failed to parse config: {reason}")]
    ParseFailed {
        /// Parse failure detail.
        reason: String,
    },

    /// A configuration value failed validation.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue {
        /// Offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}
