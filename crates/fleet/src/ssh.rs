//! OpenSSH-subprocess implementation of [`NodeClient`].
//!
//! Each dispatch spawns one `ssh` process via `tokio::process::Command`.
//! No connection is pooled; the test clusters this harness targets are
//! small enough that per-command sessions are not the bottleneck, and a
//! fresh session per command keeps failures independent.

use tokio::process::Command;
use tracing::trace;

use volharness_core::config::{HarnessConfig, SshConfig};
use volharness_core::error::RemoteError;

use crate::node::NodeClient;

/// A remote node reached through the system `ssh` binary.
pub struct OpenSshNode {
    name: String,
    host: String,
    ssh: SshConfig,
}

impl OpenSshNode {
    /// Build a node client for `host`, addressed as `name` by the harness.
    pub fn new(name: impl Into<String>, host: impl Into<String>, ssh: SshConfig) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            ssh,
        }
    }

    /// Build one client per configured cluster node, using the node's
    /// logical name as its hostname.
    pub fn from_config(config: &HarnessConfig) -> Vec<Self> {
        config
            .cluster
            .nodes
            .iter()
            .map(|name| Self::new(name.clone(), name.clone(), config.ssh.clone()))
            .collect()
    }

    /// Argument vector for one ssh invocation.
    fn ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_owned(),
            "BatchMode=yes".to_owned(),
            "-o".to_owned(),
            "StrictHostKeyChecking=no".to_owned(),
            "-o".to_owned(),
            format!("ConnectTimeout={}", self.ssh.connect_timeout_secs),
            "-p".to_owned(),
            self.ssh.port.to_string(),
        ];
        if !self.ssh.identity_file.is_empty() {
            args.push("-i".to_owned());
            args.push(self.ssh.identity_file.clone());
        }
        args.push(format!("{}@{}", self.ssh.user, self.host));
        args.push(command.to_owned());
        args
    }

    /// Dispatch a command and collect its exit status and combined output.
    async fn exec(&self, command: &str) -> Result<(i32, String), RemoteError> {
        trace!(node = %self.name, command, "dispatching ssh command");
        let output = Command::new("ssh")
            .args(self.ssh_args(command))
            .kill_on_drop(false)
            .output()
            .await
            .map_err(|e| RemoteError::Transport {
                node: self.name.clone(),
                reason: format!("failed to spawn ssh: {e}"),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let status = output.status.code().unwrap_or(-1);
        Ok((status, combined))
    }
}

impl NodeClient for OpenSshNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, command: &str) -> Result<(), RemoteError> {
        let (status, output) = self.exec(command).await?;
        if status != 0 {
            return Err(RemoteError::CommandFailed {
                node: self.name.clone(),
                command: command.to_owned(),
                status,
                output,
            });
        }
        Ok(())
    }

    async fn run_with_output(&self, command: &str) -> Result<String, RemoteError> {
        let (status, output) = self.exec(command).await?;
        if status != 0 {
            return Err(RemoteError::CommandFailed {
                node: self.name.clone(),
                command: command.to_owned(),
                status,
                output,
            });
        }
        Ok(output)
    }

    async fn run_background(&self, command: &str) -> Result<(), RemoteError> {
        // Detach on the remote side; ssh returns once the subshell forked.
        let detached = format!("({command}) </dev/null >/dev/null 2>&1 &");
        let (status, output) = self.exec(&detached).await?;
        if status != 0 {
            return Err(RemoteError::Launch {
                node: self.name.clone(),
                reason: format!("exit {status}: {output}"),
            });
        }
        Ok(())
    }
}
