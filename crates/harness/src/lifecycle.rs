//! Service lifecycle -- start, stop, and readiness, per node and fleet-wide.
//!
//! Services are launched detached under `nohup` with output appended to a
//! per-service log file, stopped by name with `pkill`, and probed for
//! readiness with `pgrep` through the deadline poller. A launch returning
//! is not readiness; callers that need a running service must wait on the
//! probe.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use volharness_core::error::HarnessError;
use volharness_core::types::ServiceKind;
use volharness_fleet::{NodeClient, NodeReport};

use crate::poller::wait_until;
use crate::suite::Harness;

/// Launch a service binary detached on one node, appending output to its
/// log file.
async fn launch<N: NodeClient>(
    node: &N,
    binary: &str,
    extra_args: &[String],
    log_file: &str,
) -> Result<(), HarnessError> {
    let args = if extra_args.is_empty() {
        String::new()
    } else {
        format!(" {}", extra_args.join(" "))
    };
    let command =
        format!("sudo -E nohup $(which {binary}){args} </dev/null 2>&1 | sudo tee -a {log_file}");
    node.run_background(&command).await?;
    Ok(())
}

/// Stop a service by binary name. A service that is not running is
/// already stopped, not an error.
async fn terminate<N: NodeClient>(node: &N, binary: &str) -> Result<(), HarnessError> {
    match node.run(&format!("sudo pkill {binary}")).await {
        Ok(()) => Ok(()),
        // pkill exits 1 when no process matched
        Err(err) if err.status() == Some(1) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Poll until the service's process exists on the node.
async fn await_process<N: NodeClient>(
    node: &Arc<N>,
    kind: ServiceKind,
    binary: String,
    interval: Duration,
    timeout: Duration,
) -> Result<(), HarnessError> {
    let what = format!("{kind} on {}", node.name());
    let command = format!("pgrep -c {binary}");
    wait_until(&what, interval, timeout, || {
        let node = Arc::clone(node);
        let command = command.clone();
        async move { node.run(&command).await.is_ok() }
    })
    .await
}

impl<N: NodeClient> Harness<N> {
    /// Start one service on one node, passing `extra_args` through to the
    /// binary. Returns once the launch is accepted.
    pub async fn start_service(
        &self,
        kind: ServiceKind,
        node: &str,
        extra_args: &[String],
    ) -> Result<(), HarnessError> {
        info!(service = %kind, node, "starting service");
        let target = self.fleet.get(node)?;
        launch(
            target.as_ref(),
            self.config.services.binary(kind),
            extra_args,
            &self.config.services.log_file(kind),
        )
        .await
    }

    /// Stop one service on one node. Idempotent.
    pub async fn stop_service(&self, kind: ServiceKind, node: &str) -> Result<(), HarnessError> {
        debug!(service = %kind, node, "stopping service");
        let target = self.fleet.get(node)?;
        terminate(target.as_ref(), self.config.services.binary(kind)).await
    }

    /// Block until the service's process exists on the node, failing after
    /// the configured readiness deadline.
    pub async fn wait_service_ready(
        &self,
        kind: ServiceKind,
        node: &str,
    ) -> Result<(), HarnessError> {
        let target = self.fleet.get(node)?;
        await_process(
            &target,
            kind,
            self.config.services.binary(kind).to_owned(),
            self.config.services.ready_interval(),
            self.config.services.ready_timeout(),
        )
        .await
    }

    /// Start one service on every node concurrently.
    pub async fn start_service_everywhere(&self, kind: ServiceKind) -> NodeReport {
        info!(service = %kind, "starting service on every node");
        let binary = self.config.services.binary(kind).to_owned();
        let log_file = self.config.services.log_file(kind);
        self.fleet
            .broadcast(move |node| {
                let binary = binary.clone();
                let log_file = log_file.clone();
                async move { launch(node.as_ref(), &binary, &[], &log_file).await }
            })
            .await
    }

    /// Stop one service on every node concurrently. Nodes where the
    /// service is not running report success.
    pub async fn stop_service_everywhere(&self, kind: ServiceKind) -> NodeReport {
        debug!(service = %kind, "stopping service on every node");
        let binary = self.config.services.binary(kind).to_owned();
        self.fleet
            .broadcast(move |node| {
                let binary = binary.clone();
                async move { terminate(node.as_ref(), &binary).await }
            })
            .await
    }

    /// Wait for the service to be ready on every node concurrently.
    pub async fn wait_ready_everywhere(&self, kind: ServiceKind) -> NodeReport {
        let binary = self.config.services.binary(kind).to_owned();
        let interval = self.config.services.ready_interval();
        let timeout = self.config.services.ready_timeout();
        self.fleet
            .broadcast(move |node| {
                let binary = binary.clone();
                async move { await_process(&node, kind, binary, interval, timeout).await }
            })
            .await
    }

    /// Bring the whole cluster's services up in dependency order: masters
    /// first, then the supervisor on the control node, then the plugins.
    ///
    /// Any supervisor or plugin still running from an earlier run is
    /// stopped first so nothing observes the masters mid-restart. Every
    /// start and readiness wait is required.
    pub async fn start_cluster(&self) -> Result<(), HarnessError> {
        info!("starting cluster services in dependency order");
        self.stop_service_everywhere(ServiceKind::Supervisor)
            .await
            .advisory("supervisor pre-stop");
        self.stop_service_everywhere(ServiceKind::Plugin)
            .await
            .advisory("plugin pre-stop");

        self.start_service_everywhere(ServiceKind::Master)
            .await
            .into_result()?;
        self.wait_ready_everywhere(ServiceKind::Master)
            .await
            .into_result()?;

        let control = self.config.cluster.control_node.clone();
        self.start_service(ServiceKind::Supervisor, &control, &[])
            .await?;
        self.wait_service_ready(ServiceKind::Supervisor, &control)
            .await?;

        self.start_service_everywhere(ServiceKind::Plugin)
            .await
            .into_result()?;
        self.wait_ready_everywhere(ServiceKind::Plugin)
            .await
            .into_result()?;
        Ok(())
    }
}
