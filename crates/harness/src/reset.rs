//! Cluster reset -- the ordered rebootstrap sequence and its sweeps.
//!
//! Rebootstrap tears everything down (containers, services, block-image
//! mappings), clears the coordination store, restarts the container
//! runtime, and brings the baseline fixture state back up. Teardown steps
//! are best-effort so a half-broken cluster can still be recovered; every
//! step that establishes the baseline is required and aborts the sequence
//! on failure.

use tracing::{debug, info, warn};

use volharness_core::error::HarnessError;
use volharness_core::types::ServiceKind;
use volharness_fleet::{NodeClient, NodeReport};

use crate::suite::Harness;

// Both loops iterate the kernel's mapped-device list; a filesystem can
// need a second umount before the kernel releases the mapping, so the
// unmount pass runs before the unmap pass.
const UNMOUNT_MAPPED: &str = "for dev in $(sudo rbd showmapped | tail -n +2 | awk '{ print $5 }'); \
     do sudo umount $dev; sudo umount -f $dev; done";
const UNMAP_MAPPED: &str = "for dev in $(sudo rbd showmapped | tail -n +2 | awk '{ print $5 }'); \
     do sudo umount $dev; sudo rbd unmap $dev; done";
const PURGE_IMAGES: &str =
    "for img in $(sudo rbd ls); do sudo rbd snap purge $img; sudo rbd rm $img; done";

impl<N: NodeClient> Harness<N> {
    /// Reset the cluster to the baseline fixture state.
    ///
    /// Teardown (containers, services, block images) is best-effort;
    /// everything from the coordination store clear onward is required.
    /// Steps run strictly in order, and a step whose precondition already
    /// holds is a no-op, so rebootstrapping an already-clean cluster
    /// succeeds.
    pub async fn rebootstrap(&self) -> Result<(), HarnessError> {
        info!("rebootstrapping cluster to the baseline fixture state");

        self.clear_containers().await.advisory("container sweep");
        self.stop_service_everywhere(ServiceKind::Supervisor)
            .await
            .advisory("supervisor stop");
        self.stop_service_everywhere(ServiceKind::Plugin)
            .await
            .advisory("plugin stop");
        self.stop_service_everywhere(ServiceKind::Master)
            .await
            .advisory("master stop");
        self.clear_block_images().await;

        self.clear_coordination_store().await?;
        self.restart_container_runtime()
            .await
            .advisory("container runtime restart");
        self.upload_global(&self.config.fixtures.global).await?;
        self.start_cluster().await?;
        self.upload_policy(
            &self.config.fixtures.policy_name,
            &self.config.fixtures.policy_file,
        )
        .await?;

        info!("rebootstrap complete");
        Ok(())
    }

    /// Force-remove every container on every node.
    pub async fn clear_containers(&self) -> NodeReport {
        debug!("removing all containers fleet-wide");
        self.fleet
            .broadcast(|node| async move {
                node.run("docker ps -aq | xargs -r docker rm -f")
                    .await
                    .map_err(HarnessError::from)
            })
            .await
    }

    /// Remove every runtime-level volume reference on every node.
    pub async fn clear_volumes(&self) -> NodeReport {
        debug!("removing all runtime volumes fleet-wide");
        self.fleet
            .broadcast(|node| async move {
                node.run("docker volume ls -q | xargs -r docker volume rm")
                    .await
                    .map_err(HarnessError::from)
            })
            .await
    }

    /// Release block-image mappings on every node, then delete every image
    /// in the pool from the control node. Entirely best-effort; failures
    /// are logged and swallowed.
    pub async fn clear_block_images(&self) {
        debug!("releasing block-image mappings fleet-wide");
        self.fleet
            .broadcast(|node| async move {
                node.run(UNMOUNT_MAPPED).await.map_err(HarnessError::from)
            })
            .await
            .advisory("block image unmount");
        self.fleet
            .broadcast(|node| async move { node.run(UNMAP_MAPPED).await.map_err(HarnessError::from) })
            .await
            .advisory("block image unmap");

        match self.control() {
            Ok(control) => {
                if let Err(err) = control.run_with_output(PURGE_IMAGES).await {
                    warn!(output = %err.output(), "block image purge failed");
                }
            }
            Err(err) => warn!(error = %err, "control node unavailable for block image purge"),
        }
    }

    /// Delete the plugin's keyspace from the coordination store. An
    /// already-empty keyspace counts as success.
    pub async fn clear_coordination_store(&self) -> Result<(), HarnessError> {
        info!("clearing coordination store");
        let command = format!(
            "sudo etcdctl rm --recursive /{}",
            self.config.services.driver
        );
        match self.control()?.run_with_output(&command).await {
            Ok(_) => Ok(()),
            Err(err) if err.output().contains("Key not found") => {
                debug!("coordination store already empty");
                Ok(())
            }
            Err(err) => Err(HarnessError::Setup {
                step: "coordination store clear".to_owned(),
                output: err.output(),
            }),
        }
    }

    /// Restart the container runtime on every node so it rediscovers the
    /// plugin socket.
    pub async fn restart_container_runtime(&self) -> NodeReport {
        info!("restarting container runtime fleet-wide");
        self.fleet
            .broadcast(|node| async move {
                node.run("sudo service docker restart")
                    .await
                    .map_err(HarnessError::from)
            })
            .await
    }

    /// Pre-pull a container image on every node. Required: a scenario that
    /// asked for the image needs it everywhere.
    pub async fn pull_image(&self, image: &str) -> Result<(), HarnessError> {
        info!(image, "pulling image fleet-wide");
        let command = format!("docker pull {image}");
        self.fleet
            .broadcast(move |node| {
                let command = command.clone();
                async move { node.run(&command).await.map_err(HarnessError::from) }
            })
            .await
            .into_result()
    }
}
