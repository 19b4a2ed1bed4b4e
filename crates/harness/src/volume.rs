//! Volume operations -- create, purge, and usage queries.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use volharness_core::error::HarnessError;
use volharness_core::types::{UseRecord, VolumeId};
use volharness_fleet::NodeClient;

use crate::suite::Harness;

impl<N: NodeClient> Harness<N> {
    /// Create a volume through the container runtime on `node` and verify
    /// it through the plugin's own query path.
    ///
    /// `options` are passed through verbatim as `--opt key=value` pairs;
    /// the harness does not interpret them.
    pub async fn create_volume(
        &self,
        node: &str,
        volume: &VolumeId,
        options: &BTreeMap<String, String>,
    ) -> Result<(), HarnessError> {
        info!(volume = %volume, node, "creating volume");
        let mut command = format!(
            "docker volume create -d {} --name {volume}",
            self.config.services.driver
        );
        for (key, value) in options {
            command.push_str(&format!(" --opt {key}={value}"));
        }
        let target = self.fleet.get(node)?;
        if let Err(err) = target.run_with_output(&command).await {
            return Err(HarnessError::VolumeCreate {
                volume: volume.to_string(),
                output: err.output(),
            });
        }

        // the runtime accepting the create is not proof the plugin
        // recorded it
        if let Err(err) = self.volcli(&format!("volume get {volume}")).await {
            return Err(HarnessError::VolumeCreate {
                volume: volume.to_string(),
                output: err.remote_output(),
            });
        }
        Ok(())
    }

    /// Remove a volume: drop the runtime's reference, remove the plugin's
    /// record, and optionally delete the backing block image.
    ///
    /// The runtime-level removal is best-effort -- the reference may
    /// already be gone. The plugin-side removal is required. When
    /// `purge_block_store` is set, the backing image is removed from the
    /// control node even if the plugin-side removal failed, so a stale
    /// image never survives a purge; an image removal failure is logged,
    /// never fatal.
    pub async fn purge_volume(
        &self,
        node: &str,
        volume: &VolumeId,
        purge_block_store: bool,
    ) -> Result<(), HarnessError> {
        info!(volume = %volume, node, purge_block_store, "purging volume");
        let target = self.fleet.get(node)?;
        if let Err(err) = target.run(&format!("docker volume rm {volume}")).await {
            debug!(volume = %volume, error = %err, "runtime volume reference already absent");
        }

        let removed = self
            .volcli(&format!("volume remove {volume}"))
            .await
            .map(|_| ());

        if purge_block_store {
            let image = volume.image();
            match self.control() {
                Ok(control) => {
                    if let Err(err) = control.run(&format!("sudo rbd rm rbd/{image}")).await {
                        warn!(image = %image, error = %err, "block image removal failed");
                    }
                }
                Err(err) => warn!(error = %err, "control node unavailable for block image removal"),
            }
        }
        removed
    }

    /// Query which host currently holds the volume's mount.
    pub async fn volume_use(&self, volume: &VolumeId) -> Result<UseRecord, HarnessError> {
        let context = format!("use get {volume}");
        let output = self.volcli(&context).await?;
        serde_json::from_str(&output).map_err(|err| HarnessError::Malformed {
            context,
            reason: err.to_string(),
        })
    }
}
