//! Intent uploads -- policy and global configuration documents.
//!
//! Fixture documents live as JSON files on the harness host. Each upload
//! reads the file locally, validates it as JSON, and pipes the compacted
//! document into the management CLI on the control node. Validating before
//! dispatch turns a broken fixture into a local error instead of a
//! confusing remote one.

use std::path::Path;

use tracing::info;

use volharness_core::error::HarnessError;
use volharness_core::types::VolumeId;
use volharness_fleet::NodeClient;

use crate::suite::{Harness, sh_quote};

impl<N: NodeClient> Harness<N> {
    /// Upload a policy document under `name`, from the configured fixture
    /// directory. Returns the CLI's output.
    pub async fn upload_policy(&self, name: &str, fixture: &str) -> Result<String, HarnessError> {
        let document = self.read_fixture(fixture).await?;
        info!(policy = name, fixture, "uploading policy document");
        let command = format!(
            "printf '%s' {} | {} policy upload {name}",
            sh_quote(&document),
            self.config.services.cli_binary
        );
        self.control()?
            .run_with_output(&command)
            .await
            .map_err(|err| HarnessError::Setup {
                step: format!("policy upload {name}"),
                output: err.output(),
            })
    }

    /// Upload the cluster-wide global configuration document.
    pub async fn upload_global(&self, fixture: &str) -> Result<(), HarnessError> {
        let document = self.read_fixture(fixture).await?;
        info!(fixture, "uploading global configuration");
        let command = format!(
            "printf '%s' {} | {} global upload",
            sh_quote(&document),
            self.config.services.cli_binary
        );
        self.control()?
            .run_with_output(&command)
            .await
            .map_err(|err| HarnessError::Setup {
                step: "global upload".to_owned(),
                output: err.output(),
            })?;
        Ok(())
    }

    /// Replace one volume's runtime parameters (throughput limits and the
    /// like) with a fixture document, without recreating the volume.
    pub async fn upload_runtime(
        &self,
        volume: &VolumeId,
        fixture: &str,
    ) -> Result<(), HarnessError> {
        let document = self.read_fixture(fixture).await?;
        info!(volume = %volume, fixture, "uploading runtime parameters");
        let command = format!(
            "printf '%s' {} | {} volume runtime upload {volume}",
            sh_quote(&document),
            self.config.services.cli_binary
        );
        self.control()?
            .run_with_output(&command)
            .await
            .map_err(|err| HarnessError::Setup {
                step: format!("runtime upload {volume}"),
                output: err.output(),
            })?;
        Ok(())
    }

    /// Read `<fixture>.json` from the fixture directory and return it as a
    /// compact JSON document.
    async fn read_fixture(&self, fixture: &str) -> Result<String, HarnessError> {
        let path = self.config.fixtures.dir.join(format!("{fixture}.json"));
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| fixture_error(&path, err.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|err| fixture_error(&path, err.to_string()))?;
        Ok(value.to_string())
    }
}

fn fixture_error(path: &Path, reason: String) -> HarnessError {
    HarnessError::Fixture {
        path: path.display().to_string(),
        reason,
    }
}
