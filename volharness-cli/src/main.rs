//! volharness binary -- drives the cluster test harness from the shell.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use volharness::{Harness, NodeClient, OpenSshNode};
use volharness_core::config::HarnessConfig;
use volharness_core::error::{ConfigError, HarnessError};

use crate::cli::{
    Cli, Commands, ConfigAction, GlobalAction, PolicyAction, ServiceAction, VolumeAction,
    parse_opts,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli).await?;
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    logging::init_tracing(&config.log)?;

    run(cli, config).await
}

/// Load the configuration file; a missing file falls back to defaults
/// plus environment overrides so the harness works out of the box
/// against the default cluster.
async fn load_config(cli: &Cli) -> Result<HarnessConfig> {
    match HarnessConfig::load(&cli.config).await {
        Ok(config) => Ok(config),
        Err(HarnessError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = HarnessConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        Err(err) => Err(err).with_context(|| format!("loading {}", cli.config.display())),
    }
}

async fn run(cli: Cli, config: HarnessConfig) -> Result<()> {
    // config commands never touch the cluster
    if let Commands::Config(args) = &cli.command {
        match args.action {
            ConfigAction::Validate => {
                config.validate()?;
                println!("configuration OK");
            }
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        return Ok(());
    }

    let harness = Harness::connect(config);

    match cli.command {
        Commands::Rebootstrap => {
            harness.rebootstrap().await?;
            info!("cluster rebootstrapped");
        }
        Commands::Up => {
            harness.start_cluster().await?;
            info!("cluster services up");
        }
        Commands::Service(args) => run_service(&harness, args.action).await?,
        Commands::Volume(args) => run_volume(&harness, args.action).await?,
        Commands::Policy(args) => {
            let PolicyAction::Upload { name, fixture } = args.action;
            let fixture =
                fixture.unwrap_or_else(|| harness.config().fixtures.policy_file.clone());
            let output = harness.upload_policy(&name, &fixture).await?;
            if !output.trim().is_empty() {
                println!("{}", output.trim_end());
            }
        }
        Commands::Global(args) => {
            let GlobalAction::Upload { fixture } = args.action;
            let fixture = fixture.unwrap_or_else(|| harness.config().fixtures.global.clone());
            harness.upload_global(&fixture).await?;
        }
        Commands::Pull { image } => harness.pull_image(&image).await?,
        Commands::ClearContainers => harness.clear_containers().await.into_result()?,
        Commands::ClearVolumes => harness.clear_volumes().await.into_result()?,
        Commands::RestartRuntime => harness.restart_container_runtime().await.into_result()?,
        Commands::Config(_) => unreachable!("handled above"),
    }
    Ok(())
}

async fn run_service<N: NodeClient>(
    harness: &Harness<N>,
    action: ServiceAction,
) -> Result<(), HarnessError> {
    match action {
        ServiceAction::Start { service, node, args } => {
            harness.start_service(service, &node, &args).await
        }
        ServiceAction::Stop { service, node } => harness.stop_service(service, &node).await,
        ServiceAction::Wait { service, node } => harness.wait_service_ready(service, &node).await,
    }
}

async fn run_volume(harness: &Harness<OpenSshNode>, action: VolumeAction) -> Result<()> {
    let control = harness.config().cluster.control_node.clone();
    match action {
        VolumeAction::Create { volume, node, opts } => {
            let options = parse_opts(&opts).map_err(|reason| anyhow::anyhow!(reason))?;
            let node = node.unwrap_or(control);
            harness.create_volume(&node, &volume, &options).await?;
            info!(volume = %volume, "volume created");
        }
        VolumeAction::Remove {
            volume,
            node,
            purge_block_store,
        } => {
            let node = node.unwrap_or(control);
            harness.purge_volume(&node, &volume, purge_block_store).await?;
            info!(volume = %volume, "volume removed");
        }
        VolumeAction::Use { volume } => {
            let record = harness.volume_use(&volume).await?;
            println!("{}", serde_json::to_string(&record)?);
        }
        VolumeAction::RuntimeUpload { volume, fixture } => {
            harness.upload_runtime(&volume, &fixture).await?;
            info!(volume = %volume, "runtime parameters uploaded");
        }
    }
    Ok(())
}
