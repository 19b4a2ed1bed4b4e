//! CLI argument parsing using clap derive API
//!
//! Purely declarative with no side effects or I/O; command execution
//! lives in `main.rs`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use volharness_core::types::{ServiceKind, VolumeId};

/// volharness -- system-test harness for a volume plugin cluster.
///
/// Use `volharness <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "volharness", version, about, long_about = None)]
pub struct Cli {
    /// Path to the volharness.toml configuration file.
    #[arg(short, long, default_value = "volharness.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reset the cluster to the baseline fixture state.
    Rebootstrap,

    /// Start every cluster service in dependency order.
    Up,

    /// Manage individual services.
    Service(ServiceArgs),

    /// Create, remove, and inspect volumes.
    Volume(VolumeArgs),

    /// Upload a policy document.
    Policy(PolicyArgs),

    /// Upload the global configuration document.
    Global(GlobalArgs),

    /// Pre-pull a container image on every node.
    Pull {
        /// Image reference to pull.
        image: String,
    },

    /// Force-remove every container on every node.
    ClearContainers,

    /// Remove every runtime-level volume reference on every node.
    ClearVolumes,

    /// Restart the container runtime on every node.
    RestartRuntime,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- service ----

#[derive(Args, Debug)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub action: ServiceAction,
}

#[derive(Subcommand, Debug)]
pub enum ServiceAction {
    /// Start a service on one node.
    Start {
        /// Service to start (master, supervisor, plugin).
        service: ServiceKind,
        /// Node to start it on.
        node: String,
        /// Extra arguments passed through to the service binary.
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Stop a service on one node. Stopping a stopped service succeeds.
    Stop {
        /// Service to stop.
        service: ServiceKind,
        /// Node to stop it on.
        node: String,
    },
    /// Block until a service's process exists on one node.
    Wait {
        /// Service to wait for.
        service: ServiceKind,
        /// Node to probe.
        node: String,
    },
}

// ---- volume ----

#[derive(Args, Debug)]
pub struct VolumeArgs {
    #[command(subcommand)]
    pub action: VolumeAction,
}

#[derive(Subcommand, Debug)]
pub enum VolumeAction {
    /// Create a volume and verify the plugin recorded it.
    Create {
        /// Volume in policy/name form.
        volume: VolumeId,
        /// Node to create it on (default: the control node).
        #[arg(long)]
        node: Option<String>,
        /// Driver options as key=value pairs, repeatable.
        #[arg(long = "opt")]
        opts: Vec<String>,
    },
    /// Remove a volume, optionally deleting its backing block image.
    Remove {
        /// Volume in policy/name form.
        volume: VolumeId,
        /// Node to remove it from (default: the control node).
        #[arg(long)]
        node: Option<String>,
        /// Also delete the backing image from the block store.
        #[arg(long)]
        purge_block_store: bool,
    },
    /// Show which host currently holds the volume's mount.
    Use {
        /// Volume in policy/name form.
        volume: VolumeId,
    },
    /// Replace a volume's runtime parameters from a fixture document.
    RuntimeUpload {
        /// Volume in policy/name form.
        volume: VolumeId,
        /// Fixture file (without the .json extension).
        #[arg(long)]
        fixture: String,
    },
}

// ---- intent ----

#[derive(Args, Debug)]
pub struct PolicyArgs {
    #[command(subcommand)]
    pub action: PolicyAction,
}

#[derive(Subcommand, Debug)]
pub enum PolicyAction {
    /// Upload a policy document from the fixture directory.
    Upload {
        /// Name to upload the policy under.
        name: String,
        /// Fixture file (without the .json extension); defaults to the
        /// configured baseline policy fixture.
        #[arg(long)]
        fixture: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub action: GlobalAction,
}

#[derive(Subcommand, Debug)]
pub enum GlobalAction {
    /// Upload the global configuration from the fixture directory.
    Upload {
        /// Fixture file (without the .json extension); defaults to the
        /// configured global fixture.
        #[arg(long)]
        fixture: Option<String>,
    },
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report problems.
    Validate,
    /// Print the effective configuration.
    Show,
}

/// Parse repeated `key=value` driver options.
pub fn parse_opts(opts: &[String]) -> Result<BTreeMap<String, String>, String> {
    let mut parsed = BTreeMap::new();
    for opt in opts {
        let (key, value) = opt
            .split_once('=')
            .ok_or_else(|| format!("invalid option '{opt}', expected key=value"))?;
        if key.is_empty() {
            return Err(format!("invalid option '{opt}', empty key"));
        }
        parsed.insert(key.to_owned(), value.to_owned());
    }
    Ok(parsed)
}
