//! CLI argument parsing and configuration file discovery/loading.

use std::fs;
use std::path::{Path, PathBuf};

use argh::FromArgs;
use models::Configuration;
use snafu::ResultExt;
use validator::Validate;

use crate::error::{self, Result};

/// Search order used when `-config` is not given.
const DEFAULT_CONFIG_SEARCH_PATHS: &[&str] = &[
    "./config.yaml",
    "/etc/descheduler/config.yaml",
    "./configs/config.yaml",
];

/// A cluster rebalancing controller: periodically evicts workloads that violate
/// rebalancing policies so the platform's scheduler can re-place them more evenly.
#[derive(FromArgs, Debug)]
pub struct Cli {
    /// path to the YAML configuration file. If unset, searches the default locations.
    #[argh(option)]
    pub config: Option<String>,

    /// path to an external kubeconfig file. If unset, prefers in-cluster credentials,
    /// falling back to $HOME/.kube/config.
    #[argh(option)]
    pub kubeconfig: Option<String>,

    /// log verbosity, 0 (errors only) through 5 (trace). If unset, falls back to the
    /// configuration file's `logLevel`.
    #[argh(option)]
    pub log_level: Option<u8>,

    /// print the version and exit.
    #[argh(switch)]
    pub version: bool,
}

/// Finds the configuration file to load: the `-config` flag if given, else the first
/// of [`DEFAULT_CONFIG_SEARCH_PATHS`] that exists.
pub fn resolve_config_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }

    DEFAULT_CONFIG_SEARCH_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
        .ok_or(error::Error::ConfigNotFound)
}

/// Loads, defaults, and validates the configuration at `path`.
pub fn load_config(path: &Path) -> Result<Configuration> {
    let path_str = path.display().to_string();

    let contents = fs::read_to_string(path).context(error::ReadConfigSnafu {
        path: path_str.clone(),
    })?;

    let config: Configuration = serde_yaml::from_str(&contents).context(error::ParseConfigSnafu {
        path: path_str.clone(),
    })?;

    config
        .validate()
        .context(error::ValidateConfigSnafu)?;

    // Reject an interval below 1 minute unless it is exactly zero (one-shot mode), and
    // make sure the duration actually parses.
    let duration = config
        .interval_duration()
        .context(error::InvalidIntervalSnafu {
            interval: config.interval.clone(),
        })?;

    if !duration.is_zero() && duration < std::time::Duration::from_secs(60) {
        return error::IntervalTooShortSnafu {
            interval: config.interval.clone(),
        }
        .fail();
    }

    Ok(config)
}

/// Resolves the `kube::Client`, honoring `-kubeconfig` ahead of in-cluster/default
/// discovery (`kube::Client::try_default` already implements the in-cluster then
/// `$HOME/.kube/config` fallback).
pub async fn resolve_kube_client(kubeconfig: Option<&str>) -> Result<kube::Client> {
    let client = match kubeconfig {
        Some(path) => {
            let kubeconfig =
                kube::config::Kubeconfig::read_from(path).context(error::ReadKubeconfigSnafu {
                    path: path.to_string(),
                })?;
            let config = kube::Config::from_custom_kubeconfig(
                kubeconfig,
                &kube::config::KubeConfigOptions::default(),
            )
            .await
            .context(error::LoadKubeconfigSnafu {
                path: path.to_string(),
            })?;
            kube::Client::try_from(config).context(error::ClientCreateSnafu)?
        }
        None => kube::Client::try_default()
            .await
            .context(error::ClientCreateSnafu)?,
    };

    Ok(client)
}
