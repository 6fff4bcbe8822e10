/// `load_config` module: merges environment secrets, an optional YAML settings
/// file and command-line overrides into an [`AppConfig`].
///
/// # Responsibilities
/// - Read storage credentials and location from the environment, failing fast when any is missing
/// - Parse the optional YAML file holding non-secret deploy settings
/// - Apply CLI overrides on top (flags beat YAML, YAML beats defaults)
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
///
/// Accepted YAML keys: `source_dir`, `key_prefix`, `max_concurrency`, `upload_timeout_secs`.
use anyhow::{Context, Result};
use profile_deploy_core::config::{DeployConfig, StorageConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// Non-secret settings as written in the YAML file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source_dir: Option<PathBuf>,
    pub key_prefix: Option<String>,
    pub max_concurrency: Option<usize>,
    pub upload_timeout_secs: Option<u64>,
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub source_dir: Option<PathBuf>,
    pub key_prefix: Option<String>,
    pub max_concurrency: Option<usize>,
    pub upload_timeout_secs: Option<u64>,
}

#[derive(Debug)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub deploy: DeployConfig,
}

pub fn load_file_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str::<FileConfig>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Builds the full configuration for a deploy run.
///
/// Storage settings are read first so a missing credential stops the run
/// before the config file or the source directory is touched.
pub fn load_config(config_path: Option<&Path>, overrides: &Overrides) -> Result<AppConfig> {
    let storage = StorageConfig::from_env().context("Storage settings are incomplete")?;
    storage.trace_loaded();

    let file = match config_path {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };

    let deploy = merge(file, overrides);
    deploy.validate()?;
    deploy.trace_loaded();

    Ok(AppConfig { storage, deploy })
}

fn merge(file: FileConfig, overrides: &Overrides) -> DeployConfig {
    let mut deploy = DeployConfig::default();

    if let Some(dir) = overrides.source_dir.clone().or(file.source_dir) {
        deploy.source_dir = dir;
    }
    if let Some(prefix) = overrides.key_prefix.clone().or(file.key_prefix) {
        deploy.key_prefix = prefix;
    }
    if let Some(n) = overrides.max_concurrency.or(file.max_concurrency) {
        deploy.max_concurrency = n;
    }
    if let Some(secs) = overrides.upload_timeout_secs.or(file.upload_timeout_secs) {
        deploy.upload_timeout = Duration::from_secs(secs);
    }
    deploy
}
