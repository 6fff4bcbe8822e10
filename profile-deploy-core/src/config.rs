use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::DeployError;

pub const ENV_REGION: &str = "OSS_REGION";
pub const ENV_BUCKET: &str = "OSS_BUCKET";
pub const ENV_ACCESS_KEY_ID: &str = "OSS_ACCESS_KEY_ID";
pub const ENV_ACCESS_KEY_SECRET: &str = "OSS_ACCESS_KEY_SECRET";
pub const ENV_ENDPOINT: &str = "OSS_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "aliyuncs.com";
pub const DEFAULT_SOURCE_DIR: &str = "profiles";
pub const DEFAULT_KEY_PREFIX: &str = "profiles";
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Where published objects live: `https://<bucket>.<region>.<endpoint>/<key>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageTarget {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
}

impl StorageTarget {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Service endpoint the storage client talks to, e.g. `https://oss-cn-hangzhou.aliyuncs.com`.
    pub fn service_url(&self) -> String {
        format!("https://{}.{}", self.region, self.endpoint)
    }
}

/// Storage target plus the credentials used to sign requests.
#[derive(Clone)]
pub struct StorageConfig {
    pub target: StorageTarget,
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("target", &self.target)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

impl StorageConfig {
    /// Reads the storage settings from the process environment.
    pub fn from_env() -> Result<Self, DeployError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the settings from an arbitrary variable lookup.
    ///
    /// Every required variable must be present and non-blank, otherwise a
    /// [`DeployError::Configuration`] naming all missing variables is returned.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DeployError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let region = read(ENV_REGION);
        let bucket = read(ENV_BUCKET);
        let access_key_id = read(ENV_ACCESS_KEY_ID);
        let access_key_secret = read(ENV_ACCESS_KEY_SECRET);

        let missing: Vec<&str> = [
            (ENV_REGION, region.is_none()),
            (ENV_BUCKET, bucket.is_none()),
            (ENV_ACCESS_KEY_ID, access_key_id.is_none()),
            (ENV_ACCESS_KEY_SECRET, access_key_secret.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (region, bucket, access_key_id, access_key_secret) {
            (Some(region), Some(bucket), Some(access_key_id), Some(access_key_secret)) => {
                let mut target = StorageTarget::new(bucket, region);
                if let Some(endpoint) = read(ENV_ENDPOINT) {
                    target = target.with_endpoint(endpoint);
                }
                Ok(Self {
                    target,
                    access_key_id,
                    access_key_secret,
                })
            }
            _ => Err(DeployError::Configuration(format!(
                "missing required environment variable(s): {}",
                missing.join(", ")
            ))),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            bucket = %self.target.bucket,
            region = %self.target.region,
            endpoint = %self.target.endpoint,
            "Loaded storage config"
        );
    }
}

/// What to publish and how hard to push the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub source_dir: PathBuf,
    pub key_prefix: String,
    pub max_concurrency: usize,
    pub upload_timeout: Duration,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_DIR)
    }
}

impl DeployConfig {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Object key for a profile file: `<prefix>/<filename>`.
    pub fn destination_key(&self, filename: &str) -> String {
        let prefix = self.key_prefix.trim_matches('/');
        if prefix.is_empty() {
            filename.to_string()
        } else {
            format!("{prefix}/{filename}")
        }
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        if self.max_concurrency == 0 {
            return Err(DeployError::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.upload_timeout.is_zero() {
            return Err(DeployError::Configuration(
                "upload timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            source_dir = %self.source_dir.display(),
            key_prefix = %self.key_prefix,
            max_concurrency = self.max_concurrency,
            upload_timeout_secs = self.upload_timeout.as_secs(),
            "Loaded deploy config"
        );
        debug!(?self, "Deploy config loaded (full debug)");
    }
}
