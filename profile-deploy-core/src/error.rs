use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::deploy::DeployReport;

/// Boxed error returned by storage backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DeployError {
    /// A required setting is missing or invalid. Raised before any upload.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The source directory, a profile file or the temp file could not be accessed.
    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The object store rejected the put or the request never completed.
    #[error("upload of {key} failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("upload of {key} timed out after {after:?}")]
    Timeout { key: String, after: Duration },

    /// At least one file of the batch was not published.
    #[error("deployment failed: {failed} of {total} file(s) were not published")]
    BatchFailed {
        failed: usize,
        total: usize,
        report: Box<DeployReport>,
    },
}

impl DeployError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeployError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Per-file report of a failed batch, if this error carries one.
    pub fn report(&self) -> Option<&DeployReport> {
        match self {
            DeployError::BatchFailed { report, .. } => Some(&**report),
            _ => None,
        }
    }
}
