//! Publishing of a single profile file: read, rewrite the first line, stage
//! in a temp file, upload.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::config::StorageTarget;
use crate::contract::{ObjectHeaders, ObjectStore, PutObjectOutput, PutObjectRequest};
use crate::error::DeployError;
use crate::header::{managed_config_header, public_url, rewrite_first_line};

/// A successfully published profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Published {
    pub key: String,
    pub url: String,
}

/// Publishes profile files into one bucket through an injected [`ObjectStore`].
pub struct Publisher<S: ObjectStore> {
    store: Arc<S>,
    target: StorageTarget,
}

impl<S: ObjectStore> Publisher<S> {
    pub fn new(store: Arc<S>, target: StorageTarget) -> Self {
        Self { store, target }
    }

    /// Publishes `local_path` under `key`.
    ///
    /// The first line of the file is replaced by a managed-config header that
    /// points at the object's own public URL. The staged temp file is removed
    /// whether or not the upload succeeds.
    pub async fn publish(
        &self,
        local_path: &Path,
        key: &str,
        filename: &str,
    ) -> Result<Published, DeployError> {
        let url = public_url(&self.target, key);

        match self.upload_rewritten(local_path, key, filename, &url).await {
            Ok(output) => {
                info!(key = %key, url = %url, etag = ?output.etag, "Uploaded");
                Ok(Published {
                    key: key.to_string(),
                    url,
                })
            }
            Err(e) => {
                error!(key = %key, file = %local_path.display(), error = %e, "Failed to upload");
                Err(e)
            }
        }
    }

    async fn upload_rewritten(
        &self,
        local_path: &Path,
        key: &str,
        filename: &str,
        url: &str,
    ) -> Result<PutObjectOutput, DeployError> {
        let content = tokio::fs::read_to_string(local_path)
            .await
            .map_err(|e| DeployError::filesystem(local_path, e))?;
        let rewritten = rewrite_first_line(&content, &managed_config_header(url));

        // Deleted when `staged` drops, after the put has completed or failed.
        let staged = stage(filename, &rewritten)?;
        debug!(key = %key, temp = %staged.path().display(), "Staged rewritten profile");

        let req = PutObjectRequest {
            key: key.to_string(),
            body: staged.path().to_path_buf(),
            headers: ObjectHeaders::for_profile(filename),
        };
        self.store
            .put_object(req)
            .await
            .map_err(|source| DeployError::Upload {
                key: key.to_string(),
                source,
            })
    }
}

fn stage(filename: &str, content: &str) -> Result<NamedTempFile, DeployError> {
    let suffix = format!("-{filename}");
    let mut file = tempfile::Builder::new()
        .prefix("temp-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|e| DeployError::filesystem(std::env::temp_dir(), e))?;

    let path = file.path().to_path_buf();
    file.write_all(content.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| DeployError::filesystem(path, e))?;
    Ok(file)
}
