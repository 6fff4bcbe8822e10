//! Top-level pipeline: list the source directory and publish every entry.
//!
//! # Responsibilities
//! - Fan out one publish per listed file, at most `max_concurrency` at a time
//! - Bound every upload with the configured timeout
//! - Collect a per-file [`DeployReport`]; a failed upload never cancels its siblings
//! - Treat the batch as failed if any file failed ([`DeployError::BatchFailed`]),
//!   even though the other files stay published
//!
//! # Error Handling
//! Listing errors abort before any upload. Per-file errors are logged where they
//! happen and recorded in the report.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::DeployConfig;
use crate::contract::ObjectStore;
use crate::error::DeployError;
use crate::listing::list_entries;
use crate::publisher::Publisher;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Published { url: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub filename: String,
    pub key: String,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_published(&self) -> bool {
        matches!(self.outcome, FileOutcome::Published { .. })
    }
}

/// Outcome of every file of one run, sorted by filename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub files: Vec<FileReport>,
}

impl DeployReport {
    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn published(&self) -> usize {
        self.files.iter().filter(|f| f.is_published()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.published()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.is_published())
    }
}

/// Publishes every entry of `config.source_dir` under `config.key_prefix`.
///
/// An empty directory is a successful run with an empty report.
pub async fn deploy<S>(
    config: &DeployConfig,
    publisher: &Publisher<S>,
) -> Result<DeployReport, DeployError>
where
    S: ObjectStore,
{
    config.validate()?;

    let run_id = Uuid::new_v4();
    let span = info_span!("deploy", %run_id, source_dir = %config.source_dir.display());
    run(config, publisher).instrument(span).await
}

async fn run<S>(
    config: &DeployConfig,
    publisher: &Publisher<S>,
) -> Result<DeployReport, DeployError>
where
    S: ObjectStore,
{
    let filenames = list_entries(&config.source_dir).await?;

    if filenames.is_empty() {
        info!(dir = %config.source_dir.display(), "No files found in source directory");
        return Ok(DeployReport::default());
    }

    info!(count = filenames.len(), "Found file(s) to upload");

    let timeout = config.upload_timeout;
    let mut files: Vec<FileReport> = stream::iter(filenames)
        .map(move |filename| {
            let key = config.destination_key(&filename);
            let local_path = config.source_dir.join(&filename);
            async move {
                let published =
                    tokio::time::timeout(timeout, publisher.publish(&local_path, &key, &filename))
                        .await
                        .unwrap_or_else(|_| {
                            error!(key = %key, ?timeout, "Upload timed out");
                            Err(DeployError::Timeout {
                                key: key.clone(),
                                after: timeout,
                            })
                        });

                let outcome = match published {
                    Ok(p) => FileOutcome::Published { url: p.url },
                    Err(e) => FileOutcome::Failed {
                        error: e.to_string(),
                    },
                };
                FileReport {
                    filename,
                    key,
                    outcome,
                }
            }
        })
        .buffer_unordered(config.max_concurrency)
        .collect()
        .await;
    files.sort_by(|a, b| a.filename.cmp(&b.filename));

    let report = DeployReport { files };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => debug!(json = %json, "Deploy report"),
        Err(e) => error!(error = ?e, "Failed to serialize deploy report"),
    }

    let failed = report.failed();
    if failed > 0 {
        let total = report.total();
        for f in report.failures() {
            error!(file = %f.filename, key = %f.key, "Not published");
        }
        error!(failed, total, "Deployment failed");
        return Err(DeployError::BatchFailed {
            failed,
            total,
            report: Box::new(report),
        });
    }

    info!(count = report.total(), "Successfully uploaded file(s)");
    Ok(report)
}
