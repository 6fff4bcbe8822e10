use std::path::Path;
use tracing::{debug, error};

use crate::error::DeployError;

/// Lists the entry names of `dir`, sorted by name.
///
/// Entries are not filtered: anything inside the directory is treated as a
/// profile file. Non UTF-8 names are converted lossily.
pub async fn list_entries(dir: &Path) -> Result<Vec<String>, DeployError> {
    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(|e| {
        error!(dir = %dir.display(), error = %e, "Failed to read source directory");
        DeployError::filesystem(dir, e)
    })?;

    let mut names = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| DeployError::filesystem(dir, e))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    debug!(dir = %dir.display(), count = names.len(), "Listed source directory");
    Ok(names)
}
