use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::index::RegistryIndex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("scratch directory is not available: {0}")]
    ScratchDir(PathBuf),
    #[error("failed to write package registry: {0}")]
    Io(#[from] std::io::Error),
}

/// Replace the registry file at `dest` with the serialized index.
///
/// The new content is written into a uniquely named subdirectory of
/// `scratch_dir` first and then installed over the destination in a single
/// copy-with-overwrite, so a crash mid-write never leaves a truncated
/// registry. If the destination does not exist yet, nothing is installed:
/// first-time creation is the caller's job.
pub fn replace_registry(
    index: &RegistryIndex,
    dest: &Path,
    scratch_dir: &Path,
) -> Result<(), StoreError> {
    if !scratch_dir.is_dir() {
        return Err(StoreError::ScratchDir(scratch_dir.to_path_buf()));
    }
    let staging = tempfile::Builder::new()
        .prefix("packages-info-")
        .tempdir_in(scratch_dir)?;
    let staged = staging.path().join("packages.info");

    let mut contents = index.lines().join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    fs::write(&staged, contents)?;

    if dest.exists() {
        fs::copy(&staged, dest)?;
    } else {
        log::debug!("registry {} does not exist, not installing", dest.display());
    }
    Ok(())
}
