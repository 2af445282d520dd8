use std::path::PathBuf;

use anyhow::{Context, Result};

use stevedore_registry::{reconcile_needed, replace_registry, RegistryIndex};

use crate::scan::scan_dropins;

/// Locations one reconciliation run works against. Resolved by the host
/// once at construction; the pipeline itself reads no ambient state.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Directory of candidate pack containers, scanned non-recursively.
    pub dropins_dir: PathBuf,
    /// The registry file the runtime reads at startup.
    pub registry_file: PathBuf,
    /// Snapshot of the previous scan, used only to gate reconciliation.
    pub snapshot_file: PathBuf,
    /// Writable scratch directory for staging the registry rewrite.
    pub scratch_dir: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing to do: no dropins directory, or nothing changed since the
    /// previous run.
    Skipped,
    /// The registry was rewritten with this many entries.
    Reconciled { entries: usize },
}

/// Runs the reconciliation pipeline: scan, change gate, prune, merge,
/// atomic rewrite.
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }

    /// Perform one reconciliation pass. Invoked once when the host runtime
    /// signals that it is starting.
    ///
    /// Fatal conditions leave the previously persisted registry untouched.
    pub fn run(&self) -> Result<ReconcileOutcome> {
        let config = &self.config;
        if !config.dropins_dir.is_dir() {
            tracing::debug!(path = %config.dropins_dir.display(), "no dropins directory, skipping");
            return Ok(ReconcileOutcome::Skipped);
        }

        let fresh = scan_dropins(&config.dropins_dir).with_context(|| {
            format!(
                "failed to list dropins directory {}",
                config.dropins_dir.display()
            )
        })?;
        tracing::debug!(packs = fresh.len(), "scanned dropins directory");

        if !reconcile_needed(&config.snapshot_file, &fresh)
            .context("failed to update the dropins snapshot")?
        {
            tracing::info!("dropins unchanged, skipping registry processing");
            return Ok(ReconcileOutcome::Skipped);
        }

        let mut index = RegistryIndex::load(&config.registry_file, &fresh).with_context(|| {
            format!(
                "failed to read package registry {}",
                config.registry_file.display()
            )
        })?;
        index.merge(fresh);
        replace_registry(&index, &config.registry_file, &config.scratch_dir)
            .context("failed to rewrite package registry")?;

        let entries = index.len();
        tracing::info!(entries, "package registry rewritten");
        Ok(ReconcileOutcome::Reconciled { entries })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_dropins_directory_skips_the_run() {
        let dir = tempdir().unwrap();
        let reconciler = Reconciler::new(ReconcileConfig {
            dropins_dir: dir.path().join("dropins"),
            registry_file: dir.path().join("packages.info"),
            snapshot_file: dir.path().join("previous.info"),
            scratch_dir: dir.path().to_path_buf(),
        });
        assert_eq!(reconciler.run().unwrap(), ReconcileOutcome::Skipped);
        // The gate never ran, so no snapshot appears either.
        assert!(!dir.path().join("previous.info").exists());
    }
}
