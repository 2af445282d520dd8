use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::entry::{MalformedLine, PackageInfo};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read package registry: {0}")]
    Read(#[from] std::io::Error),
    #[error(transparent)]
    Malformed(#[from] MalformedLine),
}

/// In-memory view of the registry file: entries grouped by symbolic name,
/// sorted outer iteration, insertion order kept within a name.
#[derive(Debug, Default)]
pub struct RegistryIndex {
    entries: BTreeMap<String, Vec<PackageInfo>>,
}

impl RegistryIndex {
    /// Read the registry file into an index, dropping dropins-sourced
    /// entries whose backing pack no longer appears in `fresh`.
    ///
    /// An absent file is an empty registry. Comment lines (`#`) are
    /// skipped; any other line that fails to parse aborts the run.
    pub fn load(path: &Path, fresh: &[PackageInfo]) -> Result<Self, RegistryError> {
        let mut index = Self::default();
        if !path.exists() {
            return Ok(index);
        }
        let contents = fs::read_to_string(path)?;
        for line in contents.lines() {
            if line.starts_with('#') {
                continue;
            }
            let entry = PackageInfo::parse_line(line)?;
            if entry.from_dropins() && !fresh.iter().any(|info| info.same_package(&entry)) {
                // Backing pack is gone from the dropins directory.
                log::debug!("removing stale registry entry: {entry}");
                continue;
            }
            index.push(entry);
        }
        Ok(index)
    }

    fn push(&mut self, entry: PackageInfo) {
        self.entries
            .entry(entry.symbolic_name.clone())
            .or_default()
            .push(entry);
    }

    /// Fold freshly scanned packs into the index.
    ///
    /// Symbolic name + version + fragment-ness is the de-duplication key;
    /// the path only decides between "already present" and a conflict, and
    /// on conflict the first-registered path wins.
    pub fn merge(&mut self, fresh: Vec<PackageInfo>) {
        for incoming in fresh {
            let Some(existing) = self.entries.get_mut(&incoming.symbolic_name) else {
                log::info!(
                    "registering pack: {}_{}",
                    incoming.symbolic_name,
                    incoming.version
                );
                self.push(incoming);
                continue;
            };
            let mut found = false;
            for entry in existing.iter() {
                if entry.version != incoming.version {
                    continue;
                }
                if entry.is_fragment != incoming.is_fragment {
                    // Same name and version but fragment-ness disagrees;
                    // the incoming pack is dropped either way.
                    log::warn!(
                        "ignoring pack {incoming}: already registered at {} \
                         with identical symbolic name and version",
                        entry.path
                    );
                } else if entry.path == incoming.path {
                    log::debug!("pack already registered: {}", incoming.path);
                } else {
                    log::warn!(
                        "ignoring pack {incoming}: already registered at {} \
                         with identical symbolic name and version",
                        entry.path
                    );
                }
                found = true;
                break;
            }
            if !found {
                log::info!(
                    "registering pack: {}_{}",
                    incoming.symbolic_name,
                    incoming.version
                );
                existing.push(incoming);
            }
        }
    }

    /// Serialized registry lines, symbolic names ascending, merge order
    /// within a name.
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .values()
            .flat_map(|group| group.iter().map(ToString::to_string))
            .collect()
    }

    /// Total number of entries across all symbolic names.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
