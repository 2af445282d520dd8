use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::entry::PackageInfo;

/// Decide whether a full reconciliation pass is needed by comparing the
/// fresh scan against the snapshot left behind by the previous run.
///
/// Absent snapshot: reconcile and write one. Different number of packs, or
/// any pack whose serialized line is not in the old snapshot verbatim:
/// reconcile and overwrite. Identical set: skip, snapshot untouched.
///
/// Comparison is on the full canonical line, so a version bump, a path
/// move or a fragment-flag change all count as a difference.
pub fn reconcile_needed(snapshot_path: &Path, fresh: &[PackageInfo]) -> io::Result<bool> {
    let lines: Vec<String> = fresh.iter().map(ToString::to_string).collect();
    if snapshot_path.exists() {
        let contents = fs::read_to_string(snapshot_path)?;
        // Cardinality compares the file's line count, not a deduplicated
        // set size.
        if contents.lines().count() == lines.len() {
            let previous: HashSet<&str> = contents.lines().collect();
            if lines.iter().all(|line| previous.contains(line.as_str())) {
                return Ok(false);
            }
        }
    }
    write_snapshot(snapshot_path, &lines)?;
    Ok(true)
}

fn write_snapshot(path: &Path, lines: &[String]) -> io::Result<()> {
    let mut contents = lines.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    fs::write(path, contents)
}
