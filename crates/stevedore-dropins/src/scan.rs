use std::io;
use std::path::Path;
use std::thread;

use stevedore_registry::PackageInfo;

use crate::manifest::read_descriptor;

/// Scan the direct children of the dropins directory, one worker thread per
/// candidate, and collect every successfully parsed pack descriptor.
///
/// Per-child failures are logged and excluded. Only a failure to list the
/// directory itself is returned as an error. The order of the result is
/// unspecified.
pub fn scan_dropins(dir: &Path) -> io::Result<Vec<PackageInfo>> {
    let mut children = Vec::new();
    for entry in dir.read_dir()? {
        children.push(entry?.path());
    }

    let mut packs = Vec::new();
    thread::scope(|scope| {
        let handles: Vec<_> = children
            .iter()
            .map(|child| scope.spawn(move || read_descriptor(child)))
            .collect();
        for (child, handle) in children.iter().zip(handles) {
            match handle.join() {
                Ok(Ok(Some(info))) => packs.push(info),
                Ok(Ok(None)) => {}
                Ok(Err(err)) => {
                    tracing::warn!(%err, path = %child.display(), "failed to read pack");
                }
                Err(_) => {
                    tracing::warn!(path = %child.display(), "pack reader panicked");
                }
            }
        }
    });
    Ok(packs)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn write_pack(path: &Path, manifest: &serde_json::Value) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("manifest.json", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(manifest.to_string().as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn listing_failure_is_fatal() {
        let dir = tempdir().unwrap();
        assert!(scan_dropins(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn bad_packs_and_foreign_files_are_excluded() {
        let dir = tempdir().unwrap();
        write_pack(
            &dir.path().join("good-1.0.pack"),
            &serde_json::json!({ "symbolic_name": "good", "version": "1.0" }),
        );
        std::fs::write(dir.path().join("broken.pack"), b"not a zip").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();

        let packs = scan_dropins(dir.path()).unwrap();
        assert_eq!(packs.len(), 1);
        assert_eq!(packs[0].symbolic_name, "good");
        assert_eq!(packs[0].path, "../dropins/good-1.0.pack");
    }

    #[test]
    fn empty_directory_scans_to_nothing() {
        let dir = tempdir().unwrap();
        assert!(scan_dropins(dir.path()).unwrap().is_empty());
    }
}
