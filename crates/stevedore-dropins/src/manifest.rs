use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use stevedore_registry::{PackageInfo, DEFAULT_START_LEVEL, DROPINS_PATH_PREFIX};

/// File extension identifying a pack container.
pub const PACK_EXTENSION: &str = "pack";

/// Name of the manifest entry at the root of a pack container.
const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum PackError {
    #[error("package has no manifest: {0}")]
    MissingManifest(PathBuf),
    #[error("unreadable package container: {0}")]
    Container(#[from] ZipError),
    #[error("invalid package manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identity headers of a pack manifest. The manifest may carry arbitrary
/// additional keys; only these are read.
#[derive(Debug, Deserialize)]
struct PackManifest {
    symbolic_name: Option<String>,
    version: Option<String>,
    fragment_host: Option<String>,
}

/// Extract a [`PackageInfo`] from a single candidate file.
///
/// Files without the pack extension are not applicable and yield
/// `Ok(None)`. A container that cannot be opened, has no manifest entry or
/// carries an unparsable manifest is an error; a manifest that merely lacks
/// the identity headers is logged and yields `Ok(None)` so one bad pack
/// never aborts a scan.
pub fn read_descriptor(path: &Path) -> Result<Option<PackageInfo>, PackError> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(PACK_EXTENSION) {
        return Ok(None);
    }
    let Some(file_name) = path.file_name() else {
        return Ok(None);
    };
    let file_name = file_name.to_string_lossy();

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry = match archive.by_name(MANIFEST_NAME) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(PackError::MissingManifest(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    let mut raw = String::new();
    entry.read_to_string(&mut raw)?;
    let manifest: PackManifest = serde_json::from_str(&raw)?;

    let (Some(symbolic_name), Some(version)) = (manifest.symbolic_name, manifest.version) else {
        tracing::warn!(path = %path.display(), "required pack manifest headers are missing");
        return Ok(None);
    };
    // The symbolic name may carry parameters, e.g.
    // `com.example.acme;singleton:=true`. Only the identifier prefix counts.
    let symbolic_name = match symbolic_name.split_once(';') {
        Some((prefix, _)) => prefix.to_string(),
        None => symbolic_name,
    };
    if symbolic_name.is_empty() || version.is_empty() {
        tracing::warn!(path = %path.display(), "required pack manifest headers are empty");
        return Ok(None);
    }
    let is_fragment = manifest.fragment_host.is_some();

    Ok(Some(PackageInfo::new(
        symbolic_name,
        version,
        format!("{DROPINS_PATH_PREFIX}{file_name}"),
        DEFAULT_START_LEVEL,
        is_fragment,
    )))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn write_pack(path: &Path, manifest: &serde_json::Value) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file(MANIFEST_NAME, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer
            .write_all(manifest.to_string().as_bytes())
            .unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn other_extensions_are_not_applicable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("readme.txt");
        std::fs::write(&path, "not a pack").unwrap();
        assert!(read_descriptor(&path).unwrap().is_none());
    }

    #[test]
    fn valid_pack_yields_descriptor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme-1.2.0.pack");
        write_pack(
            &path,
            &serde_json::json!({ "symbolic_name": "com.example.acme", "version": "1.2.0" }),
        );
        let info = read_descriptor(&path).unwrap().unwrap();
        assert_eq!(
            info,
            PackageInfo::new(
                "com.example.acme",
                "1.2.0",
                "../dropins/acme-1.2.0.pack",
                DEFAULT_START_LEVEL,
                false,
            )
        );
    }

    #[test]
    fn symbolic_name_parameters_are_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme.pack");
        write_pack(
            &path,
            &serde_json::json!({
                "symbolic_name": "com.example.acme;singleton:=true",
                "version": "1.0",
            }),
        );
        let info = read_descriptor(&path).unwrap().unwrap();
        assert_eq!(info.symbolic_name, "com.example.acme");
    }

    #[test]
    fn fragment_host_marks_a_fragment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frag.pack");
        write_pack(
            &path,
            &serde_json::json!({
                "symbolic_name": "com.example.frag",
                "version": "1.0",
                "fragment_host": "com.example.acme",
            }),
        );
        assert!(read_descriptor(&path).unwrap().unwrap().is_fragment);
    }

    #[test]
    fn missing_identity_headers_are_skipped_with_a_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anon.pack");
        write_pack(&path, &serde_json::json!({ "version": "1.0" }));
        assert!(read_descriptor(&path).unwrap().is_none());

        let path = dir.path().join("empty.pack");
        write_pack(
            &path,
            &serde_json::json!({ "symbolic_name": "", "version": "1.0" }),
        );
        assert!(read_descriptor(&path).unwrap().is_none());
    }

    #[test]
    fn parameter_only_symbolic_name_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weird-1.0.pack");
        // Stripping the parameters leaves no identifier; the pack must not
        // enter the pipeline, or the written registry line would fail to
        // parse on the next run.
        write_pack(
            &path,
            &serde_json::json!({
                "symbolic_name": ";singleton:=true",
                "version": "1.0",
            }),
        );
        assert!(read_descriptor(&path).unwrap().is_none());
    }

    #[test]
    fn container_without_manifest_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bare.pack");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("payload.bin", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"payload").unwrap();
        writer.finish().unwrap();
        assert!(matches!(
            read_descriptor(&path),
            Err(PackError::MissingManifest(_))
        ));
    }

    #[test]
    fn garbage_container_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.pack");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();
        assert!(matches!(
            read_descriptor(&path),
            Err(PackError::Container(_))
        ));
    }
}
