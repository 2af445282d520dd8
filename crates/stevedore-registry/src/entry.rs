use std::fmt;

use thiserror::Error;

/// Start level assigned to every pack discovered in the dropins directory.
pub const DEFAULT_START_LEVEL: u32 = 4;

/// Path prefix that marks a registry entry as sourced from the dropins
/// directory. Paths are stored relative to the registry's `configuration/`
/// directory so the registry resolves regardless of where the home lives.
pub const DROPINS_PATH_PREFIX: &str = "../dropins/";

/// Raised when a registry or snapshot line does not match the fixed
/// positional format.
#[derive(Debug, Error)]
#[error("malformed registry line: {line}")]
pub struct MalformedLine {
    pub line: String,
}

/// Identity of one package as persisted in the registry.
///
/// One line of the registry file:
/// `symbolicName,version,relativePath,startLevel,isFragment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageInfo {
    pub symbolic_name: String,
    pub version: String,
    pub path: String,
    pub start_level: u32,
    pub is_fragment: bool,
}

impl PackageInfo {
    pub fn new(
        symbolic_name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<String>,
        start_level: u32,
        is_fragment: bool,
    ) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            version: version.into(),
            path: path.into(),
            start_level,
            is_fragment,
        }
    }

    /// Whether this entry was registered out of the dropins directory, as
    /// opposed to a package managed through other means.
    pub fn from_dropins(&self) -> bool {
        self.path.starts_with(DROPINS_PATH_PREFIX)
    }

    /// True when `other` describes the same logical package: symbolic name,
    /// version and fragment-ness all match. Path is deliberately excluded.
    pub fn same_package(&self, other: &PackageInfo) -> bool {
        self.symbolic_name == other.symbolic_name
            && self.version == other.version
            && self.is_fragment == other.is_fragment
    }

    /// Parse one non-comment registry line.
    pub fn parse_line(line: &str) -> Result<Self, MalformedLine> {
        let malformed = || MalformedLine {
            line: line.to_string(),
        };
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 5 {
            return Err(malformed());
        }
        if fields[0].is_empty() || fields[1].is_empty() || fields[2].is_empty() {
            return Err(malformed());
        }
        let start_level: u32 = fields[3].parse().map_err(|_| malformed())?;
        let is_fragment = match fields[4] {
            "true" => true,
            "false" => false,
            _ => return Err(malformed()),
        };
        Ok(Self::new(
            fields[0],
            fields[1],
            fields[2],
            start_level,
            is_fragment,
        ))
    }
}

impl fmt::Display for PackageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.symbolic_name, self.version, self.path, self.start_level, self.is_fragment
        )
    }
}
