//! Format versions stamped on level manifests and frame reports.
//!
//! Versions travel as `"major.minor"` strings, so a manifest reads
//! `version: "1.0"` in RON and a report carries `"version": "1.0"` in JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `major.minor` format version.
///
/// A reader accepts data with its own major number and a minor number no
/// newer than its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    /// Bumped when old readers can no longer load the data
    pub major: u16,
    /// Bumped for additions old data can live without
    pub minor: u16,
}

impl SchemaVersion {
    /// Level manifests this build reads and writes.
    pub const LEVEL_MANIFEST: Self = Self::new(1, 0);

    /// Frame reports this build emits.
    pub const FRAME_REPORT: Self = Self::new(1, 0);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// True if a reader at `self` can load data stamped `data`.
    #[must_use]
    pub const fn reads(&self, data: &Self) -> bool {
        self.major == data.major && data.minor <= self.minor
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A version string that is not `major.minor`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid format version {0:?}, expected \"major.minor\"")]
pub struct VersionParseError(pub String);

impl FromStr for SchemaVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionParseError(s.to_string());
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self::new(
            major.parse().map_err(|_| invalid())?,
            minor.parse().map_err(|_| invalid())?,
        ))
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.to_string()
    }
}
