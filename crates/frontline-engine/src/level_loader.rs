//! Campaign file loading.
//!
//! A campaign is read either from a single RON file or from a directory of
//! RON files whose levels are appended in file-name order. Every level is
//! validated before the simulation sees it.

use std::fs;
use std::path::{Path, PathBuf};

use frontline_common::{LevelError, SchemaVersion};
use frontline_sim::{Campaign, LevelManifest};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File extension of campaign files.
pub const LEVEL_EXTENSION: &str = "ron";

/// Errors that can occur during level loading.
#[derive(Debug, Error)]
pub enum LevelLoadError {
    /// File not found.
    #[error("Level file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read file.
    #[error("Failed to read level file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse RON.
    #[error("Failed to parse level RON: {0}")]
    ParseError(#[from] ron::error::SpannedError),

    /// Geometry or spawn manifest rejected.
    #[error("Level validation error: {0}")]
    ValidationError(#[from] LevelError),

    /// Written for an incompatible schema.
    #[error("Level schema {actual} is not compatible with {expected}")]
    VersionMismatch {
        /// Supported version
        expected: SchemaVersion,
        /// Version in the file
        actual: SchemaVersion,
    },
}

/// Result type for level loading operations.
pub type LevelLoadResult<T> = Result<T, LevelLoadError>;

/// Loads and validates campaigns from disk.
#[derive(Debug, Clone)]
pub struct LevelLoader {
    path: PathBuf,
    ground_level: f32,
}

impl LevelLoader {
    /// Creates a loader for `path`, validating geometry against `ground_level`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>, ground_level: f32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ground_level,
        }
    }

    /// Loads the campaign at the configured path.
    pub fn load(&self) -> LevelLoadResult<Campaign> {
        let path = &self.path;
        if !path.exists() {
            return Err(LevelLoadError::NotFound(path.clone()));
        }
        let campaign = if path.is_dir() {
            self.load_dir(path)?
        } else {
            Self::load_file(path)?
        };
        campaign.validate(self.ground_level)?;
        info!("Loaded {} levels from {}", campaign.len(), path.display());
        Ok(campaign)
    }

    /// Parses one campaign file without validating geometry.
    pub fn load_file(path: &Path) -> LevelLoadResult<Campaign> {
        let content = fs::read_to_string(path)?;
        let campaign: Campaign = ron::from_str(&content)?;
        if !SchemaVersion::LEVEL_MANIFEST.reads(&campaign.version) {
            return Err(LevelLoadError::VersionMismatch {
                expected: SchemaVersion::LEVEL_MANIFEST,
                actual: campaign.version,
            });
        }
        Ok(campaign)
    }

    fn load_dir(&self, dir: &Path) -> LevelLoadResult<Campaign> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == LEVEL_EXTENSION))
            .collect();
        files.sort();

        let mut levels: Vec<LevelManifest> = Vec::new();
        for file in &files {
            match Self::load_file(file) {
                Ok(campaign) => {
                    debug!("Loaded {} levels from {:?}", campaign.len(), file);
                    levels.extend(campaign.levels);
                },
                Err(e) => {
                    warn!("Failed to load level file {:?}: {}", file, e);
                },
            }
        }
        if levels.is_empty() {
            return Err(LevelError::EmptyCampaign.into());
        }
        debug!(ground = self.ground_level, files = files.len(), "Merged campaign directory");
        Ok(Campaign {
            version: SchemaVersion::LEVEL_MANIFEST,
            levels,
        })
    }
}
