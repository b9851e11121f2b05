use crate::error::{AasmapError, Result};
use crate::import::source::{ColumnMarkers, DEFAULT_MARKER_PATTERN};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.json";
pub const PROJECT_CONFIG_DIR: &str = ".aasmap";
const DEFAULT_FIRST_DATA_ROW: usize = 2;

/// Import settings, stored in .aasmap/config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportConfig {
    /// Regex recognizing import markers; group 1 captures the column letters
    #[serde(default = "default_marker_pattern")]
    pub marker_pattern: String,

    /// First row holding data (row 1 is usually the header)
    #[serde(default = "default_first_data_row")]
    pub first_data_row: usize,

    /// Sheet to import from when none is given
    #[serde(default)]
    pub default_sheet: Option<String>,

    /// Report failing rows as warnings instead of aborting the import
    #[serde(default)]
    pub skip_failed_rows: bool,
}

fn default_marker_pattern() -> String {
    DEFAULT_MARKER_PATTERN.to_string()
}

fn default_first_data_row() -> usize {
    DEFAULT_FIRST_DATA_ROW
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            marker_pattern: default_marker_pattern(),
            first_data_row: DEFAULT_FIRST_DATA_ROW,
            default_sheet: None,
            skip_failed_rows: false,
        }
    }
}

impl ImportConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: ImportConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_data_row == 0 {
            return Err(AasmapError::Config(
                "first_data_row is 1-based and cannot be 0".to_string(),
            ));
        }
        if !self.markers()?.has_column_group() {
            return Err(AasmapError::Config(format!(
                "marker_pattern '{}' needs a group capturing the column letters",
                self.marker_pattern
            )));
        }
        Ok(())
    }

    pub fn markers(&self) -> Result<ColumnMarkers> {
        Ok(ColumnMarkers::with_pattern(&self.marker_pattern)?)
    }
}

/// Pick the config directory: an explicit one, else `.aasmap` in `cwd` if it
/// exists, else the per-user config directory.
pub fn config_dir(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    let project = cwd.join(PROJECT_CONFIG_DIR);
    if project.is_dir() {
        return Ok(project);
    }
    ProjectDirs::from("org", "aasmap", "aasmap")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| AasmapError::Config("Could not determine config dir".to_string()))
}
