//! # Run configuration

use crate::prelude::v1::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix appended to a folder's name to form its output directory.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_optical_flow";

fn default_output_suffix() -> String {
    DEFAULT_OUTPUT_SUFFIX.into()
}

/// Batch run configuration.
///
/// Usually loaded from a YAML file:
///
/// ```yaml
/// input_path: /data/cameras
/// motion_threshold: 1.5
/// classify_by: folder
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory containing one folder per camera or source.
    pub input_path: PathBuf,
    /// Motion above which a directory or pair is considered moving.
    pub motion_threshold: f32,
    #[serde(default)]
    pub classify_by: ClassifyBy,
    /// Restrict processing to these top-level folders. All folders are processed if absent.
    #[serde(default)]
    pub folders: Option<Vec<String>>,
    /// Process directories of a folder on a thread pool.
    #[serde(default)]
    pub parallel: bool,
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

impl Config {
    pub fn new(input_path: impl Into<PathBuf>, motion_threshold: f32) -> Self {
        Self {
            input_path: input_path.into(),
            motion_threshold,
            classify_by: Default::default(),
            folders: None,
            parallel: false,
            output_suffix: default_output_suffix(),
        }
    }

    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.motion_threshold.is_finite() || self.motion_threshold < 0.0 {
            return Err(Error::Config(format!(
                "motion_threshold must be a non-negative number, got {}",
                self.motion_threshold
            )));
        }

        if self.input_path.as_os_str().is_empty() {
            return Err(Error::Config("input_path must not be empty".into()));
        }

        if self.output_suffix.is_empty() {
            return Err(Error::Config("output_suffix must not be empty".into()));
        }

        Ok(())
    }

    /// Check whether a top-level folder is selected for processing.
    pub fn includes_folder(&self, name: &str) -> bool {
        match &self.folders {
            Some(folders) if !folders.is_empty() => folders.iter().any(|f| f == name),
            _ => true,
        }
    }

    /// Output directory of a top-level folder.
    pub fn save_dir(&self, folder: &Path) -> PathBuf {
        let mut name = folder.as_os_str().to_os_string();
        name.push(&self.output_suffix);
        PathBuf::from(name)
    }
}
