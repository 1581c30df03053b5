//! # Error types

use std::path::PathBuf;

/// Errors produced while classifying frames.
///
/// Only [`Error::Config`] and filesystem failures at the top of a run are fatal. The rest are
/// contained to a single frame pair, directory, or top-level folder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A frame could not be decoded, or a frame pair could not be scored.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    /// A directory holds no image frames.
    #[error("no frames found in {}", .0.display())]
    EmptyDirectory(PathBuf),
    /// The output directory is absent and could not be created.
    #[error("unable to create output directory {}: {source}", path.display())]
    MissingOutputPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
