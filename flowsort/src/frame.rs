//! # Frame sequences and frame sources

use crate::prelude::v1::*;
use nalgebra as na;
use std::path::{Path, PathBuf};

/// File extensions recognised as frames, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Grayscale pixel matrix.
///
/// Rows correspond to image rows (height) and columns to image columns (width). Intensities are
/// kept in the `0-255` range.
pub type GrayFrame = na::DMatrix<f32>;

/// Check whether the path points to a file with an image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|i| e.eq_ignore_ascii_case(i)))
        .unwrap_or(false)
}

/// Ordered frames of a single directory.
///
/// Frames are kept in lexicographic order, which is expected to match their temporal order.
/// There is always at least one frame and no duplicates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSequence {
    directory: PathBuf,
    frames: Vec<PathBuf>,
}

impl FrameSequence {
    /// Build a sequence out of arbitrary frame paths.
    ///
    /// # Arguments
    ///
    /// * `directory` - directory the frames belong to.
    /// * `frames` - frame paths, in any order.
    pub fn new(directory: impl Into<PathBuf>, mut frames: Vec<PathBuf>) -> Result<Self> {
        let directory = directory.into();

        frames.sort();
        frames.dedup();

        if frames.is_empty() {
            return Err(Error::EmptyDirectory(directory));
        }

        Ok(Self { directory, frames })
    }

    /// Scan a directory for image frames.
    ///
    /// Subdirectories are not descended into. Returned paths are absolute.
    pub fn scan(directory: &Path) -> Result<Self> {
        let directory = directory.canonicalize()?;

        let mut frames = vec![];

        for entry in std::fs::read_dir(&directory)? {
            let path = entry?.path();
            if path.is_file() && is_image_file(&path) {
                frames.push(path);
            }
        }

        Self::new(directory, frames)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    /// Number of frames in the sequence. Never zero.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of consecutive frame pairs.
    pub fn pair_count(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }
}

/// Source of frames for classification.
pub trait FrameSource {
    /// List the frames of a directory.
    ///
    /// Fails with [`Error::EmptyDirectory`] if no image frames are present.
    fn list_frames(&self, directory: &Path) -> Result<FrameSequence> {
        FrameSequence::scan(directory)
    }

    /// Load a frame as a grayscale matrix.
    ///
    /// Any error is treated as an absent frame by the caller.
    fn load_grayscale(&self, frame: &Path) -> Result<GrayFrame>;
}

impl<T: FrameSource + ?Sized> FrameSource for &T {
    fn list_frames(&self, directory: &Path) -> Result<FrameSequence> {
        (**self).list_frames(directory)
    }

    fn load_grayscale(&self, frame: &Path) -> Result<GrayFrame> {
        (**self).load_grayscale(frame)
    }
}
