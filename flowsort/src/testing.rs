//! Test doubles for the frame source and motion estimator.

use crate::prelude::v1::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Frame source serving single pixel frames, looked up by file name.
///
/// Files that have no entry, or an entry of `None`, fail to load.
#[derive(Default)]
pub struct ScriptedSource {
    values: HashMap<String, Option<f32>>,
}

impl ScriptedSource {
    pub fn set(&mut self, name: &str, value: Option<f32>) {
        self.values.insert(name.to_string(), value);
    }
}

impl FrameSource for ScriptedSource {
    fn load_grayscale(&self, frame: &Path) -> Result<GrayFrame> {
        let name = frame
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.values.get(&name) {
            Some(Some(v)) => Ok(GrayFrame::from_element(1, 1, *v)),
            _ => Err(Error::InvalidFrame(name)),
        }
    }
}

/// Estimator returning the absolute intensity difference of the top-left pixels.
pub struct DiffEstimator;

impl MotionEstimator for DiffEstimator {
    fn dense_flow_magnitude(&self, prev: &GrayFrame, curr: &GrayFrame) -> Result<f32> {
        Ok((curr[(0, 0)] - prev[(0, 0)]).abs())
    }
}

pub fn frame_name(i: usize) -> String {
    format!("{i:04}.jpg")
}

/// Intensities of consecutive frames such that consecutive pairs score `scores`.
pub fn intensities(scores: &[f32]) -> Vec<f32> {
    std::iter::once(0.0)
        .chain(scores.iter().scan(0.0, |acc, s| {
            *acc += s;
            Some(*acc)
        }))
        .collect()
}

/// Build an in-memory sequence whose consecutive pairs score `scores`.
pub fn scripted_sequence(dir: &str, scores: &[f32]) -> (FrameSequence, ScriptedSource) {
    let mut source = ScriptedSource::default();
    let mut frames = vec![];

    for (i, v) in intensities(scores).into_iter().enumerate() {
        let name = frame_name(i);
        source.set(&name, Some(v));
        frames.push(PathBuf::from(dir).join(name));
    }

    (FrameSequence::new(dir, frames).unwrap(), source)
}

/// Create a directory chain under `parent` whose deepest directories can not be listed, because
/// their paths exceed the platform path length limit. Returns one such directory.
///
/// Each call to create a directory stays below the limit, the chain is stitched together with a
/// rename afterwards.
#[cfg(target_os = "linux")]
pub fn unlistable_directory(parent: &Path) -> PathBuf {
    let name = "d".repeat(200);

    let mut upper = parent.to_path_buf();
    let mut lower = parent.with_file_name("staging");
    let staging = lower.clone();

    for _ in 0..12 {
        upper.push(&name);
        lower.push(&name);
    }

    std::fs::create_dir_all(&upper).unwrap();
    std::fs::create_dir_all(&lower).unwrap();

    let target = upper.join("staging");
    std::fs::rename(&staging, &target).unwrap();

    lower
        .strip_prefix(&staging)
        .map(|rest| target.join(rest))
        .unwrap()
}
