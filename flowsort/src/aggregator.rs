//! # Directory motion aggregation

use crate::prelude::v1::*;
use log::*;
use std::path::{Path, PathBuf};

/// Classification label of a directory or a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    Moving,
    Still,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Moving => write!(f, "moving"),
            Self::Still => write!(f, "still"),
        }
    }
}

/// Motion summary of a single directory.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectoryMotionSummary {
    pub directory: PathBuf,
    /// Number of frames in the directory.
    pub frame_count: usize,
    /// Number of frame pairs that were successfully scored.
    pub valid_pairs: usize,
    /// Mean motion across the valid pairs, `0.0` if there were none.
    pub mean: f64,
    /// The pair with the most motion. Ties keep the earliest pair.
    pub max_pair: Option<PairScore>,
    pub label: Label,
}

/// Running state over the scored pairs of a directory.
#[derive(Default)]
struct MotionTracker {
    sum: f64,
    count: usize,
    max_pair: Option<PairScore>,
}

impl MotionTracker {
    fn push(&mut self, pair: PairScore) {
        self.sum += f64::from(pair.sample.value());
        self.count += 1;

        if self
            .max_pair
            .map(|max| pair.sample > max.sample)
            .unwrap_or(true)
        {
            self.max_pair = Some(pair);
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Scores all consecutive frame pairs of a directory and classifies the directory as a whole.
pub struct DirectoryMotionAggregator<E> {
    scorer: MotionScorer<E>,
    motion_threshold: f32,
}

impl<E: MotionEstimator> DirectoryMotionAggregator<E> {
    /// Create a new aggregator.
    ///
    /// # Arguments
    ///
    /// * `estimator` - motion estimator used to score frame pairs.
    /// * `motion_threshold` - mean motion above which a directory is considered moving.
    pub fn new(estimator: E, motion_threshold: f32) -> Self {
        Self {
            scorer: MotionScorer::new(estimator),
            motion_threshold,
        }
    }

    /// Summarize motion of a frame sequence.
    ///
    /// Every frame is decoded once. Pairs where either frame fails to load or score are left
    /// out of the mean entirely. Returns the summary along with the score of every valid pair,
    /// in frame order.
    ///
    /// # Arguments
    ///
    /// * `source` - source to load the frames from.
    /// * `frames` - frames of the directory.
    pub fn summarize(
        &self,
        source: &impl FrameSource,
        frames: &FrameSequence,
    ) -> (DirectoryMotionSummary, Vec<PairScore>) {
        let paths = frames.frames();

        let mut tracker = MotionTracker::default();
        let mut pairs = Vec::with_capacity(frames.pair_count());

        let mut prev = load_frame(source, &paths[0]);

        for (index, path) in paths.iter().enumerate().skip(1) {
            let curr = load_frame(source, path);

            match self.scorer.score(prev.as_ref(), curr.as_ref()) {
                Ok(sample) => {
                    let pair = PairScore { index, sample };
                    tracker.push(pair);
                    pairs.push(pair);
                }
                Err(e) => debug!(
                    "Skipping pair {} -> {}: {}",
                    paths[index - 1].display(),
                    path.display(),
                    e
                ),
            }

            prev = curr;
        }

        let mean = tracker.mean();

        let label = if mean > f64::from(self.motion_threshold) {
            Label::Moving
        } else {
            Label::Still
        };

        let summary = DirectoryMotionSummary {
            directory: frames.directory().to_path_buf(),
            frame_count: frames.len(),
            valid_pairs: tracker.count,
            mean,
            max_pair: tracker.max_pair,
            label,
        };

        debug!(
            "{}: {} frames, {} valid pairs, mean motion {:.4} ({})",
            summary.directory.display(),
            summary.frame_count,
            summary.valid_pairs,
            summary.mean,
            summary.label
        );

        (summary, pairs)
    }
}

fn load_frame(source: &impl FrameSource, path: &Path) -> Option<GrayFrame> {
    source
        .load_grayscale(path)
        .map_err(|e| debug!("Unable to load {}: {}", path.display(), e))
        .ok()
}
