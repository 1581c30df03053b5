//! # Frame pair motion scoring

use crate::prelude::v1::*;

/// Average motion between two consecutive frames.
///
/// Always finite and non-negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct MotionSample(f32);

impl MotionSample {
    /// Wrap a raw score, rejecting negative and non-finite values.
    pub fn new(value: f32) -> Option<Self> {
        if value.is_finite() && value >= 0.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// Score of a single frame pair.
///
/// `index` refers to the later frame of the pair, thus the pair consists of frames
/// `index - 1` and `index`. It is always at least 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairScore {
    pub index: usize,
    pub sample: MotionSample,
}

impl PairScore {
    /// Indices of the two frames forming the pair.
    pub fn frames(&self) -> (usize, usize) {
        (self.index - 1, self.index)
    }
}

/// Produces one motion sample per frame pair using a motion estimator.
pub struct MotionScorer<E> {
    estimator: E,
}

impl<E: MotionEstimator> MotionScorer<E> {
    pub fn new(estimator: E) -> Self {
        Self { estimator }
    }

    /// Score motion between two frames.
    ///
    /// Fails with [`Error::InvalidFrame`] if either frame is absent, the frames differ in size,
    /// or the estimator does not produce a valid score. Such pairs should be skipped, not
    /// treated as motionless.
    ///
    /// # Arguments
    ///
    /// * `prev` - earlier frame, `None` if it could not be loaded.
    /// * `curr` - later frame, `None` if it could not be loaded.
    pub fn score(&self, prev: Option<&GrayFrame>, curr: Option<&GrayFrame>) -> Result<MotionSample> {
        let (prev, curr) = match (prev, curr) {
            (Some(prev), Some(curr)) => (prev, curr),
            (None, _) => return Err(Error::InvalidFrame("previous frame is absent".into())),
            (_, None) => return Err(Error::InvalidFrame("current frame is absent".into())),
        };

        if prev.shape() != curr.shape() {
            return Err(Error::InvalidFrame(format!(
                "frame size mismatch: {:?} vs {:?}",
                prev.shape(),
                curr.shape()
            )));
        }

        if prev.is_empty() {
            return Err(Error::InvalidFrame("frame has no pixels".into()));
        }

        let value = self.estimator.dense_flow_magnitude(prev, curr)?;

        MotionSample::new(value)
            .ok_or_else(|| Error::InvalidFrame(format!("estimator produced invalid score {value}")))
    }
}
