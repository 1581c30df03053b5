//! # Frame motion estimator

use crate::prelude::v1::*;

/// Dense motion estimator.
///
/// Estimators are expected to be deterministic, and produce a non-negative score, the higher the
/// more motion there is between the two frames.
pub trait MotionEstimator {
    /// Estimate average motion between two consecutive frames.
    ///
    /// # Arguments
    ///
    /// * `prev` - earlier of the two frames.
    /// * `curr` - later of the two frames. Must be the same size as `prev`.
    fn dense_flow_magnitude(&self, prev: &GrayFrame, curr: &GrayFrame) -> Result<f32>;
}

impl<T: MotionEstimator + ?Sized> MotionEstimator for &T {
    fn dense_flow_magnitude(&self, prev: &GrayFrame, curr: &GrayFrame) -> Result<f32> {
        (**self).dense_flow_magnitude(prev, curr)
    }
}
