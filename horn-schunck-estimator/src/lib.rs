//! # Implementation of the Horn-Schunck dense optical flow method.
//!
//! The estimator computes a flow vector for every pixel by minimising the brightness constancy
//! error together with a global smoothness term, and reduces the field to its mean magnitude.
//!
//! Large frames are box-downsampled before estimation, and the resulting flow is scaled back to
//! the original pixel units.

use flowsort::prelude::v1::*;
use log::*;
use nalgebra as na;

/// Dense optical flow estimator by Horn and Schunck.
///
/// Berthold K.P. Horn, Brian G. Schunck, "Determining Optical Flow", Artificial Intelligence 17
/// (1981).
#[derive(Clone, Copy, Debug)]
pub struct HornSchunckEstimator {
    /// Weight of the smoothness term, in intensity units (0-255).
    alpha: f32,
    /// Number of Jacobi iterations.
    iterations: usize,
    /// Frames with a larger side are downsampled until they fit.
    max_dimension: usize,
}

impl Default for HornSchunckEstimator {
    fn default() -> Self {
        Self {
            alpha: 10.0,
            iterations: 64,
            max_dimension: 320,
        }
    }
}

impl HornSchunckEstimator {
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: usize) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    /// Compute dense flow between two frames.
    ///
    /// The field has the dimensions of the (possibly downsampled) frames, with motion expressed
    /// in pixels of the original frames.
    ///
    /// # Arguments
    ///
    /// * `prev` - earlier frame.
    /// * `curr` - later frame, same size as `prev`.
    pub fn flow_field(&self, prev: &GrayFrame, curr: &GrayFrame) -> Result<MotionField> {
        if prev.shape() != curr.shape() {
            return Err(Error::InvalidFrame(format!(
                "frame size mismatch: {:?} vs {:?}",
                prev.shape(),
                curr.shape()
            )));
        }

        let factor = downsample_factor(prev.shape(), self.max_dimension);

        let (prev, curr) = if factor > 1 {
            (downsample(prev, factor), downsample(curr, factor))
        } else {
            (prev.clone(), curr.clone())
        };

        let (height, width) = prev.shape();

        let et = &curr - &prev;

        // Nothing changed, thus no motion.
        if et.iter().all(|v| *v == 0.0) {
            return Ok(MotionField::new(width, height));
        }

        let avg = (&prev + &curr) * 0.5;
        let (ex, ey) = gradients(&avg);

        let alpha2 = self.alpha * self.alpha;
        let denom = ex.zip_map(&ey, |x, y| alpha2 + x * x + y * y);

        let mut u = na::DMatrix::<f32>::zeros(height, width);
        let mut v = na::DMatrix::<f32>::zeros(height, width);

        for _ in 0..self.iterations {
            let u_avg = neighbor_average(&u);
            let v_avg = neighbor_average(&v);

            for col in 0..width {
                for row in 0..height {
                    let idx = (row, col);
                    let (gx, gy) = (ex[idx], ey[idx]);
                    let t = (gx * u_avg[idx] + gy * v_avg[idx] + et[idx]) / denom[idx];
                    u[idx] = u_avg[idx] - gx * t;
                    v[idx] = v_avg[idx] - gy * t;
                }
            }
        }

        trace!(
            "Horn-Schunck flow over {}x{} (downsampled by {})",
            width,
            height,
            factor
        );

        Ok(MotionField::from_components(&u, &v, factor as f32))
    }
}

impl MotionEstimator for HornSchunckEstimator {
    fn dense_flow_magnitude(&self, prev: &GrayFrame, curr: &GrayFrame) -> Result<f32> {
        Ok(self.flow_field(prev, curr)?.mean_magnitude())
    }
}

/// Smallest integer factor that brings the larger side to at most `max_dimension`.
fn downsample_factor((height, width): (usize, usize), max_dimension: usize) -> usize {
    let max_dimension = max_dimension.max(1);
    let side = height.max(width);
    ((side + max_dimension - 1) / max_dimension).max(1)
}

/// Box-average `factor x factor` blocks. Partial blocks at the edges are averaged too.
fn downsample(frame: &GrayFrame, factor: usize) -> GrayFrame {
    let (height, width) = frame.shape();
    let out_h = (height + factor - 1) / factor;
    let out_w = (width + factor - 1) / factor;

    GrayFrame::from_fn(out_h, out_w, |row, col| {
        let rows = row * factor..((row + 1) * factor).min(height);
        let cols = col * factor..((col + 1) * factor).min(width);
        let block = frame.slice((rows.start, cols.start), (rows.len(), cols.len()));
        block.sum() / block.len() as f32
    })
}

/// Central difference gradients along columns (x) and rows (y), replicating borders.
fn gradients(frame: &GrayFrame) -> (GrayFrame, GrayFrame) {
    let (height, width) = frame.shape();

    let ex = GrayFrame::from_fn(height, width, |row, col| {
        let next = (col + 1).min(width - 1);
        let prev = col.saturating_sub(1);
        (frame[(row, next)] - frame[(row, prev)]) * 0.5
    });

    let ey = GrayFrame::from_fn(height, width, |row, col| {
        let next = (row + 1).min(height - 1);
        let prev = row.saturating_sub(1);
        (frame[(next, col)] - frame[(prev, col)]) * 0.5
    });

    (ex, ey)
}

/// Average of the 4 direct neighbors, replicating borders.
fn neighbor_average(field: &GrayFrame) -> GrayFrame {
    let (height, width) = field.shape();

    GrayFrame::from_fn(height, width, |row, col| {
        let up = row.saturating_sub(1);
        let down = (row + 1).min(height - 1);
        let left = col.saturating_sub(1);
        let right = (col + 1).min(width - 1);

        (field[(up, col)] + field[(down, col)] + field[(row, left)] + field[(row, right)]) * 0.25
    })
}
