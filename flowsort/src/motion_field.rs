//! # Dense motion field

use nalgebra::*;

/// Fixed size optical flow motion field.
///
/// Holds one motion vector per pixel (or per cell, if the field was computed on a downsampled
/// image).
#[derive(Clone, Debug)]
pub struct MotionField {
    vf: Matrix2xX<f32>,
    width: usize,
}

impl MotionField {
    /// Create a new, motionless field.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the field.
    /// * `height` - height of the field.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            vf: Matrix2xX::repeat(width * height, 0f32),
            width,
        }
    }

    /// Create a field from horizontal and vertical flow components.
    ///
    /// Both matrices are indexed as `(row, column)` and must have equal shapes.
    ///
    /// # Arguments
    ///
    /// * `u` - horizontal motion component.
    /// * `v` - vertical motion component.
    /// * `scale` - factor to multiply every vector by.
    pub fn from_components(u: &DMatrix<f32>, v: &DMatrix<f32>, scale: f32) -> Self {
        assert_eq!(u.shape(), v.shape());

        let (height, width) = u.shape();
        let mut mf = Self::new(width, height);

        for y in 0..height {
            for x in 0..width {
                mf.set_motion(x, y, Vector2::new(u[(y, x)], v[(y, x)]) * scale);
            }
        }

        mf
    }

    /// Get width and height of the motion field.
    pub fn dim(&self) -> (usize, usize) {
        if self.width == 0 {
            (0, 0)
        } else {
            (self.width, self.vf.ncols() / self.width)
        }
    }

    /// Get size of the motion field.
    ///
    /// This is the same as `width * height`
    pub fn size(&self) -> usize {
        self.vf.ncols()
    }

    /// Set motion at given position.
    ///
    /// # Arguments
    ///
    /// * `x` - horizontal coordinate to set at.
    /// * `y` - vertical coordinate to set at.
    /// * `motion` - motion to set.
    pub fn set_motion(&mut self, x: usize, y: usize, motion: Vector2<f32>) {
        self.vf.set_column(self.width * y + x, &motion);
    }

    /// Get motion at coordinates.
    ///
    /// # Arguments
    ///
    /// * `x` - horizontal coordinate.
    /// * `y` - vertical coordinate.
    pub fn get_motion(&self, x: usize, y: usize) -> Vector2<f32> {
        self.vf.column(self.width * y + x).into()
    }

    /// Iterate every element of the motion field.
    ///
    /// The resulting iterator yields `(x, y, motion)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Vector2<f32>)> + '_ {
        let (width, height) = self.dim();
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y, self.get_motion(x, y))))
    }

    /// Iterate magnitudes of every motion vector.
    pub fn magnitudes(&self) -> impl Iterator<Item = f32> + '_ {
        self.vf.column_iter().map(|c| c.magnitude())
    }

    /// Average motion magnitude across the field.
    ///
    /// Returns `0.0` for an empty field.
    pub fn mean_magnitude(&self) -> f32 {
        match self.size() {
            0 => 0.0,
            size => (self.magnitudes().map(f64::from).sum::<f64>() / size as f64) as f32,
        }
    }
}
