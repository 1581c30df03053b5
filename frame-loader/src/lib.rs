//! Common `FrameSource` backed by image files.

use flowsort::prelude::v1::*;
use image::GrayImage;
use log::*;
use std::path::Path;

/// Frame source decoding frames from image files on disk.
///
/// Colour images are converted to 8-bit luma.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFrameSource;

impl FrameSource for ImageFrameSource {
    fn load_grayscale(&self, frame: &Path) -> Result<GrayFrame> {
        let image = image::open(frame)
            .map_err(|e| Error::InvalidFrame(format!("{}: {}", frame.display(), e)))?;

        let gray = image.into_luma8();

        trace!(
            "Loaded {} ({}x{})",
            frame.display(),
            gray.width(),
            gray.height()
        );

        Ok(gray_frame(&gray))
    }
}

/// Convert a luma image into a grayscale matrix.
pub fn gray_frame(image: &GrayImage) -> GrayFrame {
    let (width, height) = image.dimensions();

    GrayFrame::from_fn(height as usize, width as usize, |row, col| {
        f32::from(image.get_pixel(col as u32, row as u32)[0])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma, Rgb, RgbImage};

    #[test]
    fn matrix_layout() {
        let image = GrayImage::from_fn(3, 2, |x, y| Luma([(x + 10 * y) as u8]));

        let frame = gray_frame(&image);

        assert_eq!(frame.shape(), (2, 3));
        assert_eq!(frame[(0, 2)], 2.0);
        assert_eq!(frame[(1, 0)], 10.0);
    }

    #[test]
    fn loads_colour_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0001.png");
        RgbImage::from_pixel(4, 3, Rgb([200, 200, 200]))
            .save(&path)
            .unwrap();

        let frame = ImageFrameSource.load_grayscale(&path).unwrap();

        assert_eq!(frame.shape(), (3, 4));
        assert!(frame.iter().all(|&v| v == 200.0));
    }

    #[test]
    fn undecodable_frame_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();

        assert!(matches!(
            ImageFrameSource.load_grayscale(&path),
            Err(Error::InvalidFrame(_))
        ));
        assert!(matches!(
            ImageFrameSource.load_grayscale(&dir.path().join("missing.png")),
            Err(Error::InvalidFrame(_))
        ));
    }

    #[test]
    fn lists_frames_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0002.png", "0001.png", "0003.PNG"] {
            GrayImage::new(2, 2)
                .save_with_format(dir.path().join(name), ImageFormat::Png)
                .unwrap();
        }

        let frames = ImageFrameSource.list_frames(dir.path()).unwrap();

        assert_eq!(frames.len(), 3);
        assert!(frames.frames()[0].ends_with("0001.png"));
        assert!(frames.frames()[2].ends_with("0003.PNG"));
    }
}
