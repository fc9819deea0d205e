//! Glue between the matcher and `image` buffers.

use image::{GrayImage, ImageBuffer, Luma};

use crate::disparity::is_valid;
use crate::error::{Result, SgmError};
use crate::option::SgmOption;
use crate::sgm::SemiGlobalMatcher;

/// Single-channel `f32` disparity image.
pub type DisparityImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Match one rectified grayscale pair with a fresh matcher.
pub fn compute_disp(
    left: &GrayImage,
    right: &GrayImage,
    option: &SgmOption,
) -> Result<DisparityImage> {
    if left.dimensions() != right.dimensions() {
        return Err(SgmError::DimensionMismatch {
            left_width: left.width(),
            left_height: left.height(),
            right_width: right.width(),
            right_height: right.height(),
        });
    }
    let (width, height) = left.dimensions();
    let mut matcher = SemiGlobalMatcher::new(width, height, *option)?;
    let mut disp = vec![0f32; width as usize * height as usize];
    matcher.match_pair(left.as_raw(), right.as_raw(), &mut disp)?;
    let actual = disp.len();
    ImageBuffer::from_raw(width, height, disp).ok_or(SgmError::BufferSizeMismatch {
        what: "disparity image",
        expected: width as usize * height as usize,
        actual,
    })
}

/// Stretch valid disparities to 0..=255 for display; invalid pixels are black.
pub fn disparity_to_gray(disp: &DisparityImage) -> GrayImage {
    let (min_disp, max_disp) = disp
        .pixels()
        .map(|p| p[0])
        .filter(|&d| is_valid(d))
        .fold((f32::MAX, f32::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)));
    let scale = if max_disp > min_disp {
        255.0 / (max_disp - min_disp)
    } else {
        0.0
    };
    GrayImage::from_fn(disp.width(), disp.height(), |x, y| {
        let d = disp.get_pixel(x, y)[0];
        if is_valid(d) {
            Luma([((d - min_disp) * scale).round().clamp(0.0, 255.0) as u8])
        } else {
            Luma([0])
        }
    })
}
