//! Hole filling along eight radial rays.
//!
//! Occlusions are filled first with the second smallest candidate (occluded
//! pixels usually belong to the farther surface), then mismatches and finally
//! every pixel still invalid with the median candidate. Each pass computes all
//! of its fill values before writing any of them.

use std::f32::consts::PI;

use ndarray::Array2;

use crate::disparity::{is_valid, INVALID_FLOAT};
use crate::lr_check::Pixel;

/// Ray angles for the upper half of the image.
const ANGLES_UPPER: [f32; 8] = [
    PI,
    3.0 * PI / 4.0,
    PI / 2.0,
    PI / 4.0,
    0.0,
    7.0 * PI / 4.0,
    3.0 * PI / 2.0,
    5.0 * PI / 4.0,
];

/// Ray angles for rows at or below the middle of the image.
const ANGLES_LOWER: [f32; 8] = [
    PI,
    5.0 * PI / 4.0,
    3.0 * PI / 2.0,
    7.0 * PI / 4.0,
    0.0,
    PI / 4.0,
    PI / 2.0,
    3.0 * PI / 4.0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillRule {
    SecondSmallest,
    Median,
}

/// Fill holes in `disparity`. Returns the number of pixels that received a
/// value; pixels with no valid disparity on any ray stay invalid.
pub fn fill_holes(
    disparity: &mut Array2<f32>,
    occlusions: &[Pixel],
    mismatches: &[Pixel],
    min_disparity: i32,
    max_disparity: i32,
) -> usize {
    let max_search_length = min_disparity.unsigned_abs().max(max_disparity.unsigned_abs()) as usize;
    let mut filled = fill_pass(
        disparity,
        occlusions,
        FillRule::SecondSmallest,
        max_search_length,
    );
    filled += fill_pass(disparity, mismatches, FillRule::Median, max_search_length);

    let remaining: Vec<Pixel> = disparity
        .indexed_iter()
        .filter(|(_, &d)| !is_valid(d))
        .map(|(p, _)| p)
        .collect();
    filled += fill_pass(disparity, &remaining, FillRule::Median, max_search_length);
    filled
}

fn fill_pass(
    disparity: &mut Array2<f32>,
    targets: &[Pixel],
    rule: FillRule,
    max_search_length: usize,
) -> usize {
    if targets.is_empty() {
        return 0;
    }
    let mut candidates = Vec::with_capacity(8);
    let fill: Vec<f32> = targets
        .iter()
        .map(|&pixel| {
            collect_candidates(disparity, pixel, max_search_length, &mut candidates);
            pick(&mut candidates, rule)
        })
        .collect();

    let mut filled = 0;
    for (&pixel, &value) in targets.iter().zip(fill.iter()) {
        if is_valid(value) {
            disparity[pixel] = value;
            filled += 1;
        }
    }
    filled
}

/// First valid disparity met along each ray, at most one per ray.
fn collect_candidates(
    disparity: &Array2<f32>,
    (y, x): Pixel,
    max_search_length: usize,
    candidates: &mut Vec<f32>,
) {
    let (height, width) = disparity.dim();
    let angles = if y >= height / 2 {
        &ANGLES_LOWER
    } else {
        &ANGLES_UPPER
    };
    candidates.clear();
    for &angle in angles {
        let (sina, cosa) = angle.sin_cos();
        for m in 1..max_search_length {
            let yy = (y as f32 + m as f32 * sina).round();
            let xx = (x as f32 + m as f32 * cosa).round();
            if yy < 0.0 || yy >= height as f32 || xx < 0.0 || xx >= width as f32 {
                break;
            }
            let disp = disparity[(yy as usize, xx as usize)];
            if is_valid(disp) {
                candidates.push(disp);
                break;
            }
        }
    }
}

fn pick(candidates: &mut [f32], rule: FillRule) -> f32 {
    if candidates.is_empty() {
        return INVALID_FLOAT;
    }
    candidates.sort_by(f32::total_cmp);
    match rule {
        FillRule::SecondSmallest if candidates.len() > 1 => candidates[1],
        FillRule::SecondSmallest => candidates[0],
        FillRule::Median => candidates[candidates.len() / 2],
    }
}
