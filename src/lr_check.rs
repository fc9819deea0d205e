//! Left/right consistency check.

use ndarray::Array2;

use crate::disparity::{is_valid, INVALID_FLOAT};

/// Pixel coordinate as `(row, col)`.
pub type Pixel = (usize, usize);

/// Invalidate left disparities that disagree with the right view.
///
/// Rejected pixels are split into occlusions (the reverse projection lands on
/// a nearer surface) and mismatches. Pixels that are already invalid count as
/// mismatches. Both lists are cleared first.
pub fn lr_check(
    disp_left: &mut Array2<f32>,
    disp_right: &Array2<f32>,
    threshold: f32,
    occlusions: &mut Vec<Pixel>,
    mismatches: &mut Vec<Pixel>,
) {
    occlusions.clear();
    mismatches.clear();
    let (height, width) = disp_left.dim();
    let width = width as i64;

    for i in 0..height {
        for j in 0..width as usize {
            let disp = disp_left[(i, j)];
            if !is_valid(disp) {
                mismatches.push((i, j));
                continue;
            }

            let col_right = (j as f32 - disp).round() as i64;
            if col_right < 0 || col_right >= width {
                disp_left[(i, j)] = INVALID_FLOAT;
                mismatches.push((i, j));
                continue;
            }

            let disp_r = disp_right[(i, col_right as usize)];
            if is_valid(disp_r) && (disp - disp_r).abs() <= threshold {
                continue;
            }

            // A reverse projection onto column 0 is never an occlusion.
            let occluded = is_valid(disp_r) && {
                let col_rl = (col_right as f32 + disp_r).round() as i64;
                col_rl > 0 && col_rl < width && {
                    let disp_l = disp_left[(i, col_rl as usize)];
                    is_valid(disp_l) && disp_l > disp
                }
            };
            if occluded {
                occlusions.push((i, j));
            } else {
                mismatches.push((i, j));
            }
            disp_left[(i, j)] = INVALID_FLOAT;
        }
    }
}
