use ndarray::Array2;

use crate::disparity::{is_valid, INVALID_FLOAT};

/// Invalidate small 4-connected regions of similar disparity.
///
/// Neighbours join a region when their disparities differ by at most
/// `diff_insame`. Regions with fewer than `min_area` pixels are set to
/// `INVALID_FLOAT`. Returns the number of pixels removed.
pub fn remove_speckles(disparity: &mut Array2<f32>, diff_insame: f32, min_area: usize) -> usize {
    let (height, width) = disparity.dim();
    let mut visited = Array2::<bool>::from_elem((height, width), false);
    let mut region: Vec<(usize, usize)> = Vec::new();
    let mut removed = 0;

    for i in 0..height {
        for j in 0..width {
            if visited[(i, j)] || !is_valid(disparity[(i, j)]) {
                continue;
            }
            region.clear();
            region.push((i, j));
            visited[(i, j)] = true;
            let mut cur = 0;
            while cur < region.len() {
                let (row, col) = region[cur];
                let disp = disparity[(row, col)];
                let neighbours = [
                    (row.wrapping_sub(1), col),
                    (row + 1, col),
                    (row, col.wrapping_sub(1)),
                    (row, col + 1),
                ];
                for (r, c) in neighbours {
                    if r >= height || c >= width || visited[(r, c)] {
                        continue;
                    }
                    let disp_nb = disparity[(r, c)];
                    if is_valid(disp_nb) && (disp_nb - disp).abs() <= diff_insame {
                        visited[(r, c)] = true;
                        region.push((r, c));
                    }
                }
                cur += 1;
            }
            if region.len() < min_area {
                for &p in &region {
                    disparity[p] = INVALID_FLOAT;
                }
                removed += region.len();
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn small_island_is_removed() {
        let mut disp = Array2::from_elem((10, 10), 5.0f32);
        disp[(4, 4)] = 20.0;
        disp[(4, 5)] = 20.5;
        disp[(5, 5)] = 21.0;
        let removed = remove_speckles(&mut disp, 1.0, 10);
        assert_eq!(removed, 3);
        assert!(!is_valid(disp[(4, 4)]));
        assert!(!is_valid(disp[(5, 5)]));
        assert_eq!(disp[(0, 0)], 5.0);
    }

    #[test]
    fn gradual_slope_stays_one_region() {
        // Steps of 0.5 chain the whole row together even though the ends
        // differ by far more than one.
        let mut disp = Array2::from_shape_fn((1, 12), |(_, x)| x as f32 * 0.5);
        assert_eq!(remove_speckles(&mut disp, 1.0, 12), 0);
        assert!(disp.iter().all(|&d| is_valid(d)));
    }

    #[test]
    fn diagonal_contact_does_not_connect() {
        let mut disp = Array2::from_elem((4, 4), INVALID_FLOAT);
        disp[(0, 0)] = 3.0;
        disp[(1, 1)] = 3.0;
        assert_eq!(remove_speckles(&mut disp, 1.0, 2), 2);
    }

    #[test]
    fn no_surviving_region_is_smaller_than_min_area() {
        let mut disp = Array2::from_shape_fn((20, 20), |(y, x)| ((x / 3 + y / 2) % 4 * 5) as f32);
        remove_speckles(&mut disp, 1.0, 7);
        // Re-running finds nothing left to remove.
        assert_eq!(remove_speckles(&mut disp, 1.0, 7), 0);
    }
}
