use ndarray::{Array2, Array3, Axis, Zip};

use crate::census::{CensusCode, CensusMap};
use crate::option::OUT_OF_IMAGE_COST;

/// Hamming matching cost for every (row, col, disparity).
///
/// `cost` has shape `(height, width, max_disparity - min_disparity)`; lane
/// index `k` holds disparity `min_disparity + k`. Candidates whose right-image
/// column `col - d` falls outside the image get `OUT_OF_IMAGE_COST`.
pub fn compute_cost(
    census_left: &CensusMap,
    census_right: &CensusMap,
    min_disparity: i32,
    cost: &mut Array3<u8>,
) {
    match (census_left, census_right) {
        (CensusMap::Window5x5(left), CensusMap::Window5x5(right)) => {
            hamming_cost(left, right, min_disparity, cost)
        }
        (CensusMap::Window9x7(left), CensusMap::Window9x7(right)) => {
            hamming_cost(left, right, min_disparity, cost)
        }
        _ => unreachable!("left and right census maps share one window size"),
    }
}

fn hamming_cost<T: CensusCode>(
    census_left: &Array2<T>,
    census_right: &Array2<T>,
    min_disparity: i32,
    cost: &mut Array3<u8>,
) {
    let width = census_left.ncols() as i64;
    Zip::indexed(cost.lanes_mut(Axis(2))).for_each(|(y, x), mut lane| {
        let code_left = census_left[(y, x)];
        for (k, c) in lane.iter_mut().enumerate() {
            let xr = x as i64 - (min_disparity as i64 + k as i64);
            *c = if xr < 0 || xr >= width {
                OUT_OF_IMAGE_COST
            } else {
                code_left.hamming(census_right[(y, xr as usize)]).min(OUT_OF_IMAGE_COST)
            };
        }
    });
}
