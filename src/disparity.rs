//! Winner-take-all disparity selection with uniqueness screening and
//! quadratic subpixel refinement.

use ndarray::{s, Array2, Array3, Zip};

/// Disparity assigned to rejected pixels.
pub const INVALID_FLOAT: f32 = f32::INFINITY;

/// Returns `true` unless `disp` is the invalid sentinel.
#[inline]
pub fn is_valid(disp: f32) -> bool {
    disp != INVALID_FLOAT
}

/// Selection rules shared by both views.
#[derive(Debug, Clone, Copy)]
pub struct WtaParams {
    pub min_disparity: i32,
    pub max_disparity: i32,
    /// `Some(ratio)` enables the uniqueness test.
    pub uniqueness_ratio: Option<f32>,
}

/// Pick the disparity of one pixel from its candidate costs.
///
/// `costs[k]` belongs to disparity `min_disparity + k`; `u16::MAX` marks a
/// candidate that does not exist for this pixel.
pub fn select_disparity(costs: &[u16], params: &WtaParams) -> f32 {
    let mut min_cost = u16::MAX;
    let mut best = None;
    for (k, &c) in costs.iter().enumerate() {
        if c < min_cost {
            min_cost = c;
            best = Some(k);
        }
    }
    let Some(best) = best else {
        return INVALID_FLOAT;
    };

    if let Some(ratio) = params.uniqueness_ratio {
        let sec_min_cost = costs
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != best)
            .map(|(_, &c)| c)
            .min()
            .unwrap_or(u16::MAX);
        // Integer threshold, truncated like the 16-bit costs themselves.
        let margin = (min_cost as f32 * (1.0 - ratio)) as u16;
        if sec_min_cost - min_cost <= margin {
            return INVALID_FLOAT;
        }
    }

    let best_disparity = params.min_disparity + best as i32;
    if best_disparity == params.min_disparity || best_disparity == params.max_disparity - 1 {
        return INVALID_FLOAT;
    }

    let cost_1 = costs[best - 1] as i32;
    let cost_2 = costs[best + 1] as i32;
    let denom = (cost_1 + cost_2 - 2 * min_cost as i32).max(1);
    best_disparity as f32 + (cost_1 - cost_2) as f32 / (denom as f32 * 2.0)
}

/// Left-view disparities from the aggregated volume.
pub fn compute_disparity_left(
    cost_aggr: &Array3<u16>,
    params: &WtaParams,
    disparity: &mut Array2<f32>,
) {
    let range = cost_aggr.dim().2;
    let mut cost_local = vec![0u16; range];
    Zip::indexed(disparity).for_each(|(y, x), disp| {
        for (dst, &c) in cost_local.iter_mut().zip(cost_aggr.slice(s![y, x, ..])) {
            *dst = c;
        }
        *disp = select_disparity(&cost_local, params);
    });
}

/// Right-view disparities, reusing the left volume: the right pixel `(y, x)`
/// at disparity `d` corresponds to the left pixel `(y, x + d)`.
pub fn compute_disparity_right(
    cost_aggr: &Array3<u16>,
    params: &WtaParams,
    disparity: &mut Array2<f32>,
) {
    let (_, width, range) = cost_aggr.dim();
    let mut cost_local = vec![u16::MAX; range];
    Zip::indexed(disparity).for_each(|(y, x), disp| {
        for (k, dst) in cost_local.iter_mut().enumerate() {
            let col_left = x as i64 + params.min_disparity as i64 + k as i64;
            *dst = if col_left >= 0 && col_left < width as i64 {
                cost_aggr[(y, col_left as usize, k)]
            } else {
                u16::MAX
            };
        }
        *disp = select_disparity(&cost_local, params);
    });
}
