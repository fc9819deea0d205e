//! Semi-global cost aggregation.
//!
//! Each direction runs Hirschmüller's path recurrence
//!
//! ```text
//! Lr(p,d) = C(p,d) + min(Lr(p-r,d), Lr(p-r,d-1) + P1, Lr(p-r,d+1) + P1,
//!                        min_k Lr(p-r,k) + P2) - min_k Lr(p-r,k)
//! ```
//!
//! and adds its 8-bit result straight into the 16-bit sum volume. Only two
//! rows of path costs are kept per direction.

use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, ArrayViewMut1, Zip};

use crate::buffers::try_array2;
use crate::error::Result;

/// Aggregation direction. The predecessor of `(row, col)` on the path is
/// `(row - drow, col - dcol)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLine {
    pub drow: i32,
    pub dcol: i32,
}

/// Horizontal and vertical paths first, then the diagonals.
pub static PATH8: [ScanLine; 8] = [
    ScanLine { drow: 0, dcol: 1 },
    ScanLine { drow: 0, dcol: -1 },
    ScanLine { drow: 1, dcol: 0 },
    ScanLine { drow: -1, dcol: 0 },
    ScanLine { drow: 1, dcol: 1 },
    ScanLine { drow: -1, dcol: -1 },
    ScanLine { drow: 1, dcol: -1 },
    ScanLine { drow: -1, dcol: 1 },
];

/// Rolling path-cost rows, each `(width, disparity_range)`.
#[derive(Debug, Clone)]
pub struct PathScratch {
    prev: Array2<u8>,
    cur: Array2<u8>,
    prev_local: Vec<u8>,
}

impl PathScratch {
    pub fn try_new(width: usize, disparity_range: usize) -> Result<Self> {
        Ok(Self {
            prev: try_array2((width, disparity_range), 0)?,
            cur: try_array2((width, disparity_range), 0)?,
            prev_local: vec![0; disparity_range],
        })
    }

    pub fn byte_len(&self) -> usize {
        self.prev.len() + self.cur.len() + self.prev_local.len()
    }
}

/// Large-jump penalty reduced at intensity edges, never below `p1 + 1`.
pub fn adaptive_p2(p1: u32, p2_init: u32, gray: u8, gray_prev: u8) -> u32 {
    let step = (gray as i32 - gray_prev as i32).unsigned_abs().max(1);
    (p2_init / step).max(p1 + 1)
}

/// Sum the first `num_paths` directions of [`PATH8`] into `cost_aggr`.
///
/// `img_left` drives the adaptive P2 and must be `(height, width)` of
/// `cost_init`. Penalties are expected to be validated already.
pub fn aggregate_costs(
    img_left: &ArrayView2<u8>,
    cost_init: &Array3<u8>,
    p1: i32,
    p2_init: i32,
    num_paths: u8,
    scratch: &mut PathScratch,
    cost_aggr: &mut Array3<u16>,
) {
    cost_aggr.fill(0);
    for scan in PATH8.iter().take(num_paths as usize) {
        aggregate_direction(
            img_left,
            cost_init,
            p1 as u32,
            p2_init as u32,
            scan,
            scratch,
            cost_aggr,
        );
    }
}

fn aggregate_direction(
    img_left: &ArrayView2<u8>,
    cost_init: &Array3<u8>,
    p1: u32,
    p2_init: u32,
    scan: &ScanLine,
    scratch: &mut PathScratch,
    cost_aggr: &mut Array3<u16>,
) {
    let (height, width, _) = cost_init.dim();
    let row_at = |n: usize| if scan.drow < 0 { height - 1 - n } else { n };
    let col_at = |m: usize| if scan.dcol < 0 { width - 1 - m } else { m };

    for n in 0..height {
        let y = row_at(n);
        let py = y as i64 - scan.drow as i64;
        for m in 0..width {
            let x = col_at(m);
            let px = x as i64 - scan.dcol as i64;
            let cost = cost_init.slice(s![y, x, ..]);
            if py < 0 || py >= height as i64 || px < 0 || px >= width as i64 {
                scratch.cur.row_mut(x).assign(&cost);
            } else {
                let (py, px) = (py as usize, px as usize);
                let src = if scan.drow == 0 { &scratch.cur } else { &scratch.prev };
                for (dst, &v) in scratch.prev_local.iter_mut().zip(src.row(px)) {
                    *dst = v;
                }
                let p2 = adaptive_p2(p1, p2_init, img_left[(y, x)], img_left[(py, px)]);
                path_step(&scratch.prev_local, cost, p1, p2, scratch.cur.row_mut(x));
            }
            Zip::from(cost_aggr.slice_mut(s![y, x, ..]))
                .and(scratch.cur.row(x))
                .for_each(|sum, &l| *sum += l as u16);
        }
        std::mem::swap(&mut scratch.prev, &mut scratch.cur);
    }
}

/// One step of the path recurrence. `prev` is the path cost vector of the
/// predecessor; the result is normalized by its minimum so it fits in `u8`.
fn path_step(prev: &[u8], cost: ArrayView1<u8>, p1: u32, p2: u32, mut out: ArrayViewMut1<u8>) {
    let range = prev.len();
    let min_prev = prev.iter().copied().min().unwrap_or(0) as u32;
    let jump = min_prev + p2;
    for (d, (l, &c)) in out.iter_mut().zip(cost.iter()).enumerate() {
        let mut best = (prev[d] as u32).min(jump);
        if d > 0 {
            best = best.min(prev[d - 1] as u32 + p1);
        }
        if d + 1 < range {
            best = best.min(prev[d + 1] as u32 + p1);
        }
        *l = (c as u32 + best - min_prev) as u8;
    }
}
