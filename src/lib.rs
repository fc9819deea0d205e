//! Semi-global matching for rectified stereo pairs.
//!
//! The pipeline turns two 8-bit grayscale images into a subpixel disparity
//! map for the left view:
//!
//! census transform → Hamming cost → 4/8-path aggregation → winner-take-all
//! with uniqueness test → left/right check → speckle removal → hole filling →
//! 3x3 median.
//!
//! [`SemiGlobalMatcher`] owns all buffers and can be reused for many pairs of
//! one size; [`compute_disp`] is a one-shot helper for `image` buffers.
//! Rejected pixels carry [`INVALID_FLOAT`].

pub mod aggregation;
mod buffers;
pub mod census;
pub mod cost;
pub mod disparity;
pub mod error;
pub mod hole_fill;
pub mod imaging;
pub mod lr_check;
pub mod median;
pub mod option;
pub mod sgm;
pub mod speckle;

pub use disparity::{is_valid, INVALID_FLOAT};
pub use error::{Result, SgmError};
pub use imaging::{compute_disp, disparity_to_gray, DisparityImage};
pub use lr_check::Pixel;
pub use option::{CensusSize, SgmOption};
pub use sgm::{MatcherState, SemiGlobalMatcher};
