use serde::{Deserialize, Serialize};

use crate::error::{Result, SgmError};

/// Largest disparity range representable with 8-bit initial costs.
pub const MAX_DISPARITY_RANGE: i32 = 256;

/// Out-of-image matching cost, `u8::MAX / 2`.
pub const OUT_OF_IMAGE_COST: u8 = u8::MAX / 2;

/// Upper bound on the effective large-jump penalty so that a directional
/// cost `C + P2_eff` never exceeds `u8::MAX`.
pub const MAX_P2: i32 = u8::MAX as i32 - OUT_OF_IMAGE_COST as i32;

/// Census window used to build the per-pixel bitstrings.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CensusSize {
    /// 5x5 window, 24 bits packed into a `u32`.
    Census5x5,
    /// 9 rows by 7 columns, 62 bits packed into a `u64`.
    Census9x7,
}

/// Semi-global matching parameters.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SgmOption {
    /// Smallest candidate disparity (inclusive).
    pub min_disparity: i32,
    /// Largest candidate disparity (exclusive).
    pub max_disparity: i32,
    pub census_size: CensusSize,
    /// Number of aggregation directions, 4 or 8.
    pub num_paths: u8,
    /// Penalty for a disparity change of one pixel between path neighbours.
    pub p1: i32,
    /// Base penalty for larger changes, divided by the local intensity step.
    pub p2_init: i32,
    pub is_check_unique: bool,
    /// Lower values are stricter.
    pub uniqueness_ratio: f32,
    pub is_check_lr: bool,
    /// Largest accepted left/right disparity difference.
    pub lrcheck_thres: f32,
    pub is_remove_speckles: bool,
    /// Connected regions smaller than this are invalidated.
    pub min_speckle_area: i32,
    pub is_fill_holes: bool,
}

impl Default for SgmOption {
    fn default() -> Self {
        Self {
            min_disparity: 0,
            max_disparity: 64,
            census_size: CensusSize::Census9x7,
            num_paths: 8,
            p1: 10,
            p2_init: 120,
            is_check_unique: true,
            uniqueness_ratio: 0.95,
            is_check_lr: true,
            lrcheck_thres: 1.0,
            is_remove_speckles: true,
            min_speckle_area: 20,
            is_fill_holes: true,
        }
    }
}

impl SgmOption {
    pub fn new(min_disparity: i32, max_disparity: i32) -> Self {
        Self {
            min_disparity,
            max_disparity,
            ..Self::default()
        }
    }

    /// Number of candidate disparities `D`.
    pub fn disparity_range(&self) -> i32 {
        self.max_disparity - self.min_disparity
    }

    pub fn validate(&self) -> Result<()> {
        let range = self.disparity_range();
        if range <= 0 || range > MAX_DISPARITY_RANGE {
            return Err(SgmError::InvalidDisparityRange {
                min: self.min_disparity,
                max: self.max_disparity,
            });
        }
        if self.num_paths != 4 && self.num_paths != 8 {
            return Err(SgmError::InvalidPaths(self.num_paths));
        }
        if self.p1 < 0 || self.p2_init < 0 || self.p1 + 1 > MAX_P2 || self.p2_init > MAX_P2 {
            return Err(SgmError::InvalidPenalty {
                p1: self.p1,
                p2_init: self.p2_init,
            });
        }
        if !(0.0..=1.0).contains(&self.uniqueness_ratio) {
            return Err(SgmError::InvalidOption("uniqueness_ratio must lie in [0, 1]"));
        }
        if !(self.lrcheck_thres >= 0.0) {
            return Err(SgmError::InvalidOption("lrcheck_thres must be non-negative"));
        }
        if self.min_speckle_area < 0 {
            return Err(SgmError::InvalidOption("min_speckle_area must be non-negative"));
        }
        Ok(())
    }
}
