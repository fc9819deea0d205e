use std::time::Instant;

use log::{debug, trace, warn};
use ndarray::{Array2, Array3, ArrayView2};

use crate::aggregation::{aggregate_costs, PathScratch};
use crate::buffers::{element_count, try_array2, try_array3};
use crate::census::{census_transform, CensusMap};
use crate::cost::compute_cost;
use crate::disparity::{
    compute_disparity_left, compute_disparity_right, is_valid, WtaParams, INVALID_FLOAT,
};
use crate::error::{Result, SgmError};
use crate::hole_fill::fill_holes;
use crate::lr_check::{lr_check, Pixel};
use crate::median::median_filter;
use crate::option::SgmOption;
use crate::speckle::remove_speckles;

/// Neighbours whose disparities differ by at most this much belong to the
/// same speckle region.
const SPECKLE_DIFF: f32 = 1.0;
const MEDIAN_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherState {
    Uninitialized,
    Ready,
    Matching,
}

/// Scratch memory for one image size and option set.
#[derive(Debug)]
struct MatchBuffers {
    census_left: CensusMap,
    census_right: CensusMap,
    cost_init: Array3<u8>,
    cost_aggr: Array3<u16>,
    paths: PathScratch,
    disp_left: Array2<f32>,
    disp_right: Array2<f32>,
    disp_filtered: Array2<f32>,
    occlusions: Vec<Pixel>,
    mismatches: Vec<Pixel>,
}

impl MatchBuffers {
    fn try_new(width: usize, height: usize, option: &SgmOption) -> Result<Self> {
        let range = option.disparity_range() as usize;
        // The aggregated u16 volume is the largest buffer; reject it up front.
        element_count(&[height, width, range, std::mem::size_of::<u16>()])?;
        let buffers = Self {
            census_left: CensusMap::try_zeros(option.census_size, height, width)?,
            census_right: CensusMap::try_zeros(option.census_size, height, width)?,
            cost_init: try_array3((height, width, range), 0)?,
            cost_aggr: try_array3((height, width, range), 0)?,
            paths: PathScratch::try_new(width, range)?,
            disp_left: try_array2((height, width), INVALID_FLOAT)?,
            disp_right: try_array2((height, width), INVALID_FLOAT)?,
            disp_filtered: try_array2((height, width), INVALID_FLOAT)?,
            occlusions: Vec::new(),
            mismatches: Vec::new(),
        };
        trace!(
            "allocated matching buffers: census {} B x2, cost {} B, aggregation {} B, paths {} B",
            buffers.census_left.byte_len(),
            buffers.cost_init.len(),
            buffers.cost_aggr.len() * std::mem::size_of::<u16>(),
            buffers.paths.byte_len(),
        );
        Ok(buffers)
    }
}

/// Census-based semi-global matcher.
///
/// The matcher owns every intermediate buffer. [`initialize`](Self::initialize)
/// allocates them for one image size, [`match_pair`](Self::match_pair) reuses
/// them for any number of stereo pairs of that size and
/// [`release`](Self::release) frees them.
#[derive(Debug)]
pub struct SemiGlobalMatcher {
    state: MatcherState,
    width: usize,
    height: usize,
    option: SgmOption,
    buffers: Option<MatchBuffers>,
}

impl Default for SemiGlobalMatcher {
    fn default() -> Self {
        Self {
            state: MatcherState::Uninitialized,
            width: 0,
            height: 0,
            option: SgmOption::default(),
            buffers: None,
        }
    }
}

impl SemiGlobalMatcher {
    /// Create a matcher that is ready for `width` x `height` pairs.
    pub fn new(width: u32, height: u32, option: SgmOption) -> Result<Self> {
        let mut matcher = Self::default();
        matcher.initialize(width, height, option)?;
        Ok(matcher)
    }

    /// Validate `option` and allocate all buffers.
    ///
    /// On error the matcher keeps its previous state and buffers.
    pub fn initialize(&mut self, width: u32, height: u32, option: SgmOption) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(SgmError::InvalidImageSize { width, height });
        }
        option.validate()?;
        let buffers = MatchBuffers::try_new(width as usize, height as usize, &option)?;

        self.width = width as usize;
        self.height = height as usize;
        self.option = option;
        self.buffers = Some(buffers);
        self.state = MatcherState::Ready;
        debug!(
            "initialized {}x{} matcher, disparities [{}, {}), {} paths",
            width, height, option.min_disparity, option.max_disparity, option.num_paths
        );
        Ok(())
    }

    /// Compute the left disparity map of a rectified pair.
    ///
    /// `left` and `right` are tightly packed row-major 8-bit images and
    /// `disp_left` receives row-major `f32` disparities, `INVALID_FLOAT` where
    /// no estimate survives. `disp_left` is written only when the call
    /// succeeds.
    pub fn match_pair(&mut self, left: &[u8], right: &[u8], disp_left: &mut [f32]) -> Result<()> {
        if self.state != MatcherState::Ready {
            return Err(SgmError::NotInitialized);
        }
        let expected = self.width * self.height;
        for (what, actual) in [
            ("left image", left.len()),
            ("right image", right.len()),
            ("disparity output", disp_left.len()),
        ] {
            if actual != expected {
                return Err(SgmError::BufferSizeMismatch {
                    what,
                    expected,
                    actual,
                });
            }
        }
        let img_left = ArrayView2::from_shape((self.height, self.width), left)?;
        let img_right = ArrayView2::from_shape((self.height, self.width), right)?;
        let Some(buffers) = self.buffers.as_mut() else {
            return Err(SgmError::NotInitialized);
        };

        self.state = MatcherState::Matching;
        run_pipeline(&self.option, &img_left, &img_right, buffers);
        self.state = MatcherState::Ready;

        let output = buffers.disp_filtered.as_slice().ok_or(SgmError::BufferSizeMismatch {
            what: "disparity map",
            expected,
            actual: 0,
        })?;
        disp_left.copy_from_slice(output);
        Ok(())
    }

    /// Free all buffers. Calling it again is a no-op.
    pub fn release(&mut self) {
        if self.buffers.take().is_some() {
            debug!("released {}x{} matcher", self.width, self.height);
        }
        self.width = 0;
        self.height = 0;
        self.state = MatcherState::Uninitialized;
    }

    pub fn state(&self) -> MatcherState {
        self.state
    }

    pub fn option(&self) -> &SgmOption {
        &self.option
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Left disparity map of the last match, as copied to the caller.
    pub fn disparity_left(&self) -> Option<&Array2<f32>> {
        self.buffers.as_ref().map(|b| &b.disp_filtered)
    }

    /// Left disparity map of the last match before the median filter.
    pub fn disparity_unfiltered(&self) -> Option<&Array2<f32>> {
        self.buffers.as_ref().map(|b| &b.disp_left)
    }

    /// Right disparity map of the last match; only computed with LR check on.
    pub fn disparity_right(&self) -> Option<&Array2<f32>> {
        self.buffers.as_ref().map(|b| &b.disp_right)
    }

    /// Pixels classified as occluded by the last LR check.
    pub fn occlusions(&self) -> &[Pixel] {
        self.buffers
            .as_ref()
            .map(|b| b.occlusions.as_slice())
            .unwrap_or(&[])
    }

    /// Pixels classified as mismatched by the last LR check.
    pub fn mismatches(&self) -> &[Pixel] {
        self.buffers
            .as_ref()
            .map(|b| b.mismatches.as_slice())
            .unwrap_or(&[])
    }
}

fn run_pipeline(
    option: &SgmOption,
    img_left: &ArrayView2<u8>,
    img_right: &ArrayView2<u8>,
    buffers: &mut MatchBuffers,
) {
    let mut start = Instant::now();

    census_transform(img_left, &mut buffers.census_left);
    census_transform(img_right, &mut buffers.census_right);
    compute_cost(
        &buffers.census_left,
        &buffers.census_right,
        option.min_disparity,
        &mut buffers.cost_init,
    );
    debug!("computed census cost in {} ms", start.elapsed().as_millis());

    start = Instant::now();
    aggregate_costs(
        img_left,
        &buffers.cost_init,
        option.p1,
        option.p2_init,
        option.num_paths,
        &mut buffers.paths,
        &mut buffers.cost_aggr,
    );
    debug!(
        "aggregated {} paths in {} ms",
        option.num_paths,
        start.elapsed().as_millis()
    );

    start = Instant::now();
    let wta = WtaParams {
        min_disparity: option.min_disparity,
        max_disparity: option.max_disparity,
        uniqueness_ratio: option.is_check_unique.then_some(option.uniqueness_ratio),
    };
    compute_disparity_left(&buffers.cost_aggr, &wta, &mut buffers.disp_left);
    debug!("computed disparities in {} ms", start.elapsed().as_millis());

    start = Instant::now();
    buffers.occlusions.clear();
    buffers.mismatches.clear();
    if option.is_check_lr {
        compute_disparity_right(&buffers.cost_aggr, &wta, &mut buffers.disp_right);
        lr_check(
            &mut buffers.disp_left,
            &buffers.disp_right,
            option.lrcheck_thres,
            &mut buffers.occlusions,
            &mut buffers.mismatches,
        );
        debug!(
            "lr check: {} occlusions, {} mismatches",
            buffers.occlusions.len(),
            buffers.mismatches.len()
        );
    }

    if option.is_remove_speckles {
        let removed = remove_speckles(
            &mut buffers.disp_left,
            SPECKLE_DIFF,
            option.min_speckle_area as usize,
        );
        debug!("removed {} speckle pixels", removed);
    }

    if option.is_fill_holes {
        let filled = fill_holes(
            &mut buffers.disp_left,
            &buffers.occlusions,
            &buffers.mismatches,
            option.min_disparity,
            option.max_disparity,
        );
        debug!("filled {} holes", filled);
    }

    median_filter(&buffers.disp_left, &mut buffers.disp_filtered, MEDIAN_WINDOW);
    debug!("postprocessed in {} ms", start.elapsed().as_millis());

    if !buffers.disp_filtered.iter().any(|&d| is_valid(d)) {
        warn!("no pixel received a valid disparity");
    }
}
