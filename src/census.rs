//! Census transform.
//!
//! Every neighbour in the window is compared with the centre pixel; a neighbour
//! darker than the centre sets its bit. Bits are packed row-major over the
//! window with the first neighbour ending up in the most significant position.
//! Pixels closer to the border than half the window keep a zero code.

use ndarray::{Array2, ArrayView2, Zip};

use crate::buffers::try_array2;
use crate::error::Result;
use crate::option::CensusSize;

/// Bitstring type holding one census code.
pub trait CensusCode: Copy + Default + PartialEq + std::fmt::Debug {
    /// Shift the code left by one and append `bit`.
    fn push_bit(self, bit: bool) -> Self;
    /// Number of differing bits.
    fn hamming(self, other: Self) -> u8;
}

impl CensusCode for u32 {
    fn push_bit(self, bit: bool) -> Self {
        (self << 1) | bit as u32
    }

    fn hamming(self, other: Self) -> u8 {
        (self ^ other).count_ones() as u8
    }
}

impl CensusCode for u64 {
    fn push_bit(self, bit: bool) -> Self {
        (self << 1) | bit as u64
    }

    fn hamming(self, other: Self) -> u8 {
        (self ^ other).count_ones() as u8
    }
}

/// Census codes of one image, sized by the configured window.
#[derive(Debug, Clone)]
pub enum CensusMap {
    Window5x5(Array2<u32>),
    Window9x7(Array2<u64>),
}

impl CensusMap {
    pub fn try_zeros(census_size: CensusSize, height: usize, width: usize) -> Result<Self> {
        Ok(match census_size {
            CensusSize::Census5x5 => CensusMap::Window5x5(try_array2((height, width), 0)?),
            CensusSize::Census9x7 => CensusMap::Window9x7(try_array2((height, width), 0)?),
        })
    }

    pub fn census_size(&self) -> CensusSize {
        match self {
            CensusMap::Window5x5(_) => CensusSize::Census5x5,
            CensusMap::Window9x7(_) => CensusSize::Census9x7,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        match self {
            CensusMap::Window5x5(codes) => codes.dim(),
            CensusMap::Window9x7(codes) => codes.dim(),
        }
    }

    /// Bytes held by the code array.
    pub fn byte_len(&self) -> usize {
        match self {
            CensusMap::Window5x5(codes) => codes.len() * std::mem::size_of::<u32>(),
            CensusMap::Window9x7(codes) => codes.len() * std::mem::size_of::<u64>(),
        }
    }
}

/// Half extents `(rows, cols)` of the census window.
fn half_window(census_size: CensusSize) -> (usize, usize) {
    match census_size {
        CensusSize::Census5x5 => (2, 2),
        CensusSize::Census9x7 => (4, 3),
    }
}

/// Fill `census` from `img`. Border pixels are reset to zero.
pub fn census_transform(img: &ArrayView2<u8>, census: &mut CensusMap) {
    let (half_rows, half_cols) = half_window(census.census_size());
    match census {
        CensusMap::Window5x5(codes) => census_window(img, codes, half_rows, half_cols),
        CensusMap::Window9x7(codes) => census_window(img, codes, half_rows, half_cols),
    }
}

fn census_window<T: CensusCode>(
    img: &ArrayView2<u8>,
    census: &mut Array2<T>,
    half_rows: usize,
    half_cols: usize,
) {
    let (height, width) = img.dim();
    Zip::indexed(census).for_each(|(y, x), code| {
        *code = T::default();
        if y < half_rows || y + half_rows >= height || x < half_cols || x + half_cols >= width {
            return;
        }
        let center = img[(y, x)];
        let mut val = T::default();
        for yy in (y - half_rows)..=(y + half_rows) {
            for xx in (x - half_cols)..=(x + half_cols) {
                if yy == y && xx == x {
                    continue;
                }
                val = val.push_bit(img[(yy, xx)] < center);
            }
        }
        *code = val;
    });
}
