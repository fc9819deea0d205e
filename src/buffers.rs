//! Fallible allocation of the dense matching buffers.

use ndarray::{Array2, Array3};

use crate::error::{Result, SgmError};

fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let bytes = len.saturating_mul(std::mem::size_of::<T>());
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| SgmError::AllocationFailed { bytes })?;
    buf.resize(len, value);
    Ok(buf)
}

/// Element count of `dims`, or `AllocationFailed` if it overflows `isize`.
pub(crate) fn element_count(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .filter(|&n| n <= isize::MAX as usize)
        .ok_or(SgmError::AllocationFailed { bytes: usize::MAX })
}

pub(crate) fn try_array2<T: Clone>(shape: (usize, usize), value: T) -> Result<Array2<T>> {
    let len = element_count(&[shape.0, shape.1])?;
    Ok(Array2::from_shape_vec(shape, try_filled(len, value)?)?)
}

pub(crate) fn try_array3<T: Clone>(shape: (usize, usize, usize), value: T) -> Result<Array3<T>> {
    let len = element_count(&[shape.0, shape.1, shape.2])?;
    Ok(Array3::from_shape_vec(shape, try_filled(len, value)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::CensusMap;
    use crate::option::CensusSize;

    #[test]
    fn arrays_have_requested_shape_and_fill() {
        let a = try_array3((2, 3, 4), 7u8).unwrap();
        assert_eq!(a.dim(), (2, 3, 4));
        assert!(a.iter().all(|&v| v == 7));
    }

    #[test]
    fn overflowing_shape_is_an_allocation_error() {
        let r = try_array3::<u16>((usize::MAX, 2, 2), 0);
        assert!(matches!(r, Err(SgmError::AllocationFailed { .. })));
    }

    #[test]
    fn oversized_census_map_is_an_allocation_error() {
        let side = u32::MAX as usize;
        let r = CensusMap::try_zeros(CensusSize::Census9x7, side, side);
        assert!(matches!(r, Err(SgmError::AllocationFailed { .. })));
    }
}
