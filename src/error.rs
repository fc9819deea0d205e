use thiserror::Error;

#[derive(Debug, Error)]
pub enum SgmError {
    #[error("image size must be non-zero, got {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },
    #[error("disparity range [{min}, {max}) must be non-empty and at most 256 wide")]
    InvalidDisparityRange { min: i32, max: i32 },
    #[error("number of aggregation paths must be 4 or 8, got {0}")]
    InvalidPaths(u8),
    #[error("penalties p1={p1}, p2_init={p2_init} may overflow 8-bit path costs")]
    InvalidPenalty { p1: i32, p2_init: i32 },
    #[error("invalid option: {0}")]
    InvalidOption(&'static str),
    #[error("matcher is not initialized")]
    NotInitialized,
    #[error("{what} holds {actual} elements, expected {expected}")]
    BufferSizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("left image is {left_width}x{left_height} but right image is {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },
    #[error("failed to allocate {bytes} bytes of matching buffers")]
    AllocationFailed { bytes: usize },
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, SgmError>;
