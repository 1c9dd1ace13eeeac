use thiserror::Error;

/// Errors raised by grid construction and grid-wide fills.
///
/// Each of these is a caller mistake. The panicking entry points
/// ([`Grid::new`](crate::Grid::new), [`Arena::alloc`](crate::Arena::alloc),
/// [`Grid::flood_fill_range`](crate::Grid::flood_fill_range)) abort with this
/// error's message; the `try_` variants hand it back instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    ZeroArea { width: i32, height: i32 },
    /// The fill value would itself be eligible for filling.
    #[error("flood fill value {fill} lies inside the eligible range [{min}, {max}]")]
    FillInRange { fill: f64, min: f64, max: f64 },
    #[error("blob bounds {min_width}x{min_height}..{max_width}x{max_height} do not fit a {width}x{height} grid")]
    BlobBounds {
        min_width: i32,
        min_height: i32,
        max_width: i32,
        max_height: i32,
        width: i32,
        height: i32,
    },
    #[error("no blob met the minimum size after {attempts} attempts")]
    BlobNotFound { attempts: usize },
}
