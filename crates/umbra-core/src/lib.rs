//! **umbra-core**: geometry, grids and pooled grid allocation shared by the
//! *umbra* spatial crates.
//!
//! - [`Point`] / [`Range`]: integer coordinates and half-open rectangles.
//! - [`Grid`]: a dense 2D array with flood fills and location queries.
//! - [`Arena`]: a free-list of grids, with per-thread pools reached through
//!   [`with_arena`].

pub mod arena;
pub mod error;
pub mod geom;
pub mod grid;

pub use arena::{Arena, Pooled, alloc, free, with_arena};
pub use error::GridError;
pub use geom::{Point, Range, RangeIter};
pub use grid::Grid;
