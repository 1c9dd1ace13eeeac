//! Roguelike utilities built on `umbra-core`.
//!
//! - [`fov`]: recursive shadowcasting with pluggable opacity and falloff.
//! - [`blob`]: cave-like blobs grown by cellular automata.

pub mod blob;
pub mod fov;

pub use blob::{Blob, BlobConfig};
pub use fov::{Fov, FovStrategy, GridFov};
