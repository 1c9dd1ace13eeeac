//! Distance fields and path extraction for grid-based games.
//!
//! - [`DijkstraMap`]: multi-source distance fields over a cost grid, with
//!   4-way or 8-way movement and corner-cutting rules.
//! - [`next_step`] / [`get_path`]: greedy descent over a solved field.
//!
//! Cost grids are `Grid<i32>` holding costs `>= 0`, [`FORBIDDEN`] or
//! [`OBSTRUCTION`]; distance grids are `Grid<f64>` where [`NO_PATH`] marks
//! cells no seed reached.
//!
//! ```
//! use umbra_core::{Grid, Point};
//! use umbra_paths::{calculate_distances, get_path};
//!
//! let costs = Grid::new(8, 8, 1);
//! let mut distances = Grid::new(8, 8, 0.0);
//! calculate_distances(&mut distances, Point::new(6, 6), &costs, true);
//! let path = get_path(&distances, Point::new(1, 1), |_, _| false).unwrap();
//! assert_eq!(path.last(), Some(&Point::new(6, 6)));
//! ```

mod cost;
mod dijkstra;
mod dir;
mod distance;
mod path;

pub use cost::{AVOIDED, Cost, DIAGONAL_PENALTY, FORBIDDEN, NO_PATH, OBSTRUCTION, is_reachable};
pub use dijkstra::{
    DijkstraMap, DistanceOptions, EdgePolicy, calculate_distances, rescan, with_dijkstra,
};
pub use dir::Dir;
pub use distance::{chebyshev, distance_between, manhattan};
pub use path::{closest_valid_location, get_path, next_step};
