//! Field of view by recursive shadowcasting.
//!
//! The origin is scanned in eight octants. Each octant is walked row by row
//! away from the origin, keeping the wedge of slopes that is still lit;
//! opaque cells split the wedge and the lit parts recurse into the next row.
//! Recursion depth is bounded by the radius.
//!
//! Callers describe the map through a [`FovStrategy`]. [`GridFov`] is the
//! ready-made strategy for a blocking grid and a brightness grid.

use log::trace;
use umbra_core::{Grid, Point};
use umbra_paths::distance_between;

/// What the shadowcaster needs to know about the map, and where it writes.
pub trait FovStrategy {
    /// Whether `p` stops light. The cell itself is still lit.
    fn is_blocked(&self, p: Point) -> bool;

    /// Distance used for the radius cut-off and brightness falloff, given
    /// the offset from the origin.
    fn calc_radius(&self, dx: i32, dy: i32) -> f64 {
        distance_between(Point::ZERO, Point::new(dx, dy))
    }

    /// Record that `p` is visible with `brightness` in `(0, 1]`. A cell can
    /// be reported more than once.
    fn set_visible(&mut self, p: Point, brightness: f64);

    /// Whether `p` exists. Missing cells block light.
    fn has_xy(&self, _p: Point) -> bool {
        true
    }
}

impl<S: FovStrategy + ?Sized> FovStrategy for &mut S {
    fn is_blocked(&self, p: Point) -> bool {
        (**self).is_blocked(p)
    }

    fn calc_radius(&self, dx: i32, dy: i32) -> f64 {
        (**self).calc_radius(dx, dy)
    }

    fn set_visible(&mut self, p: Point, brightness: f64) {
        (**self).set_visible(p, brightness)
    }

    fn has_xy(&self, p: Point) -> bool {
        (**self).has_xy(p)
    }
}

/// Octant transform from `(dx, dy)` scan offsets to map offsets.
#[derive(Debug, Clone, Copy)]
struct Octant {
    xx: i32,
    xy: i32,
    yx: i32,
    yy: i32,
}

impl Octant {
    /// The two octants on either side of each diagonal.
    fn all() -> [Octant; 8] {
        let diagonals = [(1, -1), (1, 1), (-1, 1), (-1, -1)];
        let mut out = [Octant { xx: 0, xy: 0, yx: 0, yy: 0 }; 8];
        for (i, (d0, d1)) in diagonals.into_iter().enumerate() {
            out[2 * i] = Octant { xx: 0, xy: d0, yx: d1, yy: 0 };
            out[2 * i + 1] = Octant { xx: d0, xy: 0, yx: 0, yy: d1 };
        }
        out
    }

    fn apply(self, origin: Point, dx: i32, dy: i32) -> Point {
        Point::new(
            origin.x + dx * self.xx + dy * self.xy,
            origin.y + dx * self.yx + dy * self.yy,
        )
    }
}

/// Shadowcasting field of view over a [`FovStrategy`].
///
/// ```
/// use umbra_core::{Grid, Point};
/// use umbra_rl::{Fov, GridFov};
///
/// let walls = Grid::new(9, 9, false);
/// let mut light = Grid::new(9, 9, 0.0);
/// Fov::new(GridFov::new(&walls, &mut light)).calculate(Point::new(4, 4), 2);
/// assert_eq!(light[Point::new(4, 4)], 1.0);
/// assert!(light[Point::new(4, 2)] > 0.0);
/// assert_eq!(light[Point::new(4, 1)], 0.0);
/// ```
#[derive(Debug)]
pub struct Fov<S> {
    strategy: S,
    origin: Point,
    // One past the requested radius, so the requested ring is included.
    max_radius: f64,
}

impl<S: FovStrategy> Fov<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            origin: Point::ZERO,
            max_radius: 0.0,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn into_inner(self) -> S {
        self.strategy
    }

    /// Light everything visible from `origin` within `max_radius`.
    ///
    /// The origin gets brightness 1. Other cells get
    /// `1 - radius / (max_radius + 1)` where `radius` comes from
    /// [`FovStrategy::calc_radius`]; cells with `radius >= max_radius + 1`
    /// stay dark. A radius of zero lights only the origin.
    pub fn calculate(&mut self, origin: Point, max_radius: i32) {
        trace!("fov: origin {origin} radius {max_radius}");
        self.origin = origin;
        self.max_radius = f64::from(max_radius.max(0)) + 1.0;
        self.strategy.set_visible(origin, 1.0);
        for octant in Octant::all() {
            self.cast_light(1, 1.0, 0.0, octant);
        }
    }

    fn cast_light(&mut self, row: i32, start_slope: f64, end_slope: f64, octant: Octant) {
        if f64::from(row) >= self.max_radius || start_slope < end_slope {
            return;
        }
        let mut next_start = start_slope;
        let mut blocked = false;
        let dy = -row;
        for dx in -row..=0 {
            let cur = octant.apply(self.origin, dx, dy);
            let (fx, fy) = (f64::from(dx), f64::from(dy));
            let outer_slope = (fx - 0.5) / (fy + 0.5);
            let inner_slope = (fx + 0.5) / (fy - 0.5);
            let max_slope = fx / (fy + 0.5);
            let min_slope = (fx + 0.5) / fy;

            if !self.strategy.has_xy(cur) {
                blocked = true;
                continue;
            }
            if start_slope < min_slope {
                blocked = self.strategy.is_blocked(cur);
                continue;
            } else if end_slope > max_slope {
                break;
            }

            let radius = self.strategy.calc_radius(dx, dy);
            if radius < self.max_radius {
                self.strategy.set_visible(cur, 1.0 - radius / self.max_radius);
            }

            if blocked {
                if self.strategy.is_blocked(cur) {
                    next_start = inner_slope;
                    continue;
                }
                blocked = false;
            } else if self.strategy.is_blocked(cur) && f64::from(row) < self.max_radius {
                blocked = true;
                self.cast_light(row + 1, next_start, outer_slope, octant);
                next_start = inner_slope;
            }
        }
        if !blocked {
            self.cast_light(row + 1, next_start, end_slope, octant);
        }
    }
}

/// Grid-backed strategy: `true` cells in `blocking` are opaque, and lit
/// cells raise their entry in `light` to the brightest value seen.
///
/// Cells outside `blocking` do not exist. `light` is not cleared.
#[derive(Debug)]
pub struct GridFov<'a> {
    blocking: &'a Grid<bool>,
    light: &'a mut Grid<f64>,
}

impl<'a> GridFov<'a> {
    pub fn new(blocking: &'a Grid<bool>, light: &'a mut Grid<f64>) -> Self {
        Self { blocking, light }
    }
}

impl FovStrategy for GridFov<'_> {
    fn is_blocked(&self, p: Point) -> bool {
        self.blocking.get(p).unwrap_or(true)
    }

    fn set_visible(&mut self, p: Point, brightness: f64) {
        if let Some(v) = self.light.get_mut(p) {
            *v = v.max(brightness);
        }
    }

    fn has_xy(&self, p: Point) -> bool {
        self.blocking.has_xy(p)
    }
}
