//! The [`Grid`] type: a dense, exclusively owned 2D array addressed by
//! [`Point`].
//!
//! Storage is row-major. Every bounds check in the workspace goes through
//! [`Grid::has_xy`].

use std::ops::{Index, IndexMut};

use rand::Rng;

use crate::error::GridError;
use crate::geom::{Point, Range};

/// A `width x height` grid of `T` values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid<T> {
    cells: Vec<T>,
    width: i32,
    height: i32,
}

impl<T: Copy> Grid<T> {
    /// Create a grid with every cell set to `fill`.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or negative.
    pub fn new(width: i32, height: i32, fill: T) -> Self {
        Self::try_new(width, height, fill).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible version of [`Grid::new`].
    pub fn try_new(width: i32, height: i32, fill: T) -> Result<Self, GridError> {
        check_dims(width, height)?;
        Ok(Self {
            cells: vec![fill; (width * height) as usize],
            width,
            height,
        })
    }

    /// Reshape in place to `width x height`, every cell set to `fill`.
    ///
    /// The backing allocation is kept and only grows.
    pub fn try_resize(&mut self, width: i32, height: i32, fill: T) -> Result<(), GridError> {
        check_dims(width, height)?;
        self.cells.clear();
        self.cells.resize((width * height) as usize, fill);
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Panicking version of [`Grid::try_resize`].
    pub fn resize(&mut self, width: i32, height: i32, fill: T) {
        self.try_resize(width, height, fill)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Size as a `Point` (width = x, height = y).
    #[inline]
    pub fn size(&self) -> Point {
        Point::new(self.width, self.height)
    }

    /// The range `[0,0)-(width,height)`.
    #[inline]
    pub fn bounds(&self) -> Range {
        Range::new(0, 0, self.width, self.height)
    }

    /// Whether `p` lies inside the grid.
    #[inline]
    pub fn has_xy(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    /// Whether `p` lies on the outermost ring of cells (or outside).
    #[inline]
    pub fn is_boundary_xy(&self, p: Point) -> bool {
        p.x <= 0 || p.y <= 0 || p.x >= self.width - 1 || p.y >= self.height - 1
    }

    #[inline]
    fn idx(&self, p: Point) -> usize {
        (p.y * self.width + p.x) as usize
    }

    /// The value at `p`, or `None` outside the grid.
    #[inline]
    pub fn get(&self, p: Point) -> Option<T> {
        if self.has_xy(p) {
            Some(self.cells[self.idx(p)])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, p: Point) -> Option<&mut T> {
        if self.has_xy(p) {
            let i = self.idx(p);
            Some(&mut self.cells[i])
        } else {
            None
        }
    }

    /// Set the value at `p`. No-op outside the grid.
    #[inline]
    pub fn set(&mut self, p: Point, v: T) {
        if self.has_xy(p) {
            let i = self.idx(p);
            self.cells[i] = v;
        }
    }

    pub fn fill(&mut self, v: T) {
        self.cells.fill(v);
    }

    /// Fill the part of `rng` that overlaps the grid.
    pub fn fill_rect(&mut self, rng: Range, v: T) {
        for p in rng.intersect(self.bounds()) {
            let i = self.idx(p);
            self.cells[i] = v;
        }
    }

    /// Copy the overlapping region of `src` (matched by coordinate).
    pub fn copy_from(&mut self, src: &Grid<T>) {
        for p in self.bounds().intersect(src.bounds()) {
            let i = self.idx(p);
            self.cells[i] = src.cells[src.idx(p)];
        }
    }

    /// Row-major iterator over `(Point, T)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Point, T)> + '_ {
        self.bounds().iter().zip(self.cells.iter().copied())
    }

    /// The raw row-major cells.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// Count cells satisfying `pred`.
    pub fn count_by(&self, mut pred: impl FnMut(Point, T) -> bool) -> usize {
        self.iter().filter(|&(p, v)| pred(p, v)).count()
    }

    /// Render the grid one row per line, using `fmt` for each cell.
    pub fn dump_with(&self, mut fmt: impl FnMut(T) -> char) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for row in self.cells.chunks(self.width as usize) {
            out.extend(row.iter().map(|&v| fmt(v)));
            out.push('\n');
        }
        out
    }
}

impl<T: Copy + PartialEq> Grid<T> {
    /// Number of cells equal to `v`.
    pub fn count(&self, v: T) -> usize {
        self.cells.iter().filter(|&&c| c == v).count()
    }

    /// Tight bounding range of all cells equal to `v` (empty if none).
    pub fn value_bounds(&self, v: T) -> Range {
        self.iter()
            .filter(|&(_, c)| c == v)
            .fold(Range::default(), |acc, (p, _)| {
                acc.union(Range::new(p.x, p.y, p.x + 1, p.y + 1))
            })
    }

    /// First cell equal to `v` in row-major order.
    pub fn first_matching_loc(&self, v: T) -> Option<Point> {
        self.iter().find(|&(_, c)| c == v).map(|(p, _)| p)
    }

    /// The cell equal to `v` closest to `origin` (Euclidean). Ties keep the
    /// first match in row-major order.
    pub fn closest_matching_loc(&self, origin: Point, v: T) -> Option<Point> {
        let mut best: Option<(i64, Point)> = None;
        for (p, c) in self.iter() {
            if c != v {
                continue;
            }
            let d = p.dist_sq(origin);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, p));
            }
        }
        best.map(|(_, p)| p)
    }

    /// A uniformly chosen cell equal to `v`.
    pub fn random_matching_loc<R: Rng + ?Sized>(&self, rng: &mut R, v: T) -> Option<Point> {
        let n = self.count(v);
        if n == 0 {
            return None;
        }
        let k = rng.random_range(0..n);
        self.iter()
            .filter(|&(_, c)| c == v)
            .nth(k)
            .map(|(p, _)| p)
    }

    /// 4-way flood fill of the region of `matching` cells containing `start`.
    ///
    /// Returns the number of cells filled. Filling with the matched value,
    /// or starting on a non-matching cell, fills nothing.
    pub fn flood_fill(&mut self, start: Point, matching: T, fill: T) -> usize {
        if matching == fill || self.get(start) != Some(matching) {
            return 0;
        }
        self.fill_region(start, fill, |c| c == matching)
    }

    /// Work-stack fill shared by the flood fills. `eligible(fill)` must be
    /// false or this never terminates, hence the callers' checks.
    fn fill_region(&mut self, start: Point, fill: T, eligible: impl Fn(T) -> bool) -> usize {
        let mut stack = vec![start];
        let i = self.idx(start);
        self.cells[i] = fill;
        let mut filled = 1;
        while let Some(p) = stack.pop() {
            for n in p.neighbors_4() {
                if self.get(n).is_some_and(&eligible) {
                    let i = self.idx(n);
                    self.cells[i] = fill;
                    filled += 1;
                    stack.push(n);
                }
            }
        }
        filled
    }
}

impl<T: Copy + PartialOrd + Into<f64>> Grid<T> {
    /// 4-way flood fill over cells whose value lies in `[min, max]`,
    /// starting at `start` (which is filled regardless of its value).
    ///
    /// # Panics
    ///
    /// Panics if `fill` itself lies in `[min, max]`.
    pub fn flood_fill_range(&mut self, start: Point, min: T, max: T, fill: T) -> usize {
        self.try_flood_fill_range(start, min, max, fill)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible version of [`Grid::flood_fill_range`]. Returns `Ok(0)` when
    /// `start` is outside the grid.
    pub fn try_flood_fill_range(
        &mut self,
        start: Point,
        min: T,
        max: T,
        fill: T,
    ) -> Result<usize, GridError> {
        if fill >= min && fill <= max {
            return Err(GridError::FillInRange {
                fill: fill.into(),
                min: min.into(),
                max: max.into(),
            });
        }
        if !self.has_xy(start) {
            return Ok(0);
        }
        Ok(self.fill_region(start, fill, |c| c >= min && c <= max))
    }

    /// Replace every value in `[min, max]` with `with`. Returns the count.
    pub fn find_replace_range(&mut self, min: T, max: T, with: T) -> usize {
        let mut n = 0;
        for c in self.cells.iter_mut().filter(|c| **c >= min && **c <= max) {
            *c = with;
            n += 1;
        }
        n
    }
}

impl<T: Copy> Index<Point> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, p: Point) -> &T {
        assert!(self.has_xy(p), "point {p} outside {}x{} grid", self.width, self.height);
        &self.cells[self.idx(p)]
    }
}

impl<T: Copy> IndexMut<Point> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, p: Point) -> &mut T {
        assert!(self.has_xy(p), "point {p} outside {}x{} grid", self.width, self.height);
        let i = self.idx(p);
        &mut self.cells[i]
    }
}

fn check_dims(width: i32, height: i32) -> Result<(), GridError> {
    if width <= 0 || height <= 0 {
        return Err(GridError::ZeroArea { width, height });
    }
    Ok(())
}
