//! Multi-source distance fields ("Dijkstra maps").
//!
//! The solver keeps every pending cell in one doubly linked list sorted by
//! distance. Links are indices into a node array owned by [`DijkstraMap`],
//! so a solve allocates nothing once the map has grown to the largest grid
//! it has seen. Relaxed cells are re-inserted by scanning forward from the
//! cell being expanded, which is where they almost always belong.

use std::cell::RefCell;

use log::{debug, trace, warn};
use umbra_core::{Grid, Point};

use crate::cost::{DIAGONAL_PENALTY, NO_PATH, OBSTRUCTION};
use crate::dir::Dir;

/// How the outermost ring of the cost grid is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgePolicy {
    /// Edge cells keep their own cost and may be seeded. Cells beyond the
    /// grid are never entered.
    #[default]
    Open,
    /// Edge cells are forced to [`OBSTRUCTION`] and seeds placed on them
    /// are ignored, fencing the solve inside the map.
    Obstruction,
}

/// Settings for a distance-field solve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceOptions {
    /// Allow diagonal steps.
    pub eight_ways: bool,
    /// Initial distance of every cell; cells no seed reaches keep it.
    pub max_distance: f64,
    pub edges: EdgePolicy,
}

impl Default for DistanceOptions {
    fn default() -> Self {
        Self {
            eight_ways: false,
            max_distance: NO_PATH,
            edges: EdgePolicy::Open,
        }
    }
}

impl DistanceOptions {
    /// Default options with the given connectivity.
    pub fn ways(eight_ways: bool) -> Self {
        Self {
            eight_ways,
            ..Self::default()
        }
    }
}

/// Index of the list sentinel in `links`; cell `i` lives at `i + 1`.
const FRONT: usize = 0;

#[derive(Debug, Clone, Copy)]
struct CostLink {
    cost: i32,
    distance: f64,
    left: Option<usize>,
    right: Option<usize>,
}

impl Default for CostLink {
    fn default() -> Self {
        Self {
            cost: 0,
            distance: NO_PATH,
            left: None,
            right: None,
        }
    }
}

/// Reusable working set of the distance-field solver.
///
/// A solve runs `clear` -> `set_distance` (once per seed) -> `update` ->
/// `batch_output`; [`calculate`](Self::calculate),
/// [`calculate_multi`](Self::calculate_multi) and [`rescan`](Self::rescan)
/// wrap the whole sequence.
#[derive(Debug, Clone)]
pub struct DijkstraMap {
    width: i32,
    height: i32,
    eight_ways: bool,
    edges: EdgePolicy,
    links: Vec<CostLink>,
}

impl Default for DijkstraMap {
    fn default() -> Self {
        Self::new()
    }
}

impl DijkstraMap {
    /// An empty map. It grows on first use.
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            eight_ways: false,
            edges: EdgePolicy::Open,
            links: vec![CostLink::default()],
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells the map can hold without growing.
    pub fn capacity(&self) -> usize {
        self.links.len() - 1
    }

    #[inline]
    fn has_xy(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    #[inline]
    fn link(&self, p: Point) -> usize {
        (p.y * self.width + p.x) as usize + 1
    }

    #[inline]
    fn point(&self, link: usize) -> Point {
        let i = (link - 1) as i32;
        Point::new(i % self.width, i / self.width)
    }

    /// Size the map for `width x height`, growing (never shrinking) the
    /// node array.
    fn reshape(&mut self, width: i32, height: i32) {
        let cells = (width.max(0) * height.max(0)) as usize;
        if cells > self.capacity() {
            debug!(
                "dijkstra: growing working set from {} to {cells} cells",
                self.capacity()
            );
            self.links.resize(cells + 1, CostLink::default());
        }
        self.width = width;
        self.height = height;
    }

    /// Copy `costs` into the map, resizing it to the cost grid.
    pub fn load_costs(&mut self, costs: &Grid<i32>, edges: EdgePolicy) {
        self.reshape(costs.width(), costs.height());
        self.edges = edges;
        for (p, c) in costs.iter() {
            let i = self.link(p);
            self.links[i].cost = match edges {
                EdgePolicy::Obstruction if costs.is_boundary_xy(p) => OBSTRUCTION,
                _ => c,
            };
        }
    }

    /// Reset every distance to `max_distance` and empty the pending list.
    pub fn clear(&mut self, max_distance: f64, eight_ways: bool) {
        self.eight_ways = eight_ways;
        let cells = (self.width * self.height) as usize;
        for link in &mut self.links[..=cells] {
            link.distance = max_distance;
            link.left = None;
            link.right = None;
        }
    }

    /// Lower the distance of `p` to `distance`, queueing it for relaxation.
    ///
    /// Returns `false` if `p` cannot be seeded (outside the grid, or on the
    /// edge under [`EdgePolicy::Obstruction`]). A distance that does not
    /// improve the current one is accepted and ignored.
    pub fn set_distance(&mut self, p: Point, distance: f64) -> bool {
        let seedable = match self.edges {
            EdgePolicy::Open => self.has_xy(p),
            EdgePolicy::Obstruction => {
                p.x > 0 && p.y > 0 && p.x < self.width - 1 && p.y < self.height - 1
            }
        };
        if !seedable {
            return false;
        }
        let i = self.link(p);
        if self.links[i].distance > distance {
            self.links[i].distance = distance;
            self.unlink(i);
            self.insert_sorted(FRONT, i);
        }
        true
    }

    /// The current distance at `p`, or [`NO_PATH`] outside the map.
    pub fn distance_at(&self, p: Point) -> f64 {
        if self.has_xy(p) {
            self.links[self.link(p)].distance
        } else {
            NO_PATH
        }
    }

    fn unlink(&mut self, i: usize) {
        let CostLink { left, right, .. } = self.links[i];
        if let Some(r) = right {
            self.links[r].left = left;
        }
        if let Some(l) = left {
            self.links[l].right = right;
        }
    }

    /// Insert `i` after `start`, past every node strictly closer than it.
    fn insert_sorted(&mut self, start: usize, i: usize) {
        let distance = self.links[i].distance;
        let mut left = start;
        let mut right = self.links[start].right;
        while let Some(r) = right {
            if self.links[r].distance >= distance {
                break;
            }
            left = r;
            right = self.links[r].right;
        }
        self.links[left].right = Some(i);
        self.links[i].left = Some(left);
        self.links[i].right = right;
        if let Some(r) = right {
            self.links[r].left = Some(i);
        }
    }

    /// Drain the pending list, relaxing neighbours until every reachable
    /// cell holds its final distance.
    pub fn update(&mut self) {
        let dirs = Dir::scan(self.eight_ways);
        let mut head = self.links[FRONT].right.take();
        let mut expanded = 0usize;

        while let Some(h) = head {
            let hp = self.point(h);
            let hd = self.links[h].distance;
            for &dir in dirs {
                let d = dir.delta();
                let np = hp + d;
                if !self.has_xy(np) {
                    continue;
                }
                let n = self.link(np);
                let cost = self.links[n].cost;
                if cost < 0 {
                    continue;
                }
                let mut step = cost as f64;
                if dir.is_diagonal() {
                    // Both cells the step cuts past are inside the grid
                    // whenever the target is.
                    let way1 = self.links[self.link(hp.shift(d.x, 0))].cost;
                    let way2 = self.links[self.link(hp.shift(0, d.y))].cost;
                    if way1 == OBSTRUCTION || way2 == OBSTRUCTION {
                        continue;
                    }
                    step += DIAGONAL_PENALTY;
                }
                let candidate = hd + step;
                if candidate < self.links[n].distance {
                    self.links[n].distance = candidate;
                    self.unlink(n);
                    self.insert_sorted(h, n);
                }
            }
            head = self.links[h].right;
            self.links[h].left = None;
            self.links[h].right = None;
            expanded += 1;
        }
        trace!(
            "dijkstra: expanded {expanded} cells on {}x{}",
            self.width, self.height
        );
    }

    /// Finish the solve and copy the distances into `out`.
    ///
    /// Only the region shared by `out` and the map is written.
    pub fn batch_output(&mut self, out: &mut Grid<f64>) {
        self.update();
        for p in out.bounds() {
            if self.has_xy(p) {
                out[p] = self.links[self.link(p)].distance;
            }
        }
    }

    /// Fill `distances` with the cost to reach `dest` from every cell.
    pub fn calculate(
        &mut self,
        distances: &mut Grid<f64>,
        dest: Point,
        costs: &Grid<i32>,
        opts: &DistanceOptions,
    ) {
        self.calculate_multi(distances, &[dest], costs, opts);
    }

    /// Fill `distances` with the cost to reach the nearest of `seeds`.
    ///
    /// `distances` is reshaped to the cost grid if the sizes differ.
    pub fn calculate_multi(
        &mut self,
        distances: &mut Grid<f64>,
        seeds: &[Point],
        costs: &Grid<i32>,
        opts: &DistanceOptions,
    ) {
        self.prepare(distances, costs, opts);
        for &seed in seeds {
            if !self.set_distance(seed, 0.0) {
                warn!("dijkstra: ignoring seed {seed} on {}x{} map", self.width, self.height);
            }
        }
        self.batch_output(distances);
    }

    /// Re-solve using the current contents of `distances` as seeds.
    ///
    /// Every cell below `opts.max_distance` keeps its value as a starting
    /// distance, so a field can be refreshed after costs change or after
    /// seeds were written into it by hand.
    pub fn rescan(&mut self, distances: &mut Grid<f64>, costs: &Grid<i32>, opts: &DistanceOptions) {
        if distances.size() != costs.size() {
            warn!(
                "dijkstra: rescan of a {}x{} field over {}x{} costs",
                distances.width(),
                distances.height(),
                costs.width(),
                costs.height()
            );
        }
        self.load_costs(costs, opts.edges);
        self.clear(opts.max_distance, opts.eight_ways);
        for (p, d) in distances.iter() {
            if d < opts.max_distance {
                self.set_distance(p, d);
            }
        }
        if distances.size() != costs.size() {
            distances.resize(costs.width(), costs.height(), opts.max_distance);
        }
        self.batch_output(distances);
    }

    fn prepare(&mut self, distances: &mut Grid<f64>, costs: &Grid<i32>, opts: &DistanceOptions) {
        if distances.size() != costs.size() {
            warn!(
                "dijkstra: reshaping {}x{} distance grid to {}x{} costs",
                distances.width(),
                distances.height(),
                costs.width(),
                costs.height()
            );
            distances.resize(costs.width(), costs.height(), opts.max_distance);
        }
        self.load_costs(costs, opts.edges);
        self.clear(opts.max_distance, opts.eight_ways);
    }
}

thread_local! {
    static DIJKSTRA: RefCell<DijkstraMap> = RefCell::new(DijkstraMap::new());
}

/// Run `f` with this thread's shared [`DijkstraMap`].
///
/// # Panics
///
/// Panics if called re-entrantly.
pub fn with_dijkstra<R>(f: impl FnOnce(&mut DijkstraMap) -> R) -> R {
    DIJKSTRA.with(|m| f(&mut m.borrow_mut()))
}

/// Fill `distances` with the cost of reaching `dest`, using this thread's
/// shared solver.
pub fn calculate_distances(
    distances: &mut Grid<f64>,
    dest: Point,
    costs: &Grid<i32>,
    eight_ways: bool,
) {
    with_dijkstra(|m| m.calculate(distances, dest, costs, &DistanceOptions::ways(eight_ways)));
}

/// Re-solve `distances` in place, seeding from its current values.
pub fn rescan(distances: &mut Grid<f64>, costs: &Grid<i32>, eight_ways: bool) {
    with_dijkstra(|m| m.rescan(distances, costs, &DistanceOptions::ways(eight_ways)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::FORBIDDEN;

    const EPS: f64 = 1e-9;

    fn open(w: i32, h: i32) -> Grid<i32> {
        Grid::new(w, h, 1)
    }

    fn solve(costs: &Grid<i32>, seeds: &[Point], eight_ways: bool) -> Grid<f64> {
        let mut out = Grid::new(costs.width(), costs.height(), 0.0);
        let mut map = DijkstraMap::new();
        map.calculate_multi(&mut out, seeds, costs, &DistanceOptions::ways(eight_ways));
        out
    }

    #[test]
    fn four_way_open_field_is_manhattan() {
        let costs = open(6, 5);
        let out = solve(&costs, &[Point::new(1, 1)], false);
        for (p, d) in out.iter() {
            let expected = ((p.x - 1).abs() + (p.y - 1).abs()) as f64;
            assert!((d - expected).abs() < EPS, "{p}: {d} != {expected}");
        }
    }

    #[test]
    fn eight_way_charges_diagonal_penalty() {
        let costs = open(5, 5);
        let out = solve(&costs, &[Point::new(0, 0)], true);
        assert!((out[Point::new(1, 1)] - 1.4142).abs() < EPS);
        assert!((out[Point::new(2, 1)] - 2.4142).abs() < EPS);
        assert!((out[Point::new(4, 4)] - 4.0 * 1.4142).abs() < EPS);
        assert_eq!(out[Point::new(0, 0)], 0.0);
    }

    #[test]
    fn entered_cell_cost_is_charged() {
        let mut costs = open(4, 1);
        costs[Point::new(2, 0)] = 5;
        let out = solve(&costs, &[Point::new(0, 0)], false);
        assert_eq!(out.as_slice(), &[0.0, 1.0, 6.0, 7.0]);
    }

    #[test]
    fn forbidden_cells_keep_no_path() {
        let mut costs = open(5, 1);
        costs[Point::new(2, 0)] = FORBIDDEN;
        let out = solve(&costs, &[Point::new(0, 0)], true);
        assert_eq!(out[Point::new(1, 0)], 1.0);
        assert_eq!(out[Point::new(2, 0)], NO_PATH);
        assert_eq!(out[Point::new(4, 0)], NO_PATH);
    }

    #[test]
    fn obstruction_blocks_corner_cutting() {
        let mut costs = open(3, 3);
        costs[Point::new(1, 0)] = OBSTRUCTION;
        costs[Point::new(0, 1)] = OBSTRUCTION;
        let out = solve(&costs, &[Point::new(0, 0)], true);
        assert_eq!(out[Point::new(1, 1)], NO_PATH);
        assert_eq!(out[Point::new(2, 2)], NO_PATH);
    }

    #[test]
    fn single_obstruction_also_blocks_corner() {
        let mut costs = open(3, 3);
        costs[Point::new(1, 0)] = OBSTRUCTION;
        let out = solve(&costs, &[Point::new(0, 0)], true);
        // Around the corner through (0,1) instead of cutting to (1,1).
        assert!((out[Point::new(1, 1)] - 2.0).abs() < EPS);
    }

    #[test]
    fn forbidden_does_not_block_corner() {
        let mut costs = open(3, 3);
        costs[Point::new(1, 0)] = FORBIDDEN;
        costs[Point::new(0, 1)] = FORBIDDEN;
        let out = solve(&costs, &[Point::new(0, 0)], true);
        assert!((out[Point::new(1, 1)] - 1.4142).abs() < EPS);
    }

    #[test]
    fn multi_seed_is_min_of_single_seeds() {
        let mut costs = open(9, 7);
        for y in 1..6 {
            costs[Point::new(4, y)] = FORBIDDEN;
        }
        costs[Point::new(6, 3)] = 4;
        let a = Point::new(1, 1);
        let b = Point::new(7, 5);
        for eight in [false, true] {
            let da = solve(&costs, &[a], eight);
            let db = solve(&costs, &[b], eight);
            let both = solve(&costs, &[a, b], eight);
            for p in costs.bounds() {
                let expected = da[p].min(db[p]);
                assert!((both[p] - expected).abs() < EPS, "{p}");
            }
        }
    }

    #[test]
    fn relaxation_edges_hold() {
        let mut costs = open(8, 8);
        costs[Point::new(3, 3)] = 3;
        costs[Point::new(4, 3)] = OBSTRUCTION;
        costs[Point::new(5, 5)] = FORBIDDEN;
        let out = solve(&costs, &[Point::new(6, 1)], true);
        for (u, du) in out.iter() {
            if du >= NO_PATH {
                continue;
            }
            assert!(du >= 0.0);
            for dir in Dir::ALL {
                let v = u + dir.delta();
                let Some(cv) = costs.get(v) else { continue };
                if cv < 0 {
                    continue;
                }
                let d = dir.delta();
                if dir.is_diagonal()
                    && (costs[u.shift(d.x, 0)] == OBSTRUCTION || costs[u.shift(0, d.y)] == OBSTRUCTION)
                {
                    continue;
                }
                let penalty = if dir.is_diagonal() { DIAGONAL_PENALTY } else { 0.0 };
                assert!(out[v] <= du + cv as f64 + penalty + EPS, "{u} -> {v}");
            }
        }
    }

    #[test]
    fn deterministic_across_reuse() {
        let mut costs = open(10, 10);
        costs.fill_rect(umbra_core::Range::new(3, 2, 4, 8), FORBIDDEN);
        let mut map = DijkstraMap::new();
        let opts = DistanceOptions::ways(true);
        let mut first = Grid::new(10, 10, 0.0);
        map.calculate(&mut first, Point::new(8, 8), &costs, &opts);
        let mut scratch = Grid::new(3, 3, 0.0);
        map.calculate(&mut scratch, Point::new(1, 1), &open(3, 3), &opts);
        let mut second = Grid::new(10, 10, 0.0);
        map.calculate(&mut second, Point::new(8, 8), &costs, &opts);
        assert_eq!(first, second);
        assert_eq!(map.capacity(), 100);
    }

    #[test]
    fn edge_obstruction_policy_fences_map() {
        let costs = open(5, 5);
        let opts = DistanceOptions {
            edges: EdgePolicy::Obstruction,
            ..DistanceOptions::ways(true)
        };
        let mut out = Grid::new(5, 5, 0.0);
        let mut map = DijkstraMap::new();
        map.calculate(&mut out, Point::new(2, 2), &costs, &opts);
        assert_eq!(out[Point::new(0, 0)], NO_PATH);
        assert_eq!(out[Point::new(4, 2)], NO_PATH);
        assert!((out[Point::new(1, 1)] - 1.4142).abs() < EPS);

        // Seeds on the edge are ignored.
        map.calculate(&mut out, Point::new(0, 2), &costs, &opts);
        assert!(out.iter().all(|(_, d)| d == NO_PATH));
    }

    #[test]
    fn max_distance_is_the_unreached_value() {
        let mut costs = open(4, 1);
        costs[Point::new(1, 0)] = FORBIDDEN;
        let opts = DistanceOptions {
            max_distance: 50.0,
            ..DistanceOptions::default()
        };
        let mut out = Grid::new(4, 1, 0.0);
        DijkstraMap::new().calculate(&mut out, Point::new(0, 0), &costs, &opts);
        assert_eq!(out.as_slice(), &[0.0, 50.0, 50.0, 50.0]);
    }

    #[test]
    fn mismatched_distance_grid_is_reshaped() {
        let costs = open(6, 4);
        let mut out = Grid::new(2, 2, 0.0);
        calculate_distances(&mut out, Point::new(0, 0), &costs, false);
        assert_eq!(out.size(), Point::new(6, 4));
        assert_eq!(out[Point::new(5, 3)], 8.0);
    }

    #[test]
    fn out_of_grid_seed_leaves_field_unreached() {
        let costs = open(4, 4);
        let mut out = Grid::new(4, 4, 0.0);
        calculate_distances(&mut out, Point::new(9, 9), &costs, true);
        assert!(out.iter().all(|(_, d)| d == NO_PATH));
    }

    #[test]
    fn rescan_propagates_hand_placed_seeds() {
        let costs = open(7, 1);
        let mut out = Grid::new(7, 1, NO_PATH);
        out[Point::new(0, 0)] = 0.0;
        out[Point::new(6, 0)] = 1.0;
        rescan(&mut out, &costs, false);
        assert_eq!(out.as_slice(), &[0.0, 1.0, 2.0, 3.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn rescan_after_opening_a_wall() {
        let mut costs = open(5, 1);
        costs[Point::new(2, 0)] = FORBIDDEN;
        let mut out = Grid::new(5, 1, 0.0);
        calculate_distances(&mut out, Point::new(0, 0), &costs, false);
        assert_eq!(out[Point::new(4, 0)], NO_PATH);

        costs[Point::new(2, 0)] = 1;
        rescan(&mut out, &costs, false);
        assert_eq!(out.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn set_distance_only_improves() {
        let costs = open(3, 1);
        let mut map = DijkstraMap::new();
        map.load_costs(&costs, EdgePolicy::Open);
        map.clear(NO_PATH, false);
        assert!(map.set_distance(Point::new(0, 0), 2.0));
        assert!(map.set_distance(Point::new(0, 0), 5.0));
        assert_eq!(map.distance_at(Point::new(0, 0)), 2.0);
        assert!(!map.set_distance(Point::new(3, 0), 0.0));
        map.update();
        assert_eq!(map.distance_at(Point::new(2, 0)), 4.0);
        assert_eq!(map.distance_at(Point::new(-1, 0)), NO_PATH);
    }
}
