//! Greedy descent over a solved distance field.

use umbra_core::{Grid, Point};

use crate::cost::is_reachable;
use crate::dir::Dir;

/// The step from `from` with the largest strict drop in distance.
///
/// `is_blocked(to, from)` vetoes individual moves. Ties keep the first
/// direction in [`Dir`] scan order. Returns `None` when no neighbour is
/// strictly closer.
pub fn next_step(
    distances: &Grid<f64>,
    from: Point,
    is_blocked: impl Fn(Point, Point) -> bool,
    use_diagonals: bool,
) -> Option<Dir> {
    let here = distances.get(from)?;
    let mut best_drop = 0.0;
    let mut best = None;
    for &dir in Dir::scan(use_diagonals) {
        let to = from + dir.delta();
        let Some(there) = distances.get(to) else {
            continue;
        };
        if is_blocked(to, from) {
            continue;
        }
        let drop = here - there;
        if drop > best_drop {
            best_drop = drop;
            best = Some(dir);
        }
    }
    best
}

/// Walk downhill from `origin` to the nearest seed, diagonals allowed.
///
/// An unreachable origin is first moved to [`closest_valid_location`]. The
/// returned path starts at that (possibly moved) origin and ends on a seed.
/// Returns `None` if no step could be taken.
pub fn get_path(
    distances: &Grid<f64>,
    origin: Point,
    is_blocked: impl Fn(Point, Point) -> bool,
) -> Option<Vec<Point>> {
    let mut p = origin;
    if !distances.get(p).is_some_and(is_reachable) {
        if let Some(snapped) = closest_valid_location(distances, p) {
            p = snapped;
        }
    }
    let mut path = vec![p];
    while let Some(dir) = next_step(distances, p, &is_blocked, true) {
        p = p + dir.delta();
        path.push(p);
    }
    if path.len() > 1 { Some(path) } else { None }
}

/// The reachable cell nearest to `p` (Euclidean), preferring the lower
/// distance value among equally near cells, then row-major order.
pub fn closest_valid_location(distances: &Grid<f64>, p: Point) -> Option<Point> {
    let mut best: Option<(i64, f64, Point)> = None;
    for (q, d) in distances.iter() {
        if !is_reachable(d) {
            continue;
        }
        let dist = q.dist_sq(p);
        let better = match best {
            None => true,
            Some((bd, bv, _)) => dist < bd || (dist == bd && d < bv),
        };
        if better {
            best = Some((dist, d, q));
        }
    }
    best.map(|(_, _, q)| q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{FORBIDDEN, NO_PATH};
    use crate::dijkstra::calculate_distances;

    fn never(_: Point, _: Point) -> bool {
        false
    }

    #[test]
    fn next_step_takes_largest_drop() {
        let mut d = Grid::new(3, 3, 5.0);
        d[Point::new(1, 1)] = 4.0;
        d[Point::new(1, 0)] = 3.0;
        d[Point::new(2, 0)] = 1.0;
        assert_eq!(next_step(&d, Point::new(1, 1), never, false), Some(Dir::Up));
        assert_eq!(next_step(&d, Point::new(1, 1), never, true), Some(Dir::UpRight));
    }

    #[test]
    fn next_step_ties_keep_scan_order() {
        let mut d = Grid::new(3, 3, 5.0);
        d[Point::new(1, 1)] = 4.0;
        d[Point::new(2, 1)] = 2.0;
        d[Point::new(1, 2)] = 2.0;
        d[Point::new(0, 1)] = 2.0;
        assert_eq!(next_step(&d, Point::new(1, 1), never, false), Some(Dir::Right));
    }

    #[test]
    fn next_step_needs_strict_drop() {
        let d = Grid::new(3, 3, 2.0);
        assert_eq!(next_step(&d, Point::new(1, 1), never, true), None);
        assert_eq!(next_step(&d, Point::new(5, 5), never, true), None);
    }

    #[test]
    fn next_step_respects_blocking() {
        let mut d = Grid::new(3, 1, 3.0);
        d[Point::new(0, 0)] = 0.0;
        d[Point::new(2, 0)] = 1.0;
        let blocked = |to: Point, _from: Point| to == Point::new(0, 0);
        assert_eq!(next_step(&d, Point::new(1, 0), blocked, false), Some(Dir::Right));
    }

    #[test]
    fn diagonal_path_on_open_grid() {
        let costs = Grid::new(5, 5, 1);
        let mut d = Grid::new(5, 5, 0.0);
        calculate_distances(&mut d, Point::new(4, 4), &costs, true);
        let path = get_path(&d, Point::new(0, 0), never).unwrap();
        assert_eq!(path.len() - 1, 4);
        assert_eq!(path[0], Point::new(0, 0));
        assert_eq!(*path.last().unwrap(), Point::new(4, 4));
        for w in path.windows(2) {
            assert_eq!(w[1] - w[0], Point::new(1, 1));
        }
    }

    #[test]
    fn path_from_seed_is_none() {
        let costs = Grid::new(4, 4, 1);
        let mut d = Grid::new(4, 4, 0.0);
        calculate_distances(&mut d, Point::new(2, 2), &costs, true);
        assert_eq!(get_path(&d, Point::new(2, 2), never), None);
    }

    #[test]
    fn sealed_origin_snaps_to_reachable_cell() {
        let mut costs = Grid::new(7, 7, 1);
        let sealed = Point::new(3, 3);
        for n in sealed.neighbors_4() {
            costs[n] = FORBIDDEN;
        }
        let mut d = Grid::new(7, 7, 0.0);
        calculate_distances(&mut d, Point::new(6, 6), &costs, false);
        assert_eq!(d[sealed], NO_PATH);

        let blocked = |to: Point, _: Point| costs[to] < 0;
        let path = get_path(&d, sealed, blocked).unwrap();
        assert_eq!(path[0], Point::new(4, 4));
        assert_eq!(*path.last().unwrap(), Point::new(6, 6));
    }

    #[test]
    fn fully_sealed_grid_has_no_path() {
        let costs = Grid::new(4, 4, FORBIDDEN);
        let mut d = Grid::new(4, 4, 0.0);
        calculate_distances(&mut d, Point::new(1, 1), &costs, true);
        // The seed itself is the only reachable cell.
        assert_eq!(closest_valid_location(&d, Point::new(3, 3)), Some(Point::new(1, 1)));
        assert_eq!(get_path(&d, Point::new(3, 3), never), None);

        let empty = Grid::new(4, 4, NO_PATH);
        assert_eq!(closest_valid_location(&empty, Point::new(0, 0)), None);
        assert_eq!(get_path(&empty, Point::new(0, 0), never), None);
    }

    #[test]
    fn closest_prefers_lower_value_on_ties() {
        let mut d = Grid::new(3, 3, NO_PATH);
        d[Point::new(1, 0)] = 7.0;
        d[Point::new(0, 1)] = 2.0;
        assert_eq!(closest_valid_location(&d, Point::new(1, 1)), Some(Point::new(0, 1)));
        d[Point::new(0, 1)] = 7.0;
        assert_eq!(closest_valid_location(&d, Point::new(1, 1)), Some(Point::new(1, 0)));
    }
}
