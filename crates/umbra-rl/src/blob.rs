//! Cave-like blobs grown by cellular automata.
//!
//! A rectangle in the top-left corner of the grid is seeded with random live
//! cells and smoothed for a few generations with birth/survival rules. The
//! largest 4-connected group of live cells is the blob. Attempts repeat until
//! the blob's bounding box is big enough.

use log::debug;
use rand::Rng;
use umbra_core::{Grid, GridError, Range, alloc, free};

const MAX_ATTEMPTS: usize = 500;

/// Blob generation settings.
///
/// `birth` and `survival` are indexed by live-neighbour count (0 to 8): a
/// `'t'` at index `n` means a dead cell with `n` live neighbours comes alive
/// (`birth`) or a live cell with `n` live neighbours stays alive
/// (`survival`). Missing or other characters count as `'f'`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlobConfig {
    pub rounds: usize,
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    /// Chance, in percent, that a cell starts alive.
    pub percent_seeded: u32,
    pub birth: String,
    pub survival: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            rounds: 5,
            min_width: 10,
            min_height: 10,
            max_width: 40,
            max_height: 20,
            percent_seeded: 50,
            birth: "ffffffttt".into(),
            survival: "ffffttttt".into(),
        }
    }
}

/// A blob generator with parsed rules.
#[derive(Debug, Clone)]
pub struct Blob {
    config: BlobConfig,
    birth: [bool; 9],
    survival: [bool; 9],
}

impl Default for Blob {
    fn default() -> Self {
        Self::new(BlobConfig::default())
    }
}

impl Blob {
    pub fn new(config: BlobConfig) -> Self {
        Self {
            birth: rule_table(&config.birth),
            survival: rule_table(&config.survival),
            config,
        }
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// Grow a blob and write it into `grid`: blob cells become `1`, every
    /// other cell `0`. Returns the blob's bounding range.
    ///
    /// The blob always fits in `(0,0)-(max_width,max_height)`.
    ///
    /// # Errors
    ///
    /// [`GridError::BlobBounds`] if the size limits are empty, inverted or
    /// larger than `grid`; [`GridError::BlobNotFound`] if no attempt produced
    /// a large enough blob. `grid` is untouched on error.
    pub fn carve<R: Rng + ?Sized>(&self, rng: &mut R, grid: &mut Grid<u8>) -> Result<Range, GridError> {
        let c = &self.config;
        if c.min_width < 1
            || c.min_height < 1
            || c.min_width > c.max_width
            || c.min_height > c.max_height
            || c.max_width > grid.width()
            || c.max_height > grid.height()
        {
            return Err(GridError::BlobBounds {
                min_width: c.min_width,
                min_height: c.min_height,
                max_width: c.max_width,
                max_height: c.max_height,
                width: grid.width(),
                height: grid.height(),
            });
        }

        let mut cells = alloc(c.max_width, c.max_height, 0i32);
        let mut next = alloc(c.max_width, c.max_height, 0i32);
        let mut found = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(rng, &mut cells, &mut next) {
                Some((id, bounds)) if bounds.width() >= c.min_width && bounds.height() >= c.min_height => {
                    debug!("blob: attempt {attempt} kept {bounds}");
                    found = Some((id, bounds));
                    break;
                }
                Some((_, bounds)) => {
                    debug!("blob: attempt {attempt} too small ({}x{})", bounds.width(), bounds.height());
                }
                None => debug!("blob: attempt {attempt} died out"),
            }
        }

        let result = match found {
            Some((id, bounds)) => {
                grid.fill(0);
                for (p, v) in cells.iter() {
                    if v == id {
                        grid.set(p, 1);
                    }
                }
                Ok(bounds)
            }
            None => Err(GridError::BlobNotFound {
                attempts: MAX_ATTEMPTS,
            }),
        };
        free(cells);
        free(next);
        result
    }

    /// One seed-smooth-label pass. Returns the label and bounds of the
    /// largest group, if any cell survived.
    fn attempt<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        cells: &mut Grid<i32>,
        next: &mut Grid<i32>,
    ) -> Option<(i32, Range)> {
        for p in cells.bounds() {
            cells[p] = i32::from(rng.random_range(0..100) < self.config.percent_seeded);
        }

        for _ in 0..self.config.rounds {
            for p in cells.bounds() {
                let n = p
                    .neighbors_8()
                    .into_iter()
                    .filter(|&q| cells.get(q) == Some(1))
                    .count();
                let alive = if cells[p] == 1 {
                    self.survival[n]
                } else {
                    self.birth[n]
                };
                next[p] = i32::from(alive);
            }
            std::mem::swap(cells, next);
        }

        // Live cells are 1; groups get labels from 2 up.
        let mut best: Option<(i32, usize)> = None;
        let mut id = 2;
        for p in cells.bounds() {
            if cells[p] == 1 {
                let size = cells.flood_fill(p, 1, id);
                if best.is_none_or(|(_, s)| size > s) {
                    best = Some((id, size));
                }
                id += 1;
            }
        }
        best.map(|(id, _)| (id, cells.value_bounds(id)))
    }
}

fn rule_table(rule: &str) -> [bool; 9] {
    let mut table = [false; 9];
    for (slot, c) in table.iter_mut().zip(rule.bytes()) {
        *slot = c == b't';
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::Point;

    #[test]
    fn rule_strings() {
        assert_eq!(
            rule_table("ffffffttt"),
            [false, false, false, false, false, false, true, true, true]
        );
        assert_eq!(rule_table("tf"), [true, false, false, false, false, false, false, false, false]);
    }

    #[test]
    fn carve_default_blob() {
        let mut rng = rand::rng();
        let mut grid = Grid::new(50, 30, 7u8);
        let blob = Blob::new(BlobConfig {
            min_width: 5,
            min_height: 5,
            ..BlobConfig::default()
        });
        let bounds = blob.carve(&mut rng, &mut grid).unwrap();

        assert!(bounds.width() >= 5 && bounds.height() >= 5);
        assert!(bounds.max.x <= 40 && bounds.max.y <= 20);
        assert_eq!(grid.value_bounds(1), bounds);
        assert_eq!(grid.count(0) + grid.count(1), 50 * 30);

        // One connected piece.
        let live = grid.count(1);
        let start = grid.first_matching_loc(1).unwrap();
        assert_eq!(grid.flood_fill(start, 1, 2), live);
    }

    #[test]
    fn fully_seeded_without_rounds_fills_area() {
        let mut grid = Grid::new(12, 9, 0u8);
        let blob = Blob::new(BlobConfig {
            rounds: 0,
            min_width: 3,
            min_height: 3,
            max_width: 8,
            max_height: 6,
            percent_seeded: 100,
            ..BlobConfig::default()
        });
        let bounds = blob.carve(&mut rand::rng(), &mut grid).unwrap();
        assert_eq!(bounds, Range::new(0, 0, 8, 6));
        assert_eq!(grid.count(1), 48);
        assert_eq!(grid[Point::new(8, 0)], 0);
    }

    #[test]
    fn unseeded_blob_is_not_found() {
        let mut grid = Grid::new(10, 10, 5u8);
        let blob = Blob::new(BlobConfig {
            min_width: 2,
            min_height: 2,
            max_width: 6,
            max_height: 6,
            percent_seeded: 0,
            ..BlobConfig::default()
        });
        let err = blob.carve(&mut rand::rng(), &mut grid).unwrap_err();
        assert_eq!(err, GridError::BlobNotFound { attempts: MAX_ATTEMPTS });
        assert_eq!(grid.count(5), 100);
    }

    #[test]
    fn bad_bounds_are_rejected() {
        let mut grid = Grid::new(20, 10, 0u8);
        let err = Blob::default().carve(&mut rand::rng(), &mut grid).unwrap_err();
        assert!(matches!(err, GridError::BlobBounds { max_width: 40, width: 20, .. }));

        let inverted = Blob::new(BlobConfig {
            min_width: 8,
            max_width: 4,
            max_height: 10,
            ..BlobConfig::default()
        });
        assert!(inverted.carve(&mut rand::rng(), &mut grid).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_serde() {
        let cfg = BlobConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: BlobConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
