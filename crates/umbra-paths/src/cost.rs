//! Traversal costs and distance sentinels.
//!
//! Cost grids are plain `Grid<i32>` so terrain code can fill them with
//! arithmetic; [`Cost`] names the three classes a cell value falls into.

/// Cell that cannot be entered at all.
pub const FORBIDDEN: i32 = -1;
/// Cell that cannot be entered, and that also stops diagonal moves from
/// cutting the corner next to it.
pub const OBSTRUCTION: i32 = -2;
/// A passable but discouraged cost, e.g. for harmful terrain.
pub const AVOIDED: i32 = 10;
/// Distance of a cell no seed reached.
pub const NO_PATH: f64 = 30000.0;
/// Extra cost of a diagonal step (about `sqrt(2) - 1`).
pub const DIAGONAL_PENALTY: f64 = 0.4142;

/// The class of a cost cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cost {
    /// Ordinary terrain, adding this much to the distance when entered.
    Passable(u32),
    Forbidden,
    Obstruction,
}

impl Cost {
    /// Classify a raw cost value. Negative values other than
    /// [`OBSTRUCTION`] are forbidden.
    pub const fn from_value(v: i32) -> Self {
        match v {
            OBSTRUCTION => Self::Obstruction,
            v if v < 0 => Self::Forbidden,
            v => Self::Passable(v as u32),
        }
    }

    /// The raw value stored in a cost grid.
    pub const fn value(self) -> i32 {
        match self {
            Self::Passable(c) => c as i32,
            Self::Forbidden => FORBIDDEN,
            Self::Obstruction => OBSTRUCTION,
        }
    }

    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Passable(_))
    }
}

impl From<Cost> for i32 {
    fn from(c: Cost) -> Self {
        c.value()
    }
}

impl From<i32> for Cost {
    fn from(v: i32) -> Self {
        Self::from_value(v)
    }
}

/// Whether a distance value was reached by a solve.
#[inline]
pub fn is_reachable(distance: f64) -> bool {
    (0.0..NO_PATH).contains(&distance)
}
