use umbra_core::Point;

/// A compass step between adjacent cells.
///
/// Declaration order is the fixed scan order used by the solver and the
/// path extractor: cardinals first, then diagonals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
    UpRight,
    DownRight,
    DownLeft,
    UpLeft,
}

impl Dir {
    pub const CARDINAL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];
    pub const ALL: [Dir; 8] = [
        Dir::Up,
        Dir::Right,
        Dir::Down,
        Dir::Left,
        Dir::UpRight,
        Dir::DownRight,
        Dir::DownLeft,
        Dir::UpLeft,
    ];

    /// The directions scanned for 4-way or 8-way movement.
    #[inline]
    pub fn scan(eight_ways: bool) -> &'static [Dir] {
        if eight_ways { &Self::ALL } else { &Self::CARDINAL }
    }

    /// Unit offset of this step.
    #[inline]
    pub const fn delta(self) -> Point {
        match self {
            Dir::Up => Point::new(0, -1),
            Dir::Right => Point::new(1, 0),
            Dir::Down => Point::new(0, 1),
            Dir::Left => Point::new(-1, 0),
            Dir::UpRight => Point::new(1, -1),
            Dir::DownRight => Point::new(1, 1),
            Dir::DownLeft => Point::new(-1, 1),
            Dir::UpLeft => Point::new(-1, -1),
        }
    }

    #[inline]
    pub const fn is_diagonal(self) -> bool {
        matches!(self, Dir::UpRight | Dir::DownRight | Dir::DownLeft | Dir::UpLeft)
    }

    /// The step with the given unit offset.
    pub fn from_delta(d: Point) -> Option<Dir> {
        Self::ALL.into_iter().find(|dir| dir.delta() == d)
    }
}
