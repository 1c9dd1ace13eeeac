//! Pooled allocation of [`Grid`]s.
//!
//! Pathing and lighting ask for a scratch grid on every call, so grids are
//! recycled through an [`Arena`] instead of being dropped. An arena grows to
//! the high-water mark of grids in flight and never shrinks on its own.
//!
//! Two ways to use it:
//! - own an `Arena<T>` and pass it around explicitly;
//! - use the per-thread pools through [`with_arena`], [`alloc`] and [`free`].
//!
//! The per-thread pools make the arena safe to use from several threads
//! at once: each thread recycles only its own grids.

use std::cell::RefCell;

use log::debug;

use crate::error::GridError;
use crate::grid::Grid;

/// A free-list of previously used grids.
///
/// A grid handed out by [`alloc`](Arena::alloc) is owned by the caller, so
/// it cannot be in the free list at the same time; [`free`](Arena::free)
/// takes it back by value, which also makes double frees unrepresentable.
#[derive(Debug)]
pub struct Arena<T> {
    free: Vec<Grid<T>>,
    created: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub const fn new() -> Self {
        Self {
            free: Vec::new(),
            created: 0,
        }
    }

    /// Number of idle grids waiting for reuse.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Number of grids this arena has ever constructed.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Drop every idle grid.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

impl<T: Copy> Arena<T> {
    /// Hand out a `width x height` grid with every cell set to `fill`,
    /// reusing an idle grid when one is available.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or negative.
    pub fn alloc(&mut self, width: i32, height: i32, fill: T) -> Grid<T> {
        self.try_alloc(width, height, fill)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible version of [`Arena::alloc`].
    pub fn try_alloc(&mut self, width: i32, height: i32, fill: T) -> Result<Grid<T>, GridError> {
        match self.free.pop() {
            Some(mut grid) => match grid.try_resize(width, height, fill) {
                Ok(()) => Ok(grid),
                Err(e) => {
                    self.free.push(grid);
                    Err(e)
                }
            },
            None => {
                let grid = Grid::try_new(width, height, fill)?;
                self.created += 1;
                debug!("arena: constructed grid #{} ({width}x{height})", self.created);
                Ok(grid)
            }
        }
    }

    /// Return a grid to the pool. Its contents are left as they are.
    pub fn free(&mut self, grid: Grid<T>) {
        self.free.push(grid);
    }
}

/// Element types with a per-thread [`Arena`].
pub trait Pooled: Copy + 'static {
    /// Run `f` with this thread's arena for `Self`.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly for the same element type.
    fn with_pool<R>(f: impl FnOnce(&mut Arena<Self>) -> R) -> R;
}

macro_rules! pooled {
    ($($t:ty => $name:ident),* $(,)?) => {
        $(
            thread_local! {
                static $name: RefCell<Arena<$t>> = const { RefCell::new(Arena::new()) };
            }

            impl Pooled for $t {
                fn with_pool<R>(f: impl FnOnce(&mut Arena<Self>) -> R) -> R {
                    $name.with(|a| f(&mut a.borrow_mut()))
                }
            }
        )*
    };
}

pooled! {
    i32 => I32_ARENA,
    f64 => F64_ARENA,
    u8 => U8_ARENA,
    bool => BOOL_ARENA,
}

/// Scoped access to this thread's arena for `T`.
pub fn with_arena<T: Pooled, R>(f: impl FnOnce(&mut Arena<T>) -> R) -> R {
    T::with_pool(f)
}

/// Allocate from this thread's arena. See [`Arena::alloc`].
pub fn alloc<T: Pooled>(width: i32, height: i32, fill: T) -> Grid<T> {
    with_arena(|a| a.alloc(width, height, fill))
}

/// Return a grid to this thread's arena. See [`Arena::free`].
pub fn free<T: Pooled>(grid: Grid<T>) {
    with_arena(|a| a.free(grid))
}
