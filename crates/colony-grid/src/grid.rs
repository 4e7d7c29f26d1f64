//! The bounded square grid and its generation transition.
//!
//! Slots are stored row-major in a single `Vec` of length `size * size`.
//! The grid has hard edges: positions outside `0..size` do not exist, are
//! never wrapped, and are never counted as neighbors.
//!
//! # Transition
//!
//! [`Grid::step`] reads only `self` and builds a fresh generation, so there
//! is no aliasing between the generation being read and the one being
//! written. For each position:
//!
//! - a live cell with 2 or 3 live neighbors survives with its own color;
//! - a dead cell with exactly 3 live neighbors is born, taking the color of
//!   one of those neighbors chosen uniformly at random (an uncolored
//!   neighbor is a valid pick and yields an uncolored cell);
//! - every other position is empty in the next generation.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::cell::{CellRecord, Color, LiveCell, Position, Slot};
use crate::error::GridError;
use crate::pattern::Pattern;

/// Moore neighborhood in scan order: `dx` outer, `dy` inner, skipping the
/// center.
const NEIGHBORHOOD: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// An N×N grid of [`Slot`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    slots: Vec<Slot>,
}

impl Grid {
    /// Create an empty grid with side length `size`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ZeroSize`] if `size` is 0 and
    /// [`GridError::TooLarge`] if `size * size` overflows.
    pub fn new(size: usize) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::ZeroSize);
        }
        let len = size.checked_mul(size).ok_or(GridError::TooLarge(size))?;
        Ok(Self {
            size,
            slots: vec![Slot::Empty; len],
        })
    }

    /// Build a grid from persisted records.
    ///
    /// Records that fall outside the grid (for example after the configured
    /// size shrank between runs) are returned in the second tuple element
    /// instead of being applied. Dead records are applied as empty slots.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Grid::new`].
    pub fn from_records(
        size: usize,
        records: impl IntoIterator<Item = CellRecord>,
    ) -> Result<(Self, Vec<CellRecord>), GridError> {
        let mut grid = Self::new(size)?;
        let mut skipped = Vec::new();
        for record in records {
            let pos = Position {
                x: record.x,
                y: record.y,
            };
            match grid.slot_mut(pos) {
                Some(slot) => *slot = record.to_slot(),
                None => skipped.push(record),
            }
        }
        Ok((grid, skipped))
    }

    /// Side length of the grid.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Validate an external coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] if either coordinate is negative
    /// or not less than the grid size.
    pub fn locate(&self, x: i64, y: i64) -> Result<Position, GridError> {
        let row = usize::try_from(x).ok().filter(|row| *row < self.size);
        let col = usize::try_from(y).ok().filter(|col| *col < self.size);
        match (row, col) {
            (Some(x), Some(y)) => Ok(Position { x, y }),
            _ => Err(GridError::OutOfBounds {
                x,
                y,
                size: self.size,
            }),
        }
    }

    /// The slot at `pos`, or `None` if `pos` is outside the grid.
    pub fn get(&self, pos: Position) -> Option<&Slot> {
        self.index(pos).and_then(|i| self.slots.get(i))
    }

    /// Toggle the cell at `(x, y)`.
    ///
    /// A dead position becomes alive with `color`; a live one dies and its
    /// color is discarded. Returns the new state of the position.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfBounds`] without touching the grid if the
    /// coordinate is invalid.
    pub fn flip(&mut self, x: i64, y: i64, color: Option<Color>) -> Result<CellRecord, GridError> {
        let size = self.size;
        let pos = self.locate(x, y)?;
        let slot = self
            .slot_mut(pos)
            .ok_or(GridError::OutOfBounds { x, y, size })?;
        let next = if slot.is_alive() {
            Slot::Empty
        } else {
            Slot::Alive(color)
        };
        *slot = next;
        Ok(CellRecord::from_slot(pos, slot))
    }

    /// Place `pattern` anchored at `(x, y)`, overwriting whatever was there.
    ///
    /// Every target position is validated before any slot is written, so
    /// the call is all-or-nothing. Returns one record per placed cell.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::PatternTooLarge`] if the pattern lists more
    /// cells than the grid has, and [`GridError::OutOfBounds`] for the first
    /// offending position. The grid is left untouched in both cases.
    pub fn spawn(
        &mut self,
        x: i64,
        y: i64,
        pattern: &Pattern,
        color: Option<&Color>,
    ) -> Result<Vec<CellRecord>, GridError> {
        if pattern.len() > self.slots.len() {
            return Err(GridError::PatternTooLarge {
                len: pattern.len(),
                max: self.slots.len(),
            });
        }
        let mut targets = Vec::with_capacity(pattern.len());
        for (placed, &(dx, dy)) in pattern.absolute(x, y).zip(pattern.offsets()) {
            let pos = match placed {
                Some((px, py)) => self.locate(px, py)?,
                None => {
                    return Err(GridError::OutOfBounds {
                        x: x.saturating_add(dx),
                        y: y.saturating_add(dy),
                        size: self.size,
                    });
                }
            };
            targets.push(pos);
        }

        let mut records = Vec::with_capacity(targets.len());
        for pos in targets {
            if let Some(slot) = self.slot_mut(pos) {
                *slot = Slot::Alive(color.cloned());
                records.push(CellRecord::from_slot(pos, slot));
            }
        }
        Ok(records)
    }

    /// Number of living cells.
    pub fn population(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_alive()).count()
    }

    /// Every living cell in row-major order.
    pub fn live_cells(&self) -> Vec<LiveCell> {
        let mut cells = Vec::new();
        for (x, row) in self.slots.chunks_exact(self.size).enumerate() {
            for (y, slot) in row.iter().enumerate() {
                if let Slot::Alive(color) = slot {
                    cells.push(LiveCell {
                        x,
                        y,
                        color: color.clone(),
                    });
                }
            }
        }
        cells
    }

    /// Compute the next generation.
    ///
    /// `rng` is only consulted for births, to pick the inherited color.
    pub fn step<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut slots = Vec::with_capacity(self.slots.len());
        let mut colors: Vec<Option<&Color>> = Vec::with_capacity(NEIGHBORHOOD.len());

        for (x, row) in self.slots.chunks_exact(self.size).enumerate() {
            for (y, slot) in row.iter().enumerate() {
                colors.clear();
                colors.extend(
                    NEIGHBORHOOD
                        .iter()
                        .filter_map(|&(dx, dy)| match self.neighbor(x, y, dx, dy) {
                            Some(Slot::Alive(color)) => Some(color.as_ref()),
                            Some(Slot::Empty) | None => None,
                        }),
                );
                slots.push(next_state(slot, &colors, rng));
            }
        }

        debug_assert_eq!(
            slots.len(),
            self.slots.len(),
            "transition must preserve the grid shape"
        );

        Self {
            size: self.size,
            slots,
        }
    }

    fn neighbor(&self, x: usize, y: usize, dx: isize, dy: isize) -> Option<&Slot> {
        let pos = Position {
            x: x.checked_add_signed(dx)?,
            y: y.checked_add_signed(dy)?,
        };
        self.get(pos)
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x >= self.size || pos.y >= self.size {
            return None;
        }
        pos.x.checked_mul(self.size)?.checked_add(pos.y)
    }

    fn slot_mut(&mut self, pos: Position) -> Option<&mut Slot> {
        let i = self.index(pos)?;
        self.slots.get_mut(i)
    }
}

fn next_state<R: Rng + ?Sized>(
    current: &Slot,
    neighbor_colors: &[Option<&Color>],
    rng: &mut R,
) -> Slot {
    match (current, neighbor_colors.len()) {
        (Slot::Alive(color), 2 | 3) => Slot::Alive(color.clone()),
        (Slot::Empty, 3) => {
            let inherited = neighbor_colors.choose(rng).copied().flatten();
            Slot::Alive(inherited.cloned())
        }
        _ => Slot::Empty,
    }
}
