//! Spawnable patterns: a set of relative `(dx, dy)` offsets placed at an
//! anchor position.
//!
//! Patterns are either ad-hoc (offsets supplied by the caller) or one of the
//! named [`PRESETS`]. Offsets are signed so a pattern may extend above or to
//! the left of its anchor.

use serde::Serialize;

use crate::error::GridError;

/// Named preset patterns, offsets given as `(dx, dy)` from the anchor.
pub const PRESETS: &[(&str, &[(i64, i64)])] = &[
    ("block", &[(0, 0), (0, 1), (1, 0), (1, 1)]),
    ("beehive", &[(0, 1), (0, 2), (1, 0), (1, 3), (2, 1), (2, 2)]),
    ("blinker", &[(0, 0), (0, 1), (0, 2)]),
    ("toad", &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)]),
    (
        "beacon",
        &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    ),
    ("glider", &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]),
    (
        "lwss",
        &[
            (0, 1),
            (0, 4),
            (1, 0),
            (2, 0),
            (2, 4),
            (3, 0),
            (3, 1),
            (3, 2),
            (3, 3),
        ],
    ),
    ("r-pentomino", &[(0, 1), (0, 2), (1, 0), (1, 1), (2, 1)]),
    (
        "diehard",
        &[(0, 6), (1, 0), (1, 1), (2, 1), (2, 5), (2, 6), (2, 7)],
    ),
    (
        "acorn",
        &[(0, 1), (1, 3), (2, 0), (2, 1), (2, 4), (2, 5), (2, 6)],
    ),
];

/// A set of offsets to be placed relative to an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pattern {
    offsets: Vec<(i64, i64)>,
}

impl Pattern {
    /// Build an ad-hoc pattern from caller-supplied offsets.
    pub const fn new(offsets: Vec<(i64, i64)>) -> Self {
        Self { offsets }
    }

    /// Look up a preset by name.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UnknownPattern`] if no preset has that name.
    pub fn named(name: &str) -> Result<Self, GridError> {
        PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .map(|(_, offsets)| Self::new(offsets.to_vec()))
            .ok_or_else(|| GridError::UnknownPattern(name.to_owned()))
    }

    /// The relative offsets in declaration order.
    pub fn offsets(&self) -> &[(i64, i64)] {
        &self.offsets
    }

    /// Number of cells the pattern places.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the pattern places no cells.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Absolute coordinates of every cell when anchored at `(x, y)`.
    ///
    /// Offsets whose sum overflows `i64` are reported as `None` so the caller
    /// can reject them as out of bounds.
    pub fn absolute(&self, x: i64, y: i64) -> impl Iterator<Item = Option<(i64, i64)>> + '_ {
        self.offsets
            .iter()
            .map(move |&(dx, dy)| Some((x.checked_add(dx)?, y.checked_add(dy)?)))
    }
}
