//! Error types for the `colony-grid` crate.
//!
//! All fallible grid operations return [`GridError`]. Every variant is a
//! validation failure: the grid is never modified when one is returned.

/// Errors that can occur during grid construction and mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// A grid must have at least one row and one column.
    #[error("grid size must be at least 1")]
    ZeroSize,

    /// The requested side length does not fit in memory addressing.
    #[error("grid size {0} is too large")]
    TooLarge(usize),

    /// A coordinate fell outside `0..size` on either axis.
    #[error("coordinate ({x}, {y}) is outside the {size}x{size} grid")]
    OutOfBounds {
        /// Requested row.
        x: i64,
        /// Requested column.
        y: i64,
        /// Side length of the grid.
        size: usize,
    },

    /// A color tag was empty, too long, or contained control characters.
    #[error("invalid color tag: {reason}")]
    InvalidColor {
        /// What is wrong with the tag.
        reason: String,
    },

    /// A pattern listed more cells than the grid or caller allows.
    #[error("pattern has {len} cells, at most {max} allowed")]
    PatternTooLarge {
        /// Cells in the rejected pattern.
        len: usize,
        /// Largest accepted pattern.
        max: usize,
    },

    /// No preset pattern exists under the requested name.
    #[error("unknown pattern: {0}")]
    UnknownPattern(String),
}
