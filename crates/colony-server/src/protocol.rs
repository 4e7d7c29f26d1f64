//! Wire format of the `WebSocket` session.
//!
//! Inbound text frames are JSON objects tagged by `type`:
//!
//! ```json
//! {"type": "flip", "x": 3, "y": 4, "color": "#ff0000"}
//! {"type": "spawn", "x": 10, "y": 10, "cells": [[0, 0], [0, 1], [0, 2]]}
//! {"type": "spawn", "x": 10, "y": 10, "pattern": "glider"}
//! ```
//!
//! `color` is optional on both; when absent the connection's default color
//! applies. Outbound snapshot frames are bare arrays of `[x, y, color]`
//! triples, and every other outbound frame is an object with a `type`, so
//! a client can tell them apart by shape.

use colony_grid::{Color, GridError, Pattern};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A message sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Toggle one cell.
    Flip {
        /// Row.
        x: i64,
        /// Column.
        y: i64,
        /// Color for a newly born cell.
        color: Option<String>,
    },
    /// Place a pattern at an anchor.
    Spawn {
        /// Anchor row.
        x: i64,
        /// Anchor column.
        y: i64,
        /// Ad-hoc `[dx, dy]` offsets.
        cells: Option<Vec<[i64; 2]>>,
        /// Name of a preset pattern.
        pattern: Option<String>,
        /// Color for every placed cell.
        color: Option<String>,
    },
}

/// A validated mutation ready for the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Toggle the cell at `(x, y)`.
    Flip {
        /// Row.
        x: i64,
        /// Column.
        y: i64,
        /// Resolved color.
        color: Option<Color>,
    },
    /// Place `pattern` anchored at `(x, y)`.
    Spawn {
        /// Anchor row.
        x: i64,
        /// Anchor column.
        y: i64,
        /// Resolved offsets.
        pattern: Pattern,
        /// Resolved color.
        color: Option<Color>,
    },
}

impl ClientMessage {
    /// Parse one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Malformed`] if the text is not a known message.
    pub fn parse(text: &str) -> Result<Self, ApiError> {
        serde_json::from_str(text).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    /// Validate the message and resolve its color against the connection
    /// default.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Invalid`] for a bad color, an unknown pattern or
    /// more than `max_cells` ad-hoc cells. Returns [`ApiError::Malformed`]
    /// when a spawn names both or neither of `cells` and `pattern`.
    pub fn into_command(
        self,
        default_color: Option<&Color>,
        max_cells: usize,
    ) -> Result<Command, ApiError> {
        match self {
            Self::Flip { x, y, color } => Ok(Command::Flip {
                x,
                y,
                color: resolve_color(color, default_color)?,
            }),
            Self::Spawn {
                x,
                y,
                cells,
                pattern,
                color,
            } => {
                let pattern = match (cells, pattern) {
                    (Some(cells), None) => {
                        if cells.len() > max_cells {
                            return Err(GridError::PatternTooLarge {
                                len: cells.len(),
                                max: max_cells,
                            }
                            .into());
                        }
                        Pattern::new(cells.into_iter().map(|[dx, dy]| (dx, dy)).collect())
                    }
                    (None, Some(name)) => Pattern::named(&name)?,
                    (Some(_), Some(_)) => {
                        return Err(ApiError::Malformed(
                            "spawn takes either `cells` or `pattern`, not both".to_owned(),
                        ));
                    }
                    (None, None) => {
                        return Err(ApiError::Malformed(
                            "spawn needs `cells` or `pattern`".to_owned(),
                        ));
                    }
                };
                Ok(Command::Spawn {
                    x,
                    y,
                    pattern,
                    color: resolve_color(color, default_color)?,
                })
            }
        }
    }
}

fn resolve_color(
    explicit: Option<String>,
    default_color: Option<&Color>,
) -> Result<Option<Color>, ApiError> {
    match explicit {
        Some(tag) => Ok(Some(Color::new(tag)?)),
        None => Ok(default_color.cloned()),
    }
}

/// A non-snapshot frame sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// The last inbound message was rejected.
    Error {
        /// Why it was rejected.
        message: String,
    },
    /// Something about the connection is degraded but it stays open.
    Warning {
        /// What happened.
        message: String,
    },
}

impl ServerFrame {
    /// Encode as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
