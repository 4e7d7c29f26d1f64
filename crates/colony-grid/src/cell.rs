//! Cell-level value types: colors, slots, positions and persisted records.
//!
//! A grid slot is modelled as the sum type [`Slot`] rather than a nullable
//! cell, so every read site has to handle the empty case explicitly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GridError;

/// Opaque color tag attached to a living cell, usually a hex color such as
/// `#ff0000`. The grid never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Maximum accepted tag length in bytes.
    pub const MAX_LEN: usize = 32;

    /// Validate and wrap a color tag.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidColor`] if the tag is empty, longer than
    /// [`Color::MAX_LEN`], or contains control characters.
    pub fn new(tag: impl Into<String>) -> Result<Self, GridError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(GridError::InvalidColor {
                reason: "tag is empty".to_owned(),
            });
        }
        if tag.len() > Self::MAX_LEN {
            return Err(GridError::InvalidColor {
                reason: format!("tag exceeds {} bytes", Self::MAX_LEN),
            });
        }
        if tag.chars().any(char::is_control) {
            return Err(GridError::InvalidColor {
                reason: "tag contains control characters".to_owned(),
            });
        }
        Ok(Self(tag))
    }

    /// Borrow the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Color {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Self::new(tag).map_err(serde::de::Error::custom)
    }
}

/// State of a single grid position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Slot {
    /// No living cell.
    #[default]
    Empty,
    /// A living cell, optionally tagged with a color.
    Alive(Option<Color>),
}

impl Slot {
    /// Whether the slot holds a living cell.
    pub const fn is_alive(&self) -> bool {
        matches!(self, Self::Alive(_))
    }

    /// The color of the living cell, if any.
    pub const fn color(&self) -> Option<&Color> {
        match self {
            Self::Alive(Some(color)) => Some(color),
            Self::Alive(None) | Self::Empty => None,
        }
    }
}

/// A validated in-bounds position. Obtain one from [`Grid::locate`].
///
/// [`Grid::locate`]: crate::Grid::locate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Row index.
    pub x: usize,
    /// Column index.
    pub y: usize,
}

/// A living cell as it appears in a snapshot.
///
/// Serializes as the three-element array `[x, y, color]`, with `null` for a
/// cell that carries no color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveCell {
    /// Row index.
    pub x: usize,
    /// Column index.
    pub y: usize,
    /// Color tag, if any.
    pub color: Option<Color>,
}

impl Serialize for LiveCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.x, self.y, &self.color).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LiveCell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (x, y, color) = <(usize, usize, Option<Color>)>::deserialize(deserializer)?;
        Ok(Self { x, y, color })
    }
}

/// The last known state of one position, in the shape the storage layer
/// keeps it: `(x, y, state, color)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Row index.
    pub x: usize,
    /// Column index.
    pub y: usize,
    /// Whether the position holds a living cell.
    pub alive: bool,
    /// Color of the living cell. Always `None` when `alive` is false.
    pub color: Option<Color>,
}

impl CellRecord {
    /// Build a record describing `slot` at `pos`.
    pub fn from_slot(pos: Position, slot: &Slot) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            alive: slot.is_alive(),
            color: slot.color().cloned(),
        }
    }

    /// Convert the record back into a slot.
    pub fn to_slot(&self) -> Slot {
        if self.alive {
            Slot::Alive(self.color.clone())
        } else {
            Slot::Empty
        }
    }
}
