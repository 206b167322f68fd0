//! # Gantry Equipment Identifiers

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of corner assemblies holding the head.
pub const NUM_CORNERS: usize = 4;

/// Number of sensors on the head, one per side.
pub const NUM_SIDES: usize = 4;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A corner assembly of the gantry.
///
/// Each corner owns a chain of horizontal actuators pulling the head towards
/// the corner's anchor, and a stack of vertical actuators setting the height
/// of that corner's attachment point.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// A side of the head, identifying one of the downward-facing scan sensors.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Colour-coded status of the gantry for indicator lights.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum StatusLight {
    /// The safety lock is engaged (red)
    Locked,

    /// A task is being executed (yellow)
    Moving,

    /// Unlocked and waiting for commands (green)
    Idle,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Corner {
    /// All corners, in the order used to index per-corner arrays.
    pub const ALL: [Corner; NUM_CORNERS] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Index of this corner into per-corner arrays.
    pub fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomLeft => 2,
            Corner::BottomRight => 3,
        }
    }

    /// True if the corner is on the left (low x) edge of the area.
    pub fn is_left(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }

    /// True if the corner is on the top (low y) edge of the area.
    pub fn is_top(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }

    /// Short tag used in device names, e.g. `TL`.
    pub fn tag(self) -> &'static str {
        match self {
            Corner::TopLeft => "TL",
            Corner::TopRight => "TR",
            Corner::BottomLeft => "BL",
            Corner::BottomRight => "BR",
        }
    }
}

impl Side {
    /// All sides, in the order used to index per-side arrays.
    pub const ALL: [Side; NUM_SIDES] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    /// Index of this side into per-side arrays.
    pub fn index(self) -> usize {
        match self {
            Side::Top => 0,
            Side::Bottom => 1,
            Side::Left => 2,
            Side::Right => 3,
        }
    }

    /// Grid offset `(dx, dy)` of the cell this side's sensor looks down on.
    pub fn cell_offset(self) -> (i64, i64) {
        match self {
            Side::Top => (0, -1),
            Side::Bottom => (0, 1),
            Side::Left => (-1, 0),
            Side::Right => (1, 0),
        }
    }

    /// Short tag used in device names, e.g. `T`.
    pub fn tag(self) -> &'static str {
        match self {
            Side::Top => "T",
            Side::Bottom => "B",
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl fmt::Display for StatusLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLight::Locked => write!(f, "LOCKED"),
            StatusLight::Moving => write!(f, "MOVING"),
            StatusLight::Idle => write!(f, "IDLE"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_indices_match_tables() {
        for (i, c) in Corner::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
        for (i, s) in Side::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }

    #[test]
    fn test_side_offsets() {
        let sum = Side::ALL
            .iter()
            .fold((0, 0), |acc, s| (acc.0 + s.cell_offset().0, acc.1 + s.cell_offset().1));
        assert_eq!(sum, (0, 0));
        assert_eq!(Side::Right.cell_offset(), (1, 0));
        assert_eq!(Side::Top.cell_offset(), (0, -1));
    }
}
