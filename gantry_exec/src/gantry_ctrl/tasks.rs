//! Tasks executed by GantryCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::fmt;

use comms_if::eqpt::Corner;

use super::GridPosition;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A unit of work in the controller's task queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Drive every actuator of one group at one corner to the group's mean
    /// extension.
    EqualizeGroup {
        corner: Corner,
        group: ActuatorGroup,
        time_s: f64,
    },

    /// Drive the actuators to the extensions of a waypoint.
    ///
    /// Fails if the waypoint is unreachable or the safety lock is enabled.
    MoveWaypoint { target: GridPosition, time_s: f64 },

    /// Commit the head's logical position at the end of a move. Takes no
    /// time.
    CommitPosition {
        target: GridPosition,
        on_finish: OnFinish,
    },
}

/// What to do once a position has been committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OnFinish {
    Nothing,

    /// Start a sensor sweep at the new position, as part of a height scan.
    StartSensorSweep,

    /// Re-enable the safety lock and check the result of initialisation.
    CompleteInit,
}

/// The two actuator groups at each corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActuatorGroup {
    Horizontal,
    Vertical,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl fmt::Display for ActuatorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorGroup::Horizontal => write!(f, "horizontal"),
            ActuatorGroup::Vertical => write!(f, "vertical"),
        }
    }
}
