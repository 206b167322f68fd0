//! # Gantry control module
//!
//! Drives the gantry's head around the work area. Operator commands are
//! validated and broken down into a queue of timed tasks, which are executed
//! one per cycle by setting actuator velocities and limits. Nothing here
//! waits on the hardware: each task computes how long its motion takes and
//! the queue counts that time down across cycles.
//!
//! The controller also owns the reachability map of the area, the height map
//! built by the height scan, and the safety lock which gates every motion.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod kinematics;
mod motion;
mod params;
mod safety;
mod scan;
mod state;
mod tasks;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use kinematics::GridPosition;
pub use motion::*;
pub use params::*;
pub use safety::*;
pub use scan::*;
pub use state::*;
pub use tasks::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during GantryCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum GantryCtrlError {
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error(
        "Expected {expected} {group} actuators at the {corner} corner but found {found}"
    )]
    ActuatorCount {
        corner: comms_if::eqpt::Corner,
        group: ActuatorGroup,
        expected: usize,
        found: usize,
    },

    #[error("No grid point is reachable by the gantry")]
    NoReachableStart,

    #[error("Target position {0} is not reachable")]
    Unreachable(GridPosition),

    #[error("Move time must be a positive number of seconds, got {0}")]
    InvalidMoveTime(f64),

    #[error("Safety lock is enabled")]
    SafetyLocked,

    #[error("A height scan is in progress")]
    ScanInProgress,

    #[error("Actuators need initialisation")]
    NeedsInit,
}
