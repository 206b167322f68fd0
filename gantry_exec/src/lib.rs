//! # Gantry library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the gantry crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable
pub mod data_store;

/// Gantry equipment - the devices making up the gantry and how they are bound
pub mod eqpt;

/// Gantry control module - turns operator commands into timed actuator motions
pub mod gantry_ctrl;

/// Reachability and height maps of the work area
pub mod map;

/// Simulated devices and terrain
pub mod sim;

/// Generic queue of timed tasks
pub mod task_queue;

/// Telemetry snapshot and operator views
pub mod tm;
