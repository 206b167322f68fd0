//! # Communications interface crate.
//!
//! Provides the interfaces shared between the gantry controller, its
//! operators and its equipment.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator telecommands and their responses
pub mod tc;

/// Identifiers and capability traits for gantry equipment (actuators, joints, sensors, sinks)
pub mod eqpt;
