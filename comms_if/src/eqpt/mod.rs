//! # Equipment Interface
//!
//! This module defines how the gantry controller identifies and talks to its
//! equipment. The controller never owns a concrete device type, it only
//! relies on the capability traits in [`device`], so real hardware bindings
//! and simulated equipment are interchangeable.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod device;
pub mod gantry;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use device::*;
pub use gantry::*;
