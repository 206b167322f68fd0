//! # Device Capability Traits
//!
//! Each trait covers what the controller needs from one class of device.
//! Units are meters and meters/second for linear actuators, degrees and
//! revolutions/minute for rotational joints, and grid height units for
//! sensor ranges.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::StatusLight;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A linear actuator (piston) which moves at a commanded velocity between a
/// minimum and maximum travel limit.
pub trait LinearActuator {
    /// Current extension of the actuator.
    ///
    /// Units: meters
    fn current_position(&self) -> f64;

    /// Set the travel limit window. The actuator stops when it reaches either
    /// limit.
    ///
    /// Units: meters
    fn set_limits(&mut self, min_m: f64, max_m: f64);

    /// Set the signed velocity of the actuator.
    ///
    /// Units: meters/second
    fn set_velocity(&mut self, velocity_ms: f64);

    /// Enable or disable the actuator.
    fn set_enabled(&mut self, enabled: bool);
}

/// A rotational joint (hinge).
pub trait RotationalJoint {
    /// Units: revolutions/minute
    fn set_target_velocity(&mut self, velocity_rpm: f64);

    /// Units: degrees
    fn set_limits(&mut self, lower_deg: f64, upper_deg: f64);

    fn set_enabled(&mut self, enabled: bool);
}

/// A proximity sensor which detects objects within a range along its
/// sensing axis.
pub trait ProximitySensor {
    /// Set the detection range along the sensing axis.
    fn set_range(&mut self, range: f64);

    fn set_enabled(&mut self, enabled: bool);

    /// Set which classes of object the sensor reacts to.
    fn set_detection_filter(&mut self, filter: DetectionFilter);

    /// True if an object is currently detected within range.
    fn is_active(&self) -> bool;
}

/// Write-only line oriented text output, such as a display panel.
pub trait TextSink {
    /// Replace the sink's contents with the given lines.
    fn write_lines(&mut self, lines: &[String]);
}

/// Write-only status indicator, such as a group of lights.
pub trait StatusIndicator {
    fn set_status(&mut self, status: StatusLight);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Classes of object a proximity sensor will react to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionFilter {
    pub static_structures: bool,
    pub large_vehicles: bool,
    pub small_vehicles: bool,
    pub subassemblies: bool,
    pub loose_objects: bool,
    pub natural_terrain: bool,
    pub personnel: bool,
}

impl DetectionFilter {
    /// Filter used when scanning the work area: anything built, ignoring
    /// people, loose objects and the natural ground.
    pub fn height_scan() -> Self {
        Self {
            static_structures: true,
            large_vehicles: true,
            small_vehicles: true,
            subassemblies: true,
            loose_objects: false,
            natural_terrain: false,
            personnel: false,
        }
    }
}
