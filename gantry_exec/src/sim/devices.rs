//! Simulated devices

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info};
use std::collections::HashMap;

use comms_if::eqpt::{
    Corner, DetectionFilter, LinearActuator, ProximitySensor, RotationalJoint, Side,
    StatusIndicator, StatusLight, TextSink,
};

use crate::eqpt::DeviceDirectory;
use crate::gantry_ctrl::{kinematics, GridPosition, Params};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A linear actuator which moves at its commanded velocity and stops at its
/// limits.
#[derive(Debug, Clone)]
pub struct SimActuator {
    /// Units: meters
    pub position_m: f64,

    /// Units: meters/second
    pub velocity_ms: f64,

    pub limits_m: (f64, f64),

    pub enabled: bool,
}

/// A proximity sensor looking straight down.
#[derive(Debug, Clone)]
pub struct SimSensor {
    pub range: f64,

    pub enabled: bool,

    pub filter: Option<DetectionFilter>,

    /// Distance from the sensor down to whatever is below it, infinite if
    /// there is nothing.
    ///
    /// Units: height units
    pub distance: f64,
}

/// A joint which just holds its settings.
#[derive(Debug, Clone, Default)]
pub struct SimJoint {
    pub velocity_rpm: f64,
    pub limits_deg: (f64, f64),
    pub enabled: bool,
}

/// Named simulated devices, from which the gantry's equipment is bound.
#[derive(Debug, Default)]
pub struct SimDirectory {
    pub actuators: HashMap<String, SimActuator>,
    pub sensors: HashMap<String, SimSensor>,
    pub joints: HashMap<String, SimJoint>,
}

/// A text panel which keeps the last lines written to it.
#[derive(Debug, Default)]
pub struct SimTextPanel {
    pub name: String,
    pub lines: Vec<String>,
}

/// Status lights which log whenever their colour changes.
#[derive(Debug, Default)]
pub struct SimStatusLights {
    pub status: Option<StatusLight>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimActuator {
    pub fn new(position_m: f64) -> Self {
        Self {
            position_m,
            velocity_ms: 0.0,
            limits_m: (f64::NEG_INFINITY, f64::INFINITY),
            enabled: true,
        }
    }

    /// Move the actuator over `elapsed_s`.
    pub fn advance(&mut self, elapsed_s: f64) {
        if !self.enabled {
            return;
        }

        self.position_m = (self.position_m + self.velocity_ms * elapsed_s)
            .max(self.limits_m.0)
            .min(self.limits_m.1);
    }
}

impl LinearActuator for SimActuator {
    fn current_position(&self) -> f64 {
        self.position_m
    }

    fn set_limits(&mut self, min_m: f64, max_m: f64) {
        self.limits_m = (min_m, max_m);
    }

    fn set_velocity(&mut self, velocity_ms: f64) {
        self.velocity_ms = velocity_ms;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl Default for SimSensor {
    fn default() -> Self {
        Self {
            range: 0.0,
            enabled: false,
            filter: None,
            distance: f64::INFINITY,
        }
    }
}

impl ProximitySensor for SimSensor {
    fn set_range(&mut self, range: f64) {
        self.range = range;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_detection_filter(&mut self, filter: DetectionFilter) {
        self.filter = Some(filter);
    }

    fn is_active(&self) -> bool {
        self.enabled && self.range >= self.distance
    }
}

impl RotationalJoint for SimJoint {
    fn set_target_velocity(&mut self, velocity_rpm: f64) {
        self.velocity_rpm = velocity_rpm;
    }

    fn set_limits(&mut self, lower_deg: f64, upper_deg: f64) {
        self.limits_deg = (lower_deg, upper_deg);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl SimDirectory {
    /// Create every device the gantry described by `params` needs, with the
    /// actuators at the extensions of `start`.
    ///
    /// Within each actuator group the extensions alternate between
    /// `+misalignment_m` and `-misalignment_m` about the exact value, so the
    /// group's mean is unchanged.
    pub fn new(params: &Params, start: &GridPosition, misalignment_m: f64) -> Self {
        let names = &params.names;
        let mut dir = Self::default();

        let horizontal_m = kinematics::horizontal_extensions(params, start.x, start.y);
        let vertical_m = kinematics::vertical_extension(params, start.z);

        for corner in Corner::ALL.iter() {
            let n = params.num_horizontal_actuators;
            for i in 0..n {
                dir.actuators.insert(
                    names.horizontal_actuator(*corner, i),
                    SimActuator::new(
                        horizontal_m[corner.index()] + misalignment(i, n, misalignment_m),
                    ),
                );
            }

            let n = params.num_vertical_actuators;
            for i in 0..n {
                dir.actuators.insert(
                    names.vertical_actuator(*corner, i),
                    SimActuator::new(vertical_m + misalignment(i, n, misalignment_m)),
                );
            }

            dir.joints.insert(names.base_joint(*corner), SimJoint::default());
            dir.joints.insert(names.head_joint(*corner), SimJoint::default());
        }

        for side in Side::ALL.iter() {
            dir.sensors.insert(names.sensor(*side), SimSensor::default());
        }

        debug!(
            "Simulating {} actuators, {} sensors and {} joints",
            dir.actuators.len(),
            dir.sensors.len(),
            dir.joints.len()
        );

        dir
    }
}

impl DeviceDirectory for SimDirectory {
    type Actuator = SimActuator;
    type Sensor = SimSensor;
    type Joint = SimJoint;

    fn take_actuator(&mut self, name: &str) -> Option<SimActuator> {
        self.actuators.remove(name)
    }

    fn take_sensor(&mut self, name: &str) -> Option<SimSensor> {
        self.sensors.remove(name)
    }

    fn take_joint(&mut self, name: &str) -> Option<SimJoint> {
        self.joints.remove(name)
    }
}

impl SimTextPanel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            lines: Vec::new(),
        }
    }
}

impl TextSink for SimTextPanel {
    fn write_lines(&mut self, lines: &[String]) {
        self.lines = lines.to_vec();
        debug!("{}:\n{}", self.name, self.lines.join("\n"));
    }
}

impl StatusIndicator for SimStatusLights {
    fn set_status(&mut self, status: StatusLight) {
        if self.status != Some(status) {
            info!("Status lights: {}", status);
        }
        self.status = Some(status);
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Offset of the `i`th of `n` actuators. With an odd count the last one sits
/// at the exact value.
fn misalignment(i: usize, n: usize, misalignment_m: f64) -> f64 {
    if n % 2 == 1 && i == n - 1 {
        0.0
    } else if i % 2 == 0 {
        misalignment_m
    } else {
        -misalignment_m
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::eqpt::{EqptError, GantryEqpt};

    #[test]
    fn test_actuator_advance() {
        let mut act = SimActuator::new(1.0);
        act.set_limits(1.0, 2.0);
        act.set_velocity(0.4);

        act.advance(1.0);
        assert!((act.position_m - 1.4).abs() < 1e-9);

        // Stops at the limit
        act.advance(10.0);
        assert_eq!(act.position_m, 2.0);

        act.set_enabled(false);
        act.set_velocity(-1.0);
        act.advance(1.0);
        assert_eq!(act.position_m, 2.0);
    }

    #[test]
    fn test_misalignment() {
        let offsets: Vec<f64> = (0..3).map(|i| misalignment(i, 3, 0.1)).collect();
        assert_eq!(offsets, vec![0.1, -0.1, 0.0]);
        assert_eq!(offsets.iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn test_bind() {
        let params = Params::default();
        let mut dir = SimDirectory::new(&params, &GridPosition::new(8.0, 8.0, 3.0), 0.0);

        let eqpt: GantryEqpt<SimActuator, SimSensor, SimJoint> =
            GantryEqpt::bind(&mut dir, &params).unwrap();

        // Every device has been taken
        assert!(dir.actuators.is_empty());
        assert!(dir.sensors.is_empty());
        assert!(dir.joints.is_empty());

        // Startup state
        for sensor in eqpt.sensors.iter() {
            assert!(sensor.enabled);
            assert_eq!(sensor.range, 0.0);
            assert_eq!(sensor.filter, Some(DetectionFilter::height_scan()));
        }
        for joint in eqpt.base_joints.iter().chain(eqpt.head_joints.iter()) {
            assert!(!joint.enabled);
            assert_eq!(joint.limits_deg, (-90.0, 90.0));
        }
        for act in eqpt.vertical.iter().flat_map(|g| g.iter()) {
            assert_eq!(act.limits_m, (params.vertical_min_m(), params.vertical_max_m()));
            assert_eq!(act.position_m, 5.0);
        }
    }

    #[test]
    fn test_bind_missing_device() {
        let params = Params::default();
        let mut dir = SimDirectory::new(&params, &GridPosition::new(8.0, 8.0, 3.0), 0.0);
        let missing = params.names.sensor(Side::Right);
        dir.sensors.remove(&missing);

        match GantryEqpt::bind(&mut dir, &params) {
            Err(EqptError::DeviceNotFound(name)) => assert_eq!(name, missing),
            Ok(_) => panic!("Bound equipment with a missing sensor"),
        }
    }
}
