//! # Gantry equipment
//!
//! The set of devices making up the gantry, bound by name from a device
//! directory. Binding happens once at startup and every device is owned by
//! the resulting [`GantryEqpt`] from then on.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use thiserror::Error;

use comms_if::eqpt::{
    Corner, DetectionFilter, LinearActuator, ProximitySensor, RotationalJoint, Side,
    NUM_CORNERS, NUM_SIDES,
};

use crate::gantry_ctrl::Params;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Travel limits of the base and head joints.
///
/// Units: degrees
const JOINT_LIMITS_DEG: (f64, f64) = (-90.0, 90.0);

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of named devices.
///
/// Each `take_*` function hands over ownership of the device with the given
/// name, or returns `None` if there is no such device (or it has already been
/// taken).
pub trait DeviceDirectory {
    type Actuator: LinearActuator;
    type Sensor: ProximitySensor;
    type Joint: RotationalJoint;

    fn take_actuator(&mut self, name: &str) -> Option<Self::Actuator>;

    fn take_sensor(&mut self, name: &str) -> Option<Self::Sensor>;

    fn take_joint(&mut self, name: &str) -> Option<Self::Joint>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// All devices of the gantry. Per-corner arrays are indexed by
/// [`Corner::index`], the sensors by [`Side::index`].
pub struct GantryEqpt<A, S, J> {
    /// Horizontal actuator chain of each corner.
    pub horizontal: [Vec<A>; NUM_CORNERS],

    /// Vertical actuator stack of each corner.
    pub vertical: [Vec<A>; NUM_CORNERS],

    /// Joint between each corner's horizontal chain and the frame.
    pub base_joints: [J; NUM_CORNERS],

    /// Joint between each corner's horizontal chain and the head.
    pub head_joints: [J; NUM_CORNERS],

    /// Downward scan sensors on each side of the head.
    pub sensors: [S; NUM_SIDES],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EqptError {
    #[error("Could not find a device named \"{0}\"")]
    DeviceNotFound(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A, S, J> GantryEqpt<A, S, J>
where
    A: LinearActuator,
    S: ProximitySensor,
    J: RotationalJoint,
{
    /// Bind every device named by `params.names` from the directory and put
    /// them into their startup state.
    pub fn bind<D>(directory: &mut D, params: &Params) -> Result<Self, EqptError>
    where
        D: DeviceDirectory<Actuator = A, Sensor = S, Joint = J>,
    {
        let names = &params.names;

        let horizontal = per_corner(|c| {
            (0..params.num_horizontal_actuators)
                .map(|i| take(directory.take_actuator(&names.horizontal_actuator(c, i)), || {
                    names.horizontal_actuator(c, i)
                }))
                .collect::<Result<Vec<_>, _>>()
        })?;

        let vertical = per_corner(|c| {
            (0..params.num_vertical_actuators)
                .map(|i| take(directory.take_actuator(&names.vertical_actuator(c, i)), || {
                    names.vertical_actuator(c, i)
                }))
                .collect::<Result<Vec<_>, _>>()
        })?;

        let base_joints = per_corner(|c| {
            take(directory.take_joint(&names.base_joint(c)), || names.base_joint(c))
        })?;

        let head_joints = per_corner(|c| {
            take(directory.take_joint(&names.head_joint(c)), || names.head_joint(c))
        })?;

        let sensors = per_side(|s| {
            take(directory.take_sensor(&names.sensor(s)), || names.sensor(s))
        })?;

        debug!(
            "Bound {} horizontal and {} vertical actuators",
            horizontal.iter().map(|g| g.len()).sum::<usize>(),
            vertical.iter().map(|g| g.len()).sum::<usize>()
        );

        let mut eqpt = Self {
            horizontal,
            vertical,
            base_joints,
            head_joints,
            sensors,
        };
        eqpt.set_startup_state(params);

        Ok(eqpt)
    }

    /// Put every device into its startup state.
    ///
    /// Joints are stopped, limited and disabled. Actuators are stopped,
    /// enabled and limited to their full travel. Sensors are enabled at zero
    /// range with the height scan filter.
    pub fn set_startup_state(&mut self, params: &Params) {
        for joint in self.base_joints.iter_mut().chain(self.head_joints.iter_mut()) {
            joint.set_target_velocity(0.0);
            joint.set_limits(JOINT_LIMITS_DEG.0, JOINT_LIMITS_DEG.1);
            joint.set_enabled(false);
        }

        for sensor in self.sensors.iter_mut() {
            sensor.set_enabled(true);
            sensor.set_range(0.0);
            sensor.set_detection_filter(DetectionFilter::height_scan());
        }

        for act in self.horizontal.iter_mut().flat_map(|g| g.iter_mut()) {
            act.set_limits(0.0, params.max_horizontal_extension_m);
            act.set_velocity(0.0);
            act.set_enabled(true);
        }

        for act in self.vertical.iter_mut().flat_map(|g| g.iter_mut()) {
            act.set_limits(params.vertical_min_m(), params.vertical_max_m());
            act.set_velocity(0.0);
            act.set_enabled(true);
        }
    }

    /// Current extension of every horizontal actuator, per corner.
    pub fn horizontal_readings(&self) -> [Vec<f64>; NUM_CORNERS] {
        readings(&self.horizontal)
    }

    /// Current extension of every vertical actuator, per corner.
    pub fn vertical_readings(&self) -> [Vec<f64>; NUM_CORNERS] {
        readings(&self.vertical)
    }

    /// Set the velocity of every actuator to zero.
    pub fn stop_all(&mut self) {
        for act in self
            .horizontal
            .iter_mut()
            .chain(self.vertical.iter_mut())
            .flat_map(|g| g.iter_mut())
        {
            act.set_velocity(0.0);
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn take<T, F: FnOnce() -> String>(device: Option<T>, name: F) -> Result<T, EqptError> {
    device.ok_or_else(|| EqptError::DeviceNotFound(name()))
}

fn per_corner<T, E, F>(mut f: F) -> Result<[T; NUM_CORNERS], E>
where
    F: FnMut(Corner) -> Result<T, E>,
{
    Ok([
        f(Corner::TopLeft)?,
        f(Corner::TopRight)?,
        f(Corner::BottomLeft)?,
        f(Corner::BottomRight)?,
    ])
}

fn per_side<T, E, F>(mut f: F) -> Result<[T; NUM_SIDES], E>
where
    F: FnMut(Side) -> Result<T, E>,
{
    Ok([
        f(Side::Top)?,
        f(Side::Bottom)?,
        f(Side::Left)?,
        f(Side::Right)?,
    ])
}

fn readings<A: LinearActuator>(groups: &[Vec<A>; NUM_CORNERS]) -> [Vec<f64>; NUM_CORNERS] {
    let corner = |i: usize| groups[i].iter().map(|a| a.current_position()).collect();

    [corner(0), corner(1), corner(2), corner(3)]
}
