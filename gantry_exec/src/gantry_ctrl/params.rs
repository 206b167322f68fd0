//! Parameters structure for GantryCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use comms_if::eqpt::{Corner, Side};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Gantry control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- GEOMETRY ----

    /// Number of grid points across the work area (x axis).
    pub area_width: usize,

    /// Number of grid points down the work area (y axis).
    pub area_height: usize,

    /// Size of one grid cell, which is also one height unit.
    ///
    /// Units: meters
    pub cell_size_m: f64,

    /// Height of the gantry ceiling above the base.
    ///
    /// Units: meters
    pub ceiling_height_m: f64,

    /// Lowest height the head's attachment points can reach.
    ///
    /// Units: meters
    pub floor_height_m: f64,

    /// Half the width of the head, the offset between the head centre and
    /// each of its attachment points.
    ///
    /// Units: grid cells
    pub head_half_width_cells: f64,

    // ---- ACTUATORS ----

    /// Number of horizontal actuators chained in series at each corner.
    pub num_horizontal_actuators: usize,

    /// Number of vertical actuators stacked in series at each corner.
    pub num_vertical_actuators: usize,

    /// Length of one fully retracted actuator.
    ///
    /// Units: meters
    pub retracted_actuator_length_m: f64,

    /// Maximum extension of a single horizontal actuator.
    ///
    /// Units: meters
    pub max_horizontal_extension_m: f64,

    /// Horizontal actuator speed limit.
    ///
    /// Units: meters/second
    pub horizontal_speed_limit_ms: f64,

    /// Vertical actuator speed limit.
    ///
    /// Units: meters/second
    pub vertical_speed_limit_ms: f64,

    // ---- MOTION ----

    /// Maximum planar distance between two waypoints of a move.
    ///
    /// Units: grid cells
    pub waypoint_step_cells: f64,

    /// Fractional coordinates smaller than this are treated as integers.
    ///
    /// Units: grid cells
    pub fractional_tolerance_cells: f64,

    /// Time given to each equalisation task and to the final move of the
    /// initialisation sequence.
    ///
    /// Units: seconds
    pub init_move_time_s: f64,

    /// Time given to moves between scan points.
    ///
    /// Units: seconds
    pub scan_move_time_s: f64,

    // ---- SAFETY ----

    /// Maximum deviation of any actuator from its group's mean before the
    /// group is considered misaligned.
    ///
    /// Units: meters
    pub alignment_tolerance_m: f64,

    /// Minimum positional accuracy required to release the safety lock.
    pub min_accuracy: f64,

    // ---- HEIGHT SCAN ----

    /// Range increment of the scan sensors on each scan step.
    ///
    /// Units: height units
    pub sensor_range_step: f64,

    // ---- DEVICES ----

    /// Naming convention used to bind devices.
    pub names: DeviceNames,
}

/// Naming convention of the gantry's devices.
///
/// A horizontal actuator is named
/// `{prefix}{actuator}{horizontal_tag}{corner tag} {n}`, with `n` starting
/// at 1, for example `[GW] Pist: HTL 1`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceNames {
    pub prefix: String,
    pub actuator: String,
    pub joint: String,
    pub sensor: String,
    pub horizontal_tag: String,
    pub vertical_tag: String,
    pub base_tag: String,
    pub head_tag: String,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        let cell_size_m = 2.5;
        Self {
            area_width: 17,
            area_height: 17,
            cell_size_m,
            ceiling_height_m: 20.0,
            floor_height_m: 2.5,
            head_half_width_cells: 1.0,
            num_horizontal_actuators: 2,
            num_vertical_actuators: 2,
            retracted_actuator_length_m: 2.0 * cell_size_m + 0.159,
            max_horizontal_extension_m: 10.0,
            horizontal_speed_limit_ms: 1.0,
            vertical_speed_limit_ms: 1.0,
            waypoint_step_cells: 2.0,
            fractional_tolerance_cells: 0.01,
            init_move_time_s: 1.0,
            scan_move_time_s: 1.0,
            alignment_tolerance_m: 0.01,
            min_accuracy: 0.99,
            sensor_range_step: 0.5,
            names: DeviceNames::default(),
        }
    }
}

impl Params {
    /// Highest reachable logical height.
    ///
    /// Units: height units
    pub fn max_z(&self) -> f64 {
        (self.ceiling_height_m - self.floor_height_m) / self.cell_size_m
    }

    /// Lower travel limit of each vertical actuator.
    ///
    /// Units: meters
    pub fn vertical_min_m(&self) -> f64 {
        self.floor_height_m / self.num_vertical_actuators as f64
    }

    /// Upper travel limit of each vertical actuator.
    ///
    /// Units: meters
    pub fn vertical_max_m(&self) -> f64 {
        self.ceiling_height_m / self.num_vertical_actuators as f64
    }
}

impl Default for DeviceNames {
    fn default() -> Self {
        Self {
            prefix: String::from("[GW] "),
            actuator: String::from("Pist: "),
            joint: String::from("Hing: "),
            sensor: String::from("Sens: "),
            horizontal_tag: String::from("H"),
            vertical_tag: String::from("V"),
            base_tag: String::from("B"),
            head_tag: String::from("W"),
        }
    }
}

impl DeviceNames {
    /// Name of the `index`th (from 0) horizontal actuator at a corner.
    pub fn horizontal_actuator(&self, corner: Corner, index: usize) -> String {
        format!(
            "{}{}{}{} {}",
            self.prefix, self.actuator, self.horizontal_tag, corner.tag(), index + 1
        )
    }

    /// Name of the `index`th (from 0) vertical actuator at a corner.
    pub fn vertical_actuator(&self, corner: Corner, index: usize) -> String {
        format!(
            "{}{}{}{} {}",
            self.prefix, self.actuator, self.vertical_tag, corner.tag(), index + 1
        )
    }

    /// Name of the joint at the base (anchor) end of a corner's chain.
    pub fn base_joint(&self, corner: Corner) -> String {
        format!("{}{}{}{}", self.prefix, self.joint, self.base_tag, corner.tag())
    }

    /// Name of the joint at the head end of a corner's chain.
    pub fn head_joint(&self, corner: Corner) -> String {
        format!("{}{}{}{}", self.prefix, self.joint, self.head_tag, corner.tag())
    }

    /// Name of the scan sensor on a side of the head.
    pub fn sensor(&self, side: Side) -> String {
        format!("{}{}{}{}", self.prefix, self.sensor, self.head_tag, side.tag())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
