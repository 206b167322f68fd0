//! # Gantry simulation
//!
//! First order simulation of the gantry's devices and the terrain beneath
//! it, used to run the controller without hardware. Actuators integrate their
//! commanded velocity and sensors compare their range against the terrain
//! below the cell they look down on.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod devices;
mod terrain;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use devices::*;
pub use terrain::*;

use log::info;
use serde::Deserialize;

use comms_if::eqpt::{LinearActuator, RotationalJoint, Side};
use util::module::State;

use crate::eqpt::GantryEqpt;
use crate::gantry_ctrl::{
    kinematics, GantryCtrl, GantryCtrlError, GridPosition, InputData, OutputData, Params,
    StatusReport,
};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

pub type SimEqpt = GantryEqpt<SimActuator, SimSensor, SimJoint>;

pub type SimGantryCtrl = GantryCtrl<SimActuator, SimSensor, SimJoint>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Position of the head when the simulation starts.
    pub start_position: GridPosition,

    /// Alternating offset applied to actuators within each group at start.
    ///
    /// Units: meters
    pub misalignment_m: f64,

    pub terrain: TerrainParams,
}

/// How the terrain is generated.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Use Perlin noise terrain, otherwise the terrain is flat at
    /// `min_height`.
    pub random: bool,

    pub perlin_scale: f64,

    pub perlin_offset: (f64, f64),

    /// Units: height units
    pub min_height: f64,

    /// Units: height units
    pub max_height: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            start_position: GridPosition::new(8.0, 8.0, 3.0),
            misalignment_m: 0.0,
            terrain: TerrainParams::default(),
        }
    }
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            random: false,
            perlin_scale: 0.37,
            perlin_offset: (0.5, 0.5),
            min_height: 0.0,
            max_height: 2.0,
        }
    }
}

impl SimParams {
    /// Build the terrain for an area of the given size.
    pub fn build_terrain(&self, width: usize, height: usize) -> SimTerrain {
        let t = &self.terrain;

        if t.random {
            info!("Generating random terrain");
            SimTerrain::generate_random(
                width,
                height,
                t.perlin_scale,
                t.perlin_offset,
                (t.min_height, t.max_height),
            )
        } else {
            SimTerrain::flat(width, height, t.min_height)
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Move every actuator by its velocity over `elapsed_s`.
pub fn advance<S, J>(eqpt: &mut GantryEqpt<SimActuator, S, J>, elapsed_s: f64) {
    for act in eqpt
        .horizontal
        .iter_mut()
        .chain(eqpt.vertical.iter_mut())
        .flat_map(|g| g.iter_mut())
    {
        act.advance(elapsed_s);
    }
}

/// Update the distance each sensor sees down to the terrain.
///
/// The head is taken to be above the cell `(x, y)`, at the height set by the
/// vertical actuators. Each sensor looks down on its side's neighbouring
/// cell, and sees nothing beyond the edge of the area.
pub fn update_sensors<A, J>(
    eqpt: &mut GantryEqpt<A, SimSensor, J>,
    params: &Params,
    terrain: &SimTerrain,
    (x, y): (i64, i64),
) where
    A: LinearActuator,
    J: RotationalJoint,
{
    let z = kinematics::height_from_vertical(params, &eqpt.vertical_readings());

    for side in Side::ALL.iter() {
        let (dx, dy) = side.cell_offset();

        eqpt.sensors[side.index()].distance = terrain
            .height_at(x + dx, y + dy)
            .map(|h| z - h)
            .unwrap_or(f64::INFINITY);
    }
}

/// Run one simulated cycle: advance the devices, update the sensors and
/// process the controller.
pub fn step(
    ctrl: &mut SimGantryCtrl,
    terrain: &SimTerrain,
    elapsed_s: f64,
) -> Result<(OutputData, StatusReport), GantryCtrlError> {
    let cell = ctrl.position().nearest_cell();
    let params = ctrl.params().clone();

    advance(ctrl.eqpt_mut(), elapsed_s);
    update_sensors(ctrl.eqpt_mut(), &params, terrain, cell);

    ctrl.proc(&InputData { elapsed_s })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::gantry_ctrl::InitOutcome;
    use crate::map::CellHeight;
    use comms_if::eqpt::{Corner, StatusLight};
    use util::maths::max_dev_from_mean;

    const DT: f64 = 0.1;

    fn sim_ctrl(params: Params, start: GridPosition, misalignment_m: f64) -> SimGantryCtrl {
        let mut dir = SimDirectory::new(&params, &start, misalignment_m);
        let eqpt = GantryEqpt::bind(&mut dir, &params).unwrap();
        GantryCtrl::new(params, eqpt).unwrap()
    }

    /// A 6x6 area where only the corner cells are out of reach.
    fn small_params() -> Params {
        util::params::from_str(
            "area_width = 6\n\
            area_height = 6\n\
            head_half_width_cells = 0.0\n\
            retracted_actuator_length_m = 0.0\n\
            max_horizontal_extension_m = 100.0",
        )
        .unwrap()
    }

    #[test]
    fn test_init_aligns_actuators() {
        let mut ctrl = sim_ctrl(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.2);
        let terrain = SimTerrain::flat(17, 17, 0.0);

        assert_eq!(ctrl.position().nearest_cell(), (8, 8));
        assert!(ctrl.needs_initialization());
        assert_eq!(ctrl.cmd_init().unwrap(), InitOutcome::Started);
        assert!(!ctrl.is_locked());

        let mut init_result = None;
        let mut cycles = 0;
        while init_result.is_none() {
            let (out, rpt) = step(&mut ctrl, &terrain, DT).unwrap();
            init_result = rpt.init_result;

            if init_result.is_none() {
                assert_ne!(out.status, StatusLight::Locked);
            }

            cycles += 1;
            assert!(cycles < 10_000);
        }

        assert_eq!(init_result, Some(true));
        assert!(ctrl.is_locked());
        assert!(!ctrl.needs_initialization());
        assert!(ctrl.accuracy(&ctrl.position()) >= 0.99);
        assert!(ctrl.tasks().is_idle());

        for group in ctrl
            .eqpt()
            .horizontal_readings()
            .iter()
            .chain(ctrl.eqpt().vertical_readings().iter())
        {
            assert!(max_dev_from_mean(group) <= 0.01);
        }

        // Now it can be unlocked
        ctrl.cmd_unlock().unwrap();
        assert_eq!(ctrl.status_light(), StatusLight::Idle);
    }

    #[test]
    fn test_move_reaches_target() {
        let mut ctrl = sim_ctrl(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.0);
        let terrain = SimTerrain::flat(17, 17, 0.0);
        ctrl.cmd_unlock().unwrap();

        let target = GridPosition::new(8.0, 5.0, 4.0);
        ctrl.cmd_move(8, 5, 4.0, 4.0).unwrap();

        let mut cycles = 0;
        while !ctrl.tasks().is_idle() {
            step(&mut ctrl, &terrain, DT).unwrap();
            cycles += 1;
            assert!(cycles < 10_000);
        }

        assert_eq!(ctrl.position(), target);
        assert_eq!(ctrl.target(), target);
        assert!(ctrl.accuracy(&target) > 0.999);
        assert!(!ctrl.needs_initialization());
    }

    #[test]
    fn test_height_scan() {
        let params = small_params();
        let mut ctrl = sim_ctrl(params, GridPosition::new(2.0, 2.0, 3.0), 0.0);
        let terrain = SimTerrain::flat(6, 6, 1.0);

        ctrl.cmd_unlock().unwrap();
        ctrl.cmd_heightscan().unwrap();
        assert!(ctrl.is_scanning());
        assert!(matches!(ctrl.cmd_heightscan(), Err(GantryCtrlError::ScanInProgress)));
        assert!(matches!(ctrl.cmd_move(3, 3, 3.0, 1.0), Err(GantryCtrlError::ScanInProgress)));
        assert!(matches!(ctrl.cmd_init(), Err(GantryCtrlError::ScanInProgress)));

        let mut completed = false;
        let mut cycles = 0;
        while !completed {
            let (_, rpt) = step(&mut ctrl, &terrain, DT).unwrap();
            completed = rpt.scan_completed;

            cycles += 1;
            assert!(cycles < 100_000);
        }

        assert!(!ctrl.is_scanning());
        assert_eq!(ctrl.height_map().num_unscanned(), 0);

        for y in 0..6 {
            for x in 0..6 {
                let expected = if ctrl.reach_map().is_cell_reachable(x, y) {
                    CellHeight::Measured(1.0)
                } else {
                    CellHeight::Unreachable
                };
                assert_eq!(ctrl.height_map().get(x, y), Some(expected), "cell ({}, {})", x, y);
            }
        }
        for &(x, y) in [(0, 0), (5, 0), (0, 5), (5, 5)].iter() {
            assert_eq!(ctrl.height_map().get(x, y), Some(CellHeight::Unreachable));
        }
    }

    #[test]
    fn test_abort_cancels_scan() {
        let mut ctrl = sim_ctrl(small_params(), GridPosition::new(2.0, 2.0, 3.0), 0.0);
        let terrain = SimTerrain::flat(6, 6, 1.0);

        ctrl.cmd_unlock().unwrap();
        ctrl.cmd_heightscan().unwrap();
        for _ in 0..20 {
            step(&mut ctrl, &terrain, DT).unwrap();
        }

        ctrl.cmd_abort();
        assert!(!ctrl.is_scanning());
        assert!(ctrl.sweep().is_none());
        assert!(ctrl.tasks().is_idle());
        assert!(!ctrl.is_locked());

        for act in ctrl.eqpt().horizontal[Corner::TopLeft.index()].iter() {
            assert_eq!(act.velocity_ms, 0.0);
        }
    }

    #[test]
    fn test_sensor_distances() {
        let params = small_params();
        let mut dir = SimDirectory::new(&params, &GridPosition::new(1.0, 2.0, 3.0), 0.0);
        let mut eqpt: SimEqpt = GantryEqpt::bind(&mut dir, &params).unwrap();
        let terrain = SimTerrain::flat(6, 6, 1.0);

        update_sensors(&mut eqpt, &params, &terrain, (0, 2));

        assert!((eqpt.sensors[Side::Top.index()].distance - 2.0).abs() < 1e-9);
        assert_eq!(eqpt.sensors[Side::Left.index()].distance, f64::INFINITY);
    }
}
