//! # Gantry telemetry
//!
//! Operator facing views of the controller: the serialisable [`GantryTm`]
//! snapshot, plus the text map and debug screens written to the text sinks.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use comms_if::eqpt::{LinearActuator, ProximitySensor, RotationalJoint, Side, StatusLight};

use crate::gantry_ctrl::{GantryCtrl, GridPosition};
use crate::map::CellHeight;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Snapshot of the controller's state.
#[derive(Debug, Clone, Serialize)]
pub struct GantryTm {
    pub position: GridPosition,
    pub target: GridPosition,
    pub status: StatusLight,
    pub locked: bool,
    pub accuracy: f64,
    pub current_task: Option<String>,
    pub task_time_left_s: f64,
    pub num_queued_tasks: usize,
    pub scan_in_progress: bool,
    pub num_unscanned_cells: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GantryTm {
    pub fn from_ctrl<A, S, J>(ctrl: &GantryCtrl<A, S, J>) -> Self
    where
        A: LinearActuator,
        S: ProximitySensor,
        J: RotationalJoint,
    {
        let position = ctrl.position();

        Self {
            position,
            target: ctrl.target(),
            status: ctrl.status_light(),
            locked: ctrl.is_locked(),
            accuracy: ctrl.accuracy(&position),
            current_task: ctrl.tasks().current().map(|t| t.description.clone()),
            task_time_left_s: ctrl.tasks().time_left_s(),
            num_queued_tasks: ctrl.tasks().len(),
            scan_in_progress: ctrl.is_scanning(),
            num_unscanned_cells: ctrl.height_map().num_unscanned(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Render the work area, one line per grid row.
///
/// `W` marks the head, `T` its target, measured cells show their rounded
/// height, `.` is an unscanned cell and `-` an unreachable one.
pub fn map_view<A, S, J>(ctrl: &GantryCtrl<A, S, J>) -> Vec<String>
where
    A: LinearActuator,
    S: ProximitySensor,
    J: RotationalJoint,
{
    let head = ctrl.position().nearest_cell();
    let target = ctrl.target().nearest_cell();
    let reach_map = ctrl.reach_map();
    let height_map = ctrl.height_map();

    let mut lines = vec![String::from("Gantry Reachability Map")];

    for y in 0..reach_map.height() as i64 {
        let row: Vec<String> = (0..reach_map.width() as i64)
            .map(|x| {
                if (x, y) == head {
                    "W".into()
                } else if (x, y) == target {
                    "T".into()
                } else if !reach_map.is_cell_reachable(x, y) {
                    "-".into()
                } else {
                    match height_map.get(x, y) {
                        Some(CellHeight::Measured(h)) => format!("{}", h.round()),
                        _ => ".".into(),
                    }
                }
            })
            .collect();

        lines.push(row.join(" "));
    }

    lines
}

/// Render the controller's debug screen.
pub fn debug_view<A, S, J>(ctrl: &GantryCtrl<A, S, J>) -> Vec<String>
where
    A: LinearActuator,
    S: ProximitySensor,
    J: RotationalJoint,
{
    let position = ctrl.position();
    let target = ctrl.target();

    let mut lines = vec![
        String::from("Gantry Control Debug Screen"),
        format!(
            "Safety Lock: {}",
            if ctrl.is_locked() { "ENGAGED" } else { "DISENGAGED" }
        ),
        format!("Head Position: {}", position),
        format!("Accuracy to Pos: {:.2} %", ctrl.accuracy(&position) * 100.0),
        format!("Head Target:   {}", target),
        format!("Accuracy to Target: {:.2} %", ctrl.accuracy(&target) * 100.0),
        format!("Task Queue: {} tasks", ctrl.tasks().len()),
    ];

    if let (true, Some(task)) = (ctrl.tasks().is_running(), ctrl.tasks().current()) {
        lines.push(format!("Current Task: {}", task.description));
        lines.push(format!("Time Left: {:.3} s", ctrl.tasks().time_left_s()));
    } else if ctrl.is_scanning() {
        lines.push(String::from("Height scan in progress:"));

        if let Some(sweep) = ctrl.sweep() {
            let per_side = |f: &dyn Fn(usize) -> String| {
                Side::ALL
                    .iter()
                    .map(|s| f(s.index()))
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            lines.push(format!(
                "Sensor Ranges: {}",
                per_side(&|i| format!("{:.2}", sweep.ranges[i]))
            ));
            lines.push(format!(
                "Sensor Readings: {}",
                per_side(&|i| match sweep.readings[i] {
                    Some(r) => format!("{:.2}", r),
                    None => String::from("-"),
                })
            ));
        }
    } else {
        lines.push(String::from("System idle"));
    }

    lines
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
