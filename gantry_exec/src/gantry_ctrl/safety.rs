//! Safety lock and actuator initialisation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};

// Internal
use super::*;
use crate::task_queue::TaskItem;
use comms_if::eqpt::{Corner, LinearActuator, ProximitySensor, RotationalJoint};
use util::maths::max_dev_from_mean;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Outcome of an accepted `init` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The initialisation sequence has been queued.
    Started,

    /// The actuators are already aligned, nothing was queued.
    AlreadyInitialised,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A, S, J> GantryCtrl<A, S, J>
where
    A: LinearActuator,
    S: ProximitySensor,
    J: RotationalJoint,
{
    /// How closely the actuators match the extensions of `pos`, as a fraction
    /// between 0 and 1 (1 being a perfect match).
    ///
    /// Horizontal actuators are weighted by their target extension, vertical
    /// ones by their target height.
    pub fn accuracy(&self, pos: &GridPosition) -> f64 {
        let horizontal_m = kinematics::horizontal_extensions(&self.params, pos.x, pos.y);
        let vertical_m = kinematics::vertical_extension(&self.params, pos.z);

        let mut total = 0.0;
        let mut error = 0.0;

        for corner in Corner::ALL.iter() {
            let i = corner.index();

            for act in self.eqpt.horizontal[i].iter() {
                total += horizontal_m[i].abs();
                error += (act.current_position() - horizontal_m[i]).abs();
            }

            for act in self.eqpt.vertical[i].iter() {
                total += vertical_m;
                error += (act.current_position() - vertical_m).abs();
            }
        }

        if total > 0.0 {
            1.0 - error / total
        } else {
            0.0
        }
    }

    /// True if any actuator group is out of alignment, or the actuators don't
    /// match the head's logical position closely enough.
    pub fn needs_initialization(&self) -> bool {
        let tol = self.params.alignment_tolerance_m;

        let misaligned = self
            .eqpt
            .horizontal_readings()
            .iter()
            .chain(self.eqpt.vertical_readings().iter())
            .any(|group| max_dev_from_mean(group) > tol);

        misaligned || self.accuracy(&self.position) < self.params.min_accuracy
    }

    /// Release the safety lock.
    ///
    /// Refused if the actuators need initialisation.
    pub fn cmd_unlock(&mut self) -> Result<(), GantryCtrlError> {
        if self.needs_initialization() {
            return Err(GantryCtrlError::NeedsInit);
        }

        self.safety_lock = false;
        info!("Safety lock released");

        Ok(())
    }

    /// Stop everything and engage the safety lock.
    pub fn cmd_lock(&mut self) {
        self.abort();
        self.safety_lock = true;
        info!("Safety lock engaged");
    }

    /// Queue the initialisation sequence.
    ///
    /// Every vertical then horizontal group is equalized corner by corner,
    /// after which the lock is released for a final move to the nearest grid
    /// point. The lock is engaged again once that move completes, and the
    /// result reported with the cycle's status report.
    pub fn cmd_init(&mut self) -> Result<InitOutcome, GantryCtrlError> {
        if self.scan.in_progress {
            return Err(GantryCtrlError::ScanInProgress);
        }

        if !self.needs_initialization() {
            return Ok(InitOutcome::AlreadyInitialised);
        }

        let time_s = self.params.init_move_time_s;

        for corner in Corner::ALL.iter() {
            for group in [ActuatorGroup::Vertical, ActuatorGroup::Horizontal].iter() {
                self.tasks.push(TaskItem::new(
                    Task::EqualizeGroup {
                        corner: *corner,
                        group: *group,
                        time_s,
                    },
                    format!("Equalizing {} actuators at {}", group, corner),
                ));
            }
        }

        self.safety_lock = false;

        let (x, y) = self.position.nearest_cell();
        let target = GridPosition::new(x as f64, y as f64, self.position.z);
        self.queue_move(
            target,
            time_s,
            "Final move to the nearest grid point",
            OnFinish::CompleteInit,
        );

        info!("Initialisation sequence queued ({} tasks)", self.tasks.len());

        Ok(InitOutcome::Started)
    }

    /// Engage the lock at the end of initialisation and check the result.
    pub(crate) fn complete_init(&mut self) {
        self.safety_lock = true;

        let ok = !self.needs_initialization();
        if ok {
            info!("Actuators successfully initialised");
        } else {
            warn!("Actuator initialisation failed, actuators are still misaligned");
        }

        self.report.init_result = Some(ok);
    }

    /// Stop all motion and drop every queued task.
    ///
    /// The head's logical position is kept and becomes the target. Any height
    /// scan is cancelled. Safe to call at any time, including when nothing
    /// is running.
    pub fn abort(&mut self) {
        self.eqpt.stop_all();
        self.target = self.position;
        self.scan.in_progress = false;
        self.scan.sweep = None;
        self.tasks.clear();
    }
}
