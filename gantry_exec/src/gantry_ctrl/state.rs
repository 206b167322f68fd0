//! Implementations for the GantryCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::{
    eqpt::GantryEqpt,
    map::{HeightMap, ReachMap},
    task_queue::{TaskItem, TaskQueue},
};
use comms_if::eqpt::{LinearActuator, ProximitySensor, RotationalJoint, StatusLight};
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gantry control module state
pub struct GantryCtrl<A, S, J> {
    pub(crate) params: Params,

    pub(crate) eqpt: GantryEqpt<A, S, J>,

    pub(crate) reach_map: ReachMap,

    pub(crate) height_map: HeightMap,

    /// Committed logical position of the head.
    pub(crate) position: GridPosition,

    /// Position the head is currently being driven to.
    pub(crate) target: GridPosition,

    pub(crate) safety_lock: bool,

    pub(crate) tasks: TaskQueue<Task>,

    pub(crate) scan: ScanState,

    pub(crate) report: StatusReport,

    pub(crate) session: Option<Session>,
}

/// Input data to Gantry Control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Time elapsed since the previous cycle.
    ///
    /// Units: seconds
    pub elapsed_s: f64,
}

/// Output of Gantry Control each cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutputData {
    /// Status to show on the indicator lights.
    pub status: StatusLight,
}

/// Status report for GantryCtrl processing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Description of the task started or running this cycle.
    pub current_task: Option<String>,

    /// Time left on the current task.
    ///
    /// Units: seconds
    pub task_time_left_s: f64,

    /// Number of tasks waiting in the queue.
    pub num_queued_tasks: usize,

    pub scan_in_progress: bool,

    /// True if the height scan completed on this cycle.
    pub scan_completed: bool,

    /// Result of initialisation, if it completed on this cycle.
    pub init_result: Option<bool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<A, S, J> State for GantryCtrl<A, S, J>
where
    A: LinearActuator,
    S: ProximitySensor,
    J: RotationalJoint,
{
    type InitData = (Params, GantryEqpt<A, S, J>);
    type InitError = GantryCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = GantryCtrlError;

    /// Initialise the GantryCtrl module.
    ///
    /// Expected init data is the parameters and the bound equipment.
    fn init(init_data: Self::InitData, session: &Session) -> Result<Self, Self::InitError> {
        let (params, eqpt) = init_data;

        let mut ctrl = Self::new(params, eqpt)?;
        ctrl.session = Some(session.clone());

        Ok(ctrl)
    }

    /// Perform cyclic processing of Gantry Control.
    ///
    /// At most one task is executed per cycle. While a task is running the
    /// cycle only counts down its time. When the queue is empty and a height
    /// scan is in progress the scan is stepped instead.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        self.tick(input_data.elapsed_s)?;

        self.report.current_task = self.tasks.current().map(|t| t.description.clone());
        self.report.task_time_left_s = self.tasks.time_left_s();
        self.report.num_queued_tasks = self.tasks.len();
        self.report.scan_in_progress = self.scan.in_progress;

        Ok((
            OutputData {
                status: self.status_light(),
            },
            self.report.clone(),
        ))
    }
}

impl<A, S, J> GantryCtrl<A, S, J>
where
    A: LinearActuator,
    S: ProximitySensor,
    J: RotationalJoint,
{
    /// Create the controller from its parameters and bound equipment.
    ///
    /// The logical position is recovered from the current actuator
    /// extensions, and the safety lock starts engaged.
    pub fn new(params: Params, eqpt: GantryEqpt<A, S, J>) -> Result<Self, GantryCtrlError> {
        validate(&params, &eqpt)?;

        let reach_map = ReachMap::build(&params);
        info!(
            "{} of {} grid points are reachable",
            reach_map.num_reachable(),
            params.area_width * params.area_height
        );

        let (x, y) = kinematics::closest_reachable(&params, &eqpt.horizontal_readings())
            .ok_or(GantryCtrlError::NoReachableStart)?;
        let z = kinematics::height_from_vertical(&params, &eqpt.vertical_readings());
        let position = GridPosition::new(x as f64, y as f64, z);

        info!("Head is at {}", position);

        let mut height_map = HeightMap::new(params.area_width, params.area_height);
        height_map.reset(&reach_map);

        Ok(Self {
            params,
            eqpt,
            reach_map,
            height_map,
            position,
            target: position,
            safety_lock: true,
            tasks: TaskQueue::new(),
            scan: ScanState::default(),
            report: StatusReport::default(),
            session: None,
        })
    }

    /// Queue a move of the head to `(x, y, z)` taking `time_s`.
    ///
    /// Returns the number of waypoints queued.
    pub fn cmd_move(&mut self, x: i64, y: i64, z: f64, time_s: f64) -> Result<usize, GantryCtrlError> {
        if self.safety_lock {
            return Err(GantryCtrlError::SafetyLocked);
        }
        if self.scan.in_progress {
            return Err(GantryCtrlError::ScanInProgress);
        }
        if !(time_s.is_finite() && time_s > 0.0) {
            return Err(GantryCtrlError::InvalidMoveTime(time_s));
        }

        let target = GridPosition::new(x as f64, y as f64, z);
        if !self.is_reachable(&target) {
            return Err(GantryCtrlError::Unreachable(target));
        }

        Ok(self.queue_move(
            target,
            time_s,
            &format!("Moving towards {}", target),
            OnFinish::Nothing,
        ))
    }

    /// Stop all motion and clear the task queue.
    pub fn cmd_abort(&mut self) {
        self.abort();
        info!("Aborted, holding at {}", self.position);
    }

    /// True if the head can be placed at `pos`.
    pub fn is_reachable(&self, pos: &GridPosition) -> bool {
        self.reach_map.is_reachable(&self.params, pos)
    }

    /// Status to show on the indicator lights.
    pub fn status_light(&self) -> StatusLight {
        if self.safety_lock {
            StatusLight::Locked
        } else if self.tasks.is_running() {
            StatusLight::Moving
        } else {
            StatusLight::Idle
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn eqpt(&self) -> &GantryEqpt<A, S, J> {
        &self.eqpt
    }

    /// Mutable access to the equipment, for simulation.
    pub fn eqpt_mut(&mut self) -> &mut GantryEqpt<A, S, J> {
        &mut self.eqpt
    }

    pub fn reach_map(&self) -> &ReachMap {
        &self.reach_map
    }

    pub fn height_map(&self) -> &HeightMap {
        &self.height_map
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn target(&self) -> GridPosition {
        self.target
    }

    pub fn is_locked(&self) -> bool {
        self.safety_lock
    }

    pub fn is_scanning(&self) -> bool {
        self.scan.in_progress
    }

    /// The running sensor sweep, if any.
    pub fn sweep(&self) -> Option<&SensorSweep> {
        self.scan.sweep.as_ref()
    }

    pub fn tasks(&self) -> &TaskQueue<Task> {
        &self.tasks
    }

    /// One cycle of the task scheduler.
    fn tick(&mut self, elapsed_s: f64) -> Result<(), GantryCtrlError> {
        if self.tasks.is_running() {
            if let Some(item) = self.tasks.countdown(elapsed_s) {
                self.finish_task(item);
            }
            return Ok(());
        }

        if let Some(item) = self.tasks.pop_next() {
            debug!("Starting task: {}", item);

            let duration_s = match self.execute_task(&item.task) {
                Ok(d) => d,
                Err(e) => {
                    warn!("Task \"{}\" failed, aborting: {}", item, e);
                    self.abort();
                    return Err(e);
                }
            };

            trace!("Task will take {:.3} s", duration_s);

            if let Some(item) = self.tasks.start(item, duration_s) {
                self.finish_task(item);
            }

            return Ok(());
        }

        if self.scan.in_progress {
            self.height_scan_step();
        }

        Ok(())
    }

    /// Start the task's actions, returning how long they take.
    fn execute_task(&mut self, task: &Task) -> Result<f64, GantryCtrlError> {
        match *task {
            Task::EqualizeGroup {
                corner,
                group,
                time_s,
            } => Ok(self.execute_equalize(corner, group, time_s)),
            Task::MoveWaypoint { target, time_s } => self.execute_move_to(target, time_s),
            Task::CommitPosition { .. } => Ok(0.0),
        }
    }

    fn finish_task(&mut self, item: TaskItem<Task>) {
        trace!("Finished task: {}", item);

        if let Task::CommitPosition { target, on_finish } = item.task {
            self.position = target;
            self.target = target;

            match on_finish {
                OnFinish::Nothing => info!("Arrived at {}", target),
                OnFinish::StartSensorSweep => self.start_sweep(),
                OnFinish::CompleteInit => self.complete_init(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn validate<A, S, J>(params: &Params, eqpt: &GantryEqpt<A, S, J>) -> Result<(), GantryCtrlError> {
    if params.area_width < 2 || params.area_height < 2 {
        return Err(GantryCtrlError::InvalidParams(format!(
            "the area must be at least 2x2 grid points, got {}x{}",
            params.area_width, params.area_height
        )));
    }
    if params.num_horizontal_actuators == 0 || params.num_vertical_actuators == 0 {
        return Err(GantryCtrlError::InvalidParams(
            "each corner needs at least one horizontal and one vertical actuator".into(),
        ));
    }
    if params.cell_size_m <= 0.0 || params.ceiling_height_m <= params.floor_height_m {
        return Err(GantryCtrlError::InvalidParams(
            "cell size must be positive and the ceiling above the floor".into(),
        ));
    }

    for corner in comms_if::eqpt::Corner::ALL.iter() {
        let i = corner.index();

        for (group, expected, found) in [
            (ActuatorGroup::Horizontal, params.num_horizontal_actuators, eqpt.horizontal[i].len()),
            (ActuatorGroup::Vertical, params.num_vertical_actuators, eqpt.vertical[i].len()),
        ]
        .iter()
        {
            if expected != found {
                return Err(GantryCtrlError::ActuatorCount {
                    corner: *corner,
                    group: *group,
                    expected: *expected,
                    found: *found,
                });
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{SimDirectory, SimGantryCtrl};
    use comms_if::eqpt::{Corner, NUM_CORNERS};
    use util::maths::max_dev_from_mean;

    fn ctrl_at(params: Params, start: GridPosition, misalignment_m: f64) -> SimGantryCtrl {
        let mut dir = SimDirectory::new(&params, &start, misalignment_m);
        let eqpt = GantryEqpt::bind(&mut dir, &params).unwrap();
        GantryCtrl::new(params, eqpt).unwrap()
    }

    fn proc(ctrl: &mut SimGantryCtrl) -> Result<(OutputData, StatusReport), GantryCtrlError> {
        ctrl.proc(&InputData { elapsed_s: 0.1 })
    }

    #[test]
    fn test_startup() {
        let ctrl = ctrl_at(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.0);

        assert!(ctrl.is_locked());
        assert_eq!(ctrl.position().nearest_cell(), (8, 8));
        assert!((ctrl.position().z - 3.0).abs() < 1e-9);
        assert_eq!(ctrl.target(), ctrl.position());
        assert_eq!(ctrl.status_light(), StatusLight::Locked);
        assert!(!ctrl.needs_initialization());
    }

    #[test]
    fn test_locked_commands() {
        let mut ctrl = ctrl_at(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.0);

        assert!(matches!(ctrl.cmd_move(5, 5, 3.0, 10.0), Err(GantryCtrlError::SafetyLocked)));
        assert!(matches!(ctrl.cmd_heightscan(), Err(GantryCtrlError::SafetyLocked)));
        assert!(ctrl.tasks().is_idle());

        // Already aligned so init has nothing to do
        assert_eq!(ctrl.cmd_init().unwrap(), InitOutcome::AlreadyInitialised);
        assert!(ctrl.tasks().is_idle());
    }

    #[test]
    fn test_unlock_gate() {
        let mut ctrl = ctrl_at(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.2);

        assert!(ctrl.needs_initialization());
        assert!(matches!(ctrl.cmd_unlock(), Err(GantryCtrlError::NeedsInit)));
        assert!(ctrl.is_locked());
    }

    #[test]
    fn test_unlock_needs_accuracy() {
        let mut ctrl = ctrl_at(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.0);
        let pos = ctrl.position();
        assert!((ctrl.accuracy(&pos) - 1.0).abs() < 1e-9);

        // Push the whole top left horizontal group out by the same amount
        let tl = Corner::TopLeft.index();
        for act in ctrl.eqpt_mut().horizontal[tl].iter_mut() {
            act.position_m += 0.5;
        }
        assert!(max_dev_from_mean(&ctrl.eqpt().horizontal_readings()[tl]) < 1e-9);

        let params = ctrl.params();
        let horizontal_m = kinematics::horizontal_extensions(params, pos.x, pos.y);
        let total = horizontal_m.iter().sum::<f64>() * params.num_horizontal_actuators as f64
            + kinematics::vertical_extension(params, pos.z)
                * (params.num_vertical_actuators * NUM_CORNERS) as f64;
        let expected = 1.0 - 0.5 * params.num_horizontal_actuators as f64 / total;

        assert!((ctrl.accuracy(&pos) - expected).abs() < 1e-9);
        assert!(ctrl.accuracy(&pos) < ctrl.params().min_accuracy);
        assert!(ctrl.needs_initialization());
        assert!(matches!(ctrl.cmd_unlock(), Err(GantryCtrlError::NeedsInit)));
        assert!(ctrl.is_locked());
    }

    #[test]
    fn test_waypoint_times_share_move_time() {
        let mut ctrl = ctrl_at(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.0);
        ctrl.cmd_unlock().unwrap();

        let target = GridPosition::new(5.0, 8.0, 2.0);
        let n = ctrl.cmd_move(5, 8, 2.0, 7.0).unwrap();
        assert_eq!(n, 2);

        let waypoints: Vec<(GridPosition, f64)> = ctrl
            .tasks()
            .iter()
            .filter_map(|item| match item.task {
                Task::MoveWaypoint { target, time_s } => Some((target, time_s)),
                _ => None,
            })
            .collect();
        assert_eq!(waypoints.len(), n);

        for (_, time_s) in waypoints.iter() {
            assert!((time_s - 7.0 / n as f64).abs() < 1e-9);
        }
        let total_s: f64 = waypoints.iter().map(|(_, t)| t).sum();
        assert!((total_s - 7.0).abs() < 1e-9);
        assert_eq!(waypoints[n - 1].0, target);

        // The commit comes last and lands on the target exactly
        match ctrl.tasks().iter().last().map(|item| &item.task) {
            Some(Task::CommitPosition { target: t, .. }) => assert_eq!(*t, target),
            other => panic!("Expected a commit last, found {:?}", other),
        }
    }

    #[test]
    fn test_move_validation() {
        let mut ctrl = ctrl_at(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.0);
        ctrl.cmd_unlock().unwrap();
        assert_eq!(ctrl.status_light(), StatusLight::Idle);

        assert!(matches!(ctrl.cmd_move(0, 0, 3.0, 10.0), Err(GantryCtrlError::Unreachable(_))));
        assert!(matches!(ctrl.cmd_move(8, 8, 100.0, 10.0), Err(GantryCtrlError::Unreachable(_))));
        assert!(matches!(ctrl.cmd_move(8, 8, 3.0, 0.0), Err(GantryCtrlError::InvalidMoveTime(_))));
        assert!(ctrl.tasks().is_idle());

        // 4 cells at 2 cells per waypoint, plus the commit
        assert_eq!(ctrl.cmd_move(8, 4, 3.0, 10.0).unwrap(), 2);
        assert_eq!(ctrl.tasks().len(), 3);

        // A second move plans from the end of the first
        assert_eq!(ctrl.cmd_move(8, 5, 3.0, 10.0).unwrap(), 1);
        assert_eq!(ctrl.tasks().len(), 5);
    }

    #[test]
    fn test_one_task_per_cycle() {
        let mut ctrl = ctrl_at(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.0);
        ctrl.cmd_unlock().unwrap();
        ctrl.cmd_move(8, 7, 3.0, 1.0).unwrap();
        assert_eq!(ctrl.tasks().len(), 2);

        // First cycle starts the waypoint
        let (out, rpt) = proc(&mut ctrl).unwrap();
        assert_eq!(out.status, StatusLight::Moving);
        assert!(rpt.current_task.is_some());
        assert_eq!(rpt.num_queued_tasks, 1);
        assert_eq!(ctrl.target().nearest_cell(), (8, 7));
        assert_eq!(ctrl.position().nearest_cell(), (8, 8));

        // Count down the waypoint, the commit happens on a later cycle
        let mut cycles = 0;
        while ctrl.position().nearest_cell() != (8, 7) {
            proc(&mut ctrl).unwrap();
            cycles += 1;
            assert!(cycles < 100);
        }
        assert!(cycles >= 2);
        assert!(ctrl.tasks().is_idle());
        assert_eq!(ctrl.status_light(), StatusLight::Idle);
    }

    #[test]
    fn test_lock_aborts() {
        let mut ctrl = ctrl_at(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.0);
        ctrl.cmd_unlock().unwrap();
        ctrl.cmd_move(8, 4, 3.0, 10.0).unwrap();
        proc(&mut ctrl).unwrap();
        assert!(ctrl.tasks().is_running());

        ctrl.cmd_lock();
        assert!(ctrl.is_locked());
        assert!(ctrl.tasks().is_idle());
        assert_eq!(ctrl.target(), ctrl.position());
        for act in ctrl.eqpt().horizontal.iter().flat_map(|g| g.iter()) {
            assert_eq!(act.velocity_ms, 0.0);
        }

        // Aborting again changes nothing
        ctrl.cmd_abort();
        assert!(ctrl.is_locked());
        assert!(ctrl.tasks().is_idle());
        assert_eq!(ctrl.target(), ctrl.position());
    }

    #[test]
    fn test_rejected_waypoint_aborts() {
        let mut ctrl = ctrl_at(Params::default(), GridPosition::new(8.0, 8.0, 3.0), 0.0);
        ctrl.cmd_unlock().unwrap();
        ctrl.cmd_move(8, 4, 3.0, 10.0).unwrap();

        // Locking without aborting leaves the queue intact, so the next
        // waypoint is refused during execution
        ctrl.safety_lock = true;

        assert!(matches!(proc(&mut ctrl), Err(GantryCtrlError::SafetyLocked)));
        assert!(ctrl.tasks().is_idle());
        assert_eq!(ctrl.target(), ctrl.position());
    }

    #[test]
    fn test_actuator_count_mismatch() {
        let params = Params::default();
        let mut dir = SimDirectory::new(&params, &GridPosition::new(8.0, 8.0, 3.0), 0.0);
        let mut eqpt = GantryEqpt::bind(&mut dir, &params).unwrap();
        eqpt.vertical[0].pop();

        assert!(matches!(
            GantryCtrl::new(params, eqpt),
            Err(GantryCtrlError::ActuatorCount { found: 1, .. })
        ));
    }
}
