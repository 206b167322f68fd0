//! Motion primitives and move planning

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};

// Internal
use super::*;
use crate::task_queue::TaskItem;
use comms_if::eqpt::{Corner, LinearActuator, ProximitySensor, RotationalJoint};
use util::maths::mean;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Command an actuator towards `target_m`, aiming to arrive in `time_s`.
///
/// The velocity is clamped to `speed_limit_ms`, in which case the move takes
/// longer than asked for. The travel limits are narrowed to the span between
/// the current position and the target so the actuator stops on arrival.
///
/// Returns the time the move will actually take.
///
/// Units: meters, seconds
pub fn move_actuator<A: LinearActuator>(
    actuator: &mut A,
    target_m: f64,
    time_s: f64,
    speed_limit_ms: f64,
) -> f64 {
    let current_m = actuator.current_position();
    let delta_m = target_m - current_m;

    let mut actual_time_s = time_s;
    let mut velocity_ms = if time_s > 0.0 {
        delta_m / time_s
    } else {
        f64::INFINITY.copysign(delta_m)
    };

    if velocity_ms.abs() > speed_limit_ms {
        velocity_ms = speed_limit_ms.copysign(velocity_ms);
        actual_time_s = if speed_limit_ms > 0.0 {
            delta_m / velocity_ms
        } else {
            0.0
        };
    }

    if velocity_ms < 0.0 {
        actuator.set_limits(target_m, current_m);
    } else {
        actuator.set_limits(current_m, target_m);
    }
    actuator.set_velocity(velocity_ms);

    actual_time_s
}

/// Drive every actuator in the group to the group's mean extension.
///
/// Returns the longest time any actuator needs.
pub fn equalize_group<A: LinearActuator>(
    actuators: &mut [A],
    time_s: f64,
    speed_limit_ms: f64,
) -> f64 {
    let positions: Vec<f64> = actuators.iter().map(|a| a.current_position()).collect();

    let target_m = match mean(&positions) {
        Some(m) => m,
        None => return 0.0,
    };

    actuators
        .iter_mut()
        .map(|a| move_actuator(a, target_m, time_s, speed_limit_ms))
        .fold(0.0, f64::max)
}

/// Break the straight line from `start` to `target` into waypoints no more
/// than `step_cells` apart in the XY plane.
///
/// `start` itself is not included, the final waypoint is always exactly
/// `target`. At least one waypoint is produced, even when the two positions
/// share a cell.
pub fn travel_points(start: &GridPosition, target: &GridPosition, step_cells: f64) -> Vec<GridPosition> {
    let dist = start.planar_dist(target);

    let num_steps = if step_cells > 0.0 {
        ((dist / step_cells).ceil() as usize).max(1)
    } else {
        1
    };

    let mut points: Vec<GridPosition> = (1..num_steps)
        .map(|i| start.lerp(target, i as f64 / num_steps as f64))
        .collect();
    points.push(*target);

    points
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
    /// Position the next queued move will start from.
    ///
    /// This is the target of the last queued position commit, or the head's
    /// logical position if no move is queued.
    pub(crate) fn plan_origin(&self) -> GridPosition {
        self.tasks
            .iter()
            .rev()
            .find_map(|item| match item.task {
                Task::CommitPosition { target, .. } => Some(target),
                _ => None,
            })
            .unwrap_or(self.position)
    }

    /// Queue the waypoints of a move to `target`, followed by the commit of
    /// the new position.
    ///
    /// `time_s` is split evenly between the waypoints. Returns the number of
    /// waypoints queued.
    pub(crate) fn queue_move(
        &mut self,
        target: GridPosition,
        time_s: f64,
        description: &str,
        on_finish: OnFinish,
    ) -> usize {
        let origin = self.plan_origin();
        let points = travel_points(&origin, &target, self.params.waypoint_step_cells);
        let num_points = points.len();
        let per_point_time_s = time_s / num_points as f64;

        debug!(
            "Queuing move from {} to {} in {:.2} s over {} points",
            origin, target, time_s, num_points
        );

        for (i, point) in points.into_iter().enumerate() {
            trace!("    Point {}: {}", i + 1, point);
            self.tasks.push(TaskItem::new(
                Task::MoveWaypoint {
                    target: point,
                    time_s: per_point_time_s,
                },
                format!("({}/{}) {}", i + 1, num_points, description),
            ));
        }

        self.tasks.push(TaskItem::new(
            Task::CommitPosition { target, on_finish },
            format!("Arrive at {}", target),
        ));

        num_points
    }

    /// Drive every actuator towards the extensions of `target`.
    ///
    /// Returns the time the slowest actuator needs to get there.
    pub(crate) fn execute_move_to(
        &mut self,
        target: GridPosition,
        time_s: f64,
    ) -> Result<f64, GantryCtrlError> {
        if !self.reach_map.is_reachable(&self.params, &target) {
            return Err(GantryCtrlError::Unreachable(target));
        }
        if self.safety_lock {
            return Err(GantryCtrlError::SafetyLocked);
        }

        let horizontal_m = kinematics::horizontal_extensions(&self.params, target.x, target.y);
        let vertical_m = kinematics::vertical_extension(&self.params, target.z);
        let mut max_time_s: f64 = 0.0;

        for corner in Corner::ALL.iter() {
            let i = corner.index();

            for act in self.eqpt.horizontal[i].iter_mut() {
                max_time_s = max_time_s.max(move_actuator(
                    act,
                    horizontal_m[i],
                    time_s,
                    self.params.horizontal_speed_limit_ms,
                ));
            }

            for act in self.eqpt.vertical[i].iter_mut() {
                max_time_s = max_time_s.max(move_actuator(
                    act,
                    vertical_m,
                    time_s,
                    self.params.vertical_speed_limit_ms,
                ));
            }
        }

        self.target = target;

        Ok(max_time_s)
    }

    /// Start equalizing one group at one corner, returning the time needed.
    pub(crate) fn execute_equalize(&mut self, corner: Corner, group: ActuatorGroup, time_s: f64) -> f64 {
        let i = corner.index();

        match group {
            ActuatorGroup::Horizontal => equalize_group(
                &mut self.eqpt.horizontal[i],
                time_s,
                self.params.horizontal_speed_limit_ms,
            ),
            ActuatorGroup::Vertical => equalize_group(
                &mut self.eqpt.vertical[i],
                time_s,
                self.params.vertical_speed_limit_ms,
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Minimal actuator recording what it was told.
    #[derive(Default)]
    struct TestActuator {
        position: f64,
        velocity: f64,
        limits: (f64, f64),
    }

    impl LinearActuator for TestActuator {
        fn current_position(&self) -> f64 {
            self.position
        }
        fn set_limits(&mut self, min_m: f64, max_m: f64) {
            self.limits = (min_m, max_m);
        }
        fn set_velocity(&mut self, velocity_ms: f64) {
            self.velocity = velocity_ms;
        }
        fn set_enabled(&mut self, _: bool) {}
    }

    fn actuator_at(position: f64) -> TestActuator {
        TestActuator {
            position,
            ..Default::default()
        }
    }

    #[test]
    fn test_move_actuator() {
        // Within the speed limit
        let mut act = actuator_at(2.0);
        let time = move_actuator(&mut act, 4.0, 4.0, 1.0);
        assert_eq!(time, 4.0);
        assert_eq!(act.velocity, 0.5);
        assert_eq!(act.limits, (2.0, 4.0));

        // Clamped, moving backwards
        let mut act = actuator_at(5.0);
        let time = move_actuator(&mut act, 1.0, 1.0, 2.0);
        assert_eq!(time, 2.0);
        assert_eq!(act.velocity, -2.0);
        assert_eq!(act.limits, (1.0, 5.0));

        // Already there
        let mut act = actuator_at(3.0);
        let time = move_actuator(&mut act, 3.0, 1.0, 1.0);
        assert_eq!(time, 1.0);
        assert_eq!(act.velocity, 0.0);
        assert_eq!(act.limits, (3.0, 3.0));
    }

    #[test]
    fn test_equalize_group() {
        let mut acts = vec![actuator_at(1.0), actuator_at(3.0)];
        let time = equalize_group(&mut acts, 1.0, 0.5);

        assert_eq!(time, 2.0);
        assert_eq!(acts[0].velocity, 0.5);
        assert_eq!(acts[0].limits, (1.0, 2.0));
        assert_eq!(acts[1].velocity, -0.5);
        assert_eq!(acts[1].limits, (2.0, 3.0));

        let mut empty: Vec<TestActuator> = vec![];
        assert_eq!(equalize_group(&mut empty, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_travel_points() {
        let start = GridPosition::new(0.0, 0.0, 0.0);

        // 5 cells at 2 cells per step gives 3 waypoints
        let target = GridPosition::new(3.0, 4.0, 2.0);
        let points = travel_points(&start, &target, 2.0);
        assert_eq!(points.len(), 3);
        assert_eq!(*points.last().unwrap(), target);
        for pair in points.windows(2) {
            assert!(pair[0].planar_dist(&pair[1]) <= 2.0 + 1e-9);
        }
        assert!((points[0].z - 2.0 / 3.0).abs() < 1e-9);

        // Height only moves still produce a single waypoint
        let target = GridPosition::new(0.0, 0.0, 4.0);
        assert_eq!(travel_points(&start, &target, 2.0), vec![target]);
    }
}
