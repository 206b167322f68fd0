//! Height scan of the work area
//!
//! A scan visits reachable cells one after another, each time stopping next
//! to the closest unscanned cell and sweeping the head's four downward
//! sensors to measure the heights of the neighbouring cells. The sweep grows
//! each sensor's range by a fixed step per cycle until it detects something
//! or reaches the floor.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::*;
use comms_if::eqpt::{LinearActuator, ProximitySensor, RotationalJoint, Side, NUM_SIDES};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Session relative path the completed height map is saved to.
const HEIGHT_MAP_SAVE_PATH: &str = "height_maps/height_map.json";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Progress of a height scan.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    /// True from the `heightscan` command until the scan completes or is
    /// aborted.
    pub in_progress: bool,

    /// The sensor sweep at the current position, if one is running.
    pub sweep: Option<SensorSweep>,
}

/// A sweep of the head's sensors from one position.
///
/// Arrays are indexed by [`Side::index`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct SensorSweep {
    /// Current range of each sensor.
    ///
    /// Units: height units
    pub ranges: [f64; NUM_SIDES],

    /// Measured height below each side, once known.
    ///
    /// Units: height units
    pub readings: [Option<f64>; NUM_SIDES],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SensorSweep {
    /// Start a sweep with every sensor at zero range.
    pub fn start<S: ProximitySensor>(sensors: &mut [S; NUM_SIDES]) -> Self {
        for sensor in sensors.iter_mut() {
            sensor.set_range(0.0);
        }

        Self::default()
    }

    /// True once every side has a reading.
    pub fn is_complete(&self) -> bool {
        self.readings.iter().all(|r| r.is_some())
    }

    /// Advance the sweep by one step, with the head at height `z`.
    ///
    /// Each side without a reading either records the height at which its
    /// sensor became active, or extends its range by `range_step`. A side
    /// whose range would go past the floor reads the floor height (0).
    ///
    /// Returns true if every side already had a reading before this step,
    /// so completion is reported on the step after the last reading.
    pub fn step<S: ProximitySensor>(
        &mut self,
        sensors: &mut [S; NUM_SIDES],
        z: f64,
        range_step: f64,
    ) -> bool {
        let mut all_measured = true;

        for side in Side::ALL.iter() {
            let i = side.index();

            if self.readings[i].is_some() {
                continue;
            }
            all_measured = false;

            if sensors[i].is_active() {
                self.readings[i] = Some(z - self.ranges[i]);
            } else {
                self.ranges[i] += range_step;
                if self.ranges[i] > z {
                    self.readings[i] = Some(0.0);
                } else {
                    sensors[i].set_range(self.ranges[i]);
                }
            }
        }

        all_measured
    }
}

impl<A, S, J> GantryCtrl<A, S, J>
where
    A: LinearActuator,
    S: ProximitySensor,
    J: RotationalJoint,
{
    /// Start a height scan of the whole area.
    ///
    /// The height map is reset and a sweep starts at the current position.
    pub fn cmd_heightscan(&mut self) -> Result<(), GantryCtrlError> {
        if self.safety_lock {
            return Err(GantryCtrlError::SafetyLocked);
        }
        if self.scan.in_progress {
            return Err(GantryCtrlError::ScanInProgress);
        }

        self.scan.in_progress = true;
        self.height_map.reset(&self.reach_map);
        self.start_sweep();

        info!(
            "Height scan started, {} cells to measure",
            self.height_map.num_unscanned()
        );

        Ok(())
    }

    pub(crate) fn start_sweep(&mut self) {
        self.scan.sweep = Some(SensorSweep::start(&mut self.eqpt.sensors));
    }

    /// Perform one step of the height scan while no task is running.
    pub(crate) fn height_scan_step(&mut self) {
        if let Some(sweep) = self.scan.sweep.as_mut() {
            if !sweep.step(
                &mut self.eqpt.sensors,
                self.position.z,
                self.params.sensor_range_step,
            ) {
                return;
            }

            let readings = sweep.readings;
            self.scan.sweep = None;
            self.record_sweep(&readings);
        }

        let from = (self.position.x, self.position.y);

        let next = match self.height_map.closest_unscanned(&self.reach_map, from) {
            Some(c) => c,
            None => {
                self.complete_scan();
                return;
            }
        };

        match self
            .height_map
            .closest_measured_neighbour(&self.reach_map, next, from)
        {
            Some((x, y)) => {
                let target = GridPosition::new(x as f64, y as f64, self.position.z);
                self.queue_move(
                    target,
                    self.params.scan_move_time_s,
                    &format!("Moving to scan cell ({}, {})", next.0, next.1),
                    OnFinish::StartSensorSweep,
                );
            }
            None => {
                warn!(
                    "Cell ({}, {}) has no reachable neighbour to scan it from, \
                    marking it unreachable",
                    next.0, next.1
                );
                self.height_map.mark_unreachable(next.0, next.1);
            }
        }
    }

    /// Write the readings of a finished sweep into the height map.
    fn record_sweep(&mut self, readings: &[Option<f64>; NUM_SIDES]) {
        let (x, y) = self.position.nearest_cell();

        for side in Side::ALL.iter() {
            let (dx, dy) = side.cell_offset();

            if let Some(h) = readings[side.index()] {
                if self.height_map.record(x + dx, y + dy, h) {
                    debug!("Measured height {:.2} at ({}, {})", h, x + dx, y + dy);
                }
            }
        }
    }

    fn complete_scan(&mut self) {
        self.scan.in_progress = false;
        self.report.scan_completed = true;

        info!("Height scan complete");

        if let Some(ref session) = self.session {
            session.save_with_timestamp(HEIGHT_MAP_SAVE_PATH, self.height_map.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::DetectionFilter;

    /// Sensor which becomes active at a fixed range.
    struct TestSensor {
        range: f64,
        trigger_range: f64,
    }

    impl ProximitySensor for TestSensor {
        fn set_range(&mut self, range: f64) {
            self.range = range;
        }
        fn set_enabled(&mut self, _: bool) {}
        fn set_detection_filter(&mut self, _: DetectionFilter) {}
        fn is_active(&self) -> bool {
            self.range >= self.trigger_range
        }
    }

    fn sensors(triggers: [f64; NUM_SIDES]) -> [TestSensor; NUM_SIDES] {
        let s = |t: f64| TestSensor {
            range: 5.0,
            trigger_range: t,
        };
        [s(triggers[0]), s(triggers[1]), s(triggers[2]), s(triggers[3])]
    }

    #[test]
    fn test_sweep() {
        // Top sees something 1 unit down, bottom at the head's height, left
        // and right see nothing.
        let mut sensors = sensors([1.0, 0.0, 100.0, 100.0]);
        let mut sweep = SensorSweep::start(&mut sensors);
        assert!(sensors.iter().all(|s| s.range == 0.0));

        let mut steps = 0;
        while !sweep.step(&mut sensors, 2.0, 0.5) {
            steps += 1;
            assert!(steps < 100);
        }

        assert!(sweep.is_complete());
        assert_eq!(sweep.readings[Side::Top.index()], Some(1.0));
        assert_eq!(sweep.readings[Side::Bottom.index()], Some(2.0));
        assert_eq!(sweep.readings[Side::Left.index()], Some(0.0));
        assert_eq!(sweep.readings[Side::Right.index()], Some(0.0));
    }

    #[test]
    fn test_sweep_completion_is_delayed() {
        let mut sensors = sensors([0.0; NUM_SIDES]);
        let mut sweep = SensorSweep::start(&mut sensors);

        // Every sensor is active straight away, readings are taken on the
        // first step and completion reported on the second.
        assert!(!sweep.step(&mut sensors, 3.0, 0.5));
        assert!(sweep.is_complete());
        assert!(sweep.step(&mut sensors, 3.0, 0.5));
    }
}
