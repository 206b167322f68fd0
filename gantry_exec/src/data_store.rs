//! # Data Store

use crate::gantry_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Time since the start of the session
    pub session_time_s: f64,

    // GantryCtrl
    pub gantry_ctrl_input: gantry_ctrl::InputData,
    pub gantry_ctrl_output: Option<gantry_ctrl::OutputData>,
    pub gantry_ctrl_status_rpt: gantry_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    /// `elapsed_s` is the time since the start of the previous cycle.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, elapsed_s: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128).max(1) == 0;

        self.gantry_ctrl_input = gantry_ctrl::InputData { elapsed_s };
        self.gantry_ctrl_output = None;
        self.gantry_ctrl_status_rpt = gantry_ctrl::StatusReport::default();

        self.session_time_s = util::session::get_elapsed_seconds();
    }

    /// Record a cycle which finished within its period.
    pub fn cycle_on_time(&mut self) {
        self.num_consec_cycle_overruns = 0;
    }

    /// Record a cycle overrun.
    ///
    /// Returns true on the overrun which makes `limit` in a row, so the
    /// caller reports a lagging loop once per streak.
    pub fn cycle_overrun(&mut self, limit: u64) -> bool {
        self.num_consec_cycle_overruns += 1;
        self.num_consec_cycle_overruns == limit
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_overrun_streak() {
        let mut ds = DataStore::default();

        assert!(!ds.cycle_overrun(3));
        assert!(!ds.cycle_overrun(3));
        assert!(ds.cycle_overrun(3));
        assert!(!ds.cycle_overrun(3));
        assert_eq!(ds.num_consec_cycle_overruns, 4);

        // An on time cycle starts a new streak
        ds.cycle_on_time();
        assert_eq!(ds.num_consec_cycle_overruns, 0);
        assert!(!ds.cycle_overrun(2));
        assert!(ds.cycle_overrun(2));
    }
}
