//! Main gantry executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging, parameters and equipment
//!     - Main loop:
//!         - Equipment simulation
//!         - Telecommand processing and handling
//!         - Gantry control processing
//!         - Status lights and operator screens
//!
//! Telecommands come either from a script, given as the only argument, or
//! are typed by the operator on the console.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use gantry_lib::{
    data_store::DataStore,
    eqpt::GantryEqpt,
    gantry_ctrl::{self, GantryCtrl},
    sim::{self, SimDirectory, SimGantryCtrl, SimParams, SimStatusLights, SimTextPanel},
    tm::{self, GantryTm},
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use std::env;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use comms_if::{
    eqpt::{StatusIndicator, TextSink},
    tc::{Tc, TcResponse},
};
use util::{
    logger::{logger_init, LevelFilter, LogLevels},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

/// Consecutive overruns after which the simulation is reported as lagging.
const MAX_CONSEC_CYCLE_OVERRUNS: u64 = 50;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("gantry_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger, the operator console only gets info and above
    logger_init(
        LogLevels {
            console: LevelFilter::Info,
            file: LevelFilter::Trace,
        },
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Gantry Controller Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let ctrl_params: gantry_ctrl::Params =
        util::params::load("gantry_ctrl.toml").wrap_err("Could not load GantryCtrl params")?;

    let sim_params: SimParams =
        util::params::load("gantry_sim.toml").wrap_err("Could not load simulation params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let mut tc_source = match args.len() {
        // If we have a single argument use it as the script path
        2 => {
            info!("Loading script from \"{}\"", &args[1]);

            let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            TcSource::Script(si)
        }
        // If no arguments read commands from the console
        1 => {
            info!("No script provided, reading commands from the console\n");
            TcSource::Console(spawn_console_reader())
        }
        _ => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                args.len() - 1
            ))
        }
    };

    // ---- INITIALISE EQUIPMENT ----

    info!("Initialising equipment...");

    let mut directory =
        SimDirectory::new(&ctrl_params, &sim_params.start_position, sim_params.misalignment_m);
    let terrain = sim_params.build_terrain(ctrl_params.area_width, ctrl_params.area_height);

    let eqpt = GantryEqpt::bind(&mut directory, &ctrl_params)
        .wrap_err("Failed to bind the gantry equipment")?;

    let mut status_lights = SimStatusLights::default();
    let mut map_screen = SimTextPanel::new("Map screen");
    let mut debug_screen = SimTextPanel::new("Debug screen");

    info!("Equipment initialisation complete");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    let sim_ctrl_params = ctrl_params.clone();
    let mut ctrl: SimGantryCtrl = GantryCtrl::init((ctrl_params, eqpt), &session)
        .wrap_err("Failed to initialise GantryCtrl")?;
    info!("GantryCtrl init complete");

    if ctrl.needs_initialization() {
        warn!("Actuators need initialisation, run 'init' before unlocking");
    }

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut last_cycle_start = Instant::now();
    let mut end_of_tcs = false;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();
        let elapsed_s = (cycle_start_instant - last_cycle_start).as_secs_f64();
        last_cycle_start = cycle_start_instant;

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ, elapsed_s);

        // ---- EQUIPMENT SIMULATION ----

        sim::advance(ctrl.eqpt_mut(), elapsed_s);
        let cell = ctrl.position().nearest_cell();
        sim::update_sensors(ctrl.eqpt_mut(), &sim_ctrl_params, &terrain, cell);

        // ---- TELECOMMAND PROCESSING ----

        if !end_of_tcs {
            match tc_source.pending_tcs() {
                Ok(tcs) => {
                    for tc in tcs.iter() {
                        log_response(tc, tc_processor::exec(&mut ctrl, tc));
                    }
                }
                Err(reason) => {
                    info!("{}, stopping once the gantry is idle", reason);
                    end_of_tcs = true;
                }
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ctrl.proc(&ds.gantry_ctrl_input) {
            Ok((o, r)) => {
                ds.gantry_ctrl_output = Some(o);
                ds.gantry_ctrl_status_rpt = r;
            }
            Err(e) => {
                // A rejected waypoint has already aborted the controller, so
                // just issue the warning and continue.
                warn!("Error during GantryCtrl processing: {}", e)
            }
        };

        // ---- TELEMETRY ----

        if let Some(ok) = ds.gantry_ctrl_status_rpt.init_result {
            info!("Initialisation {}", if ok { "succeeded" } else { "failed" });
        }
        if ds.gantry_ctrl_status_rpt.scan_completed {
            info!("Height scan completed at {:.1} s", ds.session_time_s);
        }

        // Processing errors leave no output, the controller then reports its
        // state directly
        status_lights.set_status(match ds.gantry_ctrl_output {
            Some(o) => o.status,
            None => ctrl.status_light(),
        });

        if ds.is_1_hz_cycle {
            map_screen.write_lines(&tm::map_view(&ctrl));
            debug_screen.write_lines(&tm::debug_view(&ctrl));

            debug!(
                "Task: {}, {:.2} s left, {} queued",
                ds.gantry_ctrl_status_rpt
                    .current_task
                    .as_deref()
                    .unwrap_or("none"),
                ds.gantry_ctrl_status_rpt.task_time_left_s,
                ds.gantry_ctrl_status_rpt.num_queued_tasks
            );

            match serde_json::to_string(&GantryTm::from_ctrl(&ctrl)) {
                Ok(s) => trace!("TM at {:.1} s: {}", ds.session_time_s, s),
                Err(e) => warn!("Could not serialise telemetry: {}", e),
            }
        }

        if end_of_tcs && ctrl.tasks().is_idle() && !ctrl.is_scanning() {
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.cycle_on_time();
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );

                if ds.cycle_overrun(MAX_CONSEC_CYCLE_OVERRUNS) {
                    warn!(
                        "{} consecutive cycle overruns, the simulation is running slower than \
                        real time",
                        ds.num_consec_cycle_overruns
                    );
                }
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    map_screen.write_lines(&tm::map_view(&ctrl));
    info!("Final map:\n{}", map_screen.lines.join("\n"));

    info!("End of execution");

    session.exit();

    Ok(())
}

/// Log the operator response to a TC.
fn log_response(tc: &Tc, response: TcResponse) {
    match response {
        TcResponse::Ok(msg) => info!("{}: {}", tc, msg),
        TcResponse::Invalid(msg) | TcResponse::CannotExecute(msg) => warn!("{}: {}", tc, msg),
    }
}

/// Read lines typed on the console in a background thread.
fn spawn_console_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if tx.send(l).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Could not read from the console: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
enum TcSource {
    Script(ScriptInterpreter),
    Console(Receiver<String>),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TcSource {
    /// Get the TCs to execute this cycle, or the reason no more TCs will
    /// arrive.
    ///
    /// Console lines which can't be parsed are reported and skipped.
    fn pending_tcs(&mut self) -> Result<Vec<Tc>, &'static str> {
        match self {
            TcSource::Script(si) => match si.get_pending_tcs() {
                PendingTcs::None => Ok(Vec::new()),
                PendingTcs::Some(tcs) => Ok(tcs),
                PendingTcs::EndOfScript => Err("End of TC script reached"),
            },
            TcSource::Console(rx) => {
                let mut tcs = Vec::new();

                loop {
                    match rx.try_recv() {
                        Ok(line) if line.trim().is_empty() => (),
                        Ok(line) => match Tc::parse(&line) {
                            Ok(tc) => tcs.push(tc),
                            Err(e) => warn!("{}", TcResponse::Invalid(e.to_string())),
                        },
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            if tcs.is_empty() {
                                return Err("Console closed");
                            }
                            break;
                        }
                    }
                }

                Ok(tcs)
            }
        }
    }
}
