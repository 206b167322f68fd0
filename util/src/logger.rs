//! Logger set up for the gantry executables
//!
//! Records go to two places: the operator's console and the session log file.
//! The console is coloured and filtered separately so that operator feedback
//! isn't buried under per-cycle traces, while the file keeps everything down
//! to the file level as plain text.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets logged at no finer than debug, even when the file level is trace.
///
/// The simulated equipment traces every device on every cycle.
const NOISY_TARGETS: [&str; 1] = ["gantry_lib::sim"];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Levels for each of the logger's outputs.
#[derive(Debug, Clone, Copy)]
pub struct LogLevels {
    pub console: LevelFilter,
    pub file: LevelFilter,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The {0} log level must include info messages, found `{1}`")]
    LevelTooCoarse(&'static str, LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// Both levels must let `Info` records through, since command responses and
/// the init and scan outcomes are logged at info.
///
/// Must only be called once per process.
pub fn logger_init(levels: LogLevels, session: &session::Session) -> Result<(), LoggerInitError> {
    if levels.console < Level::Info {
        return Err(LoggerInitError::LevelTooCoarse("console", levels.console));
    }
    if levels.file < Level::Info {
        return Err(LoggerInitError::LevelTooCoarse("file", levels.file));
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| write_record(out, message, record, true))
        .level(levels.console)
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| write_record(out, message, record, false))
        .level(levels.file)
        .chain(log_file);

    let root = NOISY_TARGETS.iter().fold(
        fern::Dispatch::new().level(levels.console.max(levels.file)),
        |d, target| d.level_for(*target, LevelFilter::Debug.min(levels.file)),
    );

    root.chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Console level: {:?}, file level: {:?}", levels.console, levels.file);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Write a record with the session time and level tag.
///
/// Records finer than info also carry their target.
fn write_record(out: fern::FormatCallback, message: &fmt::Arguments, record: &Record, colour: bool) {
    let time_s = session::get_elapsed_seconds();
    let tag = level_tag(record.level(), colour);

    if record.level() > Level::Info {
        out.finish(format_args!("[{:10.6} {}] {}: {}", time_s, tag, record.target(), message))
    } else {
        out.finish(format_args!("[{:10.6} {}] {}", time_s, tag, message))
    }
}

/// Tag for a log level, coloured for the console.
fn level_tag(level: Level, colour: bool) -> ColoredString {
    let tag = match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    };

    if !colour {
        return tag.normal();
    }

    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
