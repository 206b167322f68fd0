//! # Gantry utility library
//!
//! Infrastructure shared by the gantry executables: the [`session`] every run
//! writes its logs and saved data into, the [`logger`] on top of it,
//! [`params`] files under the software root, the cyclic [`module::State`]
//! interface and the timed telecommand [`script_interpreter`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod host;
pub mod logger;
pub mod maths;
pub mod module;
pub mod params;
pub mod script_interpreter;
pub mod session;
pub mod time;

// Scripts produce `comms_if` telecommands, so users of the interpreter get the
// same crate version through here.
pub use comms_if;

// ---------------------------------------------------------------------------
// MACROS
// ---------------------------------------------------------------------------

/// Log an error and panic.
///
/// Only for states the executable cannot continue from, such as a constant
/// pattern failing to compile. Anything an operator or a device can cause
/// returns an error instead.
#[macro_export]
macro_rules! raise_error {
    ($fmt:expr) => ({
        log::error!("{}", $fmt);
        std::panic!("Unrecoverable error: {}", $fmt);
    });
    ($fmt:expr, $($arg:tt)+) => ({
        let msg = std::format!($fmt, $($arg)+);
        log::error!("{}", msg);
        std::panic!("Unrecoverable error: {}", msg);
    });
}
