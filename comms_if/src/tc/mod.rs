//! # Telecommand module
//!
//! This module provides the operator telecommands accepted by the gantry
//! controller. Telecommands arrive as short strings such as `move 8 8 3 10`
//! and are parsed into [`Tc`] before being handed to the controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the gantry by an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tc {
    /// Equalise all actuator groups and move to the nearest grid point,
    /// leaving the gantry locked.
    Init,

    /// Release the safety lock.
    Unlock,

    /// Engage the safety lock, aborting any motion.
    Lock,

    /// Move the head to the given grid point over the given time.
    Move {
        x: i64,
        y: i64,
        z: f64,
        time_s: f64
    },

    /// Stop all motion and return to idle.
    Abort,

    /// Start a full height scan of the reachable area.
    HeightScan
}

/// Response to a telecommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TcResponse {
    /// The TC was accepted, with a message for the operator.
    Ok(String),

    /// The TC could not be parsed.
    Invalid(String),

    /// The TC was understood but cannot be executed in the current state.
    CannotExecute(String)
}

/// Possible parsing errors.
#[derive(Debug, Error, PartialEq)]
pub enum TcParseError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid {0} command format! Use: {1}")]
    InvalidFormat(&'static str, &'static str),

    #[error("Invalid {name} argument \"{value}\", expected {expected}")]
    InvalidArgument {
        name: &'static str,
        value: String,
        expected: &'static str
    }
}

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const MOVE_USAGE: &str = "move <x> <y> <z> <time>";

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {

    /// Parse a TC from an operator command string.
    pub fn parse(cmd_str: &str) -> Result<Self, TcParseError> {
        let mut words = cmd_str.split_whitespace();

        let name = match words.next() {
            Some(n) => n,
            None => return Err(TcParseError::UnknownCommand(String::new()))
        };
        let args: Vec<&str> = words.collect();

        let tc = match name {
            "init" => Tc::Init,
            "unlock" => Tc::Unlock,
            "lock" => Tc::Lock,
            "abort" => Tc::Abort,
            "heightscan" => Tc::HeightScan,
            "move" => return Self::parse_move(&args),
            _ => return Err(TcParseError::UnknownCommand(cmd_str.trim().to_string()))
        };

        // Argumentless commands must not be given arguments
        if !args.is_empty() {
            return Err(TcParseError::UnknownCommand(cmd_str.trim().to_string()))
        }

        Ok(tc)
    }

    fn parse_move(args: &[&str]) -> Result<Self, TcParseError> {
        if args.len() != 4 {
            return Err(TcParseError::InvalidFormat("move", MOVE_USAGE))
        }

        let x = parse_arg::<i64>("x", args[0], "an integer grid coordinate")?;
        let y = parse_arg::<i64>("y", args[1], "an integer grid coordinate")?;
        let z = parse_arg::<f64>("z", args[2], "a height")?;
        let time_s = parse_arg::<f64>("time", args[3], "a duration in seconds")?;

        if !z.is_finite() {
            return Err(TcParseError::InvalidArgument {
                name: "z",
                value: args[2].to_string(),
                expected: "a finite height"
            })
        }

        if !(time_s.is_finite() && time_s > 0.0) {
            return Err(TcParseError::InvalidArgument {
                name: "time",
                value: args[3].to_string(),
                expected: "a positive duration in seconds"
            })
        }

        Ok(Tc::Move { x, y, z, time_s })
    }
}

impl fmt::Display for Tc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tc::Init => write!(f, "init"),
            Tc::Unlock => write!(f, "unlock"),
            Tc::Lock => write!(f, "lock"),
            Tc::Move { x, y, z, time_s } => write!(f, "move {} {} {} {}", x, y, z, time_s),
            Tc::Abort => write!(f, "abort"),
            Tc::HeightScan => write!(f, "heightscan"),
        }
    }
}

impl fmt::Display for TcResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcResponse::Ok(m) => write!(f, "{}", m),
            TcResponse::Invalid(m) => write!(f, "{}", m),
            TcResponse::CannotExecute(m) => write!(f, "{}", m),
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn parse_arg<T: std::str::FromStr>(
    name: &'static str,
    value: &str,
    expected: &'static str
) -> Result<T, TcParseError> {
    value.parse().map_err(|_| TcParseError::InvalidArgument {
        name,
        value: value.to_string(),
        expected
    })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_simple() {
        assert_eq!(Tc::parse("init"), Ok(Tc::Init));
        assert_eq!(Tc::parse("  unlock "), Ok(Tc::Unlock));
        assert_eq!(Tc::parse("lock"), Ok(Tc::Lock));
        assert_eq!(Tc::parse("abort"), Ok(Tc::Abort));
        assert_eq!(Tc::parse("heightscan"), Ok(Tc::HeightScan));

        assert_eq!(
            Tc::parse("jump"),
            Err(TcParseError::UnknownCommand("jump".into()))
        );
        assert_eq!(
            Tc::parse("lock now"),
            Err(TcParseError::UnknownCommand("lock now".into()))
        );
        assert!(Tc::parse("").is_err());
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(
            Tc::parse("move 5 5 3 10"),
            Ok(Tc::Move { x: 5, y: 5, z: 3.0, time_s: 10.0 })
        );
        assert_eq!(
            Tc::parse("move -1 4 2.5 0.5"),
            Ok(Tc::Move { x: -1, y: 4, z: 2.5, time_s: 0.5 })
        );

        assert_eq!(
            Tc::parse("move 5 5 3"),
            Err(TcParseError::InvalidFormat("move", MOVE_USAGE))
        );
        assert!(matches!(
            Tc::parse("move 5.5 5 3 10"),
            Err(TcParseError::InvalidArgument { name: "x", .. })
        ));
        assert!(matches!(
            Tc::parse("move 5 5 three 10"),
            Err(TcParseError::InvalidArgument { name: "z", .. })
        ));
        assert!(matches!(
            Tc::parse("move 5 5 3 0"),
            Err(TcParseError::InvalidArgument { name: "time", .. })
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let tc = Tc::Move { x: 3, y: 4, z: 1.5, time_s: 2.0 };
        assert_eq!(Tc::parse(&tc.to_string()), Ok(tc));
    }
}
