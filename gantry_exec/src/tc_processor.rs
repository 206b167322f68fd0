//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source, passing them
//! on to GantryCtrl and building the response for the operator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use comms_if::{
    eqpt::{LinearActuator, ProximitySensor, RotationalJoint},
    tc::{Tc, TcResponse},
};
use gantry_lib::gantry_ctrl::{GantryCtrl, GantryCtrlError, InitOutcome};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
pub(crate) fn exec<A, S, J>(ctrl: &mut GantryCtrl<A, S, J>, tc: &Tc) -> TcResponse
where
    A: LinearActuator,
    S: ProximitySensor,
    J: RotationalJoint,
{
    debug!("Recieved {} command", tc);

    match tc {
        Tc::Init => match ctrl.cmd_init() {
            Ok(InitOutcome::Started) => ok("Initialising actuators."),
            Ok(InitOutcome::AlreadyInitialised) => ok("Actuators are already initialised."),
            Err(e) => cannot_execute("Cannot initialise actuators", e),
        },
        Tc::Unlock => match ctrl.cmd_unlock() {
            Ok(()) => ok("Safety lock disabled."),
            Err(e) => cannot_execute("Cannot unlock safety lock", e),
        },
        Tc::Lock => {
            ctrl.cmd_lock();
            ok("Safety lock enabled.")
        }
        Tc::Move { x, y, z, time_s } => match ctrl.cmd_move(*x, *y, *z, *time_s) {
            Ok(n) => TcResponse::Ok(format!("Queued {} over {} points.", tc, n)),
            Err(e) => cannot_execute("Cannot move head", e),
        },
        Tc::Abort => {
            ctrl.cmd_abort();
            ok("Aborting movement.")
        }
        Tc::HeightScan => match ctrl.cmd_heightscan() {
            Ok(()) => ok("Initiated height scan process."),
            Err(e) => cannot_execute("Cannot start height scan", e),
        },
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn ok(msg: &str) -> TcResponse {
    TcResponse::Ok(msg.to_string())
}

fn cannot_execute(action: &str, e: GantryCtrlError) -> TcResponse {
    let hint = match e {
        GantryCtrlError::SafetyLocked => " Run 'unlock' to proceed.",
        GantryCtrlError::NeedsInit => " Run 'init' command first.",
        _ => "",
    };

    TcResponse::CannotExecute(format!("{}: {}!{}", action, e, hint))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use gantry_lib::eqpt::GantryEqpt;
    use gantry_lib::gantry_ctrl::{GridPosition, Params};
    use gantry_lib::sim::{SimDirectory, SimGantryCtrl};

    fn ctrl(misalignment_m: f64) -> SimGantryCtrl {
        let params = Params::default();
        let mut dir = SimDirectory::new(&params, &GridPosition::new(8.0, 8.0, 3.0), misalignment_m);
        let eqpt = GantryEqpt::bind(&mut dir, &params).unwrap();
        GantryCtrl::new(params, eqpt).unwrap()
    }

    #[test]
    fn test_responses() {
        let mut ctrl = ctrl(0.0);

        let move_tc = Tc::Move { x: 8, y: 6, z: 3.0, time_s: 5.0 };
        assert_eq!(
            exec(&mut ctrl, &move_tc),
            TcResponse::CannotExecute(
                "Cannot move head: Safety lock is enabled! Run 'unlock' to proceed.".into()
            )
        );

        assert_eq!(
            exec(&mut ctrl, &Tc::Init),
            TcResponse::Ok("Actuators are already initialised.".into())
        );
        assert_eq!(exec(&mut ctrl, &Tc::Unlock), TcResponse::Ok("Safety lock disabled.".into()));
        assert!(matches!(exec(&mut ctrl, &move_tc), TcResponse::Ok(_)));
        assert_eq!(exec(&mut ctrl, &Tc::Lock), TcResponse::Ok("Safety lock enabled.".into()));
        assert!(ctrl.tasks().is_idle());
    }

    #[test]
    fn test_unlock_needs_init() {
        let mut ctrl = ctrl(0.5);

        assert_eq!(
            exec(&mut ctrl, &Tc::Unlock),
            TcResponse::CannotExecute(
                "Cannot unlock safety lock: Actuators need initialisation! \
                Run 'init' command first."
                    .into()
            )
        );
        assert_eq!(exec(&mut ctrl, &Tc::Init), TcResponse::Ok("Initialising actuators.".into()));
    }
}
