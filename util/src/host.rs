//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "GANTRY_SW_ROOT";

/// Get the root directory of the gantry software, which contains the
/// `params` and `sessions` directories.
pub fn get_gantry_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
