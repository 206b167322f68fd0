//! # Gantry maps
//!
//! Grids covering the work area, indexed by grid cell. Both maps store their
//! data row-major, so cell `(x, y)` lives at `[[y, x]]`.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod height_map;
mod reach_map;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use height_map::*;
pub use reach_map::*;
