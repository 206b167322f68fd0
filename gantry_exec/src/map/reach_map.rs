//! # Reachability Map

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::Array2;
use serde::Serialize;

use crate::gantry_ctrl::{kinematics, GridPosition, Params};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Which grid cells the head can physically be held over.
///
/// A cell is reachable when every corner's horizontal actuators can reach the
/// extension the cell requires. The map is built once and never changes.
#[derive(Debug, Clone, Serialize)]
pub struct ReachMap {
    cells: Array2<bool>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ReachMap {
    /// Build the map for the gantry described by `params`.
    pub fn build(params: &Params) -> Self {
        let cells = Array2::from_shape_fn(
            (params.area_height, params.area_width),
            |(y, x)| {
                kinematics::horizontal_extensions(params, x as f64, y as f64)
                    .iter()
                    .all(|e| kinematics::horizontal_in_range(params, *e))
            },
        );

        Self { cells }
    }

    /// Number of cells along the x axis.
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    /// Number of cells along the y axis.
    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    /// True if `(x, y)` is inside the map.
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    /// True if the cell is inside the map and reachable.
    pub fn is_cell_reachable(&self, x: i64, y: i64) -> bool {
        self.in_bounds(x, y) && self.cells[[y as usize, x as usize]]
    }

    /// Number of reachable cells.
    pub fn num_reachable(&self) -> usize {
        self.cells.iter().filter(|r| **r).count()
    }

    /// Check whether the head can be placed at `pos`.
    ///
    /// The nearest cell must be reachable. If `pos` is between cells (beyond
    /// the fractional tolerance) the neighbouring cell in the direction of the
    /// offset must also be reachable, which lets interpolated waypoints be
    /// validated. The height must be within the vertical actuators' travel.
    pub fn is_reachable(&self, params: &Params, pos: &GridPosition) -> bool {
        if !(pos.x.is_finite() && pos.y.is_finite() && pos.z.is_finite()) {
            return false;
        }

        let (x, y) = pos.nearest_cell();
        if !self.is_cell_reachable(x, y) {
            return false;
        }

        let tol = params.fractional_tolerance_cells;
        let neighbour_ok = |delta: f64, nx: i64, ny: i64, px: i64, py: i64| {
            if delta > tol {
                self.is_cell_reachable(nx, ny)
            } else if delta < -tol {
                self.is_cell_reachable(px, py)
            } else {
                true
            }
        };

        if !neighbour_ok(pos.x - x as f64, x + 1, y, x - 1, y) {
            return false;
        }
        if !neighbour_ok(pos.y - y as f64, x, y + 1, x, y - 1) {
            return false;
        }

        // Each actuator's share of the height is checked against its own
        // travel window `[floor/n, ceiling/n]`, not against the total floor
        // and ceiling. This admits z from 0 up to (ceiling - floor) / cell.
        kinematics::vertical_in_range(params, kinematics::vertical_extension(params, pos.z))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::Corner;

    #[test]
    fn test_matches_kinematics() {
        let params = Params::default();
        let map = ReachMap::build(&params);

        assert_eq!(map.width(), 17);
        assert_eq!(map.height(), 17);
        assert!(map.num_reachable() > 0);

        for y in 0..17 {
            for x in 0..17 {
                let in_range = Corner::ALL.iter().all(|c| {
                    let e = kinematics::horizontal_extension(&params, *c, x as f64, y as f64);
                    e >= 0.0 && e <= params.max_horizontal_extension_m
                });
                assert_eq!(map.is_cell_reachable(x, y), in_range, "cell ({}, {})", x, y);

                // Integer positions agree with the map at any valid height
                assert_eq!(
                    map.is_reachable(&params, &GridPosition::new(x as f64, y as f64, 2.0)),
                    in_range
                );
            }
        }

        assert!(map.is_cell_reachable(8, 8));
        assert!(!map.is_cell_reachable(0, 0));
        assert!(!map.is_cell_reachable(-1, 8));
        assert!(!map.is_cell_reachable(8, 17));
    }

    #[test]
    fn test_fractional_positions() {
        let params = Params::default();
        let map = ReachMap::build(&params);

        // Find a reachable cell on the right hand edge of the reachable area
        let (x, y) = (0..17i64)
            .flat_map(|y| (0..17i64).map(move |x| (x, y)))
            .find(|&(x, y)| {
                map.is_cell_reachable(x, y)
                    && map.is_cell_reachable(x - 1, y)
                    && !map.is_cell_reachable(x + 1, y)
            })
            .unwrap();

        assert!(map.is_reachable(&params, &GridPosition::new(x as f64, y as f64, 1.0)));
        assert!(map.is_reachable(&params, &GridPosition::new(x as f64 + 0.005, y as f64, 1.0)));
        assert!(!map.is_reachable(&params, &GridPosition::new(x as f64 + 0.3, y as f64, 1.0)));

        // Moving back towards the centre is fine
        assert!(map.is_reachable(&params, &GridPosition::new(x as f64 - 0.3, y as f64, 1.0)));

        // Property: a positive offset is only reachable if the next cell is
        for y in 0..17i64 {
            for x in 0..17i64 {
                let pos = GridPosition::new(x as f64 + 0.25, y as f64, 1.0);
                if map.is_reachable(&params, &pos) {
                    assert!(map.is_cell_reachable(x + 1, y));
                }
            }
        }
    }

    #[test]
    fn test_height_limits() {
        let params = Params::default();
        let map = ReachMap::build(&params);

        assert!(map.is_reachable(&params, &GridPosition::new(8.0, 8.0, 0.0)));
        assert!(map.is_reachable(&params, &GridPosition::new(8.0, 8.0, params.max_z())));
        assert!(!map.is_reachable(&params, &GridPosition::new(8.0, 8.0, -0.5)));
        assert!(!map.is_reachable(&params, &GridPosition::new(8.0, 8.0, params.max_z() + 0.5)));
        assert!(!map.is_reachable(&params, &GridPosition::new(8.0, f64::NAN, 1.0)));
    }
}
