//! # Gantry kinematics
//!
//! Maps logical grid positions of the head onto actuator extensions, and
//! recovers the logical position which best matches a set of actuator
//! readings.
//!
//! Each corner pulls the head towards an anchor point with a chain of
//! horizontal actuators. The anchor of a corner sits at the corner of the
//! area, offset inwards by the head's half width so that the chain length is
//! measured between attachment points. The chain length between the two end
//! joints is one cell shorter than the anchor distance, and is shared equally
//! by every actuator in the chain once their retracted lengths are removed.
//!
//! All functions in this module are pure.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

use comms_if::eqpt::{Corner, NUM_CORNERS};
use util::maths::sum_sq_diff;

use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A logical position of the head.
///
/// `x` and `y` are in grid cells and are integers for committed positions,
/// fractional values only occur on interpolated waypoints. `z` is in height
/// units above the floor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GridPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The grid cell nearest to this position.
    pub fn nearest_cell(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }

    /// Distance between the two positions in the XY plane.
    ///
    /// Units: grid cells
    pub fn planar_dist(&self, other: &GridPosition) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`).
    pub fn lerp(&self, other: &GridPosition, t: f64) -> GridPosition {
        GridPosition {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Distance from a corner's anchor to the head when the head is at `(x, y)`.
///
/// Units: grid cells
pub fn anchor_distance(params: &Params, corner: Corner, x: f64, y: f64) -> f64 {
    let half_width = params.head_half_width_cells;
    let max_x = (params.area_width - 1) as f64;
    let max_y = (params.area_height - 1) as f64;

    let dx = if corner.is_left() { x - half_width } else { max_x - x - half_width };
    let dy = if corner.is_top() { y - half_width } else { max_y - y - half_width };

    dx.hypot(dy)
}

/// Extension of each horizontal actuator at `corner` when the head is at
/// `(x, y)`.
///
/// Units: meters
pub fn horizontal_extension(params: &Params, corner: Corner, x: f64, y: f64) -> f64 {
    let num_acts = params.num_horizontal_actuators as f64;

    let joint_dist_m = anchor_distance(params, corner, x, y) * params.cell_size_m
        - params.cell_size_m;

    (joint_dist_m - num_acts * params.retracted_actuator_length_m) / num_acts
}

/// Horizontal actuator extensions for every corner, indexed by
/// [`Corner::index`].
///
/// Units: meters
pub fn horizontal_extensions(params: &Params, x: f64, y: f64) -> [f64; NUM_CORNERS] {
    let mut exts = [0.0; NUM_CORNERS];
    for corner in Corner::ALL.iter() {
        exts[corner.index()] = horizontal_extension(params, *corner, x, y);
    }
    exts
}

/// Extension of each vertical actuator when the head is at height `z`.
///
/// Every vertical actuator at every corner shares this target.
///
/// Units: meters
pub fn vertical_extension(params: &Params, z: f64) -> f64 {
    (z * params.cell_size_m + params.floor_height_m) / params.num_vertical_actuators as f64
}

/// True if a horizontal actuator can physically reach the extension.
pub fn horizontal_in_range(params: &Params, extension_m: f64) -> bool {
    extension_m >= 0.0 && extension_m <= params.max_horizontal_extension_m
}

/// True if every vertical actuator can physically reach the extension, so
/// that the stack's total height lies between the floor and the ceiling.
pub fn vertical_in_range(params: &Params, extension_m: f64) -> bool {
    extension_m >= params.vertical_min_m() && extension_m <= params.vertical_max_m()
}

/// Find the reachable grid point whose horizontal extensions best match the
/// given actuator readings.
///
/// `readings` holds the current position of each horizontal actuator, per
/// corner. The match is the smallest sum of squared differences between the
/// readings and the point's extensions. Points are searched in row-major
/// order and the first best match is kept.
///
/// This is a brute force search over the whole area, which is small enough
/// that nothing cleverer is needed.
///
/// Returns `None` if no grid point is reachable.
pub fn closest_reachable(
    params: &Params,
    readings: &[Vec<f64>; NUM_CORNERS],
) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;

    for y in 0..params.area_height {
        for x in 0..params.area_width {
            let exts = horizontal_extensions(params, x as f64, y as f64);

            if !exts.iter().all(|e| horizontal_in_range(params, *e)) {
                continue;
            }

            let mut mismatch = 0.0;
            for corner in Corner::ALL.iter() {
                let corner_readings = &readings[corner.index()];
                let targets = vec![exts[corner.index()]; corner_readings.len()];
                mismatch += sum_sq_diff(corner_readings, &targets).unwrap_or(0.0);
            }

            match best {
                Some((_, best_mismatch)) if mismatch >= best_mismatch => (),
                _ => best = Some(((x, y), mismatch)),
            }
        }
    }

    best.map(|(cell, _)| cell)
}

/// Recover the logical height from vertical actuator readings, per corner.
///
/// Units: height units
pub fn height_from_vertical(params: &Params, readings: &[Vec<f64>; NUM_CORNERS]) -> f64 {
    let min_m = params.vertical_min_m();

    let total_m: f64 = readings
        .iter()
        .flat_map(|corner| corner.iter())
        .map(|pos| pos - min_m)
        .sum();

    total_m / NUM_CORNERS as f64 / params.cell_size_m
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn readings_at(params: &Params, x: f64, y: f64) -> [Vec<f64>; NUM_CORNERS] {
        let exts = horizontal_extensions(params, x, y);
        let n = params.num_horizontal_actuators;
        [
            vec![exts[0]; n],
            vec![exts[1]; n],
            vec![exts[2]; n],
            vec![exts[3]; n],
        ]
    }

    #[test]
    fn test_extension_values() {
        let params = Params::default();

        // Centre of the 17x17 area, 7 cells from each anchor in x and y
        let expected = ((98f64).sqrt() * 2.5 - 2.5 - 2.0 * 5.159) / 2.0;
        for e in horizontal_extensions(&params, 8.0, 8.0).iter() {
            assert!((e - expected).abs() < 1e-9);
        }

        // Directly below the top left anchor the chain is shorter than fully
        // retracted
        assert!(horizontal_extension(&params, Corner::TopLeft, 1.0, 1.0) < 0.0);

        assert!((vertical_extension(&params, 3.0) - 5.0).abs() < 1e-9);
        assert!((vertical_extension(&params, 0.0) - params.vertical_min_m()).abs() < 1e-9);
        assert!((vertical_extension(&params, params.max_z()) - params.vertical_max_m()).abs() < 1e-9);
    }

    #[test]
    fn test_symmetry() {
        let params = Params::default();

        let tl = horizontal_extension(&params, Corner::TopLeft, 5.0, 6.0);
        let tr = horizontal_extension(&params, Corner::TopRight, 11.0, 6.0);
        let bl = horizontal_extension(&params, Corner::BottomLeft, 5.0, 10.0);
        let br = horizontal_extension(&params, Corner::BottomRight, 11.0, 10.0);

        assert!((tl - tr).abs() < 1e-9);
        assert!((tl - bl).abs() < 1e-9);
        assert!((tl - br).abs() < 1e-9);
    }

    #[test]
    fn test_closest_reachable() {
        let params = Params::default();

        assert_eq!(closest_reachable(&params, &readings_at(&params, 8.0, 8.0)), Some((8, 8)));
        assert_eq!(closest_reachable(&params, &readings_at(&params, 6.0, 9.0)), Some((6, 9)));

        // Readings slightly off a grid point still match it
        let mut readings = readings_at(&params, 7.0, 10.0);
        readings[0][0] += 0.1;
        readings[3][1] -= 0.1;
        assert_eq!(closest_reachable(&params, &readings), Some((7, 10)));

        // No reachable points at all
        let params = Params {
            max_horizontal_extension_m: -1.0,
            ..Params::default()
        };
        assert_eq!(closest_reachable(&params, &readings), None);
    }

    #[test]
    fn test_height_from_vertical() {
        let params = Params::default();
        let v = vertical_extension(&params, 3.0);

        let readings = [vec![v; 2], vec![v; 2], vec![v; 2], vec![v; 2]];
        assert!((height_from_vertical(&params, &readings) - 3.0).abs() < 1e-9);

        // Symmetric drift within a corner cancels out
        let readings = [vec![v + 0.3, v - 0.3], vec![v; 2], vec![v - 0.1, v + 0.1], vec![v; 2]];
        assert!((height_from_vertical(&params, &readings) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_grid_position() {
        let a = GridPosition::new(1.0, 2.0, 3.0);
        let b = GridPosition::new(4.0, 6.0, 1.0);

        assert!((a.planar_dist(&b) - 5.0).abs() < 1e-9);
        assert_eq!(a.lerp(&b, 0.5), GridPosition::new(2.5, 4.0, 2.0));
        assert_eq!(GridPosition::new(2.5, 1.49, 0.0).nearest_cell(), (3, 1));
    }
}
