//! Simulated terrain under the gantry

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::Array2;
use noise::{NoiseFn, Perlin};
use serde::Serialize;

use util::maths::lin_map;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Height of whatever stands on each cell of the work area, indexed
/// `[[y, x]]`.
///
/// Units: height units
#[derive(Debug, Clone, Serialize)]
pub struct SimTerrain {
    heights: Array2<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimTerrain {
    /// Terrain of the same height everywhere.
    pub fn flat(width: usize, height: usize, height_units: f64) -> Self {
        Self {
            heights: Array2::from_elem((height, width), height_units),
        }
    }

    /// Generate random terrain using Perlin noise, mapped onto the
    /// `height_range`.
    pub fn generate_random(
        width: usize,
        height: usize,
        perlin_scale: f64,
        perlin_offset: (f64, f64),
        height_range: (f64, f64),
    ) -> Self {
        let perlin = Perlin::new();

        let heights = Array2::from_shape_fn((height, width), |(y, x)| {
            let n = perlin.get([
                x as f64 * perlin_scale + perlin_offset.0,
                y as f64 * perlin_scale + perlin_offset.1,
            ]);

            lin_map((-1.0, 1.0), height_range, n.max(-1.0).min(1.0))
        });

        Self { heights }
    }

    /// Height at the cell, or `None` outside the area.
    pub fn height_at(&self, x: i64, y: i64) -> Option<f64> {
        if x < 0 || y < 0 {
            return None;
        }

        self.heights.get([y as usize, x as usize]).copied()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_height_at() {
        let terrain = SimTerrain::flat(3, 2, 1.5);

        assert_eq!(terrain.height_at(2, 1), Some(1.5));
        assert_eq!(terrain.height_at(3, 1), None);
        assert_eq!(terrain.height_at(0, 2), None);
        assert_eq!(terrain.height_at(-1, 0), None);
    }

    #[test]
    fn test_random_within_range() {
        let terrain = SimTerrain::generate_random(10, 10, 0.37, (0.5, 0.5), (0.0, 2.0));

        for y in 0..10 {
            for x in 0..10 {
                let h = terrain.height_at(x, y).unwrap();
                assert!(h >= 0.0 && h <= 2.0);
            }
        }
    }
}
