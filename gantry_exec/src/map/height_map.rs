//! # Height Map
//!
//! Heights of whatever lies beneath each cell of the work area, as measured
//! by the head's scan sensors. Heights are in height units above the floor.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::Array2;
use serde::Serialize;

use super::ReachMap;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Value stored for a reachable cell which has not been measured yet.
pub const UNSCANNED: f64 = -1.0;

/// Value stored for a cell which cannot be measured.
pub const UNREACHABLE: f64 = -2.0;

/// Order in which the neighbours of a cell are considered, as `(dx, dy)`.
const NEIGHBOUR_OFFSETS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Result of scanning the work area.
///
/// Each cell holds either a measured height (`>= 0`), [`UNSCANNED`] or
/// [`UNREACHABLE`].
#[derive(Debug, Clone, Serialize)]
pub struct HeightMap {
    heights: Array2<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// State of a single height map cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellHeight {
    Unscanned,
    Unreachable,
    Measured(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HeightMap {
    /// Create a map with every cell unscanned.
    ///
    /// Call [`HeightMap::reset`] before scanning to mark unreachable cells.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            heights: Array2::from_elem((height, width), UNSCANNED),
        }
    }

    /// Prepare the map for a new scan. Reachable cells become unscanned, all
    /// others unreachable.
    pub fn reset(&mut self, reach_map: &ReachMap) {
        self.heights = Array2::from_shape_fn(
            (reach_map.height(), reach_map.width()),
            |(y, x)| {
                if reach_map.is_cell_reachable(x as i64, y as i64) {
                    UNSCANNED
                } else {
                    UNREACHABLE
                }
            },
        );
    }

    pub fn width(&self) -> usize {
        self.heights.ncols()
    }

    pub fn height(&self) -> usize {
        self.heights.nrows()
    }

    /// The raw stored values, indexed `[[y, x]]`.
    pub fn heights(&self) -> &Array2<f64> {
        &self.heights
    }

    /// State of the cell, or `None` if it is outside the map.
    pub fn get(&self, x: i64, y: i64) -> Option<CellHeight> {
        if x < 0 || y < 0 {
            return None;
        }

        self.heights.get([y as usize, x as usize]).map(|h| {
            if *h >= 0.0 {
                CellHeight::Measured(*h)
            } else if *h == UNREACHABLE {
                CellHeight::Unreachable
            } else {
                CellHeight::Unscanned
            }
        })
    }

    /// Record a measured height.
    ///
    /// Cells outside the map or marked unreachable are left untouched, in
    /// which case `false` is returned.
    pub fn record(&mut self, x: i64, y: i64, height: f64) -> bool {
        match self.get(x, y) {
            Some(CellHeight::Unreachable) | None => false,
            Some(_) => {
                self.heights[[y as usize, x as usize]] = height.max(0.0);
                true
            }
        }
    }

    /// Mark a cell as one which cannot be measured.
    pub fn mark_unreachable(&mut self, x: i64, y: i64) {
        if self.get(x, y).is_some() {
            self.heights[[y as usize, x as usize]] = UNREACHABLE;
        }
    }

    /// Number of cells still waiting to be measured.
    pub fn num_unscanned(&self) -> usize {
        self.heights.iter().filter(|h| **h == UNSCANNED).count()
    }

    /// Find the unscanned reachable cell closest to `from`.
    ///
    /// Cells are searched in row-major order and the first of any equally
    /// close cells is returned. Like the reachability search this is a brute
    /// force pass over the whole map.
    pub fn closest_unscanned(&self, reach_map: &ReachMap, from: (f64, f64)) -> Option<(i64, i64)> {
        let mut best: Option<((i64, i64), f64)> = None;

        for ((y, x), h) in self.heights.indexed_iter() {
            let (x, y) = (x as i64, y as i64);

            if *h != UNSCANNED || !reach_map.is_cell_reachable(x, y) {
                continue;
            }

            let dist = cell_dist((x, y), from);
            match best {
                Some((_, best_dist)) if dist >= best_dist => (),
                _ => best = Some(((x, y), dist)),
            }
        }

        best.map(|(cell, _)| cell)
    }

    /// Pick the neighbour of `target` to measure it from.
    ///
    /// Of the reachable 4-connected neighbours, the one with a measured height
    /// closest to `from` is preferred. If no neighbour has been measured the
    /// last reachable neighbour (in left, right, up, down order) is used.
    /// Returns `None` if `target` has no reachable neighbours.
    pub fn closest_measured_neighbour(
        &self,
        reach_map: &ReachMap,
        target: (i64, i64),
        from: (f64, f64),
    ) -> Option<(i64, i64)> {
        let mut fallback = None;
        let mut best: Option<((i64, i64), f64)> = None;

        for (dx, dy) in NEIGHBOUR_OFFSETS.iter() {
            let cell = (target.0 + dx, target.1 + dy);

            if !reach_map.is_cell_reachable(cell.0, cell.1) {
                continue;
            }

            fallback = Some(cell);

            if let Some(CellHeight::Measured(_)) = self.get(cell.0, cell.1) {
                let dist = cell_dist(cell, from);
                match best {
                    Some((_, best_dist)) if dist >= best_dist => (),
                    _ => best = Some((cell, dist)),
                }
            }
        }

        best.map(|(cell, _)| cell).or(fallback)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn cell_dist(cell: (i64, i64), from: (f64, f64)) -> f64 {
    (cell.0 as f64 - from.0).hypot(cell.1 as f64 - from.1)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
