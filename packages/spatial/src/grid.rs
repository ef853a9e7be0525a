//! Fixed-step lattices and nearest-facility distance fields.
//!
//! A [`GridSpec`] is integer-indexed: cell `(row, col)` sits at
//! `(south + row * step, west + col * step)`. Building the coordinate from
//! indices rather than by accumulating `step` keeps the lattice identical
//! across calls and free of floating-point drift.

use care_map_geography_models::{BoundingBox, LatLng};
use rayon::prelude::*;
use thiserror::Error;

use crate::index::NearestIndex;

/// Slack for floating-point error when counting lattice rows and columns.
const SPAN_EPSILON: f64 = 1e-9;

/// Errors raised while laying out a grid.
#[derive(Debug, Error)]
pub enum GridError {
    /// The step is zero, negative, or not finite.
    #[error("Invalid grid step: {step}")]
    InvalidStep {
        /// The rejected step in degrees.
        step: f64,
    },

    /// The bounding box is inverted or out of range.
    #[error("Invalid grid bounds: {message}")]
    InvalidBounds {
        /// Description of the problem.
        message: String,
    },

    /// The grid would exceed the configured cell budget.
    #[error("Grid of {cells} cells exceeds the limit of {max} cells")]
    TooManyCells {
        /// Cells the request would produce.
        cells: u64,
        /// Configured maximum.
        max: usize,
    },
}

/// A validated lattice over a bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    bounds: BoundingBox,
    step_deg: f64,
    rows: usize,
    cols: usize,
}

impl GridSpec {
    /// Lays out a grid over `bounds` with spacing `step_deg`.
    ///
    /// # Errors
    ///
    /// * [`GridError::InvalidStep`] if `step_deg` is not a positive finite
    ///   number
    /// * [`GridError::InvalidBounds`] if `bounds` is invalid
    /// * [`GridError::TooManyCells`] if the grid would have more than
    ///   `max_cells` cells
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn new(bounds: BoundingBox, step_deg: f64, max_cells: usize) -> Result<Self, GridError> {
        if !step_deg.is_finite() || step_deg <= 0.0 {
            return Err(GridError::InvalidStep { step: step_deg });
        }
        if !bounds.is_valid() {
            return Err(GridError::InvalidBounds {
                message: format!(
                    "west={}, south={}, east={}, north={}",
                    bounds.west, bounds.south, bounds.east, bounds.north
                ),
            });
        }

        let rows = (bounds.lat_span() / step_deg + SPAN_EPSILON).floor() + 1.0;
        let cols = (bounds.lng_span() / step_deg + SPAN_EPSILON).floor() + 1.0;
        let cells = rows * cols;
        if cells > max_cells as f64 {
            return Err(GridError::TooManyCells {
                cells: cells.min(u64::MAX as f64) as u64,
                max: max_cells,
            });
        }

        Ok(Self {
            bounds,
            step_deg,
            rows: rows as usize,
            cols: cols as usize,
        })
    }

    /// The bounding box the grid covers.
    #[must_use]
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Spacing between neighbouring cells in degrees.
    #[must_use]
    pub const fn step_deg(&self) -> f64 {
        self.step_deg
    }

    /// Number of rows (latitude steps).
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (longitude steps).
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Coordinate of cell `(row, col)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn point(&self, row: usize, col: usize) -> LatLng {
        LatLng::new(
            (row as f64).mul_add(self.step_deg, self.bounds.south),
            (col as f64).mul_add(self.step_deg, self.bounds.west),
        )
    }

    /// Row-major position of cell `(row, col)`.
    #[must_use]
    pub const fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// The up to eight cells adjacent to `(row, col)`.
    pub fn neighbours(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let rows = row.saturating_sub(1)..=(row + 1).min(self.rows - 1);
        rows.flat_map(move |r| {
            let cols = col.saturating_sub(1)..=(col + 1).min(self.cols - 1);
            cols.map(move |c| (r, c))
        })
        .filter(move |&(r, c)| (r, c) != (row, col))
    }
}

/// Distance from one grid cell to its nearest indexed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldCell {
    /// Haversine distance in kilometers.
    pub distance_km: f64,
    /// Index of the nearest point in the [`NearestIndex`] input.
    pub nearest: usize,
}

/// Nearest-point distances over a whole grid, in row-major order.
#[derive(Debug, Clone)]
pub struct DistanceField {
    spec: GridSpec,
    cells: Vec<FieldCell>,
}

impl DistanceField {
    /// Evaluates the distance from every cell of `spec` to its nearest
    /// point in `index`.
    ///
    /// Rows are evaluated on the `rayon` pool when
    /// `cells * points >= parallel_min_work`, sequentially otherwise.
    /// Output order is row-major either way. Returns `None` for an empty
    /// index.
    #[must_use]
    pub fn compute(spec: GridSpec, index: &NearestIndex, parallel_min_work: usize) -> Option<Self> {
        Self::compute_with_progress(spec, index, parallel_min_work, &|_| {})
    }

    /// As [`Self::compute`], calling `on_row` with the row's cell count
    /// as each row finishes. On the parallel path `on_row` runs on the
    /// `rayon` workers, in no particular order.
    #[must_use]
    pub fn compute_with_progress(
        spec: GridSpec,
        index: &NearestIndex,
        parallel_min_work: usize,
        on_row: &(dyn Fn(usize) + Sync),
    ) -> Option<Self> {
        if index.is_empty() {
            return None;
        }

        let evaluate_row = |row: usize| -> Vec<FieldCell> {
            let cells: Vec<FieldCell> = (0..spec.cols)
                .filter_map(|col| {
                    index.nearest(spec.point(row, col)).map(|n| FieldCell {
                        distance_km: n.distance_km,
                        nearest: n.index,
                    })
                })
                .collect();
            on_row(cells.len());
            cells
        };

        let work = spec.cell_count().saturating_mul(index.len());
        let rows: Vec<Vec<FieldCell>> = if work >= parallel_min_work {
            log::debug!(
                "Evaluating {} cells x {} points in parallel",
                spec.cell_count(),
                index.len()
            );
            (0..spec.rows).into_par_iter().map(evaluate_row).collect()
        } else {
            (0..spec.rows).map(evaluate_row).collect()
        };

        Some(Self {
            spec,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// The grid this field was evaluated on.
    #[must_use]
    pub const fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[FieldCell] {
        &self.cells
    }

    /// Cell `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> FieldCell {
        self.cells[self.spec.offset(row, col)]
    }

    /// Largest distance in the field.
    #[must_use]
    pub fn max_distance_km(&self) -> f64 {
        self.cells
            .iter()
            .map(|c| c.distance_km)
            .fold(0.0, f64::max)
    }

    /// Iterates `(row, col, coordinate, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, LatLng, FieldCell)> + '_ {
        self.cells.iter().enumerate().map(|(offset, cell)| {
            let row = offset / self.spec.cols;
            let col = offset % self.spec.cols;
            (row, col, self.spec.point(row, col), *cell)
        })
    }
}
