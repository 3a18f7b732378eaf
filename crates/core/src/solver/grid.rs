//! Grid shape presets
//!
//! The pressure and velocity fields use fixed grids. Velocity is sampled on a
//! coarser grid because vectors are sparser and more expensive to draw.

use crate::core_types::error::{BlastSimError, Result};
use serde::{Deserialize, Serialize};

/// Largest supported grid edge, in cells
pub const MAX_GRID_DIMENSION: usize = 4096;

#[derive(Deserialize)]
struct RawGridShape {
    rows: usize,
    cols: usize,
}

/// Dimensions of a field grid
///
/// Row-major, `rows × cols`. The epicenter sits at cell `(rows / 2, cols / 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGridShape")]
pub struct GridShape {
    rows: usize,
    cols: usize,
}

impl TryFrom<RawGridShape> for GridShape {
    type Error = BlastSimError;

    fn try_from(raw: RawGridShape) -> Result<Self> {
        Self::new(raw.rows, raw.cols)
    }
}

impl GridShape {
    /// Create a validated grid shape
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidGridShape`] for empty grids or grids with
    /// an edge larger than [`MAX_GRID_DIMENSION`].
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(BlastSimError::InvalidGridShape {
                rows,
                cols,
                reason: "dimensions must be non-zero",
            });
        }
        if rows > MAX_GRID_DIMENSION || cols > MAX_GRID_DIMENSION {
            return Err(BlastSimError::InvalidGridShape {
                rows,
                cols,
                reason: "dimension exceeds maximum of 4096",
            });
        }
        Ok(Self { rows, cols })
    }

    /// Default pressure grid: 50×50
    #[must_use]
    pub const fn pressure_default() -> Self {
        Self { rows: 50, cols: 50 }
    }

    /// Default velocity grid: 25×25
    #[must_use]
    pub const fn velocity_default() -> Self {
        Self { rows: 25, cols: 25 }
    }

    /// Number of rows
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Epicenter cell as `(row, col)` in grid units
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        ((self.rows / 2) as f32, (self.cols / 2) as f32)
    }
}
