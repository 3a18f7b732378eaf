//! Field data structures
//!
//! 2D fields are stored as a flat `Vec` in row-major order. Pressure is a
//! scalar field in bar; velocity is a vector field in m/s.

use crate::solver::grid::GridShape;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// 2D velocity vector `(x, y)` in m/s; `x` follows columns, `y` follows rows
pub type Vec2 = Vector2<f32>;

/// Row-major 2D grid of cell values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldData<T> {
    /// Cell values in row-major order (`row * cols + col`)
    pub data: Vec<T>,
    /// Grid shape
    pub shape: GridShape,
}

/// Overpressure field (bar)
pub type PressureField = FieldData<f32>;

/// Particle velocity field (m/s)
pub type VelocityField = FieldData<Vec2>;

impl<T: Clone + Default> FieldData<T> {
    /// Create a field of default (zero) values
    ///
    /// # Returns
    ///
    /// New field initialized to `T::default()`
    #[must_use]
    pub fn new(shape: GridShape) -> Self {
        Self {
            data: vec![T::default(); shape.cell_count()],
            shape,
        }
    }
}

impl<T: Copy> FieldData<T> {
    /// Get value at `(row, col)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(
            row < self.shape.rows() && col < self.shape.cols(),
            "Coordinates out of bounds"
        );
        self.data[row * self.shape.cols() + col]
    }
}

impl<T> FieldData<T> {
    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over rows as slices
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks(self.shape.cols())
    }
}

impl PressureField {
    /// Largest cell value (0 for an all-zero field)
    #[must_use]
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }

    /// Number of cells with non-zero pressure
    #[must_use]
    pub fn nonzero_count(&self) -> usize {
        self.data.iter().filter(|&&p| p > 0.0).count()
    }

    /// True when every value is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|p| p.is_finite())
    }
}

impl VelocityField {
    /// Largest vector magnitude (0 for an all-zero field)
    #[must_use]
    pub fn max_magnitude(&self) -> f32 {
        self.data.iter().map(Vec2::norm).fold(0.0, f32::max)
    }

    /// True when every component is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.x.is_finite() && v.y.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_creation() {
        let shape = GridShape::new(10, 20).unwrap();
        let field = PressureField::new(shape);
        assert_eq!(field.data.len(), 200);
        assert!(field.data.iter().all(|&v| v == 0.0));
        assert_eq!(field.max_value(), 0.0);
    }

    #[test]
    fn test_row_major_indexing() {
        let shape = GridShape::new(4, 3).unwrap();
        let mut field = PressureField::new(shape);
        field.data[2 * 3 + 1] = 7.5;
        assert_eq!(field.get(2, 1), 7.5);
        assert_eq!(field.rows().nth(2).unwrap(), &[0.0, 7.5, 0.0]);
        assert_eq!(field.nonzero_count(), 1);
    }

    #[test]
    fn test_velocity_magnitude() {
        let mut field = VelocityField::new(GridShape::new(2, 2).unwrap());
        field.data[3] = Vec2::new(3.0, 4.0);
        assert_eq!(field.max_magnitude(), 5.0);
        assert!(field.is_finite());
    }

    #[test]
    #[should_panic(expected = "Coordinates out of bounds")]
    fn test_field_bounds_check() {
        let field = PressureField::new(GridShape::new(10, 10).unwrap());
        let _ = field.get(10, 5);
    }
}
