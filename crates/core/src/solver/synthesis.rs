//! Closed-form blast field synthesis
//!
//! Produces the pressure and velocity fields for a single instant directly from
//! the peak magnitudes and the time since detonation. Nothing is integrated
//! from the previous frame, so any frame costs the same to compute and there is
//! no error accumulation over long playback.
//!
//! # Pressure
//! ```text
//! R = t · c                                  (wave front radius, grid units)
//! τ = (d / R) · t / 2                        (normalized time-at-distance)
//! p = P_max · exp(−τ) · (1 − τ)  for 0 < d ≤ R, clamped ≥ 0
//! p = 0                          beyond the front
//! ```
//!
//! # Velocity
//! ```text
//! |v| = V_max · (1 − |d − R| / w)   for |d − R| < w, directed radially outward
//! v = 0                              outside the band and at the epicenter
//! ```
//!
//! Rows are processed in parallel with rayon. Each cell depends only on its own
//! coordinates, so the result is bit-identical regardless of scheduling.

use crate::core_types::error::{BlastSimError, Result};
use crate::solver::fields::{PressureField, Vec2, VelocityField};
use crate::solver::grid::GridShape;
use crate::solver::r#trait::{FieldBackend, FieldRequest, SynthesizedFields};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Spatial parameters of the synthesized fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    /// Wave front speed (grid units per second)
    pub propagation_speed: f32,
    /// Half-width of the velocity band around the front (grid units)
    pub band_width: f32,
    /// Pressure grid shape
    pub pressure_grid: GridShape,
    /// Velocity grid shape (coarser than pressure)
    pub velocity_grid: GridShape,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            propagation_speed: 8.0,
            band_width: 3.0,
            pressure_grid: GridShape::pressure_default(),
            velocity_grid: GridShape::velocity_default(),
        }
    }
}

impl FieldParams {
    /// Check the front speed and band width are finite and positive
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidConfig`] for a non-positive or non-finite
    /// constant.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("fields.propagation_speed", self.propagation_speed),
            ("fields.band_width", self.band_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BlastSimError::not_positive(name, value));
            }
        }
        Ok(())
    }

    /// Wave front radius at time `t`, in grid units
    #[inline]
    #[must_use]
    pub fn wave_radius(&self, t: f32) -> f32 {
        t * self.propagation_speed
    }
}

/// Pressure contribution of one cell at distance `d` from the epicenter
#[inline]
fn pressure_at(max_pressure: f32, t: f32, wave_radius: f32, d: f32) -> f32 {
    if d > wave_radius {
        return 0.0;
    }
    let tau = (d / wave_radius) * t / 2.0;
    if tau > 0.0 {
        (max_pressure * (-tau).exp() * (1.0 - tau)).max(0.0)
    } else {
        0.0
    }
}

/// Synthesize the overpressure field at time `t`
///
/// # Arguments
///
/// * `max_pressure` - Peak overpressure for this instant (bar)
/// * `t` - Time since detonation on the reference time axis (s)
/// * `shape` - Pressure grid shape
/// * `params` - Front speed
///
/// # Returns
///
/// Field of non-negative, finite pressures. All zero when the front has not
/// left the epicenter (`t ≤ 0`).
#[must_use]
pub fn synthesize_pressure_field(
    max_pressure: f32,
    t: f32,
    shape: GridShape,
    params: &FieldParams,
) -> PressureField {
    let mut field = PressureField::new(shape);
    let wave_radius = params.wave_radius(t);
    if wave_radius <= 0.0 || !wave_radius.is_finite() || max_pressure.is_nan() || max_pressure <= 0.0
    {
        return field;
    }

    let (center_row, center_col) = shape.center();
    field
        .data
        .par_chunks_mut(shape.cols())
        .enumerate()
        .for_each(|(row, cells)| {
            let dy = row as f32 - center_row;
            for (col, cell) in cells.iter_mut().enumerate() {
                let dx = col as f32 - center_col;
                let d = (dx * dx + dy * dy).sqrt();
                *cell = pressure_at(max_pressure, t, wave_radius, d);
            }
        });
    field
}

/// Synthesize the particle velocity field at time `t`
///
/// Distances are measured in cells of the velocity grid from its own center.
///
/// # Arguments
///
/// * `max_velocity` - Peak particle velocity for this instant (m/s)
/// * `t` - Time since detonation on the reference time axis (s)
/// * `shape` - Velocity grid shape
/// * `params` - Front speed and band width
///
/// # Returns
///
/// Field of radial vectors, non-zero only within `band_width` of the front.
#[must_use]
pub fn synthesize_velocity_field(
    max_velocity: f32,
    t: f32,
    shape: GridShape,
    params: &FieldParams,
) -> VelocityField {
    let mut field = VelocityField::new(shape);
    let wave_radius = params.wave_radius(t);
    if wave_radius <= 0.0 || !wave_radius.is_finite() || max_velocity.is_nan() || max_velocity <= 0.0
    {
        return field;
    }

    let band_width = params.band_width;
    let (center_row, center_col) = shape.center();
    field
        .data
        .par_chunks_mut(shape.cols())
        .enumerate()
        .for_each(|(row, cells)| {
            let dy = row as f32 - center_row;
            for (col, cell) in cells.iter_mut().enumerate() {
                let dx = col as f32 - center_col;
                let d = (dx * dx + dy * dy).sqrt();
                if d == 0.0 {
                    continue;
                }
                let offset = (d - wave_radius).abs();
                if offset < band_width {
                    let magnitude = max_velocity * (1.0 - offset / band_width);
                    *cell = Vec2::new(magnitude * dx / d, magnitude * dy / d);
                }
            }
        });
    field
}

/// Reference analytic backend
///
/// Always available; used unless a surrogate backend is plugged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticFieldBackend {
    params: FieldParams,
}

impl AnalyticFieldBackend {
    /// Create an analytic backend with the given spatial parameters
    #[must_use]
    pub fn new(params: FieldParams) -> Self {
        Self { params }
    }
}

impl FieldBackend for AnalyticFieldBackend {
    fn synthesize(&self, request: &FieldRequest) -> SynthesizedFields {
        SynthesizedFields {
            pressure: synthesize_pressure_field(
                request.max_pressure,
                request.time_s,
                self.params.pressure_grid,
                &self.params,
            ),
            velocity: synthesize_velocity_field(
                request.max_velocity,
                request.time_s,
                self.params.velocity_grid,
                &self.params,
            ),
        }
    }

    fn pressure_grid(&self) -> GridShape {
        self.params.pressure_grid
    }

    fn velocity_grid(&self) -> GridShape {
        self.params.velocity_grid
    }

    fn name(&self) -> &'static str {
        "analytic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference() -> FieldParams {
        FieldParams::default()
    }

    #[test]
    fn test_zero_time_is_all_zero() {
        let params = reference();
        let p = synthesize_pressure_field(15.0, 0.0, params.pressure_grid, &params);
        assert!(p.data.iter().all(|&v| v == 0.0));

        let v = synthesize_velocity_field(350.0, 0.0, params.velocity_grid, &params);
        assert!(v.data.iter().all(|v| v.x == 0.0 && v.y == 0.0));
    }

    #[test]
    fn test_pressure_hard_cutoff_at_front() {
        let params = reference();
        let shape = params.pressure_grid;
        let field = synthesize_pressure_field(4.71, 1.0, shape, &params);
        let (cr, cc) = shape.center();

        let mut inside = 0;
        for row in 0..shape.rows() {
            for col in 0..shape.cols() {
                let d = ((row as f32 - cr).powi(2) + (col as f32 - cc).powi(2)).sqrt();
                let value = field.get(row, col);
                if d > 8.0 {
                    assert_eq!(value, 0.0, "cell ({row},{col}) beyond front");
                } else if value > 0.0 {
                    inside += 1;
                }
            }
        }
        assert!(inside > 0);
        // Epicenter itself has τ = 0
        assert_eq!(field.get(25, 25), 0.0);
    }

    #[test]
    fn test_pressure_cell_value_matches_formula() {
        let params = reference();
        let field = synthesize_pressure_field(10.0, 1.0, params.pressure_grid, &params);
        // Cell 4 columns east of the epicenter: d = 4, R = 8, τ = 0.25
        let tau = 0.25_f32;
        assert_relative_eq!(
            field.get(25, 29),
            10.0 * (-tau).exp() * (1.0 - tau),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_pressure_clamped_non_negative_late() {
        // Late times make τ > 1 near the front; values must clamp to 0
        let params = reference();
        let field = synthesize_pressure_field(15.0, 4.0, params.pressure_grid, &params);
        assert!(field.data.iter().all(|&v| v >= 0.0 && v.is_finite()));
    }

    #[test]
    fn test_velocity_band_and_direction() {
        let params = reference();
        let shape = params.velocity_grid;
        let field = synthesize_velocity_field(100.0, 1.0, shape, &params);

        // Directly east of center on the front: d = 8 = R, full magnitude along +x
        let east = field.get(12, 20);
        assert_relative_eq!(east.x, 100.0, epsilon = 1e-4);
        assert_relative_eq!(east.y, 0.0);

        // Directly north (lower row index): points toward -y
        let north = field.get(4, 12);
        assert!(north.y < 0.0);
        assert_relative_eq!(north.x, 0.0);

        // Epicenter and far outside the band are zero
        assert_eq!(field.get(12, 12), Vec2::zeros());
        assert_eq!(field.get(12, 24), Vec2::zeros()); // d = 12, |12 - 8| > 3
    }

    #[test]
    fn test_velocity_fields_are_radial() {
        let params = reference();
        let shape = params.velocity_grid;
        let field = synthesize_velocity_field(50.0, 0.9, shape, &params);
        let (cr, cc) = shape.center();
        for row in 0..shape.rows() {
            for col in 0..shape.cols() {
                let v = field.get(row, col);
                let dx = col as f32 - cc;
                let dy = row as f32 - cr;
                // Cross product of position and velocity vanishes for radial vectors
                assert!((dx * v.y - dy * v.x).abs() < 1e-3);
                // Outward: non-negative dot product
                assert!(dx * v.x + dy * v.y >= 0.0);
            }
        }
    }

    #[test]
    fn test_fields_are_linear_in_magnitude() {
        let params = reference();
        let base = synthesize_pressure_field(4.0, 1.2, params.pressure_grid, &params);
        let scaled = synthesize_pressure_field(6.0, 1.2, params.pressure_grid, &params);
        for (a, b) in base.data.iter().zip(&scaled.data) {
            assert_relative_eq!(a * 1.5, *b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_zero_magnitude_gives_zero_fields() {
        let params = reference();
        let p = synthesize_pressure_field(0.0, 1.0, params.pressure_grid, &params);
        assert_eq!(p.max_value(), 0.0);
        let v = synthesize_velocity_field(0.0, 1.0, params.velocity_grid, &params);
        assert_eq!(v.max_magnitude(), 0.0);
    }

    #[test]
    fn test_validate_params() {
        assert!(reference().validate().is_ok());
        let bad = FieldParams {
            band_width: 0.0,
            ..reference()
        };
        assert!(bad.validate().is_err());
    }
}
