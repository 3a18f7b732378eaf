//! Blast field synthesis module
//!
//! This module turns peak magnitudes into spatial fields. The core abstraction is
//! the `FieldBackend` trait; the analytic closed-form backend is always
//! available, and alternative backends (surrogate models, precomputed tables)
//! plug in behind the same trait.
//!
//! # Example
//!
//! ```rust
//! use blast_sim_core::solver::{create_field_backend, FieldParams, FieldRequest};
//!
//! let backend = create_field_backend(&FieldParams::default());
//! let fields = backend.synthesize(&FieldRequest {
//!     time_s: 1.0,
//!     max_pressure: 4.7,
//!     max_velocity: 200.0,
//! });
//! assert_eq!(fields.pressure.shape.rows(), 50);
//! ```

mod fields;
mod grid;
pub mod synthesis;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

// Re-exports
pub use fields::{FieldData, PressureField, Vec2, VelocityField};
pub use grid::{GridShape, MAX_GRID_DIMENSION};
pub use r#trait::{FieldBackend, FieldRequest, SynthesizedFields};
pub use synthesis::{
    synthesize_pressure_field, synthesize_velocity_field, AnalyticFieldBackend, FieldParams,
};

use tracing::info;

/// Create the reference field backend
///
/// # Arguments
///
/// * `params` - Spatial parameters (front speed, band width, grid shapes)
///
/// # Returns
///
/// A boxed `FieldBackend` trait object using the analytic backend
pub fn create_field_backend(params: &FieldParams) -> Box<dyn FieldBackend> {
    info!(
        "Using analytic field backend ({}x{} pressure, {}x{} velocity)",
        params.pressure_grid.rows(),
        params.pressure_grid.cols(),
        params.velocity_grid.rows(),
        params.velocity_grid.cols()
    );
    Box::new(AnalyticFieldBackend::new(*params))
}
