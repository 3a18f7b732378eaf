//! Field backend trait definition
//!
//! This module defines the `FieldBackend` trait, the contract every field
//! generator implements. The analytic backend is the reference; a surrogate
//! model (e.g. a trained PINN) or a precomputed CFD table can be substituted
//! behind the same trait without changing the sequencer or any consumer.

use crate::solver::fields::{PressureField, VelocityField};
use crate::solver::grid::GridShape;

/// Inputs for synthesizing the fields of one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRequest {
    /// Time since detonation on the reference time axis (s)
    pub time_s: f32,
    /// Peak overpressure to shape the pressure field with (bar)
    pub max_pressure: f32,
    /// Peak particle velocity to shape the velocity field with (m/s)
    pub max_velocity: f32,
}

/// Pressure and velocity fields for one instant
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedFields {
    /// Overpressure field (bar)
    pub pressure: PressureField,
    /// Particle velocity field (m/s)
    pub velocity: VelocityField,
}

/// Backend-agnostic interface for blast field generation
///
/// Implementations must be pure: the same request always yields bit-identical
/// fields, and no call may depend on an earlier one. This is what allows random
/// access seeking and parallel batch precompute.
pub trait FieldBackend: Send + Sync {
    /// Synthesize both fields for one instant
    ///
    /// # Arguments
    ///
    /// * `request` - Time and peak magnitudes
    ///
    /// # Returns
    ///
    /// Pressure field on [`pressure_grid`](Self::pressure_grid) and velocity
    /// field on [`velocity_grid`](Self::velocity_grid)
    fn synthesize(&self, request: &FieldRequest) -> SynthesizedFields;

    /// Shape of the pressure grid this backend produces
    fn pressure_grid(&self) -> GridShape;

    /// Shape of the velocity grid this backend produces
    fn velocity_grid(&self) -> GridShape;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
