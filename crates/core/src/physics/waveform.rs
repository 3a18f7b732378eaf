//! Friedlander-style peak decay
//!
//! Closed-form peak overpressure and peak particle velocity as functions of
//! time since detonation.
//!
//! # Formula
//! ```text
//! P(t) = P0 · exp(−t·k_p) · max(0, 1 − t·f_p)
//! V(t) = V0 · exp(−t·k_v) · max(0, sin(t·ω_v))
//! ```
//!
//! The constants are calibration values chosen for a plausible sharp-rise,
//! exponential-decay profile that returns to ~0 well before the end of the
//! default 25 s window. They are not fitted to a CFD solution.
//!
//! Externally supplied magnitudes (surrogate model, precomputed table) take
//! precedence over the analytic values through [`ScalarOverride`].

use crate::core_types::error::{BlastSimError, Result};
use crate::core_types::units::{Bar, MetersPerSecond};
use serde::{Deserialize, Serialize};

/// Calibration constants of the analytic waveform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformParams {
    /// Peak overpressure at detonation (bar)
    pub p0_bar: f32,
    /// Exponential decay rate of overpressure (1/s)
    pub pressure_decay: f32,
    /// Linear falloff rate of overpressure (1/s)
    pub pressure_falloff: f32,
    /// Peak particle velocity amplitude (m/s)
    pub v0_ms: f32,
    /// Exponential decay rate of particle velocity (1/s)
    pub velocity_decay: f32,
    /// Angular frequency of the velocity oscillation (rad/s)
    pub velocity_frequency: f32,
}

impl Default for WaveformParams {
    fn default() -> Self {
        Self {
            p0_bar: 15.0,
            pressure_decay: 0.8,
            pressure_falloff: 0.3,
            v0_ms: 350.0,
            velocity_decay: 0.5,
            velocity_frequency: 1.5,
        }
    }
}

impl WaveformParams {
    /// Check every constant is finite and non-negative, and amplitudes positive
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidConfig`] naming the first bad constant.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("waveform.p0_bar", self.p0_bar),
            ("waveform.v0_ms", self.v0_ms),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BlastSimError::not_positive(name, value));
            }
        }
        for (name, value) in [
            ("waveform.pressure_decay", self.pressure_decay),
            ("waveform.pressure_falloff", self.pressure_falloff),
            ("waveform.velocity_decay", self.velocity_decay),
            ("waveform.velocity_frequency", self.velocity_frequency),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BlastSimError::InvalidConfig {
                    name,
                    message: format!("must be finite and non-negative, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Peak overpressure at time `t` (s) after detonation
    ///
    /// Returns exactly zero for `t < 0` (and NaN): the wave is never extrapolated
    /// backward.
    #[must_use]
    pub fn peak_pressure_bar(&self, t: f32) -> Bar {
        if t.is_nan() || t < 0.0 {
            return Bar::ZERO;
        }
        let decay = (-t * self.pressure_decay).exp();
        let falloff = (1.0 - t * self.pressure_falloff).max(0.0);
        Bar::new(self.p0_bar * decay * falloff)
    }

    /// Peak particle velocity at time `t` (s) after detonation
    ///
    /// Returns exactly zero for `t < 0` (and NaN).
    #[must_use]
    pub fn peak_velocity_ms(&self, t: f32) -> MetersPerSecond {
        if t.is_nan() || t < 0.0 {
            return MetersPerSecond::ZERO;
        }
        let decay = (-t * self.velocity_decay).exp();
        // f32::max discards NaN from sin(±inf)
        let oscillation = (t * self.velocity_frequency).sin().max(0.0);
        MetersPerSecond::new(self.v0_ms * decay * oscillation)
    }
}

/// Externally supplied peak magnitudes for one frame
///
/// `None` means "not supplied"; `Some(0.0)` is a real measurement of zero and is
/// honoured as such.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScalarOverride {
    /// Peak overpressure, if supplied
    pub pressure: Option<Bar>,
    /// Peak particle velocity, if supplied
    pub velocity: Option<MetersPerSecond>,
    /// Recorded temperature (K), if supplied; carried through for consumers
    pub temperature_k: Option<f32>,
}

/// Where a frame's peak magnitude came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MagnitudeSource {
    /// Analytic waveform
    #[default]
    Analytic,
    /// External override (surrogate model or sample table)
    External,
}

/// Choose between an external magnitude and the analytic fallback
///
/// The synthesized fields are linear in their peak magnitude, so synthesizing at
/// the external value is the analytic spatial shape scaled by
/// `external / analytic`. This also stays defined when the analytic value is 0.
#[inline]
#[must_use]
pub fn resolve_magnitude(analytic: f32, external: Option<f32>) -> (f32, MagnitudeSource) {
    match external {
        Some(value) => (value, MagnitudeSource::External),
        None => (analytic, MagnitudeSource::Analytic),
    }
}
