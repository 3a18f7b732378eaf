//! Library error type
//!
//! Only construction, validation and loading are fallible. Once an
//! `ExplosiveSpec`, `GridShape` and `SimulationConfig` exist, the numerical
//! core (scaling, waveform, synthesis) is total.

use thiserror::Error;

/// Errors raised at the validation boundary of the blast simulation
#[derive(Error, Debug)]
pub enum BlastSimError {
    #[error("Explosive mass must be finite and positive, got {0} kg")]
    InvalidMass(f32),

    #[error("Epicenter ({lat}, {lon}) is outside valid latitude/longitude ranges")]
    InvalidEpicenter { lat: f64, lon: f64 },

    #[error("Grid shape {rows}x{cols} is invalid: {reason}")]
    InvalidGridShape {
        rows: usize,
        cols: usize,
        reason: &'static str,
    },

    #[error("Configuration parameter {name}: {message}")]
    InvalidConfig { name: &'static str, message: String },

    #[error("Sample {index}: {message}")]
    InvalidSample { index: usize, message: String },

    #[error("Unknown explosive type '{0}'")]
    UnknownExplosive(String),

    #[error("Invalid bounding box '{input}': {message}")]
    InvalidBoundingBox { input: String, message: String },

    #[error("Terrain provider failed: {0}")]
    Terrain(String),

    #[error("Playback worker is no longer running")]
    PlaybackStopped,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BlastSimError {
    /// Create a configuration error for a parameter that must be finite and positive
    pub fn not_positive(name: &'static str, value: f32) -> Self {
        Self::InvalidConfig {
            name,
            message: format!("must be finite and positive, got {value}"),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, BlastSimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = BlastSimError::InvalidMass(-3.0);
        assert_eq!(
            err.to_string(),
            "Explosive mass must be finite and positive, got -3 kg"
        );

        let err = BlastSimError::not_positive("fixed_dt", 0.0);
        assert_eq!(
            err.to_string(),
            "Configuration parameter fixed_dt: must be finite and positive, got 0"
        );
    }
}
