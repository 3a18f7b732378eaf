//! Simulation configuration
//!
//! All tunable constants in one serde-friendly structure. Every group has
//! reference defaults, so an empty JSON object is a complete configuration.

use crate::core_types::error::{BlastSimError, Result};
use crate::physics::waveform::WaveformParams;
use crate::solver::FieldParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Frame timeline and cache parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerParams {
    /// Time stride for frames without a supplied sample time (s)
    pub fixed_dt: f32,
    /// Minimum number of playable frames
    pub min_total_frames: usize,
    /// Maximum number of frames held by the frame cache
    pub cache_capacity: usize,
    /// Peak overpressure represented by a normalized sample value of 1.0 (bar)
    pub sample_pressure_scale: f32,
    /// Peak particle velocity represented by a normalized sample value of 1.0 (m/s)
    pub sample_velocity_scale: f32,
}

impl Default for SequencerParams {
    fn default() -> Self {
        Self {
            fixed_dt: 0.1,
            min_total_frames: 250,
            cache_capacity: 512,
            sample_pressure_scale: 15.0,
            sample_velocity_scale: 350.0,
        }
    }
}

impl SequencerParams {
    /// Check the time stride, frame count and sample scales
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidConfig`] for a non-positive stride or
    /// scale, or a zero frame count.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("sequencer.fixed_dt", self.fixed_dt),
            ("sequencer.sample_pressure_scale", self.sample_pressure_scale),
            ("sequencer.sample_velocity_scale", self.sample_velocity_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BlastSimError::not_positive(name, value));
            }
        }
        if self.min_total_frames == 0 {
            return Err(BlastSimError::InvalidConfig {
                name: "sequencer.min_total_frames",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Playback scheduling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackParams {
    /// Tick interval at speed 1.0 (ms)
    pub base_interval_ms: u64,
    /// Lowest accepted speed multiplier
    pub min_speed: f32,
    /// Highest accepted speed multiplier
    pub max_speed: f32,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            base_interval_ms: 100,
            min_speed: 0.1,
            max_speed: 3.0,
        }
    }
}

impl PlaybackParams {
    /// Check the interval is non-zero and the speed range is positive and ordered
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.base_interval_ms == 0 {
            return Err(BlastSimError::InvalidConfig {
                name: "playback.base_interval_ms",
                message: "must be at least 1 ms".to_string(),
            });
        }
        for (name, value) in [
            ("playback.min_speed", self.min_speed),
            ("playback.max_speed", self.max_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BlastSimError::not_positive(name, value));
            }
        }
        if self.min_speed > self.max_speed {
            return Err(BlastSimError::InvalidConfig {
                name: "playback.min_speed",
                message: format!(
                    "range is inverted ({} > {})",
                    self.min_speed, self.max_speed
                ),
            });
        }
        Ok(())
    }

    /// Clamp a requested speed into `[min_speed, max_speed]`
    ///
    /// NaN maps to `min_speed`.
    #[must_use]
    pub fn clamp_speed(&self, speed: f32) -> f32 {
        if speed.is_nan() {
            return self.min_speed;
        }
        speed.clamp(self.min_speed, self.max_speed)
    }

    /// Tick interval at the given (already clamped) speed
    #[must_use]
    pub fn tick_interval(&self, speed: f32) -> Duration {
        Duration::from_secs_f64(self.base_interval_ms as f64 / 1000.0 / f64::from(speed))
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Analytic waveform constants
    pub waveform: WaveformParams,
    /// Front speed, band width and grid shapes
    pub fields: FieldParams,
    /// Frame timeline and cache
    pub sequencer: SequencerParams,
    /// Playback scheduling
    pub playback: PlaybackParams,
}

impl SimulationConfig {
    /// Validate every parameter group
    ///
    /// # Errors
    ///
    /// Returns the first [`BlastSimError::InvalidConfig`] found.
    pub fn validate(&self) -> Result<()> {
        self.waveform.validate()?;
        self.fields.validate()?;
        self.sequencer.validate()?;
        self.playback.validate()
    }

    /// Parse and validate a configuration from JSON
    ///
    /// Missing groups and fields take their reference defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::Json`] on malformed input (including an invalid
    /// grid shape) or [`BlastSimError::InvalidConfig`] on a bad constant.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        debug!("Loading simulation config from {}", path.display());
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sequencer.min_total_frames, 250);
        assert_eq!(config.playback.base_interval_ms, 100);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = SimulationConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_partial_json_overrides_one_field() {
        let config =
            SimulationConfig::from_json_str(r#"{"sequencer": {"fixed_dt": 0.05}}"#).unwrap();
        assert_eq!(config.sequencer.fixed_dt, 0.05);
        assert_eq!(config.sequencer.min_total_frames, 250);
        assert_eq!(config.fields.propagation_speed, 8.0);
    }

    #[test]
    fn test_invalid_grid_shape_is_rejected() {
        let json = r#"{"fields": {"pressure_grid": {"rows": 0, "cols": 50}}}"#;
        assert!(matches!(
            SimulationConfig::from_json_str(json),
            Err(BlastSimError::Json(_))
        ));
    }

    #[test]
    fn test_inverted_speed_range_is_rejected() {
        let json = r#"{"playback": {"min_speed": 2.0, "max_speed": 1.0}}"#;
        assert!(matches!(
            SimulationConfig::from_json_str(json),
            Err(BlastSimError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_clamp_speed() {
        let playback = PlaybackParams::default();
        assert_eq!(playback.clamp_speed(10.0), 3.0);
        assert_eq!(playback.clamp_speed(0.0), 0.1);
        assert_eq!(playback.clamp_speed(-4.0), 0.1);
        assert_eq!(playback.clamp_speed(f32::NAN), 0.1);
        assert_eq!(playback.clamp_speed(f32::INFINITY), 3.0);
        assert_eq!(playback.clamp_speed(1.5), 1.5);
    }

    #[test]
    fn test_tick_interval_scales_with_speed() {
        let playback = PlaybackParams::default();
        assert_eq!(playback.tick_interval(1.0), Duration::from_millis(100));
        assert_relative_eq!(
            playback.tick_interval(2.0).as_secs_f64(),
            0.05,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = SimulationConfig::load_json("/nonexistent/blast-config.json");
        assert!(matches!(result, Err(BlastSimError::Io(_))));
    }
}
