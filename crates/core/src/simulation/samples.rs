//! Persisted blast samples and scalar override sources
//!
//! A sample table is a list of `{time, pressure, velocity, temperature}` rows,
//! typically precomputed by a CFD run or recorded from a surrogate model.
//! Pressures and velocities are stored normalized (1.0 = reference peak) and
//! converted to physical units with the table's scales.
//!
//! Any field of a row may be absent. An absent value falls back to the analytic
//! waveform for that frame; a value of exactly 0.0 is a real measurement and is
//! used as-is.

use crate::core_types::error::{BlastSimError, Result};
use crate::core_types::units::{Bar, MetersPerSecond};
use crate::physics::waveform::ScalarOverride;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Source of externally supplied peak magnitudes
///
/// Implemented by [`SampleTable`]; a surrogate model can implement it to feed
/// predicted magnitudes into the frame sequencer.
pub trait ScalarOverrideSource: Send + Sync {
    /// Peak magnitudes for a frame, or `None` when the source has nothing for it
    ///
    /// # Arguments
    ///
    /// * `frame_index` - Frame being computed
    /// * `time_s` - Physical time of the frame (s)
    fn overrides_at(&self, frame_index: usize, time_s: f32) -> Option<ScalarOverride>;

    /// Supplied time of a frame, if the source defines the timeline
    fn time_at(&self, _frame_index: usize) -> Option<f32> {
        None
    }

    /// Number of frames the source supplies data for
    fn frame_count(&self) -> usize {
        0
    }
}

/// One persisted sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlastSample {
    /// Time since detonation (s)
    #[serde(rename = "time")]
    pub time_s: f32,
    /// Normalized peak overpressure
    #[serde(default)]
    pub pressure: Option<f32>,
    /// Normalized peak particle velocity
    #[serde(default)]
    pub velocity: Option<f32>,
    /// Temperature (K)
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Validated, ordered list of samples
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    samples: Vec<BlastSample>,
    pressure_scale: f32,
    velocity_scale: f32,
}

impl SampleTable {
    /// Default physical peak of a normalized pressure of 1.0 (bar)
    pub const DEFAULT_PRESSURE_SCALE: f32 = 15.0;
    /// Default physical peak of a normalized velocity of 1.0 (m/s)
    pub const DEFAULT_VELOCITY_SCALE: f32 = 350.0;

    /// Build a table with the default scales
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidSample`] for the first row with a
    /// negative or non-finite value.
    pub fn new(samples: Vec<BlastSample>) -> Result<Self> {
        let table = Self {
            samples,
            pressure_scale: Self::DEFAULT_PRESSURE_SCALE,
            velocity_scale: Self::DEFAULT_VELOCITY_SCALE,
        };
        table.validate()?;
        Ok(table)
    }

    /// Replace the normalized-to-physical scales
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidConfig`] for a non-positive scale, or
    /// [`BlastSimError::InvalidSample`] if a scaled value overflows.
    pub fn with_scales(mut self, pressure_scale: f32, velocity_scale: f32) -> Result<Self> {
        for (name, value) in [
            ("sequencer.sample_pressure_scale", pressure_scale),
            ("sequencer.sample_velocity_scale", velocity_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BlastSimError::not_positive(name, value));
            }
        }
        self.pressure_scale = pressure_scale;
        self.velocity_scale = velocity_scale;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let check = |index: usize, name: &str, value: f32, scale: f32| {
            if !value.is_finite() || value < 0.0 {
                return Err(BlastSimError::InvalidSample {
                    index,
                    message: format!("{name} must be finite and non-negative, got {value}"),
                });
            }
            if !(value * scale).is_finite() {
                return Err(BlastSimError::InvalidSample {
                    index,
                    message: format!("{name} {value} overflows when scaled by {scale}"),
                });
            }
            Ok(())
        };

        for (index, sample) in self.samples.iter().enumerate() {
            check(index, "time", sample.time_s, 1.0)?;
            if let Some(p) = sample.pressure {
                check(index, "pressure", p, self.pressure_scale)?;
            }
            if let Some(v) = sample.velocity {
                check(index, "velocity", v, self.velocity_scale)?;
            }
            if let Some(k) = sample.temperature {
                check(index, "temperature", k, 1.0)?;
            }
        }
        Ok(())
    }

    /// Parse a JSON array of samples
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::Json`] on malformed input or
    /// [`BlastSimError::InvalidSample`] on a bad row.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let samples: Vec<BlastSample> = serde_json::from_str(json)?;
        Self::new(samples)
    }

    /// Load a JSON array of samples from a file
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&json)?;
        debug!("Loaded {} samples from {}", table.len(), path.display());
        Ok(table)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `index`
    pub fn get(&self, index: usize) -> Option<&BlastSample> {
        self.samples.get(index)
    }

    /// All samples in order
    pub fn samples(&self) -> &[BlastSample] {
        &self.samples
    }
}

impl ScalarOverrideSource for SampleTable {
    fn overrides_at(&self, frame_index: usize, _time_s: f32) -> Option<ScalarOverride> {
        let sample = self.samples.get(frame_index)?;
        Some(ScalarOverride {
            pressure: sample.pressure.map(|p| Bar::new(p * self.pressure_scale)),
            velocity: sample
                .velocity
                .map(|v| MetersPerSecond::new(v * self.velocity_scale)),
            temperature_k: sample.temperature,
        })
    }

    fn time_at(&self, frame_index: usize) -> Option<f32> {
        self.samples.get(frame_index).map(|s| s.time_s)
    }

    fn frame_count(&self) -> usize {
        self.samples.len()
    }
}
