//! Blast physics: charge scaling and peak waveform

pub mod scaling;
pub mod waveform;

pub use scaling::{blast_radius_m, scaled_distance, tnt_equivalent, BlastScaling};
pub use waveform::{resolve_magnitude, MagnitudeSource, ScalarOverride, WaveformParams};
