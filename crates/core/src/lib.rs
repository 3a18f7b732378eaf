//! Blast Simulation Core Library
//!
//! Synthesizes and plays back the overpressure and particle velocity fields of
//! an explosive blast. Everything numerical is a closed-form function of time,
//! so every frame is computed from scratch, in any order, with bit-identical
//! results.
//!
//! ## Pipeline
//!
//! - Cube-root (Hopkinson-Cranz) scaling of the charge to 1000 kg TNT
//! - Friedlander-style peak decay of overpressure and particle velocity
//! - Expanding-front synthesis of the pressure and velocity grids
//! - A pure frame sequencer with a bounded cache and parallel precompute
//! - A playback state machine with a threaded driver
//!
//! External peak magnitudes (persisted samples, surrogate models) override the
//! analytic waveform per frame while the synthesizer keeps the spatial shape.

// Core types and utilities
pub mod core_types;

// Scaling laws and waveform
pub mod physics;

// Field synthesis
pub mod solver;

// Geospatial placement and terrain context
pub mod grid;

// Sequencing, playback and export
pub mod simulation;

// Re-export core types
pub use core_types::{BlastSimError, ExplosiveSpec, ExplosiveType, GeoPoint, Result};
pub use core_types::{Bar, Kilograms, Meters, MetersPerSecond, Seconds};

// Re-export the numerical core
pub use physics::{BlastScaling, MagnitudeSource, ScalarOverride, WaveformParams};
pub use solver::{FieldBackend, FieldParams, GridShape, PressureField, VelocityField};

// Re-export runtime types
pub use simulation::{
    BlastSimulation, Frame, FrameCache, FrameSequencer, FrameSink, PlaybackController,
    PlaybackDriver, PlaybackHandle, PlaybackState, PlaybackStatus, SampleTable,
    ScalarBlastState, SimulationConfig, SimulationSummary,
};
