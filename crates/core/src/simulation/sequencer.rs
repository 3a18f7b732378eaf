//! Frame sequencing and caching
//!
//! `FrameSequencer::frame_at` is a pure function of the frame index: it maps the
//! index to a time, evaluates the waveform (or an external override) at that
//! time and synthesizes both fields from scratch. Nothing depends on a
//! previously computed frame, so frames can be computed in any order, in
//! parallel, or again later with bit-identical results.
//!
//! `FrameCache` memoizes frames for playback and scrubbing. It is an
//! optimization only; a cache miss recomputes the same value.

use crate::core_types::error::Result;
use crate::core_types::explosive::ExplosiveSpec;
use crate::core_types::units::{Bar, MetersPerSecond, Seconds};
use crate::grid::GridGeometry;
use crate::physics::scaling::BlastScaling;
use crate::physics::waveform::{resolve_magnitude, MagnitudeSource, WaveformParams};
use crate::simulation::config::{SequencerParams, SimulationConfig};
use crate::simulation::samples::{SampleTable, ScalarOverrideSource};
use crate::solver::{create_field_backend, FieldBackend, FieldRequest, PressureField, VelocityField};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Peak magnitudes of one instant
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScalarBlastState {
    /// Physical time since detonation
    pub time_s: Seconds,
    /// Peak overpressure
    pub max_pressure_bar: Bar,
    /// Peak particle velocity
    pub max_velocity_ms: MetersPerSecond,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Position in the sequence
    pub frame_index: usize,
    /// Physical time since detonation
    pub time_s: Seconds,
    /// Overpressure field (bar)
    pub pressure: PressureField,
    /// Particle velocity field (m/s)
    pub velocity: VelocityField,
    /// Peak magnitudes the fields were synthesized with
    pub scalars: ScalarBlastState,
    /// Origin of the peak overpressure
    pub pressure_source: MagnitudeSource,
    /// Origin of the peak particle velocity
    pub velocity_source: MagnitudeSource,
    /// Recorded temperature (K), when an override source supplies one
    pub temperature_k: Option<f32>,
}

/// Resolved scalar inputs of one frame
#[derive(Debug, Clone, Copy)]
struct ResolvedScalars {
    state: ScalarBlastState,
    reference_time: f32,
    pressure_source: MagnitudeSource,
    velocity_source: MagnitudeSource,
    temperature_k: Option<f32>,
}

/// Pure mapping from frame index to frame
#[derive(Clone)]
pub struct FrameSequencer {
    spec: ExplosiveSpec,
    scaling: BlastScaling,
    waveform: WaveformParams,
    params: SequencerParams,
    backend: Arc<dyn FieldBackend>,
    overrides: Option<Arc<dyn ScalarOverrideSource>>,
    total_frames: usize,
}

impl fmt::Debug for FrameSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSequencer")
            .field("spec", &self.spec)
            .field("scaling", &self.scaling)
            .field("backend", &self.backend.name())
            .field("has_overrides", &self.overrides.is_some())
            .field("total_frames", &self.total_frames)
            .finish_non_exhaustive()
    }
}

impl FrameSequencer {
    /// Create a sequencer driven by the analytic waveform
    ///
    /// # Arguments
    ///
    /// * `spec` - Validated explosive specification
    /// * `config` - Simulation configuration (validated here)
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::InvalidConfig`](crate::BlastSimError::InvalidConfig)
    /// if any configuration constant is out of range.
    pub fn new(spec: ExplosiveSpec, config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let scaling = BlastScaling::from_spec(&spec);
        let backend: Arc<dyn FieldBackend> = Arc::from(create_field_backend(&config.fields));

        info!(
            "Frame sequencer: {} {} (TNT eq {:.1}, scale {:.3}, radius {:.1}), {} frames at dt={}s",
            spec.mass(),
            spec.kind(),
            scaling.tnt_equivalent,
            scaling.scale_factor,
            scaling.blast_radius,
            config.sequencer.min_total_frames,
            config.sequencer.fixed_dt
        );

        Ok(Self {
            spec,
            scaling,
            waveform: config.waveform,
            params: config.sequencer,
            backend,
            overrides: None,
            total_frames: config.sequencer.min_total_frames,
        })
    }

    /// Seed the timeline and magnitudes from a persisted sample table
    ///
    /// The table is rescaled with the sequencer's sample scales.
    ///
    /// # Errors
    ///
    /// Returns an error if a scaled sample value overflows.
    pub fn with_samples(self, table: SampleTable) -> Result<Self> {
        let table = table.with_scales(
            self.params.sample_pressure_scale,
            self.params.sample_velocity_scale,
        )?;
        let zero_pressure = table
            .samples()
            .iter()
            .filter(|s| s.pressure == Some(0.0))
            .count();
        if zero_pressure > 0 {
            warn!(
                "{} samples report exactly zero pressure; honoured as measured values",
                zero_pressure
            );
        }
        Ok(self.with_overrides(Arc::new(table)))
    }

    /// Attach an external scalar override source (hybrid mode)
    pub fn with_overrides(mut self, source: Arc<dyn ScalarOverrideSource>) -> Self {
        self.total_frames = source.frame_count().max(self.params.min_total_frames);
        info!(
            "Scalar overrides attached: {} supplied frames, {} playable",
            source.frame_count(),
            self.total_frames
        );
        self.overrides = Some(source);
        self
    }

    /// Replace the field backend
    pub fn with_backend(mut self, backend: Arc<dyn FieldBackend>) -> Self {
        info!("Using {} field backend", backend.name());
        self.backend = backend;
        self
    }

    /// Number of playable frames
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Explosive specification of this run
    pub fn spec(&self) -> &ExplosiveSpec {
        &self.spec
    }

    /// Scaling quantities of this run
    pub fn scaling(&self) -> &BlastScaling {
        &self.scaling
    }

    /// Name of the active field backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Physical placement of the pressure grid
    pub fn pressure_geometry(&self) -> GridGeometry {
        GridGeometry::new(
            self.backend.pressure_grid(),
            self.spec.epicenter(),
            &self.scaling,
        )
    }

    /// Physical placement of the velocity grid
    pub fn velocity_geometry(&self) -> GridGeometry {
        GridGeometry::new(
            self.backend.velocity_grid(),
            self.spec.epicenter(),
            &self.scaling,
        )
    }

    /// Physical time of a frame
    ///
    /// Uses the supplied sample time when the override source defines one,
    /// otherwise `index × fixed_dt`.
    pub fn time_at(&self, index: usize) -> Seconds {
        let supplied = self
            .overrides
            .as_ref()
            .and_then(|source| source.time_at(index));
        match supplied {
            Some(t) if t.is_finite() && t >= 0.0 => Seconds::new(t),
            _ => Seconds::new(index as f32 * self.params.fixed_dt),
        }
    }

    fn resolve(&self, index: usize) -> ResolvedScalars {
        let time_s = self.time_at(index);
        let reference_time = self.scaling.scaled_time(*time_s);
        let analytic_pressure = *self.waveform.peak_pressure_bar(reference_time);
        let analytic_velocity = *self.waveform.peak_velocity_ms(reference_time);

        let external = self
            .overrides
            .as_ref()
            .and_then(|source| source.overrides_at(index, *time_s))
            .unwrap_or_default();

        let pressure = usable_override(index, "pressure", external.pressure.map(Bar::value));
        let velocity = usable_override(
            index,
            "velocity",
            external.velocity.map(MetersPerSecond::value),
        );
        let (max_pressure, pressure_source) = resolve_magnitude(analytic_pressure, pressure);
        let (max_velocity, velocity_source) = resolve_magnitude(analytic_velocity, velocity);

        if pressure_source == MagnitudeSource::External
            && max_pressure == 0.0
            && analytic_pressure > 0.0
        {
            debug!(
                "Frame {}: external pressure is 0.0 where analytic is {:.3} bar",
                index, analytic_pressure
            );
        }

        ResolvedScalars {
            state: ScalarBlastState {
                time_s,
                max_pressure_bar: Bar::new(max_pressure),
                max_velocity_ms: MetersPerSecond::new(max_velocity),
            },
            reference_time,
            pressure_source,
            velocity_source,
            temperature_k: external.temperature_k.filter(|t| t.is_finite()),
        }
    }

    /// Peak magnitudes of a frame without synthesizing its fields
    pub fn scalars_at(&self, index: usize) -> ScalarBlastState {
        self.resolve(index).state
    }

    /// Compute a frame
    ///
    /// `Frame::time_s` is physical time. The waveform and both fields are
    /// evaluated at the scaled time `t / λ`, so the front radius in grid cells is
    /// `(t / λ) × wave_speed` and only equals `t × wave_speed` for the 1000 kg
    /// TNT reference charge.
    ///
    /// Indices past `total_frames` extrapolate along the fixed time stride and
    /// the analytic waveform.
    pub fn frame_at(&self, index: usize) -> Frame {
        let resolved = self.resolve(index);
        let fields = self.backend.synthesize(&FieldRequest {
            time_s: resolved.reference_time,
            max_pressure: *resolved.state.max_pressure_bar,
            max_velocity: *resolved.state.max_velocity_ms,
        });

        Frame {
            frame_index: index,
            time_s: resolved.state.time_s,
            pressure: fields.pressure,
            velocity: fields.velocity,
            scalars: resolved.state,
            pressure_source: resolved.pressure_source,
            velocity_source: resolved.velocity_source,
            temperature_k: resolved.temperature_k,
        }
    }

    /// Compute a range of frames in parallel
    pub fn precompute(&self, range: Range<usize>) -> Vec<Frame> {
        debug!("Precomputing frames {}..{}", range.start, range.end);
        range.into_par_iter().map(|i| self.frame_at(i)).collect()
    }
}

/// Drop an external magnitude that cannot scale a field
///
/// Negative or non-finite values count as not supplied, so the analytic
/// waveform is used for that frame instead.
fn usable_override(index: usize, quantity: &str, value: Option<f32>) -> Option<f32> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            warn!(
                "Frame {}: ignoring external {} {}, using analytic waveform",
                index, quantity, v
            );
            None
        }
        other => other,
    }
}

/// Hit/miss counters of a [`FrameCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that computed a frame
    pub misses: u64,
    /// Frames currently held
    pub len: usize,
    /// Maximum frames held
    pub capacity: usize,
}

/// Bounded memo table over a [`FrameSequencer`]
///
/// Oldest insertions are evicted first. A capacity of 0 disables caching.
#[derive(Debug)]
pub struct FrameCache {
    sequencer: FrameSequencer,
    frames: FxHashMap<usize, Arc<Frame>>,
    order: VecDeque<usize>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl FrameCache {
    /// Create a cache holding at most `capacity` frames
    pub fn new(sequencer: FrameSequencer, capacity: usize) -> Self {
        Self {
            sequencer,
            frames: FxHashMap::default(),
            order: VecDeque::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache sized by the sequencer's configuration
    pub fn from_sequencer(sequencer: FrameSequencer) -> Self {
        let capacity = sequencer.params.cache_capacity;
        Self::new(sequencer, capacity)
    }

    /// Underlying sequencer
    pub fn sequencer(&self) -> &FrameSequencer {
        &self.sequencer
    }

    /// Number of playable frames
    pub fn total_frames(&self) -> usize {
        self.sequencer.total_frames()
    }

    /// Frame at `index`, computed on a miss
    pub fn get(&mut self, index: usize) -> Arc<Frame> {
        if let Some(frame) = self.frames.get(&index) {
            self.hits += 1;
            return Arc::clone(frame);
        }
        self.misses += 1;
        let frame = Arc::new(self.sequencer.frame_at(index));
        self.insert(Arc::clone(&frame));
        frame
    }

    /// Compute missing frames of `range` in parallel and cache them
    ///
    /// At most `capacity` frames from the start of the range are computed.
    pub fn prefetch(&mut self, range: Range<usize>) {
        let missing: Vec<usize> = range
            .take(self.capacity)
            .filter(|i| !self.frames.contains_key(i))
            .collect();
        if missing.is_empty() {
            return;
        }
        debug!("Prefetching {} frames", missing.len());
        let sequencer = &self.sequencer;
        let computed: Vec<Frame> = missing.par_iter().map(|&i| sequencer.frame_at(i)).collect();
        for frame in computed {
            self.insert(Arc::new(frame));
        }
    }

    fn insert(&mut self, frame: Arc<Frame>) {
        if self.capacity == 0 {
            return;
        }
        while self.frames.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.frames.remove(&oldest);
                }
                None => break,
            }
        }
        let index = frame.frame_index;
        if self.frames.insert(index, frame).is_none() {
            self.order.push_back(index);
        }
    }

    /// True if the frame is held
    pub fn contains(&self, index: usize) -> bool {
        self.frames.contains_key(&index)
    }

    /// Drop every cached frame
    pub fn clear(&mut self) {
        self.frames.clear();
        self.order.clear();
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.frames.len(),
            capacity: self.capacity,
        }
    }
}
