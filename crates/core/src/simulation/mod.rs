//! Blast simulation runtime
//!
//! `BlastSimulation` ties together:
//! - Configuration (waveform, fields, sequencer and playback constants)
//! - Persisted sample tables and other scalar override sources
//! - The pure frame sequencer and its bounded frame cache
//! - The playback state machine and its threaded driver
//! - Run summaries and CSV export

pub mod config;
pub mod driver;
pub mod export;
pub mod playback;
pub mod samples;
pub mod sequencer;

pub use config::{PlaybackParams, SequencerParams, SimulationConfig};
pub use driver::{PlaybackDriver, PlaybackHandle, PlaybackSnapshot};
pub use export::{export_csv, write_csv, SimulationSummary, CSV_HEADER};
pub use playback::{FrameSink, PlaybackController, PlaybackState, PlaybackStatus};
pub use samples::{BlastSample, SampleTable, ScalarOverrideSource};
pub use sequencer::{CacheStats, Frame, FrameCache, FrameSequencer, ScalarBlastState};

use crate::core_types::error::Result;
use crate::core_types::explosive::ExplosiveSpec;
use crate::grid::{fetch_or_flat, BoundingBox, GridGeometry, TerrainProvider, UrbanTerrain};
use std::sync::Arc;
use tracing::info;

/// One simulation run: an explosive, a configuration and optional samples
///
/// Convenience entry point that validates everything once and hands out the
/// sequencer, caches and playback controllers built from it.
#[derive(Debug, Clone)]
pub struct BlastSimulation {
    config: SimulationConfig,
    sequencer: FrameSequencer,
}

impl BlastSimulation {
    /// Validate the inputs and build the frame sequencer
    ///
    /// # Arguments
    ///
    /// * `spec` - Explosive specification (validated on construction)
    /// * `config` - Simulation configuration
    /// * `samples` - Optional persisted samples seeding the timeline
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a sample cannot be
    /// scaled.
    pub fn new(
        spec: ExplosiveSpec,
        config: SimulationConfig,
        samples: Option<SampleTable>,
    ) -> Result<Self> {
        let mut sequencer = FrameSequencer::new(spec, &config)?;
        if let Some(table) = samples {
            sequencer = sequencer.with_samples(table)?;
        }
        info!(
            "Blast simulation ready: {} frames, {} backend",
            sequencer.total_frames(),
            sequencer.backend_name()
        );
        Ok(Self { config, sequencer })
    }

    /// Attach an external scalar override source (e.g. a surrogate model)
    pub fn with_overrides(mut self, source: Arc<dyn ScalarOverrideSource>) -> Self {
        self.sequencer = self.sequencer.with_overrides(source);
        self
    }

    /// Configuration of this run
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Frame sequencer of this run
    pub fn sequencer(&self) -> &FrameSequencer {
        &self.sequencer
    }

    /// Number of playable frames
    pub fn total_frames(&self) -> usize {
        self.sequencer.total_frames()
    }

    /// Compute one frame
    pub fn frame_at(&self, index: usize) -> Frame {
        self.sequencer.frame_at(index)
    }

    /// Placement of the pressure grid around the epicenter
    pub fn pressure_geometry(&self) -> GridGeometry {
        self.sequencer.pressure_geometry()
    }

    /// A fresh frame cache sized by the configuration
    pub fn frame_cache(&self) -> FrameCache {
        FrameCache::from_sequencer(self.sequencer.clone())
    }

    /// A playback controller for one view, emitting frames to `sink`
    pub fn controller<S: FrameSink>(&self, sink: S) -> PlaybackController<S> {
        PlaybackController::new(self.frame_cache(), self.config.playback, sink)
    }

    /// Summarize every playable frame
    pub fn summarize(&self) -> SimulationSummary {
        SimulationSummary::from_sequencer(&self.sequencer, 0..self.total_frames())
    }

    /// Terrain around the epicenter out to the blast radius
    ///
    /// Falls back to flat, empty terrain if the provider fails.
    pub fn terrain(&self, provider: &dyn TerrainProvider) -> UrbanTerrain {
        let bbox = BoundingBox::around(
            self.sequencer.spec().epicenter(),
            *self.sequencer.scaling().blast_radius,
        );
        fetch_or_flat(provider, &bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::FlatTerrainProvider;

    #[test]
    fn test_simulation_without_samples() {
        let sim = BlastSimulation::new(
            ExplosiveSpec::reference(),
            SimulationConfig::default(),
            None,
        )
        .unwrap();
        assert_eq!(sim.total_frames(), 250);
        assert_eq!(sim.frame_at(3), sim.sequencer().frame_at(3));
    }

    #[test]
    fn test_terrain_covers_blast_radius() {
        let sim = BlastSimulation::new(
            ExplosiveSpec::reference(),
            SimulationConfig::default(),
            None,
        )
        .unwrap();
        let terrain = sim.terrain(&FlatTerrainProvider::default());
        assert!(terrain.bbox.contains(sim.sequencer().spec().epicenter()));
        assert!(terrain.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SimulationConfig::default();
        config.sequencer.fixed_dt = -1.0;
        assert!(BlastSimulation::new(ExplosiveSpec::reference(), config, None).is_err());
    }
}
