//! Run summaries and CSV export

use crate::core_types::error::Result;
use crate::core_types::units::{Bar, MetersPerSecond, Seconds};
use crate::simulation::sequencer::{Frame, FrameSequencer};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::Path;
use tracing::info;

/// CSV header line
pub const CSV_HEADER: &str = "frame,time,max_pressure,max_velocity";

/// Frames synthesized per parallel batch when summarizing
const SUMMARY_BATCH: usize = 64;

/// Aggregate statistics over a run
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Frames recorded
    pub frame_count: usize,
    /// Highest peak overpressure of any frame
    pub max_pressure: Bar,
    /// Highest peak particle velocity of any frame
    pub max_velocity: MetersPerSecond,
    /// Time of the highest peak overpressure
    pub peak_time: Seconds,
    /// Largest ground area with non-zero overpressure (m²)
    pub max_affected_area_m2: f32,
}

impl SimulationSummary {
    /// Fold one frame into the summary
    ///
    /// # Arguments
    ///
    /// * `frame` - Frame to record
    /// * `cell_area_m2` - Ground area of one pressure cell
    pub fn record(&mut self, frame: &Frame, cell_area_m2: f32) {
        self.frame_count += 1;
        if frame.scalars.max_pressure_bar > self.max_pressure {
            self.max_pressure = frame.scalars.max_pressure_bar;
            self.peak_time = frame.time_s;
        }
        self.max_velocity = self.max_velocity.max(frame.scalars.max_velocity_ms);
        let area = frame.pressure.nonzero_count() as f32 * cell_area_m2;
        self.max_affected_area_m2 = self.max_affected_area_m2.max(area);
    }

    /// Summarize a frame range, synthesizing frames in parallel batches
    pub fn from_sequencer(sequencer: &FrameSequencer, range: Range<usize>) -> Self {
        let cell_area = sequencer.pressure_geometry().cell_area_m2();
        let mut summary = Self::default();
        let mut start = range.start;
        while start < range.end {
            let end = (start + SUMMARY_BATCH).min(range.end);
            for frame in sequencer.precompute(start..end) {
                summary.record(&frame, cell_area);
            }
            start = end;
        }
        summary
    }
}

/// Write `frame,time,max_pressure,max_velocity` rows for a frame range
///
/// Only the scalar waveform is evaluated; no fields are synthesized.
///
/// # Errors
///
/// Returns [`BlastSimError::Io`](crate::BlastSimError::Io) if the writer fails.
pub fn write_csv<W: Write>(
    writer: &mut W,
    sequencer: &FrameSequencer,
    range: Range<usize>,
) -> Result<()> {
    writeln!(writer, "{CSV_HEADER}")?;
    for index in range {
        let s = sequencer.scalars_at(index);
        writeln!(
            writer,
            "{},{},{},{}",
            index, *s.time_s, *s.max_pressure_bar, *s.max_velocity_ms
        )?;
    }
    Ok(())
}

/// Write a CSV export of a frame range to a file
///
/// # Errors
///
/// Returns [`BlastSimError::Io`](crate::BlastSimError::Io) if the file cannot be
/// created or written.
pub fn export_csv<P: AsRef<Path>>(
    path: P,
    sequencer: &FrameSequencer,
    range: Range<usize>,
) -> Result<()> {
    let path = path.as_ref();
    let rows = range.len();
    let mut writer = BufWriter::new(File::create(path)?);
    write_csv(&mut writer, sequencer, range)?;
    writer.flush()?;
    info!("Exported {} frames to {}", rows, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::ExplosiveSpec;
    use crate::simulation::config::SimulationConfig;

    fn sequencer() -> FrameSequencer {
        FrameSequencer::new(ExplosiveSpec::reference(), &SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let mut out = Vec::new();
        write_csv(&mut out, &sequencer(), 0..3).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "0,0,15,0");
        assert!(lines[2].starts_with("1,0.1,"));
        assert_eq!(lines[3].split(',').count(), 4);
    }

    #[test]
    fn test_summary_peaks_at_detonation() {
        let summary = SimulationSummary::from_sequencer(&sequencer(), 0..100);
        assert_eq!(summary.frame_count, 100);
        assert_eq!(*summary.max_pressure, 15.0);
        assert_eq!(*summary.peak_time, 0.0);
        assert!(*summary.max_velocity > 0.0);
        assert!(summary.max_affected_area_m2 > 0.0);
    }

    #[test]
    fn test_empty_range() {
        let summary = SimulationSummary::from_sequencer(&sequencer(), 5..5);
        assert_eq!(summary, SimulationSummary::default());
    }
}
