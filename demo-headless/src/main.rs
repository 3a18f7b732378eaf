use blast_sim_core::grid::{fetch_or_flat, BoundingBox, FlatTerrainProvider};
use blast_sim_core::simulation::{export_csv, CacheStats};
use blast_sim_core::{
    BlastSimError, BlastSimulation, ExplosiveSpec, ExplosiveType, Frame, GeoPoint, PlaybackDriver,
    SampleTable, SimulationConfig, SimulationSummary,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Blast field simulation demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "blast-sim-demo")]
#[command(about = "Blast-wave field synthesis and playback demo", long_about = None)]
struct Args {
    /// Explosive type (TNT, C4, PETN, RDX, ANFO)
    #[arg(short, long, default_value = "TNT")]
    explosive: ExplosiveType,

    /// Charge mass in kg
    #[arg(short, long, default_value_t = 1000.0)]
    mass: f32,

    /// Epicenter latitude in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    lat: f64,

    /// Epicenter longitude in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    lon: f64,

    /// Number of frames to report and export (default: all playable frames)
    #[arg(short, long)]
    frames: Option<usize>,

    /// JSON array of persisted samples ({time, pressure, velocity, temperature})
    #[arg(short, long)]
    samples: Option<PathBuf>,

    /// JSON simulation config (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write frame,time,max_pressure,max_velocity rows to this file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Terrain bounding box "south,west,north,east" (default: blast radius)
    #[arg(long)]
    bbox: Option<BoundingBox>,

    /// Play back in real time for this many seconds instead of batch reporting
    #[arg(short, long)]
    play: Option<f32>,

    /// Playback speed multiplier (clamped to the configured range)
    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Report every N frames
    #[arg(short, long, default_value_t = 25)]
    report_interval: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> blast_sim_core::Result<()> {
    println!("=== Blast Simulation Demo ===\n");

    let epicenter = GeoPoint::new(args.lat, args.lon)?;
    let spec = ExplosiveSpec::new(args.explosive, args.mass, epicenter)?;
    let config = match &args.config {
        Some(path) => SimulationConfig::load_json(path)?,
        None => SimulationConfig::default(),
    };
    let samples = args.samples.as_ref().map(SampleTable::load_json).transpose()?;

    let sim = BlastSimulation::new(spec, config, samples)?;
    let scaling = sim.sequencer().scaling();
    let geometry = sim.pressure_geometry();
    println!(
        "Charge: {} {} at ({:.4}, {:.4})",
        spec.mass(),
        spec.kind(),
        epicenter.lat,
        epicenter.lon
    );
    println!(
        "TNT equivalent: {:.1}, scale factor {:.3}, blast radius {:.1}",
        scaling.tnt_equivalent, scaling.scale_factor, scaling.blast_radius
    );
    println!(
        "Pressure grid: {}x{} cells of {:.2}",
        geometry.shape().rows(),
        geometry.shape().cols(),
        geometry.cell_size()
    );

    let terrain = match args.bbox {
        Some(bbox) => {
            if !bbox.contains(epicenter) {
                info!("Epicenter lies outside {}", bbox);
            }
            fetch_or_flat(&FlatTerrainProvider::default(), &bbox)
        }
        None => sim.terrain(&FlatTerrainProvider::default()),
    };
    println!(
        "Terrain {}: {} buildings, {} roads\n",
        terrain.bbox,
        terrain.buildings.len(),
        terrain.roads.len()
    );

    let frames = args
        .frames
        .unwrap_or_else(|| sim.total_frames())
        .max(1);
    let report_interval = args.report_interval.max(1);

    if let Some(seconds) = args.play {
        play(&sim, seconds, args.speed, report_interval)?;
    } else {
        report(&sim, frames, report_interval);
    }

    if let Some(path) = &args.csv {
        export_csv(path, sim.sequencer(), 0..frames)?;
        println!("\nWrote {} rows to {}", frames, path.display());
    }
    Ok(())
}

fn print_header() {
    println!("Frame | Time(s) | Pmax(bar) | Vmax(m/s) | Front cells | Source");
    println!("------|---------|-----------|-----------|-------------|---------");
}

fn print_frame(frame: &Frame) {
    println!(
        "{:5} | {:7.2} | {:9.3} | {:9.2} | {:11} | {:?}",
        frame.frame_index,
        *frame.time_s,
        *frame.scalars.max_pressure_bar,
        *frame.scalars.max_velocity_ms,
        frame.pressure.nonzero_count(),
        frame.pressure_source
    );
}

fn print_summary(summary: &SimulationSummary) {
    println!("\n=== Simulation Complete ===");
    println!("Frames: {}", summary.frame_count);
    println!(
        "Peak overpressure: {:.3} at t={:.2}",
        summary.max_pressure, summary.peak_time
    );
    println!("Peak particle velocity: {:.2}", summary.max_velocity);
    println!("Max affected area: {:.0} m²", summary.max_affected_area_m2);
}

fn report(sim: &BlastSimulation, frames: usize, report_interval: usize) {
    println!("Computing {} frames...\n", frames);
    print_header();

    let cell_area = sim.pressure_geometry().cell_area_m2();
    let mut summary = SimulationSummary::default();
    let mut cache = sim.frame_cache();
    for index in 0..frames {
        if index % report_interval == 0 {
            cache.prefetch(index..(index + report_interval).min(frames));
        }
        let frame = cache.get(index);
        summary.record(&frame, cell_area);
        if index % report_interval == 0 || index + 1 == frames {
            print_frame(&frame);
        }
    }
    print_summary(&summary);
    print_cache_stats(&cache.stats());
}

fn play(
    sim: &BlastSimulation,
    seconds: f32,
    speed: f32,
    report_interval: usize,
) -> blast_sim_core::Result<()> {
    let duration = play_duration(seconds)?;
    println!("Playing for {:.1}s...\n", duration.as_secs_f32());
    print_header();

    let controller = sim.controller(move |frame: Arc<Frame>| {
        if frame.frame_index % report_interval == 0 {
            print_frame(&frame);
        }
    });
    let handle = PlaybackDriver::spawn(controller)?;
    let effective = handle.set_speed(speed)?.state.speed_multiplier;
    if effective != speed {
        info!("Speed {} clamped to {}", speed, effective);
    }
    handle.play()?;
    std::thread::sleep(duration);
    let snapshot = handle.pause()?;
    let controller = handle.shutdown()?;

    println!(
        "\nPaused at frame {} of {} ({:?}, speed {:.1}x)",
        snapshot.state.current_frame_index,
        snapshot.state.total_frames,
        snapshot.status,
        snapshot.state.speed_multiplier
    );
    print_cache_stats(&controller.cache().stats());
    Ok(())
}

/// Validate the `--play` length before any worker is spawned
fn play_duration(seconds: f32) -> blast_sim_core::Result<Duration> {
    Duration::try_from_secs_f32(seconds).map_err(|e| BlastSimError::InvalidConfig {
        name: "play",
        message: format!("{seconds} is not a playable number of seconds ({e})"),
    })
}

fn print_cache_stats(stats: &CacheStats) {
    println!(
        "Frame cache: {} hits, {} misses, {}/{} held",
        stats.hits, stats.misses, stats.len, stats.capacity
    );
}
