//! TrackView Simulator CLI
//!
//! Run deterministic playback scenarios, or play a track live on the wall clock.

use clap::Parser;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;
use trackview_core::{CircleGenerator, PathGenerator, SimConfig, Simulation, TickOutcome, WaypointLoop};
use trackview_env::{SimClock, WallClock};
use trackview_sim::scenarios::ScenarioId;
use trackview_sim::{load_config, load_track, ScenarioResult, ScenarioRunner, SimError};

/// TrackView Deterministic Simulation CLI
#[derive(Parser, Debug)]
#[command(name = "trackview-sim")]
#[command(about = "Run deterministic playback scenarios for TrackView", long_about = None)]
struct Args {
    /// Seed for generated tracks (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (single_lap, looping, wobbly_track, lane_sweep, follow_cam, manual_drive, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Maximum simulation duration in seconds
    #[arg(short, long, default_value = "20")]
    duration: f64,

    /// Frame rate of the virtual clock
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export sampled frames of a single scenario to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Settings file (JSON, missing fields take defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Closed track to play instead of the seed circle (JSON list of [x, y, z])
    #[arg(long)]
    path_file: Option<PathBuf>,

    /// Play the track on the wall clock instead of running scenarios
    #[arg(long)]
    realtime: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(2);
    }
}

fn run(args: Args) -> Result<(), SimError> {
    if !args.json {
        info!("TrackView Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    let track = match &args.path_file {
        Some(path) => Some(load_track(path)?),
        None => None,
    };

    if args.realtime {
        return run_realtime(config, track.as_ref(), args.duration, args.tick_rate);
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!(
                "Available scenarios: single_lap, looping, wobbly_track, lane_sweep, follow_cam, manual_drive, all"
            );
            std::process::exit(1);
        })]
    };

    // Determine seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let mut runner = ScenarioRunner::new(seed)
        .with_tick_rate(args.tick_rate)
        .with_duration(args.duration)
        .with_config(config);
    if let Some(track) = track {
        runner = runner.with_track(track);
    }

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        info!("Running with export to: {}", export_path);
        let (result, export) = runner.run_with_export(scenarios[0], 10);
        export.write_to_file(export_path)?;
        info!("Exported {} frames to {}", export.frames.len(), export_path);

        report(&result);
        if !result.passed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    for scenario in &scenarios {
        let result = runner.run(*scenario);
        if !args.json {
            report(&result);
        }
        all_results.push(result);
    }

    // Summary
    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "laps": r.laps,
                    "max_yaw_step": r.metrics.max_yaw_step,
                    "max_trail_len": r.metrics.max_trail_len,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn report(result: &ScenarioResult) {
    if result.passed {
        info!(
            "✓ {} (seed={}) PASSED in {} ticks",
            result.scenario.name(),
            result.seed,
            result.total_ticks
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

/// Plays the track live for `duration` seconds of wall time.
fn run_realtime(
    config: SimConfig,
    track: Option<&WaypointLoop>,
    duration: f64,
    tick_rate: u32,
) -> Result<(), SimError> {
    let generator: &dyn PathGenerator = match track {
        Some(track) => track,
        None => &CircleGenerator,
    };
    let mut sim = Simulation::with_generator(config, generator)?;
    sim.set_follow(true);

    let frame = Duration::from_secs_f64(1.0 / tick_rate.max(1) as f64);
    let clock = WallClock::new();
    sim.start(clock.now_secs());

    let mut frames = 0u64;
    while clock.now_secs() < duration {
        let outcome = sim.step(&clock);
        frames += 1;

        match outcome {
            TickOutcome::LapRestarted => info!("lap {} complete, looping", sim.laps()),
            TickOutcome::Finished => {
                info!("lap {} complete", sim.laps());
                break;
            }
            _ => {}
        }

        if frames % tick_rate.max(1) as u64 == 0 {
            let agent = sim.agent();
            debug!(
                "  t={:.1}s | pos=({:.2}, {:.2}, {:.2}) | yaw={:.1} | trail={}",
                clock.now_secs(),
                agent.position.x,
                agent.position.y,
                agent.position.z,
                agent.yaw,
                sim.trail().len()
            );
        }

        thread::sleep(frame);
    }

    info!("Played {} frames over {:.1}s", frames, clock.now_secs());
    Ok(())
}
