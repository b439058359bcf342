//! sensorsync - Scenario playback entry point
//!
//! Loads a JSON scenario, drives the custom pattern sensor visualizer through
//! a range of times and reports the primitives it maintains.

mod config;
mod playback;
mod scenario;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use sensorsync_core::EntityCollection;
use sensorsync_scene::{CustomPatternSensorVisualizer, Scene, Visualizer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "sensorsync")]
#[command(about = "Play back a sensor scenario through the custom pattern sensor visualizer")]
#[command(version)]
struct Args {
    /// Path to the JSON scenario file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Path to configuration file
    #[arg(short, long, default_value = "sensorsync.toml")]
    config: PathBuf,

    /// First update time (RFC 3339); defaults to the scenario start, then now
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Number of updates to run
    #[arg(long)]
    steps: Option<usize>,

    /// Seconds between updates
    #[arg(long)]
    step_secs: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print every step as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("sensorsync v{}", env!("CARGO_PKG_VERSION"));

    let mut config = config::load_config(&args.config)?;
    if let Some(steps) = args.steps {
        config.playback.steps = steps;
    }
    if let Some(step_secs) = args.step_secs {
        config.playback.step_secs = step_secs;
    }

    let scenario = scenario::Scenario::from_file(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;

    let entities = EntityCollection::with_event_capacity(config.playback.event_capacity);
    let count = scenario.populate(&entities)?;
    info!(entities = count, path = %args.scenario.display(), "Scenario loaded");

    let scene = Arc::new(Scene::new());
    let mut visualizer = CustomPatternSensorVisualizer::with_config(
        Some(scene.clone()),
        &entities,
        config.visualizer.clone(),
    )?;

    let start = args.start.or(scenario.start).unwrap_or_else(Utc::now);
    info!(
        start = %start,
        steps = config.playback.steps,
        step_secs = config.playback.step_secs,
        "Starting playback"
    );

    let reports = playback::run(
        &mut visualizer,
        &scene,
        start,
        config.playback.step_secs,
        config.playback.steps,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!(
                "[{}] {}: {} primitives ({} visible)",
                report.step,
                report.time.to_rfc3339(),
                report.primitives.len(),
                report.visible()
            );
            for primitive in &report.primitives {
                println!(
                    "    - {} show={} radius={} directions={} material={:?}",
                    primitive.entity.as_deref().unwrap_or("<none>"),
                    primitive.show,
                    primitive
                        .radius
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "unbounded".to_string()),
                    primitive.directions,
                    primitive.material
                );
            }
        }
    }

    visualizer.destroy();
    Ok(())
}
