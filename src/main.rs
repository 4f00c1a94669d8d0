use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use traffic_sim::control_system::signal_light::DWELL_RANGE_MS;
use traffic_sim::error::ConfigError;
use traffic_sim::monitoring::metrics::watch_phases;
use traffic_sim::monitoring::{MetricsRecorder, SimEvent};
use traffic_sim::rendering::FrameRenderer;
use traffic_sim::simulation_engine::simulation::{City, Simulation};

struct CliConfig {
    city: City,
    vehicles: usize,
    duration: Duration,
    out_dir: PathBuf,
    render: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            city: City::Paris,
            vehicles: 6,
            duration: Duration::from_secs(20),
            out_dir: PathBuf::from("output"),
            render: false,
        }
    }
}

fn print_usage() {
    println!("Traffic Simulation");
    println!("Usage: traffic_sim [options]");
    println!("Options:");
    println!("  --city <name>      City map to use (paris or nyc, default: paris)");
    println!("  --vehicles <num>   Number of vehicles (default: 6)");
    println!("  --duration <sec>   Simulation duration in seconds (default: 20)");
    println!("  --output <dir>     Output directory for metrics and frames (default: output)");
    println!("  --render           Write PNG snapshot frames while running");
    println!("  --help             Show this help message");
}

/// Returns `None` when `--help` was requested.
fn parse_args(args: &[String]) -> Result<Option<CliConfig>, ConfigError> {
    let mut config = CliConfig::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str| {
            iter.next().ok_or_else(|| ConfigError::MissingValue {
                flag: flag.to_string(),
            })
        };
        match arg.as_str() {
            "--city" => config.city = value_for("--city")?.parse()?,
            "--vehicles" => {
                let value = value_for("--vehicles")?;
                config.vehicles = value.parse().map_err(|_| ConfigError::InvalidFlag {
                    flag: "--vehicles",
                    value: value.clone(),
                })?;
            }
            "--duration" => {
                let value = value_for("--duration")?;
                let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidFlag {
                    flag: "--duration",
                    value: value.clone(),
                })?;
                config.duration = Duration::from_secs(secs);
            }
            "--output" => config.out_dir = PathBuf::from(value_for("--output")?),
            "--render" => config.render = true,
            "--help" => {
                print_usage();
                return Ok(None);
            }
            other => return Err(ConfigError::UnknownFlag(other.to_string())),
        }
    }
    Ok(Some(config))
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let config = match parse_args(args)? {
        Some(config) => config,
        None => return Ok(()),
    };
    std::fs::create_dir_all(&config.out_dir)?;

    println!("Starting traffic simulation...");
    println!("City: {:?}", config.city);
    println!("Vehicles: {}", config.vehicles);
    println!("Duration: {} seconds", config.duration.as_secs());
    println!("Output: {}", config.out_dir.display());

    let recorder = MetricsRecorder::new();
    let events = recorder.sender();
    let metrics_handle = recorder.start(
        config.out_dir.join("events.csv"),
        config.out_dir.join("summary.json"),
    );

    let sim = Simulation::build(
        config.city,
        config.vehicles,
        DWELL_RANGE_MS,
        Some(events.clone()),
    );
    watch_phases(&sim.controllers, &events);
    sim.start();

    let render_handle = if config.render {
        let renderer = FrameRenderer::new(
            Arc::clone(&sim.network),
            sim.controllers.clone(),
            sim.vehicles.clone(),
            config.out_dir.clone(),
            1024,
            768,
        );
        Some(renderer.start(Duration::from_millis(100), sim.running()))
    } else {
        None
    };

    thread::sleep(config.duration);
    sim.stop();

    if let Some(handle) = render_handle {
        let _ = handle.join();
    }
    // Give in-flight crossings a moment to land in the event log.
    thread::sleep(Duration::from_millis(300));
    events.send(SimEvent::Shutdown);
    let _ = metrics_handle.join();

    println!("Simulation complete!");
    Ok(())
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
