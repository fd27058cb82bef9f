//! MargaNav headless runner
//!
//! Drives the configured route on the simulated robot through the real
//! navigation loop and three-wheel odometry, then reports how far the
//! dead-reckoned pose drifted from the truth.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::Parser;

use marga_nav::config::{MargaConfig, RouteWaypoint};
use marga_nav::navigation::Navigator;
use marga_nav::sensors::{Odometer, ThreeWheelOdometry};
use marga_nav::sim::{GroundTruthOdometer, SimulatedDrive, SimulatedEncoders, SimulatedRobot};
use marga_nav::utils::setup_ctrl_c_handler;
use marga_nav::{MargaError, Result};

const DEFAULT_CONFIG: &str = "marga.toml";

#[derive(Parser, Debug)]
#[command(name = "marga-nav")]
#[command(about = "Run a waypoint route on the simulated robot")]
struct Args {
    /// Path to TOML configuration (default: marga.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log every tick at debug level and throttle the loop to 2 Hz
    #[arg(short, long)]
    debug: bool,
}

fn load_config(args: &Args) -> Result<MargaConfig> {
    match &args.config {
        Some(path) => MargaConfig::load(path),
        None if Path::new(DEFAULT_CONFIG).exists() => MargaConfig::load(Path::new(DEFAULT_CONFIG)),
        None => Ok(MargaConfig::default()),
    }
}

/// Square loop used when the configuration has no route.
fn default_route() -> Vec<RouteWaypoint> {
    [(0.0, 24.0, 0.0), (24.0, 24.0, 90.0), (24.0, 0.0, 180.0), (0.0, 0.0, 180.0)]
        .into_iter()
        .map(|(x, y, heading_deg)| RouteWaypoint { x, y, heading_deg })
        .collect()
}

fn main() {
    let args = Args::parse();

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("marga-nav: {}", e);
            std::process::exit(1);
        }
    };
    config.navigation.debug |= args.debug;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .init();

    if let Err(e) = run(config) {
        log::error!("marga-nav error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: MargaConfig) -> Result<()> {
    let route = if config.route.is_empty() {
        default_route()
    } else {
        config.route.clone()
    };

    log::info!("MargaNav v{}", env!("CARGO_PKG_VERSION"));
    log::info!(
        "  Odometry: radius {:.3}, {} ticks/rev, side {:.2}, middle offset {:.2}",
        config.odometry.wheel_radius,
        config.odometry.ticks_per_rotation,
        config.odometry.side_encoder_distance,
        config.odometry.middle_encoder_offset
    );
    log::info!(
        "  Simulation: dt {:.3}s, {:.1} units/s, {:.2} rad/s, slip {:.3}",
        config.simulation.dt,
        config.simulation.max_linear_speed,
        config.simulation.max_angular_speed,
        config.simulation.slip_stddev
    );
    log::info!("  Route: {} waypoints", route.len());

    let running = setup_ctrl_c_handler()?;

    let robot = SimulatedRobot::new(config.simulation.clone(), config.odometry)?.into_shared();
    let mut ground_truth = GroundTruthOdometer::new(robot.clone());
    let mut odometry =
        ThreeWheelOdometry::new(config.odometry, SimulatedEncoders::new(robot.clone()))?;

    let start = config.simulation.start_pose();
    odometry.reset_to(start.x, start.y, start.theta);

    let mut navigator = Navigator::spawn(
        config.navigation.clone(),
        odometry,
        SimulatedDrive::new(robot.clone()),
    )?;

    for wp in &route {
        navigator.add_waypoint(wp.x, wp.y, wp.heading_deg);
    }

    loop {
        if !running.load(Ordering::SeqCst) {
            log::warn!("Interrupted, abandoning route");
            break;
        }
        match navigator.wait_while_busy_timeout(Duration::from_millis(100)) {
            Ok(true) => break,
            Ok(false) => {}
            Err(MargaError::Closed) => {
                log::error!("Navigation loop stopped before the route finished");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    let estimate = navigator.pose();
    navigator.close();

    let truth = ground_truth.pose();
    let plant = robot.lock();
    log::info!(
        "Finished after {} drive steps ({:.1}s simulated), {} ticks",
        plant.steps(),
        plant.elapsed(),
        navigator.status().ticks
    );
    log::info!(
        "  Estimated: ({:.3}, {:.3}, {:.2}°)",
        estimate.x,
        estimate.y,
        estimate.theta.to_degrees()
    );
    log::info!(
        "  True:      ({:.3}, {:.3}, {:.2}°)",
        truth.x,
        truth.y,
        truth.theta.to_degrees()
    );
    log::info!(
        "  Drift:     {:.4} units, {:.3}°",
        estimate.distance(&truth),
        (estimate.theta - truth.theta).to_degrees()
    );

    Ok(())
}
