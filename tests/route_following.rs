//! Route following on the simulated robot.
//!
//! Most tests step the loop by hand through [`run_tick`] so the sequence of
//! ticks is deterministic; the rest run the threaded [`Navigator`].

use std::thread;
use std::time::Duration;

use marga_nav::navigation::{Navigator, NavigatorConfig, Tick, TickAction, Tolerances, WaypointQueue};
use marga_nav::sensors::{Odometer, ThreeWheelGeometry, ThreeWheelOdometry};
use marga_nav::sim::{
    GroundTruthOdometer, SharedRobot, SimConfig, SimulatedDrive, SimulatedEncoders, SimulatedRobot,
};
use marga_nav::state::SharedState;
use marga_nav::threads::run_tick;
use marga_nav::{MargaError, Pose2D, Waypoint};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Upper bound on ticks for any route in these tests.
const MAX_TICKS: usize = 20_000;

const WAIT: Duration = Duration::from_secs(30);

// ============================================================================
// Tick-stepped rig
// ============================================================================

struct Rig {
    robot: SharedRobot,
    state: SharedState,
    driver: SimulatedDrive,
    tolerances: Tolerances,
}

impl Rig {
    fn new(config: &NavigatorConfig) -> Self {
        let geometry = ThreeWheelGeometry::default();
        let robot = SimulatedRobot::new(SimConfig::default(), geometry)
            .unwrap()
            .into_shared();
        let odometry =
            ThreeWheelOdometry::new(geometry, SimulatedEncoders::new(robot.clone())).unwrap();

        let mut odometer: Box<dyn Odometer> = Box::new(odometry);
        let seed = Waypoint::at_pose(odometer.pose());
        let state = SharedState::new(WaypointQueue::new(seed), config.speed_limits(), odometer);

        Self {
            driver: SimulatedDrive::new(robot.clone()),
            robot,
            state,
            tolerances: config.tolerances(),
        }
    }

    fn add(&self, x: f64, y: f64, heading_deg: f64) {
        self.state
            .lock_queue()
            .add(Waypoint::from_degrees(x, y, heading_deg));
    }

    fn index(&self) -> usize {
        self.state.lock_queue().index()
    }

    fn is_busy(&self) -> bool {
        self.state.lock_queue().is_busy()
    }

    fn step(&mut self) -> Tick {
        run_tick(&self.state, &self.tolerances, &mut self.driver).expect("loop cancelled")
    }

    /// Step until `done` holds after a tick.
    fn step_until(&mut self, mut done: impl FnMut(&Self, &Tick) -> bool) -> Vec<Tick> {
        let mut ticks = Vec::new();
        for _ in 0..MAX_TICKS {
            let tick = self.step();
            ticks.push(tick);
            if done(self, &tick) {
                return ticks;
            }
        }
        panic!("condition not reached in {} ticks", MAX_TICKS);
    }

    /// Step until the route collapses to its resting waypoint.
    fn run_until_idle(&mut self) -> Vec<Tick> {
        self.step_until(|rig, _| !rig.is_busy())
    }

    fn true_pose(&self) -> Pose2D {
        self.robot.lock().true_pose()
    }
}

fn assert_arrived(tick: &Tick, x: f64, y: f64, heading_deg: f64, config: &NavigatorConfig) {
    let target = Pose2D::new(x, y, heading_deg.to_radians());
    let miss = tick.pose.distance(&target);
    assert!(
        miss <= config.distance_buffer + 1e-9,
        "stopped {:.3} from ({}, {}): {:?}",
        miss,
        x,
        y,
        tick.pose
    );
    let heading_error = (tick.pose.theta - target.theta).abs();
    assert!(
        heading_error <= config.rotation_buffer_deg.to_radians() + 1e-9,
        "heading off by {:.3}°",
        heading_error.to_degrees()
    );
}

// ============================================================================
// Single leg
// ============================================================================

#[test]
fn test_single_leg_holds_on_arrival() {
    let config = NavigatorConfig::default();
    let mut rig = Rig::new(&config);
    rig.add(32.0, 0.0, 0.0);

    let ticks = rig.run_until_idle();
    let last = ticks.last().unwrap();

    assert_eq!(last.action, TickAction::Hold);
    assert_arrived(last, 32.0, 0.0, 0.0, &config);
    assert_eq!(
        rig.state.lock_queue().to_vec(),
        vec![Waypoint::from_degrees(32.0, 0.0, 0.0)]
    );
    assert_eq!(rig.robot.lock().holds(), 1);
}

#[test]
fn test_speed_rises_then_falls_along_leg() {
    let config = NavigatorConfig::default();
    let mut rig = Rig::new(&config);
    rig.add(0.0, 64.0, 0.0);

    let speeds: Vec<f64> = rig
        .run_until_idle()
        .iter()
        .filter(|tick| matches!(tick.action, TickAction::Drive(_)))
        .map(|tick| tick.speed)
        .collect();
    assert!(speeds.len() > 10);

    let peak = speeds
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (i, &s)| if s > best.1 { (i, s) } else { best });
    assert!((peak.1 - config.max_speed).abs() < 1e-9, "never reached cruise");

    for pair in speeds[..=peak.0].windows(2) {
        assert!(pair[1] >= pair[0] - 1e-12, "dipped while accelerating: {:?}", pair);
    }
    for pair in speeds[peak.0..].windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "rose while decelerating: {:?}", pair);
    }
    assert!((speeds.last().unwrap() - config.min_speed).abs() < 1e-9);
}

#[test]
fn test_estimate_stays_close_to_truth() {
    let config = NavigatorConfig::default();
    let mut rig = Rig::new(&config);
    rig.add(20.0, 30.0, 45.0);

    let last = *rig.run_until_idle().last().unwrap();
    assert!(last.pose.distance(&rig.true_pose()) < 0.1);
}

// ============================================================================
// Multi-waypoint routes
// ============================================================================

#[test]
fn test_passes_through_intermediate_waypoints_without_stopping() {
    let config = NavigatorConfig::default();
    let mut rig = Rig::new(&config);
    rig.add(0.0, 24.0, 0.0);
    rig.add(0.0, 48.0, 0.0);

    let mut busy_after = Vec::new();
    let ticks = rig.step_until(|rig, _| {
        let busy = rig.is_busy();
        busy_after.push(busy);
        !busy
    });

    // Seed, then the intermediate waypoint
    let advances: Vec<&Tick> = ticks
        .iter()
        .filter(|tick| tick.action == TickAction::Advance)
        .collect();
    assert_eq!(advances.len(), 2);
    assert!(
        advances[1].speed > 0.5,
        "slowed to {:.3} at an intermediate waypoint",
        advances[1].speed
    );

    // Busy until the final tick collapses the route
    assert!(busy_after[..busy_after.len() - 1].iter().all(|&b| b));
    assert_eq!(rig.robot.lock().holds(), 1);
    assert_arrived(ticks.last().unwrap(), 0.0, 48.0, 0.0, &config);
}

#[test]
fn test_blends_heading_across_leg() {
    let config = NavigatorConfig::default();
    let mut rig = Rig::new(&config);
    rig.add(0.0, 30.0, 0.0);
    rig.add(30.0, 30.0, 90.0);

    let ticks = rig.run_until_idle();
    let on_turning_leg: Vec<&Tick> = ticks
        .iter()
        .filter(|tick| tick.target == Waypoint::from_degrees(30.0, 30.0, 90.0))
        .collect();

    let quarter = 90f64.to_radians();
    for tick in &on_turning_leg {
        assert!(tick.target_yaw >= -1e-12 && tick.target_yaw <= quarter + 1e-12);
    }
    // Turning starts before the waypoint is reached
    assert!(
        on_turning_leg
            .iter()
            .any(|tick| tick.pose.theta > 0.5 && tick.progress.distance_to_target > 10.0)
    );
    assert_arrived(ticks.last().unwrap(), 30.0, 30.0, 90.0, &config);
}

#[test]
fn test_inject_redirects_before_resuming() {
    let config = NavigatorConfig::default();
    let mut rig = Rig::new(&config);
    rig.add(0.0, 20.0, 0.0);
    rig.add(20.0, 20.0, 0.0);
    rig.add(20.0, 0.0, 0.0);
    rig.add(0.0, 0.0, 0.0);
    assert_eq!(rig.state.lock_queue().size(), 5);

    rig.step_until(|rig, _| rig.index() == 2);

    let detour = Waypoint::from_degrees(10.0, 30.0, 0.0);
    rig.state.lock_queue().inject(detour);
    {
        let mut queue = rig.state.lock_queue();
        assert_eq!(queue.size(), 6);
        assert_eq!(queue.index(), 2);
        assert_eq!(queue.waypoint(2), Some(detour));
        assert_eq!(queue.waypoint(3), Some(Waypoint::from_degrees(20.0, 20.0, 0.0)));
    }

    assert_eq!(rig.step().target, detour);

    let ticks = rig.step_until(|rig, _| rig.index() == 3);
    let reached = ticks.last().unwrap();
    assert_eq!(reached.action, TickAction::Advance);
    assert!(reached.pose.distance(&detour.as_pose()) < 3.0);

    let ticks = rig.run_until_idle();
    assert_arrived(ticks.last().unwrap(), 0.0, 0.0, 0.0, &config);
}

#[test]
fn test_skip_abandons_current_waypoint() {
    let config = NavigatorConfig::default();
    let mut rig = Rig::new(&config);
    rig.add(0.0, 30.0, 0.0);
    rig.add(30.0, 30.0, 0.0);

    rig.step_until(|rig, tick| rig.index() == 1 && tick.pose.y > 1.0);
    rig.state.lock_queue().skip();
    assert_eq!(rig.index(), 2);

    let ticks = rig.run_until_idle();
    let skipped = Pose2D::new(0.0, 30.0, 0.0);
    assert!(ticks.iter().all(|tick| tick.pose.distance(&skipped) > 10.0));
    assert_arrived(ticks.last().unwrap(), 30.0, 30.0, 0.0, &config);
}

#[test]
fn test_clear_finishes_current_waypoint_only() {
    let config = NavigatorConfig::default();
    let mut rig = Rig::new(&config);
    rig.add(0.0, 40.0, 0.0);
    rig.add(40.0, 40.0, 0.0);

    rig.step_until(|rig, tick| rig.index() == 1 && tick.pose.y > 5.0);
    rig.state.lock_queue().clear();
    assert!(!rig.is_busy());

    let ticks = rig.step_until(|_, tick| tick.action == TickAction::Hold);
    assert_arrived(ticks.last().unwrap(), 0.0, 40.0, 0.0, &config);
    assert_eq!(
        rig.state.lock_queue().to_vec(),
        vec![Waypoint::from_degrees(0.0, 40.0, 0.0)]
    );
}

// ============================================================================
// Path correction
// ============================================================================

/// Knock the robot 4 units right of a 40-unit leg, then report its lateral
/// error once it is halfway along.
fn lateral_error_halfway(path_correction: bool) -> f64 {
    let config = NavigatorConfig {
        path_correction,
        ..Default::default()
    };
    let mut rig = Rig::new(&config);
    rig.add(0.0, 40.0, 0.0);

    rig.step_until(|rig, _| rig.index() == 1);
    rig.robot.lock().move_body(0.0, 4.0, 0.0);

    let ticks = rig.step_until(|_, tick| tick.pose.y >= 20.0);
    let halfway = ticks.last().unwrap().pose.x;

    let ticks = rig.run_until_idle();
    assert_arrived(ticks.last().unwrap(), 0.0, 40.0, 0.0, &config);
    halfway.abs()
}

#[test]
fn test_path_correction_pulls_back_onto_leg() {
    let corrected = lateral_error_halfway(true);
    let direct = lateral_error_halfway(false);

    assert!(corrected < 0.5, "still {:.3} off the leg", corrected);
    assert!(direct > 1.5, "direct approach only {:.3} off", direct);
}

// ============================================================================
// Threaded navigator
// ============================================================================

fn spawn_sim_navigator(config: NavigatorConfig) -> (Navigator, SharedRobot) {
    let geometry = ThreeWheelGeometry::default();
    let robot = SimulatedRobot::new(SimConfig::default(), geometry)
        .unwrap()
        .into_shared();
    let odometry = ThreeWheelOdometry::new(geometry, SimulatedEncoders::new(robot.clone())).unwrap();
    let navigator = Navigator::spawn(config, odometry, SimulatedDrive::new(robot.clone())).unwrap();
    (navigator, robot)
}

#[test]
fn test_navigator_end_to_end() {
    let config = NavigatorConfig::default();
    let (mut navigator, robot) = spawn_sim_navigator(config.clone());

    navigator.add_waypoint(32.0, 0.0, 0.0);
    assert!(navigator.wait_while_busy_timeout(WAIT).unwrap());

    let pose = navigator.pose();
    assert!(pose.distance(&Pose2D::new(32.0, 0.0, 0.0)) <= config.distance_buffer + 1e-9);
    assert!(pose.theta.abs() <= config.rotation_buffer_deg.to_radians() + 1e-9);
    assert_eq!(
        navigator.waypoints(),
        vec![Waypoint::from_degrees(32.0, 0.0, 0.0)]
    );
    assert!(!navigator.is_busy());

    navigator.close();
    assert!(pose.distance(&robot.lock().true_pose()) < 0.05);
}

#[test]
fn test_navigator_square_route() {
    let config = NavigatorConfig::default();
    let (mut navigator, robot) = spawn_sim_navigator(config.clone());

    navigator.add_waypoint(0.0, 24.0, 0.0);
    navigator.add_waypoint(24.0, 24.0, 90.0);
    navigator.add_waypoint(24.0, 0.0, 180.0);
    navigator.add_waypoint(0.0, 0.0, 180.0);
    assert!(navigator.is_busy());
    assert!(navigator.wait_while_busy_timeout(WAIT).unwrap());

    let pose = navigator.pose();
    assert!(pose.distance(&Pose2D::new(0.0, 0.0, 0.0)) <= config.distance_buffer + 1e-9);
    assert!((pose.theta - 180f64.to_radians()).abs() <= config.rotation_buffer_deg.to_radians() + 1e-9);

    navigator.close();
    let truth = robot.lock().true_pose();
    assert!(pose.distance(&truth) < 0.2, "drifted to {:?}, truth {:?}", pose, truth);
}

#[test]
fn test_navigator_on_ground_truth_odometer() {
    let config = NavigatorConfig::default();
    let robot = SimulatedRobot::new(SimConfig::default(), ThreeWheelGeometry::default())
        .unwrap()
        .into_shared();
    let mut navigator = Navigator::spawn(
        config.clone(),
        GroundTruthOdometer::new(robot.clone()),
        SimulatedDrive::new(robot.clone()),
    )
    .unwrap();

    // Declare the start to be (10, 10); the target is then 20 ahead
    navigator.reset_position(10.0, 10.0, 0.0);
    navigator.add_waypoint(10.0, 30.0, 90.0);
    assert!(navigator.wait_while_busy_timeout(WAIT).unwrap());
    navigator.close();

    let truth = robot.lock().true_pose();
    assert!(truth.distance(&Pose2D::new(0.0, 20.0, 0.0)) <= config.distance_buffer + 1e-9);
    assert!((truth.theta - 90f64.to_radians()).abs() <= config.rotation_buffer_deg.to_radians() + 1e-9);
}

#[test]
fn test_navigator_reset_position_when_idle() {
    let config = NavigatorConfig::default();
    let (navigator, _robot) = spawn_sim_navigator(config.clone());

    navigator.reset_position(5.0, 5.0, 90.0);
    assert_eq!(
        navigator.waypoints(),
        vec![Waypoint::from_degrees(5.0, 5.0, 90.0)]
    );
    assert!(!navigator.is_busy());

    thread::sleep(Duration::from_millis(50));
    let pose = navigator.pose();
    assert!(pose.distance(&Pose2D::new(5.0, 5.0, 0.0)) <= config.distance_buffer);
    assert!((pose.theta - 90f64.to_radians()).abs() <= config.rotation_buffer_deg.to_radians());
}

#[test]
fn test_navigator_close_mid_route() {
    let config = NavigatorConfig {
        tick_interval_ms: 1,
        ..Default::default()
    };
    let (mut navigator, robot) = spawn_sim_navigator(config);

    navigator.add_waypoint(0.0, 1000.0, 0.0);
    thread::sleep(Duration::from_millis(20));
    navigator.close();

    assert!(!navigator.is_running());
    assert!(navigator.is_busy());
    assert!(matches!(navigator.wait_while_busy(), Err(MargaError::Closed)));

    let steps = robot.lock().steps();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(robot.lock().steps(), steps);
}

#[test]
fn test_navigator_speed_limits_stay_ordered() {
    let (navigator, _robot) = spawn_sim_navigator(NavigatorConfig::default());
    let mut rng = SmallRng::seed_from_u64(11);

    for _ in 0..500 {
        let value = rng.gen_range(-0.5..1.5);
        let stored = if rng.gen_bool(0.5) {
            navigator.set_min_speed(value)
        } else {
            navigator.set_max_speed(value)
        };

        let limits = navigator.speed_limits();
        assert!(limits.min() <= limits.max());
        assert!(limits.min() >= 0.0 && limits.max() <= 1.0);
        assert!(stored == limits.min() || stored == limits.max());
    }
}
