//! Waypath Headless Movement Harness
//!
//! Drives bots through the movement core over a synthetic host: flat
//! ground, a kinematic character body and a straight-line nav service.
//! No engine, no rendering.
//!
//! Usage:
//!   cargo run -p waypath-simtest
//!   cargo run -p waypath-simtest -- --verbose
//!   cargo run -p waypath-simtest -- --seed 7

use log::{Level, LevelFilter, Metadata, Record};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use waypath_logic::config::{FollowerConfig, MovementConfig};
use waypath_logic::follower::PathFollower;
use waypath_logic::mover::{CharacterController, NavMeshQuery, NavPath};
use waypath_logic::registry::EntityRegistry;
use waypath_logic::session::BotSession;
use waypath_logic::smoothing;
use waypath_logic::sprint::{self, Urgency};
use waypath_logic::state::PathStatus;
use waypath_logic::vector::{self, Vec3};

// ── Movement tuning (same JSON a host would ship) ───────────────────────
const CONFIG_JSON: &str = include_str!("../../../data/movement_config.json");

const TICK_DT: f32 = 1.0 / 30.0;
const WALK_SPEED: f32 = 3.5;
const SPRINT_SPEED: f32 = 6.0;

// ── Console logger ──────────────────────────────────────────────────────

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let tag = match record.level() {
                Level::Error => "ERROR",
                Level::Warn => "WARN",
                Level::Info => "INFO",
                Level::Debug => "DEBUG",
                Level::Trace => "TRACE",
            };
            println!("    [{}] {}", tag, record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn init_logger(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    }
}

// ── Synthetic host ──────────────────────────────────────────────────────

/// Open flat ground: every path is a straight line.
struct FlatGround;

impl NavMeshQuery for FlatGround {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath {
        NavPath::complete(vec![from, to])
    }

    fn raycast_clear(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

/// Flat ground cut by an impassable wall at `x = wall_x`.
struct WalledGround {
    wall_x: f32,
}

impl NavMeshQuery for WalledGround {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath {
        if to.x <= self.wall_x {
            return NavPath::complete(vec![from, to]);
        }
        let stop = Vec3::new(self.wall_x, to.y, to.z);
        NavPath::partial(vec![from, stop])
    }

    fn raycast_clear(&self, from: Vec3, to: Vec3) -> bool {
        from.x <= self.wall_x && to.x <= self.wall_x
    }
}

/// Two rooms joined by a doorway at `door`. Paths between rooms go
/// through the doorway; the raycast is blocked across the dividing wall.
struct TwoRooms {
    door: Vec3,
}

impl TwoRooms {
    fn side(&self, p: Vec3) -> bool {
        p.x < self.door.x
    }
}

impl NavMeshQuery for TwoRooms {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath {
        if self.side(from) == self.side(to) {
            NavPath::complete(vec![from, to])
        } else {
            NavPath::complete(vec![from, self.door, to])
        }
    }

    fn raycast_clear(&self, from: Vec3, to: Vec3) -> bool {
        self.side(from) == self.side(to)
    }
}

/// Nowhere to walk.
struct NoMesh;

impl NavMeshQuery for NoMesh {
    fn calculate_path(&self, _from: Vec3, _to: Vec3) -> NavPath {
        NavPath::invalid()
    }

    fn raycast_clear(&self, _from: Vec3, _to: Vec3) -> bool {
        false
    }
}

/// Kinematic body moving at a fixed speed per tick.
struct KinematicBody {
    position: Vec3,
    pose: f32,
    distance_walked: f32,
    stopped: bool,
}

impl KinematicBody {
    fn at(position: Vec3) -> Self {
        Self {
            position,
            pose: 1.0,
            distance_walked: 0.0,
            stopped: true,
        }
    }
}

impl CharacterController for KinematicBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn move_toward(&mut self, direction: Vec3, sprint: bool) {
        let speed = if sprint { SPRINT_SPEED } else { WALK_SPEED };
        let step = vector::scale(direction, speed * TICK_DT);
        self.position = vector::add(self.position, step);
        self.distance_walked += vector::horizontal_length(step);
        self.stopped = false;
    }

    fn set_pose(&mut self, pose: f32) {
        self.pose = pose;
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let seed = args
        .iter()
        .position(|a| a == "--seed")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);

    init_logger(verbose);
    println!("=== Waypath Movement Harness (seed {}) ===\n", seed);

    let mut results = Vec::new();

    // 1. Config file
    let config = match MovementConfig::from_json_str(CONFIG_JSON) {
        Ok(config) => {
            results.push(TestResult {
                name: "config_loads".into(),
                passed: true,
                detail: format!(
                    "walk {:.2} / sprint {:.2} / destination {:.2}",
                    config.follower.walk_epsilon,
                    config.follower.sprint_epsilon,
                    config.follower.destination_epsilon
                ),
            });
            config
        }
        Err(e) => {
            results.push(TestResult {
                name: "config_loads".into(),
                passed: false,
                detail: e.to_string(),
            });
            MovementConfig::default()
        }
    };

    // 2. Registry churn
    results.extend(validate_registry(seed, verbose));

    // 3. Follower state machine
    results.extend(validate_follower(&config, verbose));

    // 4. Smoothing and sprint gating
    results.extend(validate_geometry(&config, verbose));

    // 5. Full session on synthetic hosts
    results.extend(validate_session(&config, seed, verbose));

    // 6. Failure modes
    results.extend(validate_failures(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 2. Registry ─────────────────────────────────────────────────────────

fn validate_registry(seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Registry ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut registry = EntityRegistry::new();
    let mut live: Vec<usize> = Vec::new();
    let mut violations = 0;
    let mut max_live = 0;

    for _ in 0..5_000 {
        if live.is_empty() || rng.gen_bool(0.55) {
            let engine_id = rng.gen_range(0..10_000);
            live.push(registry.add_with_engine_id(engine_id));
        } else {
            let victim = live.swap_remove(rng.gen_range(0..live.len()));
            if !registry.remove(victim) {
                violations += 1;
            }
        }
        max_live = max_live.max(live.len());

        if registry.len() != live.len() {
            violations += 1;
        }
    }
    for &id in &live {
        if registry.try_get(id).map(|e| e.id) != Some(id) {
            violations += 1;
        }
    }
    if verbose {
        println!("  {} live bots after churn, peak {}", live.len(), max_live);
    }

    results.push(TestResult {
        name: "registry_churn_consistent".into(),
        passed: violations == 0,
        detail: format!("5000 random ops, {} violations", violations),
    });

    // Highest live ID never exceeds the peak population
    let highest = live.iter().copied().max().unwrap_or(0);
    results.push(TestResult {
        name: "registry_ids_recycled".into(),
        passed: highest < max_live.max(1),
        detail: format!("highest id {} with peak population {}", highest, max_live),
    });

    // Emptying resets ID allocation
    for id in live.drain(..) {
        registry.remove(id);
    }
    let fresh = registry.add();
    results.push(TestResult {
        name: "registry_reset_when_empty".into(),
        passed: fresh == 0,
        detail: format!("first id after emptying = {}", fresh),
    });

    results
}

// ── 3. Follower ─────────────────────────────────────────────────────────

fn validate_follower(config: &MovementConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Follower ---");
    let mut results = Vec::new();

    let mut follower = PathFollower::new(config.follower.clone());
    let target = Vec3::new(10.0, 0.0, 0.0);
    follower.set_path(Some(vec![Vec3::ZERO, target]), target);
    let status = follower.tick(Vec3::new(9.9, 0.0, 0.0), false);
    results.push(TestResult {
        name: "follower_reached_near_end".into(),
        passed: status == PathStatus::Reached,
        detail: format!("tick at (9.9, 0, 0) → {:?}", status),
    });

    let mut follower = PathFollower::new(config.follower.clone());
    let status = follower.set_path(None, target);
    results.push(TestResult {
        name: "follower_null_path".into(),
        passed: status == PathStatus::Failed && follower.corners().is_none(),
        detail: format!("set_path(None) → {:?}", status),
    });

    // Partial path recomputed every tick until retries run out
    let mut follower = PathFollower::new(config.follower.clone());
    let far = Vec3::new(40.0, 0.0, 0.0);
    let partial = vec![Vec3::ZERO, Vec3::new(8.0, 0.0, 0.0)];
    follower.set_path(Some(partial.clone()), far);
    let mut ticks = 0;
    while follower.status() == PathStatus::Following && ticks < 100 {
        follower.set_path(Some(partial.clone()), far);
        follower.tick(Vec3::new(8.0, 0.0, 0.0), false);
        ticks += 1;
    }
    results.push(TestResult {
        name: "follower_retry_exhaustion".into(),
        passed: follower.status() == PathStatus::Failed
            && ticks == config.follower.max_retries as usize,
        detail: format!("failed after {} ticks (max_retries {})", ticks, config.follower.max_retries),
    });

    // Sprint epsilon is looser than walk epsilon
    let mut follower = PathFollower::new(config.follower.clone());
    let corner = Vec3::new(5.0, 0.0, 0.0);
    follower.set_path(Some(vec![corner, Vec3::new(20.0, 0.0, 0.0)]), Vec3::new(20.0, 0.0, 0.0));
    let between = (config.follower.walk_epsilon + config.follower.sprint_epsilon) / 2.0;
    let pos = Vec3::new(5.0 + between, 0.0, 0.0);
    let walk = follower.has_reached_corner(pos, false);
    let run = follower.has_reached_corner(pos, true);
    results.push(TestResult {
        name: "follower_sprint_epsilon".into(),
        passed: !walk && run,
        detail: format!("{:.2} from corner: walk {} / sprint {}", between, walk, run),
    });

    // Drift correction pulls back toward the path
    let mut follower = PathFollower::new(FollowerConfig::default());
    let end = Vec3::new(20.0, 0.0, 0.0);
    follower.set_path(Some(vec![Vec3::ZERO, end]), end);
    follower.tick(Vec3::ZERO, false);
    let drifted = Vec3::new(10.0, 0.0, 2.0);
    let raw = vector::normalize(vector::sub(end, drifted));
    let dir = follower.compute_move_direction(drifted);
    results.push(TestResult {
        name: "follower_drift_correction".into(),
        passed: dir.z < raw.z && (vector::length(dir) - 1.0).abs() < 1e-4,
        detail: format!("heading z {:.3} vs raw {:.3}", dir.z, raw.z),
    });

    results
}

// ── 4. Geometry ─────────────────────────────────────────────────────────

fn validate_geometry(config: &MovementConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Smoothing & Sprint ---");
    let mut results = Vec::new();

    let raw = vec![
        Vec3::ZERO,
        Vec3::new(12.0, 0.0, 0.0),
        Vec3::new(12.0, 0.0, 12.0),
        Vec3::new(24.0, 0.0, 12.0),
    ];
    let smoothed = smoothing::smooth(&raw, &config.smoothing);
    if verbose {
        println!("  {} raw corners → {} smoothed", raw.len(), smoothed.len());
    }
    results.push(TestResult {
        name: "smoothing_endpoints".into(),
        passed: smoothed.first() == raw.first() && smoothed.last() == raw.last(),
        detail: format!("{} points after smoothing", smoothed.len()),
    });

    let raw_angle = sprint::compute_angle_jitter(&raw, 0, 100.0);
    let smooth_angle = sprint::compute_angle_jitter(&smoothed, 0, 100.0);
    results.push(TestResult {
        name: "smoothing_softens_turns".into(),
        passed: smooth_angle < raw_angle,
        detail: format!("sharpest turn {:.1}° → {:.1}°", raw_angle, smooth_angle),
    });

    let t = &config.sprint.thresholds;
    let tiers = [
        (Urgency::Low, sprint::can_sprint(30.0, Urgency::Low, t)),
        (Urgency::Medium, sprint::can_sprint(30.0, Urgency::Medium, t)),
        (Urgency::High, sprint::can_sprint(30.0, Urgency::High, t)),
    ];
    results.push(TestResult {
        name: "sprint_urgency_tiers".into(),
        passed: !tiers[0].1 && tiers[1].1 && tiers[2].1,
        detail: format!("30° turn: {:?}", tiers),
    });

    results
}

// ── 5. Session ──────────────────────────────────────────────────────────

fn validate_session(config: &MovementConfig, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Session ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = BotSession::new(config.clone());
    let nav = FlatGround;

    let mut bots = Vec::new();
    for i in 0..24 {
        let id = session.spawn_bot(Some(1_000 + i), Some(format!("bot-{}", i)));
        let start = Vec3::new(rng.gen_range(-50.0..50.0), 0.0, rng.gen_range(-50.0..50.0));
        let target = Vec3::new(rng.gen_range(-50.0..50.0), 0.0, rng.gen_range(-50.0..50.0));
        let urgency = match i % 3 {
            0 => Urgency::Low,
            1 => Urgency::Medium,
            _ => Urgency::High,
        };
        let body = KinematicBody::at(start);
        session.command_move(id, target, urgency, &body, &nav);
        bots.push((id, body, start, target));
    }

    let mut ticks = 0;
    while ticks < 3_000 {
        session.advance_time(TICK_DT);
        let mut any_moving = false;
        for (id, body, _, _) in bots.iter_mut() {
            if let Some(cmd) = session.update_bot(*id, body, &nav) {
                any_moving |= cmd.status == PathStatus::Following;
            }
        }
        ticks += 1;
        if !any_moving {
            break;
        }
    }

    let reached = bots
        .iter()
        .filter(|(id, _, _, _)| session.registry()[*id].movement.status == PathStatus::Reached)
        .count();
    results.push(TestResult {
        name: "session_all_reach".into(),
        passed: reached == bots.len(),
        detail: format!("{}/{} bots reached in {} ticks", reached, bots.len(), ticks),
    });

    let eps = config.follower.destination_epsilon;
    let misses = bots
        .iter()
        .filter(|(_, body, _, target)| vector::horizontal_distance(body.position, *target) > eps)
        .count();
    results.push(TestResult {
        name: "session_arrival_precision".into(),
        passed: misses == 0,
        detail: format!("{} bots outside {:.2} of target", misses, eps),
    });

    // Straight-line travel should cost little more than the direct distance
    let worst_ratio = bots
        .iter()
        .map(|(_, body, start, target)| {
            let direct = vector::horizontal_distance(*start, *target);
            body.distance_walked / direct.max(1e-3)
        })
        .fold(0.0_f32, f32::max);
    if verbose {
        println!("  worst walked/direct ratio {:.3}", worst_ratio);
    }
    results.push(TestResult {
        name: "session_no_wandering".into(),
        passed: worst_ratio <= 1.05,
        detail: format!("worst walked/direct ratio {:.3}", worst_ratio),
    });

    let stopped = bots.iter().all(|(_, body, _, _)| body.stopped);
    results.push(TestResult {
        name: "session_bodies_stopped".into(),
        passed: stopped,
        detail: "controllers stopped on arrival".into(),
    });

    // Doorway detour
    let rooms = TwoRooms {
        door: Vec3::new(0.0, 0.0, 5.0),
    };
    let id = session.spawn_bot(None, Some("door-runner".into()));
    let mut body = KinematicBody::at(Vec3::new(-10.0, 0.0, -5.0));
    let target = Vec3::new(10.0, 0.0, -5.0);
    session.command_move(id, target, Urgency::Medium, &body, &rooms);
    let mut passed_door = false;
    let mut status = PathStatus::Following;
    for _ in 0..2_000 {
        session.advance_time(TICK_DT);
        if let Some(cmd) = session.update_bot(id, &mut body, &rooms) {
            status = cmd.status;
        }
        passed_door |= vector::horizontal_distance(body.position, rooms.door) < 1.5;
        if status.is_terminal() {
            break;
        }
    }
    results.push(TestResult {
        name: "session_doorway_detour".into(),
        passed: status == PathStatus::Reached && passed_door,
        detail: format!("{:?}, passed through doorway: {}", status, passed_door),
    });

    results.push(TestResult {
        name: "session_pose_applied".into(),
        passed: (body.pose - config.default_pose).abs() < f32::EPSILON,
        detail: format!("pose {:.2}", body.pose),
    });

    session.end();
    results.push(TestResult {
        name: "session_end_clears".into(),
        passed: session.registry().is_empty() && session.sim_time() == 0.0,
        detail: "registry empty after end()".into(),
    });

    results
}

// ── 6. Failure modes ────────────────────────────────────────────────────

fn validate_failures(config: &MovementConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Failure Modes ---");
    let mut results = Vec::new();
    let mut session = BotSession::new(config.clone());

    let id = session.spawn_bot(None, None);
    let body = KinematicBody::at(Vec3::ZERO);
    let status = session.command_move(id, Vec3::new(5.0, 0.0, 5.0), Urgency::High, &body, &NoMesh);
    results.push(TestResult {
        name: "failure_no_mesh".into(),
        passed: status == Some(PathStatus::Failed),
        detail: format!("command_move → {:?}", status),
    });

    let wall = WalledGround { wall_x: 6.0 };
    let id = session.spawn_bot(None, None);
    let mut body = KinematicBody::at(Vec3::ZERO);
    session.command_move(id, Vec3::new(20.0, 0.0, 0.0), Urgency::Low, &body, &wall);
    let mut status = PathStatus::Following;
    let mut ticks = 0;
    while !status.is_terminal() && ticks < 2_000 {
        session.advance_time(TICK_DT);
        if let Some(cmd) = session.update_bot(id, &mut body, &wall) {
            status = cmd.status;
        }
        ticks += 1;
    }
    let retries = session.registry()[id].movement.retry_count;
    results.push(TestResult {
        name: "failure_wall_retries".into(),
        passed: status == PathStatus::Failed && retries == config.follower.max_retries,
        detail: format!("{:?} after {} ticks, {} retries", status, ticks, retries),
    });
    results.push(TestResult {
        name: "failure_wall_not_crossed".into(),
        passed: body.position.x <= wall.wall_x + 1e-3,
        detail: format!("stopped at x = {:.2}", body.position.x),
    });

    let stopped = session.stop_bot(id, &mut body);
    let record = &session.registry()[id];
    results.push(TestResult {
        name: "failure_stop_resets".into(),
        passed: stopped && record.movement.status == PathStatus::Idle && record.movement.retry_count == 0,
        detail: format!("after stop: {:?}", record.movement.status),
    });

    results
}
