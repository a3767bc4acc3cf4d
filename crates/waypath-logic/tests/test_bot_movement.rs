//! Integration tests for the movement pipeline.
//!
//! Exercises: EntityRegistry → BotSession → BotMover → PathFollower
//! with smoothing, drift correction, sprint gating and retries.
//!
//! Hosts are in-memory fakes; no engine.

use waypath_logic::config::{FollowerConfig, MovementConfig};
use waypath_logic::follower::PathFollower;
use waypath_logic::mover::{CharacterController, NavMeshQuery, NavPath};
use waypath_logic::registry::EntityRegistry;
use waypath_logic::session::BotSession;
use waypath_logic::smoothing;
use waypath_logic::sprint::Urgency;
use waypath_logic::state::PathStatus;
use waypath_logic::vector::{self, Vec3};

// ── Helpers ────────────────────────────────────────────────────────────

fn p(x: f32, z: f32) -> Vec3 {
    Vec3::new(x, 0.0, z)
}

/// An L-shaped corridor: every path bends through `elbow`.
struct Corridor {
    elbow: Vec3,
}

impl NavMeshQuery for Corridor {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath {
        NavPath::complete(vec![from, self.elbow, to])
    }

    fn raycast_clear(&self, _from: Vec3, _to: Vec3) -> bool {
        false
    }
}

/// Open ground with a bump: y varies, which the follower must ignore.
struct Hills;

impl NavMeshQuery for Hills {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath {
        let mid = vector::lerp(from, to, 0.5);
        NavPath::complete(vec![from, Vec3::new(mid.x, 3.0, mid.z), to])
    }

    fn raycast_clear(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

/// Every path stops at `end`, however far the target lies beyond it.
struct Ledge {
    end: Vec3,
}

impl NavMeshQuery for Ledge {
    fn calculate_path(&self, from: Vec3, _to: Vec3) -> NavPath {
        NavPath::complete(vec![from, self.end])
    }

    fn raycast_clear(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

/// Kinematic body that follows the terrain height of its last corner.
struct Walker {
    position: Vec3,
    stops: usize,
}

impl Walker {
    fn at(position: Vec3) -> Self {
        Self { position, stops: 0 }
    }
}

impl CharacterController for Walker {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn move_toward(&mut self, direction: Vec3, sprint: bool) {
        let speed = if sprint { 0.4 } else { 0.25 };
        self.position = vector::add(self.position, vector::scale(direction, speed));
    }

    fn set_pose(&mut self, _pose: f32) {}

    fn stop(&mut self) {
        self.stops += 1;
    }
}

fn drive(
    session: &mut BotSession,
    id: usize,
    body: &mut Walker,
    nav: &dyn NavMeshQuery,
    max_ticks: usize,
) -> (PathStatus, usize) {
    for tick in 0..max_ticks {
        session.advance_time(1.0 / 30.0);
        let cmd = session
            .update_bot(id, &mut *body, nav)
            .expect("bot exists");
        if cmd.status.is_terminal() {
            return (cmd.status, tick);
        }
    }
    (session.registry()[id].movement.status, max_ticks)
}

// ── Follower scenarios ─────────────────────────────────────────────────

#[test]
fn test_reached_in_single_tick_near_end() {
    let mut follower = PathFollower::new(FollowerConfig::default());
    let target = Vec3::new(10.0, 0.0, 0.0);
    follower.set_path(Some(vec![Vec3::ZERO, target]), target);
    assert_eq!(follower.tick(Vec3::new(9.9, 0.0, 0.0), false), PathStatus::Reached);
}

#[test]
fn test_null_path_fails() {
    let mut follower = PathFollower::new(FollowerConfig::default());
    assert_eq!(follower.set_path(None, p(3.0, 3.0)), PathStatus::Failed);
    assert!(follower.corners().is_none());
    assert_eq!(follower.tick(p(3.0, 3.0), false), PathStatus::Failed);
}

#[test]
fn test_retry_exhaustion_with_recomputes() {
    let config = FollowerConfig {
        max_retries: 5,
        ..FollowerConfig::default()
    };
    let mut follower = PathFollower::new(config);
    let target = p(50.0, 0.0);
    let partial = vec![p(0.0, 0.0), p(10.0, 0.0)];
    follower.set_path(Some(partial.clone()), target);

    let mut statuses = Vec::new();
    for _ in 0..5 {
        follower.set_path(Some(partial.clone()), target);
        statuses.push(follower.tick(p(10.0, 0.0), false));
    }
    assert_eq!(
        statuses,
        vec![
            PathStatus::Following,
            PathStatus::Following,
            PathStatus::Following,
            PathStatus::Following,
            PathStatus::Failed,
        ]
    );
}

#[test]
fn test_smoothed_path_keeps_endpoints_for_follower() {
    let raw = [p(0.0, 0.0), p(12.0, 0.0), p(12.0, 12.0)];
    let smoothed = smoothing::smooth(&raw, &MovementConfig::default().smoothing);
    assert_eq!(smoothed.first(), raw.first());
    assert_eq!(smoothed.last(), raw.last());
    assert!(smoothed.len() > raw.len());

    let mut follower = PathFollower::new(FollowerConfig::default());
    let target = raw[2];
    assert_eq!(follower.set_path(Some(smoothed), target), PathStatus::Following);
}

// ── Mover through the session ──────────────────────────────────────────

#[test]
fn test_walks_around_corridor_elbow() {
    let mut session = BotSession::new(MovementConfig::default());
    let id = session.spawn_bot(Some(100), Some("scav-7".into()));
    let nav = Corridor { elbow: p(15.0, 0.0) };
    let mut body = Walker::at(p(0.0, 0.0));
    let target = p(15.0, 15.0);

    let status = session.command_move(id, target, Urgency::Medium, &body, &nav);
    assert_eq!(status, Some(PathStatus::Following));

    let (status, _) = drive(&mut session, id, &mut body, &nav, 2_000);
    assert_eq!(status, PathStatus::Reached);
    assert!(vector::horizontal_distance(body.position, target) <= 1.5);
    assert!(body.stops >= 1);

    // The bot should never stray far from the corridor
    assert!(body.position.x > 13.0);
}

#[test]
fn test_height_changes_do_not_block_arrival() {
    let mut session = BotSession::new(MovementConfig::default());
    let id = session.spawn_bot(None, None);
    let mut body = Walker::at(p(0.0, 0.0));
    let target = Vec3::new(10.0, 0.0, 10.0);

    session.command_move(id, target, Urgency::Low, &body, &Hills);
    let (status, _) = drive(&mut session, id, &mut body, &Hills, 1_000);
    assert_eq!(status, PathStatus::Reached);
}

#[test]
fn test_projection_tracks_progress() {
    let mut session = BotSession::new(MovementConfig::default());
    let id = session.spawn_bot(None, None);
    let nav = Corridor { elbow: p(20.0, 0.0) };
    let mut body = Walker::at(p(0.0, 0.0));
    session.command_move(id, p(20.0, 20.0), Urgency::Low, &body, &nav);

    let mut last_index = 0;
    for _ in 0..40 {
        session.advance_time(0.1);
        session.update_bot(id, &mut body, &nav);
        let movement = &session.registry()[id].movement;
        assert!(movement.current_corner_index >= last_index, "corner index never goes back");
        assert!(movement.current_corner_index < movement.total_corners);
        last_index = movement.current_corner_index;
    }
    assert!(last_index > 0);
}

#[test]
fn test_many_bots_share_one_session() {
    let mut session = BotSession::new(MovementConfig::default());
    let nav = Hills;
    let mut bodies = Vec::new();
    for i in 0..8 {
        let id = session.spawn_bot(Some(i), None);
        let body = Walker::at(p(i as f32 * 3.0, 0.0));
        let target = p(i as f32 * 3.0, 12.0);
        session.command_move(id, target, Urgency::High, &body, &nav);
        bodies.push((id, body));
    }

    for _ in 0..300 {
        session.advance_time(1.0 / 30.0);
        for (id, body) in bodies.iter_mut() {
            session.update_bot(*id, body, &nav);
        }
    }

    for bot in session.registry().iter() {
        assert_eq!(bot.movement.status, PathStatus::Reached, "bot {}", bot.id);
    }
}

#[test]
fn test_short_end_inside_tolerance_fails_instead_of_stalling() {
    let config = MovementConfig {
        follower: FollowerConfig {
            partial_path_tolerance: 3.0,
            ..FollowerConfig::default()
        },
        ..MovementConfig::default()
    };
    let max_retries = config.follower.max_retries;
    let mut session = BotSession::new(config);
    let id = session.spawn_bot(None, None);
    let nav = Ledge { end: p(10.0, 0.0) };
    let mut body = Walker::at(p(0.0, 0.0));

    session.command_move(id, p(12.5, 0.0), Urgency::Low, &body, &nav);
    let (status, ticks) = drive(&mut session, id, &mut body, &nav, 1_000);
    assert_eq!(status, PathStatus::Failed);
    assert!(ticks < 1_000);
    assert!(vector::horizontal_distance(body.position, nav.end) <= 0.6);

    let movement = &session.registry()[id].movement;
    assert_eq!(movement.retry_count, max_retries);
    // Recomputes at the ledge restamp the path time
    assert!(movement.last_path_update_time > 0.0);
}

// ── Registry churn ─────────────────────────────────────────────────────

#[test]
fn test_despawn_recycles_lowest_id() {
    let mut session = BotSession::new(MovementConfig::default());
    let ids: Vec<_> = (0..5).map(|_| session.spawn_bot(None, None)).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    session.despawn_bot(3);
    session.despawn_bot(1);
    assert_eq!(session.spawn_bot(None, None), 1);
    assert_eq!(session.spawn_bot(None, None), 3);
    assert_eq!(session.spawn_bot(None, None), 5);
}

#[test]
fn test_registry_dense_after_churn() {
    let mut registry = EntityRegistry::new();
    let mut live = Vec::new();
    for round in 0..10 {
        for _ in 0..6 {
            live.push(registry.add());
        }
        // Drop every other bot
        let drop: Vec<_> = live.iter().copied().step_by(2).collect();
        for id in drop {
            assert!(registry.remove(id), "round {round}");
            live.retain(|&x| x != id);
        }
        assert_eq!(registry.len(), live.len());
        for &id in &live {
            assert_eq!(registry[id].id, id);
        }
    }
}
