//! Host boundary and the per-agent mover.
//!
//! The host engine supplies two services: path queries over its navigation
//! mesh ([`NavMeshQuery`]) and a character it can steer
//! ([`CharacterController`]). [`BotMover`] glues them to a
//! [`PathFollower`] and fixes the per-tick order:
//!
//! 1. read position from the controller
//! 2. `tick` the follower
//! 3. recompute the path if the follower asked for it
//! 4. try a corner cut (raycast only when close to a corner)
//! 5. compute the move direction
//! 6. gate sprinting on upcoming curvature
//! 7. drive the controller
//! 8. sync the [`MovementState`] projection

use crate::config::{MovementConfig, SmoothingConfig};
use crate::follower::PathFollower;
use crate::smoothing;
use crate::sprint::Urgency;
use crate::state::{MovementState, PathStatus};
use crate::vector::Vec3;

/// Outcome of a nav-mesh path query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPathStatus {
    /// The corners end at the requested target.
    Complete,
    /// The corners end somewhere short of the target.
    Partial,
    /// No path could be built.
    Invalid,
}

/// Raw corners from the navigation mesh, unsmoothed.
#[derive(Debug, Clone, PartialEq)]
pub struct NavPath {
    pub corners: Vec<Vec3>,
    pub status: NavPathStatus,
}

impl NavPath {
    pub fn complete(corners: Vec<Vec3>) -> Self {
        Self {
            corners,
            status: NavPathStatus::Complete,
        }
    }

    pub fn partial(corners: Vec<Vec3>) -> Self {
        Self {
            corners,
            status: NavPathStatus::Partial,
        }
    }

    pub fn invalid() -> Self {
        Self {
            corners: Vec::new(),
            status: NavPathStatus::Invalid,
        }
    }
}

/// Path queries against the host's navigation mesh.
pub trait NavMeshQuery {
    fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath;

    /// True if nothing on the nav mesh blocks the straight line `from..to`.
    fn raycast_clear(&self, from: Vec3, to: Vec3) -> bool;
}

/// A steerable character in the host engine.
pub trait CharacterController {
    fn position(&self) -> Vec3;

    /// Move along `direction` (horizontal unit vector, or zero) this tick.
    fn move_toward(&mut self, direction: Vec3, sprint: bool);

    /// 0.0 = crouched, 1.0 = standing.
    fn set_pose(&mut self, pose: f32);

    fn stop(&mut self);
}

/// What the mover asked the controller to do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCommand {
    pub direction: Vec3,
    pub sprint: bool,
    pub status: PathStatus,
}

impl MoveCommand {
    fn halt(status: PathStatus) -> Self {
        Self {
            direction: Vec3::ZERO,
            sprint: false,
            status,
        }
    }
}

/// Drives one bot toward a target through the host services.
#[derive(Debug, Clone)]
pub struct BotMover {
    follower: PathFollower,
    smoothing: SmoothingConfig,
    default_pose: f32,
    urgency: Urgency,
    wants_sprint: bool,
    is_sprinting: bool,
    active: bool,
    pose_applied: bool,
}

impl BotMover {
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            follower: PathFollower::new(config.follower.clone())
                .with_sprint_config(config.sprint.clone()),
            smoothing: config.smoothing.clone(),
            default_pose: config.default_pose,
            urgency: Urgency::default(),
            wants_sprint: true,
            is_sprinting: false,
            active: false,
            pose_applied: false,
        }
    }

    /// Plan a path from `position` to `target` and start following it.
    ///
    /// Returns `Failed` right away if the nav mesh has no path.
    pub fn go_to(
        &mut self,
        target: Vec3,
        urgency: Urgency,
        nav: &dyn NavMeshQuery,
        position: Vec3,
    ) -> PathStatus {
        self.urgency = urgency;
        let corners = self.plan(nav, position, target);
        let status = self.follower.set_path(corners, target);
        self.active = status == PathStatus::Following;
        status
    }

    /// Run one tick. See the module docs for the order of operations.
    pub fn update(
        &mut self,
        ctrl: &mut dyn CharacterController,
        nav: &dyn NavMeshQuery,
        state: &mut MovementState,
        sim_time: f32,
    ) -> MoveCommand {
        if !self.active {
            self.follower.sync_state(state, sim_time);
            return MoveCommand::halt(self.follower.status());
        }

        if !self.pose_applied {
            ctrl.set_pose(self.default_pose);
            state.current_pose = self.default_pose;
            self.pose_applied = true;
        }

        let position = ctrl.position();
        let mut status = self.follower.tick(position, self.is_sprinting);

        if self.follower.needs_repath() {
            let target = self.follower.target();
            let corners = self.plan(nav, position, target);
            status = self.follower.set_path(corners, target);
        }

        if status != PathStatus::Following {
            return self.finish(ctrl, state, sim_time, status);
        }

        if let Some(next) = self.follower.corner_cut_candidate(position) {
            let clear = nav.raycast_clear(position, next);
            self.follower.try_corner_cut(position, clear);
        }

        let direction = self.follower.compute_move_direction(position);
        let sprint = self.wants_sprint && self.follower.can_sprint(self.urgency);
        if sprint != self.is_sprinting {
            log::trace!("mover: sprint {}", if sprint { "on" } else { "off" });
        }
        self.is_sprinting = sprint;

        ctrl.move_toward(direction, sprint);
        state.is_sprinting = sprint;
        self.follower.sync_state(state, sim_time);

        MoveCommand {
            direction,
            sprint,
            status,
        }
    }

    /// Stop the bot and return to `Idle`.
    pub fn deactivate(&mut self, ctrl: &mut dyn CharacterController, state: &mut MovementState) {
        self.follower.reset_path();
        self.active = false;
        self.is_sprinting = false;
        self.pose_applied = false;
        ctrl.stop();
        state.reset();
    }

    /// Whether the host's sprint input is held. Sprinting still needs a
    /// straight enough path ahead.
    pub fn set_sprint_intent(&mut self, wants_sprint: bool) {
        self.wants_sprint = wants_sprint;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_sprinting(&self) -> bool {
        self.is_sprinting
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn follower(&self) -> &PathFollower {
        &self.follower
    }

    /// Publish the follower's projection outside of [`update`](Self::update).
    pub fn sync_state(&mut self, state: &mut MovementState, sim_time: f32) {
        self.follower.sync_state(state, sim_time);
    }

    pub fn status(&self) -> PathStatus {
        self.follower.status()
    }

    fn plan(&self, nav: &dyn NavMeshQuery, from: Vec3, to: Vec3) -> Option<Vec<Vec3>> {
        let path = nav.calculate_path(from, to);
        match path.status {
            NavPathStatus::Invalid => None,
            // Partial paths are still walked; the follower notices the short
            // end and asks for a recompute.
            NavPathStatus::Complete | NavPathStatus::Partial if path.corners.is_empty() => None,
            NavPathStatus::Complete | NavPathStatus::Partial => {
                Some(smoothing::smooth(&path.corners, &self.smoothing))
            }
        }
    }

    fn finish(
        &mut self,
        ctrl: &mut dyn CharacterController,
        state: &mut MovementState,
        sim_time: f32,
        status: PathStatus,
    ) -> MoveCommand {
        match status {
            PathStatus::Reached => log::debug!("mover: arrived"),
            PathStatus::Failed => log::warn!(
                "mover: giving up after {} retries",
                self.follower.retry_count()
            ),
            PathStatus::Idle | PathStatus::Following => {}
        }
        ctrl.stop();
        self.active = false;
        self.is_sprinting = false;
        state.is_sprinting = false;
        self.follower.sync_state(state, sim_time);
        MoveCommand::halt(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector;

    struct OpenGround;

    impl NavMeshQuery for OpenGround {
        fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath {
            NavPath::complete(vec![from, to])
        }
        fn raycast_clear(&self, _from: Vec3, _to: Vec3) -> bool {
            true
        }
    }

    /// Every path stops at `wall_x`.
    struct Wall {
        wall_x: f32,
    }

    impl NavMeshQuery for Wall {
        fn calculate_path(&self, from: Vec3, to: Vec3) -> NavPath {
            let end = Vec3::new(to.x.min(self.wall_x), to.y, to.z);
            NavPath::partial(vec![from, end])
        }
        fn raycast_clear(&self, _from: Vec3, _to: Vec3) -> bool {
            false
        }
    }

    struct NoMesh;

    impl NavMeshQuery for NoMesh {
        fn calculate_path(&self, _from: Vec3, _to: Vec3) -> NavPath {
            NavPath::invalid()
        }
        fn raycast_clear(&self, _from: Vec3, _to: Vec3) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct Body {
        position: Vec3,
        pose: f32,
        stopped: bool,
        moves: usize,
    }

    impl CharacterController for Body {
        fn position(&self) -> Vec3 {
            self.position
        }
        fn move_toward(&mut self, direction: Vec3, sprint: bool) {
            let step = if sprint { 0.35 } else { 0.2 };
            self.position = vector::add(self.position, vector::scale(direction, step));
            self.stopped = false;
            self.moves += 1;
        }
        fn set_pose(&mut self, pose: f32) {
            self.pose = pose;
        }
        fn stop(&mut self) {
            self.stopped = true;
        }
    }

    fn run(
        mover: &mut BotMover,
        body: &mut Body,
        nav: &dyn NavMeshQuery,
        state: &mut MovementState,
        max_ticks: usize,
    ) -> PathStatus {
        for tick in 0..max_ticks {
            let cmd = mover.update(&mut *body, nav, state, tick as f32 * 0.1);
            if cmd.status.is_terminal() {
                return cmd.status;
            }
        }
        mover.status()
    }

    #[test]
    fn walks_to_target_on_open_ground() {
        let config = MovementConfig::default();
        let mut mover = BotMover::new(&config);
        let mut body = Body::default();
        let mut state = MovementState::default();
        let target = Vec3::new(20.0, 0.0, 5.0);

        assert_eq!(
            mover.go_to(target, Urgency::Medium, &OpenGround, body.position),
            PathStatus::Following
        );
        assert_eq!(run(&mut mover, &mut body, &OpenGround, &mut state, 500), PathStatus::Reached);
        assert!(vector::horizontal_distance(body.position, target) <= config.follower.destination_epsilon);
        assert!(body.stopped);
        assert_eq!(state.status, PathStatus::Reached);
        assert!(!mover.is_active());
    }

    #[test]
    fn sprints_on_straight_path() {
        let mut mover = BotMover::new(&MovementConfig::default());
        let mut body = Body::default();
        let mut state = MovementState::default();
        mover.go_to(Vec3::new(30.0, 0.0, 0.0), Urgency::Low, &OpenGround, body.position);
        let cmd = mover.update(&mut body, &OpenGround, &mut state, 0.0);
        assert!(cmd.sprint);
        assert!(state.is_sprinting);
    }

    #[test]
    fn sprint_intent_off_walks() {
        let mut mover = BotMover::new(&MovementConfig::default());
        mover.set_sprint_intent(false);
        let mut body = Body::default();
        let mut state = MovementState::default();
        mover.go_to(Vec3::new(30.0, 0.0, 0.0), Urgency::High, &OpenGround, body.position);
        let cmd = mover.update(&mut body, &OpenGround, &mut state, 0.0);
        assert!(!cmd.sprint);
    }

    #[test]
    fn applies_default_pose_once_active() {
        let mut config = MovementConfig::default();
        config.default_pose = 0.5;
        let mut mover = BotMover::new(&config);
        let mut body = Body::default();
        let mut state = MovementState::default();
        mover.go_to(Vec3::new(5.0, 0.0, 0.0), Urgency::Low, &OpenGround, body.position);
        mover.update(&mut body, &OpenGround, &mut state, 0.0);
        assert!((body.pose - 0.5).abs() < f32::EPSILON);
        assert!((state.current_pose - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn no_mesh_fails_immediately() {
        let mut mover = BotMover::new(&MovementConfig::default());
        let mut body = Body::default();
        let mut state = MovementState::default();
        let status = mover.go_to(Vec3::new(5.0, 0.0, 0.0), Urgency::Low, &NoMesh, body.position);
        assert_eq!(status, PathStatus::Failed);
        assert!(mover.follower().corners().is_none());

        let cmd = mover.update(&mut body, &NoMesh, &mut state, 0.0);
        assert_eq!(cmd.status, PathStatus::Failed);
        assert_eq!(cmd.direction, Vec3::ZERO);
        assert_eq!(body.moves, 0);
    }

    #[test]
    fn wall_exhausts_retries() {
        let config = MovementConfig::default();
        let mut mover = BotMover::new(&config);
        let mut body = Body::default();
        let mut state = MovementState::default();
        let nav = Wall { wall_x: 5.0 };

        mover.go_to(Vec3::new(20.0, 0.0, 0.0), Urgency::Low, &nav, body.position);
        assert_eq!(run(&mut mover, &mut body, &nav, &mut state, 500), PathStatus::Failed);
        assert_eq!(state.retry_count, config.follower.max_retries);
        assert!(body.position.x <= 5.0 + 1e-3);
    }

    #[test]
    fn deactivate_resets_to_idle() {
        let mut mover = BotMover::new(&MovementConfig::default());
        let mut body = Body::default();
        let mut state = MovementState::default();
        mover.go_to(Vec3::new(30.0, 0.0, 0.0), Urgency::Low, &OpenGround, body.position);
        mover.update(&mut body, &OpenGround, &mut state, 0.0);
        assert_eq!(state.status, PathStatus::Following);

        mover.deactivate(&mut body, &mut state);
        assert!(body.stopped);
        assert_eq!(state.status, PathStatus::Idle);
        assert_eq!(mover.status(), PathStatus::Idle);
        assert!(!mover.is_active());
    }

    #[test]
    fn inactive_update_does_not_move() {
        let mut mover = BotMover::new(&MovementConfig::default());
        let mut body = Body::default();
        let mut state = MovementState::default();
        let cmd = mover.update(&mut body, &OpenGround, &mut state, 0.0);
        assert_eq!(cmd.status, PathStatus::Idle);
        assert_eq!(body.moves, 0);
    }
}
