//! Corner-by-corner path following.
//!
//! State machine:
//!
//! ```text
//!            set_path(corners)            corner reached, more left
//!   Idle ─────────────────────▶ Following ◀───────────────────┐
//!     ▲                           │  │  └─────────────────────┘
//!     │ reset_path()              │  │ last corner, target reached
//!     │ (from any state)          │  └──────────────────────────▶ Reached
//!     │                           │ last corner short of target,
//!     │                           │ retries exhausted
//!     │                           └─────────────────────────────▶ Failed
//!     │            set_path(None | empty) from any state ───────▶ Failed
//! ```
//!
//! The follower never queries the navigation mesh. When its polyline ends
//! short of the target it raises [`PathFollower::needs_repath`] and the
//! caller recomputes; each such tick counts as one retry. Standing on an end
//! corner that lies outside the arrival radius counts the same way. Retries are
//! counted in ticks, never wall-clock time, so a run replays identically.
//!
//! All distances are measured on the ground plane.

use crate::config::{FollowerConfig, SprintConfig};
use crate::deviation;
use crate::sprint::{self, Urgency};
use crate::state::{MovementState, PathStatus};
use crate::vector::{self, Vec3};

/// Path-following state for one bot.
#[derive(Debug, Clone)]
pub struct PathFollower {
    config: FollowerConfig,
    sprint: SprintConfig,
    /// Smoothed polyline. `None` when no path is held.
    corners: Option<Vec<Vec3>>,
    target: Vec3,
    current_corner: usize,
    status: PathStatus,
    retry_count: u32,
    repath_requested: bool,
    /// A polyline was installed or dropped since the last `sync_state`.
    path_changed: bool,
}

impl PathFollower {
    pub fn new(config: FollowerConfig) -> Self {
        Self {
            config,
            sprint: SprintConfig::default(),
            corners: None,
            target: Vec3::ZERO,
            current_corner: 0,
            status: PathStatus::Idle,
            retry_count: 0,
            repath_requested: false,
            path_changed: false,
        }
    }

    /// Use `sprint` instead of the default sprint gating.
    pub fn with_sprint_config(mut self, sprint: SprintConfig) -> Self {
        self.sprint = sprint;
        self
    }

    /// Install a (pre-smoothed) polyline toward `target`.
    ///
    /// `None` or an empty list fails immediately. Otherwise following starts
    /// at corner 0. The retry counter carries over only when a path toward
    /// the same `target` is still being followed (a recompute of the same
    /// request). After `Reached` or `Failed` it starts from zero.
    pub fn set_path(&mut self, corners: Option<Vec<Vec3>>, target: Vec3) -> PathStatus {
        let eps = self.config.destination_epsilon;
        let same_target = self.status == PathStatus::Following
            && vector::horizontal_distance_squared(target, self.target) <= eps * eps;
        if !same_target {
            self.retry_count = 0;
        }

        self.target = target;
        self.current_corner = 0;
        self.repath_requested = false;
        self.path_changed = true;

        match corners {
            Some(corners) if !corners.is_empty() => {
                log::debug!(
                    "follower: path set, {} corners toward ({:.1}, {:.1}, {:.1}), retry {}",
                    corners.len(),
                    target.x,
                    target.y,
                    target.z,
                    self.retry_count
                );
                self.corners = Some(corners);
                self.status = PathStatus::Following;
            }
            _ => {
                log::warn!(
                    "follower: no path toward ({:.1}, {:.1}, {:.1})",
                    target.x,
                    target.y,
                    target.z
                );
                self.corners = None;
                self.status = PathStatus::Failed;
            }
        }
        self.status
    }

    /// Drop the path and return to `Idle`, clearing the retry count.
    pub fn reset_path(&mut self) {
        self.corners = None;
        self.current_corner = 0;
        self.status = PathStatus::Idle;
        self.retry_count = 0;
        self.repath_requested = false;
        self.path_changed = true;
    }

    /// Advance the state machine for this tick.
    ///
    /// Must run before [`compute_move_direction`](Self::compute_move_direction)
    /// in the same tick.
    pub fn tick(&mut self, position: Vec3, is_sprinting: bool) -> PathStatus {
        if self.status != PathStatus::Following {
            return self.status;
        }
        let Some(last) = self.total_corners().checked_sub(1) else {
            return self.status;
        };

        let eps = self.corner_epsilon(is_sprinting);
        while self.current_corner < last {
            // A bot already standing on the next corner skips the current one
            // (typically the stale start corner of a fresh path).
            let reached = self.within_corner(self.current_corner, position, eps)
                || self.within_corner(self.current_corner + 1, position, eps);
            if !reached {
                return self.status;
            }
            self.current_corner += 1;
            log::trace!("follower: advanced to corner {}/{}", self.current_corner, last);
        }

        if !self.path_reaches_target() {
            return self.count_retry();
        }

        if self.has_reached_destination(position) {
            log::debug!("follower: destination reached");
            self.status = PathStatus::Reached;
            return self.status;
        }

        // The end counted as reachable but lies outside the arrival radius:
        // standing on it will never arrive, so treat it as a partial path.
        if !self.end_within_arrival() && self.within_corner(last, position, eps) {
            log::debug!("follower: at path end but outside arrival radius");
            return self.count_retry();
        }
        self.status
    }

    fn count_retry(&mut self) -> PathStatus {
        self.retry_count += 1;
        if self.retry_count >= self.config.max_retries {
            log::warn!(
                "follower: path ends short of target after {} retries, giving up",
                self.retry_count
            );
            self.status = PathStatus::Failed;
            self.repath_requested = false;
        } else {
            log::debug!(
                "follower: partial path, requesting recompute (retry {}/{})",
                self.retry_count,
                self.config.max_retries
            );
            self.repath_requested = true;
        }
        self.status
    }

    /// True if `position` is within the walk (or sprint) epsilon of the
    /// current corner. False when there is no current corner.
    pub fn has_reached_corner(&self, position: Vec3, is_sprinting: bool) -> bool {
        self.within_corner(self.current_corner, position, self.corner_epsilon(is_sprinting))
    }

    /// True if `position` is within the destination epsilon of the target.
    pub fn has_reached_destination(&self, position: Vec3) -> bool {
        let eps = self.config.destination_epsilon;
        vector::horizontal_distance_squared(position, self.target) <= eps * eps
    }

    /// Unit heading for this tick: toward the current corner, pulled back
    /// toward the segment being walked. Zero when not following.
    pub fn compute_move_direction(&self, position: Vec3) -> Vec3 {
        if self.status != PathStatus::Following {
            return Vec3::ZERO;
        }
        let (Some(corners), Some(corner)) = (self.corners.as_deref(), self.current_corner()) else {
            return Vec3::ZERO;
        };

        let heading = vector::normalize(vector::flatten(vector::sub(corner, position)));
        let segment_start = if self.current_corner == 0 {
            position
        } else {
            corners[self.current_corner - 1]
        };
        let drift = deviation::clamp_magnitude(
            deviation::compute_deviation(position, segment_start, corner),
            self.config.max_deviation,
        );
        deviation::blend_with_deviation(heading, drift, self.config.deviation_strength)
    }

    /// Skip the current corner early when close to it and the caller's
    /// nav-mesh raycast toward the next corner is clear.
    pub fn try_corner_cut(&mut self, position: Vec3, line_of_sight_clear: bool) -> bool {
        if !line_of_sight_clear || self.corner_cut_candidate(position).is_none() {
            return false;
        }
        self.current_corner += 1;
        log::trace!("follower: cut to corner {}", self.current_corner);
        true
    }

    /// The corner a line-of-sight check should target, if `position` is
    /// close enough to the current corner for a cut. Lets callers skip the
    /// raycast on most ticks.
    pub fn corner_cut_candidate(&self, position: Vec3) -> Option<Vec3> {
        if self.status != PathStatus::Following || self.is_last_corner() {
            return None;
        }
        let corner = self.current_corner()?;
        let cut = self.config.corner_cut_distance;
        if vector::horizontal_distance_squared(position, corner) > cut * cut {
            return None;
        }
        self.corners.as_deref()?.get(self.current_corner + 1).copied()
    }

    /// Sharpest turn (degrees) within the sprint lookahead, including the
    /// turn at the current corner.
    pub fn upcoming_turn_angle(&self) -> f32 {
        match self.corners.as_deref() {
            Some(corners) => sprint::compute_angle_jitter(
                corners,
                self.current_corner.saturating_sub(1),
                self.sprint.lookahead_distance,
            ),
            None => 0.0,
        }
    }

    /// Whether the upcoming path is straight enough to sprint at `urgency`.
    pub fn can_sprint(&self, urgency: Urgency) -> bool {
        if self.status != PathStatus::Following {
            return false;
        }
        sprint::can_sprint(self.upcoming_turn_angle(), urgency, &self.sprint.thresholds)
    }

    /// Horizontal distance left: to the current corner, then along the rest
    /// of the polyline.
    pub fn remaining_distance(&self, position: Vec3) -> f32 {
        let (Some(corners), Some(corner)) = (self.corners.as_deref(), self.current_corner()) else {
            return 0.0;
        };
        let ahead: f32 = corners[self.current_corner..]
            .windows(2)
            .map(|pair| vector::horizontal_distance(pair[0], pair[1]))
            .sum();
        vector::horizontal_distance(position, corner) + ahead
    }

    /// Write the read-only projection for other systems.
    ///
    /// `last_path_update_time` only moves to `sim_time` when a path was set
    /// or reset since the previous sync.
    pub fn sync_state(&mut self, state: &mut MovementState, sim_time: f32) {
        state.status = self.status;
        state.current_corner_index = self.current_corner;
        state.total_corners = self.total_corners();
        state.retry_count = self.retry_count;
        if self.path_changed {
            state.last_path_update_time = sim_time;
            self.path_changed = false;
        }
    }

    pub fn status(&self) -> PathStatus {
        self.status
    }

    pub fn corners(&self) -> Option<&[Vec3]> {
        self.corners.as_deref()
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn current_corner_index(&self) -> usize {
        self.current_corner
    }

    /// The corner being walked toward, if any.
    pub fn current_corner(&self) -> Option<Vec3> {
        self.corners
            .as_deref()
            .and_then(|c| c.get(self.current_corner))
            .copied()
    }

    pub fn total_corners(&self) -> usize {
        self.corners.as_ref().map_or(0, Vec::len)
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Set when the polyline ends short of the target; cleared by the next
    /// [`set_path`](Self::set_path).
    pub fn needs_repath(&self) -> bool {
        self.repath_requested
    }

    pub fn is_last_corner(&self) -> bool {
        self.current_corner + 1 >= self.total_corners()
    }

    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    fn corner_epsilon(&self, is_sprinting: bool) -> f32 {
        if is_sprinting {
            self.config.sprint_epsilon
        } else {
            self.config.walk_epsilon
        }
    }

    fn within_corner(&self, index: usize, position: Vec3, eps: f32) -> bool {
        match self.corners.as_deref().and_then(|c| c.get(index)) {
            Some(&corner) => vector::horizontal_distance_squared(position, corner) <= eps * eps,
            None => false,
        }
    }

    fn path_reaches_target(&self) -> bool {
        self.end_within(self.config.partial_path_tolerance)
    }

    fn end_within_arrival(&self) -> bool {
        self.end_within(self.config.destination_epsilon)
    }

    fn end_within(&self, radius: f32) -> bool {
        match self.corners.as_deref().and_then(|c| c.last()) {
            Some(&end) => vector::horizontal_distance_squared(end, self.target) <= radius * radius,
            None => false,
        }
    }
}
