//! Per-bot records stored in the [`crate::registry::EntityRegistry`].

use serde::{Deserialize, Serialize};

use crate::vector::Vec3;

/// Path-following status shared by the follower and its projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PathStatus {
    /// No path assigned.
    #[default]
    Idle,
    /// Walking the polyline corner by corner.
    Following,
    /// Destination reached.
    Reached,
    /// No path, unreachable target, or retries exhausted. Terminal until a
    /// new path is set or the follower is reset.
    Failed,
}

impl PathStatus {
    /// `Reached` and `Failed` end a path; `Idle` and `Following` do not.
    pub fn is_terminal(self) -> bool {
        matches!(self, PathStatus::Reached | PathStatus::Failed)
    }
}

/// Read-only projection of a bot's path-following state.
///
/// The mover writes this once per tick; decision logic elsewhere reads it
/// but never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovementState {
    pub status: PathStatus,
    pub is_sprinting: bool,
    /// 0.0 = fully crouched, 1.0 = standing.
    pub current_pose: f32,
    pub current_corner_index: usize,
    pub total_corners: usize,
    pub retry_count: u32,
    /// Simulation time (seconds) of the last sync from the follower.
    pub last_path_update_time: f32,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            status: PathStatus::Idle,
            is_sprinting: false,
            current_pose: 1.0,
            current_corner_index: 0,
            total_corners: 0,
            retry_count: 0,
            last_path_update_time: 0.0,
        }
    }
}

impl MovementState {
    /// Back to `Idle` with counters cleared. The pose is kept.
    pub fn reset(&mut self) {
        self.status = PathStatus::Idle;
        self.is_sprinting = false;
        self.current_corner_index = 0;
        self.total_corners = 0;
        self.retry_count = 0;
    }
}

/// Everything the registry stores for one bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotEntity {
    /// Stable registry ID. Recycled after removal.
    pub id: usize,
    /// Engine-native handle, if the bot was registered with one.
    pub engine_id: Option<usize>,
    /// Opaque profile identifier, if the bot was registered with one.
    pub profile_id: Option<String>,
    /// True while a mover is attached and driving the bot.
    pub is_active: bool,
    /// Last position reported by the host.
    pub position: Vec3,
    pub movement: MovementState,
}

impl BotEntity {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            engine_id: None,
            profile_id: None,
            is_active: false,
            position: Vec3::ZERO,
            movement: MovementState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entity_is_idle() {
        let bot = BotEntity::new(7);
        assert_eq!(bot.id, 7);
        assert_eq!(bot.movement.status, PathStatus::Idle);
        assert!(!bot.is_active);
    }

    #[test]
    fn reset_keeps_pose() {
        let mut state = MovementState {
            status: PathStatus::Failed,
            is_sprinting: true,
            current_pose: 0.3,
            current_corner_index: 4,
            total_corners: 9,
            retry_count: 2,
            last_path_update_time: 12.0,
        };
        state.reset();
        assert_eq!(state.status, PathStatus::Idle);
        assert_eq!(state.retry_count, 0);
        assert!(!state.is_sprinting);
        assert!((state.current_pose - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn terminal_statuses() {
        assert!(PathStatus::Reached.is_terminal());
        assert!(PathStatus::Failed.is_terminal());
        assert!(!PathStatus::Following.is_terminal());
        assert!(!PathStatus::Idle.is_terminal());
    }
}
