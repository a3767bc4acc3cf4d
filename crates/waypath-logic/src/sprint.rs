//! Sprint gating by upcoming path curvature.
//!
//! Sprinting into a sharp turn overshoots the corner. Before allowing a
//! sprint the mover measures the sharpest turn within a lookahead window
//! and compares it against a per-urgency angle budget.

use serde::{Deserialize, Serialize};

use crate::config::SprintThresholds;
use crate::vector::{self, Vec3};

/// Segments shorter than this carry no usable direction.
const MIN_SEGMENT_LENGTH: f32 = 1e-3;

/// How badly the bot wants to get there. Higher urgency tolerates sharper
/// turns at sprint speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

/// Largest turn angle (degrees) between consecutive segments starting at
/// `start_index`, looking `lookahead_distance` units ahead.
///
/// Returns 0 when fewer than three corners remain. Near-zero segments are
/// skipped so duplicate corners do not produce spurious turns.
pub fn compute_angle_jitter(corners: &[Vec3], start_index: usize, lookahead_distance: f32) -> f32 {
    if corners.len() < start_index.saturating_add(3) {
        return 0.0;
    }

    let mut max_angle = 0.0_f32;
    let mut travelled = 0.0_f32;
    let mut previous: Option<Vec3> = None;

    for pair in corners[start_index..].windows(2) {
        let segment = vector::flatten(vector::sub(pair[1], pair[0]));
        let len = vector::length(segment);
        if len < MIN_SEGMENT_LENGTH {
            continue;
        }
        let dir = vector::scale(segment, 1.0 / len);

        if let Some(prev) = previous {
            let cos = vector::dot(prev, dir).clamp(-1.0, 1.0);
            max_angle = max_angle.max(cos.acos().to_degrees());
        }
        previous = Some(dir);

        travelled += len;
        if travelled >= lookahead_distance {
            break;
        }
    }

    max_angle
}

/// True if a turn of `angle` degrees is within the budget for `urgency`.
pub fn can_sprint(angle: f32, urgency: Urgency, thresholds: &SprintThresholds) -> bool {
    angle <= thresholds.for_urgency(urgency)
}
