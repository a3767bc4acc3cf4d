//! Movement tuning surface.
//!
//! Loaded once at session start and never changed mid-tick. Every field has
//! a documented default; a JSON file only needs the fields it overrides.
//!
//! ```
//! use waypath_logic::config::MovementConfig;
//!
//! let config = MovementConfig::from_json_str(r#"{ "follower": { "max_retries": 5 } }"#).unwrap();
//! assert_eq!(config.follower.max_retries, 5);
//! assert!((config.follower.walk_epsilon - 0.35).abs() < f32::EPSILON);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sprint::Urgency;

/// All movement tuning, grouped by consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub follower: FollowerConfig,
    pub smoothing: SmoothingConfig,
    pub sprint: SprintConfig,
    /// Pose applied when a mover starts driving a bot (1.0 = standing).
    pub default_pose: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            follower: FollowerConfig::default(),
            smoothing: SmoothingConfig::default(),
            sprint: SprintConfig::default(),
            default_pose: 1.0,
        }
    }
}

/// Thresholds for the path follower. Distances are horizontal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Corner counts as reached within this distance while walking.
    pub walk_epsilon: f32,
    /// Looser corner radius while sprinting (must be ≥ `walk_epsilon`).
    pub sprint_epsilon: f32,
    /// Arrival precision at the target.
    pub destination_epsilon: f32,
    /// How far the polyline's last corner may end from the target before
    /// the path counts as partial and a recompute is requested.
    pub partial_path_tolerance: f32,
    /// Corner cutting only happens this close to the current corner.
    pub corner_cut_distance: f32,
    /// Partial-path recomputes allowed before the follower fails.
    pub max_retries: u32,
    /// Weight of the drift correction when blended into the heading.
    pub deviation_strength: f32,
    /// Drift correction is clamped to this length before blending.
    pub max_deviation: f32,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            walk_epsilon: 0.35,
            sprint_epsilon: 0.6,
            destination_epsilon: 1.5,
            partial_path_tolerance: 1.5,
            corner_cut_distance: 1.0,
            max_retries: 3,
            deviation_strength: 1.0,
            max_deviation: 1.0,
        }
    }
}

/// Upper bound on Chaikin passes. Each pass doubles the corner count.
pub const MAX_SMOOTHING_ITERATIONS: i32 = 8;

/// Path smoothing applied before a polyline reaches the follower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Segments longer than this are subdivided.
    pub min_segment_length: f32,
    /// Chaikin passes. 0 disables corner cutting, at most
    /// [`MAX_SMOOTHING_ITERATIONS`].
    pub iterations: i32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            min_segment_length: 4.0,
            iterations: 2,
        }
    }
}

/// Sprint gating by upcoming path curvature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SprintConfig {
    /// How far ahead (horizontal units) turns are measured.
    pub lookahead_distance: f32,
    pub thresholds: SprintThresholds,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            lookahead_distance: 10.0,
            thresholds: SprintThresholds::default(),
        }
    }
}

/// Largest tolerated turn angle (degrees) per urgency tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SprintThresholds {
    pub low: f32,
    pub medium: f32,
    pub high: f32,
}

impl Default for SprintThresholds {
    fn default() -> Self {
        Self {
            low: 20.0,
            medium: 45.0,
            high: 75.0,
        }
    }
}

impl SprintThresholds {
    pub fn for_urgency(&self, urgency: Urgency) -> f32 {
        match urgency {
            Urgency::Low => self.low,
            Urgency::Medium => self.medium,
            Urgency::High => self.high,
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("sprint_epsilon ({sprint}) is smaller than walk_epsilon ({walk})")]
    SprintEpsilonBelowWalk { walk: f32, sprint: f32 },
    #[error("sprint thresholds must ascend low <= medium <= high, got {low}/{medium}/{high}")]
    ThresholdsNotAscending { low: f32, medium: f32, high: f32 },
    #[error("sprint threshold {value} outside 0..=180 degrees")]
    ThresholdOutOfRange { value: f32 },
    #[error("smoothing iterations must be non-negative, got {0}")]
    NegativeIterations(i32),
    #[error("smoothing iterations {value} exceeds the limit of {max}")]
    TooManyIterations { value: i32, max: i32 },
    #[error("deviation_strength must be non-negative, got {0}")]
    NegativeDeviationStrength(f32),
    #[error("default_pose {0} outside 0..=1")]
    PoseOutOfRange(f32),
}

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {}", format_errors(.0))]
    Invalid(Vec<ConfigError>),
}

fn format_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl MovementConfig {
    /// Parse JSON (missing fields take defaults) and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigLoadError> {
        let config: MovementConfig = serde_json::from_str(json)?;
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigLoadError::Invalid(errors))
        }
    }

    /// Check every field, returning all findings.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let f = &self.follower;

        let positive = [
            ("follower.walk_epsilon", f.walk_epsilon),
            ("follower.sprint_epsilon", f.sprint_epsilon),
            ("follower.destination_epsilon", f.destination_epsilon),
            ("follower.partial_path_tolerance", f.partial_path_tolerance),
            ("follower.corner_cut_distance", f.corner_cut_distance),
            ("follower.max_deviation", f.max_deviation),
            ("smoothing.min_segment_length", self.smoothing.min_segment_length),
            ("sprint.lookahead_distance", self.sprint.lookahead_distance),
        ];
        for (field, value) in positive {
            // NaN fails this comparison too
            if !(value > 0.0) {
                errors.push(ConfigError::NonPositive { field, value });
            }
        }

        if f.sprint_epsilon < f.walk_epsilon {
            errors.push(ConfigError::SprintEpsilonBelowWalk {
                walk: f.walk_epsilon,
                sprint: f.sprint_epsilon,
            });
        }
        if f.deviation_strength < 0.0 {
            errors.push(ConfigError::NegativeDeviationStrength(f.deviation_strength));
        }

        let t = &self.sprint.thresholds;
        if !(t.low <= t.medium && t.medium <= t.high) {
            errors.push(ConfigError::ThresholdsNotAscending {
                low: t.low,
                medium: t.medium,
                high: t.high,
            });
        }
        for value in [t.low, t.medium, t.high] {
            if !(0.0..=180.0).contains(&value) {
                errors.push(ConfigError::ThresholdOutOfRange { value });
            }
        }

        if self.smoothing.iterations < 0 {
            errors.push(ConfigError::NegativeIterations(self.smoothing.iterations));
        } else if self.smoothing.iterations > MAX_SMOOTHING_ITERATIONS {
            errors.push(ConfigError::TooManyIterations {
                value: self.smoothing.iterations,
                max: MAX_SMOOTHING_ITERATIONS,
            });
        }
        if !(0.0..=1.0).contains(&self.default_pose) {
            errors.push(ConfigError::PoseOutOfRange(self.default_pose));
        }

        errors
    }
}
