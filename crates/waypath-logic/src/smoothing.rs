//! Polyline smoothing before path following.
//!
//! Nav-mesh corners make jagged paths with long straight runs. Long
//! segments are first subdivided so the corner cutter has material to work
//! with, then Chaikin passes round off each interior corner. The first and
//! last points are never moved: the bot still starts where it stands and
//! ends where it was sent.

use crate::config::SmoothingConfig;
use crate::vector::{self, Vec3};

/// Subdivide every segment longer than `min_segment_length` into equal
/// parts no longer than it. Original corners are kept exactly.
pub fn insert_intermediate_points(corners: &[Vec3], min_segment_length: f32) -> Vec<Vec3> {
    if corners.len() < 2 || !(min_segment_length > 0.0) {
        return corners.to_vec();
    }

    let mut out = Vec::with_capacity(corners.len());
    out.push(corners[0]);
    for pair in corners.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = vector::distance(a, b);
        if len > min_segment_length {
            let parts = (len / min_segment_length).ceil() as usize;
            for i in 1..parts {
                out.push(vector::lerp(a, b, i as f32 / parts as f32));
            }
        }
        out.push(b);
    }
    out
}

/// Chaikin corner cutting with fixed endpoints.
///
/// Each pass replaces every interior corner with two points: 75% along the
/// incoming segment and 25% along the outgoing one. Fewer than three
/// points or `iterations <= 0` returns the input unchanged.
pub fn chaikin_smooth(corners: &[Vec3], iterations: i32) -> Vec<Vec3> {
    if corners.len() < 3 || iterations <= 0 {
        return corners.to_vec();
    }

    let mut current = corners.to_vec();
    for _ in 0..iterations {
        let n = current.len();
        let mut next = Vec::with_capacity(2 * n);
        next.push(current[0]);
        for i in 1..n - 1 {
            next.push(vector::lerp(current[i - 1], current[i], 0.75));
            next.push(vector::lerp(current[i], current[i + 1], 0.25));
        }
        next.push(current[n - 1]);
        current = next;
    }
    current
}

/// Subdivide then corner-cut using the configured parameters.
pub fn smooth(corners: &[Vec3], config: &SmoothingConfig) -> Vec<Vec3> {
    let subdivided = insert_intermediate_points(corners, config.min_segment_length);
    chaikin_smooth(&subdivided, config.iterations)
}
