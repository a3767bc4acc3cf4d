//! Drift correction toward the current path segment.
//!
//! A bot rarely walks exactly on its polyline: collisions, momentum and
//! host-side steering push it sideways. The follower measures the offset to
//! the closest point of the segment it is walking and blends a spring-like
//! pull back into the raw corner heading. Everything here works on the
//! ground plane; returned vectors have `y = 0`.

use crate::vector::{self, Vec3};

/// Default weight for [`blend_with_deviation`].
pub const DEFAULT_STRENGTH: f32 = 1.0;

/// Blends shorter than this fall back to the raw heading.
const BLEND_EPSILON: f32 = 1e-4;

/// Segments shorter than this are treated as a single point.
const DEGENERATE_SEGMENT_SQ: f32 = 1e-8;

/// Vector from `position` to the closest point on the segment
/// `segment_start..segment_end`.
///
/// The projection parameter is clamped to `[0, 1]`, so a bot beyond either
/// end is pulled toward that endpoint rather than toward the infinite line.
/// A zero-length segment yields the vector to `segment_start`.
pub fn compute_deviation(position: Vec3, segment_start: Vec3, segment_end: Vec3) -> Vec3 {
    let pos = vector::flatten(position);
    let start = vector::flatten(segment_start);
    let end = vector::flatten(segment_end);

    let segment = vector::sub(end, start);
    let len_sq = vector::length_squared(segment);
    if len_sq < DEGENERATE_SEGMENT_SQ {
        return vector::sub(start, pos);
    }

    let t = (vector::dot(vector::sub(pos, start), segment) / len_sq).clamp(0.0, 1.0);
    let closest = vector::add(start, vector::scale(segment, t));
    vector::sub(closest, pos)
}

/// `normalize(move_direction + strength * deviation)`.
///
/// If the sum is near zero (the correction cancels the heading) the
/// original `move_direction` is returned untouched.
pub fn blend_with_deviation(move_direction: Vec3, deviation: Vec3, strength: f32) -> Vec3 {
    let blended = vector::add(move_direction, vector::scale(deviation, strength));
    if vector::length(blended) < BLEND_EPSILON {
        return move_direction;
    }
    vector::normalize(blended)
}

/// Shorten `v` to `max_len` if it is longer.
pub fn clamp_magnitude(v: Vec3, max_len: f32) -> Vec3 {
    let len = vector::length(v);
    if len > max_len && len > 0.0 {
        vector::scale(v, max_len / len)
    } else {
        v
    }
}
