//! Plain 3D vectors.
//!
//! `y` is the vertical axis. All arithmetic is spelled out through named
//! functions (`add`, `sub`, `scale`, ...) rather than operator overloads, so
//! every use site states what it computes. The `horizontal_*` helpers drop
//! the vertical axis; path following compares distances on the ground plane
//! only so terrain height noise cannot corrupt arrival tests.

use serde::{Deserialize, Serialize};

/// Lengths below this are treated as zero when normalizing.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// 3D point or direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// True if every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z)
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

pub fn scale(v: Vec3, s: f32) -> Vec3 {
    Vec3::new(v.x * s, v.y * s, v.z * s)
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}

pub fn length_squared(v: Vec3) -> f32 {
    dot(v, v)
}

pub fn length(v: Vec3) -> f32 {
    length_squared(v).sqrt()
}

/// Unit vector in the direction of `v`, or [`Vec3::ZERO`] when `v` is
/// shorter than [`NORMALIZE_EPSILON`].
pub fn normalize(v: Vec3) -> Vec3 {
    let len = length(v);
    if len > NORMALIZE_EPSILON {
        scale(v, 1.0 / len)
    } else {
        Vec3::ZERO
    }
}

/// Linear interpolation, `t = 0` gives `a`, `t = 1` gives `b`.
pub fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    Vec3::new(
        a.x + (b.x - a.x) * t,
        a.y + (b.y - a.y) * t,
        a.z + (b.z - a.z) * t,
    )
}

pub fn distance_squared(a: Vec3, b: Vec3) -> f32 {
    length_squared(sub(a, b))
}

pub fn distance(a: Vec3, b: Vec3) -> f32 {
    distance_squared(a, b).sqrt()
}

/// Project onto the ground plane (`y = 0`).
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

pub fn horizontal_length(v: Vec3) -> f32 {
    (v.x * v.x + v.z * v.z).sqrt()
}

/// Squared distance ignoring the vertical axis.
pub fn horizontal_distance_squared(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal_distance_squared(a, b).sqrt()
}
