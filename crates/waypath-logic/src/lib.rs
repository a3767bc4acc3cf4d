//! Bot movement core for Waypath.
//!
//! This crate contains the movement simulation that is independent of any
//! game engine: a dense entity registry for bots and a deterministic
//! path-following engine that turns navigation-mesh corners into per-tick
//! movement vectors. Host engines plug in through the traits in [`mover`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Tuning surface (epsilons, smoothing, sprint thresholds) and validation |
//! | [`deviation`] | Drift from the current path segment and heading correction |
//! | [`follower`] | Corner-by-corner path-following state machine |
//! | [`mover`] | Adapter traits for nav-mesh/character services and the per-agent mover |
//! | [`registry`] | Dense swap-remove bot registry with recycled IDs |
//! | [`session`] | Session-scoped owner of the registry and all movers |
//! | [`smoothing`] | Segment subdivision and Chaikin corner cutting |
//! | [`sprint`] | Path curvature measurement and sprint gating |
//! | [`state`] | Per-bot record and movement-state projection |
//! | [`vector`] | Plain 3D vector type and named vector functions |
//!
//! # Usage
//!
//! ```
//! use waypath_logic::config::FollowerConfig;
//! use waypath_logic::follower::PathFollower;
//! use waypath_logic::state::PathStatus;
//! use waypath_logic::vector::Vec3;
//!
//! let mut follower = PathFollower::new(FollowerConfig::default());
//! let target = Vec3::new(10.0, 0.0, 0.0);
//! follower.set_path(Some(vec![Vec3::ZERO, target]), target);
//! assert_eq!(follower.tick(Vec3::new(9.9, 0.0, 0.0), false), PathStatus::Reached);
//! ```

pub mod config;
pub mod deviation;
pub mod follower;
pub mod mover;
pub mod registry;
pub mod session;
pub mod smoothing;
pub mod sprint;
pub mod state;
pub mod vector;
