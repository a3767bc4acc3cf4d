//! Benchmarks for the per-tick hot paths.
//!
//! Run with: `cargo bench --package waypath-logic`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use waypath_logic::config::{FollowerConfig, MovementConfig};
use waypath_logic::follower::PathFollower;
use waypath_logic::registry::EntityRegistry;
use waypath_logic::smoothing;
use waypath_logic::sprint::Urgency;
use waypath_logic::vector::{self, Vec3};

/// A zig-zag polyline with `n` corners, 5 units per leg.
fn zig_zag(n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|i| Vec3::new(i as f32 * 5.0, 0.0, if i % 2 == 0 { 0.0 } else { 3.0 }))
        .collect()
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("churn", size), &size, |b, &size| {
            b.iter(|| {
                let mut registry = EntityRegistry::new();
                let ids: Vec<_> = (0..size).map(|_| registry.add()).collect();
                for id in ids.iter().step_by(3) {
                    registry.remove(*id);
                }
                for _ in 0..size / 3 {
                    black_box(registry.add());
                }
                black_box(registry.len())
            })
        });
    }

    for size in [100, 1_000, 10_000] {
        let mut registry = EntityRegistry::new();
        for i in 0..size {
            registry.add_with_engine_id(i * 2);
        }
        group.bench_with_input(BenchmarkId::new("engine_lookup", size), &size, |b, &size| {
            b.iter(|| black_box(registry.get_by_engine_id(size)))
        });
    }

    group.finish();
}

fn bench_follower(c: &mut Criterion) {
    let mut group = c.benchmark_group("follower");
    let config = MovementConfig::default();

    for corners in [8, 64, 512] {
        let path = smoothing::smooth(&zig_zag(corners), &config.smoothing);
        let target = *path.last().unwrap_or(&Vec3::ZERO);

        group.bench_with_input(BenchmarkId::new("tick_and_steer", corners), &path, |b, path| {
            b.iter(|| {
                let mut follower = PathFollower::new(FollowerConfig::default());
                follower.set_path(Some(path.clone()), target);
                let mut position = path[0];
                for _ in 0..256 {
                    follower.tick(position, false);
                    let dir = follower.compute_move_direction(position);
                    black_box(follower.can_sprint(Urgency::Medium));
                    position = vector::add(position, vector::scale(dir, 0.3));
                }
                black_box(follower.status())
            })
        });
    }

    for corners in [8, 64, 512] {
        let raw = zig_zag(corners);
        group.bench_with_input(BenchmarkId::new("smooth", corners), &raw, |b, raw| {
            b.iter(|| black_box(smoothing::smooth(raw, &config.smoothing)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_registry, bench_follower);
criterion_main!(benches);
