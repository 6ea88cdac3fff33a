// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use arbor_geometry::{Point, discrete_frechet, segment_segment_distance, simplify_mask};
use arbor_tree::{Branch, Node};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// A wobbly helix of `n` points, `phase` shifts it sideways.
fn gen_helix(n: usize, phase: f64) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let t = i as f64 * 0.1;
            Point::new(t.cos() + phase, t.sin(), t * 0.3 + (t * 7.0).sin() * 0.05)
        })
        .collect()
}

fn gen_branch(n: usize, phase: f64, first_id: i64) -> Branch {
    let points = gen_helix(n, phase);
    let root = Node::new(first_id, points[0], 0.5);
    Branch::from_nodes(
        Some(root),
        points
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, p)| Node::new(first_id + i as i64, *p, 0.5)),
    )
}

fn bench_frechet(c: &mut Criterion) {
    let mut group = c.benchmark_group("frechet");
    for &n in &[64usize, 256, 1024] {
        let a = gen_helix(n, 0.0);
        let b = gen_helix(n, 0.25);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("points_n{}", n), |bch| {
            bch.iter(|| black_box(discrete_frechet(black_box(&a), black_box(&b))));
        });
    }
    group.finish();
}

fn bench_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify");
    for &n in &[256usize, 4096] {
        let points = gen_helix(n, 0.0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("mask_n{}", n), |b| {
            b.iter(|| black_box(simplify_mask(black_box(&points), 0.01)));
        });
        let branch = gen_branch(n, 0.0, 0);
        group.bench_function(format!("branch_n{}", n), |b| {
            b.iter_batched(
                || branch.clone(),
                |mut br| {
                    br.simplify(0.01);
                    black_box(br.len())
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance");
    group.bench_function("segment_pair", |b| {
        b.iter(|| {
            black_box(segment_segment_distance(
                black_box(Point::new(0.0, 0.0, 0.0)),
                black_box(Point::new(1.0, 0.2, 0.0)),
                black_box(Point::new(0.3, 1.0, 1.0)),
                black_box(Point::new(0.7, -1.0, 1.0)),
            ))
        });
    });
    for &n in &[32usize, 128] {
        let a = gen_branch(n, 0.0, 0);
        let b = gen_branch(n, 3.0, 10_000);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("branch_pair_n{}", n), |bch| {
            bch.iter(|| black_box(a.distance(black_box(&b), false)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frechet, bench_simplify, bench_distance);
criterion_main!(benches);
