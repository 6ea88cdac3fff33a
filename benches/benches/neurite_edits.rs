// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use arbor_tree::{Neurite, NeuriteKind, Node};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// `(parent_id, node)` records of a binary tree of `depth` levels with
/// `run` nodes per branch, listed the way a reader would emit them.
fn gen_records(depth: u32, run: usize) -> Vec<(i64, Node)> {
    let mut out = Vec::new();
    let mut next_id = 1_i64;
    out.push((-1, Node::from_xyz(next_id, 0.0, 0.0, 0.0, 1.0)));
    // (tail id, tail x, tail y, level)
    let mut stack = vec![(next_id, 0.0_f64, 0.0_f64, 0_u32)];
    while let Some((mut parent, mut x, y0, level)) = stack.pop() {
        if level == depth {
            continue;
        }
        let y = if level == 0 { y0 } else { y0 + 1.0 };
        for _ in 0..run {
            next_id += 1;
            x += 1.0;
            out.push((parent, Node::from_xyz(next_id, x, y, 0.0, 1.0)));
            parent = next_id;
        }
        stack.push((parent, x, y - 2.0, level + 1));
        stack.push((parent, x, y, level + 1));
    }
    out
}

fn build(records: &[(i64, Node)]) -> Neurite {
    let mut n = Neurite::new(1, NeuriteKind::Dendrite);
    for (parent, node) in records {
        let _ = n.insert_node_by_parent_id(*parent, node.clone());
    }
    let _ = n.correct();
    n
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &depth in &[4u32, 8] {
        let records = gen_records(depth, 16);
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_function(format!("by_parent_id_depth{}", depth), |b| {
            b.iter(|| black_box(build(black_box(&records)).branch_count()));
        });
    }
    group.finish();
}

fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");
    let tree = build(&gen_records(8, 16));
    group.throughput(Throughput::Elements(tree.node_count() as u64));
    group.bench_function("nodes_forward", |b| {
        b.iter(|| black_box(tree.nodes().map(|n| n.radius()).sum::<f64>()));
    });
    group.bench_function("nodes_backward", |b| {
        b.iter(|| black_box(tree.nodes().rev().map(|n| n.radius()).sum::<f64>()));
    });
    group.bench_function("leaves", |b| {
        b.iter(|| black_box(tree.leaves().map(|l| l.len()).sum::<usize>()));
    });
    group.bench_function("at_order_4", |b| {
        b.iter(|| black_box(tree.at_order(4).count()));
    });
    group.finish();
}

fn bench_tree_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_edits");
    let tree = build(&gen_records(6, 32));
    group.bench_function("scale", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut t| {
                let _ = t.scale(1.5);
                black_box(t.node_count())
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("simplify", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut t| {
                t.simplify(0.1);
                black_box(t.node_count())
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_traversal, bench_tree_edits);
criterion_main!(benches);
