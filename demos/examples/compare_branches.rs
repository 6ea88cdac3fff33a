// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compare two traced branches.
//!
//! Simplify a dense trace, then compare it against a second trace with the
//! discrete Fréchet distance and the radius-aware segment distance.
//!
//! Run:
//! - `cargo run -p arbor_demos --example compare_branches`

use arbor_tree::{Branch, Node, Point};

fn trace(first_id: i64, offset: f64, samples: usize) -> Branch {
    let root = Node::new(first_id, Point::new(0.0, offset, 0.0), 0.4);
    let nodes = (1..=samples).map(|i| {
        let x = i as f64 * 0.25;
        let p = Point::new(x, offset + (x * 0.8).sin() * 0.3, 0.0);
        Node::new(first_id + i as i64, p, 0.4)
    });
    Branch::from_nodes(Some(root), nodes)
}

fn main() {
    let mut dense = trace(0, 0.0, 80);
    let other = trace(1000, 1.5, 40);

    let before = dense.len();
    let length = dense.length();
    dense.simplify(0.02);
    println!(
        "simplified {} -> {} nodes, length {:.3} -> {:.3}",
        before,
        dense.len(),
        length,
        dense.length()
    );

    match dense.discrete_frechet(&other) {
        Ok(d) => println!("discrete Fréchet distance: {d:.3}"),
        Err(e) => eprintln!("frechet: {e}"),
    }
    println!(
        "closest approach: {:.3} (surface gap {:.3})",
        dense.distance(&other, true),
        dense.distance(&other, false)
    );
}
