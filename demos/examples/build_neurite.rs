// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build a neurite the way a file reader does.
//!
//! Feed `(parent id, node)` records, let insertion split branches, normalize
//! with `correct`, then walk the tree.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p arbor_demos --example build_neurite`

use arbor_tree::{Neurite, NeuriteKind, Neuron, Node, Point};

fn main() {
    env_logger::init();

    let mut cell = Neuron::new("demo");
    for (i, (x, y)) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)]
        .into_iter()
        .enumerate()
    {
        cell.add_soma_node(Node::from_xyz(-(i as i64) - 10, x, y, 0.0, 0.5));
    }

    // An SWC-like listing: id, x, y, z, radius, parent.
    let records = [
        (1, 2.0, 0.0, 0.0, 0.6, -1),
        (2, 4.0, 0.5, 0.0, 0.5, 1),
        (3, 6.0, 1.5, 0.0, 0.4, 2),
        (4, 8.0, 3.0, 0.0, 0.3, 3),
        (5, 6.5, -0.5, 0.0, 0.4, 2),
        (6, 8.5, -1.0, 0.0, 0.3, 5),
        (7, 10.0, 4.0, 0.5, 0.2, 4),
        (8, 9.5, 2.0, 0.0, 0.2, 4),
    ];

    let Some(anchor) = cell.closest_soma_node(Point::new(2.0, 0.0, 0.0)).cloned() else {
        return;
    };
    let mut dendrite = Neurite::new(1, NeuriteKind::Dendrite);
    let _ = dendrite.set_root_with(anchor);
    for (id, x, y, z, r, parent) in records {
        let node = Node::from_xyz(id, x, y, z, r);
        if let Err(e) = dendrite.insert_node_by_parent_id(parent, node) {
            eprintln!("node {id}: {e}");
        }
    }
    match dendrite.correct() {
        Ok(changed) => println!("correct changed the tree: {changed}"),
        Err(e) => eprintln!("correct: {e}"),
    }
    cell.add_neurite(dendrite);

    let Some(dendrite) = cell.neurite(1) else {
        return;
    };
    println!("branches: {}", dendrite.branch_count());
    for b in dendrite.branches() {
        let ids: Vec<i64> = b.iter().map(Node::id).collect();
        println!(
            "{:indent$}{} (order {}, length {:.2}): {:?}",
            "",
            b.id_string(),
            b.order(),
            b.length(),
            ids,
            indent = 2 * b.order()
        );
    }
    let tips: Vec<String> = dendrite.leaves().map(|b| b.id_string()).collect();
    println!("terminal branches: {tips:?}");

    if let Ok(pos) = dendrite.find_node(7) {
        let stem: Vec<String> = dendrite
            .stem(pos.branch)
            .map(|s| s.map(|b| b.id_string()).collect())
            .unwrap_or_default();
        println!("path from node 7 to the soma: {stem:?}");
        if let Ok(basis) = dendrite.node_basis(pos, cell.up()) {
            println!("local basis at node 7: {basis:?}");
        }
    }
    println!("total nodes: {}", cell.node_count());
}
