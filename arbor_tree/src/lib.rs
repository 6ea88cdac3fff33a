// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Tree: the branch-tree engine of a reconstructed neuron.
//!
//! A neuron is a soma plus a set of neurites (axon, dendrites, apical
//! dendrite). Each neurite is a rooted tree whose payload at every position is
//! a [`Branch`]: an ordered run of sampled [`Node`]s between two bifurcations.
//!
//! - [`Node`]: position, radius, id, and memoized segment length and local basis.
//! - [`Branch`]: node sequence with an optional root (a copy of the parent's
//!   last node), hierarchical id, and geometry (simplification, Fréchet
//!   distance, segment distance, rigid and radial transforms).
//! - [`Neurite`]: arena of branches addressed by generational [`BranchId`]s,
//!   with the structural edits used by file readers and the traversals used
//!   by measurements.
//! - [`Neuron`]: soma nodes, neurites and [`NeuronSettings`].
//!
//! ## Building a neurite
//!
//! Readers root the tree, insert nodes by parent id, then normalize:
//!
//! - [`Neurite::set_root`] / [`Neurite::set_root_with`] create the root branch.
//! - [`Neurite::insert_node_by_parent_id`] splits branches automatically when a
//!   node is attached anywhere but at a tail.
//! - [`Neurite::correct`] merges single-child chains left over by the splits.
//!
//! ```
//! use arbor_tree::{Neurite, NeuriteKind, Node};
//!
//! let mut axon = Neurite::new(1, NeuriteKind::Axon);
//! axon.insert_node_by_parent_id(-1, Node::from_xyz(1, 0.0, 0.0, 0.0, 1.0)).unwrap();
//! axon.insert_node_by_parent_id(1, Node::from_xyz(2, 1.0, 0.0, 0.0, 1.0)).unwrap();
//! axon.insert_node_by_parent_id(2, Node::from_xyz(3, 2.0, 1.0, 0.0, 1.0)).unwrap();
//! // Attaching to node 2 again creates a bifurcation there.
//! axon.insert_node_by_parent_id(2, Node::from_xyz(4, 2.0, -1.0, 0.0, 1.0)).unwrap();
//!
//! let ids: Vec<_> = axon.branches().map(|b| b.id_string()).collect();
//! assert_eq!(ids, ["1", "1-1", "1-2"]);
//! assert_eq!(axon.leaves().count(), 2);
//!
//! let flat: Vec<i64> = axon.nodes().map(|n| n.id()).collect();
//! assert_eq!(flat, [1, 2, 3, 4]);
//! ```
//!
//! ## Handles and invariants
//!
//! [`BranchId`] is a copyable handle into one neurite's arena. Structural edits
//! may free branches; a handle to a freed branch reports
//! [`TreeError::BranchNotFound`], and a handle from another neurite reports
//! [`TreeError::ForeignBranch`]. After every public structural edit:
//!
//! - the root branch has id `[1]` and order `0`;
//! - every other branch's id is its parent's id plus its 1-based sibling
//!   index, so its order is its parent's order plus one.
//!
//! Node back-references (logical parent id and owning branch) are re-bound
//! whenever a node is stored, and memoized values are dropped whenever a
//! node moves or gets a new predecessor.
//!
//! ## Logging
//!
//! Structural edits log through the [`log`] facade at `debug` level, per-node
//! edits at `trace` level. No logger is installed.

extern crate alloc;

mod branch;
mod error;
mod neurite;
mod neuron;
mod node;
mod traversal;
mod types;

pub use branch::Branch;
pub use error::{Access, Reference, TreeError, TreeResult};
pub use neurite::Neurite;
pub use neuron::Neuron;
pub use node::Node;
pub use traversal::{BranchRef, Branches, NodeRef, Nodes, Stem};
pub use types::{BranchId, NeuriteKind, NeuriteKinds, NeuronSettings, NodePos};

pub use arbor_geometry::{DQuat, DVec3, Point};
