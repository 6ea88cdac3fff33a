// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single sampled point of a neural process.

use core::cell::Cell;

use arbor_geometry::{Point, local_basis, vector_angle};
use glam::DVec3;

use crate::error::{Reference, TreeError, TreeResult};
use crate::types::BranchId;

/// A sampled point with a radius.
///
/// Nodes are plain values: they are cloned freely and owned by a
/// [`Branch`](crate::Branch). The `parent` and `branch` back-references are
/// non-owning and get re-bound by the branch whenever the node is stored.
///
/// Equality is by [`id`](Node::id) alone.
///
/// `length` and `local_basis` are memoized. The memo is dropped whenever the
/// position, the radius or the bound parent changes.
#[derive(Clone, Debug)]
pub struct Node {
    id: i64,
    position: Point,
    radius: f64,
    parent: Option<i64>,
    branch: Option<BranchId>,
    length_cache: Cell<Option<f64>>,
    basis_cache: Cell<Option<[DVec3; 3]>>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new(-1, Point::ZERO, 0.0)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Node {
    /// Create an unbound node.
    pub fn new(id: i64, position: Point, radius: f64) -> Self {
        Self {
            id,
            position,
            radius,
            parent: None,
            branch: None,
            length_cache: Cell::new(None),
            basis_cache: Cell::new(None),
        }
    }

    /// Create an unbound node from coordinates.
    pub fn from_xyz(id: i64, x: f64, y: f64, z: f64, radius: f64) -> Self {
        Self::new(id, Point::new(x, y, z), radius)
    }

    /// Node identifier.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Change the identifier.
    pub fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    /// Position.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Move the node.
    pub fn set_position(&mut self, position: Point) {
        self.position = position;
        self.invalidate();
    }

    /// Radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Change the radius.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.invalidate();
    }

    /// Euclidean distance to another node.
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.position.distance(other.position)
    }

    /// Euclidean distance to a point.
    pub fn distance_to_point(&self, point: Point) -> f64 {
        self.position.distance(point)
    }

    /// Vector from this node to `other`.
    pub fn vector_to(&self, other: &Self) -> DVec3 {
        other.position - self.position
    }

    /// Vector from this node to `point`.
    pub fn vector_to_point(&self, point: Point) -> DVec3 {
        point - self.position
    }

    /// Id of the logical parent node (the predecessor in the branch, or the branch root).
    pub fn parent_id(&self) -> TreeResult<i64> {
        self.parent
            .ok_or(TreeError::UnboundReference(Reference::NodeParent))
    }

    /// Whether a logical parent is bound.
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Handle of the branch holding this node, once that branch is part of a neurite.
    pub fn branch(&self) -> TreeResult<BranchId> {
        self.branch
            .ok_or(TreeError::UnboundReference(Reference::NodeBranch))
    }

    /// Distance to `parent`, memoized until this node moves or is re-parented.
    pub fn length(&self, parent: &Self) -> f64 {
        if let Some(len) = self.length_cache.get() {
            return len;
        }
        let len = self.distance_to(parent);
        self.length_cache.set(Some(len));
        len
    }

    /// Orthonormal frame at this node, memoized until this node moves or is re-parented.
    ///
    /// See [`arbor_geometry::local_basis`] for the construction.
    pub fn local_basis(&self, parent: &Self, up: DVec3) -> [DVec3; 3] {
        if let Some(basis) = self.basis_cache.get() {
            return basis;
        }
        let basis = local_basis(self.position, parent.position, up);
        self.basis_cache.set(Some(basis));
        basis
    }

    /// Angle in radians at this node between the segments towards `prev` and `next`.
    ///
    /// A straight continuation gives `π`; a full fold-back gives `0`.
    pub fn compute_angle(&self, prev: &Self, next: &Self) -> f64 {
        vector_angle(self.vector_to(prev), self.vector_to(next))
    }

    pub(crate) fn bind(&mut self, parent: Option<i64>, branch: Option<BranchId>) {
        self.parent = parent;
        self.branch = branch;
        self.invalidate();
    }

    pub(crate) fn set_branch(&mut self, branch: Option<BranchId>) {
        self.branch = branch;
    }

    fn invalidate(&mut self) {
        self.length_cache.set(None);
        self.basis_cache.set(None);
    }

    #[cfg(test)]
    pub(crate) fn has_cached_length(&self) -> bool {
        self.length_cache.get().is_some()
    }
}
