// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Branches: ordered node sequences between two bifurcations.
//!
//! A branch owns its nodes and an optional root node. The root is a value copy
//! of the parent branch's last node (or of an external anchor such as a soma
//! node); it is not a live link. Every edit here keeps the logical-parent
//! binding of the stored nodes consistent with their order.

use core::fmt::Write as _;
use core::ops::Range;

use arbor_geometry::{
    DQuat, Point, discrete_frechet, polyline_length, segment_segment_distance, simplify_mask,
};
use glam::DVec3;
use log::trace;

use crate::error::{Access, Reference, TreeError, TreeResult};
use crate::node::Node;
use crate::types::BranchId;

/// A polyline of nodes with a hierarchical id.
///
/// The id is a path: `[1]` for the root branch of a neurite, and the parent's
/// id with the 1-based sibling index appended for every other branch. The
/// centrifugal order is `id.len() - 1`.
#[derive(Clone, Debug)]
pub struct Branch {
    id: Vec<usize>,
    handle: Option<BranchId>,
    root: Option<Node>,
    nodes: Vec<Node>,
}

impl Default for Branch {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Branch {
    fn eq(&self, other: &Self) -> bool {
        self.id.len() == other.id.len() && self.nodes == other.nodes && self.root == other.root
    }
}

impl Branch {
    /// Create an empty, rootless branch with id `[1]`.
    pub fn new() -> Self {
        Self::with_id(vec![1])
    }

    /// Create an empty, rootless branch with the given path id.
    pub fn with_id(id: Vec<usize>) -> Self {
        Self {
            id,
            handle: None,
            root: None,
            nodes: Vec::new(),
        }
    }

    /// Create a branch from an optional root and a node sequence.
    pub fn from_nodes<I>(root: Option<Node>, nodes: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        let mut b = Self::new();
        b.root = root;
        for n in nodes {
            b.push(n);
        }
        b
    }

    /// Path id of this branch.
    pub fn id(&self) -> &[usize] {
        &self.id
    }

    /// Path id joined with `-`, e.g. `1-2-1`.
    pub fn id_string(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.id.iter().enumerate() {
            if i > 0 {
                out.push('-');
            }
            let _ = write!(out, "{part}");
        }
        out
    }

    /// Centrifugal order: depth in the tree, `0` for the root branch.
    pub fn order(&self) -> usize {
        self.id.len().saturating_sub(1)
    }

    pub(crate) fn set_id(&mut self, id: Vec<usize>) {
        self.id = id;
    }

    /// Handle of this branch in its neurite.
    pub fn handle(&self) -> TreeResult<BranchId> {
        self.handle
            .ok_or(TreeError::UnboundReference(Reference::BranchNeurite))
    }

    pub(crate) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub(crate) fn bind_handle(&mut self, handle: Option<BranchId>) {
        self.handle = handle;
        for n in &mut self.nodes {
            n.set_branch(handle);
        }
    }

    /// Number of nodes (the root is not counted).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Same as [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// True if the branch holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stored nodes in order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Iterate the stored nodes.
    pub fn iter(&self) -> core::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// First node.
    pub fn first(&self) -> TreeResult<&Node> {
        self.nodes.first().ok_or(TreeError::EmptyAccess(Access::First))
    }

    /// Last node.
    pub fn last(&self) -> TreeResult<&Node> {
        self.nodes.last().ok_or(TreeError::EmptyAccess(Access::Last))
    }

    /// Root node.
    pub fn root(&self) -> TreeResult<&Node> {
        self.root.as_ref().ok_or(TreeError::EmptyAccess(Access::Root))
    }

    /// Whether a root node is set.
    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    /// Replace the root. The first node is re-bound to it.
    pub fn set_root(&mut self, root: Option<Node>) {
        self.root = root;
        self.rebind(0);
    }

    /// The last node if any, otherwise the root. This is what child branches are rooted at.
    pub fn tail(&self) -> Option<&Node> {
        self.nodes.last().or(self.root.as_ref())
    }

    /// Logical parent of the node at `index`: its predecessor, or the root for the first node.
    pub fn node_parent(&self, index: usize) -> TreeResult<&Node> {
        match index {
            i if i >= self.nodes.len() => Err(TreeError::PositionOutOfRange {
                index,
                len: self.nodes.len(),
            }),
            0 => self
                .root
                .as_ref()
                .ok_or(TreeError::UnboundReference(Reference::NodeParent)),
            i => Ok(&self.nodes[i - 1]),
        }
    }

    /// Root (if any) followed by every node position.
    pub fn polyline(&self) -> Vec<Point> {
        self.root
            .iter()
            .chain(&self.nodes)
            .map(Node::position)
            .collect()
    }

    /// Length of the polyline, including the segment from the root.
    pub fn length(&self) -> f64 {
        polyline_length(&self.polyline())
    }

    /// Append a node at the tail.
    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
        self.rebind(self.nodes.len() - 1);
    }

    /// Insert a copy of `node` before position `pos`.
    ///
    /// The node previously at `pos` gets a new predecessor, so its memoized
    /// values are dropped. `pos == len()` appends.
    pub fn insert(&mut self, pos: usize, node: Node) -> TreeResult<()> {
        self.insert_many(pos, [node])
    }

    /// Insert a sequence of nodes before position `pos`.
    pub fn insert_many<I>(&mut self, pos: usize, nodes: I) -> TreeResult<()>
    where
        I: IntoIterator<Item = Node>,
    {
        if pos > self.nodes.len() {
            return Err(TreeError::PositionOutOfRange {
                index: pos,
                len: self.nodes.len(),
            });
        }
        let before = self.nodes.len();
        let _ = self.nodes.splice(pos..pos, nodes);
        let inserted = self.nodes.len() - before;
        for i in pos..=pos + inserted {
            self.rebind(i);
        }
        Ok(())
    }

    /// Remove the node at `pos`. Positions at or past the end are ignored.
    pub fn erase(&mut self, pos: usize) {
        self.erase_range(pos..pos.saturating_add(1));
    }

    /// Remove the nodes in `range` (clamped to the branch).
    ///
    /// The node after the range is re-bound to the node before it, or to the root.
    pub fn erase_range(&mut self, range: Range<usize>) {
        let end = range.end.min(self.nodes.len());
        if range.start >= end {
            return;
        }
        let _ = self.nodes.drain(range.start..end);
        self.rebind(range.start);
    }

    /// Split after the node at `pos`.
    ///
    /// The receiver keeps `[0, pos]`. The returned branch owns the nodes after
    /// `pos` and is rooted at a copy of the node at `pos`; its id is the
    /// receiver's id with `1` appended, since it is meant to become the
    /// receiver's sole child. Splitting at or past the end leaves the receiver
    /// untouched and returns an empty, rootless branch.
    ///
    /// The returned branch is detached; attach it with
    /// [`Neurite::split`](crate::Neurite::split) or
    /// [`Neurite::append_branch`](crate::Neurite::append_branch).
    pub fn split(&mut self, pos: usize) -> Self {
        let mut id = self.id.clone();
        id.push(1);
        let mut out = Self::with_id(id);
        if pos >= self.nodes.len() {
            return out;
        }
        out.root = Some(self.nodes[pos].clone());
        out.nodes = self.nodes.split_off(pos + 1);
        out.rebind_all();
        out
    }

    /// Ramer–Douglas–Peucker simplification over the root and the nodes.
    ///
    /// `eps >= 0` is an absolute distance. `eps < 0` is relative: the tolerance
    /// becomes `|eps|` times the mean radius of the root (or first node) and
    /// the last node. The root and the last node are always kept; branches with
    /// a single node are not touched.
    pub fn simplify(&mut self, eps: f64) {
        if self.nodes.len() < 2 {
            return;
        }
        let tolerance = if eps < 0.0 {
            let head = self.root.as_ref().unwrap_or(&self.nodes[0]).radius();
            let tail = self.nodes[self.nodes.len() - 1].radius();
            -eps * (head + tail) / 2.0
        } else {
            eps
        };

        let mask = simplify_mask(&self.polyline(), tolerance);
        let offset = usize::from(self.root.is_some());
        let before = self.nodes.len();
        let mut keep = mask[offset..].iter();
        self.nodes.retain(|_| keep.next().copied().unwrap_or(true));
        if self.nodes.len() != before {
            trace!(
                "[SIMPLIFY] {}: {} -> {} nodes",
                self.id_string(),
                before,
                self.nodes.len()
            );
            self.rebind_all();
        }
    }

    /// Drop nodes at the same position as their predecessor (the root included).
    ///
    /// Returns the number of nodes removed.
    pub fn remove_null_segments(&mut self) -> usize {
        let before = self.nodes.len();
        let mut prev = self.root.as_ref().map(Node::position);
        self.nodes.retain(|n| {
            let p = n.position();
            if prev == Some(p) {
                false
            } else {
                prev = Some(p);
                true
            }
        });
        let removed = before - self.nodes.len();
        if removed > 0 {
            self.rebind_all();
        }
        removed
    }

    /// Scale every node's offset from its original predecessor by `r`.
    ///
    /// Node `i` moves to `p[i - 1] + r * (p[i] - p[i - 1])`, with `p` the
    /// positions before the call and `p[-1]` the root. This is a radial scale
    /// about the previous node, not about the root, so scaling twice by `r`
    /// differs from scaling once by `r * r`. The root, or the first node of a
    /// rootless branch, stays fixed.
    pub fn scale(&mut self, r: f64) {
        let (mut prev, skip) = match (&self.root, self.nodes.first()) {
            (Some(root), _) => (root.position(), 0),
            (None, Some(first)) => (first.position(), 1),
            (None, None) => return,
        };
        for n in self.nodes.iter_mut().skip(skip) {
            let old = n.position();
            n.set_position(prev + (old - prev) * r);
            prev = old;
        }
    }

    /// Scale coordinates component-wise (root included).
    pub fn scale_axes(&mut self, factors: DVec3) {
        self.map_positions(|p| p * factors);
    }

    /// Translate every node and the root.
    pub fn translate(&mut self, offset: DVec3) {
        self.map_positions(|p| p + offset);
    }

    /// Rotate every node and the root about the origin.
    pub fn rotate(&mut self, rotation: DQuat) {
        self.map_positions(|p| rotation * p);
    }

    fn map_positions(&mut self, f: impl Fn(Point) -> Point) {
        if let Some(root) = self.root.as_mut() {
            root.set_position(f(root.position()));
        }
        for n in &mut self.nodes {
            n.set_position(f(n.position()));
        }
    }

    /// Discrete Fréchet distance between the root-plus-nodes polylines of two branches.
    pub fn discrete_frechet(&self, other: &Self) -> TreeResult<f64> {
        discrete_frechet(&self.polyline(), &other.polyline())
            .ok_or(TreeError::EmptyAccess(Access::First))
    }

    /// Minimum distance between the segments of two branches.
    ///
    /// Segments are consecutive node pairs, the root segment included. Segment
    /// pairs sharing an endpoint (by node id) are skipped. Unless
    /// `ignore_radius` is set, half the sum of the four endpoint radii is
    /// subtracted from each segment distance, flooring at `0`.
    ///
    /// Returns `f64::INFINITY` when there is no comparable segment pair.
    pub fn distance(&self, other: &Self, ignore_radius: bool) -> f64 {
        let ours = self.segments();
        let theirs = other.segments();
        let mut best = f64::INFINITY;
        for (a0, a1) in &ours {
            for (b0, b1) in &theirs {
                if a0 == b0 || a0 == b1 || a1 == b0 || a1 == b1 {
                    continue;
                }
                let mut d = segment_segment_distance(
                    a0.position(),
                    a1.position(),
                    b0.position(),
                    b1.position(),
                );
                if !ignore_radius {
                    let radii = a0.radius() + a1.radius() + b0.radius() + b1.radius();
                    d = (d - radii / 2.0).max(0.0);
                }
                best = best.min(d);
            }
        }
        best
    }

    fn segments(&self) -> Vec<(&Node, &Node)> {
        let seq: Vec<&Node> = self.root.iter().chain(&self.nodes).collect();
        seq.windows(2).map(|w| (w[0], w[1])).collect()
    }

    fn rebind(&mut self, index: usize) {
        let parent = match index {
            0 => self.root.as_ref().map(Node::id),
            i if i <= self.nodes.len() => Some(self.nodes[i - 1].id()),
            _ => None,
        };
        let handle = self.handle;
        if let Some(n) = self.nodes.get_mut(index) {
            n.bind(parent, handle);
        }
    }

    fn rebind_all(&mut self) {
        for i in 0..self.nodes.len() {
            self.rebind(i);
        }
    }
}

impl<'a> IntoIterator for &'a Branch {
    type Item = &'a Node;
    type IntoIter = core::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
