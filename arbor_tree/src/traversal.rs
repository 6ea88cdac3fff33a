// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only traversal of a [`Neurite`].
//!
//! Every iterator borrows the neurite, so structural edits cannot interleave
//! with a traversal. Branch iterators yield [`BranchRef`]s; the node iterator
//! yields [`NodeRef`]s and crosses branch boundaries in depth-first order.
//!
//! All iterators over an unrooted neurite are empty.

use alloc::vec::Vec;
use core::iter::FusedIterator;
use core::ops::Deref;

use crate::branch::Branch;
use crate::error::{TreeError, TreeResult};
use crate::neurite::{Neurite, Slot};
use crate::node::Node;
use crate::types::{BranchId, NodePos};

/// A borrowed branch together with its handle and tree links.
///
/// Dereferences to the [`Branch`].
#[derive(Clone, Copy)]
pub struct BranchRef<'a> {
    neurite: &'a Neurite,
    id: BranchId,
    slot: &'a Slot,
}

impl core::fmt::Debug for BranchRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BranchRef")
            .field("id", &self.slot.branch.id_string())
            .field("nodes", &self.slot.branch.len())
            .field("children", &self.slot.children.len())
            .finish_non_exhaustive()
    }
}

impl Deref for BranchRef<'_> {
    type Target = Branch;

    fn deref(&self) -> &Branch {
        &self.slot.branch
    }
}

impl<'a> BranchRef<'a> {
    fn resolve(neurite: &'a Neurite, id: BranchId) -> Option<Self> {
        neurite
            .slot_ref(id)
            .map(|slot| Self { neurite, id, slot })
    }

    /// Handle of this branch.
    pub fn handle(&self) -> BranchId {
        self.id
    }

    /// The borrowed branch, with the neurite's lifetime.
    pub fn branch(&self) -> &'a Branch {
        &self.slot.branch
    }

    /// Tree parent, `None` for the root branch.
    pub fn parent(&self) -> Option<Self> {
        self.slot
            .parent
            .and_then(|p| Self::resolve(self.neurite, p))
    }

    /// Direct tree-children in sibling order.
    pub fn children(&self) -> Branches<'a> {
        Branches::new(self.neurite, self.slot.children.clone())
    }

    /// Whether this branch has no tree-children (a terminal branch).
    pub fn is_leaf(&self) -> bool {
        self.slot.children.is_empty()
    }

    /// This branch and its ancestors up to the root branch.
    pub fn stem(&self) -> Stem<'a> {
        Stem {
            neurite: self.neurite,
            next: Some(self.id),
        }
    }

    /// Depth-first pre-order over the subtree rooted here (inclusive).
    pub fn subtree(&self) -> Branches<'a> {
        Branches::new(self.neurite, self.neurite.preorder(self.id))
    }
}

/// An iterator over a precomputed sequence of branches.
///
/// Returned by the depth-first, leaf, fixed-order and children traversals.
#[derive(Clone)]
pub struct Branches<'a> {
    neurite: &'a Neurite,
    ids: alloc::vec::IntoIter<BranchId>,
}

impl core::fmt::Debug for Branches<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Branches")
            .field("remaining", &self.ids.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Branches<'a> {
    fn new(neurite: &'a Neurite, ids: Vec<BranchId>) -> Self {
        Self {
            neurite,
            ids: ids.into_iter(),
        }
    }

    fn empty(neurite: &'a Neurite) -> Self {
        Self::new(neurite, Vec::new())
    }
}

impl<'a> Iterator for Branches<'a> {
    type Item = BranchRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids.next()?;
        BranchRef::resolve(self.neurite, id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl DoubleEndedIterator for Branches<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let id = self.ids.next_back()?;
        BranchRef::resolve(self.neurite, id)
    }
}

// Ids are only collected from the borrowed neurite, so every one resolves.
impl ExactSizeIterator for Branches<'_> {}
impl FusedIterator for Branches<'_> {}

/// Ascends from a branch to the root branch.
#[derive(Clone, Debug)]
pub struct Stem<'a> {
    neurite: &'a Neurite,
    next: Option<BranchId>,
}

impl<'a> Iterator for Stem<'a> {
    type Item = BranchRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = BranchRef::resolve(self.neurite, self.next?)?;
        self.next = current.slot.parent;
        Some(current)
    }
}

impl FusedIterator for Stem<'_> {}

/// A node reached by the flat node iterator, with its address.
///
/// Dereferences to the [`Node`].
#[derive(Clone, Copy, Debug)]
pub struct NodeRef<'a> {
    /// Where the node lives.
    pub pos: NodePos,
    /// The node itself.
    pub node: &'a Node,
}

impl Deref for NodeRef<'_> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

/// Flat, double-ended sequence over the nodes of a run of branches.
///
/// Branches are visited in depth-first pre-order and each branch's nodes in
/// order; branch roots are not visited (they duplicate the parent's tail).
#[derive(Clone)]
pub struct Nodes<'a> {
    branches: Vec<(BranchId, &'a Branch)>,
    // Flat index of the first node of each branch.
    starts: Vec<usize>,
    front: usize,
    back: usize,
}

impl core::fmt::Debug for Nodes<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Nodes")
            .field("branches", &self.branches.len())
            .field("remaining", &(self.back - self.front))
            .finish_non_exhaustive()
    }
}

impl<'a> Nodes<'a> {
    fn new(neurite: &'a Neurite, ids: &[BranchId]) -> Self {
        let branches: Vec<_> = ids
            .iter()
            .filter_map(|id| neurite.slot_ref(*id).map(|s| (*id, &s.branch)))
            .collect();
        let mut starts = Vec::with_capacity(branches.len());
        let mut total = 0;
        for (_, b) in &branches {
            starts.push(total);
            total += b.len();
        }
        Self {
            branches,
            starts,
            front: 0,
            back: total,
        }
    }

    fn at(&self, flat: usize) -> NodeRef<'a> {
        // Last branch starting at or before `flat`; empty branches share a
        // start with their successor, so this lands on the non-empty one.
        let b = self.starts.partition_point(|s| *s <= flat) - 1;
        let (id, branch) = self.branches[b];
        let index = flat - self.starts[b];
        NodeRef {
            pos: NodePos::new(id, index),
            node: &branch.nodes()[index],
        }
    }
}

impl<'a> Iterator for Nodes<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let item = self.at(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for Nodes<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.at(self.back))
    }
}

impl ExactSizeIterator for Nodes<'_> {}
impl FusedIterator for Nodes<'_> {}

impl Neurite {
    /// Borrow a branch with its tree links.
    pub fn get(&self, id: BranchId) -> TreeResult<BranchRef<'_>> {
        let _ = self.slot(id)?;
        BranchRef::resolve(self, id).ok_or(TreeError::BranchNotFound(id))
    }

    /// The root branch, if the neurite is rooted.
    pub fn root(&self) -> Option<BranchRef<'_>> {
        self.root_branch()
            .ok()
            .and_then(|id| BranchRef::resolve(self, id))
    }

    /// Depth-first pre-order over every branch.
    pub fn branches(&self) -> Branches<'_> {
        match self.root_branch() {
            Ok(root) => Branches::new(self, self.preorder(root)),
            Err(_) => Branches::empty(self),
        }
    }

    /// Depth-first pre-order over the subtree rooted at `top` (inclusive).
    pub fn subtree(&self, top: BranchId) -> TreeResult<Branches<'_>> {
        Ok(self.get(top)?.subtree())
    }

    /// Branches of centrifugal order exactly `order`, in depth-first order.
    pub fn at_order(&self, order: usize) -> Branches<'_> {
        match self.root_branch() {
            Ok(root) => Branches::new(self, self.collect_at_order(root, order)),
            Err(_) => Branches::empty(self),
        }
    }

    /// Branches of order exactly `order` within the subtree rooted at `top`.
    pub fn subtree_at_order(&self, top: BranchId, order: usize) -> TreeResult<Branches<'_>> {
        let _ = self.slot(top)?;
        Ok(Branches::new(self, self.collect_at_order(top, order)))
    }

    fn collect_at_order(&self, top: BranchId, order: usize) -> Vec<BranchId> {
        let mut out = Vec::new();
        let mut stack = vec![top];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slot_ref(id) else {
                continue;
            };
            let here = slot.branch.order();
            if here == order {
                out.push(id);
            } else if here < order {
                stack.extend(slot.children.iter().rev().copied());
            }
        }
        out
    }

    /// Terminal branches (no tree-children), in depth-first order.
    pub fn leaves(&self) -> Branches<'_> {
        match self.root_branch() {
            Ok(root) => Branches::new(self, self.collect_leaves(root)),
            Err(_) => Branches::empty(self),
        }
    }

    /// Terminal branches within the subtree rooted at `top`.
    pub fn subtree_leaves(&self, top: BranchId) -> TreeResult<Branches<'_>> {
        let _ = self.slot(top)?;
        Ok(Branches::new(self, self.collect_leaves(top)))
    }

    fn collect_leaves(&self, top: BranchId) -> Vec<BranchId> {
        self.preorder(top)
            .into_iter()
            .filter(|id| self.slot_ref(*id).is_some_and(|s| s.children.is_empty()))
            .collect()
    }

    /// `from` and its ancestors up to the root branch.
    pub fn stem(&self, from: BranchId) -> TreeResult<Stem<'_>> {
        Ok(self.get(from)?.stem())
    }

    /// Direct tree-children of `parent`.
    pub fn children(&self, parent: BranchId) -> TreeResult<Branches<'_>> {
        Ok(self.get(parent)?.children())
    }

    /// Every node of the neurite, branch after branch in depth-first order.
    pub fn nodes(&self) -> Nodes<'_> {
        let ids = match self.root_branch() {
            Ok(root) => self.preorder(root),
            Err(_) => Vec::new(),
        };
        Nodes::new(self, &ids)
    }

    /// Nodes of every branch in the subtree rooted at `top`.
    pub fn subtree_nodes(&self, top: BranchId) -> TreeResult<Nodes<'_>> {
        let _ = self.slot(top)?;
        Ok(Nodes::new(self, &self.preorder(top)))
    }

    /// Nodes of the depth-first branch range `[from, to)`.
    ///
    /// `to == None` runs to the end of the traversal. A `to` that does not come
    /// after `from` gives an empty range.
    pub fn nodes_between(&self, from: BranchId, to: Option<BranchId>) -> TreeResult<Nodes<'_>> {
        let _ = self.slot(from)?;
        if let Some(to) = to {
            let _ = self.slot(to)?;
        }
        let order = self.preorder(self.root_branch()?);
        let start = order
            .iter()
            .position(|id| *id == from)
            .ok_or(TreeError::BranchNotFound(from))?;
        let end = match to {
            Some(to) => order
                .iter()
                .position(|id| *id == to)
                .ok_or(TreeError::BranchNotFound(to))?
                .max(start),
            None => order.len(),
        };
        Ok(Nodes::new(self, &order[start..end]))
    }
}
