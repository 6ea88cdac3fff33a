// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core neurite implementation: branch arena, structural edits, lookups.

use arbor_geometry::DQuat;
use glam::DVec3;
use log::{debug, trace};

use crate::branch::Branch;
use crate::error::{TreeError, TreeResult};
use crate::node::Node;
use crate::types::{BranchId, NeuriteKind, NodePos, next_tree_tag};

/// One neural process (axon, dendrite, ...) as a rooted tree of [`Branch`]es.
///
/// Branches live in a slot arena and are addressed by generational
/// [`BranchId`] handles. Tree edges are bifurcations: a branch with `k`
/// children is where the process splits into `k` sub-processes.
///
/// After every public structural edit, each non-root branch has a live parent,
/// its order is the parent's order plus one, and its id is the parent's id
/// with its 1-based sibling index appended.
pub struct Neurite {
    id: i64,
    kind: NeuriteKind,
    root_is_soma: bool,
    tag: u32,
    slots: Vec<Option<Slot>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    root: Option<BranchId>,
}

#[derive(Clone, Debug)]
pub(crate) struct Slot {
    generation: u32,
    pub(crate) parent: Option<BranchId>,
    pub(crate) children: Vec<BranchId>,
    pub(crate) branch: Branch,
}

impl core::fmt::Debug for Neurite {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.slots.len();
        let alive = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Neurite")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("root_is_soma", &self.root_is_soma)
            .field("branches_total", &total)
            .field("branches_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Default for Neurite {
    fn default() -> Self {
        Self::new(0, NeuriteKind::Undefined)
    }
}

/// Cloning re-tags the copy, so handles from the original are foreign to it.
impl Clone for Neurite {
    fn clone(&self) -> Self {
        let tag = next_tree_tag();
        let retag = |b: BranchId| b.retag(tag);
        let slots = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.as_ref().map(|s| {
                    let mut s = s.clone();
                    s.parent = s.parent.map(retag);
                    for c in &mut s.children {
                        *c = retag(*c);
                    }
                    let handle = s.branch.handle().ok().map(retag);
                    debug_assert_eq!(handle.map(BranchId::idx), Some(i));
                    s.branch.bind_handle(handle);
                    s
                })
            })
            .collect();
        Self {
            id: self.id,
            kind: self.kind,
            root_is_soma: self.root_is_soma,
            tag,
            slots,
            generations: self.generations.clone(),
            free_list: self.free_list.clone(),
            root: self.root.map(retag),
        }
    }
}

impl Neurite {
    /// Create an empty, unrooted neurite.
    pub fn new(id: i64, kind: NeuriteKind) -> Self {
        Self {
            id,
            kind,
            root_is_soma: false,
            tag: next_tree_tag(),
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: None,
        }
    }

    /// Neurite identifier.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Change the identifier.
    pub fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    /// Kind of process.
    pub fn kind(&self) -> NeuriteKind {
        self.kind
    }

    /// Change the kind.
    pub fn set_kind(&mut self, kind: NeuriteKind) {
        self.kind = kind;
    }

    /// Whether the root branch was anchored at an external (soma) node.
    pub fn root_is_soma(&self) -> bool {
        self.root_is_soma
    }

    /// Whether `set_root` has been called.
    pub fn is_rooted(&self) -> bool {
        self.root.is_some()
    }

    /// Handle of the root branch.
    pub fn root_branch(&self) -> TreeResult<BranchId> {
        self.root.ok_or(TreeError::Unrooted)
    }

    /// (Re)initialize the tree with an empty, rootless root branch.
    ///
    /// Any existing branches are dropped and their handles become stale.
    pub fn set_root(&mut self) -> BranchId {
        self.reset_root(None)
    }

    /// (Re)initialize the tree with an empty root branch anchored at `anchor`
    /// (typically a soma node).
    pub fn set_root_with(&mut self, anchor: Node) -> BranchId {
        self.reset_root(Some(anchor))
    }

    fn reset_root(&mut self, anchor: Option<Node>) -> BranchId {
        for i in 0..self.slots.len() {
            if self.slots[i].take().is_some() {
                self.free_list.push(i);
            }
        }
        self.root_is_soma = anchor.is_some();
        let mut branch = Branch::new();
        branch.set_root(anchor);
        let id = self.alloc(branch, None);
        self.root = Some(id);
        debug!(
            "[ROOT] neurite {}: root branch set (soma anchored: {})",
            self.id, self.root_is_soma
        );
        id
    }

    /// Borrow a branch.
    pub fn branch(&self, id: BranchId) -> TreeResult<&Branch> {
        Ok(&self.slot(id)?.branch)
    }

    /// Borrow a branch mutably.
    ///
    /// Node edits made through this reference do not touch other branches.
    /// Moving the last node leaves child roots stale until
    /// [`reassign_branch_roots`](Self::reassign_branch_roots) is called.
    pub fn branch_mut(&mut self, id: BranchId) -> TreeResult<&mut Branch> {
        Ok(&mut self.slot_mut(id)?.branch)
    }

    /// Tree parent of a branch (`None` for the root branch).
    pub fn parent_of(&self, id: BranchId) -> TreeResult<Option<BranchId>> {
        Ok(self.slot(id)?.parent)
    }

    /// Number of live branches.
    pub fn branch_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Number of nodes over all branches (roots not counted).
    pub fn node_count(&self) -> usize {
        self.slots.iter().flatten().map(|s| s.branch.len()).sum()
    }

    /// Largest centrifugal order in the tree, `None` if unrooted.
    pub fn max_order(&self) -> Option<usize> {
        self.slots.iter().flatten().map(|s| s.branch.order()).max()
    }

    /// Borrow the node at `pos`.
    pub fn node(&self, pos: NodePos) -> TreeResult<&Node> {
        let b = self.branch(pos.branch)?;
        b.get(pos.index).ok_or(TreeError::PositionOutOfRange {
            index: pos.index,
            len: b.len(),
        })
    }

    /// Logical parent of the node at `pos`: its predecessor or its branch root.
    pub fn node_parent(&self, pos: NodePos) -> TreeResult<&Node> {
        self.branch(pos.branch)?.node_parent(pos.index)
    }

    /// Distance from the node at `pos` to its logical parent (memoized on the node).
    pub fn node_length(&self, pos: NodePos) -> TreeResult<f64> {
        let parent = self.node_parent(pos)?;
        Ok(self.node(pos)?.length(parent))
    }

    /// Local basis of the node at `pos` relative to its logical parent (memoized on the node).
    pub fn node_basis(&self, pos: NodePos, up: DVec3) -> TreeResult<[DVec3; 3]> {
        let parent = self.node_parent(pos)?;
        Ok(self.node(pos)?.local_basis(parent, up))
    }

    /// Locate a node by id.
    pub fn find_node(&self, node_id: i64) -> TreeResult<NodePos> {
        let root = self.root_branch()?;
        for id in self.preorder(root) {
            let Some(slot) = self.slot_ref(id) else {
                continue;
            };
            if let Some(index) = slot.branch.iter().position(|n| n.id() == node_id) {
                return Ok(NodePos::new(id, index));
            }
        }
        Err(TreeError::NodeNotFound(node_id))
    }

    /// Insert `node` as the logical child of the node at `at`.
    ///
    /// - An empty target branch simply receives the node.
    /// - If `at` is not the last node of its branch, the branch is first split
    ///   after it (see [`split`](Self::split)), so the insertion point becomes a tail.
    /// - A tail without tree-children is extended.
    /// - A tail that already bifurcates gets a new child branch rooted at it.
    ///
    /// Returns the position of the inserted node.
    pub fn insert_node(&mut self, at: NodePos, node: Node) -> TreeResult<NodePos> {
        let len = self.branch(at.branch)?.len();
        if len == 0 {
            self.slot_mut(at.branch)?.branch.push(node);
            return Ok(NodePos::new(at.branch, 0));
        }
        if at.index >= len {
            return Err(TreeError::PositionOutOfRange {
                index: at.index,
                len,
            });
        }
        if at.index + 1 < len {
            let _ = self.split(at)?;
        }

        let slot = self.slot_mut(at.branch)?;
        if slot.children.is_empty() {
            slot.branch.push(node);
            trace!("[INSERT] extended branch {}", slot.branch.id_string());
            return Ok(NodePos::new(at.branch, at.index + 1));
        }

        let mut id = slot.branch.id().to_vec();
        id.push(slot.children.len() + 1);
        let mut child = Branch::with_id(id);
        child.set_root(slot.branch.tail().cloned());
        child.push(node);
        trace!("[INSERT] new branch {}", child.id_string());
        let child = self.alloc(child, Some(at.branch));
        Ok(NodePos::new(child, 0))
    }

    /// Insert the very first node of the tree.
    ///
    /// Roots an unrooted tree with [`set_root`](Self::set_root) first. Reports
    /// [`TreeError::RootOccupied`] if the root branch already holds nodes.
    pub fn insert_root_node(&mut self, node: Node) -> TreeResult<NodePos> {
        let root = match self.root {
            Some(root) => root,
            None => self.set_root(),
        };
        let branch = &mut self.slot_mut(root)?.branch;
        if !branch.is_empty() {
            return Err(TreeError::RootOccupied);
        }
        branch.push(node);
        Ok(NodePos::new(root, 0))
    }

    /// Insert `node` as the logical child of the node with id `parent_id`.
    ///
    /// `parent_id == -1` inserts the first node of an empty tree (see
    /// [`insert_root_node`](Self::insert_root_node)).
    pub fn insert_node_by_parent_id(&mut self, parent_id: i64, node: Node) -> TreeResult<NodePos> {
        if parent_id == -1 {
            return self.insert_root_node(node);
        }
        let at = self.find_node(parent_id)?;
        self.insert_node(at, node)
    }

    /// Split the branch after the node at `at`.
    ///
    /// The nodes after `at` move to a new branch rooted at `at`, which becomes
    /// the sole child of the shortened branch and adopts all of its previous
    /// children. Returns the handle of the new branch.
    ///
    /// `at` must have a successor: splitting at the last node would attach an
    /// empty child, so it reports [`TreeError::PositionOutOfRange`] like an
    /// index past the end.
    pub fn split(&mut self, at: NodePos) -> TreeResult<BranchId> {
        let slot = self.slot_mut(at.branch)?;
        if at.index + 1 >= slot.branch.len() {
            return Err(TreeError::PositionOutOfRange {
                index: at.index,
                len: slot.branch.len(),
            });
        }
        let tail = slot.branch.split(at.index);
        let adopted = core::mem::take(&mut slot.children);
        debug!(
            "[SPLIT] branch {} at node {}: {} nodes moved, {} children adopted",
            slot.branch.id_string(),
            at.index,
            tail.len(),
            adopted.len()
        );
        let new = self.alloc(tail, Some(at.branch));
        for c in &adopted {
            self.slot_mut(*c)?.parent = Some(new);
        }
        self.slot_mut(new)?.children = adopted;
        self.reassign_subtree_ids(new)?;
        Ok(new)
    }

    /// Attach a pre-built branch as the last child of `parent`.
    ///
    /// The branch gets its id and order from its new position. A branch
    /// without a root is rooted at the parent's tail.
    pub fn append_branch(&mut self, parent: BranchId, mut branch: Branch) -> TreeResult<BranchId> {
        let slot = self.slot(parent)?;
        let mut id = slot.branch.id().to_vec();
        id.push(slot.children.len() + 1);
        if !branch.has_root() {
            branch.set_root(slot.branch.tail().cloned());
        }
        branch.set_id(id);
        Ok(self.alloc(branch, Some(parent)))
    }

    /// Normalize the tree after insertion: merge every single-child chain.
    ///
    /// Returns whether anything changed. Ids and orders are re-derived when it did.
    pub fn correct(&mut self) -> TreeResult<bool> {
        self.collapse_single_branches()
    }

    /// Merge every branch that has exactly one tree-child with that child.
    ///
    /// The child's nodes are appended to the parent and the child's children
    /// are adopted by the parent. Chains collapse completely in one call.
    /// Returns whether any merge happened.
    pub fn collapse_single_branches(&mut self) -> TreeResult<bool> {
        let root = self.root_branch()?;
        let mut merged = 0_usize;
        for id in self.preorder(root) {
            if !self.is_alive(id) {
                continue;
            }
            while let [only] = self.slot(id)?.children[..] {
                self.merge_child(id, only)?;
                merged += 1;
            }
        }
        if merged > 0 {
            self.reassign_branch_ids()?;
            debug!("[CORRECT] neurite {}: merged {} branches", self.id, merged);
        }
        Ok(merged > 0)
    }

    fn merge_child(&mut self, parent: BranchId, child: BranchId) -> TreeResult<()> {
        let removed = self.free(child)?;
        for c in &removed.children {
            self.slot_mut(*c)?.parent = Some(parent);
        }
        let slot = self.slot_mut(parent)?;
        slot.children = removed.children;
        let at = slot.branch.len();
        slot.branch.insert_many(at, removed.branch.into_nodes())
    }

    /// Remove every non-root branch with no nodes; its children move up to its parent.
    ///
    /// Adopted children take the removed branch's place among their new
    /// siblings. Returns whether anything changed. Ids and orders are
    /// re-derived when it did.
    pub fn remove_empty_branches(&mut self) -> TreeResult<bool> {
        let root = self.root_branch()?;
        let mut removed = 0_usize;
        for id in self.preorder(root) {
            if id == root || !self.is_alive(id) || !self.branch(id)?.is_empty() {
                continue;
            }
            let Some(parent) = self.slot(id)?.parent else {
                continue;
            };
            let siblings = &self.slot(parent)?.children;
            let at = siblings.iter().position(|c| *c == id).unwrap_or(siblings.len());
            let gone = self.free(id)?;
            for c in &gone.children {
                self.slot_mut(*c)?.parent = Some(parent);
            }
            let siblings = &mut self.slot_mut(parent)?.children;
            let _ = siblings.splice(at..at, gone.children);
            removed += 1;
        }
        if removed > 0 {
            self.reassign_branch_ids()?;
            debug!("[PRUNE] neurite {}: removed {} empty branches", self.id, removed);
        }
        Ok(removed > 0)
    }

    /// Re-derive every branch id and order from the tree structure.
    ///
    /// The root branch is `[1]`; every child is its parent's id plus its
    /// 1-based sibling position.
    pub fn reassign_branch_ids(&mut self) -> TreeResult<()> {
        let root = self.root_branch()?;
        self.slot_mut(root)?.branch.set_id(vec![1]);
        self.reassign_subtree_ids(root)
    }

    fn reassign_subtree_ids(&mut self, top: BranchId) -> TreeResult<()> {
        let mut stack = vec![top];
        while let Some(id) = stack.pop() {
            let slot = self.slot(id)?;
            let base = slot.branch.id().to_vec();
            let children = slot.children.clone();
            for (k, c) in children.iter().enumerate() {
                let mut cid = base.clone();
                cid.push(k + 1);
                self.slot_mut(*c)?.branch.set_id(cid);
            }
            stack.extend(children);
        }
        Ok(())
    }

    /// Set every child branch's root to a copy of its parent's current tail.
    ///
    /// The tail is the parent's last node, or the parent's own root when the
    /// parent holds no nodes.
    pub fn reassign_branch_roots(&mut self) -> TreeResult<()> {
        let root = self.root_branch()?;
        for id in self.preorder(root) {
            self.sync_children_roots(id)?;
        }
        Ok(())
    }

    fn sync_children_roots(&mut self, id: BranchId) -> TreeResult<()> {
        let slot = self.slot(id)?;
        let tail = slot.branch.tail().cloned();
        let children = slot.children.clone();
        for c in children {
            self.slot_mut(c)?.branch.set_root(tail.clone());
        }
        Ok(())
    }

    /// Translate every node (roots included). Child roots stay consistent.
    pub fn translate(&mut self, offset: DVec3) -> TreeResult<()> {
        self.for_each_branch(|b| b.translate(offset));
        self.reassign_branch_roots()
    }

    /// Rotate every node about the origin. Child roots stay consistent.
    pub fn rotate(&mut self, rotation: DQuat) -> TreeResult<()> {
        self.for_each_branch(|b| b.rotate(rotation));
        self.reassign_branch_roots()
    }

    /// Scale coordinates component-wise. Child roots stay consistent.
    pub fn scale_axes(&mut self, factors: DVec3) -> TreeResult<()> {
        self.for_each_branch(|b| b.scale_axes(factors));
        self.reassign_branch_roots()
    }

    /// Scale every node's offset from its predecessor by `r` (see [`Branch::scale`]), top-down.
    ///
    /// Each branch is scaled about its own previous nodes, starting from its
    /// current root, and is then translated onto its parent's already scaled
    /// tail. The root branch's anchor stays fixed.
    pub fn scale(&mut self, r: f64) -> TreeResult<()> {
        let root = self.root_branch()?;
        for id in self.preorder(root) {
            let anchor = match self.slot(id)?.parent {
                Some(p) => self.branch(p)?.tail().map(Node::position),
                None => None,
            };
            let branch = &mut self.slot_mut(id)?.branch;
            branch.scale(r);
            if let (Some(anchor), Ok(old)) = (anchor, branch.root().map(Node::position)) {
                branch.translate(anchor - old);
            }
        }
        self.reassign_branch_roots()
    }

    /// Simplify every branch (see [`Branch::simplify`]).
    ///
    /// Last nodes are preserved, so child roots stay consistent.
    pub fn simplify(&mut self, eps: f64) {
        self.for_each_branch(|b| b.simplify(eps));
    }

    /// Drop null segments in every branch, then re-synchronize child roots.
    ///
    /// Returns the number of nodes removed.
    pub fn remove_null_segments(&mut self) -> TreeResult<usize> {
        let mut removed = 0;
        self.for_each_branch(|b| removed += b.remove_null_segments());
        self.reassign_branch_roots()?;
        Ok(removed)
    }

    fn for_each_branch(&mut self, mut f: impl FnMut(&mut Branch)) {
        for slot in self.slots.iter_mut().flatten() {
            f(&mut slot.branch);
        }
    }

    // --- internals ---

    /// Returns true if `id` refers to a live branch of this neurite.
    pub fn is_alive(&self, id: BranchId) -> bool {
        self.slot_ref(id).is_some()
    }

    pub(crate) fn slot_ref(&self, id: BranchId) -> Option<&Slot> {
        if id.tree() != self.tag {
            return None;
        }
        self.slots
            .get(id.idx())
            .and_then(|s| s.as_ref())
            .filter(|s| s.generation == id.generation())
    }

    pub(crate) fn slot(&self, id: BranchId) -> TreeResult<&Slot> {
        if id.tree() != self.tag {
            return Err(TreeError::ForeignBranch(id));
        }
        self.slot_ref(id).ok_or(TreeError::BranchNotFound(id))
    }

    fn slot_mut(&mut self, id: BranchId) -> TreeResult<&mut Slot> {
        if id.tree() != self.tag {
            return Err(TreeError::ForeignBranch(id));
        }
        self.slots
            .get_mut(id.idx())
            .and_then(|s| s.as_mut())
            .filter(|s| s.generation == id.generation())
            .ok_or(TreeError::BranchNotFound(id))
    }

    /// Pre-order list of the subtree under `top` (inclusive).
    pub(crate) fn preorder(&self, top: BranchId) -> Vec<BranchId> {
        let mut out = Vec::new();
        let mut stack = vec![top];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slot_ref(id) else {
                continue;
            };
            out.push(id);
            stack.extend(slot.children.iter().rev().copied());
        }
        out
    }

    fn alloc(&mut self, mut branch: Branch, parent: Option<BranchId>) -> BranchId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.slots.push(None);
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "BranchId uses 32-bit indices by design."
        )]
        let id = BranchId::new(self.tag, idx as u32, generation);
        branch.bind_handle(Some(id));
        self.slots[idx] = Some(Slot {
            generation,
            parent,
            children: Vec::new(),
            branch,
        });
        if let Some(p) = parent
            && let Some(Some(ps)) = self.slots.get_mut(p.idx())
        {
            ps.children.push(id);
        }
        id
    }

    /// Detach `id` from its parent and free its slot, returning the slot contents.
    fn free(&mut self, id: BranchId) -> TreeResult<Slot> {
        let parent = self.slot(id)?.parent;
        if let Some(p) = parent {
            self.slot_mut(p)?.children.retain(|c| *c != id);
        }
        let slot = self.slots[id.idx()]
            .take()
            .ok_or(TreeError::BranchNotFound(id))?;
        self.free_list.push(id.idx());
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_geometry::Point;

    fn node(id: i64, x: f64, y: f64, z: f64) -> Node {
        Node::from_xyz(id, x, y, z, 1.0)
    }

    fn ids(b: &Branch) -> Vec<i64> {
        b.iter().map(Node::id).collect()
    }

    /// Single-branch neurite holding `A, B, C` (ids 1, 2, 3).
    fn abc() -> Neurite {
        let mut n = Neurite::new(1, NeuriteKind::Dendrite);
        n.insert_node_by_parent_id(-1, node(1, 0.0, 0.0, 0.0)).unwrap();
        n.insert_node_by_parent_id(1, node(2, 1.0, 0.0, 0.0)).unwrap();
        n.insert_node_by_parent_id(2, node(3, 2.0, 0.0, 0.0)).unwrap();
        n
    }

    fn check_ids(n: &Neurite) {
        let root = n.root_branch().unwrap();
        assert_eq!(n.branch(root).unwrap().id(), &[1]);
        for id in n.preorder(root) {
            let slot = n.slot(id).unwrap();
            assert_eq!(slot.branch.order(), slot.branch.id().len() - 1);
            for (k, c) in slot.children.iter().enumerate() {
                let child = n.slot(*c).unwrap();
                assert_eq!(child.parent, Some(id));
                let mut expected = slot.branch.id().to_vec();
                expected.push(k + 1);
                assert_eq!(child.branch.id(), &expected[..]);
                assert_eq!(child.branch.order(), slot.branch.order() + 1);
            }
        }
    }

    #[test]
    fn unrooted_operations_report() {
        let mut n = Neurite::new(1, NeuriteKind::Axon);
        assert_eq!(n.root_branch(), Err(TreeError::Unrooted));
        assert_eq!(n.find_node(1), Err(TreeError::Unrooted));
        assert_eq!(n.correct(), Err(TreeError::Unrooted));
        assert_eq!(n.remove_empty_branches(), Err(TreeError::Unrooted));
        assert_eq!(n.reassign_branch_ids(), Err(TreeError::Unrooted));
        assert_eq!(n.reassign_branch_roots(), Err(TreeError::Unrooted));
        assert_eq!(
            n.insert_node_by_parent_id(4, node(5, 0.0, 0.0, 0.0)),
            Err(TreeError::Unrooted)
        );
        assert_eq!(n.max_order(), None);
    }

    #[test]
    fn first_insert_roots_the_tree() {
        let n = abc();
        assert!(n.is_rooted());
        assert!(!n.root_is_soma());
        assert_eq!(n.branch_count(), 1);
        let root = n.root_branch().unwrap();
        assert_eq!(ids(n.branch(root).unwrap()), vec![1, 2, 3]);
        assert_eq!(n.node(NodePos::new(root, 2)).unwrap().branch(), Ok(root));
    }

    #[test]
    fn second_first_node_is_rejected() {
        let mut n = abc();
        assert_eq!(
            n.insert_node_by_parent_id(-1, node(9, 0.0, 0.0, 0.0)),
            Err(TreeError::RootOccupied)
        );
        assert_eq!(
            n.insert_node_by_parent_id(42, node(9, 0.0, 0.0, 0.0)),
            Err(TreeError::NodeNotFound(42))
        );
    }

    #[test]
    fn insert_in_the_middle_splits() {
        let mut n = abc();
        let d = n
            .insert_node_by_parent_id(2, node(4, 1.0, 1.0, 0.0))
            .unwrap();
        assert_eq!(n.branch_count(), 3);

        let root = n.root_branch().unwrap();
        assert_eq!(ids(n.branch(root).unwrap()), vec![1, 2]);
        let children = n.slot(root).unwrap().children.clone();
        assert_eq!(children.len(), 2);

        let c_branch = n.branch(children[0]).unwrap();
        let d_branch = n.branch(children[1]).unwrap();
        assert_eq!(ids(c_branch), vec![3]);
        assert_eq!(ids(d_branch), vec![4]);
        assert_eq!(c_branch.root().map(Node::id), Ok(2));
        assert_eq!(d_branch.root().map(Node::id), Ok(2));
        assert_eq!(c_branch.id(), &[1, 1]);
        assert_eq!(d_branch.id(), &[1, 2]);
        assert_eq!(d, NodePos::new(children[1], 0));
        assert_eq!(n.node(d).unwrap().parent_id(), Ok(2));
        check_ids(&n);
    }

    #[test]
    fn insert_at_bifurcating_tail_adds_sibling() {
        let mut n = abc();
        n.insert_node_by_parent_id(2, node(4, 1.0, 1.0, 0.0)).unwrap();
        let e = n
            .insert_node_by_parent_id(2, node(5, 1.0, -1.0, 0.0))
            .unwrap();
        let root = n.root_branch().unwrap();
        assert_eq!(n.slot(root).unwrap().children.len(), 3);
        assert_eq!(n.branch(e.branch).unwrap().id(), &[1, 3]);

        // Extending a leaf does not create branches.
        let f = n
            .insert_node_by_parent_id(5, node(6, 1.0, -2.0, 0.0))
            .unwrap();
        assert_eq!(f, NodePos::new(e.branch, 1));
        assert_eq!(n.branch_count(), 4);
        assert_eq!(n.node_count(), 6);
        check_ids(&n);
    }

    #[test]
    fn insert_into_empty_soma_rooted_branch() {
        let mut n = Neurite::new(2, NeuriteKind::Apical);
        let root = n.set_root_with(node(0, 0.0, 0.0, 0.0));
        assert!(n.root_is_soma());
        let p = n
            .insert_node(NodePos::new(root, 0), node(1, 0.0, 0.0, 1.0))
            .unwrap();
        assert_eq!(p, NodePos::new(root, 0));
        assert_eq!(n.node(p).unwrap().parent_id(), Ok(0));
        assert_eq!(n.node_length(p), Ok(1.0));
        let basis = n.node_basis(p, DVec3::Y).unwrap();
        assert_eq!(basis[0], DVec3::Z);
    }

    #[test]
    fn insert_node_rejects_bad_positions() {
        let mut n = abc();
        let root = n.root_branch().unwrap();
        assert_eq!(
            n.insert_node(NodePos::new(root, 3), node(9, 0.0, 0.0, 0.0)),
            Err(TreeError::PositionOutOfRange { index: 3, len: 3 })
        );
        let other = abc();
        let foreign = other.root_branch().unwrap();
        assert_eq!(
            n.insert_node(NodePos::new(foreign, 0), node(9, 0.0, 0.0, 0.0)),
            Err(TreeError::ForeignBranch(foreign))
        );
    }

    #[test]
    fn split_adopts_children() {
        let mut n = abc();
        n.insert_node_by_parent_id(3, node(4, 3.0, 1.0, 0.0)).unwrap();
        n.insert_node_by_parent_id(3, node(5, 3.0, -1.0, 0.0)).unwrap();
        // 1,2,3 -> {1-1: 4, 1-2: 5}
        let root = n.root_branch().unwrap();
        let new = n.split(NodePos::new(root, 0)).unwrap();
        assert_eq!(ids(n.branch(root).unwrap()), vec![1]);
        assert_eq!(ids(n.branch(new).unwrap()), vec![2, 3]);
        assert_eq!(n.slot(root).unwrap().children, vec![new]);
        assert_eq!(n.slot(new).unwrap().children.len(), 2);
        assert_eq!(n.max_order(), Some(2));
        check_ids(&n);
    }

    #[test]
    fn split_needs_a_successor() {
        let mut n = abc();
        n.insert_node_by_parent_id(3, node(4, 3.0, 1.0, 0.0)).unwrap();
        n.insert_node_by_parent_id(3, node(5, 3.0, -1.0, 0.0)).unwrap();
        let root = n.root_branch().unwrap();
        let before = n.branch_count();
        for index in [2, 3] {
            assert_eq!(
                n.split(NodePos::new(root, index)),
                Err(TreeError::PositionOutOfRange { index, len: 3 })
            );
        }
        assert_eq!(n.branch_count(), before);
        assert_eq!(n.slot(root).unwrap().children.len(), 2);
        check_ids(&n);
    }

    #[test]
    fn stale_handles_after_reroot() {
        let mut n = abc();
        let old = n.root_branch().unwrap();
        let fresh = n.set_root();
        assert_ne!(old, fresh);
        assert_eq!(n.branch(old).unwrap_err(), TreeError::BranchNotFound(old));
        assert!(n.branch(fresh).unwrap().is_empty());
        assert_eq!(n.branch_count(), 1);
    }

    #[test]
    fn generations_saturate_instead_of_wrapping() {
        let mut n = abc();
        let root = n.root_branch().unwrap();
        n.generations[root.idx()] = u32::MAX - 1;
        let last = n.set_root();
        assert_eq!(last.generation(), u32::MAX);
        // Reusing the slot again must not overflow.
        let again = n.set_root();
        assert_eq!(again.idx(), root.idx());
        assert_eq!(again.generation(), u32::MAX);
        assert!(n.branch(again).is_ok());
    }

    #[test]
    fn correct_merges_single_child_chains() {
        let mut n = abc();
        let root = n.root_branch().unwrap();
        // Two consecutive splits give a 3-branch chain.
        let mid = n.split(NodePos::new(root, 0)).unwrap();
        let _ = n.split(NodePos::new(mid, 0)).unwrap();
        assert_eq!(n.branch_count(), 3);
        assert_eq!(n.max_order(), Some(2));

        assert_eq!(n.correct(), Ok(true));
        assert_eq!(n.branch_count(), 1);
        let root = n.root_branch().unwrap();
        assert_eq!(ids(n.branch(root).unwrap()), vec![1, 2, 3]);
        assert_eq!(n.branch(root).unwrap().nodes()[1].parent_id(), Ok(1));
        assert_eq!(n.branch(root).unwrap().nodes()[2].branch(), Ok(root));
        assert_eq!(n.collapse_single_branches(), Ok(false));
    }

    #[test]
    fn correct_keeps_bifurcations() {
        let mut n = abc();
        n.insert_node_by_parent_id(3, node(4, 3.0, 1.0, 0.0)).unwrap();
        n.insert_node_by_parent_id(4, node(5, 4.0, 1.0, 0.0)).unwrap();
        n.insert_node_by_parent_id(3, node(6, 3.0, -1.0, 0.0)).unwrap();
        let leaf = n.find_node(4).unwrap().branch;
        let _ = n.split(NodePos::new(leaf, 0)).unwrap();
        assert_eq!(n.branch_count(), 4);

        assert_eq!(n.correct(), Ok(true));
        assert_eq!(n.branch_count(), 3);
        let merged = n.find_node(5).unwrap();
        assert_eq!(merged.index, 1);
        assert_eq!(n.branch(merged.branch).unwrap().id(), &[1, 1]);
        check_ids(&n);
    }

    #[test]
    fn remove_empty_branches_reparents_children() {
        let mut n = abc();
        let root = n.root_branch().unwrap();
        let empty = n.append_branch(root, Branch::new()).unwrap();
        let _sibling = n
            .append_branch(root, Branch::from_nodes(None, [node(9, 9.0, 0.0, 0.0)]))
            .unwrap();
        let a = n
            .append_branch(empty, Branch::from_nodes(None, [node(10, 3.0, 1.0, 0.0)]))
            .unwrap();
        let b = n
            .append_branch(empty, Branch::from_nodes(None, [node(11, 3.0, -1.0, 0.0)]))
            .unwrap();
        assert_eq!(n.branch(a).unwrap().id(), &[1, 1, 1]);
        let before = n.branch_count();

        assert_eq!(n.remove_empty_branches(), Ok(true));
        assert_eq!(n.branch_count(), before - 1);
        assert_eq!(n.parent_of(a), Ok(Some(root)));
        assert_eq!(n.parent_of(b), Ok(Some(root)));
        assert!(!n.is_alive(empty));
        assert_eq!(n.branch(a).unwrap().id(), &[1, 1]);
        assert_eq!(n.branch(b).unwrap().id(), &[1, 2]);
        assert_eq!(n.slot(root).unwrap().children.len(), 3);
        check_ids(&n);
        assert_eq!(n.remove_empty_branches(), Ok(false));
    }

    #[test]
    fn empty_root_branch_survives_cleanup() {
        let mut n = Neurite::new(3, NeuriteKind::Axon);
        let _ = n.set_root_with(node(0, 0.0, 0.0, 0.0));
        assert_eq!(n.remove_empty_branches(), Ok(false));
        assert_eq!(n.branch_count(), 1);
    }

    #[test]
    fn append_branch_fills_root_from_parent_tail() {
        let mut n = abc();
        let root = n.root_branch().unwrap();
        let child = n
            .append_branch(root, Branch::from_nodes(None, [node(7, 2.0, 1.0, 0.0)]))
            .unwrap();
        let b = n.branch(child).unwrap();
        assert_eq!(b.root().map(Node::id), Ok(3));
        assert_eq!(b.nodes()[0].parent_id(), Ok(3));
        assert_eq!(b.nodes()[0].branch(), Ok(child));
        assert_eq!(b.order(), 1);
    }

    #[test]
    fn roots_follow_transforms() {
        let mut n = abc();
        n.insert_node_by_parent_id(3, node(4, 3.0, 1.0, 0.0)).unwrap();
        n.insert_node_by_parent_id(3, node(5, 3.0, -1.0, 0.0)).unwrap();
        let root = n.root_branch().unwrap();

        // Moving one branch by hand needs an explicit root refresh.
        let mut moved = n.clone();
        let moved_root = moved.root_branch().unwrap();
        moved
            .branch_mut(moved_root)
            .unwrap()
            .translate(DVec3::new(0.0, 0.0, 5.0));
        moved.reassign_branch_roots().unwrap();
        let tail = moved.branch(moved_root).unwrap().last().unwrap().position();
        for c in moved.slot(moved_root).unwrap().children.clone() {
            assert_eq!(moved.branch(c).unwrap().root().unwrap().position(), tail);
        }

        n.translate(DVec3::new(0.0, 0.0, 5.0)).unwrap();
        n.scale(2.0).unwrap();
        let tail = n.branch(root).unwrap().last().unwrap().position();
        // Root branch 0,1,2 on x: node 3 lands at node 2's old x plus 2.
        assert_eq!(tail, Point::new(3.0, 0.0, 5.0));
        let leaf = n.find_node(4).unwrap();
        assert_eq!(n.branch(leaf.branch).unwrap().root().unwrap().position(), tail);
        // (2,0,5) + 2 * (1,1,0), then moved by the parent tail's displacement (1,0,0).
        assert_eq!(n.node(leaf).unwrap().position(), Point::new(5.0, 2.0, 5.0));

        n.rotate(DQuat::from_rotation_z(core::f64::consts::PI)).unwrap();
        n.translate(DVec3::new(1.0, 0.0, 0.0)).unwrap();
        n.scale_axes(DVec3::splat(0.5)).unwrap();
        let tail = n.branch(root).unwrap().last().unwrap().position();
        assert_eq!(n.branch(leaf.branch).unwrap().root().unwrap().position(), tail);
    }

    #[test]
    fn clone_retags_handles() {
        let n = abc();
        let copy = n.clone();
        let root = n.root_branch().unwrap();
        let copy_root = copy.root_branch().unwrap();
        assert_ne!(root, copy_root);
        assert_eq!(copy.branch(root).unwrap_err(), TreeError::ForeignBranch(root));
        assert_eq!(copy.branch(copy_root).unwrap().nodes()[0].branch(), Ok(copy_root));
        assert_eq!(copy.find_node(3).unwrap().branch, copy_root);
    }

    #[test]
    fn null_segments_and_simplify_over_tree() {
        let mut n = abc();
        n.insert_node_by_parent_id(3, node(4, 2.0, 0.0, 0.0)).unwrap();
        n.insert_node_by_parent_id(4, node(5, 3.0, 0.0, 0.0)).unwrap();
        assert_eq!(n.remove_null_segments(), Ok(1));
        n.simplify(0.01);
        let root = n.root_branch().unwrap();
        assert_eq!(ids(n.branch(root).unwrap()), vec![1, 5]);
    }
}
