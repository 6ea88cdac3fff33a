// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the neurite tree: branch handles, node positions, neurite kinds, settings.

use core::sync::atomic::{AtomicU32, Ordering};

use glam::DVec3;

/// Identifier for a branch in a [`Neurite`](crate::Neurite).
///
/// This is a small, copyable handle that stays stable across edits but becomes
/// invalid when the underlying slot is reused.
/// It consists of the owning tree's tag, a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On removal (a merge, an empty-branch cleanup, or re-rooting), the slot is
///   freed; any existing `BranchId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `BranchId`.
/// - Generations saturate at `u32::MAX`. Once a slot has been reused that many
///   times, a stale handle to it may compare equal to the live one; behavior
///   after saturation is unspecified.
///
/// ### Ownership
///
/// Every neurite has a process-unique tag, and handles carry it. Passing a handle
/// to a neurite that did not issue it reports
/// [`TreeError::ForeignBranch`](crate::TreeError::ForeignBranch); a stale handle reports
/// [`TreeError::BranchNotFound`](crate::TreeError::BranchNotFound).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BranchId {
    tree: u32,
    idx: u32,
    generation: u32,
}

impl BranchId {
    pub(crate) const fn new(tree: u32, idx: u32, generation: u32) -> Self {
        Self {
            tree,
            idx,
            generation,
        }
    }

    pub(crate) const fn idx(self) -> usize {
        self.idx as usize
    }

    pub(crate) const fn tree(self) -> u32 {
        self.tree
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }

    /// The same slot and generation under another tree's tag.
    pub(crate) const fn retag(self, tree: u32) -> Self {
        Self { tree, ..self }
    }
}

static NEXT_TREE_TAG: AtomicU32 = AtomicU32::new(1);

/// Allocate a tag for a new branch arena.
pub(crate) fn next_tree_tag() -> u32 {
    NEXT_TREE_TAG.fetch_add(1, Ordering::Relaxed)
}

/// Address of a node inside a neurite: a branch handle plus a node index within it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodePos {
    /// Branch holding the node.
    pub branch: BranchId,
    /// Index of the node within the branch (the branch root is not counted).
    pub index: usize,
}

impl NodePos {
    /// Create a position from a branch handle and node index.
    pub const fn new(branch: BranchId, index: usize) -> Self {
        Self { branch, index }
    }
}

/// Kind of neural process a neurite represents.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeuriteKind {
    /// Not classified.
    #[default]
    Undefined,
    /// Soma contour or soma-like process.
    Soma,
    /// Axon.
    Axon,
    /// Basal dendrite.
    Dendrite,
    /// Apical dendrite.
    Apical,
    /// Anything else (e.g. custom tracing labels).
    Other,
}

impl NeuriteKind {
    /// True for [`NeuriteKind::Axon`].
    pub const fn is_axon(self) -> bool {
        matches!(self, Self::Axon)
    }

    /// True for [`NeuriteKind::Dendrite`].
    pub const fn is_dendrite(self) -> bool {
        matches!(self, Self::Dendrite)
    }

    /// True for [`NeuriteKind::Apical`].
    pub const fn is_apical(self) -> bool {
        matches!(self, Self::Apical)
    }

    /// True for [`NeuriteKind::Soma`].
    pub const fn is_soma(self) -> bool {
        matches!(self, Self::Soma)
    }

    /// The single-kind set for this kind.
    pub const fn as_set(self) -> NeuriteKinds {
        match self {
            Self::Undefined => NeuriteKinds::UNDEFINED,
            Self::Soma => NeuriteKinds::SOMA,
            Self::Axon => NeuriteKinds::AXON,
            Self::Dendrite => NeuriteKinds::DENDRITE,
            Self::Apical => NeuriteKinds::APICAL,
            Self::Other => NeuriteKinds::OTHER,
        }
    }
}

bitflags::bitflags! {
    /// A set of [`NeuriteKind`]s, used to select neurites from a [`Neuron`](crate::Neuron).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct NeuriteKinds: u8 {
        /// Unclassified neurites.
        const UNDEFINED = 0b0000_0001;
        /// Soma processes.
        const SOMA      = 0b0000_0010;
        /// Axons.
        const AXON      = 0b0000_0100;
        /// Basal dendrites.
        const DENDRITE  = 0b0000_1000;
        /// Apical dendrites.
        const APICAL    = 0b0001_0000;
        /// Other processes.
        const OTHER     = 0b0010_0000;
        /// Basal and apical dendrites.
        const ANY_DENDRITE = Self::DENDRITE.bits() | Self::APICAL.bits();
    }
}

impl NeuriteKinds {
    /// Whether `kind` is in this set.
    pub const fn includes(self, kind: NeuriteKind) -> bool {
        self.contains(kind.as_set())
    }
}

impl Default for NeuriteKinds {
    fn default() -> Self {
        Self::all()
    }
}

/// Reconstruction-wide settings consumed by geometric computations.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuronSettings {
    /// Out-of-plane reference used when building node local bases.
    pub up: DVec3,
}

impl Default for NeuronSettings {
    fn default() -> Self {
        Self { up: DVec3::Z }
    }
}
