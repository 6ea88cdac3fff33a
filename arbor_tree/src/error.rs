// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for tree access and structural edits.
//!
//! Every variant is a local contract violation (the caller asked for something
//! that does not exist or is not bound). Geometric computations never fail.

use core::fmt;

use thiserror::Error;

use crate::types::BranchId;

/// A non-owning back-reference that may be unset.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Reference {
    /// The logical parent of a node.
    NodeParent,
    /// The branch a node is stored in.
    NodeBranch,
    /// The neurite a branch is attached to.
    BranchNeurite,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NodeParent => "node parent",
            Self::NodeBranch => "node branch",
            Self::BranchNeurite => "branch neurite",
        })
    }
}

/// Which end of a branch was requested.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Access {
    /// First node.
    First,
    /// Last node.
    Last,
    /// Root node.
    Root,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "first node",
            Self::Last => "last node",
            Self::Root => "root node",
        })
    }
}

/// Errors reported by [`Node`](crate::Node), [`Branch`](crate::Branch) and
/// [`Neurite`](crate::Neurite) operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A back-reference was read before it was bound.
    #[error("{0} is not bound")]
    UnboundReference(Reference),

    /// No node with this id exists in the neurite.
    #[error("no node with id {0} in this neurite")]
    NodeNotFound(i64),

    /// The branch handle is stale (its branch was removed or the tree was re-rooted).
    #[error("branch {0:?} is no longer part of the tree")]
    BranchNotFound(BranchId),

    /// A structural operation needs a root branch but `set_root` was never called.
    #[error("neurite has no root branch")]
    Unrooted,

    /// The branch has no node at the requested end.
    #[error("branch has no {0}")]
    EmptyAccess(Access),

    /// The branch handle was issued by a different neurite.
    #[error("branch {0:?} belongs to a different neurite")]
    ForeignBranch(BranchId),

    /// The root branch already holds nodes, so there is no "first node" slot left.
    #[error("root branch already holds nodes")]
    RootOccupied,

    /// A node index past the end of its branch.
    #[error("position {index} is out of range for a branch of {len} nodes")]
    PositionOutOfRange {
        /// Requested index.
        index: usize,
        /// Branch length at the time of the request.
        len: usize,
    },
}

/// Result alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
