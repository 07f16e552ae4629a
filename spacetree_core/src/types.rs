// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types shared by the tree: node identifiers, statuses, and rollup flags.

/// Identifier for a node in the tree (generational).
///
/// A `NodeId` stays valid until its node is removed, for example by
/// [`SearchTree::reset`](crate::SearchTree::reset). Slots are reused afterwards,
/// but with a bumped generation, so stale identifiers never alias new nodes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Status of a search-tree node.
///
/// Every node starts out [`Undetermined`](NodeStatus::Undetermined). The first
/// time its children are requested the status is resolved once and never
/// changes again.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    /// Not explored yet.
    #[default]
    Undetermined,
    /// Propagation failed; the node has no children.
    Failed,
    /// Every variable is assigned; the node has no children.
    Solved,
    /// Ordinary branching node with one child per alternative.
    Branch,
    /// User-directed tightening of a single variable, with exactly one child.
    Special,
    /// A single propagation step, with exactly one child.
    Step,
}

impl NodeStatus {
    /// Returns `true` for nodes that have (or will have) children.
    pub const fn is_branching(self) -> bool {
        matches!(self, Self::Branch | Self::Special | Self::Step)
    }

    /// Returns `true` for failed and solved nodes.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Solved)
    }
}

bitflags::bitflags! {
    /// Subtree summaries maintained bottom-up as children close.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Some descendant failed.
        const HAS_FAILED_CHILDREN = 0b0000_0001;
        /// Some descendant is a solution.
        const HAS_SOLVED_CHILDREN = 0b0000_0010;
    }
}
