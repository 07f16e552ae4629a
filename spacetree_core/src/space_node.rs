// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node search state.

use crate::space::{Choice, Space, Tightening};
use crate::types::{NodeFlags, NodeId, NodeStatus};

/// How the children of a branching node derive from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Description<C> {
    /// Ordinary branching: child `i` commits alternative `i`.
    Branch(C),
    /// The single child applies a user-directed tightening.
    Special(Tightening),
    /// The single child applies this many propagation steps.
    Step(u32),
}

impl<C: Choice> Description<C> {
    /// Number of children this description produces.
    pub fn alternatives(&self) -> u32 {
        match self {
            Self::Branch(choice) => choice.alternatives(),
            Self::Special(_) | Self::Step(_) => 1,
        }
    }

    /// The node status carrying this description.
    pub fn status(&self) -> NodeStatus {
        match self {
            Self::Branch(_) => NodeStatus::Branch,
            Self::Special(_) => NodeStatus::Special,
            Self::Step(_) => NodeStatus::Step,
        }
    }
}

/// Status together with the payload only a branching node carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum State<C> {
    Undetermined,
    Failed,
    Solved,
    Branching(Description<C>),
}

/// Per-node data added by a layer built on top of the search tree.
///
/// The implementing type acts as the tree's node factory: it is fixed once
/// per tree by the type parameter of [`SearchTree`](crate::SearchTree), so
/// every node in a tree carries the same kind of extension.
pub trait NodeExtension {
    /// Extension data for the root node.
    fn root() -> Self;

    /// Extension data for child `alternative` of a node carrying `parent`.
    fn child(parent: &Self, alternative: u32) -> Self;
}

impl NodeExtension for () {
    fn root() -> Self {}

    fn child(_parent: &Self, _alternative: u32) -> Self {}
}

/// Search state of one node: status, retained spaces, and subtree summaries.
#[derive(Debug)]
pub struct SpaceNode<S: Space, X> {
    pub(crate) state: State<S::Choice>,
    /// Snapshot retained to bound recomputation.
    pub(crate) copy: Option<S>,
    /// Transient space, consumed by a child or by [`SearchTree::take_space`](crate::SearchTree::take_space).
    pub(crate) working: Option<S>,
    /// Incumbent solution when this node was created.
    pub(crate) own_best: Option<NodeId>,
    pub(crate) open_children: u32,
    pub(crate) flags: NodeFlags,
    /// Actions between this node and the snapshot its space came from.
    pub(crate) distance: u32,
    pub(crate) ext: X,
}

impl<S: Space, X> SpaceNode<S, X> {
    pub(crate) fn new(own_best: Option<NodeId>, ext: X) -> Self {
        Self {
            state: State::Undetermined,
            copy: None,
            working: None,
            own_best,
            open_children: 0,
            flags: NodeFlags::empty(),
            distance: 0,
            ext,
        }
    }

    /// Current status.
    pub fn status(&self) -> NodeStatus {
        match &self.state {
            State::Undetermined => NodeStatus::Undetermined,
            State::Failed => NodeStatus::Failed,
            State::Solved => NodeStatus::Solved,
            State::Branching(desc) => desc.status(),
        }
    }

    /// Branching description, present exactly for branching statuses.
    pub fn description(&self) -> Option<&Description<S::Choice>> {
        match &self.state {
            State::Branching(desc) => Some(desc),
            _ => None,
        }
    }

    /// Whether this node or some descendant is still unexplored.
    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Undetermined) || self.open_children > 0
    }

    /// Children whose subtrees are not fully explored.
    pub fn open_children(&self) -> u32 {
        self.open_children
    }

    /// Some descendant failed.
    pub fn has_failed_children(&self) -> bool {
        self.flags.contains(NodeFlags::HAS_FAILED_CHILDREN)
    }

    /// Some descendant is a solution.
    pub fn has_solved_children(&self) -> bool {
        self.flags.contains(NodeFlags::HAS_SOLVED_CHILDREN)
    }

    /// Rollup flags.
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Whether a snapshot is retained here.
    pub fn has_copy(&self) -> bool {
        self.copy.is_some()
    }

    /// Whether a transient space is held here.
    pub fn has_working_space(&self) -> bool {
        self.working.is_some()
    }

    /// Incumbent solution when this node was created.
    pub fn own_best(&self) -> Option<NodeId> {
        self.own_best
    }

    /// Distance to the snapshot this node's space was last derived from.
    pub fn distance(&self) -> u32 {
        self.distance
    }

    /// Extension data.
    pub fn ext(&self) -> &X {
        &self.ext
    }

    /// Mutable extension data.
    pub fn ext_mut(&mut self) -> &mut X {
        &mut self.ext
    }

    pub(crate) fn is_extension(&self) -> bool {
        matches!(
            self.state,
            State::Branching(Description::Special(_) | Description::Step(_))
        )
    }

    /// Drop retained and transient spaces; the status is untouched.
    pub(crate) fn purge(&mut self) {
        self.copy = None;
        self.working = None;
    }
}
