// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cursors: positional walkers driven by generic traversal orders.
//!
//! A [`Cursor`] knows how to move between neighbouring nodes and what to do
//! at each one. [`walk_pre_order`] and [`walk_post_order`] drive any cursor
//! over the subtree it was started on, so new whole-subtree operations only
//! need to describe the per-node action and, optionally, which nodes not to
//! descend into.

use crate::node::NodeArena;
use crate::space::Space;
use crate::space_node::NodeExtension;
use crate::stats::Statistics;
use crate::tree::SearchTree;
use crate::types::{NodeId, NodeStatus};

/// A movable position in a tree plus a per-node action.
pub trait Cursor {
    /// Whether the cursor can move to the parent without leaving its subtree.
    fn may_move_upwards(&self) -> bool;
    /// Move to the parent.
    fn move_upwards(&mut self);
    /// Whether the cursor can move to the first child.
    fn may_move_downwards(&self) -> bool;
    /// Move to the first child.
    fn move_downwards(&mut self);
    /// Whether the cursor can move to the next sibling.
    fn may_move_sidewards(&self) -> bool;
    /// Move to the next sibling.
    fn move_sidewards(&mut self);
    /// Act on the current node.
    fn process_current_node(&mut self);
}

/// Process every reachable node, parents before children.
pub fn walk_pre_order<C: Cursor>(cursor: &mut C) {
    loop {
        cursor.process_current_node();
        if cursor.may_move_downwards() {
            cursor.move_downwards();
        } else if cursor.may_move_sidewards() {
            cursor.move_sidewards();
        } else {
            while !cursor.may_move_sidewards() && cursor.may_move_upwards() {
                cursor.move_upwards();
            }
            if !cursor.may_move_sidewards() {
                return;
            }
            cursor.move_sidewards();
        }
    }
}

/// Process every reachable node, children before parents.
pub fn walk_post_order<C: Cursor>(cursor: &mut C) {
    fn to_leaf<C: Cursor>(cursor: &mut C) {
        while cursor.may_move_downwards() {
            cursor.move_downwards();
        }
    }

    to_leaf(cursor);
    loop {
        cursor.process_current_node();
        if cursor.may_move_sidewards() {
            cursor.move_sidewards();
            to_leaf(cursor);
        } else if cursor.may_move_upwards() {
            cursor.move_upwards();
        } else {
            return;
        }
    }
}

/// Position within the subtree rooted at `start`.
///
/// Concrete cursors wrap a `NodeCursor` and pass it the arena to move in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NodeCursor {
    start: NodeId,
    node: NodeId,
}

impl NodeCursor {
    /// A cursor positioned on `start`, confined to its subtree.
    pub fn new(start: NodeId) -> Self {
        Self { start, node: start }
    }

    /// Current node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Root of the walked subtree.
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// See [`Cursor::may_move_upwards`].
    pub fn may_move_upwards<T>(&self, arena: &NodeArena<T>) -> bool {
        self.node != self.start && arena.parent_of(self.node).is_some()
    }

    /// See [`Cursor::move_upwards`].
    pub fn move_upwards<T>(&mut self, arena: &NodeArena<T>) {
        self.node = arena
            .parent_of(self.node)
            .expect("cursor moved above the root");
    }

    /// See [`Cursor::may_move_downwards`].
    pub fn may_move_downwards<T>(&self, arena: &NodeArena<T>) -> bool {
        !arena.children_of(self.node).is_empty()
    }

    /// See [`Cursor::move_downwards`].
    pub fn move_downwards<T>(&mut self, arena: &NodeArena<T>) {
        self.node = arena.children_of(self.node)[0];
    }

    /// See [`Cursor::may_move_sidewards`].
    pub fn may_move_sidewards<T>(&self, arena: &NodeArena<T>) -> bool {
        self.node != self.start && arena.next_sibling(self.node).is_some()
    }

    /// See [`Cursor::move_sidewards`].
    pub fn move_sidewards<T>(&mut self, arena: &NodeArena<T>) {
        self.node = arena
            .next_sibling(self.node)
            .expect("cursor moved past the last sibling");
    }
}

/// Counts statuses below a node.
#[derive(Debug)]
pub struct StatCursor<'a, S: Space, X: NodeExtension> {
    tree: &'a SearchTree<S, X>,
    cursor: NodeCursor,
    start_depth: u32,
    stats: Statistics,
}

impl<'a, S: Space, X: NodeExtension> StatCursor<'a, S, X> {
    /// Panics if `start` is stale.
    pub fn new(tree: &'a SearchTree<S, X>, start: NodeId) -> Self {
        Self {
            tree,
            cursor: NodeCursor::new(start),
            start_depth: tree.nodes.node(start).depth(),
            stats: Statistics::default(),
        }
    }

    /// Counts gathered so far.
    pub fn statistics(&self) -> Statistics {
        self.stats
    }
}

impl<S: Space, X: NodeExtension> Cursor for StatCursor<'_, S, X> {
    fn may_move_upwards(&self) -> bool {
        self.cursor.may_move_upwards(&self.tree.nodes)
    }
    fn move_upwards(&mut self) {
        self.cursor.move_upwards(&self.tree.nodes);
    }
    fn may_move_downwards(&self) -> bool {
        self.cursor.may_move_downwards(&self.tree.nodes)
    }
    fn move_downwards(&mut self) {
        self.cursor.move_downwards(&self.tree.nodes);
    }
    fn may_move_sidewards(&self) -> bool {
        self.cursor.may_move_sidewards(&self.tree.nodes)
    }
    fn move_sidewards(&mut self) {
        self.cursor.move_sidewards(&self.tree.nodes);
    }

    fn process_current_node(&mut self) {
        let node = self.tree.nodes.node(self.cursor.node());
        match node.data().status() {
            NodeStatus::Undetermined => self.stats.undetermined += 1,
            NodeStatus::Failed => self.stats.failures += 1,
            NodeStatus::Solved => self.stats.solutions += 1,
            NodeStatus::Branch | NodeStatus::Special | NodeStatus::Step => {
                self.stats.choices += 1;
            }
        }
        self.stats.new_depth(node.depth() - self.start_depth);
    }
}

/// Releases every space in a subtree.
#[derive(Debug)]
pub(crate) struct PurgeCursor<'a, S: Space, X: NodeExtension> {
    tree: &'a mut SearchTree<S, X>,
    cursor: NodeCursor,
}

impl<'a, S: Space, X: NodeExtension> PurgeCursor<'a, S, X> {
    pub(crate) fn new(tree: &'a mut SearchTree<S, X>, start: NodeId) -> Self {
        Self {
            tree,
            cursor: NodeCursor::new(start),
        }
    }
}

impl<S: Space, X: NodeExtension> Cursor for PurgeCursor<'_, S, X> {
    fn may_move_upwards(&self) -> bool {
        self.cursor.may_move_upwards(&self.tree.nodes)
    }
    fn move_upwards(&mut self) {
        self.cursor.move_upwards(&self.tree.nodes);
    }
    fn may_move_downwards(&self) -> bool {
        self.cursor.may_move_downwards(&self.tree.nodes)
    }
    fn move_downwards(&mut self) {
        self.cursor.move_downwards(&self.tree.nodes);
    }
    fn may_move_sidewards(&self) -> bool {
        self.cursor.may_move_sidewards(&self.tree.nodes)
    }
    fn move_sidewards(&mut self) {
        self.cursor.move_sidewards(&self.tree.nodes);
    }

    fn process_current_node(&mut self) {
        self.tree.nodes.data_mut(self.cursor.node()).purge();
    }
}
