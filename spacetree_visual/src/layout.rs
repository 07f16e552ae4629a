// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounding-box layout.
//!
//! Each node is drawn as a fixed-size box centred on its position. Children
//! hang one level below their parent, packed left to right with a fixed gap
//! between the bounding boxes of neighbouring subtrees, and centred as a group
//! under the parent. A hidden node is drawn as a collapsed triangle of fixed
//! size regardless of what lies below it.
//!
//! Layout is incremental: only dirty subtrees are visited, and clean subtrees
//! keep their cached bounds.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};
use spacetree_core::{Cursor, NodeCursor, NodeId, SearchTree, Space};

use crate::state::{VisualFlags, VisualState};

/// Sizes driving the layout.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutMetrics {
    /// Width of a node box.
    pub node_width: f64,
    /// Height of a node box.
    pub node_height: f64,
    /// Vertical distance between a parent's position and its children's.
    pub level_height: f64,
    /// Horizontal gap between the bounding boxes of sibling subtrees.
    pub separation: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            node_width: 20.0,
            node_height: 20.0,
            level_height: 38.0,
            separation: 10.0,
        }
    }
}

impl LayoutMetrics {
    /// Box of a single node, relative to its position.
    pub fn node_rect(&self) -> Rect {
        let half = self.node_width / 2.0;
        Rect::new(-half, 0.0, half, self.node_height)
    }

    /// Box of a hidden subtree, relative to its root's position.
    pub fn collapsed_rect(&self) -> Rect {
        Rect::new(
            -self.node_width,
            0.0,
            self.node_width,
            self.node_height + self.level_height,
        )
    }
}

/// Recomputes offsets and bounds of every dirty node, children first.
#[derive(Debug)]
pub(crate) struct LayoutCursor<'a, S: Space> {
    tree: &'a mut SearchTree<S, VisualState>,
    cursor: NodeCursor,
    metrics: LayoutMetrics,
}

impl<'a, S: Space> LayoutCursor<'a, S> {
    pub(crate) fn new(
        tree: &'a mut SearchTree<S, VisualState>,
        start: NodeId,
        metrics: LayoutMetrics,
    ) -> Self {
        Self {
            tree,
            cursor: NodeCursor::new(start),
            metrics,
        }
    }

    fn state(&self, id: NodeId) -> &VisualState {
        self.tree.nodes().data(id).ext()
    }

    fn state_mut(&mut self, id: NodeId) -> &mut VisualState {
        self.tree.ext_mut(id).expect("layout walked a dangling NodeId")
    }
}

impl<S: Space> Cursor for LayoutCursor<'_, S> {
    fn may_move_upwards(&self) -> bool {
        self.cursor.may_move_upwards(self.tree.nodes())
    }
    fn move_upwards(&mut self) {
        self.cursor.move_upwards(self.tree.nodes());
    }
    fn may_move_downwards(&self) -> bool {
        let state = self.state(self.cursor.node());
        state.is_dirty() && !state.is_hidden() && self.cursor.may_move_downwards(self.tree.nodes())
    }
    fn move_downwards(&mut self) {
        self.cursor.move_downwards(self.tree.nodes());
    }
    fn may_move_sidewards(&self) -> bool {
        self.cursor.may_move_sidewards(self.tree.nodes())
    }
    fn move_sidewards(&mut self) {
        self.cursor.move_sidewards(self.tree.nodes());
    }

    fn process_current_node(&mut self) {
        let id = self.cursor.node();
        let state = self.state(id);
        if !state.is_dirty() {
            return;
        }
        let metrics = self.metrics;
        let children = self.tree.children_of(id);
        let bounds = if state.is_hidden() {
            metrics.collapsed_rect()
        } else if children.is_empty() {
            metrics.node_rect()
        } else {
            let children: Vec<NodeId> = children.to_vec();
            let gaps = (children.len() - 1) as f64 * metrics.separation;
            let total = children
                .iter()
                .map(|&c| self.state(c).bounds.width())
                .sum::<f64>()
                + gaps;
            let mut left = -total / 2.0;
            let mut bounds = metrics.node_rect();
            for child in children {
                let child_bounds = self.state(child).bounds;
                let offset = left - child_bounds.x0;
                left += child_bounds.width() + metrics.separation;
                self.state_mut(child).offset = offset;
                bounds = bounds.union(child_bounds + Vec2::new(offset, metrics.level_height));
            }
            bounds
        };
        let state = self.state_mut(id);
        state.bounds = bounds;
        state.flags.remove(VisualFlags::DIRTY);
    }
}
