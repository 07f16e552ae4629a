// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The visual tree: a search tree plus presentation state.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};
use spacetree_core::{
    Better, NodeId, NodeStatus, SearchTree, Space, SpaceNode, Statistics, Tightening, TreeConfig,
    walk_post_order, walk_pre_order,
};

use crate::cursors::{HeatCursor, HideFailedCursor, UnhideAllCursor, normalize};
use crate::layout::{LayoutCursor, LayoutMetrics};
use crate::state::{VisualFlags, VisualState};

/// Mark `id` and its ancestors dirty, stopping at the first ancestor that
/// already is.
pub(crate) fn dirty_up<S: Space>(tree: &mut SearchTree<S, VisualState>, id: NodeId) {
    let Some(state) = tree.ext_mut(id) else {
        return;
    };
    state.flags.insert(VisualFlags::DIRTY);
    let mut current = tree.parent_of(id);
    while let Some(p) = current {
        let state = tree.ext_mut(p).expect("parent of a live node is live");
        if state.is_dirty() {
            return;
        }
        state.flags.insert(VisualFlags::DIRTY);
        current = tree.parent_of(p);
    }
}

/// A [`SearchTree`] whose nodes carry [`VisualState`].
///
/// Every operation that changes what a subtree looks like marks the affected
/// nodes dirty; [`VisualTree::layout`] then refreshes exactly those.
/// Positions are relative to the root, which sits at the origin with its box
/// hanging below it.
#[derive(Debug)]
pub struct VisualTree<S: Space> {
    tree: SearchTree<S, VisualState>,
    metrics: LayoutMetrics,
    path: Option<NodeId>,
}

impl<S: Space> VisualTree<S> {
    /// Create a visual tree with the default configuration.
    pub fn new(root: S) -> Self {
        Self::with_config(root, TreeConfig::default())
    }

    /// Create a visual tree whose root explores `root`.
    pub fn with_config(root: S, config: TreeConfig) -> Self {
        Self {
            tree: SearchTree::with_config(root, config),
            metrics: LayoutMetrics::default(),
            path: None,
        }
    }

    /// Enable branch-and-bound with the given comparator.
    #[must_use]
    pub fn with_better(mut self, better: impl Better<S> + Send + 'static) -> Self {
        self.tree = self.tree.with_better(better);
        self
    }

    /// Use different layout sizes. Everything is laid out again.
    #[must_use]
    pub fn with_metrics(mut self, metrics: LayoutMetrics) -> Self {
        self.metrics = metrics;
        self.invalidate_layout();
        self
    }

    /// The underlying search tree.
    pub fn tree(&self) -> &SearchTree<S, VisualState> {
        &self.tree
    }

    /// Layout sizes in use.
    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Search statistics of the whole tree.
    pub fn statistics(&self) -> Statistics {
        self.tree.statistics()
    }

    /// Presentation state of a live node.
    pub fn state(&self, id: NodeId) -> Option<&VisualState> {
        self.tree.ext(id)
    }

    /// See [`SearchTree::number_of_children`]. Expanding a node invalidates
    /// the layout around it.
    pub fn number_of_children(&mut self, id: NodeId) -> u32 {
        let unexplored = self.tree.status(id) == Some(NodeStatus::Undetermined);
        let n = self.tree.number_of_children(id);
        if unexplored {
            dirty_up(&mut self.tree, id);
        }
        n
    }

    /// See [`SearchTree::add_special`].
    pub fn add_special(&mut self, id: NodeId, tightening: Tightening) -> Option<NodeId> {
        let child = self.tree.add_special(id, tightening)?;
        dirty_up(&mut self.tree, id);
        Some(child)
    }

    /// See [`SearchTree::add_step`].
    pub fn add_step(&mut self, id: NodeId, steps: u32) -> Option<NodeId> {
        let child = self.tree.add_step(id, steps)?;
        dirty_up(&mut self.tree, id);
        Some(child)
    }

    /// See [`SearchTree::take_space`].
    pub fn take_space(&mut self, id: NodeId) -> S {
        self.tree.take_space(id)
    }

    /// See [`SearchTree::purge`].
    pub fn purge(&mut self, id: NodeId) {
        self.tree.purge(id);
    }

    /// Drop every node and start over; all ids become stale.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.path = None;
    }

    /// Collapse or expand the subtree below `id`.
    ///
    /// Nodes without children cannot be hidden. Returns whether anything
    /// changed.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> bool {
        if self.tree.children_of(id).is_empty() {
            return false;
        }
        let Some(state) = self.tree.ext_mut(id) else {
            return false;
        };
        if state.is_hidden() == hidden {
            return false;
        }
        state.flags.set(VisualFlags::HIDDEN, hidden);
        dirty_up(&mut self.tree, id);
        true
    }

    /// Flip the hidden flag of `id`. Returns whether anything changed.
    pub fn toggle_hidden(&mut self, id: NodeId) -> bool {
        let hidden = self.state(id).is_some_and(VisualState::is_hidden);
        self.set_hidden(id, !hidden)
    }

    /// Collapse every explored subtree below (and at) `id` that failed
    /// somewhere and holds no solution.
    ///
    /// Returns the number of nodes newly hidden; a second call returns zero.
    pub fn hide_failed(&mut self, id: NodeId) -> u32 {
        if !self.tree.is_alive(id) {
            return 0;
        }
        let mut cursor = HideFailedCursor::new(&mut self.tree, id);
        walk_pre_order(&mut cursor);
        cursor.hidden()
    }

    /// Expand every hidden node below (and at) `id`.
    pub fn unhide_all(&mut self, id: NodeId) {
        if !self.tree.is_alive(id) {
            return;
        }
        let mut cursor = UnhideAllCursor::new(&mut self.tree, id);
        walk_post_order(&mut cursor);
    }

    /// Set or clear the user mark on `id`.
    pub fn set_marked(&mut self, id: NodeId, marked: bool) {
        if let Some(state) = self.tree.ext_mut(id) {
            state.flags.set(VisualFlags::MARKED, marked);
        }
    }

    /// Highlight the path from the root to `id`, replacing any earlier path.
    pub fn set_path(&mut self, id: NodeId) {
        self.unset_path();
        if !self.tree.is_alive(id) {
            return;
        }
        for node in self.tree.nodes().path_from_root(id) {
            if let Some(state) = self.tree.ext_mut(node) {
                state.flags.insert(VisualFlags::ON_PATH);
            }
        }
        self.path = Some(id);
    }

    /// Clear the highlighted path.
    pub fn unset_path(&mut self) {
        let Some(end) = self.path.take() else {
            return;
        };
        for node in self.tree.nodes().path_from_root(end) {
            if let Some(state) = self.tree.ext_mut(node) {
                state.flags.remove(VisualFlags::ON_PATH);
            }
        }
    }

    /// Last node of the highlighted path.
    pub fn path_end(&self) -> Option<NodeId> {
        self.path
    }

    /// Sample `measure` at every node below (and at) `start` and store the
    /// samples as heat, scaled so the coldest sample maps to 0 and the
    /// hottest to 255.
    pub fn compute_heat<F>(&mut self, start: NodeId, measure: F)
    where
        F: FnMut(NodeId, &SpaceNode<S, VisualState>) -> f64,
    {
        if !self.tree.is_alive(start) {
            return;
        }
        let mut cursor = HeatCursor::new(&self.tree, start, measure);
        walk_pre_order(&mut cursor);
        let samples = cursor.into_samples();
        for (id, heat) in normalize(&samples) {
            if let Some(state) = self.tree.ext_mut(id) {
                state.heat = heat;
            }
        }
    }

    /// Refresh the layout of every dirty node and return the bounds of the
    /// whole tree.
    pub fn layout(&mut self) -> Rect {
        let root = self.tree.root();
        let mut cursor = LayoutCursor::new(&mut self.tree, root, self.metrics);
        walk_post_order(&mut cursor);
        self.bounds()
    }

    /// Bounds of the whole tree as of the last layout.
    pub fn bounds(&self) -> Rect {
        self.state(self.root()).map_or(Rect::ZERO, |s| s.bounds)
    }

    /// Whether some node needs to be laid out again.
    pub fn needs_layout(&self) -> bool {
        self.state(self.root()).is_some_and(VisualState::is_dirty)
    }

    fn invalidate_layout(&mut self) {
        let ids: Vec<NodeId> = self.tree.nodes().iter().map(|(id, _)| id).collect();
        for id in ids {
            if let Some(state) = self.tree.ext_mut(id) {
                state.flags.insert(VisualFlags::DIRTY);
            }
        }
    }

    /// Position of `id` as of the last layout: the centre of the top edge of
    /// its box.
    pub fn position(&self, id: NodeId) -> Option<Point> {
        let path = self.tree.nodes().path_from_root(id);
        if path.is_empty() {
            return None;
        }
        let x = path
            .iter()
            .skip(1)
            .filter_map(|&n| self.state(n))
            .map(|s| s.offset)
            .sum::<f64>();
        let depth = self.tree.depth_of(id)?;
        Some(Point::new(x, f64::from(depth) * self.metrics.level_height))
    }

    /// Box of the node `id` as of the last layout.
    pub fn node_rect(&self, id: NodeId) -> Option<Rect> {
        let at = self.position(id)?;
        Some(self.metrics.node_rect() + at.to_vec2())
    }

    /// The visible node whose box contains `point`, as of the last layout.
    ///
    /// Nodes below a hidden node are not visible; a point inside a collapsed
    /// subtree finds the hidden node itself.
    pub fn find_node(&self, point: Point) -> Option<NodeId> {
        let mut id = self.root();
        let mut at = Point::ORIGIN;
        let state = self.state(id)?;
        if !(state.bounds + at.to_vec2()).contains(point) {
            return None;
        }
        loop {
            let state = self.state(id)?;
            if state.is_hidden() {
                return (self.metrics.collapsed_rect() + at.to_vec2())
                    .contains(point)
                    .then_some(id);
            }
            if (self.metrics.node_rect() + at.to_vec2()).contains(point) {
                return Some(id);
            }
            let below = at + Vec2::new(0.0, self.metrics.level_height);
            let next = self.tree.children_of(id).iter().find_map(|&child| {
                let child_state = self.state(child)?;
                let child_at = below + Vec2::new(child_state.offset, 0.0);
                (child_state.bounds + child_at.to_vec2())
                    .contains(point)
                    .then_some((child, child_at))
            });
            (id, at) = next?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use spacetree_core::{Choice, SpaceStatus};

    /// Binary tree of depth two. Leaves below the left child of the root are
    /// solutions, leaves below the right child fail.
    #[derive(Clone, Debug, Default)]
    struct Lopsided {
        path: Vec<u32>,
        failed: bool,
    }

    #[derive(Clone, Debug)]
    struct Two;

    impl Choice for Two {
        fn alternatives(&self) -> u32 {
            2
        }
    }

    impl Space for Lopsided {
        type Choice = Two;
        fn status(&mut self) -> SpaceStatus {
            match self.path.as_slice() {
                _ if self.failed => SpaceStatus::Failed,
                [1, _] => {
                    self.failed = true;
                    SpaceStatus::Failed
                }
                [_, _] => SpaceStatus::Solved,
                _ => SpaceStatus::Branch,
            }
        }
        fn choice(&self) -> Two {
            Two
        }
        fn commit(&mut self, _: &Two, alternative: u32) {
            self.path.push(alternative);
        }
        fn fail(&mut self) {
            self.failed = true;
        }
        fn failed(&self) -> bool {
            self.failed
        }
    }

    /// Binary tree of depth three. Leaves below `[0, 0]` fail, every other
    /// leaf is a solution.
    #[derive(Clone, Debug, Default)]
    struct Deep {
        path: Vec<u32>,
        failed: bool,
    }

    impl Space for Deep {
        type Choice = Two;
        fn status(&mut self) -> SpaceStatus {
            match self.path.as_slice() {
                _ if self.failed => SpaceStatus::Failed,
                [0, 0, _] => {
                    self.failed = true;
                    SpaceStatus::Failed
                }
                [_, _, _] => SpaceStatus::Solved,
                _ => SpaceStatus::Branch,
            }
        }
        fn choice(&self) -> Two {
            Two
        }
        fn commit(&mut self, _: &Two, alternative: u32) {
            self.path.push(alternative);
        }
        fn fail(&mut self) {
            self.failed = true;
        }
        fn failed(&self) -> bool {
            self.failed
        }
    }

    fn explore(tree: &mut VisualTree<Lopsided>) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending = vec![tree.root()];
        while let Some(node) = pending.pop() {
            order.push(node);
            let n = tree.number_of_children(node);
            pending.extend((0..n).rev().filter_map(|i| tree.tree().child(node, i)));
        }
        order
    }

    #[test]
    fn expansion_dirties_the_path_to_the_root() {
        let mut tree = VisualTree::new(Lopsided::default());
        let root = tree.root();
        tree.number_of_children(root);
        tree.layout();
        assert!(!tree.needs_layout());

        let left = tree.tree().child(root, 0).unwrap();
        let right = tree.tree().child(root, 1).unwrap();
        tree.number_of_children(left);
        assert!(tree.state(left).unwrap().is_dirty());
        assert!(tree.state(root).unwrap().is_dirty());
        assert!(!tree.state(right).unwrap().is_dirty());

        // Already explored: nothing changes.
        tree.layout();
        tree.number_of_children(left);
        assert!(!tree.needs_layout());
    }

    #[test]
    fn siblings_are_centred_under_their_parent() {
        let mut tree = VisualTree::new(Lopsided::default());
        let root = tree.root();
        tree.number_of_children(root);
        let bounds = tree.layout();

        let left = tree.tree().child(root, 0).unwrap();
        let right = tree.tree().child(root, 1).unwrap();
        assert_eq!(tree.state(left).unwrap().offset, -15.0);
        assert_eq!(tree.state(right).unwrap().offset, 15.0);
        assert_eq!(bounds, Rect::new(-25.0, 0.0, 25.0, 58.0));
        assert_eq!(tree.position(right), Some(Point::new(15.0, 38.0)));
        assert_eq!(
            tree.node_rect(left),
            Some(Rect::new(-25.0, 38.0, -5.0, 58.0))
        );
    }

    #[test]
    fn hit_testing_finds_the_box_under_the_point() {
        let mut tree = VisualTree::new(Lopsided::default());
        let order = explore(&mut tree);
        tree.layout();

        for id in order {
            let centre = tree.node_rect(id).unwrap().center();
            assert_eq!(tree.find_node(centre), Some(id));
        }
        let root_rect = tree.node_rect(tree.root()).unwrap();
        assert_eq!(tree.find_node(root_rect.origin() - Vec2::new(1.0, 1.0)), None);
        // Between the two subtrees.
        assert_eq!(tree.find_node(Point::new(0.0, 45.0)), None);
    }

    #[test]
    fn hidden_subtrees_collapse() {
        let mut tree = VisualTree::new(Lopsided::default());
        explore(&mut tree);
        let root = tree.root();
        let left = tree.tree().child(root, 0).unwrap();
        let open = tree.layout();

        assert!(tree.toggle_hidden(left));
        assert!(tree.needs_layout());
        let collapsed = tree.layout();
        assert!(collapsed.width() < open.width());

        let inside = tree.node_rect(left).unwrap().center() + Vec2::new(0.0, 30.0);
        assert_eq!(tree.find_node(inside), Some(left));

        // Leaves cannot be hidden.
        let leaf = tree.tree().child(left, 0).unwrap();
        assert!(!tree.set_hidden(leaf, true));

        assert!(tree.toggle_hidden(left));
        assert_eq!(tree.layout(), open);
    }

    #[test]
    fn hide_failed_collapses_only_failed_subtrees() {
        let mut tree = VisualTree::new(Lopsided::default());
        explore(&mut tree);
        let root = tree.root();
        let left = tree.tree().child(root, 0).unwrap();
        let right = tree.tree().child(root, 1).unwrap();
        tree.layout();

        assert_eq!(tree.hide_failed(root), 1);
        assert!(tree.state(right).unwrap().is_hidden());
        assert!(!tree.state(left).unwrap().is_hidden());
        assert!(!tree.state(root).unwrap().is_hidden());
        assert!(tree.needs_layout());

        assert_eq!(tree.hide_failed(root), 0);

        tree.unhide_all(root);
        assert!(!tree.state(right).unwrap().is_hidden());
    }

    #[test]
    fn hide_failed_reaches_below_open_nodes() {
        let mut tree = VisualTree::new(Deep::default());
        let root = tree.root();
        tree.number_of_children(root);
        let upper = tree.tree().child(root, 0).unwrap();
        tree.number_of_children(upper);
        let dead_end = tree.tree().child(upper, 0).unwrap();
        tree.number_of_children(dead_end);
        for i in 0..2 {
            let leaf = tree.tree().child(dead_end, i).unwrap();
            tree.number_of_children(leaf);
        }

        // Only the parent of a closed subtree hears about its failures.
        assert!(tree.tree().is_open(root));
        assert!(tree.tree().is_open(upper));
        assert!(!tree.tree().is_open(dead_end));
        assert!(!tree.tree().has_failed_children(root));

        assert_eq!(tree.hide_failed(root), 1);
        assert!(tree.state(dead_end).unwrap().is_hidden());
        assert!(!tree.state(upper).unwrap().is_hidden());
        assert_eq!(tree.hide_failed(root), 0);
    }

    #[test]
    fn paths_replace_each_other() {
        let mut tree = VisualTree::new(Lopsided::default());
        explore(&mut tree);
        let root = tree.root();
        let left = tree.tree().child(root, 0).unwrap();
        let leaf = tree.tree().child(left, 1).unwrap();
        let right = tree.tree().child(root, 1).unwrap();

        tree.set_path(leaf);
        for id in [root, left, leaf] {
            assert!(tree.state(id).unwrap().is_on_path());
        }
        tree.set_path(right);
        assert!(tree.state(root).unwrap().is_on_path());
        assert!(tree.state(right).unwrap().is_on_path());
        assert!(!tree.state(left).unwrap().is_on_path());
        assert!(!tree.state(leaf).unwrap().is_on_path());
        assert_eq!(tree.path_end(), Some(right));

        tree.set_marked(leaf, true);
        assert!(tree.state(leaf).unwrap().is_marked());
    }

    #[test]
    fn heat_spans_the_full_range() {
        let mut tree = VisualTree::new(Lopsided::default());
        explore(&mut tree);
        let root = tree.root();

        // Constant samples are all cold.
        tree.compute_heat(root, |_, _| 1.0);
        assert_eq!(tree.state(root).unwrap().heat, 0);

        let depths: Vec<(NodeId, u32)> = tree
            .tree()
            .nodes()
            .iter()
            .map(|(id, node)| (id, node.depth()))
            .collect();
        tree.compute_heat(root, |id, _| {
            let depth = depths.iter().find(|(n, _)| *n == id).map_or(0, |d| d.1);
            f64::from(depth)
        });
        let left = tree.tree().child(root, 0).unwrap();
        let leaf = tree.tree().child(left, 0).unwrap();
        assert_eq!(tree.state(root).unwrap().heat, 0);
        assert_eq!(tree.state(left).unwrap().heat, 128);
        assert_eq!(tree.state(leaf).unwrap().heat, 255);
    }
}
