// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The search tree: node materialization, rollup, and queries.

use core::fmt;

use log::debug;

use crate::best::BestNode;
use crate::config::TreeConfig;
use crate::cursor::{PurgeCursor, StatCursor, walk_post_order, walk_pre_order};
use crate::node::NodeArena;
use crate::space::{Better, Space, SpaceStatus, Tightening};
use crate::space_node::{Description, NodeExtension, SpaceNode, State};
use crate::stats::{RecomputationStats, Statistics};
use crate::types::{NodeFlags, NodeId, NodeStatus};

/// A search tree over the spaces of a propagation engine.
///
/// Nodes are materialized lazily: a node's status is only resolved when its
/// children are first requested through [`SearchTree::number_of_children`].
/// Spaces are not stored at every node. Each node can rebuild its space from
/// the nearest retained snapshot by replaying branching decisions, and the
/// [`RecomputationConfig`](crate::RecomputationConfig) decides where snapshots
/// are kept.
///
/// The type parameter `X` adds per-node data for higher layers (see
/// [`NodeExtension`]); it defaults to `()`.
///
/// ## Example
///
/// ```rust
/// use spacetree_core::{Choice, NodeStatus, SearchTree, Space, SpaceStatus};
///
/// // Two binary decisions; the second alternative of each is a dead end.
/// #[derive(Clone, Debug)]
/// struct Bits(Vec<u32>);
///
/// #[derive(Clone, Debug)]
/// struct Binary;
///
/// impl Choice for Binary {
///     fn alternatives(&self) -> u32 {
///         2
///     }
/// }
///
/// impl Space for Bits {
///     type Choice = Binary;
///     fn status(&mut self) -> SpaceStatus {
///         if self.0.contains(&1) {
///             SpaceStatus::Failed
///         } else if self.0.len() == 2 {
///             SpaceStatus::Solved
///         } else {
///             SpaceStatus::Branch
///         }
///     }
///     fn choice(&self) -> Binary {
///         Binary
///     }
///     fn commit(&mut self, _: &Binary, alternative: u32) {
///         self.0.push(alternative);
///     }
///     fn fail(&mut self) {
///         self.0.push(1);
///     }
///     fn failed(&self) -> bool {
///         self.0.contains(&1)
///     }
/// }
///
/// let mut tree: SearchTree<Bits> = SearchTree::new(Bits(Vec::new()));
/// let root = tree.root();
/// assert_eq!(tree.number_of_children(root), 2);
/// let left = tree.child(root, 0).unwrap();
/// assert_eq!(tree.number_of_children(left), 2);
/// let solution = tree.child(left, 0).unwrap();
/// tree.number_of_children(solution);
/// assert_eq!(tree.status(solution), Some(NodeStatus::Solved));
/// assert!(tree.has_solved_children(root));
/// ```
pub struct SearchTree<S: Space, X: NodeExtension = ()> {
    pub(crate) nodes: NodeArena<SpaceNode<S, X>>,
    pub(crate) root: NodeId,
    /// Snapshot of the root space as supplied by the caller.
    pub(crate) origin: S,
    pub(crate) best: Option<BestNode<S>>,
    pub(crate) config: TreeConfig,
    pub(crate) stats: Statistics,
    pub(crate) counters: RecomputationStats,
}

impl<S: Space, X: NodeExtension> fmt::Debug for SearchTree<S, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchTree")
            .field("nodes_alive", &self.nodes.len())
            .field("root", &self.root)
            .field("best", &self.best)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl<S: Space, X: NodeExtension> SearchTree<S, X> {
    /// Create a tree with the default configuration.
    pub fn new(root: S) -> Self {
        Self::with_config(root, TreeConfig::default())
    }

    /// Create a tree whose root explores `root`.
    ///
    /// The root keeps a snapshot of `root`, and the tree keeps one more as the
    /// origin of every recomputation, so the root can always be rebuilt.
    pub fn with_config(root: S, config: TreeConfig) -> Self {
        let mut nodes = NodeArena::new();
        let root_id = nodes.insert_root(Self::root_node(&root));
        Self {
            nodes,
            root: root_id,
            origin: root,
            best: None,
            config,
            stats: Statistics::root(),
            counters: RecomputationStats::default(),
        }
    }

    /// Enable branch-and-bound with the given comparator.
    #[must_use]
    pub fn with_better(mut self, better: impl Better<S> + Send + 'static) -> Self {
        self.best = Some(BestNode::new(better));
        self
    }

    fn root_node(origin: &S) -> SpaceNode<S, X> {
        let mut data = SpaceNode::new(None, X::root());
        data.copy = Some(origin.clone());
        data
    }

    /// Drop every node and start over from the origin.
    ///
    /// All previously returned [`NodeId`]s become stale.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.insert_root(Self::root_node(&self.origin));
        if let Some(best) = &mut self.best {
            best.node = None;
        }
        self.stats = Statistics::root();
        self.counters = RecomputationStats::default();
        debug!("search tree reset");
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Structural view of the tree.
    pub fn nodes(&self) -> &NodeArena<SpaceNode<S, X>> {
        &self.nodes
    }

    /// The space the tree was created from.
    pub fn origin(&self) -> &S {
        &self.origin
    }

    /// Current configuration.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Change the configuration; affects subsequent acquisitions only.
    pub fn set_config(&mut self, config: TreeConfig) {
        self.config = config;
    }

    /// Statistics of the materialized tree.
    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Counters describing how spaces were obtained.
    pub fn recomputation_stats(&self) -> RecomputationStats {
        self.counters
    }

    /// The incumbent solution, if branch-and-bound is enabled and one was found.
    pub fn best(&self) -> Option<NodeId> {
        self.best.as_ref().and_then(BestNode::node)
    }

    /// The branch-and-bound record, if enabled.
    pub fn best_node(&self) -> Option<&BestNode<S>> {
        self.best.as_ref()
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.is_alive(id)
    }

    /// Search state of a live node.
    pub fn node(&self, id: NodeId) -> Option<&SpaceNode<S, X>> {
        self.nodes.get(id).map(|n| n.data())
    }

    /// Extension data of a live node.
    pub fn ext(&self, id: NodeId) -> Option<&X> {
        self.node(id).map(SpaceNode::ext)
    }

    /// Mutable extension data of a live node.
    pub fn ext_mut(&mut self, id: NodeId) -> Option<&mut X> {
        self.nodes.get_mut(id).map(|n| n.data_mut().ext_mut())
    }

    /// Status of a live node.
    pub fn status(&self, id: NodeId) -> Option<NodeStatus> {
        self.node(id).map(SpaceNode::status)
    }

    /// Parent of a live node, or `None` for the root and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.parent_of(id)
    }

    /// Materialized children of a node (empty for unexplored or stale nodes).
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes.children_of(id)
    }

    /// The `alternative`-th child of a node.
    pub fn child(&self, id: NodeId, alternative: u32) -> Option<NodeId> {
        self.nodes.child_of(id, alternative)
    }

    /// Index of a node among its parent's children.
    pub fn alternative_of(&self, id: NodeId) -> Option<u32> {
        self.nodes.get(id).map(|n| n.alternative())
    }

    /// Distance of a node from the root.
    pub fn depth_of(&self, id: NodeId) -> Option<u32> {
        self.nodes.get(id).map(|n| n.depth())
    }

    /// Whether the subtree below `id` still contains unexplored nodes.
    pub fn is_open(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(SpaceNode::is_open)
    }

    /// Whether some descendant of `id` failed.
    pub fn has_failed_children(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(SpaceNode::has_failed_children)
    }

    /// Whether some descendant of `id` is a solution.
    pub fn has_solved_children(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(SpaceNode::has_solved_children)
    }

    /// Children of `id` whose subtrees are not fully explored.
    pub fn open_children(&self, id: NodeId) -> u32 {
        self.node(id).map_or(0, SpaceNode::open_children)
    }

    /// Resolve the status of `id` if needed and return its number of children.
    ///
    /// The first call on an undetermined node acquires a space for it and
    /// queries its status once:
    ///
    /// - failed: all spaces are released and the parent learns about the failure;
    /// - solved: the node becomes the incumbent if it improves on it;
    /// - branching: one child per alternative is allocated.
    ///
    /// Later calls return the cached count.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn number_of_children(&mut self, id: NodeId) -> u32 {
        let node = self.nodes.node(id);
        if !matches!(node.data().state, State::Undetermined) {
            return node.number_of_children();
        }
        let parent = node.parent();
        self.acquire_space(id);
        let space = self
            .nodes
            .data_mut(id)
            .working
            .as_mut()
            .expect("acquired node holds a working space");
        let status = space.status();
        self.stats.undetermined -= 1;
        match status {
            SpaceStatus::Failed => {
                let data = self.nodes.data_mut(id);
                data.purge();
                data.state = State::Failed;
                self.stats.failures += 1;
                debug!("node {id:?} failed");
                if let Some(p) = parent {
                    self.close_child(p, true, false);
                }
                0
            }
            SpaceStatus::Solved => {
                let data = self.nodes.data_mut(id);
                data.copy = None;
                let solution = data
                    .working
                    .take()
                    .expect("acquired node holds a working space");
                data.state = State::Solved;
                self.stats.solutions += 1;
                debug!("node {id:?} is a solution");
                self.record_solution(id, &solution);
                if let Some(p) = parent {
                    self.close_child(p, false, true);
                }
                0
            }
            SpaceStatus::Branch => {
                let choice = space.choice();
                self.branch(id, Description::Branch(choice))
            }
        }
    }

    /// Give an unexplored node a single child that applies `tightening`.
    ///
    /// Returns the new child, or `None` if extensions are disabled, the node
    /// is stale or already explored, or its space is failed.
    pub fn add_special(&mut self, id: NodeId, tightening: Tightening) -> Option<NodeId> {
        self.extend(id, Description::Special(tightening))
    }

    /// Give an unexplored node a single child that applies `steps` propagation
    /// steps (at least one) without running to fixpoint.
    ///
    /// Returns `None` under the same conditions as [`SearchTree::add_special`].
    pub fn add_step(&mut self, id: NodeId, steps: u32) -> Option<NodeId> {
        self.extend(id, Description::Step(steps.max(1)))
    }

    fn extend(&mut self, id: NodeId, desc: Description<S::Choice>) -> Option<NodeId> {
        if !self.config.extensions
            || !matches!(self.nodes.get(id)?.data().state, State::Undetermined)
        {
            return None;
        }
        self.acquire_space(id);
        if self.nodes.data(id).working.as_ref().is_none_or(Space::failed) {
            return None;
        }
        self.stats.undetermined -= 1;
        self.branch(id, desc);
        self.nodes.child_of(id, 0)
    }

    fn branch(&mut self, id: NodeId, desc: Description<S::Choice>) -> u32 {
        let alternatives = desc.alternatives();
        assert!(
            alternatives > 0,
            "branching description of {id:?} has no alternatives"
        );
        debug!("node {id:?} branches into {alternatives} ({:?})", desc.status());
        let own_best = self.best();
        let depth = self.nodes.node(id).depth();
        let data = self.nodes.data_mut(id);
        data.state = State::Branching(desc);
        data.open_children = alternatives;
        self.stats.choices += 1;
        self.stats.undetermined += alternatives;
        self.stats.new_depth(depth + 1);
        for alternative in 0..alternatives {
            let ext = X::child(&self.nodes.data(id).ext, alternative);
            self.nodes.insert_child(id, SpaceNode::new(own_best, ext));
        }
        alternatives
    }

    fn record_solution(&mut self, id: NodeId, solution: &S) {
        let Some(incumbent) = self.best.as_ref().map(BestNode::node) else {
            return;
        };
        let improves = match incumbent {
            None => true,
            Some(b) => {
                self.acquire_space(b);
                let reference = self
                    .nodes
                    .data(b)
                    .working
                    .as_ref()
                    .expect("acquired node holds a working space");
                self.best
                    .as_ref()
                    .is_some_and(|best| best.better.is_better(solution, reference))
            }
        };
        if improves && let Some(best) = &mut self.best {
            debug!("new incumbent {id:?} (was {incumbent:?})");
            best.node = Some(id);
        }
    }

    /// Tell `id` that one of its children closed its subtree.
    ///
    /// When the last open child closes, `id` drops its snapshot and closes in
    /// turn; solutions are reported to every ancestor either way.
    fn close_child(&mut self, mut id: NodeId, mut failures: bool, mut solutions: bool) {
        loop {
            let node = self.nodes.node_mut(id);
            let parent = node.parent();
            let data = node.data_mut();
            if failures {
                data.flags |= NodeFlags::HAS_FAILED_CHILDREN;
            }
            if solutions {
                data.flags |= NodeFlags::HAS_SOLVED_CHILDREN;
            }
            assert!(
                data.open_children > 0,
                "node {id:?} closed more children than it has"
            );
            data.open_children -= 1;
            if data.open_children > 0 {
                if solutions {
                    self.propagate_solved(parent);
                }
                return;
            }
            data.copy = None;
            failures = data.has_failed_children();
            solutions = data.has_solved_children();
            match parent {
                Some(p) => id = p,
                None => return,
            }
        }
    }

    fn propagate_solved(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            let node = self.nodes.node_mut(id);
            if node.data().has_solved_children() {
                return;
            }
            node.data_mut().flags |= NodeFlags::HAS_SOLVED_CHILDREN;
            current = node.parent();
        }
    }

    /// Acquire a fresh space for `id` and hand over ownership.
    ///
    /// The node keeps its status; its space can be rebuilt again later.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn take_space(&mut self, id: NodeId) -> S {
        self.acquire_space(id);
        self.nodes
            .data_mut(id)
            .working
            .take()
            .expect("acquired node holds a working space")
    }

    /// Release every retained and transient space below (and at) `id`.
    ///
    /// Statuses are untouched; spaces are recomputed from the origin when
    /// needed again.
    pub fn purge(&mut self, id: NodeId) {
        if !self.nodes.is_alive(id) {
            return;
        }
        let mut cursor = PurgeCursor::new(self, id);
        walk_post_order(&mut cursor);
    }

    /// Statistics of the subtree rooted at `id`, with depths relative to `id`.
    pub fn subtree_statistics(&self, id: NodeId) -> Statistics {
        if !self.nodes.is_alive(id) {
            return Statistics::default();
        }
        let mut cursor = StatCursor::new(self, id);
        walk_pre_order(&mut cursor);
        cursor.statistics()
    }

    /// The nearest solution after `id` in depth-first order, or before it when
    /// `backwards` is set. Only materialized nodes are considered, and
    /// subtrees without solutions are skipped.
    pub fn next_solution(&self, id: NodeId, backwards: bool) -> Option<NodeId> {
        if !self.nodes.is_alive(id) {
            return None;
        }
        if backwards {
            let mut current = id;
            loop {
                match self.nodes.prev_sibling(current) {
                    Some(sibling) => {
                        if let Some(found) = self.last_solution_in(sibling) {
                            return Some(found);
                        }
                        current = sibling;
                    }
                    None => current = self.nodes.parent_of(current)?,
                }
            }
        } else {
            if let Some(found) = self
                .nodes
                .children_of(id)
                .iter()
                .find_map(|&child| self.first_solution_in(child))
            {
                return Some(found);
            }
            let mut current = id;
            loop {
                match self.nodes.next_sibling(current) {
                    Some(sibling) => {
                        if let Some(found) = self.first_solution_in(sibling) {
                            return Some(found);
                        }
                        current = sibling;
                    }
                    None => current = self.nodes.parent_of(current)?,
                }
            }
        }
    }

    fn leads_to_solution(&self, id: NodeId) -> bool {
        let data = self.nodes.data(id);
        data.status() == NodeStatus::Solved || data.has_solved_children()
    }

    fn first_solution_in(&self, id: NodeId) -> Option<NodeId> {
        if !self.leads_to_solution(id) {
            return None;
        }
        if self.nodes.data(id).status() == NodeStatus::Solved {
            return Some(id);
        }
        self.nodes
            .children_of(id)
            .iter()
            .find_map(|&child| self.first_solution_in(child))
    }

    fn last_solution_in(&self, id: NodeId) -> Option<NodeId> {
        if !self.leads_to_solution(id) {
            return None;
        }
        if self.nodes.data(id).status() == NodeStatus::Solved {
            return Some(id);
        }
        self.nodes
            .children_of(id)
            .iter()
            .rev()
            .find_map(|&child| self.last_solution_in(child))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecomputationConfig;
    use crate::recompute::Acquired;
    use crate::testing::{Arity, MinSum, Outcome, Scripted, full_binary, left_chain};
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicBool, Ordering};

    fn plain(rule: fn(&[u32]) -> Outcome) -> SearchTree<Scripted> {
        let config = TreeConfig::default().with_recomputation(RecomputationConfig::none());
        SearchTree::with_config(Scripted::new(rule), config)
    }

    fn explore_all<S: Space, X: NodeExtension>(tree: &mut SearchTree<S, X>) {
        let mut pending = vec![tree.root()];
        while let Some(node) = pending.pop() {
            let n = tree.number_of_children(node);
            pending.extend((0..n).rev().filter_map(|i| tree.child(node, i)));
        }
    }

    /// Follows alternative 0 down to the leaf and returns the path.
    fn dive<S: Space, X: NodeExtension>(tree: &mut SearchTree<S, X>) -> Vec<NodeId> {
        let mut path = vec![tree.root()];
        let mut node = tree.root();
        while tree.number_of_children(node) > 0 {
            node = tree.child(node, 0).unwrap();
            path.push(node);
        }
        path
    }

    #[test]
    fn full_exploration_closes_the_root() {
        let mut tree = plain(full_binary);
        explore_all(&mut tree);
        let stats = tree.statistics();
        assert_eq!(stats.solutions, 4);
        assert_eq!(stats.choices, 3);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.undetermined, 0);
        assert_eq!(stats.max_depth, 2);
        let root = tree.root();
        assert!(!tree.is_open(root));
        assert!(tree.has_solved_children(root));
        assert!(!tree.has_failed_children(root));
        assert!(!tree.node(root).unwrap().has_copy(), "closed nodes drop their copy");
    }

    #[test]
    fn number_of_children_is_idempotent() {
        let mut tree = plain(full_binary);
        let root = tree.root();
        assert_eq!(tree.number_of_children(root), 2);
        let commits = tree.origin().commits();
        let clones = tree.origin().clones();
        let stats = tree.statistics();
        assert_eq!(tree.number_of_children(root), 2);
        assert_eq!(tree.origin().commits(), commits);
        assert_eq!(tree.origin().clones(), clones);
        assert_eq!(tree.statistics(), stats);
        assert_eq!(tree.children_of(root).len(), 2);
    }

    #[test]
    fn failures_and_solutions_roll_up() {
        fn rule(path: &[u32]) -> Outcome {
            match path {
                [] | [0] => Outcome::Branch(2),
                [1] => Outcome::Fail,
                _ => Outcome::Solve,
            }
        }
        let mut tree = plain(rule);
        let root = tree.root();
        tree.number_of_children(root);
        let left = tree.child(root, 0).unwrap();
        let right = tree.child(root, 1).unwrap();
        assert_eq!(tree.number_of_children(right), 0);
        assert_eq!(tree.status(right), Some(NodeStatus::Failed));
        assert!(tree.has_failed_children(root));
        assert!(!tree.has_solved_children(root));
        assert_eq!(tree.open_children(root), 1);

        tree.number_of_children(left);
        let leaf = tree.child(left, 1).unwrap();
        tree.number_of_children(leaf);
        assert!(tree.has_solved_children(left));
        assert!(tree.has_solved_children(root), "solutions propagate while still open");
        assert!(tree.is_open(root));

        explore_all(&mut tree);
        assert!(!tree.is_open(root));
        assert_eq!(tree.statistics().failures, 1);
        assert_eq!(tree.statistics().solutions, 2);
    }

    #[test]
    fn first_child_receives_a_donation_and_siblings_recompute() {
        let mut tree = plain(full_binary);
        let root = tree.root();
        tree.number_of_children(root);
        let left = tree.child(root, 0).unwrap();
        let right = tree.child(root, 1).unwrap();
        assert_eq!(tree.acquire_space(left), Acquired::Donated);
        assert!(!tree.node(root).unwrap().has_working_space());
        assert_eq!(tree.acquire_space(left), Acquired::Present);
        assert_eq!(tree.acquire_space(right), Acquired::Recomputed { replayed: 1 });
        assert_eq!(tree.take_space(right).path, vec![1]);
        assert_eq!(tree.take_space(left).path, vec![0]);
        assert_eq!(tree.recomputation_stats().donations, 1);
    }

    #[test]
    fn solved_leaf_space_is_rebuilt_on_request() {
        let mut tree = plain(left_chain::<4>);
        let path = dive(&mut tree);
        let leaf = *path.last().unwrap();
        assert_eq!(tree.status(leaf), Some(NodeStatus::Solved));
        assert!(!tree.node(leaf).unwrap().has_working_space());
        let space = tree.take_space(leaf);
        assert_eq!(space.path, vec![0, 0, 0, 0]);
        // The node keeps its status after handing out a space.
        assert_eq!(tree.status(leaf), Some(NodeStatus::Solved));
    }

    #[test]
    fn fixed_distance_snapshots_once_while_replaying() {
        let mut tree = plain(left_chain::<10>);
        let path = dive(&mut tree);
        let leaf = path[10];
        tree.set_config(
            TreeConfig::default()
                .with_recomputation(RecomputationConfig::none().with_fixed_distance(Some(2))),
        );
        let before = tree.recomputation_stats();
        assert_eq!(tree.acquire_space(leaf), Acquired::Recomputed { replayed: 10 });
        let after = tree.recomputation_stats();
        assert_eq!(after.recomputations - before.recomputations, 1);
        assert_eq!(after.replayed - before.replayed, 10);
        assert_eq!(after.copies - before.copies, 1);
        let with_copy: Vec<usize> = (1..10)
            .filter(|&depth| tree.node(path[depth]).unwrap().has_copy())
            .collect();
        assert_eq!(with_copy, vec![3]);
        assert_eq!(tree.node(leaf).unwrap().distance(), 7);
    }

    #[test]
    fn single_child_chain_recomputes_from_the_root_snapshot() {
        fn rule(path: &[u32]) -> Outcome {
            if path.len() == 10 {
                Outcome::Solve
            } else {
                Outcome::Branch(1)
            }
        }
        let mut tree = plain(rule);
        let path = dive(&mut tree);
        assert_eq!(path.len(), 11);
        // Last-alternative hand-downs moved the root copy; start from the root only.
        tree.purge(tree.root());
        tree.set_config(
            TreeConfig::default()
                .with_recomputation(RecomputationConfig::none().with_fixed_distance(Some(2))),
        );
        assert_eq!(tree.acquire_space(path[10]), Acquired::Recomputed { replayed: 10 });
        let with_copy: Vec<usize> = (0..10)
            .filter(|&depth| tree.node(path[depth]).unwrap().has_copy())
            .collect();
        assert_eq!(with_copy, vec![3]);
        assert_eq!(tree.take_space(path[10]).path.len(), 10);
    }

    #[test]
    fn adaptive_distance_snapshots_the_midpoint() {
        let mut tree = plain(left_chain::<10>);
        let path = dive(&mut tree);
        tree.set_config(
            TreeConfig::default()
                .with_recomputation(RecomputationConfig::none().with_adaptive_distance(Some(2))),
        );
        assert_eq!(tree.acquire_space(path[9]), Acquired::Recomputed { replayed: 9 });
        let with_copy: Vec<usize> = (1..10)
            .filter(|&depth| tree.node(path[depth]).unwrap().has_copy())
            .collect();
        assert_eq!(with_copy, vec![4]);
        // The next recomputation starts from that snapshot.
        tree.take_space(path[9]);
        assert_eq!(tree.acquire_space(path[8]), Acquired::Recomputed { replayed: 4 });
    }

    #[test]
    fn fixed_distance_retains_copies_on_acquisition() {
        let config = TreeConfig::default()
            .with_recomputation(RecomputationConfig::none().with_fixed_distance(Some(2)));
        let mut tree = SearchTree::<Scripted>::with_config(Scripted::new(left_chain::<6>), config);
        let path = dive(&mut tree);
        let with_copy: Vec<usize> = (1..6)
            .filter(|&depth| tree.node(path[depth]).unwrap().has_copy())
            .collect();
        // Each donation adds one action; depth 3 is the first branching node
        // more than two actions away from the root copy.
        assert_eq!(with_copy, vec![3]);
        assert_eq!(tree.recomputation_stats().copies, 1);
    }

    #[test]
    fn last_open_child_inherits_the_parent_copy() {
        fn rule(path: &[u32]) -> Outcome {
            match path {
                [] => Outcome::Branch(2),
                [0] => Outcome::Fail,
                _ => Outcome::Branch(2),
            }
        }
        let mut tree = plain(rule);
        let root = tree.root();
        tree.number_of_children(root);
        let left = tree.child(root, 0).unwrap();
        let right = tree.child(root, 1).unwrap();
        tree.number_of_children(left);
        assert_eq!(tree.open_children(root), 1);
        assert!(tree.node(root).unwrap().has_copy());

        tree.acquire_space(right);
        assert!(!tree.node(root).unwrap().has_copy());
        let right_node = tree.node(right).unwrap();
        assert!(right_node.has_copy());
        assert_eq!(right_node.distance(), 0);
        assert_eq!(tree.recomputation_stats().lao, 1);
    }

    #[test]
    fn later_children_see_the_incumbent_bound() {
        fn rule(path: &[u32]) -> Outcome {
            if path.len() == 2 {
                Outcome::Solve
            } else {
                Outcome::Branch(2)
            }
        }
        let mut tree = plain(rule).with_better(MinSum);
        explore_all(&mut tree);
        let root = tree.root();
        let first = tree.child(tree.child(root, 0).unwrap(), 0).unwrap();
        assert_eq!(tree.best(), Some(first));
        let stats = tree.statistics();
        // [0, 1] was created before [0, 0] was solved and is not pruned.
        assert_eq!(stats.solutions, 2);
        // Both children of [1] inherit the bound "sum < 0".
        assert_eq!(stats.failures, 2);

        let pruned = tree.child(tree.child(root, 1).unwrap(), 0).unwrap();
        assert_eq!(tree.node(pruned).unwrap().own_best(), Some(first));
        let rebuilt = tree.take_space(pruned);
        assert_eq!(rebuilt.bound, Some(0), "recomputation re-posts the bound");
    }

    #[test]
    fn incumbent_only_moves_on_improvement() {
        fn rule(path: &[u32]) -> Outcome {
            match path {
                [] => Outcome::Branch(3),
                _ => Outcome::Solve,
            }
        }
        // Solutions have cost 0, 1 and 2, all created before any is found.
        let mut tree = plain(rule).with_better(MinSum);
        explore_all(&mut tree);
        assert_eq!(tree.statistics().solutions, 3);
        assert_eq!(tree.best(), tree.child(tree.root(), 0));
    }

    #[test]
    fn purge_falls_back_to_the_origin() {
        let mut tree = plain(full_binary);
        let root = tree.root();
        tree.number_of_children(root);
        let right = tree.child(root, 1).unwrap();
        tree.purge(root);
        assert!(!tree.node(root).unwrap().has_copy());
        assert!(!tree.node(root).unwrap().has_working_space());
        assert_eq!(tree.acquire_space(right), Acquired::Recomputed { replayed: 1 });
        assert_eq!(tree.take_space(right).path, vec![1]);
        assert_eq!(tree.status(root), Some(NodeStatus::Branch));
    }

    /// Binary tree of depth two whose depth-one spaces fail once poisoned.
    #[derive(Clone, Debug)]
    struct Flaky {
        path: Vec<u32>,
        failed: bool,
        poisoned: Arc<AtomicBool>,
    }

    impl Space for Flaky {
        type Choice = Arity;
        fn status(&mut self) -> SpaceStatus {
            if self.path.len() == 1 && self.poisoned.load(Ordering::Relaxed) {
                self.failed = true;
            }
            if self.failed {
                SpaceStatus::Failed
            } else if self.path.len() == 2 {
                SpaceStatus::Solved
            } else {
                SpaceStatus::Branch
            }
        }
        fn choice(&self) -> Arity {
            Arity(2)
        }
        fn commit(&mut self, _: &Arity, alternative: u32) {
            self.path.push(alternative);
        }
        fn fail(&mut self) {
            self.failed = true;
        }
        fn failed(&self) -> bool {
            self.failed
        }
    }

    #[test]
    fn failed_midpoint_is_not_retained() {
        let poisoned = Arc::new(AtomicBool::new(false));
        let origin = Flaky {
            path: Vec::new(),
            failed: false,
            poisoned: Arc::clone(&poisoned),
        };
        let policy = RecomputationConfig::none().with_adaptive_distance(Some(1));
        let mut tree: SearchTree<Flaky> =
            SearchTree::with_config(origin, TreeConfig::default().with_recomputation(policy));
        let root = tree.root();
        tree.number_of_children(root);
        let upper = tree.child(root, 0).unwrap();
        tree.number_of_children(upper);
        let leaf = tree.child(upper, 0).unwrap();
        tree.purge(root);

        poisoned.store(true, Ordering::Relaxed);
        assert_eq!(tree.acquire_space(leaf), Acquired::Recomputed { replayed: 2 });
        assert!(!tree.node(upper).unwrap().has_copy());
        assert_eq!(tree.node(leaf).unwrap().distance(), 2);
        assert_eq!(tree.recomputation_stats().copies, 0);
        assert!(tree.take_space(leaf).failed());
    }

    #[test]
    fn reset_invalidates_every_id() {
        let mut tree = plain(full_binary);
        explore_all(&mut tree);
        let old_root = tree.root();
        let old_child = tree.child(old_root, 0).unwrap();
        tree.reset();
        assert!(!tree.is_alive(old_root));
        assert!(!tree.is_alive(old_child));
        assert_eq!(tree.status(old_child), None);
        assert_eq!(tree.statistics(), Statistics::root());
        assert_eq!(tree.status(tree.root()), Some(NodeStatus::Undetermined));
        explore_all(&mut tree);
        assert_eq!(tree.statistics().solutions, 4);
    }

    #[test]
    fn special_and_step_need_extensions() {
        let mut tree = plain(full_binary);
        let root = tree.root();
        assert_eq!(tree.add_step(root, 1), None);
        assert_eq!(tree.status(root), Some(NodeStatus::Undetermined));

        tree.set_config(tree.config().with_extensions(true));
        let step = tree.add_step(root, 3).unwrap();
        assert_eq!(tree.status(root), Some(NodeStatus::Step));
        assert_eq!(tree.children_of(root), &[step]);
        assert_eq!(tree.add_step(root, 1), None, "only undetermined nodes extend");

        let special = tree
            .add_special(step, Tightening::new("x", crate::Relation::Eq, 1))
            .unwrap();
        assert_eq!(tree.status(step), Some(NodeStatus::Special));
        // Scripted spaces have no named variables; tightening fails them.
        assert_eq!(tree.number_of_children(special), 0);
        assert_eq!(tree.status(special), Some(NodeStatus::Failed));
        assert!(!tree.is_open(root));
        assert!(tree.has_failed_children(root));
        assert_eq!(tree.statistics().choices, 2);
    }

    #[test]
    fn subtree_statistics_are_relative() {
        let mut tree = plain(full_binary);
        let root = tree.root();
        tree.number_of_children(root);
        let left = tree.child(root, 0).unwrap();
        tree.number_of_children(left);
        let stats = tree.subtree_statistics(left);
        assert_eq!(stats.choices, 1);
        assert_eq!(stats.undetermined, 2);
        assert_eq!(stats.max_depth, 1);
        assert_eq!(tree.subtree_statistics(root).nodes(), tree.statistics().nodes());
    }

    #[test]
    fn solutions_are_found_in_both_directions() {
        let mut tree = plain(full_binary);
        explore_all(&mut tree);
        let root = tree.root();
        let leaves: Vec<NodeId> = tree
            .children_of(root)
            .to_vec()
            .into_iter()
            .flat_map(|c| tree.children_of(c).to_vec())
            .collect();
        assert_eq!(tree.next_solution(root, false), Some(leaves[0]));
        assert_eq!(tree.next_solution(leaves[0], false), Some(leaves[1]));
        assert_eq!(tree.next_solution(leaves[1], false), Some(leaves[2]));
        assert_eq!(tree.next_solution(leaves[3], false), None);
        assert_eq!(tree.next_solution(leaves[3], true), Some(leaves[2]));
        assert_eq!(tree.next_solution(leaves[2], true), Some(leaves[1]));
        assert_eq!(tree.next_solution(leaves[0], true), None);
    }
}
