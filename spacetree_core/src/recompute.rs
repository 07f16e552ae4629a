// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Space acquisition: donation, recomputation, and copy retention.
//!
//! A node obtains a space in one of three ways:
//!
//! - it still holds the transient space it was given earlier;
//! - its parent holds one and donates it, replaying a single action;
//! - the path from the nearest retained snapshot is replayed.
//!
//! Replay posts "better than" constraints wherever the incumbent recorded on
//! a node differs from the one already applied, so a recomputed space always
//! carries the bound that was active when its node was created.

use alloc::vec::Vec;

use log::trace;

use crate::space::{Space, SpaceStatus};
use crate::space_node::{Description, NodeExtension};
use crate::tree::SearchTree;
use crate::types::{NodeId, NodeStatus};

/// How [`SearchTree::acquire_space`] obtained a node's space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Acquired {
    /// The node already held a transient space.
    Present,
    /// The parent handed over its transient space.
    Donated,
    /// The space was rebuilt from a snapshot.
    Recomputed {
        /// Actions replayed to rebuild it: the length of the path from the
        /// snapshot, even when the space failed on the way.
        replayed: u32,
    },
}

impl<S: Space, X: NodeExtension> SearchTree<S, X> {
    /// Make sure `id` holds a transient space consistent with its position.
    ///
    /// Unless `id` is the child of a special or step node, the space is
    /// propagated to fixpoint. A branching space far enough from its snapshot
    /// is retained as a new snapshot, and a last open child may inherit its
    /// parent's snapshot.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn acquire_space(&mut self, id: NodeId) -> Acquired {
        let node = self.nodes.node(id);
        let parent = node.parent();
        let acquired = if node.data().working.is_some() {
            Acquired::Present
        } else if let Some(p) = parent
            && self.nodes.data(p).working.is_some()
        {
            self.donate_space(p, id);
            Acquired::Donated
        } else {
            Acquired::Recomputed {
                replayed: self.recompute(id),
            }
        };

        if !self.below_extension(id) {
            let policy = self.config.recomputation;
            let data = self.nodes.data_mut(id);
            let space = data
                .working
                .as_mut()
                .expect("acquired node holds a working space");
            if space.status() == SpaceStatus::Branch
                && data.copy.is_none()
                && policy.exceeds(data.distance)
            {
                trace!("retaining a copy at {id:?} ({} actions away)", data.distance);
                data.copy = Some(space.clone());
                data.distance = 0;
                self.counters.copies += 1;
            }
        }
        self.check_lao(id);
        acquired
    }

    /// Whether `id` hangs below a special or step node. Such spaces are only
    /// propagated to fixpoint when the node is expanded, so that step
    /// children can advance propagation one step at a time.
    pub(crate) fn below_extension(&self, id: NodeId) -> bool {
        self.nodes
            .parent_of(id)
            .is_some_and(|p| self.nodes.data(p).is_extension())
    }

    fn donate_space(&mut self, parent: NodeId, child: NodeId) {
        let desc = self
            .nodes
            .data(parent)
            .description()
            .cloned()
            .unwrap_or_else(|| panic!("node {parent:?} has children but no description"));
        let mut space = self
            .nodes
            .data_mut(parent)
            .working
            .take()
            .expect("donor holds a working space");
        let alternative = self.nodes.node(child).alternative();
        self.apply(&mut space, parent, &desc, alternative);

        let own_best = self.nodes.data(child).own_best;
        if let Some(best) = own_best
            && own_best != self.nodes.data(parent).own_best
        {
            self.constrain_with(&mut space, best);
        }

        let distance = self.nodes.data(parent).distance + 1;
        let data = self.nodes.data_mut(child);
        data.working = Some(space);
        data.distance = distance;
        self.counters.donations += 1;
        trace!("{parent:?} donated its space to alternative {alternative}");
    }

    /// Derive child `alternative` of `node` from `space`, which holds `node`'s state.
    fn apply(&self, space: &mut S, node: NodeId, desc: &Description<S::Choice>, alternative: u32) {
        match desc {
            Description::Branch(choice) => space.commit(choice, alternative),
            Description::Special(tightening) => {
                if !self.below_extension(node) {
                    let _ = space.status();
                }
                space.tighten(tightening);
            }
            Description::Step(steps) => {
                if !self.below_extension(node) {
                    let _ = space.status();
                }
                for _ in 0..*steps {
                    space.step();
                }
            }
        }
    }

    /// Post "better than the space of `best`" on `space`.
    fn constrain_with(&mut self, space: &mut S, best: NodeId) {
        self.acquire_space(best);
        let reference = self
            .nodes
            .data(best)
            .working
            .as_ref()
            .expect("acquired node holds a working space");
        if let Some(record) = &self.best {
            record.better.constrain(space, reference);
        }
    }

    /// Rebuild the space of `id` from the nearest snapshot above it.
    ///
    /// Returns the number of actions replayed.
    fn recompute(&mut self, id: NodeId) -> u32 {
        // Nodes strictly below the snapshot, target first.
        let mut path = Vec::new();
        let mut current = id;
        let snapshot = loop {
            if self.nodes.data(current).copy.is_some() {
                break Some(current);
            }
            path.push(current);
            match self.nodes.parent_of(current) {
                Some(p) => current = p,
                None => break None,
            }
        };
        let (origin, mut space) = match snapshot {
            Some(node) => {
                let copy = self.nodes.data(node).copy.clone();
                (node, copy.expect("snapshot holds a copy"))
            }
            None => {
                // The root itself released its copy; fall back to the origin.
                path.pop();
                (self.root, self.origin.clone())
            }
        };
        path.reverse();
        #[allow(
            clippy::cast_possible_truncation,
            reason = "paths are bounded by the u32 depth of the tree."
        )]
        let len = path.len() as u32;

        if !self.below_extension(origin) {
            let _ = space.status();
        }

        let policy = self.config.recomputation;
        let mut last_best = None;
        let mut last_snapshot = 0;
        let mut waypoint_taken = false;
        let mut parent = origin;
        let mut at = 0;
        for &node in &path {
            at += 1;
            let desc = self
                .nodes
                .data(parent)
                .description()
                .cloned()
                .unwrap_or_else(|| panic!("node {parent:?} has children but no description"));
            let alternative = self.nodes.node(node).alternative();
            self.apply(&mut space, parent, &desc, alternative);
            self.counters.replayed += 1;

            let own_best = self.nodes.data(node).own_best;
            if let Some(best) = own_best
                && own_best != last_best
            {
                self.constrain_with(&mut space, best);
                last_best = own_best;
            }

            let data = self.nodes.data(node);
            if node != id && data.status() == NodeStatus::Branch && data.copy.is_none() {
                let midpoint = policy.adaptive_midpoint(at, len);
                let waypoint = !waypoint_taken && policy.fixed_waypoint(at, len);
                if midpoint || waypoint {
                    waypoint_taken |= waypoint;
                    // A failed space stays failed; replay goes on without a copy.
                    if space.status() == SpaceStatus::Failed {
                        trace!("replay towards {id:?} failed at depth offset {at}");
                    } else {
                        trace!("retaining a copy at {node:?} while replaying towards {id:?}");
                        self.nodes.data_mut(node).copy = Some(space.clone());
                        self.nodes.data_mut(node).distance = 0;
                        self.counters.copies += 1;
                        last_snapshot = at;
                    }
                }
            }
            parent = node;
        }

        let target = self.nodes.data_mut(id);
        target.working = Some(space);
        target.distance = len - last_snapshot;
        self.counters.recomputations += 1;
        trace!("recomputed {id:?} replaying {len} actions from {origin:?}");
        len
    }

    /// Hand the parent's snapshot down to its last open child.
    fn check_lao(&mut self, id: NodeId) {
        let node = self.nodes.node(id);
        let Some(parent) = node.parent() else {
            return;
        };
        let alternative = node.alternative();
        let data = node.data();
        if data.copy.is_some() || !data.is_open() {
            return;
        }
        let own_best = data.own_best;
        let parent_data = self.nodes.data(parent);
        if parent_data.copy.is_none() || parent_data.open_children != 1 {
            return;
        }
        let Some(desc @ Description::Branch(_)) = parent_data.description().cloned() else {
            return;
        };
        let parent_best = parent_data.own_best;

        let mut copy = self
            .nodes
            .data_mut(parent)
            .copy
            .take()
            .expect("parent holds a copy");
        self.apply(&mut copy, parent, &desc, alternative);
        if let Some(best) = own_best
            && own_best != parent_best
        {
            self.constrain_with(&mut copy, best);
        }
        if copy.status() == SpaceStatus::Failed {
            trace!("discarding the copy handed down to {id:?}");
            return;
        }
        let data = self.nodes.data_mut(id);
        data.copy = Some(copy);
        data.distance = 0;
        self.counters.lao += 1;
        trace!("{parent:?} handed its copy down to its last open child {id:?}");
    }
}
