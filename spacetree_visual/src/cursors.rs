// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whole-subtree presentation passes.

use alloc::vec::Vec;

use spacetree_core::{Cursor, NodeCursor, NodeId, NodeStatus, SearchTree, Space, SpaceNode};

use crate::state::{VisualFlags, VisualState};
use crate::tree::dirty_up;

/// Forwards the moves of a cursor except `may_move_downwards` to its `NodeCursor`.
macro_rules! forward_moves {
    () => {
        fn may_move_upwards(&self) -> bool {
            self.cursor.may_move_upwards(self.tree.nodes())
        }
        fn move_upwards(&mut self) {
            self.cursor.move_upwards(self.tree.nodes());
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
    };
}

/// Collapses every fully explored subtree that holds failures but no solution.
///
/// Already hidden subtrees are left alone, so running the pass twice hides
/// nothing new.
#[derive(Debug)]
pub(crate) struct HideFailedCursor<'a, S: Space> {
    tree: &'a mut SearchTree<S, VisualState>,
    cursor: NodeCursor,
    hidden: u32,
}

impl<'a, S: Space> HideFailedCursor<'a, S> {
    pub(crate) fn new(tree: &'a mut SearchTree<S, VisualState>, start: NodeId) -> Self {
        Self {
            tree,
            cursor: NodeCursor::new(start),
            hidden: 0,
        }
    }

    /// Nodes hidden so far.
    pub(crate) fn hidden(&self) -> u32 {
        self.hidden
    }
}

/// Whether the subtree below `node` is closed, failed somewhere, and solved nowhere.
pub(crate) fn is_hideable<S: Space>(node: &SpaceNode<S, VisualState>) -> bool {
    matches!(
        node.status(),
        NodeStatus::Branch | NodeStatus::Special | NodeStatus::Step
    ) && !node.is_open()
        && !node.has_solved_children()
        && node.has_failed_children()
}

impl<S: Space> Cursor for HideFailedCursor<'_, S> {
    forward_moves!();

    fn may_move_downwards(&self) -> bool {
        // Failures below an open node only reach it once its subtree closes,
        // so open subtrees are searched too.
        let data = self.tree.nodes().data(self.cursor.node());
        !data.ext().is_hidden()
            && (data.is_open() || data.has_solved_children() || data.has_failed_children())
            && self.cursor.may_move_downwards(self.tree.nodes())
    }

    fn process_current_node(&mut self) {
        let id = self.cursor.node();
        let data = self.tree.nodes().data(id);
        if data.ext().is_hidden() || !is_hideable(data) {
            return;
        }
        if let Some(state) = self.tree.ext_mut(id) {
            state.flags.insert(VisualFlags::HIDDEN);
        }
        dirty_up(self.tree, id);
        self.hidden += 1;
    }
}

/// Expands every hidden node in a subtree.
#[derive(Debug)]
pub(crate) struct UnhideAllCursor<'a, S: Space> {
    tree: &'a mut SearchTree<S, VisualState>,
    cursor: NodeCursor,
}

impl<'a, S: Space> UnhideAllCursor<'a, S> {
    pub(crate) fn new(tree: &'a mut SearchTree<S, VisualState>, start: NodeId) -> Self {
        Self {
            tree,
            cursor: NodeCursor::new(start),
        }
    }
}

impl<S: Space> Cursor for UnhideAllCursor<'_, S> {
    forward_moves!();

    fn may_move_downwards(&self) -> bool {
        self.cursor.may_move_downwards(self.tree.nodes())
    }

    fn process_current_node(&mut self) {
        let id = self.cursor.node();
        let Some(state) = self.tree.ext_mut(id) else {
            return;
        };
        if state.is_hidden() {
            state.flags.remove(VisualFlags::HIDDEN);
            dirty_up(self.tree, id);
        }
    }
}

/// Samples a raw heat value at every node of a subtree.
pub(crate) struct HeatCursor<'a, S: Space, F> {
    tree: &'a SearchTree<S, VisualState>,
    cursor: NodeCursor,
    measure: F,
    samples: Vec<(NodeId, f64)>,
}

impl<S: Space, F> core::fmt::Debug for HeatCursor<'_, S, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeatCursor")
            .field("cursor", &self.cursor)
            .field("samples", &self.samples.len())
            .finish_non_exhaustive()
    }
}

impl<'a, S, F> HeatCursor<'a, S, F>
where
    S: Space,
    F: FnMut(NodeId, &SpaceNode<S, VisualState>) -> f64,
{
    pub(crate) fn new(tree: &'a SearchTree<S, VisualState>, start: NodeId, measure: F) -> Self {
        Self {
            tree,
            cursor: NodeCursor::new(start),
            measure,
            samples: Vec::new(),
        }
    }

    pub(crate) fn into_samples(self) -> Vec<(NodeId, f64)> {
        self.samples
    }
}

impl<S, F> Cursor for HeatCursor<'_, S, F>
where
    S: Space,
    F: FnMut(NodeId, &SpaceNode<S, VisualState>) -> f64,
{
    forward_moves!();

    fn may_move_downwards(&self) -> bool {
        self.cursor.may_move_downwards(self.tree.nodes())
    }

    fn process_current_node(&mut self) {
        let id = self.cursor.node();
        let raw = (self.measure)(id, self.tree.nodes().data(id));
        self.samples.push((id, raw));
    }
}

/// Map raw samples linearly onto `0..=255`. Non-finite samples count as cold.
pub(crate) fn normalize(samples: &[(NodeId, f64)]) -> Vec<(NodeId, u8)> {
    let finite = || samples.iter().map(|&(_, v)| v).filter(|v| v.is_finite());
    let lo = finite().fold(f64::INFINITY, f64::min);
    let hi = finite().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    samples
        .iter()
        .map(|&(id, v)| {
            let heat = if !v.is_finite() || span.is_nan() || span <= 0.0 {
                0
            } else {
                scale((v - lo) / span)
            };
            (id, heat)
        })
        .collect()
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "the scaled value lies in 0..=255."
)]
fn scale(t: f64) -> u8 {
    (t * 255.0 + 0.5) as u8
}
