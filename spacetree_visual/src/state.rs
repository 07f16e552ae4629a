// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node presentation state.

use kurbo::Rect;
use spacetree_core::NodeExtension;

bitflags::bitflags! {
    /// Presentation flags of a node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct VisualFlags: u8 {
        /// The subtree below this node is collapsed.
        const HIDDEN  = 0b0000_0001;
        /// Marked by the user.
        const MARKED  = 0b0000_0010;
        /// On the highlighted path from the root.
        const ON_PATH = 0b0000_0100;
        /// Cached layout of this subtree is out of date.
        ///
        /// Every ancestor of a dirty node is dirty as well.
        const DIRTY   = 0b0000_1000;
    }
}

/// Presentation state attached to every node of a [`VisualTree`](crate::VisualTree).
///
/// Everything here derives from the search state plus user toggles, so it can
/// be thrown away and recomputed at any time.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualState {
    /// Presentation flags.
    pub flags: VisualFlags,
    /// Horizontal offset of this node's centre relative to its parent's.
    pub offset: f64,
    /// Bounding box of the laid out subtree, relative to this node's position.
    pub bounds: Rect,
    /// Heat value, normalized to `0..=255` by the last heat pass.
    pub heat: u8,
}

impl VisualState {
    /// Whether the subtree below is collapsed.
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(VisualFlags::HIDDEN)
    }

    /// Whether the user marked this node.
    pub fn is_marked(&self) -> bool {
        self.flags.contains(VisualFlags::MARKED)
    }

    /// Whether this node is on the highlighted path.
    pub fn is_on_path(&self) -> bool {
        self.flags.contains(VisualFlags::ON_PATH)
    }

    /// Whether the cached layout is out of date.
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(VisualFlags::DIRTY)
    }
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            flags: VisualFlags::DIRTY,
            offset: 0.0,
            bounds: Rect::ZERO,
            heat: 0,
        }
    }
}

impl NodeExtension for VisualState {
    fn root() -> Self {
        Self::default()
    }

    fn child(_parent: &Self, _alternative: u32) -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_nodes_need_layout() {
        let root = VisualState::root();
        assert!(root.is_dirty());
        assert!(!root.is_hidden());
        let child = VisualState::child(&root, 3);
        assert_eq!(child.flags, VisualFlags::DIRTY);
        assert_eq!(child.heat, 0);
    }
}
