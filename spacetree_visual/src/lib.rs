// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spacetree Visual: presentation state for search trees.
//!
//! [`VisualTree`] wraps a [`SearchTree`](spacetree_core::SearchTree) whose
//! nodes carry a [`VisualState`]: hidden, marked and on-path flags, a cached
//! bounding box with the node's offset from its parent, a heat value, and a
//! dirty flag. Everything here is derived from the search state plus user
//! toggles, so it can be recomputed from scratch at any time.
//!
//! - Expanding a node, hiding or unhiding marks the affected nodes and their
//!   ancestors dirty.
//! - [`VisualTree::layout`] refreshes the bounding boxes of dirty subtrees
//!   only; clean subtrees keep their cached geometry.
//! - [`VisualTree::find_node`] hit tests a point against the laid out tree,
//!   descending only into subtrees whose bounds contain it.
//! - [`VisualTree::hide_failed`] collapses every fully explored subtree that
//!   failed somewhere and holds no solution.
//!
//! Geometry uses [`kurbo`]. Nothing is rendered; drawing is left to the host.
//!
//! ## Example
//!
//! ```rust
//! use spacetree_fd::{FdSpace, ValueSelection};
//! use spacetree_visual::VisualTree;
//!
//! let mut model = FdSpace::new();
//! let x = model.int_var("x", 0, 2).unwrap();
//! model.branch(&[x], ValueSelection::Enumerate);
//!
//! let mut tree = VisualTree::new(model);
//! let root = tree.root();
//! assert_eq!(tree.number_of_children(root), 3);
//!
//! let bounds = tree.layout();
//! let middle = tree.tree().child(root, 1).unwrap();
//! let centre = tree.node_rect(middle).unwrap().center();
//! assert!(bounds.contains(centre));
//! assert_eq!(tree.find_node(centre), Some(middle));
//! ```

#![no_std]

extern crate alloc;

mod cursors;
mod layout;
mod state;
mod tree;

pub use layout::LayoutMetrics;
pub use state::{VisualFlags, VisualState};
pub use tree::VisualTree;
