// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spacetree Core: a lazily materialized search tree for propagation-based
//! constraint solvers.
//!
//! The tree records the decisions of a depth-first (or user-driven) search
//! over the spaces of an engine implementing [`Space`]. It does not store a
//! space at every node:
//!
//! - a parent hands its transient space to the first child that asks for one;
//! - any other node rebuilds its space by replaying branching decisions from
//!   the nearest retained snapshot;
//! - a [`RecomputationConfig`] decides where snapshots are kept, bounding the
//!   replay length (fixed distance) and halving long replays (adaptive).
//!
//! Nodes also track rollup state (open children, failed or solved
//! descendants) and, when a [`Better`] comparator is installed, the incumbent
//! solution for branch-and-bound. Every node remembers the incumbent that was
//! current when it was created, so recomputed spaces carry exactly the
//! bounds that were active during the original search.
//!
//! Per-node data for higher layers is attached through [`NodeExtension`];
//! whole-subtree walks are expressed as [`Cursor`]s.
//!
//! ## Example
//!
//! ```rust
//! use spacetree_core::{Choice, RecomputationConfig, SearchTree, Space, SpaceStatus, TreeConfig};
//!
//! // Counts down from a number, branching into "minus one" and "minus two".
//! #[derive(Clone, Debug)]
//! struct Countdown(i32);
//!
//! #[derive(Clone, Debug)]
//! struct Two;
//!
//! impl Choice for Two {
//!     fn alternatives(&self) -> u32 {
//!         2
//!     }
//! }
//!
//! impl Space for Countdown {
//!     type Choice = Two;
//!     fn status(&mut self) -> SpaceStatus {
//!         match self.0 {
//!             0 => SpaceStatus::Solved,
//!             n if n < 0 => SpaceStatus::Failed,
//!             _ => SpaceStatus::Branch,
//!         }
//!     }
//!     fn choice(&self) -> Two {
//!         Two
//!     }
//!     fn commit(&mut self, _: &Two, alternative: u32) {
//!         self.0 -= alternative as i32 + 1;
//!     }
//!     fn fail(&mut self) {
//!         self.0 = -1;
//!     }
//!     fn failed(&self) -> bool {
//!         self.0 < 0
//!     }
//! }
//!
//! let config = TreeConfig::default().with_recomputation(RecomputationConfig::none());
//! let mut tree: SearchTree<Countdown> = SearchTree::with_config(Countdown(4), config);
//!
//! // Explore everything depth first.
//! let mut pending = vec![tree.root()];
//! while let Some(node) = pending.pop() {
//!     let n = tree.number_of_children(node);
//!     pending.extend((0..n).rev().filter_map(|i| tree.child(node, i)));
//! }
//!
//! // Compositions of 4 into parts of one and two.
//! assert_eq!(tree.statistics().solutions, 5);
//! assert!(!tree.is_open(tree.root()));
//! ```

#![no_std]

extern crate alloc;

mod best;
mod config;
mod cursor;
mod node;
mod recompute;
mod space;
mod space_node;
mod stats;
mod tree;
mod types;

#[cfg(test)]
mod testing;

pub use best::BestNode;
pub use config::{RecomputationConfig, TreeConfig};
pub use cursor::{Cursor, NodeCursor, StatCursor, walk_post_order, walk_pre_order};
pub use node::{Node, NodeArena};
pub use recompute::Acquired;
pub use space::{Better, Choice, Relation, Space, SpaceStatus, Tightening};
pub use space_node::{Description, NodeExtension, SpaceNode};
pub use stats::{RecomputationStats, Statistics};
pub use tree::SearchTree;
pub use types::{NodeFlags, NodeId, NodeStatus};
