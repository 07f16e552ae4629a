// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spacetree FD: a small finite-domain propagation engine.
//!
//! [`FdSpace`] implements the [`Space`](spacetree_core::Space) capability set
//! so that a [`SearchTree`](spacetree_core::SearchTree) can explore it:
//!
//! - integer variables over `0..=63`, stored as bitset [`Domain`]s;
//! - unary and binary relations, pairwise distinctness, and linear
//!   (in)equalities with bounds reasoning;
//! - k-way or binary branching on a list of variables;
//! - single-step propagation and tightening of named variables;
//! - branch-and-bound on one variable through [`Objective`].
//!
//! It is intentionally small: enough to exercise every path of the search
//! tree, not a competitive solver.
//!
//! ## Example
//!
//! ```rust
//! use spacetree_core::{NodeStatus, SearchTree};
//! use spacetree_fd::{FdSpace, Objective, ValueSelection};
//!
//! let mut model = FdSpace::new();
//! let x = model.int_var("x", 1, 3).unwrap();
//! model.branch(&[x], ValueSelection::Enumerate);
//!
//! let mut tree: SearchTree<FdSpace> = SearchTree::new(model).with_better(Objective::minimize(x));
//! let root = tree.root();
//! assert_eq!(tree.number_of_children(root), 3);
//! for i in 0..3 {
//!     let child = tree.child(root, i).unwrap();
//!     tree.number_of_children(child);
//!     assert_eq!(tree.status(child), Some(NodeStatus::Solved));
//! }
//! let best = tree.best().unwrap();
//! assert_eq!(tree.take_space(best).value(x), Some(1));
//! ```

#![no_std]

extern crate alloc;

mod domain;
mod error;
pub mod models;
mod objective;
mod propagator;
mod space;

pub use domain::{Domain, MAX_VALUE};
pub use error::ModelError;
pub use objective::{Objective, Sense};
pub use space::{FdChoice, FdSpace, ValueSelection, Var};
