// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spacetree Canvas: an interactive controller for search trees.
//!
//! [`TreeCanvas`] owns a [`VisualTree`](spacetree_visual::VisualTree) behind a
//! single re-entrant lock and offers what an interactive search-tree viewer
//! needs:
//!
//! - a current node with up/down/left/right/root navigation and jumps to the
//!   next or previous solution;
//! - single-node expansion, inspection of a fresh space for the current node,
//!   and user-directed special and step children;
//! - hiding, unhiding, marking, path highlighting, layout and hit testing;
//! - depth-first search (all solutions or the first one) on a worker thread,
//!   reporting [`SearchEvent`]s over a channel and stoppable at any time.
//!
//! A stopped search leaves a consistent, partly explored tree; starting another
//! search resumes wherever nodes are still open.
//!
//! ## Example
//!
//! ```rust
//! use spacetree_canvas::{SearchEvent, SearchOptions, TreeCanvas};
//! use spacetree_fd::{FdSpace, ValueSelection};
//!
//! let mut model = FdSpace::new();
//! let x = model.int_var("x", 0, 3).unwrap();
//! let y = model.int_var("y", 0, 3).unwrap();
//! model.distinct(&[x, y]);
//! model.branch(&[x, y], ValueSelection::Enumerate);
//!
//! let mut canvas = TreeCanvas::new(model);
//! let events = canvas.events();
//! canvas.search(SearchOptions::all()).unwrap();
//! let outcome = events.iter().find(SearchEvent::is_terminal).unwrap();
//! assert!(matches!(outcome, SearchEvent::Finished { solutions: 12, .. }));
//!
//! assert!(canvas.next_solution());
//! let solution = canvas.inspect().unwrap();
//! assert_ne!(solution.value(x), solution.value(y));
//! ```

mod canvas;
mod error;
mod search;

pub use canvas::TreeCanvas;
pub use error::CanvasError;
pub use search::{SearchEvent, SearchMode, SearchOptions};
