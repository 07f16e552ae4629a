// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The interactive controller.

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use kurbo::{Point, Rect};
use log::{debug, info, warn};
use parking_lot::ReentrantMutex;
use spacetree_core::{NodeId, NodeStatus, Space, Statistics, Tightening, TreeConfig};
use spacetree_visual::VisualTree;

use crate::error::CanvasError;
use crate::search::{self, SearchEvent, SearchOptions};

/// Tree plus the node the user is looking at.
#[derive(Debug)]
pub(crate) struct CanvasState<S: Space> {
    pub(crate) tree: VisualTree<S>,
    pub(crate) current: NodeId,
}

/// Everything the worker thread shares with the canvas.
#[derive(Debug)]
pub(crate) struct Shared<S: Space> {
    /// Coarse lock held for every access to the tree.
    pub(crate) state: ReentrantMutex<RefCell<CanvasState<S>>>,
    pub(crate) cancel: AtomicBool,
    pub(crate) running: AtomicBool,
}

/// Interactive controller over a [`VisualTree`].
///
/// The canvas keeps a current node for keyboard-style navigation and runs
/// searches on a worker thread. The tree sits behind one re-entrant lock;
/// the worker takes it once per node expansion, so navigation, hiding and
/// layout stay responsive while a search runs. Requests that would change the
/// shape of the tree behind the worker's back fail with
/// [`CanvasError::SearchRunning`] instead.
#[derive(Debug)]
pub struct TreeCanvas<S>
where
    S: Space + Send + 'static,
    S::Choice: Send,
{
    shared: Arc<Shared<S>>,
    worker: Option<JoinHandle<()>>,
    sender: Sender<SearchEvent>,
    events: Receiver<SearchEvent>,
}

impl<S> TreeCanvas<S>
where
    S: Space + Send + 'static,
    S::Choice: Send,
{
    /// A canvas over a fresh tree rooted at `root`.
    pub fn new(root: S) -> Self {
        Self::from_tree(VisualTree::new(root))
    }

    /// A canvas over a fresh tree with the given configuration.
    pub fn with_config(root: S, config: TreeConfig) -> Self {
        Self::from_tree(VisualTree::with_config(root, config))
    }

    /// A canvas over an existing tree; the root becomes the current node.
    pub fn from_tree(tree: VisualTree<S>) -> Self {
        let current = tree.root();
        let (sender, events) = unbounded();
        Self {
            shared: Arc::new(Shared {
                state: ReentrantMutex::new(RefCell::new(CanvasState { tree, current })),
                cancel: AtomicBool::new(false),
                running: AtomicBool::new(false),
            }),
            worker: None,
            sender,
            events,
        }
    }

    fn read<R>(&self, f: impl FnOnce(&CanvasState<S>) -> R) -> R {
        let guard = self.shared.state.lock();
        let state = guard.borrow();
        f(&state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut CanvasState<S>) -> R) -> R {
        let guard = self.shared.state.lock();
        let mut state = guard
            .try_borrow_mut()
            .expect("the canvas cannot be changed from inside `TreeCanvas::with_tree`");
        f(&mut state)
    }

    fn ensure_idle(&self) -> Result<(), CanvasError> {
        if self.is_searching() {
            Err(CanvasError::SearchRunning)
        } else {
            Ok(())
        }
    }

    /// Run `f` with shared access to the tree, under the lock.
    ///
    /// `f` may query the canvas, but must not call methods that change it
    /// (navigation, expansion, hiding, layout and so on).
    ///
    /// # Panics
    ///
    /// Panics if `f` tries to change the canvas.
    pub fn with_tree<R>(&self, f: impl FnOnce(&VisualTree<S>) -> R) -> R {
        self.read(|state| f(&state.tree))
    }

    /// Events from searches started on this canvas.
    pub fn events(&self) -> Receiver<SearchEvent> {
        self.events.clone()
    }

    /// Whether a search is running.
    pub fn is_searching(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Statistics of the whole tree.
    pub fn statistics(&self) -> Statistics {
        self.read(|state| state.tree.statistics())
    }

    /// Statistics of the subtree below the current node.
    pub fn subtree_statistics(&self) -> Statistics {
        self.read(|state| state.tree.tree().subtree_statistics(state.current))
    }

    /// The node the user is looking at.
    pub fn current(&self) -> NodeId {
        self.read(|state| state.current)
    }

    /// Make `id` the current node.
    pub fn set_current(&self, id: NodeId) -> Result<(), CanvasError> {
        self.write(|state| {
            if !state.tree.tree().is_alive(id) {
                return Err(CanvasError::StaleNode(id));
            }
            state.current = id;
            Ok(())
        })
    }

    fn navigate(&self, target: impl FnOnce(&CanvasState<S>) -> Option<NodeId>) -> bool {
        self.write(|state| match target(state) {
            Some(next) => {
                state.current = next;
                true
            }
            None => false,
        })
    }

    /// Move to the parent. Returns whether the current node changed.
    pub fn move_up(&self) -> bool {
        self.navigate(|state| state.tree.tree().parent_of(state.current))
    }

    /// Move to the first child, unless the current node is hidden.
    pub fn move_down(&self) -> bool {
        self.navigate(|state| {
            if state
                .tree
                .state(state.current)
                .is_some_and(|s| s.is_hidden())
            {
                return None;
            }
            state.tree.tree().child(state.current, 0)
        })
    }

    /// Move to the previous sibling.
    pub fn move_left(&self) -> bool {
        self.navigate(|state| {
            let tree = state.tree.tree();
            let alternative = tree.alternative_of(state.current)?.checked_sub(1)?;
            tree.child(tree.parent_of(state.current)?, alternative)
        })
    }

    /// Move to the next sibling.
    pub fn move_right(&self) -> bool {
        self.navigate(|state| {
            let tree = state.tree.tree();
            let alternative = tree.alternative_of(state.current)? + 1;
            tree.child(tree.parent_of(state.current)?, alternative)
        })
    }

    /// Move to the root.
    pub fn move_to_root(&self) -> bool {
        self.navigate(|state| {
            let root = state.tree.root();
            (root != state.current).then_some(root)
        })
    }

    /// Move to the nearest solution after the current node in depth-first order.
    pub fn next_solution(&self) -> bool {
        self.navigate(|state| state.tree.tree().next_solution(state.current, false))
    }

    /// Move to the nearest solution before the current node in depth-first order.
    pub fn prev_solution(&self) -> bool {
        self.navigate(|state| state.tree.tree().next_solution(state.current, true))
    }

    /// Move to the visible node under `point`, as of the last layout.
    pub fn select_at(&self, point: Point) -> bool {
        self.navigate(|state| state.tree.find_node(point))
    }

    /// Resolve the current node and return its number of children.
    pub fn expand_current(&self) -> Result<u32, CanvasError> {
        self.ensure_idle()?;
        Ok(self.write(|state| {
            let current = state.current;
            state.tree.number_of_children(current)
        }))
    }

    /// A fresh space for the current node, handed over to the caller.
    pub fn inspect(&self) -> Result<S, CanvasError> {
        self.ensure_idle()?;
        Ok(self.write(|state| {
            let current = state.current;
            state.tree.take_space(current)
        }))
    }

    fn extend(
        &self,
        add: impl FnOnce(&mut VisualTree<S>, NodeId) -> Option<NodeId>,
    ) -> Result<NodeId, CanvasError> {
        self.ensure_idle()?;
        self.write(|state| {
            if !state.tree.tree().config().extensions {
                return Err(CanvasError::ExtensionsDisabled);
            }
            let current = state.current;
            let child = add(&mut state.tree, current).ok_or(CanvasError::NotExpandable(current))?;
            state.current = child;
            Ok(child)
        })
    }

    /// Give the current node a special child tightening a named variable,
    /// and move to it.
    pub fn add_special(&self, tightening: Tightening) -> Result<NodeId, CanvasError> {
        self.extend(|tree, id| tree.add_special(id, tightening))
    }

    /// Give the current node a step child applying `steps` propagation
    /// steps, and move to it.
    pub fn add_step(&self, steps: u32) -> Result<NodeId, CanvasError> {
        self.extend(|tree, id| tree.add_step(id, steps))
    }

    /// Collapse or expand the subtree below the current node.
    pub fn toggle_hidden(&self) -> bool {
        self.write(|state| {
            let current = state.current;
            state.tree.toggle_hidden(current)
        })
    }

    /// Collapse the failed subtrees below the current node.
    pub fn hide_failed(&self) -> u32 {
        self.write(|state| {
            let current = state.current;
            state.tree.hide_failed(current)
        })
    }

    /// Expand everything below the current node.
    pub fn unhide_all(&self) {
        self.write(|state| {
            let current = state.current;
            state.tree.unhide_all(current);
        });
    }

    /// Flip the user mark on the current node.
    pub fn toggle_marked(&self) {
        self.write(|state| {
            let current = state.current;
            let marked = state.tree.state(current).is_some_and(|s| s.is_marked());
            state.tree.set_marked(current, !marked);
        });
    }

    /// Highlight the path from the root to the current node.
    pub fn set_path(&self) {
        self.write(|state| {
            let current = state.current;
            state.tree.set_path(current);
        });
    }

    /// Refresh the layout and return the bounds of the tree.
    pub fn layout(&self) -> Rect {
        self.write(|state| state.tree.layout())
    }

    /// Start searching below the current node on a worker thread.
    ///
    /// Progress, solutions and the outcome are reported on [`TreeCanvas::events`].
    pub fn search(&mut self, options: SearchOptions) -> Result<(), CanvasError> {
        self.ensure_idle()?;
        self.join_worker();
        self.shared.cancel.store(false, Ordering::Relaxed);
        self.shared.running.store(true, Ordering::Release);
        let start = self.current();
        let shared = Arc::clone(&self.shared);
        let sender = self.sender.clone();
        self.worker = Some(thread::spawn(move || {
            search::run(&shared, start, options, &sender);
        }));
        Ok(())
    }

    /// Ask a running search to stop and wait until it has.
    pub fn stop(&mut self) {
        if self.is_searching() {
            info!("stopping search");
            self.shared.cancel.store(true, Ordering::Relaxed);
        }
        self.join_worker();
    }

    /// Wait until the running search, if any, ends on its own.
    pub fn wait(&mut self) {
        self.join_worker();
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            warn!("search worker panicked");
            self.shared.running.store(false, Ordering::Release);
        }
    }

    /// Drop the whole tree and start over at the root.
    pub fn reset(&mut self) -> Result<(), CanvasError> {
        self.ensure_idle()?;
        self.join_worker();
        self.write(|state| {
            state.tree.reset();
            state.current = state.tree.root();
        });
        debug!("canvas reset");
        Ok(())
    }

    /// Status of the current node.
    pub fn current_status(&self) -> NodeStatus {
        self.read(|state| {
            state
                .tree
                .tree()
                .status(state.current)
                .unwrap_or_default()
        })
    }
}

impl<S> Drop for TreeCanvas<S>
where
    S: Space + Send + 'static,
    S::Choice: Send,
{
    fn drop(&mut self) {
        self.stop();
    }
}
