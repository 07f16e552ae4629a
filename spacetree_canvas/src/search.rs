// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background depth-first search.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crossbeam_channel::Sender;
use log::{debug, info};
use spacetree_core::{NodeId, NodeStatus, Space, Statistics};

use crate::canvas::Shared;

/// How far a search goes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// Explore every open node below the start node.
    #[default]
    All,
    /// Stop at the first solution found.
    One,
}

/// Settings of a single search run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchOptions {
    /// How far to search.
    pub mode: SearchMode,
    /// Send a [`SearchEvent::Progress`] every this many expansions; zero
    /// disables progress reports.
    pub report_every: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::All,
            report_every: 256,
        }
    }
}

impl SearchOptions {
    /// Search until the first solution.
    pub fn one() -> Self {
        Self {
            mode: SearchMode::One,
            ..Self::default()
        }
    }

    /// Search the whole subtree.
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the progress interval.
    #[must_use]
    pub fn with_report_every(mut self, report_every: usize) -> Self {
        self.report_every = report_every;
        self
    }
}

/// Notifications sent by a running search.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SearchEvent {
    /// Periodic report with the statistics of the whole tree.
    Progress(Statistics),
    /// A new solution.
    Solution(NodeId),
    /// The search ran to completion.
    Finished {
        /// Statistics of the whole tree.
        statistics: Statistics,
        /// Solutions found by this run.
        solutions: u32,
    },
    /// The search was stopped; the tree is consistent but partly explored.
    Cancelled {
        /// Statistics of the whole tree.
        statistics: Statistics,
        /// Solutions found by this run.
        solutions: u32,
    },
}

impl SearchEvent {
    /// Whether this is the last event of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Cancelled { .. })
    }
}

/// Explore below `start`, one expansion per lock acquisition.
pub(crate) fn run<S>(
    shared: &Arc<Shared<S>>,
    start: NodeId,
    options: SearchOptions,
    events: &Sender<SearchEvent>,
) where
    S: Space + Send + 'static,
    S::Choice: Send,
{
    info!("search ({:?}) started at {start:?}", options.mode);
    let mut pending: Vec<NodeId> = vec![start];
    let mut expansions = 0_usize;
    let mut solutions = 0_u32;
    let cancelled = loop {
        if shared.cancel.load(Ordering::Relaxed) {
            break true;
        }
        let Some(node) = pending.pop() else {
            break false;
        };
        let (solved, statistics) = {
            let guard = shared.state.lock();
            let mut state = guard.borrow_mut();
            let tree = &mut state.tree;
            if !tree.tree().is_open(node) {
                continue;
            }
            let n = tree.number_of_children(node);
            for alternative in (0..n).rev() {
                if let Some(child) = tree.tree().child(node, alternative)
                    && tree.tree().is_open(child)
                {
                    pending.push(child);
                }
            }
            (
                tree.tree().status(node) == Some(NodeStatus::Solved),
                tree.statistics(),
            )
        };
        expansions += 1;
        if solved {
            solutions += 1;
            let _ = events.send(SearchEvent::Solution(node));
            if options.mode == SearchMode::One {
                break false;
            }
        }
        if options.report_every > 0 && expansions % options.report_every == 0 {
            debug!("search progress: {expansions} expansions, {statistics:?}");
            let _ = events.send(SearchEvent::Progress(statistics));
        }
    };

    let statistics = shared.state.lock().borrow().tree.statistics();
    shared.running.store(false, Ordering::Release);
    if cancelled {
        info!("search cancelled after {expansions} expansions ({solutions} solutions)");
        let _ = events.send(SearchEvent::Cancelled {
            statistics,
            solutions,
        });
    } else {
        info!("search finished after {expansions} expansions ({solutions} solutions)");
        let _ = events.send(SearchEvent::Finished {
            statistics,
            solutions,
        });
    }
}
