// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A scripted space whose shape is a function of the committed path.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::space::{Better, Choice, Space, SpaceStatus};

/// What the script says about a path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Fail,
    Solve,
    Branch(u32),
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Arity(pub(crate) u32);

impl Choice for Arity {
    fn alternatives(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) clones: AtomicU32,
    pub(crate) commits: AtomicU32,
    pub(crate) statuses: AtomicU32,
}

#[derive(Debug)]
pub(crate) struct Scripted {
    pub(crate) path: Vec<u32>,
    pub(crate) failed: bool,
    /// Upper bound (exclusive) on the path sum, posted by branch-and-bound.
    pub(crate) bound: Option<u32>,
    rule: fn(&[u32]) -> Outcome,
    pub(crate) counters: Arc<Counters>,
}

impl Clone for Scripted {
    fn clone(&self) -> Self {
        self.counters.clones.fetch_add(1, Ordering::Relaxed);
        Self {
            path: self.path.clone(),
            failed: self.failed,
            bound: self.bound,
            rule: self.rule,
            counters: Arc::clone(&self.counters),
        }
    }
}

impl Scripted {
    pub(crate) fn new(rule: fn(&[u32]) -> Outcome) -> Self {
        Self {
            path: Vec::new(),
            failed: false,
            bound: None,
            rule,
            counters: Arc::new(Counters::default()),
        }
    }

    pub(crate) fn sum(&self) -> u32 {
        self.path.iter().sum()
    }

    pub(crate) fn clones(&self) -> u32 {
        self.counters.clones.load(Ordering::Relaxed)
    }

    pub(crate) fn commits(&self) -> u32 {
        self.counters.commits.load(Ordering::Relaxed)
    }
}

impl Space for Scripted {
    type Choice = Arity;

    fn status(&mut self) -> SpaceStatus {
        self.counters.statuses.fetch_add(1, Ordering::Relaxed);
        if self.bound.is_some_and(|b| self.sum() >= b) {
            self.failed = true;
        }
        if self.failed {
            return SpaceStatus::Failed;
        }
        match (self.rule)(&self.path) {
            Outcome::Fail => {
                self.failed = true;
                SpaceStatus::Failed
            }
            Outcome::Solve => SpaceStatus::Solved,
            Outcome::Branch(_) => SpaceStatus::Branch,
        }
    }

    fn choice(&self) -> Arity {
        match (self.rule)(&self.path) {
            Outcome::Branch(k) => Arity(k),
            other => panic!("no choice for {other:?}"),
        }
    }

    fn commit(&mut self, _choice: &Arity, alternative: u32) {
        self.counters.commits.fetch_add(1, Ordering::Relaxed);
        self.path.push(alternative);
    }

    fn fail(&mut self) {
        self.failed = true;
    }

    fn failed(&self) -> bool {
        self.failed
    }
}

/// Minimize the sum of the committed path.
#[derive(Debug)]
pub(crate) struct MinSum;

impl Better<Scripted> for MinSum {
    fn is_better(&self, candidate: &Scripted, incumbent: &Scripted) -> bool {
        candidate.sum() < incumbent.sum()
    }

    fn constrain(&self, space: &mut Scripted, best: &Scripted) {
        let bound = best.sum();
        space.bound = Some(space.bound.map_or(bound, |b| b.min(bound)));
    }
}

/// Binary branching down to `depth`; any path taking alternative 1 fails.
pub(crate) fn left_chain<const DEPTH: usize>(path: &[u32]) -> Outcome {
    if path.contains(&1) {
        Outcome::Fail
    } else if path.len() == DEPTH {
        Outcome::Solve
    } else {
        Outcome::Branch(2)
    }
}

/// Complete binary tree of depth two; every leaf is a solution.
pub(crate) fn full_binary(path: &[u32]) -> Outcome {
    if path.len() == 2 {
        Outcome::Solve
    } else {
        Outcome::Branch(2)
    }
}
