// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability set the tree requires from a propagation engine.

use alloc::string::String;
use core::fmt::Debug;

/// Outcome of propagating a space to its fixpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SpaceStatus {
    /// Some constraint cannot be satisfied.
    Failed,
    /// All variables are assigned.
    Solved,
    /// A branching description is available through [`Space::choice`].
    Branch,
}

/// An engine-supplied description of the alternatives at a branching node.
///
/// A choice obtained from one space must be committable on any space that
/// was cloned from it, including clones taken before later commits.
pub trait Choice: Clone + Debug {
    /// Number of alternatives; always at least one.
    fn alternatives(&self) -> u32;
}

/// Relation used by a [`Tightening`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `x == v`
    Eq,
    /// `x != v`
    Ne,
    /// `x < v`
    Lt,
    /// `x <= v`
    Le,
    /// `x > v`
    Gt,
    /// `x >= v`
    Ge,
}

impl Relation {
    /// The relation with its operands swapped: `a < b` iff `b > a`.
    pub fn flip(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
        }
    }

    /// Returns whether `lhs (self) rhs` holds.
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

/// User-directed restriction of a single named variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tightening {
    /// Name of the variable, as understood by the engine.
    pub var: String,
    /// Relation to post.
    pub relation: Relation,
    /// Right-hand side.
    pub value: i64,
}

impl Tightening {
    /// Create a tightening `var relation value`.
    pub fn new(var: impl Into<String>, relation: Relation, value: i64) -> Self {
        Self {
            var: var.into(),
            relation,
            value,
        }
    }
}

/// A solver state: variable domains plus pending propagators.
///
/// `clone` must produce a deep, independent copy. The tree never inspects a
/// space beyond the operations listed here.
pub trait Space: Clone {
    /// Branching description type.
    type Choice: Choice;

    /// Propagate to fixpoint and report the outcome.
    ///
    /// Must be idempotent: a second call without intervening changes returns
    /// the same status and leaves the space unchanged.
    fn status(&mut self) -> SpaceStatus;

    /// The branching description; only valid right after [`status`](Space::status)
    /// returned [`SpaceStatus::Branch`].
    fn choice(&self) -> Self::Choice;

    /// Commit to one alternative of `choice`.
    ///
    /// Commits may be batched: several commits can be applied before the
    /// next call to [`status`](Space::status).
    fn commit(&mut self, choice: &Self::Choice, alternative: u32);

    /// Force the space into the failed state.
    fn fail(&mut self);

    /// Returns `true` if the space is known to be failed.
    fn failed(&self) -> bool;

    /// Perform a single propagation step without running to fixpoint.
    ///
    /// Engines without fine-grained propagation run to fixpoint instead.
    fn step(&mut self) {
        let _ = self.status();
    }

    /// Restrict the variable named in `tightening`.
    ///
    /// Engines without named variables fail the space.
    fn tighten(&mut self, tightening: &Tightening) {
        let _ = tightening;
        self.fail();
    }
}

/// Branch-and-bound comparator shared by a whole tree.
pub trait Better<S> {
    /// Returns `true` if `candidate` is strictly better than `incumbent`.
    fn is_better(&self, candidate: &S, incumbent: &S) -> bool;

    /// Post "better than `best`" on `space`.
    ///
    /// Applying the same `best` twice must leave `space` as applying it once.
    fn constrain(&self, space: &mut S, best: &S);
}
