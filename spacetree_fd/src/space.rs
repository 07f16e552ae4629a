// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The finite-domain space: variables, posted constraints, and branching.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use smallvec::SmallVec;
use spacetree_core::{Choice, Relation, Space, SpaceStatus, Tightening};

use crate::domain::Domain;
use crate::error::ModelError;
use crate::propagator::Propagator;

/// Handle to a variable of an [`FdSpace`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(u32);

impl Var {
    /// Position of the variable in declaration order.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "variable counts stay far below u32::MAX."
        )]
        Self(index as u32)
    }
}

/// How values are tried when branching on a variable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValueSelection {
    /// One alternative per remaining value, smallest first.
    #[default]
    Enumerate,
    /// `x == min` or `x != min`.
    Min,
    /// `x <= mid` or `x > mid`.
    Split,
}

/// Branching description produced by [`FdSpace`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FdChoice {
    /// Alternative `i` assigns `values[i]`.
    Values {
        /// Branching variable.
        var: Var,
        /// Candidate values in alternative order.
        values: SmallVec<[i64; 4]>,
    },
    /// Assign `value`, or exclude it.
    Min {
        /// Branching variable.
        var: Var,
        /// Smallest candidate at branching time.
        value: i64,
    },
    /// Lower half, or upper half.
    Split {
        /// Branching variable.
        var: Var,
        /// Largest value of the lower half.
        mid: i64,
    },
}

impl Choice for FdChoice {
    fn alternatives(&self) -> u32 {
        match self {
            Self::Values { values, .. } => {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "domains hold at most 64 values."
                )]
                let n = values.len() as u32;
                n
            }
            Self::Min { .. } | Self::Split { .. } => 2,
        }
    }
}

/// A finite-domain constraint problem and its current domains.
///
/// Variables range over `0..=63`. Constraints are posted while modelling;
/// afterwards the space is driven through the [`Space`] trait. Model data
/// shared by every clone is reference counted, so cloning copies only the
/// domains.
#[derive(Clone, Debug, Default)]
pub struct FdSpace {
    domains: Vec<Domain>,
    names: Arc<Vec<String>>,
    lookup: Arc<HashMap<String, Var>>,
    propagators: Arc<Vec<Propagator>>,
    branch_vars: Arc<Vec<Var>>,
    selection: ValueSelection,
    failed: bool,
}

impl FdSpace {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable with domain `lo..=hi`.
    pub fn int_var(&mut self, name: impl Into<String>, lo: i64, hi: i64) -> Result<Var, ModelError> {
        let name = name.into();
        if self.lookup.contains_key(&name) {
            return Err(ModelError::DuplicateName(name));
        }
        let domain = Domain::range(lo, hi);
        if domain.is_empty() {
            return Err(ModelError::EmptyDomain { name, lo, hi });
        }
        let var = Var::from_index(self.domains.len());
        self.domains.push(domain);
        Arc::make_mut(&mut self.lookup).insert(name.clone(), var);
        Arc::make_mut(&mut self.names).push(name);
        Ok(var)
    }

    /// Look up a variable by name.
    pub fn var(&self, name: &str) -> Option<Var> {
        self.lookup.get(name).copied()
    }

    /// Name a variable was declared with.
    pub fn name(&self, var: Var) -> &str {
        &self.names[var.index()]
    }

    /// All variables in declaration order.
    pub fn vars(&self) -> impl Iterator<Item = Var> + use<> {
        (0..self.domains.len()).map(Var::from_index)
    }

    /// Current domain of a variable.
    pub fn domain(&self, var: Var) -> Domain {
        self.domains[var.index()]
    }

    /// Value of an assigned variable.
    pub fn value(&self, var: Var) -> Option<i64> {
        self.domain(var).value()
    }

    /// Value of an assigned variable, by name.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.var(name).and_then(|v| self.value(v))
    }

    /// Restrict `x` to values satisfying `x relation value`, immediately.
    pub fn rel(&mut self, x: Var, relation: Relation, value: i64) {
        let domain = &mut self.domains[x.index()];
        domain.restrict(relation, value);
        if domain.is_empty() {
            self.failed = true;
        }
    }

    /// Post `x relation y`.
    pub fn rel_var(&mut self, x: Var, relation: Relation, y: Var) {
        self.post(Propagator::Binary { x, relation, y });
    }

    /// Post that all `vars` take pairwise different values.
    pub fn distinct(&mut self, vars: &[Var]) {
        self.post(Propagator::Distinct(vars.iter().copied().collect()));
    }

    /// Post `sum(a * x) relation rhs` over `(a, x)` terms.
    pub fn linear(&mut self, terms: &[(i64, Var)], relation: Relation, rhs: i64) {
        self.post(Propagator::Linear {
            terms: terms.iter().copied().collect(),
            relation,
            rhs,
        });
    }

    /// Branch on `vars` in order; without a call, every variable is branched on.
    pub fn branch(&mut self, vars: &[Var], selection: ValueSelection) {
        self.branch_vars = Arc::new(vars.to_vec());
        self.selection = selection;
    }

    fn post(&mut self, propagator: Propagator) {
        Arc::make_mut(&mut self.propagators).push(propagator);
    }

    /// Run every propagator until none prunes; returns `false` on failure.
    fn propagate(&mut self) -> bool {
        let propagators = Arc::clone(&self.propagators);
        loop {
            let mut changed = false;
            for propagator in propagators.iter() {
                match propagator.propagate(&mut self.domains) {
                    Ok(pruned) => changed |= pruned,
                    Err(_) => return false,
                }
            }
            if !changed {
                return true;
            }
        }
    }

    fn next_branch_var(&self) -> Option<Var> {
        if self.branch_vars.is_empty() {
            self.vars().find(|&v| !self.domain(v).is_assigned())
        } else {
            self.branch_vars
                .iter()
                .copied()
                .find(|&v| !self.domain(v).is_assigned())
        }
    }
}

impl Space for FdSpace {
    type Choice = FdChoice;

    fn status(&mut self) -> SpaceStatus {
        if self.failed || !self.propagate() {
            self.failed = true;
            return SpaceStatus::Failed;
        }
        if self.next_branch_var().is_some() {
            SpaceStatus::Branch
        } else {
            SpaceStatus::Solved
        }
    }

    fn choice(&self) -> FdChoice {
        let var = self
            .next_branch_var()
            .expect("choice requested from a space without unassigned variables");
        let domain = self.domain(var);
        let (lo, hi) = domain.min().zip(domain.max()).expect("unassigned domains are non-empty");
        match self.selection {
            ValueSelection::Enumerate => FdChoice::Values {
                var,
                values: domain.values().collect(),
            },
            ValueSelection::Min => FdChoice::Min { var, value: lo },
            ValueSelection::Split => FdChoice::Split {
                var,
                mid: lo + (hi - lo) / 2,
            },
        }
    }

    fn commit(&mut self, choice: &FdChoice, alternative: u32) {
        match (choice, alternative) {
            (FdChoice::Values { var, values }, i) => match values.get(i as usize) {
                Some(&value) => self.rel(*var, Relation::Eq, value),
                None => self.fail(),
            },
            (FdChoice::Min { var, value }, 0) => self.rel(*var, Relation::Eq, *value),
            (FdChoice::Min { var, value }, 1) => self.rel(*var, Relation::Ne, *value),
            (FdChoice::Split { var, mid }, 0) => self.rel(*var, Relation::Le, *mid),
            (FdChoice::Split { var, mid }, 1) => self.rel(*var, Relation::Gt, *mid),
            _ => self.fail(),
        }
    }

    fn fail(&mut self) {
        self.failed = true;
    }

    fn failed(&self) -> bool {
        self.failed
    }

    /// Run the first propagator that prunes anything, then stop.
    fn step(&mut self) {
        if self.failed {
            return;
        }
        let propagators = Arc::clone(&self.propagators);
        for propagator in propagators.iter() {
            match propagator.propagate(&mut self.domains) {
                Ok(false) => {}
                Ok(true) => return,
                Err(_) => {
                    self.failed = true;
                    return;
                }
            }
        }
    }

    /// Unknown variable names fail the space.
    fn tighten(&mut self, tightening: &Tightening) {
        match self.var(&tightening.var) {
            Some(x) => self.rel(x, tightening.relation, tightening.value),
            None => self.fail(),
        }
    }
}
