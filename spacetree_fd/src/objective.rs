// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use spacetree_core::{Better, Relation};

use crate::space::{FdSpace, Var};

/// Direction of optimization.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Sense {
    /// Smaller is better.
    Minimize,
    /// Larger is better.
    Maximize,
}

/// Branch-and-bound on the value of a single variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Objective {
    /// Variable being optimized.
    pub var: Var,
    /// Direction.
    pub sense: Sense,
}

impl Objective {
    /// Prefer smaller values of `var`.
    pub fn minimize(var: Var) -> Self {
        Self {
            var,
            sense: Sense::Minimize,
        }
    }

    /// Prefer larger values of `var`.
    pub fn maximize(var: Var) -> Self {
        Self {
            var,
            sense: Sense::Maximize,
        }
    }

    fn improving(&self) -> Relation {
        match self.sense {
            Sense::Minimize => Relation::Lt,
            Sense::Maximize => Relation::Gt,
        }
    }
}

impl Better<FdSpace> for Objective {
    fn is_better(&self, candidate: &FdSpace, incumbent: &FdSpace) -> bool {
        match (candidate.value(self.var), incumbent.value(self.var)) {
            (Some(c), Some(i)) => self.improving().holds(c, i),
            _ => false,
        }
    }

    /// Unassigned objectives in `best` post nothing.
    fn constrain(&self, space: &mut FdSpace, best: &FdSpace) {
        if let Some(bound) = best.value(self.var) {
            space.rel(self.var, self.improving(), bound);
        }
    }
}
