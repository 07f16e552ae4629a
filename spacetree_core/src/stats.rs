// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counters updated incrementally as nodes materialize.

/// Shape of the explored tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Statistics {
    /// Solved nodes.
    pub solutions: u32,
    /// Failed nodes.
    pub failures: u32,
    /// Branching nodes (including special and step nodes).
    pub choices: u32,
    /// Nodes whose status is not resolved yet.
    pub undetermined: u32,
    /// Depth of the deepest materialized node.
    pub max_depth: u32,
}

impl Statistics {
    /// Statistics of a tree consisting of one unexplored root.
    pub const fn root() -> Self {
        Self {
            solutions: 0,
            failures: 0,
            choices: 0,
            undetermined: 1,
            max_depth: 0,
        }
    }

    /// Total number of materialized nodes.
    pub const fn nodes(&self) -> u32 {
        self.solutions + self.failures + self.choices + self.undetermined
    }

    pub(crate) fn new_depth(&mut self, depth: u32) {
        self.max_depth = self.max_depth.max(depth);
    }
}

/// How spaces were obtained, for tuning the retention policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RecomputationStats {
    /// Spaces rebuilt from a snapshot.
    pub recomputations: u32,
    /// Actions replayed across all recomputations.
    pub replayed: u32,
    /// Spaces handed from a parent to a child.
    pub donations: u32,
    /// Snapshots retained (at acquisition or during replay).
    pub copies: u32,
    /// Parent snapshots handed down to a last open child.
    pub lao: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_counts_one_node() {
        let stats = Statistics::root();
        assert_eq!(stats.nodes(), 1);
        assert_eq!(stats.undetermined, 1);
    }
}
