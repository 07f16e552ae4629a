// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copy-retention policies and tree options.

/// Controls where snapshots are retained to bound recomputation.
///
/// Both policies may be active at once. A distance is the number of replayed
/// actions between a node and the snapshot its space was derived from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecomputationConfig {
    /// Retain a copy at a branching node once it is more than this many
    /// actions away from the nearest snapshot.
    pub fixed_distance: Option<u32>,
    /// Snapshot the midpoint of any replay path longer than this.
    pub adaptive_distance: Option<u32>,
}

impl Default for RecomputationConfig {
    fn default() -> Self {
        Self {
            fixed_distance: Some(8),
            adaptive_distance: Some(2),
        }
    }
}

impl RecomputationConfig {
    /// Never retain copies beyond the root; every space is recomputed from the origin.
    pub const fn none() -> Self {
        Self {
            fixed_distance: None,
            adaptive_distance: None,
        }
    }

    /// Set the fixed recomputation distance.
    #[must_use]
    pub const fn with_fixed_distance(mut self, distance: Option<u32>) -> Self {
        self.fixed_distance = distance;
        self
    }

    /// Set the adaptive recomputation distance.
    #[must_use]
    pub const fn with_adaptive_distance(mut self, distance: Option<u32>) -> Self {
        self.adaptive_distance = distance;
        self
    }

    /// Whether a branching node `distance` actions away from its snapshot
    /// should keep a copy. Only the fixed policy retains copies this way; the
    /// adaptive policy acts during replay.
    pub fn exceeds(&self, distance: u32) -> bool {
        self.fixed_distance.is_some_and(|c| distance > c)
    }

    /// Whether to snapshot position `at` of a replay path of length `len`
    /// under the adaptive policy. The midpoint is `len / 2`, rounding down.
    pub fn adaptive_midpoint(&self, at: u32, len: u32) -> bool {
        self.adaptive_distance
            .is_some_and(|a| len > a && at > 0 && at == len / 2)
    }

    /// Whether to snapshot position `at` of a replay path of length `len`
    /// under the fixed policy.
    pub fn fixed_waypoint(&self, at: u32, len: u32) -> bool {
        self.fixed_distance
            .is_some_and(|c| at > c && len - at > c)
    }
}

/// Options for a [`SearchTree`](crate::SearchTree).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TreeConfig {
    /// Snapshot retention.
    pub recomputation: RecomputationConfig,
    /// Allow special (tightening) and step nodes.
    pub extensions: bool,
}

impl TreeConfig {
    /// Set the recomputation policy.
    #[must_use]
    pub const fn with_recomputation(mut self, recomputation: RecomputationConfig) -> Self {
        self.recomputation = recomputation;
        self
    }

    /// Enable or disable special and step nodes.
    #[must_use]
    pub const fn with_extensions(mut self, extensions: bool) -> Self {
        self.extensions = extensions;
        self
    }
}
