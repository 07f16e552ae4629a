// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree-wide record of the best solution found so far.

use alloc::boxed::Box;
use core::fmt;

use crate::space::Better;
use crate::types::NodeId;

/// The incumbent solution plus the comparator used to improve on it.
///
/// One `BestNode` exists per tree. Every node remembers the incumbent that was
/// current when it was created; recomputation posts "better than" constraints
/// against those remembered solutions.
pub struct BestNode<S> {
    pub(crate) node: Option<NodeId>,
    pub(crate) better: Box<dyn Better<S> + Send>,
}

impl<S> fmt::Debug for BestNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BestNode")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl<S> BestNode<S> {
    /// Create a record with no incumbent.
    pub fn new(better: impl Better<S> + Send + 'static) -> Self {
        Self {
            node: None,
            better: Box::new(better),
        }
    }

    /// The current incumbent, if any.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// The comparator.
    pub fn better(&self) -> &dyn Better<S> {
        &*self.better
    }
}
