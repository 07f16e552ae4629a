// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use spacetree_core::NodeId;

/// Requests the canvas refuses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CanvasError {
    /// The node no longer exists, typically after a reset.
    StaleNode(NodeId),
    /// The request would change the tree while a search is running.
    SearchRunning,
    /// The node is already explored, or its space is failed.
    NotExpandable(NodeId),
    /// Special and step nodes are disabled in the tree configuration.
    ExtensionsDisabled,
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleNode(id) => write!(f, "node {id:?} is no longer part of the tree"),
            Self::SearchRunning => f.write_str("a search is running on this tree"),
            Self::NotExpandable(id) => write!(f, "node {id:?} cannot be expanded any further"),
            Self::ExtensionsDisabled => f.write_str("special and step nodes are disabled"),
        }
    }
}

impl core::error::Error for CanvasError {}
