// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use core::fmt;

/// Mistakes made while building a model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelError {
    /// A variable's initial domain would hold no representable value.
    EmptyDomain {
        /// Name of the variable.
        name: String,
        /// Requested lower bound.
        lo: i64,
        /// Requested upper bound.
        hi: i64,
    },
    /// A variable with this name already exists.
    DuplicateName(String),
    /// A model needs a value outside `0..=MAX_VALUE`.
    Unrepresentable {
        /// Name of the variable.
        name: String,
        /// The value that does not fit.
        value: i64,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDomain { name, lo, hi } => write!(
                f,
                "variable `{name}` has no value in {lo}..={hi} within 0..={}",
                crate::MAX_VALUE
            ),
            Self::DuplicateName(name) => write!(f, "variable `{name}` is declared twice"),
            Self::Unrepresentable { name, value } => write!(
                f,
                "variable `{name}` needs value {value} outside 0..={}",
                crate::MAX_VALUE
            ),
        }
    }
}

impl core::error::Error for ModelError {}
