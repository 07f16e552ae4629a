// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ready-made models for demos and tests.

use alloc::format;
use alloc::vec::Vec;

use spacetree_core::Relation;

use crate::{FdSpace, MAX_VALUE, ModelError, ValueSelection};

/// `n` queens on an `n` by `n` board, one per column.
///
/// Variable `q<i>` is the row of the queen in column `i`. Branching enumerates
/// the rows of each column in order.
///
/// # Errors
///
/// Returns [`ModelError::EmptyDomain`] for an empty board and
/// [`ModelError::Unrepresentable`] when a row would exceed [`MAX_VALUE`].
///
/// ```rust
/// let model = spacetree_fd::models::queens(4).unwrap();
/// assert_eq!(model.vars().count(), 4);
/// ```
pub fn queens(n: usize) -> Result<FdSpace, ModelError> {
    #[allow(
        clippy::cast_possible_wrap,
        reason = "board sizes are checked against MAX_VALUE below."
    )]
    let rows = n as i64;
    if rows - 1 > MAX_VALUE {
        return Err(ModelError::Unrepresentable {
            name: format!("q{}", n - 1),
            value: rows - 1,
        });
    }
    let mut model = FdSpace::new();
    let qs = (0..n)
        .map(|i| model.int_var(format!("q{i}"), 0, rows - 1))
        .collect::<Result<Vec<_>, _>>()?;
    if qs.is_empty() {
        return Err(ModelError::EmptyDomain {
            name: "q0".into(),
            lo: 0,
            hi: -1,
        });
    }
    model.distinct(&qs);
    for (i, &qi) in qs.iter().enumerate() {
        for (j, &qj) in qs.iter().enumerate().skip(i + 1) {
            #[allow(
                clippy::cast_possible_wrap,
                reason = "column distances are below the checked board size."
            )]
            let offset = (j - i) as i64;
            model.linear(&[(1, qi), (-1, qj)], Relation::Ne, offset);
            model.linear(&[(1, qi), (-1, qj)], Relation::Ne, -offset);
        }
    }
    model.branch(&qs, ValueSelection::Enumerate);
    Ok(model)
}
