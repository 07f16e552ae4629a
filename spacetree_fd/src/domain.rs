// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bitset domains over the values `0..=63`.

use core::fmt;

use spacetree_core::Relation;

/// Largest value a domain can hold.
pub const MAX_VALUE: i64 = 63;

/// A set of candidate values for one variable.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Domain(u64);

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values()).finish()
    }
}

impl Domain {
    /// The empty domain.
    pub const EMPTY: Self = Self(0);

    /// All values in `lo..=hi`, clamped to `0..=MAX_VALUE`.
    pub fn range(lo: i64, hi: i64) -> Self {
        Self(mask_ge(lo) & mask_le(hi))
    }

    /// Exactly the given values; values outside `0..=MAX_VALUE` are ignored.
    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        let bits = values
            .into_iter()
            .filter(|v| (0..=MAX_VALUE).contains(v))
            .fold(0, |acc, v| acc | (1 << v));
        Self(bits)
    }

    /// Returns `true` if no value is left.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of values.
    pub fn size(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns `true` if exactly one value is left.
    pub fn is_assigned(self) -> bool {
        self.size() == 1
    }

    /// The single value of an assigned domain.
    pub fn value(self) -> Option<i64> {
        if self.is_assigned() { self.min() } else { None }
    }

    /// Smallest value.
    pub fn min(self) -> Option<i64> {
        (!self.is_empty()).then(|| i64::from(self.0.trailing_zeros()))
    }

    /// Largest value.
    pub fn max(self) -> Option<i64> {
        (!self.is_empty()).then(|| MAX_VALUE - i64::from(self.0.leading_zeros()))
    }

    /// Returns `true` if `value` is a candidate.
    pub fn contains(self, value: i64) -> bool {
        (0..=MAX_VALUE).contains(&value) && self.0 & (1 << value) != 0
    }

    /// Candidate values in ascending order.
    pub fn values(self) -> impl Iterator<Item = i64> {
        (0..=MAX_VALUE).filter(move |&v| self.contains(v))
    }

    /// Keep only values `v` with `v relation value`; returns whether anything was removed.
    pub fn restrict(&mut self, relation: Relation, value: i64) -> bool {
        let mask = match relation {
            Relation::Eq => mask_ge(value) & mask_le(value),
            Relation::Ne => !(mask_ge(value) & mask_le(value)),
            Relation::Lt => mask_le(value.saturating_sub(1)),
            Relation::Le => mask_le(value),
            Relation::Gt => mask_ge(value.saturating_add(1)),
            Relation::Ge => mask_ge(value),
        };
        self.keep(mask)
    }

    /// Keep only values also in `other`; returns whether anything was removed.
    pub fn intersect(&mut self, other: Self) -> bool {
        self.keep(other.0)
    }

    fn keep(&mut self, mask: u64) -> bool {
        let next = self.0 & mask;
        let changed = next != self.0;
        self.0 = next;
        changed
    }
}

fn mask_le(value: i64) -> u64 {
    if value < 0 {
        0
    } else if value >= MAX_VALUE {
        u64::MAX
    } else {
        u64::MAX >> (MAX_VALUE - value)
    }
}

fn mask_ge(value: i64) -> u64 {
    if value <= 0 {
        u64::MAX
    } else if value > MAX_VALUE {
        0
    } else {
        u64::MAX << value
    }
}
