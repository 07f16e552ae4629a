// Copyright 2025 the Spacetree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Propagators: domain-pruning rules for posted constraints.

use smallvec::SmallVec;
use spacetree_core::Relation;

use crate::domain::Domain;
use crate::space::Var;

/// A propagator detected that its constraint cannot be satisfied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Conflict;

/// Whether a propagation run removed any value.
pub(crate) type Pruned = Result<bool, Conflict>;

#[derive(Clone, Debug)]
pub(crate) enum Propagator {
    /// `x relation y`
    Binary { x: Var, relation: Relation, y: Var },
    /// Pairwise different values.
    Distinct(SmallVec<[Var; 4]>),
    /// `sum(a * x) relation rhs`
    Linear {
        terms: SmallVec<[(i64, Var); 4]>,
        relation: Relation,
        rhs: i64,
    },
}

fn prune(domains: &mut [Domain], var: Var, relation: Relation, value: i64) -> Pruned {
    let domain = &mut domains[var.index()];
    let changed = domain.restrict(relation, value);
    if domain.is_empty() { Err(Conflict) } else { Ok(changed) }
}

fn bounds(domain: Domain) -> Result<(i64, i64), Conflict> {
    domain.min().zip(domain.max()).ok_or(Conflict)
}

impl Propagator {
    /// Prune until this propagator alone is at fixpoint.
    pub(crate) fn propagate(&self, domains: &mut [Domain]) -> Pruned {
        let mut changed = false;
        loop {
            let pruned = match self {
                Self::Binary { x, relation, y } => binary(domains, *x, *relation, *y)?,
                Self::Distinct(vars) => distinct(domains, vars)?,
                Self::Linear {
                    terms,
                    relation,
                    rhs,
                } => linear(domains, terms, *relation, *rhs)?,
            };
            if !pruned {
                return Ok(changed);
            }
            changed = true;
        }
    }
}

fn binary(domains: &mut [Domain], x: Var, relation: Relation, y: Var) -> Pruned {
    let (dx, dy) = (domains[x.index()], domains[y.index()]);
    let (x_min, x_max) = bounds(dx)?;
    let (y_min, y_max) = bounds(dy)?;
    let mut changed = false;
    match relation {
        Relation::Eq => {
            changed |= domains[x.index()].intersect(dy);
            changed |= domains[y.index()].intersect(dx);
            if domains[x.index()].is_empty() {
                return Err(Conflict);
            }
        }
        Relation::Ne => {
            if let Some(v) = dx.value() {
                changed |= prune(domains, y, Relation::Ne, v)?;
            }
            if let Some(v) = dy.value() {
                changed |= prune(domains, x, Relation::Ne, v)?;
            }
        }
        Relation::Lt | Relation::Le => {
            changed |= prune(domains, x, relation, y_max)?;
            changed |= prune(domains, y, relation.flip(), x_min)?;
        }
        Relation::Gt | Relation::Ge => {
            changed |= prune(domains, x, relation, y_min)?;
            changed |= prune(domains, y, relation.flip(), x_max)?;
        }
    }
    Ok(changed)
}

fn distinct(domains: &mut [Domain], vars: &[Var]) -> Pruned {
    let mut changed = false;
    for (i, &x) in vars.iter().enumerate() {
        let Some(v) = domains[x.index()].value() else {
            continue;
        };
        for (j, &y) in vars.iter().enumerate() {
            if i != j {
                changed |= prune(domains, y, Relation::Ne, v)?;
            }
        }
    }
    Ok(changed)
}

/// Bounds reasoning on `sum(a * x) <= rhs` (and its mirror for `>=`).
fn linear(domains: &mut [Domain], terms: &[(i64, Var)], relation: Relation, rhs: i64) -> Pruned {
    match relation {
        Relation::Le => linear_le(domains, terms, rhs, 1),
        Relation::Lt => linear_le(domains, terms, rhs - 1, 1),
        Relation::Ge => linear_le(domains, terms, -rhs, -1),
        Relation::Gt => linear_le(domains, terms, -rhs - 1, -1),
        Relation::Eq => Ok(linear_le(domains, terms, rhs, 1)? | linear_le(domains, terms, -rhs, -1)?),
        Relation::Ne => {
            let mut open = None;
            let mut fixed = 0;
            for &(a, x) in terms.iter().filter(|(a, _)| *a != 0) {
                match domains[x.index()].value() {
                    Some(v) => fixed += a * v,
                    None if open.is_none() => open = Some((a, x)),
                    None => return Ok(false),
                }
            }
            match open {
                None if fixed == rhs => Err(Conflict),
                None => Ok(false),
                Some((a, x)) if (rhs - fixed) % a == 0 => {
                    prune(domains, x, Relation::Ne, (rhs - fixed) / a)
                }
                Some(_) => Ok(false),
            }
        }
    }
}

/// `sum(sign * a * x) <= rhs`
fn linear_le(domains: &mut [Domain], terms: &[(i64, Var)], rhs: i64, sign: i64) -> Pruned {
    let min_term = |domains: &[Domain], a: i64, x: Var| -> Result<i64, Conflict> {
        let (lo, hi) = bounds(domains[x.index()])?;
        Ok(if a >= 0 { a * lo } else { a * hi })
    };
    let mut total = 0;
    for &(a, x) in terms {
        total += min_term(domains, sign * a, x)?;
    }
    if total > rhs {
        return Err(Conflict);
    }
    let mut changed = false;
    for &(a, x) in terms {
        let a = sign * a;
        if a == 0 {
            continue;
        }
        let slack = rhs - (total - min_term(domains, a, x)?);
        changed |= if a > 0 {
            prune(domains, x, Relation::Le, slack.div_euclid(a))?
        } else {
            prune(domains, x, Relation::Ge, -slack.div_euclid(-a))?
        };
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use smallvec::smallvec;

    fn vars<const N: usize>() -> [Var; N] {
        core::array::from_fn(Var::from_index)
    }

    #[test]
    fn less_than_prunes_both_sides() {
        let [x, y] = vars();
        let mut domains = vec![Domain::range(0, 9), Domain::range(0, 5)];
        let p = Propagator::Binary {
            x,
            relation: Relation::Lt,
            y,
        };
        assert_eq!(p.propagate(&mut domains), Ok(true));
        assert_eq!(domains[0].max(), Some(4));
        assert_eq!(domains[1].min(), Some(1));
    }

    #[test]
    fn distinct_removes_assigned_values_transitively() {
        let [x, y, z] = vars();
        let mut domains = vec![Domain::range(0, 0), Domain::range(0, 1), Domain::range(0, 2)];
        let p = Propagator::Distinct(smallvec![x, y, z]);
        assert_eq!(p.propagate(&mut domains), Ok(true));
        assert_eq!(domains[1].value(), Some(1));
        assert_eq!(domains[2].value(), Some(2));

        let mut clash = vec![Domain::range(1, 1), Domain::range(1, 1), Domain::range(0, 2)];
        assert_eq!(p.propagate(&mut clash), Err(Conflict));
    }

    #[test]
    fn linear_bounds() {
        let [x, y] = vars();
        // x + 2y <= 6, x in 0..=9, y in 1..=9
        let mut domains = vec![Domain::range(0, 9), Domain::range(1, 9)];
        let p = Propagator::Linear {
            terms: smallvec![(1, x), (2, y)],
            relation: Relation::Le,
            rhs: 6,
        };
        assert_eq!(p.propagate(&mut domains), Ok(true));
        assert_eq!(domains[0].max(), Some(4));
        assert_eq!(domains[1].max(), Some(3));

        // x - y >= 2 with y >= 1 lifts x.
        let mut domains = vec![Domain::range(0, 9), Domain::range(1, 9)];
        let p = Propagator::Linear {
            terms: smallvec![(1, x), (-1, y)],
            relation: Relation::Ge,
            rhs: 2,
        };
        assert_eq!(p.propagate(&mut domains), Ok(true));
        assert_eq!(domains[0].min(), Some(3));
        assert_eq!(domains[1].max(), Some(7));
    }

    #[test]
    fn linear_disequality_waits_for_one_open_variable() {
        let [x, y] = vars();
        let p = Propagator::Linear {
            terms: smallvec![(1, x), (1, y)],
            relation: Relation::Ne,
            rhs: 4,
        };
        let mut domains = vec![Domain::range(0, 9), Domain::range(0, 9)];
        assert_eq!(p.propagate(&mut domains), Ok(false));
        domains[0] = Domain::range(1, 1);
        assert_eq!(p.propagate(&mut domains), Ok(true));
        assert!(!domains[1].contains(3));
    }
}
