//! Backtracking evaluation of planned patterns.
//!
//! An explicit depth-first search over the plan's levels: each level draws its
//! candidate rows from the probe index (or a scan when no equality links the
//! role to earlier ones) and applies the residual predicates assigned to that
//! level. The iterator is lazy (witnesses and query rows stream out as the
//! search runs) and deterministic, since candidates are visited in row order.

use icqa_core::{ConjunctivePattern, Database, Value};
use smallvec::SmallVec;

use crate::plan::{KeySource, MatchPlan};

/// One satisfying assignment: a row index per role, in role order.
pub type Assignment = SmallVec<[usize; 4]>;

enum Candidates<'a> {
    Probe { rows: &'a [usize], pos: usize },
    Scan { next: usize, len: usize },
}

impl Candidates<'_> {
    fn next(&mut self) -> Option<usize> {
        match self {
            Candidates::Probe { rows, pos } => {
                let row = rows.get(*pos).copied();
                *pos += 1;
                row
            }
            Candidates::Scan { next, len } => {
                if *next < *len {
                    let row = *next;
                    *next += 1;
                    Some(row)
                } else {
                    None
                }
            }
        }
    }
}

/// Lazy iterator over all assignments satisfying a pattern.
pub struct MatchIter<'a> {
    db: &'a Database,
    pattern: &'a ConjunctivePattern,
    plan: &'a MatchPlan,
    stack: Vec<Candidates<'a>>,
    assignment: Assignment,
    started: bool,
    done: bool,
}

impl<'a> MatchIter<'a> {
    pub fn new(db: &'a Database, pattern: &'a ConjunctivePattern, plan: &'a MatchPlan) -> Self {
        let done = plan.arity() == 0;
        Self {
            db,
            pattern,
            plan,
            stack: Vec::with_capacity(plan.arity()),
            assignment: SmallVec::new(),
            started: false,
            done,
        }
    }

    fn row(&self, level: usize, row: usize) -> &'a [Value] {
        let table = self.plan.levels[level].table;
        // Plan construction validated every table index.
        self.db
            .table_at(table)
            .and_then(|t| t.row(row))
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    fn candidates_for(&self, depth: usize) -> Candidates<'a> {
        let level = &self.plan.levels[depth];
        match &level.index {
            Some(index) => {
                let key: Vec<Value> = level
                    .key_sources
                    .iter()
                    .map(|source| match source {
                        KeySource::Bound { role, column } => {
                            self.row(*role, self.assignment[*role])[*column].clone()
                        }
                        KeySource::Constant(v) => v.clone(),
                    })
                    .collect();
                let rows = index.get(&key).map(|v| v.as_slice()).unwrap_or(&[]);
                Candidates::Probe { rows, pos: 0 }
            }
            None => {
                let len = self
                    .db
                    .table_at(level.table)
                    .map(|t| t.len())
                    .unwrap_or(0);
                Candidates::Scan { next: 0, len }
            }
        }
    }

    /// Next candidate at `depth` passing that level's residual predicates.
    fn next_passing(&mut self, depth: usize) -> Option<usize> {
        loop {
            let row = self.stack[depth].next()?;

            let mut rows: SmallVec<[&[Value]; 4]> = SmallVec::with_capacity(depth + 1);
            for (level, &r) in self.assignment.iter().enumerate() {
                rows.push(self.row(level, r));
            }
            rows.push(self.row(depth, row));

            let passes = self.plan.levels[depth]
                .residuals
                .iter()
                .all(|&pi| self.pattern.predicates[pi].holds(&rows));
            if passes {
                return Some(row);
            }
        }
    }
}

impl Iterator for MatchIter<'_> {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            let first = self.candidates_for(0);
            self.stack.push(first);
        } else {
            // The previous call yielded a full assignment; release the
            // deepest binding and keep searching.
            self.assignment.pop();
        }

        loop {
            let depth = self.stack.len() - 1;
            debug_assert_eq!(self.assignment.len(), depth);

            match self.next_passing(depth) {
                Some(row) => {
                    self.assignment.push(row);
                    if self.assignment.len() == self.plan.arity() {
                        return Some(self.assignment.clone());
                    }
                    let next = self.candidates_for(self.assignment.len());
                    self.stack.push(next);
                }
                None => {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        self.done = true;
                        return None;
                    }
                    self.assignment.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icqa_core::DenialConstraint;
    use icqa_test::orders::{
        negative_price_constraint_spec, overlap_constraint_spec, violated_database,
    };

    #[test]
    fn single_role_pattern_scans_rows() {
        let db = violated_database();
        let dc = DenialConstraint::resolve(&negative_price_constraint_spec(), &db).unwrap();
        let plan = MatchPlan::new(&db, &dc.pattern).unwrap();
        let matches: Vec<Assignment> = MatchIter::new(&db, &dc.pattern, &plan).collect();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn self_join_yields_both_orderings() {
        let db = violated_database();
        let dc = DenialConstraint::resolve(&overlap_constraint_spec(), &db).unwrap();
        let plan = MatchPlan::new(&db, &dc.pattern).unwrap();
        let matches: Vec<Assignment> = MatchIter::new(&db, &dc.pattern, &plan).collect();
        // The overlapping pair matches with roles swapped as well; witness
        // dedup above this layer collapses the two.
        assert_eq!(matches.len(), 2);
        for m in &matches {
            assert_eq!(m.len(), 2);
            assert_ne!(m[0], m[1]);
        }
    }
}
