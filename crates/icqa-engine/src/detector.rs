//! Violation witness discovery.
//!
//! Runs one denial constraint against a database instance and streams every
//! violation witness exactly once. Witnesses are tuple *sets*: two
//! assignments binding the same tuples to different roles collapse into one
//! witness.

use std::collections::HashSet;

use icqa_core::{Database, DcSet, DenialConstraint, IcqaError, Result, TupleArena, TupleSet};

use crate::matcher::MatchIter;
use crate::plan::MatchPlan;

/// Lazy stream of deduplicated witnesses for one constraint.
pub struct Witnesses<'a> {
    matches: MatchIter<'a>,
    plan: &'a MatchPlan,
    arena: &'a TupleArena,
    seen: HashSet<TupleSet>,
}

impl Iterator for Witnesses<'_> {
    type Item = TupleSet;

    fn next(&mut self) -> Option<TupleSet> {
        loop {
            let assignment = self.matches.next()?;
            let witness: TupleSet = assignment
                .iter()
                .enumerate()
                .filter_map(|(level, &row)| {
                    let table = self.plan_table(level);
                    self.arena.id_of(table, row)
                })
                .collect();
            if self.seen.insert(witness.clone()) {
                return Some(witness);
            }
        }
    }
}

impl Witnesses<'_> {
    fn plan_table(&self, level: usize) -> usize {
        self.plan.levels[level].table
    }
}

/// Streams all witnesses of `dc` against `db`.
///
/// The constraint is translated into an index-backed join plan, so witness
/// discovery is driven by hash probes rather than tuple-combination
/// enumeration.
pub fn witnesses<'a>(
    db: &'a Database,
    arena: &'a TupleArena,
    dc: &'a DenialConstraint,
    plan: &'a MatchPlan,
) -> Witnesses<'a> {
    Witnesses {
        matches: MatchIter::new(db, &dc.pattern, plan),
        plan,
        arena,
        seen: HashSet::new(),
    }
}

/// Asserts the clean-database precondition: zero witnesses for every
/// constraint of the set.
///
/// A violated precondition points at an upstream data-generation bug, so the
/// full witness count of the first violated constraint is reported and the
/// instance's pipeline halts.
pub fn verify_clean(
    db: &Database,
    arena: &TupleArena,
    dcs: &DcSet,
    instance: &str,
) -> Result<()> {
    for dc in &dcs.constraints {
        let plan = MatchPlan::new(db, &dc.pattern)?;
        let witness_count = witnesses(db, arena, dc, &plan).count();
        if witness_count > 0 {
            tracing::warn!(
                constraint = %dc.name,
                instance = %instance,
                witness_count,
                "clean precondition violated"
            );
            return Err(IcqaError::IntegrityPrecondition {
                instance: instance.to_string(),
                witness_count,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use icqa_core::DcSet;
    use icqa_test::orders::{clean_database, dc_set_spec, violated_database};

    #[test]
    fn witnesses_collapse_role_orderings() {
        let db = violated_database();
        let arena = TupleArena::build(&db);
        let dcs = DcSet::resolve(&dc_set_spec(), &db).unwrap();
        let overlap = &dcs.constraints[0];
        let plan = MatchPlan::new(&db, &overlap.pattern).unwrap();

        let found: Vec<TupleSet> = witnesses(&db, &arena, overlap, &plan).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].len(), 2);
    }

    #[test]
    fn clean_database_passes_precondition() {
        let db = clean_database();
        let arena = TupleArena::build(&db);
        let dcs = DcSet::resolve(&dc_set_spec(), &db).unwrap();
        assert!(verify_clean(&db, &arena, &dcs, "clean/seed01").is_ok());
    }

    #[test]
    fn violated_database_fails_precondition() {
        let db = violated_database();
        let arena = TupleArena::build(&db);
        let dcs = DcSet::resolve(&dc_set_spec(), &db).unwrap();
        let err = verify_clean(&db, &arena, &dcs, "dirty/seed01").unwrap_err();
        match err {
            IcqaError::IntegrityPrecondition {
                instance,
                witness_count,
            } => {
                assert_eq!(instance, "dirty/seed01");
                assert!(witness_count > 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
