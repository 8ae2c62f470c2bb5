//! Minimal inconsistent subset extraction.
//!
//! The MIS collection is computed jointly over the whole constraint set, not
//! per constraint: witnesses from different constraints may overlap, and a
//! lower-arity witness discards any higher-arity witness it is contained in.
//! The result is exact (every minimal witness present), duplicate-free,
//! subset-minimal, and canonically ordered for stable persistence.

use std::collections::HashMap;

use icqa_core::{minimal_sets, Database, DcSet, Result, TupleArena, TupleId, TupleSet};

use crate::detector::witnesses;
use crate::plan::MatchPlan;

/// The subset-minimal collection of inconsistent tuple sets for one
/// (database instance, constraint set) pair.
#[derive(Debug, Clone, Default)]
pub struct MisCollection {
    sets: Vec<TupleSet>,
    membership: HashMap<TupleId, Vec<usize>>,
}

impl MisCollection {
    fn from_minimal(sets: Vec<TupleSet>) -> Self {
        let mut membership: HashMap<TupleId, Vec<usize>> = HashMap::new();
        for (idx, set) in sets.iter().enumerate() {
            for id in set.iter() {
                membership.entry(id).or_default().push(idx);
            }
        }
        Self { sets, membership }
    }

    /// All MIS, in canonical order.
    pub fn sets(&self) -> &[TupleSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Indexes of the MIS containing a tuple. Empty for consistent tuples.
    pub fn containing(&self, id: TupleId) -> &[usize] {
        self.membership.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Tuples participating in at least one MIS, in ascending id order.
    pub fn participants(&self) -> Vec<TupleId> {
        let mut ids: Vec<TupleId> = self.membership.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Extracts the joint MIS collection for a constraint set.
///
/// Every witness of every constraint is a candidate inconsistent set; a
/// candidate survives only if no other candidate is a strict subset of it
/// (possible across constraints of differing arity touching overlapping
/// tuples). A database with zero violations yields an empty collection.
pub fn extract_mis(db: &Database, arena: &TupleArena, dcs: &DcSet) -> Result<MisCollection> {
    let mut candidates: Vec<TupleSet> = Vec::new();
    for dc in &dcs.constraints {
        let plan = MatchPlan::new(db, &dc.pattern)?;
        let before = candidates.len();
        candidates.extend(witnesses(db, arena, dc, &plan));
        tracing::debug!(
            constraint = %dc.name,
            witnesses = candidates.len() - before,
            "collected witnesses"
        );
    }

    let minimal = minimal_sets(candidates);
    tracing::debug!(dc_set = %dcs.id, mis = minimal.len(), "extracted MIS collection");
    Ok(MisCollection::from_minimal(minimal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use icqa_core::DcSet;
    use icqa_test::orders::{
        dc_set_spec, order_tuple_id, subsumed_database, violated_database,
    };

    #[test]
    fn violated_fixture_yields_single_pair_mis() {
        let db = violated_database();
        let arena = TupleArena::build(&db);
        let dcs = DcSet::resolve(&dc_set_spec(), &db).unwrap();
        let mis = extract_mis(&db, &arena, &dcs).unwrap();

        // One overlap pair plus one negative-price singleton.
        assert_eq!(mis.len(), 2);
        let o7 = order_tuple_id(&db, &arena, 7);
        let o9 = order_tuple_id(&db, &arena, 9);
        let pair: TupleSet = [o7, o9].into_iter().collect();
        assert!(mis.sets().contains(&pair));
    }

    #[test]
    fn no_mis_is_superset_of_another() {
        let db = subsumed_database();
        let arena = TupleArena::build(&db);
        let dcs = DcSet::resolve(&dc_set_spec(), &db).unwrap();
        let mis = extract_mis(&db, &arena, &dcs).unwrap();

        for (i, a) in mis.sets().iter().enumerate() {
            for (j, b) in mis.sets().iter().enumerate() {
                if i != j {
                    assert!(!a.is_proper_subset_of(b), "{a} subsumes {b}");
                }
            }
        }
    }

    #[test]
    fn membership_index_matches_sets() {
        let db = violated_database();
        let arena = TupleArena::build(&db);
        let dcs = DcSet::resolve(&dc_set_spec(), &db).unwrap();
        let mis = extract_mis(&db, &arena, &dcs).unwrap();

        for id in mis.participants() {
            for &idx in mis.containing(id) {
                assert!(mis.sets()[idx].contains(id));
            }
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let db = violated_database();
        let arena = TupleArena::build(&db);
        let dcs = DcSet::resolve(&dc_set_spec(), &db).unwrap();
        let a = extract_mis(&db, &arena, &dcs).unwrap();
        let b = extract_mis(&db, &arena, &dcs).unwrap();
        assert_eq!(a.sets(), b.sets());
    }
}
