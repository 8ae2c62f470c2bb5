//! Sorted immutable tuple-id sets.
//!
//! MIS and support sets are represented as sorted, deduplicated id sequences
//! so that subset and equality checks are linear merges and the sets hash
//! cheaply. The lexicographic `Ord` doubles as the canonical serialization
//! order for every persisted collection.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::tuple::TupleId;

/// An immutable set of tuple ids, stored sorted and deduplicated.
///
/// Witness arity is small (the number of roles in a denial constraint), so the
/// backing storage is inline up to four ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TupleSet(SmallVec<[TupleId; 4]>);

impl TupleSet {
    /// Builds a set from arbitrary ids; sorts and deduplicates.
    pub fn new(ids: impl IntoIterator<Item = TupleId>) -> Self {
        let mut v: SmallVec<[TupleId; 4]> = ids.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TupleId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[TupleId] {
        &self.0
    }

    /// Membership by binary search.
    pub fn contains(&self, id: TupleId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Subset check as a two-pointer merge over the sorted sequences.
    pub fn is_subset_of(&self, other: &TupleSet) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        let mut oi = 0;
        for &id in &self.0 {
            loop {
                if oi >= other.0.len() {
                    return false;
                }
                match other.0[oi].cmp(&id) {
                    std::cmp::Ordering::Less => oi += 1,
                    std::cmp::Ordering::Equal => {
                        oi += 1;
                        break;
                    }
                    std::cmp::Ordering::Greater => return false,
                }
            }
        }
        true
    }

    /// Strict subset.
    pub fn is_proper_subset_of(&self, other: &TupleSet) -> bool {
        self.0.len() < other.0.len() && self.is_subset_of(other)
    }
}

impl FromIterator<TupleId> for TupleSet {
    fn from_iter<I: IntoIterator<Item = TupleId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for TupleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", id.0)?;
        }
        write!(f, "}}")
    }
}

/// Reduces a collection to its subset-minimal, deduplicated antichain in
/// canonical order.
///
/// Candidates are sorted by size so each set only needs checking against
/// already-kept (smaller or equal) sets; a set with a strict subset among the
/// kept ones is discarded. Worst case O(n^2 * k) id comparisons for n sets of
/// arity k; arity is bounded by constraint arity and n by the witness count.
pub fn minimal_sets(mut candidates: Vec<TupleSet>) -> Vec<TupleSet> {
    candidates.sort_unstable_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    candidates.dedup();

    let mut kept: Vec<TupleSet> = Vec::with_capacity(candidates.len());
    for cand in candidates {
        if kept.iter().any(|k| k.is_subset_of(&cand)) {
            continue;
        }
        kept.push(cand);
    }
    kept.sort_unstable();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ids: &[u32]) -> TupleSet {
        TupleSet::new(ids.iter().map(|&i| TupleId(i)))
    }

    #[test]
    fn construction_sorts_and_dedups() {
        let s = ts(&[3, 1, 3, 2]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.as_slice(), &[TupleId(1), TupleId(2), TupleId(3)]);
    }

    #[test]
    fn subset_checks() {
        assert!(ts(&[1, 3]).is_subset_of(&ts(&[1, 2, 3])));
        assert!(!ts(&[1, 4]).is_subset_of(&ts(&[1, 2, 3])));
        assert!(ts(&[1, 2]).is_proper_subset_of(&ts(&[1, 2, 3])));
        assert!(!ts(&[1, 2]).is_proper_subset_of(&ts(&[1, 2])));
    }

    #[test]
    fn minimal_sets_discards_supersets() {
        let out = minimal_sets(vec![ts(&[1, 2, 3]), ts(&[1, 2]), ts(&[4]), ts(&[1, 2])]);
        assert_eq!(out, vec![ts(&[1, 2]), ts(&[4])]);
    }

    #[test]
    fn minimal_sets_keeps_incomparable_sets() {
        let out = minimal_sets(vec![ts(&[1, 2]), ts(&[2, 3]), ts(&[3, 4])]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn minimal_sets_is_order_insensitive() {
        let a = minimal_sets(vec![ts(&[5]), ts(&[1, 5]), ts(&[2, 3])]);
        let b = minimal_sets(vec![ts(&[2, 3]), ts(&[1, 5]), ts(&[5])]);
        assert_eq!(a, b);
    }
}
