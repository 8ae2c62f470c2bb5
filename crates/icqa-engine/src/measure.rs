//! Tuple-level inconsistency measures.
//!
//! All four measures are pure functions of the MIS collection: no randomness,
//! no dependence on enumeration order. A tuple absent from every MIS scores
//! zero under every measure.

use std::collections::HashMap;

use icqa_core::{MeasureKind, TupleId};

use crate::mis::MisCollection;

/// Scores of one measure over one (instance, constraint set) pair.
///
/// Only participating tuples are stored; every other tuple reads as zero.
#[derive(Debug, Clone)]
pub struct TupleScores {
    pub kind: MeasureKind,
    scores: HashMap<TupleId, f64>,
}

impl TupleScores {
    pub fn new(kind: MeasureKind, scores: HashMap<TupleId, f64>) -> Self {
        Self { kind, scores }
    }

    /// Score of a tuple; zero when it participates in no MIS.
    pub fn get(&self, id: TupleId) -> f64 {
        self.scores.get(&id).copied().unwrap_or(0.0)
    }

    /// Number of tuples with a nonzero score.
    pub fn nonzero(&self) -> usize {
        self.scores.len()
    }

    /// `(tuple, score)` pairs in ascending tuple order, for persistence.
    pub fn sorted_entries(&self) -> Vec<(TupleId, f64)> {
        let mut entries: Vec<(TupleId, f64)> = self.scores.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable_by_key(|&(id, _)| id);
        entries
    }
}

/// Computes one measure over the MIS collection.
pub fn score(kind: MeasureKind, mis: &MisCollection) -> TupleScores {
    let total = mis.len();
    let mut scores = HashMap::new();

    for id in mis.participants() {
        let containing = mis.containing(id);
        let value = match kind {
            MeasureKind::Cbm => containing.len() as f64,
            MeasureKind::Cim => {
                let min_size = containing
                    .iter()
                    .map(|&i| mis.sets()[i].len())
                    .min()
                    .unwrap_or(0);
                if min_size == 0 {
                    0.0
                } else {
                    1.0 / min_size as f64
                }
            }
            MeasureKind::Pim => {
                if total == 0 {
                    0.0
                } else {
                    containing.len() as f64 / total as f64
                }
            }
            MeasureKind::Rim => containing
                .iter()
                .map(|&i| 1.0 / mis.sets()[i].len() as f64)
                .fold(0.0, f64::max),
        };
        scores.insert(id, value);
    }

    TupleScores::new(kind, scores)
}

/// Computes all four measures over the collection.
pub fn score_all(mis: &MisCollection) -> Vec<TupleScores> {
    MeasureKind::ALL.iter().map(|&k| score(k, mis)).collect()
}
