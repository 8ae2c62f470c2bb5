//! Minimal support-set extraction.
//!
//! Standard provenance-polynomial construction for positive relational
//! algebra: every join assignment deriving an answer contributes the set of
//! base tuples it touches as a candidate support; projection and DISTINCT
//! union candidates per answer; subset-minimality filtering removes redundant
//! candidates.
//!
//! Aggregate queries (COUNT/SUM/AVG) use the value-reproduction reading: the
//! answer is the group together with its witnessed aggregate value, and the
//! only support sufficient to reproduce that value is the union of every
//! contributing assignment's tuples. This boundary is fixed per query
//! template, not inferred: removing any contributor changes the count and in
//! general the sum or average.

use std::collections::BTreeMap;

use icqa_core::{
    minimal_sets, AggregateFn, ConjunctiveQuery, Database, IcqaError, Result, TupleArena,
    TupleSet, Value,
};
use icqa_engine::{MatchIter, MatchPlan};
use smallvec::SmallVec;

/// One answer with its minimal supports.
#[derive(Debug, Clone)]
pub struct AnswerSupport {
    /// Projected values identifying the answer.
    pub key: Vec<Value>,
    /// Witnessed aggregate value, present for aggregate queries.
    pub aggregate: Option<Value>,
    /// Minimal supports, pairwise non-redundant, in canonical order.
    pub supports: Vec<TupleSet>,
}

/// All answers of one query against one database instance.
#[derive(Debug, Clone)]
pub struct SupportSets {
    pub query: String,
    /// Answers in canonical (projected-value) order.
    pub answers: Vec<AnswerSupport>,
}

impl SupportSets {
    /// Whether the query produced no answers. The aggregator treats this as
    /// "no score defined", never as zero.
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Looks up one answer by its projected values.
    pub fn find(&self, key: &[Value]) -> Option<&AnswerSupport> {
        self.answers.iter().find(|a| a.key == key)
    }
}

#[derive(Default)]
struct GroupAcc {
    candidates: Vec<TupleSet>,
    count: usize,
    sum: f64,
}

/// Enumerates all minimal support sets for every answer of `query`.
pub fn support_sets(
    db: &Database,
    arena: &TupleArena,
    query: &ConjunctiveQuery,
) -> Result<SupportSets> {
    let plan = MatchPlan::new(db, &query.pattern)?;
    let mut groups: BTreeMap<Vec<Value>, GroupAcc> = BTreeMap::new();

    for assignment in MatchIter::new(db, &query.pattern, &plan) {
        let rows: SmallVec<[&[Value]; 4]> = assignment
            .iter()
            .enumerate()
            .map(|(role, &row)| {
                db.table_at(query.pattern.role_tables[role])
                    .and_then(|t| t.row(row))
                    .map(|r| r.as_slice())
                    .unwrap_or(&[])
            })
            .collect();

        let key: Vec<Value> = query
            .projection
            .iter()
            .map(|&(role, column)| rows[role][column].clone())
            .collect();

        let tuples: TupleSet = assignment
            .iter()
            .enumerate()
            .filter_map(|(role, &row)| arena.id_of(query.pattern.role_tables[role], row))
            .collect();

        let acc = groups.entry(key).or_default();
        acc.count += 1;
        if let Some(agg) = &query.aggregate {
            if let Some((role, column)) = agg.input {
                let value = rows[role][column].as_f64().ok_or_else(|| {
                    IcqaError::Computation(format!(
                        "{}: non-numeric value under aggregation",
                        query.name
                    ))
                })?;
                acc.sum += value;
            }
        }
        acc.candidates.push(tuples);
    }

    let mut answers = Vec::with_capacity(groups.len());
    for (key, acc) in groups {
        let (aggregate, supports) = match &query.aggregate {
            None => (None, minimal_sets(acc.candidates)),
            Some(agg) => {
                let value = match agg.function {
                    AggregateFn::Count => Value::Int(acc.count as i64),
                    AggregateFn::Sum => Value::Float(acc.sum),
                    AggregateFn::Avg => Value::Float(acc.sum / acc.count as f64),
                };
                // The full contributor set is the one support able to
                // reproduce the witnessed value.
                let all: TupleSet = acc
                    .candidates
                    .iter()
                    .flat_map(|s| s.iter())
                    .collect();
                (Some(value), vec![all])
            }
        };
        answers.push(AnswerSupport {
            key,
            aggregate,
            supports,
        });
    }

    tracing::debug!(query = %query.name, answers = answers.len(), "extracted support sets");
    Ok(SupportSets {
        query: query.name.clone(),
        answers,
    })
}
