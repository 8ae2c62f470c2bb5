//! Answer-level ICQA aggregation.
//!
//! The three strategies are a closed set selected by configuration, all
//! polymorphic over the same inputs: one measure's tuple scores and one
//! answer's minimal support collection. Shapley values are computed once per
//! answer and reused across the four measures.

use std::collections::BTreeMap;

use icqa_core::{MeasureKind, ShapWeighting, Strategy, TupleSet, Value};
use icqa_engine::TupleScores;

use crate::shapley::{shapley, ShapleyOutcome, ShapleyParams, ShapleyValues};
use crate::support::SupportSets;

/// The metric grid of one answer: strategy x measure cells keyed
/// `strategy_measure`, with `None` marking a Shapley scale-limit skip.
#[derive(Debug, Clone)]
pub struct AnswerMetrics {
    pub key: Vec<Value>,
    pub aggregate: Option<Value>,
    pub cells: BTreeMap<String, Option<f64>>,
}

/// Supports as independent alternative causes: complement of the product of
/// complements over the per-support substituted values. The substituted value
/// of one support is the peak inconsistency among its members, so an answer
/// with a single support of a single tuple scores exactly that tuple's
/// measure.
fn prov_score(scores: &TupleScores, supports: &[TupleSet]) -> f64 {
    let mut product = 1.0;
    for support in supports {
        let sigma = support
            .iter()
            .map(|id| scores.get(id))
            .fold(0.0, f64::max);
        product *= 1.0 - sigma;
    }
    1.0 - product
}

/// Weakest link, best case: the maximum over supports of the minimum member
/// score.
fn resp_score(scores: &TupleScores, supports: &[TupleSet]) -> f64 {
    supports
        .iter()
        .map(|support| {
            support
                .iter()
                .map(|id| scores.get(id))
                .fold(f64::INFINITY, f64::min)
        })
        .fold(0.0, f64::max)
}

/// Shapley attribution combined with the tuple measure.
fn shap_score(values: &ShapleyValues, scores: &TupleScores, weighting: ShapWeighting) -> f64 {
    let weighted: f64 = values
        .players
        .iter()
        .zip(&values.values)
        .map(|(&id, &phi)| phi * scores.get(id))
        .sum();
    match weighting {
        ShapWeighting::Sum => weighted,
        ShapWeighting::Normalized => {
            let total = values.total();
            if total > 0.0 {
                weighted / total
            } else {
                0.0
            }
        }
    }
}

/// Scores one answer under one strategy.
///
/// Returns `None` for an empty support collection (no derivation, no score
/// defined) and for Shapley skips past the configured player limit.
pub fn score_answer(
    strategy: Strategy,
    scores: &TupleScores,
    supports: &[TupleSet],
    params: &ShapleyParams,
    weighting: ShapWeighting,
) -> Option<f64> {
    if supports.is_empty() {
        return None;
    }
    match strategy {
        Strategy::Prov => Some(prov_score(scores, supports)),
        Strategy::Resp => Some(resp_score(scores, supports)),
        Strategy::Shap => match shapley(supports, params) {
            ShapleyOutcome::Computed(values) => Some(shap_score(&values, scores, weighting)),
            ShapleyOutcome::Skipped { .. } => None,
        },
    }
}

/// Scores every answer of a query under every requested strategy and measure.
pub fn score_answers(
    measures: &[TupleScores],
    supports: &SupportSets,
    strategies: &[Strategy],
    params: &ShapleyParams,
    weighting: ShapWeighting,
) -> Vec<AnswerMetrics> {
    let mut out = Vec::with_capacity(supports.answers.len());

    for answer in &supports.answers {
        // One Shapley computation per answer, shared by all measures.
        let shap_values = if strategies.contains(&Strategy::Shap) && !answer.supports.is_empty()
        {
            match shapley(&answer.supports, params) {
                ShapleyOutcome::Computed(values) => Some(values),
                ShapleyOutcome::Skipped { .. } => None,
            }
        } else {
            None
        };

        let mut cells = BTreeMap::new();
        for &strategy in strategies {
            for scores in measures {
                let value = if answer.supports.is_empty() {
                    None
                } else {
                    match strategy {
                        Strategy::Prov => Some(prov_score(scores, &answer.supports)),
                        Strategy::Resp => Some(resp_score(scores, &answer.supports)),
                        Strategy::Shap => shap_values
                            .as_ref()
                            .map(|values| shap_score(values, scores, weighting)),
                    }
                };
                cells.insert(cell_key(strategy, scores.kind), value);
            }
        }

        out.push(AnswerMetrics {
            key: answer.key.clone(),
            aggregate: answer.aggregate.clone(),
            cells,
        });
    }

    out
}

/// Canonical cell name, e.g. `prov_cim`.
pub fn cell_key(strategy: Strategy, measure: MeasureKind) -> String {
    format!("{strategy}_{measure}")
}
