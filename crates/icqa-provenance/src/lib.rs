//! ICQA Provenance - support sets and answer-level aggregation.
//!
//! For every query answer this crate enumerates the minimal base-tuple sets
//! sufficient to derive it, then combines per-tuple inconsistency scores with
//! those supports under the three aggregation strategies (Prov, Resp, Shap)
//! to produce the 4 measures x 3 strategies metric grid per answer.

pub mod aggregate;
pub mod shapley;
pub mod support;

pub use aggregate::{score_answer, score_answers, AnswerMetrics};
pub use shapley::{shapley, ShapleyMethod, ShapleyOutcome, ShapleyParams, ShapleyValues};
pub use support::{support_sets, AnswerSupport, SupportSets};
