//! Per-instance pipeline.
//!
//! One worker runs one database instance end-to-end: optional clean gate,
//! witness discovery and MIS extraction per constraint set, measure scoring,
//! then support sets and answer metrics per query. Query failures are
//! recorded and skipped so the rest of the instance completes; MIS-stage
//! failures abort the instance. Nothing is ever retried.

use std::time::Instant;

use serde::Serialize;

use icqa_config::EnvironmentMode;
use icqa_core::{ConjunctiveQuery, Database, DcSet, IcqaError, Result, TupleArena};
use icqa_engine::{extract_mis, measure, verify_clean, MisCollection};
use icqa_provenance::{score_answers, support_sets};

use crate::context::RunContext;
use crate::store::ArtifactStore;

/// One unit of work: a populated database instance with its identity.
#[derive(Debug, Clone)]
pub struct InstanceJob {
    /// Stable instance identifier, e.g. `sf0.1/subsetB/0p1pct/seed09`.
    pub instance_id: String,
    /// Injection seed that produced the instance, stamped into artifacts.
    pub seed: u64,
    pub database: Database,
}

/// Wall time and yield of one measure computation.
#[derive(Debug, Clone, Serialize)]
pub struct MeasureRuntime {
    pub dc_set: String,
    pub measure: String,
    pub seconds: f64,
    pub nonzero: usize,
}

/// Summary of one completed instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceReport {
    pub instance_id: String,
    /// MIS count per constraint set.
    pub mis_counts: Vec<(String, usize)>,
    pub measure_runtimes: Vec<MeasureRuntime>,
    /// Answers scored across all queries and constraint sets.
    pub answers_scored: usize,
    /// `(query, error)` pairs for units that were skipped.
    pub query_failures: Vec<(String, String)>,
}

/// Full-assert check: the extracted collection must be an antichain.
fn assert_minimal(mis: &MisCollection) -> Result<()> {
    for (i, a) in mis.sets().iter().enumerate() {
        for b in mis.sets().iter().skip(i + 1) {
            if a.is_proper_subset_of(b) || b.is_proper_subset_of(a) {
                return Err(IcqaError::InvalidState(format!(
                    "MIS collection is not subset-minimal: {a} and {b}"
                )));
            }
        }
    }
    Ok(())
}

/// Runs the full pipeline for one instance.
///
/// # Errors
///
/// Configuration errors from catalog resolution, the integrity precondition,
/// and MIS-stage computation errors abort the instance; per-query errors are
/// collected in the report instead.
pub fn run_instance(
    ctx: &RunContext,
    job: &InstanceJob,
    store: &ArtifactStore,
) -> Result<InstanceReport> {
    let db = &job.database;
    let arena = TupleArena::build(db);
    let shapley = ctx.shapley_params();

    let mut report = InstanceReport {
        instance_id: job.instance_id.clone(),
        mis_counts: Vec::new(),
        measure_runtimes: Vec::new(),
        answers_scored: 0,
        query_failures: Vec::new(),
    };

    for set_spec in &ctx.catalog.dc_sets {
        let dcs = DcSet::resolve(set_spec, db)?;

        if ctx.config.verify_clean {
            verify_clean(db, &arena, &dcs, &job.instance_id)?;
        }

        let mis = extract_mis(db, &arena, &dcs)?;
        if ctx.config.environment_mode == EnvironmentMode::FullAssert {
            assert_minimal(&mis)?;
        }
        store.write_mis(&job.instance_id, &dcs.id, &mis, &arena)?;
        report.mis_counts.push((dcs.id.clone(), mis.len()));

        let mut all_scores = Vec::with_capacity(ctx.config.measures.len());
        for &kind in &ctx.config.measures {
            let started = Instant::now();
            let scores = measure::score(kind, &mis);
            report.measure_runtimes.push(MeasureRuntime {
                dc_set: dcs.id.clone(),
                measure: kind.to_string(),
                seconds: started.elapsed().as_secs_f64(),
                nonzero: scores.nonzero(),
            });
            store.write_scores(&job.instance_id, &dcs.id, &scores, &arena)?;
            all_scores.push(scores);
        }

        for query_spec in &ctx.catalog.queries {
            let outcome = (|| -> Result<usize> {
                let query = ConjunctiveQuery::resolve(query_spec, db)?;
                let supports = support_sets(db, &arena, &query)?;
                store.write_supports(&job.instance_id, &supports, &arena)?;

                let metrics = score_answers(
                    &all_scores,
                    &supports,
                    &ctx.config.strategies,
                    &shapley,
                    ctx.config.shapley.weighting,
                );
                store.write_metrics(
                    &job.instance_id,
                    &dcs.id,
                    job.seed,
                    &query.name,
                    &metrics,
                )?;
                Ok(metrics.len())
            })();

            match outcome {
                Ok(count) => report.answers_scored += count,
                Err(e) => {
                    tracing::warn!(
                        instance = %job.instance_id,
                        query = %query_spec.name,
                        error = %e,
                        "query skipped"
                    );
                    report
                        .query_failures
                        .push((query_spec.name.clone(), e.to_string()));
                }
            }
        }
    }

    tracing::info!(
        instance = %job.instance_id,
        answers = report.answers_scored,
        failures = report.query_failures.len(),
        "instance completed"
    );
    Ok(report)
}
