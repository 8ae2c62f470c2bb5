//! Batch fan-out across database instances.
//!
//! The workload is data-parallel and CPU-bound: every instance is independent
//! and a worker owns its instance end-to-end, so the pool needs no locking
//! beyond the keyed artifact store. Per-instance failures are isolated into
//! the report; only configuration errors abort the whole batch.

use rayon::prelude::*;

use icqa_core::{IcqaError, Result};

use crate::context::RunContext;
use crate::pipeline::{run_instance, InstanceJob, InstanceReport};
use crate::store::ArtifactStore;
use icqa_config::WorkerThreadCount;

/// One instance that did not complete.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    pub instance_id: String,
    pub error: String,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Completed instances, in instance-id order.
    pub completed: Vec<InstanceReport>,
    /// Failed instances, in instance-id order.
    pub failures: Vec<UnitFailure>,
}

impl BatchReport {
    pub fn is_fully_successful(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs every job through the per-instance pipeline.
///
/// Jobs are processed in sorted instance-id order (reported that way too).
/// The catalog is resolved once against the first instance's schema before
/// fanning out, so malformed configuration fails fast without touching any
/// instance.
pub fn run_batch(ctx: &RunContext, mut jobs: Vec<InstanceJob>) -> Result<BatchReport> {
    jobs.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));

    if let Some(first) = jobs.first() {
        ctx.check_against(&first.database)?;
    }

    let store = ArtifactStore::new(&ctx.config.output_dir);
    tracing::info!(jobs = jobs.len(), output = %store.root().display(), "batch starting");

    let outcomes: Vec<std::result::Result<InstanceReport, UnitFailure>> =
        match &ctx.config.worker_thread_count {
            WorkerThreadCount::None => jobs
                .iter()
                .map(|job| run_one(ctx, job, &store))
                .collect(),
            WorkerThreadCount::Auto => jobs
                .par_iter()
                .map(|job| run_one(ctx, job, &store))
                .collect(),
            WorkerThreadCount::Count(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*n)
                    .build()
                    .map_err(|e| IcqaError::Config(format!("worker pool: {e}")))?;
                pool.install(|| {
                    jobs.par_iter()
                        .map(|job| run_one(ctx, job, &store))
                        .collect()
                })
            }
        };

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(r) => report.completed.push(r),
            Err(f) => report.failures.push(f),
        }
    }

    tracing::info!(
        completed = report.completed.len(),
        failed = report.failures.len(),
        "batch finished"
    );
    Ok(report)
}

fn run_one(
    ctx: &RunContext,
    job: &InstanceJob,
    store: &ArtifactStore,
) -> std::result::Result<InstanceReport, UnitFailure> {
    run_instance(ctx, job, store).map_err(|e| {
        tracing::warn!(instance = %job.instance_id, error = %e, "instance failed");
        UnitFailure {
            instance_id: job.instance_id.clone(),
            error: e.to_string(),
        }
    })
}
