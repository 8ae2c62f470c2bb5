//! ICQA Runner - batch orchestration over database instances.
//!
//! One read-only context per run, one worker per instance, one artifact store
//! for all of them. Workers own their instance end-to-end; the only shared
//! resource is the store, whose writes are keyed so they never overlap.

pub mod batch;
pub mod context;
pub mod logging;
pub mod pipeline;
pub mod store;

pub use batch::{run_batch, BatchReport, UnitFailure};
pub use context::RunContext;
pub use pipeline::{run_instance, InstanceJob, InstanceReport, MeasureRuntime};
pub use store::ArtifactStore;
