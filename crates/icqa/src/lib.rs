//! ICQA - Inconsistency-tolerant certain query answering metrics.
//!
//! Given a relational database instance violating declared denial
//! constraints, this workspace enumerates minimal inconsistent subsets,
//! scores every inconsistent tuple under four measures, extracts minimal
//! provenance supports per query answer, and combines both into the
//! 4 measures x 3 strategies ICQA metric grid.
//!
//! # Example
//!
//! ```
//! use icqa::prelude::*;
//! use icqa_test::orders;
//!
//! let db = orders::violated_database();
//! let arena = TupleArena::build(&db);
//! let dcs = DcSet::resolve(&orders::dc_set_spec(), &db).unwrap();
//!
//! let mis = extract_mis(&db, &arena, &dcs).unwrap();
//! assert_eq!(mis.len(), 2);
//!
//! let scores = icqa::measure::score(MeasureKind::Cim, &mis);
//! assert!(scores.nonzero() > 0);
//! ```

// Data model
pub use icqa_core::{
    CompareOp, ConjunctiveQuery, ConstraintSpec, Database, DcSet, DcSetSpec, DenialConstraint,
    IcqaError, MeasureKind, QuerySpec, Result, ShapWeighting, Strategy, TupleArena, TupleId,
    TupleSet, Value, ValueType,
};

// Engine
pub use icqa_engine::measure;
pub use icqa_engine::{
    extract_mis, verify_clean, witnesses, MatchPlan, MisCollection, TupleScores, Witnesses,
};

// Provenance and aggregation
pub use icqa_provenance::{
    score_answer, score_answers, shapley, support_sets, AnswerMetrics, ShapleyOutcome,
    ShapleyParams, SupportSets,
};

// Configuration and orchestration
pub use icqa_config::{Catalog, ConfigError, RunConfig};
pub use icqa_runner::{run_batch, run_instance, ArtifactStore, InstanceJob, RunContext};

/// Commonly used imports.
pub mod prelude {
    pub use icqa_config::{Catalog, RunConfig};
    pub use icqa_core::{
        Database, DcSet, IcqaError, MeasureKind, ShapWeighting, Strategy, TupleArena, TupleSet,
        Value,
    };
    pub use icqa_engine::{extract_mis, verify_clean, MisCollection};
    pub use icqa_provenance::{score_answers, support_sets, ShapleyParams};
    pub use icqa_runner::{run_batch, InstanceJob, RunContext};
}
