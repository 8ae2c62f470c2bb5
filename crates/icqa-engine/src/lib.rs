//! ICQA Engine - witness discovery, MIS extraction, and tuple measures.
//!
//! The engine plays the role a relational backend plays in SQL-based
//! pipelines: it plans each conjunctive pattern as a chain of hash-index
//! probes (never a naive cross product), streams violation witnesses lazily,
//! reduces them to the joint subset-minimal MIS collection, and scores every
//! inconsistent tuple under the four measures.

pub mod detector;
pub mod matcher;
pub mod measure;
pub mod mis;
pub mod plan;

pub use detector::{verify_clean, witnesses, Witnesses};
pub use matcher::{Assignment, MatchIter};
pub use measure::{score, score_all, TupleScores};
pub use mis::{extract_mis, MisCollection};
pub use plan::MatchPlan;
