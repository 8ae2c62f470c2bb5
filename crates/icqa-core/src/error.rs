//! Error types for the ICQA pipeline.

use thiserror::Error;

/// Main error type for ICQA operations.
///
/// The taxonomy mirrors how errors propagate through a batch run:
/// configuration errors abort the whole run before any instance is touched,
/// integrity-precondition failures halt one instance's pipeline, and
/// computation errors are recorded per unit and skipped.
#[derive(Debug, Error)]
pub enum IcqaError {
    /// Malformed constraint, query, or run configuration. Fails fast.
    #[error("configuration error: {0}")]
    Config(String),

    /// A supposedly clean database instance shows violation witnesses.
    ///
    /// This indicates an upstream data-generation bug and is never absorbed.
    #[error("integrity precondition failed for {instance}: {witness_count} violation witness(es) on a database declared clean")]
    IntegrityPrecondition {
        /// Identifier of the offending database instance.
        instance: String,
        /// Number of witnesses found by the first violated constraint.
        witness_count: usize,
    },

    /// MIS or provenance extraction failed for one instance or query.
    #[error("computation error: {0}")]
    Computation(String),

    /// Invalid operation for the current pipeline state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Artifact persistence failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ICQA operations.
pub type Result<T> = std::result::Result<T, IcqaError>;
