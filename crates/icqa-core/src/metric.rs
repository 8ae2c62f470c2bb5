//! Metric vocabulary shared across the workspace.
//!
//! The measure kinds and aggregation strategies are a small closed set,
//! selected by configuration and stamped into persisted artifacts; the
//! computing crates implement them.

use serde::{Deserialize, Serialize};

/// The four tuple-level inconsistency measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    /// Conflict-base: number of MIS the tuple participates in.
    Cbm,
    /// Cardinality-based: inverse size of the smallest MIS containing the
    /// tuple, rewarding tight conflicts.
    Cim,
    /// Participation: fraction of all MIS the tuple participates in.
    Pim,
    /// Responsibility-based: best conflict-based contribution, the maximum of
    /// `1/|S|` over the MIS containing the tuple.
    Rim,
}

impl MeasureKind {
    pub const ALL: [MeasureKind; 4] = [
        MeasureKind::Cbm,
        MeasureKind::Cim,
        MeasureKind::Pim,
        MeasureKind::Rim,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MeasureKind::Cbm => "cbm",
            MeasureKind::Cim => "cim",
            MeasureKind::Pim => "pim",
            MeasureKind::Rim => "rim",
        }
    }
}

impl std::fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three provenance aggregation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Supports as independent alternative causes, combined by complement of
    /// products.
    Prov,
    /// Weakest link, best case: maximum over supports of the minimum member
    /// score.
    Resp,
    /// Cooperative-game attribution: Shapley values of the answer's support
    /// members, combined with the tuple measures.
    Shap,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Prov, Strategy::Resp, Strategy::Shap];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Prov => "prov",
            Strategy::Resp => "resp",
            Strategy::Shap => "shap",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How per-tuple Shapley values combine with the tuple measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapWeighting {
    /// Plain weighted sum `Σ φ(t)·score(t)`.
    #[default]
    Sum,
    /// Weighted sum normalized by the total Shapley mass `Σ φ(t)`.
    Normalized,
}
