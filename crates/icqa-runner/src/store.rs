//! Persisted artifact store.
//!
//! Artifacts are JSON files under the output root, keyed by instance id plus
//! the producing unit (constraint set, measure, query), so concurrent workers
//! never write the same path. Collections are canonically ordered before
//! serialization and every write goes through a temporary file followed by an
//! atomic rename: an aborted run leaves no partial artifact behind, and
//! rerunning a pipeline produces byte-identical files.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use icqa_core::{
    IcqaError, MeasureKind, Result, TupleArena, TupleSet, Value,
};
use icqa_engine::{MisCollection, TupleScores};
use icqa_provenance::{AnswerMetrics, SupportSets};

/// File-system store rooted at the configured output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

/// MIS collection artifact.
#[derive(Debug, Serialize)]
pub struct MisArtifact {
    pub instance_id: String,
    pub dc_set: String,
    /// Each MIS as sorted `relation#pk` labels.
    pub sets: Vec<Vec<String>>,
}

/// Tuple-score artifact for one measure.
#[derive(Debug, Serialize)]
pub struct ScoreArtifact {
    pub instance_id: String,
    pub dc_set: String,
    pub measure: MeasureKind,
    /// `label -> score`, ascending label order.
    pub scores: BTreeMap<String, f64>,
}

/// Support-set artifact for one query.
#[derive(Debug, Serialize)]
pub struct SupportArtifact {
    pub instance_id: String,
    pub query: String,
    pub answers: Vec<SupportAnswerArtifact>,
}

#[derive(Debug, Serialize)]
pub struct SupportAnswerArtifact {
    pub key: Vec<Value>,
    pub aggregate: Option<Value>,
    pub supports: Vec<Vec<String>>,
}

/// ICQA metric artifact for one (query, constraint set) pair.
#[derive(Debug, Serialize)]
pub struct MetricsArtifact {
    pub instance_id: String,
    pub dc_set: String,
    pub seed: u64,
    pub query: String,
    pub answers: Vec<MetricsAnswerArtifact>,
}

#[derive(Debug, Serialize)]
pub struct MetricsAnswerArtifact {
    pub key: Vec<Value>,
    pub aggregate: Option<Value>,
    /// `strategy_measure -> value`; `null` cells are explicit skip markers.
    pub cells: BTreeMap<String, Option<f64>>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path-safe form of an instance id (ids may carry `/` separators).
    fn sanitize(id: &str) -> String {
        id.replace(['/', '\\'], "__")
    }

    fn render_sets(sets: &[TupleSet], arena: &TupleArena) -> Vec<Vec<String>> {
        sets.iter()
            .map(|s| {
                let mut labels: Vec<String> = s
                    .iter()
                    .filter_map(|id| arena.label(id))
                    .map(|l| l.render())
                    .collect();
                labels.sort_unstable();
                labels
            })
            .collect()
    }

    /// Persists one MIS collection.
    pub fn write_mis(
        &self,
        instance_id: &str,
        dc_set: &str,
        mis: &MisCollection,
        arena: &TupleArena,
    ) -> Result<PathBuf> {
        let artifact = MisArtifact {
            instance_id: instance_id.to_string(),
            dc_set: dc_set.to_string(),
            sets: Self::render_sets(mis.sets(), arena),
        };
        self.write_json(
            &PathBuf::from("mis")
                .join(Self::sanitize(instance_id))
                .join(format!("{dc_set}.json")),
            &artifact,
        )
    }

    /// Persists one measure's tuple scores.
    pub fn write_scores(
        &self,
        instance_id: &str,
        dc_set: &str,
        scores: &TupleScores,
        arena: &TupleArena,
    ) -> Result<PathBuf> {
        let mut map = BTreeMap::new();
        for (id, value) in scores.sorted_entries() {
            if let Some(label) = arena.label(id) {
                map.insert(label.render(), value);
            }
        }
        let artifact = ScoreArtifact {
            instance_id: instance_id.to_string(),
            dc_set: dc_set.to_string(),
            measure: scores.kind,
            scores: map,
        };
        self.write_json(
            &PathBuf::from("scores")
                .join(Self::sanitize(instance_id))
                .join(dc_set)
                .join(format!("{}.json", scores.kind)),
            &artifact,
        )
    }

    /// Persists one query's support sets.
    pub fn write_supports(
        &self,
        instance_id: &str,
        supports: &SupportSets,
        arena: &TupleArena,
    ) -> Result<PathBuf> {
        let artifact = SupportArtifact {
            instance_id: instance_id.to_string(),
            query: supports.query.clone(),
            answers: supports
                .answers
                .iter()
                .map(|a| SupportAnswerArtifact {
                    key: a.key.clone(),
                    aggregate: a.aggregate.clone(),
                    supports: Self::render_sets(&a.supports, arena),
                })
                .collect(),
        };
        self.write_json(
            &PathBuf::from("support")
                .join(Self::sanitize(instance_id))
                .join(format!("{}.json", supports.query)),
            &artifact,
        )
    }

    /// Persists one query's answer metrics.
    pub fn write_metrics(
        &self,
        instance_id: &str,
        dc_set: &str,
        seed: u64,
        query: &str,
        metrics: &[AnswerMetrics],
    ) -> Result<PathBuf> {
        let artifact = MetricsArtifact {
            instance_id: instance_id.to_string(),
            dc_set: dc_set.to_string(),
            seed,
            query: query.to_string(),
            answers: metrics
                .iter()
                .map(|m| MetricsAnswerArtifact {
                    key: m.key.clone(),
                    aggregate: m.aggregate.clone(),
                    cells: m.cells.clone(),
                })
                .collect(),
        };
        self.write_json(
            &PathBuf::from("icqa")
                .join(Self::sanitize(instance_id))
                .join(dc_set)
                .join(format!("{query}.json")),
            &artifact,
        )
    }

    /// Serializes to a temporary file in the target directory, then renames
    /// into place.
    fn write_json(&self, relative: &Path, value: &impl Serialize) -> Result<PathBuf> {
        let path = self.root.join(relative);
        let parent = path
            .parent()
            .ok_or_else(|| IcqaError::InvalidState("artifact path has no parent".into()))?;
        std::fs::create_dir_all(parent)?;

        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| IcqaError::Computation(format!("artifact serialization: {e}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&bytes)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&path)
            .map_err(|e| IcqaError::Io(e.error))?;
        Ok(path)
    }
}
