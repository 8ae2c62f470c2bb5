//! Join planning for conjunctive patterns.
//!
//! Roles are matched in declaration order. For every role after the first,
//! equality predicates linking it to an already-bound role (or to a constant)
//! become composite hash-index probe keys; everything else stays a residual
//! filter evaluated at the deepest role it references. Indexes are built once
//! per plan, so matching a pattern costs index probes plus residual checks
//! instead of a cross product over the involved tables.

use std::collections::HashMap;

use icqa_core::{
    CompareOp, ConjunctivePattern, Database, IcqaError, Operand, Result, Value,
};

/// How one component of a probe key is produced at match time.
#[derive(Debug, Clone)]
pub(crate) enum KeySource {
    /// Value of a column of an already-bound role.
    Bound { role: usize, column: usize },
    /// A constant from the pattern.
    Constant(Value),
}

/// Per-role matching plan.
#[derive(Debug)]
pub(crate) struct LevelPlan {
    /// Table index this role scans or probes.
    pub table: usize,
    /// Sources producing the probe key values from the current assignment,
    /// aligned with the indexed columns.
    pub key_sources: Vec<KeySource>,
    /// Hash index `probe key -> row indexes`, present when the role has
    /// equality predicates to probe on.
    pub index: Option<HashMap<Vec<Value>, Vec<usize>>>,
    /// Predicate indexes evaluated once this role is bound.
    pub residuals: Vec<usize>,
}

/// Executable plan for one pattern against one database instance.
#[derive(Debug)]
pub struct MatchPlan {
    pub(crate) levels: Vec<LevelPlan>,
}

impl MatchPlan {
    /// Plans a pattern and builds its probe indexes.
    pub fn new(db: &Database, pattern: &ConjunctivePattern) -> Result<Self> {
        let arity = pattern.arity();
        let mut levels: Vec<LevelPlan> = Vec::with_capacity(arity);

        // Deepest role referenced by each predicate decides where it runs.
        let mut residual_of = vec![Vec::new(); arity];
        let mut probe_of: Vec<Vec<(usize, KeySource)>> = vec![Vec::new(); arity];

        for (pi, pred) in pattern.predicates.iter().enumerate() {
            let level = Self::deepest_role(&pred.lhs, &pred.rhs).ok_or_else(|| {
                IcqaError::InvalidState("predicate references no role".into())
            })?;

            if pred.op == CompareOp::Eq {
                if let Some((own_column, source)) = Self::probe_parts(pred, level) {
                    probe_of[level].push((own_column, source));
                    continue;
                }
            }
            residual_of[level].push(pi);
        }

        for role in 0..arity {
            let table = pattern.role_tables[role];
            let mut probe_columns = Vec::new();
            let mut key_sources = Vec::new();
            for (column, source) in probe_of[role].drain(..) {
                probe_columns.push(column);
                key_sources.push(source);
            }

            let index = if probe_columns.is_empty() {
                None
            } else {
                Some(Self::build_index(db, table, &probe_columns)?)
            };

            levels.push(LevelPlan {
                table,
                key_sources,
                index,
                residuals: std::mem::take(&mut residual_of[role]),
            });
        }

        Ok(Self { levels })
    }

    /// Deepest role index referenced by either operand.
    fn deepest_role(lhs: &Operand, rhs: &Operand) -> Option<usize> {
        let role_of = |op: &Operand| match op {
            Operand::Column { role, .. } => Some(*role),
            Operand::Constant(_) => None,
        };
        match (role_of(lhs), role_of(rhs)) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Splits an equality predicate into (column of `level`, key source) when
    /// the other side is bound strictly earlier or constant.
    fn probe_parts(
        pred: &icqa_core::Predicate,
        level: usize,
    ) -> Option<(usize, KeySource)> {
        let classify = |op: &Operand| match op {
            Operand::Column { role, column } => {
                if *role == level {
                    Ok(*column)
                } else {
                    Err(KeySource::Bound {
                        role: *role,
                        column: *column,
                    })
                }
            }
            Operand::Constant(v) => Err(KeySource::Constant(v.clone())),
        };

        match (classify(&pred.lhs), classify(&pred.rhs)) {
            (Ok(own), Err(source)) | (Err(source), Ok(own)) => Some((own, source)),
            // Both sides on this role (e.g. self-comparison) stays residual.
            _ => None,
        }
    }

    fn build_index(
        db: &Database,
        table: usize,
        columns: &[usize],
    ) -> Result<HashMap<Vec<Value>, Vec<usize>>> {
        let table = db
            .table_at(table)
            .ok_or_else(|| IcqaError::InvalidState("table index out of range".into()))?;
        let mut index: HashMap<Vec<Value>, Vec<usize>> = HashMap::new();
        for (row_idx, row) in table.rows().iter().enumerate() {
            let key: Vec<Value> = columns.iter().map(|&c| row[c].clone()).collect();
            index.entry(key).or_default().push(row_idx);
        }
        Ok(index)
    }

    /// Number of roles this plan binds.
    pub fn arity(&self) -> usize {
        self.levels.len()
    }
}
