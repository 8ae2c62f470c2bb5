//! Denial constraints.
//!
//! A denial constraint forbids any assignment of concrete tuples to its roles
//! from satisfying the full predicate conjunction; every satisfying
//! assignment is a violation witness.

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Result;
use crate::pattern::{ConjunctivePattern, PatternSpec};

/// Declarative form of one denial constraint, as loaded from a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub name: String,
    #[serde(flatten)]
    pub pattern: PatternSpec,
}

/// Declarative form of a named constraint set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcSetSpec {
    pub id: String,
    pub constraints: Vec<ConstraintSpec>,
}

/// Executable denial constraint.
#[derive(Debug, Clone)]
pub struct DenialConstraint {
    pub name: String,
    pub pattern: ConjunctivePattern,
}

impl DenialConstraint {
    /// Resolves a spec against a database schema; all validation happens here.
    pub fn resolve(spec: &ConstraintSpec, db: &Database) -> Result<Self> {
        let pattern = ConjunctivePattern::resolve(&spec.pattern, db, &spec.name)?;
        Ok(Self {
            name: spec.name.clone(),
            pattern,
        })
    }

    /// Number of roles (witness arity upper bound; self-joins may bind the
    /// same tuple to several roles, collapsing the witness below this).
    pub fn arity(&self) -> usize {
        self.pattern.arity()
    }

    /// Whether a candidate assignment (one row per role) violates the
    /// constraint, i.e. satisfies the full predicate conjunction.
    pub fn matches(&self, rows: &[&[crate::value::Value]]) -> bool {
        self.pattern.holds(rows)
    }
}

/// A resolved, named set of denial constraints evaluated jointly.
#[derive(Debug, Clone)]
pub struct DcSet {
    pub id: String,
    pub constraints: Vec<DenialConstraint>,
}

impl DcSet {
    /// Resolves every constraint of a spec set. Fails fast on the first
    /// malformed constraint.
    pub fn resolve(spec: &DcSetSpec, db: &Database) -> Result<Self> {
        let constraints = spec
            .constraints
            .iter()
            .map(|c| DenialConstraint::resolve(c, db))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id: spec.id.clone(),
            constraints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ColumnDef, Table, TableSchema};
    use crate::pattern::{CompareOp, OperandSpec, PatternSpec, PredicateSpec, RoleBinding};
    use crate::value::{Value, ValueType};

    fn db() -> Database {
        let mut db = Database::new();
        let mut orders = Table::new(
            TableSchema::new(
                "orders",
                vec![
                    ColumnDef::new("o_orderkey", ValueType::Int),
                    ColumnDef::new("o_totalprice", ValueType::Float),
                ],
                &["o_orderkey"],
            )
            .unwrap(),
        );
        orders
            .push_row(vec![Value::Int(1), Value::Float(-5.0)])
            .unwrap();
        orders
            .push_row(vec![Value::Int(2), Value::Float(80.0)])
            .unwrap();
        db.add_table(orders).unwrap();
        db
    }

    fn negative_price() -> ConstraintSpec {
        ConstraintSpec {
            name: "no_negative_totalprice".into(),
            pattern: PatternSpec {
                roles: vec![RoleBinding {
                    name: "o".into(),
                    table: "orders".into(),
                }],
                predicates: vec![PredicateSpec {
                    lhs: OperandSpec::Column {
                        role: "o".into(),
                        column: "o_totalprice".into(),
                    },
                    op: CompareOp::Lt,
                    rhs: OperandSpec::Constant {
                        value: Value::Float(0.0),
                    },
                }],
            },
        }
    }

    #[test]
    fn resolved_constraint_matches_violating_rows_only() {
        let db = db();
        let dc = DenialConstraint::resolve(&negative_price(), &db).unwrap();
        assert_eq!(dc.arity(), 1);
        let table = db.table("orders").unwrap();
        assert!(dc.matches(&[table.row(0).unwrap().as_slice()]));
        assert!(!dc.matches(&[table.row(1).unwrap().as_slice()]));
    }

    #[test]
    fn set_resolution_fails_fast_on_malformed_member() {
        let db = db();
        let mut bad = negative_price();
        bad.pattern.roles[0].table = "missing".into();
        let spec = DcSetSpec {
            id: "checks".into(),
            constraints: vec![negative_price(), bad],
        };
        assert!(DcSet::resolve(&spec, &db).is_err());
    }
}
