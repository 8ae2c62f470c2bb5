//! Conjunctive patterns over table roles.
//!
//! Denial constraints and conjunctive queries share one pattern shape: a
//! fixed list of roles (each bound to a table, with self-joins allowed) plus a
//! conjunction of atomic comparisons between role columns and constants.
//!
//! Patterns exist in two stages. The *spec* stage is pure serde data with
//! string table/column names, loaded from catalogs. [`ConjunctivePattern::resolve`]
//! turns a spec into the executable form (role and column indexes, typed
//! constants) and performs every validation (unknown tables or columns,
//! unbound roles, type-incompatible comparisons) so that evaluation can never
//! fail.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{IcqaError, Result};
use crate::value::{Value, ValueType};

/// Comparison operator of an atomic predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Whether an ordering outcome satisfies this operator.
    pub fn accepts(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        }
    }
}

/// Spec-stage role: a named binding of a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleBinding {
    pub name: String,
    pub table: String,
}

/// Spec-stage operand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperandSpec {
    Column { role: String, column: String },
    Constant { value: Value },
}

/// Spec-stage predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateSpec {
    pub lhs: OperandSpec,
    pub op: CompareOp,
    pub rhs: OperandSpec,
}

/// Spec-stage pattern: roles plus predicates, all by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSpec {
    pub roles: Vec<RoleBinding>,
    #[serde(default)]
    pub predicates: Vec<PredicateSpec>,
}

/// Resolved operand: role/column indexes or a typed constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column { role: usize, column: usize },
    Constant(Value),
}

/// Resolved predicate.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub lhs: Operand,
    pub op: CompareOp,
    pub rhs: Operand,
}

impl Predicate {
    /// Evaluates against one row per role. Rows must match the pattern arity.
    pub fn holds(&self, rows: &[&[Value]]) -> bool {
        let lhs = self.operand_value(&self.lhs, rows);
        let rhs = self.operand_value(&self.rhs, rows);
        match lhs.compare(rhs) {
            Some(ord) => self.op.accepts(ord),
            // Unreachable for validated patterns; incomparable never satisfies.
            None => false,
        }
    }

    fn operand_value<'a>(&'a self, op: &'a Operand, rows: &[&'a [Value]]) -> &'a Value {
        match op {
            Operand::Column { role, column } => &rows[*role][*column],
            Operand::Constant(v) => v,
        }
    }
}

/// Executable conjunctive pattern.
#[derive(Debug, Clone)]
pub struct ConjunctivePattern {
    /// Role names, kept for diagnostics.
    pub role_names: Vec<String>,
    /// Table index (into the database) bound by each role.
    pub role_tables: Vec<usize>,
    pub predicates: Vec<Predicate>,
}

impl ConjunctivePattern {
    /// Resolves a spec against a database schema.
    ///
    /// # Errors
    ///
    /// Returns `IcqaError::Config` for empty or duplicate roles, unknown
    /// tables or columns, predicates referencing no role, and comparisons
    /// between incompatible column types.
    pub fn resolve(spec: &PatternSpec, db: &Database, context: &str) -> Result<Self> {
        if spec.roles.is_empty() {
            return Err(IcqaError::Config(format!(
                "{context}: pattern declares no roles"
            )));
        }

        let mut seen = HashSet::new();
        let mut role_tables = Vec::with_capacity(spec.roles.len());
        let mut role_names = Vec::with_capacity(spec.roles.len());
        for role in &spec.roles {
            if !seen.insert(role.name.as_str()) {
                return Err(IcqaError::Config(format!(
                    "{context}: duplicate role {}",
                    role.name
                )));
            }
            let table = db.table_index(&role.table).ok_or_else(|| {
                IcqaError::Config(format!(
                    "{context}: role {} binds unknown table {}",
                    role.name, role.table
                ))
            })?;
            role_tables.push(table);
            role_names.push(role.name.clone());
        }

        let mut predicates = Vec::with_capacity(spec.predicates.len());
        for (i, pred) in spec.predicates.iter().enumerate() {
            let lhs = Self::resolve_operand(&pred.lhs, &role_names, &role_tables, db, context)?;
            let rhs = Self::resolve_operand(&pred.rhs, &role_names, &role_tables, db, context)?;
            if matches!(lhs, Operand::Constant(_)) && matches!(rhs, Operand::Constant(_)) {
                return Err(IcqaError::Config(format!(
                    "{context}: predicate {i} references no role"
                )));
            }
            let lhs_ty = Self::operand_type(&lhs, &role_tables, db);
            let rhs_ty = Self::operand_type(&rhs, &role_tables, db);
            if !lhs_ty.comparable_with(rhs_ty) {
                return Err(IcqaError::Config(format!(
                    "{context}: predicate {i} compares {lhs_ty:?} with {rhs_ty:?}"
                )));
            }
            predicates.push(Predicate {
                lhs,
                op: pred.op,
                rhs,
            });
        }

        Ok(Self {
            role_names,
            role_tables,
            predicates,
        })
    }

    fn resolve_operand(
        spec: &OperandSpec,
        role_names: &[String],
        role_tables: &[usize],
        db: &Database,
        context: &str,
    ) -> Result<Operand> {
        match spec {
            OperandSpec::Constant { value } => Ok(Operand::Constant(value.clone())),
            OperandSpec::Column { role, column } => {
                let role_idx = role_names
                    .iter()
                    .position(|n| n == role)
                    .ok_or_else(|| {
                        IcqaError::Config(format!("{context}: unbound role {role}"))
                    })?;
                let table = db
                    .table_at(role_tables[role_idx])
                    .ok_or_else(|| IcqaError::InvalidState("table index out of range".into()))?;
                let column_idx = table.schema.column_index(column).ok_or_else(|| {
                    IcqaError::Config(format!(
                        "{context}: role {role} has no column {column}"
                    ))
                })?;
                Ok(Operand::Column {
                    role: role_idx,
                    column: column_idx,
                })
            }
        }
    }

    fn operand_type(op: &Operand, role_tables: &[usize], db: &Database) -> ValueType {
        match op {
            Operand::Constant(v) => v.value_type(),
            Operand::Column { role, column } => {
                db.table_at(role_tables[*role])
                    .map(|t| t.schema.columns[*column].ty)
                    // resolve_operand already validated the indexes
                    .unwrap_or(ValueType::Int)
            }
        }
    }

    /// Number of roles.
    pub fn arity(&self) -> usize {
        self.role_tables.len()
    }

    /// Evaluates the full conjunction against one row per role.
    pub fn holds(&self, rows: &[&[Value]]) -> bool {
        debug_assert_eq!(rows.len(), self.arity());
        self.predicates.iter().all(|p| p.holds(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ColumnDef, Table, TableSchema};

    fn db() -> Database {
        let mut db = Database::new();
        let mut lineitem = Table::new(
            TableSchema::new(
                "lineitem",
                vec![
                    ColumnDef::new("l_orderkey", ValueType::Int),
                    ColumnDef::new("l_shipdate", ValueType::Date),
                    ColumnDef::new("l_receiptdate", ValueType::Date),
                ],
                &["l_orderkey"],
            )
            .unwrap(),
        );
        lineitem
            .push_row(vec![
                Value::Int(1),
                Value::Date(chrono::NaiveDate::from_ymd_opt(1995, 3, 10).unwrap()),
                Value::Date(chrono::NaiveDate::from_ymd_opt(1995, 3, 1).unwrap()),
            ])
            .unwrap();
        db.add_table(lineitem).unwrap();
        db
    }

    fn col(role: &str, column: &str) -> OperandSpec {
        OperandSpec::Column {
            role: role.into(),
            column: column.into(),
        }
    }

    #[test]
    fn resolves_and_evaluates_single_role_pattern() {
        let db = db();
        let spec = PatternSpec {
            roles: vec![RoleBinding {
                name: "l".into(),
                table: "lineitem".into(),
            }],
            predicates: vec![PredicateSpec {
                lhs: col("l", "l_receiptdate"),
                op: CompareOp::Lt,
                rhs: col("l", "l_shipdate"),
            }],
        };
        let pattern = ConjunctivePattern::resolve(&spec, &db, "dc1").unwrap();
        let row = db.table("lineitem").unwrap().row(0).unwrap();
        assert!(pattern.holds(&[row.as_slice()]));
    }

    #[test]
    fn unknown_table_is_rejected_at_load() {
        let db = db();
        let spec = PatternSpec {
            roles: vec![RoleBinding {
                name: "x".into(),
                table: "nope".into(),
            }],
            predicates: vec![],
        };
        let err = ConjunctivePattern::resolve(&spec, &db, "dc").unwrap_err();
        assert!(matches!(err, IcqaError::Config(_)));
    }

    #[test]
    fn unbound_role_is_rejected_at_load() {
        let db = db();
        let spec = PatternSpec {
            roles: vec![RoleBinding {
                name: "l".into(),
                table: "lineitem".into(),
            }],
            predicates: vec![PredicateSpec {
                lhs: col("ghost", "l_shipdate"),
                op: CompareOp::Eq,
                rhs: col("l", "l_shipdate"),
            }],
        };
        assert!(ConjunctivePattern::resolve(&spec, &db, "dc").is_err());
    }

    #[test]
    fn type_incompatible_comparison_is_rejected_at_load() {
        let db = db();
        let spec = PatternSpec {
            roles: vec![RoleBinding {
                name: "l".into(),
                table: "lineitem".into(),
            }],
            predicates: vec![PredicateSpec {
                lhs: col("l", "l_orderkey"),
                op: CompareOp::Lt,
                rhs: col("l", "l_shipdate"),
            }],
        };
        assert!(ConjunctivePattern::resolve(&spec, &db, "dc").is_err());
    }

    #[test]
    fn constant_only_predicate_is_rejected() {
        let db = db();
        let spec = PatternSpec {
            roles: vec![RoleBinding {
                name: "l".into(),
                table: "lineitem".into(),
            }],
            predicates: vec![PredicateSpec {
                lhs: OperandSpec::Constant {
                    value: Value::Int(1),
                },
                op: CompareOp::Eq,
                rhs: OperandSpec::Constant {
                    value: Value::Int(1),
                },
            }],
        };
        assert!(ConjunctivePattern::resolve(&spec, &db, "dc").is_err());
    }
}
