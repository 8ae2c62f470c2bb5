//! Conjunctive queries.
//!
//! Positive conjunctive queries over the store: a join pattern, a projection,
//! optional duplicate elimination, and an optional aggregate grouped by the
//! projection. Answers are identified by their projected values (plus the
//! witnessed aggregate value for aggregate queries).

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{IcqaError, Result};
use crate::pattern::{ConjunctivePattern, PatternSpec};
use crate::value::ValueType;

/// Aggregate function over a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
}

/// Spec-stage aggregate: function plus the aggregated column (absent for
/// COUNT).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub function: AggregateFn,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub column: Option<String>,
}

/// Spec-stage projected column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSpec {
    pub role: String,
    pub column: String,
}

/// Declarative form of one query, as loaded from a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySpec {
    pub name: String,
    #[serde(flatten)]
    pub pattern: PatternSpec,
    pub projection: Vec<ProjectionSpec>,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub aggregate: Option<AggregateSpec>,
}

/// Executable conjunctive query.
#[derive(Debug, Clone)]
pub struct ConjunctiveQuery {
    pub name: String,
    pub pattern: ConjunctivePattern,
    /// `(role, column)` pairs projected, in declaration order.
    pub projection: Vec<(usize, usize)>,
    pub distinct: bool,
    pub aggregate: Option<ResolvedAggregate>,
}

/// Resolved aggregate.
#[derive(Debug, Clone)]
pub struct ResolvedAggregate {
    pub function: AggregateFn,
    /// `(role, column)` of the aggregated value; `None` for COUNT.
    pub input: Option<(usize, usize)>,
}

impl ConjunctiveQuery {
    /// Resolves a spec against a database schema; all validation happens here.
    pub fn resolve(spec: &QuerySpec, db: &Database) -> Result<Self> {
        let pattern = ConjunctivePattern::resolve(&spec.pattern, db, &spec.name)?;
        if spec.projection.is_empty() {
            return Err(IcqaError::Config(format!(
                "{}: query projects no columns",
                spec.name
            )));
        }

        let mut projection = Vec::with_capacity(spec.projection.len());
        for p in &spec.projection {
            projection.push(Self::resolve_column(&pattern, db, &spec.name, &p.role, &p.column)?);
        }

        let aggregate = match &spec.aggregate {
            None => None,
            Some(agg) => {
                let input = match agg.function {
                    AggregateFn::Count => {
                        if agg.role.is_some() || agg.column.is_some() {
                            return Err(IcqaError::Config(format!(
                                "{}: count takes no input column",
                                spec.name
                            )));
                        }
                        None
                    }
                    AggregateFn::Sum | AggregateFn::Avg => {
                        let (role, column) = match (&agg.role, &agg.column) {
                            (Some(r), Some(c)) => (r, c),
                            _ => {
                                return Err(IcqaError::Config(format!(
                                    "{}: sum/avg require role and column",
                                    spec.name
                                )))
                            }
                        };
                        let rc = Self::resolve_column(&pattern, db, &spec.name, role, column)?;
                        let ty = db
                            .table_at(pattern.role_tables[rc.0])
                            .map(|t| t.schema.columns[rc.1].ty)
                            .unwrap_or(ValueType::Int);
                        if !matches!(ty, ValueType::Int | ValueType::Float) {
                            return Err(IcqaError::Config(format!(
                                "{}: sum/avg over non-numeric column {column}",
                                spec.name
                            )));
                        }
                        Some(rc)
                    }
                };
                Some(ResolvedAggregate {
                    function: agg.function,
                    input,
                })
            }
        };

        Ok(Self {
            name: spec.name.clone(),
            pattern,
            projection,
            distinct: spec.distinct,
            aggregate,
        })
    }

    fn resolve_column(
        pattern: &ConjunctivePattern,
        db: &Database,
        query: &str,
        role: &str,
        column: &str,
    ) -> Result<(usize, usize)> {
        let role_idx = pattern
            .role_names
            .iter()
            .position(|n| n == role)
            .ok_or_else(|| IcqaError::Config(format!("{query}: unbound role {role}")))?;
        let table = db
            .table_at(pattern.role_tables[role_idx])
            .ok_or_else(|| IcqaError::InvalidState("table index out of range".into()))?;
        let column_idx = table
            .schema
            .column_index(column)
            .ok_or_else(|| {
                IcqaError::Config(format!("{query}: role {role} has no column {column}"))
            })?;
        Ok((role_idx, column_idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ColumnDef, Table, TableSchema};
    use crate::pattern::RoleBinding;
    use crate::value::Value;

    fn db() -> Database {
        let mut db = Database::new();
        let mut orders = Table::new(
            TableSchema::new(
                "orders",
                vec![
                    ColumnDef::new("o_orderkey", ValueType::Int),
                    ColumnDef::new("o_custkey", ValueType::Int),
                    ColumnDef::new("o_priority", ValueType::Text),
                ],
                &["o_orderkey"],
            )
            .unwrap(),
        );
        orders
            .push_row(vec![Value::Int(1), Value::Int(7), Value::Text("HIGH".into())])
            .unwrap();
        db.add_table(orders).unwrap();
        db
    }

    fn base_spec() -> QuerySpec {
        QuerySpec {
            name: "orders_per_customer".into(),
            pattern: PatternSpec {
                roles: vec![RoleBinding {
                    name: "o".into(),
                    table: "orders".into(),
                }],
                predicates: vec![],
            },
            projection: vec![ProjectionSpec {
                role: "o".into(),
                column: "o_custkey".into(),
            }],
            distinct: false,
            aggregate: Some(AggregateSpec {
                function: AggregateFn::Count,
                role: None,
                column: None,
            }),
        }
    }

    #[test]
    fn resolves_count_query() {
        let q = ConjunctiveQuery::resolve(&base_spec(), &db()).unwrap();
        assert_eq!(q.projection, vec![(0, 1)]);
        assert!(q.aggregate.as_ref().unwrap().input.is_none());
    }

    #[test]
    fn count_with_input_column_is_rejected() {
        let mut spec = base_spec();
        spec.aggregate = Some(AggregateSpec {
            function: AggregateFn::Count,
            role: Some("o".into()),
            column: Some("o_custkey".into()),
        });
        assert!(ConjunctiveQuery::resolve(&spec, &db()).is_err());
    }

    #[test]
    fn sum_over_text_is_rejected() {
        let mut spec = base_spec();
        spec.aggregate = Some(AggregateSpec {
            function: AggregateFn::Sum,
            role: Some("o".into()),
            column: Some("o_priority".into()),
        });
        assert!(ConjunctiveQuery::resolve(&spec, &db()).is_err());
    }

    #[test]
    fn empty_projection_is_rejected() {
        let mut spec = base_spec();
        spec.projection.clear();
        assert!(ConjunctiveQuery::resolve(&spec, &db()).is_err());
    }
}
