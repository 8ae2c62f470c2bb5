//! Immutable in-memory relational store.
//!
//! The store is the queryable surface the engine runs against: named tables
//! with typed columns and declared primary keys. It is populated once by an
//! external loader and never mutated by any pipeline component.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{IcqaError, Result};
use crate::value::{Value, ValueType};

/// One row of column values.
pub type Row = Vec<Value>;

/// A column declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ValueType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Schema of one table: named, typed columns and primary-key column indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Indexes into `columns` forming the primary key, in key order.
    pub key: Vec<usize>,
}

impl TableSchema {
    /// Creates a schema; key columns are named, not positional.
    ///
    /// # Errors
    ///
    /// Returns `IcqaError::Config` if a key column is not declared.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnDef>,
        key_columns: &[&str],
    ) -> Result<Self> {
        let name = name.into();
        let mut key = Vec::with_capacity(key_columns.len());
        for kc in key_columns {
            let idx = columns
                .iter()
                .position(|c| c.name == *kc)
                .ok_or_else(|| {
                    IcqaError::Config(format!("table {name}: key column {kc} is not declared"))
                })?;
            key.push(idx);
        }
        if key.is_empty() {
            return Err(IcqaError::Config(format!(
                "table {name}: primary key must name at least one column"
            )));
        }
        Ok(Self { name, columns, key })
    }

    /// Index of a column by name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == column)
    }
}

/// A table: schema plus rows, type-checked at insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub schema: TableSchema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Appends a row after checking arity and column types.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.schema.columns.len() {
            return Err(IcqaError::Config(format!(
                "table {}: row has {} values, schema declares {} columns",
                self.schema.name,
                row.len(),
                self.schema.columns.len()
            )));
        }
        for (value, col) in row.iter().zip(&self.schema.columns) {
            if value.value_type() != col.ty {
                return Err(IcqaError::Config(format!(
                    "table {}: column {} expects {:?}, got {:?}",
                    self.schema.name,
                    col.name,
                    col.ty,
                    value.value_type()
                )));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Primary-key values of one row, in key-column order.
    pub fn key_of(&self, index: usize) -> Option<Vec<Value>> {
        let row = self.rows.get(index)?;
        Some(self.schema.key.iter().map(|&k| row[k].clone()).collect())
    }
}

/// The whole database instance: tables addressable by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    tables: Vec<Table>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table. Table names must be unique.
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        let name = table.schema.name.clone();
        if self.by_name.contains_key(&name) {
            return Err(IcqaError::Config(format!("duplicate table {name}")));
        }
        self.by_name.insert(name, self.tables.len());
        self.tables.push(table);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.by_name.get(name).map(|&i| &self.tables[i])
    }

    pub fn table_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn table_at(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Rebuilds the name index after deserialization.
    pub fn reindex(&mut self) {
        self.by_name = self
            .tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.schema.name.clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_schema() -> TableSchema {
        TableSchema::new(
            "orders",
            vec![
                ColumnDef::new("o_orderkey", ValueType::Int),
                ColumnDef::new("o_custkey", ValueType::Int),
                ColumnDef::new("o_totalprice", ValueType::Float),
            ],
            &["o_orderkey"],
        )
        .unwrap()
    }

    #[test]
    fn push_row_type_checks() {
        let mut table = Table::new(orders_schema());
        table
            .push_row(vec![Value::Int(1), Value::Int(7), Value::Float(100.0)])
            .unwrap();
        let err = table
            .push_row(vec![Value::Int(2), Value::Text("x".into()), Value::Float(1.0)])
            .unwrap_err();
        assert!(matches!(err, IcqaError::Config(_)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn key_of_extracts_declared_key() {
        let mut table = Table::new(orders_schema());
        table
            .push_row(vec![Value::Int(9), Value::Int(7), Value::Float(1.0)])
            .unwrap();
        assert_eq!(table.key_of(0), Some(vec![Value::Int(9)]));
    }

    #[test]
    fn unknown_key_column_is_rejected() {
        let err = TableSchema::new(
            "t",
            vec![ColumnDef::new("a", ValueType::Int)],
            &["missing"],
        )
        .unwrap_err();
        assert!(matches!(err, IcqaError::Config(_)));
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let mut db = Database::new();
        db.add_table(Table::new(orders_schema())).unwrap();
        assert!(db.add_table(Table::new(orders_schema())).is_err());
        assert!(db.table("orders").is_some());
    }
}
