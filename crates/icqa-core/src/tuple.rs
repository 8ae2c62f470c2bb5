//! Interned tuple identities.
//!
//! Every row of every table gets one dense `TupleId`, so witness and support
//! sets are small integer sets with cheap subset and equality checks. The
//! arena also renders stable `relation#pk` labels for persisted artifacts,
//! keyed by declared primary keys rather than physical row positions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::value::Value;

/// Dense identifier for one row of one table within a database instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TupleId(pub u32);

/// Stable, human-readable identity of a tuple: relation plus key values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TupleLabel {
    pub relation: String,
    pub key: Vec<Value>,
}

impl TupleLabel {
    /// Canonical `relation#k1,k2` rendering used in persisted artifacts.
    pub fn render(&self) -> String {
        let key = self
            .key
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}#{}", self.relation, key)
    }
}

/// Arena interning `(table, row)` pairs as dense tuple ids.
///
/// Ids are assigned in table order then row order, so they are stable for a
/// given database instance and the same instance always produces the same
/// arena.
#[derive(Debug, Clone)]
pub struct TupleArena {
    /// id -> (table index, row index)
    locations: Vec<(usize, usize)>,
    /// (table index, row index) -> id
    by_location: HashMap<(usize, usize), TupleId>,
    /// Per-table labels, built eagerly from declared keys.
    labels: Vec<TupleLabel>,
}

impl TupleArena {
    /// Interns every row of the database.
    pub fn build(db: &Database) -> Self {
        let total: usize = db.tables().iter().map(|t| t.len()).sum();
        let mut locations = Vec::with_capacity(total);
        let mut by_location = HashMap::with_capacity(total);
        let mut labels = Vec::with_capacity(total);

        for (table_idx, table) in db.tables().iter().enumerate() {
            for row_idx in 0..table.len() {
                let id = TupleId(locations.len() as u32);
                locations.push((table_idx, row_idx));
                by_location.insert((table_idx, row_idx), id);
                let key = table
                    .key_of(row_idx)
                    .unwrap_or_default();
                labels.push(TupleLabel {
                    relation: table.schema.name.clone(),
                    key,
                });
            }
        }

        Self {
            locations,
            by_location,
            labels,
        }
    }

    /// Number of interned tuples.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Id of a `(table index, row index)` pair.
    pub fn id_of(&self, table: usize, row: usize) -> Option<TupleId> {
        self.by_location.get(&(table, row)).copied()
    }

    /// `(table index, row index)` of an id.
    pub fn location(&self, id: TupleId) -> Option<(usize, usize)> {
        self.locations.get(id.0 as usize).copied()
    }

    /// Stable label of an id.
    pub fn label(&self, id: TupleId) -> Option<&TupleLabel> {
        self.labels.get(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ColumnDef, Table, TableSchema};
    use crate::value::ValueType;

    fn two_table_db() -> Database {
        let mut db = Database::new();
        let mut customer = Table::new(
            TableSchema::new(
                "customer",
                vec![ColumnDef::new("c_custkey", ValueType::Int)],
                &["c_custkey"],
            )
            .unwrap(),
        );
        customer.push_row(vec![Value::Int(10)]).unwrap();
        db.add_table(customer).unwrap();

        let mut orders = Table::new(
            TableSchema::new(
                "orders",
                vec![
                    ColumnDef::new("o_orderkey", ValueType::Int),
                    ColumnDef::new("o_linenumber", ValueType::Int),
                ],
                &["o_orderkey", "o_linenumber"],
            )
            .unwrap(),
        );
        orders.push_row(vec![Value::Int(7), Value::Int(1)]).unwrap();
        orders.push_row(vec![Value::Int(9), Value::Int(2)]).unwrap();
        db.add_table(orders).unwrap();
        db
    }

    #[test]
    fn ids_are_dense_and_stable() {
        let db = two_table_db();
        let arena = TupleArena::build(&db);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.id_of(0, 0), Some(TupleId(0)));
        assert_eq!(arena.id_of(1, 1), Some(TupleId(2)));
        assert_eq!(arena.location(TupleId(2)), Some((1, 1)));
    }

    #[test]
    fn labels_use_declared_keys() {
        let db = two_table_db();
        let arena = TupleArena::build(&db);
        assert_eq!(arena.label(TupleId(0)).unwrap().render(), "customer#10");
        assert_eq!(arena.label(TupleId(2)).unwrap().render(), "orders#9,2");
    }
}
