//! Customer/orders fixture databases.
//!
//! The violated variant carries exactly two known conflicts: orders 7 and 9
//! of the same customer have overlapping shipping windows, and order 11 has a
//! negative total price. The subsumed variant adds an order that triggers
//! both constraints at once, so a pair witness is strictly subsumed by a
//! singleton witness.

use chrono::NaiveDate;

use icqa_core::{
    AggregateFn, AggregateSpec, ColumnDef, CompareOp, ConstraintSpec, Database, DcSetSpec,
    OperandSpec, PatternSpec, PredicateSpec, ProjectionSpec, QuerySpec, RoleBinding, Table,
    TableSchema, TupleArena, TupleId, Value, ValueType,
};

fn date(y: i32, m: u32, d: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date"))
}

fn customer_table() -> Table {
    let schema = TableSchema::new(
        "customer",
        vec![
            ColumnDef::new("c_custkey", ValueType::Int),
            ColumnDef::new("c_name", ValueType::Text),
            ColumnDef::new("c_mktsegment", ValueType::Text),
        ],
        &["c_custkey"],
    )
    .expect("customer schema");
    let mut table = Table::new(schema);
    for (key, name, segment) in [
        (1, "Alice", "AUTOMOBILE"),
        (2, "Bob", "MACHINERY"),
        (3, "Carol", "AUTOMOBILE"),
    ] {
        table
            .push_row(vec![
                Value::Int(key),
                Value::Text(name.into()),
                Value::Text(segment.into()),
            ])
            .expect("customer row");
    }
    table
}

fn orders_table(rows: &[(i64, i64, &str, Value, Value, f64)]) -> Table {
    let schema = TableSchema::new(
        "orders",
        vec![
            ColumnDef::new("o_orderkey", ValueType::Int),
            ColumnDef::new("o_custkey", ValueType::Int),
            ColumnDef::new("o_status", ValueType::Text),
            ColumnDef::new("o_ship_start", ValueType::Date),
            ColumnDef::new("o_ship_end", ValueType::Date),
            ColumnDef::new("o_totalprice", ValueType::Float),
        ],
        &["o_orderkey"],
    )
    .expect("orders schema");
    let mut table = Table::new(schema);
    for (key, cust, status, start, end, price) in rows {
        table
            .push_row(vec![
                Value::Int(*key),
                Value::Int(*cust),
                Value::Text((*status).into()),
                start.clone(),
                end.clone(),
                Value::Float(*price),
            ])
            .expect("orders row");
    }
    table
}

fn build(rows: &[(i64, i64, &str, Value, Value, f64)]) -> Database {
    let mut db = Database::new();
    db.add_table(customer_table()).expect("customer table");
    db.add_table(orders_table(rows)).expect("orders table");
    db
}

fn clean_rows() -> Vec<(i64, i64, &'static str, Value, Value, f64)> {
    vec![
        (1, 1, "F", date(1995, 1, 1), date(1995, 1, 5), 1000.0),
        (2, 1, "F", date(1995, 2, 1), date(1995, 2, 5), 500.0),
        (3, 2, "O", date(1995, 1, 3), date(1995, 1, 8), 750.0),
    ]
}

/// A database satisfying every fixture constraint.
pub fn clean_database() -> Database {
    build(&clean_rows())
}

/// The clean database plus two injected conflicts: the o7/o9 shipping-window
/// overlap for customer 1 and the negative-price order 11 for customer 2.
pub fn violated_database() -> Database {
    let mut rows = clean_rows();
    rows.push((7, 1, "F", date(1995, 3, 1), date(1995, 3, 10), 800.0));
    rows.push((9, 1, "O", date(1995, 3, 5), date(1995, 3, 15), 900.0));
    rows.push((11, 2, "F", date(1995, 4, 1), date(1995, 4, 3), -50.0));
    build(&rows)
}

/// The violated database plus orders 13 and 14 for customer 3: order 13 has a
/// negative price *and* overlaps order 14, so the {13,14} overlap witness is
/// strictly subsumed by the {13} singleton.
pub fn subsumed_database() -> Database {
    let mut rows = clean_rows();
    rows.push((7, 1, "F", date(1995, 3, 1), date(1995, 3, 10), 800.0));
    rows.push((9, 1, "O", date(1995, 3, 5), date(1995, 3, 15), 900.0));
    rows.push((11, 2, "F", date(1995, 4, 1), date(1995, 4, 3), -50.0));
    rows.push((13, 3, "F", date(1995, 5, 1), date(1995, 5, 10), -20.0));
    rows.push((14, 3, "O", date(1995, 5, 5), date(1995, 5, 12), 100.0));
    build(&rows)
}

/// The violated database with the given order keys removed, for
/// support-removal re-evaluation tests.
pub fn violated_database_without_orders(excluded: &[i64]) -> Database {
    let mut rows = clean_rows();
    rows.push((7, 1, "F", date(1995, 3, 1), date(1995, 3, 10), 800.0));
    rows.push((9, 1, "O", date(1995, 3, 5), date(1995, 3, 15), 900.0));
    rows.push((11, 2, "F", date(1995, 4, 1), date(1995, 4, 3), -50.0));
    rows.retain(|r| !excluded.contains(&r.0));
    build(&rows)
}

fn col(role: &str, column: &str) -> OperandSpec {
    OperandSpec::Column {
        role: role.into(),
        column: column.into(),
    }
}

fn constant(value: Value) -> OperandSpec {
    OperandSpec::Constant { value }
}

fn pred(lhs: OperandSpec, op: CompareOp, rhs: OperandSpec) -> PredicateSpec {
    PredicateSpec { lhs, op, rhs }
}

/// No two distinct orders of one customer may have overlapping shipping
/// windows.
pub fn overlap_constraint_spec() -> ConstraintSpec {
    ConstraintSpec {
        name: "no_overlapping_shipments".into(),
        pattern: PatternSpec {
            roles: vec![
                RoleBinding {
                    name: "o1".into(),
                    table: "orders".into(),
                },
                RoleBinding {
                    name: "o2".into(),
                    table: "orders".into(),
                },
            ],
            predicates: vec![
                pred(
                    col("o1", "o_custkey"),
                    CompareOp::Eq,
                    col("o2", "o_custkey"),
                ),
                pred(
                    col("o1", "o_orderkey"),
                    CompareOp::Ne,
                    col("o2", "o_orderkey"),
                ),
                pred(
                    col("o1", "o_ship_start"),
                    CompareOp::Le,
                    col("o2", "o_ship_end"),
                ),
                pred(
                    col("o2", "o_ship_start"),
                    CompareOp::Le,
                    col("o1", "o_ship_end"),
                ),
            ],
        },
    }
}

/// No order may have a negative total price.
pub fn negative_price_constraint_spec() -> ConstraintSpec {
    ConstraintSpec {
        name: "no_negative_totalprice".into(),
        pattern: PatternSpec {
            roles: vec![RoleBinding {
                name: "o".into(),
                table: "orders".into(),
            }],
            predicates: vec![pred(
                col("o", "o_totalprice"),
                CompareOp::Lt,
                constant(Value::Float(0.0)),
            )],
        },
    }
}

/// The fixture constraint set: overlap pair first, price check second.
pub fn dc_set_spec() -> DcSetSpec {
    DcSetSpec {
        id: "orders_checks".into(),
        constraints: vec![overlap_constraint_spec(), negative_price_constraint_spec()],
    }
}

/// COUNT of orders per customer.
pub fn orders_per_customer_spec() -> QuerySpec {
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

/// DISTINCT market segments having at least one order.
pub fn active_segments_spec() -> QuerySpec {
    QuerySpec {
        name: "active_segments".into(),
        pattern: PatternSpec {
            roles: vec![
                RoleBinding {
                    name: "c".into(),
                    table: "customer".into(),
                },
                RoleBinding {
                    name: "o".into(),
                    table: "orders".into(),
                },
            ],
            predicates: vec![pred(
                col("c", "c_custkey"),
                CompareOp::Eq,
                col("o", "o_custkey"),
            )],
        },
        projection: vec![ProjectionSpec {
            role: "c".into(),
            column: "c_mktsegment".into(),
        }],
        distinct: true,
        aggregate: None,
    }
}

/// Order keys with a negative total price; each answer has one single-tuple
/// support.
pub fn negative_orders_spec() -> QuerySpec {
    QuerySpec {
        name: "negative_orders".into(),
        pattern: PatternSpec {
            roles: vec![RoleBinding {
                name: "o".into(),
                table: "orders".into(),
            }],
            predicates: vec![pred(
                col("o", "o_totalprice"),
                CompareOp::Lt,
                constant(Value::Float(0.0)),
            )],
        },
        projection: vec![ProjectionSpec {
            role: "o".into(),
            column: "o_orderkey".into(),
        }],
        distinct: false,
        aggregate: None,
    }
}

/// Total order value per customer.
pub fn revenue_per_customer_spec() -> QuerySpec {
    QuerySpec {
        name: "revenue_per_customer".into(),
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
            function: AggregateFn::Sum,
            role: Some("o".into()),
            column: Some("o_totalprice".into()),
        }),
    }
}

/// Tuple id of the order row with the given key.
pub fn order_tuple_id(db: &Database, arena: &TupleArena, orderkey: i64) -> TupleId {
    let table_idx = db.table_index("orders").expect("orders table");
    let table = db.table_at(table_idx).expect("orders table");
    let row = table
        .rows()
        .iter()
        .position(|r| r[0] == Value::Int(orderkey))
        .expect("order row present");
    arena.id_of(table_idx, row).expect("interned order row")
}

/// Tuple id of the customer row with the given key.
pub fn customer_tuple_id(db: &Database, arena: &TupleArena, custkey: i64) -> TupleId {
    let table_idx = db.table_index("customer").expect("customer table");
    let table = db.table_at(table_idx).expect("customer table");
    let row = table
        .rows()
        .iter()
        .position(|r| r[0] == Value::Int(custkey))
        .expect("customer row present");
    arena.id_of(table_idx, row).expect("interned customer row")
}
