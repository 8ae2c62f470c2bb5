//! End-to-end pipeline tests through the facade crate.

use icqa::prelude::*;
use icqa_test::orders;

fn context(output: &std::path::Path) -> RunContext {
    let config = RunConfig::default()
        .with_random_seed(1)
        .with_output_dir(output);
    let catalog = Catalog {
        dc_sets: vec![orders::dc_set_spec()],
        queries: vec![
            orders::orders_per_customer_spec(),
            orders::active_segments_spec(),
            orders::negative_orders_spec(),
            orders::revenue_per_customer_spec(),
        ],
    };
    RunContext::new(config, catalog).unwrap()
}

#[test]
fn overlap_scenario_end_to_end() {
    let db = orders::violated_database();
    let arena = TupleArena::build(&db);
    let dcs = DcSet::resolve(&orders::dc_set_spec(), &db).unwrap();

    // One overlap pair and one negative-price singleton.
    let mis = extract_mis(&db, &arena, &dcs).unwrap();
    assert_eq!(mis.len(), 2);

    let o7 = orders::order_tuple_id(&db, &arena, 7);
    let o9 = orders::order_tuple_id(&db, &arena, 9);

    let cbm = icqa::measure::score(MeasureKind::Cbm, &mis);
    let cim = icqa::measure::score(MeasureKind::Cim, &mis);
    let pim = icqa::measure::score(MeasureKind::Pim, &mis);
    let rim = icqa::measure::score(MeasureKind::Rim, &mis);
    assert_eq!(cbm.get(o7), 1.0);
    assert_eq!(cbm.get(o9), 1.0);
    assert_eq!(cim.get(o7), 0.5);
    assert_eq!(rim.get(o7), 0.5);
    assert_eq!(pim.get(o7), 0.5);

    // The per-customer count answer combines the pair's CIM into 0.5.
    let query =
        icqa::ConjunctiveQuery::resolve(&orders::orders_per_customer_spec(), &db).unwrap();
    let supports = support_sets(&db, &arena, &query).unwrap();
    let measures = vec![cbm, cim, pim, rim];
    let metrics = score_answers(
        &measures,
        &supports,
        &Strategy::ALL,
        &ShapleyParams::default(),
        ShapWeighting::Sum,
    );

    let customer1 = metrics
        .iter()
        .find(|m| m.key == vec![Value::Int(1)])
        .unwrap();
    assert_eq!(customer1.cells["prov_cim"], Some(0.5));
    assert_eq!(customer1.cells.len(), 12);
}

#[test]
fn batch_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let jobs = || {
        vec![
            InstanceJob {
                instance_id: "sf0/seedA".into(),
                seed: 1,
                database: orders::violated_database(),
            },
            InstanceJob {
                instance_id: "sf0/seedB".into(),
                seed: 2,
                database: orders::subsumed_database(),
            },
        ]
    };

    let first = run_batch(&ctx, jobs()).unwrap();
    assert!(first.is_fully_successful());
    let snapshot = read_tree(dir.path());
    assert!(!snapshot.is_empty());

    let second = run_batch(&ctx, jobs()).unwrap();
    assert!(second.is_fully_successful());
    assert_eq!(snapshot, read_tree(dir.path()));
}

#[test]
fn zero_answer_queries_produce_no_metric_rows() {
    let db = orders::clean_database();
    let arena = TupleArena::build(&db);
    let query = icqa::ConjunctiveQuery::resolve(&orders::negative_orders_spec(), &db).unwrap();
    let supports = support_sets(&db, &arena, &query).unwrap();
    assert!(supports.is_empty());

    let metrics = score_answers(
        &[],
        &supports,
        &Strategy::ALL,
        &ShapleyParams::default(),
        ShapWeighting::Sum,
    );
    assert!(metrics.is_empty());
}

fn read_tree(root: &std::path::Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push((
                    path.strip_prefix(root).unwrap().to_string_lossy().into_owned(),
                    std::fs::read(&path).unwrap(),
                ));
            }
        }
    }
    files.sort();
    files
}
