use super::*;
use icqa_core::CompareOp;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        environment_mode = "reproducible"
        random_seed = 42
        worker_thread_count = { count = 4 }
        verify_clean = true
        measures = ["cbm", "cim"]
        strategies = ["prov", "shap"]
        output_dir = "artifacts"

        [shapley]
        exact_player_limit = 12
        sampling_enabled = true
        sample_count = 5000
        weighting = "normalized"
    "#;

    let config = RunConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.worker_thread_count, WorkerThreadCount::Count(4));
    assert!(config.verify_clean);
    assert_eq!(config.measures, vec![MeasureKind::Cbm, MeasureKind::Cim]);
    assert_eq!(config.strategies, vec![Strategy::Prov, Strategy::Shap]);
    assert_eq!(config.shapley.exact_player_limit, 12);
    assert_eq!(config.shapley.sample_count, 5000);
    assert_eq!(config.shapley.weighting, ShapWeighting::Normalized);
    assert_eq!(config.output_dir, PathBuf::from("artifacts"));
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        environment_mode: reproducible
        random_seed: 42
        worker_thread_count: none
        shapley:
          exact_player_limit: 10
          sampling_enabled: false
    "#;

    let config = RunConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.worker_thread_count, WorkerThreadCount::None);
    assert_eq!(config.shapley.exact_player_limit, 10);
    assert!(!config.shapley.sampling_enabled);
    // Unset fields keep their defaults.
    assert_eq!(config.measures, MeasureKind::ALL.to_vec());
    assert_eq!(config.strategies, Strategy::ALL.to_vec());
}

#[test]
fn test_builder() {
    let config = RunConfig::new()
        .with_random_seed(123)
        .with_worker_threads(8)
        .with_verify_clean()
        .with_output_dir("out");

    assert_eq!(config.random_seed, Some(123));
    assert_eq!(config.worker_thread_count, WorkerThreadCount::Count(8));
    assert!(config.verify_clean);
    assert_eq!(config.output_dir, PathBuf::from("out"));
}

#[test]
fn empty_measure_selection_is_invalid() {
    let err = RunConfig::from_toml_str("measures = []").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn oversized_exact_limit_is_invalid() {
    let toml = r#"
        [shapley]
        exact_player_limit = 32
    "#;
    assert!(matches!(
        RunConfig::from_toml_str(toml),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn zero_samples_with_sampling_enabled_is_invalid() {
    let toml = r#"
        [shapley]
        sample_count = 0
    "#;
    assert!(matches!(
        RunConfig::from_toml_str(toml),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn catalog_toml_round_trip() {
    let toml = r#"
        [[dc_sets]]
        id = "orders_checks"

        [[dc_sets.constraints]]
        name = "no_negative_totalprice"

        [[dc_sets.constraints.roles]]
        name = "o"
        table = "orders"

        [[dc_sets.constraints.predicates]]
        lhs = { role = "o", column = "o_totalprice" }
        op = "lt"
        rhs = { value = { float = 0.0 } }

        [[queries]]
        name = "orders_per_customer"
        distinct = false

        [[queries.roles]]
        name = "o"
        table = "orders"

        [[queries.projection]]
        role = "o"
        column = "o_custkey"

        [queries.aggregate]
        function = "count"
    "#;

    let catalog = Catalog::from_toml_str(toml).unwrap();
    assert_eq!(catalog.dc_sets.len(), 1);
    let set = catalog.dc_set("orders_checks").unwrap();
    assert_eq!(set.constraints.len(), 1);
    assert_eq!(set.constraints[0].pattern.roles.len(), 1);
    assert_eq!(set.constraints[0].pattern.predicates[0].op, CompareOp::Lt);
    assert_eq!(catalog.queries.len(), 1);
    assert!(catalog.queries[0].aggregate.is_some());
}

#[test]
fn duplicate_dc_set_ids_are_rejected() {
    let toml = r#"
        [[dc_sets]]
        id = "same"
        [[dc_sets.constraints]]
        name = "a"
        [[dc_sets.constraints.roles]]
        name = "o"
        table = "orders"

        [[dc_sets]]
        id = "same"
        [[dc_sets.constraints]]
        name = "b"
        [[dc_sets.constraints.roles]]
        name = "o"
        table = "orders"
    "#;
    assert!(matches!(
        Catalog::from_toml_str(toml),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn empty_constraint_set_is_rejected() {
    let toml = r#"
        [[dc_sets]]
        id = "empty"
        constraints = []
    "#;
    assert!(matches!(
        Catalog::from_toml_str(toml),
        Err(ConfigError::Invalid(_))
    ));
}
