//! Read-only run context.
//!
//! Configuration and catalogs are loaded once, validated, and then shared
//! immutably by every worker. Nothing here is mutated during parallel
//! execution; schema-dependent resolution happens per instance inside the
//! workers.

use icqa_config::{Catalog, RunConfig};
use icqa_core::{Database, IcqaError, Result};
use icqa_provenance::ShapleyParams;

/// Immutable context shared by all workers of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: RunConfig,
    pub catalog: Catalog,
}

impl RunContext {
    /// Builds a context, revalidating both halves.
    ///
    /// # Errors
    ///
    /// Returns `IcqaError::Config` so that malformed configuration aborts the
    /// run before any instance is touched.
    pub fn new(config: RunConfig, catalog: Catalog) -> Result<Self> {
        config
            .validate()
            .map_err(|e| IcqaError::Config(e.to_string()))?;
        catalog
            .validate()
            .map_err(|e| IcqaError::Config(e.to_string()))?;
        if catalog.dc_sets.is_empty() {
            return Err(IcqaError::Config("catalog declares no dc_sets".into()));
        }
        Ok(Self { config, catalog })
    }

    /// Resolves every catalog entry against one schema, without keeping the
    /// results. Used to fail fast on the first instance's schema before the
    /// batch fans out.
    pub fn check_against(&self, db: &Database) -> Result<()> {
        for set in &self.catalog.dc_sets {
            icqa_core::DcSet::resolve(set, db)?;
        }
        for query in &self.catalog.queries {
            icqa_core::ConjunctiveQuery::resolve(query, db)?;
        }
        Ok(())
    }

    /// Shapley bounds derived from configuration.
    pub fn shapley_params(&self) -> ShapleyParams {
        ShapleyParams {
            exact_player_limit: self.config.shapley.exact_player_limit,
            samples: self
                .config
                .shapley
                .sampling_enabled
                .then_some(self.config.shapley.sample_count),
            seed: self.config.random_seed.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icqa_config::Catalog;
    use icqa_test::orders::{dc_set_spec, orders_per_customer_spec, violated_database};

    fn catalog() -> Catalog {
        Catalog {
            dc_sets: vec![dc_set_spec()],
            queries: vec![orders_per_customer_spec()],
        }
    }

    #[test]
    fn context_validates_catalog_against_schema() {
        let ctx = RunContext::new(RunConfig::default(), catalog()).unwrap();
        ctx.check_against(&violated_database()).unwrap();
    }

    #[test]
    fn empty_catalog_is_a_configuration_error() {
        let err = RunContext::new(RunConfig::default(), Catalog::default()).unwrap_err();
        assert!(matches!(err, IcqaError::Config(_)));
    }

    #[test]
    fn shapley_params_follow_config() {
        let mut config = RunConfig::default().with_random_seed(9);
        config.shapley.sampling_enabled = false;
        let ctx = RunContext::new(config, catalog()).unwrap();
        let params = ctx.shapley_params();
        assert_eq!(params.seed, 9);
        assert!(params.samples.is_none());
    }
}
