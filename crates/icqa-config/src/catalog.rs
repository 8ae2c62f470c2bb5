//! Declarative constraint and query catalogs.
//!
//! A catalog is the run's configuration of *what* to check and ask: named
//! denial-constraint sets and a fixed list of conjunctive queries, loaded
//! once per run. Resolution against a concrete schema happens in `icqa-core`
//! when an instance is processed; this module only parses and sanity-checks
//! the declarative form.

use std::path::Path;

use serde::{Deserialize, Serialize};

use icqa_core::{DcSetSpec, QuerySpec};

use crate::ConfigError;

/// The declarative catalog: constraint sets plus benchmark queries.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Catalog {
    #[serde(default)]
    pub dc_sets: Vec<DcSetSpec>,

    #[serde(default)]
    pub queries: Vec<QuerySpec>,
}

impl Catalog {
    /// Loads a catalog from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses a catalog from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let catalog: Self = toml::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads a catalog from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses a catalog from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let catalog: Self = serde_yaml::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Name-level checks; schema-level validation happens at resolution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut set_ids: Vec<&str> = self.dc_sets.iter().map(|s| s.id.as_str()).collect();
        set_ids.sort_unstable();
        if set_ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(ConfigError::Invalid("duplicate dc_set id".into()));
        }

        let mut query_names: Vec<&str> = self.queries.iter().map(|q| q.name.as_str()).collect();
        query_names.sort_unstable();
        if query_names.windows(2).any(|w| w[0] == w[1]) {
            return Err(ConfigError::Invalid("duplicate query name".into()));
        }

        for set in &self.dc_sets {
            if set.constraints.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "dc_set {} declares no constraints",
                    set.id
                )));
            }
        }
        Ok(())
    }

    /// Looks up one constraint set by id.
    pub fn dc_set(&self, id: &str) -> Option<&DcSetSpec> {
        self.dc_sets.iter().find(|s| s.id == id)
    }
}
