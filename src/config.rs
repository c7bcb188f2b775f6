//! Repository configuration.

use serde::Deserialize;

use crate::csw::RepositoryError;
use crate::registry::service_types::ServiceTypeRegistry;

pub const ENV_SCOPE_FILTER: &str = "REGISTRY_PYCSW_FILTER";
pub const ENV_PAGE_SIZE: &str = "REGISTRY_PYCSW_MAXRECORDS";
pub const ENV_DEFAULT_SRS: &str = "REGISTRY_DEFAULT_SRS";

const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_SRS: &str = "EPSG:4326";

/// Settings for one repository adapter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Predicate restricting every operation to one catalog, ending in that
    /// catalog's id (`catalog_id = 1`).
    pub scope_filter: Option<String>,
    /// Page size when the caller gives no `maxrecords`.
    pub page_size: usize,
    /// Spatial reference system attached to every harvested service.
    pub default_srs: String,
    pub service_types: ServiceTypeRegistry,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            scope_filter: None,
            page_size: DEFAULT_PAGE_SIZE,
            default_srs: DEFAULT_SRS.to_string(),
            service_types: ServiceTypeRegistry::default(),
        }
    }
}

impl RepositoryConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, RepositoryError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load with a custom key lookup.
    pub fn from_env_with<F>(get_env: F) -> Result<Self, RepositoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(filter) = get_env(ENV_SCOPE_FILTER).filter(|f| !f.trim().is_empty()) {
            config.scope_filter = Some(filter);
        }

        if let Some(raw) = get_env(ENV_PAGE_SIZE) {
            let page_size = raw.trim().parse::<usize>().map_err(|_| {
                RepositoryError::Config(format!(
                    "{ENV_PAGE_SIZE} must be a positive integer, got '{raw}'"
                ))
            })?;
            if page_size == 0 {
                return Err(RepositoryError::Config(format!(
                    "{ENV_PAGE_SIZE} must be greater than zero"
                )));
            }
            config.page_size = page_size;
        }

        if let Some(srs) = get_env(ENV_DEFAULT_SRS).filter(|s| !s.trim().is_empty()) {
            config.default_srs = srs.trim().to_string();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = RepositoryConfig::from_env_with(env(&[])).unwrap();
        assert_eq!(config, RepositoryConfig::default());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.default_srs, "EPSG:4326");
        assert!(config.scope_filter.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = RepositoryConfig::from_env_with(env(&[
            (ENV_SCOPE_FILTER, "catalog_id = 2"),
            (ENV_PAGE_SIZE, "25"),
            (ENV_DEFAULT_SRS, "EPSG:3857"),
        ]))
        .unwrap();
        assert_eq!(config.scope_filter.as_deref(), Some("catalog_id = 2"));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.default_srs, "EPSG:3857");
    }

    #[test]
    fn rejects_bad_page_size() {
        assert!(RepositoryConfig::from_env_with(env(&[(ENV_PAGE_SIZE, "ten")])).is_err());
        assert!(RepositoryConfig::from_env_with(env(&[(ENV_PAGE_SIZE, "0")])).is_err());
    }

    #[test]
    fn deserializes_partial_config() {
        let config: RepositoryConfig =
            serde_json::from_str(r#"{"scope_filter": "catalog_id = 4"}"#).unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.scope_filter.as_deref(), Some("catalog_id = 4"));
    }
}
