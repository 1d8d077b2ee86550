//! Operation Registry - Load operation definitions from JSON
//!
//! This module loads every read-only GCP operation the inventory can invoke
//! from embedded JSON files and provides lookup by `(service, function)`.

use anyhow::Result;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Embedded operation JSON files (compiled into the binary)
const OPERATION_FILES: &[&str] = &[
    include_str!("../operations/compute.json"),
    include_str!("../operations/storage.json"),
    include_str!("../operations/container.json"),
    include_str!("../operations/serverless.json"),
    include_str!("../operations/data.json"),
];

/// How an operation relates to the region it is invoked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Region-independent; every region yields the same listing
    #[default]
    Global,
    /// The path contains `{region}`
    Regional,
    /// Compute aggregated list, narrowed to the zones of the region
    Zonal,
}

/// Operation definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct OperationDef {
    /// Path relative to the service endpoint, with `{placeholders}`
    pub path: String,
    #[serde(default)]
    pub scope: Scope,
    /// Fixed query parameters (values may contain placeholders)
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Service definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDef {
    /// API root, e.g. `https://compute.googleapis.com/compute/v1`
    pub endpoint: String,
    #[serde(default)]
    pub operations: HashMap<String, OperationDef>,
}

/// Root structure of operations/*.json
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OperationCatalog {
    #[serde(default)]
    pub services: HashMap<String, ServiceDef>,
}

impl OperationCatalog {
    /// Merge another catalog file into this one
    fn merge(&mut self, other: OperationCatalog) {
        for (name, service) in other.services {
            match self.services.get_mut(&name) {
                Some(existing) => existing.operations.extend(service.operations),
                None => {
                    self.services.insert(name, service);
                }
            }
        }
    }

    /// Check scope/path consistency of every operation
    fn validate(&self) -> Result<()> {
        for (service_name, service) in &self.services {
            for (function, op) in &service.operations {
                let has_region = op.path.contains("{region}");
                match op.scope {
                    Scope::Regional if !has_region => anyhow::bail!(
                        "{}.{} is regional but its path has no {{region}}",
                        service_name,
                        function
                    ),
                    Scope::Zonal if !op.path.contains("/aggregated/") => anyhow::bail!(
                        "{}.{} is zonal but does not use an aggregated list",
                        service_name,
                        function
                    ),
                    Scope::Global | Scope::Zonal if has_region => anyhow::bail!(
                        "{}.{} uses {{region}} but is not regional",
                        service_name,
                        function
                    ),
                    _ => {},
                }
            }
        }
        Ok(())
    }

    /// Look up an operation by service and function name
    pub fn find(&self, service: &str, function: &str) -> Result<(&ServiceDef, &OperationDef)> {
        let Some(service_def) = self.services.get(service) else {
            anyhow::bail!("Unknown service: {}", service);
        };
        let Some(op) = service_def.operations.get(function) else {
            anyhow::bail!("Unknown operation: {}.{}", service, function);
        };
        Ok((service_def, op))
    }
}

/// Parse and merge catalog sources
pub fn parse_catalog(sources: &[&str]) -> Result<OperationCatalog> {
    let mut catalog = OperationCatalog::default();
    for content in sources {
        let partial: OperationCatalog = serde_json::from_str(content)?;
        catalog.merge(partial);
    }
    catalog.validate()?;
    Ok(catalog)
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<OperationCatalog> = OnceLock::new();

/// Get the operation registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static OperationCatalog {
    REGISTRY.get_or_init(|| {
        parse_catalog(OPERATION_FILES)
            .unwrap_or_else(|e| panic!("Failed to parse embedded operation JSON: {}", e))
    })
}

/// Get an operation definition by service and function name
pub fn get_operation(
    service: &str,
    function: &str,
) -> Result<(&'static ServiceDef, &'static OperationDef)> {
    get_registry().find(service, function)
}

/// All `service.function` keys, sorted
pub fn get_all_operation_keys() -> Vec<String> {
    let mut keys: Vec<String> = get_registry()
        .services
        .iter()
        .flat_map(|(service, def)| {
            def.operations
                .keys()
                .map(move |function| format!("{}.{}", service, function))
        })
        .collect();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(
            !registry.services.is_empty(),
            "Registry should have services"
        );
    }

    #[test]
    fn test_compute_list_instances_is_zonal() {
        let (service, op) = get_operation("compute", "list_instances").unwrap();
        assert_eq!(service.endpoint, "https://compute.googleapis.com/compute/v1");
        assert_eq!(op.scope, Scope::Zonal);
    }

    #[test]
    fn test_same_function_name_in_different_services() {
        let (_, sql) = get_operation("sqladmin", "list_instances").unwrap();
        let (_, redis) = get_operation("redis", "list_instances").unwrap();
        assert_eq!(sql.scope, Scope::Global);
        assert_eq!(redis.scope, Scope::Regional);
    }

    #[test]
    fn test_unknown_lookups_fail() {
        let err = get_operation("compute", "list_widgets").unwrap_err();
        assert_eq!(err.to_string(), "Unknown operation: compute.list_widgets");

        let err = get_operation("s3", "list_buckets").unwrap_err();
        assert_eq!(err.to_string(), "Unknown service: s3");
    }

    #[test]
    fn test_get_all_operation_keys_sorted() {
        let keys = get_all_operation_keys();
        assert!(keys.contains(&"storage.list_buckets".to_string()));
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_files_for_same_service_are_merged() {
        let a = r#"{"services": {"x": {"endpoint": "https://x.googleapis.com/v1",
            "operations": {"list_a": {"path": "a"}}}}}"#;
        let b = r#"{"services": {"x": {"endpoint": "https://x.googleapis.com/v1",
            "operations": {"list_b": {"path": "b"}}}}}"#;
        let catalog = parse_catalog(&[a, b]).unwrap();
        assert!(catalog.find("x", "list_a").is_ok());
        assert!(catalog.find("x", "list_b").is_ok());
    }

    #[test]
    fn test_regional_operation_without_region_is_rejected() {
        let bad = r#"{"services": {"x": {"endpoint": "https://x.googleapis.com/v1",
            "operations": {"list_a": {"path": "projects/{project}/a", "scope": "regional"}}}}}"#;
        assert!(parse_catalog(&[bad]).is_err());
    }
}
