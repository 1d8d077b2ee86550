//! Cloud provider capability
//!
//! The inventory run only needs two things from a cloud binding: the list of
//! regions, and a way to invoke a named read-only operation in one region.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Key under which a binding attaches transport metadata (status, request id,
/// headers) to object responses
pub const TRANSPORT_METADATA_KEY: &str = "responseMetadata";

/// Capability interface over a cloud SDK binding
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// All region identifiers known to the provider, in provider order
    async fn list_regions(&self) -> Result<Vec<String>>;

    /// Invoke `service.function` scoped to `region`.
    ///
    /// Object responses should carry transport metadata under
    /// [`TRANSPORT_METADATA_KEY`].
    async fn invoke(
        &self,
        region: &str,
        service: &str,
        function: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<Value>;
}

/// Discover the regions to inventory.
///
/// With an allow-list, only listed regions are kept (in provider order).
/// Failing discovery, or ending up with no region at all, is fatal.
pub async fn enumerate_regions(
    provider: &dyn CloudProvider,
    allow_list: Option<&[String]>,
) -> Result<Vec<String>> {
    let regions = provider
        .list_regions()
        .await
        .context("Failed to enumerate regions")?;

    tracing::info!("Provider reports {} regions", regions.len());

    let regions = match allow_list {
        Some(allowed) if !allowed.is_empty() => {
            for name in allowed.iter().filter(|name| !regions.contains(name)) {
                tracing::warn!("Configured region {} is not known to the provider", name);
            }
            regions
                .into_iter()
                .filter(|region| allowed.contains(region))
                .collect()
        },
        _ => regions,
    };

    if regions.is_empty() {
        anyhow::bail!("No regions to inventory");
    }

    Ok(regions)
}
