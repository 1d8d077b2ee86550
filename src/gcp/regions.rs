//! GCP Regions
//!
//! Region discovery through the Compute Engine `regions.list` call.

use super::client::GcpClient;
use anyhow::{Context, Result};
use serde_json::Value;

/// Region information
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    pub status: String,
}

impl From<&Value> for Region {
    fn from(value: &Value) -> Self {
        Self {
            name: value
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string(),
            status: value
                .get("status")
                .and_then(|v| v.as_str())
                .unwrap_or("UNKNOWN")
                .to_string(),
        }
    }
}

/// List all regions known to the project, in provider order
pub async fn list_regions(client: &GcpClient) -> Result<Vec<Region>> {
    let url = client.compute_url("regions")?;
    let response = client
        .get(&url)
        .await
        .with_context(|| format!("Failed to list regions for project {}", client.project_id))?;

    let regions: Vec<Region> = response
        .get("items")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .map(Region::from)
                .filter(|r| r.name != "-")
                .collect()
        })
        .unwrap_or_default();

    for region in regions.iter().filter(|r| r.status != "UP") {
        tracing::warn!("Region {} reports status {}", region.name, region.status);
    }

    Ok(regions)
}

/// Get region names as a simple list
pub async fn list_region_names(client: &GcpClient) -> Result<Vec<String>> {
    let regions = list_regions(client).await?;
    Ok(regions.into_iter().map(|r| r.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_region_from_value() {
        let region = Region::from(&json!({"name": "europe-west1", "status": "UP"}));
        assert_eq!(region.name, "europe-west1");
        assert_eq!(region.status, "UP");

        let region = Region::from(&json!({}));
        assert_eq!(region.name, "-");
        assert_eq!(region.status, "UNKNOWN");
    }
}
