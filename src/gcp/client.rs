//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication,
//! HTTP functionality and endpoint resolution.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Compute Engine API root, used for region discovery
pub const COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com/compute/v1";

/// Default User-Agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("gcp-inventory/", env!("CARGO_PKG_VERSION"));

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub project_id: String,
    /// Replaces the scheme/host/port of every API endpoint (emulators, tests)
    pub endpoint_override: Option<Url>,
}

impl GcpClient {
    /// Create a new GCP client from ambient credentials
    pub async fn new(
        project_id: &str,
        user_agent: &str,
        endpoint_override: Option<&str>,
    ) -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;

        Self::with_credentials(credentials, project_id, user_agent, endpoint_override)
    }

    /// Create a client around explicit credentials
    pub fn with_credentials(
        credentials: GcpCredentials,
        project_id: &str,
        user_agent: &str,
        endpoint_override: Option<&str>,
    ) -> Result<Self> {
        let endpoint_override = endpoint_override
            .map(|raw| {
                Url::parse(raw).with_context(|| format!("Invalid endpoint override: {}", raw))
            })
            .transpose()?;

        let http = GcpHttpClient::new(user_agent)?;

        Ok(Self {
            credentials,
            http,
            project_id: project_id.to_string(),
            endpoint_override,
        })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Join an API endpoint root and a relative path, honoring the override.
    ///
    /// With an override of `http://127.0.0.1:9000`, the service name (first
    /// host label) is kept as the first path segment:
    /// `https://compute.googleapis.com/compute/v1` resolves to
    /// `http://127.0.0.1:9000/compute/compute/v1/<path>` and
    /// `https://run.googleapis.com/v2` to `http://127.0.0.1:9000/run/v2/<path>`.
    pub fn api_url(&self, endpoint: &str, path: &str) -> Result<String> {
        let root = match &self.endpoint_override {
            Some(base) => {
                let endpoint_url = Url::parse(endpoint)
                    .with_context(|| format!("Invalid API endpoint: {}", endpoint))?;
                let service = endpoint_url
                    .host_str()
                    .and_then(|host| host.split('.').next())
                    .filter(|label| !label.is_empty())
                    .with_context(|| format!("API endpoint has no host: {}", endpoint))?;
                format!(
                    "{}/{}{}",
                    base.as_str().trim_end_matches('/'),
                    service,
                    endpoint_url.path().trim_end_matches('/')
                )
            },
            None => endpoint.trim_end_matches('/').to_string(),
        };

        Ok(format!("{}/{}", root, path.trim_start_matches('/')))
    }

    /// Build Compute Engine API URL for a project-relative path
    pub fn compute_url(&self, path: &str) -> Result<String> {
        self.api_url(
            COMPUTE_ENDPOINT,
            &format!("projects/{}/{}", self.project_id, path),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint_override: Option<&str>) -> GcpClient {
        GcpClient::with_credentials(
            GcpCredentials::from_token("token"),
            "inventory-test",
            DEFAULT_USER_AGENT,
            endpoint_override,
        )
        .unwrap()
    }

    #[test]
    fn test_compute_url_uses_public_endpoint() {
        let client = client(None);
        assert_eq!(
            client.compute_url("regions").unwrap(),
            "https://compute.googleapis.com/compute/v1/projects/inventory-test/regions"
        );
    }

    #[test]
    fn test_endpoint_override_keeps_service_and_api_path() {
        let client = client(Some("http://127.0.0.1:9000/"));
        assert_eq!(
            client
                .api_url("https://storage.googleapis.com/storage/v1", "b")
                .unwrap(),
            "http://127.0.0.1:9000/storage/storage/v1/b"
        );
        assert_eq!(
            client.compute_url("regions").unwrap(),
            "http://127.0.0.1:9000/compute/compute/v1/projects/inventory-test/regions"
        );
    }

    #[test]
    fn test_endpoint_override_keeps_services_apart() {
        let client = client(Some("http://127.0.0.1:9000"));
        let path = "projects/p/locations/r/services";

        let run = client.api_url("https://run.googleapis.com/v2", path).unwrap();
        let functions = client
            .api_url("https://cloudfunctions.googleapis.com/v2", path)
            .unwrap();
        assert_eq!(run, "http://127.0.0.1:9000/run/v2/projects/p/locations/r/services");
        assert_ne!(run, functions);

        let redis = client.api_url("https://redis.googleapis.com/v1", "x").unwrap();
        let container = client.api_url("https://container.googleapis.com/v1", "x").unwrap();
        assert_ne!(redis, container);
    }

    #[test]
    fn test_invalid_endpoint_override_is_rejected() {
        let result = GcpClient::with_credentials(
            GcpCredentials::from_token("token"),
            "inventory-test",
            DEFAULT_USER_AGENT,
            Some("not a url"),
        );
        assert!(result.is_err());
    }
}
