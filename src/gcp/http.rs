//! HTTP utilities for GCP REST API calls

use crate::inventory::TRANSPORT_METADATA_KEY;
use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::fmt;

/// Header carrying the server-side request id, when the API sends one
const REQUEST_ID_HEADER: &str = "x-goog-request-id";

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Non-success HTTP status returned by a GCP API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API request failed: {}", self.status)
    }
}

impl std::error::Error for ApiError {}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API.
    ///
    /// Object responses carry the transport metadata under
    /// [`TRANSPORT_METADATA_KEY`].
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let metadata = transport_metadata(status, response.headers());
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            tracing::warn!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError { status }.into());
        }

        let mut value = if body.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&body).context("Failed to parse response JSON")?
        };

        if let Value::Object(ref mut map) = value {
            map.insert(TRANSPORT_METADATA_KEY.to_string(), metadata);
        }

        Ok(value)
    }
}

/// Build the transport metadata envelope for a response
fn transport_metadata(status: StatusCode, headers: &HeaderMap) -> Value {
    let mut header_map = Map::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            header_map.insert(name.as_str().to_string(), Value::String(value.to_string()));
        }
    }

    let mut metadata = Map::new();
    metadata.insert(
        "httpStatusCode".to_string(),
        Value::from(status.as_u16()),
    );
    if let Some(request_id) = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
        metadata.insert(
            "requestId".to_string(),
            Value::String(request_id.to_string()),
        );
    }
    metadata.insert("httpHeaders".to_string(), Value::Object(header_map));

    Value::Object(metadata)
}

/// Short reason for an error caused by a non-success API status
pub fn api_error_reason(error: &anyhow::Error) -> Option<&'static str> {
    let api_error = error.chain().find_map(|e| e.downcast_ref::<ApiError>())?;

    let reason = match api_error.status.as_u16() {
        400 => "Invalid request. Check the operation parameters.",
        401 => "Authentication failed. Run 'gcloud auth application-default login'.",
        403 => "Permission denied. Check IAM permissions or whether the API is enabled.",
        404 => "Resource not found. The service may not be available in this region.",
        409 => "Resource conflict.",
        429 => "Rate limit exceeded.",
        500..=599 => "GCP service temporarily unavailable.",
        _ => return None,
    };
    Some(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_transport_metadata_carries_status_and_request_id() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-42"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let metadata = transport_metadata(StatusCode::OK, &headers);
        assert_eq!(metadata["httpStatusCode"], 200);
        assert_eq!(metadata["requestId"], "req-42");
        assert_eq!(metadata["httpHeaders"]["content-type"], "application/json");
    }

    #[test]
    fn test_api_error_reason_classifies_status_codes() {
        let err = anyhow::Error::new(ApiError {
            status: StatusCode::FORBIDDEN,
        });
        assert!(api_error_reason(&err).unwrap().starts_with("Permission denied"));

        let err = anyhow::Error::new(ApiError {
            status: StatusCode::TOO_MANY_REQUESTS,
        })
        .context("GET https://compute.googleapis.com:4030/x");
        assert_eq!(api_error_reason(&err), Some("Rate limit exceeded."));

        let err = anyhow::Error::new(ApiError {
            status: StatusCode::IM_A_TEAPOT,
        });
        assert_eq!(api_error_reason(&err), None);
    }

    #[test]
    fn test_other_errors_have_no_reason() {
        let err = anyhow::anyhow!("API request failed: 403 Forbidden");
        assert_eq!(api_error_reason(&err), None);
    }
}
