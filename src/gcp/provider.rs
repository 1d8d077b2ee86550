//! `CloudProvider` binding for GCP

use super::client::GcpClient;
use super::http::api_error_reason;
use super::regions::list_region_names;
use crate::inventory::CloudProvider;
use crate::operation::invoke_operation;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
impl CloudProvider for GcpClient {
    async fn list_regions(&self) -> Result<Vec<String>> {
        list_region_names(self).await
    }

    async fn invoke(
        &self,
        region: &str,
        service: &str,
        function: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<Value> {
        invoke_operation(self, region, service, function, params)
            .await
            .map_err(|err| match api_error_reason(&err) {
                Some(reason) => err.context(reason),
                None => err,
            })
    }
}
