//! Dispatch of one descriptor in one region

use super::descriptor::ServiceDescriptor;
use super::provider::{CloudProvider, TRANSPORT_METADATA_KEY};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// When transport metadata is removed from a whole-response payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataStripping {
    /// Whenever the whole response is returned
    #[default]
    Always,
    /// Only when the descriptor has neither parameters nor a result key
    Unparameterized,
}

/// Outcome of one dispatch
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Call succeeded with a non-empty payload
    Found(Value),
    /// Call succeeded but the payload is empty (null, false, 0, "", [], {})
    Empty(Value),
    /// Call failed; already logged
    Failed(anyhow::Error),
}

/// Whether a payload counts as "no data"
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(arr) => arr.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Pick the meaningful part of a response
pub fn extract_payload(
    response: Value,
    descriptor: &ServiceDescriptor,
    stripping: MetadataStripping,
) -> Result<Value> {
    if let Some(key) = descriptor.result_key() {
        let Value::Object(mut map) = response else {
            anyhow::bail!("Response is not an object; cannot extract '{}'", key);
        };
        return Ok(map.remove(key).unwrap_or(Value::Null));
    }

    let strip = match stripping {
        MetadataStripping::Always => true,
        MetadataStripping::Unparameterized => descriptor.parameters.is_none(),
    };

    let mut response = response;
    if strip {
        if let Value::Object(ref mut map) = response {
            map.remove(TRANSPORT_METADATA_KEY);
        }
    }

    Ok(response)
}

/// Invoke one descriptor in one region.
///
/// Errors never escape: they are logged with service/region context and
/// reported as [`DispatchOutcome::Failed`].
pub async fn dispatch(
    provider: &dyn CloudProvider,
    region: &str,
    descriptor: &ServiceDescriptor,
    stripping: MetadataStripping,
) -> DispatchOutcome {
    tracing::info!("Started: get service data");
    tracing::info!(
        "Getting data on service {} with function {} in region {}",
        descriptor.service,
        descriptor.function,
        region
    );

    let result = provider
        .invoke(
            region,
            &descriptor.service,
            &descriptor.function,
            descriptor.parameters.as_ref(),
        )
        .await
        .and_then(|response| extract_payload(response, descriptor, stripping));

    let outcome = match result {
        Ok(payload) => {
            tracing::debug!(
                service = %descriptor.service,
                region = %region,
                "Result: {}",
                payload
            );
            if is_empty_value(&payload) {
                DispatchOutcome::Empty(payload)
            } else {
                DispatchOutcome::Found(payload)
            }
        },
        Err(err) => {
            tracing::error!(
                service = %descriptor.service,
                function = %descriptor.function,
                region = %region,
                "Error while processing {}, {}: {:#}",
                descriptor.service,
                region,
                err
            );
            DispatchOutcome::Failed(err)
        },
    };

    tracing::info!("Finished: get service data");
    outcome
}
