//! Operation Dispatch
//!
//! Turns a `(service, function, parameters)` triple into a GCP REST call
//! scoped to one region.

use super::registry::{get_operation, OperationDef, Scope};
use crate::gcp::client::GcpClient;
use crate::inventory::TRANSPORT_METADATA_KEY;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Invoke a registered operation for one region
pub async fn invoke_operation(
    client: &GcpClient,
    region: &str,
    service: &str,
    function: &str,
    params: Option<&Map<String, Value>>,
) -> Result<Value> {
    tracing::debug!(
        "invoke_operation: service={}, function={}, region={}",
        service,
        function,
        region
    );

    let (service_def, op) = get_operation(service, function)?;
    let path = build_request_path(op, &client.project_id, region, params)?;
    let url = client.api_url(&service_def.endpoint, &path)?;

    let response = client.get(&url).await?;

    match op.scope {
        Scope::Zonal => Ok(flatten_aggregated_response(response, region)),
        Scope::Global | Scope::Regional => Ok(response),
    }
}

/// Render the path and query string of an operation.
///
/// `{project}` and `{region}` come from the call context; other placeholders
/// are taken from `params`. Parameters not consumed by the path become query
/// parameters.
pub fn build_request_path(
    op: &OperationDef,
    project: &str,
    region: &str,
    params: Option<&Map<String, Value>>,
) -> Result<String> {
    let empty = Map::new();
    let params = params.unwrap_or(&empty);
    let mut consumed = HashSet::new();

    let lookup = |name: &str| -> Option<String> {
        match name {
            "project" => Some(project.to_string()),
            "region" => Some(region.to_string()),
            _ => params.get(name).and_then(scalar_to_string),
        }
    };

    let path = render_template(&op.path, &lookup, &mut consumed, true)?;

    let mut query_parts: Vec<String> = Vec::new();
    for (key, template) in &op.query {
        let value = render_template(template, &lookup, &mut consumed, false)?;
        query_parts.push(format!("{}={}", key, urlencoding::encode(&value)));
    }

    for (key, value) in params {
        if consumed.contains(key.as_str()) {
            continue;
        }
        append_query_param(&mut query_parts, key, value)?;
    }

    if query_parts.is_empty() {
        Ok(path)
    } else {
        Ok(format!("{}?{}", path, query_parts.join("&")))
    }
}

/// Substitute `{name}` placeholders, recording which names were used
fn render_template(
    template: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    consumed: &mut HashSet<String>,
    encode: bool,
) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .with_context(|| format!("Unterminated placeholder in '{}'", template))?;
        let name = &after[..end];
        let value =
            lookup(name).with_context(|| format!("Missing required parameter: {}", name))?;
        if encode {
            rendered.push_str(&urlencoding::encode(&value));
        } else {
            rendered.push_str(&value);
        }
        consumed.insert(name.to_string());
        rest = &after[end + 1..];
    }
    rendered.push_str(rest);

    Ok(rendered)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn append_query_param(query_parts: &mut Vec<String>, key: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => {},
        Value::Array(arr) => {
            for item in arr {
                let Some(s) = scalar_to_string(item) else {
                    anyhow::bail!("Unsupported value in parameter list: {}", key);
                };
                query_parts.push(format!("{}={}", key, urlencoding::encode(&s)));
            }
        },
        Value::Object(_) => anyhow::bail!("Unsupported object value for parameter: {}", key),
        scalar => {
            if let Some(s) = scalar_to_string(scalar) {
                query_parts.push(format!("{}={}", key, urlencoding::encode(&s)));
            }
        },
    }
    Ok(())
}

/// Flatten an aggregated API response into a standard list response,
/// keeping only the scopes that belong to `region`.
///
/// Aggregated responses have format:
/// `{ "items": { "zones/us-central1-a": { "instances": [...] }, "regions/us-central1": {...} } }`
/// and are flattened to `{ "items": [...] }`. Transport metadata is carried over.
pub fn flatten_aggregated_response(response: Value, region: &str) -> Value {
    let zone_prefix = format!("zones/{}-", region);
    let region_key = format!("regions/{}", region);

    let mut all_items: Vec<Value> = Vec::new();

    if let Some(items) = response.get("items").and_then(|v| v.as_object()) {
        for (scope_key, scope_data) in items {
            if !(scope_key.starts_with(&zone_prefix) || *scope_key == region_key) {
                continue;
            }
            let Some(obj) = scope_data.as_object() else {
                continue;
            };
            for (key, value) in obj {
                if key == "warning" {
                    continue;
                }
                if let Some(arr) = value.as_array() {
                    all_items.extend(arr.iter().cloned());
                }
            }
        }
    }

    let mut flattened = Map::new();
    flattened.insert("items".to_string(), Value::Array(all_items));
    if let Some(metadata) = response.get(TRANSPORT_METADATA_KEY) {
        flattened.insert(TRANSPORT_METADATA_KEY.to_string(), metadata.clone());
    }
    Value::Object(flattened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(path: &str) -> OperationDef {
        OperationDef {
            path: path.to_string(),
            scope: Scope::Global,
            query: Default::default(),
            description: None,
        }
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_builtin_placeholders() {
        let path = build_request_path(
            &op("projects/{project}/regions/{region}/subnetworks"),
            "inventory-test",
            "europe-west1",
            None,
        )
        .unwrap();
        assert_eq!(path, "projects/inventory-test/regions/europe-west1/subnetworks");
    }

    #[test]
    fn test_path_parameters_are_not_repeated_in_query() {
        let p = params(json!({"bucket": "logs bucket", "prefix": "2024/", "maxResults": 50}));
        let path = build_request_path(&op("b/{bucket}/o"), "p", "r", Some(&p)).unwrap();
        assert_eq!(path, "b/logs%20bucket/o?maxResults=50&prefix=2024%2F");
    }

    #[test]
    fn test_missing_path_parameter_fails() {
        let err = build_request_path(&op("b/{bucket}/o"), "p", "r", None).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: bucket");
    }

    #[test]
    fn test_fixed_query_and_array_parameters() {
        let mut def = op("b");
        def.query.insert("project".to_string(), "{project}".to_string());
        let p = params(json!({"fields": ["items/name", "items/location"], "skip": null}));
        let path = build_request_path(&def, "inventory-test", "r", Some(&p)).unwrap();
        assert_eq!(
            path,
            "b?project=inventory-test&fields=items%2Fname&fields=items%2Flocation"
        );
    }

    #[test]
    fn test_object_parameter_is_rejected() {
        let p = params(json!({"filter": {"name": "x"}}));
        assert!(build_request_path(&op("b"), "p", "r", Some(&p)).is_err());
    }

    #[test]
    fn test_flatten_keeps_only_region_scopes() {
        let response = json!({
            "items": {
                "zones/us-central1-a": {"instances": [{"name": "a"}]},
                "zones/us-central1-b": {"warning": {"code": "NO_RESULTS_ON_PAGE"}},
                "zones/us-central2-a": {"instances": [{"name": "other"}]},
                "zones/europe-west1-b": {"instances": [{"name": "eu"}]},
                "regions/us-central1": {"disks": [{"name": "regional-disk"}]}
            },
            "responseMetadata": {"httpStatusCode": 200}
        });

        let flattened = flatten_aggregated_response(response, "us-central1");
        let names: Vec<&str> = flattened["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a"));
        assert!(names.contains(&"regional-disk"));
        assert_eq!(flattened["responseMetadata"]["httpStatusCode"], 200);
    }

    #[test]
    fn test_flatten_without_items() {
        let response = json!({"kind": "compute#instanceAggregatedList"});
        let flattened = flatten_aggregated_response(response, "us-east1");
        assert_eq!(flattened, json!({"items": []}));
    }
}
