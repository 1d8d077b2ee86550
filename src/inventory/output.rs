//! Output document serialization
//!
//! Records are written as one JSON array. Values of well-known timestamp
//! fields are rendered as canonical UTC ISO-8601 strings; every other string,
//! including names and labels, is written unchanged.

use super::aggregate::ResultRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Shortest string that can hold a full RFC 3339 timestamp (`2024-01-01T00:00:00Z`)
const MIN_TIMESTAMP_LEN: usize = 20;

/// Fields whose string values are timestamps in GCP resource representations
const TIMESTAMP_FIELDS: &[&str] = &[
    // Compute Engine
    "creationTimestamp",
    "lastAttachTimestamp",
    "lastDetachTimestamp",
    "lastStartTimestamp",
    "lastStopTimestamp",
    "lastSuspendedTimestamp",
    // Cloud Storage
    "timeCreated",
    "updated",
    "timeDeleted",
    "timeStorageClassUpdated",
    "retentionExpirationTime",
    // resource-oriented APIs (Run, Functions, GKE, Redis, Cloud SQL)
    "createTime",
    "updateTime",
    "deleteTime",
    "expireTime",
    "startTime",
    "endTime",
];

/// Canonical ISO-8601 form of `s`, if it is a complete RFC 3339 timestamp
pub fn canonical_timestamp(s: &str) -> Option<String> {
    if s.len() < MIN_TIMESTAMP_LEN || !s.as_bytes()[0].is_ascii_digit() {
        return None;
    }
    let parsed = DateTime::parse_from_rfc3339(s).ok()?;
    Some(
        parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
    )
}

/// Whether values of `field` are rendered as canonical timestamps
pub fn is_timestamp_field(field: &str) -> bool {
    TIMESTAMP_FIELDS.contains(&field)
}

/// Serializes a JSON value, rewriting the values of timestamp fields
struct IsoValue<'a> {
    value: &'a Value,
    /// The value sits directly under a timestamp field
    timestamp: bool,
}

impl<'a> IsoValue<'a> {
    fn new(value: &'a Value) -> Self {
        Self {
            value,
            timestamp: false,
        }
    }
}

impl Serialize for IsoValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::String(s) if self.timestamp => match canonical_timestamp(s) {
                Some(ts) => serializer.serialize_str(&ts),
                None => serializer.serialize_str(s),
            },
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(&IsoValue::new(item))?;
                }
                seq.end()
            },
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    let value = IsoValue {
                        value,
                        timestamp: is_timestamp_field(key),
                    };
                    out.serialize_entry(key, &value)?;
                }
                out.end()
            },
            other => other.serialize(serializer),
        }
    }
}

struct IsoRecord<'a>(&'a ResultRecord);

impl Serialize for IsoRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("ResultRecord", 3)?;
        record.serialize_field("region", &self.0.region)?;
        record.serialize_field("service", &self.0.service)?;
        record.serialize_field("result", &IsoValue::new(&self.0.result))?;
        record.end()
    }
}

/// Serialize records to any writer
pub fn write_records_to<W: Write>(writer: W, records: &[ResultRecord], pretty: bool) -> Result<()> {
    let document: Vec<IsoRecord<'_>> = records.iter().map(IsoRecord).collect();
    if pretty {
        serde_json::to_writer_pretty(writer, &document)?;
    } else {
        serde_json::to_writer(writer, &document)?;
    }
    Ok(())
}

/// Write the output document to `path`
pub fn write_records(path: &Path, records: &[ResultRecord], pretty: bool) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_records_to(&mut writer, records, pretty)
        .with_context(|| format!("Failed to serialize results to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write output file {}", path.display()))?;

    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
