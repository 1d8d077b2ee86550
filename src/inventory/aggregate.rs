//! Aggregation of dispatch outcomes into result records

use super::descriptor::ServiceDescriptor;
use super::invoker::{dispatch, DispatchOutcome, MetadataStripping};
use super::provider::CloudProvider;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One successful (region, descriptor) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub region: String,
    pub service: String,
    pub result: Value,
}

/// Counters for one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub pairs: usize,
    pub records: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Options controlling what gets recorded
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    pub metadata_stripping: MetadataStripping,
    /// Record successful calls whose payload is empty
    pub keep_empty: bool,
}

/// Dispatch every descriptor in every region, region-major.
///
/// Records are appended in dispatch order; failures never stop the loop.
pub async fn collect(
    provider: &dyn CloudProvider,
    regions: &[String],
    descriptors: &[ServiceDescriptor],
    options: CollectOptions,
) -> (Vec<ResultRecord>, RunSummary) {
    let mut records = Vec::new();
    let mut summary = RunSummary::default();

    for region in regions {
        for descriptor in descriptors {
            summary.pairs += 1;

            let outcome = dispatch(provider, region, descriptor, options.metadata_stripping).await;
            let payload = match outcome {
                DispatchOutcome::Found(payload) => payload,
                DispatchOutcome::Empty(payload) => {
                    summary.empty += 1;
                    if !options.keep_empty {
                        continue;
                    }
                    payload
                },
                DispatchOutcome::Failed(_) => {
                    summary.failed += 1;
                    continue;
                },
            };

            records.push(ResultRecord {
                region: region.clone(),
                service: descriptor.service.clone(),
                result: payload,
            });
            summary.records += 1;
        }
    }

    (records, summary)
}
