//! Inventory pipeline
//!
//! Loads the service descriptor sheet, discovers regions, dispatches every
//! descriptor in every region and writes the aggregated records.
//!
//! - [`descriptor`] - Service descriptor sheet loading
//! - [`provider`] - Cloud provider capability and region enumeration
//! - [`invoker`] - One dispatch, with payload extraction and error logging
//! - [`aggregate`] - Region-major loop producing result records
//! - [`output`] - JSON document writer with ISO-8601 timestamps

pub mod aggregate;
pub mod descriptor;
pub mod invoker;
pub mod output;
pub mod provider;

pub use aggregate::{collect, CollectOptions, ResultRecord, RunSummary};
pub use descriptor::{load_descriptors, ServiceDescriptor};
pub use invoker::{dispatch, is_empty_value, DispatchOutcome, MetadataStripping};
pub use output::write_records;
pub use provider::{enumerate_regions, CloudProvider, TRANSPORT_METADATA_KEY};

use anyhow::Result;
use std::path::Path;

/// Settings for one inventory run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub collect: CollectOptions,
    /// Restrict the run to these regions
    pub regions: Option<Vec<String>>,
    pub pretty: bool,
}

/// Run the whole pipeline: sheet → regions → dispatch loop → output file
pub async fn run(
    provider: &dyn CloudProvider,
    services_sheet: &Path,
    output_file: &Path,
    options: &RunOptions,
) -> Result<RunSummary> {
    let descriptors = load_descriptors(services_sheet)?;
    let regions = enumerate_regions(provider, options.regions.as_deref()).await?;

    tracing::info!(
        "Inventorying {} descriptors across {} regions",
        descriptors.len(),
        regions.len()
    );

    let (records, summary) = collect(provider, &regions, &descriptors, options.collect).await;

    write_records(output_file, &records, options.pretty)?;

    tracing::info!(
        pairs = summary.pairs,
        records = summary.records,
        empty = summary.empty,
        failed = summary.failed,
        "Inventory complete"
    );

    Ok(summary)
}
