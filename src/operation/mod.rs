//! Operation abstraction layer
//!
//! This module provides a data-driven catalog of read-only GCP operations.
//! Operation definitions are loaded from JSON files at compile time, so a new
//! `(service, function)` pair can be inventoried without code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches operation definitions from embedded JSON
//! - [`dispatch`] - Renders request paths and invokes an operation for one region
//!
//! # Operation Definitions
//!
//! Operations are defined in JSON files under `src/operations/`:
//! - `compute.json` - Compute Engine (VMs, disks, networks, load balancing)
//! - `storage.json` - Cloud Storage (buckets, objects)
//! - `container.json` - GKE (clusters, node pools)
//! - `serverless.json` - Cloud Run, Cloud Functions, Pub/Sub
//! - `data.json` - Cloud SQL, Memorystore, BigQuery

pub mod dispatch;
mod registry;

pub use dispatch::invoke_operation;
pub use registry::*;
