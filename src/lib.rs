//! gcp-inventory
//!
//! Enumerates resources across every region of a GCP project by invoking a
//! configured list of read-only operations per region, and aggregates the
//! results into one JSON document.

pub mod config;
pub mod gcp;
pub mod inventory;
pub mod operation;
