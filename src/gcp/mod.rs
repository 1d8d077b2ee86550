//! GCP API interaction module
//!
//! This module provides the core functionality for interacting with Google Cloud Platform
//! APIs: authentication, the HTTP client, region discovery, and the
//! [`CloudProvider`](crate::inventory::CloudProvider) binding used by the inventory run.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials
//! - [`client`] - Main GCP client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`regions`] - Region listing
//! - [`provider`] - `CloudProvider` implementation on top of [`client::GcpClient`]
//!
//! # Example
//!
//! ```ignore
//! use gcp_inventory::gcp::client::{GcpClient, DEFAULT_USER_AGENT};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new("my-project", DEFAULT_USER_AGENT, None).await?;
//!     let regions = gcp_inventory::gcp::regions::list_region_names(&client).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod provider;
pub mod regions;
