//! vSphere Prometheus Exporter
//!
//! A Prometheus metrics exporter for VMware vCenter 8.0 U1 and newer.
//!
//! # Overview
//!
//! On every scrape the exporter reads ESX hosts, virtual machines, datastores,
//! resource pools and datastore clusters through the vSphere VI/JSON API and
//! labels each metric with the datacenter, cluster and storage pod that enclose
//! the object.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     HTTPS + JSON     ┌───────────────────┐
//! │   vCenter   │ ◄─────────────────►  │     Exporter      │
//! │             │   vim25 VI/JSON      │                   │
//! └─────────────┘                      │  ┌─────────────┐  │      HTTP      ┌────────────┐
//!                                      │  │ Collectors  │  │ ◄────────────► │ Prometheus │
//!                                      │  └─────────────┘  │   /metrics     └────────────┘
//!                                      │  ┌─────────────┐  │
//!                                      │  │  Ancestry   │  │
//!                                      │  │   cache     │  │
//!                                      │  └─────────────┘  │
//!                                      └───────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`vsphere`] - VI/JSON client, session seam and API type definitions
//! - [`ancestry`] - parent-chain resolution and its scrape-scoped cache
//! - [`collectors`] - one collector per entity type
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - HTTP server and scrape orchestration
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use vsphere_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod ancestry;
pub mod collectors;
pub mod config;
pub mod error;
pub mod metrics;
pub mod server;
pub mod vsphere;
