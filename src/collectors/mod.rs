//! Metrics Collectors
//!
//! One collector per inventory entity type. Each collector is responsible for
//! retrieving every object of its type and updating the corresponding Prometheus
//! metrics, labelled with the object's ancestry.
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Clear the shared [`AncestryCache`]
//! - Open a session and bulk-retrieve their objects ([`open_and_retrieve`])
//! - Resolve each object's ancestry and update metrics
//! - Close the session and return a [`CollectionResult`]
//!
//! # Error Handling
//!
//! A collector that cannot open its session or retrieve its objects reports
//! `CollectionStatus::Failed` and emits nothing. Ancestry failures only affect the
//! labels of the entity concerned. All enabled collectors of a scrape run
//! concurrently, each bounded by the configured scrape timeout.

use crate::ancestry::AncestryCache;
use crate::config::{CollectorsConfig, MetricsConfig};
use crate::error::ExporterError;
use crate::metrics::MetricsCollector;
use crate::vsphere::{InventoryApi, InventorySession};
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Shared context passed to all collectors
pub struct CollectionContext<'a, A: InventoryApi> {
    /// Inventory API used to open one session per collector
    pub api: &'a A,
    /// Ancestry cache shared by every collector of the process
    pub cache: &'a AncestryCache,
    /// Metrics of the running scrape
    pub metrics: &'a MetricsCollector,
    /// Metrics configuration (collector flags, timeout, annotation labels)
    pub config: &'a MetricsConfig,
}

impl<A: InventoryApi> CollectionContext<'_, A> {
    /// Value of the `vc` label
    pub fn endpoint(&self) -> &str {
        self.api.endpoint()
    }
}

/// Status of a metrics collection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Metrics were successfully collected and updated
    Success,
    /// Collection failed but is non-fatal (already logged as warning)
    Failed,
}

/// Result type for collector functions
///
/// - `Ok(CollectionStatus::Success)` = Collection succeeded
/// - `Ok(CollectionStatus::Failed)` = Collection failed but non-fatal (logged as warning)
/// - `Err(_)` = Unexpected error, treated as a failure of this collector only
pub type CollectionResult = Result<CollectionStatus, anyhow::Error>;

/// Inventory entity types with a collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorKind {
    Esx,
    Vm,
    Datastore,
    ResourcePool,
    StoragePod,
}

impl CollectorKind {
    pub const ALL: [CollectorKind; 5] = [
        CollectorKind::Esx,
        CollectorKind::Vm,
        CollectorKind::Datastore,
        CollectorKind::ResourcePool,
        CollectorKind::StoragePod,
    ];

    /// Collector name, also the metric subsystem
    pub fn name(self) -> &'static str {
        match self {
            CollectorKind::Esx => "esx",
            CollectorKind::Vm => "vm",
            CollectorKind::Datastore => "ds",
            CollectorKind::ResourcePool => "respool",
            CollectorKind::StoragePod => "spod",
        }
    }

    pub fn is_enabled(self, config: &CollectorsConfig) -> bool {
        match self {
            CollectorKind::Esx => config.esx,
            CollectorKind::Vm => config.vm,
            CollectorKind::Datastore => config.datastore,
            CollectorKind::ResourcePool => config.resource_pool,
            CollectorKind::StoragePod => config.storage_pod,
        }
    }

    /// Run this collector once
    pub async fn collect<A: InventoryApi>(self, ctx: &CollectionContext<'_, A>) -> CollectionResult {
        match self {
            CollectorKind::Esx => collect_esx_metrics(ctx).await,
            CollectorKind::Vm => collect_vm_metrics(ctx).await,
            CollectorKind::Datastore => collect_datastore_metrics(ctx).await,
            CollectorKind::ResourcePool => collect_resource_pool_metrics(ctx).await,
            CollectorKind::StoragePod => collect_storage_pod_metrics(ctx).await,
        }
    }

    fn reset_metrics(self, metrics: &MetricsCollector) {
        match self {
            CollectorKind::Esx => metrics.esx.reset(),
            CollectorKind::Vm => metrics.vm.reset(),
            CollectorKind::Datastore => metrics.datastore.reset(),
            CollectorKind::ResourcePool => metrics.resource_pool.reset(),
            CollectorKind::StoragePod => metrics.storage_pod.reset(),
        }
    }
}

/// Start a collector scrape
///
/// Clears the ancestry cache, opens a session and retrieves every object of
/// `object_type` with `properties`. Returns `None` (after logging, and closing the
/// session if it was opened) when either step fails; the caller then reports
/// `CollectionStatus::Failed` without emitting anything.
pub async fn open_and_retrieve<A, T>(
    ctx: &CollectionContext<'_, A>,
    name: &str,
    object_type: &str,
    properties: &[&str],
) -> Option<(A::Session, Vec<T>)>
where
    A: InventoryApi,
    T: DeserializeOwned + Send,
{
    ctx.cache.clear();

    let session = match ctx.api.open_session().await {
        Ok(session) => session,
        Err(e) => {
            warn!("Unable to connect for {} metrics: {}", name, e);
            return None;
        }
    };

    match session.retrieve_all::<T>(object_type, properties).await {
        Ok(items) => {
            debug!("{} {} objects retrieved", items.len(), object_type);
            Some((session, items))
        }
        Err(e) => {
            warn!("Unable to retrieve {} objects: {}", object_type, e);
            session.close().await;
            None
        }
    }
}

/// Run every enabled collector concurrently
///
/// Records `scrape_collector_success` and `scrape_collector_duration_seconds`
/// per collector and returns whether at least one collector succeeded.
pub async fn collect_all<A: InventoryApi>(ctx: &CollectionContext<'_, A>) -> bool {
    let timeout = Duration::from_secs(ctx.config.scrape_timeout_seconds);

    let runs: Vec<_> = CollectorKind::ALL
        .into_iter()
        .filter(|kind| kind.is_enabled(&ctx.config.collectors))
        .map(|kind| run_collector(ctx, kind, timeout))
        .collect();

    join_all(runs)
        .await
        .into_iter()
        .any(|status| status == CollectionStatus::Success)
}

async fn run_collector<A: InventoryApi>(
    ctx: &CollectionContext<'_, A>,
    kind: CollectorKind,
    timeout: Duration,
) -> CollectionStatus {
    let start = Instant::now();

    let status = match tokio::time::timeout(timeout, kind.collect(ctx)).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            warn!("{} collector failed: {}", kind.name(), e);
            CollectionStatus::Failed
        }
        Err(_) => {
            let e = ExporterError::Timeout(timeout.as_secs());
            warn!("{} collector failed: {}", kind.name(), e);
            CollectionStatus::Failed
        }
    };

    // A collector cut short must not leave a partial view of its inventory
    if status == CollectionStatus::Failed {
        kind.reset_metrics(ctx.metrics);
    }

    let success = status == CollectionStatus::Success;
    ctx.metrics
        .set_bool_metric(&ctx.metrics.scrape_collector_success, &[kind.name()], success);
    ctx.metrics.set_gauge(
        &ctx.metrics.scrape_collector_duration_seconds,
        &[kind.name()],
        start.elapsed().as_secs_f64(),
    );

    status
}

// Collector modules
pub mod datastore;
pub mod esx;
pub mod resource_pool;
pub mod storage_pod;
pub mod vm;

// Re-export collector functions for convenient access
pub use datastore::collect_datastore_metrics;
pub use esx::collect_esx_metrics;
pub use resource_pool::collect_resource_pool_metrics;
pub use storage_pod::collect_storage_pod_metrics;
pub use vm::collect_vm_metrics;
