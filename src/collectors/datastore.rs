//! Datastore Metrics Collector
//!
//! # Metrics Produced
//! - `vsphere_ds_capacity_bytes` - Datastore capacity
//! - `vsphere_ds_free_space_bytes` - Datastore free space
//! - `vsphere_ds_accessible` - Datastore accessible (1=yes, 0=no)
//!
//! All labelled: vc, dc, name, type, cluster, maintenance_mode. The `cluster`
//! label carries the enclosing storage pod, datastores being grouped in
//! datastore clusters rather than compute clusters.

use super::{open_and_retrieve, CollectionContext, CollectionResult, CollectionStatus};
use crate::ancestry::{resolve_ancestry, AncestryLabels};
use crate::vsphere::types::Datastore;
use crate::vsphere::{InventoryApi, InventorySession};
use tracing::info;

const DATASTORE_PROPERTIES: &[&str] = &["name", "parent", "summary"];

pub async fn collect_datastore_metrics<A: InventoryApi>(
    ctx: &CollectionContext<'_, A>,
) -> CollectionResult {
    let Some((session, datastores)) =
        open_and_retrieve::<A, Datastore>(ctx, "ds", "Datastore", DATASTORE_PROPERTIES).await
    else {
        return Ok(CollectionStatus::Failed);
    };

    let vc = ctx.endpoint();
    let m = &ctx.metrics.datastore;

    for datastore in &datastores {
        let summary = &datastore.summary;
        let ancestry = resolve_ancestry(&session, ctx.cache, &datastore.entity).await;
        let ancestry = AncestryLabels::new(&ancestry);

        let labels = [
            vc,
            ancestry.datacenter,
            summary.name.as_str(),
            summary.datastore_type.as_str(),
            ancestry.storage_pod,
            summary.maintenance_mode.as_deref().unwrap_or_default(),
        ];

        ctx.metrics
            .set_gauge(&m.capacity_bytes, &labels, summary.capacity as f64);
        ctx.metrics
            .set_gauge(&m.free_space_bytes, &labels, summary.free_space as f64);
        ctx.metrics
            .set_bool_metric(&m.accessible, &labels, summary.accessible);
    }

    session.close().await;
    info!("Updated ds metrics for {} datastores", datastores.len());
    Ok(CollectionStatus::Success)
}
