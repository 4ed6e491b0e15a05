//! Storage Pod (Datastore Cluster) Metrics Collector
//!
//! # Metrics Produced
//! - `vsphere_spod_capacity_bytes` - Aggregated capacity
//! - `vsphere_spod_free_space_bytes` - Aggregated free space
//!
//! All labelled: vc, dc, cluster, name

use super::{open_and_retrieve, CollectionContext, CollectionResult, CollectionStatus};
use crate::ancestry::{resolve_ancestry, AncestryLabels};
use crate::vsphere::types::StoragePod;
use crate::vsphere::{InventoryApi, InventorySession};
use tracing::{debug, info};

const STORAGE_POD_PROPERTIES: &[&str] = &["name", "parent", "summary"];

pub async fn collect_storage_pod_metrics<A: InventoryApi>(
    ctx: &CollectionContext<'_, A>,
) -> CollectionResult {
    let Some((session, pods)) =
        open_and_retrieve::<A, StoragePod>(ctx, "spod", "StoragePod", STORAGE_POD_PROPERTIES)
            .await
    else {
        return Ok(CollectionStatus::Failed);
    };

    let vc = ctx.endpoint();
    let m = &ctx.metrics.storage_pod;

    for pod in &pods {
        let Some(summary) = &pod.summary else {
            debug!("Storage pod {} has no summary", pod.entity.name);
            continue;
        };
        let ancestry = resolve_ancestry(&session, ctx.cache, &pod.entity).await;
        let ancestry = AncestryLabels::new(&ancestry);

        let labels = [
            vc,
            ancestry.datacenter,
            ancestry.cluster,
            summary.name.as_str(),
        ];

        ctx.metrics
            .set_gauge(&m.capacity_bytes, &labels, summary.capacity as f64);
        ctx.metrics
            .set_gauge(&m.free_space_bytes, &labels, summary.free_space as f64);
    }

    session.close().await;
    info!("Updated spod metrics for {} storage pods", pods.len());
    Ok(CollectionStatus::Success)
}
