//! Resource Pool Metrics Collector
//!
//! Collects the quick stats of every `ResourcePool`. Pools whose summary carries
//! no quick stats are skipped.
//!
//! # Metrics Produced
//! - `vsphere_respool_used_cpu_mhz`, `vsphere_respool_demanded_cpu_mhz`
//! - `vsphere_respool_{guest,host}_used_mem_bytes`
//! - `vsphere_respool_distributed_{cpu_entitlement_mhz,mem_entitlement_bytes}`
//! - `vsphere_respool_static_cpu_entitlement_mhz`
//! - `vsphere_respool_{private,shared,swapped,ballooned,overhead,consumed_overhead,compressed}_mem_bytes`
//!
//! All labelled: vc, dc, cluster, name

use super::{open_and_retrieve, CollectionContext, CollectionResult, CollectionStatus};
use crate::ancestry::{resolve_ancestry, AncestryLabels};
use crate::vsphere::types::ResourcePool;
use crate::vsphere::{InventoryApi, InventorySession};
use tracing::info;

const RESOURCE_POOL_PROPERTIES: &[&str] = &["name", "parent", "summary"];
const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;

pub async fn collect_resource_pool_metrics<A: InventoryApi>(
    ctx: &CollectionContext<'_, A>,
) -> CollectionResult {
    let Some((session, pools)) = open_and_retrieve::<A, ResourcePool>(
        ctx,
        "respool",
        "ResourcePool",
        RESOURCE_POOL_PROPERTIES,
    )
    .await
    else {
        return Ok(CollectionStatus::Failed);
    };

    let vc = ctx.endpoint();
    let m = &ctx.metrics.resource_pool;
    let mut collected = 0usize;

    for pool in &pools {
        let Some(summary) = &pool.summary else {
            continue;
        };
        let Some(stats) = &summary.quick_stats else {
            continue;
        };

        let ancestry = resolve_ancestry(&session, ctx.cache, &pool.entity).await;
        let ancestry = AncestryLabels::new(&ancestry);
        let labels = [
            vc,
            ancestry.datacenter,
            ancestry.cluster,
            summary.name.as_str(),
        ];

        let gauges = [
            (&m.used_cpu_mhz, stats.overall_cpu_usage as f64),
            (&m.demanded_cpu_mhz, stats.overall_cpu_demand as f64),
            (&m.guest_used_mem_bytes, stats.guest_memory_usage as f64 * MB),
            (&m.host_used_mem_bytes, stats.host_memory_usage as f64 * MB),
            (
                &m.distributed_cpu_entitlement_mhz,
                stats.distributed_cpu_entitlement as f64,
            ),
            (
                &m.distributed_mem_entitlement_bytes,
                stats.distributed_memory_entitlement as f64 * MB,
            ),
            (
                &m.static_cpu_entitlement_mhz,
                stats.static_cpu_entitlement as f64,
            ),
            (&m.private_mem_bytes, stats.private_memory as f64 * MB),
            (&m.shared_mem_bytes, stats.shared_memory as f64 * MB),
            (&m.swapped_mem_bytes, stats.swapped_memory as f64 * MB),
            (&m.ballooned_mem_bytes, stats.ballooned_memory as f64 * MB),
            (&m.overhead_mem_bytes, stats.overhead_memory as f64 * MB),
            (
                &m.consumed_overhead_mem_bytes,
                stats.consumed_overhead_memory as f64 * MB,
            ),
            (&m.compressed_mem_bytes, stats.compressed_memory as f64 * KB),
        ];
        for (gauge, value) in gauges {
            ctx.metrics.set_gauge(gauge, &labels, value);
        }
        collected += 1;
    }

    session.close().await;
    info!(
        "Updated respool metrics for {} of {} resource pools",
        collected,
        pools.len()
    );
    Ok(CollectionStatus::Success)
}
