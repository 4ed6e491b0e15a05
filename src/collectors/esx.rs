//! ESX Host Metrics Collector
//!
//! Collects uptime, CPU and memory capacity/usage for every `HostSystem`.
//!
//! # Metrics Produced
//! - `vsphere_esx_uptime_seconds` - Host uptime
//! - `vsphere_esx_reboot_required` - Host reboot pending (1=yes, 0=no)
//! - `vsphere_esx_cpu_cores_total` - Physical CPU cores
//! - `vsphere_esx_avail_cpu_mhz` - Cores × core frequency
//! - `vsphere_esx_used_cpu_mhz` - Current CPU usage
//! - `vsphere_esx_avail_mem_bytes` - Physical memory
//! - `vsphere_esx_used_mem_bytes` - Current memory usage
//!
//! All labelled: vc, dc, cluster, name, version, status

use super::{open_and_retrieve, CollectionContext, CollectionResult, CollectionStatus};
use crate::ancestry::{resolve_ancestry, AncestryLabels};
use crate::vsphere::types::HostSystem;
use crate::vsphere::{InventoryApi, InventorySession};
use tracing::info;

const HOST_PROPERTIES: &[&str] = &["name", "parent", "summary"];
const MB: f64 = 1024.0 * 1024.0;

/// Collects ESX host metrics from vCenter
///
/// # Returns
///
/// * `Ok(CollectionStatus::Success)` - Successfully collected host metrics
/// * `Ok(CollectionStatus::Failed)` - Session or retrieval failed (logged as warning)
pub async fn collect_esx_metrics<A: InventoryApi>(
    ctx: &CollectionContext<'_, A>,
) -> CollectionResult {
    let Some((session, hosts)) =
        open_and_retrieve::<A, HostSystem>(ctx, "esx", "HostSystem", HOST_PROPERTIES).await
    else {
        return Ok(CollectionStatus::Failed);
    };

    let vc = ctx.endpoint();
    let m = &ctx.metrics.esx;

    for host in &hosts {
        let summary = &host.summary;
        let ancestry = resolve_ancestry(&session, ctx.cache, &host.entity).await;
        let ancestry = AncestryLabels::new(&ancestry);

        let version = summary
            .config
            .product
            .as_ref()
            .map_or("", |product| product.version.as_str());
        let labels = [
            vc,
            ancestry.datacenter,
            ancestry.cluster,
            summary.config.name.as_str(),
            version,
            summary.overall_status.as_str(),
        ];

        let hardware = summary.hardware.clone().unwrap_or_default();
        let stats = &summary.quick_stats;

        ctx.metrics
            .set_counter(&m.uptime_seconds, &labels, stats.uptime as f64);
        ctx.metrics.set_counter(
            &m.reboot_required,
            &labels,
            if summary.reboot_required { 1.0 } else { 0.0 },
        );
        ctx.metrics
            .set_counter(&m.cpu_cores_total, &labels, hardware.num_cpu_cores as f64);
        ctx.metrics.set_counter(
            &m.avail_cpu_mhz,
            &labels,
            hardware.num_cpu_cores as f64 * hardware.cpu_mhz as f64,
        );
        ctx.metrics
            .set_gauge(&m.used_cpu_mhz, &labels, stats.overall_cpu_usage as f64);
        ctx.metrics
            .set_gauge(&m.avail_mem_bytes, &labels, hardware.memory_size as f64);
        ctx.metrics.set_gauge(
            &m.used_mem_bytes,
            &labels,
            stats.overall_memory_usage as f64 * MB,
        );
    }

    session.close().await;
    info!("Updated esx metrics for {} hosts", hosts.len());
    Ok(CollectionStatus::Success)
}
