//! Virtual Machine Metrics Collector
//!
//! Collects sizing, quick stats, snapshot count, disks and network adapters of
//! every `VirtualMachine`.
//!
//! # Labels
//!
//! vc, dc, cluster, esx, pool, name, hostname, guestfullname, power_state,
//! overall_status, tools_status, tools_version; plus crit, responsable, service
//! when annotation labels are enabled.
//!
//! Ancestry is resolved from the VM's resource pool when that pool resolves,
//! otherwise from the VM itself (whose parent is a VM folder, so no cluster).
//! An unresolved pool or host is labelled `NONE`.
//!
//! # Metrics Produced
//! - `vsphere_vm_cpu_number_total`, `vsphere_vm_cores_number_per_socket_total`
//! - `vsphere_vm_memory_bytes` and the quick-stats family
//! - `vsphere_vm_snapshot_number_total` - Root snapshots
//! - `vsphere_vm_disk_capacity_bytes` - Per virtual disk (extra label: vmdk)
//! - `vsphere_vm_network_connected` - Per guest NIC and IP (extra labels: network, mac, ip)
//! - `vsphere_vm_ethernet_driver_connected` - Per virtual ethernet card
//!   (extra labels: driver_model, driver_mac, driver_status)

use super::{open_and_retrieve, CollectionContext, CollectionResult, CollectionStatus};
use crate::ancestry::{resolve_ancestry, resolve_host, resolve_pool, AncestryLabels, NONE_LABEL};
use crate::vsphere::types::{VirtualDevice, VirtualMachine};
use crate::vsphere::{InventoryApi, InventorySession};
use serde::Deserialize;
use tracing::info;

const VM_PROPERTIES: &[&str] = &[
    "name",
    "parent",
    "config",
    "guest",
    "resourcePool",
    "runtime",
    "snapshot",
    "summary",
];
const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;

/// Device classes deriving from `VirtualEthernetCard`
const ETHERNET_CARD_TYPES: &[&str] = &[
    "VirtualE1000",
    "VirtualE1000e",
    "VirtualPCNet32",
    "VirtualSriovEthernetCard",
    "VirtualVmxnet",
    "VirtualVmxnet2",
    "VirtualVmxnet3",
    "VirtualVmxnet3Vrdma",
];

const NOT_DEFINED: &str = "not defined";

/// Ownership metadata stored as JSON in the VM annotation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VmAnnotation {
    #[serde(rename = "crit", default = "not_defined")]
    pub criticality: String,
    #[serde(rename = "resp", default = "not_defined")]
    pub responsable: String,
    #[serde(rename = "svc", default = "not_defined")]
    pub service: String,
}

fn not_defined() -> String {
    NOT_DEFINED.to_string()
}

impl Default for VmAnnotation {
    fn default() -> Self {
        Self {
            criticality: not_defined(),
            responsable: not_defined(),
            service: not_defined(),
        }
    }
}

impl VmAnnotation {
    /// Parse an annotation; anything that is not the expected JSON object
    /// yields "not defined" everywhere
    pub fn parse(annotation: &str) -> Self {
        serde_json::from_str(annotation).unwrap_or_default()
    }
}

/// A virtual ethernet card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetDevice {
    pub name: String,
    /// Device class without its `Virtual` prefix, e.g. `Vmxnet3`
    pub type_name: String,
    pub mac: String,
    pub status: String,
    pub connected: bool,
}

/// A virtual disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disk {
    pub vmdk: String,
    pub capacity: i64,
}

/// Ethernet cards among the VM's virtual devices
pub fn ethernet_devices(vm: &VirtualMachine) -> Vec<EthernetDevice> {
    devices(vm)
        .iter()
        .filter(|device| ETHERNET_CARD_TYPES.contains(&device.type_name.as_str()))
        .map(|device| {
            let (status, connected) = device
                .connectable
                .as_ref()
                .map_or(("unknown".to_string(), false), |c| {
                    (c.status.clone(), c.connected)
                });
            EthernetDevice {
                name: device
                    .device_info
                    .as_ref()
                    .map(|info| info.label.clone())
                    .unwrap_or_default(),
                type_name: device
                    .type_name
                    .strip_prefix("Virtual")
                    .unwrap_or(&device.type_name)
                    .to_string(),
                mac: device.mac_address.clone().unwrap_or_default(),
                status,
                connected,
            }
        })
        .collect()
}

/// Virtual disks with their backing file
pub fn disks(vm: &VirtualMachine) -> Vec<Disk> {
    devices(vm)
        .iter()
        .filter(|device| device.type_name == "VirtualDisk")
        .map(|device| Disk {
            vmdk: device
                .backing
                .as_ref()
                .and_then(|backing| backing.file_name.clone())
                .unwrap_or_default(),
            capacity: device.capacity_in_bytes.unwrap_or_default(),
        })
        .collect()
}

fn devices(vm: &VirtualMachine) -> &[VirtualDevice] {
    vm.config
        .as_ref()
        .map_or(&[], |config| config.hardware.device.as_slice())
}

fn annotation(vm: &VirtualMachine) -> &str {
    vm.config
        .as_ref()
        .and_then(|config| config.annotation.as_deref())
        .or(vm.summary.config.annotation.as_deref())
        .unwrap_or_default()
}

pub async fn collect_vm_metrics<A: InventoryApi>(
    ctx: &CollectionContext<'_, A>,
) -> CollectionResult {
    let Some((session, vms)) =
        open_and_retrieve::<A, VirtualMachine>(ctx, "vm", "VirtualMachine", VM_PROPERTIES).await
    else {
        return Ok(CollectionStatus::Failed);
    };

    let vc = ctx.endpoint();
    let m = &ctx.metrics.vm;

    for vm in &vms {
        let pool = resolve_pool(&session, vm).await;
        let ancestry = match &pool {
            Some(pool) => resolve_ancestry(&session, ctx.cache, pool).await,
            None => resolve_ancestry(&session, ctx.cache, &vm.entity).await,
        };
        let ancestry = AncestryLabels::new(&ancestry);
        let host = resolve_host(&session, vm).await;

        let guest = vm.guest.clone().unwrap_or_default();
        let guest_summary = vm.summary.guest.clone().unwrap_or_default();
        let annotation = ctx
            .config
            .annotation_labels
            .then(|| VmAnnotation::parse(annotation(vm)));

        let mut labels: Vec<&str> = vec![
            vc,
            ancestry.datacenter,
            ancestry.cluster,
            host.as_ref().map_or(NONE_LABEL, |host| host.name.as_str()),
            pool.as_ref().map_or(NONE_LABEL, |pool| pool.name.as_str()),
            vm.summary.config.name.as_str(),
            guest_summary.host_name.as_deref().unwrap_or_default(),
            guest_summary.guest_full_name.as_deref().unwrap_or_default(),
            vm.runtime.power_state.as_str(),
            vm.summary.overall_status.as_str(),
            guest.tools_status.as_deref().unwrap_or_default(),
            guest.tools_version.as_deref().unwrap_or_default(),
        ];
        if let Some(annotation) = &annotation {
            labels.extend([
                annotation.criticality.as_str(),
                annotation.responsable.as_str(),
                annotation.service.as_str(),
            ]);
        }

        let hardware = vm
            .config
            .as_ref()
            .map(|config| &config.hardware)
            .cloned()
            .unwrap_or_default();
        let stats = &vm.summary.quick_stats;

        ctx.metrics
            .set_counter(&m.cpu_number_total, &labels, hardware.num_cpu as f64);
        ctx.metrics.set_counter(
            &m.cores_number_per_socket_total,
            &labels,
            hardware.num_cores_per_socket as f64,
        );
        ctx.metrics
            .set_counter(&m.uptime_seconds, &labels, stats.uptime_seconds as f64);

        let gauges = [
            (&m.memory_bytes, hardware.memory_mb as f64 * MB),
            (&m.overall_cpu_usage_mhz, stats.overall_cpu_usage as f64),
            (&m.overall_cpu_demand_mhz, stats.overall_cpu_demand as f64),
            (
                &m.guest_memory_usage_bytes,
                stats.guest_memory_usage as f64 * MB,
            ),
            (
                &m.host_memory_usage_bytes,
                stats.host_memory_usage as f64 * MB,
            ),
            (
                &m.distributed_cpu_entitlement_mhz,
                stats.distributed_cpu_entitlement as f64,
            ),
            (
                &m.distributed_memory_entitlement_bytes,
                stats.distributed_memory_entitlement as f64 * MB,
            ),
            (
                &m.static_cpu_entitlement_mhz,
                stats.static_cpu_entitlement as f64,
            ),
            (
                &m.static_memory_entitlement_bytes,
                stats.static_memory_entitlement as f64 * MB,
            ),
            (&m.private_memory_bytes, stats.private_memory as f64 * MB),
            (&m.shared_memory_bytes, stats.shared_memory as f64 * MB),
            (&m.swapped_memory_bytes, stats.swapped_memory as f64 * MB),
            (&m.ballooned_memory_bytes, stats.ballooned_memory as f64 * MB),
            (
                &m.consumed_overhead_memory_bytes,
                stats.consumed_overhead_memory as f64 * MB,
            ),
            (&m.ft_log_bandwidth, stats.ft_log_bandwidth as f64),
            (&m.ft_secondary_latency, stats.ft_secondary_latency as f64),
            (&m.compressed_memory_bytes, stats.compressed_memory as f64 * KB),
            (
                &m.ssd_swapped_memory_bytes,
                stats.ssd_swapped_memory as f64 * KB,
            ),
            (
                &m.snapshot_number_total,
                vm.snapshot
                    .as_ref()
                    .map_or(0, |snapshot| snapshot.root_snapshot_list.len()) as f64,
            ),
        ];
        for (gauge, value) in gauges {
            ctx.metrics.set_gauge(gauge, &labels, value);
        }

        for device in ethernet_devices(vm) {
            let mut device_labels = labels.clone();
            device_labels.extend([
                device.type_name.as_str(),
                device.mac.as_str(),
                device.status.as_str(),
            ]);
            ctx.metrics.set_bool_metric(
                &m.ethernet_driver_connected,
                &device_labels,
                device.connected,
            );
        }

        for nic in &guest.net {
            for ip in &nic.ip_address {
                let mut nic_labels = labels.clone();
                nic_labels.extend([nic.network.as_str(), nic.mac_address.as_str(), ip.as_str()]);
                ctx.metrics
                    .set_bool_metric(&m.network_connected, &nic_labels, nic.connected);
            }
        }

        for disk in disks(vm) {
            let mut disk_labels = labels.clone();
            disk_labels.push(disk.vmdk.as_str());
            ctx.metrics
                .set_gauge(&m.disk_capacity_bytes, &disk_labels, disk.capacity as f64);
        }
    }

    session.close().await;
    info!("Updated vm metrics for {} virtual machines", vms.len());
    Ok(CollectionStatus::Success)
}
