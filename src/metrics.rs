//! Prometheus Metrics Definitions
//!
//! This module defines all Prometheus metrics exposed by the vSphere exporter.
//!
//! # Metric Categories
//!
//! ## Inventory Metrics
//! - `esx` - host uptime, CPU and memory capacity/usage, reboot flag
//! - `vm` - VM sizing, quick stats, snapshots, disks and network adapters
//! - `ds` - datastore capacity, free space, accessibility
//! - `respool` - resource pool quick stats
//! - `spod` - datastore cluster capacity and free space
//!
//! ## Exporter Metrics
//! - `vsphere_up` - at least one collector succeeded
//! - `vsphere_scrape_collector_success` / `vsphere_scrape_collector_duration_seconds`
//!
//! # Lifetime
//!
//! A [`MetricsCollector`] owns its own [`Registry`] and is built fresh for every
//! scrape, so samples never outlive the inventory they were read from.
//!
//! All metrics use the `vsphere_` namespace prefix.

use crate::config::MetricsConfig;
use prometheus::{CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "vsphere";

const ESX_LABELS: &[&str] = &["vc", "dc", "cluster", "name", "version", "status"];
const VM_LABELS: &[&str] = &[
    "vc",
    "dc",
    "cluster",
    "esx",
    "pool",
    "name",
    "hostname",
    "guestfullname",
    "power_state",
    "overall_status",
    "tools_status",
    "tools_version",
];
const VM_ANNOTATION_LABELS: &[&str] = &["crit", "responsable", "service"];
const DATASTORE_LABELS: &[&str] = &["vc", "dc", "name", "type", "cluster", "maintenance_mode"];
const RESOURCE_POOL_LABELS: &[&str] = &["vc", "dc", "cluster", "name"];
const STORAGE_POD_LABELS: &[&str] = &["vc", "dc", "cluster", "name"];

/// Builds and registers metrics of one subsystem
struct Subsystem<'a> {
    registry: &'a Registry,
    name: &'static str,
}

impl Subsystem<'_> {
    fn opts(&self, name: &str, help: &str) -> Opts {
        Opts::new(name, help)
            .namespace(NAMESPACE)
            .subsystem(self.name)
    }

    fn gauge(&self, name: &str, help: &str, labels: &[&str]) -> anyhow::Result<GaugeVec> {
        let gauge = GaugeVec::new(self.opts(name, help), labels)?;
        self.registry.register(Box::new(gauge.clone()))?;
        Ok(gauge)
    }

    fn counter(&self, name: &str, help: &str, labels: &[&str]) -> anyhow::Result<CounterVec> {
        let counter = CounterVec::new(self.opts(name, help), labels)?;
        self.registry.register(Box::new(counter.clone()))?;
        Ok(counter)
    }
}

/// Host metrics, labels: vc, dc, cluster, name, version, status
pub struct EsxMetrics {
    pub uptime_seconds: CounterVec,
    pub reboot_required: CounterVec,
    pub cpu_cores_total: CounterVec,
    pub avail_cpu_mhz: CounterVec,
    pub used_cpu_mhz: GaugeVec,
    pub avail_mem_bytes: GaugeVec,
    pub used_mem_bytes: GaugeVec,
}

impl EsxMetrics {
    fn register(registry: &Registry) -> anyhow::Result<Self> {
        let esx = Subsystem {
            registry,
            name: "esx",
        };
        let l = ESX_LABELS;
        Ok(Self {
            uptime_seconds: esx.counter("uptime_seconds", "esx host uptime", l)?,
            reboot_required: esx.counter("reboot_required", "esx reboot required", l)?,
            cpu_cores_total: esx.counter("cpu_cores_total", "esx number of cores", l)?,
            avail_cpu_mhz: esx.counter("avail_cpu_mhz", "esx total cpu in mhz", l)?,
            used_cpu_mhz: esx.gauge("used_cpu_mhz", "esx cpu usage in mhz", l)?,
            avail_mem_bytes: esx.gauge("avail_mem_bytes", "esx total memory in bytes", l)?,
            used_mem_bytes: esx.gauge("used_mem_bytes", "esx used memory in bytes", l)?,
        })
    }

    pub fn reset(&self) {
        self.uptime_seconds.reset();
        self.reboot_required.reset();
        self.cpu_cores_total.reset();
        self.avail_cpu_mhz.reset();
        self.used_cpu_mhz.reset();
        self.avail_mem_bytes.reset();
        self.used_mem_bytes.reset();
    }
}

/// Virtual machine metrics
///
/// Base labels: vc, dc, cluster, esx, pool, name, hostname, guestfullname,
/// power_state, overall_status, tools_status, tools_version, optionally followed
/// by crit, responsable, service. Device metrics append their own labels.
pub struct VmMetrics {
    pub cpu_number_total: CounterVec,
    pub cores_number_per_socket_total: CounterVec,
    pub memory_bytes: GaugeVec,
    pub overall_cpu_usage_mhz: GaugeVec,
    pub overall_cpu_demand_mhz: GaugeVec,
    pub guest_memory_usage_bytes: GaugeVec,
    pub host_memory_usage_bytes: GaugeVec,
    pub distributed_cpu_entitlement_mhz: GaugeVec,
    pub distributed_memory_entitlement_bytes: GaugeVec,
    pub static_cpu_entitlement_mhz: GaugeVec,
    pub static_memory_entitlement_bytes: GaugeVec,
    pub private_memory_bytes: GaugeVec,
    pub shared_memory_bytes: GaugeVec,
    pub swapped_memory_bytes: GaugeVec,
    pub ballooned_memory_bytes: GaugeVec,
    pub consumed_overhead_memory_bytes: GaugeVec,
    pub ft_log_bandwidth: GaugeVec,
    pub ft_secondary_latency: GaugeVec,
    pub compressed_memory_bytes: GaugeVec,
    pub uptime_seconds: CounterVec,
    pub ssd_swapped_memory_bytes: GaugeVec,
    pub snapshot_number_total: GaugeVec,
    /// Extra label: vmdk
    pub disk_capacity_bytes: GaugeVec,
    /// Extra labels: network, mac, ip
    pub network_connected: GaugeVec,
    /// Extra labels: driver_model, driver_mac, driver_status
    pub ethernet_driver_connected: GaugeVec,
}

impl VmMetrics {
    fn register(registry: &Registry, annotation_labels: bool) -> anyhow::Result<Self> {
        let vm = Subsystem {
            registry,
            name: "vm",
        };

        let mut labels = VM_LABELS.to_vec();
        if annotation_labels {
            labels.extend_from_slice(VM_ANNOTATION_LABELS);
        }
        let with = |extra: &[&'static str]| [labels.as_slice(), extra].concat();
        let disk_labels = with(&["vmdk"]);
        let network_labels = with(&["network", "mac", "ip"]);
        let ethernet_labels = with(&["driver_model", "driver_mac", "driver_status"]);
        let l = labels.as_slice();

        Ok(Self {
            cpu_number_total: vm.counter("cpu_number_total", "vm number of cpu", l)?,
            cores_number_per_socket_total: vm.counter(
                "cores_number_per_socket_total",
                "vm number of cores by socket",
                l,
            )?,
            memory_bytes: vm.gauge("memory_bytes", "vm memory in bytes", l)?,
            overall_cpu_usage_mhz: vm.gauge(
                "overall_cpu_usage_mhz",
                "vm overall CPU usage in MHz",
                l,
            )?,
            overall_cpu_demand_mhz: vm.gauge(
                "overall_cpu_demand_mhz",
                "vm overall CPU demand in MHz",
                l,
            )?,
            guest_memory_usage_bytes: vm.gauge(
                "guest_memory_usage_bytes",
                "vm guest memory usage in bytes",
                l,
            )?,
            host_memory_usage_bytes: vm.gauge(
                "host_memory_usage_bytes",
                "vm host memory usage in bytes",
                l,
            )?,
            distributed_cpu_entitlement_mhz: vm.gauge(
                "distributed_cpu_entitlement_mhz",
                "vm distributed CPU entitlement in MHz",
                l,
            )?,
            distributed_memory_entitlement_bytes: vm.gauge(
                "distributed_memory_entitlement_bytes",
                "vm distributed memory entitlement in bytes",
                l,
            )?,
            static_cpu_entitlement_mhz: vm.gauge(
                "static_cpu_entitlement_mhz",
                "vm static CPU entitlement in MHz",
                l,
            )?,
            static_memory_entitlement_bytes: vm.gauge(
                "static_memory_entitlement_bytes",
                "vm static memory entitlement in bytes",
                l,
            )?,
            private_memory_bytes: vm.gauge("private_memory_bytes", "vm private memory in bytes", l)?,
            shared_memory_bytes: vm.gauge("shared_memory_bytes", "vm shared memory in bytes", l)?,
            swapped_memory_bytes: vm.gauge("swapped_memory_bytes", "vm swapped memory in bytes", l)?,
            ballooned_memory_bytes: vm.gauge(
                "ballooned_memory_bytes",
                "vm ballooned memory in bytes",
                l,
            )?,
            consumed_overhead_memory_bytes: vm.gauge(
                "consumed_overhead_memory_bytes",
                "vm consumed overhead memory bytes",
                l,
            )?,
            ft_log_bandwidth: vm.gauge("ft_log_bandwidth", "vm ft log bandwidth", l)?,
            ft_secondary_latency: vm.gauge("ft_secondary_latency", "vm ft secondary latency", l)?,
            compressed_memory_bytes: vm.gauge(
                "compressed_memory_bytes",
                "vm compressed memory in bytes",
                l,
            )?,
            uptime_seconds: vm.counter("uptime_seconds", "vm uptime in seconds", l)?,
            ssd_swapped_memory_bytes: vm.gauge(
                "ssd_swapped_memory_bytes",
                "vm ssd swapped memory in bytes",
                l,
            )?,
            snapshot_number_total: vm.gauge("snapshot_number_total", "vm number of snapshot", l)?,
            disk_capacity_bytes: vm.gauge(
                "disk_capacity_bytes",
                "vm disk capacity bytes",
                &disk_labels,
            )?,
            network_connected: vm.gauge(
                "network_connected",
                "vm network connected",
                &network_labels,
            )?,
            ethernet_driver_connected: vm.gauge(
                "ethernet_driver_connected",
                "vm ethernet driver connected",
                &ethernet_labels,
            )?,
        })
    }

    pub fn reset(&self) {
        self.cpu_number_total.reset();
        self.cores_number_per_socket_total.reset();
        self.memory_bytes.reset();
        self.overall_cpu_usage_mhz.reset();
        self.overall_cpu_demand_mhz.reset();
        self.guest_memory_usage_bytes.reset();
        self.host_memory_usage_bytes.reset();
        self.distributed_cpu_entitlement_mhz.reset();
        self.distributed_memory_entitlement_bytes.reset();
        self.static_cpu_entitlement_mhz.reset();
        self.static_memory_entitlement_bytes.reset();
        self.private_memory_bytes.reset();
        self.shared_memory_bytes.reset();
        self.swapped_memory_bytes.reset();
        self.ballooned_memory_bytes.reset();
        self.consumed_overhead_memory_bytes.reset();
        self.ft_log_bandwidth.reset();
        self.ft_secondary_latency.reset();
        self.compressed_memory_bytes.reset();
        self.uptime_seconds.reset();
        self.ssd_swapped_memory_bytes.reset();
        self.snapshot_number_total.reset();
        self.disk_capacity_bytes.reset();
        self.network_connected.reset();
        self.ethernet_driver_connected.reset();
    }
}

/// Datastore metrics, labels: vc, dc, name, type, cluster (storage pod), maintenance_mode
pub struct DatastoreMetrics {
    pub capacity_bytes: GaugeVec,
    pub free_space_bytes: GaugeVec,
    pub accessible: GaugeVec,
}

impl DatastoreMetrics {
    fn register(registry: &Registry) -> anyhow::Result<Self> {
        let ds = Subsystem {
            registry,
            name: "ds",
        };
        let l = DATASTORE_LABELS;
        Ok(Self {
            capacity_bytes: ds.gauge("capacity_bytes", "datastore capacity in bytes", l)?,
            free_space_bytes: ds.gauge("free_space_bytes", "datastore freespace in bytes", l)?,
            accessible: ds.gauge("accessible", "datastore is accessible", l)?,
        })
    }

    pub fn reset(&self) {
        self.capacity_bytes.reset();
        self.free_space_bytes.reset();
        self.accessible.reset();
    }
}

/// Resource pool metrics, labels: vc, dc, cluster, name
pub struct ResourcePoolMetrics {
    pub used_cpu_mhz: GaugeVec,
    pub demanded_cpu_mhz: GaugeVec,
    pub guest_used_mem_bytes: GaugeVec,
    pub host_used_mem_bytes: GaugeVec,
    pub distributed_cpu_entitlement_mhz: GaugeVec,
    pub distributed_mem_entitlement_bytes: GaugeVec,
    pub static_cpu_entitlement_mhz: GaugeVec,
    pub private_mem_bytes: GaugeVec,
    pub shared_mem_bytes: GaugeVec,
    pub swapped_mem_bytes: GaugeVec,
    pub ballooned_mem_bytes: GaugeVec,
    pub overhead_mem_bytes: GaugeVec,
    pub consumed_overhead_mem_bytes: GaugeVec,
    pub compressed_mem_bytes: GaugeVec,
}

impl ResourcePoolMetrics {
    fn register(registry: &Registry) -> anyhow::Result<Self> {
        let rp = Subsystem {
            registry,
            name: "respool",
        };
        let l = RESOURCE_POOL_LABELS;
        Ok(Self {
            used_cpu_mhz: rp.gauge("used_cpu_mhz", "resource pool overall CPU usage MHz", l)?,
            demanded_cpu_mhz: rp.gauge(
                "demanded_cpu_mhz",
                "resource pool overall CPU demand MHz",
                l,
            )?,
            guest_used_mem_bytes: rp.gauge(
                "guest_used_mem_bytes",
                "resource pool guest memory usage in bytes",
                l,
            )?,
            host_used_mem_bytes: rp.gauge(
                "host_used_mem_bytes",
                "resource pool host memory usage in bytes",
                l,
            )?,
            distributed_cpu_entitlement_mhz: rp.gauge(
                "distributed_cpu_entitlement_mhz",
                "resource pool distributed CPU entitlement",
                l,
            )?,
            distributed_mem_entitlement_bytes: rp.gauge(
                "distributed_mem_entitlement_bytes",
                "resource pool distributed memory entitlement",
                l,
            )?,
            static_cpu_entitlement_mhz: rp.gauge(
                "static_cpu_entitlement_mhz",
                "resource pool static cpu entitlement",
                l,
            )?,
            private_mem_bytes: rp.gauge(
                "private_mem_bytes",
                "resource pool private memory in bytes",
                l,
            )?,
            shared_mem_bytes: rp.gauge(
                "shared_mem_bytes",
                "resource pool shared memory in bytes",
                l,
            )?,
            swapped_mem_bytes: rp.gauge(
                "swapped_mem_bytes",
                "resource pool swapped memory in bytes",
                l,
            )?,
            ballooned_mem_bytes: rp.gauge(
                "ballooned_mem_bytes",
                "resource pool ballooned memory in bytes",
                l,
            )?,
            overhead_mem_bytes: rp.gauge(
                "overhead_mem_bytes",
                "resource pool overhead memory in bytes",
                l,
            )?,
            consumed_overhead_mem_bytes: rp.gauge(
                "consumed_overhead_mem_bytes",
                "resource pool consumed overhead memory in bytes",
                l,
            )?,
            compressed_mem_bytes: rp.gauge(
                "compressed_mem_bytes",
                "resource pool compressed memory in bytes",
                l,
            )?,
        })
    }

    pub fn reset(&self) {
        self.used_cpu_mhz.reset();
        self.demanded_cpu_mhz.reset();
        self.guest_used_mem_bytes.reset();
        self.host_used_mem_bytes.reset();
        self.distributed_cpu_entitlement_mhz.reset();
        self.distributed_mem_entitlement_bytes.reset();
        self.static_cpu_entitlement_mhz.reset();
        self.private_mem_bytes.reset();
        self.shared_mem_bytes.reset();
        self.swapped_mem_bytes.reset();
        self.ballooned_mem_bytes.reset();
        self.overhead_mem_bytes.reset();
        self.consumed_overhead_mem_bytes.reset();
        self.compressed_mem_bytes.reset();
    }
}

/// Storage pod (datastore cluster) metrics, labels: vc, dc, cluster, name
pub struct StoragePodMetrics {
    pub capacity_bytes: GaugeVec,
    pub free_space_bytes: GaugeVec,
}

impl StoragePodMetrics {
    fn register(registry: &Registry) -> anyhow::Result<Self> {
        let spod = Subsystem {
            registry,
            name: "spod",
        };
        let l = STORAGE_POD_LABELS;
        Ok(Self {
            capacity_bytes: spod.gauge("capacity_bytes", "storagePod capacity in bytes", l)?,
            free_space_bytes: spod.gauge(
                "free_space_bytes",
                "storagePod freespace in bytes",
                l,
            )?,
        })
    }

    pub fn reset(&self) {
        self.capacity_bytes.reset();
        self.free_space_bytes.reset();
    }
}

/// Metrics of one scrape
pub struct MetricsCollector {
    registry: Registry,

    pub esx: EsxMetrics,
    pub vm: VmMetrics,
    pub datastore: DatastoreMetrics,
    pub resource_pool: ResourcePoolMetrics,
    pub storage_pod: StoragePodMetrics,

    // Exporter metrics
    pub up: Gauge,
    pub scrape_collector_success: GaugeVec,
    pub scrape_collector_duration_seconds: GaugeVec,
}

impl MetricsCollector {
    pub fn new(config: &MetricsConfig) -> anyhow::Result<Self> {
        let registry = Registry::new();

        let esx = EsxMetrics::register(&registry)?;
        let vm = VmMetrics::register(&registry, config.annotation_labels)?;
        let datastore = DatastoreMetrics::register(&registry)?;
        let resource_pool = ResourcePoolMetrics::register(&registry)?;
        let storage_pod = StoragePodMetrics::register(&registry)?;

        let up = Gauge::new(
            "vsphere_up",
            "Whether the vSphere API was reachable (1=up, 0=down)",
        )?;

        let scrape = Subsystem {
            registry: &registry,
            name: "scrape",
        };
        let scrape_collector_success = scrape.gauge(
            "collector_success",
            "Whether a collector succeeded (1=success, 0=failure)",
            &["collector"],
        )?;
        let scrape_collector_duration_seconds = scrape.gauge(
            "collector_duration_seconds",
            "Duration of a collector scrape",
            &["collector"],
        )?;

        registry.register(Box::new(up.clone()))?;

        Ok(Self {
            registry,
            esx,
            vm,
            datastore,
            resource_pool,
            storage_pod,
            up,
            scrape_collector_success,
            scrape_collector_duration_seconds,
        })
    }

    /// Set a gauge metric value
    pub fn set_gauge(&self, gauge: &GaugeVec, labels: &[&str], value: f64) {
        gauge.with_label_values(labels).set(value);
    }

    /// Set a boolean metric (1.0 for true, 0.0 for false)
    pub fn set_bool_metric(&self, gauge: &GaugeVec, labels: &[&str], value: bool) {
        gauge
            .with_label_values(labels)
            .set(if value { 1.0 } else { 0.0 });
    }

    /// Record an absolute counter reading
    ///
    /// The child is zeroed first, so the last reading for a label set wins as it
    /// does for gauges. Negative readings are clamped to zero.
    pub fn set_counter(&self, counter: &CounterVec, labels: &[&str], value: f64) {
        let counter = counter.with_label_values(labels);
        counter.reset();
        counter.inc_by(value.max(0.0));
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
