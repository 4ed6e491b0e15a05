//! vSphere API Type Definitions
//!
//! Rust structs for the subset of the vim25 object model read by the exporter.
//! Values arrive as VI/JSON documents: camelCase keys, polymorphic objects tagged
//! with `_typeName`.
//!
//! # Design Notes
//!
//! - **Flattened property sets**: the session layer turns each retrieved object into
//!   a JSON object holding its own reference under `self` and one key per requested
//!   property, so every entity struct deserializes directly from that shape.
//! - **Serde defaults**: the API omits unset properties, so almost every field is
//!   `#[serde(default)]` or `Option<T>`.
//!
//! # Objects Covered
//!
//! - `HostSystem` → [`HostSystem`]
//! - `VirtualMachine` → [`VirtualMachine`]
//! - `Datastore` → [`Datastore`]
//! - `ResourcePool` → [`ResourcePool`]
//! - `StoragePod` → [`StoragePod`]
//! - any entity read by name and parent → [`ManagedEntity`]

#![allow(dead_code)] // Keep complete type definitions for documentation
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Type-tagged identifier of a remote inventory object
///
/// Two references are equal when both the type tag and the opaque id match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ManagedObjectReference {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl ManagedObjectReference {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ManagedObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

// VI/JSON requires the `_typeName` discriminator on every data object it receives.
impl Serialize for ManagedObjectReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ManagedObjectReference", 3)?;
        state.serialize_field("_typeName", "ManagedObjectReference")?;
        state.serialize_field("type", &self.kind)?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}

/// Name and parent of any inventory object
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManagedEntity {
    #[serde(rename = "self", default)]
    pub reference: Option<ManagedObjectReference>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<ManagedObjectReference>,
}

/// Subset of `ServiceInstance.content` needed to drive the property collector
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceContent {
    pub root_folder: ManagedObjectReference,
    pub property_collector: ManagedObjectReference,
    pub view_manager: ManagedObjectReference,
    pub session_manager: ManagedObjectReference,
}

/// `RetrievePropertiesEx` result page
#[derive(Debug, Default, Deserialize)]
pub struct RetrieveResult {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub objects: Vec<ObjectContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub obj: ManagedObjectReference,
    #[serde(default)]
    pub prop_set: Vec<DynamicProperty>,
}

#[derive(Debug, Deserialize)]
pub struct DynamicProperty {
    pub name: String,
    #[serde(default)]
    pub val: serde_json::Value,
}

// ---------------------------------------------------------------------------
// HostSystem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct HostSystem {
    #[serde(flatten)]
    pub entity: ManagedEntity,
    #[serde(default)]
    pub summary: HostListSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostListSummary {
    pub config: HostConfigSummary,
    pub hardware: Option<HostHardwareSummary>,
    pub quick_stats: HostQuickStats,
    pub reboot_required: bool,
    pub overall_status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfigSummary {
    pub name: String,
    pub product: Option<AboutInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AboutInfo {
    pub name: String,
    pub version: String,
    pub build: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostHardwareSummary {
    pub num_cpu_cores: i64,
    pub cpu_mhz: i64,
    pub memory_size: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostQuickStats {
    pub uptime: i64,
    /// MHz
    pub overall_cpu_usage: i64,
    /// MB
    pub overall_memory_usage: i64,
}

// ---------------------------------------------------------------------------
// VirtualMachine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    #[serde(flatten)]
    pub entity: ManagedEntity,
    #[serde(default)]
    pub config: Option<VirtualMachineConfigInfo>,
    #[serde(default)]
    pub guest: Option<GuestInfo>,
    #[serde(default)]
    pub resource_pool: Option<ManagedObjectReference>,
    #[serde(default)]
    pub runtime: VirtualMachineRuntimeInfo,
    #[serde(default)]
    pub snapshot: Option<VirtualMachineSnapshotInfo>,
    #[serde(default)]
    pub summary: VirtualMachineSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineConfigInfo {
    pub name: String,
    pub annotation: Option<String>,
    pub hardware: VirtualHardware,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualHardware {
    #[serde(rename = "numCPU")]
    pub num_cpu: i64,
    pub num_cores_per_socket: i64,
    #[serde(rename = "memoryMB")]
    pub memory_mb: i64,
    pub device: Vec<VirtualDevice>,
}

/// One entry of `config.hardware.device`
///
/// Devices are polymorphic; the concrete class is carried in `_typeName`
/// (`VirtualDisk`, `VirtualVmxnet3`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualDevice {
    #[serde(rename = "_typeName")]
    pub type_name: String,
    pub key: i64,
    pub device_info: Option<Description>,
    pub connectable: Option<VirtualDeviceConnectInfo>,
    pub backing: Option<VirtualDeviceBackingInfo>,
    pub mac_address: Option<String>,
    pub capacity_in_bytes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Description {
    pub label: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualDeviceConnectInfo {
    pub status: String,
    pub connected: bool,
    pub start_connected: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualDeviceBackingInfo {
    #[serde(rename = "_typeName")]
    pub type_name: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuestInfo {
    pub tools_status: Option<String>,
    pub tools_version: Option<String>,
    pub host_name: Option<String>,
    pub guest_full_name: Option<String>,
    pub net: Vec<GuestNicInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuestNicInfo {
    pub network: String,
    pub mac_address: String,
    pub ip_address: Vec<String>,
    pub connected: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineRuntimeInfo {
    pub power_state: String,
    pub host: Option<ManagedObjectReference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineSnapshotInfo {
    pub root_snapshot_list: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineSummary {
    pub config: VirtualMachineConfigSummary,
    pub guest: Option<VirtualMachineGuestSummary>,
    pub runtime: VirtualMachineRuntimeInfo,
    pub quick_stats: VirtualMachineQuickStats,
    pub overall_status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineConfigSummary {
    pub name: String,
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineGuestSummary {
    pub host_name: Option<String>,
    pub guest_full_name: Option<String>,
}

/// Memory figures are MB unless noted otherwise, CPU figures MHz
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualMachineQuickStats {
    pub overall_cpu_usage: i64,
    pub overall_cpu_demand: i64,
    pub guest_memory_usage: i64,
    pub host_memory_usage: i64,
    pub distributed_cpu_entitlement: i64,
    pub distributed_memory_entitlement: i64,
    pub static_cpu_entitlement: i64,
    pub static_memory_entitlement: i64,
    pub private_memory: i64,
    pub shared_memory: i64,
    pub swapped_memory: i64,
    pub ballooned_memory: i64,
    pub consumed_overhead_memory: i64,
    pub ft_log_bandwidth: i64,
    pub ft_secondary_latency: i64,
    /// KB
    pub compressed_memory: i64,
    pub uptime_seconds: i64,
    /// KB
    pub ssd_swapped_memory: i64,
}

// ---------------------------------------------------------------------------
// Datastore / StoragePod / ResourcePool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Datastore {
    #[serde(flatten)]
    pub entity: ManagedEntity,
    #[serde(default)]
    pub summary: DatastoreSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatastoreSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub datastore_type: String,
    pub capacity: i64,
    pub free_space: i64,
    pub accessible: bool,
    pub maintenance_mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoragePod {
    #[serde(flatten)]
    pub entity: ManagedEntity,
    #[serde(default)]
    pub summary: Option<StoragePodSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoragePodSummary {
    pub name: String,
    pub capacity: i64,
    pub free_space: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourcePool {
    #[serde(flatten)]
    pub entity: ManagedEntity,
    #[serde(default)]
    pub summary: Option<ResourcePoolSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourcePoolSummary {
    pub name: String,
    pub quick_stats: Option<ResourcePoolQuickStats>,
}

/// Memory figures are MB unless noted otherwise, CPU figures MHz
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourcePoolQuickStats {
    pub overall_cpu_usage: i64,
    pub overall_cpu_demand: i64,
    pub guest_memory_usage: i64,
    pub host_memory_usage: i64,
    pub distributed_cpu_entitlement: i64,
    pub distributed_memory_entitlement: i64,
    pub static_cpu_entitlement: i64,
    pub private_memory: i64,
    pub shared_memory: i64,
    pub swapped_memory: i64,
    pub ballooned_memory: i64,
    pub overhead_memory: i64,
    pub consumed_overhead_memory: i64,
    /// KB
    pub compressed_memory: i64,
}
