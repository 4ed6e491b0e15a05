//! In-memory inventory shared by the integration tests
//!
//! [`Inventory`] holds a tree of named nodes plus the objects returned by bulk
//! retrieval, and counts every remote call so tests can assert on round trips.

#![allow(dead_code)]

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vsphere_exporter::error::{ExporterError, Result};
use vsphere_exporter::vsphere::types::ManagedObjectReference;
use vsphere_exporter::vsphere::{InventoryApi, InventorySession};

pub const ENDPOINT: &str = "https://vcenter.test";

pub fn moref(kind: &str, value: &str) -> ManagedObjectReference {
    ManagedObjectReference::new(kind, value)
}

/// Inventory content and call counters
#[derive(Default)]
pub struct Inventory {
    nodes: HashMap<ManagedObjectReference, Value>,
    objects: HashMap<String, Vec<Value>>,
    failing: HashSet<ManagedObjectReference>,
    failing_types: HashSet<String>,
    slow_types: HashMap<String, Duration>,
    slow_nodes: HashMap<ManagedObjectReference, Duration>,
    fail_open: bool,

    retrieve_one_calls: AtomicUsize,
    retrieve_all_calls: AtomicUsize,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node readable through `retrieve_one`
    pub fn node(
        &mut self,
        kind: &str,
        value: &str,
        name: &str,
        parent: Option<&ManagedObjectReference>,
    ) -> ManagedObjectReference {
        let reference = moref(kind, value);
        let mut properties = json!({ "name": name });
        if let Some(parent) = parent {
            properties["parent"] = json!({ "type": parent.kind, "value": parent.value });
        }
        self.nodes.insert(reference.clone(), properties);
        reference
    }

    /// Add an object returned by `retrieve_all` for its type
    ///
    /// `properties` is merged with `self`; `name` and `parent` are copied from
    /// the matching node when present.
    pub fn object(&mut self, reference: &ManagedObjectReference, properties: Value) {
        let mut object = self
            .nodes
            .get(reference)
            .cloned()
            .unwrap_or_else(|| json!({}));
        object["self"] = json!({ "type": reference.kind, "value": reference.value });
        if let Value::Object(extra) = properties {
            for (key, value) in extra {
                object[key.as_str()] = value;
            }
        }
        self.objects
            .entry(reference.kind.clone())
            .or_default()
            .push(object);
    }

    /// Make every `retrieve_one` of `reference` fail
    pub fn fail(&mut self, reference: &ManagedObjectReference) {
        self.failing.insert(reference.clone());
    }

    /// Make `retrieve_all` of `object_type` fail
    pub fn fail_type(&mut self, object_type: &str) {
        self.failing_types.insert(object_type.to_string());
    }

    /// Delay `retrieve_all` of `object_type`
    pub fn slow_type(&mut self, object_type: &str, delay: Duration) {
        self.slow_types.insert(object_type.to_string(), delay);
    }

    /// Delay every `retrieve_one` of `reference`
    pub fn slow(&mut self, reference: &ManagedObjectReference, delay: Duration) {
        self.slow_nodes.insert(reference.clone(), delay);
    }

    pub fn fail_open(&mut self) {
        self.fail_open = true;
    }

    pub fn retrieve_one_calls(&self) -> usize {
        self.retrieve_one_calls.load(Ordering::SeqCst)
    }

    pub fn retrieve_all_calls(&self) -> usize {
        self.retrieve_all_calls.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }
}

/// [`InventoryApi`] over a shared [`Inventory`]
#[derive(Clone)]
pub struct FakeApi {
    pub inventory: Arc<Inventory>,
}

impl FakeApi {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory: Arc::new(inventory),
        }
    }
}

pub struct FakeSession {
    inventory: Arc<Inventory>,
}

impl InventoryApi for FakeApi {
    type Session = FakeSession;

    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    async fn open_session(&self) -> Result<FakeSession> {
        if self.inventory.fail_open {
            return Err(ExporterError::Auth("fake login rejected".to_string()));
        }
        self.inventory.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSession {
            inventory: Arc::clone(&self.inventory),
        })
    }
}

impl InventorySession for FakeSession {
    async fn retrieve_all<T>(&self, object_type: &str, _properties: &[&str]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.inventory
            .retrieve_all_calls
            .fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.inventory.slow_types.get(object_type) {
            tokio::time::sleep(*delay).await;
        }
        if self.inventory.failing_types.contains(object_type) {
            return Err(ExporterError::VsphereApi(format!(
                "500: cannot list {}",
                object_type
            )));
        }

        self.inventory
            .objects
            .get(object_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|object| serde_json::from_value(object.clone()).map_err(Into::into))
            .collect()
    }

    async fn retrieve_one<T>(
        &self,
        reference: &ManagedObjectReference,
        _properties: &[&str],
    ) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        self.inventory
            .retrieve_one_calls
            .fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.inventory.slow_nodes.get(reference) {
            tokio::time::sleep(*delay).await;
        }
        if self.inventory.failing.contains(reference) {
            return Err(ExporterError::VsphereApi(format!(
                "500: fault reading {}",
                reference
            )));
        }

        let mut node = self
            .inventory
            .nodes
            .get(reference)
            .cloned()
            .ok_or_else(|| ExporterError::VsphereApi(format!("Object {} not found", reference)))?;
        node["self"] = json!({ "type": reference.kind, "value": reference.value });
        Ok(serde_json::from_value(node)?)
    }

    async fn close(self) {
        self.inventory.sessions_closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// References of [`standard_inventory`]
pub struct Refs {
    pub datacenter: ManagedObjectReference,
    pub cluster: ManagedObjectReference,
    pub host: ManagedObjectReference,
    pub standalone_host: ManagedObjectReference,
    pub root_pool: ManagedObjectReference,
    pub prod_pool: ManagedObjectReference,
    pub vm_folder: ManagedObjectReference,
    pub vm: ManagedObjectReference,
    pub storage_pod: ManagedObjectReference,
    pub pooled_datastore: ManagedObjectReference,
    pub lone_datastore: ManagedObjectReference,
}

/// A small but complete inventory
///
/// ```text
/// Datacenters (Folder)
/// └── DC1 (Datacenter)
///     ├── host (Folder)
///     │   ├── Cluster1 (ClusterComputeResource)
///     │   │   ├── esx1.local (HostSystem)
///     │   │   └── Resources (ResourcePool)
///     │   │       └── Prod (ResourcePool)
///     │   └── esx2.local (ComputeResource)
///     │       └── esx2.local (HostSystem)
///     ├── vm (Folder)
///     │   └── web-01 (VirtualMachine, pool Prod, host esx1.local)
///     └── datastore (Folder)
///         ├── Pod1 (StoragePod)
///         │   └── ds-pooled (Datastore)
///         └── ds-lone (Datastore)
/// ```
pub fn standard_inventory() -> (Inventory, Refs) {
    let mut inv = Inventory::new();

    let root = inv.node("Folder", "group-d1", "Datacenters", None);
    let datacenter = inv.node("Datacenter", "datacenter-1", "DC1", Some(&root));
    let host_folder = inv.node("Folder", "group-h1", "host", Some(&datacenter));
    let cluster = inv.node("ClusterComputeResource", "domain-c1", "Cluster1", Some(&host_folder));
    let host = inv.node("HostSystem", "host-1", "esx1.local", Some(&cluster));
    let compute = inv.node("ComputeResource", "domain-s1", "esx2.local", Some(&host_folder));
    let standalone_host = inv.node("HostSystem", "host-2", "esx2.local", Some(&compute));
    let root_pool = inv.node("ResourcePool", "resgroup-1", "Resources", Some(&cluster));
    let prod_pool = inv.node("ResourcePool", "resgroup-2", "Prod", Some(&root_pool));
    let vm_folder = inv.node("Folder", "group-v1", "vm", Some(&datacenter));
    let vm = inv.node("VirtualMachine", "vm-1", "web-01", Some(&vm_folder));
    let ds_folder = inv.node("Folder", "group-s1", "datastore", Some(&datacenter));
    let storage_pod = inv.node("StoragePod", "group-p1", "Pod1", Some(&ds_folder));
    let pooled_datastore = inv.node("Datastore", "datastore-1", "ds-pooled", Some(&storage_pod));
    let lone_datastore = inv.node("Datastore", "datastore-2", "ds-lone", Some(&ds_folder));

    for (reference, name) in [(&host, "esx1.local"), (&standalone_host, "esx2.local")] {
        inv.object(
            reference,
            json!({
                "summary": {
                    "config": { "name": name, "product": { "version": "8.0.2" } },
                    "hardware": { "numCpuCores": 16, "cpuMhz": 2500, "memorySize": 137438953472i64 },
                    "quickStats": { "uptime": 86400, "overallCpuUsage": 4000, "overallMemoryUsage": 65536 },
                    "rebootRequired": false,
                    "overallStatus": "green"
                }
            }),
        );
    }

    inv.object(
        &vm,
        json!({
            "config": {
                "name": "web-01",
                "annotation": "{\"crit\":\"high\",\"resp\":\"team-web\"}",
                "hardware": {
                    "numCPU": 4,
                    "numCoresPerSocket": 2,
                    "memoryMB": 8192,
                    "device": [
                        {
                            "_typeName": "VirtualDisk",
                            "key": 2000,
                            "backing": {
                                "_typeName": "VirtualDiskFlatVer2BackingInfo",
                                "fileName": "[ds-pooled] web-01/web-01.vmdk"
                            },
                            "capacityInBytes": 42949672960i64
                        },
                        {
                            "_typeName": "VirtualVmxnet3",
                            "key": 4000,
                            "deviceInfo": { "label": "Network adapter 1", "summary": "VM Network" },
                            "connectable": { "status": "ok", "connected": true, "startConnected": true },
                            "macAddress": "00:50:56:aa:bb:cc"
                        }
                    ]
                }
            },
            "guest": {
                "toolsStatus": "toolsOk",
                "toolsVersion": "12352",
                "net": [{
                    "network": "VM Network",
                    "macAddress": "00:50:56:aa:bb:cc",
                    "ipAddress": ["10.0.0.10", "fe80::1"],
                    "connected": true
                }]
            },
            "resourcePool": { "type": "ResourcePool", "value": "resgroup-2" },
            "runtime": {
                "powerState": "poweredOn",
                "host": { "type": "HostSystem", "value": "host-1" }
            },
            "snapshot": { "rootSnapshotList": [{ "name": "before-upgrade" }] },
            "summary": {
                "config": { "name": "web-01" },
                "guest": { "hostName": "web-01.example.com", "guestFullName": "Ubuntu Linux (64-bit)" },
                "runtime": {
                    "powerState": "poweredOn",
                    "host": { "type": "HostSystem", "value": "host-1" }
                },
                "quickStats": {
                    "overallCpuUsage": 1200,
                    "guestMemoryUsage": 2048,
                    "compressedMemory": 512,
                    "uptimeSeconds": 3600
                },
                "overallStatus": "green"
            }
        }),
    );

    inv.object(
        &pooled_datastore,
        json!({
            "summary": {
                "name": "ds-pooled",
                "type": "VMFS",
                "capacity": 1099511627776i64,
                "freeSpace": 549755813888i64,
                "accessible": true,
                "maintenanceMode": "normal"
            }
        }),
    );
    inv.object(
        &lone_datastore,
        json!({
            "summary": {
                "name": "ds-lone",
                "type": "NFS",
                "capacity": 2000,
                "freeSpace": 1000,
                "accessible": false
            }
        }),
    );

    inv.object(
        &storage_pod,
        json!({ "summary": { "name": "Pod1", "capacity": 1099511627776i64, "freeSpace": 549755813888i64 } }),
    );

    inv.object(
        &prod_pool,
        json!({
            "summary": {
                "name": "Prod",
                "quickStats": { "overallCpuUsage": 1500, "guestMemoryUsage": 1024, "compressedMemory": 2 }
            }
        }),
    );
    // The root pool reports no quick stats and is skipped
    inv.object(&root_pool, json!({ "summary": { "name": "Resources" } }));

    let refs = Refs {
        datacenter,
        cluster,
        host,
        standalone_host,
        root_pool,
        prod_pool,
        vm_folder,
        vm,
        storage_pod,
        pooled_datastore,
        lone_datastore,
    };
    (inv, refs)
}

/// Value of the first sample of `metric` carrying every `labels` pair
pub fn sample(rendered: &str, metric: &str, labels: &[(&str, &str)]) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(metric)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .find(|line| {
            labels
                .iter()
                .all(|(name, value)| line.contains(&format!("{}=\"{}\"", name, value)))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

/// Number of samples of `metric`
pub fn sample_count(rendered: &str, metric: &str) -> usize {
    rendered
        .lines()
        .filter(|line| line.starts_with(&format!("{}{{", metric)))
        .count()
}
