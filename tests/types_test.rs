use serde_json::json;
use vsphere_exporter::vsphere::client::flatten_object;
use vsphere_exporter::vsphere::types::*;

#[test]
fn test_deserialize_retrieve_result_page() {
    let json = json!({
        "_typeName": "RetrieveResult",
        "token": "2",
        "objects": [{
            "_typeName": "ObjectContent",
            "obj": { "_typeName": "ManagedObjectReference", "type": "HostSystem", "value": "host-12" },
            "propSet": [
                { "_typeName": "DynamicProperty", "name": "name", "val": { "_typeName": "string", "_value": "esx12.local" } }
            ]
        }]
    });

    let page: RetrieveResult = serde_json::from_value(json).expect("Failed to parse RetrieveResult");
    assert_eq!(page.token.as_deref(), Some("2"));
    assert_eq!(page.objects.len(), 1);
    assert_eq!(page.objects[0].obj, ManagedObjectReference::new("HostSystem", "host-12"));
}

#[test]
fn test_flattened_host_deserializes() {
    // Boxed primitives are unwrapped, references and data objects are kept
    let content: ObjectContent = serde_json::from_value(json!({
        "obj": { "_typeName": "ManagedObjectReference", "type": "HostSystem", "value": "host-12" },
        "propSet": [
            { "name": "name", "val": { "_typeName": "string", "_value": "esx12.local" } },
            { "name": "parent", "val": { "_typeName": "ManagedObjectReference", "type": "ClusterComputeResource", "value": "domain-c8" } },
            { "name": "summary", "val": {
                "_typeName": "HostListSummary",
                "config": { "_typeName": "HostConfigSummary", "name": "esx12.local", "product": { "_typeName": "AboutInfo", "version": "8.0.3" } },
                "hardware": { "_typeName": "HostHardwareSummary", "numCpuCores": 32, "cpuMhz": 2100, "memorySize": 549755813888i64 },
                "quickStats": { "_typeName": "HostListSummaryQuickStats", "uptime": 3600, "overallCpuUsage": 900 },
                "rebootRequired": true,
                "overallStatus": "yellow"
            } }
        ]
    }))
    .unwrap();

    let host: HostSystem = serde_json::from_value(flatten_object(content)).expect("Failed to parse HostSystem");

    assert_eq!(host.entity.name, "esx12.local");
    assert_eq!(
        host.entity.reference,
        Some(ManagedObjectReference::new("HostSystem", "host-12"))
    );
    assert_eq!(
        host.entity.parent,
        Some(ManagedObjectReference::new("ClusterComputeResource", "domain-c8"))
    );
    assert_eq!(host.summary.hardware.unwrap().num_cpu_cores, 32);
    assert_eq!(host.summary.config.product.unwrap().version, "8.0.3");
    assert!(host.summary.reboot_required);
    // Omitted properties take their default
    assert_eq!(host.summary.quick_stats.overall_memory_usage, 0);
}

#[test]
fn test_deserialize_vm_with_devices() {
    let json = json!({
        "self": { "type": "VirtualMachine", "value": "vm-31" },
        "name": "db-01",
        "config": {
            "name": "db-01",
            "hardware": {
                "numCPU": 8,
                "numCoresPerSocket": 4,
                "memoryMB": 32768,
                "device": [
                    { "_typeName": "VirtualDisk", "key": 2000, "capacityInBytes": 107374182400i64,
                      "backing": { "_typeName": "VirtualDiskFlatVer2BackingInfo", "fileName": "[ds1] db-01/db-01.vmdk" } },
                    { "_typeName": "VirtualVmxnet3", "key": 4000, "macAddress": "00:50:56:01:02:03" }
                ]
            }
        },
        "runtime": { "powerState": "poweredOff" },
        "summary": { "quickStats": { "compressedMemory": 10, "ssdSwappedMemory": 20 } }
    });

    let vm: VirtualMachine = serde_json::from_value(json).expect("Failed to parse VirtualMachine");

    let hardware = &vm.config.as_ref().unwrap().hardware;
    assert_eq!(hardware.num_cpu, 8);
    assert_eq!(hardware.memory_mb, 32768);
    assert_eq!(hardware.device.len(), 2);
    assert_eq!(hardware.device[0].type_name, "VirtualDisk");
    assert_eq!(hardware.device[1].mac_address.as_deref(), Some("00:50:56:01:02:03"));
    assert_eq!(vm.runtime.power_state, "poweredOff");
    assert!(vm.guest.is_none());
    assert!(vm.resource_pool.is_none());
    assert_eq!(vm.summary.quick_stats.ssd_swapped_memory, 20);
}

#[test]
fn test_deserialize_datastore_summary() {
    let json = json!({
        "self": { "type": "Datastore", "value": "datastore-5" },
        "name": "nfs-01",
        "parent": { "type": "Folder", "value": "group-s4" },
        "summary": { "name": "nfs-01", "type": "NFS41", "capacity": 100, "freeSpace": 40, "accessible": true }
    });

    let datastore: Datastore = serde_json::from_value(json).unwrap();

    assert_eq!(datastore.summary.datastore_type, "NFS41");
    assert_eq!(datastore.summary.free_space, 40);
    assert_eq!(datastore.summary.maintenance_mode, None);
}

#[test]
fn test_managed_object_reference_serializes_type_name() {
    let reference = ManagedObjectReference::new("Folder", "group-d1");

    let value = serde_json::to_value(&reference).unwrap();

    assert_eq!(
        value,
        json!({ "_typeName": "ManagedObjectReference", "type": "Folder", "value": "group-d1" })
    );
    assert_eq!(reference.to_string(), "Folder:group-d1");
}

#[test]
fn test_service_content_subset() {
    let json = json!({
        "_typeName": "ServiceContent",
        "rootFolder": { "_typeName": "ManagedObjectReference", "type": "Folder", "value": "group-d1" },
        "propertyCollector": { "_typeName": "ManagedObjectReference", "type": "PropertyCollector", "value": "propertyCollector" },
        "viewManager": { "_typeName": "ManagedObjectReference", "type": "ViewManager", "value": "ViewManager" },
        "sessionManager": { "_typeName": "ManagedObjectReference", "type": "SessionManager", "value": "SessionManager" },
        "about": { "_typeName": "AboutInfo", "version": "8.0.3" }
    });

    let content: ServiceContent = serde_json::from_value(json).unwrap();

    assert_eq!(content.root_folder.value, "group-d1");
    assert_eq!(content.session_manager.kind, "SessionManager");
}
