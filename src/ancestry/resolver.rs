use super::{Ancestry, AncestorKind, AncestryCache};
use crate::error::Result;
use crate::vsphere::types::{ManagedEntity, ManagedObjectReference, VirtualMachine};
use crate::vsphere::InventorySession;
use tracing::{debug, warn};

/// Properties fetched for every node visited by a walk
pub const WALK_PROPERTIES: &[&str] = &["name", "parent"];

/// Resolves the datacenter, cluster and storage pod enclosing `entity`
///
/// Walks upward from the entity's parent, one remote fetch per level, until a
/// `Datacenter` is reached or the chain ends. Cluster and storage pod names are
/// recorded on the way; every other node type is skipped.
///
/// - No parent: the empty ancestry, without any remote call.
/// - Parent already resolved this scrape: the cached ancestry, without any remote call.
/// - Fetch failure mid-walk: the error is returned and nothing is cached, so
///   another entity, or the next scrape, retries the walk.
///
/// A successful walk is cached under the entity's parent reference. If the
/// future is dropped mid-walk nothing is cached.
pub async fn resolve_ancestry<S: InventorySession>(
    session: &S,
    cache: &AncestryCache,
    entity: &ManagedEntity,
) -> Result<Ancestry> {
    let Some(parent) = entity.parent.as_ref() else {
        return Ok(Ancestry::default());
    };

    if let Some(cached) = cache.lookup(parent) {
        return Ok(cached);
    }

    let ancestry = walk(session, parent).await.inspect_err(|e| {
        warn!("Failed to resolve ancestry of {}: {}", entity.name, e);
    })?;

    cache.insert(parent.clone(), ancestry.clone());
    Ok(ancestry)
}

async fn walk<S: InventorySession>(
    session: &S,
    start: &ManagedObjectReference,
) -> Result<Ancestry> {
    let mut ancestry = Ancestry::default();
    let mut current = start.clone();

    loop {
        let node: ManagedEntity = session.retrieve_one(&current, WALK_PROPERTIES).await?;

        match AncestorKind::classify(&current.kind) {
            AncestorKind::Datacenter => {
                ancestry.datacenter = Some(node.name);
                break;
            }
            AncestorKind::Cluster => ancestry.cluster = Some(node.name),
            AncestorKind::StoragePod => ancestry.storage_pod = Some(node.name),
            AncestorKind::Other => {}
        }

        match node.parent {
            Some(next) => current = next,
            None => {
                debug!("Parent chain of {} ends without a datacenter", start);
                break;
            }
        }
    }

    Ok(ancestry)
}

/// Resource pool owning `vm`, if it declares one and the fetch succeeds
pub async fn resolve_pool<S: InventorySession>(
    session: &S,
    vm: &VirtualMachine,
) -> Option<ManagedEntity> {
    let pool = vm.resource_pool.as_ref()?;
    fetch_entity(session, pool, &vm.entity.name).await
}

/// Host currently running `vm`, if reported and the fetch succeeds
pub async fn resolve_host<S: InventorySession>(
    session: &S,
    vm: &VirtualMachine,
) -> Option<ManagedEntity> {
    let host = vm.summary.runtime.host.as_ref()?;
    fetch_entity(session, host, &vm.entity.name).await
}

async fn fetch_entity<S: InventorySession>(
    session: &S,
    reference: &ManagedObjectReference,
    owner: &str,
) -> Option<ManagedEntity> {
    match session.retrieve_one(reference, WALK_PROPERTIES).await {
        Ok(entity) => Some(entity),
        Err(e) => {
            debug!("Unable to fetch {} for {}: {}", reference, owner, e);
            None
        }
    }
}
