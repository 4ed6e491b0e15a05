//! Ancestry Resolution
//!
//! Every entity metric is labelled with the datacenter, cluster and storage pod
//! that enclose the entity in the inventory tree. Finding them means walking
//! parent pointers through the remote API, one round trip per level.
//!
//! # Components
//!
//! - [`AncestryCache`] - parent reference → resolved [`Ancestry`], cleared on every
//!   collector scrape and shared by all collectors
//! - [`resolve_ancestry`] - the parent walk, consulting and populating the cache
//! - [`resolve_pool`] / [`resolve_host`] - single-hop lookups used by the VM collector
//!
//! # Label Values
//!
//! Internally an absent ancestor is `None` and a failed walk is an `Err`. Only
//! [`AncestryLabels`] turns those into the `"NONE"` and `"ERROR"` label values.

mod cache;
mod resolver;

pub use cache::AncestryCache;
pub use resolver::{resolve_ancestry, resolve_host, resolve_pool, WALK_PROPERTIES};

use crate::error::Result;

/// Label value for an ancestor that does not exist on the path
pub const NONE_LABEL: &str = "NONE";

/// Label value for every ancestor field when the walk failed
pub const ERROR_LABEL: &str = "ERROR";

/// Enclosing datacenter, cluster and storage pod of an inventory object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestry {
    pub datacenter: Option<String>,
    pub cluster: Option<String>,
    pub storage_pod: Option<String>,
}

/// Classification of a node met during the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AncestorKind {
    /// Terminal: the walk stops here
    Datacenter,
    Cluster,
    StoragePod,
    /// Folders, resource pools, compute resources... skipped
    Other,
}

impl AncestorKind {
    pub fn classify(type_tag: &str) -> Self {
        match type_tag {
            "Datacenter" => Self::Datacenter,
            "ClusterComputeResource" => Self::Cluster,
            "StoragePod" => Self::StoragePod,
            _ => Self::Other,
        }
    }
}

/// Ancestry rendered as metric label values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AncestryLabels<'a> {
    pub datacenter: &'a str,
    pub cluster: &'a str,
    pub storage_pod: &'a str,
}

impl<'a> AncestryLabels<'a> {
    pub fn new(resolution: &'a Result<Ancestry>) -> Self {
        match resolution {
            Ok(ancestry) => Self::from(ancestry),
            Err(_) => Self {
                datacenter: ERROR_LABEL,
                cluster: ERROR_LABEL,
                storage_pod: ERROR_LABEL,
            },
        }
    }
}

impl<'a> From<&'a Ancestry> for AncestryLabels<'a> {
    fn from(ancestry: &'a Ancestry) -> Self {
        Self {
            datacenter: ancestry.datacenter.as_deref().unwrap_or(NONE_LABEL),
            cluster: ancestry.cluster.as_deref().unwrap_or(NONE_LABEL),
            storage_pod: ancestry.storage_pod.as_deref().unwrap_or(NONE_LABEL),
        }
    }
}
