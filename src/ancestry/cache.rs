use super::Ancestry;
use crate::vsphere::types::ManagedObjectReference;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Scrape-scoped memo of resolved ancestries
///
/// Keyed by the *parent* reference of the resolved object, so siblings share
/// one entry. One instance is created at startup and handed to every collector;
/// each collector clears it when its scrape starts. A clear issued by one
/// collector also discards entries another in-flight scrape has populated,
/// which costs extra walks but never yields a wrong answer.
///
/// The lock only guards map access. No method performs I/O.
#[derive(Debug, Default)]
pub struct AncestryCache {
    entries: Mutex<HashMap<ManagedObjectReference, Ancestry>>,
}

impl AncestryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere cannot leave the map half-written, so poisoning is ignored.
    fn entries(&self) -> MutexGuard<'_, HashMap<ManagedObjectReference, Ancestry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every entry
    pub fn clear(&self) {
        let stale = std::mem::take(&mut *self.entries());
        drop(stale);
    }

    /// Cached ancestry for objects whose parent is `parent`
    pub fn lookup(&self, parent: &ManagedObjectReference) -> Option<Ancestry> {
        self.entries().get(parent).cloned()
    }

    /// Store `ancestry` unless `parent` already has an entry
    ///
    /// Records for the same parent within one scrape are identical, so the
    /// first writer wins and later inserts are no-ops.
    pub fn insert(&self, parent: ManagedObjectReference, ancestry: Ancestry) {
        self.entries().entry(parent).or_insert(ancestry);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
