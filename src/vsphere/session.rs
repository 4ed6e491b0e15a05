//! Inventory API seams
//!
//! The collectors and the ancestry resolver only talk to the inventory through
//! these two traits. [`VsphereClient`](crate::vsphere::VsphereClient) implements
//! them over HTTP; the test suite implements them over an in-memory tree.

use crate::error::Result;
use crate::vsphere::types::ManagedObjectReference;
use serde::de::DeserializeOwned;
use std::future::Future;

/// Factory for authenticated inventory sessions
pub trait InventoryApi: Send + Sync {
    type Session: InventorySession;

    /// Endpoint identity, exposed as the `vc` label
    fn endpoint(&self) -> &str;

    /// Connect and authenticate a new session
    fn open_session(&self) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// One authenticated session against the inventory
///
/// Retrieved objects are deserialized from a JSON object holding the object's own
/// reference under `self` plus one key per requested property.
pub trait InventorySession: Send + Sync {
    /// Retrieve every object of `object_type` under the inventory root
    fn retrieve_all<T>(
        &self,
        object_type: &str,
        properties: &[&str],
    ) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: DeserializeOwned + Send;

    /// Retrieve the named properties of a single object
    fn retrieve_one<T>(
        &self,
        reference: &ManagedObjectReference,
        properties: &[&str],
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: DeserializeOwned + Send;

    /// Log out; failures are logged, never returned
    fn close(self) -> impl Future<Output = ()> + Send;
}
