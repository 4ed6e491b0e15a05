pub mod client;
pub mod session;
pub mod types;

pub use client::{VsphereClient, VsphereSession};
pub use session::{InventoryApi, InventorySession};
