//! Client-side watched/favorite library state.
//!
//! [`ReconciliationController`] owns the membership cache, the in-flight
//! markers and the list snapshots, and is the only thing that mutates them.

pub mod controller;
pub mod membership;
pub mod pending;
pub mod store;
pub mod tags;

pub use controller::{LibraryState, ReconciliationController, ToggleOutcome};
pub use membership::MembershipCache;
pub use pending::PendingSet;
pub use store::{HttpLibraryStore, LibraryStore};
pub use tags::{CacheTag, ListKey, SnapshotRegistry, TagScope};
