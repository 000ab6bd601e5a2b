use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, Utc};

use tokio::{
    sync::{RwLock, RwLockReadGuard},
    task::JoinHandle,
};

use crate::{
    error::AppResult,
    models::{Collection, ItemIdentity, LibraryRecord, MediaKind, RemoveResponse, ToggleItem},
};

use super::{
    membership::MembershipCache,
    pending::PendingSet,
    store::LibraryStore,
    tags::{CacheTag, ListKey, SnapshotRegistry},
};

/// How a toggle (or a collection-page removal) settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The store accepted the change; `member` is the new membership
    Confirmed { member: bool },
    /// The store call failed and the previous membership was restored
    RolledBack { reason: String },
    /// Another toggle for the same collection and item had not settled yet
    InFlight,
}

impl ToggleOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ToggleOutcome::Confirmed { .. })
    }
}

/// Library state owned by the controller
#[derive(Debug, Default)]
pub struct LibraryState {
    membership: MembershipCache,
    pending: PendingSet,
    snapshots: SnapshotRegistry,
}

impl LibraryState {
    pub fn is_member(&self, collection: Collection, identity: &ItemIdentity) -> bool {
        self.membership.is_member(collection, identity)
    }

    pub fn is_busy(&self, collection: Collection, identity: &ItemIdentity) -> bool {
        self.pending.is_busy(collection, identity)
    }

    pub fn is_stale(&self, key: ListKey) -> bool {
        self.snapshots.is_stale(key)
    }

    pub fn records(&self, key: ListKey) -> &[LibraryRecord] {
        self.snapshots.records(key)
    }

    /// When the snapshot of `key` was last stored
    pub fn fetched_at(&self, key: ListKey) -> Option<DateTime<Utc>> {
        self.snapshots.fetched_at(key)
    }

    pub fn membership(&self) -> &MembershipCache {
        &self.membership
    }

    fn rehydrate(&mut self, collection: Collection) {
        let records = self.snapshots.collection_records(collection);
        self.membership.hydrate(collection, &records);
    }
}

/// Keeps watched/favorite membership consistent between the local cache
/// and the library store.
///
/// Toggles flip the cached flag before the store is called and restore it
/// if the call fails. The state lock is never held across a store call, so
/// toggles on different items proceed independently.
#[derive(Clone)]
pub struct ReconciliationController {
    store: Arc<dyn LibraryStore>,
    state: Arc<RwLock<LibraryState>>,
}

impl ReconciliationController {
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self {
            store,
            state: Arc::new(RwLock::new(LibraryState::default())),
        }
    }

    /// Flips membership of `item` in `collection`.
    ///
    /// A second toggle for the same pair while the first is in flight is
    /// rejected with [`ToggleOutcome::InFlight`] and has no effect. The
    /// store call and the settle step run on a spawned task, so dropping
    /// the returned future still clears the marker and applies the outcome.
    pub async fn toggle(&self, collection: Collection, item: ToggleItem) -> ToggleOutcome {
        let identity = item.identity;

        let was_member = {
            let mut state = self.state.write().await;
            if !state.pending.begin(collection, identity) {
                tracing::warn!(
                    collection = %collection,
                    identity = %identity,
                    "Toggle ignored while a previous toggle is in flight"
                );
                return ToggleOutcome::InFlight;
            }
            let was_member = state.membership.is_member(collection, &identity);
            state
                .membership
                .set_optimistic(collection, identity, !was_member);
            was_member
        };

        let controller = self.clone();
        let settle = tokio::spawn(async move {
            let result = if was_member {
                controller.store.remove(collection, identity).await.map(|_| ())
            } else {
                controller
                    .store
                    .add(collection, item.to_record())
                    .await
                    .map(|_| ())
            };
            controller
                .settle_toggle(collection, identity, was_member, result)
                .await
        });

        self.join_settle(settle, collection, identity, Some(was_member))
            .await
    }

    async fn settle_toggle(
        &self,
        collection: Collection,
        identity: ItemIdentity,
        was_member: bool,
        result: AppResult<()>,
    ) -> ToggleOutcome {
        let mut state = self.state.write().await;
        state.pending.finish(collection, identity);

        match result {
            Ok(()) => {
                let stale = state
                    .snapshots
                    .invalidate(&CacheTag::for_mutation(collection, identity));
                tracing::info!(
                    collection = %collection,
                    identity = %identity,
                    member = !was_member,
                    stale_lists = stale.len(),
                    "Toggle confirmed"
                );
                ToggleOutcome::Confirmed {
                    member: !was_member,
                }
            }
            Err(e) => {
                state
                    .membership
                    .set_optimistic(collection, identity, was_member);
                tracing::error!(
                    error = %e,
                    collection = %collection,
                    identity = %identity,
                    "Toggle failed, membership rolled back"
                );
                ToggleOutcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Waits for a spawned settle task.
    ///
    /// If the task panicked, clears the marker here and restores
    /// `restore` when given.
    async fn join_settle(
        &self,
        settle: JoinHandle<ToggleOutcome>,
        collection: Collection,
        identity: ItemIdentity,
        restore: Option<bool>,
    ) -> ToggleOutcome {
        match settle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let mut state = self.state.write().await;
                state.pending.finish(collection, identity);
                if let Some(was_member) = restore {
                    state
                        .membership
                        .set_optimistic(collection, identity, was_member);
                }
                tracing::error!(
                    error = %e,
                    collection = %collection,
                    identity = %identity,
                    "Library store call aborted"
                );
                ToggleOutcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Removes an item without touching the membership cache first.
    ///
    /// Used by the collection page, where the row disappears once the
    /// invalidated lists are refetched.
    pub async fn remove(&self, collection: Collection, identity: ItemIdentity) -> ToggleOutcome {
        if !self.state.write().await.pending.begin(collection, identity) {
            return ToggleOutcome::InFlight;
        }

        let controller = self.clone();
        let settle = tokio::spawn(async move {
            let result = controller.store.remove(collection, identity).await;
            controller.settle_remove(collection, identity, result).await
        });

        self.join_settle(settle, collection, identity, None).await
    }

    async fn settle_remove(
        &self,
        collection: Collection,
        identity: ItemIdentity,
        result: AppResult<RemoveResponse>,
    ) -> ToggleOutcome {
        let mut state = self.state.write().await;
        state.pending.finish(collection, identity);

        match result {
            Ok(_) => {
                state
                    .snapshots
                    .invalidate(&CacheTag::for_mutation(collection, identity));
                tracing::info!(collection = %collection, identity = %identity, "Removed from library");
                ToggleOutcome::Confirmed { member: false }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    collection = %collection,
                    identity = %identity,
                    "Removal failed"
                );
                ToggleOutcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Replaces cached membership of `collection` with `records`
    pub async fn hydrate(&self, collection: Collection, records: &[LibraryRecord]) {
        self.state
            .write()
            .await
            .membership
            .hydrate(collection, records);
    }

    /// Fetches the given lists and re-hydrates the collections they belong to.
    ///
    /// Nothing is applied unless every fetch succeeds. A list invalidated
    /// while its fetch was running is left stale, and its collection is not
    /// re-hydrated from the older snapshot.
    pub async fn refresh_lists(&self, keys: &[ListKey]) -> AppResult<()> {
        let pending: Vec<(ListKey, u64)> = {
            let state = self.state.read().await;
            keys.iter()
                .map(|key| (*key, state.snapshots.generation(*key)))
                .collect()
        };

        let mut fetched = Vec::with_capacity(pending.len());
        for (key, generation) in pending {
            let records = self.store.list(key.collection, key.kind).await?;
            fetched.push((key, generation, records));
        }

        let mut state = self.state.write().await;
        let mut collections = BTreeSet::new();
        let mut superseded = BTreeSet::new();
        for (key, generation, records) in fetched {
            let count = records.len();
            if state.snapshots.store_fetched(key, generation, records) {
                tracing::debug!(list = %key, count, "Library snapshot loaded");
                collections.insert(key.collection);
            } else {
                tracing::debug!(list = %key, "Discarding list fetched before a confirmed mutation");
                superseded.insert(key.collection);
            }
        }
        for collection in collections.difference(&superseded) {
            state.rehydrate(*collection);
        }

        Ok(())
    }

    /// Reloads both lists of `collection` from the store
    pub async fn refresh(&self, collection: Collection) -> AppResult<()> {
        let keys: Vec<ListKey> = MediaKind::ALL
            .into_iter()
            .map(|kind| ListKey::new(collection, kind))
            .collect();
        self.refresh_lists(&keys).await
    }

    /// Reloads every list
    pub async fn refresh_all(&self) -> AppResult<()> {
        let keys: Vec<ListKey> = ListKey::all().collect();
        self.refresh_lists(&keys).await
    }

    /// Reloads lists that were invalidated or never loaded.
    ///
    /// Returns the lists that were fetched.
    pub async fn refresh_stale(&self) -> AppResult<Vec<ListKey>> {
        let stale = self.state.read().await.snapshots.stale_lists();
        if !stale.is_empty() {
            self.refresh_lists(&stale).await?;
        }
        Ok(stale)
    }

    pub async fn is_member(&self, collection: Collection, identity: &ItemIdentity) -> bool {
        self.state.read().await.is_member(collection, identity)
    }

    pub async fn is_busy(&self, collection: Collection, identity: &ItemIdentity) -> bool {
        self.state.read().await.is_busy(collection, identity)
    }

    pub async fn is_stale(&self, key: ListKey) -> bool {
        self.state.read().await.is_stale(key)
    }

    pub async fn records(&self, key: ListKey) -> Vec<LibraryRecord> {
        self.state.read().await.records(key).to_vec()
    }

    /// Read access for composing many cards under one lock
    pub async fn read(&self) -> RwLockReadGuard<'_, LibraryState> {
        self.state.read().await
    }
}
