//! Invalidation bookkeeping for the four library list snapshots.
//!
//! Each fetched list provides a `LIST` tag for its collection plus one tag
//! per item it contains. A confirmed mutation invalidates the collection's
//! `LIST` tag and the touched item's tag; any snapshot providing one of
//! those tags must be refetched before membership is rendered again.
//!
//! Every invalidation that hits a list also bumps its generation. A fetch
//! that started under an older generation is discarded when it lands, so a
//! response read before a confirmed mutation cannot mark the list fresh.

use chrono::{DateTime, Utc};
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

use crate::models::{Collection, ItemIdentity, LibraryRecord, MediaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagScope {
    List,
    Item(ItemIdentity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheTag {
    pub collection: Collection,
    pub scope: TagScope,
}

impl CacheTag {
    pub fn list(collection: Collection) -> Self {
        Self {
            collection,
            scope: TagScope::List,
        }
    }

    pub fn item(collection: Collection, identity: ItemIdentity) -> Self {
        Self {
            collection,
            scope: TagScope::Item(identity),
        }
    }

    /// Tags a confirmed add or remove of `identity` invalidates
    pub fn for_mutation(collection: Collection, identity: ItemIdentity) -> [CacheTag; 2] {
        [Self::list(collection), Self::item(collection, identity)]
    }
}

impl Display for CacheTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.scope {
            TagScope::List => write!(f, "{}:LIST", self.collection),
            TagScope::Item(identity) => write!(f, "{}:{}", self.collection, identity),
        }
    }
}

/// One of the list endpoints of the library store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListKey {
    pub collection: Collection,
    pub kind: MediaKind,
}

impl ListKey {
    pub fn new(collection: Collection, kind: MediaKind) -> Self {
        Self { collection, kind }
    }

    pub fn all() -> impl Iterator<Item = ListKey> {
        Collection::ALL
            .into_iter()
            .flat_map(|collection| MediaKind::ALL.into_iter().map(move |kind| ListKey::new(collection, kind)))
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.collection.route_prefix(), self.kind.list_segment())
    }

    /// Tags provided by a snapshot of this list holding `records`
    pub fn provided_tags(&self, records: &[LibraryRecord]) -> HashSet<CacheTag> {
        std::iter::once(CacheTag::list(self.collection))
            .chain(
                records
                    .iter()
                    .map(|record| CacheTag::item(self.collection, record.identity())),
            )
            .collect()
    }
}

impl Display for ListKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[derive(Debug, Clone)]
struct ListSnapshot {
    records: Vec<LibraryRecord>,
    tags: HashSet<CacheTag>,
    stale: bool,
    fetched_at: DateTime<Utc>,
}

/// Last fetched records for each list, with staleness tracking
#[derive(Debug, Clone, Default)]
pub struct SnapshotRegistry {
    lists: HashMap<ListKey, ListSnapshot>,
    generations: HashMap<ListKey, u64>,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly fetched list, clearing its stale flag
    pub fn store(&mut self, key: ListKey, records: Vec<LibraryRecord>) {
        let tags = key.provided_tags(&records);
        self.lists.insert(
            key,
            ListSnapshot {
                records,
                tags,
                stale: false,
                fetched_at: Utc::now(),
            },
        );
    }

    /// Stores a list fetched under `generation`.
    ///
    /// Returns false, leaving the list stale, if an invalidation hit the
    /// list after the fetch started.
    pub fn store_fetched(&mut self, key: ListKey, generation: u64, records: Vec<LibraryRecord>) -> bool {
        if self.generation(key) != generation {
            return false;
        }
        self.store(key, records);
        true
    }

    pub fn generation(&self, key: ListKey) -> u64 {
        self.generations.get(&key).copied().unwrap_or(0)
    }

    /// Marks every snapshot providing one of `tags` as stale.
    ///
    /// Lists never fetched are hit by any tag of their collection.
    /// Returns the lists that went from fresh to stale.
    pub fn invalidate(&mut self, tags: &[CacheTag]) -> Vec<ListKey> {
        let mut newly_stale = Vec::new();
        for key in ListKey::all() {
            let hit = match self.lists.get(&key) {
                Some(snapshot) => tags.iter().any(|tag| snapshot.tags.contains(tag)),
                None => tags.iter().any(|tag| tag.collection == key.collection),
            };
            if !hit {
                continue;
            }

            *self.generations.entry(key).or_insert(0) += 1;
            if let Some(snapshot) = self.lists.get_mut(&key) {
                if !snapshot.stale {
                    snapshot.stale = true;
                    newly_stale.push(key);
                }
            }
        }
        newly_stale
    }

    /// A list that was never fetched counts as stale
    pub fn is_stale(&self, key: ListKey) -> bool {
        self.lists.get(&key).map_or(true, |snapshot| snapshot.stale)
    }

    pub fn stale_lists(&self) -> Vec<ListKey> {
        ListKey::all().filter(|key| self.is_stale(*key)).collect()
    }

    pub fn records(&self, key: ListKey) -> &[LibraryRecord] {
        self.lists
            .get(&key)
            .map(|snapshot| snapshot.records.as_slice())
            .unwrap_or(&[])
    }

    /// Records of both kinds for a collection, movies first
    pub fn collection_records(&self, collection: Collection) -> Vec<LibraryRecord> {
        MediaKind::ALL
            .into_iter()
            .flat_map(|kind| self.records(ListKey::new(collection, kind)).iter().cloned())
            .collect()
    }

    /// When the current snapshot of `key` was stored
    pub fn fetched_at(&self, key: ListKey) -> Option<DateTime<Utc>> {
        self.lists.get(&key).map(|snapshot| snapshot.fetched_at)
    }
}
