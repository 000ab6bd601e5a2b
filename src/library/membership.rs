use std::collections::HashMap;

use crate::models::{Collection, ItemIdentity, LibraryRecord};

/// In-memory projection of "is this item watched / favorite".
///
/// One flag map per collection. Maps are replaced wholesale by [`hydrate`]
/// and patched slot by slot by [`set_optimistic`]; nothing here talks to
/// the network.
///
/// [`hydrate`]: MembershipCache::hydrate
/// [`set_optimistic`]: MembershipCache::set_optimistic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipCache {
    watched: HashMap<ItemIdentity, bool>,
    favorite: HashMap<ItemIdentity, bool>,
}

impl MembershipCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, collection: Collection) -> &HashMap<ItemIdentity, bool> {
        match collection {
            Collection::Watched => &self.watched,
            Collection::Favorite => &self.favorite,
        }
    }

    fn map_mut(&mut self, collection: Collection) -> &mut HashMap<ItemIdentity, bool> {
        match collection {
            Collection::Watched => &mut self.watched,
            Collection::Favorite => &mut self.favorite,
        }
    }

    /// Replaces the whole map for `collection` with one built from `records`
    pub fn hydrate<'a, I>(&mut self, collection: Collection, records: I)
    where
        I: IntoIterator<Item = &'a LibraryRecord>,
    {
        let flags = records
            .into_iter()
            .map(|record| (record.identity(), true))
            .collect();
        *self.map_mut(collection) = flags;
    }

    pub fn is_member(&self, collection: Collection, identity: &ItemIdentity) -> bool {
        self.map(collection).get(identity).copied().unwrap_or(false)
    }

    /// Patches a single slot without touching any persisted state
    pub fn set_optimistic(&mut self, collection: Collection, identity: ItemIdentity, value: bool) {
        self.map_mut(collection).insert(identity, value);
    }

    /// Identities currently flagged as members, in identity order
    pub fn members(&self, collection: Collection) -> Vec<ItemIdentity> {
        let mut members: Vec<ItemIdentity> = self
            .map(collection)
            .iter()
            .filter(|(_, present)| **present)
            .map(|(identity, _)| *identity)
            .collect();
        members.sort();
        members
    }
}
