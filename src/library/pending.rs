use std::collections::HashSet;

use crate::models::{Collection, ItemIdentity};

/// In-flight markers, one per (collection, identity)
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    keys: HashSet<(Collection, ItemIdentity)>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the pair busy. Returns false if it already was.
    pub fn begin(&mut self, collection: Collection, identity: ItemIdentity) -> bool {
        self.keys.insert((collection, identity))
    }

    pub fn finish(&mut self, collection: Collection, identity: ItemIdentity) {
        self.keys.remove(&(collection, identity));
    }

    pub fn is_busy(&self, collection: Collection, identity: &ItemIdentity) -> bool {
        self.keys.contains(&(collection, *identity))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
