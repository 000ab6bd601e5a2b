use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{Collection, ItemIdentity, LibraryRecord, MediaKind},
};

/// Persistence for library membership rows.
///
/// Rows are unique per (collection, kind, tmdb_id).
#[async_trait::async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Members of `collection` of the given kind, newest first
    async fn list(&self, collection: Collection, kind: MediaKind) -> AppResult<Vec<LibraryRecord>>;

    /// Inserts `record` unless it is already present; returns the stored row
    async fn add(&self, collection: Collection, record: LibraryRecord) -> AppResult<LibraryRecord>;

    /// Deletes the row, returning false when there was nothing to delete
    async fn remove(&self, collection: Collection, identity: ItemIdentity) -> AppResult<bool>;
}

/// Repository kept in process memory, used when no database is configured
#[derive(Default)]
pub struct InMemoryRepository {
    // rows in insertion order
    rows: RwLock<HashMap<Collection, Vec<LibraryRecord>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LibraryRepository for InMemoryRepository {
    async fn list(&self, collection: Collection, kind: MediaKind) -> AppResult<Vec<LibraryRecord>> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .rev()
                    .filter(|record| record.kind == kind)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add(&self, collection: Collection, record: LibraryRecord) -> AppResult<LibraryRecord> {
        let mut rows = self.rows.write().await;
        let records = rows.entry(collection).or_default();

        if let Some(existing) = records
            .iter()
            .find(|existing| existing.identity() == record.identity())
        {
            return Ok(existing.clone());
        }

        records.push(record.clone());
        Ok(record)
    }

    async fn remove(&self, collection: Collection, identity: ItemIdentity) -> AppResult<bool> {
        let mut rows = self.rows.write().await;
        let Some(records) = rows.get_mut(&collection) else {
            return Ok(false);
        };

        let before = records.len();
        records.retain(|record| record.identity() != identity);
        Ok(records.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn record(kind: MediaKind, tmdb_id: i64, title: &str) -> LibraryRecord {
        LibraryRecord {
            tmdb_id,
            kind,
            title: Some(title.to_string()),
            poster_path: None,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_filtered_by_kind() {
        let repo = InMemoryRepository::new();
        repo.add(Collection::Watched, record(MediaKind::Movie, 1, "First"))
            .await
            .unwrap();
        repo.add(Collection::Watched, record(MediaKind::Series, 2, "Show"))
            .await
            .unwrap();
        repo.add(Collection::Watched, record(MediaKind::Movie, 3, "Second"))
            .await
            .unwrap();

        let movies = repo.list(Collection::Watched, MediaKind::Movie).await.unwrap();
        let ids: Vec<i64> = movies.iter().map(|r| r.tmdb_id).collect();
        assert_eq!(ids, vec![3, 1]);

        let favorites = repo.list(Collection::Favorite, MediaKind::Movie).await.unwrap();
        assert!(favorites.is_empty());
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let repo = InMemoryRepository::new();
        repo.add(Collection::Favorite, record(MediaKind::Movie, 42, "Original"))
            .await
            .unwrap();
        let stored = repo
            .add(Collection::Favorite, record(MediaKind::Movie, 42, "Renamed"))
            .await
            .unwrap();

        assert_eq!(stored.title.as_deref(), Some("Original"));
        assert_eq!(
            repo.list(Collection::Favorite, MediaKind::Movie)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_same_id_different_kind_coexist() {
        let repo = InMemoryRepository::new();
        repo.add(Collection::Watched, record(MediaKind::Movie, 42, "Movie"))
            .await
            .unwrap();
        repo.add(Collection::Watched, record(MediaKind::Series, 42, "Series"))
            .await
            .unwrap();

        assert!(repo
            .remove(Collection::Watched, ItemIdentity::movie(42))
            .await
            .unwrap());
        let series = repo.list(Collection::Watched, MediaKind::Series).await.unwrap();
        assert_eq!(series.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_missing_reports_false() {
        let repo = InMemoryRepository::new();
        let removed = assert_ok!(repo.remove(Collection::Watched, ItemIdentity::movie(1)).await);
        assert!(!removed);
    }
}
