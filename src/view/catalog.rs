use crate::{
    error::AppResult,
    models::{CatalogItem, Genre, MediaKind, NamedEntity},
};

/// Read-only movie/TV metadata catalog.
///
/// Person and company lookups are two-step: search for the entity by name,
/// then discover titles by its id. Discover and title search results are
/// paged from 1; entity searches always read the first page.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Titles trending today
    async fn trending(&self, kind: MediaKind) -> AppResult<Vec<CatalogItem>>;

    /// Genre names and ids for the kind
    async fn genres(&self, kind: MediaKind) -> AppResult<Vec<Genre>>;

    async fn discover_by_genre(
        &self,
        kind: MediaKind,
        genre_id: i64,
        page: u32,
    ) -> AppResult<Vec<CatalogItem>>;

    async fn search_titles(&self, kind: MediaKind, query: &str, page: u32) -> AppResult<Vec<CatalogItem>>;

    /// Actors, directors and creators matching `query`
    async fn search_people(&self, query: &str) -> AppResult<Vec<NamedEntity>>;

    async fn discover_by_person(
        &self,
        kind: MediaKind,
        person_id: i64,
        page: u32,
    ) -> AppResult<Vec<CatalogItem>>;

    /// Production companies matching `query`
    async fn search_companies(&self, query: &str) -> AppResult<Vec<NamedEntity>>;

    async fn discover_by_company(
        &self,
        kind: MediaKind,
        company_id: i64,
        page: u32,
    ) -> AppResult<Vec<CatalogItem>>;
}
