//! Derived view state: which catalog results to show for the current mode,
//! annotated with library membership.

use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    library::ReconciliationController,
    models::{CatalogItem, Collection, MediaKind, NamedEntity},
};

pub mod cards;
pub mod catalog;

pub use cards::{backdrop_url, genre_names, hero_slides, poster_url, Card, CollectionRow, HeroSlide};
pub use catalog::CatalogSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Title,
    Person,
    Company,
    Genre,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub mode: SearchMode,
    pub query: String,
}

/// A genre picked from the navigation menu, with its id in each catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedGenre {
    pub name: String,
    pub movie_id: Option<i64>,
    pub tv_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Home,
    Genre(SelectedGenre),
    Search(SearchParams),
}

/// Movie and series cards for one screen
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Shelf {
    pub movies: Vec<Card>,
    pub series: Vec<Card>,
}

pub const FIRST_PAGE: u32 = 1;

/// Result lists for a mode, movies then series
async fn select_results(
    mode: &ViewMode,
    page: u32,
    catalog: &dyn CatalogSource,
) -> AppResult<(Vec<CatalogItem>, Vec<CatalogItem>)> {
    match mode {
        ViewMode::Home => Ok((
            catalog.trending(MediaKind::Movie).await?,
            catalog.trending(MediaKind::Series).await?,
        )),
        ViewMode::Genre(genre) => Ok((
            by_genre_id(catalog, MediaKind::Movie, genre.movie_id, page).await?,
            by_genre_id(catalog, MediaKind::Series, genre.tv_id, page).await?,
        )),
        ViewMode::Search(params) => {
            let query = params.query.trim();
            if query.is_empty() {
                return Ok((Vec::new(), Vec::new()));
            }
            match params.mode {
                SearchMode::Title => Ok((
                    catalog.search_titles(MediaKind::Movie, query, page).await?,
                    catalog.search_titles(MediaKind::Series, query, page).await?,
                )),
                SearchMode::Person => {
                    let people = catalog.search_people(query).await?;
                    match first_id(&people) {
                        Some(person_id) => Ok((
                            catalog
                                .discover_by_person(MediaKind::Movie, person_id, page)
                                .await?,
                            catalog
                                .discover_by_person(MediaKind::Series, person_id, page)
                                .await?,
                        )),
                        None => Ok((Vec::new(), Vec::new())),
                    }
                }
                SearchMode::Company => {
                    let companies = catalog.search_companies(query).await?;
                    match first_id(&companies) {
                        Some(company_id) => Ok((
                            catalog
                                .discover_by_company(MediaKind::Movie, company_id, page)
                                .await?,
                            catalog
                                .discover_by_company(MediaKind::Series, company_id, page)
                                .await?,
                        )),
                        None => Ok((Vec::new(), Vec::new())),
                    }
                }
                SearchMode::Genre => Ok((
                    by_genre_name(catalog, MediaKind::Movie, query, page).await?,
                    by_genre_name(catalog, MediaKind::Series, query, page).await?,
                )),
            }
        }
    }
}

fn first_id(entities: &[NamedEntity]) -> Option<i64> {
    entities.first().map(|entity| entity.id)
}

async fn by_genre_id(
    catalog: &dyn CatalogSource,
    kind: MediaKind,
    genre_id: Option<i64>,
    page: u32,
) -> AppResult<Vec<CatalogItem>> {
    match genre_id {
        Some(genre_id) => catalog.discover_by_genre(kind, genre_id, page).await,
        None => Ok(Vec::new()),
    }
}

async fn by_genre_name(
    catalog: &dyn CatalogSource,
    kind: MediaKind,
    name: &str,
    page: u32,
) -> AppResult<Vec<CatalogItem>> {
    let genre_id = catalog
        .genres(kind)
        .await?
        .into_iter()
        .find(|genre| genre.name.eq_ignore_ascii_case(name))
        .map(|genre| genre.id);
    by_genre_id(catalog, kind, genre_id, page).await
}

/// Builds the first page of cards for `mode`.
///
/// Invalidated library lists are refetched first so a just-removed item
/// does not reappear. If that refetch fails the last known membership is
/// shown.
pub async fn compose(
    mode: &ViewMode,
    catalog: &dyn CatalogSource,
    controller: &ReconciliationController,
) -> AppResult<Shelf> {
    compose_page(mode, FIRST_PAGE, catalog, controller).await
}

/// Like [`compose`], for a later page of discover or title-search results.
/// Trending and entity searches ignore `page`.
pub async fn compose_page(
    mode: &ViewMode,
    page: u32,
    catalog: &dyn CatalogSource,
    controller: &ReconciliationController,
) -> AppResult<Shelf> {
    if let Err(e) = controller.refresh_stale().await {
        tracing::warn!(error = %e, "Library refresh failed, using cached membership");
    }

    let (movies, series) = select_results(mode, page.max(FIRST_PAGE), catalog).await?;

    let state = controller.read().await;
    Ok(Shelf {
        movies: cards::cards(&state, MediaKind::Movie, &movies),
        series: cards::cards(&state, MediaKind::Series, &series),
    })
}

/// Rows for one tab of the collection page, refetching invalidated lists first
pub async fn collection_view(
    controller: &ReconciliationController,
    collection: Collection,
    kind: MediaKind,
) -> AppResult<Vec<CollectionRow>> {
    controller.refresh_stale().await?;
    let state = controller.read().await;
    Ok(cards::collection_rows(&state, collection, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        library::store::MockLibraryStore,
        models::{Genre, ItemIdentity, LibraryRecord, RemoveResponse},
    };
    use catalog::MockCatalogSource;
    use std::sync::Arc;

    fn item(id: i64, title: &str) -> CatalogItem {
        CatalogItem {
            id,
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn empty_library() -> ReconciliationController {
        let mut store = MockLibraryStore::new();
        store.expect_list().returning(|_, _| Ok(vec![]));
        ReconciliationController::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_home_shows_trending() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_trending().returning(|kind| match kind {
            MediaKind::Movie => Ok(vec![item(1, "Dune"), item(2, "Heat")]),
            MediaKind::Series => Ok(vec![item(3, "Dark")]),
        });

        let shelf = compose(&ViewMode::Home, &catalog, &empty_library()).await.unwrap();

        assert_eq!(shelf.movies.len(), 2);
        assert_eq!(shelf.series[0].identity, ItemIdentity::series(3));
    }

    #[tokio::test]
    async fn test_genre_pick_skips_kind_without_id() {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_discover_by_genre()
            .withf(|kind, genre_id, page| *kind == MediaKind::Movie && *genre_id == 28 && *page == 1)
            .times(1)
            .returning(|_, _, _| Ok(vec![item(1, "Heat")]));

        let mode = ViewMode::Genre(SelectedGenre {
            name: "Action".to_string(),
            movie_id: Some(28),
            tv_id: None,
        });
        let shelf = compose(&mode, &catalog, &empty_library()).await.unwrap();

        assert_eq!(shelf.movies.len(), 1);
        assert!(shelf.series.is_empty());
    }

    #[tokio::test]
    async fn test_person_search_uses_first_match() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_search_people().returning(|_| {
            Ok(vec![
                NamedEntity {
                    id: 525,
                    name: "Christopher Nolan".to_string(),
                },
                NamedEntity {
                    id: 1,
                    name: "Someone Else".to_string(),
                },
            ])
        });
        catalog
            .expect_discover_by_person()
            .withf(|_, person_id, _| *person_id == 525)
            .times(2)
            .returning(|kind, _, _| match kind {
                MediaKind::Movie => Ok(vec![item(27205, "Inception")]),
                MediaKind::Series => Ok(vec![]),
            });

        let mode = ViewMode::Search(SearchParams {
            mode: SearchMode::Person,
            query: "nolan".to_string(),
        });
        let shelf = compose(&mode, &catalog, &empty_library()).await.unwrap();

        assert_eq!(shelf.movies[0].title, "Inception");
    }

    #[tokio::test]
    async fn test_company_search_without_match_is_empty() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_search_companies().returning(|_| Ok(vec![]));
        catalog.expect_discover_by_company().never();

        let mode = ViewMode::Search(SearchParams {
            mode: SearchMode::Company,
            query: "nobody".to_string(),
        });
        let shelf = compose(&mode, &catalog, &empty_library()).await.unwrap();

        assert_eq!(shelf, Shelf::default());
    }

    #[tokio::test]
    async fn test_genre_name_search_is_case_insensitive() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_genres().returning(|kind| match kind {
            MediaKind::Movie => Ok(vec![Genre {
                id: 35,
                name: "Comedy".to_string(),
            }]),
            MediaKind::Series => Ok(vec![Genre {
                id: 10759,
                name: "Action & Adventure".to_string(),
            }]),
        });
        catalog
            .expect_discover_by_genre()
            .withf(|kind, genre_id, _| *kind == MediaKind::Movie && *genre_id == 35)
            .times(1)
            .returning(|_, _, _| Ok(vec![item(1, "Airplane!")]));

        let mode = ViewMode::Search(SearchParams {
            mode: SearchMode::Genre,
            query: "comedy".to_string(),
        });
        let shelf = compose(&mode, &catalog, &empty_library()).await.unwrap();

        assert_eq!(shelf.movies.len(), 1);
        assert!(shelf.series.is_empty());
    }

    #[tokio::test]
    async fn test_blank_search_skips_catalog() {
        let catalog = MockCatalogSource::new();
        let mode = ViewMode::Search(SearchParams {
            mode: SearchMode::Title,
            query: "   ".to_string(),
        });
        let shelf = compose(&mode, &catalog, &empty_library()).await.unwrap();
        assert_eq!(shelf, Shelf::default());
    }

    #[tokio::test]
    async fn test_cards_carry_membership_after_refresh() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_search_titles().returning(|kind, _, _| match kind {
            MediaKind::Movie => Ok(vec![item(42, "Inception"), item(43, "Tenet")]),
            MediaKind::Series => Ok(vec![]),
        });

        let mut store = MockLibraryStore::new();
        store.expect_list().returning(|collection, kind| {
            if collection == Collection::Favorite && kind == MediaKind::Movie {
                Ok(vec![LibraryRecord {
                    tmdb_id: 42,
                    kind,
                    title: Some("Inception".to_string()),
                    poster_path: None,
                }])
            } else {
                Ok(vec![])
            }
        });
        let controller = ReconciliationController::new(Arc::new(store));

        let mode = ViewMode::Search(SearchParams {
            mode: SearchMode::Title,
            query: "inc".to_string(),
        });
        let shelf = compose(&mode, &catalog, &controller).await.unwrap();

        assert!(shelf.movies[0].favorite);
        assert!(!shelf.movies[0].watched);
        assert!(!shelf.movies[1].favorite);
    }

    #[tokio::test]
    async fn test_library_outage_still_renders_cards() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_trending().returning(|_| Ok(vec![item(1, "Dune")]));

        let mut store = MockLibraryStore::new();
        store
            .expect_list()
            .returning(|_, _| Err(AppError::Internal("offline".to_string())));
        let controller = ReconciliationController::new(Arc::new(store));

        let shelf = compose(&ViewMode::Home, &catalog, &controller).await.unwrap();
        assert_eq!(shelf.movies.len(), 1);
        assert!(!shelf.movies[0].watched);
    }

    #[tokio::test]
    async fn test_removed_row_disappears_after_refetch() {
        let mut store = MockLibraryStore::new();
        let record = LibraryRecord {
            tmdb_id: 9,
            kind: MediaKind::Movie,
            title: None,
            poster_path: Some("/nine.jpg".to_string()),
        };
        let listed = record.clone();
        // first load of the four lists returns the record for watched movies
        store
            .expect_list()
            .times(4)
            .returning(move |collection, kind| {
                if collection == Collection::Watched && kind == MediaKind::Movie {
                    Ok(vec![listed.clone()])
                } else {
                    Ok(vec![])
                }
            });
        store.expect_list().returning(|_, _| Ok(vec![]));
        store
            .expect_remove()
            .returning(|_, _| Ok(RemoveResponse { removed: true }));
        let controller = ReconciliationController::new(Arc::new(store));

        let rows = collection_view(&controller, Collection::Watched, MediaKind::Movie)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Untitled");
        assert_eq!(rows[0].poster_url, "https://image.tmdb.org/t/p/w342/nine.jpg");
        assert!(!rows[0].removing);

        controller.remove(Collection::Watched, record.identity()).await;

        let rows = collection_view(&controller, Collection::Watched, MediaKind::Movie)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_later_page_reaches_catalog() {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_search_titles()
            .withf(|_, query, page| query.to_string() == "alien" && *page == 3)
            .times(2)
            .returning(|_, _, _| Ok(vec![]));

        let mode = ViewMode::Search(SearchParams {
            mode: SearchMode::Title,
            query: "alien".to_string(),
        });
        let shelf = compose_page(&mode, 3, &catalog, &empty_library()).await.unwrap();
        assert_eq!(shelf, Shelf::default());
    }

    #[tokio::test]
    async fn test_catalog_error_still_refreshes_library() {
        let mut catalog = MockCatalogSource::new();
        catalog
            .expect_trending()
            .returning(|_| Err(AppError::Internal("catalog down".to_string())));

        let mut store = MockLibraryStore::new();
        store.expect_list().times(4).returning(|_, _| Ok(vec![]));
        let controller = ReconciliationController::new(Arc::new(store));

        assert!(compose(&ViewMode::Home, &catalog, &controller).await.is_err());
        assert!(controller.read().await.membership().members(Collection::Watched).is_empty());
        assert!(!controller
            .is_stale(crate::library::ListKey::new(Collection::Watched, MediaKind::Movie))
            .await);
    }
}
