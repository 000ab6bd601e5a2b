use serde::Serialize;

use crate::{
    library::{LibraryState, ListKey},
    models::{CatalogItem, Collection, Genre, ItemIdentity, LibraryRecord, MediaKind, ToggleItem},
};

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const NO_POSTER: &str = "/no-poster.png";
const FALLBACK_BACKDROP: &str = "/poster/picture1.jpg";
const PLACEHOLDER: &str = "—";
const HERO_SLIDES: usize = 5;

pub fn poster_url(path: Option<&str>) -> String {
    match path {
        Some(path) => format!("{}/w342{}", IMAGE_BASE, path),
        None => NO_POSTER.to_string(),
    }
}

pub fn backdrop_url(backdrop_path: Option<&str>, poster_path: Option<&str>) -> String {
    match (backdrop_path, poster_path) {
        (Some(backdrop), _) => format!("{}/w1280{}", IMAGE_BASE, backdrop),
        (None, Some(poster)) => format!("{}/w780{}", IMAGE_BASE, poster),
        (None, None) => FALLBACK_BACKDROP.to_string(),
    }
}

/// First two genre names for `ids`, or a dash when none resolve
pub fn genre_names(ids: &[i64], genres: &[Genre]) -> String {
    let names: Vec<&str> = ids
        .iter()
        .filter_map(|id| genres.iter().find(|genre| genre.id == *id))
        .map(|genre| genre.name.as_str())
        .take(2)
        .collect();

    if names.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        names.join(", ")
    }
}

fn rating_text(vote_average: Option<f64>) -> String {
    vote_average
        .map(|rating| format!("{:.1}", rating))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// A catalog result annotated with library state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub identity: ItemIdentity,
    pub title: String,
    pub year: String,
    pub poster_path: Option<String>,
    pub poster_url: String,
    pub rating: Option<f64>,
    pub watched: bool,
    pub favorite: bool,
    pub saving_watched: bool,
    pub saving_favorite: bool,
}

impl Card {
    pub fn new(state: &LibraryState, kind: MediaKind, item: &CatalogItem) -> Self {
        let identity = ItemIdentity::new(kind, item.id);
        Self {
            identity,
            title: item.display_title().to_string(),
            year: item.year().unwrap_or("N/A").to_string(),
            poster_path: item.poster_path.clone(),
            poster_url: poster_url(item.poster_path.as_deref()),
            rating: item.vote_average,
            watched: state.is_member(Collection::Watched, &identity),
            favorite: state.is_member(Collection::Favorite, &identity),
            saving_watched: state.is_busy(Collection::Watched, &identity),
            saving_favorite: state.is_busy(Collection::Favorite, &identity),
        }
    }

    /// Request to hand the controller when one of the card's toggles is pressed
    pub fn toggle_item(&self) -> ToggleItem {
        ToggleItem {
            identity: self.identity,
            title: self.title.clone(),
            poster_path: self.poster_path.clone(),
        }
    }
}

pub fn cards(state: &LibraryState, kind: MediaKind, items: &[CatalogItem]) -> Vec<Card> {
    items.iter().map(|item| Card::new(state, kind, item)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroSlide {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub rating: String,
    pub overview: String,
    pub backdrop_url: String,
}

/// Carousel slides for the top trending movies
pub fn hero_slides(trending: &[CatalogItem], genres: &[Genre]) -> Vec<HeroSlide> {
    trending
        .iter()
        .take(HERO_SLIDES)
        .map(|item| HeroSlide {
            id: item.id,
            title: item.display_title().to_string(),
            genre: genre_names(&item.genre_ids, genres),
            rating: rating_text(item.vote_average),
            overview: item.overview.clone().unwrap_or_default(),
            backdrop_url: backdrop_url(item.backdrop_path.as_deref(), item.poster_path.as_deref()),
        })
        .collect()
}

/// One row of the collection page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionRow {
    pub identity: ItemIdentity,
    pub title: String,
    pub poster_url: String,
    pub removing: bool,
}

impl CollectionRow {
    fn new(state: &LibraryState, collection: Collection, record: &LibraryRecord) -> Self {
        let identity = record.identity();
        Self {
            identity,
            title: record.display_title().to_string(),
            poster_url: poster_url(record.poster_path.as_deref()),
            removing: state.is_busy(collection, &identity),
        }
    }
}

/// Rows of one tab of the collection page, from the last fetched snapshot
pub fn collection_rows(state: &LibraryState, collection: Collection, kind: MediaKind) -> Vec<CollectionRow> {
    state
        .records(ListKey::new(collection, kind))
        .iter()
        .map(|record| CollectionRow::new(state, collection, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genres() -> Vec<Genre> {
        vec![
            Genre {
                id: 28,
                name: "Action".to_string(),
            },
            Genre {
                id: 878,
                name: "Science Fiction".to_string(),
            },
            Genre {
                id: 53,
                name: "Thriller".to_string(),
            },
        ]
    }

    #[test]
    fn test_poster_url() {
        assert_eq!(
            poster_url(Some("/a.jpg")),
            "https://image.tmdb.org/t/p/w342/a.jpg"
        );
        assert_eq!(poster_url(None), "/no-poster.png");
    }

    #[test]
    fn test_backdrop_url_fallbacks() {
        assert_eq!(
            backdrop_url(Some("/b.jpg"), Some("/p.jpg")),
            "https://image.tmdb.org/t/p/w1280/b.jpg"
        );
        assert_eq!(
            backdrop_url(None, Some("/p.jpg")),
            "https://image.tmdb.org/t/p/w780/p.jpg"
        );
        assert_eq!(backdrop_url(None, None), "/poster/picture1.jpg");
    }

    #[test]
    fn test_genre_names_takes_first_two_known() {
        assert_eq!(genre_names(&[99, 28, 878, 53], &genres()), "Action, Science Fiction");
        assert_eq!(genre_names(&[99], &genres()), "—");
        assert_eq!(genre_names(&[], &[]), "—");
    }

    #[test]
    fn test_card_defaults_for_sparse_item() {
        let state = LibraryState::default();
        let card = Card::new(&state, MediaKind::Series, &CatalogItem { id: 3, ..Default::default() });

        assert_eq!(card.identity, ItemIdentity::series(3));
        assert_eq!(card.title, "Untitled");
        assert_eq!(card.year, "N/A");
        assert_eq!(card.poster_url, "/no-poster.png");
        assert!(!card.watched && !card.favorite);
        assert!(!card.saving_watched && !card.saving_favorite);
        assert_eq!(card.toggle_item(), ToggleItem::new(ItemIdentity::series(3), "Untitled"));
    }

    #[test]
    fn test_hero_slides_limit_and_formatting() {
        let trending: Vec<CatalogItem> = (1..=7)
            .map(|id| CatalogItem {
                id,
                title: Some(format!("Movie {}", id)),
                vote_average: Some(7.26),
                genre_ids: vec![878],
                poster_path: Some("/p.jpg".to_string()),
                ..Default::default()
            })
            .collect();

        let slides = hero_slides(&trending, &genres());
        assert_eq!(slides.len(), 5);
        assert_eq!(slides[0].title, "Movie 1");
        assert_eq!(slides[0].genre, "Science Fiction");
        assert_eq!(slides[0].rating, "7.3");
        assert_eq!(slides[0].overview, "");
        assert_eq!(slides[0].backdrop_url, "https://image.tmdb.org/t/p/w780/p.jpg");
    }
}
