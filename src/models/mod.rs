use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod catalog;

pub use catalog::{CatalogItem, Genre, NamedEntity, Paged};

/// Title shown when neither the catalog nor the library knows a name
pub const UNTITLED: &str = "Untitled";

/// The two catalog domains sharing one library mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Movie, MediaKind::Series];

    /// Path segment of the list endpoint for this kind
    pub fn list_segment(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movies",
            MediaKind::Series => "series",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "Movie"),
            MediaKind::Series => write!(f, "Series"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Movie" => Ok(MediaKind::Movie),
            "Series" => Ok(MediaKind::Series),
            other => Err(format!("unknown media kind: {}", other)),
        }
    }
}

/// An independent membership set in the personal library
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Collection {
    Watched,
    Favorite,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Watched, Collection::Favorite];

    /// REST prefix for the collection's endpoints
    pub fn route_prefix(&self) -> &'static str {
        match self {
            Collection::Watched => "/watched",
            Collection::Favorite => "/favorites",
        }
    }

    /// Message returned when removing something that isn't there
    pub fn missing_detail(&self) -> &'static str {
        match self {
            Collection::Watched => "Not watched",
            Collection::Favorite => "Not favorite",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collection::Watched => write!(f, "Watched"),
            Collection::Favorite => write!(f, "Favorite"),
        }
    }
}

/// Composite identity of a catalog item, unique across both media kinds.
///
/// Renders as `"<kind>:<id>"`, which is the key used by the membership
/// maps and the invalidation tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemIdentity {
    pub kind: MediaKind,
    pub tmdb_id: i64,
}

impl ItemIdentity {
    pub fn new(kind: MediaKind, tmdb_id: i64) -> Self {
        Self { kind, tmdb_id }
    }

    pub fn movie(tmdb_id: i64) -> Self {
        Self::new(MediaKind::Movie, tmdb_id)
    }

    pub fn series(tmdb_id: i64) -> Self {
        Self::new(MediaKind::Series, tmdb_id)
    }
}

impl Display for ItemIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.tmdb_id)
    }
}

impl FromStr for ItemIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("identity must look like <kind>:<id>, got {}", s))?;
        let tmdb_id = id
            .parse::<i64>()
            .map_err(|e| format!("invalid id in {}: {}", s, e))?;
        Ok(Self::new(kind.parse()?, tmdb_id))
    }
}

/// A persisted membership row, as listed by the library store and posted to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    pub tmdb_id: i64,
    pub kind: MediaKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl LibraryRecord {
    pub fn identity(&self) -> ItemIdentity {
        ItemIdentity::new(self.kind, self.tmdb_id)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED)
    }
}

/// What a caller hands the controller when a card's toggle is pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleItem {
    pub identity: ItemIdentity,
    pub title: String,
    pub poster_path: Option<String>,
}

impl ToggleItem {
    pub fn new(identity: ItemIdentity, title: impl Into<String>) -> Self {
        Self {
            identity,
            title: title.into(),
            poster_path: None,
        }
    }

    pub fn with_poster(mut self, poster_path: impl Into<String>) -> Self {
        self.poster_path = Some(poster_path.into());
        self
    }

    /// Builds a toggle request from a catalog result of the given kind
    pub fn from_catalog(kind: MediaKind, item: &CatalogItem) -> Self {
        Self {
            identity: ItemIdentity::new(kind, item.id),
            title: item.display_title().to_string(),
            poster_path: item.poster_path.clone(),
        }
    }

    pub fn to_record(&self) -> LibraryRecord {
        LibraryRecord {
            tmdb_id: self.identity.tmdb_id,
            kind: self.identity.kind,
            title: Some(self.title.clone()),
            poster_path: self.poster_path.clone(),
        }
    }
}

/// Response to a successful add
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkResponse {
    pub tmdb_id: i64,
    pub kind: MediaKind,
}

impl MarkResponse {
    pub fn identity(&self) -> ItemIdentity {
        ItemIdentity::new(self.kind, self.tmdb_id)
    }
}

/// Response to a successful remove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub removed: bool,
}
