use std::sync::Arc;

use crate::db::{InMemoryRepository, LibraryRepository};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn LibraryRepository>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }
}

impl AppState {
    pub fn new(repository: Arc<dyn LibraryRepository>) -> Self {
        Self { repository }
    }
}
