pub mod postgres;
pub mod repository;

pub use postgres::{create_pool, run_migrations, PostgresRepository};
pub use repository::{InMemoryRepository, LibraryRepository};
