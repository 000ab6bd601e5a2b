use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{Collection, ItemIdentity, LibraryRecord, MediaKind},
};

use super::LibraryRepository;

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the migrations under `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct LibraryRow {
    tmdb_id: i64,
    kind: String,
    title: Option<String>,
    poster_path: Option<String>,
}

impl TryFrom<LibraryRow> for LibraryRecord {
    type Error = AppError;

    fn try_from(row: LibraryRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse::<MediaKind>().map_err(AppError::Internal)?;
        Ok(LibraryRecord {
            tmdb_id: row.tmdb_id,
            kind,
            title: row.title,
            poster_path: row.poster_path,
        })
    }
}

/// Library rows stored in the `library_items` table
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LibraryRepository for PostgresRepository {
    async fn list(&self, collection: Collection, kind: MediaKind) -> AppResult<Vec<LibraryRecord>> {
        let rows: Vec<LibraryRow> = sqlx::query_as(
            r#"
            SELECT tmdb_id, kind, title, poster_path
            FROM library_items
            WHERE collection = $1 AND kind = $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(collection.to_string())
        .bind(kind.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LibraryRecord::try_from).collect()
    }

    async fn add(&self, collection: Collection, record: LibraryRecord) -> AppResult<LibraryRecord> {
        sqlx::query(
            r#"
            INSERT INTO library_items (collection, tmdb_id, kind, title, poster_path)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (collection, kind, tmdb_id) DO NOTHING
            "#,
        )
        .bind(collection.to_string())
        .bind(record.tmdb_id)
        .bind(record.kind.to_string())
        .bind(&record.title)
        .bind(&record.poster_path)
        .execute(&self.pool)
        .await?;

        let row: LibraryRow = sqlx::query_as(
            r#"
            SELECT tmdb_id, kind, title, poster_path
            FROM library_items
            WHERE collection = $1 AND kind = $2 AND tmdb_id = $3
            "#,
        )
        .bind(collection.to_string())
        .bind(record.kind.to_string())
        .bind(record.tmdb_id)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn remove(&self, collection: Collection, identity: ItemIdentity) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM library_items
            WHERE collection = $1 AND kind = $2 AND tmdb_id = $3
            "#,
        )
        .bind(collection.to_string())
        .bind(identity.kind.to_string())
        .bind(identity.tmdb_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
