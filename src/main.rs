use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movieworld::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, run_migrations, InMemoryRepository, LibraryRepository, PostgresRepository},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movieworld=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let repository: Arc<dyn LibraryRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url)
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Using PostgreSQL library store");
            Arc::new(PostgresRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, library store is in-memory");
            Arc::new(InMemoryRepository::new())
        }
    };

    let app = create_router(AppState::new(repository), &config);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Library store listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
