/// Remote library store access
///
/// The store is the source of truth for watched/favorite membership. Every
/// collection exposes the same four endpoints:
/// 1. `GET {prefix}/movies` and `GET {prefix}/series` list the members
/// 2. `POST {prefix}` adds an item (idempotent on the server)
/// 3. `DELETE {prefix}/{kind}/{tmdb_id}` removes one
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Collection, ItemIdentity, LibraryRecord, MarkResponse, MediaKind, RemoveResponse},
};

/// Trait over the remote library store
///
/// Implementations report transport failures and non-success responses as
/// errors; the reconciliation controller decides what to do with them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LibraryStore: Send + Sync {
    /// List every member of `collection` of the given kind, newest first
    async fn list(&self, collection: Collection, kind: MediaKind) -> AppResult<Vec<LibraryRecord>>;

    /// Add an item to `collection`
    async fn add(&self, collection: Collection, record: LibraryRecord) -> AppResult<MarkResponse>;

    /// Remove an item from `collection`
    async fn remove(
        &self,
        collection: Collection,
        identity: ItemIdentity,
    ) -> AppResult<RemoveResponse>;
}

/// `LibraryStore` over HTTP
#[derive(Clone)]
pub struct HttpLibraryStore {
    http_client: HttpClient,
    api_url: String,
}

impl HttpLibraryStore {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(HttpClient::new(), api_url)
    }

    pub fn with_client(http_client: HttpClient, api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.library_api_url.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl LibraryStore for HttpLibraryStore {
    async fn list(&self, collection: Collection, kind: MediaKind) -> AppResult<Vec<LibraryRecord>> {
        let url = self.url(&format!(
            "{}/{}",
            collection.route_prefix(),
            kind.list_segment()
        ));

        let response = self.http_client.get(&url).send().await?;
        let records: Vec<LibraryRecord> = Self::handle_response(response).await?;

        tracing::debug!(
            collection = %collection,
            kind = %kind,
            count = records.len(),
            "Library list fetched"
        );

        Ok(records)
    }

    async fn add(&self, collection: Collection, record: LibraryRecord) -> AppResult<MarkResponse> {
        let url = self.url(collection.route_prefix());
        let identity = record.identity();
        let response = self.http_client.post(&url).json(&record).send().await?;
        let marked: MarkResponse = Self::handle_response(response).await?;

        if marked.identity() != identity {
            return Err(AppError::Internal(format!(
                "Library store confirmed {} for {}",
                marked.identity(),
                identity
            )));
        }

        Ok(marked)
    }

    async fn remove(
        &self,
        collection: Collection,
        identity: ItemIdentity,
    ) -> AppResult<RemoveResponse> {
        let url = self.url(&format!(
            "{}/{}/{}",
            collection.route_prefix(),
            identity.kind,
            identity.tmdb_id
        ));
        let response = self.http_client.delete(&url).send().await?;
        Self::handle_response(response).await
    }
}
