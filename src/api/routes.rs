use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
    Extension, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    middleware::{make_span_with_request_id, request_id_middleware},
    models::Collection,
};

use super::handlers;
use super::AppState;

/// Creates the library store router
pub fn create_router(state: AppState, config: &Config) -> Router {
    Collection::ALL
        .into_iter()
        .fold(
            Router::new().route("/health", get(handlers::health_check)),
            |router, collection| router.merge(collection_routes(collection)),
        )
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// The four endpoints of one collection
fn collection_routes(collection: Collection) -> Router<AppState> {
    let prefix = collection.route_prefix();
    Router::new()
        .route(prefix, post(handlers::add_item))
        .route(&format!("{}/movies", prefix), get(handlers::list_movies))
        .route(&format!("{}/series", prefix), get(handlers::list_series))
        .route(&format!("{}/:kind/:tmdb_id", prefix), delete(handlers::remove_item))
        .layer(Extension(collection))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
