use axum::{
    http::{HeaderValue, Method},
    routing, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

pub fn app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", routing::get(handlers::index))
        .route("/health", routing::get(handlers::health))
        .route(
            "/attendees",
            routing::get(handlers::get_attendees).put(handlers::put_attendees),
        )
        .route("/attendees/refresh", routing::post(handlers::refresh_attendees))
        .route(
            "/groups",
            routing::get(handlers::get_groups).put(handlers::put_groups),
        )
        .route("/groups/shuffle", routing::post(handlers::shuffle_groups))
        .route("/groups/swap", routing::post(handlers::swap_members))
        .with_state(state)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    // 沒有設定來源時全部允許
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            // 瀏覽器送出的 Origin 不帶結尾斜線
            let trimmed = origin.trim_end_matches('/');
            if trimmed.len() != origin.len() {
                tracing::warn!("CORS origin '{}' has a trailing slash, using '{}'", origin, trimmed);
            }
            match HeaderValue::from_str(trimmed) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                    None
                }
            }
        })
        .collect();
    layer.allow_origin(origins)
}
