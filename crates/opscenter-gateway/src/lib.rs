//! # opscenter-gateway
//!
//! HTTP gateway for the SME Ops-Center: document upload, status, query and
//! indexing, allow-listed finance queries, a bucket smoke probe and audit
//! trail lookups.
//!
//! ## Routes
//!
//! | Method | Path | Audit module |
//! |--------|------|--------------|
//! | GET | `/` | system |
//! | GET | `/health` | system |
//! | POST | `/docs/upload` | docs |
//! | GET | `/docs/status` | docs |
//! | POST | `/docs/query` | docs |
//! | POST | `/docs/index` | docs |
//! | DELETE | `/docs/{doc_id}` | docs |
//! | POST | `/finance/query` | finance |
//! | GET | `/gcs/smoke` | admin |
//! | GET | `/audit/events` | admin |

pub mod context;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{delete, get, post};
use opscenter_core::ServerConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorKind, RequestFailure};
pub use state::{AppServices, AppState};

/// Routes only, without middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .route("/docs/upload", post(routes::docs::upload))
        .route("/docs/status", get(routes::docs::status))
        .route("/docs/query", post(routes::docs::query))
        .route("/docs/index", post(routes::docs::index))
        .route("/docs/{doc_id}", delete(routes::docs::delete))
        .route("/finance/query", post(routes::finance::query))
        .route("/gcs/smoke", get(routes::gcs::smoke))
        .route("/audit/events", get(routes::audit::events))
        .with_state(state)
}

/// The served application: routes plus tracing, CORS and the upload size limit.
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    router(state)
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors_layer(&server.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
