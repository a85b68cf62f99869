//! Application router builder.
//!
//! Used by both the binary and the integration tests so they exercise the
//! same middleware stack.

use axum::extract::Request;
use axum::http::{HeaderName, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::downloader::PUBLIC_PREFIX;
use crate::server::handlers;
use crate::server::state::AppState;

/// Build the full application [`Router`].
///
/// Middleware, outermost first:
///
/// 1. CORS (any origin)
/// 2. Set request ID on incoming requests
/// 3. Request/response tracing
/// 4. Propagate request ID to response
/// 5. Request timeout
/// 6. Panic recovery
pub fn build_router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    let downloads: Router = Router::new()
        .fallback_service(ServeDir::new(&state.settings.downloads_dir))
        .layer(middleware::from_fn(hide_dot_segments));
    let request_timeout = state.settings.request_timeout();

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/info", post(handlers::info))
        .route("/api/download", post(handlers::download))
        .route("/api/download-audio", post(handlers::download_audio))
        .route("/api/resolve", post(handlers::resolve))
        .route("/api/direct-download", get(handlers::direct_download))
        .route("/api/{platform}", post(handlers::platform_download))
        .nest_service(PUBLIC_PREFIX, downloads)
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(build_cors_layer())
        .with_state(state)
}

/// 404 for any path segment starting with a dot. Keeps the staging
/// directory, where files are still being written, off the static route.
async fn hide_dot_segments(request: Request, next: Next) -> Response {
    let hidden = request.uri().path().split('/').any(|segment| {
        urlencoding::decode(segment)
            .map(|decoded| decoded.starts_with('.'))
            .unwrap_or(true)
    });
    if hidden {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

/// Permissive CORS: the API is meant to be called from any web frontend.
pub fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
