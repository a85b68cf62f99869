//! JSON HTTP API over the extractor and the download orchestrator

pub mod error;
pub mod handlers;
pub mod responses;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::build_router;
pub use state::AppState;

use tokio::net::TcpListener;

/// Bind the listening socket. `host` may be a hostname such as `localhost`
/// or a bare IPv4/IPv6 address.
pub async fn bind_listener(host: &str, port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((host, port)).await
}
