//! BON rewards node.
//!
//! Users pay bills; paying a fixed number of bills on time in a row earns a
//! reward. The node exposes this over HTTP on top of a pluggable [`Store`].

pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod store;

use std::future::Future;

use tokio::net::TcpListener;

pub use service::RewardService;
pub use store::{MemoryStore, PgStore, Store};

/// Serve the HTTP API on `listener` until `shutdown` resolves.
pub async fn serve<S: Store>(
    listener: TcpListener,
    service: RewardService<S>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = api::router(service);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
