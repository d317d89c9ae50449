use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use bon_node::config::Cli;
use bon_node::{MemoryStore, PgStore, RewardService, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.database_url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(url, cli.pool_size)
                .await
                .context("could not initialize PostgreSQL store")?;
            tracing::info!("connected to the database");
            run(store, &cli).await
        }
        None => {
            tracing::warn!("no DATABASE_URL given, state is kept in memory only");
            run(MemoryStore::new(), &cli).await
        }
    }
}

async fn run<S: Store>(store: S, cli: &Cli) -> anyhow::Result<()> {
    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    tracing::info!(
        addr = %cli.listen,
        store = store.backend_name(),
        "BON reward service listening"
    );

    let service = RewardService::new(Arc::new(store));
    bon_node::serve(listener, service, shutdown_signal())
        .await
        .context("server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
