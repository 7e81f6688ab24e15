use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::aggregator::Aggregator;
use crate::cli::config::Config;
use crate::cli::ServeArgs;
use crate::holder::HolderClient;
use crate::native::build_router;
use crate::registry::QueryRegistry;

pub async fn execute_serve(args: ServeArgs) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_args(&args);
    config.validate()?;

    let holder = HolderClient::new(config.holder_timeout())
        .map_err(|e| anyhow!(e))?
        .with_retry(config.retry_config());

    let registry = QueryRegistry::builtin();
    info!(query_types = ?registry.tags(), "query types registered");

    let aggregator =
        Aggregator::new(registry, holder).with_holder_timeout(config.session_timeout());
    let app = build_router(Arc::new(aggregator));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(
        %addr,
        holder_timeout_secs = config.holder_timeout_secs,
        holder_attempts = config.holder_attempts,
        "query aggregator listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("query aggregator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
