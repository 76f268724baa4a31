use anyhow::Context;

use docqa_cli::{logging, server};
use docqa_core::config::Config;
use docqa_rag::Assistant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("info");
    let loaded = Config::load()?;
    let config = loaded.app()?;
    tracing::info!(env = loaded.env_name(), "configuration loaded");

    let assistant = Assistant::from_config(&config).await?;
    let state = server::AppState::new(assistant);

    if config.server.auto_ingest {
        match state.ingest().await {
            Ok(summary) => tracing::info!(
                documents = summary.documents_processed,
                chunks = summary.chunks_created,
                failed = summary.failures.len(),
                "auto-ingest complete"
            ),
            Err(e) => tracing::warn!(error = %e, "auto-ingest failed; starting with the existing index"),
        }
    }

    let app = server::router(state, &config.server.cors_origins);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding {}", addr))?;
    tracing::info!(%addr, "docqa-server listening");
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
