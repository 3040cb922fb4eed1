use anyhow::Context;
use tracing::info;

use ragapi_core::config::Settings;
use ragapi_server::{init_tracing, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = Settings::load().context("loading settings")?;
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::from_settings(settings)?;
    info!(
        docs = %state.settings().docs_root().display(),
        collection = %state.settings().vector.collection,
        "rag api configured"
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.with_context(|| format!("binding {bind_addr}"))?;
    info!("listening on {bind_addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await?;
    Ok(())
}
