//! One ingestion pass without the HTTP server.
//!
//! Usage: `ragapi-ingest [DOCS_DIR]`. Relative paths resolve against the
//! current directory; without an argument the configured `ingest.docs_dir` is used.

use std::env;

use anyhow::Context;

use ragapi_core::config::{resolve_with_base, Settings};
use ragapi_server::{init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = Settings::load().context("loading settings")?;
    let root = match env::args().nth(1) {
        Some(arg) => resolve_with_base(&env::current_dir()?, arg),
        None => settings.docs_root(),
    };

    let state = AppState::from_settings(settings)?;
    println!("Ingesting {} into collection '{}'", root.display(), state.settings().vector.collection);
    let report = state.ingestion()?.ingest(&root).await?;
    println!("files_indexed: {}", report.files_indexed);
    println!("chunks_indexed: {}", report.chunks_indexed);
    Ok(())
}
