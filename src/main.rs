use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use meeting_minutes::{
    create_router, AppState, Config, FsDocumentExporter, FsFragmentStore, HttpSummarizationEngine,
    HttpTranscriptionEngine, InMemoryUsageMeter,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "meeting-minutes", about = "Meeting recording and summarization service")]
struct Args {
    /// Config file to load (extension optional)
    #[arg(long, default_value = "config/meeting-minutes")]
    config: String,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} v0.1.0", cfg.service.name);

    let store = Arc::new(FsFragmentStore::new(&cfg.storage.fragments_path).await?);
    let exporter = Arc::new(FsDocumentExporter::new(&cfg.storage.exports_path).await?);
    let transcriber = Arc::new(HttpTranscriptionEngine::new(&cfg.engines.transcription));
    let summarizer = Arc::new(HttpSummarizationEngine::new(&cfg.engines.summarization));
    let usage = Arc::new(InMemoryUsageMeter::new());

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(cfg, store, transcriber, summarizer, exporter, usage);
    let router = create_router(state);

    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
