use std::sync::Arc;
use std::time::Duration;

use crate::billing::UsageMeter;
use crate::config::Config;
use crate::engines::{SummarizationEngine, TranscriptionEngine};
use crate::export::{DocumentExporter, ExportBridge};
use crate::ingest::{FragmentIngester, FragmentStore, UploadTracker};
use crate::pipeline::{ProcessingCoordinator, TranscriptAssembler};
use crate::session::SessionRegistry;

/// Shared application state for HTTP handlers. Wires the pipeline
/// components around one registry and one upload tracker.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: SessionRegistry,
    pub tracker: UploadTracker,
    pub store: Arc<dyn FragmentStore>,
    pub ingester: Arc<FragmentIngester>,
    pub coordinator: Arc<ProcessingCoordinator>,
    pub export: Arc<ExportBridge>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn FragmentStore>,
        transcriber: Arc<dyn TranscriptionEngine>,
        summarizer: Arc<dyn SummarizationEngine>,
        exporter: Arc<dyn DocumentExporter>,
        usage: Arc<dyn UsageMeter>,
    ) -> Self {
        let registry = SessionRegistry::new();
        let tracker = UploadTracker::new();

        let ingester = FragmentIngester::new(
            registry.clone(),
            Arc::clone(&store),
            tracker.clone(),
            config.limits.max_fragment_bytes,
        );

        let assembler = TranscriptAssembler::new(registry.clone(), Arc::clone(&store), transcriber);

        let coordinator = ProcessingCoordinator::new(
            registry.clone(),
            assembler,
            summarizer,
            usage,
            tracker.clone(),
            Duration::from_secs(config.limits.upload_barrier_secs),
        );

        let export = ExportBridge::new(registry.clone(), exporter);

        Self {
            config: Arc::new(config),
            registry,
            tracker,
            store,
            ingester: Arc::new(ingester),
            coordinator: Arc::new(coordinator),
            export: Arc::new(export),
        }
    }
}
