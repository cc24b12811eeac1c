//! Shared test harness: the full pipeline wired over a temp-dir blob store
//! with scripted engines instead of live HTTP services.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use meeting_minutes::{
    AccountRef, EngineError, Fragment, FragmentIngester, FragmentStore, FsFragmentStore,
    InMemoryUsageMeter, Plan, PipelineError, ProcessingCoordinator, SessionRegistry,
    SummarizationEngine, TranscriptAssembler, TranscriptionEngine, UploadTracker,
};
use tempfile::TempDir;
use uuid::Uuid;

/// Transcribes a fragment to its UTF-8 payload. Payloads containing the
/// `<fail>` marker error out like a broken engine call.
pub struct EchoTranscriber {
    pub calls: AtomicUsize,
}

impl EchoTranscriber {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionEngine for EchoTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        _content_type: &str,
    ) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = String::from_utf8_lossy(audio).to_string();
        if text.contains("<fail>") {
            return Err(EngineError::Http {
                status: 500,
                message: "scripted transcription failure".to_string(),
            });
        }
        Ok(text)
    }
}

/// Summarizer that counts invocations, optionally fails the first N calls,
/// and optionally sleeps to widen race windows.
pub struct ScriptedSummarizer {
    pub calls: AtomicUsize,
    failures_remaining: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures_remaining: AtomicUsize::new(failures),
            ..Self::new()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummarizationEngine for ScriptedSummarizer {
    async fn summarize(
        &self,
        transcript: &str,
        _participants: &[String],
    ) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(EngineError::Http {
                status: 503,
                message: "scripted summarization failure".to_string(),
            });
        }

        Ok(format!("summary: {transcript}"))
    }
}

pub struct Pipeline {
    pub registry: SessionRegistry,
    pub tracker: UploadTracker,
    pub store: Arc<dyn FragmentStore>,
    pub ingester: FragmentIngester,
    pub coordinator: ProcessingCoordinator,
    pub transcriber: Arc<EchoTranscriber>,
    pub summarizer: Arc<ScriptedSummarizer>,
    pub usage: Arc<InMemoryUsageMeter>,
    _blob_dir: TempDir,
}

pub async fn pipeline() -> Pipeline {
    pipeline_custom(ScriptedSummarizer::new(), Duration::from_secs(5)).await
}

pub async fn pipeline_with(summarizer: ScriptedSummarizer) -> Pipeline {
    pipeline_custom(summarizer, Duration::from_secs(5)).await
}

pub async fn pipeline_custom(summarizer: ScriptedSummarizer, upload_barrier: Duration) -> Pipeline {
    let blob_dir = TempDir::new().expect("create temp dir");
    let store: Arc<dyn FragmentStore> = Arc::new(
        FsFragmentStore::new(blob_dir.path())
            .await
            .expect("create fragment store"),
    );

    let registry = SessionRegistry::new();
    let tracker = UploadTracker::new();
    let transcriber = Arc::new(EchoTranscriber::new());
    let summarizer = Arc::new(summarizer);
    let usage = Arc::new(InMemoryUsageMeter::new());

    let ingester = FragmentIngester::new(
        registry.clone(),
        Arc::clone(&store),
        tracker.clone(),
        1024 * 1024,
    );

    let transcriber_dyn: Arc<dyn TranscriptionEngine> = transcriber.clone();
    let assembler = TranscriptAssembler::new(registry.clone(), Arc::clone(&store), transcriber_dyn);

    let coordinator = ProcessingCoordinator::new(
        registry.clone(),
        assembler,
        summarizer.clone(),
        usage.clone(),
        tracker.clone(),
        upload_barrier,
    );

    Pipeline {
        registry,
        tracker,
        store,
        ingester,
        coordinator,
        transcriber,
        summarizer,
        usage,
        _blob_dir: blob_dir,
    }
}

pub fn free_account(id: &str) -> AccountRef {
    AccountRef::new(id, Plan::Free)
}

pub fn premium_account(id: &str) -> AccountRef {
    AccountRef::new(id, Plan::Premium)
}

/// Upload a text payload as an audio fragment; the echo transcriber turns it
/// straight back into transcript text.
pub async fn upload(
    pipeline: &Pipeline,
    session_id: Uuid,
    account: &AccountRef,
    sequence: u64,
    text: &str,
) -> Result<Fragment, PipelineError> {
    pipeline
        .ingester
        .admit(
            session_id,
            account,
            sequence,
            text.as_bytes().to_vec(),
            "audio/webm",
        )
        .await
}
