pub mod account;
pub mod billing;
pub mod config;
pub mod engines;
pub mod error;
pub mod export;
pub mod http;
pub mod ingest;
pub mod pipeline;
pub mod session;

pub use account::{AccountId, AccountRef, Plan};
pub use billing::{InMemoryUsageMeter, UsageMeter};
pub use config::Config;
pub use engines::{
    HttpSummarizationEngine, HttpTranscriptionEngine, SummarizationEngine, TranscriptionEngine,
};
pub use error::{EngineError, PipelineError};
pub use export::{
    DocumentExporter, ExportBridge, ExportFormat, ExportedDocument, FsDocumentExporter,
};
pub use http::{create_router, AppState};
pub use ingest::{FragmentIngester, FragmentStore, FsFragmentStore, UploadTracker};
pub use pipeline::{AssembledTranscript, ProcessingCoordinator, TranscriptAssembler};
pub use session::{
    DurationGuard, Fragment, FragmentStatus, Meeting, MeetingStatus, SessionRegistry, StorageRef,
};
