//! External engine contracts
//!
//! Transcription and summarization are external services; the pipeline only
//! depends on these traits. The HTTP implementations speak the
//! OpenAI-compatible wire format.

mod summarization;
mod transcription;

use async_trait::async_trait;

use crate::error::EngineError;

pub use summarization::HttpSummarizationEngine;
pub use transcription::HttpTranscriptionEngine;

/// Contract the pipeline expects from the speech-to-text service: one audio
/// fragment in, its transcript out.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    async fn transcribe(
        &self,
        audio: &[u8],
        content_type: &str,
    ) -> std::result::Result<String, EngineError>;
}

/// Contract the pipeline expects from the summarization service.
#[async_trait]
pub trait SummarizationEngine: Send + Sync {
    async fn summarize(
        &self,
        transcript: &str,
        participants: &[String],
    ) -> std::result::Result<String, EngineError>;
}
