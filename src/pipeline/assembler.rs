use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::engines::TranscriptionEngine;
use crate::error::Result;
use crate::ingest::FragmentStore;
use crate::session::{FragmentStatus, SessionRegistry};

/// Outcome of one assembly pass over a session's fragments.
#[derive(Debug, Clone)]
pub struct AssembledTranscript {
    /// Transcribed fragment texts joined in sequence order.
    pub text: String,
    pub transcribed: usize,
    pub failed: usize,
}

/// Orders admitted fragments by sequence number and turns them into one
/// transcript.
///
/// Assembly order is sequence-number order, never arrival order; that is
/// the guarantee that makes concurrent, reordered uploads safe. A fragment
/// whose transcription fails is marked `Error` and skipped; it leaves a gap
/// in the transcript but does not abort assembly.
pub struct TranscriptAssembler {
    registry: SessionRegistry,
    store: Arc<dyn FragmentStore>,
    engine: Arc<dyn TranscriptionEngine>,
}

impl TranscriptAssembler {
    pub fn new(
        registry: SessionRegistry,
        store: Arc<dyn FragmentStore>,
        engine: Arc<dyn TranscriptionEngine>,
    ) -> Self {
        Self {
            registry,
            store,
            engine,
        }
    }

    pub async fn assemble(&self, session_id: Uuid) -> Result<AssembledTranscript> {
        let fragments = self.registry.fragments_sorted(&session_id).await?;

        let mut parts: Vec<String> = Vec::new();
        let mut transcribed = 0;
        let mut failed = 0;

        for fragment in fragments {
            match fragment.status {
                FragmentStatus::Uploaded => {}
                FragmentStatus::Transcribed => {
                    // Already transcribed on an earlier run; reuse the stored
                    // text so a retry does not start from nothing.
                    if let Some(text) = fragment.transcript_text {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            parts.push(trimmed.to_string());
                        }
                    }
                    transcribed += 1;
                    continue;
                }
                FragmentStatus::Error => {
                    failed += 1;
                    continue;
                }
            }

            let bytes = match self.store.get(&fragment.storage_ref).await {
                Ok(bytes) if !bytes.is_empty() => bytes,
                Ok(_) => {
                    warn!(
                        "fragment {} of session {} has an empty blob",
                        fragment.sequence, session_id
                    );
                    self.registry
                        .mark_fragment_error(&session_id, fragment.sequence)
                        .await?;
                    failed += 1;
                    continue;
                }
                Err(e) => {
                    warn!(
                        "failed to load fragment {} of session {}: {}",
                        fragment.sequence, session_id, e
                    );
                    self.registry
                        .mark_fragment_error(&session_id, fragment.sequence)
                        .await?;
                    failed += 1;
                    continue;
                }
            };

            match self.engine.transcribe(&bytes, &fragment.content_type).await {
                Ok(text) => {
                    debug!(
                        "transcribed fragment {} of session {} ({} chars)",
                        fragment.sequence,
                        session_id,
                        text.len()
                    );
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        parts.push(trimmed.to_string());
                    }
                    self.registry
                        .mark_fragment_transcribed(&session_id, fragment.sequence, text)
                        .await?;
                    transcribed += 1;
                }
                Err(e) => {
                    warn!(
                        "transcription failed for fragment {} of session {}: {}",
                        fragment.sequence, session_id, e
                    );
                    self.registry
                        .mark_fragment_error(&session_id, fragment.sequence)
                        .await?;
                    failed += 1;
                }
            }
        }

        Ok(AssembledTranscript {
            text: parts.join("\n"),
            transcribed,
            failed,
        })
    }
}
