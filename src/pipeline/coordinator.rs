use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::account::AccountRef;
use crate::billing::UsageMeter;
use crate::engines::SummarizationEngine;
use crate::error::{PipelineError, Result};
use crate::ingest::UploadTracker;
use crate::session::{Meeting, MeetingStatus, SessionRegistry};

use super::assembler::TranscriptAssembler;

/// Single-flight orchestrator for end-of-recording.
///
/// The `Recording -> Processing` compare-and-set is the whole single-flight
/// mechanism: no external mutex, so a coordinator that dies mid-run leaves
/// an observable `Processing` status rather than a silently held lock.
pub struct ProcessingCoordinator {
    registry: SessionRegistry,
    assembler: TranscriptAssembler,
    summarizer: Arc<dyn SummarizationEngine>,
    usage: Arc<dyn UsageMeter>,
    tracker: UploadTracker,
    upload_barrier: Duration,
}

impl ProcessingCoordinator {
    pub fn new(
        registry: SessionRegistry,
        assembler: TranscriptAssembler,
        summarizer: Arc<dyn SummarizationEngine>,
        usage: Arc<dyn UsageMeter>,
        tracker: UploadTracker,
        upload_barrier: Duration,
    ) -> Self {
        Self {
            registry,
            assembler,
            summarizer,
            usage,
            tracker,
            upload_barrier,
        }
    }

    /// Run the processing pipeline for a session.
    ///
    /// Accepted from `Recording`, `CompletedWithoutSummary` (forced stop,
    /// summary still owed) and `Error` (caller retry). Idempotent no-op on
    /// `Completed`. A concurrent caller loses the compare-and-set and gets
    /// `InvalidStateTransition`.
    pub async fn run(&self, session_id: Uuid, account: &AccountRef) -> Result<Meeting> {
        let meeting = self.registry.get(&session_id, &account.id).await?;

        if meeting.status == MeetingStatus::Completed {
            info!("session {} already summarized, end is a no-op", session_id);
            return Ok(meeting);
        }

        let meeting = self
            .registry
            .transition(
                &session_id,
                &account.id,
                meeting.status,
                MeetingStatus::Processing,
            )
            .await?;

        // New admissions are shut out by the transition above; wait for the
        // ones already past their checks to land durably.
        if !self.tracker.wait_idle(session_id, self.upload_barrier).await {
            warn!(
                "session {} still has uploads in flight after {:?}, proceeding with what landed",
                session_id, self.upload_barrier
            );
        }

        let assembled = match self.assembler.assemble(session_id).await {
            Ok(assembled) => assembled,
            Err(e) => {
                self.registry.set_error(&session_id, &e.to_string()).await?;
                return Err(e);
            }
        };

        if assembled.text.trim().is_empty() {
            // Explicit failure: the summarizer is never fed empty input and
            // no placeholder summary is fabricated.
            self.registry
                .set_error(&session_id, "no transcribable audio")
                .await?;
            return Err(PipelineError::EmptyTranscript);
        }

        // Durable from here on, whatever happens to summarization.
        self.registry
            .set_transcript(&session_id, assembled.text.clone())
            .await?;

        let summary = match self
            .summarizer
            .summarize(&assembled.text, &meeting.participants)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                self.registry.set_error(&session_id, &e.to_string()).await?;
                return Err(PipelineError::Engine(e));
            }
        };

        let meeting = self
            .registry
            .set_summary_and_complete(&session_id, summary)
            .await?;

        if self.registry.try_mark_usage_counted(&session_id).await? {
            if let Err(e) = self.usage.record_completed_session(&meeting.owner).await {
                warn!("usage metering failed for {}: {}", meeting.owner, e);
            }
        }

        info!(
            "session {} completed: {} fragments transcribed, {} failed",
            session_id, assembled.transcribed, assembled.failed
        );

        Ok(meeting)
    }
}
