use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::account::AccountRef;
use crate::error::{PipelineError, Result};
use crate::session::{DurationGuard, Fragment, MeetingStatus, SessionRegistry};

use super::store::FragmentStore;
use super::tracker::UploadTracker;

/// Validates and admits incoming audio fragments.
///
/// Preconditions run in order and fail fast with no partial side effects:
/// a fragment is either fully admitted (blob stored, row recorded) or not
/// admitted at all. Concurrent admissions for different sequence numbers of
/// the same session only share the registry's brief critical sections.
pub struct FragmentIngester {
    registry: SessionRegistry,
    store: Arc<dyn FragmentStore>,
    tracker: UploadTracker,
    max_fragment_bytes: usize,
}

impl FragmentIngester {
    pub fn new(
        registry: SessionRegistry,
        store: Arc<dyn FragmentStore>,
        tracker: UploadTracker,
        max_fragment_bytes: usize,
    ) -> Self {
        Self {
            registry,
            store,
            tracker,
            max_fragment_bytes,
        }
    }

    pub async fn admit(
        &self,
        session_id: Uuid,
        account: &AccountRef,
        sequence: u64,
        audio_bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<Fragment> {
        // Held for the whole admission so end-of-recording can wait for
        // uploads that already passed their checks.
        let _in_flight = self.tracker.begin(session_id).await;

        let meeting = self.registry.get(&session_id, &account.id).await?;

        if !content_type.starts_with("audio/") {
            return Err(PipelineError::InvalidInput(format!(
                "unsupported content type: {content_type}"
            )));
        }

        if audio_bytes.is_empty() {
            return Err(PipelineError::InvalidInput(
                "fragment payload is empty".to_string(),
            ));
        }
        if audio_bytes.len() > self.max_fragment_bytes {
            return Err(PipelineError::InvalidInput(format!(
                "fragment is {} bytes, ceiling is {}",
                audio_bytes.len(),
                self.max_fragment_bytes
            )));
        }

        if !meeting.status.accepts_fragments() {
            return Err(PipelineError::InvalidStateTransition {
                from: meeting.status,
                to: MeetingStatus::Recording,
            });
        }

        // The first admitted fragment re-anchors the duration window, so the
        // guard below measures from actual recording start, not session
        // creation. The latch makes this a no-op for every later fragment.
        let meeting = self.registry.anchor_started_at_once(&session_id).await?;

        DurationGuard::check_admission(&self.registry, &meeting, Utc::now()).await?;

        self.registry
            .ensure_sequence_available(&session_id, sequence)
            .await?;

        // Blob write happens outside any session lock.
        let storage_ref = self
            .store
            .put(session_id, sequence, content_type, &audio_bytes)
            .await?;

        let fragment = Fragment::new(
            session_id,
            sequence,
            storage_ref.clone(),
            content_type,
            audio_bytes.len(),
        );

        match self
            .registry
            .record_fragment(&session_id, &account.id, fragment)
            .await
        {
            Ok(fragment) => {
                info!(
                    "admitted fragment {} of session {} ({} bytes)",
                    sequence, session_id, fragment.size_bytes
                );
                Ok(fragment)
            }
            Err(e) => {
                // Lost a duplicate-sequence race after storing; drop the
                // orphan blob before surfacing the error.
                if let Err(del) = self.store.delete(&storage_ref).await {
                    warn!("failed to delete orphan blob {}: {}", storage_ref.as_str(), del);
                }
                Err(e)
            }
        }
    }
}
