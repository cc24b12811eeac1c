use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

use super::meeting::{Meeting, MeetingStatus};
use super::registry::SessionRegistry;

/// Enforces the per-session recording ceiling.
///
/// Evaluated on every fragment admission rather than by a background timer,
/// so enforcement granularity equals the upload cadence and the core stays
/// stateless between calls.
pub struct DurationGuard;

impl DurationGuard {
    /// Reject admission once the elapsed time reaches the ceiling. The
    /// rejection force-completes the session (`Recording ->
    /// CompletedWithoutSummary`): recording stops, but a follow-up end call
    /// may still produce a summary.
    pub async fn check_admission(
        registry: &SessionRegistry,
        meeting: &Meeting,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let elapsed_minutes =
            now.signed_duration_since(meeting.started_at).num_seconds() as f64 / 60.0;

        if elapsed_minutes < meeting.max_duration_minutes as f64 {
            return Ok(());
        }

        info!(
            "session {} hit the {}-minute ceiling after {:.1} minutes, forcing completion",
            meeting.id, meeting.max_duration_minutes, elapsed_minutes
        );

        if let Err(e) = registry
            .transition(
                &meeting.id,
                &meeting.owner,
                MeetingStatus::Recording,
                MeetingStatus::CompletedWithoutSummary,
            )
            .await
        {
            // Lost a race with end-of-recording; the rejection still stands.
            warn!("forced completion of session {} skipped: {}", meeting.id, e);
        }

        Err(PipelineError::DurationExceeded {
            limit_minutes: meeting.max_duration_minutes,
        })
    }
}
