use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountId;
use crate::error::{PipelineError, Result};

/// Lifecycle state of a recording session.
///
/// The guard's forced stop lands on `CompletedWithoutSummary`, a distinct
/// terminal from `Completed`, so a follow-up end call can be told apart from
/// "already summarized".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Recording,
    Processing,
    Completed,
    CompletedWithoutSummary,
    Error,
}

impl MeetingStatus {
    /// Whether the state machine has an edge from `self` to `to`.
    ///
    /// `Completed` never regresses; `Error` and `CompletedWithoutSummary`
    /// re-enter `Processing` when the caller re-invokes end-of-recording.
    pub fn can_transition_to(self, to: MeetingStatus) -> bool {
        use MeetingStatus::*;
        matches!(
            (self, to),
            (Recording, Processing)
                | (Recording, CompletedWithoutSummary)
                | (Processing, Completed)
                | (Processing, Error)
                | (CompletedWithoutSummary, Processing)
                | (Error, Processing)
        )
    }

    /// Fragments are admitted only while recording.
    pub fn accepts_fragments(self) -> bool {
        matches!(self, MeetingStatus::Recording)
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MeetingStatus::Recording => "recording",
            MeetingStatus::Processing => "processing",
            MeetingStatus::Completed => "completed",
            MeetingStatus::CompletedWithoutSummary => "completed_without_summary",
            MeetingStatus::Error => "error",
        })
    }
}

/// One recording-to-summary unit of work.
#[derive(Debug, Clone, Serialize)]
pub struct Meeting {
    pub id: Uuid,

    /// Owning account; ownership is enforced on every read.
    pub owner: AccountId,

    pub title: String,

    /// Optional participant names, forwarded to the summarization engine.
    pub participants: Vec<String>,

    pub status: MeetingStatus,

    /// Recording ceiling in minutes, fixed at creation from the plan.
    pub max_duration_minutes: u32,

    /// Start of the duration window. Re-anchored exactly once by the first
    /// admitted fragment (see `clock_anchored`).
    pub started_at: DateTime<Utc>,

    /// Latch preventing a second re-anchor of `started_at`.
    pub clock_anchored: bool,

    /// Assembled transcript; durable even when a later step fails.
    pub transcript: Option<String>,

    /// Structured summary; set atomically with the `Completed` transition.
    pub summary: Option<String>,

    /// Whether this session already decremented the account's allotment.
    pub usage_counted: bool,

    /// Why the last processing run failed, if it did.
    pub error_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn new(
        owner: AccountId,
        title: &str,
        participants: Vec<String>,
        max_duration_minutes: u32,
    ) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(PipelineError::InvalidInput(
                "title must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            owner,
            title: title.to_string(),
            participants,
            status: MeetingStatus::Recording,
            max_duration_minutes,
            started_at: now,
            clock_anchored: false,
            transcript: None,
            summary: None,
            usage_counted: false,
            error_reason: None,
            created_at: now,
            updated_at: now,
        })
    }
}
