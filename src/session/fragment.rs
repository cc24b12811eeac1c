use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque reference to a fragment blob, issued by the fragment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRef(String);

impl StorageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-fragment state, independent of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentStatus {
    Uploaded,
    Transcribed,
    Error,
}

/// One admitted unit of uploaded audio, identified within its session by a
/// caller-supplied sequence number.
#[derive(Debug, Clone, Serialize)]
pub struct Fragment {
    pub id: Uuid,
    pub session_id: Uuid,

    /// Caller-supplied ordering key; unique per session, not required to be
    /// contiguous or gap-free.
    pub sequence: u64,

    pub status: FragmentStatus,
    pub storage_ref: StorageRef,
    pub content_type: String,
    pub size_bytes: usize,

    /// Transcription result, filled during assembly.
    pub transcript_text: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Fragment {
    pub fn new(
        session_id: Uuid,
        sequence: u64,
        storage_ref: StorageRef,
        content_type: &str,
        size_bytes: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            sequence,
            status: FragmentStatus::Uploaded,
            storage_ref,
            content_type: content_type.to_string(),
            size_bytes,
            transcript_text: None,
            created_at: Utc::now(),
        }
    }
}
