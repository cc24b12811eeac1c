use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::state::AppState;
use crate::account::{AccountRef, Plan};
use crate::error::PipelineError;
use crate::export::{ExportFormat, ExportedDocument};
use crate::session::{FragmentStatus, Meeting, MeetingStatus};

// ============================================================================
// Identity extraction
// ============================================================================

/// The auth collaborator terminates upstream; by the time a request reaches
/// this service it carries a verified account id and entitlement flag in
/// headers. Missing or malformed headers are a 401, not a guess.
#[async_trait]
impl<S> FromRequestParts<S> for AccountRef
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account_id = parts
            .headers
            .get("x-account-id")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty());

        let plan = parts
            .headers
            .get("x-plan")
            .and_then(|value| value.to_str().ok())
            .and_then(Plan::parse);

        match (account_id, plan) {
            (Some(id), Some(plan)) => Ok(AccountRef::new(id, plan)),
            _ => Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "unauthorized".to_string(),
                    message: "missing or invalid identity headers".to_string(),
                }),
            )
                .into_response()),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRecordingRequest {
    pub title: String,

    /// Optional participant names, forwarded to the summarizer.
    pub participants: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub session_id: Uuid,
    pub status: MeetingStatus,
    pub max_duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
pub struct UploadFragmentRequest {
    pub sequence_number: u64,

    /// Base64-encoded audio bytes.
    pub audio_bytes: String,

    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct UploadFragmentResponse {
    pub fragment_id: Uuid,
    pub sequence_number: u64,
    pub status: FragmentStatus,
}

#[derive(Debug, Serialize)]
pub struct EndRecordingResponse {
    pub session_id: Uuid,
    pub status: MeetingStatus,
}

#[derive(Debug, Serialize)]
pub struct FragmentCounts {
    pub total: usize,
    pub transcribed: usize,
    pub failed: usize,
}

/// Full projection of one session.
#[derive(Debug, Serialize)]
pub struct MeetingProjection {
    pub session_id: Uuid,
    pub title: String,
    pub participants: Vec<String>,
    pub status: MeetingStatus,
    pub max_duration_minutes: u32,
    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    pub fragments: FragmentCounts,
}

#[derive(Debug, Serialize)]
pub struct MeetingListItem {
    pub session_id: Uuid,
    pub title: String,
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Meeting> for MeetingListItem {
    fn from(meeting: Meeting) -> Self {
        Self {
            session_id: meeting.id,
            title: meeting.title,
            status: meeting.status,
            created_at: meeting.created_at,
            updated_at: meeting.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteRecordingResponse {
    pub session_id: Uuid,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable machine-readable reason code.
    pub error: String,
    pub message: String,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::InvalidInput(_) | PipelineError::DurationExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::NotFound => StatusCode::NOT_FOUND,
            PipelineError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            PipelineError::EmptyTranscript => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::NotEntitled(_) => StatusCode::PAYMENT_REQUIRED,
            PipelineError::Engine(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.reason_code().to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recordings
/// Start a new recording session
pub async fn start_recording(
    State(state): State<AppState>,
    account: AccountRef,
    Json(req): Json<StartRecordingRequest>,
) -> Result<Json<StartRecordingResponse>, PipelineError> {
    if !account.can_record() {
        return Err(PipelineError::NotEntitled(
            "trial expired; upgrade to keep recording".to_string(),
        ));
    }

    let max_duration_minutes = match account.plan {
        Plan::Premium => state.config.limits.premium_max_duration_minutes,
        _ => state.config.limits.free_max_duration_minutes,
    };

    let meeting = state
        .registry
        .create(
            &account,
            &req.title,
            req.participants.unwrap_or_default(),
            max_duration_minutes,
        )
        .await?;

    Ok(Json(StartRecordingResponse {
        session_id: meeting.id,
        status: meeting.status,
        max_duration_minutes: meeting.max_duration_minutes,
    }))
}

/// POST /recordings/:session_id/fragments
/// Admit one audio fragment
pub async fn upload_fragment(
    State(state): State<AppState>,
    account: AccountRef,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UploadFragmentRequest>,
) -> Result<Json<UploadFragmentResponse>, PipelineError> {
    let audio_bytes = base64::engine::general_purpose::STANDARD
        .decode(&req.audio_bytes)
        .map_err(|_| PipelineError::InvalidInput("audio_bytes is not valid base64".to_string()))?;

    let fragment = state
        .ingester
        .admit(
            session_id,
            &account,
            req.sequence_number,
            audio_bytes,
            &req.content_type,
        )
        .await?;

    Ok(Json(UploadFragmentResponse {
        fragment_id: fragment.id,
        sequence_number: fragment.sequence,
        status: fragment.status,
    }))
}

/// POST /recordings/:session_id/end
/// End recording and run the processing pipeline
pub async fn end_recording(
    State(state): State<AppState>,
    account: AccountRef,
    Path(session_id): Path<Uuid>,
) -> Result<Json<EndRecordingResponse>, PipelineError> {
    let meeting = state.coordinator.run(session_id, &account).await?;

    Ok(Json(EndRecordingResponse {
        session_id: meeting.id,
        status: meeting.status,
    }))
}

/// GET /recordings/:session_id
/// Full session projection, including transcript and summary once present
pub async fn get_recording(
    State(state): State<AppState>,
    account: AccountRef,
    Path(session_id): Path<Uuid>,
) -> Result<Json<MeetingProjection>, PipelineError> {
    let meeting = state.registry.get(&session_id, &account.id).await?;
    let fragments = state.registry.fragments_sorted(&session_id).await?;

    let counts = FragmentCounts {
        total: fragments.len(),
        transcribed: fragments
            .iter()
            .filter(|f| f.status == FragmentStatus::Transcribed)
            .count(),
        failed: fragments
            .iter()
            .filter(|f| f.status == FragmentStatus::Error)
            .count(),
    };

    Ok(Json(MeetingProjection {
        session_id: meeting.id,
        title: meeting.title,
        participants: meeting.participants,
        status: meeting.status,
        max_duration_minutes: meeting.max_duration_minutes,
        started_at: meeting.started_at,
        created_at: meeting.created_at,
        updated_at: meeting.updated_at,
        transcript: meeting.transcript,
        summary: meeting.summary,
        error_reason: meeting.error_reason,
        fragments: counts,
    }))
}

/// GET /recordings
/// The caller's sessions, newest first
pub async fn list_recordings(
    State(state): State<AppState>,
    account: AccountRef,
) -> Json<Vec<MeetingListItem>> {
    let meetings = state.registry.list(&account.id).await;
    Json(meetings.into_iter().map(MeetingListItem::from).collect())
}

/// DELETE /recordings/:session_id
/// Remove a session, its fragment rows, and their blobs
pub async fn delete_recording(
    State(state): State<AppState>,
    account: AccountRef,
    Path(session_id): Path<Uuid>,
) -> Result<Json<DeleteRecordingResponse>, PipelineError> {
    let (meeting, fragments) = state.registry.remove(&session_id, &account.id).await?;
    state.tracker.forget(session_id).await;

    let deletions = fragments
        .iter()
        .map(|fragment| state.store.delete(&fragment.storage_ref));
    for result in join_all(deletions).await {
        if let Err(e) = result {
            warn!("failed to delete a fragment blob of session {}: {}", meeting.id, e);
        }
    }

    Ok(Json(DeleteRecordingResponse {
        session_id: meeting.id,
        status: "deleted",
    }))
}

/// POST /recordings/:session_id/export
/// Render the summary as a downloadable document
pub async fn export_recording(
    State(state): State<AppState>,
    account: AccountRef,
    Path(session_id): Path<Uuid>,
    Json(req): Json<ExportRequest>,
) -> Result<Json<ExportedDocument>, PipelineError> {
    let format = ExportFormat::parse(&req.format).ok_or_else(|| {
        PipelineError::InvalidInput(format!(
            "unsupported export format: {} (expected pdf or docx)",
            req.format
        ))
    })?;

    let document = state.export.export(session_id, &account, format).await?;
    Ok(Json(document))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
