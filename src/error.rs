//! Error taxonomy for the recording pipeline
//!
//! Every business outcome that callers can branch on is a typed variant with
//! a stable reason code, never a stringly-typed message match.

use thiserror::Error;

use crate::session::MeetingStatus;

/// Errors surfaced by the session lifecycle and processing pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed request: empty title, bad MIME type, oversize or duplicate
    /// fragment, unsupported export format.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Session absent or owned by another account. The two cases collapse so
    /// existence is never leaked across accounts.
    #[error("session not found")]
    NotFound,

    /// The state machine rejected a transition or a state-gated operation.
    /// `from` is the session's actual status at the time of rejection.
    #[error("cannot move session from {from} to {to}")]
    InvalidStateTransition { from: MeetingStatus, to: MeetingStatus },

    /// The duration guard rejected a fragment; the session has been force
    /// completed and further uploads are pointless.
    #[error("recording limit of {limit_minutes} minutes reached")]
    DurationExceeded { limit_minutes: u32 },

    /// Nothing transcribable came out of assembly. The summarizer is never
    /// invoked on empty input.
    #[error("no transcribable audio in this session; check that fragment uploads succeeded")]
    EmptyTranscript,

    /// The caller's plan does not cover the requested operation.
    #[error("not entitled: {0}")]
    NotEntitled(String),

    /// External engine failure that aborted the run.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Fragment blob storage failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl PipelineError {
    /// Stable machine-readable reason code carried in error responses.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound => "not_found",
            Self::InvalidStateTransition { .. } => "invalid_state",
            Self::DurationExceeded { .. } => "duration_exceeded",
            Self::EmptyTranscript => "empty_transcript",
            Self::NotEntitled(_) => "not_entitled",
            Self::Engine(_) => "engine_failure",
            Self::Storage(_) => "storage_failure",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Failure from an external transcription or summarization engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("engine request failed: {0}")]
    Transport(String),

    #[error("engine returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
