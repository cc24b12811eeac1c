//! HTTP API surface
//!
//! This module provides the REST API for the recording lifecycle:
//! - POST /recordings - Start a new recording session
//! - POST /recordings/:id/fragments - Upload one audio fragment
//! - POST /recordings/:id/end - End recording, run the pipeline
//! - GET /recordings/:id - Full session projection
//! - GET /recordings - List the caller's sessions
//! - DELETE /recordings/:id - Remove a session and its fragments
//! - POST /recordings/:id/export - Render the summary as a document
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, MeetingProjection};
pub use routes::create_router;
pub use state::AppState;
