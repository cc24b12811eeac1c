//! Post-recording processing pipeline
//!
//! Turns a session's admitted fragments into a transcript and then a
//! summary: sequence-ordered assembly with per-fragment failure tolerance,
//! and the single-flight coordinator that sequences assembly, summarization,
//! persistence and the final state transition.

mod assembler;
mod coordinator;

pub use assembler::{AssembledTranscript, TranscriptAssembler};
pub use coordinator::ProcessingCoordinator;
