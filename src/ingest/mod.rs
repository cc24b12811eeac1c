//! Fragment ingestion
//!
//! Admission of uploaded audio fragments: validation, blob storage, metadata
//! bookkeeping, and the in-flight tracking that lets end-of-recording wait
//! for trailing uploads.

mod ingester;
mod store;
mod tracker;

pub use ingester::FragmentIngester;
pub use store::{FragmentStore, FsFragmentStore};
pub use tracker::{UploadGuard, UploadTracker};
