use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::session::StorageRef;

/// Persists fragment blobs to durable storage and hands back stable
/// references. Pure I/O; no business logic lives here.
#[async_trait]
pub trait FragmentStore: Send + Sync {
    async fn put(
        &self,
        session_id: Uuid,
        sequence: u64,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StorageRef>;

    async fn get(&self, storage_ref: &StorageRef) -> Result<Vec<u8>>;

    async fn delete(&self, storage_ref: &StorageRef) -> Result<()>;
}

/// Filesystem-backed store: one file per fragment under the upload
/// directory, named so a directory listing reads chronologically per
/// session.
pub struct FsFragmentStore {
    root: PathBuf,
}

impl FsFragmentStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn extension_for(content_type: &str) -> &'static str {
        match content_type {
            "audio/webm" => "webm",
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
            "audio/ogg" => "ogg",
            "audio/flac" => "flac",
            _ => "bin",
        }
    }
}

#[async_trait]
impl FragmentStore for FsFragmentStore {
    async fn put(
        &self,
        session_id: Uuid,
        sequence: u64,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<StorageRef> {
        let file_name = format!(
            "meeting_{}_fragment_{}_{}.{}",
            session_id,
            sequence,
            Utc::now().format("%Y%m%d_%H%M%S%3f"),
            Self::extension_for(content_type),
        );
        let path = self.root.join(&file_name);

        fs::write(&path, bytes).await?;

        debug!("stored fragment blob {} ({} bytes)", file_name, bytes.len());

        Ok(StorageRef::new(file_name))
    }

    async fn get(&self, storage_ref: &StorageRef) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(storage_ref.as_str())).await?)
    }

    async fn delete(&self, storage_ref: &StorageRef) -> Result<()> {
        fs::remove_file(self.root.join(storage_ref.as_str())).await?;
        Ok(())
    }
}
