//! Summary export
//!
//! Thin bridge to the external document exporter: entitlement and state
//! preconditions here, rendering elsewhere. No retry, no state of its own.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::account::AccountRef;
use crate::error::{PipelineError, Result};
use crate::session::{MeetingStatus, SessionRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// Rendered document handle returned by the exporter.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedDocument {
    pub file_name: String,
    pub download_url: String,
    pub format: ExportFormat,
}

/// External rendering collaborator: turns a title and summary text into a
/// downloadable document.
#[async_trait]
pub trait DocumentExporter: Send + Sync {
    async fn render(
        &self,
        title: &str,
        body: &str,
        format: ExportFormat,
    ) -> anyhow::Result<ExportedDocument>;
}

/// Default exporter: writes the document under the exports directory and
/// serves it by path. Rendering fidelity is the real exporter's concern.
pub struct FsDocumentExporter {
    root: PathBuf,
}

impl FsDocumentExporter {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }
}

#[async_trait]
impl DocumentExporter for FsDocumentExporter {
    async fn render(
        &self,
        title: &str,
        body: &str,
        format: ExportFormat,
    ) -> anyhow::Result<ExportedDocument> {
        let file_name = format!(
            "{}_minutes_{}.{}",
            Utc::now().format("%Y%m%d"),
            Uuid::new_v4().simple(),
            format.extension(),
        );

        let content = format!("{title}\n\n{body}\n");
        fs::write(self.root.join(&file_name), content).await?;

        Ok(ExportedDocument {
            download_url: format!("/exports/{file_name}"),
            file_name,
            format,
        })
    }
}

/// Gate in front of the document exporter. Not part of the core state
/// machine: it only reads the session.
pub struct ExportBridge {
    registry: SessionRegistry,
    exporter: Arc<dyn DocumentExporter>,
}

impl ExportBridge {
    pub fn new(registry: SessionRegistry, exporter: Arc<dyn DocumentExporter>) -> Self {
        Self { registry, exporter }
    }

    pub async fn export(
        &self,
        session_id: Uuid,
        account: &AccountRef,
        format: ExportFormat,
    ) -> Result<ExportedDocument> {
        if !account.can_export() {
            return Err(PipelineError::NotEntitled(
                "export requires a premium plan".to_string(),
            ));
        }

        let meeting = self.registry.get(&session_id, &account.id).await?;

        let summary = match (&meeting.status, &meeting.summary) {
            (MeetingStatus::Completed, Some(summary)) => summary.clone(),
            _ => {
                return Err(PipelineError::InvalidStateTransition {
                    from: meeting.status,
                    to: MeetingStatus::Completed,
                })
            }
        };

        let document = self
            .exporter
            .render(&meeting.title, &summary, format)
            .await
            .map_err(|e| PipelineError::Storage(e.to_string()))?;

        info!(
            "exported session {} as {} ({})",
            session_id,
            document.file_name,
            format.extension()
        );

        Ok(document)
    }
}
