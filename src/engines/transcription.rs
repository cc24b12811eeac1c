use async_trait::async_trait;
use reqwest::multipart;

use crate::config::TranscriptionEngineConfig;
use crate::error::EngineError;

use super::TranscriptionEngine;

/// Speech-to-text client for an OpenAI-compatible `/audio/transcriptions`
/// endpoint (Whisper and its drop-in replacements).
pub struct HttpTranscriptionEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    language: Option<String>,
}

impl HttpTranscriptionEngine {
    pub fn new(config: &TranscriptionEngineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
        }
    }
}

#[async_trait]
impl TranscriptionEngine for HttpTranscriptionEngine {
    async fn transcribe(
        &self,
        audio: &[u8],
        content_type: &str,
    ) -> std::result::Result<String, EngineError> {
        let file = multipart::Part::bytes(audio.to_vec())
            .file_name("fragment")
            .mime_str(content_type)
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let mut form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "text")
            .part("file", file);
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EngineError::Http {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }

        // The text response format carries a trailing newline.
        Ok(body.trim_end().to_string())
    }
}
