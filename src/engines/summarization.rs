use std::fmt::Write as _;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SummarizationEngineConfig;
use crate::error::EngineError;

use super::SummarizationEngine;

const SYSTEM_PROMPT: &str = "You are an assistant that specializes in meeting \
minutes. Extract the important information from the transcript and produce a \
structured summary.";

// Request/response types for the chat completions API

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Summarization client for an OpenAI-compatible `/chat/completions`
/// endpoint.
pub struct HttpSummarizationEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl HttpSummarizationEngine {
    pub fn new(config: &SummarizationEngineConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

fn build_prompt(transcript: &str, participants: &[String]) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Summarize the following meeting transcript.");
    if !participants.is_empty() {
        let _ = writeln!(prompt, "\nParticipants: {}", participants.join(", "));
    }
    let _ = writeln!(prompt, "\nTranscript:\n{transcript}");
    let _ = writeln!(
        prompt,
        "\nUse the following sections:\n\n\
         ## Meeting overview\n\
         - Main topics and decisions\n\
         - Key points\n\n\
         ## Action items\n\
         - Concrete tasks with owner and due date\n\n\
         ## Next agenda\n\
         - Items to carry over to the next meeting\n\n\
         Keep the summary concise and practical."
    );

    prompt
}

#[async_trait]
impl SummarizationEngine for HttpSummarizationEngine {
    async fn summarize(
        &self,
        transcript: &str,
        participants: &[String],
    ) -> std::result::Result<String, EngineError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(transcript, participants),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Http {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let summary = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if summary.trim().is_empty() {
            return Err(EngineError::EmptyResponse);
        }

        Ok(summary)
    }
}
