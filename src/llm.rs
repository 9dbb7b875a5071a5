//! OpenAI chat completions client.
//!
//! Uses reqwest with Bearer token auth against
//! `https://api.openai.com/v1/chat/completions`. Two calling modes:
//! a buffered request for summaries and highlights, and a streaming
//! request that forwards SSE deltas over an mpsc channel for the chat
//! page. Summarization callers absorb failures into placeholder text;
//! only the interactive chat surfaces upstream errors.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::types::EnrichedRecord;
use crate::{config::Config, prompts};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Placeholder used whenever a per-record highlight cannot be produced.
pub const NO_COMMENT_PLACEHOLDER: &str = "No AI comment available.";

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not configured")]
    NotConfigured,
    #[error("OpenAI request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("OpenAI API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("OpenAI response had no content")]
    EmptyResponse,
}

/// One message on the completions wire. Role is "system", "user", or
/// "assistant".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.api_key.as_deref().ok_or(LlmError::NotConfigured)
    }

    /// Buffered completion. Returns the first choice's content.
    pub async fn chat(
        &self,
        messages: &[WireMessage],
        max_tokens: Option<u32>,
    ) -> Result<String, LlmError> {
        let api_key = self.api_key()?;
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens,
            stream: false,
        };

        let resp = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let parsed: CompletionResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or(LlmError::EmptyResponse)
    }

    /// Streaming completion. Content deltas arrive on the returned
    /// channel as they are produced; an error item ends the stream.
    pub fn chat_stream(
        &self,
        model: Option<String>,
        messages: Vec<WireMessage>,
    ) -> mpsc::Receiver<Result<String, LlmError>> {
        let (tx, rx) = mpsc::channel(32);
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let model = model.unwrap_or_else(|| self.model.clone());

        tokio::spawn(async move {
            if let Err(e) = run_stream(client, api_key, model, messages, &tx).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        rx
    }

    // -------------------------------------------------------------------
    // Domain helpers
    // -------------------------------------------------------------------

    /// Bullet-point summary of an uploaded file. Failure degrades to a
    /// fixed fallback sentence rather than an error.
    pub async fn summarize_upload(&self, text: &str) -> String {
        let messages = [WireMessage::user(prompts::upload_summary_prompt(text))];
        match self.chat(&messages, None).await {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("Upload summary failed: {}", e);
                "An automatic summary could not be generated, \
                 but the file was uploaded correctly."
                    .to_string()
            }
        }
    }

    /// Executive summary for a document attached to a record. Same
    /// degradation policy as [`summarize_upload`].
    pub async fn executive_summary(&self, text: &str) -> String {
        let messages = [WireMessage::user(prompts::executive_summary_prompt(text))];
        match self.chat(&messages, None).await {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("Executive summary failed: {}", e);
                "An automatic executive summary could not be generated, \
                 but the document was attached to this DEM."
                    .to_string()
            }
        }
    }

    /// One-sentence highlight for a record. Best-effort: any failure
    /// yields [`NO_COMMENT_PLACEHOLDER`], never an error.
    pub async fn record_highlight(&self, record: &EnrichedRecord) -> String {
        let messages = [
            WireMessage::system(prompts::HIGHLIGHT_SYSTEM),
            WireMessage::user(prompts::highlight_prompt(record)),
        ];
        match self.chat(&messages, Some(50)).await {
            Ok(comment) => comment,
            Err(e) => {
                log::warn!("Record highlight failed: {}", e);
                NO_COMMENT_PLACEHOLDER.to_string()
            }
        }
    }

    /// Solution-architecture analysis for a single record, rendered as
    /// HTML. Upstream failures surface like the portfolio report.
    pub async fn solution_analysis(
        &self,
        record: &EnrichedRecord,
    ) -> Result<String, LlmError> {
        let messages = [
            WireMessage::system(prompts::SOLUTION_ARCHITECT_SYSTEM),
            WireMessage::user(prompts::solution_analysis_prompt(record)),
        ];
        let content = self.chat(&messages, Some(1500)).await?;
        Ok(strip_code_fence(&content).to_string())
    }

    /// Strategic HTML report over the active portfolio. Upstream
    /// failures surface; the route maps them to a gateway error.
    pub async fn portfolio_ai_report(
        &self,
        records: &[EnrichedRecord],
    ) -> Result<String, LlmError> {
        let messages = [
            WireMessage::system(prompts::PORTFOLIO_ADVISOR_SYSTEM),
            WireMessage::user(format!(
                "Here is the project portfolio:\n\n{}",
                prompts::portfolio_context(records)
            )),
        ];
        let content = self.chat(&messages, Some(2000)).await?;
        Ok(strip_code_fence(&content).to_string())
    }
}

async fn run_stream(
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    messages: Vec<WireMessage>,
    tx: &mpsc::Sender<Result<String, LlmError>>,
) -> Result<(), LlmError> {
    use futures_util::StreamExt;

    let api_key = api_key.ok_or(LlmError::NotConfigured)?;
    let body = CompletionRequest {
        model: &model,
        messages: &messages,
        max_tokens: None,
        stream: true,
    };

    let resp = client
        .post(OPENAI_API_URL)
        .bearer_auth(&api_key)
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api { status, body });
    }

    // SSE framing: events are `data: {json}` lines, terminated by a
    // `data: [DONE]` sentinel. Chunks can split mid-line, so buffer.
    let mut stream = resp.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buffer.find('\n') {
            let line = buffer[..pos].trim().to_string();
            buffer.drain(..=pos);

            let Some(data) = line.strip_prefix("data: ") else {
                continue;
            };
            if data == "[DONE]" {
                return Ok(());
            }
            if let Ok(parsed) = serde_json::from_str::<StreamChunk>(data) {
                if let Some(content) = parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                {
                    if tx.send(Ok(content)).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    Ok(())
}

/// Models sometimes wrap HTML output in a markdown code fence.
fn strip_code_fence(content: &str) -> &str {
    let mut content = content.trim();
    if let Some(rest) = content.strip_prefix("```html") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim()
}
