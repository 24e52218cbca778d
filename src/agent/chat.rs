use anyhow::{anyhow, Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{info, warn};

use super::{build_messages, load_sources, ChatMessage, QueryAgent};
use crate::config::{self, AgentConfig};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Outcome of one failed request: 429, 5xx and transport errors are retried
enum Attempt {
    Retry(anyhow::Error),
    Fail(anyhow::Error),
}

impl Attempt {
    fn into_inner(self) -> anyhow::Error {
        match self {
            Attempt::Retry(e) | Attempt::Fail(e) => e,
        }
    }
}

/// OpenAI-compatible chat-completions backend. The CSV tables travel inline in
/// the prompt.
pub struct ChatCompletionAgent {
    client: Client,
    config: AgentConfig,
}

impl ChatCompletionAgent {
    pub fn new(config: AgentConfig) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(AgentConfig::from_env())
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY is not set"))?;

        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages,
        };

        let backoff = ExponentialBackoff::from_millis(config::RETRY_BASE_DELAY_MS)
            .factor(config::RETRY_FACTOR)
            .max_delay(Duration::from_secs(config::RETRY_MAX_DELAY_SECS))
            .take(config::RETRY_MAX_ATTEMPTS);

        let body = RetryIf::spawn(
            backoff,
            || async {
                let res = self
                    .client
                    .post(&self.config.endpoint)
                    .bearer_auth(api_key)
                    .json(&request)
                    .send()
                    .await
                    .context("Request send failed")
                    .map_err(Attempt::Retry)?;

                let status = res.status();
                if status.is_success() {
                    return res.text().await.context("Failed to read body").map_err(Attempt::Retry);
                }

                let body = res.text().await.unwrap_or_default();
                let preview: String = body.chars().take(200).collect();
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    warn!("Agent endpoint returned {}, retrying", status);
                    Err(Attempt::Retry(anyhow!("Retryable error: {}", status)))
                } else {
                    Err(Attempt::Fail(anyhow!("Client error {}: {}", status, preview)))
                }
            },
            |attempt: &Attempt| matches!(attempt, Attempt::Retry(_)),
        )
        .await
        .map_err(Attempt::into_inner)?;

        parse_answer(&body)
    }
}

impl QueryAgent for ChatCompletionAgent {
    async fn answer(&self, sources: &[PathBuf], question: &str) -> Result<String> {
        if question.trim().is_empty() {
            anyhow::bail!("Question is empty");
        }
        let tables = load_sources(sources, self.config.max_source_bytes).await?;
        info!(
            "Asking {} over {} table(s): {}",
            self.config.model,
            tables.len(),
            question.trim()
        );
        let messages = build_messages(&tables, question);
        self.complete(&messages).await
    }
}

/// First choice's message content
pub fn parse_answer(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body).context("Failed to parse completion response")?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or_else(|| anyhow!("Completion response has no choices"))
}

fn build_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .timeout(config::AGENT_HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}
