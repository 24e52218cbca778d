//! Natural-language questions over the output tables.
//!
//! The ETL core only produces CSV files; anything implementing [`QueryAgent`]
//! can answer questions about them.

pub mod chat;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};

pub use chat::ChatCompletionAgent;

/// Answer a free-text question given a set of tabular data sources
pub trait QueryAgent: Send + Sync {
    fn answer(&self, sources: &[PathBuf], question: &str) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// A CSV file as it will be shown to the model
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub name: String,
    pub content: String,
    pub truncated: bool,
}

const SYSTEM_PROMPT: &str = "You are a market data analyst. Answer the question using only the CSV \
tables provided. Open interest rows carry the option's underlying, expiry, strike, type and a \
minute timestamp; OHLC rows are 5-minute bars per instrument token in IST. If the tables do not \
contain the answer, say so.";

/// Read each source, keeping at most `max_bytes` of whole lines
pub async fn load_sources(paths: &[PathBuf], max_bytes: usize) -> Result<Vec<SourceTable>> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read source table {}", path.display()))?;
        let (content, truncated) = truncate_lines(&text, max_bytes);
        sources.push(SourceTable {
            name: display_name(path),
            content,
            truncated,
        });
    }
    Ok(sources)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Cut at the last line break within `max_bytes`
pub fn truncate_lines(text: &str, max_bytes: usize) -> (String, bool) {
    if text.len() <= max_bytes {
        return (text.to_string(), false);
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let cut = text[..end].rfind('\n').map(|i| i + 1).unwrap_or(end);
    (text[..cut].to_string(), true)
}

pub fn build_messages(sources: &[SourceTable], question: &str) -> Vec<ChatMessage> {
    let mut body = String::new();
    for source in sources {
        body.push_str(&format!("### {}\n", source.name));
        if source.truncated {
            body.push_str("(truncated: only the first rows are shown)\n");
        }
        body.push_str("```csv\n");
        body.push_str(&source.content);
        if !source.content.ends_with('\n') {
            body.push('\n');
        }
        body.push_str("```\n\n");
    }
    body.push_str(&format!("Question: {}", question.trim()));

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(body)]
}
