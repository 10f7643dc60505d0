//! LLM integration: Ollama client, symptom triage, patient summaries.

pub mod ollama;
pub mod prompt;
pub mod summary;
pub mod triage;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Cannot reach Ollama at {0}")]
    Connection(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Ollama returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Failed to parse model response: {0}")]
    ResponseParsing(String),
}

/// Object-safe generation interface so handlers and tests can swap a
/// mock for the real Ollama client. Calls block; async callers go
/// through `spawn_blocking`.
pub trait LlmGenerate: Send + Sync {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}
