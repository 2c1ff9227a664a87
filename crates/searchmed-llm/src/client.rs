//! HTTP clients for the local language-model backend.
//!
//! SearchMed consumes two model capabilities: free-text inference (slot
//! extraction, grounded answers) and passage embeddings. Both are exposed
//! as narrow traits so the pipeline can run against mocks; the real
//! implementations talk to a local Ollama instance.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model-backend errors.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("cannot reach model backend at {0}")]
    Connection(String),

    #[error("model request timed out after {0}s")]
    Timeout(u64),

    #[error("model backend returned HTTP {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("model response could not be decoded: {0}")]
    ResponseDecoding(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

/// Free-text inference capability.
pub trait LlmClient {
    /// Run one inference call and return the raw model text.
    ///
    /// No structural guarantee is made about the output; callers that
    /// expect structured data must parse defensively.
    fn infer(&self, prompt: &str) -> LlmResult<String>;
}

/// Text-embedding capability used to build retrieval indexes.
pub trait EmbeddingModel {
    fn embed(&self, text: &str) -> LlmResult<Vec<f32>>;
}

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new client pointing at an Ollama instance.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: build_http_client(timeout_secs),
            timeout_secs,
        }
    }

    /// Default Ollama instance at localhost:11434 with 5-minute timeout.
    pub fn default_local(model: &str) -> Self {
        Self::new("http://localhost:11434", model, 300)
    }

    /// The model name requests are sent with.
    pub fn model(&self) -> &str {
        &self.model
    }
}

fn build_http_client(timeout_secs: u64) -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .expect("Failed to create HTTP client")
}

fn transport_error(base_url: &str, timeout_secs: u64, e: reqwest::Error) -> LlmError {
    if e.is_connect() {
        LlmError::Connection(base_url.to_string())
    } else if e.is_timeout() {
        LlmError::Timeout(timeout_secs)
    } else {
        LlmError::Transport(e.to_string())
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl LlmClient for OllamaClient {
    fn infer(&self, prompt: &str) -> LlmResult<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| transport_error(&self.base_url, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| LlmError::ResponseDecoding(e.to_string()))?;

        tracing::debug!(model = %self.model, chars = parsed.response.len(), "inference completed");
        Ok(parsed.response)
    }
}

/// Ollama HTTP client for text embeddings.
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: build_http_client(timeout_secs),
            timeout_secs,
        }
    }

    /// Default local instance with the all-minilm embedding model.
    pub fn default_local() -> Self {
        Self::new("http://localhost:11434", "all-minilm", 120)
    }
}

/// Request body for Ollama /api/embeddings
#[derive(Serialize)]
struct OllamaEmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body from Ollama /api/embeddings
#[derive(Deserialize)]
struct OllamaEmbeddingsResponse {
    embedding: Vec<f32>,
}

impl EmbeddingModel for OllamaEmbedder {
    fn embed(&self, text: &str) -> LlmResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = OllamaEmbeddingsRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| transport_error(&self.base_url, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaEmbeddingsResponse = response
            .json()
            .map_err(|e| LlmError::ResponseDecoding(e.to_string()))?;

        Ok(parsed.embedding)
    }
}

/// Mock LLM client for testing — replays scripted responses.
///
/// With a single response it answers every call; with several it answers
/// them in order and keeps repeating the last one.
pub struct MockLlmClient {
    responses: RefCell<VecDeque<String>>,
    failure: Option<String>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            responses: RefCell::new(VecDeque::from([response.to_string()])),
            failure: None,
        }
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
            failure: None,
        }
    }

    /// A client whose every call fails as unreachable.
    pub fn unreachable(cause: &str) -> Self {
        Self {
            responses: RefCell::new(VecDeque::new()),
            failure: Some(cause.to_string()),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn infer(&self, _prompt: &str) -> LlmResult<String> {
        if let Some(cause) = &self.failure {
            return Err(LlmError::Connection(cause.clone()));
        }
        let mut queue = self.responses.borrow_mut();
        match queue.len() {
            0 => Err(LlmError::Transport("mock response queue is empty".into())),
            1 => Ok(queue.front().cloned().unwrap_or_default()),
            _ => Ok(queue.pop_front().unwrap_or_default()),
        }
    }
}

/// Mock embedder — deterministic bag-of-words hashing.
///
/// Texts sharing words land in the same buckets, so cosine ranking over
/// mock embeddings still prefers lexically related passages.
pub struct MockEmbedder {
    dimension: usize,
    failure: Option<String>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: 64,
            failure: None,
        }
    }

    /// An embedder whose every call fails as unreachable.
    pub fn unreachable(cause: &str) -> Self {
        Self {
            dimension: 64,
            failure: Some(cause.to_string()),
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for MockEmbedder {
    fn embed(&self, text: &str) -> LlmResult<Vec<f32>> {
        if let Some(cause) = &self.failure {
            return Err(LlmError::Connection(cause.clone()));
        }
        let mut vector = vec![0.0f32; self.dimension];
        let lower = text.to_lowercase();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() >= 3)
        {
            // FNV-1a
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in word.bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            }
            vector[(hash % self.dimension as u64) as usize] += 1.0;
        }
        Ok(vector)
    }
}
