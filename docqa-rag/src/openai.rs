//! OpenAI-compatible embedding and chat-completion clients.
//!
//! Both providers call the REST API directly with `reqwest`, authenticate
//! with a bearer key, and report non-2xx responses with the message from the
//! API's error body when it has one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::CompletionProvider;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::settings::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, Settings};

const PROVIDER: &str = "OpenAI";

/// Inputs sent per `/embeddings` request. The hosted API rejects more than 2048.
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 1000;

/// Output size of the known OpenAI embedding models.
///
/// Other models fall back to 1536; servers hosting them need
/// [`OpenAIEmbeddingProvider::with_dimensions`].
fn model_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

fn require_key(api_key: String) -> Result<String> {
    if api_key.trim().is_empty() {
        return Err(RagError::ValidationError("API key must not be empty".into()));
    }
    Ok(api_key)
}

// ── OpenAI API error body ──────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a non-success response into a readable message.
async fn failure_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the `/embeddings` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?.with_model("text-embedding-3-large");
/// let embedding = provider.embed("hello world").await?;
/// ```
///
/// Large batches are split into requests of at most
/// [`DEFAULT_EMBEDDING_BATCH_SIZE`] inputs, sent one after another. Every
/// returned vector must have [`dimensions()`](EmbeddingProvider::dimensions)
/// components.
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
    batch_size: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider with the default model (`text-embedding-3-small`).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_key(api_key.into())?,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            dimensions: model_dimensions(DEFAULT_EMBEDDING_MODEL),
            batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
        })
    }

    /// Create a provider from resolved [`Settings`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let provider = Self::new(settings.openai_api_key.clone())?
            .with_model(settings.embedding_model.clone())
            .with_base_url(settings.openai_base_url.clone());
        Ok(match settings.embedding_dimensions {
            Some(dimensions) => provider.with_dimensions(dimensions),
            None => provider,
        })
    }

    /// Set the model name. Also resets [`dimensions()`](EmbeddingProvider::dimensions)
    /// to the model's known size, so call [`with_dimensions`](Self::with_dimensions) after it.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.dimensions = model_dimensions(&self.model);
        self
    }

    /// Declare the vector size the model returns.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Cap the number of inputs per request. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Point the client at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn error(message: impl Into<String>) -> RagError {
        RagError::EmbeddingError { provider: PROVIDER.into(), message: message.into() }
    }

    /// One `/embeddings` call for `batch`.
    async fn request_embeddings(&self, batch: &[&str]) -> Result<Vec<Vec<f32>>> {
        debug!(provider = PROVIDER, batch_size = batch.len(), model = %self.model, "embedding batch");

        let response = self
            .client
            .post(endpoint(&self.base_url, "embeddings"))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: batch })
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "embedding request failed");
                Self::error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            error!(provider = PROVIDER, %message, "embedding API error");
            return Err(Self::error(message));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse embedding response");
            Self::error(format!("failed to parse response: {e}"))
        })?;

        let embeddings = parsed.into_ordered(batch.len())?;
        if let Some(wrong) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(Self::error(format!(
                "model '{}' returned {}-dimension vectors but {} were expected; \
                 set EMBEDDING_DIMENSIONS to match the model",
                self.model,
                wrong.len(),
                self.dimensions
            )));
        }
        Ok(embeddings)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    /// Vectors in request order; the API tags each with its input index.
    fn into_ordered(mut self, expected: usize) -> Result<Vec<Vec<f32>>> {
        if self.data.len() != expected {
            return Err(OpenAIEmbeddingProvider::error(format!(
                "expected {expected} embeddings, got {}",
                self.data.len()
            )));
        }
        self.data.sort_by_key(|d| d.index);
        Ok(self.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| Self::error("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.request_embeddings(batch).await?);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`CompletionProvider`] backed by the `/chat/completions` endpoint.
///
/// The prompt is sent as a single user message.
pub struct OpenAIChatProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIChatProvider {
    /// Create a provider with the default model (`gpt-4o-mini`).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_key(api_key.into())?,
            model: DEFAULT_CHAT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    /// Create a provider from resolved [`Settings`].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.openai_api_key.clone())?
            .with_model(settings.openai_model.clone())
            .with_base_url(settings.openai_base_url.clone()))
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn error(message: impl Into<String>) -> RagError {
        RagError::CompletionError { provider: PROVIDER.into(), message: message.into() }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OpenAIChatProvider::error("API returned no message content"))
    }
}

#[async_trait]
impl CompletionProvider for OpenAIChatProvider {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "chat completion");

        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "completion request failed");
                Self::error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = failure_message(response).await;
            error!(provider = PROVIDER, %message, "completion API error");
            return Err(Self::error(message));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse completion response");
            Self::error(format!("failed to parse response: {e}"))
        })?;

        parsed.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}
