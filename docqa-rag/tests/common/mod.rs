//! Deterministic providers for integration tests. No network access.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docqa_rag::{
    Collection, CompletionProvider, EmbeddingProvider, InMemoryVectorStore, RagError, Result,
};

pub const DIM: usize = 64;

/// Bag-of-words embedding: each lower-cased word bumps one hashed bucket.
///
/// Texts sharing words point in similar directions, so retrieval behaves
/// like a crude keyword search.
pub struct BagOfWordsEmbedder;

fn bucket(word: &str) -> usize {
    let hash = word.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
        (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    });
    (hash % DIM as u64) as usize
}

pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut embedding = vec![0.0f32; DIM];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        embedding[bucket(&word.to_lowercase())] += 1.0;
    }
    embedding
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(bag_of_words(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

/// Always fails, like an API with an invalid key.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "failing".into(),
            message: "API returned 401 Unauthorized: Incorrect API key provided".into(),
        })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Records every prompt and replies with a fixed answer, or fails if `reply` is `None`.
#[derive(Default)]
pub struct RecordingCompletion {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<(String, f32)>>,
}

impl RecordingCompletion {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()), prompts: Mutex::default() }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn last_prompt(&self) -> Option<(String, f32)> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for RecordingCompletion {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.prompts.lock().unwrap().push((prompt.to_string(), temperature));
        self.reply.clone().ok_or_else(|| RagError::CompletionError {
            provider: "recording".into(),
            message: "API returned 429 Too Many Requests: rate limited".into(),
        })
    }

    fn model(&self) -> &str {
        "recording"
    }
}

/// An in-memory collection using [`BagOfWordsEmbedder`].
pub async fn memory_collection() -> Collection {
    Collection::initialize(Arc::new(InMemoryVectorStore::new()), Arc::new(BagOfWordsEmbedder), "docs")
        .await
        .unwrap()
}
