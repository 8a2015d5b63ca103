//! Retrieval-augmented answer generation.
//!
//! [`AnswerChain`] retrieves the chunks closest to a question, stuffs their
//! text into a [`PromptTemplate`], and asks a [`CompletionProvider`] for an
//! answer at temperature 0.

use std::sync::Arc;

use tracing::{error, info};

use crate::collection::Retriever;
use crate::completion::CompletionProvider;
use crate::document::{Answer, SearchResult};
use crate::error::{RagError, Result};

const CONTEXT: &str = "{context}";
const QUESTION: &str = "{question}";

/// Prompt used when no template is configured.
pub const DEFAULT_PROMPT: &str = "You are an assistant that answers questions using provided context from documents.
If the answer is not in the context, say you don't know and offer to search or request clarifying info.
Context:
{context}

Question: {question}
Helpful, concise answer:
";

/// A prompt with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_PROMPT.to_string() }
    }
}

impl PromptTemplate {
    /// Create a template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ValidationError`] unless both placeholders are present.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT, QUESTION] {
            if !template.contains(placeholder) {
                return Err(RagError::ValidationError(format!(
                    "prompt template is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    /// Fill the template with the retrieved chunk texts and the question.
    ///
    /// Chunk texts are joined with a blank line. Substitution is a single pass,
    /// so placeholder-like text inside a chunk or the question is left alone.
    pub fn render(&self, sources: &[SearchResult], question: &str) -> String {
        let context =
            sources.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");

        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        loop {
            let next = [(CONTEXT, context.as_str()), (QUESTION, question)]
                .into_iter()
                .filter_map(|(placeholder, value)| {
                    rest.find(placeholder).map(|at| (at, placeholder, value))
                })
                .min_by_key(|(at, ..)| *at);

            match next {
                Some((at, placeholder, value)) => {
                    out.push_str(&rest[..at]);
                    out.push_str(value);
                    rest = &rest[at + placeholder.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

/// Answers questions from retrieved context.
pub struct AnswerChain {
    completion: Arc<dyn CompletionProvider>,
    template: PromptTemplate,
}

impl AnswerChain {
    /// Create a chain with the default prompt.
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
        Self { completion, template: PromptTemplate::default() }
    }

    /// Replace the prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Retrieve `k` chunks for `question`, then generate an answer from them.
    ///
    /// The returned [`Answer`] carries the chunks that were placed in the prompt.
    ///
    /// # Errors
    ///
    /// - [`RagError::ValidationError`] for an empty question.
    /// - Any error from the retriever.
    /// - [`RagError::CompletionError`] if the model call fails. It is not retried.
    pub async fn answer(
        &self,
        question: &str,
        retriever: &dyn Retriever,
        k: usize,
    ) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::ValidationError("question must not be empty".into()));
        }

        let sources = retriever.retrieve(question, k).await?;
        let prompt = self.template.render(&sources, question);

        let text = self.completion.complete(&prompt, 0.0).await.map_err(|e| {
            error!(model = self.completion.model(), error = %e, "answer generation failed");
            e
        })?;

        info!(model = self.completion.model(), source_count = sources.len(), "answered question");
        Ok(Answer { text, sources })
    }
}
