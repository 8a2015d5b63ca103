//! # docqa-rag
//!
//! Question answering over your own documents: load files, split them into
//! overlapping chunks, embed and store them in a persistent collection, then
//! answer questions from the most similar chunks.
//!
//! ## Components
//!
//! - **Loader** ([`loader`]): text, CSV, spreadsheets, PDF, DOCX, PPTX and HTML
//!   to [`Document`]s. Per-file failures are reported, never fatal.
//! - **Chunker** ([`RecursiveChunker`]): paragraph → line → word → character
//!   splitting with character overlap.
//! - **Vector store** ([`SqliteVectorStore`], [`InMemoryVectorStore`]) behind
//!   a [`Collection`] that embeds on the way in and out.
//! - **Answer chain** ([`AnswerChain`]): retrieve, fill the prompt, complete.
//!
//! ## Features
//!
//! All enabled by default:
//!
//! - `openai`: OpenAI-compatible embedding and chat providers (reqwest).
//! - `sqlite`: the persistent [`SqliteVectorStore`] (sqlx).
//! - `pdf`, `office`, `spreadsheet`, `html`: extractors for those formats,
//!   grouped as `documents`. Without one, files of that kind fail to load.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::*;
//!
//! let settings = Settings::from_env()?;
//! let store = Arc::new(SqliteVectorStore::open(&settings.persist_directory).await?);
//! let embedder = Arc::new(OpenAIEmbeddingProvider::from_settings(&settings)?);
//! let collection = Collection::initialize(store, embedder, &settings.collection_name).await?;
//!
//! let chunker = RecursiveChunker::from_config(&settings.ingest);
//! ingest_paths(&collection, &chunker, &["handbook.pdf"]).await?;
//!
//! let chain = AnswerChain::new(Arc::new(OpenAIChatProvider::from_settings(&settings)?));
//! let answer = chain.answer("How many vacation days do I get?", &collection, 4).await?;
//! println!("{}", answer.text);
//! ```

pub mod chain;
pub mod chunking;
pub mod collection;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod settings;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod vectorstore;

pub use chain::{AnswerChain, DEFAULT_PROMPT, PromptTemplate};
pub use chunking::{Chunker, DEFAULT_SEPARATORS, RecursiveChunker, chunk_documents};
pub use collection::{Collection, Retriever};
pub use completion::CompletionProvider;
pub use config::{DEFAULT_TOP_K, IngestConfig, IngestConfigBuilder, TOP_K_RANGE, clamp_top_k};
pub use document::{Answer, Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use loader::{FileKind, LoadFailure, LoadReport, StructuredFormat, load_documents};
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatProvider, OpenAIEmbeddingProvider};
pub use pipeline::{IngestReport, ingest_paths};
pub use settings::Settings;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteVectorStore;
pub use vectorstore::VectorStore;
