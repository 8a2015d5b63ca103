//! The OpenAI embedding client against a local stand-in for the `/embeddings` endpoint.

#![cfg(feature = "openai")]

use std::sync::{Arc, Mutex};

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use docqa_rag::{
    Chunk, Collection, EmbeddingProvider, InMemoryVectorStore, OpenAIEmbeddingProvider, RagError,
};
use serde_json::{Value, json};

/// Mimics the hosted API's limits and records the size of every request.
struct FakeApi {
    dimensions: usize,
    fail_request: Option<usize>,
    input_sizes: Mutex<Vec<usize>>,
}

impl FakeApi {
    fn new(dimensions: usize) -> Self {
        Self { dimensions, fail_request: None, input_sizes: Mutex::new(Vec::new()) }
    }

    fn sizes(&self) -> Vec<usize> {
        self.input_sizes.lock().unwrap().clone()
    }
}

async fn embeddings(
    State(api): State<Arc<FakeApi>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let inputs = body["input"].as_array().cloned().unwrap_or_default();
    let request = {
        let mut sizes = api.input_sizes.lock().unwrap();
        sizes.push(inputs.len());
        sizes.len() - 1
    };

    if inputs.len() > 2048 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"message": "'$.input' is invalid: maximum 2048 inputs"}})),
        );
    }
    if api.fail_request == Some(request) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"message": "upstream overloaded"}})),
        );
    }

    let data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .map(|(index, _)| {
            let mut embedding = vec![0.0f32; api.dimensions];
            embedding[index % api.dimensions] = 1.0;
            json!({"index": index, "embedding": embedding})
        })
        .collect();
    (StatusCode::OK, Json(json!({"data": data})))
}

async fn spawn_api(api: Arc<FakeApi>) -> String {
    let app = Router::new().route("/v1/embeddings", post(embeddings)).with_state(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn chunks(n: usize) -> (Vec<Chunk>, Vec<String>) {
    let chunks = (0..n)
        .map(|i| Chunk {
            id: String::new(),
            text: format!("chunk number {i}"),
            embedding: Vec::new(),
            metadata: Default::default(),
            document_id: "handbook.pdf".to_string(),
        })
        .collect();
    let ids = (0..n).map(|i| format!("id-{i}")).collect();
    (chunks, ids)
}

async fn collection(provider: OpenAIEmbeddingProvider) -> Collection {
    Collection::initialize(Arc::new(InMemoryVectorStore::new()), Arc::new(provider), "docs")
        .await
        .unwrap()
}

#[tokio::test]
async fn large_add_is_split_into_bounded_requests() {
    let api = Arc::new(FakeApi::new(8));
    let base_url = spawn_api(api.clone()).await;
    let provider =
        OpenAIEmbeddingProvider::new("sk-test").unwrap().with_base_url(base_url).with_dimensions(8);
    let collection = collection(provider).await;

    let (chunks, ids) = chunks(3000);
    assert_eq!(collection.add(chunks, &ids).await.unwrap(), 3000);

    assert_eq!(api.sizes(), vec![1000, 1000, 1000]);
    assert_eq!(collection.count().await.unwrap(), 3000);
}

#[tokio::test]
async fn failed_request_midway_writes_nothing() {
    let api = Arc::new(FakeApi { fail_request: Some(1), ..FakeApi::new(4) });
    let base_url = spawn_api(api.clone()).await;
    let provider = OpenAIEmbeddingProvider::new("sk-test")
        .unwrap()
        .with_base_url(base_url)
        .with_dimensions(4)
        .with_batch_size(2);
    let collection = collection(provider).await;

    let (chunks, ids) = chunks(5);
    let err = collection.add(chunks, &ids).await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingError { ref message, .. } if message.contains("upstream overloaded")));
    assert_eq!(api.sizes(), vec![2, 2]);
    assert_eq!(collection.count().await.unwrap(), 0);
}

#[tokio::test]
async fn vectors_keep_request_order_across_batches() {
    let api = Arc::new(FakeApi::new(3));
    let base_url = spawn_api(api.clone()).await;
    let provider = OpenAIEmbeddingProvider::new("sk-test")
        .unwrap()
        .with_base_url(base_url)
        .with_dimensions(3)
        .with_batch_size(2);

    let embeddings = provider.embed_batch(&["a", "b", "c"]).await.unwrap();
    assert_eq!(api.sizes(), vec![2, 1]);
    assert_eq!(embeddings, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0]]);
}

#[tokio::test]
async fn unexpected_vector_size_names_the_setting() {
    let api = Arc::new(FakeApi::new(768));
    let base_url = spawn_api(api).await;
    let provider = OpenAIEmbeddingProvider::new("sk-test")
        .unwrap()
        .with_base_url(base_url)
        .with_model("nomic-embed-text");

    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { ref message, .. } if message.contains("EMBEDDING_DIMENSIONS")));

    let configured = provider.with_dimensions(768);
    assert_eq!(configured.embed("hello").await.unwrap().len(), 768);
}

#[tokio::test]
async fn empty_batch_sends_no_request() {
    let api = Arc::new(FakeApi::new(4));
    let base_url = spawn_api(api.clone()).await;
    let provider =
        OpenAIEmbeddingProvider::new("sk-test").unwrap().with_base_url(base_url).with_dimensions(4);

    assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    assert!(api.sizes().is_empty());
}
