use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One nearest-neighbor row as reported by the document store. `distance`
/// is a vector-space dissimilarity; relevance is `1 - distance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub distance: f32,
}

/// Decoding parameters passed to the model runtime for a single call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingParams {
    pub max_tokens: usize,
    pub temperature: f32,
    pub stop: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub completions: Vec<Completion>,
}

/// Semantic document store holding deprecation-context passages.
/// Read-only at analysis time; assumed safe for concurrent reads.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<StoredDocument>>;

    async fn is_connected(&self) -> bool;
}

/// Generative model runtime. A single shared handle is loaded once and
/// reused; callers serialize access to it.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<Generation>;

    fn model_id(&self) -> &str;

    async fn is_available(&self) -> bool;
}
