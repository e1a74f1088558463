// ABOUTME: HTTP client for a Chroma document store, exposing it through the
// ABOUTME: DocumentStore trait consumed by the context retriever.
use async_trait::async_trait;
use deprag_core::{DepragError, DocumentStore, Result, StoreConfig, StoredDocument};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Chroma REST client. The server side owns the embedding function; this
/// client only issues text queries and flattens the columnar response.
pub struct ChromaStore {
    config: StoreConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_texts: Vec<&'a str>,
    n_results: usize,
    include: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<String>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<HashMap<String, serde_json::Value>>>>,
    #[serde(default)]
    distances: Vec<Vec<f32>>,
}

impl ChromaStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DepragError::Retrieval(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/api/v1/collections/{}/query",
            self.config.base_url, self.config.collection
        )
    }
}

#[async_trait]
impl DocumentStore for ChromaStore {
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<StoredDocument>> {
        let request = QueryRequest {
            query_texts: vec![text],
            n_results: top_k,
            include: vec!["documents", "metadatas", "distances"],
        };

        let response = self
            .client
            .post(self.query_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| DepragError::Retrieval(format!("Store request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DepragError::Retrieval(format!(
                "Store returned {status}: {body}"
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| DepragError::Retrieval(format!("Malformed store response: {e}")))?;

        // One row of columns per query text; we always send exactly one.
        let documents = parsed.documents.into_iter().next().unwrap_or_default();
        let mut metadatas = parsed
            .metadatas
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter();
        let mut distances = parsed.distances.into_iter().next().unwrap_or_default().into_iter();

        let results: Vec<StoredDocument> = documents
            .into_iter()
            .map(|content| StoredDocument {
                content,
                metadata: metadatas.next().flatten().unwrap_or_default(),
                distance: distances.next().unwrap_or(1.0),
            })
            .collect();

        debug!(count = results.len(), "store query returned neighbors");
        Ok(results)
    }

    async fn is_connected(&self) -> bool {
        let url = format!("{}/api/v1/heartbeat", self.config.base_url);
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_response_tolerates_missing_columns() {
        let parsed: QueryResponse = serde_json::from_str(r#"{"documents": [["a", "b"]]}"#).unwrap();
        assert_eq!(parsed.documents[0].len(), 2);
        assert!(parsed.metadatas.is_empty());
        assert!(parsed.distances.is_empty());
    }

    #[test]
    fn query_response_parses_full_columns() {
        let raw = r#"{
            "documents": [["numpy.asscalar is deprecated"]],
            "metadatas": [[{"version": "1.16"}]],
            "distances": [[0.25]]
        }"#;
        let parsed: QueryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.documents[0][0], "numpy.asscalar is deprecated");
        assert!(parsed.metadatas[0][0].is_some());
        assert!((parsed.distances[0][0] - 0.25).abs() < f32::EPSILON);
    }
}
