// ABOUTME: Retrieves and ranks deprecation-context passages for a function
// ABOUTME: reference by querying the document store with phrasing variants.
use deprag_core::{ContextChunk, DocumentStore, LibraryProfile, RetrievalConfig};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Best-effort context retrieval: every store failure degrades to an empty
/// list so a flaky store never aborts the enclosing analysis.
pub struct ContextRetriever {
    store: Arc<dyn DocumentStore>,
    profile: LibraryProfile,
    config: RetrievalConfig,
}

impl ContextRetriever {
    pub fn new(store: Arc<dyn DocumentStore>, profile: LibraryProfile) -> Self {
        Self::with_config(store, profile, RetrievalConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        profile: LibraryProfile,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            profile,
            config,
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.store.is_connected().await
    }

    /// Top-ranked context chunks for one function reference, at most
    /// `max_chunks`, sorted descending by similarity score.
    ///
    /// Deprecation documentation may index a function under several textual
    /// forms, so up to four phrasing variants are queried and the union is
    /// filtered by lexical relevance afterwards.
    pub async fn retrieve(&self, func: &str, version: &str) -> Vec<ContextChunk> {
        let base = func.rsplit('.').next().unwrap_or(func);
        let variants = [
            base.to_string(),
            func.to_string(),
            format!("{}.{}", self.profile.name, base),
            format!("{}.{}", self.profile.short_alias, base),
        ];

        let mut seen: HashSet<String> = HashSet::new();
        let mut chunks: Vec<ContextChunk> = Vec::new();

        for variant in &variants {
            let query = format!("{} {} {} deprecated", variant, self.profile.name, version);
            let neighbors = match self.store.query(&query, self.config.top_k_per_variant).await {
                Ok(neighbors) => neighbors,
                Err(e) => {
                    warn!(%func, %variant, "store query failed: {e}");
                    continue;
                }
            };

            for neighbor in neighbors {
                let score = 1.0 - neighbor.distance;
                if score < self.config.similarity_threshold {
                    continue;
                }
                if !self.reference_matches_content(func, &neighbor.content) {
                    continue;
                }
                let fingerprint: String = neighbor
                    .content
                    .chars()
                    .take(self.config.fingerprint_len)
                    .collect();
                if !seen.insert(fingerprint) {
                    continue;
                }
                chunks.push(ContextChunk {
                    content: neighbor.content,
                    metadata: neighbor.metadata,
                    similarity_score: score,
                });
            }
        }

        chunks.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        chunks.truncate(self.config.max_chunks);

        debug!(%func, count = chunks.len(), "retrieved context chunks");
        chunks
    }

    /// Lexical containment check: at least one meaningful segment of the
    /// alias-stripped reference name must appear in the passage.
    fn reference_matches_content(&self, func: &str, content: &str) -> bool {
        let stripped = func
            .replace(&format!("{}.", self.profile.short_alias), "")
            .replace(&format!("{}.", self.profile.name), "");
        let content_lower = content.to_lowercase();
        stripped
            .split('.')
            .filter(|part| part.len() > 2)
            .any(|part| content_lower.contains(&part.to_lowercase()))
    }
}
