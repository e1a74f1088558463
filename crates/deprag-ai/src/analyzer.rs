// ABOUTME: End-to-end analysis orchestration: extract references, retrieve
// ABOUTME: context, invoke the model and map the outcome to a terminal state.
use crate::invoker::GenerationInvoker;
use crate::prompt::PromptBuilder;
use crate::response::{ParsedResponse, ResponseParser};
use deprag_core::{
    AnalysisRequest, AnalysisResult, ContextChunk, DocumentStore, HealthReport, LibraryProfile,
    ModelRuntime, Result, RetrievalConfig, SamplingConfig,
};
use deprag_parser::ReferenceExtractor;
use deprag_vector::ContextRetriever;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Composes the pipeline stages into the single request/response contract
/// consumed by the transport boundary. Extraction and retrieval failures
/// degrade gracefully inside their stages; generation and configuration
/// failures terminate the request with the error terminal state but never
/// escape as raw errors.
pub struct Analyzer {
    extractor: ReferenceExtractor,
    retriever: ContextRetriever,
    invoker: GenerationInvoker,
    runtime: Option<Arc<dyn ModelRuntime>>,
}

impl Analyzer {
    pub fn new(store: Arc<dyn DocumentStore>, runtime: Option<Arc<dyn ModelRuntime>>) -> Self {
        Self::with_config(
            LibraryProfile::default(),
            RetrievalConfig::default(),
            SamplingConfig::default(),
            store,
            runtime,
        )
    }

    pub fn with_config(
        profile: LibraryProfile,
        retrieval: RetrievalConfig,
        sampling: SamplingConfig,
        store: Arc<dyn DocumentStore>,
        runtime: Option<Arc<dyn ModelRuntime>>,
    ) -> Self {
        Self {
            extractor: ReferenceExtractor::new(profile.clone()),
            retriever: ContextRetriever::with_config(store, profile, retrieval),
            invoker: GenerationInvoker::new(sampling),
            runtime,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult {
        info!(
            chars = request.code.len(),
            version = %request.library_version,
            "analyzing code"
        );

        let dedented = dedent(&request.code);
        let references = self.extractor.extract(&dedented);

        let mut unique: Vec<String> = Vec::new();
        for reference in &references {
            if !unique.contains(&reference.name) {
                unique.push(reference.name.clone());
            }
        }
        info!(count = unique.len(), functions = ?unique, "unique target-library functions");

        let mut context: HashMap<String, Vec<ContextChunk>> = HashMap::new();
        for name in &unique {
            let chunks = self
                .retriever
                .retrieve(name, &request.library_version)
                .await;
            context.insert(name.clone(), chunks);
        }

        // Only the top chunk's content per function is exposed to the caller.
        let summary: HashMap<String, Vec<String>> = context
            .iter()
            .filter(|(_, chunks)| !chunks.is_empty())
            .map(|(name, chunks)| (name.clone(), vec![chunks[0].content.clone()]))
            .collect();

        let runtime = match &self.runtime {
            Some(runtime) if runtime.is_available().await => Arc::clone(runtime),
            _ => {
                return AnalysisResult::failure(summary, "Model runtime unavailable");
            }
        };

        match self.generate(runtime.as_ref(), &request.code, &context).await {
            Ok((parsed, raw)) => {
                if parsed.explanation.is_empty() || parsed.is_no_op() {
                    AnalysisResult::no_op(summary)
                } else {
                    AnalysisResult::success(parsed.modernized_code, summary, parsed.explanation, raw)
                }
            }
            Err(e) => {
                error!("Model call failed: {e}");
                AnalysisResult::failure(summary, e.to_string())
            }
        }
    }

    /// The full generation call path: template selection, invocation and
    /// response parsing. Configuration and runtime errors surface here and
    /// are mapped to the error terminal state by the caller.
    async fn generate(
        &self,
        runtime: &dyn ModelRuntime,
        code: &str,
        context: &HashMap<String, Vec<ContextChunk>>,
    ) -> Result<(ParsedResponse, String)> {
        let builder = PromptBuilder::for_model(runtime.model_id())?;
        let prompt = builder.build(code, context);
        let raw = self.invoker.invoke(runtime, &prompt).await?;
        Ok((ResponseParser::parse(&raw, code), raw))
    }

    pub async fn is_connected(&self) -> bool {
        self.retriever.is_connected().await
    }

    pub async fn is_model_available(&self) -> bool {
        match &self.runtime {
            Some(runtime) => runtime.is_available().await,
            None => false,
        }
    }

    pub async fn health(&self) -> HealthReport {
        HealthReport {
            store_connected: self.is_connected().await,
            model_available: self.is_model_available().await,
        }
    }
}

/// Strips the longest common leading whitespace from every line, ignoring
/// whitespace-only lines when computing the margin.
fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        let indent = &line[..line.len() - trimmed.len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => {
                let common = current
                    .bytes()
                    .zip(indent.bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                &current[..common]
            }
        });
    }

    let margin = margin.unwrap_or("");
    if margin.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.strip_prefix(margin).unwrap_or(line));
    }
    out
}
