// ABOUTME: ModelRuntime backed by a llama.cpp server's OpenAI-compatible
// ABOUTME: completions endpoint.
use async_trait::async_trait;
use deprag_core::{
    Completion, DepragError, Generation, ModelRuntime, Result, RuntimeConfig, SamplingParams,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct LlamaServerRuntime {
    config: RuntimeConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: usize,
    temperature: f32,
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

impl LlamaServerRuntime {
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DepragError::Generation(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl ModelRuntime for LlamaServerRuntime {
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<Generation> {
        let request = CompletionsRequest {
            model: &self.config.model,
            prompt,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stop: &params.stop,
        };

        let response = self
            .client
            .post(format!("{}/v1/completions", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| DepragError::Generation(format!("Runtime request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DepragError::Generation(format!(
                "Runtime returned {status}: {body}"
            )));
        }

        let parsed: CompletionsResponse = response
            .json()
            .await
            .map_err(|e| DepragError::Generation(format!("Malformed runtime response: {e}")))?;

        Ok(Generation {
            completions: parsed
                .choices
                .into_iter()
                .map(|choice| Completion { text: choice.text })
                .collect(),
        })
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.config.base_url);
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
