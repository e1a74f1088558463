use crate::prompt::Prompt;
use deprag_core::{ModelRuntime, Result, SamplingConfig, SamplingParams};
use tracing::info;

/// Calls the model runtime with fixed decoding parameters and extracts the
/// first completion's text. A missing or empty completion degrades to a
/// textual marker string; a thrown runtime error propagates and is caught
/// one level up, where the orchestrator wraps the whole call path.
pub struct GenerationInvoker {
    sampling: SamplingConfig,
}

impl GenerationInvoker {
    pub fn new(sampling: SamplingConfig) -> Self {
        Self { sampling }
    }

    pub async fn invoke(&self, runtime: &dyn ModelRuntime, prompt: &Prompt) -> Result<String> {
        let params = SamplingParams {
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
            stop: prompt.stop.clone(),
        };

        let generation = runtime.generate(&prompt.text, &params).await?;
        let text = generation
            .completions
            .first()
            .map(|c| c.text.trim().to_string())
            .unwrap_or_else(|| "Model returned empty response".to_string());
        info!(chars = text.len(), "model generated output");
        Ok(text)
    }
}

impl Default for GenerationInvoker {
    fn default() -> Self {
        Self::new(SamplingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deprag_core::{Completion, DepragError, Generation};

    struct FixedRuntime {
        completions: Vec<Completion>,
        fail: bool,
    }

    #[async_trait]
    impl ModelRuntime for FixedRuntime {
        async fn generate(&self, _prompt: &str, params: &SamplingParams) -> Result<Generation> {
            assert_eq!(params.max_tokens, 256);
            assert_eq!(params.temperature, 0.0);
            if self.fail {
                return Err(DepragError::Generation("backend exploded".to_string()));
            }
            Ok(Generation {
                completions: self.completions.clone(),
            })
        }

        fn model_id(&self) -> &str {
            "gemma-2-2b-it"
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    fn prompt() -> Prompt {
        Prompt {
            text: "prompt".to_string(),
            stop: vec!["<end_of_turn>".to_string()],
        }
    }

    #[tokio::test]
    async fn first_completion_is_trimmed() {
        let runtime = FixedRuntime {
            completions: vec![
                Completion {
                    text: "  answer one \n".to_string(),
                },
                Completion {
                    text: "answer two".to_string(),
                },
            ],
            fail: false,
        };
        let output = GenerationInvoker::default()
            .invoke(&runtime, &prompt())
            .await
            .unwrap();
        assert_eq!(output, "answer one");
    }

    #[tokio::test]
    async fn empty_completion_list_yields_marker() {
        let runtime = FixedRuntime {
            completions: vec![],
            fail: false,
        };
        let output = GenerationInvoker::default()
            .invoke(&runtime, &prompt())
            .await
            .unwrap();
        assert_eq!(output, "Model returned empty response");
    }

    #[tokio::test]
    async fn runtime_errors_propagate_to_the_caller() {
        let runtime = FixedRuntime {
            completions: vec![],
            fail: true,
        };
        let result = GenerationInvoker::default().invoke(&runtime, &prompt()).await;
        assert!(matches!(result, Err(DepragError::Generation(_))));
    }
}
