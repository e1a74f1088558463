// ABOUTME: Assembles the model prompt: fixed system instruction, optional
// ABOUTME: retrieved context, and the per-model-family chat template.
use deprag_core::{ContextChunk, DepragError, Result};
use std::collections::HashMap;

pub const CODE_MARKER: &str = "### Refactored Code";
pub const CONTEXT_MARKER: &str = "### Deprecation Context";
pub const INPUT_MARKER: &str = "### INPUT CODE:";

/// Supported model families. The closed set is checked when the prompt is
/// built; an unrecognized model id fails the request rather than silently
/// picking a default template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Gemma2,
    TinyLlama,
}

impl ModelFamily {
    pub fn from_model_id(model_id: &str) -> Result<Self> {
        if model_id.contains("gemma-2-2b-it") {
            Ok(ModelFamily::Gemma2)
        } else if model_id.contains("tinyllama-1.1b-chat") {
            Ok(ModelFamily::TinyLlama)
        } else {
            Err(DepragError::Configuration(format!(
                "Unsupported model: {model_id}"
            )))
        }
    }
}

/// Fully rendered prompt text plus the stop sequences that terminate the
/// model's turn under that template.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub stop: Vec<String>,
}

pub struct PromptBuilder {
    family: ModelFamily,
}

impl PromptBuilder {
    pub fn new(family: ModelFamily) -> Self {
        Self { family }
    }

    pub fn for_model(model_id: &str) -> Result<Self> {
        Ok(Self::new(ModelFamily::from_model_id(model_id)?))
    }

    pub fn build(&self, code: &str, context: &HashMap<String, Vec<ContextChunk>>) -> Prompt {
        let system = self.system_instruction(context);
        match self.family {
            ModelFamily::Gemma2 => {
                let user = format!("{system}\n\n{INPUT_MARKER}\n```python\n{code}\n```");
                Prompt {
                    text: format!(
                        "<bos><start_of_turn>user\n{user}<end_of_turn>\n<start_of_turn>model\n"
                    ),
                    stop: vec!["<end_of_turn>".to_string(), "<start_of_turn>".to_string()],
                }
            }
            ModelFamily::TinyLlama => {
                let user = format!("{INPUT_MARKER}\n```python\n{code}\n```");
                Prompt {
                    text: format!(
                        "<|system|>\n{system}</s>\n<|user|>\n{user}</s>\n<|assistant|>\n"
                    ),
                    stop: vec!["</s>".to_string(), "<|user|>".to_string()],
                }
            }
        }
    }

    fn system_instruction(&self, context: &HashMap<String, Vec<ContextChunk>>) -> String {
        let mut prompt = format!(
            "You are a Python code refactoring tool for NumPy. Your task is to replace only \
             the deprecated functions in the given code snippet with their modern equivalents.\n\
             Your response must be structured with two markdown sections:\n\
             1. A '{CODE_MARKER}' section containing ONLY the updated Python code block. \
             Do not change the code's logic. Do not add imports. Do not add comments.\n\
             2. A '{CONTEXT_MARKER}' section containing a brief explanation of the deprecation.\n \
             If no functions are deprecated, return the original code and state that no changes \
             were needed in the context section."
        );

        let mut snippets: Vec<String> = context
            .iter()
            .filter_map(|(func, chunks)| {
                let top = chunks.first()?;
                if top.similarity_score <= 0.5 {
                    return None;
                }
                // Only inject passages that actually talk about deprecation;
                // anything else pollutes the prompt.
                let lower = top.content.to_lowercase();
                if !lower.contains("deprecated") && !lower.contains("replacement") {
                    return None;
                }
                let snippet: String = top.content.chars().take(150).collect();
                Some(format!("- {func}: {snippet}..."))
            })
            .collect();
        snippets.sort();

        if !snippets.is_empty() {
            prompt.push_str("\n\nRelevant context (use only if applicable):\n");
            prompt.push_str(&snippets.join("\n"));
        }

        prompt
    }
}
