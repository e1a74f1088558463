use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A candidate reference to a target-library function found in source text.
///
/// `name` is the best-effort fully-qualified symbol (e.g. `np.asscalar`),
/// `call` the literal source expression, `line` the 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionReference {
    pub name: String,
    pub line: u32,
    pub call: String,
}

/// One deprecation-context passage returned by the document store,
/// scored in `[0, 1]` where higher is more relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextChunk {
    pub content: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub similarity_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub code: String,
    pub library_version: String,
}

/// Terminal result of one analysis. Exactly one of the three states holds:
/// success-with-changes, no-op, or error; the constructors below keep the
/// states from overlapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub modernized_code: String,
    #[serde(default)]
    pub retrieved_context: HashMap<String, Vec<String>>,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_model_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn success(
        modernized_code: String,
        retrieved_context: HashMap<String, Vec<String>>,
        explanation: String,
        raw_model_output: String,
    ) -> Self {
        Self {
            modernized_code,
            retrieved_context,
            explanation,
            raw_model_output: Some(raw_model_output),
            error: None,
        }
    }

    /// No deprecated usage required changes. Code and explanation are left
    /// empty; the caller still sees what context was gathered.
    pub fn no_op(retrieved_context: HashMap<String, Vec<String>>) -> Self {
        Self {
            modernized_code: String::new(),
            retrieved_context,
            explanation: String::new(),
            raw_model_output: None,
            error: None,
        }
    }

    pub fn failure(
        retrieved_context: HashMap<String, Vec<String>>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            modernized_code: String::new(),
            retrieved_context,
            explanation: String::new(),
            raw_model_output: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_no_op(&self) -> bool {
        self.error.is_none() && self.modernized_code.is_empty()
    }
}

/// Store-connectivity and model-availability flags for the health boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthReport {
    pub store_connected: bool,
    pub model_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_mutually_exclusive() {
        let success = AnalysisResult::success(
            "np.full_like(a, 0)".to_string(),
            HashMap::new(),
            "np.zeros_like replaced.".to_string(),
            "raw".to_string(),
        );
        assert!(!success.is_error());
        assert!(!success.is_no_op());

        let no_op = AnalysisResult::no_op(HashMap::new());
        assert!(no_op.is_no_op());
        assert!(!no_op.is_error());
        assert!(no_op.modernized_code.is_empty());
        assert!(no_op.explanation.is_empty());

        let failure = AnalysisResult::failure(HashMap::new(), "model exploded");
        assert!(failure.is_error());
        assert!(!failure.is_no_op());
        assert!(failure.modernized_code.is_empty());
    }

    #[test]
    fn result_serializes_with_wire_field_names() {
        let result = AnalysisResult::failure(HashMap::new(), "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("modernized_code").is_some());
        assert!(json.get("retrieved_context").is_some());
        assert!(json.get("explanation").is_some());
        assert_eq!(json.get("error").unwrap(), "boom");
        // Absent optionals are omitted entirely
        assert!(json.get("raw_model_output").is_none());
    }
}
