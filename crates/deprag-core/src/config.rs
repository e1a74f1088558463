// ABOUTME: Configuration for the analysis pipeline: the target-library
// ABOUTME: profile plus retrieval, sampling and collaborator endpoint knobs.
use serde::{Deserialize, Serialize};

/// Everything the pipeline knows about the library whose deprecated usage
/// is being analyzed: its module names, the local aliases it is commonly
/// bound to, and the array/matrix method names used to attribute bare
/// attribute chains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryProfile {
    /// Canonical module name, e.g. "numpy".
    pub name: String,
    /// Companion modules resolved the same way, e.g. "numpy_financial".
    pub companion_modules: Vec<String>,
    /// Local names recognized as bindings of the library.
    pub aliases: Vec<String>,
    /// Conventional short alias qualified names are rewritten to.
    pub short_alias: String,
    /// Method names attributed to the library's array API when seen in an
    /// otherwise unresolvable attribute chain.
    pub method_names: Vec<String>,
}

impl LibraryProfile {
    pub fn numpy() -> Self {
        Self {
            name: "numpy".to_string(),
            companion_modules: vec!["numpy_financial".to_string()],
            aliases: ["np", "numpy", "npf", "numpy_financial"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            short_alias: "np".to_string(),
            method_names: [
                "mean", "std", "sum", "min", "max", "var", "cumprod", "cumsum", "argsort",
                "sort", "tostring", "tofile", "astype", "reshape", "flatten", "ravel",
                "transpose", "swapaxes", "squeeze",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }

    /// Whether an imported module name belongs to this library.
    pub fn matches_module(&self, module: &str) -> bool {
        module.contains(&self.name) || self.companion_modules.iter().any(|m| m == module)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.iter().any(|a| a == name)
    }

    /// Rewrite a qualified name's library prefix to the short alias,
    /// e.g. `numpy.asscalar` -> `np.asscalar`.
    pub fn normalize_prefix(&self, qualified: &str) -> String {
        qualified.replace(&format!("{}.", self.name), &format!("{}.", self.short_alias))
    }
}

impl Default for LibraryProfile {
    fn default() -> Self {
        Self::numpy()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Nearest neighbors requested per query variant.
    pub top_k_per_variant: usize,
    /// Chunks retained per function after merge and rank.
    pub max_chunks: usize,
    /// Minimum `1 - distance` similarity to accept a neighbor.
    pub similarity_threshold: f32,
    /// Content prefix length used as the dedup fingerprint.
    pub fingerprint_len: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k_per_variant: 3,
            max_chunks: 3,
            similarity_threshold: 0.4,
            fingerprint_len: 200,
        }
    }
}

/// Fixed decoding parameters for the generation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.0,
        }
    }
}

/// Endpoint settings for the semantic document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    pub collection: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            collection: "numpy_docs".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Endpoint settings for the model runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            model: "gemma-2-2b-it".to_string(),
            timeout_secs: 120,
        }
    }
}
