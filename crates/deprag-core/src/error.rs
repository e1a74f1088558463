use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepragError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Model runtime unavailable")]
    ModelUnavailable,

    #[error("Document store unavailable")]
    StoreUnavailable,
}

pub type Result<T> = std::result::Result<T, DepragError>;
