pub mod analyzer;
pub mod invoker;
pub mod llama;
pub mod prompt;
pub mod response;

pub use analyzer::Analyzer;
pub use invoker::GenerationInvoker;
pub use llama::LlamaServerRuntime;
pub use prompt::{ModelFamily, Prompt, PromptBuilder};
pub use response::{ParsedResponse, ResponseParser};
