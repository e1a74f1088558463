pub mod chroma;
pub mod retriever;

pub use chroma::ChromaStore;
pub use retriever::ContextRetriever;
