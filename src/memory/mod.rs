//! Memory module - embedding generation, caching, and recall
//!
//! Orchestrates embeddings (fastembed locally or Azure OpenAI), in-process
//! caching (moka), and similarity search over a `MemoryIndex`.

pub mod cache;
pub mod embedding;
pub mod service;

pub use cache::CachedEmbedder;
pub use embedding::{build_embedder, AzureOpenAiEmbedder, Embedder, LocalEmbedder};
pub use service::{MemoryService, RecallOptions, RememberRequest};
