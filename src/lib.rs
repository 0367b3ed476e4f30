//! # Memory Assistant
//!
//! A semantic memory store: short natural-language statements are embedded,
//! kept in a vector index with metadata, and recalled later by meaning.
//!
//! ## Features
//!
//! - **Local embeddings:** fastembed all-MiniLM-L6-v2, or Azure OpenAI
//! - **Vector index:** PostgreSQL + pgvector, or an in-process map
//! - **Relevance policy:** cosine threshold, top-k and metadata filters
//! - **HTTP API:** bearer-authenticated store and search endpoints

pub mod config;
pub mod core;
pub mod database;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod memory;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{Error, Result};
pub use memory::{MemoryService, RecallOptions, RememberRequest};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
