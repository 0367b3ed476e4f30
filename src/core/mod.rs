//! Core module - Fundamental traits and types
//!
//! - Data model for stored memories and ranked matches
//! - Typed metadata filters
//! - The `MemoryIndex` trait implemented by every vector backend

pub mod filter;
pub mod storage;
pub mod types;

pub use filter::{Condition, FilterField, FilterOp, MetadataFilter};
pub use storage::{IndexEntry, IndexMatch, IndexStats, MemoryIndex};
pub use types::*;
