//! Core types used across the application
//!
//! The memory data model shared by the embedder, the index adapters and the
//! service layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Ordinal priority of a memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Low priority
    Low,
    /// Medium priority (default)
    #[default]
    Medium,
    /// High priority
    High,
}

impl Importance {
    /// Stable string form, used for storage and filtering
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
        }
    }
}

impl std::str::FromStr for Importance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Importance::Low),
            "medium" => Ok(Importance::Medium),
            "high" => Ok(Importance::High),
            _ => Err(Error::InvalidInput(format!(
                "Invalid importance: {}. Valid options: low, medium, high",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything stored alongside a vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetadata {
    /// The original statement
    pub text: String,
    /// Free-text classification tag
    pub category: Option<String>,
    /// Salient terms associated with the statement
    pub entities: Vec<String>,
    /// Priority signal
    pub importance: Importance,
    /// When the memory was created
    pub created_at: DateTime<Utc>,
}

impl MemoryMetadata {
    /// UTC calendar day of creation as `YYYY-MM-DD`
    pub fn date_created(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

/// A stored memory, including its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique memory ID, never reused
    pub id: Uuid,
    /// Embedding of `metadata.text`
    pub vector: Vec<f32>,
    /// Stored attributes
    #[serde(flatten)]
    pub metadata: MemoryMetadata,
}

/// A ranked match returned by recall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// ID of the matched memory
    pub id: Uuid,
    /// Cosine similarity in [-1, 1], higher is better
    pub score: f32,
    /// Stored attributes of the matched memory
    #[serde(flatten)]
    pub metadata: MemoryMetadata,
}

/// Split a comma-separated entity list, dropping blanks
pub fn parse_entities(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Cosine similarity of two equal-length vectors; zero-norm input scores 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importance_parsing() {
        assert_eq!("low".parse::<Importance>().unwrap(), Importance::Low);
        assert_eq!(" HIGH ".parse::<Importance>().unwrap(), Importance::High);
        assert_eq!("Medium".parse::<Importance>().unwrap(), Importance::Medium);
        assert!("urgent".parse::<Importance>().is_err());
        assert_eq!(Importance::default(), Importance::Medium);
    }

    #[test]
    fn test_parse_entities() {
        assert_eq!(parse_entities("John, marketing"), vec!["John", "marketing"]);
        assert_eq!(parse_entities(" , Sarah,, "), vec!["Sarah"]);
        assert!(parse_entities("").is_empty());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_date_created() {
        let metadata = MemoryMetadata {
            text: "Dentist".into(),
            category: None,
            entities: vec![],
            importance: Importance::High,
            created_at: "2024-03-05T23:59:00Z".parse().unwrap(),
        };
        assert_eq!(metadata.date_created(), "2024-03-05");
    }
}
