//! Metadata filters
//!
//! A filter is an ordered list of `(field, operator, value)` conditions that
//! must all hold. Index adapters apply it to candidates before ranking, so a
//! query returns the top-k of the filtered set.

use serde::{Deserialize, Serialize};

use super::types::MemoryMetadata;

/// Metadata field a condition tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    /// `category` tag
    Category,
    /// `importance` level
    Importance,
    /// Any element of `entities`
    Entities,
    /// UTC day of creation, `YYYY-MM-DD`
    DateCreated,
}

/// Comparison applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality
    Eq,
    /// Not equal; a missing value counts as not equal
    Ne,
    /// Case-insensitive substring
    Contains,
}

/// A single predicate over one metadata field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Field under test
    pub field: FilterField,
    /// Comparison
    pub op: FilterOp,
    /// Right-hand side
    pub value: String,
}

impl Condition {
    /// Create a new condition
    pub fn new(field: FilterField, op: FilterOp, value: impl Into<String>) -> Self {
        Condition {
            field,
            op,
            value: value.into(),
        }
    }

    /// Evaluate the condition against stored metadata
    pub fn matches(&self, metadata: &MemoryMetadata) -> bool {
        match self.field {
            FilterField::Category => self.test_scalar(metadata.category.as_deref()),
            FilterField::Importance => self.test_scalar(Some(metadata.importance.as_str())),
            FilterField::DateCreated => self.test_scalar(Some(&metadata.date_created())),
            FilterField::Entities => match self.op {
                FilterOp::Eq => metadata.entities.iter().any(|e| *e == self.value),
                FilterOp::Ne => metadata.entities.iter().all(|e| *e != self.value),
                FilterOp::Contains => {
                    let needle = self.value.to_lowercase();
                    metadata
                        .entities
                        .iter()
                        .any(|e| e.to_lowercase().contains(&needle))
                }
            },
        }
    }

    fn test_scalar(&self, actual: Option<&str>) -> bool {
        match (self.op, actual) {
            (FilterOp::Eq, Some(v)) => v == self.value,
            (FilterOp::Eq, None) => false,
            (FilterOp::Ne, Some(v)) => v != self.value,
            (FilterOp::Ne, None) => true,
            (FilterOp::Contains, Some(v)) => v.to_lowercase().contains(&self.value.to_lowercase()),
            (FilterOp::Contains, None) => false,
        }
    }
}

/// Conjunction of conditions; empty matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    conditions: Vec<Condition>,
}

impl MetadataFilter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Require `field == value`
    pub fn eq(self, field: FilterField, value: impl Into<String>) -> Self {
        self.and(Condition::new(field, FilterOp::Eq, value))
    }

    /// Conditions in evaluation order
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether the filter has no conditions
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate all conditions against stored metadata
    pub fn matches(&self, metadata: &MemoryMetadata) -> bool {
        self.conditions.iter().all(|c| c.matches(metadata))
    }
}

impl Extend<Condition> for MetadataFilter {
    fn extend<T: IntoIterator<Item = Condition>>(&mut self, iter: T) {
        self.conditions.extend(iter);
    }
}
