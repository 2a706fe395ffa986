//! Query validation and breakdown
//!
//! A raw user string becomes a validated `Query`, which the
//! `QueryProcessor` turns into an ordered list of `SubQuery` values.

mod processor;

pub use processor::{Intent, QueryProcessor};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Query rejected before any work is done
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("query must not be empty")]
    Empty,
    #[error("query is too long ({len} characters, maximum {max})")]
    TooLong { len: usize, max: usize },
}

/// A validated, trimmed user query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// Trim and validate raw input; length is counted in characters
    pub fn parse(raw: &str, max_len: usize) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }
        let len = trimmed.chars().count();
        if len > max_len {
            return Err(ValidationError::TooLong { len, max: max_len });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One focused query derived from a `Query`; never blank
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubQuery(String);

impl SubQuery {
    /// Trimmed sub-query, or `None` when nothing is left
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Query> for SubQuery {
    fn from(query: &Query) -> Self {
        Self(query.0.clone())
    }
}

impl fmt::Display for SubQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let query = Query::parse("  quantum computing \n", 500).unwrap();
        assert_eq!(query.as_str(), "quantum computing");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Query::parse("", 500), Err(ValidationError::Empty));
        assert_eq!(Query::parse("   \t", 500), Err(ValidationError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let raw = "a".repeat(501);
        assert_eq!(
            Query::parse(&raw, 500),
            Err(ValidationError::TooLong { len: 501, max: 500 })
        );
        assert!(Query::parse(&"a".repeat(500), 500).is_ok());
    }

    #[test]
    fn test_length_counts_characters() {
        let raw = "é".repeat(10);
        assert!(Query::parse(&raw, 10).is_ok());
    }

    #[test]
    fn test_sub_query_rejects_blank() {
        assert!(SubQuery::new("  ").is_none());
        assert_eq!(SubQuery::new(" rust ").unwrap().as_str(), "rust");
    }

    #[test]
    fn test_serializes_as_string() {
        let sub = SubQuery::new("rust").unwrap();
        assert_eq!(serde_json::to_string(&sub).unwrap(), "\"rust\"");
    }
}
