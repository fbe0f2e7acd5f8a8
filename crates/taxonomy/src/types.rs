//! Input records and search result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::date::CompactDate;
use crate::filter::SchemaTarget;
use crate::tree::{NodeId, NodeStats};

/// One raw typecode with optional compact dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypecodeRecord {
    pub code: String,
    #[serde(default)]
    pub created: Option<CompactDate>,
    #[serde(default)]
    pub modified: Option<CompactDate>,
}

impl TypecodeRecord {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            created: None,
            modified: None,
        }
    }

    /// Builds a record from spreadsheet-style date cells; invalid cells become `None`.
    pub fn with_raw_dates(code: impl Into<String>, created: &str, modified: &str) -> Self {
        Self {
            code: code.into(),
            created: CompactDate::parse(created),
            modified: CompactDate::parse(modified),
        }
    }
}

impl From<&str> for TypecodeRecord {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for TypecodeRecord {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&String> for TypecodeRecord {
    fn from(code: &String) -> Self {
        Self::new(code.as_str())
    }
}

/// How a matched product was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Leaf value node.
    Leaf,
    /// Non-leaf value node that is itself a complete input code.
    Intermediate,
    /// Flat code evaluated outside a tree.
    Code,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Intermediate => "intermediate",
            Self::Code => "code",
        }
    }
}

/// A product that passed the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMatch {
    /// Value node id for tree searches.
    pub node: Option<NodeId>,
    pub family: String,
    /// Remainder tokens, family excluded.
    pub tokens: Vec<String>,
    /// Canonical `"FAMILY TOK-TOK"` string.
    pub full_typecode: String,
    /// Unpadded token-length vector.
    pub schema: Vec<usize>,
    pub matched_schemas: Vec<SchemaTarget>,
    pub kind: MatchKind,
    /// Canonical offset of the last token (tree searches).
    pub position: Option<usize>,
    pub stats: Option<NodeStats>,
}

/// Search results over a tree or a flat code list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub matches: Vec<ProductMatch>,
    /// Number of candidates evaluated.
    pub total_checked: usize,
    pub searched_families: Vec<String>,
    /// Value occurrences for the query's analysis slice, if one was given.
    pub group_values: Option<BTreeMap<String, usize>>,
}

impl SearchResult {
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Matched share of checked candidates in percent, rounded to two decimals.
    pub fn match_percentage(&self) -> f64 {
        if self.total_checked == 0 {
            return 0.0;
        }
        let percentage = self.matches.len() as f64 / self.total_checked as f64 * 100.0;
        (percentage * 100.0).round() / 100.0
    }
}
