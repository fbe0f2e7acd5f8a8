//! Candidate context for predicate evaluation.

use crate::error::{Result, TaxonomyError};
use crate::schema::token_lengths;
use crate::tokenize::{canonical_typecode, split_typecode, token_len};
use crate::tree::{NodeId, TaxonomyTree};

/// Everything the predicates need to judge one product.
///
/// The schema is the unpadded remainder-token length vector, so its length
/// is the product's actual group count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    family: String,
    tokens: Vec<String>,
    canonical: String,
    search_text: String,
    schema: Vec<usize>,
    last_offset: Option<usize>,
    group: Option<String>,
}

impl Candidate {
    /// Builds a candidate from a family and its remainder tokens.
    pub fn new(family: impl Into<String>, tokens: Vec<String>) -> Self {
        let family = family.into();
        let canonical = canonical_typecode(&family, &tokens);
        let search_text = tokens.join("-");
        let schema = token_lengths(&tokens);
        Self {
            family,
            tokens,
            canonical,
            search_text,
            schema,
            last_offset: None,
            group: None,
        }
    }

    /// Tokenizes a raw code; codes with fewer than two tokens yield `None`.
    pub fn from_code(raw: &str) -> Option<Self> {
        let mut tokens = split_typecode(raw);
        if tokens.len() < 2 {
            return None;
        }
        let family = tokens.remove(0);
        Some(Self::new(family, tokens))
    }

    /// Builds the candidate for a value node, anchored at the node's own offset.
    pub fn from_node(tree: &TaxonomyTree, id: NodeId) -> Result<Self> {
        let node = tree.node(id).ok_or(TaxonomyError::NodeNotFound(id))?;
        let mut codes = tree.path_codes(id)?;
        if codes.len() < 2 {
            return Err(TaxonomyError::InvalidInput(format!(
                "node {id:?} is not below a family"
            )));
        }
        let family = codes.remove(0);
        let mut candidate = Self::new(family, codes);
        candidate.last_offset = Some(node.position());
        candidate.group = node.annotations().group().map(str::to_string);
        Ok(candidate)
    }

    /// Sets the group tag used by the group filter.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Remainder tokens, family excluded.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The 1-based group token, if present.
    pub fn group_token(&self, group: usize) -> Option<&str> {
        let index = group.checked_sub(1)?;
        self.tokens.get(index).map(String::as_str)
    }

    /// Canonical `"FAMILY TOK-TOK"` string.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Remainder tokens joined with '-', used by contains rules.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn schema(&self) -> &[usize] {
        &self.schema
    }

    pub fn family_len(&self) -> usize {
        token_len(&self.family)
    }

    /// Known canonical offset of the last token (tree candidates only).
    pub fn last_offset(&self) -> Option<usize> {
        self.last_offset
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}
