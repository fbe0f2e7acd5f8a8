//! Absolute-position rules over the canonical string (`"5=M:prefix,11=PX"`).

use serde::{Deserialize, Serialize};

use super::parse::{char_slice, parse_index, parse_value, split_equals, split_parts};
use crate::error::Result;
use crate::tokenize::token_len;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRule {
    /// 1-based offset into the canonical string.
    pub position: usize,
    pub value: String,
    pub is_prefix: bool,
}

impl PositionRule {
    fn parse(filter: &'static str, part: &str) -> Result<Self> {
        let (position_raw, value_raw) = split_equals(filter, part)?;
        let position = parse_index(filter, position_raw, "position")?;
        let (value, is_prefix) = parse_value(filter, value_raw)?;
        Ok(Self {
            position,
            value,
            is_prefix,
        })
    }

    /// `None` if the span runs past the string, otherwise whether it matches.
    ///
    /// An exact (non-prefix) match also requires a token boundary right after
    /// the span: end of string or a non-alphanumeric character.
    pub fn probe(&self, canonical: &str) -> Option<bool> {
        let start = self.position.checked_sub(1)?;
        let len = token_len(&self.value);
        let actual = char_slice(canonical, start, len)?;
        if actual != self.value {
            return Some(false);
        }
        if self.is_prefix {
            return Some(true);
        }
        let next = canonical.chars().nth(start + len);
        Some(!next.is_some_and(char::is_alphanumeric))
    }
}

/// A list of absolute-position rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionFilter {
    rules: Vec<PositionRule>,
}

impl PositionFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_as("position", raw)
    }

    /// Parses with a caller-chosen category name for error reporting.
    pub(crate) fn parse_as(filter: &'static str, raw: &str) -> Result<Self> {
        let rules = split_parts(raw, ',')
            .map(|part| PositionRule::parse(filter, part))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PositionRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every rule must match; a span past the end fails.
    pub fn matches_all(&self, canonical: &str) -> bool {
        self.rules
            .iter()
            .all(|rule| rule.probe(canonical).unwrap_or(false))
    }

    /// Any rule matches; spans past the end are skipped.
    pub fn matches_any(&self, canonical: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.probe(canonical) == Some(true))
    }
}
