//! Group-level rules.
//!
//! A group is a 1-based index into the remainder tokens. Supported forms:
//! - start offset: `"1=5,2=9"`
//! - content: `"1=M313,3=05:prefix"` (also used for exclusions)
//! - relative position: `"3:1=M|5:2-3=PX:prefix"`, `,` is AND and `|` is OR
//! - slice: `"3:1"` or `"3:1-2"` for value analysis

use serde::{Deserialize, Serialize};

use super::parse::{
    char_slice, parse_index, parse_number, parse_value, split_assignment, split_equals, split_parts,
};
use super::Candidate;
use crate::error::{Result, TaxonomyError};
use crate::position::group_start;
use crate::tokenize::token_len;

// ---------------------------------------------------------------------------
// Group start offsets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStartRule {
    pub group: usize,
    /// Expected 1-based offset in the canonical string.
    pub start: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupStartFilter {
    rules: Vec<GroupStartRule>,
}

impl GroupStartFilter {
    const FILTER: &'static str = "group_start";

    pub fn parse(raw: &str) -> Result<Self> {
        let rules = split_parts(raw, ',')
            .map(|part| {
                let (group_raw, start_raw) = split_equals(Self::FILTER, part)?;
                Ok(GroupStartRule {
                    group: parse_index(Self::FILTER, group_raw, "group")?,
                    start: parse_index(Self::FILTER, start_raw, "start position")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[GroupStartRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Offsets come from the candidate's known last-token offset when
    /// available, otherwise from the family length.
    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.rules.iter().all(|rule| {
            group_start(
                candidate.family_len(),
                candidate.schema(),
                candidate.last_offset(),
                rule.group,
            ) == Some(rule.start)
        })
    }
}

// ---------------------------------------------------------------------------
// Group content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupValueRule {
    pub group: usize,
    pub value: String,
    pub is_prefix: bool,
}

impl GroupValueRule {
    /// `None` if the group does not exist, otherwise whether it matches.
    pub fn probe(&self, candidate: &Candidate) -> Option<bool> {
        let token = candidate.group_token(self.group)?;
        Some(if self.is_prefix {
            token.starts_with(self.value.as_str())
        } else {
            token == self.value
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupValueFilter {
    rules: Vec<GroupValueRule>,
}

impl GroupValueFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_as("group_content", raw)
    }

    pub(crate) fn parse_as(filter: &'static str, raw: &str) -> Result<Self> {
        let rules = split_parts(raw, ',')
            .map(|part| {
                let (group_raw, value_raw) = split_equals(filter, part)?;
                let group = parse_index(filter, group_raw, "group")?;
                let (value, is_prefix) = parse_value(filter, value_raw)?;
                Ok(GroupValueRule {
                    group,
                    value,
                    is_prefix,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[GroupValueRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every rule must match; a missing group fails.
    pub fn matches_all(&self, candidate: &Candidate) -> bool {
        self.rules
            .iter()
            .all(|rule| rule.probe(candidate).unwrap_or(false))
    }

    /// Any rule matches; missing groups are skipped.
    pub fn matches_any(&self, candidate: &Candidate) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.probe(candidate) == Some(true))
    }
}

// ---------------------------------------------------------------------------
// Relative position inside a group
// ---------------------------------------------------------------------------

/// Where a relative span starts inside its group token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStart {
    /// 1-based offset from the start of the token.
    At(usize),
    /// The span ends at the token's last character (`-1`).
    FromEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPositionRule {
    pub group: usize,
    pub start: SpanStart,
    /// Inclusive 1-based end; only meaningful with `SpanStart::At`.
    pub end: usize,
    pub value: String,
    pub negate: bool,
    pub is_prefix: bool,
}

impl GroupPositionRule {
    const FILTER: &'static str = "group_position";

    fn parse(part: &str) -> Result<Self> {
        let (group_raw, rest) = part.split_once(':').ok_or_else(|| {
            TaxonomyError::filter(Self::FILTER, format!("expected 'group:position=value' in {part:?}"))
        })?;
        let group = parse_index(Self::FILTER, group_raw, "group")?;
        let (span_raw, negate, value_raw) = split_assignment(Self::FILTER, rest)?;
        let (value, is_prefix) = parse_value(Self::FILTER, value_raw)?;
        let value_len = token_len(&value);

        let (start, end) = if span_raw == "-1" {
            (SpanStart::FromEnd, value_len)
        } else if let Some((start_raw, end_raw)) = span_raw.split_once('-') {
            let start = parse_index(Self::FILTER, start_raw, "start position")?;
            let end = parse_index(Self::FILTER, end_raw, "end position")?;
            if start > end {
                return Err(TaxonomyError::filter(
                    Self::FILTER,
                    format!("start {start} exceeds end {end}"),
                ));
            }
            if end - start + 1 != value_len {
                return Err(TaxonomyError::filter(
                    Self::FILTER,
                    format!(
                        "range length {} does not match value length {value_len}",
                        end - start + 1
                    ),
                ));
            }
            (SpanStart::At(start), end)
        } else {
            let start = parse_index(Self::FILTER, span_raw, "start position")?;
            (SpanStart::At(start), start + value_len - 1)
        };

        Ok(Self {
            group,
            start,
            end,
            value,
            negate,
            is_prefix,
        })
    }

    /// A missing group or a span outside the token fails, negated or not.
    pub fn matches(&self, candidate: &Candidate) -> bool {
        let Some(token) = candidate.group_token(self.group) else {
            return false;
        };
        let token_chars = token_len(token);
        let actual = match self.start {
            SpanStart::FromEnd => {
                let len = token_len(&self.value);
                let Some(start) = token_chars.checked_sub(len) else {
                    return false;
                };
                char_slice(token, start, len)
            }
            SpanStart::At(start) => {
                if start > token_chars || self.end > token_chars {
                    return false;
                }
                let Some(offset) = start.checked_sub(1) else {
                    return false;
                };
                let Some(width) = self.end.checked_sub(start) else {
                    return false;
                };
                char_slice(token, offset, width + 1)
            }
        };
        let Some(actual) = actual else {
            return false;
        };
        let hit = if self.is_prefix {
            actual.starts_with(self.value.as_str())
        } else {
            actual == self.value
        };
        hit != self.negate
    }
}

/// OR of AND-groups of relative-position rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupPositionFilter {
    any_of: Vec<Vec<GroupPositionRule>>,
}

impl GroupPositionFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        let any_of = split_parts(raw, '|')
            .map(|alternative| {
                split_parts(alternative, ',')
                    .map(GroupPositionRule::parse)
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|rules| !rules.is_empty())
            .collect();
        Ok(Self { any_of })
    }

    pub fn alternatives(&self) -> &[Vec<GroupPositionRule>] {
        &self.any_of
    }

    pub fn is_empty(&self) -> bool {
        self.any_of.is_empty()
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        if self.any_of.is_empty() {
            return true;
        }
        self.any_of
            .iter()
            .any(|rules| rules.iter().all(|rule| rule.matches(candidate)))
    }
}

// ---------------------------------------------------------------------------
// Group slices for analysis and mapping
// ---------------------------------------------------------------------------

/// A character span inside one group (`"3:1"`, `"3:1-2"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupSlice {
    pub group: usize,
    pub start: usize,
    pub end: usize,
}

impl GroupSlice {
    const FILTER: &'static str = "group_slice";

    pub fn parse(raw: &str) -> Result<Self> {
        let (group_raw, span_raw) = raw.trim().split_once(':').ok_or_else(|| {
            TaxonomyError::filter(Self::FILTER, format!("expected 'group:start[-end]' in {raw:?}"))
        })?;
        let group = parse_index(Self::FILTER, group_raw, "group")?;
        let (start, end) = match span_raw.split_once('-') {
            Some((start_raw, end_raw)) => {
                let start = parse_index(Self::FILTER, start_raw, "start position")?;
                let end: usize = parse_number(Self::FILTER, end_raw)?;
                if start > end {
                    return Err(TaxonomyError::filter(
                        Self::FILTER,
                        format!("start {start} exceeds end {end}"),
                    ));
                }
                (start, end)
            }
            None => {
                let start = parse_index(Self::FILTER, span_raw, "start position")?;
                (start, start)
            }
        };
        Ok(Self { group, start, end })
    }

    /// Extracts the slice from remainder tokens; the end is clamped to the
    /// token, a start past the token yields `None`.
    pub fn extract<'a, S: AsRef<str>>(&self, tokens: &'a [S]) -> Option<&'a str> {
        let token = tokens.get(self.group.checked_sub(1)?)?.as_ref();
        let token_chars = token_len(token);
        if self.start > token_chars {
            return None;
        }
        let end = self.end.min(token_chars);
        let width = end.checked_sub(self.start)?;
        char_slice(token, self.start.checked_sub(1)?, width + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(code: &str) -> Candidate {
        Candidate::from_code(code).expect("candidate")
    }

    #[test]
    fn group_start_forward_and_anchored() {
        let filter = GroupStartFilter::parse("1=5,2=9").expect("parse");
        assert!(filter.matches(&candidate("ABC-123-XY")));
        assert!(!filter.matches(&candidate("ABC-1234-XY")));
        assert!(!GroupStartFilter::parse("3=13").expect("parse").matches(&candidate("ABC-1-2-3")));
        assert!(GroupStartFilter::parse("3=9").expect("parse").matches(&candidate("ABC-1-2-3")));
        assert!(GroupStartFilter::parse("0=5").is_err());
    }

    #[test]
    fn group_content_exact_and_prefix() {
        let filter = GroupValueFilter::parse("1=1:prefix").expect("parse");
        assert!(filter.matches_all(&candidate("ABC-123-XY")));
        assert!(filter.matches_all(&candidate("ABC-1234-XY")));

        let exact = GroupValueFilter::parse("2=XY").expect("parse");
        assert!(exact.matches_all(&candidate("ABC-123-XY")));
        assert!(!exact.matches_all(&candidate("ABC-123-XYZ")));
        assert!(!GroupValueFilter::parse("3=XY").expect("parse").matches_all(&candidate("ABC-123-XY")));
    }

    #[test]
    fn group_content_any_skips_missing_groups() {
        let filter = GroupValueFilter::parse("5=Z,1=123").expect("parse");
        assert!(filter.matches_any(&candidate("ABC-123-XY")));
        assert!(!GroupValueFilter::parse("5=Z").expect("parse").matches_any(&candidate("ABC-123-XY")));
    }

    #[test]
    fn parses_group_position_alternatives() {
        let filter = GroupPositionFilter::parse("1:2=A,2:1=X|3:2-3=PX:prefix").expect("parse");
        assert_eq!(filter.alternatives().len(), 2);
        assert_eq!(filter.alternatives()[0].len(), 2);
        let rule = &filter.alternatives()[1][0];
        assert_eq!(rule.start, SpanStart::At(2));
        assert_eq!(rule.end, 3);
        assert!(rule.is_prefix);
    }

    #[test]
    fn rejects_malformed_group_positions() {
        for raw in ["3=M", "0:1=M", "3:2-1=M", "3:1-3=MX", "3:1=", "3:x=M", "3:1M"] {
            assert!(GroupPositionFilter::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn group_position_matching() {
        let code = candidate("BCC-M423-0000-2A");
        assert!(GroupPositionFilter::parse("1:1=M").expect("parse").matches(&code));
        assert!(GroupPositionFilter::parse("1:2-3=42").expect("parse").matches(&code));
        assert!(GroupPositionFilter::parse("1:1!=X").expect("parse").matches(&code));
        assert!(!GroupPositionFilter::parse("1:1!=M").expect("parse").matches(&code));
        assert!(GroupPositionFilter::parse("3:-1=A").expect("parse").matches(&code));
        assert!(GroupPositionFilter::parse("1:-1=23").expect("parse").matches(&code));
        assert!(GroupPositionFilter::parse("2:1=X|1:1=M").expect("parse").matches(&code));
        assert!(!GroupPositionFilter::parse("2:1=X,1:1=M").expect("parse").matches(&code));
    }

    #[test]
    fn group_position_out_of_range_fails_even_negated() {
        let code = candidate("BCC-M423-2A");
        assert!(!GroupPositionFilter::parse("2:3=X").expect("parse").matches(&code));
        assert!(!GroupPositionFilter::parse("2:3!=X").expect("parse").matches(&code));
        assert!(!GroupPositionFilter::parse("2:2=AB").expect("parse").matches(&code));
        assert!(!GroupPositionFilter::parse("5:1!=X").expect("parse").matches(&code));
        assert!(!GroupPositionFilter::parse("2:-1=XYZ").expect("parse").matches(&code));
    }

    #[test]
    fn group_slices() {
        let tokens = ["M423", "0000", "2A"];
        assert_eq!(GroupSlice::parse("1:1").expect("parse").extract(&tokens), Some("M"));
        assert_eq!(GroupSlice::parse("1:2-3").expect("parse").extract(&tokens), Some("42"));
        assert_eq!(GroupSlice::parse("3:1-9").expect("parse").extract(&tokens), Some("2A"));
        assert_eq!(GroupSlice::parse("3:3").expect("parse").extract(&tokens), None);
        assert_eq!(GroupSlice::parse("4:1").expect("parse").extract(&tokens), None);
        assert!(GroupSlice::parse("3").is_err());
        assert!(GroupSlice::parse("3:2-1").is_err());
    }

    #[test]
    fn deserialized_zero_or_inverted_spans_never_match() {
        let code = candidate("BCC-M423-2A");
        for raw in [
            r#"{"group":1,"start":{"at":0},"end":1,"value":"M","negate":false,"is_prefix":false}"#,
            r#"{"group":1,"start":{"at":3},"end":1,"value":"M","negate":true,"is_prefix":false}"#,
        ] {
            let rule: GroupPositionRule = serde_json::from_str(raw).expect("deserialize");
            assert!(!rule.matches(&code), "{raw} should not match");
        }

        let tokens = ["M423", "0000", "2A"];
        for raw in [
            r#"{"group":1,"start":0,"end":2}"#,
            r#"{"group":1,"start":3,"end":1}"#,
            r#"{"group":0,"start":1,"end":1}"#,
        ] {
            let slice: GroupSlice = serde_json::from_str(raw).expect("deserialize");
            assert_eq!(slice.extract(&tokens), None, "{raw} should extract nothing");
        }
    }
}
