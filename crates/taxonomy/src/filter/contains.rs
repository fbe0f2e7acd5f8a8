//! Substring rules over the '-'-joined remainder (`"M313,PX|050:case"`).
//!
//! `,` separates AND terms, `|` inside a term forms an OR group. Each
//! value may carry `:case` (case-sensitive) and `:strict` (must open a
//! token under the strict boundary rule instead of matching anywhere).

use std::borrow::Cow;

use memchr::memmem;
use serde::{Deserialize, Serialize};

use super::parse::{split_parts, take_flag, CASE_FLAG, STRICT_FLAG};
use super::strict::prefix_matches;
use super::Candidate;
use crate::error::{Result, TaxonomyError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainsRule {
    pub value: String,
    pub case_sensitive: bool,
    pub strict: bool,
    /// 0 for plain AND terms, otherwise the id of the OR group.
    pub or_group: usize,
}

impl ContainsRule {
    pub fn hits(&self, candidate: &Candidate) -> bool {
        let value = fold_case(&self.value, self.case_sensitive);
        if self.strict {
            return candidate.tokens().iter().any(|token| {
                prefix_matches(&fold_case(token, self.case_sensitive), &value, true)
            });
        }
        let text = fold_case(candidate.search_text(), self.case_sensitive);
        memmem::find(text.as_bytes(), value.as_bytes()).is_some()
    }
}

fn fold_case(text: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_uppercase())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainsFilter {
    rules: Vec<ContainsRule>,
}

impl ContainsFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_as("contains", raw)
    }

    pub(crate) fn parse_as(filter: &'static str, raw: &str) -> Result<Self> {
        let mut rules = Vec::new();
        let mut next_group = 0;
        for term in split_parts(raw, ',') {
            let alternatives = split_parts(term, '|').collect::<Vec<_>>();
            let or_group = if alternatives.len() > 1 {
                next_group += 1;
                next_group
            } else {
                0
            };
            for alternative in alternatives {
                let (value, case_sensitive) = take_flag(alternative, CASE_FLAG);
                let (value, strict) = take_flag(&value, STRICT_FLAG);
                let value = value.trim().to_string();
                if value.is_empty() {
                    return Err(TaxonomyError::filter(filter, "search value must not be empty"));
                }
                rules.push(ContainsRule {
                    value,
                    case_sensitive,
                    strict,
                    or_group,
                });
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ContainsRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All AND terms hit and every OR group has at least one hit.
    pub fn matches(&self, candidate: &Candidate) -> bool {
        let and_terms_hit = self
            .rules
            .iter()
            .filter(|rule| rule.or_group == 0)
            .all(|rule| rule.hits(candidate));
        if !and_terms_hit {
            return false;
        }
        let group_count = self.rules.iter().map(|rule| rule.or_group).max().unwrap_or(0);
        (1..=group_count).all(|group| {
            let mut members = self.rules.iter().filter(|rule| rule.or_group == group).peekable();
            members.peek().is_none() || members.any(|rule| rule.hits(candidate))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(code: &str) -> Candidate {
        Candidate::from_code(code).expect("candidate")
    }

    #[test]
    fn parses_and_or_groups() {
        let filter = ContainsFilter::parse("M313, PX|050, A|B:case").expect("parse");
        let groups = filter.rules().iter().map(|rule| rule.or_group).collect::<Vec<_>>();
        assert_eq!(groups, vec![0, 1, 1, 2, 2]);
        assert!(filter.rules()[4].case_sensitive);
        assert_eq!(filter.rules()[4].value, "B");
    }

    #[test]
    fn rejects_empty_values() {
        assert!(ContainsFilter::parse(":case").is_err());
        assert!(ContainsFilter::parse("A|:strict").is_err());
    }

    #[test]
    fn substring_across_token_joins() {
        let code = candidate("BCC-M313-PX0334-050");
        assert!(ContainsFilter::parse("313-PX").expect("parse").matches(&code));
        assert!(ContainsFilter::parse("m313").expect("parse").matches(&code));
        assert!(!ContainsFilter::parse("m313:case").expect("parse").matches(&code));
        // The family is not part of the search text.
        assert!(!ContainsFilter::parse("BCC").expect("parse").matches(&code));
    }

    #[test]
    fn and_terms_with_or_groups() {
        let code = candidate("BCC-M313-PX0334-050");
        assert!(ContainsFilter::parse("M313,ZZ|050").expect("parse").matches(&code));
        assert!(!ContainsFilter::parse("M313,ZZ|YY").expect("parse").matches(&code));
        assert!(!ContainsFilter::parse("M999,PX|050").expect("parse").matches(&code));
    }

    #[test]
    fn strict_values_open_a_token() {
        let code = candidate("BCC-PA123-PAF9");
        assert!(ContainsFilter::parse("PA:strict").expect("parse").matches(&code));
        assert!(ContainsFilter::parse("PAF:strict").expect("parse").matches(&code));
        assert!(!ContainsFilter::parse("A12:strict").expect("parse").matches(&code));

        let letters_only = candidate("BCC-PAF123");
        assert!(!ContainsFilter::parse("PA:strict").expect("parse").matches(&letters_only));
        assert!(ContainsFilter::parse("PA").expect("parse").matches(&letters_only));
    }
}
