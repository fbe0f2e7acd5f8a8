//! Exclusion rules: group content, absolute position and contains.
//!
//! Unlike their positive counterparts, group and position exclusions skip
//! groups or offsets the candidate does not have, and any single hit
//! excludes.

use serde::{Deserialize, Serialize};

use super::contains::ContainsFilter;
use super::group::GroupValueFilter;
use super::position::PositionFilter;
use super::Candidate;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeRules {
    pub groups: GroupValueFilter,
    pub positions: PositionFilter,
    pub contains: ContainsFilter,
}

impl ExcludeRules {
    /// Parses the three optional exclusion expressions.
    pub fn parse(groups: Option<&str>, positions: Option<&str>, contains: Option<&str>) -> Result<Self> {
        Ok(Self {
            groups: groups
                .map(|raw| GroupValueFilter::parse_as("exclude_group", raw))
                .transpose()?
                .unwrap_or_default(),
            positions: positions
                .map(|raw| PositionFilter::parse_as("exclude_position", raw))
                .transpose()?
                .unwrap_or_default(),
            contains: contains
                .map(|raw| ContainsFilter::parse_as("exclude_contains", raw))
                .transpose()?
                .unwrap_or_default(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.positions.is_empty() && self.contains.is_empty()
    }

    /// True if any exclusion variant hits the candidate.
    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.groups.matches_any(candidate)
            || self.positions.matches_any(candidate.canonical())
            || (!self.contains.is_empty() && self.contains.matches(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(code: &str) -> Candidate {
        Candidate::from_code(code).expect("candidate")
    }

    #[test]
    fn empty_rules_never_exclude() {
        let rules = ExcludeRules::parse(None, None, None).expect("parse");
        assert!(rules.is_empty());
        assert!(!rules.matches(&candidate("ABC-123-XY")));
    }

    #[test]
    fn any_variant_excludes() {
        let code = candidate("ABC-123-XY");
        let by_group = ExcludeRules::parse(Some("2=X:prefix"), None, None).expect("parse");
        assert!(by_group.matches(&code));

        let by_position = ExcludeRules::parse(None, Some("5=123"), None).expect("parse");
        assert!(by_position.matches(&code));

        let by_contains = ExcludeRules::parse(None, None, Some("3-X")).expect("parse");
        assert!(by_contains.matches(&code));

        let miss = ExcludeRules::parse(Some("7=Z"), Some("40=Z"), Some("QQ")).expect("parse");
        assert!(!miss.matches(&code));
    }

    #[test]
    fn contains_exclusion_needs_all_terms() {
        let code = candidate("ABC-123-XY");
        let both = ExcludeRules::parse(None, None, Some("123,XY")).expect("parse");
        assert!(both.matches(&code));
        let one = ExcludeRules::parse(None, None, Some("123,ZZ")).expect("parse");
        assert!(!one.matches(&code));
        let either = ExcludeRules::parse(None, None, Some("ZZ|XY")).expect("parse");
        assert!(either.matches(&code));
    }

    #[test]
    fn parse_errors_name_the_exclusion() {
        let error = ExcludeRules::parse(Some("0=Z"), None, None).expect_err("rejected");
        assert!(error.to_string().contains("exclude_group"));
    }
}
