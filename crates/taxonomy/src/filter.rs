//! Predicate parsing and matching for typecode queries.
//!
//! Each filter category has its own compact grammar and its own file:
//! - schema shape targets and token-length patterns
//! - absolute positions in the canonical string
//! - group start offsets, content and relative positions
//! - substring (contains), group tags and group counts
//! - exclusions built from the group, position and contains grammars
//!
//! Parsers return typed rules or the first `FilterParse` error; matchers
//! are pure functions over a `Candidate`.

mod candidate;
mod contains;
mod count;
mod exclude;
mod group;
mod parse;
mod pattern;
mod position;
mod schema_target;
mod strict;
mod tag;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use candidate::Candidate;
pub use contains::{ContainsFilter, ContainsRule};
pub use count::GroupCount;
pub use exclude::ExcludeRules;
pub use group::{
    GroupPositionFilter, GroupPositionRule, GroupSlice, GroupStartFilter, GroupStartRule,
    GroupValueFilter, GroupValueRule, SpanStart,
};
pub use pattern::{PatternFilter, PatternPosition, PatternRule};
pub use position::{PositionFilter, PositionRule};
pub use schema_target::SchemaTarget;
pub use strict::prefix_matches;
pub use tag::{GroupTagFilter, DEFAULT_FAMILY};

bitflags! {
    /// Filter categories enabled in a compiled query.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct FilterCategories: u16 {
        const SCHEMA           = 1 << 0;
        const PATTERN          = 1 << 1;
        const POSITION         = 1 << 2;
        const GROUP_START      = 1 << 3;
        const GROUP_TAG        = 1 << 4;
        const CONTAINS         = 1 << 5;
        const GROUP_CONTENT    = 1 << 6;
        const GROUP_POSITION   = 1 << 7;
        const GROUP_COUNT      = 1 << 8;
        const EXCLUDE_GROUP    = 1 << 9;
        const EXCLUDE_POSITION = 1 << 10;
        const EXCLUDE_CONTAINS = 1 << 11;

        const EXCLUDES = Self::EXCLUDE_GROUP.bits()
            | Self::EXCLUDE_POSITION.bits()
            | Self::EXCLUDE_CONTAINS.bits();
    }
}

impl Default for FilterCategories {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclude_mask_covers_exclusions_only() {
        assert!(FilterCategories::EXCLUDES.contains(FilterCategories::EXCLUDE_CONTAINS));
        assert!(!FilterCategories::EXCLUDES.intersects(FilterCategories::CONTAINS));
    }
}
