//! Token-length pattern rules (`"1=3,2=4-6,last!=2"`).

use serde::{Deserialize, Serialize};

use super::parse::{parse_index, parse_number, split_assignment, split_parts};
use crate::error::{Result, TaxonomyError};

const FILTER: &str = "pattern";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPosition {
    /// 1-based group index.
    Index(usize),
    Last,
}

impl PatternPosition {
    fn resolve(self, len: usize) -> Option<usize> {
        match self {
            Self::Index(position) => position.checked_sub(1).filter(|index| *index < len),
            Self::Last => len.checked_sub(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub position: PatternPosition,
    pub min_len: usize,
    pub max_len: usize,
    pub negate: bool,
}

impl PatternRule {
    pub fn parse(part: &str) -> Result<Self> {
        let (position_raw, negate, length_raw) = split_assignment(FILTER, part)?;

        let position = if position_raw.eq_ignore_ascii_case("last") {
            PatternPosition::Last
        } else {
            PatternPosition::Index(parse_index(FILTER, position_raw, "position")?)
        };

        let (min_len, max_len) = match length_raw.split_once('-') {
            Some((min_raw, max_raw)) => {
                let min_len = parse_number::<usize>(FILTER, min_raw)?;
                let max_len = parse_number::<usize>(FILTER, max_raw)?;
                if min_len > max_len {
                    return Err(TaxonomyError::filter(
                        FILTER,
                        format!("minimum length {min_len} exceeds maximum {max_len}"),
                    ));
                }
                (min_len, max_len)
            }
            None => {
                let length = parse_number::<usize>(FILTER, length_raw)?;
                (length, length)
            }
        };

        Ok(Self {
            position,
            min_len,
            max_len,
            negate,
        })
    }

    /// A position missing from the schema fails the rule, negated or not.
    pub fn matches(&self, schema: &[usize]) -> bool {
        let Some(index) = self.position.resolve(schema.len()) else {
            return false;
        };
        let length = schema[index];
        let in_range = self.min_len <= length && length <= self.max_len;
        in_range != self.negate
    }
}

/// Conjunction of pattern rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternFilter {
    rules: Vec<PatternRule>,
}

impl PatternFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        let rules = split_parts(raw, ',')
            .map(PatternRule::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn matches(&self, schema: &[usize]) -> bool {
        self.rules.iter().all(|rule| rule.matches(schema))
    }
}
