//! Group-count predicate parsing and matching.
//!
//! Accepted forms: `3`, `>3`, `>=4`, `<5`, `<=3`, `2-5` and `3,5,7`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::parse::{parse_number, split_parts};
use crate::error::{Result, TaxonomyError};

const FILTER: &str = "group_count";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GroupCount {
    Exact { value: usize },
    Greater { value: usize },
    GreaterEqual { value: usize },
    Less { value: usize },
    LessEqual { value: usize },
    Range { min: usize, max: usize },
    AnyOf { values: BTreeSet<usize> },
}

impl GroupCount {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaxonomyError::filter(FILTER, "requires a value"));
        }

        if !trimmed.starts_with('-') {
            if let Some((min_raw, max_raw)) = trimmed.split_once('-') {
                let min = parse_count(min_raw)?;
                let max = parse_count(max_raw)?;
                if min > max {
                    return Err(TaxonomyError::filter(
                        FILTER,
                        format!("range start {min} exceeds end {max}"),
                    ));
                }
                return Ok(Self::Range { min, max });
            }
        }

        if trimmed.contains(',') {
            let values = split_parts(trimmed, ',')
                .map(parse_count)
                .collect::<Result<BTreeSet<_>>>()?;
            if values.is_empty() {
                return Err(TaxonomyError::filter(FILTER, "empty value list"));
            }
            return Ok(Self::AnyOf { values });
        }

        for (operator, build) in [
            (">=", Self::greater_equal as fn(usize) -> Self),
            ("<=", Self::less_equal),
            (">", Self::greater),
            ("<", Self::less),
        ] {
            if let Some(value_raw) = trimmed.strip_prefix(operator) {
                // `>0` is the only form that accepts zero.
                let value = if operator == ">" {
                    parse_number::<usize>(FILTER, value_raw)?
                } else {
                    parse_count(value_raw)?
                };
                return Ok(build(value));
            }
        }

        Ok(Self::Exact {
            value: parse_count(trimmed)?,
        })
    }

    fn greater_equal(value: usize) -> Self {
        Self::GreaterEqual { value }
    }

    fn less_equal(value: usize) -> Self {
        Self::LessEqual { value }
    }

    fn greater(value: usize) -> Self {
        Self::Greater { value }
    }

    fn less(value: usize) -> Self {
        Self::Less { value }
    }

    pub fn matches(&self, count: usize) -> bool {
        match self {
            Self::Exact { value } => count == *value,
            Self::Greater { value } => count > *value,
            Self::GreaterEqual { value } => count >= *value,
            Self::Less { value } => count < *value,
            Self::LessEqual { value } => count <= *value,
            Self::Range { min, max } => *min <= count && count <= *max,
            Self::AnyOf { values } => values.contains(&count),
        }
    }
}

fn parse_count(raw: &str) -> Result<usize> {
    let value = parse_number::<usize>(FILTER, raw)?;
    if value < 1 {
        return Err(TaxonomyError::filter(FILTER, "counts must be >= 1"));
    }
    Ok(value)
}
