//! Schema-shape targets (`"[3,3,3,4]"`, `"4,4:prefix"`).

use serde::{Deserialize, Serialize};

use super::parse::{parse_number, split_parts, take_flag, PREFIX_FLAG};
use crate::error::{Result, TaxonomyError};

const FILTER: &str = "schema";

/// A target length vector, matched exactly or as a leading slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaTarget {
    pub schema: Vec<usize>,
    pub is_prefix: bool,
}

impl SchemaTarget {
    pub fn parse(raw: &str) -> Result<Self> {
        let (body, is_prefix) = take_flag(raw, PREFIX_FLAG);
        let cleaned = body
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .replace(' ', "");
        let schema = split_parts(&cleaned, ',')
            .map(|part| parse_number::<usize>(FILTER, part))
            .collect::<Result<Vec<_>>>()?;
        if schema.is_empty() {
            return Err(TaxonomyError::filter(FILTER, format!("empty schema in {raw:?}")));
        }
        Ok(Self { schema, is_prefix })
    }

    /// Parses several targets, failing on the first malformed one.
    pub fn parse_many<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Self>> {
        raw.iter().map(|target| Self::parse(target.as_ref())).collect()
    }

    /// Tests a candidate schema; `force_prefix` treats this target as a prefix.
    pub fn matches(&self, schema: &[usize], force_prefix: bool) -> bool {
        if self.is_prefix || force_prefix {
            schema.len() >= self.schema.len() && schema[..self.schema.len()] == self.schema[..]
        } else {
            schema == self.schema.as_slice()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bracketed_and_bare_forms() {
        let bracketed = SchemaTarget::parse("[3, 3, 3, 4]").expect("parse");
        assert_eq!(bracketed.schema, vec![3, 3, 3, 4]);
        assert!(!bracketed.is_prefix);

        let bare = SchemaTarget::parse("4,4:prefix").expect("parse");
        assert_eq!(bare.schema, vec![4, 4]);
        assert!(bare.is_prefix);

        let flagged_brackets = SchemaTarget::parse("[4,4]:prefix").expect("parse");
        assert!(flagged_brackets.is_prefix);
    }

    #[test]
    fn rejects_malformed_targets() {
        assert!(SchemaTarget::parse("3,x").is_err());
        assert!(SchemaTarget::parse("[]").is_err());
        assert!(SchemaTarget::parse("3,-1").is_err());
        assert!(SchemaTarget::parse_many(&["3,2", "bad"]).is_err());
    }

    #[test]
    fn exact_and_prefix_matching() {
        let exact = SchemaTarget::parse("3,2").expect("parse");
        assert!(exact.matches(&[3, 2], false));
        assert!(!exact.matches(&[3, 2, 1], false));
        assert!(exact.matches(&[3, 2, 1], true));

        let prefix = SchemaTarget::parse("3:prefix").expect("parse");
        assert!(prefix.matches(&[3, 2], false));
        assert!(!prefix.matches(&[4, 2], false));
        assert!(!prefix.matches(&[], false));
    }
}
