//! Per-family schema inference.
//!
//! A schema is the sequence of remainder-token character lengths of one
//! typecode (family token excluded). Within a family every schema is
//! zero-padded to the family's maximum token count so that vectors of
//! the same family are directly comparable.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::tokenize::token_len;

/// Unpadded remainder-token lengths of a tokenized code.
pub fn token_lengths<S: AsRef<str>>(remainder: &[S]) -> Vec<usize> {
    remainder.iter().map(|token| token_len(token.as_ref())).collect()
}

/// Pads `lengths` with zeros up to `width`. Longer inputs are returned unchanged.
pub fn pad_schema(lengths: &[usize], width: usize) -> Vec<usize> {
    let mut padded = Vec::with_capacity(width.max(lengths.len()));
    padded.extend_from_slice(lengths);
    if padded.len() < width {
        padded.resize(width, 0);
    }
    padded
}

/// The distinct padded schemas observed for one family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilySchema {
    pub max_token_count: usize,
    pub schemas: BTreeSet<Vec<usize>>,
}

impl FamilySchema {
    fn from_lengths(all_lengths: &[Vec<usize>]) -> Self {
        let max_token_count = all_lengths.iter().map(Vec::len).max().unwrap_or(0);
        let schemas = all_lengths
            .iter()
            .map(|lengths| pad_schema(lengths, max_token_count))
            .collect();
        Self {
            max_token_count,
            schemas,
        }
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Pads a remainder-length vector to this family's width.
    pub fn pad(&self, lengths: &[usize]) -> Vec<usize> {
        pad_schema(lengths, self.max_token_count)
    }

    pub fn contains(&self, schema: &[usize]) -> bool {
        self.schemas.contains(schema)
    }
}

/// Schema catalogue keyed by family code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    families: BTreeMap<String, FamilySchema>,
}

impl SchemaCatalog {
    /// Infers the catalogue from tokenized codes (`tokens[0]` is the family).
    ///
    /// Codes with fewer than two tokens carry no schema and are ignored.
    pub fn infer<'a, I>(codes: I) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut grouped: BTreeMap<String, Vec<Vec<usize>>> = BTreeMap::new();
        for tokens in codes {
            let Some((family, remainder)) = tokens.split_first() else {
                continue;
            };
            if remainder.is_empty() {
                continue;
            }
            grouped
                .entry(family.clone())
                .or_default()
                .push(token_lengths(remainder));
        }

        let families = grouped
            .into_iter()
            .map(|(family, lengths)| (family, FamilySchema::from_lengths(&lengths)))
            .collect();
        Self { families }
    }

    pub fn get(&self, family: &str) -> Option<&FamilySchema> {
        self.families.get(family)
    }

    pub fn families(&self) -> impl Iterator<Item = (&str, &FamilySchema)> {
        self.families
            .iter()
            .map(|(family, schema)| (family.as_str(), schema))
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::split_typecode;

    fn catalog(codes: &[&str]) -> SchemaCatalog {
        let tokenized: Vec<Vec<String>> = codes.iter().map(|code| split_typecode(code)).collect();
        SchemaCatalog::infer(tokenized.iter().map(Vec::as_slice))
    }

    #[test]
    fn infers_distinct_schemas_per_family() {
        let catalog = catalog(&["ABC-123-XY", "ABC-1234-XY", "ABC-123-ZZ"]);
        let family = catalog.get("ABC").expect("family");
        assert_eq!(family.max_token_count, 2);
        assert_eq!(family.schema_count(), 2);
        assert!(family.contains(&[3, 2]));
        assert!(family.contains(&[4, 2]));
    }

    #[test]
    fn pads_short_codes_with_zeros() {
        let catalog = catalog(&["ABC-1-22-333", "ABC-1"]);
        let family = catalog.get("ABC").expect("family");
        assert_eq!(family.max_token_count, 3);
        assert!(family.schemas.iter().all(|schema| schema.len() == 3));
        assert!(family.contains(&[1, 0, 0]));
        assert_eq!(family.pad(&[4]), vec![4, 0, 0]);
    }

    #[test]
    fn ignores_single_token_codes() {
        let catalog = catalog(&["ABC", "", "XY-12"]);
        assert!(catalog.get("ABC").is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn pad_never_truncates() {
        assert_eq!(pad_schema(&[1, 2, 3], 2), vec![1, 2, 3]);
    }
}
