//! Group-tag filter (`"Typ1,Typ2"`, `"BCC=Typ1,Typ3,BES=Typ2"`).
//!
//! A `FAMILY=tag` entry switches the current family; bare tags attach to
//! the current family, which starts out as the default bucket.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::parse::split_parts;
use crate::error::{Result, TaxonomyError};

const FILTER: &str = "group";
pub const DEFAULT_FAMILY: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupTagFilter {
    allowed: BTreeMap<String, Vec<String>>,
}

impl GroupTagFilter {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut allowed: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut family = DEFAULT_FAMILY.to_string();
        for part in split_parts(raw, ',') {
            let tag = match part.split_once('=') {
                Some((family_raw, tag_raw)) => {
                    let (family_raw, tag_raw) = (family_raw.trim(), tag_raw.trim());
                    if family_raw.is_empty() || tag_raw.is_empty() {
                        return Err(TaxonomyError::filter(
                            FILTER,
                            format!("family and group must not be empty in {part:?}"),
                        ));
                    }
                    family = family_raw.to_string();
                    tag_raw
                }
                None => part,
            };
            allowed.entry(family.clone()).or_default().push(tag.to_string());
        }
        Ok(Self { allowed })
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Tags allowed for `family`, falling back to the default bucket.
    pub fn allowed_for(&self, family: &str) -> Option<&[String]> {
        self.allowed
            .get(family)
            .or_else(|| self.allowed.get(DEFAULT_FAMILY))
            .map(Vec::as_slice)
    }

    /// A family with no applicable rule never matches.
    pub fn matches(&self, family: &str, group: Option<&str>) -> bool {
        let Some(allowed) = self.allowed_for(family) else {
            return false;
        };
        let group = group.unwrap_or_default();
        allowed.iter().any(|tag| tag == group)
    }
}
