//! Declarative label mapping rules.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaxonomyError};
use crate::filter::GroupSlice;
use crate::search::FilterSpec;

/// One mapping document: a query plus the rules applied to its matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingFile {
    #[serde(alias = "filter_criteria")]
    pub filters: FilterSpec,
    pub code_mappings: Vec<CodeMapping>,
    pub general_mappings: Vec<GeneralMapping>,
    pub group_mappings: Vec<GroupMapping>,
    #[serde(alias = "global_group_mappings")]
    pub global_groups: Vec<GlobalGroup>,
    pub name_mappings: Vec<NameMapping>,
    pub special_mappings: Vec<SpecialMapping>,
    pub inherit_groups: bool,
}

impl MappingFile {
    pub fn is_empty(&self) -> bool {
        self.code_mappings.is_empty()
            && self.general_mappings.is_empty()
            && self.group_mappings.is_empty()
            && self.global_groups.is_empty()
            && self.name_mappings.is_empty()
            && self.special_mappings.is_empty()
            && !self.inherit_groups
    }

    /// Rejects structurally inconsistent rules before anything is applied.
    pub fn validate(&self) -> Result<()> {
        for mapping in &self.code_mappings {
            if mapping.code.is_empty() {
                return Err(TaxonomyError::InvalidInput(
                    "code mapping without code".to_string(),
                ));
            }
            if mapping.position.as_slice().contains(&0) {
                return Err(TaxonomyError::InvalidInput(format!(
                    "code mapping {:?} uses position 0",
                    mapping.code
                )));
            }
        }
        for mapping in &self.general_mappings {
            if mapping.codes.len() != mapping.labels.len() {
                return Err(TaxonomyError::InvalidInput(format!(
                    "general mapping has {} codes but {} labels",
                    mapping.codes.len(),
                    mapping.labels.len()
                )));
            }
        }
        for mapping in &self.group_mappings {
            mapping.parse_slice()?;
        }
        for mapping in &self.name_mappings {
            if mapping.level == 0 || mapping.name.is_empty() {
                return Err(TaxonomyError::InvalidInput(format!(
                    "name mapping needs a level from 1 and a name, got level {} name {:?}",
                    mapping.level, mapping.name
                )));
            }
        }
        for mapping in &self.special_mappings {
            if mapping.labels.is_empty() {
                return Err(TaxonomyError::InvalidInput(format!(
                    "special mapping for group {} has no labels",
                    mapping.group
                )));
            }
            mapping.slice()?;
        }
        Ok(())
    }
}

/// One or several 1-based canonical offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Positions {
    One(usize),
    Many(Vec<usize>),
}

impl Positions {
    pub fn as_slice(&self) -> &[usize] {
        match self {
            Self::One(position) => std::slice::from_ref(position),
            Self::Many(positions) => positions,
        }
    }
}

/// Labels the value node covering `code` at an absolute offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMapping {
    pub position: Positions,
    pub code: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, alias = "label-en")]
    pub label_en: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Labels any value node on a matched path whose code starts with one of
/// `codes`; the first matching code wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralMapping {
    pub codes: Vec<String>,
    pub labels: Vec<String>,
    #[serde(default)]
    pub strict: bool,
}

impl GeneralMapping {
    /// Index of the first code matching `token`.
    pub fn find(&self, token: &str) -> Option<usize> {
        self.codes
            .iter()
            .position(|code| crate::filter::prefix_matches(token, code, self.strict))
    }
}

/// Labels the value node of a group whose slice equals `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMapping {
    /// Group slice such as `"3:1"` or `"3:1-2"`.
    pub slice: String,
    pub code: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub strict: bool,
}

impl GroupMapping {
    pub fn parse_slice(&self) -> Result<GroupSlice> {
        GroupSlice::parse(&self.slice)
    }

    pub fn matches(&self, extracted: &str) -> bool {
        if self.strict {
            crate::filter::prefix_matches(extracted, &self.code, true)
        } else {
            extracted == self.code
        }
    }
}

/// Group tag written onto every matched product node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalGroup {
    pub group: String,
    /// Extend an existing tag with a space instead of replacing it.
    #[serde(default)]
    pub append: bool,
}

/// Names every node at a tree level that lies on a matched product's path.
///
/// Level 1 is the family node; each value node below adds one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMapping {
    pub level: usize,
    pub name: String,
}

/// Character class a special mapping's slice must consist of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharClass {
    #[serde(rename = "0-9")]
    Digits,
    #[serde(rename = "A-Z", alias = "a-z")]
    Letters,
    #[serde(rename = "0-Z", alias = "0-z")]
    Alphanumeric,
}

impl CharClass {
    /// True for a non-empty string made only of this class's ASCII characters.
    pub fn admits(self, text: &str) -> bool {
        let accepts: fn(&char) -> bool = match self {
            Self::Digits => char::is_ascii_digit,
            Self::Letters => char::is_ascii_alphabetic,
            Self::Alphanumeric => char::is_ascii_alphanumeric,
        };
        !text.is_empty() && text.chars().all(|c| accepts(&c))
    }
}

/// Appends `labels` to a group's value node when the group span exists and,
/// with `allowed` set, consists of that character class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialMapping {
    /// 1-based remainder group.
    pub group: usize,
    /// `"start-end"` or `"n"` inside the group; the whole group when absent.
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub allowed: Option<CharClass>,
    pub labels: Vec<String>,
}

impl SpecialMapping {
    pub fn slice(&self) -> Result<GroupSlice> {
        match self.position.as_deref() {
            Some(span) => GroupSlice::parse(&format!("{}:{span}", self.group)),
            None if self.group == 0 => Err(TaxonomyError::InvalidInput(
                "special mapping uses group 0".to_string(),
            )),
            None => Ok(GroupSlice {
                group: self.group,
                start: 1,
                end: usize::MAX,
            }),
        }
    }

    pub fn matches(&self, extracted: &str) -> bool {
        self.allowed.map_or(true, |class| class.admits(extracted))
    }
}
