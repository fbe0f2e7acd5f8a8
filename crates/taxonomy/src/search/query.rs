//! Compiled filter queries.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::{
    Candidate, ContainsFilter, ExcludeRules, FilterCategories, GroupCount, GroupPositionFilter,
    GroupSlice, GroupStartFilter, GroupTagFilter, GroupValueFilter, PatternFilter, PositionFilter,
    SchemaTarget,
};

/// Raw filter expressions, one grammar per category.
///
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Schema targets such as `"[3,2]"` or `"4,4:prefix"`.
    #[serde(alias = "target_schemas")]
    pub schemas: Vec<String>,
    pub family: Option<String>,
    /// Treat every schema target as a prefix target.
    pub prefix_match: bool,
    /// Require all schema targets instead of any.
    pub and_mode: bool,
    pub pattern: Option<String>,
    pub position: Option<String>,
    pub group_start: Option<String>,
    /// Group-tag filter.
    pub group: Option<String>,
    pub group_count: Option<String>,
    pub contains: Option<String>,
    pub group_content: Option<String>,
    pub group_position: Option<String>,
    pub exclude_group: Option<String>,
    pub exclude_position: Option<String>,
    pub exclude_contains: Option<String>,
    #[serde(alias = "negate")]
    pub negate_exclude: bool,
    /// Group slice whose values are counted over the matches.
    pub analyze_group_position: Option<String>,
}

impl FilterSpec {
    pub fn with_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas = schemas.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub included: bool,
    /// Conjunction of all positive filters.
    pub positive: bool,
    /// Whether any exclusion hit.
    pub excluded: bool,
    /// Schema targets the candidate satisfied (empty when the schema check failed).
    pub matched_schemas: Vec<SchemaTarget>,
}

/// A compiled query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    family: Option<String>,
    schemas: Vec<SchemaTarget>,
    force_prefix: bool,
    and_mode: bool,
    pattern: PatternFilter,
    position: PositionFilter,
    group_start: GroupStartFilter,
    group_tag: GroupTagFilter,
    group_count: Option<GroupCount>,
    contains: ContainsFilter,
    group_content: GroupValueFilter,
    group_position: GroupPositionFilter,
    excludes: ExcludeRules,
    negate_exclude: bool,
    analyze: Option<GroupSlice>,
    categories: FilterCategories,
}

impl SearchQuery {
    /// Parses every expression of `spec`, failing on the first rejected one.
    pub fn compile(spec: &FilterSpec) -> Result<Self> {
        let schemas = spec
            .schemas
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| SchemaTarget::parse(raw))
            .collect::<Result<Vec<_>>>()?;

        let pattern = parse_optional(&spec.pattern, PatternFilter::parse)?;
        let position = parse_optional(&spec.position, PositionFilter::parse)?;
        let group_start = parse_optional(&spec.group_start, GroupStartFilter::parse)?;
        let group_tag = parse_optional(&spec.group, GroupTagFilter::parse)?;
        let contains = parse_optional(&spec.contains, ContainsFilter::parse)?;
        let group_content = parse_optional(&spec.group_content, GroupValueFilter::parse)?;
        let group_position = parse_optional(&spec.group_position, GroupPositionFilter::parse)?;
        let group_count = non_empty(&spec.group_count).map(GroupCount::parse).transpose()?;
        let analyze = non_empty(&spec.analyze_group_position)
            .map(GroupSlice::parse)
            .transpose()?;
        let excludes = ExcludeRules::parse(
            non_empty(&spec.exclude_group),
            non_empty(&spec.exclude_position),
            non_empty(&spec.exclude_contains),
        )?;

        let mut categories = FilterCategories::empty();
        categories.set(FilterCategories::SCHEMA, !schemas.is_empty());
        categories.set(FilterCategories::PATTERN, !pattern.is_empty());
        categories.set(FilterCategories::POSITION, !position.is_empty());
        categories.set(FilterCategories::GROUP_START, !group_start.is_empty());
        categories.set(FilterCategories::GROUP_TAG, !group_tag.is_empty());
        categories.set(FilterCategories::CONTAINS, !contains.is_empty());
        categories.set(FilterCategories::GROUP_CONTENT, !group_content.is_empty());
        categories.set(FilterCategories::GROUP_POSITION, !group_position.is_empty());
        categories.set(FilterCategories::GROUP_COUNT, group_count.is_some());
        categories.set(FilterCategories::EXCLUDE_GROUP, !excludes.groups.is_empty());
        categories.set(FilterCategories::EXCLUDE_POSITION, !excludes.positions.is_empty());
        categories.set(FilterCategories::EXCLUDE_CONTAINS, !excludes.contains.is_empty());

        Ok(Self {
            family: non_empty(&spec.family).map(str::to_uppercase),
            schemas,
            force_prefix: spec.prefix_match,
            and_mode: spec.and_mode,
            pattern,
            position,
            group_start,
            group_tag,
            group_count,
            contains,
            group_content,
            group_position,
            excludes,
            negate_exclude: spec.negate_exclude,
            analyze,
            categories,
        })
    }

    /// Family the query is restricted to, uppercased.
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn categories(&self) -> FilterCategories {
        self.categories
    }

    pub fn schemas(&self) -> &[SchemaTarget] {
        &self.schemas
    }

    pub fn negate_exclude(&self) -> bool {
        self.negate_exclude
    }

    /// Slice to tally over the matches, if requested.
    pub fn analyze(&self) -> Option<&GroupSlice> {
        self.analyze.as_ref()
    }

    /// Runs the active filter categories against `candidate`; inactive ones pass.
    pub fn evaluate(&self, candidate: &Candidate) -> Evaluation {
        let active = self.categories;
        let (schema_ok, matched_schemas) = if active.contains(FilterCategories::SCHEMA) {
            let matched = self.matched_schemas(candidate.schema());
            (!matched.is_empty(), matched)
        } else {
            (true, Vec::new())
        };

        let positive = schema_ok && self.positive_filters(active, candidate);
        let excluded = active.intersects(FilterCategories::EXCLUDES) && self.excludes.matches(candidate);
        let included = if self.negate_exclude {
            !positive || excluded
        } else {
            positive && !excluded
        };

        Evaluation {
            included,
            positive,
            excluded,
            matched_schemas,
        }
    }

    /// Shortcut for `evaluate(candidate).included`.
    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.evaluate(candidate).included
    }

    fn matched_schemas(&self, schema: &[usize]) -> Vec<SchemaTarget> {
        if self.and_mode {
            if self
                .schemas
                .iter()
                .all(|target| target.matches(schema, self.force_prefix))
            {
                return self.schemas.clone();
            }
            return Vec::new();
        }
        self.schemas
            .iter()
            .filter(|target| target.matches(schema, self.force_prefix))
            .cloned()
            .collect()
    }

    fn positive_filters(&self, active: FilterCategories, candidate: &Candidate) -> bool {
        if active.contains(FilterCategories::PATTERN) && !self.pattern.matches(candidate.schema()) {
            return false;
        }
        if active.contains(FilterCategories::POSITION)
            && !self.position.matches_all(candidate.canonical())
        {
            return false;
        }
        if active.contains(FilterCategories::GROUP_START) && !self.group_start.matches(candidate) {
            return false;
        }
        if active.contains(FilterCategories::GROUP_TAG)
            && !self.group_tag.matches(candidate.family(), candidate.group())
        {
            return false;
        }
        if active.contains(FilterCategories::CONTAINS) && !self.contains.matches(candidate) {
            return false;
        }
        if active.contains(FilterCategories::GROUP_CONTENT)
            && !self.group_content.matches_all(candidate)
        {
            return false;
        }
        if active.contains(FilterCategories::GROUP_POSITION)
            && !self.group_position.matches(candidate)
        {
            return false;
        }
        match &self.group_count {
            Some(count) if active.contains(FilterCategories::GROUP_COUNT) => {
                count.matches(candidate.schema().len())
            }
            _ => true,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|raw| !raw.is_empty())
}

fn parse_optional<T: Default>(value: &Option<String>, parse: fn(&str) -> Result<T>) -> Result<T> {
    match non_empty(value) {
        Some(raw) => parse(raw),
        None => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(code: &str) -> Candidate {
        Candidate::from_code(code).expect("candidate")
    }

    #[test]
    fn empty_spec_accepts_everything() {
        let query = SearchQuery::compile(&FilterSpec::default()).expect("compile");
        assert!(query.categories().is_empty());
        assert!(query.matches(&candidate("ABC-123-XY")));
    }

    #[test]
    fn inactive_categories_are_skipped() {
        let spec = FilterSpec {
            pattern: Some("1=4".into()),
            contains: Some("XY".into()),
            exclude_contains: Some("XY".into()),
            ..FilterSpec::default()
        };
        let mut query = SearchQuery::compile(&spec).expect("compile");
        assert_eq!(
            query.categories(),
            FilterCategories::PATTERN | FilterCategories::CONTAINS | FilterCategories::EXCLUDE_CONTAINS
        );
        let code = candidate("ABC-123-XY");
        assert!(!query.matches(&code));

        query.categories.remove(FilterCategories::PATTERN);
        let evaluation = query.evaluate(&code);
        assert!(evaluation.positive);
        assert!(evaluation.excluded);

        query.categories.remove(FilterCategories::EXCLUDES);
        assert!(query.matches(&code));
    }

    #[test]
    fn blank_expressions_are_absent() {
        let spec = FilterSpec {
            pattern: Some("  ".into()),
            schemas: vec![String::new()],
            ..FilterSpec::default()
        };
        let query = SearchQuery::compile(&spec).expect("compile");
        assert!(query.categories().is_empty());
    }

    #[test]
    fn first_rejected_expression_fails_compile() {
        let spec = FilterSpec {
            pattern: Some("1=x".into()),
            ..FilterSpec::default()
        };
        let error = SearchQuery::compile(&spec).expect_err("rejected");
        assert!(error.to_string().contains("pattern"));
    }

    #[test]
    fn schema_or_collects_every_hit() {
        let spec = FilterSpec::default().with_schemas(["3,2", "3:prefix", "4,2"]);
        let query = SearchQuery::compile(&spec).expect("compile");
        let evaluation = query.evaluate(&candidate("ABC-123-XY"));
        assert!(evaluation.included);
        assert_eq!(evaluation.matched_schemas.len(), 2);
        assert!(!query.matches(&candidate("ABC-12-XY")));
    }

    #[test]
    fn schema_and_requires_all_targets() {
        let spec = FilterSpec {
            and_mode: true,
            ..FilterSpec::default().with_schemas(["3,2", "3:prefix"])
        };
        let query = SearchQuery::compile(&spec).expect("compile");
        assert!(query.matches(&candidate("ABC-123-XY")));

        let evaluation = query.evaluate(&candidate("ABC-123-XY-1"));
        assert!(!evaluation.included);
        assert!(evaluation.matched_schemas.is_empty());
    }

    #[test]
    fn prefix_match_forces_prefix_targets() {
        let spec = FilterSpec {
            prefix_match: true,
            ..FilterSpec::default().with_schemas(["3"])
        };
        let query = SearchQuery::compile(&spec).expect("compile");
        assert!(query.matches(&candidate("ABC-123-XY")));
    }

    #[test]
    fn positive_filters_are_conjunctive() {
        let spec = FilterSpec {
            pattern: Some("1=3".into()),
            contains: Some("XY".into()),
            group_count: Some("2".into()),
            ..FilterSpec::default()
        };
        let query = SearchQuery::compile(&spec).expect("compile");
        assert!(query.matches(&candidate("ABC-123-XY")));
        assert!(!query.matches(&candidate("ABC-123-ZZ")));
        assert!(!query.matches(&candidate("ABC-123-XY-1")));
    }

    #[test]
    fn group_tag_uses_candidate_annotation() {
        let spec = FilterSpec {
            group: Some("Typ1".into()),
            ..FilterSpec::default()
        };
        let query = SearchQuery::compile(&spec).expect("compile");
        assert!(!query.matches(&candidate("ABC-123-XY")));
        assert!(query.matches(&candidate("ABC-123-XY").with_group("Typ1")));
    }

    #[test]
    fn exclusions_remove_hits() {
        let spec = FilterSpec {
            exclude_contains: Some("ZZ".into()),
            ..FilterSpec::default()
        };
        let query = SearchQuery::compile(&spec).expect("compile");
        assert!(query.categories().contains(FilterCategories::EXCLUDE_CONTAINS));
        assert!(query.matches(&candidate("ABC-123-XY")));

        let evaluation = query.evaluate(&candidate("ABC-123-ZZ"));
        assert!(evaluation.positive);
        assert!(evaluation.excluded);
        assert!(!evaluation.included);
    }

    #[test]
    fn negate_exclude_inverts_selection() {
        let spec = FilterSpec {
            exclude_contains: Some("ZZ".into()),
            negate_exclude: true,
            ..FilterSpec::default()
        };
        let query = SearchQuery::compile(&spec).expect("compile");
        assert!(query.matches(&candidate("ABC-123-ZZ")));
        assert!(!query.matches(&candidate("ABC-123-XY")));
    }

    #[test]
    fn negate_exclude_includes_positive_misses() {
        let spec = FilterSpec {
            pattern: Some("1=4".into()),
            negate_exclude: true,
            ..FilterSpec::default()
        };
        let query = SearchQuery::compile(&spec).expect("compile");
        assert!(query.matches(&candidate("ABC-123-XY")));
        assert!(!query.matches(&candidate("ABC-1234-XY")));
    }

    #[test]
    fn family_is_uppercased() {
        let spec = FilterSpec {
            family: Some(" abc ".into()),
            ..FilterSpec::default()
        };
        let query = SearchQuery::compile(&spec).expect("compile");
        assert_eq!(query.family(), Some("ABC"));
    }

    #[test]
    fn spec_deserializes_with_aliases() {
        let spec: FilterSpec = serde_json::from_str(
            r#"{"target_schemas":["3,2"],"negate":true,"group_content":"1=1:prefix"}"#,
        )
        .expect("deserialize");
        assert_eq!(spec.schemas, vec!["3,2".to_string()]);
        assert!(spec.negate_exclude);
        assert_eq!(spec.group_content.as_deref(), Some("1=1:prefix"));
        assert!(!spec.and_mode);
    }
}
