//! Two-pass tree construction.
//!
//! Pass one tokenizes every record and infers the per-family schema
//! catalogue. Pass two inserts each code, creating family, pattern and
//! value nodes lazily and accumulating statistics along the path. A final
//! sweep marks intermediate codes and attaches canonical typecodes.

use std::collections::BTreeSet;

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use super::index::NodeId;
use super::node::{NodeKind, TaxonomyNode};
use super::TaxonomyTree;
use crate::date::CompactDate;
use crate::schema::{token_lengths, SchemaCatalog};
use crate::tokenize::{split_typecode, token_len};
use crate::types::TypecodeRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Track creation/modification date ranges per node.
    pub include_dates: bool,
}

/// Outcome counters of one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub accepted: usize,
    pub skipped: usize,
}

struct TokenizedRecord {
    tokens: Vec<String>,
    created: Option<CompactDate>,
    modified: Option<CompactDate>,
}

pub struct TreeBuilder {
    options: BuildOptions,
    tree: TaxonomyTree,
    patterns: FnvHashMap<(NodeId, usize, usize), NodeId>,
    values: FnvHashMap<(NodeId, String), NodeId>,
    report: BuildReport,
}

impl TreeBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            tree: TaxonomyTree::default(),
            patterns: FnvHashMap::default(),
            values: FnvHashMap::default(),
            report: BuildReport::default(),
        }
    }

    pub fn build<I, R>(mut self, records: I) -> (TaxonomyTree, BuildReport)
    where
        I: IntoIterator<Item = R>,
        R: Into<TypecodeRecord>,
    {
        let tokenized = self.tokenize_all(records);

        let catalog = SchemaCatalog::infer(tokenized.iter().map(|record| record.tokens.as_slice()));
        self.tree.set_catalog(catalog);

        let mut source_codes = BTreeSet::new();
        for record in &tokenized {
            source_codes.insert(record.tokens.join("-"));
            self.insert(record);
        }
        self.tree.set_source_codes(source_codes);
        self.mark_codes();

        log::info!(
            "taxonomy built: {} families, {} nodes, {} codes accepted, {} skipped",
            self.tree.families().len(),
            self.tree.len(),
            self.report.accepted,
            self.report.skipped
        );

        (self.tree, self.report)
    }

    fn tokenize_all<I, R>(&mut self, records: I) -> Vec<TokenizedRecord>
    where
        I: IntoIterator<Item = R>,
        R: Into<TypecodeRecord>,
    {
        let mut tokenized = Vec::new();
        for record in records {
            let record = record.into();
            let tokens = split_typecode(&record.code);
            if tokens.len() < 2 {
                log::debug!("skipping typecode {:?}: fewer than two tokens", record.code);
                self.report.skipped += 1;
                continue;
            }
            let (created, modified) = if self.options.include_dates {
                (record.created, record.modified)
            } else {
                (None, None)
            };
            self.report.accepted += 1;
            tokenized.push(TokenizedRecord {
                tokens,
                created,
                modified,
            });
        }
        tokenized
    }

    fn insert(&mut self, record: &TokenizedRecord) {
        let Some((family, remainder)) = record.tokens.split_first() else {
            return;
        };
        let schema = match self.tree.family_schema(family) {
            Some(schema) => schema.pad(&token_lengths(remainder)),
            None => token_lengths(remainder),
        };

        let family_id = self.family_node(family);
        self.record_stats(family_id, record);

        let mut current = family_id;
        let mut offset = 1 + token_len(family) + 1;
        for (index, &length) in schema.iter().enumerate() {
            if length == 0 {
                break;
            }
            let Some(token) = remainder.get(index) else {
                break;
            };

            let pattern = self.pattern_node(current, length, index, offset);
            self.record_stats(pattern, record);

            let value = self.value_node(pattern, token, offset);
            self.record_stats(value, record);

            offset += length + 1;
            current = value;
        }
    }

    fn family_node(&mut self, family: &str) -> NodeId {
        if let Some(id) = self.tree.family(family) {
            return id;
        }
        self.tree.insert_node(TaxonomyNode::new(
            None,
            NodeKind::Family {
                code: family.to_string(),
            },
            1,
        ))
    }

    fn pattern_node(&mut self, parent: NodeId, length: usize, index: usize, offset: usize) -> NodeId {
        if let Some(id) = self.patterns.get(&(parent, length, index)) {
            return *id;
        }
        let id = self.tree.insert_node(TaxonomyNode::new(
            Some(parent),
            NodeKind::Pattern { length, index },
            offset,
        ));
        self.patterns.insert((parent, length, index), id);
        id
    }

    fn value_node(&mut self, pattern: NodeId, token: &str, offset: usize) -> NodeId {
        let key = (pattern, token.to_string());
        if let Some(id) = self.values.get(&key) {
            return *id;
        }
        let id = self.tree.insert_node(TaxonomyNode::new(
            Some(pattern),
            NodeKind::Value {
                code: token.to_string(),
                is_intermediate_code: false,
                full_typecode: None,
            },
            offset,
        ));
        self.values.insert(key, id);
        id
    }

    fn record_stats(&mut self, id: NodeId, record: &TokenizedRecord) {
        if let Some(node) = self.tree.node_mut(id) {
            node.stats_mut().record(record.created, record.modified);
        }
    }

    /// Flags intermediate codes and attaches `full_typecode` to leaves and intermediates.
    fn mark_codes(&mut self) {
        let mut marks = Vec::new();
        // (node, family, '-'-joined remainder so far)
        let mut stack: Vec<(NodeId, String, String)> = self
            .tree
            .families()
            .iter()
            .rev()
            .filter_map(|id| {
                let family = self.tree.node(*id)?.code()?.to_string();
                Some((*id, family, String::new()))
            })
            .collect();

        while let Some((id, family, remainder)) = stack.pop() {
            let Some(node) = self.tree.node(id) else {
                continue;
            };
            let remainder = match node.kind() {
                NodeKind::Value { code, .. } => {
                    let joined = if remainder.is_empty() {
                        code.clone()
                    } else {
                        format!("{remainder}-{code}")
                    };
                    let intermediate = !node.is_leaf()
                        && self.tree.source_codes().contains(&format!("{family}-{joined}"));
                    if node.is_leaf() || intermediate {
                        marks.push((id, intermediate, format!("{family} {joined}")));
                    }
                    joined
                }
                _ => remainder,
            };
            for child in node.children().iter().rev() {
                stack.push((*child, family.clone(), remainder.clone()));
            }
        }

        for (id, intermediate, typecode) in marks {
            if let Some(node) = self.tree.node_mut(id) {
                node.mark_code(intermediate, typecode);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_child<'a>(tree: &'a TaxonomyTree, parent: NodeId, code: &str) -> (NodeId, &'a TaxonomyNode) {
        tree.children(parent)
            .iter()
            .flat_map(|pattern| tree.children(*pattern).iter())
            .filter_map(|id| tree.node(*id).map(|node| (*id, node)))
            .find(|(_, node)| node.code() == Some(code))
            .expect("value child")
    }

    #[test]
    fn computes_canonical_offsets() {
        let (tree, report) = TaxonomyTree::build(["ABC-123-XY"], BuildOptions::default());
        assert_eq!(report, BuildReport { accepted: 1, skipped: 0 });

        let family = tree.family("ABC").expect("family");
        assert_eq!(tree.node(family).map(TaxonomyNode::position), Some(1));

        let (first_id, first) = value_child(&tree, family, "123");
        assert_eq!(first.position(), 5);
        let (_, second) = value_child(&tree, first_id, "XY");
        assert_eq!(second.position(), 9);
        assert_eq!(second.full_typecode(), Some("ABC 123-XY"));
    }

    #[test]
    fn duplicate_codes_share_nodes() {
        let (once, _) = TaxonomyTree::build(["ABC-123-XY"], BuildOptions::default());
        let (twice, _) = TaxonomyTree::build(["ABC-123-XY", "abc 123_xy"], BuildOptions::default());
        assert_eq!(once.len(), twice.len());

        let leaf = twice.candidates()[0];
        assert_eq!(twice.node(leaf).map(|node| node.stats().typecode_count), Some(2));
        let family = twice.family("ABC").expect("family");
        assert_eq!(twice.node(family).map(|node| node.stats().typecode_count), Some(2));
    }

    #[test]
    fn pattern_nodes_split_by_length() {
        let (tree, _) = TaxonomyTree::build(["ABC-123-XY", "ABC-1234-XY"], BuildOptions::default());
        let family = tree.family("ABC").expect("family");
        let patterns = tree
            .children(family)
            .iter()
            .filter_map(|id| tree.node(*id))
            .map(|node| node.kind().clone())
            .collect::<Vec<_>>();
        assert_eq!(
            patterns,
            vec![
                NodeKind::Pattern { length: 3, index: 0 },
                NodeKind::Pattern { length: 4, index: 0 },
            ]
        );
    }

    #[test]
    fn marks_intermediate_codes() {
        let (tree, _) = TaxonomyTree::build(["ABC-123", "ABC-123-XY", "ABC-456-XY"], BuildOptions::default());
        let family = tree.family("ABC").expect("family");

        let (_, intermediate) = value_child(&tree, family, "123");
        assert!(intermediate.is_intermediate_code());
        assert_eq!(intermediate.full_typecode(), Some("ABC 123"));

        let (_, plain) = value_child(&tree, family, "456");
        assert!(!plain.is_intermediate_code());
        assert_eq!(plain.full_typecode(), None);

        assert_eq!(tree.candidates().len(), 3);
    }

    #[test]
    fn skips_codes_without_remainder() {
        let (tree, report) = TaxonomyTree::build(["", "ABC", "  --  ", "ABC-1"], BuildOptions::default());
        assert_eq!(report, BuildReport { accepted: 1, skipped: 3 });
        assert_eq!(tree.families().len(), 1);
        assert!(tree.source_codes().contains("ABC-1"));
    }

    #[test]
    fn dates_only_tracked_when_enabled() {
        let record = TypecodeRecord::with_raw_dates("ABC-1", "1012021", "15062022");

        let (plain, _) = TaxonomyTree::build([record.clone()], BuildOptions::default());
        let leaf = plain.candidates()[0];
        assert_eq!(plain.node(leaf).and_then(|node| node.stats().creation), None);

        let (dated, _) = TaxonomyTree::build([record], BuildOptions { include_dates: true });
        let leaf = dated.candidates()[0];
        let stats = dated.node(leaf).map(|node| *node.stats()).expect("stats");
        assert_eq!(stats.creation.map(|range| range.earliest.iso()), Some("2021-01-01".to_string()));
        assert_eq!(stats.modification.map(|range| range.latest.iso()), Some("2022-06-15".to_string()));
    }

    #[test]
    fn catalog_is_recorded() {
        let (tree, _) = TaxonomyTree::build(["ABC-123-XY", "ABC-1234-XY", "ABC-123-ZZ"], BuildOptions::default());
        let schema = tree.family_schema("ABC").expect("schema");
        assert_eq!(schema.schema_count(), 2);
    }
}
