//! Applies label mappings to the nodes of matched products.

use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

use super::mapping::{
    CodeMapping, GeneralMapping, GlobalGroup, GroupMapping, MappingFile, NameMapping, SpecialMapping,
};
use crate::error::Result;
use crate::filter::GroupSlice;
use crate::search::{search_tree, SearchQuery};
use crate::tree::{NodeId, TaxonomyTree};
use crate::types::ProductMatch;

const LABEL_SEPARATOR: &str = "\n\n";

/// Counters for one annotator run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationStats {
    pub products: usize,
    pub labels_applied: usize,
    pub labels_updated: usize,
    pub groups_applied: usize,
    pub names_applied: usize,
    pub groups_inherited: usize,
    /// Names written by level-based name mappings.
    pub level_names: usize,
    /// Group nodes labeled by special mappings.
    pub special_matches: usize,
    /// Applications skipped because the node already received the rule.
    pub duplicates: usize,
}

/// Identity of one mapping rule within a `MappingFile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RuleId {
    Code(usize),
    General(usize),
    Group(usize),
    Global(usize),
    Name(usize),
    Special(usize),
}

/// Single-use annotation pass over a tree.
///
/// Matched products share prefix nodes, so every application is keyed by
/// `(node, rule)` and each pair is written at most once per run.
pub struct Annotator<'a> {
    tree: &'a mut TaxonomyTree,
    seen: FnvHashSet<(NodeId, RuleId)>,
    stats: AnnotationStats,
}

impl<'a> Annotator<'a> {
    pub fn new(tree: &'a mut TaxonomyTree) -> Self {
        Self {
            tree,
            seen: FnvHashSet::default(),
            stats: AnnotationStats::default(),
        }
    }

    /// Runs the mapping's query and applies every rule to the matches.
    ///
    /// Validation and filter errors are reported before any node changes.
    pub fn run(mut self, mapping: &MappingFile) -> Result<AnnotationStats> {
        mapping.validate()?;
        let query = SearchQuery::compile(&mapping.filters)?;
        let slices = mapping
            .group_mappings
            .iter()
            .map(GroupMapping::parse_slice)
            .collect::<Result<Vec<_>>>()?;
        let special_slices = mapping
            .special_mappings
            .iter()
            .map(SpecialMapping::slice)
            .collect::<Result<Vec<_>>>()?;

        let result = search_tree(self.tree, &query);
        self.stats.products = result.matches.len();

        for product in &result.matches {
            let Some(node) = product.node else {
                continue;
            };
            let path = self.tree.view(node).value_ids();
            self.apply_code_mappings(&mapping.code_mappings, &path)?;
            self.apply_general_mappings(&mapping.general_mappings, &path)?;
            self.apply_group_mappings(&mapping.group_mappings, &slices, product, &path)?;
            self.apply_global_groups(&mapping.global_groups, node)?;
            self.apply_name_mappings(&mapping.name_mappings, node, &path)?;
            self.apply_special_mappings(&mapping.special_mappings, &special_slices, product, &path)?;
        }

        if mapping.inherit_groups {
            for family in &result.searched_families {
                if let Some(id) = self.tree.family(family) {
                    self.inherit_groups(id)?;
                }
            }
        }

        log::debug!(
            "Annotated {} products: {} labels applied, {} updated, {} groups, {} names, {} inherited, {} level names, {} special, {} duplicates",
            self.stats.products,
            self.stats.labels_applied,
            self.stats.labels_updated,
            self.stats.groups_applied,
            self.stats.names_applied,
            self.stats.groups_inherited,
            self.stats.level_names,
            self.stats.special_matches,
            self.stats.duplicates
        );
        Ok(self.stats)
    }

    fn claim(&mut self, node: NodeId, rule: RuleId) -> bool {
        if self.seen.insert((node, rule)) {
            true
        } else {
            self.stats.duplicates += 1;
            false
        }
    }

    fn apply_code_mappings(&mut self, mappings: &[CodeMapping], path: &[NodeId]) -> Result<()> {
        for (index, mapping) in mappings.iter().enumerate() {
            for &position in mapping.position.as_slice() {
                let Some(node) = self.node_covering(path, position, &mapping.code) else {
                    continue;
                };
                if !self.claim(node, RuleId::Code(index)) {
                    continue;
                }
                let annotations = self.tree.annotations_mut(node)?;
                if let Some(label) = &mapping.label {
                    let updated = write_label(&mut annotations.label, label);
                    count_label(&mut self.stats, updated);
                }
                if let Some(label_en) = &mapping.label_en {
                    write_label(&mut annotations.label_en, label_en);
                }
                if let Some(group) = &mapping.group {
                    annotations.group = Some(group.clone());
                    self.stats.groups_applied += 1;
                }
                if let Some(name) = &mapping.name {
                    annotations.name = Some(name.clone());
                    self.stats.names_applied += 1;
                }
            }
        }
        Ok(())
    }

    /// Value node on `path` whose token, read from canonical offset
    /// `position`, starts with `code`.
    fn node_covering(&self, path: &[NodeId], position: usize, code: &str) -> Option<NodeId> {
        path.iter().copied().find(|id| {
            let Some(node) = self.tree.node(*id) else {
                return false;
            };
            let Some(token) = node.code() else {
                return false;
            };
            let Some(relative) = position.checked_sub(node.position()) else {
                return false;
            };
            let tail = token.chars().skip(relative).collect::<String>();
            !tail.is_empty() && tail.starts_with(code)
        })
    }

    fn apply_general_mappings(&mut self, mappings: &[GeneralMapping], path: &[NodeId]) -> Result<()> {
        for (index, mapping) in mappings.iter().enumerate() {
            for &node in path {
                let Some(hit) = self
                    .tree
                    .node(node)
                    .and_then(|node| node.code())
                    .and_then(|code| mapping.find(code))
                else {
                    continue;
                };
                if !self.claim(node, RuleId::General(index)) {
                    continue;
                }
                let annotations = self.tree.annotations_mut(node)?;
                let updated = write_label(&mut annotations.label, &mapping.labels[hit]);
                count_label(&mut self.stats, updated);
            }
        }
        Ok(())
    }

    fn apply_group_mappings(
        &mut self,
        mappings: &[GroupMapping],
        slices: &[GroupSlice],
        product: &ProductMatch,
        path: &[NodeId],
    ) -> Result<()> {
        for (index, (mapping, slice)) in mappings.iter().zip(slices).enumerate() {
            let Some(extracted) = slice.extract(&product.tokens) else {
                continue;
            };
            if !mapping.matches(extracted) {
                continue;
            }
            let Some(&node) = slice.group.checked_sub(1).and_then(|index| path.get(index)) else {
                continue;
            };
            if !self.claim(node, RuleId::Group(index)) {
                continue;
            }
            let annotations = self.tree.annotations_mut(node)?;
            if let Some(label) = &mapping.label {
                let updated = write_label(&mut annotations.label, label);
                count_label(&mut self.stats, updated);
            }
            if let Some(group) = &mapping.group {
                annotations.group = Some(group.clone());
                self.stats.groups_applied += 1;
            }
            if let Some(name) = &mapping.name {
                annotations.name = Some(name.clone());
                self.stats.names_applied += 1;
            }
        }
        Ok(())
    }

    fn apply_global_groups(&mut self, groups: &[GlobalGroup], node: NodeId) -> Result<()> {
        for (index, global) in groups.iter().enumerate() {
            if !self.claim(node, RuleId::Global(index)) {
                continue;
            }
            let annotations = self.tree.annotations_mut(node)?;
            let next = match annotations.group() {
                Some(existing) if global.append => format!("{existing} {}", global.group),
                _ => global.group.clone(),
            };
            annotations.group = Some(next);
            self.stats.groups_applied += 1;
        }
        Ok(())
    }

    fn apply_name_mappings(
        &mut self,
        mappings: &[NameMapping],
        product: NodeId,
        path: &[NodeId],
    ) -> Result<()> {
        for (index, mapping) in mappings.iter().enumerate() {
            let target = match mapping.level {
                0 => None,
                1 => self.tree.view(product).family_id(),
                level => path.get(level - 2).copied(),
            };
            let Some(node) = target else {
                continue;
            };
            if !self.claim(node, RuleId::Name(index)) {
                continue;
            }
            self.tree.annotations_mut(node)?.name = Some(mapping.name.clone());
            self.stats.level_names += 1;
        }
        Ok(())
    }

    fn apply_special_mappings(
        &mut self,
        mappings: &[SpecialMapping],
        slices: &[GroupSlice],
        product: &ProductMatch,
        path: &[NodeId],
    ) -> Result<()> {
        for (index, (mapping, slice)) in mappings.iter().zip(slices).enumerate() {
            let Some(extracted) = slice.extract(&product.tokens) else {
                continue;
            };
            if !mapping.matches(extracted) {
                continue;
            }
            let Some(&node) = slice.group.checked_sub(1).and_then(|index| path.get(index)) else {
                continue;
            };
            if !self.claim(node, RuleId::Special(index)) {
                continue;
            }
            let annotations = self.tree.annotations_mut(node)?;
            for label in &mapping.labels {
                let updated = write_label(&mut annotations.label, label);
                count_label(&mut self.stats, updated);
            }
            self.stats.special_matches += 1;
        }
        Ok(())
    }

    /// Copies the nearest tagged ancestor's group onto untagged value nodes.
    fn inherit_groups(&mut self, family: NodeId) -> Result<()> {
        let mut stack: Vec<(NodeId, Option<String>)> = vec![(family, None)];
        while let Some((id, inherited)) = stack.pop() {
            let Some(node) = self.tree.node(id) else {
                continue;
            };
            let own = node.annotations().group().map(str::to_string);
            let is_value = node.kind().is_value();
            let children = node.children().to_vec();

            let current = match own {
                Some(tag) => Some(tag),
                None => {
                    if let Some(tag) = inherited.as_ref().filter(|_| is_value) {
                        self.tree.annotations_mut(id)?.group = Some(tag.clone());
                        self.stats.groups_inherited += 1;
                    }
                    inherited
                }
            };
            stack.extend(children.into_iter().rev().map(|child| (child, current.clone())));
        }
        Ok(())
    }
}

/// Sets or extends a label; returns true when an existing label was extended.
fn write_label(slot: &mut Option<String>, label: &str) -> bool {
    match slot {
        Some(existing) if !existing.is_empty() => {
            existing.push_str(LABEL_SEPARATOR);
            existing.push_str(label);
            true
        }
        _ => {
            *slot = Some(label.to_string());
            false
        }
    }
}

fn count_label(stats: &mut AnnotationStats, updated: bool) {
    if updated {
        stats.labels_updated += 1;
    } else {
        stats.labels_applied += 1;
    }
}
