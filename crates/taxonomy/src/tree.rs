//! Deduplicated typecode taxonomy stored as a node arena.
//!
//! Layout under the implicit root:
//! - family nodes, one per distinct first token
//! - pattern nodes keyed by `(token_length, index)` under their parent
//! - value nodes keyed by literal token under their pattern node
//!
//! Pattern/value levels repeat for each remainder token.

mod builder;
mod index;
mod node;
mod view;

use std::collections::BTreeSet;

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

pub use builder::{BuildOptions, BuildReport, TreeBuilder};
pub use index::NodeId;
pub use node::{NodeAnnotations, NodeKind, NodeStats, TaxonomyNode};
pub use view::NodeView;

use crate::error::{Result, TaxonomyError};
use crate::schema::{FamilySchema, SchemaCatalog};
use crate::tokenize::canonical_typecode;
use crate::types::TypecodeRecord;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyTree {
    nodes: Vec<TaxonomyNode>,
    families: Vec<NodeId>,
    family_lookup: FnvHashMap<String, NodeId>,
    catalog: SchemaCatalog,
    source_codes: BTreeSet<String>,
}

impl TaxonomyTree {
    /// Builds a tree from raw codes or records.
    pub fn build<I, R>(records: I, options: BuildOptions) -> (Self, BuildReport)
    where
        I: IntoIterator<Item = R>,
        R: Into<TypecodeRecord>,
    {
        TreeBuilder::new(options).build(records)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Family node ids in first-seen order.
    pub fn families(&self) -> &[NodeId] {
        &self.families
    }

    pub fn family(&self, code: &str) -> Option<NodeId> {
        self.family_lookup.get(code).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&TaxonomyNode> {
        self.nodes.get(id.get())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(TaxonomyNode::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(TaxonomyNode::parent)
    }

    pub fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView::new(&self.nodes, id)
    }

    /// Family code plus every value code down to `id`.
    pub fn path_codes(&self, id: NodeId) -> Result<Vec<String>> {
        self.view(id)
            .path_codes()
            .ok_or(TaxonomyError::NodeNotFound(id))
    }

    /// Canonical `"FAMILY TOK-TOK"` string for the path ending at `id`.
    pub fn canonical(&self, id: NodeId) -> Result<String> {
        let codes = self.path_codes(id)?;
        match codes.split_first() {
            Some((family, remainder)) => Ok(canonical_typecode(family, remainder)),
            None => Err(TaxonomyError::NodeNotFound(id)),
        }
    }

    /// Leaf value nodes and intermediate codes, depth-first in insertion order.
    pub fn candidates(&self) -> Vec<NodeId> {
        self.families
            .iter()
            .flat_map(|family| self.candidates_under(*family))
            .collect()
    }

    /// Candidates below a single node, depth-first in insertion order.
    pub fn candidates_under(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.kind().is_value() && (node.is_leaf() || node.is_intermediate_code()) {
                found.push(id);
            }
            stack.extend(node.children().iter().rev().copied());
        }
        found
    }

    /// Every node below `root`, `root` included, in depth-first order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            found.push(id);
            stack.extend(node.children().iter().rev().copied());
        }
        found
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn family_schema(&self, family: &str) -> Option<&FamilySchema> {
        self.catalog.get(family)
    }

    /// Normalized ('-'-joined) form of every accepted input code.
    pub fn source_codes(&self) -> &BTreeSet<String> {
        &self.source_codes
    }

    /// Mutable access to the annotation block of a node.
    pub fn annotations_mut(&mut self, id: NodeId) -> Result<&mut NodeAnnotations> {
        self.nodes
            .get_mut(id.get())
            .map(TaxonomyNode::annotations_mut)
            .ok_or(TaxonomyError::NodeNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Builder access
    // -----------------------------------------------------------------------

    pub(crate) fn insert_node(&mut self, node: TaxonomyNode) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let parent = node.parent();
        if let NodeKind::Family { code } = node.kind() {
            self.family_lookup.insert(code.clone(), id);
            self.families.push(id);
        }
        self.nodes.push(node);
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent.get())) {
            parent.add_child(id);
        }
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut TaxonomyNode> {
        self.nodes.get_mut(id.get())
    }

    pub(crate) fn set_catalog(&mut self, catalog: SchemaCatalog) {
        self.catalog = catalog;
    }

    pub(crate) fn set_source_codes(&mut self, codes: BTreeSet<String>) {
        self.source_codes = codes;
    }
}
