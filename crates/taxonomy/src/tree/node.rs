//! Tree node types.
//!
//! Structural fields are written once by the builder and exposed through
//! getters only. The annotation block is the single mutable surface left
//! to post-build collaborators.

use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use super::index::NodeId;
use crate::date::{CompactDate, DateRange};

// ---------------------------------------------------------------------------
// Node variants
// ---------------------------------------------------------------------------

/// What a node represents in the family -> pattern -> value hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// First token of a typecode.
    Family { code: String },
    /// Routes to value nodes of one token length at one remainder index.
    Pattern { length: usize, index: usize },
    /// One literal token value.
    Value {
        code: String,
        is_intermediate_code: bool,
        full_typecode: Option<String>,
    },
}

impl NodeKind {
    /// Literal code of family and value nodes.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Family { code } | Self::Value { code, .. } => Some(code.as_str()),
            Self::Pattern { .. } => None,
        }
    }

    pub fn is_family(&self) -> bool {
        matches!(self, Self::Family { .. })
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern { .. })
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value { .. })
    }
}

// ---------------------------------------------------------------------------
// Statistics and annotations
// ---------------------------------------------------------------------------

/// Rolling statistics accumulated each time a code passes through a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub typecode_count: u64,
    pub creation: Option<DateRange>,
    pub modification: Option<DateRange>,
}

impl NodeStats {
    pub(crate) fn record(&mut self, created: Option<CompactDate>, modified: Option<CompactDate>) {
        self.typecode_count += 1;
        if let Some(date) = created {
            DateRange::fold(&mut self.creation, date);
        }
        if let Some(date) = modified {
            DateRange::fold(&mut self.modification, date);
        }
    }
}

/// Display fields written by the annotator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAnnotations {
    pub label: Option<String>,
    pub label_en: Option<String>,
    pub group: Option<String>,
    pub name: Option<String>,
}

impl NodeAnnotations {
    /// Returns the group tag if it is set and non-empty.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref().filter(|group| !group.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyNode {
    parent: Option<NodeId>,
    children: ThinVec<NodeId>,
    kind: NodeKind,
    position: usize,
    stats: NodeStats,
    annotations: NodeAnnotations,
}

impl TaxonomyNode {
    pub(crate) fn new(parent: Option<NodeId>, kind: NodeKind, position: usize) -> Self {
        Self {
            parent,
            children: ThinVec::new(),
            kind,
            position,
            stats: NodeStats::default(),
            annotations: NodeAnnotations::default(),
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Literal code for family and value nodes.
    #[inline]
    pub fn code(&self) -> Option<&str> {
        self.kind.code()
    }

    /// 1-based offset of this node's token in the canonical string.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    #[inline]
    pub fn annotations(&self) -> &NodeAnnotations {
        &self.annotations
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_intermediate_code(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Value {
                is_intermediate_code: true,
                ..
            }
        )
    }

    pub fn full_typecode(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Value { full_typecode, .. } => full_typecode.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(crate) fn stats_mut(&mut self) -> &mut NodeStats {
        &mut self.stats
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut NodeAnnotations {
        &mut self.annotations
    }

    /// Marks a value node as a complete code; called once by the builder's final pass.
    pub(crate) fn mark_code(&mut self, intermediate: bool, typecode: String) {
        if let NodeKind::Value {
            is_intermediate_code,
            full_typecode,
            ..
        } = &mut self.kind
        {
            *is_intermediate_code = intermediate;
            *full_typecode = Some(typecode);
        }
    }
}
