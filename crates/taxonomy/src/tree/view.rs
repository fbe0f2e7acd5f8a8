//! Node view helpers for deriving paths from the arena.
//!
//! Nodes store only their own token; paths, canonical strings and depth
//! are recomputed by walking the parent chain.

use super::index::NodeId;
use super::node::{NodeKind, TaxonomyNode};

/// A view into a node that can compute derived properties.
pub struct NodeView<'a> {
    nodes: &'a [TaxonomyNode],
    id: NodeId,
}

impl<'a> NodeView<'a> {
    #[inline]
    pub fn new(nodes: &'a [TaxonomyNode], id: NodeId) -> Self {
        Self { nodes, id }
    }

    /// Iterates from this node up to its family node, inclusive.
    pub fn ancestors(&self) -> impl Iterator<Item = (NodeId, &'a TaxonomyNode)> + 'a {
        let nodes = self.nodes;
        let mut next = Some(self.id);
        std::iter::from_fn(move || {
            let id = next?;
            let node = nodes.get(id.get())?;
            next = node.parent();
            Some((id, node))
        })
    }

    /// Family code followed by every value code down to this node.
    ///
    /// Pattern nodes are skipped. Returns `None` for an id outside the arena.
    pub fn path_codes(&self) -> Option<Vec<String>> {
        self.nodes.get(self.id.get())?;
        let mut codes = self
            .ancestors()
            .filter_map(|(_, node)| node.code().map(str::to_string))
            .collect::<Vec<_>>();
        codes.reverse();
        Some(codes)
    }

    /// Family node id at the top of this node's chain.
    pub fn family_id(&self) -> Option<NodeId> {
        self.ancestors()
            .find(|(_, node)| node.kind().is_family())
            .map(|(id, _)| id)
    }

    /// Value node ids from the first remainder token down to this node.
    pub fn value_ids(&self) -> Vec<NodeId> {
        let mut ids = self
            .ancestors()
            .filter(|(_, node)| matches!(node.kind(), NodeKind::Value { .. }))
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        ids.reverse();
        ids
    }

    /// Number of ancestors above this node (0 for families).
    pub fn depth(&self) -> Option<usize> {
        self.nodes.get(self.id.get())?;
        Some(self.ancestors().count().saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Vec<TaxonomyNode> {
        vec![
            TaxonomyNode::new(None, NodeKind::Family { code: "ABC".into() }, 1),
            TaxonomyNode::new(
                Some(NodeId::new(0)),
                NodeKind::Pattern {
                    length: 3,
                    index: 0,
                },
                5,
            ),
            TaxonomyNode::new(
                Some(NodeId::new(1)),
                NodeKind::Value {
                    code: "123".into(),
                    is_intermediate_code: false,
                    full_typecode: None,
                },
                5,
            ),
        ]
    }

    #[test]
    fn path_skips_pattern_nodes() {
        let nodes = arena();
        let view = NodeView::new(&nodes, NodeId::new(2));
        assert_eq!(view.path_codes(), Some(vec!["ABC".to_string(), "123".to_string()]));
        assert_eq!(view.family_id(), Some(NodeId::new(0)));
        assert_eq!(view.value_ids(), vec![NodeId::new(2)]);
        assert_eq!(view.depth(), Some(2));
    }

    #[test]
    fn unknown_id_has_no_path() {
        let nodes = arena();
        let view = NodeView::new(&nodes, NodeId::new(9));
        assert_eq!(view.path_codes(), None);
        assert_eq!(view.depth(), None);
    }
}
