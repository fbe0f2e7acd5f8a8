//! Arena index for tree nodes.

use serde::{Deserialize, Serialize};

/// A compact 32-bit index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// # Panics
    /// Panics if the arena outgrows a u32 index.
    #[inline]
    pub fn new(index: usize) -> Self {
        assert!(index <= u32::MAX as usize, "node arena exceeds u32 indices");
        Self(index as u32)
    }

    #[inline]
    pub fn get(&self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_serializes_as_plain_index() {
        let id = NodeId::new(7);
        assert_eq!(id.get(), 7);
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "7");
        let parsed: NodeId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(parsed, id);
    }
}
