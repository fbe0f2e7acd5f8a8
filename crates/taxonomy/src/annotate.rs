//! Label mapping over query results.
//!
//! A `MappingFile` pairs a filter query with label rules. The annotator
//! runs the query and writes labels, group tags and names onto the value
//! nodes of the matched products. Structural node fields are never touched.

mod apply;
mod mapping;

pub use apply::{AnnotationStats, Annotator};
pub use mapping::{
    CharClass, CodeMapping, GeneralMapping, GlobalGroup, GroupMapping, MappingFile, NameMapping,
    Positions, SpecialMapping,
};

use crate::error::Result;
use crate::tree::TaxonomyTree;

/// Applies `mapping` to `tree` in a fresh annotator run.
pub fn apply_mapping(tree: &mut TaxonomyTree, mapping: &MappingFile) -> Result<AnnotationStats> {
    Annotator::new(tree).run(mapping)
}
