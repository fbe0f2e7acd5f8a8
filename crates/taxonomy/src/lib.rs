//! Typecode tokenizing, taxonomy building and structural search library.
//!
//! This crate provides:
//! - Tokenizing and schema inference for structured product codes
//! - A deduplicated family/pattern/value tree stored as a node arena
//! - Compact filter grammars composed into boolean queries
//! - Label mapping that annotates the nodes of query results

pub mod annotate;
pub mod date;
pub mod error;
pub mod filter;
pub mod position;
pub mod schema;
pub mod search;
pub mod shared;
pub mod tokenize;
pub mod tree;
pub mod types;

// Re-export main types
pub use annotate::{apply_mapping, AnnotationStats, Annotator, MappingFile};
pub use date::{CompactDate, DateRange};
pub use error::{Result, TaxonomyError};
pub use filter::{Candidate, FilterCategories};
pub use schema::{FamilySchema, SchemaCatalog};
pub use search::{analyze_group_values, search_codes, search_tree, FilterSpec, SearchQuery};
pub use shared::SharedTaxonomy;
pub use tokenize::{canonical_typecode, split_typecode};
pub use tree::{BuildOptions, BuildReport, NodeId, NodeKind, TaxonomyNode, TaxonomyTree};
pub use types::{MatchKind, ProductMatch, SearchResult, TypecodeRecord};
