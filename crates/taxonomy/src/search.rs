//! Query compilation and evaluation over taxonomy trees.
//!
//! This module provides:
//! - `FilterSpec`, the raw per-category filter expressions
//! - `SearchQuery`, the compiled boolean composition of those filters
//! - The search engine for trees and flat code lists

mod engine;
mod query;

pub use engine::{analyze_group_values, search_codes, search_tree};
pub use query::{Evaluation, FilterSpec, SearchQuery};
