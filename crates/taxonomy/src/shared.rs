//! Shared taxonomy handle.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::annotate::{AnnotationStats, Annotator, MappingFile};
use crate::error::Result;
use crate::search::{search_tree, FilterSpec, SearchQuery};
use crate::tree::{BuildOptions, BuildReport, TaxonomyTree};
use crate::types::{SearchResult, TypecodeRecord};

/// A tree shared between many readers and a single annotating writer.
///
/// Searches hold a read guard for their whole traversal; annotation runs
/// hold the write guard, so readers never observe a half-applied mapping.
#[derive(Debug, Clone, Default)]
pub struct SharedTaxonomy {
    tree: Arc<RwLock<TaxonomyTree>>,
}

impl SharedTaxonomy {
    pub fn new(tree: TaxonomyTree) -> Self {
        Self {
            tree: Arc::new(RwLock::new(tree)),
        }
    }

    /// Builds a tree from `records` and wraps it.
    pub fn build<I, R>(records: I, options: BuildOptions) -> (Self, BuildReport)
    where
        I: IntoIterator<Item = R>,
        R: Into<TypecodeRecord>,
    {
        let (tree, report) = TaxonomyTree::build(records, options);
        (Self::new(tree), report)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, TaxonomyTree> {
        self.tree.read()
    }

    pub fn search(&self, spec: &FilterSpec) -> Result<SearchResult> {
        let query = SearchQuery::compile(spec)?;
        Ok(search_tree(&self.tree.read(), &query))
    }

    pub fn annotate(&self, mapping: &MappingFile) -> Result<AnnotationStats> {
        let mut tree = self.tree.write();
        Annotator::new(&mut tree).run(mapping)
    }

    /// Replaces the tree, e.g. after a rebuild from fresh input.
    pub fn replace(&self, tree: TaxonomyTree) -> TaxonomyTree {
        std::mem::replace(&mut *self.tree.write(), tree)
    }
}
