//! Search evaluation over taxonomy trees and flat code lists.

use std::collections::BTreeMap;

use rayon::prelude::*;

use super::query::SearchQuery;
use crate::filter::{Candidate, GroupSlice};
use crate::tree::{NodeId, TaxonomyTree};
use crate::types::{MatchKind, ProductMatch, SearchResult};

/// Evaluates `query` against every candidate node of the tree.
///
/// Candidates are leaf value nodes and intermediate codes; they are
/// evaluated in parallel and reported in depth-first insertion order.
pub fn search_tree(tree: &TaxonomyTree, query: &SearchQuery) -> SearchResult {
    let families: Vec<NodeId> = match query.family() {
        Some(code) => match tree.family(code) {
            Some(id) => vec![id],
            None => {
                log::warn!("Family {code} not found in taxonomy");
                Vec::new()
            }
        },
        None => tree.families().to_vec(),
    };

    let searched_families = families
        .iter()
        .filter_map(|id| tree.node(*id).and_then(|node| node.code()))
        .map(str::to_string)
        .collect::<Vec<_>>();
    let candidates = families
        .iter()
        .flat_map(|family| tree.candidates_under(*family))
        .collect::<Vec<_>>();

    let matches = candidates
        .par_iter()
        .filter_map(|id| evaluate_node(tree, query, *id))
        .collect::<Vec<_>>();

    finish(query, matches, candidates.len(), searched_families)
}

/// Evaluates `query` against raw codes without building a tree.
///
/// Codes with fewer than two tokens are not counted as checked.
pub fn search_codes<S: AsRef<str>>(codes: &[S], query: &SearchQuery) -> SearchResult {
    let candidates = codes
        .iter()
        .filter_map(|code| Candidate::from_code(code.as_ref()))
        .filter(|candidate| query.family().map_or(true, |family| candidate.family() == family))
        .collect::<Vec<_>>();

    let mut searched_families = candidates
        .iter()
        .map(|candidate| candidate.family().to_string())
        .collect::<Vec<_>>();
    searched_families.sort();
    searched_families.dedup();

    let matches = candidates
        .par_iter()
        .filter_map(|candidate| {
            let evaluation = query.evaluate(candidate);
            evaluation.included.then(|| ProductMatch {
                node: None,
                family: candidate.family().to_string(),
                tokens: candidate.tokens().to_vec(),
                full_typecode: candidate.canonical().to_string(),
                schema: candidate.schema().to_vec(),
                matched_schemas: evaluation.matched_schemas,
                kind: MatchKind::Code,
                position: None,
                stats: None,
            })
        })
        .collect::<Vec<_>>();

    finish(query, matches, candidates.len(), searched_families)
}

/// Counts the values found at `slice` across matched products.
///
/// Products whose group is missing or too short for the slice start are
/// skipped.
pub fn analyze_group_values(matches: &[ProductMatch], slice: &GroupSlice) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for product in matches {
        if let Some(value) = slice.extract(&product.tokens) {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

fn evaluate_node(tree: &TaxonomyTree, query: &SearchQuery, id: NodeId) -> Option<ProductMatch> {
    let candidate = match Candidate::from_node(tree, id) {
        Ok(candidate) => candidate,
        Err(err) => {
            log::warn!("Skipping node {id:?}: {err}");
            return None;
        }
    };
    let evaluation = query.evaluate(&candidate);
    if !evaluation.included {
        return None;
    }
    let node = tree.node(id)?;
    let kind = if node.is_leaf() {
        MatchKind::Leaf
    } else {
        MatchKind::Intermediate
    };
    let full_typecode = node
        .full_typecode()
        .map(str::to_string)
        .unwrap_or_else(|| candidate.canonical().to_string());
    Some(ProductMatch {
        node: Some(id),
        family: candidate.family().to_string(),
        tokens: candidate.tokens().to_vec(),
        full_typecode,
        schema: candidate.schema().to_vec(),
        matched_schemas: evaluation.matched_schemas,
        kind,
        position: Some(node.position()),
        stats: Some(*node.stats()),
    })
}

fn finish(
    query: &SearchQuery,
    matches: Vec<ProductMatch>,
    total_checked: usize,
    searched_families: Vec<String>,
) -> SearchResult {
    let group_values = query
        .analyze()
        .map(|slice| analyze_group_values(&matches, slice));
    log::info!(
        "Matched {} of {} candidates in {} families (filters: {:?})",
        matches.len(),
        total_checked,
        searched_families.len(),
        query.categories()
    );
    SearchResult {
        matches,
        total_checked,
        searched_families,
        group_values,
    }
}
