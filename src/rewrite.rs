//! History rewrite detection.
//!
//! A rewritten branch (after an amend, rebase, or filter pass) keeps the
//! shape of its ancestry while every commit hash changes slightly. Each
//! leaf's first-parent chain is rendered as a path signature of 8-hex
//! prefixes, and signatures are compared pairwise with normalized
//! Jaro-Winkler similarity; near-identical pairs are reported as rewrite
//! candidates.
//!
//! Only the first-listed parent is followed at each hop, so merge-heavy
//! histories are compared lossily: one ancestry branch stands in for the
//! whole lineage.

use serde::Serialize;
use strsim::jaro_winkler;

use crate::commit_graph::CommitGraph;
use crate::object_id::ObjectId;

/// Similarity score at or above which a leaf pair is reported.
pub const SIMILARITY_THRESHOLD: f64 = 0.92;
/// Hex characters contributed to the signature per hop.
const PREFIX_LEN: usize = 8;
/// Separator between hops in a path signature.
const HOP_SEPARATOR: &str = "->";

/// A pair of leaf lineages whose path signatures are near-identical.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewriteCandidate {
    pub first: ObjectId,
    pub second: ObjectId,
    pub score: f64,
    pub first_path: String,
    pub second_path: String,
}

/// Renders the first-parent ancestry signature for one leaf position.
///
/// Hops from the leaf toward a root, appending each commit's 8-hex
/// prefix, and stops at a parentless node — or on revisiting a node,
/// which guards against cyclic input.
#[must_use]
pub fn ancestry_path(graph: &CommitGraph, leaf: u32) -> String {
    let mut signature = String::new();
    let mut visited = vec![false; graph.node_count()];
    let mut current = leaf;

    loop {
        if !signature.is_empty() {
            signature.push_str(HOP_SEPARATOR);
        }
        signature.push_str(&graph.node(current).id.short(PREFIX_LEN));
        visited[current as usize] = true;

        match graph.parents_of(current).first() {
            Some(&parent) if !visited[parent as usize] => current = parent,
            _ => break,
        }
    }

    signature
}

/// Scores every unordered pair of distinct leaves and reports candidates.
///
/// Candidates score at or above `SIMILARITY_THRESHOLD` and are returned
/// highest score first.
#[must_use]
pub fn detect_rewrites(graph: &CommitGraph) -> Vec<RewriteCandidate> {
    let leaves = graph.leaves();
    let paths: Vec<String> = leaves
        .iter()
        .map(|&leaf| ancestry_path(graph, leaf))
        .collect();

    let mut candidates = Vec::new();
    for i in 0..leaves.len() {
        for j in i + 1..leaves.len() {
            let score = jaro_winkler(&paths[i], &paths[j]);
            if score >= SIMILARITY_THRESHOLD {
                candidates.push(RewriteCandidate {
                    first: graph.node(leaves[i]).id,
                    second: graph.node(leaves[j]).id,
                    score,
                    first_path: paths[i].clone(),
                    second_path: paths[j].clone(),
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.first, a.second).cmp(&(b.first, b.second)))
    });
    candidates
}
