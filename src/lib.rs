//! Direct Git object store inspection with no dependency on the `git` binary.
//!
//! ## Scope
//! This crate decodes a repository's on-disk object store — loose objects
//! and packed archives with their `.idx` companions — and reconstructs
//! decode-level facts about its history: which objects exist, what they
//! contain, how commits relate, and whether any commit lineage looks like
//! a near-duplicate of another (a heuristic signal of history rewriting).
//!
//! ## Key invariants
//! - Every decoded object satisfies `size == content.len()` and
//!   `id == sha1("<kind> <size>\0" ++ content)`.
//! - Bulk extraction is best-effort: per-object failures become skip
//!   records and diagnostics, never an aborted batch. Unary reads fail
//!   fast with a specific error.
//! - Graphs built from partial scans are valid partial graphs: nodes are
//!   added before edges, and absent parents never dangle.
//! - The analyzers tolerate cyclic input and report it; they never assume
//!   a DAG.
//!
//! ## Flow
//! `store root -> StoreWalker -> survey / scan_store -> [GitObject]
//!  -> build_commit_graph -> generation_numbers / graph_stats
//!  -> detect_rewrites`
//!
//! ## Notable entry points
//! - [`read_loose_object`] / [`read_packed_objects`] /
//!   [`read_single_object`]: object decoding.
//! - [`FsWalker`], [`survey`], [`scan_store`]: store-level scanning.
//! - [`build_commit_graph`], [`generation_numbers`], [`graph_stats`],
//!   [`detect_rewrites`]: graph analysis.
//!
//! Orchestration that shells out to the `git` binary (bisect drivers,
//! merge helpers, repair scripts) sits outside this crate and consumes
//! the same surface.

pub mod commit_graph;
pub mod commit_parse;
pub mod errors;
pub mod generation;
pub mod loose;
pub mod object;
pub mod object_id;
pub mod pack_idx;
pub mod pack_read;
pub mod rewrite;
pub mod stats;
pub mod store_walk;

pub use commit_graph::{build_commit_graph, CommitGraph, NodeRecord};
pub use commit_parse::parse_commit_parents;
pub use errors::{ErrorClass, StoreError};
pub use generation::generation_numbers;
pub use loose::read_loose_object;
pub use object::{compute_id, GitObject, ObjectKind};
pub use object_id::ObjectId;
pub use pack_idx::PackIndex;
pub use pack_read::{
    find_idx_path, read_packed_objects, read_single_object, PackReadReport, PackSkip,
};
pub use rewrite::{ancestry_path, detect_rewrites, RewriteCandidate, SIMILARITY_THRESHOLD};
pub use stats::{graph_stats, graph_stats_with_limits, CycleLimits, DagStatus, GraphStats};
pub use store_walk::{
    discover_git_dir, enumerate_loose_object_dirs, enumerate_pack_files, scan_store, survey,
    FsWalker, ScanReport, ScanSkip, StoreSurvey, StoreWalker,
};
