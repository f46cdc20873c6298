//! Commit graph construction from decoded objects.
//!
//! Nodes are commit IDs with a fixed `(kind, size)` payload; an edge
//! (parent, child) exists iff the parent appears in the child's body AND
//! both commits are present in the decoded set. Every node is added
//! before any edge, so a parent missing from a partial scan produces no
//! dangling edge and no error.
//!
//! # Layout
//! CSR adjacency in both directions (prefix sums + flattened position
//! arrays). Parent order within a node preserves commit-body order; the
//! first-listed parent drives ancestry path construction in the rewrite
//! detector.
//!
//! # Deterministic Ordering
//! Positions are assigned by ascending commit ID, so identical object
//! sets produce identical graphs regardless of scan order.

use std::collections::HashMap;

use crate::commit_parse::parse_commit_parents;
use crate::object::{GitObject, ObjectKind};
use crate::object_id::ObjectId;

/// Fixed per-node payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub size: u64,
}

/// Directed commit graph with CSR adjacency.
#[derive(Debug, Clone)]
pub struct CommitGraph {
    nodes: Vec<NodeRecord>,
    index: HashMap<ObjectId, u32>,

    // Parent adjacency (commit-body order, in-set parents only).
    parent_start: Vec<u32>,
    parents: Vec<u32>,

    // Child adjacency, derived from the parent lists.
    child_start: Vec<u32>,
    children: Vec<u32>,
}

impl CommitGraph {
    /// Returns the number of nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.parents.len()
    }

    /// Returns true for a graph with no nodes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node position by commit ID.
    #[must_use]
    pub fn lookup(&self, id: &ObjectId) -> Option<u32> {
        self.index.get(id).copied()
    }

    /// Returns the node record at a position.
    #[inline]
    #[must_use]
    pub fn node(&self, pos: u32) -> &NodeRecord {
        &self.nodes[pos as usize]
    }

    /// Returns all node records in position order.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    /// Returns a node's parents in commit-body order.
    #[inline]
    #[must_use]
    pub fn parents_of(&self, pos: u32) -> &[u32] {
        let start = self.parent_start[pos as usize] as usize;
        let end = self.parent_start[pos as usize + 1] as usize;
        &self.parents[start..end]
    }

    /// Returns a node's children.
    #[inline]
    #[must_use]
    pub fn children_of(&self, pos: u32) -> &[u32] {
        let start = self.child_start[pos as usize] as usize;
        let end = self.child_start[pos as usize + 1] as usize;
        &self.children[start..end]
    }

    /// In-degree: number of parents present in the graph.
    #[inline]
    #[must_use]
    pub fn in_degree(&self, pos: u32) -> usize {
        self.parents_of(pos).len()
    }

    /// Out-degree: number of children present in the graph.
    #[inline]
    #[must_use]
    pub fn out_degree(&self, pos: u32) -> usize {
        self.children_of(pos).len()
    }

    /// Returns positions with in-degree 0, ascending.
    #[must_use]
    pub fn roots(&self) -> Vec<u32> {
        (0..self.node_count() as u32)
            .filter(|&pos| self.in_degree(pos) == 0)
            .collect()
    }

    /// Returns positions with out-degree 0, ascending.
    #[must_use]
    pub fn leaves(&self) -> Vec<u32> {
        (0..self.node_count() as u32)
            .filter(|&pos| self.out_degree(pos) == 0)
            .collect()
    }
}

/// Builds a commit graph from the full decoded-object set.
///
/// Non-commit objects are filtered out; duplicate commits (the same ID
/// decoded both loose and packed) occupy one node. Parents referenced
/// but absent from the set contribute no edge.
#[must_use]
pub fn build_commit_graph(objects: &[GitObject]) -> CommitGraph {
    // Phase 1: every commit becomes a node before any edge exists.
    let mut commits: Vec<&GitObject> = objects
        .iter()
        .filter(|obj| obj.kind == ObjectKind::Commit)
        .collect();
    commits.sort_by(|a, b| a.id.cmp(&b.id));
    commits.dedup_by(|a, b| a.id == b.id);

    let n = commits.len();
    let mut nodes = Vec::with_capacity(n);
    let mut index = HashMap::with_capacity(n);
    for (pos, commit) in commits.iter().enumerate() {
        nodes.push(NodeRecord {
            id: commit.id,
            kind: commit.kind,
            size: commit.size,
        });
        index.insert(commit.id, pos as u32);
    }

    // Phase 2: edges, dropping references to absent parents.
    let mut parent_start = Vec::with_capacity(n + 1);
    let mut parents: Vec<u32> = Vec::new();
    parent_start.push(0);
    for commit in &commits {
        for parent_id in parse_commit_parents(&commit.content) {
            if let Some(&parent_pos) = index.get(&parent_id) {
                parents.push(parent_pos);
            }
        }
        parent_start.push(parents.len() as u32);
    }

    // Derive child adjacency by counting, then filling.
    let mut child_counts = vec![0u32; n];
    for &parent_pos in &parents {
        child_counts[parent_pos as usize] += 1;
    }
    let mut child_start = Vec::with_capacity(n + 1);
    child_start.push(0u32);
    for count in &child_counts {
        child_start.push(child_start.last().copied().unwrap_or(0) + count);
    }

    let mut children = vec![0u32; parents.len()];
    let mut fill = child_start.clone();
    for child_pos in 0..n as u32 {
        let start = parent_start[child_pos as usize] as usize;
        let end = parent_start[child_pos as usize + 1] as usize;
        for &parent_pos in &parents[start..end] {
            let slot = fill[parent_pos as usize];
            children[slot as usize] = child_pos;
            fill[parent_pos as usize] += 1;
        }
    }

    CommitGraph {
        nodes,
        index,
        parent_start,
        parents,
        child_start,
        children,
    }
}
