//! Aggregate commit graph statistics and cycle detection.
//!
//! Commit graphs are expected to be acyclic, but a damaged or forged
//! store can violate that; the analyzer tolerates and reports violations,
//! never assumes. Acyclicity itself comes from Kahn's ordering (every
//! node retires iff the graph is a DAG). When the graph is cyclic, simple
//! cycles are enumerated under explicit bounds: an anchored DFS confined
//! to positions at or above the anchor finds each simple cycle exactly
//! once, from its minimum-position node.
//!
//! # Degradation
//! An internal analysis failure must not abort stats computation: if the
//! cycle search exhausts its step budget, the status degrades to the
//! `Indeterminate` sentinel and the partial cycle list is kept. Hitting
//! the cycle cap truncates the list with a diagnostic, never silently.

use log::warn;
use serde::Serialize;

use crate::commit_graph::CommitGraph;
use crate::object_id::ObjectId;

/// Acyclicity verdict for a commit graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DagStatus {
    /// Every node retired through the topological ordering.
    Acyclic,
    /// At least one cycle exists.
    Cyclic,
    /// Analysis exhausted its budget before a verdict on the cycle set.
    Indeterminate,
}

/// Bounds for cycle enumeration.
#[derive(Debug, Clone, Copy)]
pub struct CycleLimits {
    /// Maximum simple cycles to report.
    pub max_cycles: usize,
    /// Maximum DFS edge visits across the whole search.
    pub max_steps: u64,
}

impl Default for CycleLimits {
    fn default() -> Self {
        Self {
            max_cycles: 64,
            max_steps: 1_000_000,
        }
    }
}

/// Aggregate statistics over one commit graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub roots: usize,
    pub leaves: usize,
    /// Nodes with in-degree greater than one.
    pub merge_commits: usize,
    pub dag_status: DagStatus,
    /// Simple cycles, populated only when the graph is cyclic.
    pub cycles: Vec<Vec<ObjectId>>,
}

/// Computes graph statistics with default cycle bounds.
#[must_use]
pub fn graph_stats(graph: &CommitGraph) -> GraphStats {
    graph_stats_with_limits(graph, &CycleLimits::default())
}

/// Computes graph statistics under explicit cycle bounds.
#[must_use]
pub fn graph_stats_with_limits(graph: &CommitGraph, limits: &CycleLimits) -> GraphStats {
    let n = graph.node_count();
    let merge_commits = (0..n as u32).filter(|&pos| graph.in_degree(pos) > 1).count();

    let acyclic = kahn_retires_all(graph);
    let (dag_status, cycles) = if acyclic {
        (DagStatus::Acyclic, Vec::new())
    } else {
        match enumerate_simple_cycles(graph, limits) {
            Ok(cycles) => (DagStatus::Cyclic, cycles),
            Err(cycles) => {
                warn!(
                    "cycle search exhausted its {}-step budget; reporting indeterminate status",
                    limits.max_steps
                );
                (DagStatus::Indeterminate, cycles)
            }
        }
    };

    GraphStats {
        nodes: n,
        edges: graph.edge_count(),
        roots: graph.roots().len(),
        leaves: graph.leaves().len(),
        merge_commits,
        dag_status,
        cycles,
    }
}

/// Returns true iff Kahn's ordering retires every node.
fn kahn_retires_all(graph: &CommitGraph) -> bool {
    let n = graph.node_count();
    let mut remaining: Vec<usize> = (0..n as u32).map(|pos| graph.in_degree(pos)).collect();
    let mut queue: Vec<u32> = (0..n as u32)
        .filter(|&pos| remaining[pos as usize] == 0)
        .collect();

    let mut retired = 0usize;
    while let Some(pos) = queue.pop() {
        retired += 1;
        for &child in graph.children_of(pos) {
            remaining[child as usize] -= 1;
            if remaining[child as usize] == 0 {
                queue.push(child);
            }
        }
    }
    retired == n
}

/// Enumerates simple cycles via anchored DFS.
///
/// For each anchor position in ascending order, paths are explored using
/// only positions >= the anchor; an edge back to the anchor closes a
/// cycle. Every simple cycle is therefore found exactly once, rooted at
/// its minimum position.
///
/// Returns `Err` with the partial list if the step budget runs out.
fn enumerate_simple_cycles(
    graph: &CommitGraph,
    limits: &CycleLimits,
) -> Result<Vec<Vec<ObjectId>>, Vec<Vec<ObjectId>>> {
    let n = graph.node_count() as u32;
    let mut cycles: Vec<Vec<ObjectId>> = Vec::new();
    let mut steps = 0u64;
    let mut on_path = vec![false; n as usize];

    for anchor in 0..n {
        let mut path: Vec<u32> = vec![anchor];
        let mut cursor: Vec<usize> = vec![0];
        on_path[anchor as usize] = true;

        while let Some(&current) = path.last() {
            let next_child = {
                let children = graph.children_of(current);
                let idx = cursor.last_mut().expect("cursor tracks path");
                if *idx < children.len() {
                    let child = children[*idx];
                    *idx += 1;
                    Some(child)
                } else {
                    None
                }
            };

            match next_child {
                Some(child) => {
                    steps += 1;
                    if steps > limits.max_steps {
                        unwind(&mut path, &mut on_path);
                        return Err(cycles);
                    }
                    if child == anchor {
                        cycles.push(path.iter().map(|&pos| graph.node(pos).id).collect());
                        if cycles.len() >= limits.max_cycles {
                            warn!(
                                "cycle list truncated at {} entries",
                                limits.max_cycles
                            );
                            unwind(&mut path, &mut on_path);
                            return Ok(cycles);
                        }
                    } else if child > anchor && !on_path[child as usize] {
                        path.push(child);
                        cursor.push(0);
                        on_path[child as usize] = true;
                    }
                }
                None => {
                    path.pop();
                    cursor.pop();
                    on_path[current as usize] = false;
                }
            }
        }
    }

    Ok(cycles)
}

fn unwind(path: &mut Vec<u32>, on_path: &mut [bool]) {
    for &pos in path.iter() {
        on_path[pos as usize] = false;
    }
    path.clear();
}
