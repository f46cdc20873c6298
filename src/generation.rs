//! Generation numbers: longest-path depth from any root.
//!
//! A node's generation number is the maximum edge-count distance from any
//! in-degree-0 node to it over the graph as materialized; roots are 0.
//! A graph built from a partial scan yields partial, still-valid numbers
//! (a commit whose parents were not decoded counts as a root).
//!
//! # Order Independence
//! Distances are relaxed along Kahn's topological ordering: a node's
//! value is only final once every in-edge has been relaxed, so a later,
//! longer path always overwrites an earlier, shorter one. The result is
//! identical for every queue order — a naive single-visit BFS is not,
//! and under-counts nodes reachable through merge predecessors of
//! different depths.
//!
//! # Cyclic Input
//! Nodes on or downstream of a cycle never retire from the frontier;
//! they keep the best distance relaxed into them before the ordering
//! stalled. The map stays total over all nodes.

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::commit_graph::CommitGraph;
use crate::object_id::ObjectId;

/// Computes the generation number of every node.
#[must_use]
pub fn generation_numbers(graph: &CommitGraph) -> HashMap<ObjectId, u32> {
    let n = graph.node_count();
    let mut distance = vec![0u32; n];
    let mut remaining: Vec<usize> = (0..n as u32).map(|pos| graph.in_degree(pos)).collect();

    let mut queue: VecDeque<u32> = (0..n as u32)
        .filter(|&pos| remaining[pos as usize] == 0)
        .collect();

    while let Some(pos) = queue.pop_front() {
        let next = distance[pos as usize].saturating_add(1);
        for &child in graph.children_of(pos) {
            if next > distance[child as usize] {
                distance[child as usize] = next;
            }
            remaining[child as usize] -= 1;
            if remaining[child as usize] == 0 {
                queue.push_back(child);
            }
        }
    }

    (0..n as u32)
        .map(|pos| (graph.node(pos).id, distance[pos as usize]))
        .collect()
}
