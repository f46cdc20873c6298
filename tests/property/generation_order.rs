//! Property tests for generation number computation.
//!
//! Generation numbers must be (a) independent of the order objects were
//! decoded in, and (b) equal to the brute-force longest-path distance
//! from the roots — first-arrival BFS distances are a classic wrong
//! answer on merge-heavy graphs, and these properties pin the
//! relaxation-based implementation against both failure modes.

use proptest::prelude::*;

use git_forensics::{build_commit_graph, generation_numbers, GitObject, ObjectId, ObjectKind};

/// Builds a commit whose body lists the given parents.
fn commit(marker: usize, parents: &[ObjectId]) -> GitObject {
    let mut body = String::from("tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n");
    for parent in parents {
        body.push_str(&format!("parent {parent}\n"));
    }
    body.push_str(&format!("\nnode {marker}\n"));
    GitObject::new(ObjectKind::Commit, body.into_bytes())
}

/// Materializes a random DAG shape (node i's parents are drawn from
/// 0..i) into commit objects, in node order.
fn materialize(shape: &[Vec<usize>]) -> Vec<GitObject> {
    let mut commits: Vec<GitObject> = Vec::new();
    for (i, parent_indices) in shape.iter().enumerate() {
        let parents: Vec<ObjectId> = parent_indices.iter().map(|&p| commits[p].id).collect();
        commits.push(commit(i, &parents));
    }
    commits
}

/// Brute-force longest-path oracle over the DAG shape.
///
/// Node order is already topological (parents precede children), so one
/// forward pass suffices: roots are 0, everything else is
/// `1 + max(parent depths)`.
fn oracle_depths(shape: &[Vec<usize>]) -> Vec<u32> {
    let mut depth = vec![0u32; shape.len()];
    for (i, parents) in shape.iter().enumerate() {
        if let Some(max_parent) = parents.iter().map(|&p| depth[p]).max() {
            depth[i] = max_parent + 1;
        }
    }
    depth
}

/// Strategy: a DAG shape of 1..16 nodes with up to 3 parents each, plus
/// a shuffled insertion order over its nodes.
fn dag_with_order() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<usize>)> {
    (1usize..16)
        .prop_flat_map(|n| {
            let shape: Vec<_> = (0..n)
                .map(|i| {
                    let candidates: Vec<usize> = (0..i).collect();
                    let max_parents = i.min(3);
                    proptest::sample::subsequence(candidates, 0..=max_parents)
                })
                .collect();
            let order = Just((0..n).collect::<Vec<usize>>()).prop_shuffle();
            (shape, order)
        })
        .boxed()
}

proptest! {
    #[test]
    fn generation_matches_longest_path_oracle((shape, _) in dag_with_order()) {
        let commits = materialize(&shape);
        let graph = build_commit_graph(&commits);
        let generations = generation_numbers(&graph);
        let expected = oracle_depths(&shape);

        for (i, commit) in commits.iter().enumerate() {
            prop_assert_eq!(
                generations[&commit.id],
                expected[i],
                "node {} depth mismatch", i
            );
        }
    }

    #[test]
    fn generation_is_insertion_order_independent((shape, order) in dag_with_order()) {
        let commits = materialize(&shape);

        let baseline = generation_numbers(&build_commit_graph(&commits));

        let shuffled: Vec<GitObject> =
            order.iter().map(|&i| commits[i].clone()).collect();
        let permuted = generation_numbers(&build_commit_graph(&shuffled));

        prop_assert_eq!(baseline, permuted);
    }

    #[test]
    fn partial_scans_never_fail((shape, order) in dag_with_order()) {
        // Dropping a prefix of the insertion order leaves dangling parent
        // references; the graph must still build and stay total.
        let commits = materialize(&shape);
        let keep: Vec<GitObject> = order
            .iter()
            .skip(order.len() / 2)
            .map(|&i| commits[i].clone())
            .collect();

        let graph = build_commit_graph(&keep);
        let generations = generation_numbers(&graph);
        prop_assert_eq!(generations.len(), keep.len());
    }
}
