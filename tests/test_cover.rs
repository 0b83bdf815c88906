/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use webgraph_danf::prelude::*;

#[test]
fn test_triangle() {
    let mut graph = VecGraph::empty(3);
    let mut cover = VertexCover::new(3);
    for (u, v) in [(0, 1), (1, 2), (2, 0)] {
        graph.add_arc(u, v);
        cover.insert_edge(u, v);
        assert_eq!(cover.check(&graph), None);
    }
    assert!(cover.cover_size() >= 2);
    assert_eq!(cover.matching_size(), 1);

    for (u, v) in [(0, 1), (1, 2), (2, 0)] {
        graph.remove_arc(u, v);
        cover.delete_edge(&graph, u, v);
        assert_eq!(cover.check(&graph), None);
    }
    assert_eq!(cover.cover_size(), 0);
    assert_eq!(cover.matching_size(), 0);
    assert_eq!(cover.iter().count(), 0);
}

#[test]
fn test_unmatched_deletion_is_noop() {
    let mut graph = VecGraph::from_arcs([(0, 1), (0, 2)]);
    let mut cover = VertexCover::from_graph(&graph);
    assert_eq!(cover.matched(0), Some(1));
    graph.remove_arc(0, 2);
    assert!(!cover.delete_edge(&graph, 0, 2));
    // Never inserted
    assert!(!cover.delete_edge(&graph, 1, 2));
    assert_eq!(cover.cover_size(), 2);
    assert_eq!(cover.matching_size(), 1);
}

#[test]
fn test_inward_arcs_are_recovered() {
    // Arcs entering 0 are found only by scanning the graph
    let mut graph = VecGraph::from_arcs([(0, 1), (2, 0), (3, 0)]);
    let mut cover = VertexCover::from_graph(&graph);
    assert_eq!(cover.iter().collect::<Vec<_>>(), vec![0, 1]);
    graph.remove_arc(0, 1);
    assert!(cover.delete_edge(&graph, 0, 1));
    assert_eq!(cover.check(&graph), None);
    assert!(cover.is_in_vertex_cover(0));
    assert_eq!(cover.matched(0), Some(2));
}

#[test]
fn test_random_insertions_and_deletions() {
    let mut rng = SmallRng::seed_from_u64(0);
    for num_nodes in [2, 10, 50] {
        let mut graph = VecGraph::empty(num_nodes);
        let mut cover = VertexCover::new(num_nodes);
        let mut arcs = vec![];
        for _ in 0..num_nodes * 4 {
            let u = rng.random_range(0..num_nodes);
            let v = rng.random_range(0..num_nodes);
            if u != v && graph.add_arc(u, v) {
                cover.insert_edge(u, v);
                arcs.push((u, v));
                assert_eq!(cover.check(&graph), None);
            }
        }
        assert_eq!(cover.cover_size(), 2 * cover.matching_size());
        assert_eq!(cover.iter().count(), cover.cover_size());

        arcs.shuffle(&mut rng);
        for (u, v) in arcs {
            graph.remove_arc(u, v);
            cover.delete_edge(&graph, u, v);
            assert_eq!(cover.check(&graph), None, "after deleting ({}, {})", u, v);
            assert_eq!(cover.cover_size(), 2 * cover.matching_size());
        }
        assert_eq!(cover.cover_size(), 0);
        assert_eq!(cover.matching_size(), 0);
    }
}

#[test]
fn test_growth() {
    let mut cover = VertexCover::new(0);
    assert!(cover.insert_edge(5, 1000));
    assert_eq!(cover.num_nodes(), 1001);
    assert!(cover.is_in_vertex_cover(5));
    assert!(cover.is_in_vertex_cover(1000));
    assert!(!cover.is_in_vertex_cover(6));
    assert!(!cover.insert_edge(1000, 3));
    assert_eq!(cover.cover_size(), 2);
}
