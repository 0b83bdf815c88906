/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Incremental 2-approximate vertex covers.

use crate::traits::RandomAccessGraph;
use nonmax::NonMaxUsize;
use sux::prelude::*;

/// A 2-approximate vertex cover maintained under arc insertions and deletions.
///
/// The cover is the set of endpoints of a maximal matching: since every arc
/// has an endpoint in common with some arc of the matching, the endpoints of
/// the matching cover all arcs, and since any cover must contain at least one
/// endpoint of each matched arc, the cover is at most twice as large as a
/// minimum cover. Arcs are treated as undirected edges, and a loop is matched
/// with itself.
///
/// Insertions take constant time. Deletions of a matched edge must look for
/// edges that are no longer covered: edges leaving the endpoints are found by
/// enumerating their successors, but edges entering the endpoints require a
/// scan of the whole graph, which dominates the cost of a deletion.
///
/// The cover is valid after each call: for every edge (*u*, *v*) mirrored by
/// calls to [`insert_edge`](VertexCover::insert_edge) and
/// [`delete_edge`](VertexCover::delete_edge), *u* or *v* is in the cover.
#[derive(Debug, Clone)]
pub struct VertexCover {
    /// The number of nodes; `in_cover` might be longer.
    num_nodes: usize,
    in_cover: BitVec,
    /// For each node, the other endpoint of its matched edge, if any.
    matching: Vec<Option<NonMaxUsize>>,
    cover_size: usize,
    matching_size: usize,
}

impl VertexCover {
    /// Creates an empty cover for a graph with `num_nodes` nodes.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            in_cover: BitVec::new(num_nodes),
            matching: vec![None; num_nodes],
            cover_size: 0,
            matching_size: 0,
        }
    }

    /// Creates a cover of the arcs of a graph.
    pub fn from_graph(graph: &impl RandomAccessGraph) -> Self {
        let mut cover = Self::new(graph.num_nodes());
        for u in 0..graph.num_nodes() {
            for v in graph.successors(u) {
                cover.insert_edge(u, v);
            }
        }
        cover
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Ensures that the cover can handle at least `num_nodes` nodes.
    ///
    /// New nodes are not in the cover.
    pub fn grow(&mut self, num_nodes: usize) {
        if num_nodes <= self.num_nodes {
            return;
        }
        if num_nodes > self.in_cover.len() {
            let mut in_cover = BitVec::new(num_nodes.max(2 * self.in_cover.len()));
            for node in self.iter() {
                in_cover.set(node, true);
            }
            self.in_cover = in_cover;
        }
        self.matching.resize(num_nodes, None);
        self.num_nodes = num_nodes;
    }

    /// Returns whether a node is in the cover.
    ///
    /// Nodes beyond [`num_nodes`](Self::num_nodes) are not in the cover.
    #[inline(always)]
    pub fn is_in_vertex_cover(&self, node: usize) -> bool {
        node < self.num_nodes && self.in_cover[node]
    }

    /// Returns the other endpoint of the matched edge of a node, if any.
    #[inline(always)]
    pub fn matched(&self, node: usize) -> Option<usize> {
        self.matching
            .get(node)
            .copied()
            .flatten()
            .map(|other| other.get())
    }

    /// Returns the number of nodes in the cover.
    pub fn cover_size(&self) -> usize {
        self.cover_size
    }

    /// Returns the number of edges in the maximal matching.
    pub fn matching_size(&self) -> usize {
        self.matching_size
    }

    /// Returns an iterator over the nodes in the cover, in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_nodes).filter(move |&node| self.in_cover[node])
    }

    fn add_to_matching(&mut self, u: usize, v: usize) {
        self.matching[u] = NonMaxUsize::new(v);
        self.matching[v] = NonMaxUsize::new(u);
        self.in_cover.set(u, true);
        self.cover_size += 1;
        if u != v {
            self.in_cover.set(v, true);
            self.cover_size += 1;
        }
        self.matching_size += 1;
    }

    fn remove_from_matching(&mut self, u: usize, v: usize) {
        self.matching[u] = None;
        self.matching[v] = None;
        self.in_cover.set(u, false);
        self.cover_size -= 1;
        if u != v {
            self.in_cover.set(v, false);
            self.cover_size -= 1;
        }
        self.matching_size -= 1;
    }

    /// Records the insertion of an edge, and returns true if the edge was
    /// added to the matching.
    ///
    /// If neither endpoint is in the cover, the edge is added to the matching
    /// and both endpoints enter the cover; otherwise, nothing happens. The
    /// cover grows to include the endpoints if necessary.
    pub fn insert_edge(&mut self, u: usize, v: usize) -> bool {
        self.grow(u.max(v) + 1);
        if self.in_cover[u] || self.in_cover[v] {
            return false;
        }
        self.add_to_matching(u, v);
        true
    }

    /// Records the deletion of an edge, and returns true if the edge was in
    /// the matching.
    ///
    /// The graph must not contain the edge anymore (in either direction, if
    /// both were inserted). If the edge is matched, it is removed from the
    /// matching, and both endpoints leave the cover; then, edges incident to
    /// the endpoints that are no longer covered are added to the matching:
    /// first, by looking at the successors of each endpoint, and then by
    /// scanning all arcs of the graph for arcs entering the endpoints.
    ///
    /// Deleting an edge that is not matched (or that was never inserted) is a
    /// no-op.
    pub fn delete_edge(&mut self, graph: &impl RandomAccessGraph, u: usize, v: usize) -> bool {
        if self.matched(u) != Some(v) {
            return false;
        }
        self.remove_from_matching(u, v);
        self.grow(graph.num_nodes());

        for x in [u, v] {
            if self.in_cover[x] || x >= graph.num_nodes() {
                continue;
            }
            for w in graph.successors(x) {
                if !self.is_in_vertex_cover(w) {
                    self.add_to_matching(x, w);
                    break;
                }
            }
        }

        // Arcs entering u or v can be found only by a full scan
        if !self.in_cover[u] || !self.in_cover[v] {
            for y in 0..graph.num_nodes() {
                if self.is_in_vertex_cover(y) {
                    continue;
                }
                for w in graph.successors(y) {
                    if (w == u || w == v) && !self.in_cover[w] {
                        self.add_to_matching(y, w);
                        break;
                    }
                }
            }
        }

        log::debug!(
            "Deleted matched edge ({}, {}): cover size {}, matching size {}",
            u,
            v,
            self.cover_size,
            self.matching_size
        );
        true
    }

    /// Returns the first arc of the graph that is not covered, if any.
    pub fn check(&self, graph: &impl RandomAccessGraph) -> Option<(usize, usize)> {
        for u in 0..graph.num_nodes() {
            if self.is_in_vertex_cover(u) {
                continue;
            }
            for v in graph.successors(u) {
                if !self.is_in_vertex_cover(v) {
                    return Some((u, v));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_grow_preserves_membership() {
        let mut cover = VertexCover::new(2);
        assert!(cover.insert_edge(0, 1));
        cover.grow(100);
        assert!(cover.is_in_vertex_cover(0));
        assert!(cover.is_in_vertex_cover(1));
        assert!(!cover.is_in_vertex_cover(99));
        assert!(!cover.is_in_vertex_cover(100));
        assert_eq!(cover.iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_loop() {
        let mut cover = VertexCover::new(1);
        assert!(cover.insert_edge(0, 0));
        assert_eq!(cover.cover_size(), 1);
        assert_eq!(cover.matching_size(), 1);
        assert_eq!(cover.matched(0), Some(0));
    }
}
