/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::{MutableGraph, RandomAccessGraph};

/// A mutable [`RandomAccessGraph`] implementation based on a vector of
/// vectors.
///
/// Successor lists are kept sorted, so arcs can be added (and removed) in any
/// order, at the price of a binary search and of a shift of the list tail.
/// This is the natural choice for small graphs, for tests, and as the overlay
/// of a [`DeltaGraph`](crate::graphs::delta_graph::DeltaGraph).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VecGraph {
    /// The number of arcs in the graph.
    num_arcs: u64,
    /// For each node, its sorted list of successors.
    succ: Vec<Vec<usize>>,
}

impl VecGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty graph with `n` nodes.
    pub fn empty(n: usize) -> Self {
        Self {
            num_arcs: 0,
            succ: Vec::from_iter((0..n).map(|_| Vec::new())),
        }
    }

    /// Adds an isolated node to the graph and returns true if it is a new node.
    pub fn add_node(&mut self, node: usize) -> bool {
        let len = self.succ.len();
        self.succ.extend((len..=node).map(|_| Vec::new()));
        len <= node
    }

    /// Adds an arc to the graph and returns true if the arc was not present.
    ///
    /// # Panics
    ///
    /// This method will panic if one of the given nodes is greater or equal
    /// than the number of nodes in the graph.
    pub fn add_arc(&mut self, u: usize, v: usize) -> bool {
        let max = u.max(v);
        if max >= self.succ.len() {
            panic!(
                "Node {} does not exist (the graph has {} nodes)",
                max,
                self.succ.len(),
            );
        }
        let succ = &mut self.succ[u];
        match succ.binary_search(&v) {
            Ok(_) => false,
            Err(pos) => {
                succ.insert(pos, v);
                self.num_arcs += 1;
                true
            }
        }
    }

    /// Removes an arc from the graph and returns true if the arc was present.
    pub fn remove_arc(&mut self, u: usize, v: usize) -> bool {
        let Some(succ) = self.succ.get_mut(u) else {
            return false;
        };
        match succ.binary_search(&v) {
            Ok(pos) => {
                succ.remove(pos);
                self.num_arcs -= 1;
                true
            }
            Err(_) => false,
        }
    }

    /// Creates a new graph from an [`IntoIterator`] of arcs, adding nodes as
    /// needed.
    pub fn from_arcs(arcs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut g = Self::new();
        g.add_arcs(arcs);
        g
    }

    /// Returns the transpose of this graph.
    pub fn transpose(&self) -> Self {
        let mut t = Self::empty(self.num_nodes());
        for (u, succ) in self.succ.iter().enumerate() {
            for &v in succ {
                // Sources are enumerated in increasing order, so pushing
                // keeps the lists of the transpose sorted
                t.succ[v].push(u);
            }
        }
        t.num_arcs = self.num_arcs;
        t
    }
}

impl RandomAccessGraph for VecGraph {
    type Successors<'succ> = core::iter::Copied<core::slice::Iter<'succ, usize>>;

    #[inline(always)]
    fn num_nodes(&self) -> usize {
        self.succ.len()
    }

    #[inline(always)]
    fn num_arcs(&self) -> u64 {
        self.num_arcs
    }

    #[inline(always)]
    fn outdegree(&self, node: usize) -> usize {
        self.succ[node].len()
    }

    #[inline(always)]
    fn successors(&self, node: usize) -> Self::Successors<'_> {
        self.succ[node].iter().copied()
    }

    fn has_arc(&self, src: usize, dst: usize) -> bool {
        self.succ
            .get(src)
            .is_some_and(|succ| succ.binary_search(&dst).is_ok())
    }
}

impl MutableGraph for VecGraph {
    fn add_arcs(&mut self, arcs: impl IntoIterator<Item = (usize, usize)>) -> usize {
        let mut added = 0;
        for (u, v) in arcs {
            self.add_node(u.max(v));
            if self.add_arc(u, v) {
                added += 1;
            }
        }
        added
    }

    fn add_nodes(&mut self, num_nodes: usize) {
        if num_nodes > 0 {
            self.add_node(num_nodes - 1);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sorted_insertion() {
        let mut g = VecGraph::empty(4);
        assert!(g.add_arc(0, 3));
        assert!(g.add_arc(0, 1));
        assert!(g.add_arc(0, 2));
        assert!(!g.add_arc(0, 1));
        assert_eq!(g.successors(0).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(g.num_arcs(), 3);
        assert!(g.remove_arc(0, 2));
        assert!(!g.remove_arc(0, 2));
        assert!(!g.remove_arc(7, 2));
        assert_eq!(g.successors(0).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(g.num_arcs(), 2);
    }

    #[test]
    fn test_transpose() {
        let g = VecGraph::from_arcs([(0, 1), (2, 1), (1, 0), (3, 3)]);
        let t = g.transpose();
        assert_eq!(t.num_nodes(), 4);
        assert_eq!(t.num_arcs(), 4);
        assert_eq!(t.successors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(t.successors(1).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(t.successors(3).collect::<Vec<_>>(), vec![3]);
        assert!(t.has_arc(1, 2));
        assert!(!t.has_arc(2, 1));
    }
}
