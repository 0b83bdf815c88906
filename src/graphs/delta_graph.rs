/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::traits::{MutableGraph, RandomAccessGraph};
use core::iter::Flatten;
use itertools::{Dedup, Itertools, Merge};

/// A growing graph made of an immutable base graph and an append-only overlay
/// of new arcs.
///
/// The base graph is never modified: new arcs (and new nodes) go to the
/// overlay, which keeps, for each node, a sorted list of the successors that
/// are not in the base graph. The two successor lists are merged lazily when
/// [`successors`](RandomAccessGraph::successors) is called.
///
/// This is the natural representation of a large, compressed graph receiving
/// batches of new arcs: the base graph can be, for instance, memory mapped,
/// while the overlay stays small until it is merged into a new base graph by
/// an external tool.
#[derive(Debug, Clone)]
pub struct DeltaGraph<G: RandomAccessGraph> {
    base: G,
    /// For each node, the sorted list of successors that are not in `base`.
    overlay: Vec<Vec<usize>>,
    /// The number of arcs in the overlay.
    overlay_arcs: u64,
}

impl<G: RandomAccessGraph> DeltaGraph<G> {
    /// Creates a new delta graph with an empty overlay.
    pub fn new(base: G) -> Self {
        Self {
            base,
            overlay: Vec::new(),
            overlay_arcs: 0,
        }
    }

    /// Returns the base graph.
    pub fn base(&self) -> &G {
        &self.base
    }

    /// Returns the number of arcs in the overlay.
    pub fn num_overlay_arcs(&self) -> u64 {
        self.overlay_arcs
    }

    /// Returns the arcs of the overlay in lexicographical order.
    pub fn overlay_arcs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.overlay
            .iter()
            .enumerate()
            .flat_map(|(u, succ)| succ.iter().map(move |&v| (u, v)))
    }

    /// Splits the graph into its base and its overlay arcs.
    pub fn into_parts(self) -> (G, Vec<(usize, usize)>) {
        let arcs = self.overlay_arcs().collect();
        (self.base, arcs)
    }

    fn contains(&self, u: usize, v: usize) -> bool {
        (u < self.base.num_nodes() && v < self.base.num_nodes() && self.base.has_arc(u, v))
            || self
                .overlay
                .get(u)
                .is_some_and(|succ| succ.binary_search(&v).is_ok())
    }
}

impl<G: RandomAccessGraph> RandomAccessGraph for DeltaGraph<G> {
    type Successors<'succ>
        = Dedup<
        Merge<
            Flatten<core::option::IntoIter<<G::Successors<'succ> as IntoIterator>::IntoIter>>,
            core::iter::Copied<core::slice::Iter<'succ, usize>>,
        >,
    >
    where
        Self: 'succ;

    #[inline(always)]
    fn num_nodes(&self) -> usize {
        self.base.num_nodes().max(self.overlay.len())
    }

    #[inline(always)]
    fn num_arcs(&self) -> u64 {
        self.base.num_arcs() + self.overlay_arcs
    }

    #[inline(always)]
    fn outdegree(&self, node: usize) -> usize {
        let base = if node < self.base.num_nodes() {
            self.base.outdegree(node)
        } else {
            0
        };
        base + self.overlay.get(node).map_or(0, Vec::len)
    }

    /// Returns the merge of the successors in the base graph and in the
    /// overlay; arcs are never in both, but duplicates are removed anyway.
    #[inline(always)]
    fn successors(&self, node: usize) -> Self::Successors<'_> {
        let base = (node < self.base.num_nodes()).then(|| self.base.successors(node).into_iter());
        let overlay = self.overlay.get(node).map_or(&[][..], Vec::as_slice);
        base.into_iter()
            .flatten()
            .merge(overlay.iter().copied())
            .dedup()
    }

    fn has_arc(&self, src: usize, dst: usize) -> bool {
        self.contains(src, dst)
    }
}

impl<G: RandomAccessGraph> MutableGraph for DeltaGraph<G> {
    fn add_arcs(&mut self, arcs: impl IntoIterator<Item = (usize, usize)>) -> usize {
        let mut added = 0;
        for (u, v) in arcs.into_iter().sorted().dedup() {
            self.add_nodes(u.max(v) + 1);
            if self.contains(u, v) {
                continue;
            }
            let succ = &mut self.overlay[u];
            // Arcs are sorted, so the overlay list of u grows at the end
            // unless it already contained larger successors
            match succ.last() {
                Some(&last) if last > v => {
                    let pos = succ.partition_point(|&x| x < v);
                    succ.insert(pos, v);
                }
                _ => succ.push(v),
            }
            self.overlay_arcs += 1;
            added += 1;
        }
        added
    }

    fn add_nodes(&mut self, num_nodes: usize) {
        if num_nodes > self.overlay.len() {
            self.overlay.resize_with(num_nodes, Vec::new);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphs::vec_graph::VecGraph;

    #[test]
    fn test_delta_graph() -> anyhow::Result<()> {
        let base = VecGraph::from_arcs([(0, 1), (0, 3), (1, 2), (2, 0), (2, 4), (3, 4)]);
        let mut g = DeltaGraph::new(base);
        assert_eq!(g.num_nodes(), 5);
        assert_eq!(g.num_arcs(), 6);

        let added = g.add_arcs([(0, 2), (0, 1), (2, 4), (6, 0), (0, 2), (2, 1)]);
        assert_eq!(added, 3);
        assert_eq!(g.num_nodes(), 7);
        assert_eq!(g.num_arcs(), 9);
        assert_eq!(g.num_overlay_arcs(), 3);
        assert_eq!(g.base().num_arcs(), 6);

        assert_eq!(g.successors(0).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(g.successors(2).collect::<Vec<_>>(), vec![0, 1, 4]);
        assert_eq!(g.successors(5).collect::<Vec<_>>(), Vec::<usize>::new());
        assert_eq!(g.successors(6).collect::<Vec<_>>(), vec![0]);
        assert_eq!(g.outdegree(0), 3);
        assert_eq!(g.outdegree(6), 1);
        assert!(g.has_arc(6, 0));
        assert!(g.has_arc(0, 3));
        assert!(!g.has_arc(3, 0));

        // Out-of-order arcs on the same node keep the overlay sorted
        g.add_arcs([(4, 3)]);
        g.add_arcs([(4, 1)]);
        assert_eq!(g.successors(4).collect::<Vec<_>>(), vec![1, 3]);

        let (base, arcs) = g.into_parts();
        assert_eq!(base.num_nodes(), 5);
        assert_eq!(arcs, vec![(0, 2), (2, 1), (4, 1), (4, 3), (6, 0)]);
        Ok(())
    }
}
