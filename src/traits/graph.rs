/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Basic traits to access and grow graphs.

The estimators of this crate do not depend on a specific graph
representation: they just need to know the number of nodes, to enumerate
the successors of a node, and, when the graph is growing, to add arcs.

Nodes are identified by consecutive integers starting from zero. Successors
must be returned in increasing order and without duplicates; implementations
are expected to enumerate them lazily, and the enumeration can be restarted
by calling [`successors`](RandomAccessGraph::successors) again.

*/

/// A graph providing random access to the successors of its nodes.
pub trait RandomAccessGraph {
    /// The type of the iterator over the successors of a node.
    type Successors<'succ>: IntoIterator<Item = usize>
    where
        Self: 'succ;

    /// Returns the number of nodes in the graph.
    fn num_nodes(&self) -> usize;

    /// Returns the number of arcs in the graph.
    fn num_arcs(&self) -> u64;

    /// Returns the number of successors of a node.
    fn outdegree(&self, node: usize) -> usize;

    /// Returns the successors of a node in increasing order.
    fn successors(&self, node: usize) -> Self::Successors<'_>;

    /// Returns whether the given arc is in the graph.
    fn has_arc(&self, src: usize, dst: usize) -> bool {
        for succ in self.successors(src) {
            if succ == dst {
                return true;
            }
            if succ > dst {
                return false;
            }
        }
        false
    }
}

/// A [`RandomAccessGraph`] that can receive new arcs.
pub trait MutableGraph: RandomAccessGraph {
    /// Adds arcs to the graph, growing the set of nodes as needed so that
    /// all endpoints are valid nodes.
    ///
    /// Arcs already present are ignored. Returns the number of arcs actually
    /// added.
    fn add_arcs(&mut self, arcs: impl IntoIterator<Item = (usize, usize)>) -> usize;

    /// Ensures that the graph has at least `num_nodes` nodes, adding isolated
    /// nodes if necessary.
    fn add_nodes(&mut self, num_nodes: usize);
}

impl<G: RandomAccessGraph> RandomAccessGraph for &G {
    type Successors<'succ>
        = G::Successors<'succ>
    where
        Self: 'succ;

    #[inline(always)]
    fn num_nodes(&self) -> usize {
        (**self).num_nodes()
    }

    #[inline(always)]
    fn num_arcs(&self) -> u64 {
        (**self).num_arcs()
    }

    #[inline(always)]
    fn outdegree(&self, node: usize) -> usize {
        (**self).outdegree(node)
    }

    #[inline(always)]
    fn successors(&self, node: usize) -> Self::Successors<'_> {
        (**self).successors(node)
    }
}
