/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Dynamic approximation of the neighborhood function.
//!
//! For a node *x* and a radius *i*, the *ball* of radius *i* around *x* is
//! the set of nodes reachable from *x* in at most *i* steps; the ball of
//! radius 0 is {*x*}. A [`Danf`] keeps, for each node, HyperLogLog counters
//! approximating the balls of radius 1 to *H*, the *history* of the node, and
//! keeps them up to date while arcs are added to the graph.
//!
//! Only the nodes of a [2-approximate vertex cover](crate::cover::VertexCover)
//! store the counters of all radii. All other nodes store only the counter of
//! radius *H*: since each of their successors is in the cover, a ball of
//! radius *i* < *H* around them is the union of their singleton with the balls
//! of radius *i* − 1 around their successors (see
//! [`count_reconstructed`](Danf::count_reconstructed)).
//!
//! When arcs are added with [`add_edges`](Danf::add_edges), the balls of the
//! target of each new arc are sent backwards along the transpose using a
//! [multi-source visit](crate::visits::msbfs::MultiSourceBfs), and each node
//! that can reach the source of a new arc within *H* − 1 steps merges them,
//! shifted by its distance, into its counters. The visit stops at nodes of the
//! cover whose counters do not change.
//!
//! # Examples
//!
//! ```
//! use dsi_progress_logger::no_logging;
//! use webgraph_danf::prelude::*;
//! use webgraph_danf::thread_pool;
//!
//! # fn main() -> anyhow::Result<()> {
//! let thread_pool = thread_pool![];
//! let mut danf = DanfBuilder::from_graph(VecGraph::from_arcs([(0, 1), (1, 2)]))
//!     .history(3)
//!     .build(&thread_pool, no_logging![])?;
//!
//! danf.add_edges([(2, 3)], &thread_pool, no_logging![])?;
//!
//! // Node 0 now reaches 1, 2 and 3
//! assert!((danf.count(0, 3)? - 4.0).abs() < 0.1);
//! # Ok(())
//! # }
//! ```

mod builder;
pub use builder::*;

mod history;
mod recalc;
mod update;

use crate::counters::{estimate, HyperLogLogConfig};
use crate::cover::VertexCover;
use crate::error::{DanfError, Result};
use crate::graphs::delta_graph::DeltaGraph;
use crate::traits::RandomAccessGraph;
use history::History;

/// Dynamic approximation of the neighborhood function of a growing graph.
///
/// Instances are created by a [`DanfBuilder`], which seeds the counters by
/// the classical iterative propagation on the initial graph. The graph and
/// its transpose are kept as [`DeltaGraph`]s: the initial graphs are never
/// modified, and new arcs are added to their overlays.
pub struct Danf<G: RandomAccessGraph, T: RandomAccessGraph = G> {
    graph: DeltaGraph<G>,
    transpose: DeltaGraph<T>,
    cover: VertexCover,
    history: History,
}

impl<G: RandomAccessGraph, T: RandomAccessGraph> Danf<G, T> {
    /// Returns the current graph.
    pub fn graph(&self) -> &DeltaGraph<G> {
        &self.graph
    }

    /// Returns the transpose of the current graph.
    pub fn transpose(&self) -> &DeltaGraph<T> {
        &self.transpose
    }

    /// Returns the vertex cover deciding which nodes store their full history.
    pub fn cover(&self) -> &VertexCover {
        &self.cover
    }

    /// Returns the configuration of the counters.
    pub fn config(&self) -> &HyperLogLogConfig {
        self.history.config()
    }

    /// Returns the maximum radius *H*.
    pub fn history(&self) -> usize {
        self.history.history()
    }

    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.history.num_nodes()
    }

    fn check_args(
        &self,
        node: usize,
        levels: core::ops::RangeInclusive<usize>,
        level: usize,
    ) -> Result<()> {
        if node >= self.num_nodes() {
            return Err(DanfError::InvalidArgument(format!(
                "node {} does not exist (the graph has {} nodes)",
                node,
                self.num_nodes()
            )));
        }
        if !levels.contains(&level) {
            return Err(DanfError::InvalidArgument(format!(
                "level {} is not between {} and {}",
                level,
                levels.start(),
                levels.end()
            )));
        }
        Ok(())
    }

    /// Returns the registers of the counter of a node at a level between 1
    /// and *H*.
    ///
    /// # Errors
    ///
    /// [`NotTracked`](DanfError::NotTracked) if `level` is smaller than *H*
    /// and `node` is not in the cover; [`InvalidArgument`](DanfError::InvalidArgument)
    /// if the node or the level are out of range.
    pub fn registers(&self, node: usize, level: usize) -> Result<Box<[u8]>> {
        self.check_args(node, 1..=self.history(), level)?;
        match self.history.stored(node, level) {
            Some((store, k)) => Ok(store.registers(k)),
            None => Err(DanfError::NotTracked { node, level }),
        }
    }

    /// Returns the estimated size of the ball of radius `level` around
    /// `node`, for `level` between 1 and *H*.
    ///
    /// Every node can be queried at level *H*, but only nodes in the cover
    /// can be queried at smaller levels.
    ///
    /// # Errors
    ///
    /// [`NotTracked`](DanfError::NotTracked) if `level` is smaller than *H*
    /// and `node` is not in the cover; the value can be obtained from
    /// [`count_reconstructed`](Self::count_reconstructed).
    /// [`InvalidArgument`](DanfError::InvalidArgument) if the node or the
    /// level are out of range.
    pub fn count(&self, node: usize, level: usize) -> Result<f64> {
        self.check_args(node, 1..=self.history(), level)?;
        match self.history.stored(node, level) {
            Some((store, k)) => Ok(store.count(k)),
            None => Err(DanfError::NotTracked { node, level }),
        }
    }

    /// Returns the estimated sizes of the balls of radius 1 to *H* around a
    /// node in the cover.
    pub fn counts(&self, node: usize) -> Result<Vec<f64>> {
        (1..=self.history())
            .map(|level| self.count(node, level))
            .collect()
    }

    /// Returns the estimated size of the ball of radius `level` around
    /// `node`, for `level` between 0 and *H*, rebuilding it from the
    /// successors of the node if the node is not in the cover.
    pub fn count_reconstructed(&self, node: usize, level: usize) -> Result<f64> {
        self.check_args(node, 0..=self.history(), level)?;
        Ok(estimate(
            self.history
                .registers(&self.cover, &self.graph, node, level)?
                .iter()
                .copied(),
        ))
    }

    /// Returns, for each node, the estimated number of nodes reachable in at
    /// most *H* steps.
    pub fn reachable_nodes(&self) -> Vec<f64> {
        let current = self.history.current();
        (0..self.num_nodes()).map(|node| current.count(node)).collect()
    }

    /// Returns the estimated neighborhood function up to radius *H*.
    ///
    /// The element of index *i* is the sum over all nodes of the estimated
    /// size of their ball of radius *i*; in particular, the first element is
    /// the number of nodes.
    pub fn neighborhood_function(&self) -> Result<Vec<f64>> {
        let num_nodes = self.num_nodes();
        let mut nf = vec![num_nodes as f64];
        for level in 1..=self.history() {
            let mut sum = 0.0;
            for node in 0..num_nodes {
                sum += self.count_reconstructed(node, level)?;
            }
            nf.push(sum);
        }
        Ok(nf)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphs::vec_graph::VecGraph;
    use crate::thread_pool;
    use dsi_progress_logger::no_logging;

    #[test]
    fn test_path() -> anyhow::Result<()> {
        // 0 -> 1 -> 2 -> 3: all nodes are in the cover
        let graph = VecGraph::from_arcs([(0, 1), (1, 2), (2, 3)]);
        let danf = DanfBuilder::from_graph(graph)
            .history(3)
            .build(&thread_pool![2], no_logging![])?;
        assert_eq!(danf.cover().cover_size(), 4);
        for (node, expected) in [(0, [2.0, 3.0, 4.0]), (1, [2.0, 3.0, 3.0]), (3, [1.0, 1.0, 1.0])] {
            for (count, expected) in danf.counts(node)?.into_iter().zip(expected) {
                assert!((count - expected).abs() < 0.1, "{} {}", count, expected);
            }
        }
        Ok(())
    }

    #[test]
    fn test_not_tracked() -> anyhow::Result<()> {
        // A star: the leaves other than 1 are not in the cover
        let graph = VecGraph::from_arcs([(0, 1), (0, 2), (0, 3)]);
        let danf = DanfBuilder::from_graph(graph)
            .history(2)
            .build(&thread_pool![1], no_logging![])?;
        assert!(danf.cover().is_in_vertex_cover(0));
        assert!(!danf.cover().is_in_vertex_cover(2));
        assert_eq!(
            danf.count(2, 1),
            Err(DanfError::NotTracked { node: 2, level: 1 })
        );
        assert!((danf.count(2, 2)? - 1.0).abs() < 0.1);
        assert!((danf.count_reconstructed(2, 1)? - 1.0).abs() < 0.1);
        assert!((danf.count_reconstructed(0, 0)? - 1.0).abs() < 0.1);
        assert!(matches!(
            danf.count(4, 2),
            Err(DanfError::InvalidArgument(_))
        ));
        assert!(matches!(
            danf.count(0, 3),
            Err(DanfError::InvalidArgument(_))
        ));
        let nf = danf.neighborhood_function()?;
        assert_eq!(nf.len(), 3);
        assert_eq!(nf[0], 4.0);
        assert!((nf[1] - 7.0).abs() < 0.2);
        assert!((nf[2] - 7.0).abs() < 0.2);
        Ok(())
    }
}
