/*
 * SPDX-FileCopyrightText: 2024 Matteo Dell'Acqua
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Multi-source breadth-first visits.
//!
//! A [`MultiSourceBfs`] performs many independent breadth-first visits, one
//! per source, in lock-step. Sources are divided in batches of [`BATCH_SIZE`]
//! sources, so that the set of sources of a batch that reached a node can be
//! represented by the bits of a `u64`. Batches are independent and are
//! processed in parallel; within a batch, all visits reach distance *d* before
//! any of them proceeds to distance *d* + 1.
//!
//! Each source carries a [`Traveler`], a value that is propagated along the
//! visit: when a node is discovered at distance *d* + 1, it inherits the
//! travelers of all nodes at distance *d* that discovered it, combined using
//! [`Traveler::merge`]. Since nodes at the same distance are expanded in no
//! particular order, merging must be commutative and associative.
//!
//! For each node and distance at which the node is discovered, the
//! [`Visitor::visit`] method is called once, with the mask of the sources
//! discovering the node at that distance, the mask of all sources that have
//! discovered the node so far, and the merged traveler. The visitor can clear
//! bits of the first mask: the visits of the corresponding sources will not
//! proceed through the node.
//!
//! Note that a traveler inherited by a node might contain contributions of
//! sources that have already discovered the node at a smaller distance: the
//! masks, not the travelers, tell exactly which sources discovered the node at
//! the current distance.

use crate::error::{DanfError, Result};
use crate::traits::RandomAccessGraph;
use rayon::{prelude::*, ThreadPool};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// The number of sources in a batch.
pub const BATCH_SIZE: usize = u64::BITS as usize;

/// A value carried by the visit of a source.
pub trait Traveler: Clone + Send + Sync {
    /// Merges another traveler into this one.
    ///
    /// The operation must be commutative and associative, as travelers
    /// reaching a node at the same distance are merged in an unspecified
    /// order.
    fn merge(&mut self, other: &Self);
}

/// Arguments passed to [`Visitor::visit`].
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct VisitArgs {
    /// The current node.
    pub node: usize,
    /// The distance of the current node from the sources of the visit mask.
    pub depth: usize,
    /// The sources of the batch that have discovered the node so far,
    /// including those of the visit mask.
    pub seen: u64,
    /// The index of the batch.
    pub batch: usize,
}

/// The callbacks of a [`MultiSourceBfs`].
///
/// Visitors are shared by all threads, so they must be [`Sync`] and state
/// modified by [`visit`](Visitor::visit) must be protected by suitable
/// synchronization primitives, as the same node can be visited at the same
/// time by different batches.
pub trait Visitor: Sync {
    /// The type of the travelers.
    type Traveler: Traveler;

    /// Visits a node discovered at a given distance by the sources in
    /// `visit`.
    ///
    /// Bits cleared in `visit` stop the visit of the corresponding sources at
    /// this node. Setting bits is a contract violation.
    fn visit(&self, args: VisitArgs, visit: &mut u64, traveler: &Self::Traveler) -> Result<()>;
}

/// Statistics about a multi-source visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// The number of batches.
    pub batches: usize,
    /// The number of calls to [`Visitor::visit`].
    pub visits: u64,
    /// The number of calls to [`Traveler::merge`].
    pub merges: u64,
    /// The largest distance at which a node was visited.
    pub max_depth: usize,
}

impl core::ops::Add for TraversalStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            batches: self.batches + rhs.batches,
            visits: self.visits + rhs.visits,
            merges: self.merges + rhs.merges,
            max_depth: self.max_depth.max(rhs.max_depth),
        }
    }
}

/// Multi-source breadth-first visits.
///
/// # Examples
///
/// Let us compute, for two sources, the set of sources that reach each node at
/// each distance:
///
/// ```
/// use webgraph_danf::error::Result;
/// use webgraph_danf::graphs::vec_graph::VecGraph;
/// use webgraph_danf::thread_pool;
/// use webgraph_danf::visits::msbfs::*;
/// use std::sync::Mutex;
///
/// #[derive(Clone)]
/// struct Origins(Vec<usize>);
///
/// impl Traveler for Origins {
///     fn merge(&mut self, other: &Self) {
///         self.0.extend_from_slice(&other.0);
///         self.0.sort();
///         self.0.dedup();
///     }
/// }
///
/// struct Record(Mutex<Vec<(usize, usize, Vec<usize>)>>);
///
/// impl Visitor for Record {
///     type Traveler = Origins;
///     fn visit(&self, args: VisitArgs, _visit: &mut u64, t: &Origins) -> Result<()> {
///         self.0.lock().unwrap().push((args.node, args.depth, t.0.clone()));
///         Ok(())
///     }
/// }
///
/// let graph = VecGraph::from_arcs([(0, 2), (1, 2), (2, 3)]);
/// let visitor = Record(Mutex::new(vec![]));
/// let stats = MultiSourceBfs::new(&graph)
///     .run([(0, Origins(vec![0])), (1, Origins(vec![1]))], &visitor, &thread_pool![])
///     .unwrap();
///
/// let mut record = visitor.0.into_inner().unwrap();
/// record.sort();
/// assert_eq!(record, vec![
///     (0, 0, vec![0]),
///     (1, 0, vec![1]),
///     (2, 1, vec![0, 1]),
///     (3, 2, vec![0, 1]),
/// ]);
/// assert_eq!(stats.merges, 1);
/// ```
pub struct MultiSourceBfs<G: RandomAccessGraph> {
    graph: G,
    max_depth: usize,
}

impl<G: RandomAccessGraph> MultiSourceBfs<G> {
    /// Creates a multi-source visit with no bound on the distance.
    pub fn new(graph: G) -> Self {
        Self {
            graph,
            max_depth: usize::MAX,
        }
    }

    /// Sets the maximum distance at which nodes are visited.
    ///
    /// With a maximum distance of zero, only the sources are visited.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the graph being visited.
    pub fn graph(&self) -> &G {
        &self.graph
    }
}

impl<G: RandomAccessGraph + Sync> MultiSourceBfs<G> {
    /// Visits the graph from the given sources, each carrying a traveler.
    ///
    /// Sources are grouped in batches of [`BATCH_SIZE`] in the order in which
    /// they are given, and batches are visited in parallel using the given
    /// thread pool; the call returns when all batches are complete. A
    /// source may appear more than once, in which case its travelers are
    /// merged.
    ///
    /// If a source is not a node of the graph, a
    /// [`ContractViolation`](DanfError::ContractViolation) is returned and
    /// nothing is visited. Errors returned by the visitor stop the visit of
    /// the batch, and the first such error is returned.
    pub fn run<V: Visitor>(
        &self,
        sources: impl IntoIterator<Item = (usize, V::Traveler)>,
        visitor: &V,
        thread_pool: &ThreadPool,
    ) -> Result<TraversalStats> {
        let sources = sources.into_iter().collect::<Vec<_>>();
        let num_nodes = self.graph.num_nodes();
        if let Some(&(node, _)) = sources.iter().find(|(node, _)| *node >= num_nodes) {
            return Err(DanfError::ContractViolation(format!(
                "source {} is not a node of the graph ({} nodes)",
                node, num_nodes
            )));
        }

        let stats = thread_pool.install(|| {
            sources
                .par_chunks(BATCH_SIZE)
                .enumerate()
                .map(|(batch, sources)| self.run_batch(batch, sources, visitor))
                .collect::<Result<Vec<_>>>()
        })?;

        let stats = stats.into_iter().fold(TraversalStats::default(), |a, b| a + b);
        log::debug!(
            "Multi-source visit from {} sources: {} batches, {} visits, {} merges, maximum depth {}",
            sources.len(),
            stats.batches,
            stats.visits,
            stats.merges,
            stats.max_depth
        );
        Ok(stats)
    }

    /// Visits the graph from a batch of at most [`BATCH_SIZE`] sources.
    fn run_batch<V: Visitor>(
        &self,
        batch: usize,
        sources: &[(usize, V::Traveler)],
        visitor: &V,
    ) -> Result<TraversalStats> {
        debug_assert!(sources.len() <= BATCH_SIZE);
        let mut stats = TraversalStats {
            batches: 1,
            ..Default::default()
        };
        // For each discovered node, the sources that discovered it
        let mut seen: HashMap<usize, u64> = HashMap::new();

        let mut next: HashMap<usize, (u64, V::Traveler)> = HashMap::new();
        for (i, (node, traveler)) in sources.iter().enumerate() {
            match next.entry(*node) {
                Entry::Vacant(e) => {
                    e.insert((1 << i, traveler.clone()));
                }
                Entry::Occupied(mut e) => {
                    let (visit, t) = e.get_mut();
                    *visit |= 1 << i;
                    t.merge(traveler);
                    stats.merges += 1;
                }
            }
        }

        let mut depth = 0;
        loop {
            let mut frontier = next.drain().collect::<Vec<_>>();
            frontier.sort_unstable_by_key(|(node, _)| *node);

            for (node, (visit, traveler)) in frontier.iter_mut() {
                let seen = seen.entry(*node).or_insert(0);
                *seen |= *visit;
                let before = *visit;
                visitor.visit(
                    VisitArgs {
                        node: *node,
                        depth,
                        seen: *seen,
                        batch,
                    },
                    visit,
                    traveler,
                )?;
                stats.visits += 1;
                if *visit & !before != 0 {
                    return Err(DanfError::ContractViolation(format!(
                        "the visitor set bits {:#x} of the visit mask of node {} at depth {}",
                        *visit & !before,
                        node,
                        depth
                    )));
                }
            }
            stats.max_depth = depth;

            if depth == self.max_depth {
                break;
            }

            for (node, (visit, traveler)) in frontier.iter() {
                if *visit == 0 {
                    continue;
                }
                for succ in self.graph.successors(*node) {
                    let new = *visit & !seen.get(&succ).copied().unwrap_or(0);
                    if new == 0 {
                        continue;
                    }
                    match next.entry(succ) {
                        Entry::Vacant(e) => {
                            e.insert((new, traveler.clone()));
                        }
                        Entry::Occupied(mut e) => {
                            let (visit, t) = e.get_mut();
                            *visit |= new;
                            t.merge(traveler);
                            stats.merges += 1;
                        }
                    }
                }
            }

            if next.is_empty() {
                break;
            }
            depth += 1;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphs::vec_graph::VecGraph;
    use std::sync::Mutex;

    #[derive(Clone)]
    struct Unit;

    impl Traveler for Unit {
        fn merge(&mut self, _other: &Self) {}
    }

    struct Pruner;

    impl Visitor for Pruner {
        type Traveler = Unit;

        fn visit(&self, args: VisitArgs, visit: &mut u64, _: &Unit) -> Result<()> {
            // Source 1 stops at node 1
            if args.node == 1 {
                *visit &= !0b10;
            }
            Ok(())
        }
    }

    struct Rogue;

    impl Visitor for Rogue {
        type Traveler = Unit;

        fn visit(&self, _args: VisitArgs, visit: &mut u64, _: &Unit) -> Result<()> {
            *visit |= 1 << 63;
            Ok(())
        }
    }

    struct Distances(Mutex<Vec<(usize, usize, u64)>>);

    impl Visitor for Distances {
        type Traveler = Unit;

        fn visit(&self, args: VisitArgs, visit: &mut u64, _: &Unit) -> Result<()> {
            self.0.lock().unwrap().push((args.node, args.depth, *visit));
            Pruner.visit(args, visit, &Unit)
        }
    }

    #[test]
    fn test_per_source_pruning() -> anyhow::Result<()> {
        let graph = VecGraph::from_arcs([(0, 1), (1, 2), (2, 3)]);
        let visitor = Distances(Mutex::new(vec![]));
        MultiSourceBfs::new(&graph).run([(0, Unit), (1, Unit)], &visitor, &crate::thread_pool![1])?;
        let mut record = visitor.0.into_inner().unwrap();
        record.sort();
        // Source 0 proceeds through node 1, source 1 does not
        assert_eq!(
            record,
            vec![(0, 0, 0b01), (1, 0, 0b10), (1, 1, 0b01), (2, 2, 0b01), (3, 3, 0b01)]
        );
        Ok(())
    }

    #[test]
    fn test_rogue_visitor() {
        let graph = VecGraph::from_arcs([(0, 1)]);
        let result = MultiSourceBfs::new(&graph).run([(0, Unit)], &Rogue, &crate::thread_pool![1]);
        assert!(matches!(result, Err(DanfError::ContractViolation(_))));
    }

    #[test]
    fn test_source_out_of_range() {
        let graph = VecGraph::from_arcs([(0, 1)]);
        let result = MultiSourceBfs::new(&graph).run([(2, Unit)], &Pruner, &crate::thread_pool![1]);
        assert!(matches!(result, Err(DanfError::ContractViolation(_))));
    }

    #[test]
    fn test_max_depth() -> anyhow::Result<()> {
        let graph = VecGraph::from_arcs([(0, 1), (1, 2), (2, 3)]);
        let stats =
            MultiSourceBfs::new(&graph)
                .max_depth(1)
                .run([(0, Unit)], &Pruner, &crate::thread_pool![1])?;
        assert_eq!(stats.visits, 2);
        assert_eq!(stats.max_depth, 1);
        Ok(())
    }
}
