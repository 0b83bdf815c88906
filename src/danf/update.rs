/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::history::History;
use super::Danf;
use crate::counters::CounterStore;
use crate::cover::VertexCover;
use crate::error::Result;
use crate::traits::{MutableGraph, RandomAccessGraph};
use crate::visits::msbfs::*;
use anyhow::Context;
use dsi_progress_logger::ProgressLog;
use itertools::Itertools;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// The balls of radius 0 to *H* − 1 around the target of a new arc, as they
/// were before the arc was added.
///
/// Merging is registerwise maximum, level by level.
#[derive(Debug, Clone)]
struct Balls(CounterStore);

impl Traveler for Balls {
    fn merge(&mut self, other: &Self) {
        for k in 0..self.0.len() {
            let registers = other.0.registers(k);
            self.0.union_registers(k, &registers);
        }
    }
}

/// Merges the balls carried by a visit on the transpose into the counters of
/// the nodes reaching the sources.
///
/// A node at distance *d* from the source of a new arc (*u*, *v*) merges the
/// ball of radius *j* − *d* − 1 around *v* into its counter of level *j*, for
/// *j* between *d* + 1 and *H*. Nodes outside the cover update just level
/// *H*, as their other levels are not stored.
struct Propagate<'a> {
    history: Mutex<&'a mut History>,
    cover: &'a VertexCover,
    levels: usize,
    pruned: AtomicU64,
}

impl Visitor for Propagate<'_> {
    type Traveler = Balls;

    fn visit(&self, args: VisitArgs, visit: &mut u64, traveler: &Balls) -> Result<()> {
        let h = self.levels;
        let d = args.depth;
        debug_assert!(d < h);
        let mut history = self.history.lock().unwrap();

        let mut changed = history.union_level(args.node, h, &traveler.0.registers(h - d - 1))?;
        if self.cover.is_in_vertex_cover(args.node) {
            for level in d + 1..h {
                changed |=
                    history.union_level(args.node, level, &traveler.0.registers(level - d - 1))?;
            }
            // Nodes outside the cover never stop the visit, as their
            // intermediate levels depend on the levels of their successors
            if !changed {
                *visit = 0;
                self.pruned.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl<G: RandomAccessGraph + Sync, T: RandomAccessGraph + Sync> Danf<G, T> {
    /// Adds arcs to the graph and updates the counters of all nodes.
    ///
    /// Arcs already in the graph are ignored; nodes are added as needed so
    /// that all endpoints are valid nodes, and the history of a new node is
    /// its singleton at all levels. After the call, each counter is the same
    /// that would be obtained by building a new instance on the current
    /// graph.
    ///
    /// The update proceeds as follows:
    ///
    /// 1. for each new arc (*u*, *v*), the counters of *v* at levels 0 to
    ///    *H* − 1 are collected;
    /// 2. the arcs are inserted in the vertex cover, and the intermediate
    ///    levels of nodes entering the cover are rebuilt from their
    ///    successors;
    /// 3. the arcs are added to the graph and to its transpose;
    /// 4. a multi-source visit of the transpose starting from the sources of
    ///    the new arcs, up to distance *H* − 1, merges the collected counters
    ///    into the counters of the nodes reaching the sources, stopping at
    ///    nodes of the cover whose counters do not change.
    ///
    /// # Arguments
    ///
    /// * `arcs`: the arcs to add.
    ///
    /// * `thread_pool`: The thread pool to use for parallel computation.
    ///
    /// * `pl`: A progress logger.
    pub fn add_edges(
        &mut self,
        arcs: impl IntoIterator<Item = (usize, usize)>,
        thread_pool: &ThreadPool,
        pl: &mut impl ProgressLog,
    ) -> anyhow::Result<TraversalStats> {
        let arcs = arcs
            .into_iter()
            .sorted()
            .dedup()
            .filter(|&(u, v)| !self.graph.has_arc(u, v))
            .collect::<Vec<_>>();
        if arcs.is_empty() {
            pl.info(format_args!("No new arcs to add"));
            return Ok(TraversalStats::default());
        }

        let h = self.history();
        let config = *self.config();
        let old_num_nodes = self.num_nodes();
        let num_nodes = arcs
            .iter()
            .map(|&(u, v)| u.max(v) + 1)
            .max()
            .unwrap_or(0)
            .max(old_num_nodes);
        self.history.grow(num_nodes);
        self.cover.grow(num_nodes);

        pl.item_name("arc");
        pl.expected_updates(Some(arcs.len()));
        pl.start(format!("Collecting the balls of the targets of {} arcs", arcs.len()));

        let mut sources = Vec::with_capacity(arcs.len());
        for &(u, v) in &arcs {
            let mut balls = CounterStore::new(config, h);
            for k in 0..h {
                let registers = self
                    .history
                    .registers(&self.cover, &self.graph, v, k)
                    .with_context(|| format!("Could not collect level {} of node {}", k, v))?;
                balls.set_registers(k, &registers);
            }
            sources.push((u, Balls(balls)));
            pl.light_update();
        }
        pl.done();

        let mut entering = Vec::new();
        for &(u, v) in &arcs {
            if self.cover.insert_edge(u, v) {
                entering.push(u);
                if u != v {
                    entering.push(v);
                }
            }
        }

        // Successors of nodes entering the cover are already in the cover, so
        // the rebuilt levels do not depend on each other
        let mut rebuilt = Vec::with_capacity(entering.len());
        for &node in &entering {
            let levels = (1..h)
                .map(|level| self.history.reconstruct(&self.cover, &self.graph, node, level))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Could not rebuild the history of node {}", node))?;
            rebuilt.push((node, levels));
        }
        for (node, levels) in rebuilt {
            self.history.allocate(node);
            for (level, registers) in (1..h).zip(levels) {
                self.history.union_level(node, level, &registers)?;
            }
        }

        self.graph.add_arcs(arcs.iter().copied());
        self.graph.add_nodes(num_nodes);
        self.transpose.add_arcs(arcs.iter().map(|&(u, v)| (v, u)));
        self.transpose.add_nodes(num_nodes);

        let visitor = Propagate {
            history: Mutex::new(&mut self.history),
            cover: &self.cover,
            levels: h,
            pruned: AtomicU64::new(0),
        };
        let stats = MultiSourceBfs::new(&self.transpose)
            .max_depth(h - 1)
            .run(sources, &visitor, thread_pool)
            .with_context(|| "Could not propagate the new arcs")?;

        log::info!(
            "Added {} arcs and {} nodes; {} nodes entered the cover; {} visits, {} merges, {} visits pruned",
            arcs.len(),
            num_nodes - old_num_nodes,
            entering.len(),
            stats.visits,
            stats.merges,
            visitor.pruned.load(Ordering::Relaxed)
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::counters::HyperLogLogConfig;

    #[test]
    fn test_balls_merge() -> anyhow::Result<()> {
        let config = HyperLogLogConfig::new(4, 5, 0)?;
        let mut a = CounterStore::new(config, 2);
        let mut b = CounterStore::new(config, 2);
        a.set_register(0, 3, 2);
        b.set_register(0, 3, 1);
        b.set_register(1, 5, 4);
        let mut a = Balls(a);
        a.merge(&Balls(b));
        assert_eq!(a.0.get_register(0, 3), 2);
        assert_eq!(a.0.get_register(1, 5), 4);
        assert_eq!(a.0.get_register(1, 3), 0);
        Ok(())
    }
}
