/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::history::History;
use super::Danf;
use crate::cover::VertexCover;
use crate::error::{DanfError, Result};
use crate::traits::RandomAccessGraph;
use crate::visits::msbfs::*;
use anyhow::{bail, Context};
use itertools::Itertools;
use rayon::ThreadPool;
use std::sync::Mutex;

/// The sorted list of the nodes whose history is being recomputed that reach
/// the current node.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Origins(Vec<usize>);

impl Traveler for Origins {
    fn merge(&mut self, other: &Self) {
        self.0 = self
            .0
            .iter()
            .copied()
            .merge(other.0.iter().copied())
            .dedup()
            .collect();
    }
}

/// Adds each visited node to the counters of the origins reaching it, at all
/// levels not smaller than the distance.
struct Collect<'a> {
    history: Mutex<&'a mut History>,
    cover: &'a VertexCover,
    levels: usize,
}

impl Visitor for Collect<'_> {
    type Traveler = Origins;

    fn visit(&self, args: VisitArgs, _visit: &mut u64, traveler: &Origins) -> Result<()> {
        let mut history = self.history.lock().unwrap();
        for &origin in &traveler.0 {
            let full = self.cover.is_in_vertex_cover(origin);
            for level in args.depth.max(1)..=self.levels {
                if level == self.levels || full {
                    history.add_level(origin, level, args.node as u64)?;
                }
            }
        }
        Ok(())
    }
}

impl<G: RandomAccessGraph + Sync, T: RandomAccessGraph> Danf<G, T> {
    /// Recomputes from scratch the history of a node.
    ///
    /// The stored counters of the node are cleared and filled again by a
    /// breadth-first visit of depth *H* from the node. The result is the same
    /// as the one maintained incrementally, so this method can be used to
    /// validate or repair the history of a node.
    pub fn recalculate_history(
        &mut self,
        node: usize,
        thread_pool: &ThreadPool,
    ) -> anyhow::Result<()> {
        self.recalculate_histories([node], thread_pool)
            .with_context(|| format!("Could not recalculate the history of node {}", node))?;
        Ok(())
    }

    /// Recomputes from scratch the histories of a set of nodes.
    ///
    /// The visits from the nodes are performed in batches of
    /// [`BATCH_SIZE`] by a single [multi-source visit](MultiSourceBfs).
    pub fn recalculate_histories(
        &mut self,
        nodes: impl IntoIterator<Item = usize>,
        thread_pool: &ThreadPool,
    ) -> anyhow::Result<TraversalStats> {
        let nodes = nodes.into_iter().sorted().dedup().collect::<Vec<_>>();
        if let Some(&node) = nodes.last() {
            if node >= self.num_nodes() {
                bail!(DanfError::InvalidArgument(format!(
                    "node {} does not exist (the graph has {} nodes)",
                    node,
                    self.num_nodes()
                )));
            }
        }

        for &node in &nodes {
            self.history.clear_node(node);
        }

        let h = self.history();
        let visitor = Collect {
            history: Mutex::new(&mut self.history),
            cover: &self.cover,
            levels: h,
        };
        let stats = MultiSourceBfs::new(&self.graph)
            .max_depth(h)
            .run(
                nodes.iter().map(|&node| (node, Origins(vec![node]))),
                &visitor,
                thread_pool,
            )
            .with_context(|| "Could not visit the graph")?;

        log::debug!(
            "Recalculated the histories of {} nodes: {} visits",
            nodes.len(),
            stats.visits
        );
        Ok(stats)
    }
}
