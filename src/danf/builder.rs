/*
 * SPDX-FileCopyrightText: 2024 Matteo Dell'Acqua
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::history::{max_into, History};
use super::Danf;
use crate::counters::*;
use crate::cover::VertexCover;
use crate::error::DanfError;
use crate::graphs::delta_graph::DeltaGraph;
use crate::graphs::vec_graph::VecGraph;
use crate::traits::RandomAccessGraph;
use crate::utils::Granularity;
use anyhow::{bail, ensure, Context, Result};
use dsi_progress_logger::ProgressLog;
use rayon::{prelude::*, ThreadPool};

/// A builder for [`Danf`].
///
/// After creating a builder with [`DanfBuilder::new`] (or
/// [`DanfBuilder::from_graph`]) you can configure it using setters such as
/// [`history`](DanfBuilder::history) and [`log2m`](DanfBuilder::log2m), then
/// call [`DanfBuilder::build`] on it to create a [`Danf`] instance.
pub struct DanfBuilder<G: RandomAccessGraph, T: RandomAccessGraph = G> {
    /// A graph.
    graph: G,
    /// The transpose of `graph`.
    transpose: T,
    /// The maximum radius *H*.
    history: usize,
    /// The base-2 logarithm of the number of registers per counter.
    log2m: usize,
    /// The seed of the hash function.
    seed: u64,
    /// An upper bound on the size of the balls, if known.
    upper_bound: Option<u64>,
    /// The granularity of the parallel seeding phase.
    granularity: Granularity,
    /// The growth factor of the counter stores.
    growth_factor: f64,
}

impl DanfBuilder<VecGraph, VecGraph> {
    /// Creates a new builder with default parameters for a [`VecGraph`],
    /// computing its transpose.
    pub fn from_graph(graph: VecGraph) -> Self {
        let transpose = graph.transpose();
        Self::new(graph, transpose)
    }
}

impl<G: RandomAccessGraph, T: RandomAccessGraph> DanfBuilder<G, T> {
    /// The default maximum radius.
    pub const DEFAULT_HISTORY: usize = 4;
    /// The default base-2 logarithm of the number of registers per counter.
    pub const DEFAULT_LOG2M: usize = 10;

    /// Creates a new builder with default parameters.
    ///
    /// # Arguments
    /// * `graph`: the initial graph.
    /// * `transpose`: the transpose of `graph`.
    pub fn new(graph: G, transpose: T) -> Self {
        Self {
            graph,
            transpose,
            history: Self::DEFAULT_HISTORY,
            log2m: Self::DEFAULT_LOG2M,
            seed: DEFAULT_SEED,
            upper_bound: None,
            granularity: Granularity::default(),
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }

    /// Sets the maximum radius *H*, which must be positive.
    pub fn history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    /// Sets the base-2 logarithm of the number of registers per counter.
    pub fn log2m(mut self, log2m: usize) -> Self {
        self.log2m = log2m;
        self
    }

    /// Sets the seed of the hash function.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets an upper bound on the number of nodes the graph will ever have,
    /// which determines the width of the registers.
    ///
    /// By default, the number of nodes of the initial graph is used.
    pub fn upper_bound(mut self, upper_bound: u64) -> Self {
        self.upper_bound = Some(upper_bound);
        self
    }

    /// Sets the granularity used in the parallel seeding phase.
    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Sets the growth factor of the counter stores.
    pub fn growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }
}

impl<G: RandomAccessGraph + Sync, T: RandomAccessGraph> DanfBuilder<G, T> {
    /// Builds a [`Danf`] instance, seeding the counters by iterative
    /// propagation on the initial graph.
    ///
    /// # Arguments
    ///
    /// * `thread_pool`: The thread pool to use for parallel computation.
    ///
    /// * `pl`: A progress logger.
    pub fn build(
        self,
        thread_pool: &ThreadPool,
        pl: &mut impl ProgressLog,
    ) -> Result<Danf<G, T>> {
        let num_nodes = self.graph.num_nodes();
        let num_arcs = self.graph.num_arcs();
        let history = self.history;

        if history == 0 {
            bail!(DanfError::InvalidArgument(
                "the maximum radius must be positive".to_string()
            ));
        }
        ensure!(
            self.transpose.num_nodes() == num_nodes,
            "the transpose should have the same number of nodes of the graph ({}). Got {}.",
            num_nodes,
            self.transpose.num_nodes()
        );
        ensure!(
            self.transpose.num_arcs() == num_arcs,
            "the transpose should have the same number of arcs of the graph ({}). Got {}.",
            num_arcs,
            self.transpose.num_arcs()
        );

        let upper_bound = self.upper_bound.unwrap_or(num_nodes as u64);
        let config = HyperLogLogConfig::new(self.log2m, register_width_for(upper_bound), self.seed)
            .with_context(|| "Could not build the configuration of the counters")?;
        pl.info(format_args!("Using {}", config));

        let cover = VertexCover::from_graph(&self.graph);
        pl.info(format_args!(
            "Vertex cover of {} nodes out of {} (maximal matching of {} edges)",
            cover.cover_size(),
            num_nodes,
            cover.matching_size()
        ));

        let mut hist = History::new(config, history, num_nodes, self.growth_factor)
            .with_context(|| "Could not allocate the counters")?;
        for node in cover.iter() {
            hist.allocate(node);
        }

        // Level 0: singletons
        let mut prev = CounterStore::new(config, num_nodes);
        for node in 0..num_nodes {
            prev.add(node, node as u64);
        }
        let mut next = CounterStore::new(config, num_nodes);

        let granularity = self.granularity.node_granularity(num_nodes, num_arcs);
        let window = granularity * thread_pool.current_num_threads().max(1);

        pl.item_name("level");
        pl.expected_updates(Some(history));
        pl.start(format!(
            "Seeding {} levels of counters on {} nodes and {} arcs",
            history, num_nodes, num_arcs
        ));

        for level in 1..=history {
            let mut modified = 0_usize;
            for start in (0..num_nodes).step_by(window) {
                let end = (start + window).min(num_nodes);
                let graph = &self.graph;
                let prev = &prev;
                let results: Vec<(Box<[u8]>, bool)> = thread_pool.install(|| {
                    (start..end)
                        .into_par_iter()
                        .with_min_len(granularity)
                        .map(|node| {
                            let mut registers = prev.registers(node);
                            let mut changed = false;
                            for succ in graph.successors(node) {
                                changed |= max_into(&mut registers, prev.iter_registers(succ));
                            }
                            (registers, changed)
                        })
                        .collect()
                });
                for (node, (registers, changed)) in (start..end).zip(results) {
                    next.set_registers(node, &registers);
                    modified += changed as usize;
                }
            }

            if level < history {
                for node in cover.iter() {
                    hist.snapshot(node, level, &next)
                        .with_context(|| format!("Could not store level {} of node {}", level, node))?;
                }
            }

            std::mem::swap(&mut prev, &mut next);
            log::debug!("Level {}: {} counters modified", level, modified);
            pl.update();
        }

        hist.replace_current(prev.with_growth_factor(self.growth_factor)?);
        pl.done();

        log::info!(
            "Seeded {} levels for {} nodes ({} nodes with full history)",
            history,
            num_nodes,
            hist.num_slots()
        );

        Ok(Danf {
            graph: DeltaGraph::new(self.graph),
            transpose: DeltaGraph::new(self.transpose),
            cover,
            history: hist,
        })
    }
}
