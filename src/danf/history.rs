/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::counters::*;
use crate::cover::VertexCover;
use crate::error::{DanfError, Result};
use crate::traits::RandomAccessGraph;
use nonmax::NonMaxUsize;

/// Returns the registers of a counter containing just `node`.
pub(crate) fn singleton(config: &HyperLogLogConfig, node: usize) -> Box<[u8]> {
    let mut registers = vec![0; config.num_registers()].into_boxed_slice();
    let (j, r) = register_and_value(hash(node as u64, config.seed()), config);
    registers[j] = r;
    registers
}

/// Merges `other` into `registers`, and returns whether `registers` changed.
#[inline(always)]
pub(crate) fn max_into(registers: &mut [u8], other: impl IntoIterator<Item = u8>) -> bool {
    let mut changed = false;
    for (r, o) in registers.iter_mut().zip(other) {
        if o > *r {
            *r = o;
            changed = true;
        }
    }
    changed
}

/// The counters of all nodes at all levels.
///
/// Level *H* is stored for all nodes in `current`, indexed by node. Levels 1
/// to *H* − 1 are stored only for nodes of the vertex cover, in one store per
/// level indexed by a slot assigned to the node when it enters the cover.
/// Level 0 is the singleton containing the node and is never stored.
#[derive(Debug, Clone)]
pub(crate) struct History {
    config: HyperLogLogConfig,
    history: usize,
    levels: Vec<CounterStore>,
    current: CounterStore,
    slots: Vec<Option<NonMaxUsize>>,
    num_slots: usize,
}

impl History {
    /// Creates a history for `num_nodes` nodes with no slots, in which all
    /// counters at level *H* are singletons.
    pub(crate) fn new(
        config: HyperLogLogConfig,
        history: usize,
        num_nodes: usize,
        growth_factor: f64,
    ) -> Result<Self> {
        let levels = (1..history)
            .map(|_| CounterStore::new(config, 0).with_growth_factor(growth_factor))
            .collect::<Result<Vec<_>>>()?;
        let mut current = CounterStore::new(config, num_nodes).with_growth_factor(growth_factor)?;
        for node in 0..num_nodes {
            current.add(node, node as u64);
        }
        Ok(Self {
            config,
            history,
            levels,
            current,
            slots: vec![None; num_nodes],
            num_slots: 0,
        })
    }

    pub(crate) fn config(&self) -> &HyperLogLogConfig {
        &self.config
    }

    pub(crate) fn history(&self) -> usize {
        self.history
    }

    pub(crate) fn num_nodes(&self) -> usize {
        self.current.len()
    }

    pub(crate) fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub(crate) fn current(&self) -> &CounterStore {
        &self.current
    }

    pub(crate) fn replace_current(&mut self, current: CounterStore) {
        debug_assert_eq!(current.len(), self.current.len());
        self.current = current;
    }

    /// Adds nodes up to `num_nodes`; the counter of a new node at level *H*
    /// is its singleton.
    pub(crate) fn grow(&mut self, num_nodes: usize) {
        let len = self.current.len();
        if num_nodes <= len {
            return;
        }
        self.current.add_counters(num_nodes - len);
        for node in len..num_nodes {
            self.current.add(node, node as u64);
        }
        self.slots.resize(num_nodes, None);
    }

    pub(crate) fn slot(&self, node: usize) -> Option<usize> {
        self.slots[node].map(|slot| slot.get())
    }

    /// Assigns a slot to a node, if it does not have one yet, and returns it.
    ///
    /// The counters of a new slot are empty.
    pub(crate) fn allocate(&mut self, node: usize) -> usize {
        if let Some(slot) = self.slot(node) {
            return slot;
        }
        let slot = self.num_slots;
        for store in &mut self.levels {
            store.add_counters(1);
        }
        self.num_slots += 1;
        self.slots[node] = NonMaxUsize::new(slot);
        slot
    }

    /// Returns the store and the index of the counter of a node at a level,
    /// if it is stored.
    pub(crate) fn stored(&self, node: usize, level: usize) -> Option<(&CounterStore, usize)> {
        debug_assert!(level >= 1 && level <= self.history);
        if level == self.history {
            Some((&self.current, node))
        } else {
            self.slot(node).map(|slot| (&self.levels[level - 1], slot))
        }
    }

    fn stored_mut(&mut self, node: usize, level: usize) -> Result<(&mut CounterStore, usize)> {
        if level == self.history {
            Ok((&mut self.current, node))
        } else {
            match self.slot(node) {
                Some(slot) => Ok((&mut self.levels[level - 1], slot)),
                None => Err(DanfError::ContractViolation(format!(
                    "node {} has no slot for its counter at level {}",
                    node, level
                ))),
            }
        }
    }

    /// Merges registers into the counter of a node at a level, and returns
    /// whether the counter changed.
    pub(crate) fn union_level(&mut self, node: usize, level: usize, registers: &[u8]) -> Result<bool> {
        let (store, k) = self.stored_mut(node, level)?;
        Ok(store.union_registers(k, registers))
    }

    /// Adds an element to the counter of a node at a level.
    pub(crate) fn add_level(&mut self, node: usize, level: usize, value: u64) -> Result<bool> {
        let (store, k) = self.stored_mut(node, level)?;
        Ok(store.add(k, value))
    }

    /// Copies the counter of `node` in `store` to the counter of `node` at
    /// an intermediate level.
    pub(crate) fn snapshot(&mut self, node: usize, level: usize, store: &CounterStore) -> Result<()> {
        let (dst, k) = self.stored_mut(node, level)?;
        dst.copy_from(k, store, node)
    }

    /// Empties all stored counters of a node.
    pub(crate) fn clear_node(&mut self, node: usize) {
        self.current.clear_counter(node);
        if let Some(slot) = self.slot(node) {
            for store in &mut self.levels {
                store.clear_counter(slot);
            }
        }
    }

    /// Returns the registers of the counter of a node at a level between 0
    /// and *H*.
    ///
    /// Intermediate levels of nodes outside the cover are rebuilt from their
    /// successors, which must be in the cover.
    pub(crate) fn registers(
        &self,
        cover: &VertexCover,
        graph: &impl RandomAccessGraph,
        node: usize,
        level: usize,
    ) -> Result<Box<[u8]>> {
        if level == 0 {
            return Ok(singleton(&self.config, node));
        }
        if level == self.history || cover.is_in_vertex_cover(node) {
            return match self.stored(node, level) {
                Some((store, k)) => Ok(store.registers(k)),
                None => Err(DanfError::ContractViolation(format!(
                    "node {} is in the cover but has no slot",
                    node
                ))),
            };
        }
        self.reconstruct(cover, graph, node, level)
    }

    /// Rebuilds the counter of a node at an intermediate level as the union
    /// of its singleton with the counters of its successors at the previous
    /// level, regardless of whether the node is in the cover.
    pub(crate) fn reconstruct(
        &self,
        cover: &VertexCover,
        graph: &impl RandomAccessGraph,
        node: usize,
        level: usize,
    ) -> Result<Box<[u8]>> {
        debug_assert!(level >= 1 && level < self.history);
        let mut registers = singleton(&self.config, node);
        if node >= graph.num_nodes() {
            return Ok(registers);
        }
        for succ in graph.successors(node) {
            if level == 1 {
                max_into(&mut registers, singleton(&self.config, succ).iter().copied());
                continue;
            }
            if !cover.is_in_vertex_cover(succ) {
                return Err(DanfError::ContractViolation(format!(
                    "neither node {} nor its successor {} are in the cover",
                    node, succ
                )));
            }
            match self.stored(succ, level - 1) {
                Some((store, k)) => {
                    max_into(&mut registers, store.iter_registers(k));
                }
                None => {
                    return Err(DanfError::ContractViolation(format!(
                        "node {} is in the cover but has no slot",
                        succ
                    )))
                }
            }
        }
        Ok(registers)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graphs::vec_graph::VecGraph;

    #[test]
    fn test_singleton_matches_add() -> anyhow::Result<()> {
        let config = HyperLogLogConfig::new(6, 5, 17)?;
        let mut store = CounterStore::new(config, 1);
        store.add(0, 42);
        assert_eq!(store.registers(0), singleton(&config, 42));
        Ok(())
    }

    #[test]
    fn test_slots() -> anyhow::Result<()> {
        let config = HyperLogLogConfig::new(4, 5, 0)?;
        let mut history = History::new(config, 3, 4, 1.5)?;
        assert_eq!(history.allocate(2), 0);
        assert_eq!(history.allocate(0), 1);
        assert_eq!(history.allocate(2), 0);
        assert_eq!(history.num_slots(), 2);
        assert!(history.stored(1, 1).is_none());
        assert!(history.stored(1, 3).is_some());
        assert!(history.union_level(1, 2, &[1; 16]).is_err());
        assert!(history.union_level(0, 2, &[1; 16])?);
        history.clear_node(0);
        assert!(history.current().is_empty_counter(0));
        Ok(())
    }

    #[test]
    fn test_reconstruct() -> anyhow::Result<()> {
        let config = HyperLogLogConfig::new(8, 5, 0)?;
        // 0 -> 1 -> 2, with nodes 0 and 1 in the cover
        let graph = VecGraph::from_arcs([(0, 1), (1, 2)]);
        let mut cover = VertexCover::new(3);
        cover.insert_edge(0, 1);
        let mut history = History::new(config, 3, 3, 1.5)?;
        let slot = history.allocate(1);
        let mut ball = singleton(&config, 1);
        max_into(&mut ball, singleton(&config, 2).iter().copied());
        history.levels[0].set_registers(slot, &ball);

        let mut expected = ball.clone();
        max_into(&mut expected, singleton(&config, 0).iter().copied());
        assert_eq!(history.reconstruct(&cover, &graph, 0, 2)?, expected);
        assert_eq!(history.registers(&cover, &graph, 2, 0)?, singleton(&config, 2));
        // Node 2 has no successors
        assert_eq!(history.reconstruct(&cover, &graph, 2, 2)?, singleton(&config, 2));
        Ok(())
    }
}
