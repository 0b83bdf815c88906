/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{estimate, hash, register_and_value, HyperLogLogConfig};
use crate::error::{DanfError, Result};
use sux::bits::BitFieldVec;
use sux::traits::{BitFieldSlice, BitFieldSliceCore, BitFieldSliceMut};

/// The default base-2 logarithm of the maximum number of bits in a chunk.
pub const DEFAULT_LOG2_CHUNK_BITS: usize = 30;

/// The default growth factor of a [`CounterStore`].
pub const DEFAULT_GROWTH_FACTOR: f64 = 1.5;

/// A dynamic array of HyperLogLog counters.
///
/// All counters share a [configuration](HyperLogLogConfig), and their
/// registers are packed in [`BitFieldVec`]s of width
/// [`register_width`](HyperLogLogConfig::register_width), one per chunk, so
/// that no single allocation exceeds 2<sup>`log2_chunk_bits`</sup> bits
/// (plus one word). A counter never straddles two chunks.
///
/// New counters are added with [`add_counters`](CounterStore::add_counters).
/// When the capacity is exhausted, the store is reallocated with capacity
/// ⌈*c* · *g*⌉ + *n*, where *c* is the old capacity, *g* the growth factor
/// and *n* the number of requested counters. Full chunks are left untouched,
/// the last, partial chunk is extended with empty registers, and new chunks
/// are appended, so the registers of existing counters are preserved bit by
/// bit.
///
/// Mutation is not synchronized: concurrent writers must be serialized by the
/// caller, for example by wrapping the store in a
/// [`Mutex`](std::sync::Mutex).
#[derive(Debug, Clone)]
pub struct CounterStore {
    config: HyperLogLogConfig,
    /// The number of counters in use.
    len: usize,
    /// The number of counters that fit in the allocated chunks.
    capacity: usize,
    /// The number of counters in a full chunk.
    counters_per_chunk: usize,
    growth_factor: f64,
    /// The registers, `counters_per_chunk` counters per chunk.
    chunks: Vec<BitFieldVec<u64>>,
}

impl CounterStore {
    /// Creates a new store containing `len` empty counters.
    pub fn new(config: HyperLogLogConfig, len: usize) -> Self {
        Self::with_chunk_bits(config, len, DEFAULT_LOG2_CHUNK_BITS)
    }

    /// Creates a new store containing `len` empty counters whose chunks
    /// contain at most 2<sup>`log2_chunk_bits`</sup> bits, or a single
    /// counter if a counter is larger than that.
    pub fn with_chunk_bits(config: HyperLogLogConfig, len: usize, log2_chunk_bits: usize) -> Self {
        let chunk_bits = 1_u128 << log2_chunk_bits.min(64);
        let counters_per_chunk = (chunk_bits / config.counter_bits() as u128)
            .clamp(1, usize::MAX as u128) as usize;
        let mut store = Self {
            config,
            len,
            capacity: 0,
            counters_per_chunk,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            chunks: Vec::new(),
        };
        store.reallocate(len);
        store
    }

    /// Sets the growth factor used when the store is reallocated.
    ///
    /// The growth factor must be a finite number greater than or equal to
    /// one.
    pub fn with_growth_factor(mut self, growth_factor: f64) -> Result<Self> {
        if !growth_factor.is_finite() || growth_factor < 1.0 {
            return Err(DanfError::InvalidArgument(format!(
                "the growth factor must be at least 1, got {}",
                growth_factor
            )));
        }
        self.growth_factor = growth_factor;
        Ok(self)
    }

    /// Returns the configuration of the counters.
    #[inline(always)]
    pub fn config(&self) -> &HyperLogLogConfig {
        &self.config
    }

    /// Returns the number of counters.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the store contains no counters.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of counters that can be held without reallocating.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of chunks.
    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Returns the growth factor.
    pub fn growth_factor(&self) -> f64 {
        self.growth_factor
    }

    /// Extends the chunks so that they hold `new_capacity` counters.
    fn reallocate(&mut self, new_capacity: usize) {
        let m = self.config.num_registers();
        let width = self.config.register_width();
        let cpc = self.counters_per_chunk;
        let num_chunks = self.chunks.len();
        if let Some(last) = self.chunks.last_mut() {
            let counters = cpc.min(new_capacity - (num_chunks - 1) * cpc);
            if last.len() < counters * m {
                last.resize(counters * m, 0);
            }
        }
        while self.chunks.len() * cpc < new_capacity {
            let counters = cpc.min(new_capacity - self.chunks.len() * cpc);
            self.chunks.push(BitFieldVec::new(width, counters * m));
        }
        self.capacity = new_capacity;
    }

    /// Adds `n` empty counters to the store, and returns the index of the
    /// first new counter.
    ///
    /// If the capacity is insufficient, the store is reallocated, preserving
    /// the registers of the existing counters.
    pub fn add_counters(&mut self, n: usize) -> usize {
        let first = self.len;
        if self.len + n > self.capacity {
            let new_capacity = ((self.capacity as f64 * self.growth_factor).ceil() as usize)
                .max(self.capacity)
                + n;
            self.reallocate(new_capacity);
        }
        self.len += n;
        first
    }

    /// Sets the number of counters to `new_len`, which must not be smaller
    /// than the current number of counters.
    ///
    /// New counters are empty. In case of error, the store is not modified.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len < self.len {
            return Err(DanfError::InvalidArgument(format!(
                "cannot shrink a store of {} counters to {} counters",
                self.len, new_len
            )));
        }
        self.add_counters(new_len - self.len);
        Ok(())
    }

    /// Returns the chunk and the index in the chunk of the first register of
    /// a counter.
    #[inline(always)]
    fn locate(&self, k: usize) -> (usize, usize) {
        assert!(
            k < self.len,
            "Counter index {} out of bounds (the store has {} counters)",
            k,
            self.len
        );
        (
            k / self.counters_per_chunk,
            (k % self.counters_per_chunk) * self.config.num_registers(),
        )
    }

    /// Returns the value of register `j` of counter `k`.
    ///
    /// # Panics
    ///
    /// This method will panic if `k` is out of bounds.
    #[inline(always)]
    pub fn get_register(&self, k: usize, j: usize) -> u8 {
        debug_assert!(j < self.config.num_registers());
        let (chunk, offset) = self.locate(k);
        self.chunks[chunk].get(offset + j) as u8
    }

    /// Sets register `j` of counter `k` to `value`.
    ///
    /// # Panics
    ///
    /// This method will panic if `k` is out of bounds.
    #[inline(always)]
    pub fn set_register(&mut self, k: usize, j: usize, value: u8) {
        debug_assert!(j < self.config.num_registers());
        debug_assert!(value <= self.config.max_register());
        let (chunk, offset) = self.locate(k);
        self.chunks[chunk].set(offset + j, value as u64);
    }

    /// Returns an iterator over the registers of counter `k`.
    pub fn iter_registers(&self, k: usize) -> impl Iterator<Item = u8> + '_ {
        let (chunk, offset) = self.locate(k);
        self.chunks[chunk]
            .iter_from(offset)
            .take(self.config.num_registers())
            .map(|r| r as u8)
    }

    /// Returns a copy of the registers of counter `k`.
    pub fn registers(&self, k: usize) -> Box<[u8]> {
        self.iter_registers(k).collect()
    }

    /// Sets the registers of counter `k`.
    ///
    /// # Panics
    ///
    /// This method will panic if `k` is out of bounds or if `registers` does
    /// not contain exactly one value per register.
    pub fn set_registers(&mut self, k: usize, registers: &[u8]) {
        assert_eq!(registers.len(), self.config.num_registers());
        for (j, &r) in registers.iter().enumerate() {
            self.set_register(k, j, r);
        }
    }

    /// Adds an element to counter `k`, and returns whether the counter
    /// changed.
    pub fn add(&mut self, k: usize, value: u64) -> bool {
        let (j, r) = register_and_value(hash(value, self.config.seed()), &self.config);
        if r > self.get_register(k, j) {
            self.set_register(k, j, r);
            true
        } else {
            false
        }
    }

    /// Returns the estimate of the number of distinct elements added to
    /// counter `k`.
    pub fn count(&self, k: usize) -> f64 {
        estimate(self.iter_registers(k))
    }

    /// Returns whether all registers of counter `k` are zero.
    pub fn is_empty_counter(&self, k: usize) -> bool {
        self.iter_registers(k).all(|r| r == 0)
    }

    /// Merges the registers of `registers` into counter `k`, and returns
    /// whether the counter changed.
    pub fn union_registers(&mut self, k: usize, registers: &[u8]) -> bool {
        assert_eq!(registers.len(), self.config.num_registers());
        let mut changed = false;
        for (j, &r) in registers.iter().enumerate() {
            if r > self.get_register(k, j) {
                self.set_register(k, j, r);
                changed = true;
            }
        }
        changed
    }

    /// Merges counter `j` of `other` into counter `k` of this store, and
    /// returns whether counter `k` changed.
    ///
    /// After the call, each register of counter `k` is the maximum of its
    /// previous value and of the corresponding register of the other counter.
    /// No other counter is modified.
    ///
    /// The two stores must have the same configuration; otherwise, an
    /// [`InvalidArgument`](DanfError::InvalidArgument) error is returned and
    /// nothing is modified.
    pub fn union(&mut self, k: usize, other: &CounterStore, j: usize) -> Result<bool> {
        if self.config != other.config {
            return Err(DanfError::InvalidArgument(format!(
                "cannot merge counters with different configurations ({:?} and {:?})",
                self.config, other.config
            )));
        }
        let registers = other.registers(j);
        Ok(self.union_registers(k, &registers))
    }

    /// Merges counter `j` of this store into counter `k` of this store, and
    /// returns whether counter `k` changed.
    pub fn union_within(&mut self, k: usize, j: usize) -> bool {
        if k == j {
            return false;
        }
        let registers = self.registers(j);
        self.union_registers(k, &registers)
    }

    /// Copies counter `j` of `other` into counter `k` of this store.
    pub fn copy_from(&mut self, k: usize, other: &CounterStore, j: usize) -> Result<()> {
        if self.config != other.config {
            return Err(DanfError::InvalidArgument(format!(
                "cannot copy counters with different configurations ({:?} and {:?})",
                self.config, other.config
            )));
        }
        let registers = other.registers(j);
        self.set_registers(k, &registers);
        Ok(())
    }

    /// Sets all registers of counter `k` to zero.
    pub fn clear_counter(&mut self, k: usize) {
        for j in 0..self.config.num_registers() {
            self.set_register(k, j, 0);
        }
    }

    /// Sets all registers of all counters to zero.
    pub fn clear(&mut self) {
        for chunk in self.chunks.iter_mut() {
            chunk.reset();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_chunk_layout() {
        let config = HyperLogLogConfig::new(4, 5, 0).unwrap();
        // 80 bits per counter, 1024-bit chunks: 12 counters per chunk
        let mut store = CounterStore::with_chunk_bits(config, 30, 10);
        assert_eq!(store.counters_per_chunk, 12);
        assert_eq!(store.num_chunks(), 3);
        assert_eq!(store.chunks[2].len(), 6 * 16);
        assert_eq!(store.chunks[2].bit_width(), 5);
        for k in 0..store.len() {
            store.add(k, k as u64);
        }
        let before = (0..store.len())
            .map(|k| store.registers(k))
            .collect::<Vec<_>>();
        store.add_counters(1);
        assert_eq!(store.capacity(), 46);
        assert_eq!(store.num_chunks(), 4);
        // The partial chunk is extended, and a new chunk holds the rest
        assert_eq!(store.chunks[2].len(), 12 * 16);
        assert_eq!(store.chunks[3].len(), 10 * 16);
        for (k, regs) in before.iter().enumerate() {
            assert_eq!(&store.registers(k), regs);
        }
        assert!(store.is_empty_counter(30));
        assert_eq!(store.count(30), 0.0);
    }
}
