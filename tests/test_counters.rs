/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use webgraph_danf::prelude::*;

#[test]
fn test_growth_preserves_counters() -> Result<()> {
    let config = HyperLogLogConfig::new(6, 5, DEFAULT_SEED)?;
    // Small chunks, so that growth crosses many chunk boundaries
    let mut store = CounterStore::with_chunk_bits(config, 20, 12);
    let mut rng = SmallRng::seed_from_u64(0);
    for k in 0..20 {
        for _ in 0..rng.random_range(0..100) {
            store.add(k, rng.random());
        }
    }
    let registers = (0..20).map(|k| store.registers(k)).collect::<Vec<_>>();
    let counts = (0..20).map(|k| store.count(k)).collect::<Vec<_>>();

    for n in [1, 7, 50, 0, 200] {
        let old_len = store.len();
        assert_eq!(store.add_counters(n), old_len);
        assert_eq!(store.len(), old_len + n);
        assert!(store.capacity() >= store.len());
        for k in 0..20 {
            assert_eq!(store.registers(k), registers[k]);
            assert_eq!(store.count(k), counts[k]);
        }
        for k in old_len..store.len() {
            assert!(store.is_empty_counter(k));
            assert_eq!(store.count(k), 0.0);
        }
    }
    Ok(())
}

#[test]
fn test_shrink_is_rejected() -> Result<()> {
    let config = HyperLogLogConfig::new(4, 6, DEFAULT_SEED)?;
    let mut store = CounterStore::new(config, 10);
    store.add(3, 42);
    let registers = store.registers(3);
    assert!(matches!(store.resize(5), Err(DanfError::InvalidArgument(_))));
    assert_eq!(store.len(), 10);
    assert_eq!(store.registers(3), registers);
    store.resize(15)?;
    assert_eq!(store.len(), 15);
    assert_eq!(store.registers(3), registers);
    Ok(())
}

#[test]
fn test_union_is_monotone() -> Result<()> {
    let config = HyperLogLogConfig::new(8, 5, DEFAULT_SEED)?;
    let mut rng = SmallRng::seed_from_u64(1);
    let mut a = CounterStore::new(config, 10);
    let mut b = CounterStore::new(config, 10);
    for k in 0..10 {
        for _ in 0..rng.random_range(0..100) {
            a.add(k, rng.random());
        }
        for _ in 0..rng.random_range(0..100) {
            b.add(k, rng.random());
        }
    }

    for k in 0..10 {
        let j = rng.random_range(0..10);
        let before = (0..10).map(|i| a.registers(i)).collect::<Vec<_>>();
        let count = a.count(k);
        let changed = a.union(k, &b, j)?;
        assert!(a.count(k) >= count);
        assert_eq!(changed, a.registers(k) != before[k]);
        for r in 0..config.num_registers() {
            assert_eq!(
                a.get_register(k, r),
                before[k][r].max(b.get_register(j, r))
            );
        }
        for i in (0..10).filter(|&i| i != k) {
            assert_eq!(a.registers(i), before[i]);
        }
        // Idempotence
        assert!(!a.union(k, &b, j)?);
    }
    Ok(())
}

#[test]
fn test_union_requires_same_config() -> Result<()> {
    let mut a = CounterStore::new(HyperLogLogConfig::new(6, 5, 0)?, 1);
    let mut b = CounterStore::new(HyperLogLogConfig::new(6, 5, 1)?, 1);
    b.add(0, 0);
    assert!(matches!(a.union(0, &b, 0), Err(DanfError::InvalidArgument(_))));
    assert!(a.is_empty_counter(0));
    Ok(())
}

#[test]
fn test_clear() -> Result<()> {
    let config = HyperLogLogConfig::new(5, 5, DEFAULT_SEED)?;
    let mut store = CounterStore::new(config, 3);
    for k in 0..3 {
        store.add(k, k as u64);
    }
    store.clear_counter(1);
    assert!(store.is_empty_counter(1));
    assert!(!store.is_empty_counter(2));
    store.clear();
    assert!((0..3).all(|k| store.is_empty_counter(k)));
    Ok(())
}

#[test]
fn test_accuracy() -> Result<()> {
    let config = HyperLogLogConfig::new(10, 5, DEFAULT_SEED)?;
    let mut store = CounterStore::new(config, 1);
    let mut added = 0;
    for n in [10_u64, 100, 1_000, 10_000, 100_000] {
        for x in added..n {
            store.add(0, x);
        }
        added = n;
        let error = (store.count(0) - n as f64).abs() / n as f64;
        assert!(error < 0.1, "{} elements, relative error {}", n, error);
    }
    Ok(())
}

#[test]
fn test_saturated_wide_registers() -> Result<()> {
    let config = HyperLogLogConfig::new(4, 8, DEFAULT_SEED)?;
    assert_eq!(config.max_register(), 255);
    let mut store = CounterStore::new(config, 2);
    store.set_registers(0, &[255; 16]);
    assert_eq!(store.get_register(0, 15), 255);
    let count = store.count(0);
    assert!(count.is_finite() && count > 0.0, "{}", count);
    assert!(store.union_within(1, 0));
    assert_eq!(store.count(1), count);
    Ok(())
}
