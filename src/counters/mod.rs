/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! HyperLogLog counters.
//!
//! A HyperLogLog counter is formed by *m* = 2<sup>`log2m`</sup> registers of
//! fixed width. Adding an element hashes it to 64 bits: the first `log2m` bits
//! select a register, and the number of leading zeros of the remaining bits,
//! plus one, is the rank of the element. A register holds the maximum rank of
//! the elements hashed to it, so registers can only increase, and the union of
//! two counters is their registerwise maximum.
//!
//! The configuration of the counters is an explicit value,
//! [`HyperLogLogConfig`], and hashing, ranking and estimation are free
//! functions of this module. Counters are stored in a
//! [`CounterStore`], which packs the registers of many counters in a chunked
//! bit vector.

mod store;
pub use store::*;

use crate::error::{DanfError, Result};

/// The seed used by [`HyperLogLogConfig::for_upper_bound`].
pub const DEFAULT_SEED: u64 = 0x5851_F42D_4C95_7F2D;

/// The minimum base-2 logarithm of the number of registers.
pub const MIN_LOG2M: usize = 4;

/// The maximum base-2 logarithm of the number of registers.
pub const MAX_LOG2M: usize = 16;

/// The maximum width of a register in bits.
pub const MAX_REGISTER_WIDTH: usize = 8;

/// The configuration shared by a family of HyperLogLog counters.
///
/// Counters can be merged only if they have the same configuration: in
/// particular, they must use the same seed, or the same element would be
/// hashed to different registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HyperLogLogConfig {
    log2m: usize,
    register_width: usize,
    seed: u64,
}

impl HyperLogLogConfig {
    /// Creates a new configuration.
    ///
    /// # Arguments
    ///
    /// * `log2m`: the base-2 logarithm of the number of registers per counter;
    ///   it must be between [`MIN_LOG2M`] and [`MAX_LOG2M`].
    ///
    /// * `register_width`: the width in bits of a register; it must be
    ///   positive and at most [`MAX_REGISTER_WIDTH`].
    ///
    /// * `seed`: the seed of the hash function.
    pub fn new(log2m: usize, register_width: usize, seed: u64) -> Result<Self> {
        if !(MIN_LOG2M..=MAX_LOG2M).contains(&log2m) {
            return Err(DanfError::InvalidArgument(format!(
                "the base-2 logarithm of the number of registers must be between {} and {}, got {}",
                MIN_LOG2M, MAX_LOG2M, log2m
            )));
        }
        if register_width == 0 || register_width > MAX_REGISTER_WIDTH {
            return Err(DanfError::InvalidArgument(format!(
                "the register width must be between 1 and {}, got {}",
                MAX_REGISTER_WIDTH, register_width
            )));
        }
        Ok(Self {
            log2m,
            register_width,
            seed,
        })
    }

    /// Creates a configuration for counters that will hold at most `n`
    /// elements, using [`DEFAULT_SEED`].
    ///
    /// The register width is derived from `n` using
    /// [`register_width_for`].
    pub fn for_upper_bound(n: u64, log2m: usize) -> Result<Self> {
        Self::new(log2m, register_width_for(n), DEFAULT_SEED)
    }

    /// Returns a copy of this configuration with a different seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns the base-2 logarithm of the number of registers.
    #[inline(always)]
    pub fn log2m(&self) -> usize {
        self.log2m
    }

    /// Returns the number of registers per counter.
    #[inline(always)]
    pub fn num_registers(&self) -> usize {
        1 << self.log2m
    }

    /// Returns the width in bits of a register.
    #[inline(always)]
    pub fn register_width(&self) -> usize {
        self.register_width
    }

    /// Returns the seed of the hash function.
    #[inline(always)]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the maximum value a register can hold.
    #[inline(always)]
    pub fn max_register(&self) -> u8 {
        ((1_u16 << self.register_width) - 1) as u8
    }

    /// Returns the number of bits used by a counter.
    #[inline(always)]
    pub fn counter_bits(&self) -> usize {
        self.register_width << self.log2m
    }

    /// Returns the relative standard deviation of the estimates.
    pub fn rel_std(&self) -> f64 {
        1.106 / (self.num_registers() as f64).sqrt()
    }
}

impl core::fmt::Display for HyperLogLogConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "HyperLogLog with {} registers of {} bits (relative standard deviation {:.2}%)",
            self.num_registers(),
            self.register_width,
            100.0 * self.rel_std()
        )
    }
}

/// Returns the register width needed by counters holding at most `n`
/// elements.
///
/// The width is the base-2 logarithm of the base-2 logarithm of `n`, rounded
/// up, but never smaller than five bits.
pub fn register_width_for(n: u64) -> usize {
    let log_log = (n.max(2) as f64).log2().log2().ceil() as usize;
    log_log.clamp(5, MAX_REGISTER_WIDTH)
}

/// Mixes a value with a seed, returning 64 well-distributed bits.
///
/// This is the finalizer of SplitMix64 applied to the value offset by a
/// multiple of the seed.
#[inline(always)]
pub fn hash(value: u64, seed: u64) -> u64 {
    let mut x = value
        .wrapping_add(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Returns the register index and the register value associated with a hash.
///
/// The first `log2m` bits of the hash select the register; the value is the
/// number of leading zeros of the remaining bits plus one, saturated at the
/// maximum value of a register.
#[inline(always)]
pub fn register_and_value(hash: u64, config: &HyperLogLogConfig) -> (usize, u8) {
    let log2m = config.log2m();
    let register = (hash >> (64 - log2m)) as usize;
    let rest = hash << log2m;
    let rank = (rest.leading_zeros() as usize).min(64 - log2m) + 1;
    (register, rank.min(config.max_register() as usize) as u8)
}

/// Returns the bias-correction constant α<sub>*m*</sub>.
pub fn alpha(num_registers: usize) -> f64 {
    match num_registers {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        m => 0.7213 / (1.0 + 1.079 / m as f64),
    }
}

/// Estimates the cardinality of a counter given its registers.
///
/// This is the harmonic mean of 2<sup>*r*</sup> over the registers, times
/// α<sub>*m*</sub>*m*<sup>2</sup>; if the estimate is below 5*m*/2 and some
/// registers are zero, linear counting is used instead.
pub fn estimate(registers: impl IntoIterator<Item = u8>) -> f64 {
    let mut num_registers = 0_usize;
    let mut zeros = 0_usize;
    let mut sum = 0.0;
    for r in registers {
        num_registers += 1;
        if r == 0 {
            zeros += 1;
        }
        sum += (-(r as f64)).exp2();
    }
    if num_registers == 0 {
        return 0.0;
    }
    let m = num_registers as f64;
    let raw = alpha(num_registers) * m * m / sum;
    if raw <= 2.5 * m && zeros != 0 {
        m * (m / zeros as f64).ln()
    } else {
        raw
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(HyperLogLogConfig::new(3, 5, 0).is_err());
        assert!(HyperLogLogConfig::new(17, 5, 0).is_err());
        assert!(HyperLogLogConfig::new(8, 0, 0).is_err());
        assert!(HyperLogLogConfig::new(8, 9, 0).is_err());
        let config = HyperLogLogConfig::new(8, 5, 0).unwrap();
        assert_eq!(config.num_registers(), 256);
        assert_eq!(config.max_register(), 31);
        assert_eq!(config.counter_bits(), 256 * 5);
    }

    #[test]
    fn test_register_width() {
        assert_eq!(register_width_for(0), 5);
        assert_eq!(register_width_for(1000), 5);
        assert_eq!(register_width_for(1 << 32), 5);
        assert_eq!(register_width_for((1 << 32) + 1), 6);
        assert_eq!(register_width_for(u64::MAX), 6);
    }

    #[test]
    fn test_register_and_value() {
        let config = HyperLogLogConfig::new(4, 5, 0).unwrap();
        // Top four bits select register 0b1010, then one leading zero
        let (reg, value) = register_and_value(0b1010_0100 << 56, &config);
        assert_eq!(reg, 0b1010);
        assert_eq!(value, 2);
        // All-zero remainder saturates at the register width
        let (reg, value) = register_and_value(0xF << 60, &config);
        assert_eq!(reg, 0xF);
        assert_eq!(value, 31);
    }

    #[test]
    fn test_hash_depends_on_seed() {
        assert_ne!(hash(42, 0), hash(42, 1));
        assert_ne!(hash(42, 0), hash(43, 0));
        assert_eq!(hash(42, 7), hash(42, 7));
    }

    #[test]
    fn test_estimate_small() {
        assert_eq!(estimate([0_u8; 64]), 0.0);
        let mut regs = [0_u8; 1024];
        regs[3] = 1;
        regs[700] = 2;
        let e = estimate(regs);
        assert!((e - 2.0).abs() < 0.01, "{}", e);
    }

    #[test]
    fn test_estimate_wide_registers() {
        // Ranks of 64 and more only occur with 8-bit registers
        for r in [63_u8, 64, 200, 255] {
            let e = estimate([r; 16]);
            assert!(e.is_finite() && e > 0.0, "{} {}", r, e);
        }
        assert!(estimate([255_u8; 16]) > estimate([64_u8; 16]));
    }
}
