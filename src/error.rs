/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Errors returned by counters, covers, visits and estimators.

use thiserror::Error;

/// Error types that can occur while maintaining neighborhood estimates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DanfError {
    /// An argument is out of its admissible range (e.g., a shrinking resize
    /// request or an unsupported number of registers).
    ///
    /// No state has been modified when this error is returned.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The counter of a node at an intermediate level was requested, but the
    /// node is not in the vertex cover, so the counter was never stored.
    ///
    /// The value can be rebuilt from the counters at level `level - 1` of the
    /// successors of the node, which are all in the cover.
    #[error("Node {node} is not in the vertex cover: its counter at level {level} is not stored")]
    NotTracked { node: usize, level: usize },

    /// An internal protocol has been violated; this is a bug in the setup of
    /// a visit or in the maintenance of the cover, and it cannot be recovered.
    #[error("Contract violation: {0}")]
    ContractViolation(String),
}

pub type Result<T, E = DanfError> = std::result::Result<T, E>;
