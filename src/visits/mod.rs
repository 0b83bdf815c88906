/*
 * SPDX-FileCopyrightText: 2024 Matteo Dell'Acqua
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Visits on graphs.
//!
//! The only visit currently provided is a [multi-source breadth-first
//! visit](msbfs::MultiSourceBfs), which advances many independent visits in
//! lock-step, sharing the enumeration of successors among the visits that
//! reach the same node at the same distance.

pub mod msbfs;
