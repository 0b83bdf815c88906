/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Graph implementations.

pub mod delta_graph;
pub mod vec_graph;

pub mod prelude {
    pub use super::delta_graph::DeltaGraph;
    pub use super::vec_graph::VecGraph;
}
