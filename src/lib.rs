/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Incremental approximation of the neighborhood function of growing graphs.
//!
//! Computing the neighborhood function of a graph (for each node and each
//! radius *h*, the number of nodes reachable within *h* hops) with
//! [HyperBall](https://doi.org/10.1080/15427951.2013.798880) requires a full
//! sweep of counter propagation over all arcs for each radius. When a graph
//! keeps receiving new arcs, repeating such sweeps after each batch is too
//! expensive.
//!
//! [`Danf`](danf::Danf) keeps the estimates up to date instead: arcs are added
//! in batches, and the registers of the HyperLogLog counters of the nodes that
//! can reach the new arcs are patched by a [multi-source
//! breadth-first visit](visits::msbfs::MultiSourceBfs) on the transpose that
//! stops as soon as a counter does not change.
//!
//! To keep memory under control, only the nodes of a
//! [2-approximate vertex cover](cover::VertexCover) store the counters of all
//! radii; all other nodes store just the counter of the maximum radius, since
//! their counters at smaller radii can be rebuilt from their successors, which
//! are all in the cover.
//!
//! The building blocks are usable independently:
//!
//! * [`CounterStore`](counters::CounterStore) is a dynamic array of
//!   HyperLogLog counters sharing a packed, chunked bit vector;
//! * [`VertexCover`](cover::VertexCover) maintains a maximal matching under
//!   arc insertions and deletions;
//! * [`MultiSourceBfs`](visits::msbfs::MultiSourceBfs) advances up to 64
//!   breadth-first visits in lock-step per batch, merging
//!   [travelers](visits::msbfs::Traveler) at shared nodes.

#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]
#![allow(clippy::type_complexity)]

pub mod counters;
pub mod cover;
pub mod danf;
pub mod error;
pub mod graphs;
pub mod traits;
pub mod visits;

#[macro_use]
pub mod utils;

pub mod prelude {
    pub use crate::counters::*;
    pub use crate::cover::*;
    pub use crate::danf::*;
    pub use crate::error::*;
    pub use crate::graphs::prelude::*;
    pub use crate::traits::*;
    pub use crate::utils::*;
    pub use crate::visits::msbfs;
}
