/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Vertex-centric graph algorithms for the [`semgraph`] engine.
//!
//! Everything here is ordinary user code against the vertex API: each
//! algorithm is a [`VertexAlgorithm`](semgraph::traits::VertexAlgorithm)
//! descriptor plus a driver function that creates the engine, runs it to a
//! fixpoint and extracts the result.

pub mod bfs;
pub mod diameter;
pub mod kcore;
pub mod pagerank;
pub mod sccs;
pub mod triangles;
pub mod wcc;

pub mod prelude {
    pub use crate::bfs::{bfs, Bfs, UNVISITED};
    pub use crate::diameter::estimate_diameter;
    pub use crate::kcore::{kcore, KCore};
    pub use crate::pagerank::{pagerank, PageRank};
    pub use crate::sccs::{sccs, Scc};
    pub use crate::triangles::{count_triangles, Triangles};
    pub use crate::wcc::{wcc, Wcc};
}
