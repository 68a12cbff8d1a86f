/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod io;
pub mod traits;

pub mod prelude {
    //! Everything an algorithm needs to be written against the vertex API.
    pub use crate::config::GraphConfig;
    pub use crate::engine::context::RunContext;
    pub use crate::engine::GraphEngine;
    pub use crate::error::{EngineError, RunOutcome};
    pub use crate::graph::build::GraphBuilder;
    pub use crate::graph::header::GraphHeader;
    pub use crate::graph::index::{GraphIndex, IndexLayout};
    pub use crate::graph::page_vertex::{EdgeData, PageVertex};
    pub use crate::graph::{EdgeKind, VertexId, INVALID_VERTEX_ID};
    pub use crate::traits::{
        ComputeVertex, QueryContext, VertexAlgorithm, VertexQuery, VertexScheduler,
    };
}
