/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The user-facing vertex API.
//!
//! An algorithm is a [`VertexAlgorithm`]: a descriptor that fixes the
//! per-vertex state, the message type and the per-worker program, and
//! provides the callbacks the engine invokes. The engine is generic over the
//! descriptor and owns a plain vector of states, so there is no per-vertex
//! virtual dispatch on the hot path.
//!
//! Callbacks are synchronous and run to completion; asynchrony is expressed
//! by queuing I/O through the [`RunContext`] and returning. The continuation
//! is a later [`run_on_vertex`](VertexAlgorithm::run_on_vertex) invocation on
//! the same worker.

use crate::engine::context::RunContext;
use crate::graph::header::GraphHeader;
use crate::graph::index::GraphIndex;
use crate::graph::page_vertex::PageVertex;
use crate::graph::VertexId;

/// Per-vertex algorithm state.
///
/// The id is immutable and self-describing: the engine constructs one state
/// per vertex at creation and never moves it between partitions.
pub trait ComputeVertex {
    /// The id of the vertex this state belongs to.
    fn vertex_id(&self) -> VertexId;
}

/// A vertex-centric algorithm: the "vertex kind" the engine is generic over.
///
/// The engine calls [`run`](Self::run) on every vertex of the current
/// frontier, [`run_on_vertex`](Self::run_on_vertex) when a requested
/// adjacency arrives from disk, and [`run_on_message`](Self::run_on_message)
/// when a message is delivered. All three may request more I/O, emit
/// messages, and activate vertices for the next level through the context.
pub trait VertexAlgorithm: Send + Sync + 'static {
    /// Per-vertex state, owned by the worker that owns the partition.
    type State: ComputeVertex + Send + 'static;
    /// The fixed-size message payload.
    type Message: Copy + Send + 'static;
    /// Per-worker scratch that lives for the whole run, returned by
    /// [`vertex_programs`](crate::engine::GraphEngine::vertex_programs).
    type Program: Send + 'static;

    /// Creates the state of vertex `id`. Called once per vertex at engine
    /// creation; degrees are available from the index without I/O.
    fn init(&self, id: VertexId, index: &GraphIndex) -> Self::State;

    /// Creates one per-worker program at the beginning of a run.
    fn new_program(&self) -> Self::Program;

    /// Runs a vertex activated in the current level.
    fn run(&self, state: &mut Self::State, program: &mut Self::Program, ctx: &mut RunContext<Self::Message>);

    /// Delivers the adjacency view of `page` to the vertex that requested
    /// it. The view is valid only for the duration of this call.
    fn run_on_vertex(
        &self,
        state: &mut Self::State,
        program: &mut Self::Program,
        page: &PageVertex,
        ctx: &mut RunContext<Self::Message>,
    );

    /// Delivers a message. Messages sent at level L are delivered at level
    /// L + 1, before the level's activations are processed.
    fn run_on_message(
        &self,
        state: &mut Self::State,
        program: &mut Self::Program,
        sender: VertexId,
        message: &Self::Message,
        ctx: &mut RunContext<Self::Message>,
    );
}

/// Read-only engine facts passed to [`VertexQuery::run`].
pub struct QueryContext<'a> {
    index: &'a GraphIndex,
    header: &'a GraphHeader,
}

impl<'a> QueryContext<'a> {
    pub(crate) fn new(index: &'a GraphIndex, header: &'a GraphHeader) -> Self {
        Self { index, header }
    }

    /// The graph header.
    pub fn header(&self) -> &GraphHeader {
        self.header
    }

    /// Total degree of `id` (in plus out for directed graphs).
    pub fn degree(&self, id: VertexId) -> u32 {
        self.index.degree(id)
    }

    /// In-degree of `id`.
    pub fn num_in_edges(&self, id: VertexId) -> u32 {
        self.index.num_in_edges(id)
    }

    /// Out-degree of `id`.
    pub fn num_out_edges(&self, id: VertexId) -> u32 {
        self.index.num_out_edges(id)
    }
}

/// A parallel read-only query over all vertex states.
///
/// [`query_on_all`](crate::engine::GraphEngine::query_on_all) clones the
/// query once per partition, runs each clone over the partition's states,
/// and merges the clones pairwise back into the caller's query. Queries are
/// expected to start empty, so that merging is aggregation.
pub trait VertexQuery<V: VertexAlgorithm>: Clone + Send + Sync {
    /// Observes one vertex state.
    fn run(&mut self, ctx: &QueryContext, state: &V::State);

    /// Folds another clone of this query into `self`.
    fn merge(&mut self, other: Self);
}

/// Reorders the batch of vertex ids a worker is about to process.
///
/// Algorithms that care about processing order within a level (pivot
/// selection, priority vertices) register a scheduler on the engine; the
/// worker passes it every batch before draining it.
pub trait VertexScheduler: Send + Sync {
    /// Reorders `batch` in place.
    fn schedule(&self, level: usize, batch: &mut [VertexId]);
}
