/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The context threaded into every vertex callback.
//!
//! Vertex code never holds a reference back to the engine: everything a
//! callback may do (request adjacency, send messages, activate vertices)
//! goes through an explicit `&mut RunContext` built by the worker for the
//! duration of the call.

use super::dispatcher::{SubmitQueue, VertexRequest};
use super::frontier::Frontier;
use super::message::{Envelope, Outboxes};
use super::store::Partitioner;
use crate::graph::index::GraphIndex;
use crate::graph::{EdgeKind, VertexId};

/// Capabilities available to vertex callbacks.
///
/// `M` is the algorithm's message type.
pub struct RunContext<'a, M: Copy> {
    vertex: VertexId,
    level: usize,
    worker: usize,
    partitioner: &'a Partitioner,
    index: &'a GraphIndex,
    queue: &'a mut SubmitQueue,
    outboxes: &'a mut Outboxes<M>,
    frontier: &'a mut Frontier,
}

impl<'a, M: Copy> RunContext<'a, M> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        vertex: VertexId,
        level: usize,
        worker: usize,
        partitioner: &'a Partitioner,
        index: &'a GraphIndex,
        queue: &'a mut SubmitQueue,
        outboxes: &'a mut Outboxes<M>,
        frontier: &'a mut Frontier,
    ) -> Self {
        Self {
            vertex,
            level,
            worker,
            partitioner,
            index,
            queue,
            outboxes,
            frontier,
        }
    }

    /// The vertex the current callback runs on behalf of.
    pub fn vertex_id(&self) -> VertexId {
        self.vertex
    }

    /// The current level (bulk-synchronous super-step), starting at 0.
    pub fn level(&self) -> usize {
        self.level
    }

    /// The id of the worker executing the callback.
    pub fn worker_id(&self) -> usize {
        self.worker
    }

    /// Number of vertices in the graph.
    pub fn num_vertices(&self) -> u32 {
        self.partitioner.num_vertices()
    }

    /// Whether the graph is directed.
    pub fn is_directed(&self) -> bool {
        self.index.is_directed()
    }

    /// Total degree of `id`, answered from the index without I/O.
    pub fn degree(&self, id: VertexId) -> u32 {
        self.index.degree(id)
    }

    /// In-degree of `id`, answered from the index without I/O.
    pub fn num_in_edges(&self, id: VertexId) -> u32 {
        self.index.num_in_edges(id)
    }

    /// Out-degree of `id`, answered from the index without I/O.
    pub fn num_out_edges(&self, id: VertexId) -> u32 {
        self.index.num_out_edges(id)
    }

    /// Requests the full adjacency of each id. The views arrive through
    /// [`run_on_vertex`](crate::traits::VertexAlgorithm::run_on_vertex)
    /// callbacks on the requesting vertex, in submission order.
    ///
    /// # Panics
    ///
    /// Panics if an id is out of range.
    pub fn request_vertices(&mut self, ids: &[VertexId]) {
        for &target in ids {
            assert!(
                target < self.partitioner.num_vertices(),
                "requested vertex {target} out of range"
            );
            self.queue.push(VertexRequest {
                issuer: self.vertex,
                target,
                kind: EdgeKind::Both,
            });
        }
    }

    /// Requests one side of the adjacency of each vertex, avoiding the read
    /// of the other side's record.
    ///
    /// # Panics
    ///
    /// Panics if an id is out of range.
    pub fn request_partial_vertices(&mut self, requests: &[(VertexId, EdgeKind)]) {
        for &(target, kind) in requests {
            assert!(
                target < self.partitioner.num_vertices(),
                "requested vertex {target} out of range"
            );
            self.queue.push(VertexRequest {
                issuer: self.vertex,
                target,
                kind,
            });
        }
    }

    /// Sends `message` to `dest`, delivered at the next level. With
    /// `activate` set, delivery also schedules `dest` for that level.
    ///
    /// # Panics
    ///
    /// Panics if `dest` is out of range.
    pub fn send(&mut self, dest: VertexId, message: M, activate: bool) {
        assert!(
            dest < self.partitioner.num_vertices(),
            "message destination {dest} out of range"
        );
        let dest_worker = self.partitioner.owner_worker(dest);
        self.outboxes.send(
            dest_worker,
            Envelope {
                sender: self.vertex,
                dest,
                activate,
                payload: Some(message),
            },
        );
    }

    /// Sends one message to every destination produced by `neighbors`,
    /// partitioning by destination worker in a single scan.
    ///
    /// The iterator typically borrows a
    /// [`PageVertex`](crate::graph::page_vertex::PageVertex) view, so the
    /// expansion happens entirely within the current callback.
    pub fn multicast(
        &mut self,
        neighbors: impl IntoIterator<Item = VertexId>,
        message: M,
        activate: bool,
    ) {
        for dest in neighbors {
            self.send(dest, message, activate);
        }
    }

    /// Activates `dest` in the next level without carrying a payload.
    ///
    /// Local destinations are marked directly in the owner's next-level
    /// frontier; remote ones travel as payload-free envelopes.
    ///
    /// # Panics
    ///
    /// Panics if `dest` is out of range.
    pub fn activate_next(&mut self, dest: VertexId) {
        assert!(
            dest < self.partitioner.num_vertices(),
            "activation target {dest} out of range"
        );
        let dest_worker = self.partitioner.owner_worker(dest);
        if dest_worker == self.worker {
            self.frontier.activate_next(dest);
        } else {
            self.outboxes.send(
                dest_worker,
                Envelope {
                    sender: self.vertex,
                    dest,
                    activate: true,
                    payload: None,
                },
            );
        }
    }
}
