/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The per-worker I/O dispatcher.
//!
//! Vertex code queues adjacency requests through the
//! [`RunContext`](crate::engine::context::RunContext); the dispatcher rounds
//! extents to page boundaries, coalesces requests whose extents are
//! consecutive in the file into a single read, submits up to the in-flight
//! ceiling, and on completion demultiplexes each read into per-vertex
//! [`PageVertex`] views handed to the issuing vertex's callback. Buffers are
//! recycled through a local pool.

use crate::config::PAGE_SIZE;
use crate::error::EngineError;
use crate::graph::index::{GraphIndex, VertexExtent};
use crate::graph::page_vertex::PageVertex;
use crate::graph::{EdgeKind, VertexId};
use crate::io::{BlockIo, Completion, Cookie};
use std::collections::{HashMap, VecDeque};

use super::trace::TraceLogger;

/// Upper bound on the number of logical requests folded into one read.
const MAX_COALESCED_PARTS: usize = 64;
/// Upper bound on the size of one coalesced read.
const MAX_READ_BYTES: u64 = 256 * 1024;

/// One logical adjacency request issued by vertex code.
#[derive(Debug, Clone, Copy)]
pub struct VertexRequest {
    /// The vertex whose callback receives the view.
    pub issuer: VertexId,
    /// The vertex whose adjacency is read.
    pub target: VertexId,
    /// Which side of `target`'s adjacency to read.
    pub kind: EdgeKind,
}

/// Requests waiting for an in-flight slot.
///
/// Kept outside the dispatcher so vertex callbacks can push new requests
/// while the dispatcher demultiplexes a completion.
#[derive(Default)]
pub struct SubmitQueue {
    queued: VecDeque<VertexRequest>,
}

impl SubmitQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, request: VertexRequest) {
        self.queued.push_back(request);
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// True if no request is queued.
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.queued.clear();
    }
}

/// One demultiplexed slice of a pending read.
struct PendingPart {
    issuer: VertexId,
    target: VertexId,
    kind: EdgeKind,
    /// Offset of the record data within the read buffer.
    rel: usize,
    /// Size of the first record (the only one for undirected or
    /// single-sided requests).
    first_size: u32,
    /// Size of the adjacent out-record for a directed
    /// [`EdgeKind::Both`] request, 0 otherwise.
    second_size: u32,
}

struct PendingRead {
    parts: Vec<PendingPart>,
}

/// Counters accumulated over a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct IoStats {
    /// Physical reads submitted.
    pub reads: u64,
    /// Bytes covered by submitted reads (after page rounding).
    pub bytes: u64,
    /// Logical requests served, including coalesced ones.
    pub requests: u64,
}

/// The per-worker dispatcher over one substrate handle.
pub struct IoDispatcher {
    io: Box<dyn BlockIo>,
    pending: HashMap<Cookie, PendingRead>,
    next_cookie: Cookie,
    max_in_flight: usize,
    buffer_pool: Vec<Vec<u8>>,
    completions: Vec<Completion>,
    directed: bool,
    edge_data_size: u32,
    stats: IoStats,
}

impl IoDispatcher {
    /// Creates a dispatcher with the given in-flight ceiling.
    pub fn new(
        io: Box<dyn BlockIo>,
        max_in_flight: usize,
        directed: bool,
        edge_data_size: u32,
    ) -> Self {
        Self {
            io,
            pending: HashMap::new(),
            next_cookie: 0,
            max_in_flight,
            buffer_pool: Vec::new(),
            completions: Vec::new(),
            directed,
            edge_data_size,
            stats: IoStats::default(),
        }
    }

    /// Number of submitted reads whose completions have not been processed.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// True if no read is outstanding.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> IoStats {
        self.stats
    }

    fn alloc(&mut self, len: usize) -> Vec<u8> {
        let mut buf = self.buffer_pool.pop().unwrap_or_default();
        buf.clear();
        buf.resize(len, 0);
        buf
    }

    /// Moves queued requests into the substrate until the in-flight ceiling
    /// is reached or the queue is empty, coalescing consecutive extents.
    pub fn drain_queued(
        &mut self,
        queue: &mut SubmitQueue,
        index: &GraphIndex,
        trace: Option<&TraceLogger>,
        level: usize,
        worker: usize,
    ) {
        while self.pending.len() < self.max_in_flight && !queue.queued.is_empty() {
            // Batch the extent lookup over the front run of same-kind
            // requests; neighbor expansions queue ids of one kind, so the
            // run usually covers the whole coalescing window.
            let kind = queue.queued[0].kind;
            let window = queue
                .queued
                .iter()
                .take(MAX_COALESCED_PARTS)
                .take_while(|r| r.kind == kind)
                .count();
            let ids: Vec<VertexId> = queue
                .queued
                .iter()
                .take(window)
                .map(|r| r.target)
                .collect();
            let extents = index.block_row_offsets(&ids, kind);

            let request = queue.queued.pop_front().expect("window is nonempty");
            let extent = extents[0];
            let start = round_down(extent.offset);
            let mut end = round_up(extent.end());
            let mut parts = vec![self.part_of(request, extent, start, index)];
            if let Some(t) = trace {
                t.record(level, worker, request.target, extent.offset, extent.size);
            }

            // Fold in following requests while their page-rounded extents
            // touch the read being assembled.
            for &next_extent in &extents[1..] {
                let next = queue.queued[0];
                let next_start = round_down(next_extent.offset);
                if next_start < start || next_start > end {
                    break;
                }
                let next_end = round_up(next_extent.end());
                if next_end.max(end) - start > MAX_READ_BYTES {
                    break;
                }
                end = end.max(next_end);
                parts.push(self.part_of(next, next_extent, start, index));
                if let Some(t) = trace {
                    t.record(level, worker, next.target, next_extent.offset, next_extent.size);
                }
                queue.queued.pop_front();
            }

            let len = (end - start) as usize;
            let buf = self.alloc(len);
            let cookie = self.next_cookie;
            self.next_cookie += 1;
            self.stats.reads += 1;
            self.stats.bytes += len as u64;
            self.stats.requests += parts.len() as u64;
            self.io.submit_read(start, buf, cookie);
            self.pending.insert(cookie, PendingRead { parts });
        }
    }

    fn part_of(
        &self,
        request: VertexRequest,
        extent: VertexExtent,
        read_start: u64,
        index: &GraphIndex,
    ) -> PendingPart {
        let (first_size, second_size) = if self.directed && request.kind == EdgeKind::Both {
            // The extent covers the in-record and the adjacent out-record.
            let in_size = index.extent(request.target, EdgeKind::In).size;
            (in_size, extent.size - in_size)
        } else {
            (extent.size, 0)
        };
        PendingPart {
            issuer: request.issuer,
            target: request.target,
            kind: request.kind,
            rel: (extent.offset - read_start) as usize,
            first_size,
            second_size,
        }
    }

    /// Drains up to `max` completions, invoking `callback` once per logical
    /// request with a transient [`PageVertex`] view. The view is invalidated
    /// before the next completion is processed; buffers are recycled.
    ///
    /// On a failed completion the first error is returned; every polled
    /// completion is still accounted for, so the dispatcher can always be
    /// drained to idle.
    pub fn poll<F>(&mut self, max: usize, mut callback: F) -> Result<(), EngineError>
    where
        F: FnMut(VertexId, &PageVertex),
    {
        let mut completions = std::mem::take(&mut self.completions);
        completions.clear();
        self.io.poll_completions(max, &mut completions);

        let mut first_error = None;
        for completion in completions.drain(..) {
            let read = self
                .pending
                .remove(&completion.cookie)
                .expect("completion with unknown cookie");
            if let Err(source) = completion.result {
                if first_error.is_none() {
                    first_error = Some(EngineError::IoFailed {
                        vertex: read.parts[0].target,
                        source,
                    });
                }
                continue;
            }
            if first_error.is_some() {
                // The run is aborting; drop the data but keep draining.
                self.buffer_pool.push(completion.buf);
                continue;
            }
            for part in &read.parts {
                let first = &completion.buf[part.rel..part.rel + part.first_size as usize];
                if !self.directed {
                    let page = PageVertex::undirected(part.target, first, self.edge_data_size);
                    callback(part.issuer, &page);
                } else {
                    let page = match part.kind {
                        EdgeKind::In => PageVertex::directed(
                            part.target,
                            Some(first),
                            None,
                            self.edge_data_size,
                        ),
                        EdgeKind::Out => PageVertex::directed(
                            part.target,
                            None,
                            Some(first),
                            self.edge_data_size,
                        ),
                        EdgeKind::Both => {
                            let out_start = part.rel + part.first_size as usize;
                            let second =
                                &completion.buf[out_start..out_start + part.second_size as usize];
                            PageVertex::directed(
                                part.target,
                                Some(first),
                                Some(second),
                                self.edge_data_size,
                            )
                        }
                    };
                    callback(part.issuer, &page);
                }
            }
            self.buffer_pool.push(completion.buf);
        }

        self.completions = completions;
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn round_down(offset: u64) -> u64 {
    offset / PAGE_SIZE as u64 * PAGE_SIZE as u64
}

fn round_up(offset: u64) -> u64 {
    offset.div_ceil(PAGE_SIZE as u64) * PAGE_SIZE as u64
}
