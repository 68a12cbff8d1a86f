/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The worker thread loop.
//!
//! Each level a worker delivers the envelopes flushed at the previous
//! barrier, then drains its current-level activations in batches,
//! alternating with I/O submission and completion polling so neither
//! starves. Once locally quiescent (no unprocessed activation, no queued
//! request, no outstanding read) it enters the two-phase barrier. Phase one
//! flushes partial message segments and publishes whether this worker
//! produced any next-level work; between the phases the leader decides
//! whether another level runs.

use super::context::RunContext;
use super::dispatcher::{IoDispatcher, SubmitQueue};
use super::frontier::Frontier;
use super::message::{Inboxes, Outboxes};
use super::store::{Partitioner, VertexStore};
use super::trace::TraceLogger;
use crate::error::EngineError;
use crate::graph::index::GraphIndex;
use crate::traits::{VertexAlgorithm, VertexScheduler};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};

/// State shared by every worker of one run.
pub(crate) struct RunShared<V: VertexAlgorithm> {
    pub algo: Arc<V>,
    pub store: Arc<VertexStore<V::State>>,
    pub index: Arc<GraphIndex>,
    pub partitioner: Partitioner,
    pub scheduler: Option<Arc<dyn VertexScheduler>>,
    pub trace: Option<Arc<TraceLogger>>,
    pub batch_size: usize,

    /// Phase-one barrier: local quiescence reached everywhere.
    pub barrier_quiesce: Barrier,
    /// Phase-two barrier: the leader's decision is published.
    pub barrier_release: Barrier,
    /// Current level; advanced by the leader between the barrier phases.
    pub level: AtomicUsize,
    /// Set by any worker that produced a next-level bit or message; swapped
    /// out by the leader each level.
    pub any_work: AtomicBool,
    /// The leader's decision: run another level.
    pub continue_flag: AtomicBool,
    /// Vertices processed in the current level, for reporting.
    pub active_this_level: AtomicUsize,

    /// Cooperative cancellation, checked between batches.
    pub cancel: Arc<AtomicBool>,
    /// Raised by the first failing worker; stops the run at the next
    /// barrier.
    pub abort: AtomicBool,
    /// First error wins.
    pub error: Mutex<Option<EngineError>>,
}

impl<V: VertexAlgorithm> RunShared<V> {
    fn record_error(&self, error: EngineError) {
        let mut slot = self.error.lock().expect("error slot poisoned");
        if slot.is_none() {
            *slot = Some(error);
        }
        self.abort.store(true, Ordering::Release);
    }

    fn stopping(&self) -> bool {
        self.abort.load(Ordering::Relaxed) || self.cancel.load(Ordering::Relaxed)
    }
}

/// Everything one worker owns for the duration of a run.
pub(crate) struct Worker<V: VertexAlgorithm> {
    pub worker_id: usize,
    pub shared: Arc<RunShared<V>>,
    pub dispatcher: IoDispatcher,
    pub queue: SubmitQueue,
    pub outboxes: Outboxes<V::Message>,
    pub inboxes: Inboxes<V::Message>,
    pub frontier: Frontier,
}

impl<V: VertexAlgorithm> Worker<V> {
    /// Runs levels until the leader signals completion, then returns this
    /// worker's program.
    pub fn run(self) -> V::Program {
        let Worker {
            worker_id,
            shared,
            mut dispatcher,
            mut queue,
            mut outboxes,
            mut inboxes,
            mut frontier,
        } = self;
        let algo = &*shared.algo;
        let partitioner = &shared.partitioner;
        let index = &*shared.index;
        let batch_size = shared.batch_size;
        let base = partitioner.partition_range(worker_id).start;

        // Exclusive ownership of the partition for the whole run.
        let mut partition = shared.store.lock_partition(worker_id);
        let states = partition.as_mut_slice();

        let mut program = algo.new_program();
        let mut work: Vec<u32> = Vec::new();

        loop {
            let level = shared.level.load(Ordering::Acquire);
            outboxes.begin_level(level);

            // Deliver the envelopes sent in previous levels: first the
            // segments held back last time, then whatever the channels
            // carry. A segment tagged with the current level comes from a
            // sender already inside it; it is held for the next level so
            // bulk-synchronous isolation is preserved. An activate flag
            // schedules the destination into this level.
            for src in 0..inboxes.receivers.len() {
                let mut deliverable = std::mem::take(&mut inboxes.held[src]);
                loop {
                    match inboxes.receivers[src].try_recv() {
                        Ok((sent_level, segment)) if sent_level < level => {
                            deliverable.push(segment);
                        }
                        Ok((_, segment)) => {
                            // Sent in the level we are entering; channels
                            // are FIFO, so nothing older can follow.
                            inboxes.held[src].push(segment);
                            break;
                        }
                        Err(_) => break,
                    }
                }
                for segment in deliverable {
                    for envelope in &segment {
                        if envelope.activate {
                            frontier.activate_current(envelope.dest);
                        }
                        if let Some(payload) = envelope.payload {
                            let local = (envelope.dest - base) as usize;
                            let mut ctx = RunContext::new(
                                envelope.dest,
                                level,
                                worker_id,
                                partitioner,
                                index,
                                &mut queue,
                                &mut outboxes,
                                &mut frontier,
                            );
                            algo.run_on_message(
                                &mut states[local],
                                &mut program,
                                envelope.sender,
                                &payload,
                                &mut ctx,
                            );
                        }
                    }
                    outboxes.recycle(segment);
                }
            }

            frontier.drain_current(&mut work);
            shared
                .active_this_level
                .fetch_add(work.len(), Ordering::Relaxed);
            if let Some(scheduler) = &shared.scheduler {
                scheduler.schedule(level, &mut work);
            }

            let mut at = 0;
            loop {
                if shared.stopping() {
                    // Drain to a consistent stop: no new vertex runs, queued
                    // requests are dropped, outstanding reads still drain.
                    at = work.len();
                    queue.clear();
                }

                let end = (at + batch_size).min(work.len());
                for &id in &work[at..end] {
                    let local = (id - base) as usize;
                    let mut ctx = RunContext::new(
                        id,
                        level,
                        worker_id,
                        partitioner,
                        index,
                        &mut queue,
                        &mut outboxes,
                        &mut frontier,
                    );
                    algo.run(&mut states[local], &mut program, &mut ctx);
                }
                at = end;

                dispatcher.drain_queued(
                    &mut queue,
                    index,
                    shared.trace.as_deref(),
                    level,
                    worker_id,
                );
                let polled = dispatcher.poll(batch_size, |issuer, page| {
                    let local = (issuer - base) as usize;
                    let mut ctx = RunContext::new(
                        issuer,
                        level,
                        worker_id,
                        partitioner,
                        index,
                        &mut queue,
                        &mut outboxes,
                        &mut frontier,
                    );
                    algo.run_on_vertex(&mut states[local], &mut program, page, &mut ctx);
                });
                if let Err(error) = polled {
                    shared.record_error(error);
                }

                if at >= work.len() && queue.is_empty() && dispatcher.is_idle() {
                    break;
                }
            }
            work.clear();

            // Phase 1: flush partial segments, publish produced work.
            outboxes.flush_all();
            if frontier.next_count() > 0 || outboxes.sent_any() {
                shared.any_work.store(true, Ordering::Release);
            }
            let quiesced = shared.barrier_quiesce.wait();
            if quiesced.is_leader() {
                let produced = shared.any_work.swap(false, Ordering::AcqRel);
                let stop =
                    shared.abort.load(Ordering::Acquire) || shared.cancel.load(Ordering::Relaxed);
                let go = produced && !stop;
                let active = shared.active_this_level.swap(0, Ordering::Relaxed);
                log::info!("Level {level}: {active} vertices processed");
                if go {
                    shared.level.store(level + 1, Ordering::Release);
                }
                shared.continue_flag.store(go, Ordering::Release);
            }
            shared.barrier_release.wait();

            frontier.advance();
            if !shared.continue_flag.load(Ordering::Acquire) {
                break;
            }
        }

        let stats = dispatcher.stats();
        log::debug!(
            "Worker {worker_id}: {} reads, {} bytes, {} requests",
            stats.reads,
            stats.bytes,
            stats.requests
        );
        program
    }
}
