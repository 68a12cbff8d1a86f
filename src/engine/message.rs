/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The message bus: per-destination outbound segments over an N×N grid of
//! single-producer/single-consumer channels.
//!
//! A send copies the envelope into the segment targeted at the destination's
//! owner worker; a full segment is handed to the destination's inbox and a
//! fresh one is taken from the recycling pool, so the fast path does not
//! allocate once steady state is reached. Partial segments are flushed at
//! the barrier.
//!
//! Every segment is tagged with the level it was sent in. Receivers drain
//! their inboxes only at the start of a level and deliver only segments from
//! *earlier* levels. A segment tagged with the current level can appear when
//! a fast sender is already deep into the level the receiver is just
//! entering; it is held back and delivered one level later. A message sent
//! at level L is therefore delivered at level L + 1, never before and never
//! in the same level.

use crate::graph::VertexId;
use std::sync::mpsc::{channel, Receiver, Sender};

/// One routed message: the typed payload plus delivery metadata.
///
/// An activation-only envelope carries no payload; delivery then only marks
/// the destination active, without invoking the message callback.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<M: Copy> {
    /// The vertex that sent the message.
    pub sender: VertexId,
    /// The vertex it is addressed to.
    pub dest: VertexId,
    /// Whether delivery activates `dest` in the level being entered.
    pub activate: bool,
    /// The payload, if any.
    pub payload: Option<M>,
}

/// A segment of envelopes in flight between two workers.
pub type Segment<M> = Vec<Envelope<M>>;

/// The sending half owned by one worker: one open segment per destination
/// worker plus the segment recycling pool.
pub struct Outboxes<M: Copy> {
    segments: Vec<Segment<M>>,
    senders: Vec<Sender<(usize, Segment<M>)>>,
    pool: Vec<Segment<M>>,
    segment_capacity: usize,
    level: usize,
    sent_any: bool,
}

impl<M: Copy> Outboxes<M> {
    /// Enters a level: outgoing segments will carry its tag.
    pub fn begin_level(&mut self, level: usize) {
        self.level = level;
        self.sent_any = false;
    }

    /// Copies `envelope` into the segment for `dest_worker`, handing the
    /// segment over if it becomes full.
    pub fn send(&mut self, dest_worker: usize, envelope: Envelope<M>) {
        let segment = &mut self.segments[dest_worker];
        segment.push(envelope);
        self.sent_any = true;
        if segment.len() >= self.segment_capacity {
            self.flush(dest_worker);
        }
    }

    /// Hands the open segment for `dest_worker` to its inbox, if nonempty.
    fn flush(&mut self, dest_worker: usize) {
        if self.segments[dest_worker].is_empty() {
            return;
        }
        let mut fresh = self.pool.pop().unwrap_or_default();
        fresh.clear();
        let full = std::mem::replace(&mut self.segments[dest_worker], fresh);
        // The receiver cannot have hung up: inboxes live as long as the run.
        self.senders[dest_worker]
            .send((self.level, full))
            .expect("inbox closed during a run");
    }

    /// Flushes every partial segment. Called at barrier time.
    pub fn flush_all(&mut self) {
        for dest_worker in 0..self.segments.len() {
            self.flush(dest_worker);
        }
    }

    /// True if any envelope was sent since the last
    /// [`begin_level`](Self::begin_level).
    pub fn sent_any(&self) -> bool {
        self.sent_any
    }

    /// Returns a drained segment to the pool for reuse.
    pub fn recycle(&mut self, mut segment: Segment<M>) {
        segment.clear();
        self.pool.push(segment);
    }
}

/// The receiving half owned by one worker: one inbox per source worker,
/// plus the segments held back because they were sent in the level the
/// receiver was entering.
pub struct Inboxes<M: Copy> {
    pub(crate) receivers: Vec<Receiver<(usize, Segment<M>)>>,
    pub(crate) held: Vec<Vec<Segment<M>>>,
}

/// Builds the N×N channel grid for `num_workers` workers.
///
/// Each `(source, destination)` pair gets its own channel, so every channel
/// has a single producer and a single consumer. `segment_bytes` sizes the
/// outbound segments.
pub fn build_grid<M: Copy>(
    num_workers: usize,
    segment_bytes: usize,
) -> (Vec<Outboxes<M>>, Vec<Inboxes<M>>) {
    let segment_capacity = (segment_bytes / std::mem::size_of::<Envelope<M>>()).max(1);

    let mut all_senders: Vec<Vec<Sender<(usize, Segment<M>)>>> =
        (0..num_workers).map(|_| Vec::new()).collect();
    let mut inboxes = Vec::with_capacity(num_workers);
    for _dest in 0..num_workers {
        let mut receivers = Vec::with_capacity(num_workers);
        for src in 0..num_workers {
            let (tx, rx) = channel();
            all_senders[src].push(tx);
            receivers.push(rx);
        }
        inboxes.push(Inboxes {
            receivers,
            held: (0..num_workers).map(|_| Vec::new()).collect(),
        });
    }

    let outboxes = all_senders
        .into_iter()
        .map(|senders| Outboxes {
            segments: (0..num_workers)
                .map(|_| Vec::with_capacity(segment_capacity))
                .collect(),
            senders,
            pool: Vec::new(),
            segment_capacity,
            level: 0,
            sent_any: false,
        })
        .collect();

    (outboxes, inboxes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(sender: VertexId, dest: VertexId, payload: u32) -> Envelope<u32> {
        Envelope {
            sender,
            dest,
            activate: false,
            payload: Some(payload),
        }
    }

    #[test]
    fn test_full_segment_is_handed_over() {
        // Room for exactly two envelopes per segment.
        let bytes = 2 * std::mem::size_of::<Envelope<u32>>();
        let (mut outboxes, inboxes) = build_grid::<u32>(2, bytes);

        let out = &mut outboxes[0];
        out.begin_level(3);
        out.send(1, envelope(0, 5, 10));
        assert!(inboxes[1].receivers[0].try_recv().is_err());
        out.send(1, envelope(0, 6, 11));
        let (level, segment) = inboxes[1].receivers[0].try_recv().unwrap();
        assert_eq!(level, 3);
        assert_eq!(segment.len(), 2);
        assert_eq!(segment[1].dest, 6);
    }

    #[test]
    fn test_flush_all_delivers_partials() {
        let (mut outboxes, inboxes) = build_grid::<u32>(3, 4096);
        outboxes[2].send(0, envelope(9, 1, 42));
        assert!(inboxes[0].receivers[2].try_recv().is_err());
        outboxes[2].flush_all();
        let (level, segment) = inboxes[0].receivers[2].try_recv().unwrap();
        assert_eq!(level, 0);
        assert_eq!(segment.len(), 1);
        assert_eq!(segment[0].payload, Some(42));
        // Nothing on the other channels.
        assert!(inboxes[1].receivers[2].try_recv().is_err());
    }

    #[test]
    fn test_sent_any_tracks_level() {
        let (mut outboxes, _inboxes) = build_grid::<u32>(1, 4096);
        assert!(!outboxes[0].sent_any());
        outboxes[0].send(0, envelope(0, 0, 1));
        assert!(outboxes[0].sent_any());
        outboxes[0].begin_level(1);
        assert!(!outboxes[0].sent_any());
    }

    #[test]
    fn test_recycled_segments_round_trip() {
        let bytes = std::mem::size_of::<Envelope<u32>>();
        let (mut outboxes, inboxes) = build_grid::<u32>(1, bytes);
        for round in 0..4 {
            outboxes[0].send(0, envelope(0, 0, round));
            let (_, segment) = inboxes[0].receivers[0].try_recv().unwrap();
            assert_eq!(segment.len(), 1);
            assert_eq!(segment[0].payload, Some(round));
            outboxes[0].recycle(segment);
        }
    }
}
