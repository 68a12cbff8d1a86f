/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The per-worker activation frontier.
//!
//! Two bitsets over the worker's partition: `current` holds the level being
//! processed, `next` collects activations for the level after it. At the
//! barrier the two are swapped. Only the owning worker ever touches either
//! bitset: cross-worker activations arrive as messages and are applied at
//! delivery time.

use crate::graph::VertexId;
use std::ops::Range;
use sux::bits::BitVec;

/// The two-level activation frontier of one worker.
pub struct Frontier {
    base: VertexId,
    len: usize,
    current: BitVec,
    next: BitVec,
    current_count: usize,
    next_count: usize,
}

impl Frontier {
    /// Creates an empty frontier over the given partition range.
    pub fn new(range: Range<VertexId>) -> Self {
        let len = (range.end - range.start) as usize;
        Self {
            base: range.start,
            len,
            current: BitVec::new(len),
            next: BitVec::new(len),
            current_count: 0,
            next_count: 0,
        }
    }

    #[inline(always)]
    fn local(&self, id: VertexId) -> usize {
        let local = (id - self.base) as usize;
        debug_assert!(local < self.len, "vertex {id} is not in this partition");
        local
    }

    /// Marks `id` active in the level currently being processed. Used when
    /// seeding level 0 and when an activation message is delivered.
    ///
    /// Returns true if the bit was not set before.
    pub fn activate_current(&mut self, id: VertexId) -> bool {
        let local = self.local(id);
        if self.current[local] {
            return false;
        }
        self.current.set(local, true);
        self.current_count += 1;
        true
    }

    /// Marks `id` active in the next level.
    ///
    /// Returns true if the bit was not set before.
    pub fn activate_next(&mut self, id: VertexId) -> bool {
        let local = self.local(id);
        if self.next[local] {
            return false;
        }
        self.next.set(local, true);
        self.next_count += 1;
        true
    }

    /// Moves the current level's activations into `out` as global vertex
    /// ids, in ascending order, clearing the bitset.
    pub fn drain_current(&mut self, out: &mut Vec<VertexId>) {
        if self.current_count == 0 {
            return;
        }
        out.reserve(self.current_count);
        for local in 0..self.len {
            if self.current[local] {
                self.current.set(local, false);
                out.push(self.base + local as VertexId);
            }
        }
        self.current_count = 0;
    }

    /// Swaps the frontiers at the barrier: `next` becomes `current`.
    ///
    /// The old current level must have been fully
    /// [drained](Self::drain_current).
    pub fn advance(&mut self) {
        debug_assert_eq!(self.current_count, 0, "advance with undrained current level");
        std::mem::swap(&mut self.current, &mut self.next);
        self.current_count = self.next_count;
        self.next_count = 0;
    }

    /// Number of activations waiting in the current level.
    pub fn current_count(&self) -> usize {
        self.current_count
    }

    /// Number of activations collected for the next level.
    pub fn next_count(&self) -> usize {
        self.next_count
    }
}
