/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The vertex store: one in-memory state per vertex, partitioned across
//! workers.
//!
//! Partitioning is by contiguous ranges: `owner_worker` is a pure function
//! of the id and the worker count, stable over a run. Each partition lives
//! behind its own mutex; the owning worker locks it once for the whole run,
//! so the lock is uncontended on the hot path and the exclusive-ownership
//! invariant is enforced structurally. The engine itself takes the locks
//! only while no run is in progress.

use crate::graph::VertexId;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::{Mutex, MutexGuard};

/// Maps vertex ids to owning workers by range partitioning.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    num_vertices: u32,
    num_workers: usize,
    chunk: u32,
}

impl Partitioner {
    /// Creates a partitioner striping `num_vertices` ids over `num_workers`
    /// contiguous ranges.
    pub fn new(num_vertices: u32, num_workers: usize) -> Self {
        assert!(num_workers >= 1);
        let chunk = num_vertices.div_ceil(num_workers as u32).max(1);
        Self {
            num_vertices,
            num_workers,
            chunk,
        }
    }

    /// The worker owning vertex `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[inline(always)]
    pub fn owner_worker(&self, id: VertexId) -> usize {
        debug_assert!(id < self.num_vertices);
        (id / self.chunk) as usize
    }

    /// The contiguous id range owned by `worker`.
    pub fn partition_range(&self, worker: usize) -> Range<VertexId> {
        let start = (worker as u32).saturating_mul(self.chunk).min(self.num_vertices);
        let end = (worker as u32 + 1)
            .saturating_mul(self.chunk)
            .min(self.num_vertices);
        start..end
    }

    /// The index of `id` within its owner's partition.
    #[inline(always)]
    pub fn local_index(&self, id: VertexId) -> usize {
        (id % self.chunk) as usize
    }

    /// Number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> u32 {
        self.num_vertices
    }
}

/// Owns the per-vertex states, split into per-worker partitions.
pub struct VertexStore<S> {
    partitioner: Partitioner,
    partitions: Vec<Mutex<Vec<S>>>,
}

impl<S: Send> VertexStore<S> {
    /// Builds the store, constructing states in parallel partition by
    /// partition.
    pub fn new(partitioner: Partitioner, init: impl Fn(VertexId) -> S + Sync) -> Self {
        let partitions = (0..partitioner.num_workers())
            .into_par_iter()
            .map(|worker| {
                Mutex::new(
                    partitioner
                        .partition_range(worker)
                        .map(&init)
                        .collect::<Vec<_>>(),
                )
            })
            .collect();
        Self {
            partitioner,
            partitions,
        }
    }

    /// The store's partitioner.
    pub fn partitioner(&self) -> &Partitioner {
        &self.partitioner
    }

    /// Locks one partition for exclusive access.
    ///
    /// Workers call this once at the start of a run and hold the guard until
    /// the run completes.
    pub fn lock_partition(&self, worker: usize) -> MutexGuard<'_, Vec<S>> {
        self.partitions[worker]
            .lock()
            .expect("a worker panicked while holding its partition")
    }

    /// Runs `f` on the state of vertex `id`.
    ///
    /// May only be called while no run is in progress (the engine enforces
    /// this).
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn with_vertex<R>(&self, id: VertexId, f: impl FnOnce(&S) -> R) -> R {
        assert!(
            id < self.partitioner.num_vertices(),
            "vertex id {id} out of range (num_vertices = {})",
            self.partitioner.num_vertices()
        );
        let guard = self.lock_partition(self.partitioner.owner_worker(id));
        f(&guard[self.partitioner.local_index(id)])
    }

    /// Runs `f` on the mutable state of vertex `id`. Same access rules as
    /// [`with_vertex`](Self::with_vertex).
    pub fn with_vertex_mut<R>(&self, id: VertexId, f: impl FnOnce(&mut S) -> R) -> R {
        assert!(
            id < self.partitioner.num_vertices(),
            "vertex id {id} out of range (num_vertices = {})",
            self.partitioner.num_vertices()
        );
        let mut guard = self.lock_partition(self.partitioner.owner_worker(id));
        f(&mut guard[self.partitioner.local_index(id)])
    }

    /// Number of partitions.
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_cover_all_ids_once() {
        for (n, w) in [(10u32, 3usize), (7, 7), (5, 8), (1, 1), (1000, 13)] {
            let p = Partitioner::new(n, w);
            let mut seen = vec![0u32; n as usize];
            for worker in 0..w {
                for id in p.partition_range(worker) {
                    assert_eq!(p.owner_worker(id), worker);
                    assert_eq!(
                        p.partition_range(worker).start + p.local_index(id) as u32,
                        id
                    );
                    seen[id as usize] += 1;
                }
            }
            assert!(seen.iter().all(|&c| c == 1), "n = {n}, w = {w}");
        }
    }

    #[test]
    fn test_store_access() {
        let p = Partitioner::new(10, 3);
        let store = VertexStore::new(p, |id| id * 2);
        store.with_vertex(7, |&s| assert_eq!(s, 14));
        store.with_vertex_mut(7, |s| *s += 1);
        store.with_vertex(7, |&s| assert_eq!(s, 15));
    }
}
