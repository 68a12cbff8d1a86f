/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The asynchronous block-I/O substrate consumed by the engine.
//!
//! The engine never blocks on a read: it submits `(offset, length, cookie)`
//! requests through [`BlockIo::submit_read`] and later drains finished reads
//! with [`BlockIo::poll_completions`]. Offsets and lengths are page-aligned
//! ([`PAGE_SIZE`](crate::config::PAGE_SIZE)); the engine enforces this by
//! rounding extents before submission.
//!
//! Every worker opens its own [`BlockIo`] instance through the shared
//! [`IoFactory`], so completions are always polled by the worker that
//! submitted them.

mod file;
mod mmap;

pub use self::file::FileIoFactory;
pub use self::mmap::MmapIoFactory;

use anyhow::Result;

/// Identifies a submitted read within one [`BlockIo`] instance.
pub type Cookie = u64;

/// A finished read. The buffer is handed back to the submitter for reuse.
pub struct Completion {
    /// The cookie passed to [`BlockIo::submit_read`].
    pub cookie: Cookie,
    /// The buffer the read filled.
    pub buf: Vec<u8>,
    /// `Ok` if the buffer holds `buf.len()` valid bytes from the requested
    /// offset. The substrate performs its own retries; an error here is
    /// final.
    pub result: std::io::Result<()>,
}

/// One worker's handle on the block-I/O substrate.
pub trait BlockIo: Send {
    /// Submits an asynchronous read of `buf.len()` bytes at `offset`.
    ///
    /// Returns immediately; the filled buffer comes back from
    /// [`poll_completions`](Self::poll_completions) with the same cookie.
    /// `offset` and `buf.len()` must be page-aligned.
    fn submit_read(&mut self, offset: u64, buf: Vec<u8>, cookie: Cookie);

    /// Drains up to `max` finished reads into `out`.
    fn poll_completions(&mut self, max: usize, out: &mut Vec<Completion>);

    /// Number of submitted reads that have not completed yet.
    fn in_flight(&self) -> usize;
}

/// Creates per-worker [`BlockIo`] instances over one graph file.
pub trait IoFactory: Send + Sync {
    /// Opens a new substrate handle.
    fn open(&self) -> Result<Box<dyn BlockIo>>;

    /// Length in bytes of the underlying file.
    fn file_len(&self) -> u64;
}
