/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Memory-mapped implementation of the block-I/O substrate.
//!
//! The whole graph file is mapped once and shared; completions are served by
//! copying out of the mapping. With
//! [`preload_graph`](crate::config::GraphConfig::preload_graph) set, the
//! mapping is touched sequentially at creation so reads hit the page cache.

use super::{BlockIo, Completion, Cookie, IoFactory};
use crate::config::PAGE_SIZE;
use anyhow::{Context, Result};
use dsi_progress_logger::{progress_logger, ProgressLog};
use mmap_rs::{Mmap, MmapFlags};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Factory for [mmap-backed](MmapIo) substrate handles.
pub struct MmapIoFactory {
    mmap: Arc<Mmap>,
    file_len: u64,
}

impl MmapIoFactory {
    /// Maps the graph file. If `preload` is set, every page is touched once
    /// so subsequent reads are serviced from memory.
    pub fn open(path: impl AsRef<Path>, preload: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Cannot open graph file {}", path.display()))?;
        let file_len = file
            .metadata()
            .with_context(|| format!("Cannot stat {}", path.display()))?
            .len();

        let mmap = unsafe {
            mmap_rs::MmapOptions::new(file_len.max(1) as usize)
                .with_context(|| format!("Cannot initialize mmap of size {file_len}"))?
                .with_flags(MmapFlags::SEQUENTIAL)
                .with_file(&file, 0)
                .map()
                .with_context(|| format!("Cannot mmap {}", path.display()))?
        };

        if preload {
            let mut pl = progress_logger![item_name = "page"];
            pl.expected_updates(Some(mmap.len().div_ceil(PAGE_SIZE)));
            pl.start(format!("Preloading {}...", path.display()));
            let mut checksum = 0u64;
            for page in mmap.as_slice().chunks(PAGE_SIZE) {
                checksum = checksum.wrapping_add(page[0] as u64);
                pl.light_update();
            }
            pl.done();
            log::debug!("Preload touched {} bytes (checksum {checksum})", mmap.len());
        }

        Ok(Self {
            mmap: Arc::new(mmap),
            file_len,
        })
    }
}

impl IoFactory for MmapIoFactory {
    fn open(&self) -> Result<Box<dyn BlockIo>> {
        Ok(Box::new(MmapIo {
            mmap: self.mmap.clone(),
            queued: VecDeque::new(),
        }))
    }

    fn file_len(&self) -> u64 {
        self.file_len
    }
}

struct Queued {
    offset: u64,
    buf: Vec<u8>,
    cookie: Cookie,
}

/// One worker's handle: completions are copies out of the shared mapping.
struct MmapIo {
    mmap: Arc<Mmap>,
    queued: VecDeque<Queued>,
}

impl BlockIo for MmapIo {
    fn submit_read(&mut self, offset: u64, buf: Vec<u8>, cookie: Cookie) {
        debug_assert_eq!(offset % PAGE_SIZE as u64, 0);
        debug_assert_eq!(buf.len() % PAGE_SIZE, 0);
        self.queued.push_back(Queued {
            offset,
            buf,
            cookie,
        });
    }

    fn poll_completions(&mut self, max: usize, out: &mut Vec<Completion>) {
        for _ in 0..max {
            let Some(mut read) = self.queued.pop_front() else {
                break;
            };
            let start = read.offset as usize;
            let end = start + read.buf.len();
            let result = if end <= self.mmap.len() {
                read.buf.copy_from_slice(&self.mmap.as_slice()[start..end]);
                Ok(())
            } else {
                Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "read of {} bytes at {} past end of mapping ({} bytes)",
                        read.buf.len(),
                        read.offset,
                        self.mmap.len()
                    ),
                ))
            };
            out.push(Completion {
                cookie: read.cookie,
                buf: read.buf,
                result,
            });
        }
    }

    fn in_flight(&self) -> usize {
        self.queued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mmap_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("data");
        let mut contents = vec![0u8; 4 * PAGE_SIZE];
        contents[2 * PAGE_SIZE + 5] = 0x77;
        std::fs::File::create(&path)?.write_all(&contents)?;

        let factory = MmapIoFactory::open(&path, true)?;
        assert_eq!(factory.file_len(), 4 * PAGE_SIZE as u64);
        let mut io = IoFactory::open(&factory)?;
        io.submit_read(
            2 * PAGE_SIZE as u64,
            vec![0u8; PAGE_SIZE],
            3,
        );
        let mut out = Vec::new();
        io.poll_completions(1, &mut out);
        assert!(out[0].result.is_ok());
        assert_eq!(out[0].buf[5], 0x77);
        Ok(())
    }
}
