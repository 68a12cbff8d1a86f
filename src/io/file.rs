/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Positioned-read implementation of the block-I/O substrate.
//!
//! Requests are queued at submission and serviced with `pread` when the
//! worker polls, so the submit path never blocks on the disk.

use super::{BlockIo, Completion, Cookie, IoFactory};
use crate::config::PAGE_SIZE;
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Factory for [`pread`-backed](FileIo) substrate handles.
pub struct FileIoFactory {
    path: PathBuf,
    file: Arc<File>,
    file_len: u64,
}

impl FileIoFactory {
    /// Opens the graph file for shared positioned reads.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Cannot open graph file {}", path.display()))?;
        let file_len = file
            .metadata()
            .with_context(|| format!("Cannot stat {}", path.display()))?
            .len();
        Ok(Self {
            path: path.to_owned(),
            file: Arc::new(file),
            file_len,
        })
    }

    /// The path the factory was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IoFactory for FileIoFactory {
    fn open(&self) -> Result<Box<dyn BlockIo>> {
        Ok(Box::new(FileIo {
            file: self.file.clone(),
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

/// One worker's handle: a FIFO of submitted reads serviced at poll time.
struct FileIo {
    file: Arc<File>,
    queued: VecDeque<Queued>,
}

impl BlockIo for FileIo {
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
            let result = self.file.read_exact_at(&mut read.buf, read.offset);
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
    fn test_submit_then_poll() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("data");
        let mut f = File::create(&path)?;
        let mut contents = vec![0u8; 2 * PAGE_SIZE];
        contents[PAGE_SIZE] = 0xAB;
        f.write_all(&contents)?;
        drop(f);

        let factory = FileIoFactory::open(&path)?;
        let mut io = IoFactory::open(&factory)?;
        io.submit_read(
            PAGE_SIZE as u64,
            vec![0u8; PAGE_SIZE],
            7,
        );
        assert_eq!(io.in_flight(), 1);

        let mut out = Vec::new();
        io.poll_completions(16, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cookie, 7);
        assert!(out[0].result.is_ok());
        assert_eq!(out[0].buf[0], 0xAB);
        assert_eq!(io.in_flight(), 0);
        Ok(())
    }

    #[test]
    fn test_read_past_end_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("data");
        File::create(&path)?.write_all(&vec![0u8; PAGE_SIZE])?;

        let factory = FileIoFactory::open(&path)?;
        let mut io = IoFactory::open(&factory)?;
        io.submit_read(
            PAGE_SIZE as u64,
            vec![0u8; PAGE_SIZE],
            0,
        );
        let mut out = Vec::new();
        io.poll_completions(16, &mut out);
        assert!(out[0].result.is_err());
        Ok(())
    }
}
