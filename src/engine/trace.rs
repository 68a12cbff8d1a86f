/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Optional CSV trace of submitted reads.
//!
//! Enabled by setting
//! [`trace_log_path`](crate::config::GraphConfig::trace_log_path); every
//! logical read request becomes one line
//! `level,worker,vertex,offset,length`.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Appends one CSV line per submitted read to a trace file.
pub struct TraceLogger {
    writer: Mutex<BufWriter<File>>,
}

impl TraceLogger {
    /// Creates (truncating) the trace file and writes the CSV header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Cannot create trace log {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "level,worker,vertex,offset,length")
            .with_context(|| format!("Cannot write to trace log {}", path.display()))?;
        log::info!("Tracing reads to {}", path.display());
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    /// Records one read request.
    pub fn record(&self, level: usize, worker: usize, vertex: u32, offset: u64, length: u32) {
        let mut writer = self.writer.lock().expect("trace log poisoned");
        // Trace output is best effort; a full disk should not kill the run.
        let _ = writeln!(writer, "{level},{worker},{vertex},{offset},{length}");
    }
}

impl Drop for TraceLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_lines() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("trace.csv");
        let trace = TraceLogger::create(&path)?;
        trace.record(0, 1, 42, 512, 1024);
        trace.record(1, 0, 7, 0, 512);
        drop(trace);

        let contents = std::fs::read_to_string(&path)?;
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines[0], "level,worker,vertex,offset,length");
        assert_eq!(lines[1], "0,1,42,512,1024");
        assert_eq!(lines[2], "1,0,7,0,512");
        Ok(())
    }
}
