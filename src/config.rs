/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Engine configuration.
//!
//! A [`GraphConfig`] can be built programmatically with the fluent setters or
//! loaded from a Java properties file, the same text format used for graph
//! metadata:
//!
//! ```text
//! num_workers = 8
//! max_in_flight_io_per_worker = 512
//! message_buffer_bytes = 16384
//! preload_graph = true
//! ```

use anyhow::{ensure, Context, Result};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Size in bytes of an I/O page.
///
/// Extents are rounded to this boundary before being submitted to the I/O
/// substrate, which may require aligned direct I/O.
pub const PAGE_SIZE: usize = 512;

/// Configuration for a [`GraphEngine`](crate::engine::GraphEngine).
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Number of worker threads.
    pub num_workers: usize,
    /// Number of NUMA nodes the workers are striped over. Advisory: recorded
    /// and logged, no pinning is performed.
    pub num_nodes: usize,
    /// Ceiling on outstanding reads per worker. Further requests queue
    /// locally until completions free a slot.
    pub max_in_flight_io_per_worker: usize,
    /// Capacity in bytes of one outbound message segment.
    pub message_buffer_bytes: usize,
    /// Number of activations a worker processes before polling I/O
    /// completions again.
    pub batch_size: usize,
    /// Memory-map the graph file and touch it sequentially at creation,
    /// so reads are served from the page cache.
    pub preload_graph: bool,
    /// If set, every submitted read is appended as a CSV line to this file.
    pub trace_log_path: Option<PathBuf>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            num_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            num_nodes: 1,
            max_in_flight_io_per_worker: 512,
            message_buffer_bytes: PAGE_SIZE * 4,
            batch_size: 1024,
            preload_graph: false,
            trace_log_path: None,
        }
    }
}

impl GraphConfig {
    /// Sets the number of worker threads.
    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Sets the number of NUMA nodes (advisory).
    pub fn num_nodes(mut self, num_nodes: usize) -> Self {
        self.num_nodes = num_nodes;
        self
    }

    /// Sets the per-worker ceiling on outstanding reads.
    pub fn max_in_flight_io_per_worker(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight_io_per_worker = max_in_flight;
        self
    }

    /// Sets the capacity in bytes of one outbound message segment.
    pub fn message_buffer_bytes(mut self, bytes: usize) -> Self {
        self.message_buffer_bytes = bytes;
        self
    }

    /// Sets the number of activations processed between completion polls.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Preload the graph into the page cache at creation.
    pub fn preload_graph(mut self, preload: bool) -> Self {
        self.preload_graph = preload;
        self
    }

    /// Trace submitted reads to the given file.
    pub fn trace_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_log_path = Some(path.into());
        self
    }

    /// Loads a configuration from a Java properties file.
    ///
    /// Unknown keys are ignored; missing keys keep their defaults.
    pub fn from_properties(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("Cannot open configuration file {}", path.display()))?;
        let map = java_properties::read(BufReader::new(f)).with_context(|| {
            format!("Cannot parse {} as a java properties file", path.display())
        })?;

        let mut config = Self::default();
        if let Some(v) = map.get("num_workers") {
            config.num_workers = v
                .parse()
                .with_context(|| format!("Cannot parse num_workers = {v}"))?;
        }
        if let Some(v) = map.get("num_nodes") {
            config.num_nodes = v
                .parse()
                .with_context(|| format!("Cannot parse num_nodes = {v}"))?;
        }
        if let Some(v) = map.get("max_in_flight_io_per_worker") {
            config.max_in_flight_io_per_worker = v
                .parse()
                .with_context(|| format!("Cannot parse max_in_flight_io_per_worker = {v}"))?;
        }
        if let Some(v) = map.get("message_buffer_bytes") {
            config.message_buffer_bytes = v
                .parse()
                .with_context(|| format!("Cannot parse message_buffer_bytes = {v}"))?;
        }
        if let Some(v) = map.get("batch_size") {
            config.batch_size = v
                .parse()
                .with_context(|| format!("Cannot parse batch_size = {v}"))?;
        }
        if let Some(v) = map.get("preload_graph") {
            config.preload_graph = v
                .parse()
                .with_context(|| format!("Cannot parse preload_graph = {v}"))?;
        }
        if let Some(v) = map.get("trace_log_path") {
            config.trace_log_path = Some(PathBuf::from(v));
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for impossible values.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.num_workers >= 1, "num_workers must be at least 1");
        ensure!(self.num_nodes >= 1, "num_nodes must be at least 1");
        ensure!(
            self.max_in_flight_io_per_worker >= 1,
            "max_in_flight_io_per_worker must be at least 1"
        );
        ensure!(
            self.message_buffer_bytes >= 64,
            "message_buffer_bytes must be at least 64"
        );
        ensure!(self.batch_size >= 1, "batch_size must be at least 1");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        GraphConfig::default().validate().unwrap();
    }

    #[test]
    fn test_from_properties() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("engine.properties");
        let mut f = std::fs::File::create(&path)?;
        writeln!(f, "num_workers = 3")?;
        writeln!(f, "message_buffer_bytes = 4096")?;
        writeln!(f, "preload_graph = true")?;
        writeln!(f, "trace_log_path = /tmp/trace.csv")?;
        drop(f);

        let config = GraphConfig::from_properties(&path)?;
        assert_eq!(config.num_workers, 3);
        assert_eq!(config.message_buffer_bytes, 4096);
        assert!(config.preload_graph);
        assert_eq!(config.trace_log_path, Some(PathBuf::from("/tmp/trace.csv")));
        // Untouched keys keep their defaults.
        assert_eq!(config.batch_size, GraphConfig::default().batch_size);
        Ok(())
    }

    #[test]
    fn test_rejects_zero_workers() {
        assert!(GraphConfig::default().num_workers(0).validate().is_err());
    }
}
