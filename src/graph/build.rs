/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Serializes an arc list into a graph file and its index.
//!
//! The builder collects arcs in memory, sorts each adjacency list, and dumps
//! the concatenated records plus the matching index. Undirected graphs store
//! each edge in both endpoints' lists; directed graphs store, for every
//! vertex, its in-record immediately followed by its out-record, so a
//! [`EdgeKind::Both`](super::EdgeKind::Both) request is a single read.

use super::header::{GraphHeader, GRAPH_HEADER_SIZE};
use super::index::{write_index, IndexLayout};
use super::page_vertex::EdgeData;
use super::VertexId;
use crate::config::PAGE_SIZE;
use anyhow::{ensure, Context, Result};
use dsi_progress_logger::{progress_logger, ProgressLog};
use itertools::Itertools;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Collects arcs and serializes them into an on-disk graph.
pub struct GraphBuilder {
    num_vertices: u32,
    directed: bool,
    edge_data_size: u32,
    arcs: Vec<(VertexId, VertexId)>,
    /// Payload bytes, `edge_data_size` per arc, in arc order.
    payloads: Vec<u8>,
}

impl GraphBuilder {
    /// Creates a builder for an undirected graph with vertex ids in
    /// `0..num_vertices`.
    pub fn undirected(num_vertices: u32) -> Self {
        Self {
            num_vertices,
            directed: false,
            edge_data_size: 0,
            arcs: Vec::new(),
            payloads: Vec::new(),
        }
    }

    /// Creates a builder for a directed graph with vertex ids in
    /// `0..num_vertices`.
    pub fn directed(num_vertices: u32) -> Self {
        Self {
            directed: true,
            ..Self::undirected(num_vertices)
        }
    }

    /// Declares that every arc carries a payload of `size` bytes.
    ///
    /// Must be called before the first arc is added.
    pub fn edge_data_size(mut self, size: u32) -> Self {
        assert!(self.arcs.is_empty(), "edge data size must be set up front");
        self.edge_data_size = size;
        self
    }

    /// Adds one arc. For an undirected graph the edge will appear in both
    /// endpoints' adjacency lists.
    ///
    /// # Panics
    ///
    /// Panics if an endpoint is out of range, or if the graph carries edge
    /// data (use [`add_arc_with_data`](Self::add_arc_with_data)).
    pub fn add_arc(&mut self, src: VertexId, dst: VertexId) -> &mut Self {
        assert_eq!(self.edge_data_size, 0, "this graph carries edge data");
        self.push_arc(src, dst);
        self
    }

    /// Adds one arc with its payload.
    ///
    /// # Panics
    ///
    /// Panics if an endpoint is out of range or the payload size does not
    /// match the declared edge data size.
    pub fn add_arc_with_data<D: EdgeData>(
        &mut self,
        src: VertexId,
        dst: VertexId,
        data: D,
    ) -> &mut Self {
        assert_eq!(
            D::SIZE as u32,
            self.edge_data_size,
            "payload size {} does not match declared edge data size {}",
            D::SIZE,
            self.edge_data_size
        );
        self.push_arc(src, dst);
        data.to_bytes(&mut self.payloads);
        self
    }

    /// Adds a batch of arcs.
    pub fn add_arcs(&mut self, arcs: impl IntoIterator<Item = (VertexId, VertexId)>) -> &mut Self {
        for (src, dst) in arcs {
            self.add_arc(src, dst);
        }
        self
    }

    fn push_arc(&mut self, src: VertexId, dst: VertexId) {
        assert!(
            src < self.num_vertices && dst < self.num_vertices,
            "arc ({src}, {dst}) out of range (num_vertices = {})",
            self.num_vertices
        );
        self.arcs.push((src, dst));
    }

    /// Number of arcs added so far.
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// Serializes the graph and index files and returns the header.
    ///
    /// The graph file is padded to a multiple of the I/O page size so
    /// page-rounded reads never run past the end of the file.
    pub fn write(
        &self,
        graph_path: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
        layout: IndexLayout,
    ) -> Result<GraphHeader> {
        let n = self.num_vertices as usize;
        let eds = self.edge_data_size as usize;

        // Adjacency lists hold (neighbor, arc index); the arc index recovers
        // the payload bytes.
        let num_lists = if self.directed { 2 * n } else { n };
        let mut lists: Vec<Vec<(VertexId, usize)>> = vec![Vec::new(); num_lists];
        for (arc, &(src, dst)) in self.arcs.iter().enumerate() {
            if self.directed {
                // In-record at 2 * id, out-record at 2 * id + 1.
                lists[2 * dst as usize].push((src, arc));
                lists[2 * src as usize + 1].push((dst, arc));
            } else {
                lists[src as usize].push((dst, arc));
                if src != dst {
                    lists[dst as usize].push((src, arc));
                }
            }
        }

        let header = GraphHeader {
            num_vertices: self.num_vertices,
            num_edges: self.arcs.len() as u64,
            directed: self.directed,
            edge_data_size: self.edge_data_size,
        };

        let graph_path = graph_path.as_ref();
        let f = std::fs::File::create(graph_path)
            .with_context(|| format!("Cannot create graph file {}", graph_path.display()))?;
        let mut w = BufWriter::new(f);
        header.write(&mut w)?;

        let mut pl = progress_logger![item_name = "record"];
        pl.expected_updates(Some(num_lists));
        pl.start(format!(
            "Writing {} ({} vertices, {} arcs)...",
            graph_path.display(),
            self.num_vertices,
            self.arcs.len()
        ));

        let mut record_sizes = Vec::with_capacity(num_lists);
        let mut written = GRAPH_HEADER_SIZE as u64;
        for list in &mut lists {
            // Neighbors in ascending order, ties broken by insertion order.
            let sorted = list.iter().copied().sorted_by_key(|&(n, _)| n);
            w.write_all(&(list.len() as u32).to_le_bytes())?;
            let mut payload_bytes = Vec::with_capacity(list.len() * eds);
            for (neighbor, arc) in sorted {
                w.write_all(&neighbor.to_le_bytes())?;
                if eds > 0 {
                    payload_bytes.extend_from_slice(&self.payloads[arc * eds..(arc + 1) * eds]);
                }
            }
            w.write_all(&payload_bytes)?;
            let size = header.record_size(list.len() as u32);
            record_sizes.push(size);
            written += size as u64;
            pl.light_update();
        }

        // Pad to a page boundary.
        let padded = written.next_multiple_of(PAGE_SIZE as u64);
        if padded > written {
            w.write_all(&vec![0u8; (padded - written) as usize])?;
        }
        w.flush()
            .with_context(|| format!("Cannot flush graph file {}", graph_path.display()))?;
        pl.done();

        write_index(
            index_path,
            self.directed,
            self.num_vertices,
            &record_sizes,
            layout,
        )?;
        ensure!(
            record_sizes.iter().map(|&s| s as u64).sum::<u64>() + GRAPH_HEADER_SIZE as u64
                == written,
            "graph file size does not match the index"
        );
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::index::GraphIndex;
    use crate::graph::EdgeKind;

    #[test]
    fn test_undirected_degrees() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let graph_path = dir.path().join("g.graph");
        let index_path = dir.path().join("g.index");

        // Line 0 - 1 - 2.
        let mut builder = GraphBuilder::undirected(3);
        builder.add_arcs([(0, 1), (1, 2)]);
        let header = builder.write(&graph_path, &index_path, IndexLayout::Explicit)?;
        assert_eq!(header.num_edges, 2);

        let index = GraphIndex::load(&index_path, &header)?;
        assert_eq!(index.degree(0), 1);
        assert_eq!(index.degree(1), 2);
        assert_eq!(index.degree(2), 1);

        // The graph file is page padded.
        let len = std::fs::metadata(&graph_path)?.len();
        assert_eq!(len % PAGE_SIZE as u64, 0);
        Ok(())
    }

    #[test]
    fn test_directed_degrees() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let graph_path = dir.path().join("g.graph");
        let index_path = dir.path().join("g.index");

        // 0 -> 1, 0 -> 2, 1 -> 2.
        let mut builder = GraphBuilder::directed(3);
        builder.add_arcs([(0, 1), (0, 2), (1, 2)]);
        let header = builder.write(&graph_path, &index_path, IndexLayout::Compressed)?;

        let index = GraphIndex::load(&index_path, &header)?;
        assert_eq!(index.num_out_edges(0), 2);
        assert_eq!(index.num_in_edges(0), 0);
        assert_eq!(index.num_in_edges(2), 2);
        assert_eq!(index.num_out_edges(2), 0);
        assert_eq!(index.degree(1), 2);

        // The two records of a vertex are adjacent.
        let both = index.extent(1, EdgeKind::Both);
        assert_eq!(
            both.size,
            index.extent(1, EdgeKind::In).size + index.extent(1, EdgeKind::Out).size
        );
        Ok(())
    }

    #[test]
    fn test_self_loop_stored_once_undirected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let graph_path = dir.path().join("g.graph");
        let index_path = dir.path().join("g.index");

        let mut builder = GraphBuilder::undirected(1);
        builder.add_arc(0, 0);
        let header = builder.write(&graph_path, &index_path, IndexLayout::Explicit)?;
        let index = GraphIndex::load(&index_path, &header)?;
        assert_eq!(index.degree(0), 1);
        Ok(())
    }
}
