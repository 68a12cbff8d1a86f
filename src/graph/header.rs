/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The fixed-width header at the start of a graph file.

use anyhow::{ensure, Context, Result};
use std::io::{Read, Write};

/// Magic number of graph files (`SEMGRAPH` in ASCII).
pub const GRAPH_MAGIC: u64 = 0x5345_4d47_5241_5048;
/// Current graph file format version.
pub const GRAPH_VERSION: u32 = 1;
/// Size in bytes of the serialized header.
pub const GRAPH_HEADER_SIZE: usize = 32;

const FLAG_DIRECTED: u32 = 1;

/// Metadata describing an on-disk graph. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphHeader {
    /// Number of vertices; ids are dense in `0..num_vertices`.
    pub num_vertices: u32,
    /// Number of edges. An undirected edge counts once.
    pub num_edges: u64,
    /// Whether the graph is directed.
    pub directed: bool,
    /// Size in bytes of the per-edge payload; 0 if edges carry no data.
    pub edge_data_size: u32,
}

impl GraphHeader {
    /// Returns true if edges carry a payload.
    pub fn has_edge_data(&self) -> bool {
        self.edge_data_size > 0
    }

    /// Bytes occupied on disk by one adjacency record of `degree` edges:
    /// a `u32` length prefix, the neighbor ids, and the edge payloads.
    pub fn record_size(&self, degree: u32) -> u32 {
        4 + degree * (4 + self.edge_data_size)
    }

    /// Inverse of [`record_size`](Self::record_size): the degree encoded by a
    /// record of `size` bytes.
    pub fn degree_of_record(&self, size: u32) -> u32 {
        debug_assert!(size >= 4);
        (size - 4) / (4 + self.edge_data_size)
    }

    /// Serializes the header into `w` as exactly
    /// [`GRAPH_HEADER_SIZE`] bytes.
    pub fn write(&self, w: &mut impl Write) -> Result<()> {
        let mut buf = [0u8; GRAPH_HEADER_SIZE];
        buf[0..8].copy_from_slice(&GRAPH_MAGIC.to_le_bytes());
        buf[8..12].copy_from_slice(&GRAPH_VERSION.to_le_bytes());
        buf[12..16].copy_from_slice(&self.num_vertices.to_le_bytes());
        buf[16..24].copy_from_slice(&self.num_edges.to_le_bytes());
        buf[24..28].copy_from_slice(&self.edge_data_size.to_le_bytes());
        let flags = if self.directed { FLAG_DIRECTED } else { 0 };
        buf[28..32].copy_from_slice(&flags.to_le_bytes());
        w.write_all(&buf).context("Cannot write graph header")?;
        Ok(())
    }

    /// Reads and validates a header from `r`.
    pub fn read(r: &mut impl Read) -> Result<Self> {
        let mut buf = [0u8; GRAPH_HEADER_SIZE];
        r.read_exact(&mut buf).context("Cannot read graph header")?;
        let magic = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        ensure!(
            magic == GRAPH_MAGIC,
            "Bad graph file magic: {magic:#x} (expected {GRAPH_MAGIC:#x})"
        );
        let version = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        ensure!(
            version == GRAPH_VERSION,
            "Unsupported graph file version {version} (expected {GRAPH_VERSION})"
        );
        let num_vertices = u32::from_le_bytes(buf[12..16].try_into().unwrap());
        let num_edges = u64::from_le_bytes(buf[16..24].try_into().unwrap());
        let edge_data_size = u32::from_le_bytes(buf[24..28].try_into().unwrap());
        let flags = u32::from_le_bytes(buf[28..32].try_into().unwrap());

        Ok(Self {
            num_vertices,
            num_edges,
            directed: flags & FLAG_DIRECTED != 0,
            edge_data_size,
        })
    }
}
