/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The vertex index: maps a vertex id to the on-disk extent of its adjacency
//! record(s) in O(1), and answers degree queries without touching the graph
//! file.
//!
//! Two layouts are supported. The *explicit* layout stores `{offset, size}`
//! per record. The *compressed* layout stores one `u64` base offset per block
//! of [`BLOCK_LEN`] records plus a `u32` delta per record; a record's size is
//! the difference of two adjacent offsets, which requires offsets to be
//! monotone non-decreasing (a format invariant, checked at load time).
//!
//! In a directed graph every vertex contributes two records, the in-record
//! immediately followed by the out-record; the undirected case has a single
//! record per vertex.

use super::header::{GraphHeader, GRAPH_HEADER_SIZE};
use super::{EdgeKind, VertexId};
use anyhow::{ensure, Context, Result};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Magic number of index files (`SEMINDEX` in ASCII).
pub const INDEX_MAGIC: u64 = 0x5345_4d49_4e44_4558;
/// Current index file format version.
pub const INDEX_VERSION: u32 = 1;
/// Size in bytes of the serialized index header.
pub const INDEX_HEADER_SIZE: usize = 24;
/// Number of records covered by one base offset in the compressed layout.
pub const BLOCK_LEN: usize = 64;

const FLAG_DIRECTED: u32 = 1;

/// On-disk layout of the index entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLayout {
    /// `{offset: u64, size: u32}` per record.
    Explicit,
    /// Base-plus-delta offsets; sizes are differences of adjacent offsets.
    Compressed,
}

/// The location of an adjacency record (or pair of records) in the graph
/// file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexExtent {
    /// File-absolute byte offset.
    pub offset: u64,
    /// Length in bytes.
    pub size: u32,
}

impl VertexExtent {
    /// End offset (exclusive) of the extent.
    pub fn end(&self) -> u64 {
        self.offset + self.size as u64
    }
}

enum IndexData {
    Explicit {
        offsets: Vec<u64>,
        sizes: Vec<u32>,
    },
    /// `deltas` has one trailing sentinel entry equal to the end of the last
    /// record, so sizes can always be computed as a difference.
    Compressed {
        bases: Vec<u64>,
        deltas: Vec<u32>,
    },
}

/// The in-memory vertex index. Immutable after load, freely shared between
/// workers.
pub struct GraphIndex {
    num_vertices: u32,
    directed: bool,
    edge_data_size: u32,
    data: IndexData,
}

impl GraphIndex {
    /// Loads an index file and validates it against the graph header.
    pub fn load(path: impl AsRef<Path>, header: &GraphHeader) -> Result<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path)
            .with_context(|| format!("Cannot open index file {}", path.display()))?;
        let mut r = BufReader::new(f);

        let mut buf = [0u8; INDEX_HEADER_SIZE];
        r.read_exact(&mut buf).context("Cannot read index header")?;
        let magic = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        ensure!(
            magic == INDEX_MAGIC,
            "Bad index file magic: {magic:#x} (expected {INDEX_MAGIC:#x})"
        );
        let version = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        ensure!(
            version == INDEX_VERSION,
            "Unsupported index file version {version} (expected {INDEX_VERSION})"
        );
        let layout = match u32::from_le_bytes(buf[12..16].try_into().unwrap()) {
            0 => IndexLayout::Explicit,
            1 => IndexLayout::Compressed,
            l => anyhow::bail!("Unknown index layout {l}"),
        };
        let num_vertices = u32::from_le_bytes(buf[16..20].try_into().unwrap());
        let flags = u32::from_le_bytes(buf[20..24].try_into().unwrap());
        let directed = flags & FLAG_DIRECTED != 0;

        ensure!(
            num_vertices == header.num_vertices,
            "Index has {} vertices but the graph header has {}",
            num_vertices,
            header.num_vertices
        );
        ensure!(
            directed == header.directed,
            "Index directedness ({}) does not match the graph header ({})",
            directed,
            header.directed
        );

        let num_records = Self::records_of(num_vertices, directed);
        let data = match layout {
            IndexLayout::Explicit => {
                let mut offsets = Vec::with_capacity(num_records);
                let mut sizes = Vec::with_capacity(num_records);
                let mut entry = [0u8; 12];
                for rec in 0..num_records {
                    r.read_exact(&mut entry)
                        .with_context(|| format!("Cannot read index entry {rec}"))?;
                    offsets.push(u64::from_le_bytes(entry[0..8].try_into().unwrap()));
                    sizes.push(u32::from_le_bytes(entry[8..12].try_into().unwrap()));
                }
                IndexData::Explicit { offsets, sizes }
            }
            IndexLayout::Compressed => {
                let num_entries = num_records + 1;
                let num_blocks = num_entries.div_ceil(BLOCK_LEN);
                let mut bases = Vec::with_capacity(num_blocks);
                let mut word = [0u8; 8];
                for block in 0..num_blocks {
                    r.read_exact(&mut word)
                        .with_context(|| format!("Cannot read index base {block}"))?;
                    bases.push(u64::from_le_bytes(word));
                }
                let mut deltas = Vec::with_capacity(num_entries);
                let mut half = [0u8; 4];
                for entry in 0..num_entries {
                    r.read_exact(&mut half)
                        .with_context(|| format!("Cannot read index delta {entry}"))?;
                    deltas.push(u32::from_le_bytes(half));
                }
                IndexData::Compressed { bases, deltas }
            }
        };

        let index = Self {
            num_vertices,
            directed,
            edge_data_size: header.edge_data_size,
            data,
        };
        index.validate(header)?;
        Ok(index)
    }

    /// Checks the monotonicity invariant and, for directed graphs, the
    /// adjacency of each vertex's in- and out-record.
    fn validate(&self, header: &GraphHeader) -> Result<()> {
        let num_records = Self::records_of(self.num_vertices, self.directed);
        let mut prev_end = GRAPH_HEADER_SIZE as u64;
        for rec in 0..num_records {
            let extent = self.record_extent(rec);
            ensure!(
                extent.offset >= prev_end,
                "Index offsets are not monotone at record {rec}: {} < {prev_end}",
                extent.offset,
            );
            ensure!(
                extent.size >= 4,
                "Index record {rec} is too small to hold a length prefix"
            );
            ensure!(
                (extent.size - 4) % (4 + header.edge_data_size) == 0,
                "Index record {rec} size {} does not cover whole edges",
                extent.size
            );
            prev_end = extent.end();
        }
        if self.directed {
            for id in 0..self.num_vertices {
                let r#in = self.record_extent(2 * id as usize);
                let out = self.record_extent(2 * id as usize + 1);
                ensure!(
                    out.offset == r#in.end(),
                    "Vertex {id}: out-record at {} is not adjacent to in-record ending at {}",
                    out.offset,
                    r#in.end()
                );
            }
        }
        Ok(())
    }

    fn records_of(num_vertices: u32, directed: bool) -> usize {
        if directed {
            2 * num_vertices as usize
        } else {
            num_vertices as usize
        }
    }

    fn record_extent(&self, rec: usize) -> VertexExtent {
        match &self.data {
            IndexData::Explicit { offsets, sizes } => VertexExtent {
                offset: offsets[rec],
                size: sizes[rec],
            },
            IndexData::Compressed { bases, deltas } => {
                let offset = bases[rec / BLOCK_LEN] + deltas[rec] as u64;
                let end = bases[(rec + 1) / BLOCK_LEN] + deltas[rec + 1] as u64;
                VertexExtent {
                    offset,
                    size: (end - offset) as u32,
                }
            }
        }
    }

    /// Number of vertices covered by the index.
    pub fn num_vertices(&self) -> u32 {
        self.num_vertices
    }

    /// Whether the indexed graph is directed.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Returns the on-disk extent of the adjacency of `id` for the given
    /// edge kind.
    ///
    /// For an undirected graph all kinds resolve to the vertex's single
    /// record; for a directed graph [`EdgeKind::Both`] covers the in-record
    /// and the adjacent out-record with a single extent.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn extent(&self, id: VertexId, kind: EdgeKind) -> VertexExtent {
        assert!(
            id < self.num_vertices,
            "Vertex id {id} out of range (num_vertices = {})",
            self.num_vertices
        );
        if !self.directed {
            return self.record_extent(id as usize);
        }
        let r#in = self.record_extent(2 * id as usize);
        match kind {
            EdgeKind::In => r#in,
            EdgeKind::Out => self.record_extent(2 * id as usize + 1),
            EdgeKind::Both => {
                let out = self.record_extent(2 * id as usize + 1);
                VertexExtent {
                    offset: r#in.offset,
                    size: r#in.size + out.size,
                }
            }
        }
    }

    /// Batched extent lookup, one result per id in order. Used by the I/O
    /// dispatcher to coalesce sequential reads.
    pub fn block_row_offsets(&self, ids: &[VertexId], kind: EdgeKind) -> Vec<VertexExtent> {
        ids.iter().map(|&id| self.extent(id, kind)).collect()
    }

    /// In-degree of `id`, from the index alone. For an undirected graph this
    /// is the vertex's degree.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn num_in_edges(&self, id: VertexId) -> u32 {
        self.degree_of(self.extent(id, EdgeKind::In))
    }

    /// Out-degree of `id`, from the index alone. For an undirected graph
    /// this is the vertex's degree.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn num_out_edges(&self, id: VertexId) -> u32 {
        self.degree_of(self.extent(id, EdgeKind::Out))
    }

    /// Total degree of `id`: in-degree plus out-degree for a directed graph,
    /// the plain degree for an undirected one.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn degree(&self, id: VertexId) -> u32 {
        if self.directed {
            self.num_in_edges(id) + self.num_out_edges(id)
        } else {
            self.num_in_edges(id)
        }
    }

    fn degree_of(&self, extent: VertexExtent) -> u32 {
        (extent.size - 4) / (4 + self.edge_data_size)
    }
}

/// Writes an index file for records of the given sizes, laid out
/// back-to-back starting right after the graph header.
///
/// `record_sizes` must be in record order: one entry per vertex for an
/// undirected graph, the in-record then the out-record per vertex for a
/// directed one.
pub fn write_index(
    path: impl AsRef<Path>,
    directed: bool,
    num_vertices: u32,
    record_sizes: &[u32],
    layout: IndexLayout,
) -> Result<()> {
    let path = path.as_ref();
    let expected = if directed {
        2 * num_vertices as usize
    } else {
        num_vertices as usize
    };
    ensure!(
        record_sizes.len() == expected,
        "Expected {expected} record sizes, got {}",
        record_sizes.len()
    );

    let f = std::fs::File::create(path)
        .with_context(|| format!("Cannot create index file {}", path.display()))?;
    let mut w = BufWriter::new(f);

    let mut buf = [0u8; INDEX_HEADER_SIZE];
    buf[0..8].copy_from_slice(&INDEX_MAGIC.to_le_bytes());
    buf[8..12].copy_from_slice(&INDEX_VERSION.to_le_bytes());
    let layout_tag: u32 = match layout {
        IndexLayout::Explicit => 0,
        IndexLayout::Compressed => 1,
    };
    buf[12..16].copy_from_slice(&layout_tag.to_le_bytes());
    buf[16..20].copy_from_slice(&num_vertices.to_le_bytes());
    let flags: u32 = if directed { FLAG_DIRECTED } else { 0 };
    buf[20..24].copy_from_slice(&flags.to_le_bytes());
    w.write_all(&buf).context("Cannot write index header")?;

    match layout {
        IndexLayout::Explicit => {
            let mut offset = GRAPH_HEADER_SIZE as u64;
            for &size in record_sizes {
                w.write_all(&offset.to_le_bytes())?;
                w.write_all(&size.to_le_bytes())?;
                offset += size as u64;
            }
        }
        IndexLayout::Compressed => {
            // One offset per record plus the trailing sentinel.
            let num_entries = record_sizes.len() + 1;
            let mut offsets = Vec::with_capacity(num_entries);
            let mut offset = GRAPH_HEADER_SIZE as u64;
            for &size in record_sizes {
                offsets.push(offset);
                offset += size as u64;
            }
            offsets.push(offset);

            let num_blocks = num_entries.div_ceil(BLOCK_LEN);
            for block in 0..num_blocks {
                w.write_all(&offsets[block * BLOCK_LEN].to_le_bytes())?;
            }
            for (entry, &off) in offsets.iter().enumerate() {
                let delta = off - offsets[(entry / BLOCK_LEN) * BLOCK_LEN];
                let delta: u32 = delta
                    .try_into()
                    .context("Block spans more than 4 GiB of adjacency data")?;
                w.write_all(&delta.to_le_bytes())?;
            }
        }
    }

    w.flush().context("Cannot flush index file")?;
    Ok(())
}
