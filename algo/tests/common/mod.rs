/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Shared fixtures: on-disk graphs built into a temporary directory.

use anyhow::Result;
use semgraph::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

pub fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> GraphConfig {
    GraphConfig::default().num_workers(3)
}

pub struct TestGraph {
    // Keeps the files alive for the duration of the test.
    _dir: TempDir,
    pub graph: PathBuf,
    pub index: PathBuf,
}

pub fn build_graph(
    num_vertices: u32,
    arcs: &[(VertexId, VertexId)],
    directed: bool,
) -> Result<TestGraph> {
    let dir = tempfile::tempdir()?;
    let graph = dir.path().join("g.graph");
    let index = dir.path().join("g.index");
    let mut builder = if directed {
        GraphBuilder::directed(num_vertices)
    } else {
        GraphBuilder::undirected(num_vertices)
    };
    builder.add_arcs(arcs.iter().copied());
    builder.write(&graph, &index, IndexLayout::Explicit)?;
    Ok(TestGraph {
        _dir: dir,
        graph,
        index,
    })
}
