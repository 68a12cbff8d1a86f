/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Breadth-first search.
//!
//! A vertex discovered at level *d* records depth *d* and activates its
//! still-undiscovered neighbors for level *d* + 1; the engine's level
//! counter doubles as the distance. No messages are needed, only
//! activations.

use anyhow::Result;
use semgraph::prelude::*;
use std::path::Path;

/// Depth of vertices the search never reached.
pub const UNVISITED: u32 = u32::MAX;

/// The breadth-first search descriptor.
pub struct Bfs {
    /// Which edges to follow: [`EdgeKind::Out`] for a forward search on a
    /// directed graph, [`EdgeKind::Both`] to ignore direction.
    pub kind: EdgeKind,
}

pub struct BfsState {
    id: VertexId,
    depth: u32,
}

impl BfsState {
    /// Distance from the nearest root, or [`UNVISITED`].
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub(crate) fn reset(&mut self) {
        self.depth = UNVISITED;
    }
}

impl ComputeVertex for BfsState {
    fn vertex_id(&self) -> VertexId {
        self.id
    }
}

impl VertexAlgorithm for Bfs {
    type State = BfsState;
    type Message = ();
    type Program = ();

    fn init(&self, id: VertexId, _index: &GraphIndex) -> BfsState {
        BfsState {
            id,
            depth: UNVISITED,
        }
    }

    fn new_program(&self) {}

    fn run(&self, state: &mut BfsState, _program: &mut (), ctx: &mut RunContext<()>) {
        if state.depth != UNVISITED {
            // Activated again through another edge after discovery.
            return;
        }
        state.depth = ctx.level() as u32;
        ctx.request_partial_vertices(&[(state.id, self.kind)]);
    }

    fn run_on_vertex(
        &self,
        _state: &mut BfsState,
        _program: &mut (),
        page: &PageVertex,
        ctx: &mut RunContext<()>,
    ) {
        for neighbor in page.neighbors(self.kind) {
            ctx.activate_next(neighbor);
        }
    }

    fn run_on_message(
        &self,
        _state: &mut BfsState,
        _program: &mut (),
        _sender: VertexId,
        _message: &(),
        _ctx: &mut RunContext<()>,
    ) {
    }
}

/// Runs a breadth-first search from `roots` and returns the depth of every
/// vertex ([`UNVISITED`] for unreached ones).
pub fn bfs(
    graph_path: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    config: GraphConfig,
    roots: &[VertexId],
    kind: EdgeKind,
) -> Result<Vec<u32>> {
    let mut engine = GraphEngine::create(graph_path, index_path, config, Bfs { kind })?;
    engine.start(roots)?;
    let outcome = engine.wait_for_complete()?;
    let depths = engine.map_states(|s| s.depth);
    let visited = depths.iter().filter(|&&d| d != UNVISITED).count();
    log::info!(
        "BFS from {} roots visited {visited} vertices in {} levels",
        roots.len(),
        outcome.levels()
    );
    Ok(depths)
}
