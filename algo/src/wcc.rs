/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Weakly connected components by label propagation.
//!
//! Every vertex starts with its own id as component label and repeatedly
//! broadcasts its label over all edges (ignoring direction); a vertex
//! adopting a smaller label rebroadcasts at the next level. At the
//! fixpoint each component carries the minimum vertex id it contains, which
//! makes the labeling canonical.

use anyhow::Result;
use semgraph::prelude::*;
use std::path::Path;

/// The weakly-connected-components descriptor.
pub struct Wcc;

pub struct WccState {
    id: VertexId,
    component: VertexId,
    updated: bool,
}

impl WccState {
    /// The component label: the minimum vertex id in the component once the
    /// run has completed.
    pub fn component(&self) -> VertexId {
        self.component
    }
}

impl ComputeVertex for WccState {
    fn vertex_id(&self) -> VertexId {
        self.id
    }
}

impl VertexAlgorithm for Wcc {
    type State = WccState;
    type Message = VertexId;
    type Program = ();

    fn init(&self, id: VertexId, _index: &GraphIndex) -> WccState {
        WccState {
            id,
            component: id,
            updated: true,
        }
    }

    fn new_program(&self) {}

    fn run(&self, state: &mut WccState, _program: &mut (), ctx: &mut RunContext<VertexId>) {
        if !state.updated {
            return;
        }
        state.updated = false;
        ctx.request_vertices(&[state.id]);
    }

    fn run_on_vertex(
        &self,
        state: &mut WccState,
        _program: &mut (),
        page: &PageVertex,
        ctx: &mut RunContext<VertexId>,
    ) {
        ctx.multicast(page.neighbors(EdgeKind::Both), state.component, true);
    }

    fn run_on_message(
        &self,
        state: &mut WccState,
        _program: &mut (),
        _sender: VertexId,
        message: &VertexId,
        _ctx: &mut RunContext<VertexId>,
    ) {
        if *message < state.component {
            state.component = *message;
            state.updated = true;
        }
    }
}

/// Computes the weakly connected components; the result maps every vertex
/// to the minimum vertex id of its component.
pub fn wcc(
    graph_path: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    config: GraphConfig,
) -> Result<Vec<VertexId>> {
    let mut engine = GraphEngine::create(graph_path, index_path, config, Wcc)?;
    engine.start_all()?;
    let outcome = engine.wait_for_complete()?;
    let components = engine.map_states(|s| s.component);
    let mut roots: Vec<VertexId> = components
        .iter()
        .copied()
        .filter(|&c| components[c as usize] == c)
        .collect();
    roots.sort_unstable();
    roots.dedup();
    log::info!(
        "WCC found {} components in {} levels",
        roots.len(),
        outcome.levels()
    );
    Ok(components)
}
