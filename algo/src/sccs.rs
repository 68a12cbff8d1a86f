/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Strongly connected components by trimming plus forward/backward
//! reachability.
//!
//! The driver alternates phases over one engine:
//!
//! 1. **Trim**: a live vertex with zero live in-degree or zero live
//!    out-degree is a singleton component; it removes itself and notifies
//!    its neighbors, whose degrees shrink, cascading until no vertex trims.
//! 2. **Pivot**: the smallest live vertex id becomes the pivot; a forward
//!    sweep over out-edges and a backward sweep over in-edges mark
//!    reachability. The intersection is the pivot's component, and since
//!    the pivot is the smallest live id, the component label is already the
//!    canonical minimum.
//!
//! The loop repeats until no live vertex remains. Component labels are
//! therefore always the minimum vertex id of the component.

use anyhow::Result;
use semgraph::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

const PHASE_TRIM: u8 = 0;
const PHASE_FORWARD: u8 = 1;
const PHASE_BACKWARD: u8 = 2;

/// The SCC descriptor; the driver switches its phase between runs.
#[derive(Default)]
pub struct Scc {
    phase: AtomicU8,
}

impl Scc {
    fn phase(&self) -> u8 {
        self.phase.load(Ordering::Acquire)
    }

    fn set_phase(&self, phase: u8) {
        self.phase.store(phase, Ordering::Release);
    }
}

/// One degree decrement, sent by a trimmed vertex to its neighbors.
#[derive(Debug, Clone, Copy)]
pub enum SccMessage {
    /// The sender was an in-neighbor of the destination.
    LostInNeighbor,
    /// The sender was an out-neighbor of the destination.
    LostOutNeighbor,
}

pub struct SccState {
    id: VertexId,
    component: VertexId,
    live_in: u32,
    live_out: u32,
    forward: bool,
    backward: bool,
}

impl SccState {
    /// The component label, or [`INVALID_VERTEX_ID`] while undecided.
    pub fn component(&self) -> VertexId {
        self.component
    }

    fn is_live(&self) -> bool {
        self.component == INVALID_VERTEX_ID
    }
}

impl ComputeVertex for SccState {
    fn vertex_id(&self) -> VertexId {
        self.id
    }
}

impl VertexAlgorithm for Scc {
    type State = SccState;
    type Message = SccMessage;
    type Program = ();

    fn init(&self, id: VertexId, index: &GraphIndex) -> SccState {
        SccState {
            id,
            component: INVALID_VERTEX_ID,
            live_in: index.num_in_edges(id),
            live_out: index.num_out_edges(id),
            forward: false,
            backward: false,
        }
    }

    fn new_program(&self) {}

    fn run(&self, state: &mut SccState, _program: &mut (), ctx: &mut RunContext<SccMessage>) {
        if !state.is_live() {
            return;
        }
        match self.phase() {
            PHASE_TRIM => {
                if state.live_in == 0 || state.live_out == 0 {
                    // Singleton component; the adjacency is needed to tell
                    // the neighbors.
                    state.component = state.id;
                    ctx.request_vertices(&[state.id]);
                }
            }
            PHASE_FORWARD => {
                if !state.forward {
                    state.forward = true;
                    ctx.request_partial_vertices(&[(state.id, EdgeKind::Out)]);
                }
            }
            PHASE_BACKWARD => {
                if !state.backward {
                    state.backward = true;
                    ctx.request_partial_vertices(&[(state.id, EdgeKind::In)]);
                }
            }
            phase => unreachable!("unknown phase {phase}"),
        }
    }

    fn run_on_vertex(
        &self,
        _state: &mut SccState,
        _program: &mut (),
        page: &PageVertex,
        ctx: &mut RunContext<SccMessage>,
    ) {
        match self.phase() {
            PHASE_TRIM => {
                // Out-neighbors lose an in-neighbor and vice versa.
                for neighbor in page.neighbors(EdgeKind::Out) {
                    ctx.send(neighbor, SccMessage::LostInNeighbor, true);
                }
                for neighbor in page.neighbors(EdgeKind::In) {
                    ctx.send(neighbor, SccMessage::LostOutNeighbor, true);
                }
            }
            PHASE_FORWARD => {
                for neighbor in page.neighbors(EdgeKind::Out) {
                    ctx.activate_next(neighbor);
                }
            }
            PHASE_BACKWARD => {
                for neighbor in page.neighbors(EdgeKind::In) {
                    ctx.activate_next(neighbor);
                }
            }
            phase => unreachable!("unknown phase {phase}"),
        }
    }

    fn run_on_message(
        &self,
        state: &mut SccState,
        _program: &mut (),
        _sender: VertexId,
        message: &SccMessage,
        _ctx: &mut RunContext<SccMessage>,
    ) {
        if !state.is_live() {
            return;
        }
        match message {
            SccMessage::LostInNeighbor => state.live_in = state.live_in.saturating_sub(1),
            SccMessage::LostOutNeighbor => state.live_out = state.live_out.saturating_sub(1),
        }
    }
}

/// Computes the strongly connected components; the result maps every vertex
/// to the minimum vertex id of its component.
pub fn sccs(
    graph_path: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    config: GraphConfig,
) -> Result<Vec<VertexId>> {
    let mut engine = GraphEngine::create(graph_path, index_path, config, Scc::default())?;
    let mut pivots = 0usize;

    loop {
        // Trim cascades until no vertex has a side with zero live degree.
        engine.algo().set_phase(PHASE_TRIM);
        engine.start_filtered(|s| s.is_live() && (s.live_in == 0 || s.live_out == 0))?;
        engine.wait_for_complete()?;

        let Some(pivot) = engine
            .map_states(|s| s.is_live())
            .iter()
            .position(|&live| live)
            .map(|p| p as VertexId)
        else {
            break;
        };

        // Forward sweep from the pivot over out-edges.
        engine.algo().set_phase(PHASE_FORWARD);
        engine.init_all_vertices(|s| {
            s.forward = false;
            s.backward = false;
        })?;
        engine.start(&[pivot])?;
        engine.wait_for_complete()?;

        // Backward sweep from the pivot over in-edges.
        engine.algo().set_phase(PHASE_BACKWARD);
        engine.start(&[pivot])?;
        engine.wait_for_complete()?;

        // The intersection is the pivot's component; the pivot is the
        // smallest live id, hence the canonical label.
        engine.init_all_vertices(move |s| {
            if s.is_live() && s.forward && s.backward {
                s.component = pivot;
            }
        })?;
        pivots += 1;
    }

    log::info!("SCC finished after {pivots} pivot rounds");
    Ok(engine.map_states(|s| s.component))
}
