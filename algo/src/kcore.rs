/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! k-core decomposition by iterative deletion.
//!
//! For each k, every live vertex whose remaining degree is below k deletes
//! itself and multicasts the deletion to all neighbors, which decrement
//! their degree and re-check at the next level; the cascade runs until no
//! vertex is deleted. Vertices deleted at smaller k stay deleted, so the
//! outer loop from `kmin` upward peels the graph core by core, as in the
//! classic external-memory formulation.

use anyhow::Result;
use semgraph::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

/// The k-core descriptor. The current k is read at every callback, so one
/// engine can be reused for the whole `kmin..=kmax` sweep.
#[derive(Default)]
pub struct KCore {
    current_k: AtomicU32,
}

impl KCore {
    /// Sets the degree threshold for the next run.
    pub fn set_current_k(&self, k: u32) {
        self.current_k.store(k, Ordering::Release);
    }

    fn k(&self) -> u32 {
        self.current_k.load(Ordering::Acquire)
    }
}

pub struct KCoreState {
    id: VertexId,
    deleted: bool,
    degree: u32,
}

impl KCoreState {
    /// True if the vertex was peeled off.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// The remaining degree among live vertices.
    pub fn degree(&self) -> u32 {
        self.degree
    }
}

impl ComputeVertex for KCoreState {
    fn vertex_id(&self) -> VertexId {
        self.id
    }
}

impl VertexAlgorithm for KCore {
    type State = KCoreState;
    type Message = ();
    type Program = ();

    fn init(&self, id: VertexId, index: &GraphIndex) -> KCoreState {
        KCoreState {
            id,
            deleted: false,
            degree: index.degree(id),
        }
    }

    fn new_program(&self) {}

    fn run(&self, state: &mut KCoreState, _program: &mut (), ctx: &mut RunContext<()>) {
        if state.deleted || state.degree >= self.k() {
            return;
        }
        ctx.request_vertices(&[state.id]);
    }

    fn run_on_vertex(
        &self,
        state: &mut KCoreState,
        _program: &mut (),
        page: &PageVertex,
        ctx: &mut RunContext<()>,
    ) {
        if state.deleted || state.degree >= self.k() {
            return;
        }
        state.deleted = true;
        // Every neighbor, regardless of edge direction, loses one degree.
        ctx.multicast(page.neighbors(EdgeKind::Both), (), true);
    }

    fn run_on_message(
        &self,
        state: &mut KCoreState,
        _program: &mut (),
        _sender: VertexId,
        _message: &(),
        _ctx: &mut RunContext<()>,
    ) {
        if !state.deleted {
            state.degree = state.degree.saturating_sub(1);
        }
    }
}

/// Counts deleted vertices; the k-core driver runs it after every sweep.
#[derive(Clone, Default)]
pub struct CountDeleted {
    num: usize,
}

impl CountDeleted {
    /// Number of deleted vertices observed.
    pub fn num(&self) -> usize {
        self.num
    }
}

impl VertexQuery<KCore> for CountDeleted {
    fn run(&mut self, _ctx: &QueryContext, state: &KCoreState) {
        if state.is_deleted() {
            self.num += 1;
        }
    }

    fn merge(&mut self, other: Self) {
        self.num += other.num;
    }
}

/// Finds the maximum degree in the graph, used as the default `kmax`.
#[derive(Clone, Default)]
pub struct MaxDegree {
    max: u32,
}

impl MaxDegree {
    /// The maximum degree observed.
    pub fn max(&self) -> u32 {
        self.max
    }
}

impl VertexQuery<KCore> for MaxDegree {
    fn run(&mut self, ctx: &QueryContext, state: &KCoreState) {
        self.max = self.max.max(ctx.degree(state.vertex_id()));
    }

    fn merge(&mut self, other: Self) {
        self.max = self.max.max(other.max);
    }
}

/// Peels the graph from `kmin` up to `kmax` (the maximum degree if `None`)
/// and returns, per vertex, true if it survives the final core.
pub fn kcore(
    graph_path: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    config: GraphConfig,
    kmin: u32,
    kmax: Option<u32>,
) -> Result<Vec<bool>> {
    let mut engine = GraphEngine::create(graph_path, index_path, config, KCore::default())?;

    let kmax = match kmax {
        Some(k) => k,
        None => {
            let mut query = MaxDegree::default();
            engine.query_on_all(&mut query);
            log::info!("Using max degree {} as kmax", query.max());
            query.max()
        }
    };

    for k in kmin..=kmax {
        engine.algo().set_current_k(k);
        engine.start_filtered(|state| !state.deleted && state.degree < k)?;
        engine.wait_for_complete()?;

        let mut query = CountDeleted::default();
        engine.query_on_all(&mut query);
        log::info!(
            "{k}-core: {} vertices deleted so far",
            query.num()
        );
    }

    Ok(engine.map_states(|s| !s.deleted))
}
