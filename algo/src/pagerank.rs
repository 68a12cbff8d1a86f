/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! PageRank by synchronous push iterations.
//!
//! Ranks are normalized so they sum to the number of vertices: every vertex
//! starts at 1 and each iteration computes
//!
//! > *pr(v)* = (1 − α) + α · ∑ over *u* → *v* of *pr(u)* / outdeg(*u*).
//!
//! One engine level is one iteration: a vertex first folds the
//! contributions delivered at the level boundary into its rank, then
//! scatters its new rank over its out-edges. Contributions are accumulated
//! with Kahan summation, so the result does not depend on delivery order
//! beyond floating-point rounding of compensated sums.
//!
//! Dangling vertices keep their rank to themselves, as in the push-style
//! original; with no dangling vertices the total rank is conserved.

use anyhow::{ensure, Result};
use kahan::KahanSum;
use semgraph::prelude::*;
use std::path::Path;

/// The PageRank descriptor.
pub struct PageRank {
    /// Damping factor α, in `[0, 1)`.
    pub alpha: f64,
    /// Number of iterations.
    pub iterations: usize,
}

impl Default for PageRank {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            iterations: 30,
        }
    }
}

pub struct PageRankState {
    id: VertexId,
    rank: f64,
    acc: KahanSum<f64>,
    out_degree: u32,
}

impl PageRankState {
    /// The rank after the last completed iteration.
    pub fn rank(&self) -> f64 {
        self.rank
    }
}

impl ComputeVertex for PageRankState {
    fn vertex_id(&self) -> VertexId {
        self.id
    }
}

impl VertexAlgorithm for PageRank {
    type State = PageRankState;
    type Message = f64;
    type Program = ();

    fn init(&self, id: VertexId, index: &GraphIndex) -> PageRankState {
        PageRankState {
            id,
            rank: 1.0,
            acc: KahanSum::new(),
            out_degree: index.num_out_edges(id),
        }
    }

    fn new_program(&self) {}

    fn run(&self, state: &mut PageRankState, _program: &mut (), ctx: &mut RunContext<f64>) {
        let iteration = ctx.level();
        if iteration > 0 {
            state.rank = (1.0 - self.alpha) + self.alpha * state.acc.sum();
            state.acc = KahanSum::new();
        }
        if iteration < self.iterations {
            ctx.activate_next(state.id);
            if state.out_degree > 0 {
                let kind = if ctx.is_directed() {
                    EdgeKind::Out
                } else {
                    EdgeKind::Both
                };
                ctx.request_partial_vertices(&[(state.id, kind)]);
            }
        }
    }

    fn run_on_vertex(
        &self,
        state: &mut PageRankState,
        _program: &mut (),
        page: &PageVertex,
        ctx: &mut RunContext<f64>,
    ) {
        let share = state.rank / state.out_degree as f64;
        let kind = if ctx.is_directed() {
            EdgeKind::Out
        } else {
            EdgeKind::Both
        };
        ctx.multicast(page.neighbors(kind), share, false);
    }

    fn run_on_message(
        &self,
        state: &mut PageRankState,
        _program: &mut (),
        _sender: VertexId,
        message: &f64,
        _ctx: &mut RunContext<f64>,
    ) {
        state.acc += *message;
    }
}

/// Runs `iterations` PageRank iterations and returns the rank vector,
/// normalized to sum to the number of vertices.
pub fn pagerank(
    graph_path: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    config: GraphConfig,
    alpha: f64,
    iterations: usize,
) -> Result<Vec<f64>> {
    ensure!(
        (0.0..1.0).contains(&alpha),
        "The damping factor must be in [0, 1), got {alpha}"
    );
    let mut engine = GraphEngine::create(
        graph_path,
        index_path,
        config,
        PageRank { alpha, iterations },
    )?;
    engine.start_all()?;
    engine.wait_for_complete()?;

    let ranks = engine.map_states(|s| s.rank);
    let mut total = KahanSum::new();
    for &rank in &ranks {
        total += rank;
    }
    log::info!(
        "PageRank (alpha = {alpha}, {iterations} iterations): total rank {}",
        total.sum()
    );
    Ok(ranks)
}
