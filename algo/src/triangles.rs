/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Undirected triangle counting.
//!
//! Each vertex v fetches its own adjacency, keeps the neighbors with a
//! larger id, and then requests *their* adjacency; a triangle v < u < w is
//! counted exactly once, at v, when w shows up both among v's kept
//! neighbors and in u's list. This is the node-iterator scheme; the
//! cross-vertex adjacency requests are what the engine's request routing
//! exists for.
//!
//! Per-worker triangle totals accumulate in the vertex programs and are
//! merged by the driver.

use anyhow::{ensure, Result};
use semgraph::prelude::*;
use std::path::Path;

/// The triangle-counting descriptor.
pub struct Triangles;

pub struct TriangleState {
    id: VertexId,
    /// Neighbors with id greater than ours, ascending.
    higher: Vec<VertexId>,
}

impl ComputeVertex for TriangleState {
    fn vertex_id(&self) -> VertexId {
        self.id
    }
}

/// Per-worker triangle counter.
#[derive(Default)]
pub struct TriangleProgram {
    triangles: u64,
}

impl TriangleProgram {
    /// Triangles counted by this worker.
    pub fn triangles(&self) -> u64 {
        self.triangles
    }
}

impl VertexAlgorithm for Triangles {
    type State = TriangleState;
    type Message = ();
    type Program = TriangleProgram;

    fn init(&self, id: VertexId, _index: &GraphIndex) -> TriangleState {
        TriangleState {
            id,
            higher: Vec::new(),
        }
    }

    fn new_program(&self) -> TriangleProgram {
        TriangleProgram::default()
    }

    fn run(&self, state: &mut TriangleState, _program: &mut TriangleProgram, ctx: &mut RunContext<()>) {
        ctx.request_vertices(&[state.id]);
    }

    fn run_on_vertex(
        &self,
        state: &mut TriangleState,
        program: &mut TriangleProgram,
        page: &PageVertex,
        ctx: &mut RunContext<()>,
    ) {
        if page.id() == state.id {
            // First response: our own adjacency. Keep the upper neighborhood
            // and pull those vertices' lists.
            state.higher = page
                .neighbors(EdgeKind::Both)
                .filter(|&n| n > state.id)
                .collect();
            if !state.higher.is_empty() {
                let requests = state.higher.clone();
                ctx.request_vertices(&requests);
            }
        } else {
            // A neighbor u's adjacency: count w > u present in both lists.
            let u = page.id();
            program.triangles += sorted_intersection_above(
                state.higher.iter().copied(),
                page.neighbors(EdgeKind::Both),
                u,
            );
        }
    }

    fn run_on_message(
        &self,
        _state: &mut TriangleState,
        _program: &mut TriangleProgram,
        _sender: VertexId,
        _message: &(),
        _ctx: &mut RunContext<()>,
    ) {
    }
}

/// Counts common elements of two ascending sequences that are greater than
/// `above`.
fn sorted_intersection_above(
    a: impl Iterator<Item = VertexId>,
    b: impl Iterator<Item = VertexId>,
    above: VertexId,
) -> u64 {
    let mut a = a.skip_while(|&x| x <= above).peekable();
    let mut b = b.skip_while(|&x| x <= above).peekable();
    let mut count = 0;
    while let (Some(&x), Some(&y)) = (a.peek(), b.peek()) {
        match x.cmp(&y) {
            std::cmp::Ordering::Less => {
                a.next();
            }
            std::cmp::Ordering::Greater => {
                b.next();
            }
            std::cmp::Ordering::Equal => {
                count += 1;
                a.next();
                b.next();
            }
        }
    }
    count
}

/// Counts the triangles of an undirected graph.
pub fn count_triangles(
    graph_path: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    config: GraphConfig,
) -> Result<u64> {
    let mut engine = GraphEngine::create(graph_path, index_path, config, Triangles)?;
    ensure!(
        !engine.is_directed(),
        "triangle counting expects an undirected graph"
    );
    engine.start_all()?;
    engine.wait_for_complete()?;
    let total = engine
        .vertex_programs()
        .iter()
        .map(|p| p.triangles())
        .sum();
    log::info!("{total} triangles");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_intersection_above() {
        let a = [1, 3, 5, 7, 9];
        let b = [2, 3, 5, 9, 11];
        assert_eq!(
            sorted_intersection_above(a.iter().copied(), b.iter().copied(), 0),
            3
        );
        assert_eq!(
            sorted_intersection_above(a.iter().copied(), b.iter().copied(), 3),
            2
        );
        assert_eq!(
            sorted_intersection_above(a.iter().copied(), b.iter().copied(), 9),
            0
        );
    }
}
