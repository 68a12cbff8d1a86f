/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Diameter estimation by breadth-first sweeps.
//!
//! Runs a bounded number of BFS probes: each probe starts from the vertex
//! the previous one found farthest away (the double-sweep heuristic), and
//! the estimate is the largest eccentricity observed. This is a lower
//! bound on the true diameter, tight on many real-world graphs after a
//! handful of sweeps.

use crate::bfs::{Bfs, UNVISITED};
use anyhow::{ensure, Result};
use semgraph::prelude::*;
use std::path::Path;

/// Estimates the diameter with `num_probes` breadth-first sweeps, starting
/// from `start`.
///
/// `kind` selects the traversal direction, typically [`EdgeKind::Both`]
/// for an undirected reading of the graph.
pub fn estimate_diameter(
    graph_path: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    config: GraphConfig,
    num_probes: usize,
    start: VertexId,
    kind: EdgeKind,
) -> Result<u32> {
    ensure!(num_probes >= 1, "at least one probe is required");
    let mut engine = GraphEngine::create(graph_path, index_path, config, Bfs { kind })?;

    let mut diameter = 0;
    let mut probe = start;
    for sweep in 0..num_probes {
        engine.init_all_vertices(|s| s.reset())?;
        engine.start(&[probe])?;
        engine.wait_for_complete()?;

        let mut farthest = probe;
        let mut eccentricity = 0;
        for (id, depth) in engine.map_states(|s| s.depth()).into_iter().enumerate() {
            if depth != UNVISITED && depth >= eccentricity {
                eccentricity = depth;
                farthest = id as VertexId;
            }
        }
        log::info!(
            "Sweep {sweep} from {probe}: eccentricity {eccentricity} at vertex {farthest}"
        );
        diameter = diameter.max(eccentricity);
        if farthest == probe {
            // The sweep cannot make further progress.
            break;
        }
        probe = farthest;
    }

    Ok(diameter)
}
