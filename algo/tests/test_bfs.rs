/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod common;

use anyhow::Result;
use common::{build_graph, config, init_log};
use semgraph::prelude::*;
use semgraph_algo::bfs::{bfs, UNVISITED};

#[test]
fn test_line_graph_depths() -> Result<()> {
    init_log();
    // Line 0 - 1 - 2 - 3 - 4, undirected.
    let g = build_graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4)], false)?;
    let depths = bfs(&g.graph, &g.index, config(), &[0], EdgeKind::Out)?;
    assert_eq!(depths, [0, 1, 2, 3, 4]);
    assert_eq!(depths.iter().filter(|&&d| d != UNVISITED).count(), 5);
    Ok(())
}

#[test]
fn test_directed_respects_direction() -> Result<()> {
    init_log();
    // 0 -> 1 -> 2, 3 -> 2.
    let g = build_graph(4, &[(0, 1), (1, 2), (3, 2)], true)?;

    let depths = bfs(&g.graph, &g.index, config(), &[0], EdgeKind::Out)?;
    assert_eq!(depths, [0, 1, 2, UNVISITED]);

    // Backward search over in-edges from 2 reaches everything.
    let depths = bfs(&g.graph, &g.index, config(), &[2], EdgeKind::In)?;
    assert_eq!(depths, [2, 1, 0, 1]);
    Ok(())
}

#[test]
fn test_multiple_roots() -> Result<()> {
    init_log();
    let g = build_graph(4, &[(0, 1), (1, 2), (3, 2)], true)?;
    let depths = bfs(&g.graph, &g.index, config(), &[0, 3], EdgeKind::Out)?;
    assert_eq!(depths, [0, 1, 1, 0]);
    Ok(())
}

#[test]
fn test_disconnected_vertices_stay_unvisited() -> Result<()> {
    init_log();
    let g = build_graph(6, &[(0, 1), (1, 2), (4, 5)], false)?;
    let depths = bfs(&g.graph, &g.index, config(), &[0], EdgeKind::Both)?;
    assert_eq!(depths[0..3], [0, 1, 2]);
    assert_eq!(depths[3], UNVISITED);
    assert_eq!(depths[4], UNVISITED);
    assert_eq!(depths[5], UNVISITED);
    Ok(())
}
