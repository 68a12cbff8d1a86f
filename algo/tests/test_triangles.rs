/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod common;

use anyhow::Result;
use common::{build_graph, config, init_log};
use semgraph_algo::triangles::count_triangles;

fn complete_graph_arcs(n: u32) -> Vec<(u32, u32)> {
    let mut arcs = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            arcs.push((i, j));
        }
    }
    arcs
}

#[test]
fn test_k4_has_four_triangles() -> Result<()> {
    init_log();
    let g = build_graph(4, &complete_graph_arcs(4), false)?;
    assert_eq!(count_triangles(&g.graph, &g.index, config())?, 4);
    Ok(())
}

#[test]
fn test_k5_has_ten_triangles() -> Result<()> {
    init_log();
    let g = build_graph(5, &complete_graph_arcs(5), false)?;
    assert_eq!(count_triangles(&g.graph, &g.index, config())?, 10);
    Ok(())
}

#[test]
fn test_trees_have_no_triangles() -> Result<()> {
    init_log();
    let g = build_graph(6, &[(0, 1), (0, 2), (1, 3), (1, 4), (2, 5)], false)?;
    assert_eq!(count_triangles(&g.graph, &g.index, config())?, 0);
    Ok(())
}

#[test]
fn test_triangle_with_pendant() -> Result<()> {
    init_log();
    // One triangle plus a pendant edge and an isolate.
    let g = build_graph(5, &[(0, 1), (1, 2), (0, 2), (2, 3)], false)?;
    assert_eq!(count_triangles(&g.graph, &g.index, config())?, 1);
    Ok(())
}

#[test]
fn test_rejects_directed_graphs() -> Result<()> {
    init_log();
    let g = build_graph(3, &[(0, 1), (1, 2)], true)?;
    assert!(count_triangles(&g.graph, &g.index, config()).is_err());
    Ok(())
}
