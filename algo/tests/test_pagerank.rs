/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod common;

use anyhow::Result;
use common::{build_graph, config, init_log};
use semgraph_algo::pagerank::pagerank;

#[test]
fn test_star_graph() -> Result<()> {
    init_log();
    // Star: center 0, leaves 1..9, undirected.
    let arcs: Vec<(u32, u32)> = (1..10).map(|leaf| (0, leaf)).collect();
    let g = build_graph(10, &arcs, false)?;
    let ranks = pagerank(&g.graph, &g.index, config(), 0.85, 30)?;

    // No dangling vertices, so the total rank is conserved at n.
    let total: f64 = ranks.iter().sum();
    assert!(
        (total - 10.0).abs() / 10.0 < 1e-4,
        "total rank {total} drifted"
    );

    // The center dominates every leaf, and the leaves are symmetric.
    for leaf in 1..10 {
        assert!(ranks[0] > ranks[leaf]);
        assert!((ranks[leaf] - ranks[1]).abs() < 1e-9);
    }
    Ok(())
}

#[test]
fn test_cycle_is_uniform() -> Result<()> {
    init_log();
    // Directed 4-cycle: every vertex has rank exactly 1.
    let g = build_graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)], true)?;
    let ranks = pagerank(&g.graph, &g.index, config(), 0.85, 30)?;
    for rank in ranks {
        assert!((rank - 1.0).abs() < 1e-9, "rank {rank} is not uniform");
    }
    Ok(())
}

#[test]
fn test_known_two_vertex_graph() -> Result<()> {
    init_log();
    // 0 <-> 1: symmetric, so both ranks converge to 1.
    let g = build_graph(2, &[(0, 1), (1, 0)], true)?;
    let ranks = pagerank(&g.graph, &g.index, config(), 0.5, 50)?;
    assert!((ranks[0] - 1.0).abs() < 1e-9);
    assert!((ranks[1] - 1.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_zero_iterations_keeps_initial_ranks() -> Result<()> {
    init_log();
    let g = build_graph(3, &[(0, 1), (1, 2)], true)?;
    let ranks = pagerank(&g.graph, &g.index, config(), 0.85, 0)?;
    assert_eq!(ranks, [1.0, 1.0, 1.0]);
    Ok(())
}

#[test]
fn test_rejects_bad_alpha() -> Result<()> {
    init_log();
    let g = build_graph(2, &[(0, 1)], false)?;
    assert!(pagerank(&g.graph, &g.index, config(), 1.0, 5).is_err());
    assert!(pagerank(&g.graph, &g.index, config(), -0.1, 5).is_err());
    Ok(())
}
