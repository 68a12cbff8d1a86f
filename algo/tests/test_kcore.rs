/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod common;

use anyhow::Result;
use common::{build_graph, config, init_log};
use semgraph_algo::kcore::kcore;

#[test]
fn test_cycle_survives_k2_isolate_deleted() -> Result<()> {
    init_log();
    // 3-cycle 0 -> 1 -> 2 -> 0 plus isolate 3; k = 2.
    let g = build_graph(4, &[(0, 1), (1, 2), (2, 0)], true)?;
    let survives = kcore(&g.graph, &g.index, config(), 2, Some(2))?;
    assert_eq!(survives, [true, true, true, false]);
    Ok(())
}

#[test]
fn test_pendant_chain_peels_off() -> Result<()> {
    init_log();
    // Triangle {0, 1, 2} with a chain 2 - 3 - 4 hanging off it.
    let g = build_graph(5, &[(0, 1), (1, 2), (0, 2), (2, 3), (3, 4)], false)?;
    let survives = kcore(&g.graph, &g.index, config(), 2, Some(2))?;
    // The cascade removes 4, then 3; the triangle is the 2-core.
    assert_eq!(survives, [true, true, true, false, false]);
    Ok(())
}

#[test]
fn test_sweep_to_max_degree_empties_the_graph() -> Result<()> {
    init_log();
    // No subgraph of a triangle has minimum degree 3.
    let g = build_graph(3, &[(0, 1), (1, 2), (0, 2)], false)?;
    let survives = kcore(&g.graph, &g.index, config(), 2, None)?;
    // kmax defaults to the max degree (2); the triangle is a 2-core.
    assert_eq!(survives, [true, true, true]);

    let survives = kcore(&g.graph, &g.index, config(), 2, Some(3))?;
    assert_eq!(survives, [false, false, false]);
    Ok(())
}

#[test]
fn test_two_nested_cores() -> Result<()> {
    init_log();
    // K4 {0, 1, 2, 3} with a 4-cycle {3, 4, 5, 6} sharing vertex 3.
    let arcs = [
        (0, 1),
        (0, 2),
        (0, 3),
        (1, 2),
        (1, 3),
        (2, 3),
        (3, 4),
        (4, 5),
        (5, 6),
        (6, 3),
    ];
    let g = build_graph(7, &arcs, false)?;

    // Everything has degree at least 2.
    let survives = kcore(&g.graph, &g.index, config(), 2, Some(2))?;
    assert_eq!(survives, [true; 7]);

    // Only the K4 has minimum degree 3.
    let survives = kcore(&g.graph, &g.index, config(), 2, Some(3))?;
    assert_eq!(survives, [true, true, true, true, false, false, false]);
    Ok(())
}
