/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod common;

use anyhow::Result;
use common::{build_graph, config, init_log};
use semgraph_algo::sccs::sccs;

#[test]
fn test_one_way_bipartite_is_all_singletons() -> Result<()> {
    init_log();
    // K{3,3} with all edges from {0, 1, 2} to {3, 4, 5}: no cycles, so six
    // singleton components.
    let mut arcs = Vec::new();
    for left in 0..3 {
        for right in 3..6 {
            arcs.push((left, right));
        }
    }
    let g = build_graph(6, &arcs, true)?;
    let components = sccs(&g.graph, &g.index, config())?;
    assert_eq!(components, [0, 1, 2, 3, 4, 5]);
    Ok(())
}

#[test]
fn test_cycle_is_one_component() -> Result<()> {
    init_log();
    // 3-cycle plus an isolate.
    let g = build_graph(4, &[(0, 1), (1, 2), (2, 0)], true)?;
    let components = sccs(&g.graph, &g.index, config())?;
    assert_eq!(components, [0, 0, 0, 3]);
    Ok(())
}

#[test]
fn test_two_cycles_bridged_one_way() -> Result<()> {
    init_log();
    // Cycle {0, 1, 2}, cycle {3, 4, 5}, bridge 2 -> 3: the bridge does not
    // merge them.
    let arcs = [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3), (2, 3)];
    let g = build_graph(6, &arcs, true)?;
    let components = sccs(&g.graph, &g.index, config())?;
    assert_eq!(components, [0, 0, 0, 3, 3, 3]);
    Ok(())
}

#[test]
fn test_self_loop_is_its_own_component() -> Result<()> {
    init_log();
    // 0 -> 1 -> 2 -> 0, 3 -> 3.
    let g = build_graph(4, &[(0, 1), (1, 2), (2, 0), (3, 3)], true)?;
    let components = sccs(&g.graph, &g.index, config())?;
    assert_eq!(components, [0, 0, 0, 3]);
    Ok(())
}

#[test]
fn test_chain_of_singletons() -> Result<()> {
    init_log();
    let g = build_graph(4, &[(0, 1), (1, 2), (2, 3)], true)?;
    let components = sccs(&g.graph, &g.index, config())?;
    assert_eq!(components, [0, 1, 2, 3]);
    Ok(())
}
