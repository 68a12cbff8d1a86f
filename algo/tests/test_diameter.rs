/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod common;

use anyhow::Result;
use common::{build_graph, config, init_log};
use semgraph::prelude::*;
use semgraph_algo::diameter::estimate_diameter;

#[test]
fn test_line_graph_diameter() -> Result<()> {
    init_log();
    // Line 0 - 1 - 2 - 3 - 4: diameter 4, found even when starting from
    // the middle thanks to the double sweep.
    let g = build_graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4)], false)?;
    let estimate = estimate_diameter(&g.graph, &g.index, config(), 3, 2, EdgeKind::Both)?;
    assert_eq!(estimate, 4);
    Ok(())
}

#[test]
fn test_single_probe_lower_bound() -> Result<()> {
    init_log();
    let g = build_graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4)], false)?;
    // One probe from the middle only sees eccentricity 2.
    let estimate = estimate_diameter(&g.graph, &g.index, config(), 1, 2, EdgeKind::Both)?;
    assert_eq!(estimate, 2);
    Ok(())
}

#[test]
fn test_cycle_diameter() -> Result<()> {
    init_log();
    // 6-cycle: eccentricity of every vertex is 3.
    let arcs = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)];
    let g = build_graph(6, &arcs, false)?;
    let estimate = estimate_diameter(&g.graph, &g.index, config(), 4, 0, EdgeKind::Both)?;
    assert_eq!(estimate, 3);
    Ok(())
}
