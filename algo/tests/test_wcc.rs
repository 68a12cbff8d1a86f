/*
 * SPDX-FileCopyrightText: 2026 The semgraph authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod common;

use anyhow::Result;
use common::{build_graph, config, init_log};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use semgraph_algo::wcc::wcc;

#[test]
fn test_directed_cycle_plus_self_loop() -> Result<()> {
    init_log();
    // {0 -> 1, 1 -> 2, 2 -> 0, 3 -> 3}: two weak components.
    let g = build_graph(4, &[(0, 1), (1, 2), (2, 0), (3, 3)], true)?;
    let components = wcc(&g.graph, &g.index, config())?;
    assert_eq!(components, [0, 0, 0, 3]);
    Ok(())
}

#[test]
fn test_isolates_are_their_own_component() -> Result<()> {
    init_log();
    let g = build_graph(5, &[(1, 3)], false)?;
    let components = wcc(&g.graph, &g.index, config())?;
    assert_eq!(components, [0, 1, 2, 1, 4]);
    Ok(())
}

#[test]
fn test_repeated_runs_are_identical() -> Result<()> {
    init_log();
    let g = build_graph(
        8,
        &[(0, 4), (4, 6), (1, 5), (5, 7), (2, 3)],
        false,
    )?;
    let first = wcc(&g.graph, &g.index, config())?;
    let second = wcc(&g.graph, &g.index, config())?;
    // Labels are canonical (minimum id of the component), so two runs on an
    // immutable graph agree exactly.
    assert_eq!(first, second);
    assert_eq!(first, [0, 1, 2, 2, 0, 1, 0, 1]);
    Ok(())
}

/// Reference labeling by union-find.
fn reference_components(num_vertices: u32, arcs: &[(u32, u32)]) -> Vec<u32> {
    let mut parent: Vec<u32> = (0..num_vertices).collect();
    fn find(parent: &mut Vec<u32>, x: u32) -> u32 {
        if parent[x as usize] != x {
            let root = find(parent, parent[x as usize]);
            parent[x as usize] = root;
        }
        parent[x as usize]
    }
    for &(a, b) in arcs {
        let ra = find(&mut parent, a);
        let rb = find(&mut parent, b);
        if ra != rb {
            let (min, max) = (ra.min(rb), ra.max(rb));
            parent[max as usize] = min;
        }
    }
    (0..num_vertices).map(|v| find(&mut parent, v)).collect()
}

#[test]
fn test_random_graph_matches_union_find() -> Result<()> {
    init_log();
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let n = 64;
    let arcs: Vec<(u32, u32)> = (0..96)
        .map(|_| (rng.gen_range(0..n), rng.gen_range(0..n)))
        .filter(|(a, b)| a != b)
        .collect();

    let g = build_graph(n, &arcs, false)?;
    let components = wcc(&g.graph, &g.index, config())?;
    assert_eq!(components, reference_components(n, &arcs));
    Ok(())
}
