use std::collections::BTreeSet;

use common::{decompose, dumb::Dumb, guard, init_logger, random_edge, static_snapshot};
use dtruss::io::{encode_index, read_index, write_index, write_index_file};
use dtruss::{DynamicTruss, Maintainer, MaintainerConfig, TrussError};
use rand::prelude::*;

mod common;

type Edge = (usize, usize);

fn config(level: usize, capacity: usize) -> MaintainerConfig {
    MaintainerConfig {
        level,
        capacity: Some(capacity),
        ..Default::default()
    }
}

fn maintainer(n: usize, edges: &[Edge], config: MaintainerConfig) -> Maintainer {
    let m = Maintainer::from_decomposition(&decompose(n, edges), config).unwrap();
    m.check_invariants();
    m
}

/// Truss numbers from scratch over the live graph of `m`.
fn fresh_snapshot(m: &Maintainer) -> Vec<(Edge, u32)> {
    let edges: Vec<_> = m.store().edges().map(|(_, ends)| ends).collect();
    static_snapshot(&decompose(m.store().n(), &edges), m.level())
}

const CYCLE_WITH_PENDANT: [Edge; 4] = [(0, 1), (1, 2), (2, 0), (2, 3)];

#[test]
fn test_initial_state() {
    init_logger();
    let m = maintainer(4, &CYCLE_WITH_PENDANT, config(0, 8));
    assert_eq!(
        m.snapshot(),
        vec![((0, 1), 1), ((1, 2), 1), ((2, 0), 1), ((2, 3), 0)]
    );
    assert_eq!(m.truss(2, 3).unwrap(), 0);
    assert!(matches!(m.truss(3, 2), Err(TrussError::MissingEdge(3, 2))));
    let order: Vec<_> = m
        .order()
        .map(|e| m.store().get(e).unwrap())
        .collect();
    assert_eq!(order[0], (2, 3));
}

#[test]
fn test_insert_closing_flow() {
    let mut m = guard(maintainer(4, &CYCLE_WITH_PENDANT, config(0, 8)));
    let e = m.insert(3, 0).unwrap();
    m.check_invariants();
    assert_eq!(m.truss_of(e).unwrap(), 0);
    assert_eq!(m.snapshot(), fresh_snapshot(&m));

    let mut top = guard(maintainer(4, &CYCLE_WITH_PENDANT, config(1, 8)));
    assert!(top.snapshot().is_empty());
    top.insert(3, 0).unwrap();
    top.check_invariants();
    assert_eq!(
        top.snapshot(),
        vec![((2, 0), 0), ((2, 3), 0), ((3, 0), 0)]
    );
    top.remove(2, 3).unwrap();
    top.check_invariants();
    assert!(top.snapshot().is_empty());
}

#[test]
fn test_second_cycle() {
    // Two 3-cycles sharing (0, 1): 0->1->2->0 and 0->1->3->0.
    let mut m = guard(maintainer(4, &[(0, 1), (1, 2), (2, 0), (1, 3)], config(0, 10)));
    m.insert(3, 0).unwrap();
    m.check_invariants();
    assert_eq!(
        m.snapshot(),
        vec![((0, 1), 1), ((1, 2), 1), ((1, 3), 1), ((2, 0), 1), ((3, 0), 1)]
    );
    m.remove(0, 1).unwrap();
    m.check_invariants();
    assert!(m.snapshot().iter().all(|&(_, k)| k == 0));
}

#[test]
fn test_insert_then_remove() {
    let mut rng = StdRng::seed_from_u64(21);
    let edges = common::random_graph(&mut rng, 10, 45);
    let mut m = guard(maintainer(10, &edges, config(0, 90)));
    let before = m.snapshot();
    let mut added = vec![];
    while added.len() < 6 {
        let e = random_edge(&mut rng, 10);
        if m.store().find(e.0, e.1).is_none() && !added.contains(&e) {
            added.push(e);
        }
    }
    m.batch_insert(&added).unwrap();
    m.check_invariants();
    assert_eq!(m.snapshot(), fresh_snapshot(&m));
    m.batch_remove(&added).unwrap();
    m.check_invariants();
    assert_eq!(m.snapshot(), before);
}

#[test]
fn test_errors() {
    let mut m = guard(maintainer(4, &CYCLE_WITH_PENDANT, config(0, 5)));
    let before = m.snapshot();
    let err = |r: dtruss::Result<()>| r.unwrap_err();
    assert!(matches!(
        err(m.insert_edges(&[(3, 1), (0, 1)])),
        TrussError::DuplicateEdge(0, 1)
    ));
    assert!(matches!(
        err(m.insert_edges(&[(3, 1), (3, 1)])),
        TrussError::DuplicateEdge(3, 1)
    ));
    assert!(matches!(
        err(m.insert_edges(&[(2, 2)])),
        TrussError::SelfLoop(2)
    ));
    assert!(matches!(
        err(m.insert_edges(&[(0, 4)])),
        TrussError::VertexOutOfRange { vertex: 4, n: 4 }
    ));
    assert!(matches!(
        err(m.insert_edges(&[(3, 1), (1, 0)])),
        TrussError::CapacityExceeded(5)
    ));
    assert!(matches!(
        err(m.remove_edges(&[(0, 1), (1, 0)])),
        TrussError::MissingEdge(1, 0)
    ));
    assert!(matches!(
        err(m.remove_edges(&[(0, 1), (0, 1)])),
        TrussError::Invalid(_)
    ));
    m.check_invariants();
    assert_eq!(m.snapshot(), before);
    m.insert_edges(&[(3, 1)]).unwrap();
    assert!(matches!(
        err(m.insert_edges(&[(1, 0)])),
        TrussError::CapacityExceeded(5)
    ));
    m.remove_edges(&[(0, 1)]).unwrap();
    m.insert_edges(&[(1, 0)]).unwrap();
    m.check_invariants();
    assert_eq!(m.snapshot(), fresh_snapshot(&m));
}

#[test]
fn test_paths_agree() {
    let mut rng = StdRng::seed_from_u64(8);
    for level in 0..2 {
        let edges = common::random_graph(&mut rng, 9, 30);
        let mut batch = guard(maintainer(
            9,
            &edges,
            MaintainerConfig {
                batch_ratio: 0.0,
                ..config(level, 72)
            },
        ));
        let mut unit = guard(maintainer(
            9,
            &edges,
            MaintainerConfig {
                batch_ratio: 1e9,
                ..config(level, 72)
            },
        ));
        let present: BTreeSet<_> = edges.iter().copied().collect();
        let mut added = BTreeSet::new();
        while added.len() < 8 {
            let e = random_edge(&mut rng, 9);
            if !present.contains(&e) {
                added.insert(e);
            }
        }
        let added: Vec<_> = added.into_iter().collect();
        batch.insert_edges(&added).unwrap();
        unit.insert_edges(&added).unwrap();
        batch.check_invariants();
        unit.check_invariants();
        assert_eq!(batch.snapshot(), unit.snapshot());
        assert_eq!(batch.snapshot(), fresh_snapshot(&batch));
        let removed = &edges[..10];
        batch.remove_edges(removed).unwrap();
        unit.remove_edges(removed).unwrap();
        batch.check_invariants();
        unit.check_invariants();
        assert_eq!(batch.snapshot(), unit.snapshot());
        assert_eq!(batch.snapshot(), fresh_snapshot(&batch));
    }
}

fn compare_with_dumb(seed: u64, n: usize, level: usize, batch_ratio: f64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let m0 = rng.gen_range(n..3 * n);
    let edges = common::random_graph(&mut rng, n, m0);
    let mut m = guard(maintainer(
        n,
        &edges,
        MaintainerConfig {
            batch_ratio,
            ..config(level, n * (n - 1))
        },
    ));
    let mut dumb = Dumb::new(n, level, edges.iter().copied());
    assert_eq!(m.snapshot(), dumb.snapshot());
    for op in 0..60 {
        let live: Vec<_> = dumb.edges().collect();
        let size = rng.gen_range(1..4);
        if rng.gen_bool(0.55) && live.len() + size <= n * (n - 1) {
            let mut batch = BTreeSet::new();
            while batch.len() < size {
                let e = random_edge(&mut rng, n);
                if !live.contains(&e) {
                    batch.insert(e);
                }
            }
            let batch: Vec<_> = batch.into_iter().collect();
            log::trace!("op {op}: insert {batch:?}");
            m.insert_edges(&batch).unwrap();
            dumb.insert_edges(&batch).unwrap();
        } else if !live.is_empty() {
            let batch: Vec<_> = live
                .choose_multiple(&mut rng, size.min(live.len()))
                .copied()
                .collect();
            log::trace!("op {op}: remove {batch:?}");
            m.remove_edges(&batch).unwrap();
            dumb.remove_edges(&batch).unwrap();
        }
        m.check_invariants();
        assert_eq!(m.snapshot(), dumb.snapshot(), "seed {seed} op {op}");
    }
    for (v1, v2) in dumb.edges() {
        assert_eq!(m.truss(v1, v2).unwrap(), dumb.truss(v1, v2).unwrap());
    }
}

#[test]
fn test_cmp_level0_unit() {
    init_logger();
    for seed in 0..25 {
        compare_with_dumb(seed, 8, 0, 1e9);
    }
}

#[test]
fn test_cmp_level0_batch() {
    for seed in 100..125 {
        compare_with_dumb(seed, 8, 0, 0.0);
    }
}

#[test]
fn test_cmp_level0_dense() {
    for seed in 200..210 {
        compare_with_dumb(seed, 6, 0, 0.05);
    }
}

#[test]
fn test_cmp_level1() {
    for seed in 300..315 {
        compare_with_dumb(seed, 7, 1, 0.01);
    }
}

#[test]
fn test_cmp_level2() {
    for seed in 400..410 {
        compare_with_dumb(seed, 7, 2, 0.01);
    }
}

#[test]
fn test_load_index() {
    let mut rng = StdRng::seed_from_u64(31);
    let edges = common::random_graph(&mut rng, 11, 60);
    let d = decompose(11, &edges);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.bin");
    write_index(&path, &d).unwrap();
    for level in 0..d.layers().len() + 2 {
        let loaded = guard(Maintainer::load_index(&path, config(level, 120)).unwrap());
        loaded.check_invariants();
        assert_eq!(loaded.snapshot(), static_snapshot(&d, level), "level {level}");
        let built = Maintainer::from_decomposition(&d, config(level, 120)).unwrap();
        assert_eq!(
            loaded.order().collect::<Vec<_>>(),
            built.order().collect::<Vec<_>>()
        );
    }
    let mut m = guard(Maintainer::load_index(&path, MaintainerConfig::default()).unwrap());
    assert_eq!(m.store().capacity(), 120);
    let _ = m.insert_edges(&[random_edge(&mut rng, 11)]);
    m.check_invariants();
    assert_eq!(m.snapshot(), fresh_snapshot(&m));
}

#[test]
fn test_corrupt_index() {
    let d = decompose(3, &[(0, 1), (1, 2), (2, 0)]);
    let mut bytes = vec![];
    encode_index(&mut bytes, &d).unwrap();
    bytes[16..20].copy_from_slice(&5u32.to_le_bytes());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.bin");
    std::fs::write(&path, &bytes).unwrap();
    assert!(matches!(
        Maintainer::load_index(&path, MaintainerConfig::default()),
        Err(TrussError::CorruptIndex(_))
    ));
    assert!(matches!(
        Maintainer::load_index(dir.path().join("missing"), MaintainerConfig::default()),
        Err(TrussError::Io(_))
    ));
}

#[test]
fn test_one_flow_pass_per_update_set() {
    let mut rng = StdRng::seed_from_u64(41);
    let n = 40;
    let edges = common::random_graph(&mut rng, n, 300);
    let present: BTreeSet<_> = edges.iter().copied().collect();
    let mut added = BTreeSet::new();
    while added.len() < 20 {
        let e = random_edge(&mut rng, n);
        if !present.contains(&e) {
            added.insert(e);
        }
    }
    let added: Vec<_> = added.into_iter().collect();
    let unit_sized = |level| MaintainerConfig {
        batch_ratio: 1e9,
        ..config(level, 400)
    };

    let mut top = guard(maintainer(n, &edges, unit_sized(1)));
    assert_eq!(top.flow_passes(), 0);
    top.insert_edges(&added).unwrap();
    assert_eq!(top.flow_passes(), 1);
    top.check_invariants();
    assert_eq!(top.snapshot(), fresh_snapshot(&top));
    top.remove_edges(&edges[..15]).unwrap();
    assert_eq!(top.flow_passes(), 2);
    top.check_invariants();
    assert_eq!(top.snapshot(), fresh_snapshot(&top));

    let mut bottom = guard(maintainer(n, &edges, unit_sized(0)));
    bottom.insert_edges(&added).unwrap();
    bottom.remove_edges(&edges[..15]).unwrap();
    assert_eq!(bottom.flow_passes(), 0);
    assert_eq!(bottom.snapshot(), fresh_snapshot(&bottom));
}

#[test]
fn test_maintained_index() {
    let mut rng = StdRng::seed_from_u64(43);
    let edges = common::random_graph(&mut rng, 10, 40);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("maintained.bin");
    for level in 0..2 {
        let mut m = guard(maintainer(10, &edges, config(level, 90)));
        m.remove_edges(&edges[..5]).unwrap();
        let extra: Vec<_> = [(0, 9), (9, 0)]
            .into_iter()
            .filter(|e| !edges.contains(e))
            .collect();
        m.insert_edges(&extra).unwrap();
        let index = m.to_index();
        assert_eq!(index.layers.len(), 1);
        assert_eq!(index.layers[0].len(), m.store().m());
        write_index_file(&path, &index).unwrap();
        assert_eq!(read_index(&path).unwrap(), index);
        let mut listed: Vec<_> = index.layers[0][..m.order().count()]
            .iter()
            .map(|r| ((r.v1, r.v2), r.support))
            .collect();
        listed.sort_unstable();
        assert_eq!(listed, m.snapshot());
        assert!(index.layers[0][m.order().count()..]
            .iter()
            .all(|r| (r.support, r.remaining, r.surviving) == (0, 0, 0)));
        if level == 0 {
            let loaded = Maintainer::load_index(&path, config(0, 90)).unwrap();
            loaded.check_invariants();
            assert_eq!(loaded.snapshot(), m.snapshot());
            let ends = |t: &Maintainer| -> Vec<_> {
                t.order().map(|e| t.store().get(e).unwrap()).collect()
            };
            assert_eq!(ends(&loaded), ends(&m));
        }
    }
}

#[test]
fn test_group_cap_rejected() {
    let d = decompose(4, &CYCLE_WITH_PENDANT);
    for group_cap in [0, 1] {
        let config = MaintainerConfig {
            group_cap,
            ..Default::default()
        };
        assert!(matches!(
            Maintainer::from_decomposition(&d, config),
            Err(TrussError::Invalid(_))
        ));
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.bin");
    write_index(&path, &d).unwrap();
    let config = MaintainerConfig {
        group_cap: 1,
        ..Default::default()
    };
    assert!(matches!(
        Maintainer::load_index(&path, config),
        Err(TrussError::Invalid(_))
    ));
}

#[test]
fn test_huge_vertex_universe() {
    let d = decompose(3, &[(0, 1), (1, 2), (2, 0)]);
    let mut bytes = vec![];
    encode_index(&mut bytes, &d).unwrap();
    let n = u32::MAX - 1;
    bytes[0..4].copy_from_slice(&n.to_le_bytes());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.bin");
    std::fs::write(&path, &bytes).unwrap();
    let mut m = guard(Maintainer::load_index(&path, MaintainerConfig::default()).unwrap());
    assert_eq!(m.store().n(), n as usize);
    assert_eq!(m.snapshot(), vec![((0, 1), 1), ((1, 2), 1), ((2, 0), 1)]);
    m.insert_edges(&[(2, 5)]).unwrap();
    m.check_invariants();
    assert_eq!(m.truss(2, 5).unwrap(), 0);
    assert!(matches!(
        m.insert_edges(&[(2, n as usize)]),
        Err(TrussError::VertexOutOfRange { .. })
    ));
}
