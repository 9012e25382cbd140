use std::sync::{LazyLock, Mutex};

use dtruss::{Decomposition, EdgeStore};
use flexi_logger::LoggerHandle;
use rand::Rng;
use scopeguard::{OnUnwind, ScopeGuard};

pub mod dumb;
pub mod slow_order;

#[allow(dead_code)]
pub static LOGGER: LazyLock<Mutex<LoggerHandle>> =
    LazyLock::new(|| Mutex::new(dtruss::logging::start("info").unwrap()));

#[allow(dead_code)]
pub fn init_logger() {
    let _ = &*LOGGER;
}

/// Logs the value if the test panics while it is alive.
#[allow(dead_code)]
pub fn guard<T: std::fmt::Debug>(t: T) -> ScopeGuard<T, impl FnOnce(T), OnUnwind> {
    scopeguard::guard_on_unwind(t, |t| log::error!("Crash with {t:?}"))
}

/// A random directed edge (u, v) with u != v.
#[allow(dead_code)]
pub fn random_edge(rng: &mut impl Rng, n: usize) -> (usize, usize) {
    let u = rng.gen_range(0..n);
    let mut v = rng.gen_range(0..n - 1);
    if v >= u {
        v += 1;
    }
    (u, v)
}

/// m distinct random edges over n vertices, in random order.
#[allow(dead_code)]
pub fn random_graph(rng: &mut impl Rng, n: usize, m: usize) -> Vec<(usize, usize)> {
    assert!(m <= n * (n - 1));
    let mut seen = std::collections::BTreeSet::new();
    let mut edges = vec![];
    while edges.len() < m {
        let e = random_edge(rng, n);
        if seen.insert(e) {
            edges.push(e);
        }
    }
    edges
}

/// Store holding `edges` with ids in sorted endpoint order.
#[allow(dead_code)]
pub fn store_of(n: usize, edges: &[(usize, usize)], capacity: usize) -> EdgeStore {
    let mut sorted = edges.to_vec();
    sorted.sort_unstable();
    EdgeStore::from_edges(n, capacity, &sorted).unwrap()
}

#[allow(dead_code)]
pub fn decompose(n: usize, edges: &[(usize, usize)]) -> Decomposition {
    Decomposition::new(store_of(n, edges, edges.len()))
}

/// Truss numbers of every edge qualifying at `level`, from a fresh decomposition.
#[allow(dead_code)]
pub fn static_snapshot(decomp: &Decomposition, level: usize) -> Vec<((usize, usize), u32)> {
    let store = decomp.store();
    let mut all: Vec<_> = store
        .edges()
        .filter(|&(e, _)| decomp.qualifies(level, e))
        .map(|(e, ends)| (ends, decomp.truss(level, e)))
        .collect();
    all.sort_unstable();
    all
}
