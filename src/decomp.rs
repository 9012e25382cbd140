//! Full D-truss decomposition: a flow peel fixing which edges qualify at each level, then a
//! cycle peel per level.

use crate::edge_store::{EdgeId, EdgeStore};

/// Edges grouped by current support. `ord[bin[s]..]` starts with the unpeeled edges of
/// support `s`; positions inside one bucket carry no meaning.
#[derive(Debug, Clone)]
pub struct BucketQueue {
    support: Vec<u32>,
    bin: Vec<usize>,
    pos: Vec<usize>,
    ord: Vec<EdgeId>,
}

impl BucketQueue {
    /// Counting-sorts `members` by `support`. Edges outside `members` are ignored.
    pub fn new(support: Vec<u32>, members: impl IntoIterator<Item = EdgeId>) -> Self {
        let members: Vec<EdgeId> = members.into_iter().collect();
        let max = members.iter().map(|&e| support[e]).max().unwrap_or(0) as usize;
        let mut bin = vec![0; max + 1];
        for &e in &members {
            bin[support[e] as usize] += 1;
        }
        let mut start = 0;
        for b in bin.iter_mut() {
            let cnt = *b;
            *b = start;
            start += cnt;
        }
        let mut pos = vec![0; support.len()];
        let mut ord = vec![0; members.len()];
        for &e in &members {
            let s = support[e] as usize;
            pos[e] = bin[s];
            ord[pos[e]] = e;
            bin[s] += 1;
        }
        // Scatter left every bin at the start of the next one.
        bin.rotate_right(1);
        bin[0] = 0;
        Self {
            support,
            bin,
            pos,
            ord,
        }
    }

    /// Number of queued edges.
    pub fn len(&self) -> usize {
        self.ord.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ord.is_empty()
    }

    pub fn support(&self, e: EdgeId) -> u32 {
        self.support[e]
    }

    /// Takes the edge at position `i`, which must be the front of its bucket.
    pub fn peel(&mut self, i: usize) -> EdgeId {
        let e = self.ord[i];
        let s = self.support[e] as usize;
        assert_eq!(self.bin[s], i, "peeling out of bucket order");
        self.bin[s] += 1;
        e
    }

    /// Moves `e` to the front of its bucket, closes it off and lowers its support by one.
    pub fn decrement(&mut self, e: EdgeId) {
        let s = self.support[e] as usize;
        let (pw, pe) = (self.bin[s], self.pos[e]);
        if pw != pe {
            let w = self.ord[pw];
            self.ord[pe] = w;
            self.pos[w] = pe;
            self.ord[pw] = e;
            self.pos[e] = pw;
        }
        self.bin[s] += 1;
        self.support[e] -= 1;
    }

    /// Final supports and the peeling order.
    pub fn into_parts(self) -> (Vec<u32>, Vec<EdgeId>) {
        (self.support, self.ord)
    }
}

/// Result of peeling one edge set. Arrays are indexed by edge id; `order` lists the peeled
/// edges only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layer {
    pub support: Vec<u32>,
    /// Witnesses whose partners were all peeled after the edge.
    pub remaining: Vec<u32>,
    /// Witnesses whose partners both ended with support at least the edge's own.
    pub surviving: Vec<u32>,
    pub order: Vec<EdgeId>,
}

impl Layer {
    /// Edges that took part in this layer.
    pub fn qualifies(&self, e: EdgeId) -> bool {
        self.order.contains(&e)
    }

    pub fn max_support(&self) -> u32 {
        self.order.iter().map(|&e| self.support[e]).max().unwrap_or(0)
    }
}

/// Cycle peel over the edges with `qualify[e]`.
pub fn peel_cycles(store: &EdgeStore, qualify: &[bool]) -> Layer {
    let l = store.capacity();
    let support = (0..l)
        .map(|e| {
            if qualify[e] {
                store.cycles_qualified(e, qualify).len() as u32
            } else {
                0
            }
        })
        .collect();
    let mut queue = BucketQueue::new(support, (0..l).filter(|&e| qualify[e]));
    let mut removed = vec![false; l];
    let mut remaining = vec![0; l];
    let mut surviving = vec![0; l];
    let mut c = 0;
    for i in 0..queue.len() {
        let e = queue.peel(i);
        c = c.max(queue.support(e));
        removed[e] = true;
        for (e1, e2) in store.cycles_qualified(e, qualify) {
            if queue.support(e1) >= c && queue.support(e2) >= c {
                surviving[e] += 1;
            }
            if removed[e1] || removed[e2] {
                continue;
            }
            remaining[e] += 1;
            for f in [e1, e2] {
                if queue.support(f) > c {
                    queue.decrement(f);
                }
            }
        }
    }
    let (support, order) = queue.into_parts();
    Layer {
        support,
        remaining,
        surviving,
        order,
    }
}

/// Flow peel over all live edges. A witness vertex counts once however many configurations
/// close it, so a partner only loses support when its last flow triangle through the
/// opposite vertex dies.
pub fn peel_flows(store: &EdgeStore) -> Layer {
    let l = store.capacity();
    let live: Vec<bool> = (0..l).map(|e| store.contains(e)).collect();
    let support = (0..l)
        .map(|e| {
            if live[e] {
                store.flows_where(e, |x| live[x]).len() as u32
            } else {
                0
            }
        })
        .collect();
    let mut queue = BucketQueue::new(support, (0..l).filter(|&e| live[e]));
    let mut removed = vec![false; l];
    let mut remaining = vec![0; l];
    let mut surviving = vec![0; l];
    let mut c = 0;
    let mut partners = vec![];
    for i in 0..queue.len() {
        let e = queue.peel(i);
        c = c.max(queue.support(e));
        removed[e] = true;
        let Ok((v1, v2)) = store.get(e) else {
            unreachable!("peeled dead edge {e}")
        };
        let pairs = store.flow_pairs_where(e, |x| live[x]);
        for group in pairs.chunk_by(|p, q| p.witness == q.witness) {
            if group
                .iter()
                .any(|p| queue.support(p.e1) >= c && queue.support(p.e2) >= c)
            {
                surviving[e] += 1;
            }
            partners.clear();
            for p in group.iter().filter(|p| !removed[p.e1] && !removed[p.e2]) {
                // e1 touches v1 so it loses v2, e2 touches v2 so it loses v1.
                for (f, x) in [(p.e1, v2), (p.e2, v1)] {
                    if !partners.contains(&(f, x)) {
                        partners.push((f, x));
                    }
                }
            }
            if partners.is_empty() {
                continue;
            }
            remaining[e] += 1;
            for &(f, x) in &partners {
                if queue.support(f) > c
                    && !store.has_flow_witness(f, x, |y| live[y] && !removed[y])
                {
                    queue.decrement(f);
                }
            }
        }
    }
    let (support, order) = queue.into_parts();
    Layer {
        support,
        remaining,
        surviving,
        order,
    }
}

/// Per-level decomposition of a static graph.
#[derive(Debug, Clone)]
pub struct Decomposition {
    store: EdgeStore,
    flow: Layer,
    layers: Vec<Layer>,
}

impl Decomposition {
    pub fn new(store: EdgeStore) -> Self {
        let l = store.capacity();
        let flow = peel_flows(&store);
        let max_flow = flow.max_support();
        log::debug!("flow peel done, max flow {max_flow}");
        let mut qualify: Vec<bool> = (0..l).map(|e| store.contains(e)).collect();
        let mut layers = vec![];
        for i in 0..=max_flow {
            for (e, q) in qualify.iter_mut().enumerate() {
                if flow.support[e] < i {
                    *q = false;
                }
            }
            let layer = peel_cycles(&store, &qualify);
            let exhausted = layer.max_support() == 0;
            log::debug!(
                "level {i}: {} qualifying edges, max cycle support {}",
                layer.order.len(),
                layer.max_support()
            );
            layers.push(layer);
            if exhausted {
                break;
            }
        }
        Self {
            store,
            flow,
            layers,
        }
    }

    pub fn store(&self) -> &EdgeStore {
        &self.store
    }

    /// Flow peel result; `flow().support[e]` is the flow number of e.
    pub fn flow(&self) -> &Layer {
        &self.flow
    }

    pub fn max_flow(&self) -> u32 {
        self.flow.max_support()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, level: usize) -> Option<&Layer> {
        self.layers.get(level)
    }

    /// Whether e takes part in the cycle peel of `level`.
    pub fn qualifies(&self, level: usize, e: EdgeId) -> bool {
        self.store.contains(e) && self.flow.support[e] as usize >= level
    }

    /// Cycle truss number of e at `level`. Levels past the last stored one are all zero.
    pub fn truss(&self, level: usize, e: EdgeId) -> u32 {
        self.layers.get(level).map_or(0, |layer| layer.support[e])
    }

    /// Highest level at which e still has positive support, if any.
    pub fn flow_level(&self, e: EdgeId) -> Option<usize> {
        self.layers.iter().rposition(|layer| layer.support[e] > 0)
    }
}
