//! Incremental truss maintenance at one flow level.
//!
//! The maintainer keeps a valid peeling order of the active edges: sorted by truss number
//! `k`, every edge has at most `k` cycles whose other two edges both come later (`rem`), and
//! at least `k` cycles whose other two edges have truss number at least its own (`ts`). Both
//! conditions together pin `k` to the exact truss numbers.
//!
//! Insertion replays the peel over the old order. New edges start as candidates that have no
//! slot yet; old edges that receive extra support from candidates are popped from a heap in
//! order and either keep their slot, or get deferred and become candidates themselves.
//! Candidates are placed at the current point as soon as their support fits the current level.
//!
//! Removal only lowers truss numbers. Edges that lost support below their `k` demote one level
//! at a time, moving to the end of the lower level, until every `ts` covers its `k` again.
//! Demotion is driven by `ts` alone; the `rem` counters of the lists are recounted once the
//! drain is over.
//!
//! Above level 0 the active set follows the flow numbers, so every update set reruns the flow
//! peel once and is applied as a single batch.

use std::mem;
use std::path::Path;

use log::{debug, trace};

use crate::decomp::{peel_flows, Decomposition};
use crate::edge_store::{EdgeId, EdgeStore, VertexId, EMPTY};
use crate::error::{Result, TrussError};
use crate::heap::PriorityHeap;
use crate::io::{self, IndexFile, IndexRecord};
use crate::lists::GroupedLists;
use crate::order_labels::{OrderLabels, DEFAULT_GROUP_CAP};

pub trait DynamicTruss {
    /// Inserts all edges. Fails without changing anything if one of them is invalid.
    fn insert_edges(&mut self, edges: &[(VertexId, VertexId)]) -> Result<()>;
    /// Removes all edges. Fails without changing anything if one of them is missing.
    fn remove_edges(&mut self, edges: &[(VertexId, VertexId)]) -> Result<()>;
    /// Truss number of an existing edge, 0 if it does not qualify.
    fn truss(&self, v1: VertexId, v2: VertexId) -> Result<u32>;
    /// Every qualifying edge with its truss number, sorted by endpoints.
    fn snapshot(&self) -> Vec<((VertexId, VertexId), u32)>;
}

#[derive(Debug, Clone)]
pub struct MaintainerConfig {
    /// Flow level whose cycle truss numbers are maintained.
    pub level: usize,
    /// Maximum number of live edges. Defaults to twice the initial edge count.
    pub capacity: Option<usize>,
    /// Maximum size of an order label group.
    pub group_cap: usize,
    /// Update sets with at least this fraction of the live edges take the batch path. Only
    /// consulted at level 0.
    pub batch_ratio: f64,
}

impl Default for MaintainerConfig {
    fn default() -> Self {
        Self {
            level: 0,
            capacity: None,
            group_cap: DEFAULT_GROUP_CAP,
            batch_ratio: 0.01,
        }
    }
}

impl MaintainerConfig {
    fn capacity_for(&self, m: usize) -> usize {
        self.capacity.unwrap_or(2 * m)
    }
}

/// Where a partner sits relative to the edge being handled during insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Standing {
    /// Waiting for a slot.
    Candidate,
    /// Already passed, the cycle is gone.
    Dead,
    /// Still ahead in the order.
    Pending,
}

fn order_less<'a>(k: &'a [u32], om: &'a OrderLabels) -> impl Fn(EdgeId, EdgeId) -> bool + 'a {
    move |a, b| k[a] < k[b] || (k[a] == k[b] && om.precedes(a, b))
}

#[derive(Debug, Clone)]
pub struct Maintainer {
    config: MaintainerConfig,
    store: EdgeStore,
    k: Vec<u32>,
    ts: Vec<u32>,
    active: Vec<bool>,
    lists: GroupedLists,
    om: OrderLabels,
    heap: PriorityHeap,
    cand: Vec<bool>,
    /// Alive cycles of each candidate.
    count: Vec<u32>,
    candidates: Vec<EdgeId>,
    /// Candidates whose count fits the current level.
    ready: Vec<EdgeId>,
    flow_passes: usize,
}

impl Maintainer {
    /// Builds the live state from a static decomposition, renumbering edges in sorted
    /// endpoint order.
    pub fn from_decomposition(decomp: &Decomposition, config: MaintainerConfig) -> Result<Self> {
        let src = decomp.store();
        let mut edges: Vec<(EdgeId, (VertexId, VertexId))> = src.edges().collect();
        edges.sort_unstable_by_key(|&(_, ends)| ends);
        let ends: Vec<_> = edges.iter().map(|&(_, ends)| ends).collect();
        let store = EdgeStore::from_edges(src.n(), config.capacity_for(src.m()), &ends)?;
        let l = store.capacity();
        let level = config.level;
        let mut fresh = vec![EMPTY; src.capacity()];
        for (eid, &(old, _)) in edges.iter().enumerate() {
            fresh[old] = eid;
        }
        let mut active = vec![false; l];
        let (mut k, mut rem, mut ts) = (vec![0; l], vec![0; l], vec![0; l]);
        for &(old, _) in &edges {
            active[fresh[old]] = decomp.qualifies(level, old);
        }
        let order = match decomp.layer(level) {
            Some(layer) => {
                for &(old, _) in &edges {
                    let e = fresh[old];
                    k[e] = layer.support[old];
                    rem[e] = layer.remaining[old];
                    ts[e] = layer.surviving[old];
                }
                layer.order.iter().map(|&old| fresh[old]).collect()
            }
            None => (0..l).filter(|&e| active[e]).collect(),
        };
        Self::assemble(store, config, active, order, k, rem, ts)
    }

    /// Reads an index file and takes the state of `config.level` from it.
    pub fn load_index(path: impl AsRef<Path>, config: MaintainerConfig) -> Result<Self> {
        let index = io::read_index(path)?;
        let mut ends: Vec<(VertexId, VertexId)> = index
            .layers
            .first()
            .map(|records| records.iter().map(|r| (r.v1, r.v2)).collect())
            .unwrap_or_default();
        if ends.len() != index.m {
            return Err(TrussError::CorruptIndex("index holds no complete level"));
        }
        ends.sort_unstable();
        let store = EdgeStore::from_edges(index.n, config.capacity_for(index.m), &ends)?;
        let l = store.capacity();
        let active = qualification(&store, config.level);
        let (mut k, mut rem, mut ts) = (vec![0; l], vec![0; l], vec![0; l]);
        let order = match index.layers.get(config.level) {
            Some(records) => {
                let mut order = vec![];
                for r in records {
                    let e = store
                        .find(r.v1, r.v2)
                        .ok_or(TrussError::CorruptIndex("record for an edge missing from level 0"))?;
                    if active[e] {
                        order.push(e);
                        k[e] = r.support;
                        rem[e] = r.remaining;
                        ts[e] = r.surviving;
                    }
                }
                order
            }
            None => (0..l).filter(|&e| active[e]).collect(),
        };
        debug!(
            "loaded level {} of {} with {} active edges",
            config.level,
            index.layers.len(),
            order.len()
        );
        Self::assemble(store, config, active, order, k, rem, ts)
    }

    fn assemble(
        store: EdgeStore,
        config: MaintainerConfig,
        active: Vec<bool>,
        order: Vec<EdgeId>,
        k: Vec<u32>,
        rem: Vec<u32>,
        ts: Vec<u32>,
    ) -> Result<Self> {
        if config.group_cap < 2 {
            return Err(TrussError::Invalid("group cap must be at least 2"));
        }
        let l = store.capacity();
        let mut seen = vec![false; l];
        for (i, &e) in order.iter().enumerate() {
            if !active[e] || mem::replace(&mut seen[e], true) {
                return Err(TrussError::CorruptIndex("order repeats or holds a non-qualifying edge"));
            }
            if i > 0 && k[order[i - 1]] > k[e] {
                return Err(TrussError::CorruptIndex("truss numbers decrease along the order"));
            }
        }
        if order.len() != active.iter().filter(|&&a| a).count() {
            return Err(TrussError::CorruptIndex("order misses qualifying edges"));
        }
        let mut om = OrderLabels::new(l, config.group_cap);
        om.load(&order);
        let mut lists = GroupedLists::new(l);
        for &e in &order {
            lists.push_back(k[e], e);
            lists.node_mut(e).rem = rem[e];
        }
        Ok(Self {
            config,
            store,
            k,
            ts,
            active,
            lists,
            om,
            heap: PriorityHeap::new(l),
            cand: vec![false; l],
            count: vec![0; l],
            candidates: vec![],
            ready: vec![],
            flow_passes: 0,
        })
    }

    pub fn store(&self) -> &EdgeStore {
        &self.store
    }

    pub fn level(&self) -> usize {
        self.config.level
    }

    pub fn config(&self) -> &MaintainerConfig {
        &self.config
    }

    pub fn is_active(&self, e: EdgeId) -> bool {
        self.active[e]
    }

    /// Truss number of a live edge.
    pub fn truss_of(&self, e: EdgeId) -> Result<u32> {
        self.store.get(e)?;
        Ok(if self.active[e] { self.k[e] } else { 0 })
    }

    /// Active edges in peeling order.
    pub fn order(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.om.iter()
    }

    /// Number of flow peels run since construction.
    pub fn flow_passes(&self) -> usize {
        self.flow_passes
    }

    /// The maintained level as a one-level index: active edges in peeling order with `k`,
    /// `rem` and `ts`, then the other live edges in id order with zeros.
    pub fn to_index(&self) -> IndexFile {
        let mut ends = vec![(EMPTY, EMPTY); self.store.capacity()];
        for (e, pair) in self.store.edges() {
            ends[e] = pair;
        }
        let record = |e: EdgeId, (support, remaining, surviving): (u32, u32, u32)| IndexRecord {
            v1: ends[e].0,
            v2: ends[e].1,
            support,
            remaining,
            surviving,
        };
        let mut records: Vec<IndexRecord> = self
            .om
            .iter()
            .map(|e| record(e, (self.k[e], self.lists.node(e).rem, self.ts[e])))
            .collect();
        records.extend(
            self.store
                .edges()
                .filter(|&(e, _)| !self.active[e])
                .map(|(e, _)| record(e, (0, 0, 0))),
        );
        IndexFile {
            n: self.store.n(),
            m: self.store.m(),
            layers: vec![records],
        }
    }

    // INSERTION

    fn validate_insertions(&self, edges: &[(VertexId, VertexId)]) -> Result<()> {
        for &(v1, v2) in edges {
            self.store.check_edge(v1, v2)?;
            if self.store.find(v1, v2).is_some() {
                return Err(TrussError::DuplicateEdge(v1, v2));
            }
        }
        let mut sorted = edges.to_vec();
        sorted.sort_unstable();
        if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(TrussError::DuplicateEdge(w[0].0, w[0].1));
        }
        if edges.len() > self.store.available() {
            return Err(TrussError::CapacityExceeded(self.store.capacity()));
        }
        Ok(())
    }

    /// Inserts a single edge and returns its id.
    pub fn insert(&mut self, v1: VertexId, v2: VertexId) -> Result<EdgeId> {
        let ids = self.batch_insert(&[(v1, v2)])?;
        Ok(ids[0])
    }

    /// Inserts all edges, then repairs the order in one pass.
    pub fn batch_insert(&mut self, edges: &[(VertexId, VertexId)]) -> Result<Vec<EdgeId>> {
        self.validate_insertions(edges)?;
        let mut ids = Vec::with_capacity(edges.len());
        for &(v1, v2) in edges {
            ids.push(self.store.insert(v1, v2)?);
        }
        if self.config.level == 0 {
            self.activate(&ids);
        } else {
            self.requalify()?;
        }
        Ok(ids)
    }

    /// Picks the batch or the unit path depending on how large the update is.
    pub fn apply_insertions(&mut self, edges: &[(VertexId, VertexId)]) -> Result<()> {
        self.validate_insertions(edges)?;
        if self.takes_batch_path(edges.len()) {
            self.batch_insert(edges)?;
        } else {
            for &(v1, v2) in edges {
                self.insert(v1, v2)?;
            }
        }
        Ok(())
    }

    fn takes_batch_path(&self, len: usize) -> bool {
        self.config.level > 0 || len as f64 >= self.config.batch_ratio * self.store.m() as f64
    }

    fn partners(&self, e: EdgeId) -> Vec<EdgeId> {
        self.store
            .cycles_where(e, |x| self.active[x])
            .into_iter()
            .flat_map(|(a, b)| [a, b])
            .collect()
    }

    fn standing(&self, y: EdgeId, x: EdgeId) -> Standing {
        if self.cand[x] {
            Standing::Candidate
        } else if self.om.precedes(x, y) {
            Standing::Dead
        } else {
            Standing::Pending
        }
    }

    /// Earliest of a and b that is still ahead of y.
    fn earliest_pending(&self, y: EdgeId, a: EdgeId, b: EdgeId) -> Option<EdgeId> {
        let pending = |x| self.standing(y, x) == Standing::Pending;
        match (pending(a), pending(b)) {
            (true, true) if self.om.precedes(b, a) => Some(b),
            (true, _) => Some(a),
            (false, true) => Some(b),
            (false, false) => None,
        }
    }

    /// Earliest of a and b that already has a slot.
    fn earliest_labeled(&self, a: EdgeId, b: EdgeId) -> Option<EdgeId> {
        match (self.cand[a], self.cand[b]) {
            (false, false) if self.om.precedes(b, a) => Some(b),
            (false, _) => Some(a),
            (true, false) => Some(b),
            (true, true) => None,
        }
    }

    /// Hands one alive cycle to an edge still ahead.
    fn give(&mut self, p: EdgeId) {
        self.lists.node_mut(p).ext += 1;
        self.heap.push(p, order_less(&self.k, &self.om));
    }

    /// A candidate lost an alive cycle.
    fn lose(&mut self, c: EdgeId, level: u32) {
        self.count[c] -= 1;
        if self.count[c] <= level {
            self.ready.push(c);
        }
    }

    /// Makes `edges` part of the order. They must be live and inactive.
    fn activate(&mut self, edges: &[EdgeId]) {
        if edges.is_empty() {
            return;
        }
        assert!(self.heap.is_empty() && self.candidates.is_empty());
        for &e in edges {
            assert!(!self.active[e], "{e} is already active");
            self.active[e] = true;
            self.cand[e] = true;
            self.k[e] = 0;
            self.ts[e] = 0;
            self.candidates.push(e);
        }
        for &e in edges {
            let cycles = self.store.cycles_where(e, |x| self.active[x]);
            self.count[e] = cycles.len() as u32;
            for (a, b) in cycles {
                // Cycles through several new edges are handed over by the smallest one.
                if [a, b].into_iter().any(|x| self.cand[x] && x < e) {
                    continue;
                }
                if let Some(h) = self.earliest_labeled(a, b) {
                    self.give(h);
                }
            }
        }
        let mut touched = edges.to_vec();
        let (mut kept, mut deferred) = (0, 0);
        let mut cur = self.next_level().unwrap_or(0);
        let mut anchor = self.start_level(cur);
        loop {
            while let Some(c) = self.ready.pop() {
                if self.cand[c] {
                    self.place(c, cur, anchor);
                    anchor = c;
                }
            }
            if let Some(y) = self.heap.top().filter(|&y| self.k[y] == cur) {
                self.heap.pop(order_less(&self.k, &self.om));
                if self.process(y, cur) {
                    kept += 1;
                    anchor = y;
                } else {
                    deferred += 1;
                    touched.push(y);
                }
                continue;
            }
            self.candidates.retain(|&c| self.cand[c]);
            if self.candidates.is_empty() {
                while let Some(y) = self.heap.pop(order_less(&self.k, &self.om)) {
                    debug_assert_eq!(self.lists.node(y).ext, 0, "{y} holds cycles of no candidate");
                }
                break;
            }
            cur = self
                .next_level()
                .expect("candidates are waiting so some level is next");
            anchor = self.start_level(cur);
        }
        debug!(
            "activated {} edges: {kept} kept their slot, {deferred} deferred",
            edges.len()
        );
        self.refresh(touched);
    }

    /// Lowest level at which something can happen: the next heap edge or the smallest count.
    fn next_level(&self) -> Option<u32> {
        let top = self.heap.top().map(|y| self.k[y]);
        let low = self
            .candidates
            .iter()
            .filter(|&&c| self.cand[c])
            .map(|&c| self.count[c])
            .min();
        top.into_iter().chain(low).min()
    }

    /// Moves the current point to the start of level `cur` and returns the element before it.
    fn start_level(&mut self, cur: u32) -> EdgeId {
        trace!("draining level {cur}");
        let ready: Vec<EdgeId> = self
            .candidates
            .iter()
            .copied()
            .filter(|&c| self.cand[c] && self.count[c] <= cur)
            .collect();
        self.ready = ready;
        match self.lists.last_below(cur) {
            EMPTY => self.om.sentinel(),
            e => e,
        }
    }

    /// Handles a popped edge at its slot. Returns whether it stays there.
    fn process(&mut self, y: EdgeId, level: u32) -> bool {
        let node = self.lists.node(y);
        let s = node.rem + node.ext;
        let cycles = self.store.cycles_where(y, |x| self.active[x]);
        let mut alive = 0;
        let stays = s <= level;
        for (a, b) in cycles {
            let standing = [self.standing(y, a), self.standing(y, b)];
            if standing.contains(&Standing::Dead) {
                continue;
            }
            alive += 1;
            if stays {
                for (x, st) in [(a, standing[0]), (b, standing[1])] {
                    if st == Standing::Candidate {
                        self.lose(x, level);
                    }
                }
            } else if let Some(p) = self.earliest_pending(y, a, b) {
                self.give(p);
            }
        }
        debug_assert_eq!(alive, s, "support of {y} out of sync");
        if stays {
            let node = self.lists.node_mut(y);
            node.rem = s;
            node.ext = 0;
            trace!("{y} keeps its slot at level {level} with support {s}");
        } else {
            self.om.remove(y);
            self.lists.remove(y);
            self.cand[y] = true;
            self.count[y] = s;
            self.candidates.push(y);
            trace!("{y} deferred past level {level} with support {s}");
        }
        stays
    }

    /// Gives candidate c a slot right after `anchor` at `level`.
    fn place(&mut self, c: EdgeId, level: u32, anchor: EdgeId) {
        self.cand[c] = false;
        self.k[c] = level;
        self.om.insert_after(anchor, c);
        if anchor != self.om.sentinel() && self.lists.level(anchor) == level {
            self.lists.insert_after(anchor, c);
        } else {
            self.lists.push_front(level, c);
        }
        let rem = mem::take(&mut self.count[c]);
        self.lists.node_mut(c).rem = rem;
        let mut alive = 0;
        for (a, b) in self.store.cycles_where(c, |x| self.active[x]) {
            let standing = [self.standing(c, a), self.standing(c, b)];
            if standing.contains(&Standing::Dead) {
                continue;
            }
            alive += 1;
            for (x, st) in [(a, standing[0]), (b, standing[1])] {
                if st == Standing::Candidate {
                    self.lose(x, level);
                }
            }
            if let Some(p) = self.earliest_pending(c, a, b) {
                self.lists.node_mut(p).ext -= 1;
            }
        }
        debug_assert_eq!(alive, rem, "count of {c} out of sync");
        trace!("placed {c} at level {level} after {anchor}");
    }

    // REMOVAL

    fn validate_removals(&self, edges: &[(VertexId, VertexId)]) -> Result<Vec<EdgeId>> {
        let mut ids = Vec::with_capacity(edges.len());
        for &(v1, v2) in edges {
            ids.push(self.store.find(v1, v2).ok_or(TrussError::MissingEdge(v1, v2))?);
        }
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(TrussError::Invalid("edge removed twice in one batch"));
        }
        Ok(ids)
    }

    pub fn remove(&mut self, v1: VertexId, v2: VertexId) -> Result<()> {
        self.batch_remove(&[(v1, v2)])
    }

    /// Removes all edges, then repairs the order in one pass.
    pub fn batch_remove(&mut self, edges: &[(VertexId, VertexId)]) -> Result<()> {
        let ids = self.validate_removals(edges)?;
        self.deactivate(&ids, true)?;
        if self.config.level > 0 {
            self.requalify()?;
        }
        Ok(())
    }

    pub fn apply_removals(&mut self, edges: &[(VertexId, VertexId)]) -> Result<()> {
        self.validate_removals(edges)?;
        if self.takes_batch_path(edges.len()) {
            self.batch_remove(edges)
        } else {
            edges.iter().try_for_each(|&(v1, v2)| self.remove(v1, v2))
        }
    }

    fn recount_ts(&self, e: EdgeId) -> u32 {
        let ke = self.k[e];
        self.store
            .cycles_where(e, |x| self.active[x] && self.k[x] >= ke)
            .len() as u32
    }

    fn recount_rem(&self, e: EdgeId) -> u32 {
        self.store
            .cycles_where(e, |x| self.active[x])
            .into_iter()
            .filter(|&(a, b)| self.om.precedes(e, a) && self.om.precedes(e, b))
            .count() as u32
    }

    /// Takes `edges` out of the order, dropping them from the store too if asked, and
    /// demotes whatever lost support.
    fn deactivate(&mut self, edges: &[EdgeId], drop_from_store: bool) -> Result<()> {
        assert!(self.heap.is_empty());
        let mut dirty = vec![];
        for &e in edges.iter().filter(|&&e| self.active[e]) {
            dirty.extend(self.partners(e));
        }
        for &e in edges {
            if self.active[e] {
                self.om.remove(e);
                self.lists.remove(e);
                self.active[e] = false;
                self.k[e] = 0;
                self.ts[e] = 0;
            }
        }
        if drop_from_store {
            for &e in edges {
                self.store.remove(e)?;
            }
        }
        dirty.sort_unstable();
        dirty.dedup();
        dirty.retain(|&e| self.active[e]);
        for &e in &dirty {
            self.ts[e] = self.recount_ts(e);
            if self.ts[e] < self.k[e] {
                self.heap.push(e, order_less(&self.k, &self.om));
            }
        }
        let mut moved = vec![];
        while let Some(e) = self.heap.pop(order_less(&self.k, &self.om)) {
            if self.ts[e] >= self.k[e] {
                continue;
            }
            let kk = self.k[e];
            for (a, b) in self.store.cycles_where(e, |x| self.active[x]) {
                for (f, g) in [(a, b), (b, a)] {
                    if self.k[f] == kk && self.k[g] >= kk {
                        self.ts[f] -= 1;
                        if self.ts[f] < self.k[f] {
                            self.heap.push(f, order_less(&self.k, &self.om));
                        }
                    }
                }
            }
            self.k[e] = kk - 1;
            self.lists.remove(e);
            self.om.remove(e);
            let anchor = match self.lists.last_below(kk) {
                EMPTY => self.om.sentinel(),
                a => a,
            };
            self.om.insert_after(anchor, e);
            self.lists.push_back(kk - 1, e);
            self.ts[e] = self.recount_ts(e);
            if self.ts[e] < self.k[e] {
                self.heap.push(e, order_less(&self.k, &self.om));
            }
            trace!("demoted {e} to level {}", kk - 1);
            moved.push(e);
        }
        debug!(
            "deactivated {} edges, {} demotions",
            edges.len(),
            moved.len()
        );
        dirty.extend(moved);
        self.refresh(dirty);
        Ok(())
    }

    /// Brings the active set in line with the flow numbers of the current graph.
    fn requalify(&mut self) -> Result<()> {
        let qualify = qualification(&self.store, self.config.level);
        self.flow_passes += 1;
        let (mut lost, mut gained) = (vec![], vec![]);
        for (e, &q) in qualify.iter().enumerate() {
            match (self.active[e], q) {
                (true, false) => lost.push(e),
                (false, true) => gained.push(e),
                _ => {}
            }
        }
        debug!(
            "flow level {}: {} edges stop qualifying, {} start",
            self.config.level,
            lost.len(),
            gained.len()
        );
        self.deactivate(&lost, false)?;
        self.activate(&gained);
        Ok(())
    }

    /// Recounts `rem` and `ts` of the given edges and their partners.
    fn refresh(&mut self, mut edges: Vec<EdgeId>) {
        let around: Vec<EdgeId> = edges
            .iter()
            .filter(|&&e| self.active[e])
            .flat_map(|&e| self.partners(e))
            .collect();
        edges.extend(around);
        edges.sort_unstable();
        edges.dedup();
        for e in edges.into_iter().filter(|&e| self.active[e]) {
            self.ts[e] = self.recount_ts(e);
            let rem = self.recount_rem(e);
            let node = self.lists.node_mut(e);
            node.rem = rem;
            node.ext = 0;
        }
    }

    /// Panics if the order, the lists, the labels or any counter disagree with the graph.
    pub fn check_invariants(&self) {
        self.om.check_invariants();
        self.lists.check_invariants();
        assert!(self.heap.is_empty(), "heap not drained");
        assert!(self.candidates.is_empty(), "candidates left unplaced");
        let active = (0..self.store.capacity()).filter(|&e| self.active[e]);
        for e in active {
            assert!(self.store.contains(e), "active edge {e} is not live");
            assert!(self.om.contains(e) && self.lists.contains(e), "{e} has no slot");
            assert_eq!(self.lists.level(e), self.k[e], "{e} listed at the wrong level");
            let node = self.lists.node(e);
            assert_eq!(node.ext, 0, "{e} holds extra support");
            assert_eq!(node.rem, self.recount_rem(e), "rem of {e}");
            assert!(node.rem <= self.k[e], "{e} peeled with too much support");
            assert_eq!(self.ts[e], self.recount_ts(e), "ts of {e}");
            assert!(self.ts[e] >= self.k[e], "{e} lacks support for level {}", self.k[e]);
        }
        assert_eq!(
            self.om.len(),
            self.active.iter().filter(|&&a| a).count(),
            "order holds inactive edges"
        );
        let mut from_lists = vec![];
        for level in 0..self.lists.levels() {
            from_lists.extend(self.lists.iter(level as u32));
        }
        let from_om: Vec<EdgeId> = self.om.iter().collect();
        assert_eq!(from_lists, from_om, "lists and labels disagree on the order");
    }
}

/// Edges taking part at `level`: all live edges at level 0, otherwise those whose flow number
/// reaches it.
fn qualification(store: &EdgeStore, level: usize) -> Vec<bool> {
    let live = (0..store.capacity()).map(|e| store.contains(e));
    if level == 0 {
        return live.collect();
    }
    let flow = peel_flows(store);
    live.zip(&flow.support)
        .map(|(l, &s)| l && s as usize >= level)
        .collect()
}

impl DynamicTruss for Maintainer {
    fn insert_edges(&mut self, edges: &[(VertexId, VertexId)]) -> Result<()> {
        self.apply_insertions(edges)
    }

    fn remove_edges(&mut self, edges: &[(VertexId, VertexId)]) -> Result<()> {
        self.apply_removals(edges)
    }

    fn truss(&self, v1: VertexId, v2: VertexId) -> Result<u32> {
        let e = self
            .store
            .find(v1, v2)
            .ok_or(TrussError::MissingEdge(v1, v2))?;
        self.truss_of(e)
    }

    fn snapshot(&self) -> Vec<((VertexId, VertexId), u32)> {
        let mut all: Vec<_> = self
            .store
            .edges()
            .filter(|&(e, _)| self.active[e])
            .map(|(e, ends)| (ends, self.k[e]))
            .collect();
        all.sort_unstable();
        all
    }
}
