//! Witness enumeration around one edge by merging sorted adjacency arrays.
//!
//! Every query takes a `keep` predicate over edge ids. Entries whose edge is not kept are
//! skipped during the merge, which lets peeling shrink the edge set and lets the maintainer
//! filter by truss number without the store holding either.

use crate::edge_store::{ArrayEntry, EdgeId, EdgeStore, VertexId};

/// One flow configuration through `witness`: `e1` joins the tail of the edge to the witness,
/// `e2` joins the head to the witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowPair {
    pub witness: VertexId,
    pub e1: EdgeId,
    pub e2: EdgeId,
}

/// Calls `f(vertex, eid_in_a, eid_in_b)` for each neighbour id present in both arrays whose
/// edges are both kept.
pub fn merge_common(
    a: &[ArrayEntry],
    b: &[ArrayEntry],
    keep: impl Fn(EdgeId) -> bool,
    mut f: impl FnMut(VertexId, EdgeId, EdgeId),
) {
    let (mut p1, mut p2) = (0, 0);
    while p1 < a.len() && p2 < b.len() {
        let (x, y) = (a[p1], b[p2]);
        if !keep(x.eid) {
            p1 += 1;
        } else if !keep(y.eid) {
            p2 += 1;
        } else if x.vid == y.vid {
            f(x.vid, x.eid, y.eid);
            p1 += 1;
            p2 += 1;
        } else if x.vid < y.vid {
            p1 += 1;
        } else {
            p2 += 1;
        }
    }
}

fn at_least(k: &[u32], threshold: u32) -> impl Fn(EdgeId) -> bool + '_ {
    move |e| k[e] >= threshold
}

impl EdgeStore {
    fn ends(&self, eid: EdgeId) -> (VertexId, VertexId) {
        match self.get(eid) {
            Ok(ends) => ends,
            Err(e) => panic!("witness query on dead edge: {e}"),
        }
    }

    /// Pairs of edges joining both endpoints of `eid` to a common neighbour, any orientation.
    pub fn triangles_where(&self, eid: EdgeId, keep: impl Fn(EdgeId) -> bool) -> Vec<(EdgeId, EdgeId)> {
        let (v1, v2) = self.ends(eid);
        let mut triangles = vec![];
        for a in [self.in_edges(v1), self.out_edges(v1)] {
            for b in [self.in_edges(v2), self.out_edges(v2)] {
                merge_common(a, b, &keep, |_, e1, e2| triangles.push((e1, e2)));
            }
        }
        triangles
    }

    pub fn triangles(&self, eid: EdgeId) -> Vec<(EdgeId, EdgeId)> {
        self.triangles_where(eid, |_| true)
    }

    /// Triangles whose two other edges both have truss number at least `threshold`.
    pub fn triangles_at_least(&self, eid: EdgeId, k: &[u32], threshold: u32) -> Vec<(EdgeId, EdgeId)> {
        self.triangles_where(eid, at_least(k, threshold))
    }

    /// Directed 3-cycles through (v1, v2): pairs (eid(w, v1), eid(v2, w)).
    pub fn cycles_where(&self, eid: EdgeId, keep: impl Fn(EdgeId) -> bool) -> Vec<(EdgeId, EdgeId)> {
        let (v1, v2) = self.ends(eid);
        let mut cycles = vec![];
        merge_common(self.in_edges(v1), self.out_edges(v2), keep, |_, e1, e2| {
            cycles.push((e1, e2))
        });
        cycles
    }

    pub fn cycles(&self, eid: EdgeId) -> Vec<(EdgeId, EdgeId)> {
        self.cycles_where(eid, |_| true)
    }

    pub fn cycles_qualified(&self, eid: EdgeId, qualify: &[bool]) -> Vec<(EdgeId, EdgeId)> {
        self.cycles_where(eid, |e| qualify[e])
    }

    pub fn cycles_at_least(&self, eid: EdgeId, k: &[u32], threshold: u32) -> Vec<(EdgeId, EdgeId)> {
        self.cycles_where(eid, at_least(k, threshold))
    }

    /// Every flow configuration around `eid`, ordered by witness vertex. A witness may appear
    /// more than once when reciprocal edges give it several configurations.
    pub fn flow_pairs_where(&self, eid: EdgeId, keep: impl Fn(EdgeId) -> bool) -> Vec<FlowPair> {
        let (v1, v2) = self.ends(eid);
        let mut pairs = vec![];
        let mut push = |witness, e1, e2| pairs.push(FlowPair { witness, e1, e2 });
        // (w, v1) and (w, v2)
        merge_common(self.in_edges(v1), self.in_edges(v2), &keep, &mut push);
        // (v1, w) and (v2, w)
        merge_common(self.out_edges(v1), self.out_edges(v2), &keep, &mut push);
        // (v1, w) and (w, v2)
        merge_common(self.out_edges(v1), self.in_edges(v2), &keep, &mut push);
        pairs.sort_by_key(|p| p.witness);
        pairs
    }

    /// Flow triangles around `eid`, one per witness vertex.
    pub fn flows_where(&self, eid: EdgeId, keep: impl Fn(EdgeId) -> bool) -> Vec<FlowPair> {
        let mut pairs = self.flow_pairs_where(eid, keep);
        pairs.dedup_by_key(|p| p.witness);
        pairs
    }

    pub fn flows(&self, eid: EdgeId) -> Vec<FlowPair> {
        self.flows_where(eid, |_| true)
    }

    pub fn flows_at_least(&self, eid: EdgeId, k: &[u32], threshold: u32) -> Vec<FlowPair> {
        self.flows_where(eid, at_least(k, threshold))
    }

    /// Whether `f` still closes a flow triangle through vertex `x` using kept edges.
    pub fn has_flow_witness(&self, f: EdgeId, x: VertexId, keep: impl Fn(EdgeId) -> bool) -> bool {
        let (a, b) = self.ends(f);
        let edge = |u, v| self.find(u, v).is_some_and(&keep);
        (edge(x, a) && edge(x, b)) || (edge(a, x) && edge(b, x)) || (edge(a, x) && edge(x, b))
    }
}
