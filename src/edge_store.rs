//! Bounded directed graph with recyclable edge ids and sorted adjacency arrays.

use crate::error::{Result, TrussError};

pub type VertexId = usize;
pub type EdgeId = usize;

/// Marks "no node" in every index-linked structure of this crate.
pub const EMPTY: usize = usize::MAX;

/// One adjacency array entry: the neighbour on the other side and the edge joining them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayEntry {
    pub vid: VertexId,
    pub eid: EdgeId,
}

#[derive(Debug, Clone)]
pub struct EdgeStore {
    n: usize,
    /// Maximum number of live edges, every edge id is in 0..capacity.
    capacity: usize,
    m: usize,
    /// free[e] iff e can be allocated.
    free: Vec<bool>,
    /// Stack of free ids. Fresh ids come out in increasing order.
    free_edges: Vec<EdgeId>,
    /// Grown on demand up to the highest vertex with an edge; later vertices are isolated.
    adj_in: Vec<Vec<ArrayEntry>>,
    adj_out: Vec<Vec<ArrayEntry>>,
    endpoints: Vec<(VertexId, VertexId)>,
}

impl EdgeStore {
    /// Empty graph on n vertices that can hold up to `capacity` edges.
    pub fn new(n: usize, capacity: usize) -> Self {
        Self {
            n,
            capacity,
            m: 0,
            free: vec![true; capacity],
            free_edges: (0..capacity).rev().collect(),
            adj_in: vec![],
            adj_out: vec![],
            endpoints: vec![(EMPTY, EMPTY); capacity],
        }
    }

    /// Builds a store holding `edges`, assigning ids 0..edges.len() in the given order.
    pub fn from_edges(n: usize, capacity: usize, edges: &[(VertexId, VertexId)]) -> Result<Self> {
        let mut store = Self::new(n, capacity);
        for &(v1, v2) in edges {
            store.lazy_insert(v1, v2)?;
        }
        store.rectify()?;
        Ok(store)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of live edges.
    pub fn m(&self) -> usize {
        self.m
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fails unless (v1, v2) is a valid non-loop pair of this vertex universe.
    pub fn check_edge(&self, v1: VertexId, v2: VertexId) -> Result<()> {
        for vertex in [v1, v2] {
            if vertex >= self.n {
                return Err(TrussError::VertexOutOfRange { vertex, n: self.n });
            }
        }
        if v1 == v2 {
            return Err(TrussError::SelfLoop(v1));
        }
        Ok(())
    }

    fn touch(&mut self, v: VertexId) {
        if self.adj_in.len() <= v {
            self.adj_in.resize(v + 1, vec![]);
            self.adj_out.resize(v + 1, vec![]);
        }
    }

    fn allocate(&mut self, v1: VertexId, v2: VertexId) -> Result<EdgeId> {
        let eid = self
            .free_edges
            .pop()
            .ok_or(TrussError::CapacityExceeded(self.capacity))?;
        assert!(self.free[eid], "free list handed out live edge {eid}");
        self.free[eid] = false;
        self.endpoints[eid] = (v1, v2);
        self.m += 1;
        Ok(eid)
    }

    /// Inserts (v1, v2) keeping both adjacency arrays sorted. Returns its id.
    pub fn insert(&mut self, v1: VertexId, v2: VertexId) -> Result<EdgeId> {
        self.check_edge(v1, v2)?;
        self.touch(v1.max(v2));
        let p1 = self.adj_out[v1].partition_point(|ae| ae.vid < v2);
        if self.adj_out[v1].get(p1).is_some_and(|ae| ae.vid == v2) {
            return Err(TrussError::DuplicateEdge(v1, v2));
        }
        let p2 = self.adj_in[v2].partition_point(|ae| ae.vid < v1);
        assert!(
            self.adj_in[v2].get(p2).map_or(true, |ae| ae.vid != v1),
            "adj_in of {v2} out of sync with adj_out of {v1}"
        );
        let eid = self.allocate(v1, v2)?;
        self.adj_out[v1].insert(p1, ArrayEntry { vid: v2, eid });
        self.adj_in[v2].insert(p2, ArrayEntry { vid: v1, eid });
        log::trace!("insert ({v1}, {v2}) as {eid}");
        Ok(eid)
    }

    /// Appends (v1, v2) without keeping the arrays sorted. Call `rectify` before querying.
    pub fn lazy_insert(&mut self, v1: VertexId, v2: VertexId) -> Result<EdgeId> {
        self.check_edge(v1, v2)?;
        self.touch(v1.max(v2));
        let eid = self.allocate(v1, v2)?;
        self.adj_out[v1].push(ArrayEntry { vid: v2, eid });
        self.adj_in[v2].push(ArrayEntry { vid: v1, eid });
        Ok(eid)
    }

    /// Sorts every adjacency array, failing if some vertex has two entries for one neighbour.
    pub fn rectify(&mut self) -> Result<()> {
        for (v, arrays) in self.adj_in.iter_mut().zip(self.adj_out.iter_mut()).enumerate() {
            for array in [arrays.0, arrays.1] {
                array.sort_unstable_by_key(|ae| ae.vid);
                if array.windows(2).any(|w| w[0].vid == w[1].vid) {
                    return Err(TrussError::DuplicateEdgeFound(v));
                }
            }
        }
        Ok(())
    }

    /// Removes a live edge and returns its endpoints. The id goes back on the free list.
    pub fn remove(&mut self, eid: EdgeId) -> Result<(VertexId, VertexId)> {
        let (v1, v2) = self.get(eid)?;
        let p1 = self.adj_out[v1]
            .iter()
            .position(|ae| ae.vid == v2)
            .expect("live edge missing from adj_out");
        self.adj_out[v1].remove(p1);
        let p2 = self.adj_in[v2]
            .iter()
            .position(|ae| ae.vid == v1)
            .expect("live edge missing from adj_in");
        self.adj_in[v2].remove(p2);
        self.free[eid] = true;
        self.free_edges.push(eid);
        self.endpoints[eid] = (EMPTY, EMPTY);
        self.m -= 1;
        log::trace!("remove ({v1}, {v2}) freeing {eid}");
        Ok((v1, v2))
    }

    /// Endpoints of a live edge.
    pub fn get(&self, eid: EdgeId) -> Result<(VertexId, VertexId)> {
        if self.contains(eid) {
            Ok(self.endpoints[eid])
        } else {
            Err(TrussError::InvalidEdge(eid))
        }
    }

    /// Id of the edge (v1, v2), scanning the out-array of v1.
    pub fn find(&self, v1: VertexId, v2: VertexId) -> Option<EdgeId> {
        self.adj_out
            .get(v1)?
            .iter()
            .find(|ae| ae.vid == v2)
            .map(|ae| ae.eid)
    }

    pub fn contains(&self, eid: EdgeId) -> bool {
        self.free.get(eid).is_some_and(|&f| !f)
    }

    /// Number of ids that can still be allocated.
    pub fn available(&self) -> usize {
        self.free_edges.len()
    }

    pub fn in_edges(&self, v: VertexId) -> &[ArrayEntry] {
        self.adj_in.get(v).map_or(&[][..], Vec::as_slice)
    }

    pub fn out_edges(&self, v: VertexId) -> &[ArrayEntry] {
        self.adj_out.get(v).map_or(&[][..], Vec::as_slice)
    }

    pub fn in_degree(&self, v: VertexId) -> usize {
        self.in_edges(v).len()
    }

    pub fn out_degree(&self, v: VertexId) -> usize {
        self.out_edges(v).len()
    }

    /// Live edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, (VertexId, VertexId))> + '_ {
        (0..self.capacity)
            .filter(|&e| !self.free[e])
            .map(|e| (e, self.endpoints[e]))
    }
}
