use std::collections::{BTreeMap, BTreeSet};

use dtruss::{DynamicTruss, Result, TrussError};

type Edge = (usize, usize);

/// Recomputes everything from scratch by repeatedly removing a minimum support edge.
#[derive(Debug, Clone)]
pub struct Dumb {
    n: usize,
    level: usize,
    edges: BTreeSet<Edge>,
}

#[allow(dead_code)]
impl Dumb {
    pub fn new(n: usize, level: usize, edges: impl IntoIterator<Item = Edge>) -> Self {
        Self {
            n,
            level,
            edges: edges.into_iter().collect(),
        }
    }

    /// Witness pairs of directed 3-cycles through (a, b) inside `set`.
    pub fn cycles(&self, set: &BTreeSet<Edge>, (a, b): Edge) -> Vec<[Edge; 2]> {
        (0..self.n)
            .filter(|&w| set.contains(&(w, a)) && set.contains(&(b, w)))
            .map(|w| [(w, a), (b, w)])
            .collect()
    }

    /// Vertices closing a flow triangle with (a, b) inside `set`.
    pub fn flow_witnesses(&self, set: &BTreeSet<Edge>, (a, b): Edge) -> BTreeSet<usize> {
        let has = |e: Edge| set.contains(&e);
        (0..self.n)
            .filter(|&w| {
                (has((w, a)) && has((w, b)))
                    || (has((a, w)) && has((b, w)))
                    || (has((a, w)) && has((w, b)))
            })
            .collect()
    }

    fn peel(
        set: &BTreeSet<Edge>,
        support: impl Fn(&BTreeSet<Edge>, Edge) -> usize,
    ) -> BTreeMap<Edge, u32> {
        let mut left = set.clone();
        let mut numbers = BTreeMap::new();
        let mut k = 0;
        while !left.is_empty() {
            match left.iter().copied().find(|&e| support(&left, e) <= k) {
                Some(e) => {
                    numbers.insert(e, k as u32);
                    left.remove(&e);
                }
                None => k += 1,
            }
        }
        numbers
    }

    pub fn flow_numbers(&self) -> BTreeMap<Edge, u32> {
        Self::peel(&self.edges, |set, e| self.flow_witnesses(set, e).len())
    }

    /// Cycle truss numbers of the edges whose flow number reaches the level.
    pub fn truss_numbers(&self) -> BTreeMap<Edge, u32> {
        let qualifying: BTreeSet<Edge> = self
            .flow_numbers()
            .into_iter()
            .filter(|&(_, f)| f as usize >= self.level)
            .map(|(e, _)| e)
            .collect();
        Self::peel(&qualifying, |set, e| self.cycles(set, e).len())
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }
}

impl DynamicTruss for Dumb {
    fn insert_edges(&mut self, edges: &[Edge]) -> Result<()> {
        let mut fresh = BTreeSet::new();
        for &(v1, v2) in edges {
            if v1 == v2 {
                return Err(TrussError::SelfLoop(v1));
            }
            if self.edges.contains(&(v1, v2)) || !fresh.insert((v1, v2)) {
                return Err(TrussError::DuplicateEdge(v1, v2));
            }
        }
        self.edges.extend(fresh);
        Ok(())
    }

    fn remove_edges(&mut self, edges: &[Edge]) -> Result<()> {
        for &(v1, v2) in edges {
            if !self.edges.contains(&(v1, v2)) {
                return Err(TrussError::MissingEdge(v1, v2));
            }
        }
        for e in edges {
            self.edges.remove(e);
        }
        Ok(())
    }

    fn truss(&self, v1: usize, v2: usize) -> Result<u32> {
        if !self.edges.contains(&(v1, v2)) {
            return Err(TrussError::MissingEdge(v1, v2));
        }
        Ok(self.truss_numbers().get(&(v1, v2)).copied().unwrap_or(0))
    }

    fn snapshot(&self) -> Vec<(Edge, u32)> {
        self.truss_numbers().into_iter().collect()
    }
}
