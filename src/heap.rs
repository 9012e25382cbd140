//! Indexed binary min-heap over edge ids. The ordering is supplied per call, so the heap
//! never borrows the state it orders by.

use crate::edge_store::{EdgeId, EMPTY};

#[derive(Debug, Clone)]
pub struct PriorityHeap {
    tbl: Vec<EdgeId>,
    /// Position of each id in `tbl`, EMPTY when absent.
    pos: Vec<usize>,
}

impl PriorityHeap {
    pub fn new(capacity: usize) -> Self {
        Self {
            tbl: Vec::with_capacity(capacity),
            pos: vec![EMPTY; capacity],
        }
    }

    pub fn len(&self) -> usize {
        self.tbl.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tbl.is_empty()
    }

    pub fn contains(&self, e: EdgeId) -> bool {
        self.pos[e] != EMPTY
    }

    pub fn top(&self) -> Option<EdgeId> {
        self.tbl.first().copied()
    }

    /// Adds e unless already present.
    pub fn push(&mut self, e: EdgeId, less: impl Fn(EdgeId, EdgeId) -> bool) {
        if self.contains(e) {
            return;
        }
        self.pos[e] = self.tbl.len();
        self.tbl.push(e);
        self.up(self.tbl.len() - 1, &less);
    }

    pub fn pop(&mut self, less: impl Fn(EdgeId, EdgeId) -> bool) -> Option<EdgeId> {
        let e = self.top()?;
        self.remove_at(0, &less);
        Some(e)
    }

    /// Removes e if present.
    pub fn remove(&mut self, e: EdgeId, less: impl Fn(EdgeId, EdgeId) -> bool) {
        if self.contains(e) {
            self.remove_at(self.pos[e], &less);
        }
    }

    pub fn clear(&mut self) {
        for e in self.tbl.drain(..) {
            self.pos[e] = EMPTY;
        }
    }

    fn remove_at(&mut self, i: usize, less: &impl Fn(EdgeId, EdgeId) -> bool) {
        let last = self.tbl.len() - 1;
        self.swap(i, last);
        let e = self.tbl.pop().expect("heap is not empty");
        self.pos[e] = EMPTY;
        if i < self.tbl.len() {
            self.up(i, less);
            self.down(i, less);
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.tbl.swap(i, j);
        self.pos[self.tbl[i]] = i;
        self.pos[self.tbl[j]] = j;
    }

    fn up(&mut self, mut i: usize, less: &impl Fn(EdgeId, EdgeId) -> bool) {
        while i > 0 {
            let p = (i - 1) / 2;
            if !less(self.tbl[i], self.tbl[p]) {
                break;
            }
            self.swap(i, p);
            i = p;
        }
    }

    fn down(&mut self, mut i: usize, less: &impl Fn(EdgeId, EdgeId) -> bool) {
        loop {
            let mut best = i;
            for c in [2 * i + 1, 2 * i + 2] {
                if c < self.tbl.len() && less(self.tbl[c], self.tbl[best]) {
                    best = c;
                }
            }
            if best == i {
                break;
            }
            self.swap(i, best);
            i = best;
        }
    }
}
