//! One doubly linked list per truss level, threading every active edge in peeling order.
//! Nodes also carry the per-edge counters the maintainer keeps alongside the order.

use std::fmt::{Debug, Display, Formatter};

use debug_tree::{add_branch_to, add_leaf_to, TreeBuilder};
use derivative::Derivative;

use crate::edge_store::{EdgeId, EMPTY};

pub fn node_fmt(u: &usize, f: &mut Formatter) -> std::fmt::Result {
    if *u == EMPTY {
        write!(f, "∅")
    } else {
        write!(f, "{u}")
    }
}

/// Used to pretty print an id, outputting ∅ if it is EMPTY.
pub struct PrettyIdx(pub usize);

impl Display for PrettyIdx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        node_fmt(&self.0, f)
    }
}

impl Debug for PrettyIdx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

use PrettyIdx as I;

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ListNode {
    #[derivative(Debug(format_with = "node_fmt"))]
    prev: EdgeId,
    #[derivative(Debug(format_with = "node_fmt"))]
    next: EdgeId,
    /// Level whose list holds this node, EMPTY when detached.
    #[derivative(Debug(format_with = "node_fmt"))]
    level: usize,
    /// Witnesses whose partners all come later in the order.
    pub rem: u32,
    /// Support handed to this edge by edges placed before it during an insertion.
    pub ext: u32,
}

impl Default for ListNode {
    fn default() -> Self {
        Self {
            prev: EMPTY,
            next: EMPTY,
            level: EMPTY,
            rem: 0,
            ext: 0,
        }
    }
}

#[derive(Clone)]
pub struct GroupedLists {
    nodes: Vec<ListNode>,
    head: Vec<EdgeId>,
    tail: Vec<EdgeId>,
}

impl GroupedLists {
    /// No lists yet, node ids in 0..capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: vec![ListNode::default(); capacity],
            head: vec![],
            tail: vec![],
        }
    }

    fn ensure_level(&mut self, k: u32) {
        let k = k as usize;
        if self.head.len() <= k {
            self.head.resize(k + 1, EMPTY);
            self.tail.resize(k + 1, EMPTY);
        }
    }

    /// Number of level slots, one past the highest level ever used.
    pub fn levels(&self) -> usize {
        self.head.len()
    }

    pub fn contains(&self, e: EdgeId) -> bool {
        self.nodes[e].level != EMPTY
    }

    /// Level of an attached node.
    pub fn level(&self, e: EdgeId) -> u32 {
        let level = self.nodes[e].level;
        assert!(level != EMPTY, "{e} is not in any list");
        level as u32
    }

    pub fn node(&self, e: EdgeId) -> &ListNode {
        &self.nodes[e]
    }

    pub fn node_mut(&mut self, e: EdgeId) -> &mut ListNode {
        &mut self.nodes[e]
    }

    pub fn head(&self, k: u32) -> EdgeId {
        self.head.get(k as usize).copied().unwrap_or(EMPTY)
    }

    pub fn tail(&self, k: u32) -> EdgeId {
        self.tail.get(k as usize).copied().unwrap_or(EMPTY)
    }

    pub fn next(&self, e: EdgeId) -> EdgeId {
        self.nodes[e].next
    }

    pub fn prev(&self, e: EdgeId) -> EdgeId {
        self.nodes[e].prev
    }

    pub fn iter(&self, k: u32) -> impl Iterator<Item = EdgeId> + '_ {
        let first = self.head(k);
        std::iter::successors(Some(first).filter(|&e| e != EMPTY), |&e| {
            Some(self.next(e)).filter(|&f| f != EMPTY)
        })
    }

    /// Last node of the highest non-empty level strictly below k, or EMPTY.
    pub fn last_below(&self, k: u32) -> EdgeId {
        let below = (k as usize).min(self.tail.len());
        self.tail[..below]
            .iter()
            .rev()
            .copied()
            .find(|&t| t != EMPTY)
            .unwrap_or(EMPTY)
    }

    fn attach(&mut self, e: EdgeId, k: u32, prev: EdgeId, next: EdgeId) {
        assert!(!self.contains(e), "{e} is already in list {}", self.nodes[e].level);
        self.ensure_level(k);
        let node = &mut self.nodes[e];
        node.level = k as usize;
        node.prev = prev;
        node.next = next;
        let k = k as usize;
        if prev == EMPTY {
            self.head[k] = e;
        } else {
            self.nodes[prev].next = e;
        }
        if next == EMPTY {
            self.tail[k] = e;
        } else {
            self.nodes[next].prev = e;
        }
    }

    pub fn push_front(&mut self, k: u32, e: EdgeId) {
        let next = self.head(k);
        self.attach(e, k, EMPTY, next);
    }

    pub fn push_back(&mut self, k: u32, e: EdgeId) {
        let prev = self.tail(k);
        self.attach(e, k, prev, EMPTY);
    }

    /// Puts e right after `anchor`, in the anchor's list.
    pub fn insert_after(&mut self, anchor: EdgeId, e: EdgeId) {
        let k = self.level(anchor);
        let next = self.nodes[anchor].next;
        self.attach(e, k, anchor, next);
    }

    /// Detaches e, resetting its counters.
    pub fn remove(&mut self, e: EdgeId) {
        let k = self.level(e) as usize;
        let ListNode { prev, next, .. } = self.nodes[e];
        if prev == EMPTY {
            self.head[k] = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == EMPTY {
            self.tail[k] = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[e] = ListNode::default();
    }

    /// Panics if some list has broken links or holds a node tagged with another level.
    pub fn check_invariants(&self) {
        for k in 0..self.levels() {
            let mut prev = EMPTY;
            for e in self.iter(k as u32) {
                assert_eq!(self.nodes[e].level, k, "{e} listed at level {k}");
                assert_eq!(self.nodes[e].prev, prev, "broken back link at {e}");
                prev = e;
            }
            assert_eq!(self.tail[k], prev, "tail of level {k}");
        }
    }
}

impl Debug for GroupedLists {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let builder = TreeBuilder::new();
        let _b = builder.add_branch("GroupedLists");
        for k in 0..self.levels() {
            if self.head[k] == EMPTY {
                continue;
            }
            add_branch_to!(builder, "level {k} ({} .. {})", I(self.head[k]), I(self.tail[k]));
            for e in self.iter(k as u32) {
                let node = &self.nodes[e];
                add_leaf_to!(builder, "[{e}] {node:?}");
            }
        }
        writeln!(f, "{}", builder.string())
    }
}
