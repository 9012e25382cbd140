//! Order-maintenance labels over edge ids: constant time "does a come before b" for a list
//! that grows by inserting after an existing element.
//!
//! Labels sit in a two-level scheme. Elements are grouped into runs of at most `group_cap`
//! members; each element carries a tag local to its group, and groups carry global tags.
//! Comparing two elements compares (group tag, local tag). A full group splits in two, and a
//! group tag collision relabels the smallest enclosing power-of-two tag range that is sparse
//! enough to hold it.

use std::fmt::{Debug, Formatter};

use debug_tree::{add_branch_to, add_leaf_to, TreeBuilder};
use derivative::Derivative;

use crate::edge_store::{EdgeId, EMPTY};
use crate::lists::node_fmt;

/// Exclusive upper bound of group tags.
const GROUP_END: u64 = 1 << 62;
/// Exclusive upper bound of local tags.
const LOCAL_SPAN: u64 = 1 << 32;
/// Spacing between group tags after a bulk load.
const LOAD_SPACING: u64 = 1 << 32;

pub const DEFAULT_GROUP_CAP: usize = 30;

#[derive(Derivative, Clone)]
#[derivative(Debug)]
struct Label {
    tag: u64,
    #[derivative(Debug(format_with = "node_fmt"))]
    group: usize,
    #[derivative(Debug(format_with = "node_fmt"))]
    prev: EdgeId,
    #[derivative(Debug(format_with = "node_fmt"))]
    next: EdgeId,
}

impl Default for Label {
    fn default() -> Self {
        Self {
            tag: 0,
            group: EMPTY,
            prev: EMPTY,
            next: EMPTY,
        }
    }
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
struct Group {
    tag: u64,
    len: usize,
    #[derivative(Debug(format_with = "node_fmt"))]
    head: EdgeId,
    #[derivative(Debug(format_with = "node_fmt"))]
    prev: usize,
    #[derivative(Debug(format_with = "node_fmt"))]
    next: usize,
}

#[derive(Clone)]
pub struct OrderLabels {
    labels: Vec<Label>,
    groups: Vec<Group>,
    free_groups: Vec<usize>,
    group_cap: usize,
    len: usize,
}

impl OrderLabels {
    /// Empty order over ids 0..capacity, with groups of at most `group_cap` members.
    pub fn new(capacity: usize, group_cap: usize) -> Self {
        assert!(group_cap >= 2, "groups must hold at least two labels");
        let mut om = Self {
            labels: vec![Label::default(); capacity + 1],
            groups: vec![],
            free_groups: vec![],
            group_cap,
            len: 0,
        };
        om.reset();
        om
    }

    fn reset(&mut self) {
        self.labels.fill(Label::default());
        self.groups.clear();
        self.free_groups.clear();
        self.len = 0;
        let s = self.sentinel();
        self.groups.push(Group {
            tag: 0,
            len: 1,
            head: s,
            prev: EMPTY,
            next: EMPTY,
        });
        self.labels[s].group = 0;
    }

    /// The element before every real one. Inserting after it puts an id first.
    pub fn sentinel(&self) -> EdgeId {
        self.labels.len() - 1
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, x: EdgeId) -> bool {
        x < self.sentinel() && self.labels[x].group != EMPTY
    }

    /// First element, or EMPTY.
    pub fn head(&self) -> EdgeId {
        self.labels[self.sentinel()].next
    }

    pub fn next(&self, x: EdgeId) -> EdgeId {
        self.labels[x].next
    }

    /// Element before x, or EMPTY if x is first.
    pub fn prev(&self, x: EdgeId) -> EdgeId {
        let p = self.labels[x].prev;
        if p == self.sentinel() {
            EMPTY
        } else {
            p
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = EdgeId> + '_ {
        std::iter::successors(Some(self.head()).filter(|&x| x != EMPTY), |&x| {
            Some(self.next(x)).filter(|&y| y != EMPTY)
        })
    }

    fn key(&self, x: EdgeId) -> (u64, u64) {
        let label = &self.labels[x];
        assert!(label.group != EMPTY, "{x} is not in the order");
        (self.groups[label.group].tag, label.tag)
    }

    /// Whether a comes strictly before b. Both must be present; the sentinel precedes all.
    pub fn precedes(&self, a: EdgeId, b: EdgeId) -> bool {
        self.key(a) < self.key(b)
    }

    /// Inserts x right after `anchor`, which is present or the sentinel.
    pub fn insert_after(&mut self, anchor: EdgeId, x: EdgeId) {
        assert!(!self.contains(x), "{x} is already in the order");
        assert!(x < self.sentinel(), "{x} out of range");
        let mut g = self.labels[anchor].group;
        assert!(g != EMPTY, "anchor {anchor} is not in the order");
        if self.groups[g].len >= self.group_cap {
            self.split(g);
            g = self.labels[anchor].group;
        }
        let (mut lo, mut hi) = self.local_gap(anchor);
        if hi - lo < 2 {
            self.relabel_members(g);
            (lo, hi) = self.local_gap(anchor);
        }
        let next = self.labels[anchor].next;
        self.labels[x] = Label {
            tag: lo + (hi - lo) / 2,
            group: g,
            prev: anchor,
            next,
        };
        self.labels[anchor].next = x;
        if next != EMPTY {
            self.labels[next].prev = x;
        }
        self.groups[g].len += 1;
        self.len += 1;
    }

    /// Tags strictly bounding the slot right after `anchor` inside its group.
    fn local_gap(&self, anchor: EdgeId) -> (u64, u64) {
        let label = &self.labels[anchor];
        let hi = match label.next {
            EMPTY => LOCAL_SPAN,
            next if self.labels[next].group == label.group => self.labels[next].tag,
            _ => LOCAL_SPAN,
        };
        (label.tag, hi)
    }

    pub fn remove(&mut self, x: EdgeId) {
        assert!(self.contains(x), "removing {x} which is not in the order");
        let Label {
            group, prev, next, ..
        } = self.labels[x].clone();
        self.labels[prev].next = next;
        if next != EMPTY {
            self.labels[next].prev = prev;
        }
        let successor = if next != EMPTY && self.labels[next].group == group {
            next
        } else {
            EMPTY
        };
        let grp = &mut self.groups[group];
        grp.len -= 1;
        if grp.head == x {
            grp.head = successor;
        }
        if grp.len == 0 {
            self.free_group(group);
        }
        self.labels[x] = Label::default();
        self.len -= 1;
    }

    /// Replaces the content with `order`, spacing groups evenly.
    pub fn load(&mut self, order: &[EdgeId]) {
        self.reset();
        let chunk = (self.group_cap / 2).max(1);
        let groups = order.len().div_ceil(chunk) as u64;
        let spacing = LOAD_SPACING.min(GROUP_END / (groups + 2));
        let mut last = self.sentinel();
        for (i, members) in order.chunks(chunk).enumerate() {
            let g = self.new_group_after(self.labels[last].group, (i as u64 + 1) * spacing);
            let step = LOCAL_SPAN / (members.len() as u64 + 1);
            for (j, &x) in members.iter().enumerate() {
                assert!(!self.contains(x), "{x} appears twice in the loaded order");
                self.labels[x] = Label {
                    tag: step * (j as u64 + 1),
                    group: g,
                    prev: last,
                    next: EMPTY,
                };
                self.labels[last].next = x;
                last = x;
            }
            self.groups[g].head = members[0];
            self.groups[g].len = members.len();
            self.len += members.len();
        }
    }

    fn new_group_after(&mut self, g: usize, tag: u64) -> usize {
        let next = self.groups[g].next;
        let group = Group {
            tag,
            len: 0,
            head: EMPTY,
            prev: g,
            next,
        };
        let h = match self.free_groups.pop() {
            Some(h) => {
                self.groups[h] = group;
                h
            }
            None => {
                self.groups.push(group);
                self.groups.len() - 1
            }
        };
        self.groups[g].next = h;
        if next != EMPTY {
            self.groups[next].prev = h;
        }
        h
    }

    fn free_group(&mut self, g: usize) {
        let Group { prev, next, .. } = self.groups[g];
        assert!(prev != EMPTY, "freeing the sentinel group");
        self.groups[prev].next = next;
        if next != EMPTY {
            self.groups[next].prev = prev;
        }
        self.groups[g].head = EMPTY;
        self.free_groups.push(g);
    }

    fn members(&self, g: usize) -> Vec<EdgeId> {
        let grp = &self.groups[g];
        let mut members = Vec::with_capacity(grp.len);
        let mut x = grp.head;
        for _ in 0..grp.len {
            members.push(x);
            x = self.labels[x].next;
        }
        members
    }

    /// Spreads local tags of g evenly over the local span.
    fn relabel_members(&mut self, g: usize) {
        let members = self.members(g);
        let step = LOCAL_SPAN / (members.len() as u64 + 1);
        for (j, x) in members.into_iter().enumerate() {
            self.labels[x].tag = step * (j as u64 + 1);
        }
    }

    /// Moves the second half of a full group into a new group right after it.
    fn split(&mut self, g: usize) {
        let (mut lo, mut hi) = self.group_gap(g);
        if hi - lo < 2 {
            self.relabel_groups(g);
            (lo, hi) = self.group_gap(g);
        }
        let h = self.new_group_after(g, lo + (hi - lo) / 2);
        let members = self.members(g);
        let half = members.len() / 2;
        for &x in &members[half..] {
            self.labels[x].group = h;
        }
        self.groups[h].head = members[half];
        self.groups[h].len = members.len() - half;
        self.groups[g].len = half;
        self.relabel_members(g);
        self.relabel_members(h);
        log::trace!("split group {g} into {h}");
    }

    fn group_gap(&self, g: usize) -> (u64, u64) {
        let grp = &self.groups[g];
        let hi = match grp.next {
            EMPTY => GROUP_END,
            next => self.groups[next].tag,
        };
        (grp.tag, hi)
    }

    /// Finds the smallest aligned tag range around g whose group count is below (4/3)^bits
    /// and spreads those groups evenly over it.
    fn relabel_groups(&mut self, g: usize) {
        let tag = self.groups[g].tag;
        let mut bits = 1u32;
        let (first, count, lo, span) = loop {
            let span = if bits >= 62 { GROUP_END } else { 1u64 << bits };
            let lo = tag & !(span - 1);
            let hi = lo + span;
            let mut first = g;
            let mut count = 1u64;
            while self.groups[first].prev != EMPTY
                && self.groups[self.groups[first].prev].tag >= lo
            {
                first = self.groups[first].prev;
                count += 1;
            }
            let mut last = g;
            while self.groups[last].next != EMPTY && self.groups[self.groups[last].next].tag < hi
            {
                last = self.groups[last].next;
                count += 1;
            }
            let sparse = (count as f64) < (4.0f64 / 3.0).powi(bits as i32)
                && span / (count + 1) >= 2;
            if sparse || bits >= 62 {
                break (first, count, lo, span);
            }
            bits += 1;
        };
        let step = span / (count + 1);
        assert!(step >= 2, "group tag space exhausted");
        let mut h = first;
        for j in 0..count {
            self.groups[h].tag = lo + step * (j + 1);
            h = self.groups[h].next;
        }
        log::debug!("relabeled {count} groups over a range of 2^{bits}");
    }

    /// Panics if links, group sizes or tags are inconsistent.
    pub fn check_invariants(&self) {
        let mut x = self.sentinel();
        let mut seen = 0;
        let mut group_count = vec![0; self.groups.len()];
        group_count[0] = 1;
        while self.labels[x].next != EMPTY {
            let y = self.labels[x].next;
            assert_eq!(self.labels[y].prev, x, "broken back link at {y}");
            assert!(self.precedes(x, y), "tags out of order at {x} -> {y}");
            let (gx, gy) = (self.labels[x].group, self.labels[y].group);
            if gx != gy {
                assert_eq!(self.groups[gx].next, gy, "groups {gx} and {gy} not adjacent");
                assert_eq!(self.groups[gy].head, y, "{y} should head group {gy}");
            }
            assert!(self.labels[y].tag < LOCAL_SPAN);
            group_count[gy] += 1;
            seen += 1;
            x = y;
        }
        assert_eq!(seen, self.len);
        let mut g = 0;
        while g != EMPTY {
            assert_eq!(self.groups[g].len, group_count[g], "group {g} size");
            assert!(self.groups[g].len <= self.group_cap);
            g = self.groups[g].next;
        }
    }
}

impl Debug for OrderLabels {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let builder = TreeBuilder::new();
        let _b = builder.add_branch("OrderLabels");
        let mut g = 0;
        while g != EMPTY {
            let grp = &self.groups[g];
            add_branch_to!(builder, "group {g} {grp:?}");
            for x in self.members(g) {
                let label = &self.labels[x];
                add_leaf_to!(builder, "[{x}] {label:?}");
            }
            g = grp.next;
        }
        writeln!(f, "{}", builder.string())
    }
}
