/// Dummy order oracle, every operation takes linear time.
#[derive(Debug, Clone, Default)]
pub struct SlowOrder {
    order: Vec<usize>,
}

#[allow(dead_code)]
impl SlowOrder {
    fn position(&self, x: usize) -> usize {
        self.order.iter().position(|&y| y == x).unwrap()
    }

    /// Inserts x after `anchor`, or first when there is no anchor.
    pub fn insert_after(&mut self, anchor: Option<usize>, x: usize) {
        let at = anchor.map_or(0, |a| self.position(a) + 1);
        self.order.insert(at, x);
    }

    pub fn remove(&mut self, x: usize) {
        let at = self.position(x);
        self.order.remove(at);
    }

    pub fn precedes(&self, a: usize, b: usize) -> bool {
        self.position(a) < self.position(b)
    }

    pub fn contains(&self, x: usize) -> bool {
        self.order.contains(&x)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}
