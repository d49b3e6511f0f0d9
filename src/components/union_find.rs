//! Disjoint-set (union-find) over a flat index arena.

#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    /// Append a new singleton set and return its index.
    pub fn push(&mut self) -> usize {
        let index = self.parent.len();
        self.parent.push(index);
        index
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of `x`, halving the path on the way up.
    pub fn find(&mut self, x: usize) -> usize {
        let mut current = x;
        while self.parent[current] != current {
            self.parent[current] = self.parent[self.parent[current]];
            current = self.parent[current];
        }
        current
    }

    /// Order-dependent union: the smaller index always becomes the representative.
    /// Returns `true` if `a` and `b` were in different sets.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (min, max) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent[max] = min;
        true
    }
}
