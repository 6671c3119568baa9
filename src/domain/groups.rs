/// Color groups: union-find over cell ids.
///
/// Path compression + union by rank. Groups only ever merge, never split.
/// The number of distinct roots is tracked incrementally.

use super::jelly::CellId;

#[derive(Clone, Debug, Default)]
pub struct ColorGroups {
    parent: Vec<usize>,
    rank: Vec<u8>,
    roots: usize,
}

impl ColorGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new singleton group. Ids must be added densely, in order.
    pub fn add(&mut self, id: CellId) {
        debug_assert_eq!(id.0, self.parent.len());
        self.parent.push(id.0);
        self.rank.push(0);
        self.roots += 1;
    }

    pub fn find(&mut self, id: CellId) -> usize {
        let mut root = id.0;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = id.0;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Unify two groups. Returns true if they were distinct.
    pub fn union(&mut self, a: CellId, b: CellId) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        self.roots -= 1;
        true
    }

    /// Number of distinct groups.
    pub fn count(&self) -> usize {
        self.roots
    }
}
