//! Triangle records stored in the triangulation data structure.
//!
//! Corners are kept in clockwise order. Side `i` is opposite corner `i` and borders
//! the edge between corners `i + 1` and `i + 2` (mod 3); `neighbors[i]` is the
//! triangle across that side, if any.

use crate::core::collections::VertexKeySet;
use crate::core::triangulation_data_structure::{TriangleKey, VertexKey};

/// A triangle: three clockwise corners, three optional neighbors, and the tracked
/// vertices waiting inside it.
#[derive(Clone, Debug, Default)]
pub struct Triangle {
    corners: [VertexKey; 3],
    neighbors: [Option<TriangleKey>; 3],
    remaining: VertexKeySet,
    flagged: bool,
}

/// Next index in cyclic corner order.
#[inline]
#[must_use]
pub const fn next_index(i: usize) -> usize {
    (i + 1) % 3
}

/// Previous index in cyclic corner order.
#[inline]
#[must_use]
pub const fn prev_index(i: usize) -> usize {
    (i + 2) % 3
}

impl Triangle {
    pub(crate) fn new(corners: [VertexKey; 3]) -> Self {
        Self {
            corners,
            neighbors: [None; 3],
            remaining: VertexKeySet::default(),
            flagged: false,
        }
    }

    /// The three corners in clockwise order.
    #[inline]
    #[must_use]
    pub const fn corners(&self) -> &[VertexKey; 3] {
        &self.corners
    }

    /// Corner `i`.
    #[inline]
    #[must_use]
    pub const fn corner(&self, i: usize) -> VertexKey {
        self.corners[i]
    }

    /// Neighbor across side `side`.
    #[inline]
    #[must_use]
    pub const fn neighbor(&self, side: usize) -> Option<TriangleKey> {
        self.neighbors[side]
    }

    /// All three neighbor slots.
    #[inline]
    #[must_use]
    pub const fn neighbors(&self) -> &[Option<TriangleKey>; 3] {
        &self.neighbors
    }

    /// Endpoints of side `side`, in the triangle's clockwise order.
    #[inline]
    #[must_use]
    pub const fn edge(&self, side: usize) -> (VertexKey, VertexKey) {
        (self.corners[next_index(side)], self.corners[prev_index(side)])
    }

    /// Position of `vertex` among the corners.
    #[must_use]
    pub fn corner_index(&self, vertex: VertexKey) -> Option<usize> {
        self.corners.iter().position(|&c| c == vertex)
    }

    /// Returns `true` if `vertex` is a corner.
    #[must_use]
    pub fn has_corner(&self, vertex: VertexKey) -> bool {
        self.corners.contains(&vertex)
    }

    /// Side whose neighbor slot holds `neighbor`.
    #[must_use]
    pub fn side_of_neighbor(&self, neighbor: TriangleKey) -> Option<usize> {
        self.neighbors.iter().position(|&n| n == Some(neighbor))
    }

    /// Side bordering the undirected edge `a`-`b`.
    #[must_use]
    pub fn side_of_edge(&self, a: VertexKey, b: VertexKey) -> Option<usize> {
        let ia = self.corner_index(a)?;
        let ib = self.corner_index(b)?;
        if ia == ib {
            return None;
        }
        Some(3 - ia - ib)
    }

    /// Tracked vertices known to lie inside this triangle.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> &VertexKeySet {
        &self.remaining
    }

    /// Returns `true` once the triangle is scheduled for removal.
    #[inline]
    #[must_use]
    pub const fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub(crate) const fn set_neighbor(&mut self, side: usize, neighbor: Option<TriangleKey>) {
        self.neighbors[side] = neighbor;
    }

    pub(crate) fn remaining_mut(&mut self) -> &mut VertexKeySet {
        &mut self.remaining
    }

    pub(crate) const fn flag(&mut self) {
        self.flagged = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collections::StorageMap;

    fn keys() -> [VertexKey; 4] {
        let mut map: StorageMap<VertexKey, ()> = StorageMap::with_key();
        [map.insert(()), map.insert(()), map.insert(()), map.insert(())]
    }

    #[test]
    fn sides_are_opposite_corners() {
        let [a, b, c, d] = keys();
        let t = Triangle::new([a, b, c]);
        assert_eq!(t.edge(0), (b, c));
        assert_eq!(t.edge(1), (c, a));
        assert_eq!(t.edge(2), (a, b));
        assert_eq!(t.side_of_edge(b, c), Some(0));
        assert_eq!(t.side_of_edge(a, c), Some(1));
        assert_eq!(t.side_of_edge(b, a), Some(2));
        assert_eq!(t.side_of_edge(a, d), None);
        assert_eq!(t.side_of_edge(a, a), None);
    }

    #[test]
    fn neighbor_lookup() {
        let [a, b, c, _] = keys();
        let mut triangles: StorageMap<TriangleKey, Triangle> = StorageMap::with_key();
        let t0 = triangles.insert(Triangle::new([a, b, c]));
        let t1 = triangles.insert(Triangle::new([c, b, a]));
        let t = &mut triangles[t0];
        t.set_neighbor(1, Some(t1));
        assert_eq!(t.neighbor(1), Some(t1));
        assert_eq!(t.side_of_neighbor(t1), Some(1));
        assert_eq!(t.side_of_neighbor(t0), None);
        assert!(!t.is_flagged());
        t.flag();
        assert!(t.is_flagged());
    }

    #[test]
    fn cyclic_indices() {
        assert_eq!((0..3).map(next_index).collect::<Vec<_>>(), vec![1, 2, 0]);
        assert_eq!((0..3).map(prev_index).collect::<Vec<_>>(), vec![2, 0, 1]);
    }
}
