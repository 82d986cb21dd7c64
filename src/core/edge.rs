//! Canonical edge identifiers and the constrained-edge set.
//!
//! Edges are not stored explicitly; they are sides of triangles. [`EdgeKey`] names an
//! undirected edge by its two endpoint [`VertexKey`]s so `(a, b)` and `(b, a)` compare
//! and hash the same.
//!
//! [`ConstraintSet`] is the read-only collection of caller-constrained edges consulted
//! during legalization (does a candidate edge cross a constraint?) and outer removal
//! (is this side a barrier?).
//!
//! ## Determinism
//!
//! `EdgeKey` ordering derives from internal slotmap keys; it is deterministic for a
//! given input and insertion order, but carries no geometric meaning.

use crate::core::collections::FastHashSet;
use crate::core::collections::spatial_hash_grid::{SegmentHashGrid, cell_size_for_segments};
use crate::core::triangulation_data_structure::{Tds, VertexKey};
use crate::geometry::point::Point;
use crate::geometry::predicates::segments_intersect;
use crate::geometry::traits::coordinate::CoordinateScalar;
use slotmap::Key;

/// Canonical identifier for an (undirected) edge.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::core::edge::EdgeKey;
/// use constrained_delaunay::core::triangulation_data_structure::VertexKey;
/// use slotmap::KeyData;
///
/// let a = VertexKey::from(KeyData::from_ffi(1));
/// let b = VertexKey::from(KeyData::from_ffi(2));
/// assert_eq!(EdgeKey::new(a, b), EdgeKey::new(b, a));
/// assert_eq!(EdgeKey::new(b, a).endpoints(), (a, b));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    v0: VertexKey,
    v1: VertexKey,
}

impl EdgeKey {
    /// Creates a new canonical edge key with `v0 <= v1` in raw key order.
    #[must_use]
    pub fn new(a: VertexKey, b: VertexKey) -> Self {
        let a_raw = a.data().as_ffi();
        let b_raw = b.data().as_ffi();

        if a_raw <= b_raw {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }

    /// The first (canonical) endpoint.
    #[inline]
    #[must_use]
    pub const fn v0(self) -> VertexKey {
        self.v0
    }

    /// The second (canonical) endpoint.
    #[inline]
    #[must_use]
    pub const fn v1(self) -> VertexKey {
        self.v1
    }

    /// Both endpoints in canonical order.
    #[inline]
    #[must_use]
    pub const fn endpoints(self) -> (VertexKey, VertexKey) {
        (self.v0, self.v1)
    }

    /// Returns `true` if `vertex` is an endpoint.
    #[inline]
    #[must_use]
    pub fn contains(self, vertex: VertexKey) -> bool {
        self.v0 == vertex || self.v1 == vertex
    }
}

impl From<(VertexKey, VertexKey)> for EdgeKey {
    #[inline]
    fn from((a, b): (VertexKey, VertexKey)) -> Self {
        Self::new(a, b)
    }
}

/// A constrained edge with its endpoint locations.
#[derive(Clone, Copy, Debug)]
pub struct ConstrainedSegment<T> {
    /// Canonical edge key.
    pub edge: EdgeKey,
    /// Location of `edge.v0()`.
    pub start: Point<T>,
    /// Location of `edge.v1()`.
    pub end: Point<T>,
}

impl<T: CoordinateScalar> PartialEq for ConstrainedSegment<T> {
    fn eq(&self, other: &Self) -> bool {
        self.edge == other.edge && self.start == other.start && self.end == other.end
    }
}

/// Read-only set of constrained edges with a spatial index for crossing queries.
#[derive(Clone, Debug)]
pub struct ConstraintSet<T>
where
    T: CoordinateScalar,
{
    edges: FastHashSet<EdgeKey>,
    segments: Vec<ConstrainedSegment<T>>,
    grid: SegmentHashGrid<T, usize>,
}

impl<T: CoordinateScalar> Default for ConstraintSet<T> {
    fn default() -> Self {
        Self {
            edges: FastHashSet::default(),
            segments: Vec::new(),
            grid: SegmentHashGrid::new(T::zero()),
        }
    }
}

impl<T: CoordinateScalar> ConstraintSet<T> {
    /// Builds the set from vertex-key pairs; repeated edges are kept once.
    ///
    /// # Panics
    ///
    /// Panics if an endpoint is not registered in `tds`.
    #[must_use]
    pub fn new(tds: &Tds<T>, edges: impl IntoIterator<Item = (VertexKey, VertexKey)>) -> Self {
        let mut set = FastHashSet::default();
        let segments: Vec<_> = edges
            .into_iter()
            .map(EdgeKey::from)
            .filter(|edge| set.insert(*edge))
            .map(|edge| ConstrainedSegment {
                edge,
                start: *tds.point(edge.v0()),
                end: *tds.point(edge.v1()),
            })
            .collect();

        let mut grid =
            SegmentHashGrid::new(cell_size_for_segments(segments.iter().map(|s| (s.start, s.end))));
        for (index, segment) in segments.iter().enumerate() {
            grid.insert_segment(index, &segment.start, &segment.end);
        }
        Self {
            edges: set,
            segments,
            grid,
        }
    }

    /// Returns `true` if the undirected edge `a`-`b` is constrained.
    #[inline]
    #[must_use]
    pub fn contains(&self, a: VertexKey, b: VertexKey) -> bool {
        self.edges.contains(&EdgeKey::new(a, b))
    }

    /// Returns `true` if `edge` is constrained.
    #[inline]
    #[must_use]
    pub fn contains_edge(&self, edge: &EdgeKey) -> bool {
        self.edges.contains(edge)
    }

    /// Number of distinct constrained edges.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if there are no constrained edges.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Constrained segments in insertion order.
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[ConstrainedSegment<T>] {
        &self.segments
    }

    /// Returns `true` if segment `p`-`q` properly crosses any constrained edge.
    ///
    /// Sharing an endpoint with a constraint, or lying along one, is not a crossing.
    #[must_use]
    pub fn crosses_any(&self, p: &Point<T>, q: &Point<T>) -> bool {
        let mut crossed = false;
        self.grid.for_each_candidate(p, q, |index| {
            let segment = &self.segments[index];
            crossed = segments_intersect(p, q, &segment.start, &segment.end);
            !crossed
        });
        crossed
    }
}
