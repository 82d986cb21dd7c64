//! The finished triangulation returned to callers.
//!
//! [`Triangulation`] is a plain indexed mesh: a copy of the input points plus a list of
//! [`IndexedTriangle`]s naming those points by index, clockwise. It carries the
//! constrained edges it honors and the statistics of the run that built it, and offers
//! the checks used to verify a result: [`Triangulation::validate`] (structure),
//! [`Triangulation::validate_delaunay`] (empty circumcircles) and
//! [`Triangulation::validate_constraints`].

use std::fmt;

use thiserror::Error;

use crate::core::algorithms::flips::LegalizationStats;
use crate::core::collections::spatial_hash_grid::{SegmentHashGrid, cell_size_for_segments};
use crate::core::collections::{FastHashMap, FastHashSet, fast_hash_map_with_capacity};
use crate::core::delaunay_triangulation::Domain;
use crate::geometry::point::Point;
use crate::geometry::predicates::{Circle, is_strictly_clockwise, segments_intersect, signed_double_area};
use crate::geometry::traits::coordinate::CoordinateScalar;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Defects found by the output checks.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TriangulationValidationError {
    /// A triangle names a point index outside the vertex list.
    #[error("Triangle {triangle:?} references vertex {index}, but only {len} vertices exist")]
    IndexOutOfRange {
        /// Corner indices of the offending triangle.
        triangle: [usize; 3],
        /// The bad index.
        index: usize,
        /// Number of vertices.
        len: usize,
    },
    /// A triangle is counter-clockwise or has zero area.
    #[error("Triangle {triangle:?} is not strictly clockwise")]
    NotStrictlyClockwise {
        /// Corner indices of the offending triangle.
        triangle: [usize; 3],
    },
    /// Two triangles traverse the same edge in the same direction, so they overlap.
    #[error("Directed edge {from}->{to} is used by more than one triangle")]
    OverlappingTriangles {
        /// Edge start.
        from: usize,
        /// Edge end.
        to: usize,
    },
    /// Two adjacent triangles fail the empty-circumcircle test across an unenforced
    /// edge.
    #[error("Triangles {first:?} and {second:?} violate the Delaunay property")]
    DelaunayViolation {
        /// Corner indices of the first triangle.
        first: [usize; 3],
        /// Corner indices of the second triangle.
        second: [usize; 3],
    },
    /// A constrained edge is not a side of any triangle.
    #[error("Constrained edge {start}-{end} is missing from the triangulation")]
    MissingConstrainedEdge {
        /// First endpoint.
        start: usize,
        /// Second endpoint.
        end: usize,
    },
}

// =============================================================================
// TRIANGLES AND STATISTICS
// =============================================================================

/// A triangle naming three input points by index, in clockwise order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexedTriangle {
    corners: [usize; 3],
}

impl IndexedTriangle {
    /// Creates a triangle from three point indices.
    #[must_use]
    pub const fn new(corners: [usize; 3]) -> Self {
        Self { corners }
    }

    /// Corner indices in clockwise order.
    #[inline]
    #[must_use]
    pub const fn corners(&self) -> [usize; 3] {
        self.corners
    }

    /// Returns `true` if `index` is a corner.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.corners.contains(&index)
    }

    /// The three sides as directed `(from, to)` pairs following the clockwise order.
    #[must_use]
    pub const fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.corners;
        [(a, b), (b, c), (c, a)]
    }

    /// Returns `true` if `a`-`b` (in either direction) is a side.
    #[must_use]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.edges()
            .iter()
            .any(|&(u, v)| (u, v) == (a, b) || (u, v) == (b, a))
    }
}

impl fmt::Display for IndexedTriangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.corners;
        write!(f, "[{a}, {b}, {c}]")
    }
}

/// Counters describing how a triangulation was built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriangulationStatistics {
    /// Number of input points.
    pub input_points: usize,
    /// Triangle splits performed (one per inserted point).
    pub insertions: usize,
    /// Legalization counters across insertion and recovery.
    pub legalization: LegalizationStats,
    /// Flips spent forcing constrained and hull edges into the mesh.
    pub recovery_flips: usize,
    /// Triangles removed by the outer flood fill.
    pub removed_triangles: usize,
}

impl fmt::Display for TriangulationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "points={} insertions={} flips={} checked={} recovery_flips={} removed={}",
            self.input_points,
            self.insertions,
            self.legalization.flips_performed,
            self.legalization.edges_checked,
            self.recovery_flips,
            self.removed_triangles,
        )
    }
}

fn canonical(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

// =============================================================================
// TRIANGULATION
// =============================================================================

/// A constrained Delaunay triangulation of a point set.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::prelude::*;
///
/// let points = [
///     Point::new(0.0_f64, 0.0),
///     Point::new(4.0, 0.0),
///     Point::new(4.0, 4.0),
///     Point::new(0.0, 4.0),
/// ];
/// let triangulation = triangulate_constrained(&points, &[(0, 2)]).unwrap();
/// assert_eq!(triangulation.number_of_triangles(), 2);
/// assert!(triangulation.is_constrained_edge(2, 0));
/// assert!((triangulation.area() - 16.0).abs() < 1e-12);
/// assert!(triangulation.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct Triangulation<T>
where
    T: CoordinateScalar,
{
    vertices: Vec<Point<T>>,
    triangles: Vec<IndexedTriangle>,
    constrained_edges: Vec<(usize, usize)>,
    constrained_lookup: FastHashSet<(usize, usize)>,
    domain: Domain,
    statistics: TriangulationStatistics,
}

impl<T> Triangulation<T>
where
    T: CoordinateScalar,
{
    /// Assembles a triangulation; constrained edges are canonicalized and deduplicated.
    pub(crate) fn new(
        vertices: Vec<Point<T>>,
        mut triangles: Vec<IndexedTriangle>,
        constrained_edges: &[(usize, usize)],
        domain: Domain,
        statistics: TriangulationStatistics,
    ) -> Self {
        triangles.sort_unstable();
        let mut constrained_lookup = FastHashSet::default();
        let constrained_edges = constrained_edges
            .iter()
            .map(|&(a, b)| canonical(a, b))
            .filter(|edge| constrained_lookup.insert(*edge))
            .collect();
        Self {
            vertices,
            triangles,
            constrained_edges,
            constrained_lookup,
            domain,
            statistics,
        }
    }

    /// The input points, in input order.
    #[must_use]
    pub fn vertices(&self) -> &[Point<T>] {
        &self.vertices
    }

    /// The triangles, sorted by corner indices.
    #[must_use]
    pub fn triangles(&self) -> &[IndexedTriangle] {
        &self.triangles
    }

    /// Number of triangles.
    #[must_use]
    pub fn number_of_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Corner locations of `triangle`.
    ///
    /// # Panics
    ///
    /// Panics if `triangle` names an index outside [`Triangulation::vertices`].
    #[must_use]
    pub fn triangle_points(&self, triangle: &IndexedTriangle) -> [Point<T>; 3] {
        triangle.corners().map(|i| self.vertices[i])
    }

    /// Constrained edges honored by the triangulation, as `(min, max)` index pairs.
    #[must_use]
    pub fn constrained_edges(&self) -> &[(usize, usize)] {
        &self.constrained_edges
    }

    /// Returns `true` if `a`-`b` was a constrained edge.
    #[must_use]
    pub fn is_constrained_edge(&self, a: usize, b: usize) -> bool {
        self.constrained_lookup.contains(&canonical(a, b))
    }

    /// The region this triangulation covers.
    #[must_use]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Counters from the run that built this triangulation.
    #[must_use]
    pub const fn statistics(&self) -> &TriangulationStatistics {
        &self.statistics
    }

    /// All distinct edges as sorted `(min, max)` index pairs.
    #[must_use]
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<_> = self
            .triangles
            .iter()
            .flat_map(IndexedTriangle::edges)
            .map(|(a, b)| canonical(a, b))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Total area covered by the triangles.
    #[must_use]
    pub fn area(&self) -> T {
        let two = T::one() + T::one();
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = self.triangle_points(t);
                signed_double_area(&a, &b, &c).abs() / two
            })
            .fold(T::zero(), |sum, area| sum + area)
    }

    /// Checks indices, strict clockwise orientation, and that no two triangles
    /// overlap along an edge.
    ///
    /// # Errors
    ///
    /// Returns the first [`TriangulationValidationError`] found.
    pub fn validate(&self) -> Result<(), TriangulationValidationError> {
        let mut directed: FastHashSet<(usize, usize)> = FastHashSet::default();
        for triangle in &self.triangles {
            let corners = triangle.corners();
            if let Some(&index) = corners.iter().find(|&&i| i >= self.vertices.len()) {
                return Err(TriangulationValidationError::IndexOutOfRange {
                    triangle: corners,
                    index,
                    len: self.vertices.len(),
                });
            }
            let [a, b, c] = self.triangle_points(triangle);
            if !is_strictly_clockwise(&a, &b, &c) {
                return Err(TriangulationValidationError::NotStrictlyClockwise { triangle: corners });
            }
            for (from, to) in triangle.edges() {
                if !directed.insert((from, to)) {
                    return Err(TriangulationValidationError::OverlappingTriangles { from, to });
                }
            }
        }
        Ok(())
    }

    /// Checks that every constrained edge is a side of some triangle.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationValidationError::MissingConstrainedEdge`] for the first
    /// absent edge.
    pub fn validate_constraints(&self) -> Result<(), TriangulationValidationError> {
        let present: FastHashSet<(usize, usize)> = self
            .triangles
            .iter()
            .flat_map(IndexedTriangle::edges)
            .map(|(a, b)| canonical(a, b))
            .collect();
        match self
            .constrained_edges
            .iter()
            .find(|edge| !present.contains(edge))
        {
            Some(&(start, end)) => Err(TriangulationValidationError::MissingConstrainedEdge { start, end }),
            None => Ok(()),
        }
    }

    /// Checks the empty-circumcircle property across every interior edge where
    /// neither the edge nor its flipped counterpart crosses or is a constrained edge.
    ///
    /// An apex counts as inside only when it clears the circle boundary by more than
    /// the scalar's default relative tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationValidationError::DelaunayViolation`] for the first
    /// offending pair.
    pub fn validate_delaunay(&self) -> Result<(), TriangulationValidationError> {
        let mut grid = SegmentHashGrid::new(cell_size_for_segments(
            self.constrained_edges
                .iter()
                .map(|&(a, b)| (self.vertices[a], self.vertices[b])),
        ));
        for (index, &(a, b)) in self.constrained_edges.iter().enumerate() {
            grid.insert_segment(index, &self.vertices[a], &self.vertices[b]);
        }
        let crosses_constraint = |p: usize, q: usize| {
            let (pp, pq) = (&self.vertices[p], &self.vertices[q]);
            let mut crossed = false;
            grid.for_each_candidate(pp, pq, |index| {
                let (a, b) = self.constrained_edges[index];
                crossed = segments_intersect(pp, pq, &self.vertices[a], &self.vertices[b]);
                !crossed
            });
            crossed
        };

        // directed edge -> (triangle, apex)
        let mut owners: FastHashMap<(usize, usize), (usize, usize)> =
            fast_hash_map_with_capacity(self.triangles.len() * 3);
        for (t, triangle) in self.triangles.iter().enumerate() {
            let [a, b, c] = triangle.corners();
            owners.insert((a, b), (t, c));
            owners.insert((b, c), (t, a));
            owners.insert((c, a), (t, b));
        }

        let tolerance = T::default_tolerance();
        for (&(s1, s2), &(t1, d1)) in &owners {
            let Some(&(t2, d2)) = owners.get(&(s2, s1)) else {
                continue;
            };
            if t1 > t2
                || self.is_constrained_edge(s1, s2)
                || crosses_constraint(s1, s2)
                || crosses_constraint(d1, d2)
            {
                continue;
            }
            let [p1, p2, q1, q2] = [s1, s2, d1, d2].map(|i| self.vertices[i]);
            let clearly_inside = |a: &Point<T>, b: &Point<T>, c: &Point<T>, p: &Point<T>| {
                Circle::circumscribing(a, b, c).is_some_and(|circle| {
                    let distance = (*p - circle.center()).squared_length();
                    distance < circle.squared_radius() * (T::one() - tolerance)
                })
            };
            if clearly_inside(&p1, &p2, &q1, &q2) || clearly_inside(&p2, &p1, &q2, &q1) {
                return Err(TriangulationValidationError::DelaunayViolation {
                    first: self.triangles[t1].corners(),
                    second: self.triangles[t2].corners(),
                });
            }
        }
        Ok(())
    }
}
