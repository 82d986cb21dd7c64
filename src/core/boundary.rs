//! Super-triangle construction and outer-region removal.
//!
//! Construction wraps every input point in one clockwise triangle whose corners are
//! synthetic vertices far outside the data. After all insertions and constraint
//! recovery, [`remove_outer_triangles`] flood-fills from every triangle touching one of
//! those synthetic corners, crossing only non-barrier edges, and deletes what it
//! reaches.

use crate::core::triangulation_data_structure::{Tds, TriangleKey, VertexKey};
use crate::core::util::invariant_violation;
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Default scale applied to the largest absolute input coordinate.
pub const DEFAULT_SUPER_TRIANGLE_MARGIN: f64 = 4.0;

/// Default offset nudging the super-triangle corners off the coordinate axes, as a
/// fraction of the input extent.
pub const DEFAULT_SUPER_TRIANGLE_JITTER: f64 = 0.000_372;

/// Largest accepted jitter fraction.
pub const MAX_SUPER_TRIANGLE_JITTER: f64 = 0.1;

/// Smallest margin for which the super triangle still encloses the square
/// `[-r, r]²` around the origin.
pub const MIN_SUPER_TRIANGLE_MARGIN: f64 = 3.0;

/// Corner locations of the super triangle for the given input extent.
///
/// `extent` is the largest absolute coordinate of any input point; both `margin` and
/// `jitter` are multiples of it. The corners are returned in clockwise order: top,
/// bottom right, bottom left.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::core::boundary::super_triangle_corners;
/// use constrained_delaunay::geometry::predicates::is_strictly_clockwise;
///
/// let [a, b, c] = super_triangle_corners(2.0_f64, 4.0, 0.0);
/// assert_eq!(*a.coords(), [0.0, 8.0]);
/// assert!(is_strictly_clockwise(&a, &b, &c));
/// ```
#[must_use]
pub fn super_triangle_corners<T: CoordinateScalar>(extent: T, margin: T, jitter: T) -> [Point<T>; 3] {
    let extent = if extent > T::zero() { extent } else { T::one() };
    let m = extent * margin;
    let e = extent * jitter;
    [
        Point::new(e, m - e),
        Point::new(m + e, -e),
        Point::new(-m - e, -m + e),
    ]
}

/// Registers the super-triangle corners, creates the initial triangle, and places every
/// registered input vertex in its remaining set.
///
/// Returns the key of the super triangle.
///
/// # Panics
///
/// Panics if the super triangle is not clockwise, which can only happen with a
/// margin or jitter outside the validated option ranges.
pub fn build_super_triangle<T: CoordinateScalar>(tds: &mut Tds<T>, margin: T, jitter: T) -> TriangleKey {
    let extent = tds
        .vertices()
        .input_keys()
        .iter()
        .map(|&v| tds.point(v).max_abs_coordinate())
        .fold(T::zero(), T::max);

    let corners = super_triangle_corners(extent, margin, jitter)
        .map(|point| tds.vertices_mut().register_super(point));
    let root = tds.insert_triangle(corners);

    let inputs: Vec<VertexKey> = tds.vertices().input_keys().to_vec();
    for vertex in inputs {
        tds.add_remaining(root, vertex);
    }
    tracing::debug!(?extent, vertices = tds.vertices().len(), "built super triangle");
    root
}

/// Flood-fills from triangles touching a super-triangle corner and removes every
/// triangle reached.
///
/// The fill crosses a side only when `is_barrier` returns `false` for its endpoints.
/// Surviving triangles that bordered removed ones become boundary sides. Returns the
/// number of triangles removed.
pub fn remove_outer_triangles<T, F>(tds: &mut Tds<T>, is_barrier: F) -> usize
where
    T: CoordinateScalar,
    F: Fn(VertexKey, VertexKey) -> bool,
{
    let mut stack: Vec<TriangleKey> = tds
        .triangles()
        .filter(|(_, t)| t.corners().iter().any(|&c| tds.is_super(c)))
        .map(|(key, _)| key)
        .collect();
    let mut removed: Vec<(TriangleKey, [Option<TriangleKey>; 3])> = Vec::new();

    while let Some(key) = stack.pop() {
        if !tds.is_live(key) {
            continue;
        }
        let triangle = tds.live(key);
        let neighbors = *triangle.neighbors();
        let edges = [0, 1, 2].map(|side| triangle.edge(side));
        tds.flag(key);
        removed.push((key, neighbors));

        for (neighbor, (a, b)) in neighbors.into_iter().zip(edges) {
            if let Some(neighbor) = neighbor
                && tds.is_live(neighbor)
                && !is_barrier(a, b)
            {
                stack.push(neighbor);
            }
        }
    }

    for (key, neighbors) in &removed {
        for neighbor in neighbors.iter().flatten() {
            if tds.is_live(*neighbor) {
                tds.replace_back_reference(Some(*neighbor), *key, None);
            }
        }
    }

    let count = tds.sweep();
    if count != removed.len() {
        invariant_violation(format_args!(
            "flood fill flagged {} triangles but swept {count}",
            removed.len()
        ));
    }
    count
}
