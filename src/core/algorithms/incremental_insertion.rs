//! Incremental point insertion by triangle splitting.
//!
//! Point location is a conflict-list scheme: every vertex not yet inserted waits in the
//! remaining set of the triangle containing it. Inserting a vertex:
//! 1. splits its containing triangle `(c0, c1, c2)` into `(c0, c1, v)`, `(c1, c2, v)`
//!    and `(c2, c0, v)`, reusing the old outer neighbors;
//! 2. hands each other remaining vertex to one child that holds it, never to a child
//!    that collapsed because `v` sits on an edge of the parent;
//! 3. legalizes the three outer sides of the children.

use thiserror::Error;

use crate::core::algorithms::flips::{LegalizationError, LegalizationStats, legalize, max_flips_for};
use crate::core::edge::ConstraintSet;
use crate::core::triangle::next_index;
use crate::core::triangulation_data_structure::{Tds, TriangleKey, VertexKey};
use crate::core::util::{invariant_violation, trace_enabled};
use crate::geometry::predicates::{is_clockwise, is_strictly_clockwise};
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Error during incremental insertion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum InsertionError {
    /// Rounding placed the vertex outside the triangle it was assigned to, so one of
    /// the split triangles would be counter-clockwise.
    #[error("Input point {index} lies outside its assigned triangle after rounding")]
    InconsistentLocation {
        /// Index of the point in the caller's slice.
        index: usize,
    },
    /// Legalization after the split failed.
    #[error(transparent)]
    Legalization(#[from] LegalizationError),
}

/// Splits the triangle containing `vertex` into three triangles around it.
///
/// Returns the children in corner order, child `i` being `(c_i, c_{i+1}, v)`; side 2 of
/// each child is its outer side.
///
/// # Errors
///
/// Returns [`InsertionError::InconsistentLocation`] if a child would be wound
/// counter-clockwise. The mesh is left untouched in that case.
///
/// # Panics
///
/// Panics if `vertex` is unknown, already inserted, or not in the remaining set of the
/// triangle its back-reference names.
pub fn split_triangle<T: CoordinateScalar>(
    tds: &mut Tds<T>,
    vertex: VertexKey,
) -> Result<[TriangleKey; 3], InsertionError> {
    let Some(tracked) = tds.vertices().get(vertex) else {
        invariant_violation(format_args!("unknown vertex {vertex:?}"));
    };
    if tracked.is_inserted() {
        invariant_violation(format_args!("vertex {vertex:?} inserted twice"));
    }
    let index = tracked.input_index().unwrap_or_default();
    let Some(parent) = tracked.triangle() else {
        invariant_violation(format_args!("vertex {vertex:?} has no containing triangle"));
    };

    let triangle = tds.live(parent);
    let corners = *triangle.corners();
    let neighbors = *triangle.neighbors();
    let v = *tds.point(vertex);
    let [p0, p1, p2] = corners.map(|c| *tds.point(c));
    if !(is_clockwise(&p0, &p1, &v) && is_clockwise(&p1, &p2, &v) && is_clockwise(&p2, &p0, &v)) {
        return Err(InsertionError::InconsistentLocation { index });
    }

    tds.remove_remaining(parent, vertex);
    tds.vertices_mut().mark_inserted(vertex);
    let displaced = tds.take_remaining(parent);

    let children = [0, 1, 2].map(|i| tds.insert_triangle([corners[i], corners[next_index(i)], vertex]));
    for i in 0..3 {
        tds.link(children[i], 0, children[next_index(i)], 1);
        // side 2 of child i is the edge (c_i, c_{i+1}), opposite c_{i+2} in the parent
        let outer = neighbors[(i + 2) % 3];
        tds.set_neighbor(children[i], 2, outer);
        tds.replace_back_reference(outer, parent, Some(children[i]));
    }

    // A vertex inserted on a parent edge leaves one child with zero area; it is
    // flipped away by legalization and must not receive remaining vertices.
    let points = [p0, p1, p2];
    let sides = [0, 1, 2].map(|i| (points[i], points[next_index(i)]));
    let collapsed = sides.map(|(a, b)| !is_strictly_clockwise(&a, &b, &v));
    for other in displaced {
        let p = *tds.point(other);
        let in_wedge = |i: usize| {
            let (a, b) = sides[i];
            is_clockwise(&b, &v, &p) && is_clockwise(&v, &a, &p)
        };
        let holds = |i: usize| is_clockwise(&sides[i].0, &sides[i].1, &p) && in_wedge(i);
        let open = || (0..3).filter(|&i| !collapsed[i]);
        let child = open()
            .find(|&i| holds(i))
            .or_else(|| open().find(|&i| in_wedge(i)))
            .or_else(|| open().next())
            .unwrap_or_else(|| invariant_violation(format_args!("every child of {parent:?} collapsed")));
        tds.add_remaining(children[child], other);
    }

    tds.erase(parent);
    Ok(children)
}

/// Inserts `vertex`, legalizes around it, and sweeps the retired triangles.
///
/// `budget_factor` scales the flip budget with the current triangle count.
///
/// # Errors
///
/// Propagates [`split_triangle`] and legalization failures.
pub fn insert_vertex<T: CoordinateScalar>(
    tds: &mut Tds<T>,
    constraints: &ConstraintSet<T>,
    vertex: VertexKey,
    budget_factor: usize,
    stats: &mut LegalizationStats,
) -> Result<[TriangleKey; 3], InsertionError> {
    let children = split_triangle(tds, vertex)?;
    if trace_enabled() {
        tracing::debug!("[insert] vertex {:?} split into {:?}", vertex, children);
    }
    let max_flips = max_flips_for(tds.number_of_triangles(), budget_factor);
    legalize(tds, constraints, children.map(|child| (child, 2)), max_flips, stats)?;
    tds.sweep();
    Ok(children)
}
