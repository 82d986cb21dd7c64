//! Edge flips and Delaunay legalization.
//!
//! Two adjacent clockwise triangles form a quadrilateral with a *shared* diagonal and
//! two *apexes*. Legalization decides whether to replace the shared diagonal with the
//! *disjoint* one (apex to apex), honoring enforced edges:
//!
//! - a triangle that has collapsed to zero area (a vertex inserted on an existing edge)
//!   is flipped across its long side whenever that yields two strictly clockwise
//!   triangles, regardless of enforcement;
//! - an edge is **enforced** if it touches a super-triangle corner or properly crosses
//!   a constrained edge;
//! - disjoint enforced, shared not: never flip;
//! - shared enforced, disjoint not: flip whenever the quadrilateral is strictly convex;
//! - otherwise: flip when convex and each apex lies strictly inside the other
//!   triangle's circumcircle. Both directions must agree, so rounding on a nearly
//!   cocircular quad cannot make both diagonals look illegal.
//!
//! Checks are processed from an explicit LIFO worklist of `(triangle, side)` entries.
//! A flip retires both triangles, so entries naming them become stale and are skipped.

use thiserror::Error;

use crate::core::edge::ConstraintSet;
use crate::core::triangle::{next_index, prev_index};
use crate::core::triangulation_data_structure::{Tds, TriangleKey, VertexKey};
use crate::core::util::{invariant_violation, trace_enabled};
use crate::geometry::predicates::{
    Orientation, flip_is_valid, in_circumcircle, is_strictly_clockwise, orientation,
};
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Lower bound on the flip budget of a single legalization pass.
pub const MIN_FLIP_BUDGET: usize = 128;

/// Default multiplier applied to the triangle count to obtain the flip budget.
pub const DEFAULT_FLIP_BUDGET_FACTOR: usize = 12;

/// Counters accumulated across legalization passes.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::core::algorithms::flips::LegalizationStats;
///
/// let stats = LegalizationStats::default();
/// assert_eq!(stats.flips_performed, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegalizationStats {
    /// Number of worklist entries examined (stale entries excluded).
    pub edges_checked: usize,
    /// Number of flips performed.
    pub flips_performed: usize,
    /// Largest worklist length observed.
    pub max_queue_len: usize,
}

/// Failure of a legalization pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum LegalizationError {
    /// The pass kept flipping past its budget; typical of near-cocircular input where
    /// rounding makes both diagonals look illegal.
    #[error("Legalization failed to converge after {max_flips} flips ({edges_checked} edges checked)")]
    NonConvergent {
        /// Flip budget of the pass.
        max_flips: usize,
        /// Edges examined by the pass before it gave up.
        edges_checked: usize,
    },
}

/// Two adjacent triangles arranged around their shared diagonal.
///
/// `(shared[0], shared[1], apex[0])` is the clockwise corner order of `first`, and
/// `(shared[1], shared[0], apex[1])` that of `second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipQuad {
    /// First triangle.
    pub first: TriangleKey,
    /// Second triangle.
    pub second: TriangleKey,
    /// Side of `first` bordering `second` (the index of its apex).
    pub first_side: usize,
    /// Side of `second` bordering `first`.
    pub second_side: usize,
    /// Endpoints of the current diagonal.
    pub shared: [VertexKey; 2],
    /// Apex of `first` and apex of `second`; together the disjoint diagonal.
    pub apex: [VertexKey; 2],
}

/// Flip budget for a pass over a mesh of `triangle_count` triangles.
#[must_use]
pub fn max_flips_for(triangle_count: usize, factor: usize) -> usize {
    triangle_count.saturating_mul(factor).max(MIN_FLIP_BUDGET)
}

/// Matches the corners of two adjacent triangles and names their diagonals.
///
/// Walks `second` backwards against each rotation of `first` and looks for the
/// rotation matching exactly two corners by position.
///
/// # Panics
///
/// Panics if no rotation matches exactly two corners, or if the matched sides are not
/// linked to each other. Both indicate a corrupted mesh.
#[must_use]
pub fn arrange_corners<T: CoordinateScalar>(
    tds: &Tds<T>,
    first: TriangleKey,
    second: TriangleKey,
) -> FlipQuad {
    let f = *tds.live(first).corners();
    let s = *tds.live(second).corners();
    let fp = f.map(|v| *tds.point(v));
    let sp = s.map(|v| *tds.point(v));
    // `second` read backwards
    let reversed = [0, 2, 1];

    for rotation in 0..3 {
        let mut matches = 0;
        let mut unmatched = 0;
        for (i, &j) in reversed.iter().enumerate() {
            if fp[(rotation + i) % 3] == sp[j] {
                matches += 1;
            } else {
                unmatched = i;
            }
        }
        if matches != 2 {
            continue;
        }

        let first_side = (rotation + unmatched) % 3;
        let second_side = reversed[unmatched];
        if tds.neighbor(first, first_side) != Some(second)
            || tds.neighbor(second, second_side) != Some(first)
        {
            invariant_violation(format_args!(
                "triangles {first:?} and {second:?} share an edge but are not linked across it"
            ));
        }
        return FlipQuad {
            first,
            second,
            first_side,
            second_side,
            shared: [f[next_index(first_side)], f[prev_index(first_side)]],
            apex: [f[first_side], s[second_side]],
        };
    }
    invariant_violation(format_args!(
        "triangles {first:?} and {second:?} do not share exactly two corners"
    ))
}

/// Returns `true` if edge `a`-`b` touches a super-triangle corner or crosses a
/// constrained edge.
#[must_use]
pub fn is_enforced_edge<T: CoordinateScalar>(
    tds: &Tds<T>,
    constraints: &ConstraintSet<T>,
    a: VertexKey,
    b: VertexKey,
) -> bool {
    tds.is_super(a) || tds.is_super(b) || constraints.crosses_any(tds.point(a), tds.point(b))
}

/// Returns `true` if replacing the shared diagonal keeps both triangles strictly
/// clockwise.
#[must_use]
pub fn quad_is_convex<T: CoordinateScalar>(tds: &Tds<T>, quad: &FlipQuad) -> bool {
    let [s1, s2] = quad.shared.map(|v| tds.point(v));
    let [d1, d2] = quad.apex.map(|v| tds.point(v));
    flip_is_valid(s1, s2, d1, d2)
}

/// Decides whether the shared diagonal of `quad` should be flipped.
#[must_use]
pub fn should_flip<T: CoordinateScalar>(
    tds: &Tds<T>,
    constraints: &ConstraintSet<T>,
    quad: &FlipQuad,
) -> bool {
    if has_collapsed_triangle(tds, quad) {
        return quad_is_convex(tds, quad);
    }
    let [s1, s2] = quad.shared;
    let [d1, d2] = quad.apex;
    let disjoint_enforced = is_enforced_edge(tds, constraints, d1, d2);
    let shared_enforced = is_enforced_edge(tds, constraints, s1, s2);

    match (disjoint_enforced, shared_enforced) {
        (true, false) => false,
        (false, true) => quad_is_convex(tds, quad),
        _ => quad_is_convex(tds, quad) && violates_circumcircle(tds, quad),
    }
}

/// Returns `true` if either triangle of `quad` has zero area.
#[must_use]
pub fn has_collapsed_triangle<T: CoordinateScalar>(tds: &Tds<T>, quad: &FlipQuad) -> bool {
    let [s1, s2] = quad.shared.map(|v| tds.point(v));
    let [d1, d2] = quad.apex.map(|v| tds.point(v));
    orientation(s1, s2, d1) == Orientation::DEGENERATE
        || orientation(s2, s1, d2) == Orientation::DEGENERATE
}

fn violates_circumcircle<T: CoordinateScalar>(tds: &Tds<T>, quad: &FlipQuad) -> bool {
    let [s1, s2] = quad.shared.map(|v| tds.point(v));
    let [d1, d2] = quad.apex.map(|v| tds.point(v));
    in_circumcircle(s1, s2, d1, d2) && in_circumcircle(s2, s1, d2, d1)
}

/// Replaces the shared diagonal of `quad` with the disjoint one.
///
/// Creates `(s1, d2, d1)` and `(s2, d1, d2)`, rewires the four outer neighbors, moves
/// the remaining vertices of both old triangles to whichever side of the new diagonal
/// they fall on, and flags the old triangles. Returns the two new triangles.
///
/// # Panics
///
/// Panics if the new triangles would not be clockwise (callers check
/// [`quad_is_convex`] first) or if an outer neighbor lacks its back-reference.
pub fn flip_edge<T: CoordinateScalar>(tds: &mut Tds<T>, quad: &FlipQuad) -> [TriangleKey; 2] {
    let FlipQuad {
        first,
        second,
        first_side,
        second_side,
        shared: [s1, s2],
        apex: [d1, d2],
    } = *quad;

    // Outer neighbors, named by the edge they border.
    let across_d1_s1 = tds.neighbor(first, prev_index(first_side));
    let across_s2_d1 = tds.neighbor(first, next_index(first_side));
    let across_s1_d2 = tds.neighbor(second, next_index(second_side));
    let across_d2_s2 = tds.neighbor(second, prev_index(second_side));

    let mut displaced = tds.take_remaining(first);
    displaced.extend(tds.take_remaining(second));

    let a = tds.insert_triangle([s1, d2, d1]);
    let b = tds.insert_triangle([s2, d1, d2]);
    tds.link(a, 0, b, 0);
    tds.set_neighbor(a, 1, across_d1_s1);
    tds.set_neighbor(a, 2, across_s1_d2);
    tds.set_neighbor(b, 1, across_d2_s2);
    tds.set_neighbor(b, 2, across_s2_d1);
    tds.replace_back_reference(across_d1_s1, first, Some(a));
    tds.replace_back_reference(across_s1_d2, second, Some(a));
    tds.replace_back_reference(across_d2_s2, second, Some(b));
    tds.replace_back_reference(across_s2_d1, first, Some(b));

    let (p1, p2) = (*tds.point(d1), *tds.point(d2));
    for vertex in displaced {
        let target = if is_strictly_clockwise(&p1, &p2, tds.point(vertex)) {
            b
        } else {
            a
        };
        tds.add_remaining(target, vertex);
    }

    tds.flag(first);
    tds.flag(second);
    [a, b]
}

/// Legalizes the mesh starting from the given `(triangle, side)` checks.
///
/// Each check examines the triangle across `side`; flips push the four outer sides of
/// the new pair. `stats` accumulates across calls; the budget applies to this call.
///
/// # Errors
///
/// Returns [`LegalizationError::NonConvergent`] if more than `max_flips` flips would
/// be needed.
pub fn legalize<T: CoordinateScalar>(
    tds: &mut Tds<T>,
    constraints: &ConstraintSet<T>,
    seeds: impl IntoIterator<Item = (TriangleKey, usize)>,
    max_flips: usize,
    stats: &mut LegalizationStats,
) -> Result<(), LegalizationError> {
    let trace = trace_enabled();
    let mut worklist: Vec<(TriangleKey, usize)> = seeds.into_iter().collect();
    let mut flips = 0_usize;
    let mut checked = 0_usize;
    stats.max_queue_len = stats.max_queue_len.max(worklist.len());

    while let Some((triangle, side)) = worklist.pop() {
        if !tds.is_live(triangle) {
            continue;
        }
        let Some(neighbor) = tds.neighbor(triangle, side) else {
            continue;
        };
        checked += 1;
        stats.edges_checked += 1;

        let quad = arrange_corners(tds, triangle, neighbor);
        if !should_flip(tds, constraints, &quad) {
            continue;
        }
        if flips >= max_flips {
            tracing::warn!(max_flips, checked, "legalization did not converge");
            return Err(LegalizationError::NonConvergent {
                max_flips,
                edges_checked: checked,
            });
        }

        let [a, b] = flip_edge(tds, &quad);
        flips += 1;
        stats.flips_performed += 1;
        if trace {
            tracing::debug!(
                "[legalize] flip {:?}/{:?} -> {:?}/{:?} diagonal {:?}",
                quad.first,
                quad.second,
                a,
                b,
                quad.apex,
            );
        }
        worklist.extend([(b, 2), (b, 1), (a, 2), (a, 1)]);
        stats.max_queue_len = stats.max_queue_len.max(worklist.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;

    fn inserted_input(tds: &mut Tds<f64>, x: f64, y: f64) -> VertexKey {
        let key = tds.vertices_mut().register_input(Point::new(x, y));
        tds.vertices_mut().mark_inserted(key);
        key
    }

    /// Thin quadrilateral split along its long diagonal `s1`-`s2`.
    ///
    /// Returns the mesh, `[s1, s2, d1, d2]`, and the triangles `(d1, s1, s2)` and
    /// `(d2, s2, s1)`.
    fn quad_mesh(
        s1: (f64, f64),
        s2: (f64, f64),
        d1: (f64, f64),
        d2: (f64, f64),
    ) -> (Tds<f64>, [VertexKey; 4], TriangleKey, TriangleKey) {
        let mut tds = Tds::with_capacity(4);
        let keys = [s1, s2, d1, d2].map(|(x, y)| inserted_input(&mut tds, x, y));
        let [ks1, ks2, kd1, kd2] = keys;
        let first = tds.insert_triangle([kd1, ks1, ks2]);
        let second = tds.insert_triangle([kd2, ks2, ks1]);
        tds.link(first, 0, second, 0);
        (tds, keys, first, second)
    }

    fn thin_quad() -> (Tds<f64>, [VertexKey; 4], TriangleKey, TriangleKey) {
        quad_mesh((0.0, 0.0), (10.0, 0.0), (5.0, -1.0), (5.0, 1.0))
    }

    #[test]
    fn arrange_corners_names_diagonals() {
        let (tds, [s1, s2, d1, d2], first, second) = thin_quad();
        let quad = arrange_corners(&tds, first, second);
        assert_eq!(quad.first_side, 0);
        assert_eq!(quad.second_side, 0);
        assert_eq!(quad.shared, [s1, s2]);
        assert_eq!(quad.apex, [d1, d2]);

        let reversed = arrange_corners(&tds, second, first);
        assert_eq!(reversed.shared, [s2, s1]);
        assert_eq!(reversed.apex, [d2, d1]);
    }

    #[test]
    #[should_panic(expected = "triangulation invariant violated")]
    fn arrange_corners_rejects_unlinked_triangles() {
        let (mut tds, _, first, second) = thin_quad();
        tds.set_neighbor(first, 0, None);
        let _ = arrange_corners(&tds, first, second);
    }

    #[test]
    fn long_diagonal_is_flipped() {
        let (mut tds, [s1, s2, d1, d2], first, _) = thin_quad();
        let mut stats = LegalizationStats::default();
        legalize(&mut tds, &ConstraintSet::default(), [(first, 0)], 128, &mut stats).unwrap();
        assert_eq!(stats.flips_performed, 1);
        assert_eq!(tds.sweep(), 2);
        assert_eq!(tds.number_of_triangles(), 2);
        assert!(tds.find_edge(d1, d2).is_some());
        assert!(tds.find_edge(s1, s2).is_none());
        assert!(tds.validate().is_ok());
    }

    #[test]
    fn constrained_diagonal_is_kept() {
        let (mut tds, [s1, s2, ..], first, _) = thin_quad();
        let constraints = ConstraintSet::new(&tds, [(s1, s2)]);
        let mut stats = LegalizationStats::default();
        legalize(&mut tds, &constraints, [(first, 0)], 128, &mut stats).unwrap();
        assert_eq!(stats.flips_performed, 0);
        assert_eq!(stats.edges_checked, 1);
        assert!(tds.find_edge(s1, s2).is_some());
    }

    #[test]
    fn cocircular_square_is_left_alone() {
        let (tds, _, first, second) =
            quad_mesh((0.0, 0.0), (4.0, 4.0), (4.0, 0.0), (0.0, 4.0));
        let quad = arrange_corners(&tds, first, second);
        assert!(quad_is_convex(&tds, &quad));
        assert!(!should_flip(&tds, &ConstraintSet::default(), &quad));
    }

    #[test]
    fn flipped_diagonal_is_stable() {
        let (mut tds, [_, _, d1, d2], first, _) = thin_quad();
        let mut stats = LegalizationStats::default();
        legalize(&mut tds, &ConstraintSet::default(), [(first, 0)], 128, &mut stats).unwrap();
        tds.sweep();

        let (triangle, side) = tds.find_edge(d1, d2).unwrap();
        legalize(&mut tds, &ConstraintSet::default(), [(triangle, side)], 128, &mut stats).unwrap();
        assert_eq!(stats.flips_performed, 1);
        assert!(tds.find_edge(d1, d2).is_some());
    }

    #[test]
    fn collapsed_triangle_is_flipped_even_against_a_super_corner() {
        // (2, 0) sits on the edge (0, 0)-(4, 0); the far apex is a super corner, so the
        // disjoint edge is enforced
        let mut tds = Tds::with_capacity(4);
        let s1 = inserted_input(&mut tds, 0.0, 0.0);
        let s2 = inserted_input(&mut tds, 4.0, 0.0);
        let d1 = inserted_input(&mut tds, 2.0, 0.0);
        let d2 = tds.vertices_mut().register_super(Point::new(2.0, 10.0));
        let first = tds.insert_triangle([d1, s1, s2]);
        let second = tds.insert_triangle([d2, s2, s1]);
        tds.link(first, 0, second, 0);

        let constraints = ConstraintSet::default();
        let quad = arrange_corners(&tds, first, second);
        assert!(has_collapsed_triangle(&tds, &quad));
        assert!(is_enforced_edge(&tds, &constraints, d1, d2));
        assert!(should_flip(&tds, &constraints, &quad));

        let mut stats = LegalizationStats::default();
        legalize(&mut tds, &constraints, [(first, 0)], 128, &mut stats).unwrap();
        assert_eq!(stats.flips_performed, 1);
        tds.sweep();
        assert_eq!(tds.number_of_triangles(), 2);
        assert!(tds.find_edge(d1, d2).is_some());
        assert!(tds.find_edge(s1, s2).is_none());
        for (key, _) in tds.triangles() {
            let [a, b, c] = tds.triangle_points(key);
            assert!(is_strictly_clockwise(&a, &b, &c));
        }
    }

    #[test]
    fn collapsed_triangle_is_not_flipped_across_a_short_side() {
        // (4, 0) lies beyond s2 on the line through the shared edge
        let (tds, _, first, second) =
            quad_mesh((0.0, 0.0), (1.0, 0.0), (4.0, 0.0), (0.5, 1.0));
        let quad = arrange_corners(&tds, first, second);
        assert!(has_collapsed_triangle(&tds, &quad));
        assert!(!quad_is_convex(&tds, &quad));
        assert!(!should_flip(&tds, &ConstraintSet::default(), &quad));
    }

    #[test]
    fn reflex_quad_is_never_flipped() {
        // d2 sits beyond s2, so the disjoint diagonal leaves the quadrilateral
        let (tds, _, first, second) =
            quad_mesh((0.0, 0.0), (4.0, 4.0), (4.0, 0.0), (5.0, 5.5));
        let quad = arrange_corners(&tds, first, second);
        assert!(!quad_is_convex(&tds, &quad));
        assert!(!should_flip(&tds, &ConstraintSet::default(), &quad));
    }

    #[test]
    fn flip_rehomes_remaining_vertices() {
        let (mut tds, [_, s2, ..], first, second) = thin_quad();
        let below = tds.vertices_mut().register_input(Point::new(6.0, -0.3));
        let above = tds.vertices_mut().register_input(Point::new(2.0, 0.1));
        tds.add_remaining(first, below);
        tds.add_remaining(second, above);
        assert!(tds.validate().is_ok());

        let quad = arrange_corners(&tds, first, second);
        let [a, b] = flip_edge(&mut tds, &quad);
        assert!(!tds.is_live(first) && !tds.is_live(second));
        assert!(tds.live(b).has_corner(s2));
        assert!(tds.live(b).remaining().contains(&below));
        assert!(tds.live(a).remaining().contains(&above));
        tds.sweep();
        assert!(tds.validate().is_ok());
    }

    #[test]
    fn exhausted_budget_is_an_error() {
        let (mut tds, _, first, _) = thin_quad();
        let mut stats = LegalizationStats::default();
        let result = legalize(&mut tds, &ConstraintSet::default(), [(first, 0)], 0, &mut stats);
        assert_eq!(
            result,
            Err(LegalizationError::NonConvergent {
                max_flips: 0,
                edges_checked: 1
            })
        );
    }

    #[test]
    fn stale_and_boundary_entries_are_skipped() {
        let (mut tds, _, first, second) = thin_quad();
        let mut stats = LegalizationStats::default();
        // side 1 of `first` is on the boundary
        legalize(&mut tds, &ConstraintSet::default(), [(first, 1)], 128, &mut stats).unwrap();
        assert_eq!(stats.edges_checked, 0);

        let quad = arrange_corners(&tds, first, second);
        let _ = flip_edge(&mut tds, &quad);
        legalize(&mut tds, &ConstraintSet::default(), [(first, 0)], 128, &mut stats).unwrap();
        assert_eq!(stats.edges_checked, 0);
    }

    #[test]
    fn budget_has_a_floor() {
        assert_eq!(max_flips_for(0, DEFAULT_FLIP_BUDGET_FACTOR), MIN_FLIP_BUDGET);
        assert_eq!(max_flips_for(100, DEFAULT_FLIP_BUDGET_FACTOR), 1200);
    }
}
