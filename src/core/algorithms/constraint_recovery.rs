//! Forcing required segments into the mesh.
//!
//! After all points are inserted, each required segment `a`-`b` (a constrained edge,
//! or a convex-hull edge) that is not yet a mesh edge is recovered by flipping the
//! edges that cross it:
//!
//! 1. walk from `a` towards `b`, collecting every edge the open segment crosses;
//! 2. pop crossing edges from a FIFO queue; flip those whose quadrilateral is strictly
//!    convex, requeue the rest, and requeue any new diagonal that still crosses;
//! 3. legalize the new diagonals that no longer cross. The recovered segment survives
//!    legalization because every flip of it would create an edge crossing it.
//!
//! A constrained edge through another input point is an error. A side of the convex
//! hull may run through points the hull scan kept or dropped as collinear; such a side
//! is split at that point and each piece is recovered on its own.

use std::collections::VecDeque;

use thiserror::Error;

use crate::core::algorithms::flips::{
    LegalizationError, LegalizationStats, arrange_corners, flip_edge, legalize, max_flips_for,
    quad_is_convex,
};
use crate::core::edge::ConstraintSet;
use crate::core::triangle::{next_index, prev_index};
use crate::core::triangulation_data_structure::{Tds, TriangleKey, VertexKey};
use crate::core::util::{invariant_violation, trace_enabled};
use crate::geometry::predicates::{point_on_open_segment, segments_intersect};
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Failure to force a segment into the mesh.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConstraintRecoveryError {
    /// An input point lies in the interior of the segment, so the segment cannot be a
    /// single edge.
    #[error("Constrained edge {start}-{end} passes through input point {vertex}")]
    ConstraintThroughVertex {
        /// Input index of the first endpoint.
        start: usize,
        /// Input index of the second endpoint.
        end: usize,
        /// Input index of the point on the segment.
        vertex: usize,
    },
    /// The walk from `start` towards `end` lost track of the segment, which only
    /// happens when rounding disagrees about near-collinear points.
    #[error("Constrained edge {start}-{end} could not be traced through the mesh")]
    Untraceable {
        /// Input index of the first endpoint.
        start: usize,
        /// Input index of the second endpoint.
        end: usize,
    },
    /// Flipping did not clear the crossing edges within the budget.
    #[error("Recovering constrained edge {start}-{end} did not converge after {max_attempts} attempts")]
    NonConvergent {
        /// Input index of the first endpoint.
        start: usize,
        /// Input index of the second endpoint.
        end: usize,
        /// Queue pops allowed.
        max_attempts: usize,
    },
    /// Legalization of the new diagonals failed.
    #[error(transparent)]
    Legalization(#[from] LegalizationError),
}

fn input_index<T: CoordinateScalar>(tds: &Tds<T>, vertex: VertexKey) -> usize {
    tds.vertices()
        .get(vertex)
        .and_then(|v| v.input_index())
        .unwrap_or_default()
}

/// Why a walk along a segment stopped before reaching its far endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blocked {
    /// A mesh vertex lies on the open segment.
    Through(VertexKey),
    /// No crossed edge could be found.
    Lost,
}

impl Blocked {
    fn into_error<T: CoordinateScalar>(self, tds: &Tds<T>, a: VertexKey, b: VertexKey) -> ConstraintRecoveryError {
        let (start, end) = (input_index(tds, a), input_index(tds, b));
        match self {
            Self::Through(vertex) => ConstraintRecoveryError::ConstraintThroughVertex {
                start,
                end,
                vertex: input_index(tds, vertex),
            },
            Self::Lost => ConstraintRecoveryError::Untraceable { start, end },
        }
    }
}

/// Collects the mesh edges crossed by the open segment `a`-`b`, in walk order.
///
/// # Errors
///
/// Returns [`ConstraintRecoveryError::ConstraintThroughVertex`] if a mesh vertex lies
/// on the open segment, or [`ConstraintRecoveryError::Untraceable`] if the walk
/// cannot continue.
pub fn crossing_edges<T: CoordinateScalar>(
    tds: &Tds<T>,
    a: VertexKey,
    b: VertexKey,
) -> Result<Vec<(VertexKey, VertexKey)>, ConstraintRecoveryError> {
    trace(tds, a, b).map_err(|blocked| blocked.into_error(tds, a, b))
}

fn trace<T: CoordinateScalar>(
    tds: &Tds<T>,
    a: VertexKey,
    b: VertexKey,
) -> Result<Vec<(VertexKey, VertexKey)>, Blocked> {
    let (pa, pb) = (tds.point(a), tds.point(b));
    let mut start: Option<(TriangleKey, usize)> = None;
    for t in tds.vertex_star(a) {
        let triangle = tds.live(t);
        let Some(i) = triangle.corner_index(a) else {
            continue;
        };
        let (u, w) = triangle.edge(i);
        for v in [u, w] {
            if point_on_open_segment(tds.point(v), pa, pb) {
                return Err(Blocked::Through(v));
            }
        }
        if start.is_none() && segments_intersect(pa, pb, tds.point(u), tds.point(w)) {
            start = Some((t, i));
        }
    }
    let (mut current, mut side) = start.ok_or(Blocked::Lost)?;

    let mut crossings = Vec::new();
    for _ in 0..=tds.number_of_triangles() {
        let triangle = tds.live(current);
        crossings.push(triangle.edge(side));

        let Some(next) = triangle.neighbor(side) else {
            return Err(Blocked::Lost);
        };
        let next_triangle = tds.live(next);
        let Some(entry) = next_triangle.side_of_neighbor(current) else {
            invariant_violation(format_args!("{next:?} has no back-reference to {current:?}"));
        };
        let apex = next_triangle.corner(entry);
        if apex == b {
            return Ok(crossings);
        }
        if point_on_open_segment(tds.point(apex), pa, pb) {
            return Err(Blocked::Through(apex));
        }

        let exit = [next_index(entry), prev_index(entry)].into_iter().find(|&s| {
            let (u, w) = next_triangle.edge(s);
            segments_intersect(pa, pb, tds.point(u), tds.point(w))
        });
        let Some(exit) = exit else {
            return Err(Blocked::Lost);
        };
        current = next;
        side = exit;
    }
    Err(Blocked::Lost)
}

/// Makes `a`-`b` an edge of the mesh. Returns the number of flips performed.
///
/// # Errors
///
/// See [`ConstraintRecoveryError`].
///
/// # Panics
///
/// Panics if a queued crossing edge disappears from the mesh without being flipped.
pub fn recover_edge<T: CoordinateScalar>(
    tds: &mut Tds<T>,
    constraints: &ConstraintSet<T>,
    (a, b): (VertexKey, VertexKey),
    budget_factor: usize,
    stats: &mut LegalizationStats,
) -> Result<usize, ConstraintRecoveryError> {
    if tds.find_edge(a, b).is_some() {
        return Ok(0);
    }
    let crossings = crossing_edges(tds, a, b)?;
    flip_crossings(tds, constraints, (a, b), crossings, budget_factor, stats)
}

/// Flips `crossings` away until `a`-`b` is an edge, then legalizes the new diagonals.
fn flip_crossings<T: CoordinateScalar>(
    tds: &mut Tds<T>,
    constraints: &ConstraintSet<T>,
    (a, b): (VertexKey, VertexKey),
    crossings: Vec<(VertexKey, VertexKey)>,
    budget_factor: usize,
    stats: &mut LegalizationStats,
) -> Result<usize, ConstraintRecoveryError> {
    let mut queue: VecDeque<(VertexKey, VertexKey)> = crossings.into();
    let crossed = queue.len();
    let max_attempts = max_flips_for(tds.number_of_triangles(), budget_factor);
    let mut attempts = 0_usize;
    let mut flips = 0_usize;
    let mut cleared: Vec<(VertexKey, VertexKey)> = Vec::new();

    while let Some((u, w)) = queue.pop_front() {
        attempts += 1;
        if attempts > max_attempts {
            tracing::warn!(max_attempts, remaining = queue.len() + 1, "edge recovery did not converge");
            return Err(ConstraintRecoveryError::NonConvergent {
                start: input_index(tds, a),
                end: input_index(tds, b),
                max_attempts,
            });
        }

        let Some((t, side)) = tds.find_edge(u, w) else {
            invariant_violation(format_args!("crossing edge {u:?}-{w:?} vanished"));
        };
        let Some(n) = tds.neighbor(t, side) else {
            invariant_violation(format_args!("crossing edge {u:?}-{w:?} is on the boundary"));
        };
        let quad = arrange_corners(tds, t, n);
        if !quad_is_convex(tds, &quad) {
            queue.push_back((u, w));
            continue;
        }

        let _ = flip_edge(tds, &quad);
        tds.sweep();
        flips += 1;
        let [d1, d2] = quad.apex;
        if segments_intersect(tds.point(a), tds.point(b), tds.point(d1), tds.point(d2)) {
            queue.push_back((d1, d2));
        } else {
            cleared.push((d1, d2));
        }
    }

    if trace_enabled() {
        tracing::debug!(
            "[recover] edge {:?}-{:?}: {} crossings, {} flips, {} attempts",
            a,
            b,
            crossed,
            flips,
            attempts,
        );
    }

    let seeds: Vec<(TriangleKey, usize)> = cleared
        .into_iter()
        .filter(|&(u, w)| !(u == a && w == b) && !(u == b && w == a))
        .filter_map(|(u, w)| tds.find_edge(u, w))
        .collect();
    let max_flips = max_flips_for(tds.number_of_triangles(), budget_factor);
    legalize(tds, constraints, seeds, max_flips, stats)?;
    tds.sweep();
    Ok(flips)
}

/// Recovers every segment in `edges`, in order. Returns the total number of flips.
///
/// # Errors
///
/// Stops at the first segment that cannot be recovered.
pub fn recover_edges<T: CoordinateScalar>(
    tds: &mut Tds<T>,
    constraints: &ConstraintSet<T>,
    edges: &[(VertexKey, VertexKey)],
    budget_factor: usize,
    stats: &mut LegalizationStats,
) -> Result<usize, ConstraintRecoveryError> {
    edges.iter().try_fold(0, |total, &edge| {
        Ok(total + recover_edge(tds, constraints, edge, budget_factor, stats)?)
    })
}

/// Recovers the sides of a closed boundary ring.
///
/// A side whose open segment holds another vertex is split there and both halves are
/// recovered instead. Returns the number of flips and the mesh edges that now trace
/// the ring, in ring order.
///
/// # Errors
///
/// Returns [`ConstraintRecoveryError::Untraceable`] if a side cannot be walked, or any
/// flipping failure of [`recover_edge`].
pub fn recover_boundary<T: CoordinateScalar>(
    tds: &mut Tds<T>,
    constraints: &ConstraintSet<T>,
    ring: &[(VertexKey, VertexKey)],
    budget_factor: usize,
    stats: &mut LegalizationStats,
) -> Result<(usize, Vec<(VertexKey, VertexKey)>), ConstraintRecoveryError> {
    let mut pending: Vec<(VertexKey, VertexKey)> = ring.iter().rev().copied().collect();
    let mut sides = Vec::with_capacity(ring.len());
    let mut flips = 0_usize;

    while let Some((a, b)) = pending.pop() {
        if tds.find_edge(a, b).is_none() {
            match trace(tds, a, b) {
                Ok(crossings) => {
                    flips += flip_crossings(tds, constraints, (a, b), crossings, budget_factor, stats)?;
                }
                Err(Blocked::Through(vertex)) => {
                    if trace_enabled() {
                        tracing::debug!("[recover] boundary side {:?}-{:?} split at {:?}", a, b, vertex);
                    }
                    pending.push((vertex, b));
                    pending.push((a, vertex));
                    continue;
                }
                Err(blocked) => return Err(blocked.into_error(tds, a, b)),
            }
        }
        sides.push((a, b));
    }
    Ok((flips, sides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::flips::DEFAULT_FLIP_BUDGET_FACTOR;
    use crate::core::algorithms::incremental_insertion::insert_vertex;
    use crate::core::boundary::build_super_triangle;
    use crate::geometry::point::Point;

    fn delaunay_mesh(points: &[(f64, f64)]) -> (Tds<f64>, Vec<VertexKey>) {
        let mut tds = Tds::with_capacity(points.len());
        let keys: Vec<_> = points
            .iter()
            .map(|&(x, y)| tds.vertices_mut().register_input(Point::new(x, y)))
            .collect();
        let _ = build_super_triangle(&mut tds, 4.0, 0.000_372);
        let mut stats = LegalizationStats::default();
        for &key in &keys {
            insert_vertex(&mut tds, &ConstraintSet::default(), key, DEFAULT_FLIP_BUDGET_FACTOR, &mut stats)
                .unwrap();
        }
        (tds, keys)
    }

    #[test]
    fn long_diagonal_is_recovered() {
        let (mut tds, k) = delaunay_mesh(&[(0.0, 0.0), (10.0, 0.0), (5.0, -1.0), (5.0, 1.0)]);
        assert!(tds.find_edge(k[2], k[3]).is_some());
        assert!(tds.find_edge(k[0], k[1]).is_none());
        assert_eq!(crossing_edges(&tds, k[0], k[1]).unwrap().len(), 1);

        let constraints = ConstraintSet::new(&tds, [(k[0], k[1])]);
        let mut stats = LegalizationStats::default();
        let flips = recover_edge(&mut tds, &constraints, (k[0], k[1]), DEFAULT_FLIP_BUDGET_FACTOR, &mut stats)
            .unwrap();
        assert_eq!(flips, 1);
        assert!(tds.find_edge(k[0], k[1]).is_some());
        assert!(tds.find_edge(k[2], k[3]).is_none());
        assert!(tds.validate().is_ok());
    }

    #[test]
    fn existing_edge_needs_no_flips() {
        let (mut tds, k) = delaunay_mesh(&[(0.0, 0.0), (10.0, 0.0), (5.0, -1.0), (5.0, 1.0)]);
        let mut stats = LegalizationStats::default();
        let flips = recover_edge(
            &mut tds,
            &ConstraintSet::default(),
            (k[2], k[3]),
            DEFAULT_FLIP_BUDGET_FACTOR,
            &mut stats,
        )
        .unwrap();
        assert_eq!(flips, 0);
    }

    #[test]
    fn segment_crossing_a_fan_is_recovered() {
        // a zig-zag of points above and below the x axis between the two endpoints
        let mut points = vec![(0.0, 0.0), (12.0, 0.0)];
        for i in 1..12 {
            let x = f64::from(i);
            let y = if i % 2 == 0 { 0.6 } else { -0.7 };
            points.push((x, y));
        }
        let (mut tds, k) = delaunay_mesh(&points);
        let constraints = ConstraintSet::new(&tds, [(k[0], k[1])]);
        let mut stats = LegalizationStats::default();
        recover_edges(&mut tds, &constraints, &[(k[0], k[1])], DEFAULT_FLIP_BUDGET_FACTOR, &mut stats)
            .unwrap();
        assert!(tds.find_edge(k[0], k[1]).is_some());
        assert!(tds.validate().is_ok());
        assert_eq!(tds.number_of_triangles(), 2 * points.len() + 1);
    }

    #[test]
    fn point_on_segment_is_rejected() {
        let (mut tds, k) =
            delaunay_mesh(&[(0.0, 0.0), (4.0, 0.0), (2.0, 0.0), (2.0, 3.0), (2.0, -3.0)]);
        let mut stats = LegalizationStats::default();
        let result = recover_edge(
            &mut tds,
            &ConstraintSet::default(),
            (k[0], k[1]),
            DEFAULT_FLIP_BUDGET_FACTOR,
            &mut stats,
        );
        assert_eq!(
            result,
            Err(ConstraintRecoveryError::ConstraintThroughVertex {
                start: 0,
                end: 1,
                vertex: 2
            })
        );
    }

    #[test]
    fn boundary_side_through_a_point_is_split() {
        let (mut tds, k) = delaunay_mesh(&[(0.0, 0.0), (4.0, 0.0), (2.0, 0.0), (2.0, 3.0)]);
        let ring = [(k[0], k[1]), (k[1], k[3]), (k[3], k[0])];
        let mut stats = LegalizationStats::default();
        let (_, sides) =
            recover_boundary(&mut tds, &ConstraintSet::default(), &ring, DEFAULT_FLIP_BUDGET_FACTOR, &mut stats)
                .unwrap();
        assert_eq!(sides, vec![(k[0], k[2]), (k[2], k[1]), (k[1], k[3]), (k[3], k[0])]);
        assert!(sides.iter().all(|&(a, b)| tds.find_edge(a, b).is_some()));
        assert!(tds.validate().is_ok());
    }

    #[test]
    fn long_collinear_boundary_run_is_recovered_piecewise() {
        let mut points: Vec<(f64, f64)> = (0..21).map(|i| (f64::from(i), 0.0)).collect();
        points.push((10.0, 5.0));
        let (mut tds, k) = delaunay_mesh(&points);
        let apex = k[21];
        let ring = [(k[0], k[20]), (k[20], apex), (apex, k[0])];
        let mut stats = LegalizationStats::default();
        let (_, sides) =
            recover_boundary(&mut tds, &ConstraintSet::default(), &ring, DEFAULT_FLIP_BUDGET_FACTOR, &mut stats)
                .unwrap();

        assert_eq!(sides.len(), 22);
        for (i, &(a, b)) in sides[..20].iter().enumerate() {
            assert_eq!((a, b), (k[i], k[i + 1]));
        }
        assert!(sides.iter().all(|&(a, b)| tds.find_edge(a, b).is_some()));
        assert!(tds.validate().is_ok());
    }}
