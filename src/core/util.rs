//! General helper utilities.

use crate::core::collections::{FastHashMap, fast_hash_map_with_capacity};
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;
use std::fmt::Display;

/// Environment variable enabling per-split and per-flip trace logging.
pub const TRACE_ENV_VAR: &str = "CDT_TRACE";

/// Returns `true` if verbose triangulation tracing was requested via [`TRACE_ENV_VAR`].
#[must_use]
pub fn trace_enabled() -> bool {
    std::env::var_os(TRACE_ENV_VAR).is_some()
}

/// Aborts on a broken internal invariant.
///
/// Invariant violations indicate a bug in the engine, never a caller error, so they
/// are logged and then panic instead of surfacing as a recoverable `Err`.
#[cold]
#[track_caller]
pub(crate) fn invariant_violation(message: impl Display) -> ! {
    tracing::error!(%message, "triangulation invariant violated");
    panic!("triangulation invariant violated: {message}");
}

/// Finds the first pair of exactly equal points.
///
/// Returns `(first, second)` with `first < second`, or `None` if all points are
/// distinct. Equality is exact, with `0.0 == -0.0`.
///
/// # Examples
///
/// ```
/// use constrained_delaunay::core::util::find_exact_duplicate;
/// use constrained_delaunay::geometry::point::Point;
///
/// let points = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(-0.0, 0.0)];
/// assert_eq!(find_exact_duplicate(&points), Some((0, 2)));
/// ```
#[must_use]
pub fn find_exact_duplicate<T: CoordinateScalar>(points: &[Point<T>]) -> Option<(usize, usize)> {
    let mut seen: FastHashMap<Point<T>, usize> = fast_hash_map_with_capacity(points.len());
    for (index, point) in points.iter().enumerate() {
        if let Some(&first) = seen.get(point) {
            return Some((first, index));
        }
        seen.insert(*point, index);
    }
    None
}

/// Removes exact coordinate duplicates, keeping the first occurrence of each point.
///
/// Triangulation rejects duplicated input points; callers holding noisy data can run
/// this first. Note that constrained-edge indices refer to positions in the slice, so
/// they must be remapped by the caller after deduplication.
///
/// # Examples
///
/// ```
/// use constrained_delaunay::core::util::dedup_points_exact;
/// use constrained_delaunay::geometry::point::Point;
///
/// let points = vec![Point::new(0.0, 0.0), Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
/// assert_eq!(dedup_points_exact(points).len(), 2);
/// ```
#[must_use]
pub fn dedup_points_exact<T: CoordinateScalar>(points: Vec<Point<T>>) -> Vec<Point<T>> {
    let mut seen: FastHashMap<Point<T>, ()> = fast_hash_map_with_capacity(points.len());
    points
        .into_iter()
        .filter(|point| seen.insert(*point, ()).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_found_in_order() {
        let points = [
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
            Point::new(3.0, 4.0),
            Point::new(1.0, 2.0),
        ];
        assert_eq!(find_exact_duplicate(&points), Some((1, 2)));
        assert_eq!(find_exact_duplicate(&points[..2]), None);
    }

    #[test]
    fn nearly_equal_points_are_distinct() {
        let points = [Point::new(0.1, 0.2), Point::new(0.1 + 1e-16 + f64::EPSILON, 0.2)];
        assert_eq!(find_exact_duplicate(&points), None);
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let unique = dedup_points_exact(vec![
            Point::new(2.0f32, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, -0.0),
            Point::new(-0.0, 0.0),
        ]);
        assert_eq!(
            unique,
            vec![Point::new(2.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 0.0)]
        );
    }

    #[test]
    #[should_panic(expected = "triangulation invariant violated")]
    fn invariant_violation_panics() {
        invariant_violation("adjacency is not symmetric");
    }
}
