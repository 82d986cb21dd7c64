//! Geometric utilities: convex hulls, polygon areas and reproducible point sets.

use rand::distr::uniform::SampleUniform;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::geometry::point::Point;
use crate::geometry::predicates::signed_double_area;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Errors from random point generation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RandomPointGenerationError {
    /// The sampling range is empty or inverted.
    #[error("Invalid coordinate range: min {min} must be less than max {max}")]
    InvalidRange {
        /// Lower bound, formatted.
        min: String,
        /// Upper bound, formatted.
        max: String,
    },
}

/// Indices of the convex hull of `points`, counter-clockwise, starting at the
/// lexicographically smallest point.
///
/// Points lying on a hull edge are kept as hull vertices, so consecutive hull indices
/// never skip over an input point. The caller must ensure `points` has no duplicates
/// and is not entirely collinear; otherwise the result is unspecified.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::geometry::point::Point;
/// use constrained_delaunay::geometry::util::convex_hull_indices;
///
/// let points = [
///     Point::new(0.0, 0.0),
///     Point::new(2.0, 0.0),
///     Point::new(1.0, 0.0), // on the bottom edge
///     Point::new(1.0, 1.0), // interior
///     Point::new(2.0, 2.0),
///     Point::new(0.0, 2.0),
/// ];
/// assert_eq!(convex_hull_indices(&points), vec![0, 2, 1, 4, 5]);
/// ```
#[must_use]
pub fn convex_hull_indices<T: CoordinateScalar>(points: &[Point<T>]) -> Vec<usize> {
    if points.len() < 3 {
        return (0..points.len()).collect();
    }

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a]
            .x()
            .partial_cmp(&points[b].x())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                points[a]
                    .y()
                    .partial_cmp(&points[b].y())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let chain = |iter: &mut dyn Iterator<Item = usize>| {
        let mut hull: Vec<usize> = Vec::new();
        for idx in iter {
            while hull.len() >= 2 {
                let a = &points[hull[hull.len() - 2]];
                let b = &points[hull[hull.len() - 1]];
                if signed_double_area(a, b, &points[idx]) < T::zero() {
                    hull.pop();
                } else {
                    break;
                }
            }
            hull.push(idx);
        }
        hull
    };

    let mut lower = chain(&mut order.iter().copied());
    let mut upper = chain(&mut order.iter().rev().copied());
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Signed area of a closed polygon given as a vertex ring (positive if
/// counter-clockwise).
#[must_use]
pub fn polygon_signed_area<T: CoordinateScalar>(ring: &[Point<T>]) -> T {
    if ring.len() < 3 {
        return T::zero();
    }
    let two = T::one() + T::one();
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .fold(T::zero(), |acc, (a, b)| acc + a.cross(b))
        / two
}

/// Generate `n_points` random points with both coordinates uniform in `range`,
/// reproducibly from `seed`.
///
/// # Errors
///
/// Returns [`RandomPointGenerationError::InvalidRange`] if `range.0 >= range.1`.
///
/// # Examples
///
/// ```
/// use constrained_delaunay::geometry::util::generate_random_points_seeded;
///
/// let a = generate_random_points_seeded::<f64>(50, (-1.0, 1.0), 7).unwrap();
/// let b = generate_random_points_seeded::<f64>(50, (-1.0, 1.0), 7).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn generate_random_points_seeded<T: CoordinateScalar + SampleUniform>(
    n_points: usize,
    range: (T, T),
    seed: u64,
) -> Result<Vec<Point<T>>, RandomPointGenerationError> {
    if range.0 >= range.1 {
        return Err(RandomPointGenerationError::InvalidRange {
            min: format!("{:?}", range.0),
            max: format!("{:?}", range.1),
        });
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Ok((0..n_points)
        .map(|_| {
            Point::new(
                rng.random_range(range.0..range.1),
                rng.random_range(range.0..range.1),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hull_of_square_with_interior_point() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        assert_eq!(convex_hull_indices(&points), vec![0, 2, 3, 4]);
    }

    #[test]
    fn hull_keeps_collinear_points_on_every_side() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(0.0, 2.0),
            Point::new(1.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 1.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ];
        let hull = convex_hull_indices(&points);
        assert_eq!(hull.len(), 8);
        assert!(!hull.contains(&8));
    }

    #[test]
    fn hull_ring_is_counter_clockwise() {
        let points = generate_random_points_seeded::<f64>(40, (-10.0, 10.0), 3).unwrap();
        let ring: Vec<_> = convex_hull_indices(&points)
            .into_iter()
            .map(|i| points[i])
            .collect();
        assert!(polygon_signed_area(&ring) > 0.0);
    }

    #[test]
    fn polygon_area_of_unit_square() {
        let ccw = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert_relative_eq!(polygon_signed_area(&ccw), 1.0);
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert_relative_eq!(polygon_signed_area(&cw), -1.0);
    }

    #[test]
    fn random_points_respect_range_and_seed() {
        let pts = generate_random_points_seeded::<f32>(100, (2.0, 3.0), 11).unwrap();
        assert!(pts.iter().all(|p| (2.0..3.0).contains(&p.x()) && (2.0..3.0).contains(&p.y())));
        let other = generate_random_points_seeded::<f32>(100, (2.0, 3.0), 12).unwrap();
        assert_ne!(pts, other);
        assert!(generate_random_points_seeded::<f64>(3, (1.0, 1.0), 0).is_err());
    }
}
