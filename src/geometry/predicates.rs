//! Planar predicates used by the triangulation engine.
//!
//! All predicates are evaluated directly in the coordinate type `T` without tolerance.
//! Triangles are stored clockwise, so the predicate most of the engine cares about is
//! [`orientation`] returning [`Orientation::NEGATIVE`].

use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Orientation of an ordered point triple.
///
/// The sign follows the z-component of `(b - a) × (c - a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Clockwise turn (cross product < 0)
    NEGATIVE,
    /// Collinear points (cross product == 0)
    DEGENERATE,
    /// Counter-clockwise turn (cross product > 0)
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Position of a point relative to a circumcircle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InCircle {
    /// Strictly outside the circle
    OUTSIDE,
    /// Exactly on the circle
    BOUNDARY,
    /// Strictly inside the circle
    INSIDE,
}

impl std::fmt::Display for InCircle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

/// Twice the signed area of triangle `(a, b, c)`; negative for clockwise triangles.
///
/// The determinant is always evaluated on the corners sorted lexicographically, with
/// the sign corrected for the permutation. Every ordering of the same three points
/// therefore yields bit-identical magnitudes, so orientation answers stay consistent
/// no matter which corner a caller lists first.
#[must_use]
pub fn signed_double_area<T: CoordinateScalar>(a: &Point<T>, b: &Point<T>, c: &Point<T>) -> T {
    let lex_less = |u: &Point<T>, v: &Point<T>| u.x() < v.x() || (u.x() == v.x() && u.y() < v.y());
    let (mut p, mut q, mut r) = (a, b, c);
    let mut negate = false;
    if lex_less(q, p) {
        std::mem::swap(&mut p, &mut q);
        negate = !negate;
    }
    if lex_less(r, q) {
        std::mem::swap(&mut q, &mut r);
        negate = !negate;
    }
    if lex_less(q, p) {
        std::mem::swap(&mut p, &mut q);
        negate = !negate;
    }
    let det = (*q - *p).cross(&(*r - *p));
    if negate { -det } else { det }
}

/// Classifies the turn `a -> b -> c`.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::geometry::point::Point;
/// use constrained_delaunay::geometry::predicates::{Orientation, orientation};
///
/// let a = Point::new(0.0, 0.0);
/// let b = Point::new(0.0, 1.0);
/// let c = Point::new(1.0, 0.0);
/// assert_eq!(orientation(&a, &b, &c), Orientation::NEGATIVE);
/// assert_eq!(orientation(&a, &c, &b), Orientation::POSITIVE);
/// ```
#[must_use]
pub fn orientation<T: CoordinateScalar>(a: &Point<T>, b: &Point<T>, c: &Point<T>) -> Orientation {
    let det = signed_double_area(a, b, c);
    if det < T::zero() {
        Orientation::NEGATIVE
    } else if det > T::zero() {
        Orientation::POSITIVE
    } else {
        Orientation::DEGENERATE
    }
}

/// Returns `true` if `(a, b, c)` turns strictly clockwise.
#[inline]
#[must_use]
pub fn is_strictly_clockwise<T: CoordinateScalar>(a: &Point<T>, b: &Point<T>, c: &Point<T>) -> bool {
    signed_double_area(a, b, c) < T::zero()
}

/// Returns `true` if `(a, b, c)` is clockwise or degenerate.
///
/// This is the orientation every stored triangle must satisfy.
#[inline]
#[must_use]
pub fn is_clockwise<T: CoordinateScalar>(a: &Point<T>, b: &Point<T>, c: &Point<T>) -> bool {
    signed_double_area(a, b, c) <= T::zero()
}

/// A circle described by its center and squared radius.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::geometry::point::Point;
/// use constrained_delaunay::geometry::predicates::{Circle, InCircle};
///
/// let circle = Circle::circumscribing(
///     &Point::new(0.0, 0.0),
///     &Point::new(0.0, 2.0),
///     &Point::new(2.0, 0.0),
/// )
/// .unwrap();
/// assert_eq!(circle.center(), Point::new(1.0, 1.0));
/// assert_eq!(circle.classify(&Point::new(2.0, 2.0)), InCircle::BOUNDARY);
/// assert!(circle.contains_strictly(&Point::new(1.5, 1.5)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Circle<T> {
    center: Point<T>,
    squared_radius: T,
}

impl<T: CoordinateScalar> PartialEq for Circle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.center == other.center && self.squared_radius.ordered_eq(&other.squared_radius)
    }
}

impl<T: CoordinateScalar> Circle<T> {
    /// Circle through the three corners of a triangle.
    ///
    /// The center is the intersection of the perpendicular bisectors of sides `ab` and
    /// `ac`. Returns `None` when the corners are collinear and the bisectors are
    /// parallel.
    #[must_use]
    pub fn circumscribing(a: &Point<T>, b: &Point<T>, c: &Point<T>) -> Option<Self> {
        let mid_ab = a.midpoint(b);
        let mid_ac = a.midpoint(c);
        let dir_ab = (*b - *a).perpendicular();
        let dir_ac = (*c - *a).perpendicular();

        let denominator = dir_ab.cross(&dir_ac);
        if denominator.is_zero() {
            return None;
        }
        let t = (mid_ac - mid_ab).cross(&dir_ac) / denominator;
        let center = mid_ab + dir_ab * t;
        if !center.is_finite() {
            return None;
        }
        let squared_radius = (*a - center).squared_length();
        Some(Self {
            center,
            squared_radius,
        })
    }

    /// Center of the circle.
    #[must_use]
    pub const fn center(&self) -> Point<T> {
        self.center
    }

    /// Squared radius of the circle.
    #[must_use]
    pub const fn squared_radius(&self) -> T {
        self.squared_radius
    }

    /// Classifies `point` against this circle.
    #[must_use]
    pub fn classify(&self, point: &Point<T>) -> InCircle {
        let d = (*point - self.center).squared_length();
        if d < self.squared_radius {
            InCircle::INSIDE
        } else if d > self.squared_radius {
            InCircle::OUTSIDE
        } else {
            InCircle::BOUNDARY
        }
    }

    /// Returns `true` if `point` lies strictly inside this circle.
    #[inline]
    #[must_use]
    pub fn contains_strictly(&self, point: &Point<T>) -> bool {
        self.classify(point) == InCircle::INSIDE
    }
}

/// Returns `true` if `point` is strictly inside the circumcircle of `(a, b, c)`.
///
/// A degenerate triangle has no circumcircle and contains nothing.
#[must_use]
pub fn in_circumcircle<T: CoordinateScalar>(
    a: &Point<T>,
    b: &Point<T>,
    c: &Point<T>,
    point: &Point<T>,
) -> bool {
    Circle::circumscribing(a, b, c).is_some_and(|circle| circle.contains_strictly(point))
}

/// Returns `true` if segments `a`-`b` and `c`-`d` cross at a single interior point.
///
/// Segments sharing an endpoint never intersect, and neither do collinear or touching
/// segments.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::geometry::point::Point;
/// use constrained_delaunay::geometry::predicates::segments_intersect;
///
/// let p = |x, y| Point::new(x, y);
/// assert!(segments_intersect(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0)));
/// assert!(!segments_intersect(&p(0.0, 0.0), &p(2.0, 2.0), &p(2.0, 2.0), &p(3.0, 0.0)));
/// assert!(!segments_intersect(&p(0.0, 0.0), &p(2.0, 0.0), &p(1.0, 0.0), &p(1.0, 1.0)));
/// ```
#[must_use]
pub fn segments_intersect<T: CoordinateScalar>(
    a: &Point<T>,
    b: &Point<T>,
    c: &Point<T>,
    d: &Point<T>,
) -> bool {
    if a == c || a == d || b == c || b == d {
        return false;
    }
    let straddles = |o1: Orientation, o2: Orientation| {
        matches!(
            (o1, o2),
            (Orientation::NEGATIVE, Orientation::POSITIVE)
                | (Orientation::POSITIVE, Orientation::NEGATIVE)
        )
    };
    straddles(orientation(a, b, c), orientation(a, b, d))
        && straddles(orientation(c, d, a), orientation(c, d, b))
}

/// Returns `true` if `point` lies on the open segment `a`-`b` (endpoints excluded).
#[must_use]
pub fn point_on_open_segment<T: CoordinateScalar>(
    point: &Point<T>,
    a: &Point<T>,
    b: &Point<T>,
) -> bool {
    if point == a || point == b || orientation(a, b, point) != Orientation::DEGENERATE {
        return false;
    }
    let along = (*point - *a).dot(&(*b - *a));
    along > T::zero() && along < (*b - *a).squared_length()
}

/// Returns `true` if replacing diagonal `s1`-`s2` of the quadrilateral with `d1`-`d2`
/// yields two strictly clockwise triangles `(s1, d2, d1)` and `(s2, d1, d2)`.
///
/// `s1`/`s2` are the endpoints of the current diagonal and `d1`/`d2` the two apexes,
/// arranged so that `(s1, s2, d1)` is clockwise.
#[must_use]
pub fn flip_is_valid<T: CoordinateScalar>(
    s1: &Point<T>,
    s2: &Point<T>,
    d1: &Point<T>,
    d2: &Point<T>,
) -> bool {
    is_strictly_clockwise(s1, d2, d1) && is_strictly_clockwise(s2, d1, d2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point<f64> {
        Point::new(x, y)
    }

    #[test]
    fn orientation_signs() {
        assert_eq!(
            orientation(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.0, 1.0)),
            Orientation::POSITIVE
        );
        assert_eq!(
            orientation(&p(0.0, 0.0), &p(1.0, 1.0), &p(2.0, 2.0)),
            Orientation::DEGENERATE
        );
        assert!(is_strictly_clockwise(&p(0.0, 0.0), &p(0.0, 1.0), &p(1.0, 0.0)));
        assert!(is_clockwise(&p(0.0, 0.0), &p(1.0, 1.0), &p(2.0, 2.0)));
        assert!(!is_strictly_clockwise(&p(0.0, 0.0), &p(1.0, 1.0), &p(2.0, 2.0)));
    }

    #[test]
    fn orientation_is_exactly_antisymmetric() {
        let (a, b, c) = (p(0.1, 0.7), p(1e-9, 0.3), p(12.5, -3.3));
        let det = signed_double_area(&a, &b, &c);
        assert_eq!(signed_double_area(&b, &c, &a), det);
        assert_eq!(signed_double_area(&c, &a, &b), det);
        assert_eq!(signed_double_area(&b, &a, &c), -det);
        assert_eq!(signed_double_area(&a, &c, &b), -det);
        assert_eq!(signed_double_area(&c, &b, &a), -det);
    }

    #[test]
    fn circumcircle_of_right_triangle() {
        let circle = Circle::circumscribing(&p(0.0, 0.0), &p(4.0, 0.0), &p(0.0, 4.0)).unwrap();
        assert_relative_eq!(circle.center().x(), 2.0);
        assert_relative_eq!(circle.center().y(), 2.0);
        assert_relative_eq!(circle.squared_radius(), 8.0);
        assert_eq!(circle.classify(&p(4.0, 4.0)), InCircle::BOUNDARY);
        assert_eq!(circle.classify(&p(3.0, 3.0)), InCircle::INSIDE);
        assert_eq!(circle.classify(&p(5.0, 5.0)), InCircle::OUTSIDE);
    }

    #[test]
    fn circumcircle_independent_of_corner_order() {
        let (a, b, c) = (p(0.3, -1.2), p(2.5, 0.7), p(-0.4, 1.9));
        let c1 = Circle::circumscribing(&a, &b, &c).unwrap();
        let c2 = Circle::circumscribing(&c, &a, &b).unwrap();
        assert_relative_eq!(c1.center().x(), c2.center().x(), epsilon = 1e-12);
        assert_relative_eq!(c1.center().y(), c2.center().y(), epsilon = 1e-12);
        assert_relative_eq!(c1.squared_radius(), c2.squared_radius(), epsilon = 1e-12);
    }

    #[test]
    fn circles_compare_by_center_and_radius() {
        let (a, b, c) = (p(0.0, 0.0), p(4.0, 0.0), p(0.0, 4.0));
        let circle = Circle::circumscribing(&a, &b, &c).unwrap();
        assert_eq!(circle, Circle::circumscribing(&a, &b, &c).unwrap());
        assert_ne!(circle, Circle::circumscribing(&a, &b, &p(0.0, 6.0)).unwrap());
        assert_eq!(Circle::circumscribing(&a, &b, &p(8.0, 0.0)), None);
    }

    #[test]
    fn collinear_points_have_no_circumcircle() {
        assert!(Circle::circumscribing(&p(0.0, 0.0), &p(1.0, 1.0), &p(3.0, 3.0)).is_none());
        assert!(!in_circumcircle(
            &p(0.0, 0.0),
            &p(1.0, 1.0),
            &p(3.0, 3.0),
            &p(1.0, 1.5)
        ));
    }

    #[test]
    fn square_corner_is_cocircular_not_inside() {
        assert!(!in_circumcircle(
            &p(0.0, 0.0),
            &p(0.0, 4.0),
            &p(4.0, 0.0),
            &p(4.0, 4.0)
        ));
    }

    #[test]
    fn segment_intersection_is_proper_only() {
        // crossing
        assert!(segments_intersect(&p(0.0, 0.0), &p(4.0, 4.0), &p(4.0, 0.0), &p(0.0, 4.0)));
        // disjoint
        assert!(!segments_intersect(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.0, 1.0), &p(1.0, 1.0)));
        // collinear overlap
        assert!(!segments_intersect(&p(0.0, 0.0), &p(2.0, 0.0), &p(1.0, 0.0), &p(3.0, 0.0)));
        // shared endpoint
        assert!(!segments_intersect(&p(0.0, 0.0), &p(2.0, 0.0), &p(0.0, 0.0), &p(1.0, 1.0)));
        // T junction
        assert!(!segments_intersect(&p(0.0, 0.0), &p(2.0, 0.0), &p(1.0, -1.0), &p(1.0, 0.0)));
    }

    #[test]
    fn open_segment_membership() {
        assert!(point_on_open_segment(&p(1.0, 1.0), &p(0.0, 0.0), &p(2.0, 2.0)));
        assert!(!point_on_open_segment(&p(2.0, 2.0), &p(0.0, 0.0), &p(2.0, 2.0)));
        assert!(!point_on_open_segment(&p(3.0, 3.0), &p(0.0, 0.0), &p(2.0, 2.0)));
        assert!(!point_on_open_segment(&p(1.0, 1.1), &p(0.0, 0.0), &p(2.0, 2.0)));
    }

    #[test]
    fn flip_validity_requires_convex_quad() {
        // Square with diagonal (0,0)-(4,4); apexes (4,0) and (0,4).
        let (s1, s2) = (p(0.0, 0.0), p(4.0, 4.0));
        let (d1, d2) = (p(4.0, 0.0), p(0.0, 4.0));
        assert!(is_strictly_clockwise(&s1, &s2, &d1));
        assert!(is_strictly_clockwise(&s2, &s1, &d2));
        assert!(flip_is_valid(&s1, &s2, &d1, &d2));

        // Reflex at s2: the new diagonal would leave the quadrilateral.
        let d2_reflex = p(5.0, 5.5);
        assert!(is_strictly_clockwise(&s2, &s1, &d2_reflex));
        assert!(!flip_is_valid(&s1, &s2, &d1, &d2_reflex));
    }
}
