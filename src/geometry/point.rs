//! Planar points and the vector arithmetic the triangulation engine consumes.
//!
//! # Exact Equality Semantics
//!
//! `Point` equality compares coordinates exactly (IEEE `==`, so `0.0 == -0.0`). Vertex
//! identity, constraint lookup and the corner matching performed by the legalizer all
//! rely on this. No tolerance is ever applied: two points that differ in the last bit
//! are distinct vertices.
//!
//! The same type doubles as a 2D vector: `a - b` is the vector from `b` to `a`, and
//! [`Point::cross`] returns the z-component of the 3D cross product.

use crate::geometry::traits::coordinate::{CoordinateScalar, FiniteCheck};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Sub};

/// A point (or free vector) in the plane.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::geometry::point::Point;
///
/// let a = Point::new(1.0, 2.0);
/// let b = Point::from([4.0, 6.0]);
/// assert_eq!((b - a).squared_length(), 25.0);
/// assert_eq!(a, Point::new(1.0, 2.0));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Point<T> {
    coords: [T; 2],
}

impl<T: CoordinateScalar> Point<T> {
    /// Creates a point from its two coordinates.
    #[inline]
    #[must_use]
    pub const fn new(x: T, y: T) -> Self {
        Self { coords: [x, y] }
    }

    /// The x coordinate.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> T {
        self.coords[0]
    }

    /// The y coordinate.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> T {
        self.coords[1]
    }

    /// Both coordinates as an array.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> &[T; 2] {
        &self.coords
    }

    /// Returns `true` if both coordinates are finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.coords.iter().all(FiniteCheck::is_finite_generic)
    }

    /// Z-component of the cross product `self × other`.
    ///
    /// Positive when `other` is counter-clockwise from `self`.
    ///
    /// ```rust
    /// use constrained_delaunay::geometry::point::Point;
    ///
    /// let ex = Point::new(1.0, 0.0);
    /// let ey = Point::new(0.0, 1.0);
    /// assert_eq!(ex.cross(&ey), 1.0);
    /// assert_eq!(ey.cross(&ex), -1.0);
    /// ```
    #[inline]
    #[must_use]
    pub fn cross(&self, other: &Self) -> T {
        self.x() * other.y() - self.y() * other.x()
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(&self, other: &Self) -> T {
        self.x() * other.x() + self.y() * other.y()
    }

    /// Squared Euclidean length of this vector.
    #[inline]
    #[must_use]
    pub fn squared_length(&self) -> T {
        self.dot(self)
    }

    /// Rotates this vector a quarter turn counter-clockwise: `(x, y) -> (-y, x)`.
    #[inline]
    #[must_use]
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y(), self.x())
    }

    /// Midpoint of the segment `self`-`other`.
    #[inline]
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        let two = T::one() + T::one();
        Self::new((self.x() + other.x()) / two, (self.y() + other.y()) / two)
    }

    /// Largest absolute coordinate.
    #[inline]
    #[must_use]
    pub fn max_abs_coordinate(&self) -> T {
        self.x().abs().max(self.y().abs())
    }
}

impl<T: CoordinateScalar> Add for Point<T> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x() + rhs.x(), self.y() + rhs.y())
    }
}

impl<T: CoordinateScalar> Sub for Point<T> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x() - rhs.x(), self.y() - rhs.y())
    }
}

impl<T: CoordinateScalar> Mul<T> for Point<T> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: T) -> Self {
        Self::new(self.x() * rhs, self.y() * rhs)
    }
}

impl<T: CoordinateScalar> PartialEq for Point<T> {
    fn eq(&self, other: &Self) -> bool {
        self.x().ordered_eq(&other.x()) && self.y().ordered_eq(&other.y())
    }
}

impl<T: CoordinateScalar> Eq for Point<T> {}

impl<T: CoordinateScalar> Hash for Point<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x().hash_scalar(state);
        self.y().hash_scalar(state);
    }
}

impl<T: CoordinateScalar> From<[T; 2]> for Point<T> {
    #[inline]
    fn from(coords: [T; 2]) -> Self {
        Self { coords }
    }
}

impl<T: CoordinateScalar> From<(T, T)> for Point<T> {
    #[inline]
    fn from((x, y): (T, T)) -> Self {
        Self::new(x, y)
    }
}

impl<T: CoordinateScalar> From<Point<T>> for [T; 2] {
    #[inline]
    fn from(point: Point<T>) -> Self {
        point.coords
    }
}

impl<T: CoordinateScalar + fmt::Display> fmt::Display for Point<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}
