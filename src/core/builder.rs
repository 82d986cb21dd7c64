//! Fluent builder over every triangulation entry point.
//!
//! [`ConstrainedDelaunayBuilder`] unifies [`triangulate`](crate::core::delaunay_triangulation::triangulate),
//! [`triangulate_constrained`](crate::core::delaunay_triangulation::triangulate_constrained) and
//! [`triangulate_polygon`](crate::core::delaunay_triangulation::triangulate_polygon) under one
//! composable API and exposes every [`TriangulationOptions`] field.
//!
//! # When to use the builder
//!
//! | Situation | Recommended API |
//! |---|---|
//! | Plain Delaunay triangulation, default options | [`triangulate`](crate::core::delaunay_triangulation::triangulate) |
//! | Constrained edges inside the hull | [`triangulate_constrained`](crate::core::delaunay_triangulation::triangulate_constrained) |
//! | Interior of a simple polygon | [`triangulate_polygon`](crate::core::delaunay_triangulation::triangulate_polygon) |
//! | Custom insertion order, margin, budget, or a polygon with extra constraints | [`ConstrainedDelaunayBuilder`] |
//!
//! # Examples
//!
//! ```rust
//! use constrained_delaunay::core::builder::ConstrainedDelaunayBuilder;
//! use constrained_delaunay::core::delaunay_triangulation::InsertionOrder;
//! use constrained_delaunay::geometry::point::Point;
//!
//! let points = vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(6.0, 0.0),
//!     Point::new(6.0, 4.0),
//!     Point::new(0.0, 4.0),
//!     Point::new(3.0, 2.0),
//! ];
//!
//! let triangulation = ConstrainedDelaunayBuilder::new(&points)
//!     .constrained_edges([(0, 4), (4, 2)])
//!     .insertion_order(InsertionOrder::Input)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(triangulation.number_of_triangles(), 4);
//! assert!(triangulation.is_constrained_edge(4, 0));
//! ```

use crate::core::delaunay_triangulation::{
    Domain, InsertionOrder, TriangulationError, TriangulationOptions, polygon_edges,
    triangulate_with_options,
};
use crate::core::triangulation::Triangulation;
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;

// =============================================================================
// BUILDER STRUCT
// =============================================================================

/// Fluent builder for [`Triangulation`].
///
/// # Type Parameters
///
/// - `'p`: lifetime of the borrowed point slice.
/// - `T`: coordinate scalar type (inferred from the point slice).
#[derive(Clone, Debug)]
pub struct ConstrainedDelaunayBuilder<'p, T>
where
    T: CoordinateScalar,
{
    points: &'p [Point<T>],
    constrained_edges: Vec<(usize, usize)>,
    options: TriangulationOptions,
}

// =============================================================================
// SPECIALIZED IMPL - f64 coordinates (common case)
//
// `new` pins T=f64 so callers building from literals need no annotations;
// `from_points` below accepts any scalar.
// =============================================================================

impl<'p> ConstrainedDelaunayBuilder<'p, f64> {
    /// Creates a builder for `f64` points with default options and no constraints.
    #[must_use]
    pub fn new(points: &'p [Point<f64>]) -> Self {
        Self::from_points(points)
    }
}

// =============================================================================
// GENERIC IMPL - any scalar T
// =============================================================================

impl<'p, T> ConstrainedDelaunayBuilder<'p, T>
where
    T: CoordinateScalar,
{
    /// Creates a builder for points of any scalar type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use constrained_delaunay::core::builder::ConstrainedDelaunayBuilder;
    /// use constrained_delaunay::geometry::point::Point;
    ///
    /// let points = [Point::new(0.0_f32, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)];
    /// let triangulation = ConstrainedDelaunayBuilder::from_points(&points).build().unwrap();
    /// assert_eq!(triangulation.number_of_triangles(), 1);
    /// ```
    #[must_use]
    pub fn from_points(points: &'p [Point<T>]) -> Self {
        Self {
            points,
            constrained_edges: Vec::new(),
            options: TriangulationOptions::default(),
        }
    }

    /// Adds constrained edges as index pairs into the point slice.
    ///
    /// May be called repeatedly; edges accumulate.
    #[must_use]
    pub fn constrained_edges(mut self, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        self.constrained_edges.extend(edges);
        self
    }

    /// Treats the points, in order, as a closed polygon: adds its ring of edges as
    /// constraints and switches to [`Domain::ConstrainedPolygon`].
    #[must_use]
    pub fn polygon(mut self) -> Self {
        self.constrained_edges.extend(polygon_edges(self.points.len()));
        self.options.domain = Domain::ConstrainedPolygon;
        self
    }

    /// Sets the output domain.
    #[must_use]
    pub const fn domain(mut self, domain: Domain) -> Self {
        self.options.domain = domain;
        self
    }

    /// Sets the insertion order.
    #[must_use]
    pub const fn insertion_order(mut self, insertion_order: InsertionOrder) -> Self {
        self.options.insertion_order = insertion_order;
        self
    }

    /// Replaces all options at once. Domain and insertion order set earlier are
    /// overwritten.
    #[must_use]
    pub const fn options(mut self, options: TriangulationOptions) -> Self {
        self.options = options;
        self
    }

    /// Enables or disables the output checks.
    #[must_use]
    pub const fn validate_output(mut self, validate_output: bool) -> Self {
        self.options.validate_output = validate_output;
        self
    }

    /// Runs the triangulation.
    ///
    /// # Errors
    ///
    /// See [`TriangulationError`].
    pub fn build(self) -> Result<Triangulation<T>, TriangulationError> {
        triangulate_with_options(self.points, &self.constrained_edges, &self.options)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::delaunay_triangulation::TriangulationOptionsBuilder;
    use approx::assert_relative_eq;

    fn notched_square() -> Vec<Point<f64>> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(2.0, 1.0),
            Point::new(0.0, 4.0),
        ]
    }

    #[test]
    fn test_builder_defaults_to_convex_hull() {
        let points = notched_square();
        let triangulation = ConstrainedDelaunayBuilder::new(&points).build().unwrap();
        assert_eq!(triangulation.domain(), Domain::ConvexHull);
        assert_eq!(triangulation.number_of_triangles(), 4);
        assert_relative_eq!(triangulation.area(), 16.0);
    }

    #[test]
    fn test_builder_polygon_drops_the_notch() {
        let points = notched_square();
        let triangulation = ConstrainedDelaunayBuilder::new(&points)
            .polygon()
            .build()
            .unwrap();
        assert_eq!(triangulation.domain(), Domain::ConstrainedPolygon);
        assert_relative_eq!(triangulation.area(), 10.0);
    }

    #[test]
    fn test_builder_edges_accumulate() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(6.0, 0.0),
            Point::new(6.0, 4.0),
            Point::new(0.0, 4.0),
            Point::new(3.0, 2.0),
        ];
        let triangulation = ConstrainedDelaunayBuilder::new(&points)
            .constrained_edges([(0, 4)])
            .constrained_edges([(4, 2)])
            .build()
            .unwrap();
        assert_eq!(triangulation.constrained_edges(), &[(0, 4), (2, 4)]);
        assert!(triangulation.validate_constraints().is_ok());
    }

    #[test]
    fn test_builder_custom_options_propagated() {
        let points = notched_square();
        let options = TriangulationOptionsBuilder::default()
            .insertion_order(InsertionOrder::Randomized { seed: 99 })
            .super_triangle_margin(16.0)
            .build()
            .unwrap();
        let triangulation = ConstrainedDelaunayBuilder::new(&points)
            .options(options)
            .domain(Domain::ConvexHull)
            .build()
            .unwrap();
        assert_eq!(triangulation.number_of_triangles(), 4);
    }

    #[test]
    fn test_builder_reports_input_errors() {
        let points = notched_square();
        let result = ConstrainedDelaunayBuilder::new(&points)
            .constrained_edges([(0, 9)])
            .build();
        assert!(matches!(
            result,
            Err(TriangulationError::InvalidConstraint { edge: (0, 9), .. })
        ));
    }
}
