//! # constrained-delaunay
//!
//! This is a library for computing constrained Delaunay triangulations of planar point
//! sets: every caller-specified edge appears in the mesh, and every other edge satisfies
//! the empty-circumcircle property wherever the constraints allow it.
//!
//! # Features
//!
//! - Delaunay triangulation of the convex hull of a point set
//! - Constrained edges forced into the mesh by edge flipping
//! - Polygon triangulation (only the region enclosed by the constraints is kept)
//! - Generic floating-point coordinates (`f32`, `f64`, anything implementing
//!   [`CoordinateScalar`](geometry::traits::coordinate::CoordinateScalar))
//! - Deterministic, seeded randomized insertion order
//! - Options loadable with [serde](https://serde.rs) from a host application's config
//!
//! # Basic Usage
//!
//! ```rust
//! use constrained_delaunay::prelude::*;
//!
//! let points = vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(4.0, 0.0),
//!     Point::new(4.0, 4.0),
//!     Point::new(0.0, 4.0),
//! ];
//!
//! // Unconstrained: two triangles sharing one of the diagonals.
//! let triangulation = triangulate(&points).unwrap();
//! assert_eq!(triangulation.number_of_triangles(), 2);
//!
//! // Constrained: the diagonal (0,0)-(4,4) must be an edge.
//! let triangulation = triangulate_constrained(&points, &[(0, 2)]).unwrap();
//! assert!(triangulation.triangles().iter().all(|t| t.has_edge(0, 2)));
//! ```
//!
//! Output triangles name input points by their index in the slice, in clockwise order.
//!
//! # Domains
//!
//! [`Domain::ConvexHull`](core::delaunay_triangulation::Domain::ConvexHull) (the default)
//! tiles the convex hull of the points. [`Domain::ConstrainedPolygon`](core::delaunay_triangulation::Domain::ConstrainedPolygon)
//! keeps only the triangles enclosed by the constrained edges:
//!
//! ```rust
//! use constrained_delaunay::prelude::*;
//!
//! // U shape
//! let points = vec![
//!     Point::new(0.0_f64, 0.0),
//!     Point::new(3.0, 0.0),
//!     Point::new(3.0, 3.0),
//!     Point::new(2.0, 3.0),
//!     Point::new(2.0, 1.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(1.0, 3.0),
//!     Point::new(0.0, 3.0),
//! ];
//! let triangulation = triangulate_polygon(&points).unwrap();
//! assert_eq!(triangulation.number_of_triangles(), 6);
//! assert!((triangulation.area() - 7.0).abs() < 1e-12);
//! ```
//!
//! # Algorithm
//!
//! 1. All points are wrapped in a clockwise super triangle.
//! 2. Points are inserted one at a time. The triangle containing a point splits into
//!    three, and the new edges are legalized by flipping.
//! 3. Constrained edges (and hull edges, for the convex-hull domain) are forced into
//!    the mesh by flipping the edges that cross them.
//! 4. A flood fill from the super-triangle corners removes everything outside the domain.
//!
//! Edges crossing a constraint or touching a super-triangle corner are *enforced*: the
//! legalizer never creates one by a flip and removes one whenever it can.
//!
//! # Error Handling
//!
//! Every entry point returns
//! [`TriangulationError`](core::delaunay_triangulation::TriangulationError). Degenerate
//! input (fewer than three points, duplicates, collinear sets, non-finite coordinates,
//! crossing constraints, a constraint passing through a point) is reported there. A
//! broken internal invariant is a bug and panics after logging through `tracing`.
//!
//! # Logging
//!
//! The crate logs through [`tracing`](https://docs.rs/tracing). A summary of each run is
//! emitted at `debug` level. Setting the `CDT_TRACE` environment variable adds per-split,
//! per-flip and per-recovery detail.

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the working mesh, the triangulation algorithms and the
/// public entry points.
///
/// It includes the `Tds` arena of triangles, the tracked-vertex registry, the flip and
/// insertion algorithms, and the `Triangulation` result type.
pub mod core {
    /// Triangulation algorithms operating on the working mesh
    pub mod algorithms {
        /// Forcing constrained and hull edges into the mesh
        pub mod constraint_recovery;
        /// Edge flips and Delaunay legalization
        pub mod flips;
        /// Point insertion by triangle splitting
        pub mod incremental_insertion;
    }
    pub mod boundary;
    pub mod builder;
    /// High-performance collection types optimized for computational geometry
    pub mod collections;
    pub mod delaunay_triangulation;
    pub mod edge;
    pub mod triangle;
    pub mod triangulation;
    pub mod triangulation_data_structure;
    pub mod util;
    pub mod vertex;
    // Re-export the `core` modules.
    pub use builder::*;
    pub use delaunay_triangulation::*;
    pub use triangulation::*;
    pub use triangulation_data_structure::*;
    pub use util::*;
    // Note: collections module not re-exported here to avoid namespace pollution
    // Import specific types via prelude or use crate::core::collections::
}

/// Contains geometric types including the `Point` struct and geometric predicates.
///
/// `Point` is a plain 2D vector over a generic floating-point scalar with exact
/// equality and hashing. The predicates module holds orientation, circumcircle and
/// segment-intersection tests.
pub mod geometry {
    pub mod point;
    pub mod predicates;
    /// Convex hulls, polygon areas and reproducible random point sets
    pub mod util;
    /// Traits module containing the coordinate scalar abstraction.
    ///
    /// `CoordinateScalar` bundles `num_traits::Float` with the validation
    /// (`FiniteCheck`), equality (`OrderedEq`) and hashing (`HashCoordinate`)
    /// traits used for exact point identity.
    pub mod traits {
        pub mod coordinate;
        pub use coordinate::*;
    }
    pub use point::*;
    pub use predicates::*;
    pub use traits::*;
    pub use util::*;
}

/// A prelude module that re-exports commonly used types and functions.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{builder::*, delaunay_triangulation::*, triangulation::*, util::*};

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    // Re-export from geometry
    pub use crate::geometry::{point::*, predicates::*, traits::coordinate::*, util::*};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            builder::ConstrainedDelaunayBuilder,
            delaunay_triangulation::{TriangulationError, TriangulationOptions},
            edge::ConstraintSet,
            triangulation::{IndexedTriangle, Triangulation},
            triangulation_data_structure::Tds,
        },
        geometry::Point,
        is_normal,
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point<f64>>());
        assert!(is_normal::<Point<f32>>());
        assert!(is_normal::<Tds<f64>>());
        assert!(is_normal::<ConstraintSet<f64>>());
        assert!(is_normal::<IndexedTriangle>());
        assert!(is_normal::<Triangulation<f64>>());
        assert!(is_normal::<Triangulation<f32>>());
        assert!(is_normal::<TriangulationOptions>());
        assert!(is_normal::<TriangulationError>());
        assert!(is_normal::<ConstrainedDelaunayBuilder<'static, f64>>());
    }

    #[test]
    fn test_prelude_collections_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<u64, usize> = FastHashMap::default();
        map.insert(123, 456);
        assert_eq!(map.get(&123), Some(&456));

        let mut set: FastHashSet<u64> = FastHashSet::default();
        set.insert(789);
        assert!(set.contains(&789));

        let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
        buffer.push(42);
        assert_eq!(buffer.len(), 1);

        let map_with_cap = fast_hash_map_with_capacity::<u64, usize>(100);
        assert!(map_with_cap.capacity() >= 100);

        let set_with_cap = fast_hash_set_with_capacity::<u64>(50);
        assert!(set_with_cap.capacity() >= 50);
    }

    #[test]
    fn test_prelude_entry_points() {
        use crate::prelude::*;

        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 2.0),
        ];
        let triangulation = triangulate(&points).unwrap();
        assert_eq!(triangulation.number_of_triangles(), 1);
        assert_eq!(triangulation.domain(), Domain::ConvexHull);

        let hull = convex_hull_indices(&points);
        assert_eq!(hull.len(), 3);
        assert!(is_strictly_clockwise(&points[0], &points[2], &points[1]));
    }
}
