//! Constrained Delaunay triangulation entry points.
//!
//! A run goes through these stages, in order:
//!
//! 1. validate the options, the points and the constrained edges;
//! 2. wrap every point in a super triangle ([`crate::core::boundary`]);
//! 3. insert the points one at a time, legalizing after each split
//!    ([`crate::core::algorithms::incremental_insertion`]);
//! 4. force the constrained edges, plus the convex-hull edges for
//!    [`Domain::ConvexHull`], into the mesh; a hull side through collinear points is
//!    forced piecewise ([`crate::core::algorithms::constraint_recovery`]);
//! 5. flood-fill away everything outside the domain;
//! 6. convert the surviving triangles to input indices and optionally check them.
//!
//! The three front doors are [`triangulate`], [`triangulate_constrained`] and
//! [`triangulate_polygon`]; [`crate::core::builder::ConstrainedDelaunayBuilder`] exposes
//! every option.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::algorithms::constraint_recovery::{
    ConstraintRecoveryError, recover_boundary, recover_edges,
};
use crate::core::algorithms::flips::{DEFAULT_FLIP_BUDGET_FACTOR, LegalizationStats};
use crate::core::algorithms::incremental_insertion::{InsertionError, insert_vertex};
use crate::core::boundary::{
    DEFAULT_SUPER_TRIANGLE_JITTER, DEFAULT_SUPER_TRIANGLE_MARGIN, MAX_SUPER_TRIANGLE_JITTER,
    MIN_SUPER_TRIANGLE_MARGIN, build_super_triangle, remove_outer_triangles, super_triangle_corners,
};
use crate::core::collections::FastHashSet;
use crate::core::collections::spatial_hash_grid::{SegmentHashGrid, cell_size_for_segments};
use crate::core::edge::{ConstraintSet, EdgeKey};
use crate::core::triangulation::{
    IndexedTriangle, Triangulation, TriangulationStatistics, TriangulationValidationError,
};
use crate::core::triangulation_data_structure::{Tds, VertexKey};
use crate::core::util::{find_exact_duplicate, invariant_violation};
use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, orientation, segments_intersect, signed_double_area};
use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::convex_hull_indices;

/// Seed of the default randomized insertion order.
pub const DEFAULT_INSERTION_SEED: u64 = 0x5eed_cd7;

// =============================================================================
// OPTIONS
// =============================================================================

/// Region covered by the output triangles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// The convex hull of the input points. Constrained edges inside it are honored.
    #[default]
    ConvexHull,
    /// The region enclosed by the constrained edges. Triangles reachable from outside
    /// without crossing a constrained edge are discarded.
    ConstrainedPolygon,
}

/// Order in which input points are inserted.
///
/// Point location walks remaining-vertex lists, which is expected `O(n log n)` for a
/// random order and can degrade to quadratic for sorted input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionOrder {
    /// Insert points in the order given.
    Input,
    /// Insert points in a shuffled order, reproducible from `seed`.
    Randomized {
        /// Shuffle seed.
        seed: u64,
    },
}

impl Default for InsertionOrder {
    fn default() -> Self {
        Self::Randomized {
            seed: DEFAULT_INSERTION_SEED,
        }
    }
}

/// Tuning knobs for a triangulation run.
///
/// All fields have defaults, so a partial configuration deserializes cleanly:
///
/// ```rust
/// use constrained_delaunay::core::delaunay_triangulation::{Domain, TriangulationOptions};
///
/// let options: TriangulationOptions =
///     serde_json::from_str(r#"{ "domain": "constrained_polygon" }"#).unwrap();
/// assert_eq!(options.domain, Domain::ConstrainedPolygon);
/// assert_eq!(options.super_triangle_margin, 4.0);
/// assert!(options.validate().is_ok());
/// ```
///
/// The builder rejects out-of-range values:
///
/// ```rust
/// use constrained_delaunay::core::delaunay_triangulation::TriangulationOptionsBuilder;
///
/// assert!(TriangulationOptionsBuilder::default().super_triangle_margin(2.0).build().is_err());
/// ```
#[derive(Builder, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct TriangulationOptions {
    /// Region covered by the output.
    #[builder(default)]
    pub domain: Domain,
    /// Point insertion order.
    #[builder(default)]
    pub insertion_order: InsertionOrder,
    /// Super-triangle size as a multiple of the largest absolute input coordinate.
    /// Must be finite and greater than 3.
    #[builder(default = "DEFAULT_SUPER_TRIANGLE_MARGIN")]
    pub super_triangle_margin: f64,
    /// Offset of the super-triangle corners as a fraction of the largest absolute input
    /// coordinate. Must lie in `[0, 0.1]`.
    #[builder(default = "DEFAULT_SUPER_TRIANGLE_JITTER")]
    pub super_triangle_jitter: f64,
    /// Flip budget per legalization or recovery pass, per live triangle. At least 1.
    #[builder(default = "DEFAULT_FLIP_BUDGET_FACTOR")]
    pub flip_budget_factor: usize,
    /// Run the structural and constraint checks on the output before returning it.
    #[builder(default = "true")]
    pub validate_output: bool,
}

impl Default for TriangulationOptions {
    fn default() -> Self {
        Self {
            domain: Domain::default(),
            insertion_order: InsertionOrder::default(),
            super_triangle_margin: DEFAULT_SUPER_TRIANGLE_MARGIN,
            super_triangle_jitter: DEFAULT_SUPER_TRIANGLE_JITTER,
            flip_budget_factor: DEFAULT_FLIP_BUDGET_FACTOR,
            validate_output: true,
        }
    }
}

fn check_margin(margin: f64) -> Result<(), String> {
    if margin.is_finite() && margin > MIN_SUPER_TRIANGLE_MARGIN {
        Ok(())
    } else {
        Err(format!(
            "super_triangle_margin must be finite and greater than {MIN_SUPER_TRIANGLE_MARGIN}, got {margin}"
        ))
    }
}

fn check_jitter(jitter: f64) -> Result<(), String> {
    if (0.0..=MAX_SUPER_TRIANGLE_JITTER).contains(&jitter) {
        Ok(())
    } else {
        Err(format!(
            "super_triangle_jitter must lie in [0, {MAX_SUPER_TRIANGLE_JITTER}], got {jitter}"
        ))
    }
}

fn check_budget_factor(factor: usize) -> Result<(), String> {
    if factor == 0 {
        Err("flip_budget_factor must be at least 1".to_string())
    } else {
        Ok(())
    }
}

impl TriangulationOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(margin) = self.super_triangle_margin {
            check_margin(margin)?;
        }
        if let Some(jitter) = self.super_triangle_jitter {
            check_jitter(jitter)?;
        }
        if let Some(factor) = self.flip_budget_factor {
            check_budget_factor(factor)?;
        }
        Ok(())
    }
}

impl TriangulationOptions {
    /// Sets the output domain.
    #[must_use]
    pub const fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    /// Sets the insertion order.
    #[must_use]
    pub const fn with_insertion_order(mut self, insertion_order: InsertionOrder) -> Self {
        self.insertion_order = insertion_order;
        self
    }

    /// Enables or disables the output checks.
    #[must_use]
    pub const fn with_validate_output(mut self, validate_output: bool) -> Self {
        self.validate_output = validate_output;
        self
    }

    /// Checks every field against its documented range.
    ///
    /// Options built with [`TriangulationOptionsBuilder`] are already checked; options
    /// deserialized or assembled by hand are checked again at the start of every run.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::InvalidOptions`] naming the first bad field.
    pub fn validate(&self) -> Result<(), TriangulationError> {
        check_margin(self.super_triangle_margin)
            .and_then(|()| check_jitter(self.super_triangle_jitter))
            .and_then(|()| check_budget_factor(self.flip_budget_factor))
            .map_err(|message| TriangulationError::InvalidOptions { message })
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Failure of a triangulation run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TriangulationError {
    /// Fewer than three points were given.
    #[error("Insufficient vertices: need at least 3, found {found}")]
    InsufficientVertices {
        /// Number of points given.
        found: usize,
    },
    /// A point has a NaN or infinite coordinate.
    #[error("Input point {index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Index of the offending point.
        index: usize,
    },
    /// Two points have exactly equal coordinates.
    #[error("Input points {first} and {second} are duplicates")]
    DuplicateVertex {
        /// Index of the first occurrence.
        first: usize,
        /// Index of the repeat.
        second: usize,
    },
    /// All points lie on one line, so no triangle has positive area.
    #[error("All input points are collinear")]
    CollinearVertices,
    /// A constrained edge is malformed.
    #[error("Invalid constrained edge {edge:?}: {message}")]
    InvalidConstraint {
        /// The edge as given.
        edge: (usize, usize),
        /// What is wrong with it.
        message: String,
    },
    /// Two constrained edges cross each other.
    #[error("Constrained edges {first:?} and {second:?} intersect")]
    IntersectingConstraints {
        /// The first edge, as given.
        first: (usize, usize),
        /// The second edge, as given.
        second: (usize, usize),
    },
    /// The input coordinates are so large that the super triangle overflows.
    #[error("Input extent {extent} is too large to enclose in a super triangle")]
    ExtentTooLarge {
        /// Largest absolute input coordinate, formatted.
        extent: String,
    },
    /// The options are out of range.
    #[error("Invalid options: {message}")]
    InvalidOptions {
        /// Which option and why.
        message: String,
    },
    /// Point insertion failed.
    #[error(transparent)]
    Insertion(#[from] InsertionError),
    /// A constrained or hull edge could not be forced into the mesh.
    #[error(transparent)]
    ConstraintRecovery(#[from] ConstraintRecoveryError),
    /// A zero-area triangle survived to the output.
    #[error("Output triangle {triangle:?} has zero area")]
    DegenerateTriangle {
        /// Input indices of its corners.
        triangle: [usize; 3],
    },
    /// The constrained edges enclose no region, so nothing survived the flood fill.
    #[error("The constrained edges do not enclose any region")]
    EmptyDomain,
    /// The output failed its checks.
    #[error("Output validation failed: {0}")]
    Validation(#[from] TriangulationValidationError),
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Delaunay triangulation of the convex hull of `points`.
///
/// # Errors
///
/// See [`TriangulationError`].
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::prelude::*;
///
/// let points = [
///     Point::new(0.0, 0.0),
///     Point::new(4.0, 0.0),
///     Point::new(4.0, 4.0),
///     Point::new(0.0, 4.0),
///     Point::new(1.0, 2.0),
/// ];
/// let triangulation = triangulate(&points).unwrap();
/// assert_eq!(triangulation.number_of_triangles(), 4);
/// assert!(triangulation.validate_delaunay().is_ok());
/// ```
pub fn triangulate<T: CoordinateScalar>(points: &[Point<T>]) -> Result<Triangulation<T>, TriangulationError> {
    triangulate_with_options(points, &[], &TriangulationOptions::default())
}

/// Constrained Delaunay triangulation of the convex hull of `points`, with every
/// `(a, b)` in `constrained_edges` present as a triangle side.
///
/// # Errors
///
/// See [`TriangulationError`].
pub fn triangulate_constrained<T: CoordinateScalar>(
    points: &[Point<T>],
    constrained_edges: &[(usize, usize)],
) -> Result<Triangulation<T>, TriangulationError> {
    triangulate_with_options(points, constrained_edges, &TriangulationOptions::default())
}

/// Triangulates the simple polygon whose vertices are `points`, in order.
///
/// Consecutive points, and the last and first, are joined by constrained edges, and only
/// the enclosed region is kept. Either winding is accepted.
///
/// # Errors
///
/// See [`TriangulationError`].
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::prelude::*;
///
/// // L shape: the notch at the top right stays empty
/// let points = [
///     Point::new(0.0_f64, 0.0),
///     Point::new(2.0, 0.0),
///     Point::new(2.0, 1.0),
///     Point::new(1.0, 1.0),
///     Point::new(1.0, 2.0),
///     Point::new(0.0, 2.0),
/// ];
/// let triangulation = triangulate_polygon(&points).unwrap();
/// assert_eq!(triangulation.number_of_triangles(), 4);
/// assert!((triangulation.area() - 3.0).abs() < 1e-12);
/// ```
pub fn triangulate_polygon<T: CoordinateScalar>(points: &[Point<T>]) -> Result<Triangulation<T>, TriangulationError> {
    let edges = polygon_edges(points.len());
    let options = TriangulationOptions::default().with_domain(Domain::ConstrainedPolygon);
    triangulate_with_options(points, &edges, &options)
}

/// Closed ring of edges `(i, i + 1)` over `len` points.
#[must_use]
pub fn polygon_edges(len: usize) -> Vec<(usize, usize)> {
    (0..len).map(|i| (i, (i + 1) % len)).collect()
}

/// Triangulates `points` with `constrained_edges` under explicit `options`.
///
/// # Errors
///
/// See [`TriangulationError`].
///
/// # Panics
///
/// Panics if an internal mesh invariant is broken, which indicates a bug rather than
/// bad input.
pub fn triangulate_with_options<T: CoordinateScalar>(
    points: &[Point<T>],
    constrained_edges: &[(usize, usize)],
    options: &TriangulationOptions,
) -> Result<Triangulation<T>, TriangulationError> {
    options.validate()?;
    validate_points(points)?;
    let constrained_edges = validate_constraints(points, constrained_edges)?;

    let margin = cast_option::<T>(options.super_triangle_margin, "super_triangle_margin")?;
    let jitter = cast_option::<T>(options.super_triangle_jitter, "super_triangle_jitter")?;
    let extent = points
        .iter()
        .map(Point::max_abs_coordinate)
        .fold(T::zero(), T::max);
    if !super_triangle_corners(extent, margin, jitter)
        .iter()
        .all(Point::is_finite)
    {
        return Err(TriangulationError::ExtentTooLarge {
            extent: format!("{extent:?}"),
        });
    }

    let mut statistics = TriangulationStatistics {
        input_points: points.len(),
        ..TriangulationStatistics::default()
    };

    // stage 2: super triangle
    let mut tds = Tds::with_capacity(points.len());
    let keys: Vec<VertexKey> = points
        .iter()
        .map(|&point| tds.vertices_mut().register_input(point))
        .collect();
    let _ = build_super_triangle(&mut tds, margin, jitter);

    let constraint_keys: Vec<(VertexKey, VertexKey)> = constrained_edges
        .iter()
        .map(|&(a, b)| (keys[a], keys[b]))
        .collect();
    let constraints = ConstraintSet::new(&tds, constraint_keys.iter().copied());

    // stage 3: insertion
    let mut order = keys.clone();
    if let InsertionOrder::Randomized { seed } = options.insertion_order {
        order.shuffle(&mut StdRng::seed_from_u64(seed));
    }
    let mut legalization = LegalizationStats::default();
    for &vertex in &order {
        insert_vertex(
            &mut tds,
            &constraints,
            vertex,
            options.flip_budget_factor,
            &mut legalization,
        )?;
        statistics.insertions += 1;
    }

    // stage 4: recovery
    let hull_ring: Vec<(VertexKey, VertexKey)> = match options.domain {
        Domain::ConvexHull => {
            let hull = convex_hull_indices(points);
            polygon_edges(hull.len())
                .into_iter()
                .map(|(i, j)| (keys[hull[i]], keys[hull[j]]))
                .collect()
        }
        Domain::ConstrainedPolygon => Vec::new(),
    };
    statistics.recovery_flips = recover_edges(
        &mut tds,
        &constraints,
        &constraint_keys,
        options.flip_budget_factor,
        &mut legalization,
    )?;
    let (hull_flips, hull_edges) = recover_boundary(
        &mut tds,
        &constraints,
        &hull_ring,
        options.flip_budget_factor,
        &mut legalization,
    )?;
    statistics.recovery_flips += hull_flips;
    statistics.legalization = legalization;

    // stage 5: outer removal
    let hull_lookup: FastHashSet<EdgeKey> = hull_edges.iter().copied().map(EdgeKey::from).collect();
    statistics.removed_triangles = remove_outer_triangles(&mut tds, |a, b| {
        constraints.contains(a, b) || hull_lookup.contains(&EdgeKey::new(a, b))
    });

    if options.validate_output
        && let Err(err) = tds.validate()
    {
        invariant_violation(err);
    }

    // stage 6: output
    let triangles = extract_triangles(&tds)?;
    if triangles.is_empty() {
        return Err(TriangulationError::EmptyDomain);
    }
    let triangulation = Triangulation::new(
        points.to_vec(),
        triangles,
        &constrained_edges,
        options.domain,
        statistics,
    );

    if options.validate_output {
        let checked = triangulation
            .validate()
            .and_then(|()| triangulation.validate_constraints());
        if let Err(err) = checked {
            tracing::warn!(%err, "triangulation output failed validation");
            return Err(err.into());
        }
        if let Err(err) = triangulation.validate_delaunay() {
            tracing::warn!(%err, "triangulation output is not locally Delaunay");
        }
    }

    tracing::debug!(
        points = statistics.input_points,
        triangles = triangulation.number_of_triangles(),
        flips = statistics.legalization.flips_performed,
        recovery_flips = statistics.recovery_flips,
        removed = statistics.removed_triangles,
        "triangulation complete"
    );
    Ok(triangulation)
}

// =============================================================================
// INPUT VALIDATION
// =============================================================================

fn validate_points<T: CoordinateScalar>(points: &[Point<T>]) -> Result<(), TriangulationError> {
    if points.len() < 3 {
        return Err(TriangulationError::InsufficientVertices { found: points.len() });
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(TriangulationError::NonFiniteCoordinate { index });
    }
    if let Some((first, second)) = find_exact_duplicate(points) {
        return Err(TriangulationError::DuplicateVertex { first, second });
    }
    let (a, b) = (&points[0], &points[1]);
    if points[2..]
        .iter()
        .all(|p| orientation(a, b, p) == Orientation::DEGENERATE)
    {
        return Err(TriangulationError::CollinearVertices);
    }
    Ok(())
}

/// Checks index ranges, self loops and pairwise crossings. Returns the distinct edges in
/// first-seen order.
fn validate_constraints<T: CoordinateScalar>(
    points: &[Point<T>],
    edges: &[(usize, usize)],
) -> Result<Vec<(usize, usize)>, TriangulationError> {
    let mut seen: FastHashSet<(usize, usize)> = FastHashSet::default();
    let mut distinct: Vec<(usize, usize)> = Vec::with_capacity(edges.len());
    for &(a, b) in edges {
        if a >= points.len() || b >= points.len() {
            return Err(TriangulationError::InvalidConstraint {
                edge: (a, b),
                message: format!("index out of range for {} points", points.len()),
            });
        }
        if a == b {
            return Err(TriangulationError::InvalidConstraint {
                edge: (a, b),
                message: "edge joins a point to itself".to_string(),
            });
        }
        if seen.insert((a.min(b), a.max(b))) {
            distinct.push((a, b));
        }
    }

    let mut grid = SegmentHashGrid::new(cell_size_for_segments(
        distinct.iter().map(|&(a, b)| (points[a], points[b])),
    ));
    for (index, &(a, b)) in distinct.iter().enumerate() {
        let (p, q) = (&points[a], &points[b]);
        let mut crossing = None;
        grid.for_each_candidate(p, q, |other| {
            let (c, d) = distinct[other];
            if segments_intersect(p, q, &points[c], &points[d]) {
                crossing = Some(other);
            }
            crossing.is_none()
        });
        if let Some(other) = crossing {
            return Err(TriangulationError::IntersectingConstraints {
                first: distinct[other],
                second: (a, b),
            });
        }
        grid.insert_segment(index, p, q);
    }
    Ok(distinct)
}

fn cast_option<T: CoordinateScalar>(value: f64, name: &str) -> Result<T, TriangulationError> {
    num_traits::cast(value).ok_or_else(|| TriangulationError::InvalidOptions {
        message: format!("{name} = {value} is not representable in the coordinate type"),
    })
}

fn extract_triangles<T: CoordinateScalar>(tds: &Tds<T>) -> Result<Vec<IndexedTriangle>, TriangulationError> {
    tds.triangles()
        .map(|(key, triangle)| {
            let corners = triangle.corners().map(|vertex| {
                tds.vertices()
                    .get(vertex)
                    .and_then(|tracked| tracked.input_index())
                    .unwrap_or_else(|| {
                        invariant_violation(format_args!(
                            "triangle {key:?} kept synthetic corner {vertex:?}"
                        ))
                    })
            });
            let [a, b, c] = tds.triangle_points(key);
            if signed_double_area(&a, &b, &c).is_zero() {
                return Err(TriangulationError::DegenerateTriangle { triangle: corners });
            }
            Ok(IndexedTriangle::new(corners))
        })
        .collect()
}
