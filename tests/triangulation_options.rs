//! Configuration surface tests: `TriangulationOptions` serde, builder validation and
//! propagation through `ConstrainedDelaunayBuilder`.

use constrained_delaunay::core::boundary::{DEFAULT_SUPER_TRIANGLE_JITTER, DEFAULT_SUPER_TRIANGLE_MARGIN};
use constrained_delaunay::core::delaunay_triangulation::{
    DEFAULT_INSERTION_SEED, TriangulationOptionsBuilder, TriangulationOptionsBuilderError,
};
use constrained_delaunay::prelude::*;

fn p(x: f64, y: f64) -> Point<f64> {
    Point::new(x, y)
}

#[test]
fn test_default_options_serialize_with_snake_case_names() {
    let json = serde_json::to_value(TriangulationOptions::default()).unwrap();
    assert_eq!(json["domain"], "convex_hull");
    assert_eq!(json["insertion_order"]["randomized"]["seed"], DEFAULT_INSERTION_SEED);
    assert_eq!(json["super_triangle_margin"], DEFAULT_SUPER_TRIANGLE_MARGIN);
    assert_eq!(json["super_triangle_jitter"], DEFAULT_SUPER_TRIANGLE_JITTER);
    assert_eq!(json["validate_output"], true);
}

#[test]
fn test_options_round_trip_through_json() {
    let options = TriangulationOptionsBuilder::default()
        .domain(Domain::ConstrainedPolygon)
        .insertion_order(InsertionOrder::Input)
        .super_triangle_margin(8.0)
        .flip_budget_factor(3)
        .validate_output(false)
        .build()
        .unwrap();

    let json = serde_json::to_string(&options).unwrap();
    let back: TriangulationOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(back, options);
}

#[test]
fn test_partial_config_falls_back_to_defaults() {
    let options: TriangulationOptions =
        serde_json::from_str(r#"{ "insertion_order": { "randomized": { "seed": 42 } } }"#).unwrap();
    assert_eq!(options.insertion_order, InsertionOrder::Randomized { seed: 42 });
    assert_eq!(options.domain, Domain::ConvexHull);
    assert_eq!(options.flip_budget_factor, TriangulationOptions::default().flip_budget_factor);

    let options: TriangulationOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, TriangulationOptions::default());
}

#[test]
fn test_unknown_domain_is_a_parse_error() {
    let result: Result<TriangulationOptions, _> = serde_json::from_str(r#"{ "domain": "annulus" }"#);
    assert!(result.is_err());
}

#[test]
fn test_deserialized_options_are_checked_before_running() {
    let options: TriangulationOptions =
        serde_json::from_str(r#"{ "super_triangle_margin": 1.5 }"#).unwrap();
    let err = options.validate().unwrap_err();
    assert!(matches!(err, TriangulationError::InvalidOptions { .. }));
    assert!(err.to_string().contains("super_triangle_margin"));

    let points = [p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0)];
    let result = ConstrainedDelaunayBuilder::new(&points).options(options).build();
    assert!(matches!(result, Err(TriangulationError::InvalidOptions { .. })));
}

#[test]
fn test_builder_validation_error_names_the_field() {
    let err = TriangulationOptionsBuilder::default()
        .super_triangle_jitter(0.5)
        .build()
        .unwrap_err();
    assert!(matches!(err, TriangulationOptionsBuilderError::ValidationError(_)));
    assert!(err.to_string().contains("super_triangle_jitter"));
}

#[test]
fn test_validate_output_can_be_disabled() {
    let points = [p(0.0, 0.0), p(3.0, 0.0), p(3.0, 3.0), p(0.0, 3.0), p(1.0, 2.0)];
    let triangulation = ConstrainedDelaunayBuilder::new(&points)
        .validate_output(false)
        .build()
        .unwrap();
    assert_eq!(triangulation.number_of_triangles(), 4);
    assert!(triangulation.validate().is_ok());
}

#[test]
fn test_statistics_describe_the_run() {
    let points = [p(0.0, 0.0), p(3.0, 0.0), p(3.0, 3.0), p(0.0, 3.0), p(1.0, 2.0)];
    let triangulation = triangulate_constrained(&points, &[(0, 2)]).unwrap();
    let stats = triangulation.statistics();

    assert_eq!(stats.input_points, 5);
    assert_eq!(stats.insertions, 5);
    assert!(stats.removed_triangles > 0);
    assert!(stats.legalization.edges_checked > 0);
    assert!(stats.to_string().starts_with("points=5 insertions=5"));
}
