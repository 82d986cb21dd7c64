//! End-to-end triangulation benchmarks.
//!
//! Measures the three entry points on seeded random input:
//!
//! 1. **`triangulate`**: unconstrained Delaunay triangulation of the convex hull
//! 2. **`triangulate_constrained`**: the same points with a set of long, non-crossing
//!    constrained edges that force many recovery flips
//! 3. **`triangulate_polygon`**: a star-shaped polygon with the given vertex count
//!
//! Set `CDT_BENCH_SEED` (decimal or 0x-hex) to change the point sets.

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use constrained_delaunay::geometry::util::generate_random_points_seeded;
use constrained_delaunay::prelude::*;
use std::hint::black_box;
use std::sync::OnceLock;

const POINT_COUNTS: [usize; 4] = [100, 1_000, 5_000, 20_000];

/// Reads `CDT_BENCH_SEED` (decimal or 0x-hex). Defaults to 0xCD7.
fn get_benchmark_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(|| {
        std::env::var("CDT_BENCH_SEED")
            .ok()
            .and_then(|s| {
                let s = s.trim();
                s.strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .map_or_else(|| s.parse().ok(), |hex| u64::from_str_radix(hex, 16).ok())
            })
            .unwrap_or(0xCD7)
    })
}

fn random_points(n_points: usize) -> Vec<Point<f64>> {
    generate_random_points_seeded(n_points, (-100.0, 100.0), get_benchmark_seed())
        .expect("valid range")
}

/// Horizontal chords at fixed heights, each joining the leftmost and rightmost points
/// of a thin band. Chords through another point are skipped.
fn band_constraints(points: &[Point<f64>]) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    for band in -4..=4 {
        let center = f64::from(band) * 20.0;
        let in_band: Vec<usize> = (0..points.len())
            .filter(|&i| (points[i].y() - center).abs() < 2.0)
            .collect();
        let by_x = |a: &&usize, b: &&usize| points[**a].x().total_cmp(&points[**b].x());
        if let (Some(&left), Some(&right)) = (in_band.iter().min_by(by_x), in_band.iter().max_by(by_x))
            && left != right
            && !points
                .iter()
                .any(|q| point_on_open_segment(q, &points[left], &points[right]))
        {
            edges.push((left, right));
        }
    }
    edges
}

fn star_polygon(n_points: usize) -> Vec<Point<f64>> {
    let radii = random_points(n_points);
    (0..n_points)
        .map(|i| {
            #[expect(clippy::cast_precision_loss, reason = "benchmark sizes fit in f64")]
            let angle = i as f64 * std::f64::consts::TAU / n_points as f64;
            let radius = 50.0 + radii[i].x().abs() / 4.0;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn benchmark_triangulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangulate");
    for &n_points in &POINT_COUNTS {
        group.throughput(Throughput::Elements(n_points as u64));
        group.bench_with_input(BenchmarkId::new("unconstrained", n_points), &n_points, |b, &n_points| {
            b.iter_batched(
                || random_points(n_points),
                |points| black_box(triangulate(&points).expect("triangulation")),
                BatchSize::LargeInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("input_order", n_points), &n_points, |b, &n_points| {
            b.iter_batched(
                || random_points(n_points),
                |points| {
                    black_box(
                        ConstrainedDelaunayBuilder::new(&points)
                            .insertion_order(InsertionOrder::Input)
                            .build()
                            .expect("triangulation"),
                    )
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn benchmark_triangulate_constrained(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangulate_constrained");
    for &n_points in &POINT_COUNTS {
        group.throughput(Throughput::Elements(n_points as u64));
        group.bench_with_input(BenchmarkId::new("bands", n_points), &n_points, |b, &n_points| {
            b.iter_batched(
                || {
                    let points = random_points(n_points);
                    let edges = band_constraints(&points);
                    (points, edges)
                },
                |(points, edges)| {
                    black_box(triangulate_constrained(&points, &edges).expect("triangulation"))
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn benchmark_triangulate_polygon(c: &mut Criterion) {
    let mut group = c.benchmark_group("triangulate_polygon");
    for &n_points in &POINT_COUNTS {
        group.throughput(Throughput::Elements(n_points as u64));
        group.bench_with_input(BenchmarkId::new("star", n_points), &n_points, |b, &n_points| {
            b.iter_batched(
                || star_polygon(n_points),
                |points| black_box(triangulate_polygon(&points).expect("triangulation")),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_triangulate, benchmark_triangulate_constrained, benchmark_triangulate_polygon
);
criterion_main!(benches);
