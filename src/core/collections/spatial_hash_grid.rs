//! Spatial hash grid over line segments.
//!
//! The legalizer asks, for every candidate edge, whether it crosses any constrained
//! edge. With many constraints a linear scan dominates, so constrained segments are
//! bucketed into a uniform grid keyed by `floor(coord / cell_size)`; a query visits the
//! buckets overlapped by the query segment's bounding box.
//!
//! Segments whose bounding box covers too many cells live in a separate overflow list
//! that every query visits. Queries covering too many cells, and grids that cannot key
//! coordinates robustly, fall back to a linear scan over all segments. Candidates may
//! be reported more than once; callers must use idempotent tests.

use super::{FastHashMap, SmallBuffer};
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;
use std::hash::{Hash, Hasher};

const BUCKET_INLINE_CAPACITY: usize = 4;

/// Segments spanning more cells than this go to the overflow list.
const MAX_CELLS_PER_SEGMENT: u32 = 64;

/// Queries spanning more cells than this scan every segment instead.
const MAX_CELLS_PER_QUERY: u32 = 256;

/// Hashable 2D grid-cell key holding integer-valued cell coordinates in `T`.
#[derive(Clone, Copy, Debug)]
struct GridKey<T>([T; 2])
where
    T: CoordinateScalar;

impl<T> PartialEq for GridKey<T>
where
    T: CoordinateScalar,
{
    fn eq(&self, other: &Self) -> bool {
        self.0[0].ordered_eq(&other.0[0]) && self.0[1].ordered_eq(&other.0[1])
    }
}

impl<T> Eq for GridKey<T> where T: CoordinateScalar {}

impl<T> Hash for GridKey<T>
where
    T: CoordinateScalar,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0[0].hash_scalar(state);
        self.0[1].hash_scalar(state);
    }
}

/// Inclusive range of grid cells covered by a bounding box.
#[derive(Clone, Copy, Debug)]
struct CellRange<T>
where
    T: CoordinateScalar,
{
    min: [T; 2],
    max: [T; 2],
}

impl<T> CellRange<T>
where
    T: CoordinateScalar,
{
    fn exceeds(&self, limit: u32) -> bool {
        let one = T::one();
        let count = (self.max[0] - self.min[0] + one) * (self.max[1] - self.min[1] + one);
        num_traits::cast::<u32, T>(limit).is_none_or(|limit| count > limit)
    }

    fn for_each_key<F>(&self, mut f: F) -> bool
    where
        F: FnMut(GridKey<T>) -> bool,
    {
        let one = T::one();
        let mut x = self.min[0];
        while x <= self.max[0] {
            let mut y = self.min[1];
            while y <= self.max[1] {
                if !f(GridKey([x, y])) {
                    return false;
                }
                y = y + one;
            }
            x = x + one;
        }
        true
    }
}

/// Cell size giving roughly one segment per cell along each axis of the segments'
/// bounding box. Returns zero (a linear-scan grid) when there are no segments.
pub(crate) fn cell_size_for_segments<T, I>(segments: I) -> T
where
    T: CoordinateScalar,
    I: IntoIterator<Item = (Point<T>, Point<T>)>,
{
    let mut count = 0_usize;
    let mut bounds: Option<(Point<T>, Point<T>)> = None;
    for (a, b) in segments {
        count += 1;
        for p in [a, b] {
            bounds = Some(bounds.map_or((p, p), |(min, max)| {
                (
                    Point::new(min.x().min(p.x()), min.y().min(p.y())),
                    Point::new(max.x().max(p.x()), max.y().max(p.y())),
                )
            }));
        }
    }
    let Some((min, max)) = bounds else {
        return T::zero();
    };
    let extent = (max.x() - min.x()).max(max.y() - min.y());
    num_traits::cast::<usize, T>(count).map_or_else(T::zero, |n| extent / n.sqrt().ceil())
}

/// A uniform grid mapping cells to the segments whose bounding boxes overlap them.
#[derive(Clone, Debug)]
pub(crate) struct SegmentHashGrid<T, K>
where
    T: CoordinateScalar,
{
    cell_size: T,
    usable: bool,
    cells: FastHashMap<GridKey<T>, SmallBuffer<K, BUCKET_INLINE_CAPACITY>>,
    overflow: Vec<K>,
    segments: Vec<K>,
}

impl<T, K> SegmentHashGrid<T, K>
where
    T: CoordinateScalar,
    K: Copy,
{
    /// Create an empty grid with the given cell size.
    ///
    /// A non-finite or non-positive cell size yields a grid that always scans linearly.
    pub(crate) fn new(cell_size: T) -> Self {
        let usable = cell_size.is_finite() && cell_size > T::zero();
        Self {
            cell_size,
            usable,
            cells: FastHashMap::default(),
            overflow: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub(crate) const fn is_usable(&self) -> bool {
        self.usable
    }

    pub(crate) const fn len(&self) -> usize {
        self.segments.len()
    }

    /// Index the segment `a`-`b` under `key`.
    pub(crate) fn insert_segment(&mut self, key: K, a: &Point<T>, b: &Point<T>) {
        self.segments.push(key);
        if !self.usable {
            return;
        }
        let Some(range) = self.range_for(a, b) else {
            self.usable = false;
            return;
        };
        if range.exceeds(MAX_CELLS_PER_SEGMENT) {
            self.overflow.push(key);
            return;
        }
        range.for_each_key(|cell| {
            self.cells.entry(cell).or_default().push(key);
            true
        });
    }

    /// Visit every segment that may intersect the segment `a`-`b`.
    ///
    /// Stops early once `f` returns `false`.
    pub(crate) fn for_each_candidate<F>(&self, a: &Point<T>, b: &Point<T>, mut f: F)
    where
        F: FnMut(K) -> bool,
    {
        let range = self
            .range_for(a, b)
            .filter(|range| self.usable && !range.exceeds(MAX_CELLS_PER_QUERY));
        let Some(range) = range else {
            for &key in &self.segments {
                if !f(key) {
                    return;
                }
            }
            return;
        };

        for &key in &self.overflow {
            if !f(key) {
                return;
            }
        }
        range.for_each_key(|cell| {
            self.cells
                .get(&cell)
                .is_none_or(|bucket| bucket.iter().all(|&key| f(key)))
        });
    }

    fn cell_coord(&self, coord: T) -> Option<T> {
        let cell = (coord / self.cell_size).floor();
        // Cells beyond unit resolution cannot be enumerated.
        (cell.is_finite() && !(cell + T::one()).ordered_eq(&cell)).then_some(cell)
    }

    fn range_for(&self, a: &Point<T>, b: &Point<T>) -> Option<CellRange<T>> {
        if !self.usable {
            return None;
        }
        Some(CellRange {
            min: [
                self.cell_coord(a.x().min(b.x()))?,
                self.cell_coord(a.y().min(b.y()))?,
            ],
            max: [
                self.cell_coord(a.x().max(b.x()))?,
                self.cell_coord(a.y().max(b.y()))?,
            ],
        })
    }
}
