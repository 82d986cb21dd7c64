//! Tracked vertices and their registry.
//!
//! Every input point and each of the three super-triangle corners is registered once
//! as a [`TrackedVertex`]. Before a vertex is inserted it waits in the *remaining* set
//! of the triangle that contains it, and its back-reference names that triangle. After
//! insertion the vertex is a corner and its back-reference names some live triangle
//! incident to it, which is where walks around the vertex start.

use crate::core::collections::StorageMap;
use crate::core::triangulation_data_structure::{TriangleKey, VertexKey};
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Origin of a tracked vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// A caller-supplied point, by index into the input slice.
    Input {
        /// Position in the caller's point slice.
        index: usize,
    },
    /// One of the three synthetic super-triangle corners.
    SuperTriangle {
        /// Corner slot (0, 1 or 2).
        slot: u8,
    },
}

/// A vertex plus the triangle it currently belongs to.
#[derive(Clone, Debug)]
pub struct TrackedVertex<T> {
    point: Point<T>,
    kind: VertexKind,
    triangle: Option<TriangleKey>,
    inserted: bool,
}

impl<T: CoordinateScalar> TrackedVertex<T> {
    /// Location of the vertex.
    #[inline]
    #[must_use]
    pub const fn point(&self) -> &Point<T> {
        &self.point
    }

    /// Whether this is an input point or a super-triangle corner.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> VertexKind {
        self.kind
    }

    /// Index into the caller's slice, for input points.
    #[inline]
    #[must_use]
    pub const fn input_index(&self) -> Option<usize> {
        match self.kind {
            VertexKind::Input { index } => Some(index),
            VertexKind::SuperTriangle { .. } => None,
        }
    }

    /// Returns `true` for super-triangle corners.
    #[inline]
    #[must_use]
    pub const fn is_super(&self) -> bool {
        matches!(self.kind, VertexKind::SuperTriangle { .. })
    }

    /// The containing triangle (before insertion) or an incident triangle (after).
    #[inline]
    #[must_use]
    pub const fn triangle(&self) -> Option<TriangleKey> {
        self.triangle
    }

    /// Returns `true` once the vertex has become a triangle corner.
    #[inline]
    #[must_use]
    pub const fn is_inserted(&self) -> bool {
        self.inserted
    }
}

/// Arena of tracked vertices with a lookup from input index to key.
#[derive(Clone, Debug, Default)]
pub struct VertexRegistry<T> {
    vertices: StorageMap<VertexKey, TrackedVertex<T>>,
    by_input_index: Vec<VertexKey>,
    super_vertices: Vec<VertexKey>,
}

impl<T: CoordinateScalar> VertexRegistry<T> {
    /// Creates an empty registry sized for `input_len` points.
    #[must_use]
    pub fn with_capacity(input_len: usize) -> Self {
        Self {
            vertices: StorageMap::with_capacity_and_key(input_len + 3),
            by_input_index: Vec::with_capacity(input_len),
            super_vertices: Vec::with_capacity(3),
        }
    }

    /// Registers the next input point; input indices are assigned in call order.
    pub fn register_input(&mut self, point: Point<T>) -> VertexKey {
        let index = self.by_input_index.len();
        let key = self.vertices.insert(TrackedVertex {
            point,
            kind: VertexKind::Input { index },
            triangle: None,
            inserted: false,
        });
        self.by_input_index.push(key);
        key
    }

    /// Registers a super-triangle corner. Super corners count as inserted.
    pub fn register_super(&mut self, point: Point<T>) -> VertexKey {
        let slot = u8::try_from(self.super_vertices.len()).unwrap_or(u8::MAX);
        let key = self.vertices.insert(TrackedVertex {
            point,
            kind: VertexKind::SuperTriangle { slot },
            triangle: None,
            inserted: true,
        });
        self.super_vertices.push(key);
        key
    }

    /// Looks up a tracked vertex.
    #[inline]
    #[must_use]
    pub fn get(&self, key: VertexKey) -> Option<&TrackedVertex<T>> {
        self.vertices.get(key)
    }

    /// Key of the input point at `index`.
    #[inline]
    #[must_use]
    pub fn input_key(&self, index: usize) -> Option<VertexKey> {
        self.by_input_index.get(index).copied()
    }

    /// Keys of all input points in input order.
    #[inline]
    #[must_use]
    pub fn input_keys(&self) -> &[VertexKey] {
        &self.by_input_index
    }

    /// Keys of the super-triangle corners.
    #[inline]
    #[must_use]
    pub fn super_keys(&self) -> &[VertexKey] {
        &self.super_vertices
    }

    /// Number of registered vertices, super corners included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if nothing has been registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates over all tracked vertices.
    pub fn iter(&self) -> impl Iterator<Item = (VertexKey, &TrackedVertex<T>)> {
        self.vertices.iter()
    }

    pub(crate) fn set_triangle(&mut self, key: VertexKey, triangle: TriangleKey) {
        if let Some(vertex) = self.vertices.get_mut(key) {
            vertex.triangle = Some(triangle);
        }
    }

    pub(crate) fn mark_inserted(&mut self, key: VertexKey) {
        if let Some(vertex) = self.vertices.get_mut(key) {
            vertex.inserted = true;
        }
    }
}
