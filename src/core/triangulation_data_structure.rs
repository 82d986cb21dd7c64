//! The mutable triangle mesh used while a triangulation is being built.
//!
//! [`Tds`] (triangulation data structure) owns every live [`Triangle`] in a slotmap
//! arena together with the [`VertexRegistry`]. Triangles are identified by stable
//! [`TriangleKey`]s; adjacency is stored as `Option<TriangleKey>` per side.
//!
//! # Invariants
//!
//! - Every stored triangle is clockwise (degenerate triangles are tolerated while
//!   building and rejected in the final output).
//! - Adjacency is symmetric: if `t.neighbor(i) == Some(n)` then `n` points back at `t`
//!   across the same edge. Sides on the outer boundary have no neighbor.
//! - Every tracked vertex that is not yet a corner sits in exactly one triangle's
//!   remaining set, and its back-reference names that triangle.
//! - A flagged triangle is dead: its adjacency is never read or written again, and it
//!   is erased by the next [`Tds::sweep`].
//!
//! Triangles are never edited in place once wired into the mesh; splits and flips
//! create fresh triangles and retire the old ones. Operations that find one of the
//! invariants above broken panic, since that can only result from an engine bug.

use slotmap::new_key_type;
use thiserror::Error;

use crate::core::collections::{FastHashMap, StorageMap, VertexKeySet, fast_hash_map_with_capacity};
use crate::core::triangle::{Triangle, next_index, prev_index};
use crate::core::util::invariant_violation;
use crate::core::vertex::VertexRegistry;
use crate::geometry::point::Point;
use crate::geometry::predicates::is_clockwise;
use crate::geometry::traits::coordinate::CoordinateScalar;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Structural defects reported by [`Tds::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TdsValidationError {
    /// A neighbor slot names a triangle that is not in the arena.
    #[error("Triangle {triangle:?} references missing neighbor {neighbor:?}")]
    MissingNeighbor {
        /// The referencing triangle.
        triangle: TriangleKey,
        /// The missing neighbor.
        neighbor: TriangleKey,
    },
    /// A live triangle is still linked to a flagged one.
    #[error("Triangle {triangle:?} is linked to flagged triangle {neighbor:?}")]
    FlaggedNeighbor {
        /// The referencing triangle.
        triangle: TriangleKey,
        /// The flagged neighbor.
        neighbor: TriangleKey,
    },
    /// A triangle uses the same vertex for two corners.
    #[error("Triangle {triangle:?} has repeated corners")]
    RepeatedCorner {
        /// The offending triangle.
        triangle: TriangleKey,
    },
    /// A triangle is wound counter-clockwise.
    #[error("Triangle {triangle:?} is not clockwise")]
    NotClockwise {
        /// The offending triangle.
        triangle: TriangleKey,
    },
    /// A neighbor does not point back.
    #[error("Adjacency between {triangle:?} and {neighbor:?} is not symmetric")]
    AsymmetricAdjacency {
        /// The referencing triangle.
        triangle: TriangleKey,
        /// The neighbor lacking the back-reference.
        neighbor: TriangleKey,
    },
    /// Two linked triangles do not share the edge of the linking side.
    #[error("Triangles {triangle:?} and {neighbor:?} are linked across side {side} but do not share its edge")]
    SharedEdgeMismatch {
        /// The referencing triangle.
        triangle: TriangleKey,
        /// The neighbor.
        neighbor: TriangleKey,
        /// Side of `triangle` holding the link.
        side: usize,
    },
    /// Remaining-set bookkeeping is inconsistent.
    #[error("Remaining vertex {vertex:?} is inconsistent: {message}")]
    RemainingVertexMismatch {
        /// The tracked vertex.
        vertex: VertexKey,
        /// What is wrong with it.
        message: String,
    },
}

// =============================================================================
// KEY TYPES
// =============================================================================

new_key_type! {
    /// Key type for tracked vertices in the vertex registry.
    pub struct VertexKey;
}

new_key_type! {
    /// Key type for triangles in the triangle arena.
    ///
    /// Keys stay valid until the triangle is erased or swept, and are never reused
    /// for a different live triangle while a stale copy could still be queued.
    pub struct TriangleKey;
}

// =============================================================================
// TRIANGULATION DATA STRUCTURE
// =============================================================================

/// Triangle arena plus vertex registry.
#[derive(Clone, Debug)]
pub struct Tds<T> {
    vertices: VertexRegistry<T>,
    triangles: StorageMap<TriangleKey, Triangle>,
    flagged: Vec<TriangleKey>,
}

impl<T: CoordinateScalar> Default for Tds<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: CoordinateScalar> Tds<T> {
    /// Creates an empty structure sized for `input_len` points.
    #[must_use]
    pub fn with_capacity(input_len: usize) -> Self {
        Self {
            vertices: VertexRegistry::with_capacity(input_len),
            // 2n + 1 triangles after n insertions into one super triangle.
            triangles: StorageMap::with_capacity_and_key(2 * input_len + 1),
            flagged: Vec::new(),
        }
    }

    // =========================================================================
    // VERTICES
    // =========================================================================

    /// The vertex registry.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> &VertexRegistry<T> {
        &self.vertices
    }

    /// Mutable access to the vertex registry, used to register points before insertion.
    pub const fn vertices_mut(&mut self) -> &mut VertexRegistry<T> {
        &mut self.vertices
    }

    /// Location of `vertex`.
    ///
    /// # Panics
    ///
    /// Panics if `vertex` is not registered.
    #[must_use]
    pub fn point(&self, vertex: VertexKey) -> &Point<T> {
        match self.vertices.get(vertex) {
            Some(tracked) => tracked.point(),
            None => invariant_violation(format_args!("unknown vertex {vertex:?}")),
        }
    }

    /// Returns `true` if `vertex` is a super-triangle corner.
    #[must_use]
    pub fn is_super(&self, vertex: VertexKey) -> bool {
        self.vertices.get(vertex).is_some_and(|v| v.is_super())
    }

    /// Corner locations of `triangle` in clockwise order.
    ///
    /// # Panics
    ///
    /// Panics if `triangle` is not live.
    #[must_use]
    pub fn triangle_points(&self, triangle: TriangleKey) -> [Point<T>; 3] {
        let corners = *self.live(triangle).corners();
        corners.map(|c| *self.point(c))
    }

    // =========================================================================
    // TRIANGLES
    // =========================================================================

    /// Looks up a triangle, flagged or not.
    #[inline]
    #[must_use]
    pub fn triangle(&self, key: TriangleKey) -> Option<&Triangle> {
        self.triangles.get(key)
    }

    /// Returns `true` if `key` names a stored, unflagged triangle.
    #[inline]
    #[must_use]
    pub fn is_live(&self, key: TriangleKey) -> bool {
        self.triangles.get(key).is_some_and(|t| !t.is_flagged())
    }

    /// Number of live (unflagged) triangles.
    #[must_use]
    pub fn number_of_triangles(&self) -> usize {
        self.triangles.len() - self.flagged.len()
    }

    /// Iterates over live triangles.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleKey, &Triangle)> {
        self.triangles.iter().filter(|(_, t)| !t.is_flagged())
    }

    /// Borrow a live triangle.
    ///
    /// # Panics
    ///
    /// Panics if `key` is missing or flagged.
    #[track_caller]
    pub(crate) fn live(&self, key: TriangleKey) -> &Triangle {
        match self.triangles.get(key) {
            Some(t) if !t.is_flagged() => t,
            Some(_) => invariant_violation(format_args!("read of flagged triangle {key:?}")),
            None => invariant_violation(format_args!("read of missing triangle {key:?}")),
        }
    }

    #[track_caller]
    fn live_mut(&mut self, key: TriangleKey) -> &mut Triangle {
        match self.triangles.get_mut(key) {
            Some(t) if !t.is_flagged() => t,
            Some(_) => invariant_violation(format_args!("write to flagged triangle {key:?}")),
            None => invariant_violation(format_args!("write to missing triangle {key:?}")),
        }
    }

    /// Creates a triangle from three clockwise corners and returns its key.
    ///
    /// The corners' back-references are pointed at the new triangle.
    ///
    /// # Panics
    ///
    /// Panics if the corners are wound counter-clockwise.
    #[track_caller]
    pub fn insert_triangle(&mut self, corners: [VertexKey; 3]) -> TriangleKey {
        let [a, b, c] = corners.map(|v| *self.point(v));
        if !is_clockwise(&a, &b, &c) {
            invariant_violation(format_args!(
                "counter-clockwise triangle {a:?} {b:?} {c:?}"
            ));
        }
        let key = self.triangles.insert(Triangle::new(corners));
        for corner in corners {
            self.vertices.set_triangle(corner, key);
        }
        key
    }

    /// Neighbor of `triangle` across `side`.
    ///
    /// # Panics
    ///
    /// Panics if `triangle` is not live.
    #[track_caller]
    #[must_use]
    pub fn neighbor(&self, triangle: TriangleKey, side: usize) -> Option<TriangleKey> {
        self.live(triangle).neighbor(side)
    }

    /// Sets the neighbor of `triangle` across `side` (one direction only).
    ///
    /// # Panics
    ///
    /// Panics if `triangle` is not live.
    #[track_caller]
    pub fn set_neighbor(&mut self, triangle: TriangleKey, side: usize, neighbor: Option<TriangleKey>) {
        self.live_mut(triangle).set_neighbor(side, neighbor);
    }

    /// Links two triangles to each other across the given sides.
    #[track_caller]
    pub fn link(&mut self, a: TriangleKey, side_a: usize, b: TriangleKey, side_b: usize) {
        self.set_neighbor(a, side_a, Some(b));
        self.set_neighbor(b, side_b, Some(a));
    }

    /// Rewrites `neighbor`'s link to `old` so it points at `new` instead.
    ///
    /// Does nothing when `neighbor` is `None` (a boundary side).
    ///
    /// # Panics
    ///
    /// Panics if `neighbor` is live but holds no link to `old`.
    #[track_caller]
    pub fn replace_back_reference(
        &mut self,
        neighbor: Option<TriangleKey>,
        old: TriangleKey,
        new: Option<TriangleKey>,
    ) {
        let Some(neighbor) = neighbor else {
            return;
        };
        let Some(side) = self.live(neighbor).side_of_neighbor(old) else {
            invariant_violation(format_args!(
                "neighbor {neighbor:?} has no back-reference to {old:?}"
            ));
        };
        self.set_neighbor(neighbor, side, new);
    }

    /// Places tracked vertex `vertex` into `triangle`'s remaining set.
    #[track_caller]
    pub fn add_remaining(&mut self, triangle: TriangleKey, vertex: VertexKey) {
        self.live_mut(triangle).remaining_mut().insert(vertex);
        self.vertices.set_triangle(vertex, triangle);
    }

    /// Removes tracked vertex `vertex` from `triangle`'s remaining set.
    ///
    /// # Panics
    ///
    /// Panics if the vertex was not in that set.
    #[track_caller]
    pub fn remove_remaining(&mut self, triangle: TriangleKey, vertex: VertexKey) {
        if !self.live_mut(triangle).remaining_mut().remove(&vertex) {
            invariant_violation(format_args!(
                "vertex {vertex:?} missing from remaining set of {triangle:?}"
            ));
        }
    }

    /// Empties `triangle`'s remaining set and returns its former contents.
    #[track_caller]
    pub fn take_remaining(&mut self, triangle: TriangleKey) -> VertexKeySet {
        std::mem::take(self.live_mut(triangle).remaining_mut())
    }

    /// Schedules `triangle` for removal by the next [`Tds::sweep`].
    ///
    /// Flagging an already flagged triangle has no effect.
    pub fn flag(&mut self, triangle: TriangleKey) {
        if let Some(t) = self.triangles.get_mut(triangle)
            && !t.is_flagged()
        {
            t.flag();
            self.flagged.push(triangle);
        }
    }

    /// Erases all flagged triangles and returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let count = self.flagged.len();
        for key in self.flagged.drain(..) {
            self.triangles.remove(key);
        }
        count
    }

    /// Erases `triangle` immediately.
    ///
    /// The caller must already have redirected every link to it.
    pub fn erase(&mut self, triangle: TriangleKey) {
        if let Some(t) = self.triangles.remove(triangle)
            && t.is_flagged()
        {
            self.flagged.retain(|&k| k != triangle);
        }
    }

    // =========================================================================
    // TOPOLOGY QUERIES
    // =========================================================================

    /// Live triangles incident to an inserted vertex, in rotational order.
    ///
    /// The walk starts from the vertex's back-reference and rotates until it closes
    /// or hits the boundary, in which case it also rotates the other way.
    ///
    /// # Panics
    ///
    /// Panics if the walk reaches a triangle that does not contain `vertex`.
    #[must_use]
    pub fn vertex_star(&self, vertex: VertexKey) -> Vec<TriangleKey> {
        let Some(start) = self
            .vertices
            .get(vertex)
            .and_then(|v| v.triangle())
            .filter(|&t| self.is_live(t) && self.live(t).has_corner(vertex))
        else {
            return Vec::new();
        };

        let mut star = vec![start];
        if !self.rotate_around(vertex, start, next_index, &mut star) {
            let mut other_way = Vec::new();
            self.rotate_around(vertex, start, prev_index, &mut other_way);
            other_way.reverse();
            other_way.extend(star);
            star = other_way;
        }
        star
    }

    /// Pushes triangles met while rotating about `vertex`; returns `true` if the
    /// rotation closed back at `start`.
    fn rotate_around(
        &self,
        vertex: VertexKey,
        start: TriangleKey,
        step: fn(usize) -> usize,
        out: &mut Vec<TriangleKey>,
    ) -> bool {
        let mut current = start;
        loop {
            let triangle = self.live(current);
            let Some(i) = triangle.corner_index(vertex) else {
                invariant_violation(format_args!(
                    "star walk left vertex {vertex:?} at {current:?}"
                ));
            };
            match triangle.neighbor(step(i)) {
                None => return false,
                Some(next) if next == start => return true,
                Some(next) => {
                    out.push(next);
                    current = next;
                }
            }
        }
    }

    /// Finds a live triangle having `a`-`b` as a side, and that side's index.
    #[must_use]
    pub fn find_edge(&self, a: VertexKey, b: VertexKey) -> Option<(TriangleKey, usize)> {
        self.vertex_star(a).into_iter().find_map(|t| {
            self.live(t)
                .side_of_edge(a, b)
                .map(|side| (t, side))
        })
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Checks the structural invariants of every live triangle.
    ///
    /// Geometry is only checked for orientation; Delaunay legality is validated on
    /// the finished triangulation.
    ///
    /// # Errors
    ///
    /// Returns the first [`TdsValidationError`] found.
    pub fn validate(&self) -> Result<(), TdsValidationError> {
        let mut owner: FastHashMap<VertexKey, TriangleKey> =
            fast_hash_map_with_capacity(self.vertices.len());

        for (key, triangle) in self.triangles() {
            let [c0, c1, c2] = *triangle.corners();
            if c0 == c1 || c1 == c2 || c0 == c2 {
                return Err(TdsValidationError::RepeatedCorner { triangle: key });
            }
            let [a, b, c] = self.triangle_points(key);
            if !is_clockwise(&a, &b, &c) {
                return Err(TdsValidationError::NotClockwise { triangle: key });
            }

            for side in 0..3 {
                let Some(n) = triangle.neighbor(side) else {
                    continue;
                };
                let neighbor = self.triangles.get(n).ok_or(TdsValidationError::MissingNeighbor {
                    triangle: key,
                    neighbor: n,
                })?;
                if neighbor.is_flagged() {
                    return Err(TdsValidationError::FlaggedNeighbor {
                        triangle: key,
                        neighbor: n,
                    });
                }
                let Some(back) = neighbor.side_of_neighbor(key) else {
                    return Err(TdsValidationError::AsymmetricAdjacency {
                        triangle: key,
                        neighbor: n,
                    });
                };
                let (u, v) = triangle.edge(side);
                if neighbor.edge(back) != (v, u) {
                    return Err(TdsValidationError::SharedEdgeMismatch {
                        triangle: key,
                        neighbor: n,
                        side,
                    });
                }
            }

            for &vertex in triangle.remaining() {
                let mismatch = |message: &str| TdsValidationError::RemainingVertexMismatch {
                    vertex,
                    message: message.to_owned(),
                };
                if owner.insert(vertex, key).is_some() {
                    return Err(mismatch("listed in two remaining sets"));
                }
                let tracked = self
                    .vertices
                    .get(vertex)
                    .ok_or_else(|| mismatch("not registered"))?;
                if tracked.is_inserted() {
                    return Err(mismatch("already a corner"));
                }
                if tracked.triangle() != Some(key) {
                    return Err(mismatch("back-reference names another triangle"));
                }
            }
        }

        for (vertex, tracked) in self.vertices.iter() {
            if !tracked.is_inserted() && !owner.contains_key(&vertex) {
                return Err(TdsValidationError::RemainingVertexMismatch {
                    vertex,
                    message: "not inserted and not in any remaining set".to_owned(),
                });
            }
        }
        Ok(())
    }
}
