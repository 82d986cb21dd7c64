use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet, FxHasher};
use smallvec::SmallVec;

#[cfg(not(feature = "dense-slotmap"))]
use slotmap::SlotMap;

#[cfg(feature = "dense-slotmap")]
use slotmap::DenseSlotMap;

use crate::core::triangulation_data_structure::VertexKey;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Arena backing the triangle and vertex stores.
///
/// `DenseSlotMap` by default (faster iteration over live triangles); `SlotMap` when
/// built with `--no-default-features`. Not exposed in public signatures.
#[cfg(not(feature = "dense-slotmap"))]
pub type StorageMap<K, V> = SlotMap<K, V>;

#[cfg(feature = "dense-slotmap")]
pub type StorageMap<K, V> = DenseSlotMap<K, V>;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// `HashMap` with the non-cryptographic Fx hasher.
///
/// # Examples
///
/// ```rust
/// use constrained_delaunay::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(7, 1);
/// assert_eq!(map.get(&7), Some(&1));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Hasher used by [`FastHashMap`] and [`FastHashSet`].
pub type FastHasher = FxHasher;

/// Build-hasher used by [`FastHashMap`] and [`FastHashSet`].
pub type FastBuildHasher = FxBuildHasher;

/// `HashSet` with the non-cryptographic Fx hasher.
pub type FastHashSet<T> = FxHashSet<T>;

/// Stack-first buffer that spills to the heap past `N` elements.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

// =============================================================================
// SEMANTIC TYPE ALIASES
// =============================================================================

/// Set of tracked vertices waiting inside a triangle.
pub type VertexKeySet = FastHashSet<VertexKey>;

/// Creates a [`FastHashMap`] with at least `capacity` slots.
#[inline]
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

/// Creates a [`FastHashSet`] with at least `capacity` slots.
#[inline]
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}
