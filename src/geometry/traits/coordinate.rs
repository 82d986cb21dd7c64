//! Scalar traits for planar coordinates.
//!
//! The triangulation engine identifies vertices and canonicalizes edges by **exact**
//! coordinate equality, so the scalar type has to provide three things beyond plain
//! floating-point arithmetic:
//!
//! - **`FiniteCheck`**: rejection of NaN and infinite values at the input boundary
//! - **`OrderedEq`**: exact IEEE equality in which `0.0 == -0.0`
//! - **`HashCoordinate`**: hashing consistent with `OrderedEq`
//!
//! [`CoordinateScalar`] bundles these with [`num_traits::Float`] and is implemented for
//! `f32` and `f64`.
//!
//! ```rust
//! use constrained_delaunay::geometry::traits::coordinate::*;
//!
//! assert!(1.5f64.is_finite_generic());
//! assert!(0.0f64.ordered_eq(&-0.0));
//! assert!(!f32::NAN.is_finite_generic());
//! ```

use num_traits::Float;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

/// Default tolerance for `f32` comparisons in tests and diagnostics.
pub const DEFAULT_TOLERANCE_F32: f32 = 1e-6;

/// Default tolerance for `f64` comparisons in tests and diagnostics.
pub const DEFAULT_TOLERANCE_F64: f64 = 1e-12;

/// Finiteness check usable from generic code.
///
/// # Examples
///
/// ```
/// use constrained_delaunay::geometry::traits::coordinate::FiniteCheck;
///
/// assert!(3.25f64.is_finite_generic());
/// assert!(!f64::INFINITY.is_finite_generic());
/// assert!(!f64::NAN.is_finite_generic());
/// ```
pub trait FiniteCheck {
    /// Returns `true` if the value is neither NaN nor infinite.
    fn is_finite_generic(&self) -> bool;
}

macro_rules! impl_finite_check {
    (float: $($t:ty),*) => {
        $(
            impl FiniteCheck for $t {
                #[inline(always)]
                fn is_finite_generic(&self) -> bool {
                    self.is_finite()
                }
            }
        )*
    };
}

impl_finite_check!(float: f32, f64);

/// Exact coordinate equality.
///
/// This is IEEE `==`: signed zeros compare equal and no tolerance is applied. NaN never
/// compares equal, which is harmless because non-finite coordinates are rejected before
/// they reach the mesh.
///
/// # Examples
///
/// ```
/// use constrained_delaunay::geometry::traits::coordinate::OrderedEq;
///
/// assert!(1.0f64.ordered_eq(&1.0));
/// assert!(!1.0f64.ordered_eq(&(1.0 + f64::EPSILON)));
/// assert!(0.0f32.ordered_eq(&-0.0));
/// ```
pub trait OrderedEq {
    /// Compares two values for exact equality.
    fn ordered_eq(&self, other: &Self) -> bool;
}

macro_rules! impl_ordered_eq {
    (float: $($t:ty),*) => {
        $(
            impl OrderedEq for $t {
                #[inline(always)]
                #[expect(clippy::float_cmp, reason = "vertex identity is exact by contract")]
                fn ordered_eq(&self, other: &Self) -> bool {
                    *self == *other
                }
            }
        )*
    };
}

impl_ordered_eq!(float: f32, f64);

/// Hashing of a single coordinate, consistent with [`OrderedEq`].
///
/// Signed zero is canonicalized before the bit pattern is hashed, so `0.0` and `-0.0`
/// hash identically.
///
/// # Examples
///
/// ```
/// use constrained_delaunay::geometry::traits::coordinate::HashCoordinate;
/// use std::collections::hash_map::DefaultHasher;
/// use std::hash::Hasher;
///
/// let mut h1 = DefaultHasher::new();
/// let mut h2 = DefaultHasher::new();
/// 0.0f64.hash_scalar(&mut h1);
/// (-0.0f64).hash_scalar(&mut h2);
/// assert_eq!(h1.finish(), h2.finish());
/// ```
pub trait HashCoordinate {
    /// Feeds this coordinate into `state`.
    fn hash_scalar<H: Hasher>(&self, state: &mut H);
}

macro_rules! impl_hash_coordinate {
    (float: $($t:ty),*) => {
        $(
            impl HashCoordinate for $t {
                #[inline(always)]
                fn hash_scalar<H: Hasher>(&self, state: &mut H) {
                    let canonical = if *self == 0.0 { 0.0 } else { *self };
                    canonical.to_bits().hash(state);
                }
            }
        )*
    };
}

impl_hash_coordinate!(float: f32, f64);

/// Scalar requirements for triangulation coordinates.
///
/// # Required Traits
///
/// - `Float`: floating-point arithmetic (and `NumCast` for option conversion)
/// - `OrderedEq` / `HashCoordinate`: exact identity semantics
/// - `FiniteCheck`: input validation
/// - `Default`, `Debug`, `Send`, `Sync`, `'static`
///
/// ```rust
/// use constrained_delaunay::geometry::traits::coordinate::CoordinateScalar;
///
/// fn close<T: CoordinateScalar>(a: T, b: T) -> bool {
///     (a - b).abs() < T::default_tolerance()
/// }
/// assert!(close(1.0f64, 1.0));
/// ```
pub trait CoordinateScalar:
    Float + OrderedEq + HashCoordinate + FiniteCheck + Default + Debug + Send + Sync + 'static
{
    /// Tolerance suited to the precision of this type.
    ///
    /// The engine itself never compares with a tolerance; this is used by validation
    /// helpers that compare accumulated areas.
    fn default_tolerance() -> Self;
}

impl CoordinateScalar for f32 {
    fn default_tolerance() -> Self {
        DEFAULT_TOLERANCE_F32
    }
}

impl CoordinateScalar for f64 {
    fn default_tolerance() -> Self {
        DEFAULT_TOLERANCE_F64
    }
}
