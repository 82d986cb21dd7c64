//! Collection types used throughout the triangulation engine.
//!
//! Hash collections use `rustc-hash` (Fx), small fixed-size buffers use `smallvec`, and
//! the triangle/vertex arenas use `slotmap`. The spatial hash grid accelerates
//! constrained-edge intersection queries.

mod aliases;
pub(crate) mod spatial_hash_grid;

pub use aliases::*;
