//! Small index/arena primitives shared by every compiler crate, modeled on
//! rustc's own `IndexVec`/`IndexSlice` family: a newtype index type paired
//! with a vector that can only be indexed by that type, so mixing up a
//! `Local` and a `DefId` is a compile error instead of a silent bug.

pub mod idx;
pub mod index_slice;
pub mod index_vec;
pub mod variadic_log_macros;

pub use idx::Idx;
pub use index_slice::{IdxSlice, IntoSliceIdx};
pub use index_vec::IdxVec;
