//! ABI- and target-layout primitives shared by every codegen backend.
//!
//! This crate has no knowledge of any particular source-language type system;
//! it only knows how to describe sizes, alignments, and backend-level value
//! representations ([`layout::BackendRepr`]) for whatever a higher-level
//! crate (`slangc_lir`) chooses to lay out.

pub mod calling_convention;
pub mod layout;
pub mod size_and_align;
pub mod target;

pub use layout::{BackendRepr, Integer, Layout, Primitive, TyAndLayout};
pub use size_and_align::{AbiAndPrefAlign, Align, AlignError, Size};
pub use target::{AddressSpace, BackendKind, Endianess, LirTarget, TargetDataLayout, TargetTriple};
