//! The backend-agnostic half of code generation: everything that walks a
//! [`slangc_lir`] body and decides *what* to build (which places get
//! allocas, which rvalues become binops, how a return is passed) without
//! knowing *how* a particular backend represents a value.
//!
//! A concrete backend (e.g. `slangc_codegen_llvm`) implements the traits in
//! [`traits`] and gets [`lir::codegen_lir_body`]/[`entry::compile_lir_unit`]
//! for free, mirroring how `rustc_codegen_ssa` sits between `rustc_middle::mir`
//! and `rustc_codegen_llvm`.

pub mod entry;
pub mod lir;
pub mod traits;

pub use entry::{compile_lir_unit, FnCtx};
pub use lir::{LocalRef, OperandRef, OperandVal, PlaceRef, PlaceVal};
pub use traits::{
    BuilderMethods, CodegenBackend, CodegenBackendTypes, CodegenMethods, DefineCodegenMethods,
    FnAbiOf, LayoutOf, PreDefineCodegenMethods,
};
