//! The low-level intermediate representation consumed by every codegen
//! backend: a monomorphized, control-flow-graph body per function plus the
//! concrete struct/enum definitions its types may reference.
//!
//! Nothing in this crate knows about source syntax, name resolution, or
//! generics — by construction, every `LirTy` a `slangc_sema` lowering pass
//! hands to this crate is already fully resolved (§3 DATA MODEL).

pub mod basic_blocks;
pub mod layout_ctx;
pub mod lir;
pub mod syntax;

pub use basic_blocks::{BasicBlock, BasicBlockData, BasicBlocks, ENTRY_BLOCK};
pub use layout_ctx::LayoutCtx;
pub use lir::{
    CallConv, DefId, EmitKind, LirArgs, LirBody, LirBodyKind, LirBodyMetadata, LirCtx, LirItemKind,
    LirUnit, LirUnitMetadata, Linkage, UnnamedAddress, Visibility,
};
pub use syntax::{
    BinOp, Body, ConstOperand, ConstScalar, ConstValue, EnumDef, EnumVariant, HandleKind, LirDefs,
    LirTy, Local, LocalData, Operand, Place, Projection, RValue, RawScalarValue, Statement,
    StructDef, Terminator, UnOp, RETURN_LOCAL,
};
