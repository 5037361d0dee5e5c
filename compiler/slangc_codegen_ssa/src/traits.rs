use slangc_abi::{
    calling_convention::function::FnAbi,
    layout::TyAndLayout,
    size_and_align::{Align, Size},
};
use slangc_lir::{
    lir::{DefId, LirBodyMetadata, LirCtx},
    syntax::{BinOp, ConstScalar, LirDefs, LirTy, Local, LocalData, UnOp},
};
use slangc_utils::index_vec::IdxVec;

use crate::lir::{OperandRef, PlaceRef};

/// This trait is used to get the layout of a type.
/// It is used to get the layout of a type in the codegen backend.
pub trait LayoutOf {
    /// Returns the layout of the given type.
    fn layout_of(&self, ty: LirTy) -> TyAndLayout<LirTy>;

    /// Returns the struct/enum definition tables the layout and codegen
    /// layers recurse into when `ty` is a [`LirTy::Struct`]/[`LirTy::Enum`].
    fn defs(&self) -> &LirDefs;
}

pub trait FnAbiOf {
    /// Returns the function ABI for the given return type and argument types.
    fn fn_abi_of(&self, lir_ctx: &LirCtx, ret_and_args: &IdxVec<Local, LocalData>) -> FnAbi<LirTy>;
}

/// This trait is used to define the types used in the codegen backend.
/// It is used to define the types used in the codegen backend.
// FIXME(bruzzone): when `trait alias` is stable, we can use it to alias the `CodegenObject` trait
// pub trait CodegenObject = Copy + PartialEq + std::fmt::Debug;
pub trait CodegenBackendTypes {
    /// A `BasicBlock` is a basic block in the codegen backend.
    type BasicBlock: Copy + PartialEq + std::fmt::Debug;
    /// A `Type` is a type in the codegen backend.
    type Type: Copy + PartialEq + std::fmt::Debug;
    /// A `Value` is an instance of a type in the codegen backend.
    /// Note that this should include function values: a function is just a
    /// `Value` of pointer-to-function type, as in LLVM.
    /// E.g., an instruction, constant, argument, or a function value.
    type Value: Copy + PartialEq + std::fmt::Debug;
    /// A `Function` is a function type in the codegen backend.
    type FunctionType: Copy + PartialEq + std::fmt::Debug;
    /// A `MetadataType` is a metadata type in the codegen backend.
    type MetadataType: Copy + PartialEq + std::fmt::Debug;
    /// A `MetadataValue` is a metadata value in the codegen backend.
    /// E.g., a debug info node or TBAA (Type-Based Alias Analysis) node.
    type MetadataValue: Copy + PartialEq + std::fmt::Debug;
}

/// The codegen backend trait.
/// It is used to define the methods used in the codegen backend.
/// The associated types are used to define the types used in the codegen backend.
pub trait CodegenBackend: Sized + CodegenBackendTypes {
    /// The associated codegen module type.
    // FIXME(bruzzone): add constraints to ensure that the module is compatible with the codegen backend.
    type Module;

    /// The associated codegen context type.
    // FIXME(bruzzone): add constraints to ensure that the context is compatible with the codegen backend.
    type Context;
}

/// The pre-definition methods for the codegen backend. It is used to pre-define functions.
/// After pre-defining all functions, the bodies should be defined (see `DefineCodegenMethods`).
pub trait PreDefineCodegenMethods: Sized + CodegenBackendTypes {
    fn predefine_body(
        &self,
        lir_body_metadata: &LirBodyMetadata,
        lir_body_ret_and_args: &IdxVec<Local, LocalData>,
    );
}

/// The definition methods for the codegen backend. It is used to define (compile) function bodies.
/// The definition should be done after pre-defining all functions (see `PreDefineCodegenMethods`).
pub trait DefineCodegenMethods: Sized + CodegenBackendTypes {
    fn define_body(&self, lir_body: &slangc_lir::lir::LirBody);
}

/// The codegen backend methods.
pub trait CodegenMethods<'be>:
    Sized
    + LayoutOf
    + FnAbiOf
    + CodegenBackendTypes
    + CodegenBackend
    + PreDefineCodegenMethods
    + DefineCodegenMethods
{
    /// Creates a new codegen context for the given LIR type context and module.
    fn new(lir_ctx: LirCtx, defs: LirDefs, context: &'be Self::Context, module: Self::Module) -> Self;

    /// Return the LIR type context associated with this codegen context.
    fn lir_ctx(&self) -> &LirCtx;

    /// Returns the function value for the given LIR body if it exists.
    fn get_fn(&self, lir_body_metadata: &LirBodyMetadata) -> Option<Self::Value>;

    /// Returns the function value for the given LIR body or defines it if it does not exist.
    fn get_or_define_fn(
        &self,
        lir_fn_metadata: &LirBodyMetadata,
        lir_fn_ret_and_args: &IdxVec<Local, LocalData>,
    ) -> Self::Value;

    /// Returns the function value for an already-predefined function, looked
    /// up by `DefId` (used by direct-call codegen, §4.4).
    fn get_fn_by_def_id(&self, def_id: DefId) -> Option<Self::Value>;
}

/// The builder methods for the codegen backend.
/// This trait is used to define the methods used in the codegen backend.
pub trait BuilderMethods<'a, 'be>: Sized + CodegenBackendTypes {
    /// The associated codegen context type.
    /// This ensures that the codegen context is compatible with the codegen backend types.
    type CodegenCtx: CodegenMethods<
            'be,
            BasicBlock = Self::BasicBlock,
            Type = Self::Type,
            Value = Self::Value,
            FunctionType = Self::FunctionType,
            MetadataType = Self::MetadataType,
            MetadataValue = Self::MetadataValue,
        >;

    /// Returns a reference to the codegen context.
    fn ctx(&self) -> &Self::CodegenCtx;

    /// Allocate memory for a value of the given size and alignment.
    /// For instance, in LLVM this corresponds to the `alloca` instruction.
    fn alloca(&self, size: Size, align: Align) -> Self::Value;

    /// Create a new builder for the given codegen context and basic block.
    /// The builder is positioned at the end of the basic block.
    fn build(ctx: &'a Self::CodegenCtx, bb: Self::BasicBlock) -> Self;

    /// Append a new basic block to the given function value with the given name.
    /// The name can be empty, in which case a unique name will be generated.
    /// The function value is assumed to be valid and belong to the same context as the codegen context.
    fn append_basic_block(ctx: &'a Self::CodegenCtx, fn_value: Self::Value, name: &str)
        -> Self::BasicBlock;

    /// Build a return instruction for the given builder.
    /// If the return value is `None`, it means that the function returns `void`,
    /// the return value is ignored, or it is `Indirect` (see `PassMode` in `slangc_abi`).
    /// For instance, it could be `Indirect` if the return value is a large struct:
    /// ```rust
    /// struct LargeStruct { a: [u8; 1024] }
    /// fn foo() -> LargeStruct { ... }
    /// ```
    fn build_return(&mut self, return_value: Option<Self::Value>);

    /// Build an unconditional jump to `target`.
    fn build_br(&mut self, target: Self::BasicBlock);

    /// Build a multi-way branch on `discr` (pattern-match lowering, §4.4.6):
    /// jump to the block paired with the matching case, or `otherwise` if
    /// none match.
    fn build_switch(
        &mut self,
        discr: Self::Value,
        otherwise: Self::BasicBlock,
        cases: &[(u128, Self::BasicBlock)],
    );

    /// Build a direct call to `callee` with `args`, returning the call's
    /// result value (ignored by the caller when the callee returns `Unit`).
    fn build_call(&mut self, callee: Self::Value, args: &[Self::Value]) -> Self::Value;

    /// Build an `unreachable` instruction (§4.4.6: the codegen-level trap for
    /// a match the validator already proved exhaustive).
    fn build_unreachable(&mut self);

    /// Build an integer, float, or boolean binary operation (§4.3.1 typed
    /// operator checking has already ruled out invalid operand types by the
    /// time codegen sees this).
    fn build_binop(&mut self, op: BinOp, lhs: Self::Value, rhs: Self::Value, ty: &LirTy) -> Self::Value;

    /// Build a unary negation or logical/bitwise-not operation.
    fn build_unop(&mut self, op: UnOp, operand: Self::Value, ty: &LirTy) -> Self::Value;

    /// Materialize a scalar constant as a backend value.
    fn const_scalar_to_backend_value(
        &mut self,
        scalar: ConstScalar,
        ty_layout: TyAndLayout<LirTy>,
    ) -> Self::Value;

    /// Load an operand from the given place reference.
    /// This is used to load a value from memory.
    fn load_operand(&mut self, place_ref: &PlaceRef<Self::Value>) -> OperandRef<Self::Value>;

    /// Build a store instruction to store the given value to the given place reference.
    /// This is used to store a value to memory.
    /// The value is assumed to be of the same type as the place reference.
    /// The alignment is the alignment of the place reference.
    fn build_load(&mut self, ty: Self::Type, ptr: Self::Value, align: Align) -> Self::Value;

    /// Store an operand's value into `place_ref`, handling all three
    /// `OperandVal` shapes (immediate, scalar pair, or already-in-memory).
    fn store_operand(&mut self, place_ref: &PlaceRef<Self::Value>, operand: OperandRef<Self::Value>);

    /// Project `place_ref` to its `index`-th field, for a struct or enum
    /// payload of the given field type.
    fn project_field(
        &mut self,
        place_ref: &PlaceRef<Self::Value>,
        index: usize,
        field_ty_layout: TyAndLayout<LirTy>,
    ) -> PlaceRef<Self::Value>;

    /// Take a shared/exclusive reference to `place_ref`, yielding the
    /// pointer value (§4.3.4 borrow expressions).
    fn build_ref(&mut self, place_ref: &PlaceRef<Self::Value>) -> Self::Value;

    /// Follow a `Deref` projection (§3 `Ref`/`Box` pointee access): load the
    /// pointer out of `place_ref` and reinterpret it as a place of
    /// `pointee_layout`.
    fn deref_place(
        &mut self,
        place_ref: &PlaceRef<Self::Value>,
        pointee_layout: TyAndLayout<LirTy>,
    ) -> PlaceRef<Self::Value>;

    /// Follow an `Index` projection (§4.4.10 bounds-checked array/list
    /// indexing) into an element place.
    fn index_place(
        &mut self,
        place_ref: &PlaceRef<Self::Value>,
        index_value: Self::Value,
        elem_layout: TyAndLayout<LirTy>,
    ) -> PlaceRef<Self::Value>;

    /// Read the discriminant (tag) out of an enum place (§4.4.1/§4.4.6).
    fn build_discriminant(&mut self, place_ref: &PlaceRef<Self::Value>) -> Self::Value;

    /// Emit a call into the runtime's recursive destructor for `place_ref`'s
    /// type (§4.4.5 RAII destruction). A no-op for types that don't require
    /// cleanup; the caller already checked `LirTy::requires_destructor`.
    fn build_destroy(&mut self, place_ref: &PlaceRef<Self::Value>, ty: &LirTy);

    /// Mark the start of a local's storage (§4.4.5 scope bookkeeping).
    fn build_storage_live(&mut self, local: Local);

    /// Mark the end of a local's storage.
    fn build_storage_dead(&mut self, local: Local);
}
