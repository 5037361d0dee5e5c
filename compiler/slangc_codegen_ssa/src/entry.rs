use crate::{
    lir::{LocalRef, OperandRef, OperandVal, PlaceRef},
    traits::{BuilderMethods, DefineCodegenMethods, LayoutOf, PreDefineCodegenMethods},
};
use slangc_abi::{
    calling_convention::function::{FnAbi, PassMode},
    layout::{Integer, TyAndLayout},
};
use slangc_lir::{
    basic_blocks::{BasicBlock, BasicBlockData},
    lir::{LirBody, LirUnit},
    syntax::{
        ConstOperand, LirTy, Local, Operand, Place, Projection, RValue, Statement, Terminator,
        RETURN_LOCAL,
    },
};
use slangc_utils::index_vec::IdxVec;
use tracing::{debug, info, instrument};

pub struct FnCtx<'a, 'be, B: BuilderMethods<'a, 'be>> {
    /// The function ABI.
    /// This contains information about the calling convention,
    /// argument types, return type, etc.
    pub fn_abi: FnAbi<LirTy>,

    /// The body of the function in LIR.
    pub lir_body: &'a LirBody,

    /// The function value.
    /// This is the function that will be generated; per `CodegenBackendTypes`
    /// a function is just a `Value` of pointer-to-function type.
    pub fn_value: B::Value,

    /// The codegen context.
    pub ctx: &'a B::CodegenCtx,

    /// The allocated locals and temporaries for the function.
    ///
    /// Note that the `B::Value` type is used to represent the local references.
    pub locals: IdxVec<Local, LocalRef<B::Value>>,

    /// A cache of the basic blocks in the function.
    /// This is also used to avoid creating multiple basic blocks for the same LIR basic block.
    pub cached_bbs: IdxVec<BasicBlock, Option<B::BasicBlock>>,
}

impl<'ctx, 'll, B: BuilderMethods<'ctx, 'll>> FnCtx<'ctx, 'll, B> {
    /// Codegen the given LIR basic block.
    /// This creates a new builder for the basic block and generates the instructions in it.
    /// It also updates the `cached_bbs` field to avoid creating multiple basic blocks for the same LIR basic block.
    pub fn codegen_basic_block(&mut self, bb: BasicBlock) {
        let be_bb = self.get_or_insert_bb(bb);
        let mut builder = B::build(self.ctx, be_bb);
        let bb_data: &BasicBlockData = &self.lir_body.basic_blocks[bb];
        debug!("Codegen basic block {:?}: {:?}", bb, bb_data);
        for stmt in &bb_data.statements {
            self.codegen_statement(&mut builder, stmt);
        }
        let term = &bb_data.terminator;
        self.codegen_terminator(&mut builder, term);
    }

    /// Get the backend basic block for the given LIR basic block.
    /// If it does not exist, create it and cache it.
    pub fn get_or_insert_bb(&mut self, bb: BasicBlock) -> B::BasicBlock {
        if let Some(Some(be_bb)) = self.cached_bbs.get(bb) {
            return *be_bb;
        }

        let be_bb = B::append_basic_block(self.ctx, self.fn_value, &format!("bb{:?}", bb));
        self.cached_bbs[bb] = Some(be_bb);
        be_bb
    }

    #[instrument(level = "debug", skip(self, builder))]
    /// Codegen the given LIR statement.
    fn codegen_statement(&mut self, builder: &mut B, stmt: &Statement) {
        // TODO(bruzzone): handle span for debugging here
        match stmt {
            Statement::Assign(assign) => {
                let place = &assign.0;
                let rvalue = &assign.1;
                match place.try_local() {
                    Some(local) => {
                        debug!("Assigning to local {:?}", local);
                        match &self.locals[local] {
                            LocalRef::PlaceRef(place_ref) => {
                                let place_ref = place_ref.clone();
                                self.codegen_rvalue(builder, place_ref, rvalue)
                            }
                            LocalRef::OperandRef(operand_ref) => {
                                // We cannot assign to an operand ref that is not a ZST
                                // because operand refs are immutable.
                                if !operand_ref.ty_layout.is_zst() {
                                    panic!("Cannot assign to non-ZST operand ref");
                                }

                                // For a ZST we can drop the value, but we still have to
                                // codegen the rvalue to preserve any side effects.
                                self.codegen_rvalue_operand(builder, rvalue);
                            }
                            LocalRef::PendingOperandRef => {
                                let operand = self.codegen_rvalue_operand(builder, rvalue);
                                self.overwrite_local(local, LocalRef::OperandRef(operand));
                            }
                        }
                    }
                    None => {
                        let place_ref = self.codegen_place(builder, place);
                        self.codegen_rvalue(builder, place_ref, rvalue);
                    }
                }
            }
            Statement::Destroy(place) => {
                let place_ref = self.codegen_place(builder, place);
                let ty = place_ref.ty_layout.ty.clone();
                builder.build_destroy(&place_ref, &ty);
            }
            Statement::StorageLive(local) => builder.build_storage_live(*local),
            Statement::StorageDead(local) => builder.build_storage_dead(*local),
        }
    }

    /// Codegen an rvalue directly into a memory place.
    ///
    /// Every [`RValue::Aggregate`] is memory-backed (§4.4.1/§4.4.3: struct
    /// literals, enum-variant construction, and fixed-array literals all lower
    /// to an opaque `Memory` `BackendRepr`), so this is the only place that
    /// handles it — field by field, in declaration order. Every other rvalue
    /// kind is scalar-shaped and is produced via `codegen_rvalue_operand`,
    /// then stored whole.
    pub fn codegen_rvalue(&mut self, builder: &mut B, place_ref: PlaceRef<B::Value>, rvalue: &RValue) {
        match rvalue {
            RValue::Aggregate { fields, .. } => {
                for (index, field) in fields.iter().enumerate() {
                    let field_operand = self.codegen_operand(builder, field);
                    let field_place =
                        builder.project_field(&place_ref, index, field_operand.ty_layout.clone());
                    builder.store_operand(&field_place, field_operand);
                }
            }
            _ => {
                let operand = self.codegen_rvalue_operand(builder, rvalue);
                builder.store_operand(&place_ref, operand);
            }
        }
    }

    pub fn codegen_rvalue_operand(&mut self, builder: &mut B, rvalue: &RValue) -> OperandRef<B::Value> {
        match rvalue {
            RValue::Use(operand) => self.codegen_operand(builder, operand),
            RValue::BinaryOp(op, operands) => {
                let (lhs, rhs) = operands.as_ref();
                let lhs_operand = self.codegen_operand(builder, lhs);
                let rhs_operand = self.codegen_operand(builder, rhs);
                let operand_ty = lhs_operand.ty_layout.ty.clone();
                let lhs_val = lhs_operand.immediate_value();
                let rhs_val = rhs_operand.immediate_value();
                // Comparisons yield `Bool`; every other binary op preserves
                // the operand type (§4.3.1: typed operator checking already
                // guarantees `lhs`/`rhs` share a type by the time codegen
                // sees this).
                let result_ty = if op.is_comparison() { LirTy::Bool } else { operand_ty.clone() };
                let result_layout = builder.ctx().layout_of(result_ty);
                let result_val = builder.build_binop(*op, lhs_val, rhs_val, &operand_ty);
                OperandRef::new_immediate(result_val, result_layout)
            }
            RValue::UnaryOp(op, operand) => {
                let operand_ref = self.codegen_operand(builder, operand);
                let operand_ty = operand_ref.ty_layout.ty.clone();
                let val = operand_ref.immediate_value();
                let result_val = builder.build_unop(*op, val, &operand_ty);
                OperandRef::new_immediate(result_val, operand_ref.ty_layout)
            }
            RValue::Ref { place, mutable } => {
                let place_ref = self.codegen_place(builder, place);
                let ref_ty = LirTy::Ref {
                    pointee: Box::new(place_ref.ty_layout.ty.clone()),
                    mutable: *mutable,
                };
                let ref_layout = builder.ctx().layout_of(ref_ty);
                let val = builder.build_ref(&place_ref);
                OperandRef::new_immediate(val, ref_layout)
            }
            RValue::Discriminant(place) => {
                let place_ref = self.codegen_place(builder, place);
                let tag_layout = builder.ctx().layout_of(LirTy::Int {
                    width: Integer::I32,
                    signed: false,
                });
                let val = builder.build_discriminant(&place_ref);
                OperandRef::new_immediate(val, tag_layout)
            }
            RValue::Aggregate { .. } => {
                panic!("aggregate rvalues are memory-backed; use codegen_rvalue instead")
            }
        }
    }

    /// Resolve an [`Operand`] (a copy/move of a place, or a constant) to a
    /// value usable directly in computations.
    fn codegen_operand(&mut self, builder: &mut B, operand: &Operand) -> OperandRef<B::Value> {
        match operand {
            Operand::Copy(place) | Operand::Move(place) => match place.try_local() {
                Some(local) => self.codegen_consume(builder, local),
                None => {
                    let place_ref = self.codegen_place(builder, place);
                    builder.load_operand(&place_ref)
                }
            },
            Operand::Const(const_operand) => {
                let ConstOperand::Value(const_val, lir_ty) = const_operand;
                OperandRef::new_const(builder, *const_val, lir_ty.clone())
            }
        }
    }

    /// Resolve a [`Place`] (a local plus a chain of field/deref/index
    /// projections) to a memory location.
    fn codegen_place(&mut self, builder: &mut B, place: &Place) -> PlaceRef<B::Value> {
        let mut place_ref = match &self.locals[place.local] {
            LocalRef::PlaceRef(place_ref) => place_ref.clone(),
            LocalRef::OperandRef(_) | LocalRef::PendingOperandRef => {
                panic!(
                    "cannot project into local {:?}, which has no home in memory",
                    place.local
                )
            }
        };

        for projection in &place.projection {
            place_ref = match *projection {
                Projection::Field(index) => {
                    let field_layout = self.field_layout(&*builder, &place_ref.ty_layout, index);
                    builder.project_field(&place_ref, index, field_layout)
                }
                Projection::Deref => {
                    let pointee_layout = self.pointee_layout(&*builder, &place_ref.ty_layout);
                    builder.deref_place(&place_ref, pointee_layout)
                }
                Projection::Index(index_local) => {
                    let index_operand = self.codegen_consume(builder, index_local);
                    let index_value = index_operand.immediate_value();
                    let elem_layout = self.elem_layout(&*builder, &place_ref.ty_layout);
                    builder.index_place(&place_ref, index_value, elem_layout)
                }
            };
        }

        place_ref
    }

    fn field_layout(&self, builder: &B, ty_layout: &TyAndLayout<LirTy>, index: usize) -> TyAndLayout<LirTy> {
        let field_ty = match &ty_layout.ty {
            LirTy::Struct(def_id) => builder.ctx().defs().structs[*def_id].fields[index].1.clone(),
            LirTy::Optional(inner) => (**inner).clone(),
            LirTy::Result { ok, err } => {
                if index == 0 { (**ok).clone() } else { (**err).clone() }
            }
            // `{ i32 len, i32 cap, T* data }` (§4.4.3): fields 0/1/2.
            LirTy::List(elem) | LirTy::DynArray { elem } => Self::container_header_field(index, || {
                LirTy::Ref { pointee: Box::new(elem.as_ref().clone()), mutable: true }
            }),
            // `{ i32 len, i32 cap, Entry<K, V>* buckets }` (§4.4.3); the
            // bucket record is the monomorphized struct `entry_def`.
            LirTy::HashMap { entry_def, .. } => Self::container_header_field(index, || LirTy::Ref {
                pointee: Box::new(LirTy::Struct(*entry_def)),
                mutable: true,
            }),
            // TODO: enum payload field access needs a `Downcast` projection
            // kind carrying the matched variant index; only tag reads via
            // `Discriminant` are wired up so far.
            LirTy::Enum(_) => todo!("enum variant payload projection is not yet modeled"),
            other => panic!("cannot project field {index} of non-aggregate type {other:?}"),
        };
        builder.ctx().layout_of(field_ty)
    }

    /// Shared field typing for the `{ i32 len, i32 cap, T* data }` shape used
    /// by every built-in dynamic container (§4.4.3): field 0 is the live
    /// count, field 1 the capacity, field 2 the backing pointer.
    fn container_header_field(index: usize, data_ptr: impl FnOnce() -> LirTy) -> LirTy {
        match index {
            0 | 1 => LirTy::Int { width: Integer::I32, signed: false },
            2 => data_ptr(),
            other => panic!("built-in container has no field {other}"),
        }
    }

    fn pointee_layout(&self, builder: &B, ty_layout: &TyAndLayout<LirTy>) -> TyAndLayout<LirTy> {
        let pointee = match &ty_layout.ty {
            LirTy::Ref { pointee, .. } => (**pointee).clone(),
            LirTy::Box(inner) => (**inner).clone(),
            other => panic!("cannot dereference non-pointer type {other:?}"),
        };
        builder.ctx().layout_of(pointee)
    }

    fn elem_layout(&self, builder: &B, ty_layout: &TyAndLayout<LirTy>) -> TyAndLayout<LirTy> {
        let elem = match &ty_layout.ty {
            LirTy::Array { elem, .. } => (**elem).clone(),
            LirTy::DynArray { elem } => (**elem).clone(),
            LirTy::List(elem) => (**elem).clone(),
            // Indexing the raw data pointer projected out of a container's
            // header (§4.4.3): pointer arithmetic over the pointee type, the
            // same way `list[i]`/bucket-array probing reach an element.
            LirTy::Ref { pointee, .. } => (**pointee).clone(),
            other => panic!("cannot index non-array type {other:?}"),
        };
        builder.ctx().layout_of(elem)
    }

    fn overwrite_local(&mut self, local: Local, new_ref: LocalRef<B::Value>) {
        self.locals[local] = new_ref;
    }

    /// Codegen the given LIR terminator.
    fn codegen_terminator(&mut self, builder: &mut B, term: &Terminator) {
        debug!("Codegen terminator: {:?}", term);
        match term {
            Terminator::Return => self.codegen_return_terminator(builder),
            Terminator::Goto { target } => {
                let target_bb = self.get_or_insert_bb(*target);
                builder.build_br(target_bb);
            }
            Terminator::SwitchInt { discr, targets, otherwise } => {
                let discr_operand = self.codegen_operand(builder, discr);
                let discr_val = discr_operand.immediate_value();
                let otherwise_bb = self.get_or_insert_bb(*otherwise);
                let mut cases = Vec::with_capacity(targets.len());
                for (value, bb) in targets {
                    let target_bb = self.get_or_insert_bb(*bb);
                    cases.push((*value, target_bb));
                }
                builder.build_switch(discr_val, otherwise_bb, &cases);
            }
            Terminator::Call { func, args, destination, target } => {
                let func_operand = self.codegen_operand(builder, func);
                let func_val = func_operand.immediate_value();
                let mut arg_vals = Vec::with_capacity(args.len());
                for arg in args {
                    let arg_operand = self.codegen_operand(builder, arg);
                    arg_vals.push(arg_operand.immediate_value());
                }
                let result_val = builder.build_call(func_val, &arg_vals);
                let dest_place = self.codegen_place(builder, destination);
                let result_operand = OperandRef::new_immediate(result_val, dest_place.ty_layout.clone());
                builder.store_operand(&dest_place, result_operand);
                match target {
                    Some(bb) => {
                        let target_bb = self.get_or_insert_bb(*bb);
                        builder.build_br(target_bb);
                    }
                    None => builder.build_unreachable(),
                }
            }
            Terminator::Unreachable => builder.build_unreachable(),
        }
    }

    /// Codegen a return terminator.
    fn codegen_return_terminator(&mut self, builder: &mut B) {
        let be_val = match self.fn_abi.ret.mode {
            PassMode::Ignore | PassMode::Indirect => {
                info!("Handling ignored or indirect return");
                builder.build_return(None);
                return;
            }
            PassMode::Direct => {
                info!("Handling direct return");
                let operand_ref = self.codegen_consume(builder, RETURN_LOCAL);
                match operand_ref.operand_val {
                    OperandVal::Zst => todo!("Handle return of ZST. Should be unreachable?"),
                    OperandVal::Ref(_) => todo!("Handle return by reference: load from place"),
                    OperandVal::Pair(_, _) => {
                        todo!("Handle return of a scalar pair via the backend's multi-value ABI")
                    }
                    OperandVal::Immediate(val) => val,
                }
            }
        };

        builder.build_return(Some(be_val));
    }

    fn codegen_consume(&mut self, builder: &mut B, local: Local) -> OperandRef<B::Value> {
        match &self.locals[local] {
            LocalRef::OperandRef(operand_ref) => operand_ref.clone(),
            LocalRef::PlaceRef(place_ref) => builder.load_operand(place_ref),
            LocalRef::PendingOperandRef => {
                panic!("Cannot consume a pending operand ref for local {local:?} before it is defined")
            }
        }
    }
}

#[instrument(skip(ctx, lir_unit))]
pub fn compile_lir_unit<'a, 'be, B: BuilderMethods<'a, 'be>>(ctx: &'a B::CodegenCtx, lir_unit: LirUnit) {
    // Predefine the functions. That is, create the function declarations.
    for lir_body in &lir_unit.bodies {
        ctx.predefine_body(&lir_body.metadata, &lir_body.ret_and_args);
    }

    // Now that all functions are pre-defined, we can compile the bodies.
    for lir_body in &lir_unit.bodies {
        // It corresponds to:
        // ```rust
        // for &(mono_item, item_data) in &mono_items {
        //     mono_item.define::<Builder<'_, '_, '_>>(&mut cx, cgu_name.as_str(), item_data);
        // }
        // ```
        // in rustc_codegen_llvm/src/base.rs
        ctx.define_body(lir_body);
    }
}
