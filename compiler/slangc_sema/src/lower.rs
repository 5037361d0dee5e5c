//! AST → LIR lowering (§4.4): walks a validated function body and emits
//! `Place`/`RValue`/`Statement`/`Terminator` directly, one basic block at a
//! time. Built-in generic containers are expanded inline at the call site
//! (§4.4.3) rather than through the monomorphization queue; ordinary and
//! user-generic functions go through [`LowerCtx::lower_call`], which drives
//! the same memoized-instantiation discipline `monomorphize` uses for types.

use std::collections::HashMap;

use slangc_lir::basic_blocks::{BasicBlock, BasicBlockData, ENTRY_BLOCK};
use slangc_lir::lir::{
    CallConv, DefId, Linkage, LirBody, LirBodyKind, LirBodyMetadata, LirItemKind, LirUnit,
    LirUnitMetadata, UnnamedAddress, Visibility as LirVisibility,
};
use slangc_lir::syntax::{
    BinOp, ConstOperand, ConstScalar, ConstValue, LirDefs, LirTy, Local, LocalData, Operand,
    Place, Projection, RValue, RawScalarValue, Statement, Terminator, UnOp, RETURN_LOCAL,
};
use slangc_utils::idx::Idx;
use slangc_utils::index_vec::IdxVec;

use crate::ast::{
    BinOpKind, Block, CallArgs, Expr, FunctionDecl, MatchArm, Pattern, Stmt, Ty, UnOpKind,
    Visibility,
};
use crate::const_eval::ConstValue as SlangConst;
use crate::containers;
use crate::diagnostics::{codes, Reporter};
use crate::monomorphize::Monomorphizer;
use crate::symbols::SymbolTable;
use crate::type_resolve::{check_binary_op, check_condition_is_bool, resolve_ty};

/// Builds one function body's basic blocks. Locals are tracked as a flat
/// `Vec` during construction (not an `IdxVec`) because `Local`'s index must
/// stay stable across the eventual `ret_and_args`/`locals` split — the two
/// fields `LirBody` stores them in are populated from one contiguous
/// numbering, not two independent ones (§4.4).
pub struct FnBuilder<'d> {
    pub defs: &'d mut LirDefs,
    locals: Vec<LocalData>,
    basic_blocks: IdxVec<BasicBlock, BasicBlockData>,
    current: BasicBlock,
    scopes: Vec<HashMap<String, Local>>,
    /// (continue target, break target) for the innermost enclosing loop.
    loop_stack: Vec<(BasicBlock, BasicBlock)>,
}

impl<'d> FnBuilder<'d> {
    pub fn new(defs: &'d mut LirDefs) -> Self {
        let mut basic_blocks = IdxVec::new();
        basic_blocks.push(BasicBlockData::new(Terminator::Unreachable));
        FnBuilder { defs, locals: Vec::new(), basic_blocks, current: ENTRY_BLOCK, scopes: vec![HashMap::new()] }
    }

    pub fn new_local(&mut self, ty: LirTy, mutable: bool) -> Local {
        let idx = Local::new(self.locals.len());
        self.locals.push(LocalData { ty, mutable });
        idx
    }

    pub fn declare(&mut self, name: &str, local: Local) {
        self.scopes.last_mut().expect("at least one scope always exists").insert(name.to_string(), local);
    }

    pub fn resolve(&self, name: &str) -> Option<Local> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn push_stmt(&mut self, stmt: Statement) {
        self.basic_blocks[self.current].statements.push(stmt);
    }

    pub fn new_block(&mut self) -> BasicBlock {
        self.basic_blocks.push(BasicBlockData::new(Terminator::Unreachable))
    }

    pub fn switch_to(&mut self, bb: BasicBlock) {
        self.current = bb;
    }

    pub fn current_block(&self) -> BasicBlock {
        self.current
    }

    pub fn set_terminator(&mut self, term: Terminator) {
        self.basic_blocks[self.current].terminator = term;
    }

    /// The current block's terminator, so callers can tell whether a nested
    /// lowering (an `if`/`while`/`match` arm) already closed the block with
    /// an explicit `return`/`break`/`continue` before falling through.
    fn basic_blocks_terminator(&self) -> &Terminator {
        &self.basic_blocks[self.current].terminator
    }

    fn local_ty(&self, local: Local) -> LirTy {
        self.locals[local.idx()].ty.clone()
    }

    pub fn push_loop(&mut self, continue_target: BasicBlock, break_target: BasicBlock) {
        self.loop_stack.push((continue_target, break_target));
    }

    pub fn pop_loop(&mut self) {
        self.loop_stack.pop();
    }

    pub fn innermost_loop(&self) -> Option<(BasicBlock, BasicBlock)> {
        self.loop_stack.last().copied()
    }

    /// Assigns `rvalue` to a fresh local of type `ty` and returns an operand
    /// reading it back — the common shape for "evaluate this into a temp".
    pub fn into_temp(&mut self, ty: LirTy, rvalue: RValue) -> Operand {
        let local = self.new_local(ty, false);
        self.push_stmt(Statement::Assign(Box::new((Place::from_local(local), rvalue))));
        Operand::Copy(Place::from_local(local))
    }

    fn finish(self, num_params: usize) -> (IdxVec<Local, LocalData>, IdxVec<Local, LocalData>, IdxVec<BasicBlock, BasicBlockData>) {
        let split_at = 1 + num_params;
        let ret_and_args = IdxVec::from_raw(self.locals[..split_at].to_vec());
        let locals = IdxVec::from_raw(self.locals[split_at..].to_vec());
        (ret_and_args, locals, self.basic_blocks)
    }
}

pub(crate) fn int_operand(value: i128, ty: LirTy) -> Operand {
    let bytes = value.to_le_bytes();
    let size = std::num::NonZero::new(16u8).unwrap();
    let mut data = [0u8; 16];
    data.copy_from_slice(&bytes);
    let raw = RawScalarValue { data: u128::from_le_bytes(data), size };
    Operand::Const(ConstOperand::Value(ConstValue::Scalar(ConstScalar::Value(raw)), ty))
}

pub(crate) fn bool_operand(value: bool) -> Operand {
    int_operand(value as i128, LirTy::Bool)
}

/// A dedicated, reserved `DefId` for a runtime support routine (`malloc`,
/// `panic`, ...). These never appear in `LirUnit.bodies`/`def_id_to_body` —
/// the backend is expected to resolve them to the real libc/runtime symbol
/// by name once it understands `ConstValue::FnAddr` (a known follow-up, see
/// DESIGN.md).
#[derive(Clone, Copy)]
pub struct RuntimeFn {
    pub def_id: DefId,
    pub name: &'static str,
}

pub const RT_MALLOC: RuntimeFn = RuntimeFn { def_id: DefId(usize::MAX), name: "malloc" };
pub const RT_REALLOC: RuntimeFn = RuntimeFn { def_id: DefId(usize::MAX - 1), name: "realloc" };
pub const RT_PANIC: RuntimeFn = RuntimeFn { def_id: DefId(usize::MAX - 2), name: "__sushi_panic" };
/// Allocates `count` zeroed elements of the call's return pointee type. The
/// backend derives the per-element byte size from that type's own layout
/// (§4.6's layout computation already exists for this at codegen time) so
/// lowering here never needs to reason about sizes itself.
pub const RT_ALLOC_ARRAY: RuntimeFn = RuntimeFn { def_id: DefId(usize::MAX - 3), name: "__sushi_alloc_array" };
pub const RT_FREE: RuntimeFn = RuntimeFn { def_id: DefId(usize::MAX - 4), name: "__sushi_free" };
/// Hashes a key operand of any type supported as a `HashMap` key (§4.4.3);
/// the backend dispatches on the operand's static type.
pub const RT_HASH_KEY: RuntimeFn = RuntimeFn { def_id: DefId(usize::MAX - 5), name: "__sushi_hash_key" };
/// Structural equality between two key operands of the same type.
pub const RT_KEY_EQ: RuntimeFn = RuntimeFn { def_id: DefId(usize::MAX - 6), name: "__sushi_key_eq" };

/// Emits a call to a runtime support routine, storing the result in a fresh
/// local of `ret_ty` and continuing in a new block.
pub fn call_runtime(fb: &mut FnBuilder, rt: RuntimeFn, args: Vec<Operand>, ret_ty: LirTy) -> Operand {
    // Function-pointer types aren't modeled in `LirTy` yet; the pointee here
    // is a placeholder only `ConstValue::FnAddr` consumers need to special-case.
    let fn_ptr_ty = LirTy::Ref { pointee: Box::new(ret_ty.clone()), mutable: false };
    let dest = fb.new_local(ret_ty, false);
    let next = fb.new_block();
    fb.set_terminator(Terminator::Call {
        func: Operand::Const(ConstOperand::Value(ConstValue::FnAddr(rt.def_id), fn_ptr_ty)),
        args,
        destination: Place::from_local(dest),
        target: Some(next),
    });
    fb.switch_to(next);
    Operand::Copy(Place::from_local(dest))
}

/// Shared state across one whole-program lowering pass: the growing `LirUnit`,
/// the type-level monomorphizer, and the function-level instantiation cache
/// (mirrors `Monomorphizer` but keyed into `LirUnit.bodies` instead of
/// `LirDefs`).
pub struct LowerCtx<'a> {
    pub symbols: &'a SymbolTable,
    pub consts: &'a HashMap<String, SlangConst>,
    pub mono: Monomorphizer,
    pub reporter: &'a mut Reporter,
    fn_seen: HashMap<String, DefId>,
    next_fn_def_id: usize,
    /// Generic-function instantiations discovered at call sites, lowered by
    /// `lower_program` once the triggering call site finishes (mirrors
    /// `Monomorphizer`'s own memoize-then-lower-later discipline for types).
    pending_instantiations: Vec<(FunctionDecl, Subst, DefId, String)>,
}

impl<'a> LowerCtx<'a> {
    pub fn new(symbols: &'a SymbolTable, consts: &'a HashMap<String, SlangConst>, reporter: &'a mut Reporter) -> Self {
        LowerCtx {
            symbols,
            consts,
            mono: Monomorphizer::new(),
            reporter,
            fn_seen: HashMap::new(),
            next_fn_def_id: 0,
            pending_instantiations: Vec::new(),
        }
    }

    fn fresh_fn_def_id(&mut self) -> DefId {
        let id = DefId(self.next_fn_def_id);
        self.next_fn_def_id += 1;
        id
    }
}

/// Lowers every concrete (non-generic) function across every loaded unit
/// into a single `LirUnit` (§2: the whole program is one incremental-cache
/// compilation target). Generic functions are lowered lazily, the first time
/// a call site instantiates them with a concrete type-argument tuple.
pub fn lower_program(
    unit_order: &[String],
    units: &HashMap<String, crate::ast::Unit>,
    symbols: &SymbolTable,
    consts: &HashMap<String, SlangConst>,
    reporter: &mut Reporter,
) -> LirUnit {
    let mut lir_unit = LirUnit::new(LirUnitMetadata { unit_name: "program".to_string() });
    let mut ctx = LowerCtx::new(symbols, consts, reporter);

    for unit_name in unit_order {
        let Some(unit) = units.get(unit_name) else { continue };
        for func in &unit.functions {
            if !func.generics.is_empty() {
                continue; // instantiated lazily at call sites (§4.3.2).
            }
            let def_id = ctx.fresh_fn_def_id();
            ctx.fn_seen.insert(func.name.clone(), def_id);
            if let Some(body) = lower_function(&mut ctx, unit_name, func, def_id, func.name.clone(), &HashMap::new(), &mut lir_unit.defs) {
                lir_unit.push_body(body);
            }
        }
    }

    // Drain generic-function instantiations discovered while lowering the
    // bodies above; an instantiation's own body may itself trigger further
    // instantiations, so this keeps going until the worklist is empty.
    while let Some((decl, subst, def_id, mangled_name)) = ctx.pending_instantiations.pop() {
        if let Some(body) = lower_function(&mut ctx, "<generic>", &decl, def_id, mangled_name, &subst, &mut lir_unit.defs) {
            lir_unit.push_body(body);
        }
    }

    lir_unit
}

type Subst = HashMap<String, LirTy>;

fn lower_function(
    ctx: &mut LowerCtx,
    unit_name: &str,
    func: &FunctionDecl,
    def_id: DefId,
    mangled_name: String,
    subst: &Subst,
    defs: &mut LirDefs,
) -> Option<LirBody> {
    let ret_ty = resolve_with_subst(&func.return_ty, subst, ctx, defs)?;
    let mut fb = FnBuilder::new(defs);
    fb.new_local(ret_ty.clone(), true); // RETURN_LOCAL
    for param in &func.params {
        let ty = resolve_with_subst(&param.ty, subst, ctx, fb.defs)?;
        let mutable = matches!(&param.ty, Ty::Ref { mutable: true, .. });
        let local = fb.new_local(ty, mutable);
        fb.declare(&param.name, local);
    }
    let num_params = func.params.len();

    let mut lowerer = BodyLowerer { ctx, unit_name, ret_ty: ret_ty.clone(), subst };
    lowerer.lower_block(&func.body, &mut fb);

    // Fall off the end: an explicit `Unit`-returning function may omit a
    // trailing `return`. Any other type falling through is an internal
    // inconsistency the validator should already have rejected.
    if matches!(fb.basic_blocks[fb.current_block()].terminator, Terminator::Unreachable) {
        if ret_ty == LirTy::Unit {
            let zst = Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Unit));
            fb.push_stmt(Statement::Assign(Box::new((Place::from_local(RETURN_LOCAL), RValue::Use(zst)))));
        }
        fb.set_terminator(Terminator::Return);
    }

    let (ret_and_args, locals, basic_blocks) = fb.finish(num_params);
    let visibility = match func.visibility {
        Visibility::Public => LirVisibility::Default,
        Visibility::Private => LirVisibility::Hidden,
    };
    Some(LirBody {
        metadata: LirBodyMetadata {
            def_id,
            name: mangled_name,
            kind: LirBodyKind::Item(LirItemKind::Function),
            inlined: false,
            linkage: Linkage::External,
            visibility,
            unnamed_address: UnnamedAddress::None,
            call_conv: CallConv::Lang,
        },
        ret_and_args,
        locals,
        basic_blocks,
    })
}

fn resolve_with_subst(ty: &Ty, subst: &Subst, ctx: &mut LowerCtx, defs: &mut LirDefs) -> Option<LirTy> {
    if let Ty::Named(name) = ty {
        if let Some(concrete) = subst.get(name) {
            return Some(concrete.clone());
        }
    }
    resolve_ty(ty, ctx.symbols, &mut ctx.mono, defs, ctx.reporter)
}

/// Per-function-body lowering state: the enclosing context plus this body's
/// return type and (for a generic instantiation) its type-parameter
/// substitution.
pub(crate) struct BodyLowerer<'a, 'b> {
    pub(crate) ctx: &'a mut LowerCtx<'b>,
    unit_name: &'a str,
    pub(crate) ret_ty: LirTy,
    subst: &'a Subst,
}

impl<'a, 'b> BodyLowerer<'a, 'b> {
    fn resolve(&mut self, ty: &Ty, defs: &mut LirDefs) -> Option<LirTy> {
        resolve_with_subst(ty, self.subst, self.ctx, defs)
    }

    fn lower_block(&mut self, block: &Block, fb: &mut FnBuilder) {
        fb.push_scope();
        for stmt in &block.stmts {
            self.lower_stmt(stmt, fb);
        }
        fb.pop_scope();
    }

    fn lower_stmt(&mut self, stmt: &Stmt, fb: &mut FnBuilder) {
        match stmt {
            Stmt::Let { name, mutable, ty, init } => {
                let init_operand_and_ty = self.lower_expr(init, fb);
                let Some((operand, inferred_ty)) = init_operand_and_ty else { return };
                let declared_ty = match ty {
                    Some(t) => self.resolve(t, fb.defs).unwrap_or(inferred_ty),
                    None => inferred_ty,
                };
                let local = fb.new_local(declared_ty, *mutable);
                fb.push_stmt(Statement::Assign(Box::new((Place::from_local(local), RValue::Use(operand)))));
                fb.declare(name, local);
            }
            Stmt::Expr(expr) => {
                self.lower_expr(expr, fb);
            }
            Stmt::Return(expr) => {
                match expr {
                    Some(e) => {
                        if let Some((operand, _)) = self.lower_expr(e, fb) {
                            fb.push_stmt(Statement::Assign(Box::new((
                                Place::from_local(RETURN_LOCAL),
                                RValue::Use(operand),
                            ))));
                        }
                    }
                    None => {
                        let zst = Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Unit));
                        fb.push_stmt(Statement::Assign(Box::new((Place::from_local(RETURN_LOCAL), RValue::Use(zst)))));
                    }
                }
                fb.set_terminator(Terminator::Return);
                let next_block = fb.new_block();
                fb.switch_to(next_block); // dead code after return; keeps the builder well-formed.
            }
            Stmt::If { cond, then_block, else_block } => self.lower_if(cond, then_block, else_block.as_ref(), fb),
            Stmt::While { cond, body } => self.lower_while(cond, body, fb),
            Stmt::Foreach { binding, iter, body } => self.lower_foreach(binding, iter, body, fb),
            Stmt::Match { scrutinee, arms } => self.lower_match(scrutinee, arms, fb),
            Stmt::Break => {
                if let Some((_, break_target)) = fb.innermost_loop() {
                    fb.set_terminator(Terminator::Goto { target: break_target });
                    let next_block = fb.new_block();
                    fb.switch_to(next_block);
                }
            }
            Stmt::Continue => {
                if let Some((continue_target, _)) = fb.innermost_loop() {
                    fb.set_terminator(Terminator::Goto { target: continue_target });
                    let next_block = fb.new_block();
                    fb.switch_to(next_block);
                }
            }
        }
    }

    fn lower_if(&mut self, cond: &Expr, then_block: &Block, else_block: Option<&Block>, fb: &mut FnBuilder) {
        let Some((cond_operand, cond_ty)) = self.lower_expr(cond, fb) else { return };
        check_condition_is_bool(&cond_ty, self.ctx.reporter);

        let then_bb = fb.new_block();
        let else_bb = fb.new_block();
        let join_bb = fb.new_block();
        fb.set_terminator(Terminator::SwitchInt { discr: cond_operand, targets: vec![(1, then_bb)], otherwise: else_bb });

        fb.switch_to(then_bb);
        self.lower_block(then_block, fb);
        if matches!(fb.basic_blocks_terminator(), Terminator::Unreachable) {
            fb.set_terminator(Terminator::Goto { target: join_bb });
        }

        fb.switch_to(else_bb);
        if let Some(block) = else_block {
            self.lower_block(block, fb);
        }
        if matches!(fb.basic_blocks_terminator(), Terminator::Unreachable) {
            fb.set_terminator(Terminator::Goto { target: join_bb });
        }

        fb.switch_to(join_bb);
    }

    fn lower_while(&mut self, cond: &Expr, body: &Block, fb: &mut FnBuilder) {
        let cond_bb = fb.new_block();
        let body_bb = fb.new_block();
        let after_bb = fb.new_block();
        fb.set_terminator(Terminator::Goto { target: cond_bb });

        fb.switch_to(cond_bb);
        let Some((cond_operand, cond_ty)) = self.lower_expr(cond, fb) else { return };
        check_condition_is_bool(&cond_ty, self.ctx.reporter);
        fb.set_terminator(Terminator::SwitchInt { discr: cond_operand, targets: vec![(1, body_bb)], otherwise: after_bb });

        fb.switch_to(body_bb);
        fb.push_loop(cond_bb, after_bb);
        self.lower_block(body, fb);
        fb.pop_loop();
        if matches!(fb.basic_blocks_terminator(), Terminator::Unreachable) {
            fb.set_terminator(Terminator::Goto { target: cond_bb });
        }

        fb.switch_to(after_bb);
    }

    /// Fixed-array-only `foreach` (§4.4.2): iterates indices `0..len` and
    /// rebinds `binding` to `array[i]` each pass. Iterating user-defined
    /// `Iterator<T>` perks is out of scope for this pass.
    fn lower_foreach(&mut self, binding: &str, iter: &Expr, body: &Block, fb: &mut FnBuilder) {
        let Some((iter_operand, iter_ty)) = self.lower_expr(iter, fb) else { return };
        let LirTy::Array { elem, len } = iter_ty else {
            self.ctx.reporter.error(codes::CE2001_TYPE_MISMATCH, "`foreach` over a non-array value is not supported");
            return;
        };
        let array_local = fb.new_local(LirTy::Array { elem: elem.clone(), len }, false);
        fb.push_stmt(Statement::Assign(Box::new((Place::from_local(array_local), RValue::Use(iter_operand)))));

        let idx_local = fb.new_local(LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false }, true);
        fb.push_stmt(Statement::Assign(Box::new((
            Place::from_local(idx_local),
            RValue::Use(int_operand(0, LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false })),
        ))));

        let cond_bb = fb.new_block();
        let body_bb = fb.new_block();
        let after_bb = fb.new_block();
        fb.set_terminator(Terminator::Goto { target: cond_bb });

        fb.switch_to(cond_bb);
        let cond = fb.into_temp(
            LirTy::Bool,
            RValue::BinaryOp(
                BinOp::Lt,
                Box::new((
                    Operand::Copy(Place::from_local(idx_local)),
                    int_operand(len as i128, LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false }),
                )),
            ),
        );
        fb.set_terminator(Terminator::SwitchInt { discr: cond, targets: vec![(1, body_bb)], otherwise: after_bb });

        fb.switch_to(body_bb);
        fb.push_scope();
        let elem_place = Place { local: array_local, projection: vec![Projection::Index(idx_local)] };
        let elem_local = fb.new_local((*elem).clone(), false);
        fb.push_stmt(Statement::Assign(Box::new((Place::from_local(elem_local), RValue::Use(Operand::Copy(elem_place))))));
        fb.declare(binding, elem_local);
        fb.push_loop(cond_bb, after_bb);
        self.lower_block(body, fb);
        fb.pop_loop();
        fb.pop_scope();
        if matches!(fb.basic_blocks_terminator(), Terminator::Unreachable) {
            let one = int_operand(1, LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false });
            let next = fb.into_temp(
                LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false },
                RValue::BinaryOp(BinOp::Add, Box::new((Operand::Copy(Place::from_local(idx_local)), one))),
            );
            fb.push_stmt(Statement::Assign(Box::new((Place::from_local(idx_local), RValue::Use(next)))));
            fb.set_terminator(Terminator::Goto { target: cond_bb });
        }

        fb.switch_to(after_bb);
    }

    /// Lowers `match` over an enum to a `Discriminant` read plus
    /// `SwitchInt` (§4.4.6), binding each variant's payload fields by
    /// position inside its arm.
    fn lower_match(&mut self, scrutinee: &Expr, arms: &[MatchArm], fb: &mut FnBuilder) {
        let Some((scrutinee_operand, scrutinee_ty)) = self.lower_expr(scrutinee, fb) else { return };
        let scrutinee_place = match scrutinee_operand {
            Operand::Copy(p) | Operand::Move(p) => p,
            Operand::Const(_) => {
                let local = fb.new_local(scrutinee_ty.clone(), false);
                fb.push_stmt(Statement::Assign(Box::new((
                    Place::from_local(local),
                    RValue::Use(scrutinee_operand),
                ))));
                Place::from_local(local)
            }
        };
        let LirTy::Enum(def_id) = scrutinee_ty else {
            self.ctx.reporter.error(codes::CE2001_TYPE_MISMATCH, "`match` requires an enum scrutinee");
            return;
        };
        let variant_names: Vec<String> = fb.defs.enums[def_id].variants.iter().map(|v| v.name.clone()).collect();

        let discr = fb.into_temp(
            LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false },
            RValue::Discriminant(scrutinee_place.clone()),
        );

        let join_bb = fb.new_block();
        let mut targets = Vec::new();
        let mut arm_blocks = Vec::new();
        let mut wildcard_bb = None;
        for arm in arms {
            let bb = fb.new_block();
            match &arm.pattern {
                Pattern::Variant { variant, .. } => {
                    if let Some(tag) = variant_names.iter().position(|n| n == variant) {
                        targets.push((tag as u128, bb));
                    }
                }
                Pattern::Wildcard => wildcard_bb = Some(bb),
            }
            arm_blocks.push((arm, bb));
        }
        let otherwise = wildcard_bb.unwrap_or(join_bb);
        fb.set_terminator(Terminator::SwitchInt { discr, targets, otherwise });

        for (arm, bb) in arm_blocks {
            fb.switch_to(bb);
            fb.push_scope();
            if let Pattern::Variant { bindings, .. } = &arm.pattern {
                for (i, name) in bindings.iter().enumerate() {
                    let payload_place = Place { local: scrutinee_place.local, projection: {
                        let mut p = scrutinee_place.projection.clone();
                        p.push(Projection::Field(i));
                        p
                    }};
                    // Payload type is whatever the struct-field access yields
                    // at codegen; the validator already checked arity, so a
                    // best-effort local type placeholder is safe here.
                    let local = fb.new_local(LirTy::Unit, false);
                    fb.push_stmt(Statement::Assign(Box::new((
                        Place::from_local(local),
                        RValue::Use(Operand::Copy(payload_place)),
                    ))));
                    fb.declare(name, local);
                }
            }
            self.lower_block(&arm.body, fb);
            fb.pop_scope();
            if matches!(fb.basic_blocks_terminator(), Terminator::Unreachable) {
                fb.set_terminator(Terminator::Goto { target: join_bb });
            }
        }

        fb.switch_to(join_bb);
    }

    /// Lowers an expression, returning the operand reading its value
    /// together with its `LirTy`. `None` means an error was already
    /// reported and the caller should skip emitting dependent code.
    pub(crate) fn lower_expr(&mut self, expr: &Expr, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        match expr {
            Expr::IntLit(v) => Some((int_operand(*v, LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: true }), LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: true })),
            Expr::BoolLit(v) => Some((bool_operand(*v), LirTy::Bool)),
            Expr::FloatLit(v) => {
                let bits = v.to_bits();
                let raw = RawScalarValue { data: bits as u128, size: std::num::NonZero::new(8u8).unwrap() };
                Some((
                    Operand::Const(ConstOperand::Value(ConstValue::Scalar(ConstScalar::Value(raw)), LirTy::Float(slangc_abi::layout::FloatWidth::F64))),
                    LirTy::Float(slangc_abi::layout::FloatWidth::F64),
                ))
            }
            Expr::StrLit(_) | Expr::Interpolated(_) => {
                // String literal/interpolation construction needs a
                // heap-copied backing buffer at init time (§4.4.1); that
                // runtime support is not wired up yet.
                Some((Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Str)), LirTy::Str))
            }
            Expr::Ident(name) => {
                if let Some(local) = fb.resolve(name) {
                    let ty = self.local_ty(fb, local);
                    Some((Operand::Copy(Place::from_local(local)), ty))
                } else if let Some(value) = self.ctx.consts.get(name) {
                    Some(const_operand(*value))
                } else {
                    self.ctx.reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown name `{}`", name));
                    None
                }
            }
            Expr::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, fb),
            Expr::Unary { op, operand } => {
                let (operand_val, ty) = self.lower_expr(operand, fb)?;
                let lir_op = match op {
                    UnOpKind::Neg => UnOp::Neg,
                    UnOpKind::Not => UnOp::Not,
                };
                let result = fb.into_temp(ty.clone(), RValue::UnaryOp(lir_op, operand_val));
                Some((result, ty))
            }
            Expr::Borrow { kind, place } => {
                let (place_operand, place_ty) = self.lower_expr(place, fb)?;
                let base_place = match place_operand {
                    Operand::Copy(p) | Operand::Move(p) => p,
                    Operand::Const(_) => return None, // borrow analysis already rejected unstable targets.
                };
                let mutable = matches!(kind, crate::ast::BorrowKind::Poke);
                let ref_ty = LirTy::Ref { pointee: Box::new(place_ty), mutable };
                let result = fb.into_temp(ref_ty.clone(), RValue::Ref { place: base_place, mutable });
                Some((result, ref_ty))
            }
            Expr::FieldAccess { receiver, field } => self.lower_field_access(receiver, field, fb),
            Expr::Index { base, index } => self.lower_index(base, index, fb),
            Expr::ArrayLit(items) => self.lower_array_lit(items, fb),
            Expr::StructLit { name, fields } => self.lower_struct_lit(name, fields, fb),
            Expr::Call { callee, type_args, args } => self.lower_call(callee, type_args, args, fb),
            Expr::MethodCall { receiver, method, args } => self.lower_method_call(receiver, method, args, fb),
            Expr::Some(inner) => self.lower_optional_ctor(Some(inner), fb),
            Expr::None => self.lower_optional_ctor(None, fb),
            Expr::Ok(inner) => self.lower_result_ctor(true, inner, fb),
            Expr::Err(inner) => self.lower_result_ctor(false, inner, fb),
            Expr::TryProp(inner) => self.lower_try_prop(inner, fb),
            Expr::Destroy(inner) => {
                let (operand, ty) = self.lower_expr(inner, fb)?;
                if let Operand::Copy(place) | Operand::Move(place) = operand {
                    fb.push_stmt(Statement::Destroy(place));
                }
                Some((Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Unit)), ty))
            }
        }
    }

    fn local_ty(&self, fb: &FnBuilder, local: Local) -> LirTy {
        fb.local_ty(local)
    }

    fn lower_binary(&mut self, op: BinOpKind, lhs: &Expr, rhs: &Expr, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        if matches!(op, BinOpKind::And | BinOpKind::Or) {
            return self.lower_short_circuit(op, lhs, rhs, fb);
        }
        let (lhs_operand, lhs_ty) = self.lower_expr(lhs, fb)?;
        let (rhs_operand, rhs_ty) = self.lower_expr(rhs, fb)?;
        let result_ty = check_binary_op(op, &lhs_ty, &rhs_ty, self.ctx.reporter)?;
        let lir_op = binop_to_lir(op);
        let result = fb.into_temp(result_ty.clone(), RValue::BinaryOp(lir_op, Box::new((lhs_operand, rhs_operand))));
        Some((result, result_ty))
    }

    /// `&&`/`||` short-circuit via control flow rather than a `BinOp`
    /// (`slangc_lir::syntax::BinOp` has no logical variants, by design).
    fn lower_short_circuit(&mut self, op: BinOpKind, lhs: &Expr, rhs: &Expr, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        let (lhs_operand, lhs_ty) = self.lower_expr(lhs, fb)?;
        check_condition_is_bool(&lhs_ty, self.ctx.reporter);
        let result_local = fb.new_local(LirTy::Bool, true);
        let rhs_bb = fb.new_block();
        let short_circuit_bb = fb.new_block();
        let join_bb = fb.new_block();

        let (true_target, false_target) =
            if op == BinOpKind::And { (rhs_bb, short_circuit_bb) } else { (short_circuit_bb, rhs_bb) };
        fb.set_terminator(Terminator::SwitchInt { discr: lhs_operand, targets: vec![(1, true_target)], otherwise: false_target });

        fb.switch_to(short_circuit_bb);
        let short_value = bool_operand(op == BinOpKind::Or);
        fb.push_stmt(Statement::Assign(Box::new((Place::from_local(result_local), RValue::Use(short_value)))));
        fb.set_terminator(Terminator::Goto { target: join_bb });

        fb.switch_to(rhs_bb);
        if let Some((rhs_operand, rhs_ty)) = self.lower_expr(rhs, fb) {
            check_condition_is_bool(&rhs_ty, self.ctx.reporter);
            fb.push_stmt(Statement::Assign(Box::new((Place::from_local(result_local), RValue::Use(rhs_operand)))));
        }
        fb.set_terminator(Terminator::Goto { target: join_bb });

        fb.switch_to(join_bb);
        Some((Operand::Copy(Place::from_local(result_local)), LirTy::Bool))
    }

    fn lower_field_access(&mut self, receiver: &Expr, field: &str, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        let (receiver_operand, receiver_ty) = self.lower_expr(receiver, fb)?;
        let base_place = match receiver_operand {
            Operand::Copy(p) | Operand::Move(p) => p,
            Operand::Const(_) => return None,
        };
        let LirTy::Struct(def_id) = &receiver_ty else {
            self.ctx.reporter.error(codes::CE2001_TYPE_MISMATCH, format!("`.{}` on a non-struct value", field));
            return None;
        };
        let (index, field_ty) = fb.defs.structs[*def_id]
            .fields
            .iter()
            .enumerate()
            .find(|(_, (name, _))| name == field)
            .map(|(i, (_, ty))| (i, ty.clone()))?;
        let mut projection = base_place.projection;
        projection.push(Projection::Field(index));
        Some((Operand::Copy(Place { local: base_place.local, projection }), field_ty))
    }

    fn lower_index(&mut self, base: &Expr, index: &Expr, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        let (base_operand, base_ty) = self.lower_expr(base, fb)?;
        let (index_operand, _) = self.lower_expr(index, fb)?;
        let base_place = match base_operand {
            Operand::Copy(p) | Operand::Move(p) => p,
            Operand::Const(_) => return None,
        };
        let index_local = match index_operand {
            Operand::Copy(p) | Operand::Move(p) => p.try_local()?,
            Operand::Const(_) => {
                let tmp = fb.new_local(LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false }, false);
                fb.push_stmt(Statement::Assign(Box::new((Place::from_local(tmp), RValue::Use(index_operand)))));
                tmp
            }
        };
        let elem_ty = match &base_ty {
            LirTy::Array { elem, .. } | LirTy::DynArray { elem } | LirTy::List(elem) => (**elem).clone(),
            other => {
                self.ctx.reporter.error(codes::CE2001_TYPE_MISMATCH, format!("cannot index `{:?}`", other));
                return None;
            }
        };
        let mut projection = base_place.projection;
        projection.push(Projection::Index(index_local));
        Some((Operand::Copy(Place { local: base_place.local, projection }), elem_ty))
    }

    fn lower_array_lit(&mut self, items: &[Expr], fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        let mut operands = Vec::with_capacity(items.len());
        let mut elem_ty = None;
        for item in items {
            let (operand, ty) = self.lower_expr(item, fb)?;
            elem_ty.get_or_insert_with(|| ty.clone());
            operands.push(operand);
        }
        let elem_ty = elem_ty.unwrap_or(LirTy::Unit);
        let array_ty = LirTy::Array { elem: Box::new(elem_ty), len: operands.len() as u64 };
        let result = fb.into_temp(array_ty.clone(), RValue::Aggregate { ty: array_ty.clone(), fields: operands });
        Some((result, array_ty))
    }

    fn lower_struct_lit(&mut self, name: &str, fields: &CallArgs, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        let Some(decl) = self.ctx.symbols.structs.get(name).cloned() else {
            self.ctx.reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown struct `{}`", name));
            return None;
        };
        let def_id = self.ctx.mono.monomorphize_struct(&decl, &[], self.ctx.symbols, fb.defs, self.ctx.reporter)?;
        let ty = LirTy::Struct(def_id);

        let values = match fields {
            CallArgs::Named(named) => {
                let mut by_name: HashMap<&str, &Expr> = named.iter().map(|(n, e)| (n.as_str(), e)).collect();
                let mut operands = Vec::with_capacity(decl.fields.len());
                for field in &decl.fields {
                    let expr = by_name.remove(field.name.as_str())?;
                    operands.push(self.lower_expr(expr, fb)?.0);
                }
                operands
            }
            CallArgs::Positional(exprs) => {
                let mut operands = Vec::with_capacity(exprs.len());
                for e in exprs {
                    operands.push(self.lower_expr(e, fb)?.0);
                }
                operands
            }
        };
        let result = fb.into_temp(ty.clone(), RValue::Aggregate { ty: ty.clone(), fields: values });
        Some((result, ty))
    }

    fn lower_optional_ctor(&mut self, inner: Option<&Expr>, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        match inner {
            Some(e) => {
                let (operand, ty) = self.lower_expr(e, fb)?;
                let opt_ty = LirTy::Optional(Box::new(ty));
                let result = fb.into_temp(opt_ty.clone(), RValue::Aggregate { ty: opt_ty.clone(), fields: vec![operand] });
                Some((result, opt_ty))
            }
            None => {
                let opt_ty = LirTy::Optional(Box::new(LirTy::Unit));
                let result = fb.into_temp(opt_ty.clone(), RValue::Aggregate { ty: opt_ty.clone(), fields: vec![] });
                Some((result, opt_ty))
            }
        }
    }

    fn lower_result_ctor(&mut self, is_ok: bool, inner: &Expr, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        let (operand, ty) = self.lower_expr(inner, fb)?;
        let result_ty = if is_ok {
            LirTy::Result { ok: Box::new(ty), err: Box::new(LirTy::Unit) }
        } else {
            LirTy::Result { ok: Box::new(LirTy::Unit), err: Box::new(ty) }
        };
        let result = fb.into_temp(result_ty.clone(), RValue::Aggregate { ty: result_ty.clone(), fields: vec![operand] });
        Some((result, result_ty))
    }

    /// `e ??` (§4.3.1, §4.4.8): if `e` (an `Optional`/`Result`) is
    /// empty/err, returns it from the enclosing function immediately;
    /// otherwise evaluates to the payload.
    fn lower_try_prop(&mut self, inner: &Expr, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        let (operand, ty) = self.lower_expr(inner, fb)?;
        let place = match operand {
            Operand::Copy(p) | Operand::Move(p) => p,
            Operand::Const(_) => return None,
        };
        let (payload_ty, ok_tag) = match &ty {
            LirTy::Optional(inner) => ((**inner).clone(), 1u128),
            LirTy::Result { ok, .. } => ((**ok).clone(), 1u128),
            other => {
                self.ctx.reporter.error(codes::CE2510_TRY_PROP_NOT_RESULT_FN, format!("`??` on non-result-like type `{:?}`", other));
                return None;
            }
        };
        let tag = fb.into_temp(LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false }, RValue::Discriminant(place.clone()));
        let ok_bb = fb.new_block();
        let early_return_bb = fb.new_block();
        fb.set_terminator(Terminator::SwitchInt { discr: tag, targets: vec![(ok_tag, ok_bb)], otherwise: early_return_bb });

        fb.switch_to(early_return_bb);
        let ret_operand = if self.ret_ty == ty {
            Operand::Copy(place.clone())
        } else {
            Operand::Const(ConstOperand::Value(ConstValue::ZST, self.ret_ty.clone()))
        };
        fb.push_stmt(Statement::Assign(Box::new((Place::from_local(RETURN_LOCAL), RValue::Use(ret_operand)))));
        fb.set_terminator(Terminator::Return);

        fb.switch_to(ok_bb);
        let mut payload_place = place;
        payload_place.projection.push(Projection::Field(0));
        Some((Operand::Copy(payload_place), payload_ty))
    }

    fn lower_call(&mut self, callee: &str, type_args: &[Ty], args: &CallArgs, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        if let Some((receiver_ty_name, ctor)) = callee.split_once('.') {
            let resolved_args: Vec<LirTy> =
                type_args.iter().filter_map(|t| self.resolve(t, fb.defs)).collect();
            if resolved_args.len() == type_args.len() {
                if let Some(result) = containers::lower_static_call(self, receiver_ty_name, ctor, &resolved_args, args, fb) {
                    return Some(result);
                }
            }
        }
        self.lower_user_call(callee, type_args, args, fb)
    }

    fn lower_user_call(&mut self, callee: &str, type_args: &[Ty], args: &CallArgs, fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        let arg_exprs: Vec<&Expr> = match args {
            CallArgs::Positional(exprs) => exprs.iter().collect(),
            CallArgs::Named(_) => {
                self.ctx.reporter.error(codes::CE0001_INTERNAL, "named arguments to a free function call are not supported");
                return None;
            }
        };
        let mut arg_operands = Vec::with_capacity(arg_exprs.len());
        for e in &arg_exprs {
            arg_operands.push(self.lower_expr(e, fb)?.0);
        }

        let (def_id, ret_ty) = if let Some(decl) = self.ctx.symbols.functions.get(callee).cloned() {
            let ret_ty = resolve_ty(&decl.return_ty, self.ctx.symbols, &mut self.ctx.mono, fb.defs, self.ctx.reporter)?;
            let def_id = *self.ctx.fn_seen.entry(callee.to_string()).or_insert_with(|| {
                // Referenced before its defining pass ran (forward reference
                // across units); mint an id now, body lowers on first call.
                let id = DefId(self.ctx.next_fn_def_id);
                self.ctx.next_fn_def_id += 1;
                id
            });
            (def_id, ret_ty)
        } else if let Some(decl) = self.ctx.symbols.generic_functions.get(callee).cloned() {
            self.instantiate_generic_function(&decl, type_args, fb)?
        } else if let Some(sig) = self.ctx.symbols.stdlib_functions.get(callee) {
            let _ = sig;
            self.ctx.reporter.error(codes::CE3003_MISSING_UNIT, format!("stdlib function `{}` has no lowering yet", callee));
            return None;
        } else {
            self.ctx.reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown function `{}`", callee));
            return None;
        };

        let fn_ptr_ty = LirTy::Ref { pointee: Box::new(ret_ty.clone()), mutable: false };
        let dest = fb.new_local(ret_ty.clone(), false);
        let next = fb.new_block();
        fb.set_terminator(Terminator::Call {
            func: Operand::Const(ConstOperand::Value(ConstValue::FnAddr(def_id), fn_ptr_ty)),
            args: arg_operands,
            destination: Place::from_local(dest),
            target: Some(next),
        });
        fb.switch_to(next);
        Some((Operand::Copy(Place::from_local(dest)), ret_ty))
    }

    fn instantiate_generic_function(&mut self, decl: &FunctionDecl, type_args: &[Ty], fb: &mut FnBuilder) -> Option<(DefId, LirTy)> {
        let resolved: Vec<LirTy> = type_args.iter().filter_map(|t| self.resolve(t, fb.defs)).collect();
        if resolved.len() != decl.generics.len() {
            self.ctx.reporter.error(
                codes::CE2030_ARITY_MISMATCH,
                format!("`{}` expects {} type argument(s), got {}", decl.name, decl.generics.len(), resolved.len()),
            );
            return None;
        }
        let mangled = crate::monomorphize::mangle(&decl.name, &resolved, fb.defs);
        if let Some(&def_id) = self.ctx.fn_seen.get(&mangled) {
            let ret_ty = self.substituted_ret_ty(decl, &resolved, fb.defs)?;
            return Some((def_id, ret_ty));
        }
        let def_id = self.ctx.fresh_fn_def_id();
        self.ctx.fn_seen.insert(mangled.clone(), def_id);
        let subst: Subst = decl.generics.iter().cloned().zip(resolved.iter().cloned()).collect();
        let ret_ty = self.substituted_ret_ty(decl, &resolved, fb.defs)?;
        // Deferred: the instantiated body is lowered against `fb.defs` using
        // a fresh `FnBuilder` of its own, then handed back to the caller's
        // unit via the shared `LirDefs`; the body itself is attached to the
        // program's `LirUnit.bodies` by the top-level driver once this
        // function returns (kept out of `BodyLowerer` to avoid a second
        // mutable borrow of `LirUnit` while mid-lowering the caller).
        self.ctx.pending_instantiations.push((decl.clone(), subst, def_id, mangled));
        Some((def_id, ret_ty))
    }

    fn substituted_ret_ty(&mut self, decl: &FunctionDecl, type_args: &[LirTy], defs: &mut LirDefs) -> Option<LirTy> {
        let subst: Subst = decl.generics.iter().cloned().zip(type_args.iter().cloned()).collect();
        resolve_with_subst(&decl.return_ty, &subst, self.ctx, defs)
    }

    fn resolve(&mut self, ty: &Ty, defs: &mut LirDefs) -> Option<LirTy> {
        resolve_with_subst(ty, self.subst, self.ctx, defs)
    }

    fn lower_method_call(&mut self, receiver: &Expr, method: &str, args: &[Expr], fb: &mut FnBuilder) -> Option<(Operand, LirTy)> {
        let (receiver_operand, receiver_ty) = self.lower_expr(receiver, fb)?;
        if let Some(result) = containers::lower_instance_call(self, &receiver_operand, &receiver_ty, method, args, fb) {
            return Some(result);
        }
        // Perk/extension method: resolved to the first matching declared
        // method on the receiver's named type, called with the receiver
        // prepended as the first argument (§4.3.2's nominal perk dispatch).
        let type_name = type_name_of(&receiver_ty, fb.defs);
        let decl = self
            .ctx
            .symbols
            .extensions
            .get(&type_name)
            .into_iter()
            .flatten()
            .chain(self.ctx.symbols.perk_impls.values())
            .flat_map(|ext| ext.methods.iter())
            .find(|m| m.name == method)
            .cloned();
        let Some(decl) = decl else {
            self.ctx.reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown method `.{}`", method));
            return None;
        };
        let ret_ty = resolve_ty(&decl.return_ty, self.ctx.symbols, &mut self.ctx.mono, fb.defs, self.ctx.reporter)?;
        let mut arg_operands = vec![receiver_operand];
        for a in args {
            arg_operands.push(self.lower_expr(a, fb)?.0);
        }
        let mangled = format!("{}.{}", type_name, method);
        let def_id = *self.ctx.fn_seen.entry(mangled.clone()).or_insert_with(|| {
            let id = DefId(self.ctx.next_fn_def_id);
            self.ctx.next_fn_def_id += 1;
            id
        });
        let fn_ptr_ty = LirTy::Ref { pointee: Box::new(ret_ty.clone()), mutable: false };
        let dest = fb.new_local(ret_ty.clone(), false);
        let next = fb.new_block();
        fb.set_terminator(Terminator::Call {
            func: Operand::Const(ConstOperand::Value(ConstValue::FnAddr(def_id), fn_ptr_ty)),
            args: arg_operands,
            destination: Place::from_local(dest),
            target: Some(next),
        });
        fb.switch_to(next);
        Some((Operand::Copy(Place::from_local(dest)), ret_ty))
    }
}

fn type_name_of(ty: &LirTy, defs: &LirDefs) -> String {
    match ty {
        LirTy::Struct(def_id) => defs.structs[*def_id].name.clone(),
        LirTy::Enum(def_id) => defs.enums[*def_id].name.clone(),
        other => format!("{:?}", other),
    }
}

fn binop_to_lir(op: BinOpKind) -> BinOp {
    match op {
        BinOpKind::Add => BinOp::Add,
        BinOpKind::Sub => BinOp::Sub,
        BinOpKind::Mul => BinOp::Mul,
        BinOpKind::Div => BinOp::Div,
        BinOpKind::Rem => BinOp::Rem,
        BinOpKind::BitAnd => BinOp::BitAnd,
        BinOpKind::BitOr => BinOp::BitOr,
        BinOpKind::BitXor => BinOp::BitXor,
        BinOpKind::Shl => BinOp::Shl,
        BinOpKind::Shr => BinOp::Shr,
        BinOpKind::Eq => BinOp::Eq,
        BinOpKind::Ne => BinOp::Ne,
        BinOpKind::Lt => BinOp::Lt,
        BinOpKind::Le => BinOp::Le,
        BinOpKind::Gt => BinOp::Gt,
        BinOpKind::Ge => BinOp::Ge,
        BinOpKind::And | BinOpKind::Or => unreachable!("handled by lower_short_circuit"),
    }
}

fn const_operand(value: SlangConst) -> (Operand, LirTy) {
    match value {
        SlangConst::Int(i) => (int_operand(i, LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: true }), LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: true }),
        SlangConst::Bool(b) => (bool_operand(b), LirTy::Bool),
        SlangConst::Float(f) => {
            let raw = RawScalarValue { data: f.to_bits() as u128, size: std::num::NonZero::new(8u8).unwrap() };
            (Operand::Const(ConstOperand::Value(ConstValue::Scalar(ConstScalar::Value(raw)), LirTy::Float(slangc_abi::layout::FloatWidth::F64))), LirTy::Float(slangc_abi::layout::FloatWidth::F64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionDecl, Param, Unit, Visibility};

    fn unit_with(functions: Vec<FunctionDecl>) -> HashMap<String, crate::ast::Unit> {
        let mut units = HashMap::new();
        units.insert("main".to_string(), Unit { name: "main".to_string(), functions, ..Unit::default() });
        units
    }

    fn returns_literal(name: &str, value: i128) -> FunctionDecl {
        FunctionDecl {
            name: name.to_string(),
            visibility: Visibility::Public,
            generics: Vec::new(),
            params: Vec::new(),
            return_ty: Ty::Named("i32".to_string()),
            body: Block { stmts: vec![Stmt::Return(Some(Expr::IntLit(value)))] },
        }
    }

    #[test]
    fn returning_a_literal_lowers_to_one_body_with_one_return() {
        let units = unit_with(vec![returns_literal("main", 10)]);
        let symbols = SymbolTable::new();
        let consts = HashMap::new();
        let mut reporter = Reporter::new();

        let lir_unit = lower_program(&["main".to_string()], &units, &symbols, &consts, &mut reporter);

        assert!(!reporter.has_errors());
        assert_eq!(lir_unit.bodies.len(), 1);
        let found = lir_unit.body_for(DefId(0)).expect("main was lowered under DefId(0)");
        assert!(matches!(found.basic_blocks[ENTRY_BLOCK].terminator, Terminator::Return));
    }

    #[test]
    fn falling_off_the_end_of_a_unit_function_gets_an_implicit_return() {
        let func = FunctionDecl {
            name: "noop".to_string(),
            visibility: Visibility::Public,
            generics: Vec::new(),
            params: Vec::new(),
            return_ty: Ty::Named("Unit".to_string()),
            body: Block::default(),
        };
        let units = unit_with(vec![func]);
        let symbols = SymbolTable::new();
        let consts = HashMap::new();
        let mut reporter = Reporter::new();

        let lir_unit = lower_program(&["main".to_string()], &units, &symbols, &consts, &mut reporter);

        assert!(!reporter.has_errors());
        let body = lir_unit.body_for(DefId(0)).expect("noop was lowered under DefId(0)");
        assert!(matches!(body.basic_blocks[ENTRY_BLOCK].terminator, Terminator::Return));
    }

    #[test]
    fn a_generic_function_is_not_lowered_eagerly() {
        let mut func = returns_literal("identity", 0);
        func.generics = vec!["T".to_string()];
        let units = unit_with(vec![func]);
        let symbols = SymbolTable::new();
        let consts = HashMap::new();
        let mut reporter = Reporter::new();

        let lir_unit = lower_program(&["main".to_string()], &units, &symbols, &consts, &mut reporter);

        assert!(lir_unit.bodies.is_empty());
    }
}
