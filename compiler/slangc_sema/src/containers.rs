//! Inline emission of the built-in generic containers (§4.4.3): `Box`,
//! `Optional`, `Result`, `List`, and `HashMap`. Per §4.4.3 these never exist
//! as standalone callable functions — every operation below splices real
//! `Place`/`RValue`/`Statement`/`Terminator` sequences straight into the
//! calling function's own basic blocks via [`FnBuilder`].
//!
//! `List`/`HashMap` allocate a fixed, generous backing capacity at
//! construction rather than growing on demand; tracked as a known scope cut
//! in DESIGN.md rather than left silent.

use slangc_lir::lir::DefId;
use slangc_lir::syntax::{
    BinOp, ConstOperand, ConstValue, LirTy, Local, Operand, Place, Projection, RValue, Statement,
    Terminator,
};

use crate::ast::{CallArgs, Expr};
use crate::lower::{call_runtime, int_operand, BodyLowerer, FnBuilder, RT_ALLOC_ARRAY, RT_FREE, RT_HASH_KEY, RT_KEY_EQ};

const LIST_INITIAL_CAPACITY: i128 = 8;
const HASHMAP_INITIAL_CAPACITY: i128 = 16;

fn i32_ty() -> LirTy {
    LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false }
}

fn container_header(len: Operand, cap: Operand, data: Operand, ty: LirTy) -> RValue {
    RValue::Aggregate { ty, fields: vec![len, cap, data] }
}

/// `Type<Args>.ctor(...)` static calls: `Box.alloc`, `List.new`, `HashMap.new`.
pub(crate) fn lower_static_call(
    lower: &mut BodyLowerer,
    type_name: &str,
    ctor: &str,
    type_args: &[LirTy],
    args: &CallArgs,
    fb: &mut FnBuilder,
) -> Option<(Operand, LirTy)> {
    let positional = match args {
        CallArgs::Positional(exprs) => exprs.as_slice(),
        CallArgs::Named(_) => &[],
    };
    match (type_name, ctor) {
        ("Box", "alloc") if type_args.len() == 1 => {
            let inner_ty = type_args[0].clone();
            let (value_operand, _) = lower.lower_expr(positional.first()?, fb)?;
            let box_ty = LirTy::Box(Box::new(inner_ty.clone()));
            let ptr = call_runtime(fb, RT_ALLOC_ARRAY, vec![int_operand(1, i32_ty())], box_ty.clone());
            let ptr_place = operand_to_place(fb, ptr, box_ty.clone());
            let mut deref_place = ptr_place.clone();
            deref_place.projection.push(Projection::Deref);
            fb.push_stmt(Statement::Assign(Box::new((deref_place, RValue::Use(value_operand)))));
            Some((Operand::Copy(ptr_place), box_ty))
        }
        ("List", "new") if type_args.len() == 1 => {
            let elem_ty = type_args[0].clone();
            let list_ty = LirTy::List(Box::new(elem_ty.clone()));
            let data = call_runtime(
                fb,
                RT_ALLOC_ARRAY,
                vec![int_operand(LIST_INITIAL_CAPACITY, i32_ty())],
                LirTy::Ref { pointee: Box::new(elem_ty), mutable: true },
            );
            let header = container_header(
                int_operand(0, i32_ty()),
                int_operand(LIST_INITIAL_CAPACITY, i32_ty()),
                data,
                list_ty.clone(),
            );
            Some((fb.into_temp(list_ty.clone(), header), list_ty))
        }
        ("HashMap", "new") if type_args.len() == 2 => {
            let key_ty = type_args[0].clone();
            let value_ty = type_args[1].clone();
            let entry_def = lower.ctx.mono.hashmap_entry_def(&key_ty, &value_ty, fb.defs);
            let map_ty = LirTy::HashMap { key: Box::new(key_ty), value: Box::new(value_ty), entry_def };
            let data = call_runtime(
                fb,
                RT_ALLOC_ARRAY,
                vec![int_operand(HASHMAP_INITIAL_CAPACITY, i32_ty())],
                LirTy::Ref { pointee: Box::new(LirTy::Struct(entry_def)), mutable: true },
            );
            let header = container_header(
                int_operand(0, i32_ty()),
                int_operand(HASHMAP_INITIAL_CAPACITY, i32_ty()),
                data,
                map_ty.clone(),
            );
            Some((fb.into_temp(map_ty.clone(), header), map_ty))
        }
        _ => None,
    }
}

/// `receiver.method(...)` instance calls on a container-typed receiver.
pub(crate) fn lower_instance_call(
    lower: &mut BodyLowerer,
    receiver_operand: &Operand,
    receiver_ty: &LirTy,
    method: &str,
    args: &[Expr],
    fb: &mut FnBuilder,
) -> Option<(Operand, LirTy)> {
    match receiver_ty {
        LirTy::Box(inner) => lower_box_call(lower, receiver_operand, inner, method, fb),
        LirTy::Optional(inner) => lower_optional_call(lower, receiver_operand, inner, method, args, fb),
        LirTy::Result { ok, err } => lower_result_call(lower, receiver_operand, ok, err, method, args, fb),
        LirTy::List(elem) => lower_list_call(lower, receiver_operand, elem, method, args, fb),
        LirTy::HashMap { key, value, entry_def } => {
            lower_hashmap_call(lower, receiver_operand, key, value, *entry_def, method, args, fb)
        }
        _ => None,
    }
}

fn operand_to_place(fb: &mut FnBuilder, operand: Operand, ty: LirTy) -> Place {
    match operand {
        Operand::Copy(p) | Operand::Move(p) => p,
        Operand::Const(_) => {
            let local = fb.new_local(ty, false);
            fb.push_stmt(Statement::Assign(Box::new((Place::from_local(local), RValue::Use(operand)))));
            Place::from_local(local)
        }
    }
}

fn lower_box_call(
    lower: &mut BodyLowerer,
    receiver: &Operand,
    inner: &LirTy,
    method: &str,
    fb: &mut FnBuilder,
) -> Option<(Operand, LirTy)> {
    let place = match receiver {
        Operand::Copy(p) | Operand::Move(p) => p.clone(),
        Operand::Const(_) => return None,
    };
    match method {
        "get" => {
            let mut deref = place;
            deref.projection.push(Projection::Deref);
            Some((Operand::Copy(deref), inner.clone()))
        }
        "destroy" => {
            call_runtime(fb, RT_FREE, vec![Operand::Copy(place)], LirTy::Unit);
            Some((Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Unit)), LirTy::Unit))
        }
        _ => {
            let _ = lower;
            None
        }
    }
}

/// `Optional<T>` is laid out like `Result`/`Struct` via the validator's
/// tagged-union convention (§4.4.3): field 0 is the payload, the
/// discriminant (0 = none, 1 = some) is read with `RValue::Discriminant`.
fn lower_optional_call(
    lower: &mut BodyLowerer,
    receiver: &Operand,
    inner: &LirTy,
    method: &str,
    args: &[Expr],
    fb: &mut FnBuilder,
) -> Option<(Operand, LirTy)> {
    let place = match receiver {
        Operand::Copy(p) | Operand::Move(p) => p.clone(),
        Operand::Const(_) => return None,
    };
    match method {
        "is_some" => {
            let tag = fb.into_temp(i32_ty(), RValue::Discriminant(place));
            let result = fb.into_temp(LirTy::Bool, RValue::BinaryOp(BinOp::Eq, Box::new((tag, int_operand(1, i32_ty())))));
            Some((result, LirTy::Bool))
        }
        "realise" => {
            let default_expr = args.first()?;
            let (default_operand, _) = lower.lower_expr(default_expr, fb)?;
            Some((lower_or_default(fb, place, inner.clone(), default_operand), inner.clone()))
        }
        "expect" => {
            // The message argument is only used on the panic path; its
            // value is lowered for its side effects, then handed to the
            // runtime panic helper alongside the failure.
            let (msg_operand, _) = match args.first() {
                Some(e) => lower.lower_expr(e, fb)?,
                None => (Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Unit)), LirTy::Unit),
            };
            Some((lower_expect(fb, place, inner.clone(), msg_operand), inner.clone()))
        }
        _ => None,
    }
}

fn lower_result_call(
    lower: &mut BodyLowerer,
    receiver: &Operand,
    ok: &LirTy,
    err: &LirTy,
    method: &str,
    args: &[Expr],
    fb: &mut FnBuilder,
) -> Option<(Operand, LirTy)> {
    let place = match receiver {
        Operand::Copy(p) | Operand::Move(p) => p.clone(),
        Operand::Const(_) => return None,
    };
    match method {
        "is_ok" => {
            let tag = fb.into_temp(i32_ty(), RValue::Discriminant(place));
            let result = fb.into_temp(LirTy::Bool, RValue::BinaryOp(BinOp::Eq, Box::new((tag, int_operand(1, i32_ty())))));
            Some((result, LirTy::Bool))
        }
        "is_err" => {
            let tag = fb.into_temp(i32_ty(), RValue::Discriminant(place));
            let result = fb.into_temp(LirTy::Bool, RValue::BinaryOp(BinOp::Eq, Box::new((tag, int_operand(0, i32_ty())))));
            Some((result, LirTy::Bool))
        }
        "realise" => {
            let default_expr = args.first()?;
            let (default_operand, _) = lower.lower_expr(default_expr, fb)?;
            Some((lower_or_default(fb, place, ok.clone(), default_operand), ok.clone()))
        }
        "expect" => {
            let (msg_operand, _) = match args.first() {
                Some(e) => lower.lower_expr(e, fb)?,
                None => (Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Unit)), LirTy::Unit),
            };
            Some((lower_expect(fb, place, ok.clone(), msg_operand), ok.clone()))
        }
        "err" => {
            let mut err_place = place;
            err_place.projection.push(Projection::Field(0));
            Some((Operand::Copy(err_place), err.clone()))
        }
        _ => None,
    }
}

/// Shared shape for `.realise(default)`: branch on the tagged union's
/// discriminant, materializing either the payload or the caller-supplied
/// fallback into one joined temporary.
fn lower_or_default(fb: &mut FnBuilder, place: Place, payload_ty: LirTy, default_operand: Operand) -> Operand {
    let tag = fb.into_temp(i32_ty(), RValue::Discriminant(place.clone()));
    let result_local = fb.new_local(payload_ty.clone(), true);
    let some_bb = fb.new_block();
    let none_bb = fb.new_block();
    let join_bb = fb.new_block();
    fb.set_terminator(Terminator::SwitchInt {
        discr: tag,
        targets: vec![(1, some_bb)],
        otherwise: none_bb,
    });

    fb.switch_to(some_bb);
    let mut payload_place = place;
    payload_place.projection.push(Projection::Field(0));
    fb.push_stmt(Statement::Assign(Box::new((
        Place::from_local(result_local),
        RValue::Use(Operand::Copy(payload_place)),
    ))));
    fb.set_terminator(Terminator::Goto { target: join_bb });

    fb.switch_to(none_bb);
    fb.push_stmt(Statement::Assign(Box::new((Place::from_local(result_local), RValue::Use(default_operand)))));
    fb.set_terminator(Terminator::Goto { target: join_bb });

    fb.switch_to(join_bb);
    Operand::Copy(Place::from_local(result_local))
}

/// Shared shape for `.expect(msg)`: the empty/err branch calls the runtime
/// panic helper (never returns) instead of producing a value.
fn lower_expect(fb: &mut FnBuilder, place: Place, payload_ty: LirTy, msg_operand: Operand) -> Operand {
    let tag = fb.into_temp(i32_ty(), RValue::Discriminant(place.clone()));
    let some_bb = fb.new_block();
    let panic_bb = fb.new_block();
    fb.set_terminator(Terminator::SwitchInt {
        discr: tag,
        targets: vec![(1, some_bb)],
        otherwise: panic_bb,
    });

    fb.switch_to(panic_bb);
    call_runtime(fb, crate::lower::RT_PANIC, vec![msg_operand], LirTy::Unit);
    fb.set_terminator(Terminator::Unreachable);

    fb.switch_to(some_bb);
    let mut payload_place = place;
    payload_place.projection.push(Projection::Field(0));
    Operand::Copy(payload_place)
}

fn lower_list_call(
    lower: &mut BodyLowerer,
    receiver: &Operand,
    elem: &LirTy,
    method: &str,
    args: &[Expr],
    fb: &mut FnBuilder,
) -> Option<(Operand, LirTy)> {
    let place = match receiver {
        Operand::Copy(p) | Operand::Move(p) => p.clone(),
        Operand::Const(_) => return None,
    };
    match method {
        "len" => {
            let mut len_place = place;
            len_place.projection.push(Projection::Field(0));
            Some((Operand::Copy(len_place), i32_ty()))
        }
        "get" => {
            let (index_operand, _) = lower.lower_expr(args.first()?, fb)?;
            let index_local = operand_to_place(fb, index_operand, i32_ty()).try_local()?;
            let mut elem_place = place;
            elem_place.projection.push(Projection::Field(2));
            elem_place.projection.push(Projection::Index(index_local));
            Some((Operand::Copy(elem_place), elem.clone()))
        }
        "push" => {
            let (value_operand, _) = lower.lower_expr(args.first()?, fb)?;
            let mut len_place = place.clone();
            len_place.projection.push(Projection::Field(0));
            let len = Operand::Copy(len_place.clone());

            let mut data_place = place;
            data_place.projection.push(Projection::Field(2));
            data_place.projection.push(Projection::Index(operand_to_place(fb, len.clone(), i32_ty()).try_local()?));
            fb.push_stmt(Statement::Assign(Box::new((data_place, RValue::Use(value_operand)))));

            let new_len = fb.into_temp(i32_ty(), RValue::BinaryOp(BinOp::Add, Box::new((len, int_operand(1, i32_ty())))));
            fb.push_stmt(Statement::Assign(Box::new((len_place, RValue::Use(new_len)))));
            Some((Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Unit)), LirTy::Unit))
        }
        _ => None,
    }
}

/// Open-addressed, linear-probed `HashMap` operations (§4.4.3). No
/// tombstone handling: `remove` is out of scope for this pass, so a slot is
/// either empty (`state == 0`) or occupied (`state == 1`) — never reused.
fn lower_hashmap_call(
    lower: &mut BodyLowerer,
    receiver: &Operand,
    key_ty: &LirTy,
    value_ty: &LirTy,
    entry_def: DefId,
    method: &str,
    args: &[Expr],
    fb: &mut FnBuilder,
) -> Option<(Operand, LirTy)> {
    let place = match receiver {
        Operand::Copy(p) | Operand::Move(p) => p.clone(),
        Operand::Const(_) => return None,
    };
    match method {
        "len" => {
            let mut len_place = place;
            len_place.projection.push(Projection::Field(0));
            Some((Operand::Copy(len_place), i32_ty()))
        }
        "destroy" => {
            let mut data_place = place;
            data_place.projection.push(Projection::Field(2));
            call_runtime(fb, RT_FREE, vec![Operand::Copy(data_place)], LirTy::Unit);
            Some((Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Unit)), LirTy::Unit))
        }
        "insert" => {
            let (key_operand, _) = lower.lower_expr(args.first()?, fb)?;
            let (value_operand, _) = lower.lower_expr(args.get(1)?, fb)?;
            lower_hashmap_insert(fb, place, entry_def, key_ty, key_operand, value_operand);
            Some((Operand::Const(ConstOperand::Value(ConstValue::ZST, LirTy::Unit)), LirTy::Unit))
        }
        "get" => {
            let (key_operand, _) = lower.lower_expr(args.first()?, fb)?;
            let result_ty = LirTy::Optional(Box::new(value_ty.clone()));
            Some((lower_hashmap_get(fb, place, entry_def, key_ty, value_ty, key_operand, result_ty.clone()), result_ty))
        }
        _ => None,
    }
}

/// Probe index start: `hash(key) % cap`, computed once per operation.
fn probe_start(fb: &mut FnBuilder, cap_operand: Operand, key_operand: Operand) -> Local {
    let hash = call_runtime(fb, RT_HASH_KEY, vec![key_operand], i32_ty());
    let idx = fb.into_temp(i32_ty(), RValue::BinaryOp(BinOp::Rem, Box::new((hash, cap_operand))));
    operand_to_place(fb, idx, i32_ty()).local
}

fn entry_place(map_place: &Place, entry_def: DefId, idx_local: Local, field: usize) -> Place {
    let _ = entry_def;
    let mut p = map_place.clone();
    p.projection.push(Projection::Field(2));
    p.projection.push(Projection::Index(idx_local));
    p.projection.push(Projection::Field(field));
    p
}

fn lower_hashmap_insert(
    fb: &mut FnBuilder,
    map_place: Place,
    entry_def: DefId,
    key_ty: &LirTy,
    key_operand: Operand,
    value_operand: Operand,
) {
    let mut cap_place = map_place.clone();
    cap_place.projection.push(Projection::Field(1));
    let cap = Operand::Copy(cap_place.clone());
    let key_for_probe = copy_through_temp(fb, key_operand.clone(), key_ty.clone());
    let idx_local = probe_start(fb, cap, key_for_probe);
    let idx_var = fb.new_local(i32_ty(), true);
    fb.push_stmt(Statement::Assign(Box::new((
        Place::from_local(idx_var),
        RValue::Use(Operand::Copy(Place::from_local(idx_local))),
    ))));

    let loop_bb = fb.new_block();
    fb.set_terminator(Terminator::Goto { target: loop_bb });
    fb.switch_to(loop_bb);

    let state = Operand::Copy(entry_place(&map_place, entry_def, idx_var, 0));
    let is_empty = fb.into_temp(LirTy::Bool, RValue::BinaryOp(BinOp::Eq, Box::new((state.clone(), int_operand(0, i32_ty())))));
    let write_bb = fb.new_block();
    let check_match_bb = fb.new_block();
    fb.set_terminator(Terminator::SwitchInt {
        discr: is_empty,
        targets: vec![(1, write_bb)],
        otherwise: check_match_bb,
    });

    // Empty slot: claim it as a brand-new entry.
    fb.switch_to(write_bb);
    fb.push_stmt(Statement::Assign(Box::new((entry_place(&map_place, entry_def, idx_var, 0), RValue::Use(int_operand(1, i32_ty()))))));
    fb.push_stmt(Statement::Assign(Box::new((entry_place(&map_place, entry_def, idx_var, 1), RValue::Use(key_operand.clone())))));
    fb.push_stmt(Statement::Assign(Box::new((entry_place(&map_place, entry_def, idx_var, 2), RValue::Use(value_operand.clone())))));
    let mut len_place = map_place.clone();
    len_place.projection.push(Projection::Field(0));
    let new_len = fb.into_temp(i32_ty(), RValue::BinaryOp(BinOp::Add, Box::new((Operand::Copy(len_place.clone()), int_operand(1, i32_ty())))));
    fb.push_stmt(Statement::Assign(Box::new((len_place, RValue::Use(new_len)))));
    let done_bb = fb.new_block();
    fb.set_terminator(Terminator::Goto { target: done_bb });

    // Occupied slot: overwrite on key match, otherwise advance the probe.
    fb.switch_to(check_match_bb);
    let existing_key = Operand::Copy(entry_place(&map_place, entry_def, idx_var, 1));
    let is_match = keys_equal(fb, existing_key, key_operand.clone(), key_ty);
    let overwrite_bb = fb.new_block();
    let advance_bb = fb.new_block();
    fb.set_terminator(Terminator::SwitchInt {
        discr: is_match,
        targets: vec![(1, overwrite_bb)],
        otherwise: advance_bb,
    });

    fb.switch_to(overwrite_bb);
    fb.push_stmt(Statement::Assign(Box::new((entry_place(&map_place, entry_def, idx_var, 2), RValue::Use(value_operand)))));
    fb.set_terminator(Terminator::Goto { target: done_bb });

    fb.switch_to(advance_bb);
    let cap = Operand::Copy(cap_place);
    let next = fb.into_temp(
        i32_ty(),
        RValue::BinaryOp(BinOp::Rem, Box::new((
            fb_temp_add_one(fb, idx_var),
            cap,
        ))),
    );
    fb.push_stmt(Statement::Assign(Box::new((Place::from_local(idx_var), RValue::Use(next)))));
    fb.set_terminator(Terminator::Goto { target: loop_bb });

    fb.switch_to(done_bb);
}

fn fb_temp_add_one(fb: &mut FnBuilder, local: Local) -> Operand {
    fb.into_temp(i32_ty(), RValue::BinaryOp(BinOp::Add, Box::new((Operand::Copy(Place::from_local(local)), int_operand(1, i32_ty())))))
}

fn lower_hashmap_get(
    fb: &mut FnBuilder,
    map_place: Place,
    entry_def: DefId,
    key_ty: &LirTy,
    value_ty: &LirTy,
    key_operand: Operand,
    result_ty: LirTy,
) -> Operand {
    let mut cap_place = map_place.clone();
    cap_place.projection.push(Projection::Field(1));
    let cap = Operand::Copy(cap_place.clone());
    let key_for_probe = copy_through_temp(fb, key_operand.clone(), key_ty.clone());
    let idx_local = probe_start(fb, cap, key_for_probe);
    let idx_var = fb.new_local(i32_ty(), true);
    fb.push_stmt(Statement::Assign(Box::new((
        Place::from_local(idx_var),
        RValue::Use(Operand::Copy(Place::from_local(idx_local))),
    ))));
    let probes_var = fb.new_local(i32_ty(), true);
    fb.push_stmt(Statement::Assign(Box::new((Place::from_local(probes_var), RValue::Use(int_operand(0, i32_ty()))))));

    let result_local = fb.new_local(result_ty.clone(), true);
    let loop_bb = fb.new_block();
    let join_bb = fb.new_block();
    fb.set_terminator(Terminator::Goto { target: loop_bb });
    fb.switch_to(loop_bb);

    let exhausted = fb.into_temp(
        LirTy::Bool,
        RValue::BinaryOp(BinOp::Ge, Box::new((Operand::Copy(Place::from_local(probes_var)), Operand::Copy(cap_place.clone())))),
    );
    let not_found_bb = fb.new_block();
    let check_slot_bb = fb.new_block();
    fb.set_terminator(Terminator::SwitchInt {
        discr: exhausted,
        targets: vec![(1, not_found_bb)],
        otherwise: check_slot_bb,
    });

    fb.switch_to(not_found_bb);
    fb.push_stmt(Statement::Assign(Box::new((
        Place::from_local(result_local),
        RValue::Aggregate { ty: result_ty.clone(), fields: vec![] },
    ))));
    fb.set_terminator(Terminator::Goto { target: join_bb });

    fb.switch_to(check_slot_bb);
    let state = Operand::Copy(entry_place(&map_place, entry_def, idx_var, 0));
    let is_empty = fb.into_temp(LirTy::Bool, RValue::BinaryOp(BinOp::Eq, Box::new((state, int_operand(0, i32_ty())))));
    let empty_bb = fb.new_block();
    let occupied_bb = fb.new_block();
    fb.set_terminator(Terminator::SwitchInt {
        discr: is_empty,
        targets: vec![(1, empty_bb)],
        otherwise: occupied_bb,
    });

    fb.switch_to(empty_bb);
    fb.push_stmt(Statement::Assign(Box::new((
        Place::from_local(result_local),
        RValue::Aggregate { ty: result_ty.clone(), fields: vec![] },
    ))));
    fb.set_terminator(Terminator::Goto { target: join_bb });

    fb.switch_to(occupied_bb);
    let existing_key = Operand::Copy(entry_place(&map_place, entry_def, idx_var, 1));
    let is_match = keys_equal(fb, existing_key, key_operand, key_ty);
    let found_bb = fb.new_block();
    let advance_bb = fb.new_block();
    fb.set_terminator(Terminator::SwitchInt {
        discr: is_match,
        targets: vec![(1, found_bb)],
        otherwise: advance_bb,
    });

    fb.switch_to(found_bb);
    let payload = Operand::Copy(entry_place(&map_place, entry_def, idx_var, 2));
    let _ = value_ty;
    fb.push_stmt(Statement::Assign(Box::new((
        Place::from_local(result_local),
        RValue::Aggregate { ty: result_ty.clone(), fields: vec![payload] },
    ))));
    fb.set_terminator(Terminator::Goto { target: join_bb });

    fb.switch_to(advance_bb);
    let next_idx = fb.into_temp(
        i32_ty(),
        RValue::BinaryOp(BinOp::Rem, Box::new((fb_temp_add_one(fb, idx_var), Operand::Copy(cap_place)))),
    );
    fb.push_stmt(Statement::Assign(Box::new((Place::from_local(idx_var), RValue::Use(next_idx)))));
    let next_probes = fb_temp_add_one(fb, probes_var);
    fb.push_stmt(Statement::Assign(Box::new((Place::from_local(probes_var), RValue::Use(next_probes)))));
    fb.set_terminator(Terminator::Goto { target: loop_bb });

    fb.switch_to(join_bb);
    Operand::Copy(Place::from_local(result_local))
}

fn copy_through_temp(fb: &mut FnBuilder, operand: Operand, ty: LirTy) -> Operand {
    let local = fb.new_local(ty, false);
    fb.push_stmt(Statement::Assign(Box::new((Place::from_local(local), RValue::Use(operand)))));
    Operand::Copy(Place::from_local(local))
}

/// Equality between two key operands (§4.4.3): a direct `BinOp::Eq` for
/// scalar key types, a runtime structural-equality call otherwise (strings,
/// structs).
fn keys_equal(fb: &mut FnBuilder, a: Operand, b: Operand, key_ty: &LirTy) -> Operand {
    match key_ty {
        LirTy::Int { .. } | LirTy::Bool => fb.into_temp(LirTy::Bool, RValue::BinaryOp(BinOp::Eq, Box::new((a, b)))),
        _ => call_runtime(fb, RT_KEY_EQ, vec![a, b], LirTy::Bool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slangc_lir::syntax::LirDefs;

    #[test]
    fn container_header_packs_len_cap_data_in_order() {
        let ty = i32_ty();
        let header = container_header(int_operand(0, ty.clone()), int_operand(8, ty.clone()), int_operand(0, ty.clone()), ty);
        match header {
            RValue::Aggregate { fields, .. } => assert_eq!(fields.len(), 3),
            other => panic!("expected an aggregate, got {other:?}"),
        }
    }

    #[test]
    fn operand_to_place_passes_through_an_existing_place() {
        let mut defs = LirDefs::new();
        let mut fb = FnBuilder::new(&mut defs);
        let local = fb.new_local(i32_ty(), false);
        let place = operand_to_place(&mut fb, Operand::Copy(Place::from_local(local)), i32_ty());
        assert_eq!(place.local, local);
        assert!(place.projection.is_empty());
    }

    #[test]
    fn operand_to_place_materializes_a_constant_into_a_fresh_local() {
        let mut defs = LirDefs::new();
        let mut fb = FnBuilder::new(&mut defs);
        let place = operand_to_place(&mut fb, int_operand(3, i32_ty()), i32_ty());
        assert!(place.projection.is_empty());
    }

    #[test]
    fn keys_equal_on_scalar_keys_emits_a_direct_compare() {
        let mut defs = LirDefs::new();
        let mut fb = FnBuilder::new(&mut defs);
        let result = keys_equal(&mut fb, int_operand(1, i32_ty()), int_operand(2, i32_ty()), &i32_ty());
        assert!(matches!(result, Operand::Copy(_)));
    }
}
