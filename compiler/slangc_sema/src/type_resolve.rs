//! Type resolution and checking (§4.3.1): turns a syntactic `Ty` into a
//! concrete `LirTy`, and the handful of standalone type-level contracts
//! (operator typing, control-flow condition typing, exhaustiveness) that
//! don't need a full body traversal to check.

use slangc_abi::layout::{FloatWidth, Integer};
use slangc_lir::syntax::{HandleKind, LirDefs, LirTy};

use crate::ast::{BinOpKind, EnumDecl, MatchArm, Pattern, Ty};
use crate::diagnostics::{codes, Reporter};
use crate::monomorphize::Monomorphizer;
use crate::symbols::SymbolTable;

/// Resolves a syntactic type reference to a concrete `LirTy`, monomorphizing
/// user generic templates and mapping built-in generic containers directly
/// (§4.4.3: these bypass the monomorphization queue).
pub fn resolve_ty(
    ty: &Ty,
    symbols: &SymbolTable,
    mono: &mut Monomorphizer,
    defs: &mut LirDefs,
    reporter: &mut Reporter,
) -> Option<LirTy> {
    match ty {
        Ty::Named(name) => resolve_named(name, symbols, reporter).or_else(|| {
            if let Some(decl) = symbols.structs.get(name) {
                mono.monomorphize_struct(decl, &[], symbols, defs, reporter).map(LirTy::Struct)
            } else if let Some(decl) = symbols.enums.get(name) {
                mono.monomorphize_enum(decl, &[], symbols, defs, reporter).map(LirTy::Enum)
            } else {
                reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown type `{}`", name));
                None
            }
        }),
        Ty::Array(elem, len) => {
            let elem_ty = resolve_ty(elem, symbols, mono, defs, reporter)?;
            Some(LirTy::Array { elem: Box::new(elem_ty), len: *len })
        }
        Ty::Ref { mutable, inner } => {
            let pointee = resolve_ty(inner, symbols, mono, defs, reporter)?;
            Some(LirTy::Ref { pointee: Box::new(pointee), mutable: *mutable })
        }
        Ty::Generic(name, args) => resolve_generic(name, args, symbols, mono, defs, reporter),
    }
}

fn resolve_named(name: &str, _symbols: &SymbolTable, _reporter: &mut Reporter) -> Option<LirTy> {
    Some(match name {
        "i8" => LirTy::Int { width: Integer::I8, signed: true },
        "i16" => LirTy::Int { width: Integer::I16, signed: true },
        "i32" => LirTy::Int { width: Integer::I32, signed: true },
        "i64" => LirTy::Int { width: Integer::I64, signed: true },
        "u8" => LirTy::Int { width: Integer::I8, signed: false },
        "u16" => LirTy::Int { width: Integer::I16, signed: false },
        "u32" => LirTy::Int { width: Integer::I32, signed: false },
        "u64" => LirTy::Int { width: Integer::I64, signed: false },
        "f32" => LirTy::Float(FloatWidth::F32),
        "f64" => LirTy::Float(FloatWidth::F64),
        "bool" => LirTy::Bool,
        "string" => LirTy::Str,
        "~" | "blank" => LirTy::Unit,
        "Stdin" => LirTy::Handle(HandleKind::Stdin),
        "Stdout" => LirTy::Handle(HandleKind::Stdout),
        "Stderr" => LirTy::Handle(HandleKind::Stderr),
        "File" => LirTy::Handle(HandleKind::File),
        _ => return None,
    })
}

fn resolve_generic(
    name: &str,
    args: &[Ty],
    symbols: &SymbolTable,
    mono: &mut Monomorphizer,
    defs: &mut LirDefs,
    reporter: &mut Reporter,
) -> Option<LirTy> {
    let resolved_args: Vec<LirTy> =
        args.iter().filter_map(|a| resolve_ty(a, symbols, mono, defs, reporter)).collect();
    if resolved_args.len() != args.len() {
        return None; // a sub-argument already failed to resolve; error already reported.
    }

    match name {
        "Box" if resolved_args.len() == 1 => {
            Some(LirTy::Box(Box::new(resolved_args.into_iter().next().unwrap())))
        }
        "Optional" if resolved_args.len() == 1 => {
            Some(LirTy::Optional(Box::new(resolved_args.into_iter().next().unwrap())))
        }
        "Result" if resolved_args.len() == 2 => {
            let mut it = resolved_args.into_iter();
            let ok = it.next().unwrap();
            let err = it.next().unwrap();
            Some(LirTy::Result { ok: Box::new(ok), err: Box::new(err) })
        }
        "List" if resolved_args.len() == 1 => {
            Some(LirTy::List(Box::new(resolved_args.into_iter().next().unwrap())))
        }
        "HashMap" if resolved_args.len() == 2 => {
            let mut it = resolved_args.into_iter();
            let key = it.next().unwrap();
            let value = it.next().unwrap();
            let entry_def = mono.hashmap_entry_def(&key, &value, defs);
            Some(LirTy::HashMap { key: Box::new(key), value: Box::new(value), entry_def })
        }
        "Iterator" if resolved_args.len() == 1 => {
            Some(LirTy::Iterator(Box::new(resolved_args.into_iter().next().unwrap())))
        }
        _ => {
            if let Some(decl) = symbols.generic_structs.get(name) {
                mono.monomorphize_struct(decl, &resolved_args, symbols, defs, reporter).map(LirTy::Struct)
            } else if let Some(decl) = symbols.generic_enums.get(name) {
                mono.monomorphize_enum(decl, &resolved_args, symbols, defs, reporter).map(LirTy::Enum)
            } else {
                reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown generic template `{}`", name));
                None
            }
        }
    }
}

/// Checks a binary operator against its already-resolved operand types,
/// returning the result type (§4.3.1). Mixed numeric operands without an
/// explicit cast are errors; `+` is never valid on two strings.
pub fn check_binary_op(op: BinOpKind, lhs: &LirTy, rhs: &LirTy, reporter: &mut Reporter) -> Option<LirTy> {
    if op == BinOpKind::Add && matches!((lhs, rhs), (LirTy::Str, LirTy::Str)) {
        reporter.error(
            codes::CE2010_STRING_PLUS,
            "strings do not support `+`; use string interpolation to combine them",
        );
        return None;
    }
    if lhs != rhs {
        reporter.error(
            codes::CE2011_MIXED_NUMERIC,
            format!("mismatched operand types `{:?}` and `{:?}`; an explicit cast is required", lhs, rhs),
        );
        return None;
    }
    let is_comparison =
        matches!(op, BinOpKind::Eq | BinOpKind::Ne | BinOpKind::Lt | BinOpKind::Le | BinOpKind::Gt | BinOpKind::Ge);
    let is_logical = matches!(op, BinOpKind::And | BinOpKind::Or);
    if is_logical && *lhs != LirTy::Bool {
        reporter.error(codes::CE2001_TYPE_MISMATCH, "logical operators require boolean operands");
        return None;
    }
    Some(if is_comparison { LirTy::Bool } else { lhs.clone() })
}

/// `if`/`while`/`foreach` conditions must be boolean (§4.3.1).
pub fn check_condition_is_bool(ty: &LirTy, reporter: &mut Reporter) {
    if *ty != LirTy::Bool {
        reporter.error(codes::CE2020_NON_BOOL_CONDITION, format!("expected `bool` condition, found `{:?}`", ty));
    }
}

/// Checks a `match` over an enum for exhaustiveness and duplicate/unreachable
/// arms (§4.3.1). `defs`/`enum_decl` together give the full variant set;
/// `arms` are checked in source order so a later arm duplicating an earlier
/// one's variant is flagged unreachable, not merely duplicate.
pub fn check_match_exhaustive(enum_decl: &EnumDecl, arms: &[MatchArm], reporter: &mut Reporter) {
    let mut covered = std::collections::HashSet::new();
    let mut has_wildcard = false;
    for arm in arms {
        match &arm.pattern {
            Pattern::Wildcard => {
                if has_wildcard {
                    reporter.warning(codes::CE2041_UNREACHABLE_ARM, "unreachable wildcard arm");
                }
                has_wildcard = true;
            }
            Pattern::Variant { variant, .. } => {
                if !enum_decl.variants.iter().any(|v| &v.name == variant) {
                    reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown variant `{}`", variant));
                    continue;
                }
                if has_wildcard || !covered.insert(variant.clone()) {
                    reporter.error(codes::CE2042_DUPLICATE_ARM, format!("duplicate or unreachable arm for variant `{}`", variant));
                }
            }
        }
    }
    if !has_wildcard {
        let missing: Vec<&str> =
            enum_decl.variants.iter().map(|v| v.name.as_str()).filter(|n| !covered.contains(*n)).collect();
        if !missing.is_empty() {
            reporter.error(
                codes::CE2040_NON_EXHAUSTIVE_MATCH,
                format!("non-exhaustive match on `{}`: missing variant(s) {}", enum_decl.name, missing.join(", ")),
            );
        }
    }
}
