//! Borrow / ownership analysis (§4.3.4): walks a validated function body
//! tracking each local's lifecycle state (owned, shared-borrowed,
//! exclusive-borrowed, moved, destroyed) and flags every contract violation
//! with the matching `CE24xx` code.

use crate::ast::{BorrowKind, Block, Expr, FunctionDecl, Stmt, Ty};
use crate::diagnostics::codes;
use crate::pass_context::{BorrowState, PassContext};

pub fn check_function(func: &FunctionDecl, ctx: &mut PassContext) {
    for param in &func.params {
        let is_poke = matches!(&param.ty, Ty::Ref { mutable: true, .. });
        let ty_name = ty_display(&param.ty);
        ctx.declare_local(&param.name, &ty_name, is_poke, is_poke);
    }
    check_block(&func.body, ctx);
}

fn check_block(block: &Block, ctx: &mut PassContext) {
    ctx.push_scope();
    for stmt in &block.stmts {
        check_stmt(stmt, ctx);
    }
    ctx.pop_scope();
}

fn check_stmt(stmt: &Stmt, ctx: &mut PassContext) {
    match stmt {
        Stmt::Let { name, mutable, init, .. } => {
            check_expr(init, ctx);
            ctx.declare_local(name, "", *mutable, false);
        }
        Stmt::Expr(expr) => check_expr(expr, ctx),
        Stmt::Return(expr) => {
            if let Some(e) = expr {
                check_expr(e, ctx);
            }
        }
        Stmt::If { cond, then_block, else_block } => {
            check_expr(cond, ctx);
            check_block(then_block, ctx);
            if let Some(block) = else_block {
                check_block(block, ctx);
            }
        }
        Stmt::While { cond, body } => {
            check_expr(cond, ctx);
            check_block(body, ctx);
        }
        Stmt::Foreach { iter, body, .. } => {
            check_expr(iter, ctx);
            check_block(body, ctx);
        }
        Stmt::Match { scrutinee, arms } => {
            check_expr(scrutinee, ctx);
            for arm in arms {
                check_block(&arm.body, ctx);
            }
        }
        Stmt::Break | Stmt::Continue => {}
    }
}

fn check_expr(expr: &Expr, ctx: &mut PassContext) {
    match expr {
        Expr::Ident(name) => mark_used(name, ctx),
        Expr::Borrow { kind, place } => check_borrow(*kind, place, ctx),
        Expr::Destroy(inner) => check_destroy(inner, ctx),
        Expr::Binary { lhs, rhs, .. } => {
            check_expr(lhs, ctx);
            check_expr(rhs, ctx);
        }
        Expr::Unary { operand, .. } => check_expr(operand, ctx),
        Expr::Call { args, .. } => check_call_args(args, ctx),
        Expr::MethodCall { receiver, args, .. } => {
            check_expr(receiver, ctx);
            for a in args {
                check_expr(a, ctx);
            }
        }
        Expr::FieldAccess { receiver, .. } => check_expr(receiver, ctx),
        Expr::Index { base, index } => {
            check_expr(base, ctx);
            check_expr(index, ctx);
        }
        Expr::ArrayLit(items) => items.iter().for_each(|e| check_expr(e, ctx)),
        Expr::StructLit { fields, .. } => check_call_args(fields, ctx),
        Expr::TryProp(inner) => check_expr(inner, ctx),
        Expr::Ok(inner) | Expr::Err(inner) | Expr::Some(inner) => check_expr(inner, ctx),
        Expr::Interpolated(segments) => {
            for seg in segments {
                if let crate::ast::InterpSegment::Expr(e) = seg {
                    check_expr(e, ctx);
                }
            }
        }
        Expr::IntLit(_) | Expr::FloatLit(_) | Expr::BoolLit(_) | Expr::StrLit(_) | Expr::None => {}
    }
}

fn check_call_args(args: &crate::ast::CallArgs, ctx: &mut PassContext) {
    match args {
        crate::ast::CallArgs::Positional(exprs) => exprs.iter().for_each(|e| check_expr(e, ctx)),
        crate::ast::CallArgs::Named(fields) => fields.iter().for_each(|(_, e)| check_expr(e, ctx)),
    }
}

/// A borrow's target must be a stable address: a named variable, or field
/// access rooted at one (§4.3.4) — never a call result or other temporary.
fn stable_target_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Ident(name) => Some(name),
        Expr::FieldAccess { receiver, .. } => stable_target_name(receiver),
        _ => None,
    }
}

fn mark_used(name: &str, ctx: &mut PassContext) {
    let unit = ctx.current_unit.clone();
    if let Some(binding) = ctx.find_local_mut(name) {
        binding.used = true;
        match binding.borrow {
            BorrowState::Moved => {
                ctx.reporter.error(
                    codes::CE2404_USE_AFTER_MOVE,
                    format!("use of moved variable `{}` in unit `{}`", name, unit),
                );
            }
            BorrowState::Destroyed => {
                ctx.reporter.error(
                    codes::CE2405_USE_AFTER_DESTROY,
                    format!("use of destroyed variable `{}` in unit `{}`", name, unit),
                );
            }
            _ => {}
        }
    } else {
        ctx.reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown name `{}` in unit `{}`", name, unit));
    }
}

fn check_borrow(kind: BorrowKind, place: &Expr, ctx: &mut PassContext) {
    let unit = ctx.current_unit.clone();
    let Some(name) = stable_target_name(place) else {
        ctx.reporter.error(
            codes::CE2407_UNSTABLE_BORROW_TARGET,
            format!("borrow expression in unit `{}` does not target a stable address", unit),
        );
        return;
    };
    let name = name.to_string();
    let is_poke_param = ctx.find_local(&name).map(|b| b.is_poke_param).unwrap_or(false);
    let Some(binding) = ctx.find_local_mut(&name) else {
        ctx.reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown name `{}` in unit `{}`", name, unit));
        return;
    };
    binding.used = true;

    match (binding.borrow, kind) {
        (BorrowState::Moved, _) => {
            ctx.reporter.error(codes::CE2404_USE_AFTER_MOVE, format!("borrow of moved variable `{}`", name));
        }
        (BorrowState::Destroyed, _) => {
            ctx.reporter
                .error(codes::CE2405_USE_AFTER_DESTROY, format!("borrow of destroyed variable `{}`", name));
        }
        (BorrowState::Owned, BorrowKind::Peek) => binding.borrow = BorrowState::SharedBorrowed(1),
        (BorrowState::Owned, BorrowKind::Poke) => binding.borrow = BorrowState::ExclusiveBorrowed,
        (BorrowState::SharedBorrowed(n), BorrowKind::Peek) => binding.borrow = BorrowState::SharedBorrowed(n + 1),
        (BorrowState::SharedBorrowed(_), BorrowKind::Poke) => {
            ctx.reporter.error(
                codes::CE2402_EXCLUSIVE_WHILE_SHARED,
                format!("cannot take `&poke {}` while a `&peek` borrow is outstanding", name),
            );
        }
        (BorrowState::ExclusiveBorrowed, BorrowKind::Peek) => {
            ctx.reporter.error(
                codes::CE2402_EXCLUSIVE_WHILE_SHARED,
                format!("cannot take `&peek {}` while a `&poke` borrow is outstanding", name),
            );
        }
        (BorrowState::ExclusiveBorrowed, BorrowKind::Poke) => {
            if is_poke_param {
                ctx.reporter.warning(
                    codes::CW2406_POKE_REBORROW,
                    format!("reborrowing `&poke` parameter `{}`", name),
                );
            } else {
                ctx.reporter.error(
                    codes::CE2403_CONFLICTING_EXCLUSIVE,
                    format!("cannot take a second `&poke {}` while one is already outstanding", name),
                );
            }
        }
    }
}

fn check_destroy(inner: &Expr, ctx: &mut PassContext) {
    check_expr(inner, ctx);
    let Some(name) = stable_target_name(inner) else { return };
    let name = name.to_string();
    let Some(binding) = ctx.find_local_mut(&name) else { return };
    match binding.borrow {
        BorrowState::SharedBorrowed(_) | BorrowState::ExclusiveBorrowed => {
            ctx.reporter.error(
                codes::CE2401_MOVE_WHILE_BORROWED,
                format!("cannot destroy `{}` while it has an outstanding borrow", name),
            );
        }
        BorrowState::Moved => {
            ctx.reporter.error(codes::CE2404_USE_AFTER_MOVE, format!("destroy of moved variable `{}`", name));
        }
        BorrowState::Destroyed => {
            ctx.reporter
                .error(codes::CE2405_USE_AFTER_DESTROY, format!("double destroy of variable `{}`", name));
        }
        BorrowState::Owned => binding.borrow = BorrowState::Destroyed,
    }
}

fn ty_display(ty: &Ty) -> String {
    match ty {
        Ty::Named(name) => name.clone(),
        Ty::Generic(name, args) => {
            format!("{}<{}>", name, args.iter().map(ty_display).collect::<Vec<_>>().join(", "))
        }
        Ty::Array(elem, len) => format!("[{}; {}]", ty_display(elem), len),
        Ty::Ref { mutable, inner } => {
            format!("&{} {}", if *mutable { "poke" } else { "peek" }, ty_display(inner))
        }
    }
}
