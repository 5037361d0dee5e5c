//! Constant evaluation (§4.3.3): only a pure subset of the expression
//! grammar is admissible — literals, arithmetic/bitwise operators,
//! comparisons, numeric casts, and references to other already-evaluated
//! constants. A dependency graph across constants catches cycles; evaluation
//! itself catches compile-time division by zero.

use std::collections::{HashMap, HashSet};

use crate::ast::{BinOpKind, ConstDecl, Expr, UnOpKind};
use crate::diagnostics::{codes, Reporter};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i128),
    Float(f64),
    Bool(bool),
}

/// Evaluates every constant in `consts`, honoring inter-constant
/// dependencies via a topological pass over the dependency graph so a
/// constant referencing another already-evaluated one always resolves.
pub fn evaluate_all(consts: &HashMap<String, ConstDecl>, reporter: &mut Reporter) -> HashMap<String, ConstValue> {
    let mut values = HashMap::new();
    let mut in_progress = HashSet::new();
    let mut done = HashSet::new();

    let mut names: Vec<&String> = consts.keys().collect();
    names.sort();
    for name in names {
        evaluate_one(name, consts, &mut values, &mut in_progress, &mut done, reporter);
    }
    values
}

fn evaluate_one<'a>(
    name: &'a str,
    consts: &'a HashMap<String, ConstDecl>,
    values: &mut HashMap<String, ConstValue>,
    in_progress: &mut HashSet<String>,
    done: &mut HashSet<String>,
    reporter: &mut Reporter,
) -> Option<ConstValue> {
    if let Some(v) = values.get(name) {
        return Some(*v);
    }
    if done.contains(name) {
        return None; // already failed once; don't re-report.
    }
    let Some(decl) = consts.get(name) else {
        reporter.error(codes::CE1001_UNKNOWN_NAME, format!("unknown constant `{}`", name));
        return None;
    };
    if !in_progress.insert(name.to_string()) {
        reporter.error(codes::CE2050_CONST_CYCLE, format!("cyclic constant dependency involving `{}`", name));
        done.insert(name.to_string());
        return None;
    }

    let result = eval_expr(&decl.value, consts, values, in_progress, done, reporter);
    in_progress.remove(name);
    done.insert(name.to_string());
    if let Some(v) = result {
        values.insert(name.to_string(), v);
    }
    result
}

fn eval_expr(
    expr: &Expr,
    consts: &HashMap<String, ConstDecl>,
    values: &mut HashMap<String, ConstValue>,
    in_progress: &mut HashSet<String>,
    done: &mut HashSet<String>,
    reporter: &mut Reporter,
) -> Option<ConstValue> {
    match expr {
        Expr::IntLit(v) => Some(ConstValue::Int(*v)),
        Expr::FloatLit(v) => Some(ConstValue::Float(*v)),
        Expr::BoolLit(v) => Some(ConstValue::Bool(*v)),
        Expr::Ident(name) => evaluate_one(name, consts, values, in_progress, done, reporter),
        Expr::Unary { op, operand } => {
            let v = eval_expr(operand, consts, values, in_progress, done, reporter)?;
            match (op, v) {
                (UnOpKind::Neg, ConstValue::Int(i)) => Some(ConstValue::Int(-i)),
                (UnOpKind::Neg, ConstValue::Float(f)) => Some(ConstValue::Float(-f)),
                (UnOpKind::Not, ConstValue::Bool(b)) => Some(ConstValue::Bool(!b)),
                _ => {
                    reporter.error(codes::CE2052_CONST_NOT_PURE, "invalid operand type for unary operator in constant expression");
                    None
                }
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = eval_expr(lhs, consts, values, in_progress, done, reporter)?;
            let r = eval_expr(rhs, consts, values, in_progress, done, reporter)?;
            eval_binary(*op, l, r, reporter)
        }
        Expr::Call { .. } | Expr::MethodCall { .. } => {
            reporter.error(
                codes::CE2052_CONST_NOT_PURE,
                "function and method calls are not allowed in constant expressions",
            );
            None
        }
        _ => {
            reporter.error(codes::CE2052_CONST_NOT_PURE, "expression is not admissible in a constant context");
            None
        }
    }
}

fn eval_binary(op: BinOpKind, l: ConstValue, r: ConstValue, reporter: &mut Reporter) -> Option<ConstValue> {
    use ConstValue::*;
    match (op, l, r) {
        (BinOpKind::Div, Int(_), Int(0)) | (BinOpKind::Rem, Int(_), Int(0)) => {
            reporter.error(codes::CE2051_CONST_DIV_BY_ZERO, "division by zero in constant expression");
            None
        }
        (BinOpKind::Add, Int(a), Int(b)) => Some(Int(a + b)),
        (BinOpKind::Sub, Int(a), Int(b)) => Some(Int(a - b)),
        (BinOpKind::Mul, Int(a), Int(b)) => Some(Int(a * b)),
        (BinOpKind::Div, Int(a), Int(b)) => Some(Int(a / b)),
        (BinOpKind::Rem, Int(a), Int(b)) => Some(Int(a % b)),
        (BinOpKind::BitAnd, Int(a), Int(b)) => Some(Int(a & b)),
        (BinOpKind::BitOr, Int(a), Int(b)) => Some(Int(a | b)),
        (BinOpKind::BitXor, Int(a), Int(b)) => Some(Int(a ^ b)),
        (BinOpKind::Shl, Int(a), Int(b)) => Some(Int(a << b)),
        (BinOpKind::Shr, Int(a), Int(b)) => Some(Int(a >> b)),
        (BinOpKind::Eq, Int(a), Int(b)) => Some(Bool(a == b)),
        (BinOpKind::Ne, Int(a), Int(b)) => Some(Bool(a != b)),
        (BinOpKind::Lt, Int(a), Int(b)) => Some(Bool(a < b)),
        (BinOpKind::Le, Int(a), Int(b)) => Some(Bool(a <= b)),
        (BinOpKind::Gt, Int(a), Int(b)) => Some(Bool(a > b)),
        (BinOpKind::Ge, Int(a), Int(b)) => Some(Bool(a >= b)),
        (BinOpKind::Add, Float(a), Float(b)) => Some(Float(a + b)),
        (BinOpKind::Sub, Float(a), Float(b)) => Some(Float(a - b)),
        (BinOpKind::Mul, Float(a), Float(b)) => Some(Float(a * b)),
        (BinOpKind::Div, Float(a), Float(b)) => Some(Float(a / b)),
        (BinOpKind::And, Bool(a), Bool(b)) => Some(Bool(a && b)),
        (BinOpKind::Or, Bool(a), Bool(b)) => Some(Bool(a || b)),
        _ => {
            reporter.error(codes::CE2011_MIXED_NUMERIC, "mismatched operand types in constant expression");
            None
        }
    }
}
