//! Unit loading, symbol collection, validation, and AST-to-LIR lowering
//! (§4.1-§4.4): everything between a parsed [`ast::Unit`] tree and the
//! [`slangc_lir::lir::LirUnit`] the backend consumes.
//!
//! [`run`] is the single entry point a driver calls; every stage below it
//! reports failures onto a shared [`diagnostics::Reporter`] rather than
//! stopping the whole pipeline early, so a single pass can surface every
//! error it finds before the driver decides the exit code (§6).

pub mod ast;
pub mod borrow;
pub mod collector;
pub mod const_eval;
pub mod containers;
pub mod diagnostics;
pub mod loader;
pub mod lower;
pub mod monomorphize;
pub mod pass_context;
pub mod symbols;
pub mod type_resolve;

use std::collections::HashMap;

use slangc_lir::lir::LirUnit;

use ast::Unit;
use diagnostics::Reporter;
use pass_context::PassContext;
use symbols::SymbolTable;

/// What a full pipeline run produced: the diagnostics accumulated along the
/// way, plus the finished `LirUnit` if the program made it far enough to be
/// worth codegen-ing (§6: a run with only warnings still emits).
pub struct SemaOutcome {
    pub reporter: Reporter,
    pub lir_unit: Option<LirUnit>,
}

impl SemaOutcome {
    /// The §6 process exit code this run implies.
    pub fn exit_code(&self) -> i32 {
        self.reporter.exit_code()
    }
}

/// Runs the whole pipeline for `root` against the units the caller has
/// already parsed (§4.1's "parsing itself is out of scope for this crate"):
/// load → collect/merge symbols → evaluate constants → validate every
/// function body (type/borrow pass, §4.3) → lower to LIR (§4.4).
///
/// Stops early (with `lir_unit: None`) the moment the reporter holds an
/// error, since lowering a program the validator already rejected would
/// only produce more noise.
pub fn run(root: &str, available: HashMap<String, Unit>) -> SemaOutcome {
    let mut reporter = Reporter::new();

    let Some(loaded) = loader::load_units(root, available, &mut reporter) else {
        return SemaOutcome { reporter, lir_unit: None };
    };

    let mut unit_symbols = Vec::with_capacity(loaded.order.len());
    for name in &loaded.order {
        let unit = &loaded.units[name];
        unit_symbols.push(collector::collect_unit(unit, &mut reporter));
    }
    let symbols = collector::merge_units(unit_symbols, &mut reporter);

    if reporter.has_errors() {
        return SemaOutcome { reporter, lir_unit: None };
    }

    let consts = const_eval::evaluate_all(&symbols.consts, &mut reporter);

    validate_all(&loaded.order, &loaded.units, &symbols, &mut reporter);

    if reporter.has_errors() {
        return SemaOutcome { reporter, lir_unit: None };
    }

    let lir_unit = lower::lower_program(&loaded.order, &loaded.units, &symbols, &consts, &mut reporter);
    let lir_unit = if reporter.has_errors() { None } else { Some(lir_unit) };

    SemaOutcome { reporter, lir_unit }
}

/// Runs the type/borrow validator (§4.3) over every concrete function body
/// across every loaded unit. Generic function templates are checked once
/// lowering instantiates them against a concrete type-argument tuple, same
/// as monomorphized structs/enums — checking an uninstantiated template
/// against placeholder type parameters would reject perfectly valid bodies.
fn validate_all(unit_order: &[String], units: &HashMap<String, Unit>, symbols: &SymbolTable, reporter: &mut Reporter) {
    for unit_name in unit_order {
        let Some(unit) = units.get(unit_name) else { continue };
        for func in &unit.functions {
            if !func.generics.is_empty() {
                continue;
            }
            let return_ty_name = format!("{:?}", func.return_ty);
            let mut ctx = PassContext::new(symbols, reporter, unit_name.clone(), func.name.clone(), return_ty_name);
            for param in &func.params {
                ctx.declare_local(&param.name, &format!("{:?}", param.ty), matches!(&param.ty, ast::Ty::Ref { mutable: true, .. }), matches!(&param.ty, ast::Ty::Ref { .. }));
            }
            borrow::check_function(func, &mut ctx);
        }
        for ext in &unit.extensions {
            for func in &ext.methods {
                let return_ty_name = format!("{:?}", func.return_ty);
                let mut ctx = PassContext::new(symbols, reporter, unit_name.clone(), func.name.clone(), return_ty_name);
                for param in &func.params {
                    ctx.declare_local(&param.name, &format!("{:?}", param.ty), matches!(&param.ty, ast::Ty::Ref { mutable: true, .. }), matches!(&param.ty, ast::Ty::Ref { .. }));
                }
                borrow::check_function(func, &mut ctx);
            }
        }
    }
}
