//! The collector pass (§4.2): walks a loaded unit's AST and populates symbol
//! tables without descending into function bodies, then a merge step folds
//! every unit's partial table into the whole-program `SymbolTable`.

use std::collections::HashMap;

use crate::ast::Unit;
use crate::diagnostics::{codes, Reporter};
use crate::symbols::{SymbolTable, UnitSymbols};

#[tracing::instrument(level = "debug", skip(unit, reporter), fields(unit = %unit.name))]
pub fn collect_unit(unit: &Unit, reporter: &mut Reporter) -> UnitSymbols {
    let mut symbols = UnitSymbols { unit_name: unit.name.clone(), ..Default::default() };

    for s in &unit.structs {
        let table = if s.generics.is_empty() { &mut symbols.structs } else { &mut symbols.generic_structs };
        if table.insert(s.name.clone(), s.clone()).is_some() {
            reporter.error(
                codes::CE1002_DUPLICATE_STRUCT,
                format!("duplicate struct `{}` in unit `{}`", s.name, unit.name),
            );
        }
    }

    for e in &unit.enums {
        let table = if e.generics.is_empty() { &mut symbols.enums } else { &mut symbols.generic_enums };
        if table.insert(e.name.clone(), e.clone()).is_some() {
            reporter.error(
                codes::CE1003_DUPLICATE_ENUM,
                format!("duplicate enum `{}` in unit `{}`", e.name, unit.name),
            );
        }
    }

    for p in &unit.perks {
        symbols.perks.insert(p.name.clone(), p.clone());
    }

    for ext in &unit.extensions {
        match &ext.perk {
            Some(perk_name) => {
                let key = (ext.target.clone(), perk_name.clone());
                if symbols.perk_impls.insert(key, ext.clone()).is_some() {
                    reporter.error(
                        codes::CE1005_DUPLICATE_PERK_IMPL,
                        format!(
                            "duplicate implementation of perk `{}` for `{}` in unit `{}`",
                            perk_name, ext.target, unit.name
                        ),
                    );
                }
            }
            None => symbols.extensions.entry(ext.target.clone()).or_default().push(ext.clone()),
        }
    }

    for f in &unit.functions {
        let table = if f.generics.is_empty() { &mut symbols.functions } else { &mut symbols.generic_functions };
        if table.insert(f.name.clone(), f.clone()).is_some() {
            reporter.error(
                codes::CE1004_DUPLICATE_FUNCTION,
                format!("duplicate function `{}` in unit `{}`", f.name, unit.name),
            );
        }
    }

    for c in &unit.consts {
        if symbols.consts.insert(c.name.clone(), c.clone()).is_some() {
            reporter.error(
                codes::CE1006_DUPLICATE_CONST,
                format!("duplicate constant `{}` in unit `{}`", c.name, unit.name),
            );
        }
    }

    symbols
}

/// Folds every unit's partial table into the global one, re-checking the
/// cross-unit invariants the per-unit collector cannot see on its own
/// (§4.2's "Symbol merging across units"): no two units may export the same
/// public function or constant name (§4.1, `CE3001`).
#[tracing::instrument(level = "debug", skip(units, reporter))]
pub fn merge_units(units: Vec<UnitSymbols>, reporter: &mut Reporter) -> SymbolTable {
    let mut global = SymbolTable::new();
    let mut seen_public: HashMap<String, String> = HashMap::new();

    for unit in units {
        for (name, decl) in unit.structs {
            global.structs.insert(name, decl);
        }
        for (name, decl) in unit.generic_structs {
            global.generic_structs.insert(name, decl);
        }
        for (name, decl) in unit.enums {
            global.enums.insert(name, decl);
        }
        for (name, decl) in unit.generic_enums {
            global.generic_enums.insert(name, decl);
        }
        for (name, decl) in unit.perks {
            global.perks.insert(name, decl);
        }
        for (key, decl) in unit.perk_impls {
            global.perk_impls.insert(key, decl);
        }
        for (target, exts) in unit.extensions {
            global.extensions.entry(target).or_default().extend(exts);
        }
        for (name, decl) in unit.functions {
            check_public_uniqueness(&name, &decl.visibility, &unit.unit_name, &mut seen_public, reporter);
            global.functions.insert(name, decl);
        }
        for (name, decl) in unit.generic_functions {
            global.generic_functions.insert(name, decl);
        }
        for (name, decl) in unit.consts {
            check_public_uniqueness(&name, &decl.visibility, &unit.unit_name, &mut seen_public, reporter);
            global.consts.insert(name, decl);
        }
    }

    global.public_symbol_origin = seen_public;
    global
}

fn check_public_uniqueness(
    name: &str,
    visibility: &crate::ast::Visibility,
    unit_name: &str,
    seen_public: &mut HashMap<String, String>,
    reporter: &mut Reporter,
) {
    if *visibility != crate::ast::Visibility::Public {
        return;
    }
    if let Some(first_unit) = seen_public.get(name) {
        reporter.error(
            codes::CE3001_DUPLICATE_PUBLIC_SYMBOL,
            format!(
                "public symbol `{}` exported by both `{}` and `{}`",
                name, first_unit, unit_name
            ),
        );
    } else {
        seen_public.insert(name.to_string(), unit_name.to_string());
    }
}
