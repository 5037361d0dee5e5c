//! Global symbol tables populated by the collector (§4.2) and consumed by
//! the validator and lowering passes. Concrete declarations and generic
//! templates are tracked in separate maps per §4.2's "Detect and register
//! *generic* templates ... separately from concrete declarations."

use std::collections::HashMap;

use crate::ast::{ConstDecl, EnumDecl, ExtensionDecl, FunctionDecl, PerkDecl, StructDecl};

/// A stdlib function's signature, registered by the loader from an imported
/// stdlib module (§4.2's "stdlib functions ... into a separate sub-table").
#[derive(Debug, Clone)]
pub struct StdlibFnSig {
    pub name: String,
    pub param_count: usize,
}

/// One unit's own declarations, produced by the collector before the
/// cross-unit merge step (§4.2 "Symbol merging across units").
#[derive(Debug, Default)]
pub struct UnitSymbols {
    pub unit_name: String,
    pub structs: HashMap<String, StructDecl>,
    pub generic_structs: HashMap<String, StructDecl>,
    pub enums: HashMap<String, EnumDecl>,
    pub generic_enums: HashMap<String, EnumDecl>,
    pub perks: HashMap<String, PerkDecl>,
    /// Keyed by (target type name, perk name).
    pub perk_impls: HashMap<(String, String), ExtensionDecl>,
    /// Plain extensions (no perk attached), keyed by target type name.
    pub extensions: HashMap<String, Vec<ExtensionDecl>>,
    pub functions: HashMap<String, FunctionDecl>,
    pub generic_functions: HashMap<String, FunctionDecl>,
    pub consts: HashMap<String, ConstDecl>,
}

/// The merged, whole-program symbol table the validator operates on.
#[derive(Debug, Default)]
pub struct SymbolTable {
    pub structs: HashMap<String, StructDecl>,
    pub generic_structs: HashMap<String, StructDecl>,
    pub enums: HashMap<String, EnumDecl>,
    pub generic_enums: HashMap<String, EnumDecl>,
    pub perks: HashMap<String, PerkDecl>,
    pub perk_impls: HashMap<(String, String), ExtensionDecl>,
    pub extensions: HashMap<String, Vec<ExtensionDecl>>,
    pub functions: HashMap<String, FunctionDecl>,
    pub generic_functions: HashMap<String, FunctionDecl>,
    pub consts: HashMap<String, ConstDecl>,
    pub stdlib_functions: HashMap<String, StdlibFnSig>,
    /// Which unit each public function/const name was exported from, used
    /// to enforce §4.1's "no duplicate public symbol across units."
    pub public_symbol_origin: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Whether a type satisfies `perk_name`: a declared `extend T with P`
    /// block exists for it (§4.3.2's nominal capability system).
    pub fn satisfies_perk(&self, type_name: &str, perk_name: &str) -> bool {
        self.perk_impls.contains_key(&(type_name.to_string(), perk_name.to_string()))
    }
}
