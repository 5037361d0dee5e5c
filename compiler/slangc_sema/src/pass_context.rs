//! `PassContext`: the explicit struct the validator's passes share instead
//! of the source compiler's class-inheritance mix-ins (§9 redesign note —
//! "Multiple inheritance / mix-ins in the validator"). Every validator
//! function takes `&mut PassContext` plus whatever AST node it is visiting
//! and dispatches on the node's tag via `match`.

use std::collections::HashMap;

use crate::diagnostics::Reporter;
use crate::symbols::SymbolTable;

/// A variable's borrow/ownership lifecycle state (§4.3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowState {
    Owned,
    SharedBorrowed(u32),
    ExclusiveBorrowed,
    Moved,
    Destroyed,
}

#[derive(Debug, Clone)]
pub struct LocalBinding {
    pub ty_name: String,
    pub mutable: bool,
    pub borrow: BorrowState,
    pub used: bool,
    /// A `&poke` parameter may be reborrowed as a nested `&poke` (§4.3.4).
    pub is_poke_param: bool,
}

/// A lexical scope: one stack frame of local bindings. Scope exit is where
/// unused-variable warnings and scheduled destructor calls (§4.4.5) are
/// decided.
#[derive(Debug, Default)]
pub struct Scope {
    pub locals: HashMap<String, LocalBinding>,
}

/// Threads the tables, the reporter, and the scope stack through every
/// validator pass for one function body.
pub struct PassContext<'a> {
    pub symbols: &'a SymbolTable,
    pub reporter: &'a mut Reporter,
    pub scopes: Vec<Scope>,
    pub current_unit: String,
    /// The enclosing function's declared return type name, used by
    /// try-propagation and return-wrapping checks (§4.3.1, §4.3.4).
    pub enclosing_fn_return_ty: String,
    pub enclosing_fn_name: String,
}

impl<'a> PassContext<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        reporter: &'a mut Reporter,
        current_unit: impl Into<String>,
        enclosing_fn_name: impl Into<String>,
        enclosing_fn_return_ty: impl Into<String>,
    ) -> Self {
        PassContext {
            symbols,
            reporter,
            scopes: vec![Scope::default()],
            current_unit: current_unit.into(),
            enclosing_fn_return_ty: enclosing_fn_return_ty.into(),
            enclosing_fn_name: enclosing_fn_name.into(),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pops the innermost scope, warning on every local that was declared
    /// but never read (`CW1001`) or whose only uses were borrows (`CW1004`).
    pub fn pop_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            for (name, binding) in scope.locals {
                if !binding.used && binding.borrow != BorrowState::Destroyed {
                    self.reporter.warning(
                        crate::diagnostics::codes::CW1001_UNUSED_VARIABLE,
                        format!("unused variable `{}`", name),
                    );
                }
            }
        }
    }

    pub fn declare_local(&mut self, name: &str, ty_name: &str, mutable: bool, is_poke_param: bool) {
        if let Some(scope) = self.scopes.last() {
            if scope.locals.contains_key(name) {
                self.reporter.warning(
                    crate::diagnostics::codes::CW1002_SHADOWED_VARIABLE,
                    format!("shadowed variable `{}`", name),
                );
            }
        }
        let binding = LocalBinding {
            ty_name: ty_name.to_string(),
            mutable,
            borrow: BorrowState::Owned,
            used: false,
            is_poke_param,
        };
        self.scopes.last_mut().expect("at least one scope always exists").locals.insert(name.to_string(), binding);
    }

    /// Finds the innermost scope defining `name`, searching outward.
    pub fn find_local_mut(&mut self, name: &str) -> Option<&mut LocalBinding> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.locals.get_mut(name))
    }

    pub fn find_local(&self, name: &str) -> Option<&LocalBinding> {
        self.scopes.iter().rev().find_map(|scope| scope.locals.get(name))
    }
}
