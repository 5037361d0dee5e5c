//! The diagnostic reporter (§4.7, §7): the sole channel through which this
//! crate ever reports a fact about the program being compiled. Nothing here
//! prints to stdout/stderr — a `Reporter` is a sink the driver drains after
//! the pipeline stops.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A frozen diagnostic code from one of the §7 families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(pub &'static str);

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub mod codes {
    use super::Code;

    // CE0xxx — internal compiler errors.
    pub const CE0001_INTERNAL: Code = Code("CE0001");

    // CE1xxx — scope/name errors.
    pub const CE1001_UNKNOWN_NAME: Code = Code("CE1001");
    pub const CE1002_DUPLICATE_STRUCT: Code = Code("CE1002");
    pub const CE1003_DUPLICATE_ENUM: Code = Code("CE1003");
    pub const CE1004_DUPLICATE_FUNCTION: Code = Code("CE1004");
    pub const CE1005_DUPLICATE_PERK_IMPL: Code = Code("CE1005");
    pub const CE1006_DUPLICATE_CONST: Code = Code("CE1006");

    // CE2xxx — type errors.
    pub const CE2001_TYPE_MISMATCH: Code = Code("CE2001");
    pub const CE2010_STRING_PLUS: Code = Code("CE2010");
    pub const CE2011_MIXED_NUMERIC: Code = Code("CE2011");
    pub const CE2020_NON_BOOL_CONDITION: Code = Code("CE2020");
    pub const CE2021_NON_ITERATOR_FOREACH: Code = Code("CE2021");
    pub const CE2030_ARITY_MISMATCH: Code = Code("CE2030");
    pub const CE2031_UNKNOWN_NAMED_FIELD: Code = Code("CE2031");
    pub const CE2032_MISSING_NAMED_FIELD: Code = Code("CE2032");
    pub const CE2033_DUPLICATE_NAMED_FIELD: Code = Code("CE2033");
    pub const CE2034_BAD_RETURN_WRAPPING: Code = Code("CE2034");
    pub const CE2040_NON_EXHAUSTIVE_MATCH: Code = Code("CE2040");
    pub const CE2041_UNREACHABLE_ARM: Code = Code("CE2041");
    pub const CE2042_DUPLICATE_ARM: Code = Code("CE2042");
    pub const CE2050_CONST_CYCLE: Code = Code("CE2050");
    pub const CE2051_CONST_DIV_BY_ZERO: Code = Code("CE2051");
    pub const CE2052_CONST_NOT_PURE: Code = Code("CE2052");

    // CE24xx — borrow-check sub-family.
    pub const CE2401_MOVE_WHILE_BORROWED: Code = Code("CE2401");
    pub const CE2402_EXCLUSIVE_WHILE_SHARED: Code = Code("CE2402");
    pub const CE2403_CONFLICTING_EXCLUSIVE: Code = Code("CE2403");
    pub const CE2404_USE_AFTER_MOVE: Code = Code("CE2404");
    pub const CE2405_USE_AFTER_DESTROY: Code = Code("CE2405");
    pub const CE2406_INVALID_REBORROW: Code = Code("CE2406");
    pub const CE2407_UNSTABLE_BORROW_TARGET: Code = Code("CE2407");

    // CE25xx — result-type sub-family.
    pub const CE2510_TRY_PROP_NOT_RESULT_FN: Code = Code("CE2510");
    pub const CE2511_TRY_PROP_NOT_RESULT_LIKE: Code = Code("CE2511");

    // CE3xxx — unit/linking/library errors.
    pub const CE3001_DUPLICATE_PUBLIC_SYMBOL: Code = Code("CE3001");
    pub const CE3002_IMPORT_CYCLE: Code = Code("CE3002");
    pub const CE3003_MISSING_UNIT: Code = Code("CE3003");
    pub const CE3502_LIBRARY_NOT_FOUND: Code = Code("CE3502");
    pub const CE3503_MALFORMED_MANIFEST: Code = Code("CE3503");
    pub const CE3507_BITCODE_PARSE_FAILURE: Code = Code("CE3507");
    pub const CE3508_TRUNCATED_ARTIFACT: Code = Code("CE3508");
    pub const CE3509_BAD_MAGIC: Code = Code("CE3509");
    pub const CE3510_UNSUPPORTED_VERSION: Code = Code("CE3510");
    pub const CE3511_MALFORMED_METADATA: Code = Code("CE3511");

    // CE4xxx — perk errors.
    pub const CE4001_MISSING_PERK_IMPL: Code = Code("CE4001");
    pub const CE4002_DUPLICATE_PERK: Code = Code("CE4002");

    // CWxxxx — warnings.
    pub const CW1001_UNUSED_VARIABLE: Code = Code("CW1001");
    pub const CW1002_SHADOWED_VARIABLE: Code = Code("CW1002");
    pub const CW1003_DUPLICATE_IMPORT: Code = Code("CW1003");
    pub const CW1004_BORROW_ONLY_USAGE: Code = Code("CW1004");
    pub const CW2406_POKE_REBORROW: Code = Code("CW2406");
    pub const CW3505_PLATFORM_MISMATCH: Code = Code("CW3505");
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Code,
    pub severity: Severity,
    pub message: String,
    /// The unit this diagnostic was raised against, if any (§4.1's
    /// "naming the offending unit names as fields" instrumentation style).
    pub unit: Option<String>,
}

impl Diagnostic {
    pub fn error(code: Code, message: impl Into<String>) -> Self {
        Diagnostic { code, severity: Severity::Error, message: message.into(), unit: None }
    }

    pub fn warning(code: Code, message: impl Into<String>) -> Self {
        Diagnostic { code, severity: Severity::Warning, message: message.into(), unit: None }
    }

    pub fn in_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Accumulates diagnostics across the whole pipeline run (§4.7, §7).
///
/// The reporter never writes to stdout/stderr; it is a sink the CLI
/// collaborator drains and renders after the driver stops the pipeline.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, code: Code, message: impl Into<String>) {
        self.push(Diagnostic::error(code, message));
    }

    pub fn warning(&mut self, code: Code, message: impl Into<String>) {
        self.push(Diagnostic::warning(code, message));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Warning)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The §6 process exit code this reporter's contents imply, assuming the
    /// pipeline otherwise ran to completion: 2 if any error was recorded, 1
    /// if only warnings were, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            2
        } else if self.has_warnings() {
            1
        } else {
            0
        }
    }
}
