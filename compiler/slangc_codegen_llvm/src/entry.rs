use std::path::Path;

use inkwell::context::Context;
use inkwell::module::Module;

use crate::{builder::CodegenBuilder, context::CodegenCtx};
use slangc_codegen_ssa::entry::compile_lir_unit;
use slangc_lir::lir::{LirCtx, LirUnit};
use tracing::instrument;

/// Lowers `lir_unit` into an LLVM module under `ll_context`. The caller owns
/// the `Context` (mirroring rustc's one-`LLVMContext`-per-codegen-session
/// shape) so the returned `Module` can outlive this call.
#[instrument(level = "info", skip(ll_context, lir_ctx, lir_unit), fields(unit = %lir_unit.metadata.unit_name))]
pub fn llvm_codegen_lir_unit<'ll>(
    ll_context: &'ll Context,
    lir_ctx: LirCtx,
    lir_unit: LirUnit,
) -> Module<'ll> {
    let ll_module = ll_context.create_module(&lir_unit.metadata.unit_name);
    let ctx = CodegenCtx::new(lir_ctx, ll_context, ll_module);

    compile_lir_unit::<CodegenBuilder>(&ctx, lir_unit);

    ctx.ll_module
}

/// Verifies `module` and writes it out as textual LLVM IR at `path` (§6's
/// `--emit-llvm-ir`). Verification failures are reported through the return
/// value rather than panicking — an internal-compiler-bug diagnostic (§7,
/// `CE0xxx`), not a process abort.
pub fn verify_and_print_ir(module: &Module<'_>, path: &Path) -> Result<(), String> {
    module.verify().map_err(|err| err.to_string())?;
    module
        .print_to_file(path)
        .map_err(|err| err.to_string())
}
