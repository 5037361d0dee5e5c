//! The `slangc` CLI driver (§6): turns argv plus a source path into an
//! executable or library artifact, consulting the incremental cache (§4.6)
//! and driving the unit loader → validator → lowering pipeline in
//! `slangc_sema`, then LLVM codegen and linking.
//!
//! Lexing and parsing a concrete source file into `slangc_sema::ast::Unit`
//! is out of scope here (see `slangc_sema::ast`'s own module doc) — no front
//! end exists anywhere in this workspace to call. `placeholder_root_unit`
//! below is the explicit seam where a real parser would plug in; until one
//! exists, the driver still reads and fingerprints the source file so the
//! cache and diagnostics machinery run against real bytes end to end.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use inkwell::context::Context;
use tracing::{debug, info};

use slangc_abi::target::BackendKind;
use slangc_cache::libfmt::{self, LibraryMetadata};
use slangc_cache::{fingerprint_unit, Cache, Manifest, ObjectKind};
use slangc_codegen_llvm::entry::{llvm_codegen_lir_unit, verify_and_print_ir};
use slangc_codegen_llvm::linker::{self, LinkInput, SourceKind};
use slangc_lir::lir::{EmitKind, LirCtx};
use slangc_sema::ast::{Block, FunctionDecl, Ty, Unit, Visibility};
use slangc_sema::diagnostics::{Diagnostic, Severity};

const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");
const TARGET_TRIPLE: &str = "x86_64-unknown-linux-gnu";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OptLevel {
    None,
    Mem2reg,
    O1,
    O2,
    O3,
}

impl OptLevel {
    fn as_str(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Mem2reg => "mem2reg",
            OptLevel::O1 => "O1",
            OptLevel::O2 => "O2",
            OptLevel::O3 => "O3",
        }
    }
}

/// The sushi compiler.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the root source unit.
    source: PathBuf,

    /// Output path for the executable, object, or library artifact.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OptLevel::Mem2reg)]
    opt_level: OptLevel,

    /// Also write textual LLVM IR alongside the binary.
    #[arg(long)]
    emit_llvm_ir: bool,

    /// Keep the intermediate object file instead of removing it after linking.
    #[arg(long)]
    keep_object: bool,

    /// Dump the (currently placeholder) parsed AST and exit.
    #[arg(long)]
    dump_ast: bool,

    /// Skip LLVM module verification before emission.
    #[arg(long)]
    no_verify: bool,

    /// Produce a library artifact (§6) instead of an executable.
    #[arg(long)]
    library: bool,

    /// Print a library artifact's metadata and exit, instead of compiling.
    #[arg(long)]
    show_library_metadata: bool,

    /// Ignore the cache and rebuild everything.
    #[arg(long)]
    force_rebuild: bool,

    /// Use this directory instead of `./__sushi_cache__`.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Wipe the cache before compiling.
    #[arg(long)]
    wipe_cache: bool,

    /// Use the simple linker fallback instead of the two-phase linker (§4.5).
    #[arg(long)]
    simple_linker: bool,
}

fn main() -> ExitCode {
    init_slangc_logger();

    let args = Args::parse();

    if args.show_library_metadata {
        return show_library_metadata(&args.source);
    }

    let cwd = std::env::var("SUSHI_CWD").map(PathBuf::from).unwrap_or_else(|_| std::env::current_dir().expect("current dir must be readable"));
    let source_path = if args.source.is_absolute() { args.source.clone() } else { cwd.join(&args.source) };

    let source_bytes = match fs::read(&source_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("error: cannot read {}: {}", source_path.display(), err);
            return ExitCode::from(2);
        }
    };

    let unit_name = source_path.file_stem().and_then(|s| s.to_str()).unwrap_or("main").to_string();
    let root_unit = placeholder_root_unit(&unit_name);
    if args.dump_ast {
        println!("{:#?}", root_unit);
        return ExitCode::from(0);
    }

    let cache_dir = args.cache_dir.clone().unwrap_or_else(|| cwd.join("__sushi_cache__"));
    let manifest = Manifest {
        compiler_version: COMPILER_VERSION.to_string(),
        target_triple: TARGET_TRIPLE.to_string(),
        opt_level: args.opt_level.as_str().to_string(),
    };

    let cache = match Cache::open(&cache_dir, &manifest) {
        Ok(cache) => cache,
        Err(err) => {
            eprintln!("error: failed to open cache at {}: {err}", cache_dir.display());
            return ExitCode::from(2);
        }
    };
    if args.wipe_cache {
        if let Err(err) = cache.wipe() {
            eprintln!("error: failed to wipe cache: {err}");
            return ExitCode::from(2);
        }
    }

    let fingerprint = fingerprint_unit(&source_bytes, b"", b"", &[]);
    if !args.force_rebuild {
        if let Some(cached) = cache.lookup(ObjectKind::Unit, &unit_name, &fingerprint) {
            info!(unit = %unit_name, path = %cached.display(), "cache hit, skipping recompilation");
            return ExitCode::from(0);
        }
    }

    let mut available = HashMap::new();
    available.insert(unit_name.clone(), root_unit);

    let outcome = slangc_sema::run(&unit_name, available);
    for diagnostic in outcome.reporter.diagnostics() {
        print_diagnostic(diagnostic);
    }

    let Some(lir_unit) = outcome.lir_unit else {
        return ExitCode::from(outcome.exit_code() as u8);
    };

    let lir_ctx = LirCtx::new(BackendKind::Llvm, EmitKind::Object);
    let ll_context = Context::create();
    let module = llvm_codegen_lir_unit(&ll_context, lir_ctx, lir_unit);

    let linked = if args.simple_linker {
        linker::link_simple(&ll_context, &unit_name, vec![module])
    } else {
        linker::link_two_phase(&ll_context, &unit_name, vec![LinkInput { module, source: SourceKind::Main }])
    };
    let module = match linked {
        Ok(module) => module,
        Err(err) => {
            eprintln!("error: linking failed: {err}");
            return ExitCode::from(2);
        }
    };

    let output_path = args.output.clone().unwrap_or_else(|| PathBuf::from(&unit_name));

    if !args.no_verify || args.emit_llvm_ir {
        let ir_path = output_path.with_extension("ll");
        if let Err(err) = verify_and_print_ir(&module, &ir_path) {
            eprintln!("error: module verification failed: {err}");
            return ExitCode::from(2);
        }
        debug!(path = %ir_path.display(), "wrote textual LLVM IR");
    }

    let bitcode = module.write_bitcode_to_memory().as_slice().to_vec();

    if args.library {
        let metadata = library_metadata(&unit_name);
        let artifact_path = output_path.with_extension("sulib");
        if let Err(err) = libfmt::write_library_artifact(&artifact_path, &metadata, &bitcode) {
            eprintln!("error: failed to write library artifact: {err}");
            return ExitCode::from(2);
        }
        info!(path = %artifact_path.display(), "wrote library artifact");
    }

    if let Err(err) = cache.store(ObjectKind::Unit, &unit_name, &fingerprint, &bitcode) {
        eprintln!("error: failed to update cache: {err}");
        return ExitCode::from(2);
    }

    // `--keep-object` has nothing to do yet: native object emission is
    // delegated to an LLVM binding treated as a black box (out of scope),
    // and this driver currently only writes bitcode into the cache slot.
    let _ = args.keep_object;

    ExitCode::from(outcome.exit_code() as u8)
}

/// The parser-less stand-in for a root unit: an empty unit whose only
/// function is `main`, returning `0`. Exists so the rest of the pipeline
/// (loader, collector, validator, lowering, codegen, cache) has something
/// real to run end to end; replace with an actual parse once a front end
/// exists.
fn placeholder_root_unit(name: &str) -> Unit {
    Unit {
        name: name.to_string(),
        imports: Vec::new(),
        structs: Vec::new(),
        enums: Vec::new(),
        perks: Vec::new(),
        extensions: Vec::new(),
        functions: vec![FunctionDecl {
            name: "main".to_string(),
            visibility: Visibility::Public,
            generics: Vec::new(),
            params: Vec::new(),
            return_ty: Ty::Named("i32".to_string()),
            body: Block::default(),
        }],
        consts: Vec::new(),
    }
}

fn library_metadata(library_name: &str) -> LibraryMetadata {
    LibraryMetadata {
        sushi_lib_version: 1,
        library_name: library_name.to_string(),
        compiled_at: "unknown".to_string(),
        platform: TARGET_TRIPLE.to_string(),
        compiler_version: COMPILER_VERSION.to_string(),
        public_functions: Vec::new(),
        public_constants: Vec::new(),
        structs: Vec::new(),
        enums: Vec::new(),
        dependencies: Vec::new(),
    }
}

fn show_library_metadata(path: &PathBuf) -> ExitCode {
    let sidecar_path = path.with_extension("sushilib");
    match libfmt::read_sidecar(&sidecar_path) {
        Ok(sidecar) => {
            println!("{:#?}", sidecar);
            ExitCode::from(0)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let prefix = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    match &diagnostic.unit {
        Some(unit) => eprintln!("{prefix}[{}] in {unit}: {}", diagnostic.code, diagnostic.message),
        None => eprintln!("{prefix}[{}]: {}", diagnostic.code, diagnostic.message),
    }
}

fn init_slangc_logger() {
    if let Err(err) = slangc_log::Logger::init_logger(slangc_log::LoggerConfig::from_env("SLANGC").unwrap_or_else(|_| slangc_log::LoggerConfig {
        log_writer: slangc_log::LogWriter::Stderr,
        filter: Err(std::env::VarError::NotPresent),
        color: Err(std::env::VarError::NotPresent),
        line_numbers: Err(std::env::VarError::NotPresent),
    })) {
        eprintln!("error initializing logger: {err}");
    }
}
