//! Command implementations for the mapforge CLI

use std::fs;
use std::path::{Path, PathBuf};

use mapforge_runtime::CompiledType;
use mapforge_syntax::diagnostics;
use mapforge_syntax::{lexer, parser};

use super::{CliError, CliResult, ExitCode};
use crate::backend::EmitOptions;
use crate::compiler::{CompileOutput, SourceInput, compile_with};

/// Extension of mapping declaration files.
pub const SOURCE_EXTENSION: &str = "map";

/// Maximum source file size (100 MB)
const MAX_SOURCE_SIZE: u64 = 100 * 1024 * 1024;

/// Read a source file, refusing files over `MAX_SOURCE_SIZE`.
pub fn read_source(path: &Path) -> CliResult<String> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::failure(format!("Cannot access file '{}': {}", path.display(), e)))?;

    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }

    fs::read_to_string(path).map_err(|e| CliError::failure(format!("Error reading file '{}': {}", path.display(), e)))
}

/// `.map` files under `path`, sorted so passes are reproducible. Hidden directories and `target` are skipped.
pub fn collect_map_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if path.is_file() {
        if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            files.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        if let Ok(entries) = fs::read_dir(path) {
            for entry in entries.flatten() {
                let entry_path = entry.path();
                if entry_path.is_dir() {
                    let name = entry_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                    if !name.starts_with('.') && name != "target" {
                        files.extend(collect_map_files(&entry_path));
                    }
                } else if entry_path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
                    files.push(entry_path);
                }
            }
        }
    }

    files.sort();
    files
}

/// Read every source under `paths`.
pub fn load_inputs(paths: &[PathBuf]) -> CliResult<Vec<SourceInput>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(CliError::failure(format!("Path '{}' does not exist", path.display())));
        }
        for file in collect_map_files(path) {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }
    if files.is_empty() {
        return Err(CliError::failure(format!("No .{SOURCE_EXTENSION} files found")));
    }
    files
        .iter()
        .map(|file| Ok(SourceInput::new(file.display().to_string(), read_source(file)?)))
        .collect()
}

/// Compiled type metadata from a JSON array of `CompiledType`s.
pub fn load_metadata(path: Option<&Path>) -> CliResult<Vec<CompiledType>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = read_source(path)?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::failure(format!("Invalid metadata file '{}': {}", path.display(), e)))
}

fn run_compile(paths: &[PathBuf], metadata: Option<&Path>, options: &EmitOptions) -> CliResult<CompileOutput> {
    let inputs = load_inputs(paths)?;
    let compiled = load_metadata(metadata)?;
    let output = compile_with(inputs, compiled, options)
        .map_err(|e| CliError::failure(format!("Error generating code: {e}")))?;
    for report in output.reports() {
        eprintln!("{report:?}");
    }
    Ok(output)
}

fn summary(output: &CompileOutput) -> String {
    let errors = output.errors.iter().filter(|e| e.error.is_error()).count()
        + output.diagnostics.iter().filter(|d| d.is_error()).count();
    format!("{errors} error(s) in {} file(s)", output.inputs.len())
}

/// Compile and write the generated Rust to `out` (stdout when absent).
///
/// Code is written whenever the pass produced it, even if some factories were rejected; the exit code still
/// reports the rejected factories.
pub fn generate(
    paths: &[PathBuf],
    metadata: Option<&Path>,
    out: Option<&Path>,
    options: &EmitOptions,
) -> CliResult<ExitCode> {
    let output = run_compile(paths, metadata, options)?;
    let Some(code) = &output.code else {
        return Err(CliError::failure(format!("No code generated: {}", summary(&output))));
    };

    match out {
        Some(path) => {
            fs::write(path, code)
                .map_err(|e| CliError::failure(format!("Error writing '{}': {}", path.display(), e)))?;
            eprintln!("✓ Wrote {} mapper(s) to {}", output.plans.len(), path.display());
        }
        None => print!("{code}"),
    }

    if output.has_errors() {
        return Err(CliError::failure(summary(&output)));
    }
    Ok(ExitCode::SUCCESS)
}

/// Compile without writing anything. With `plans`, print every expression tree.
pub fn check(paths: &[PathBuf], metadata: Option<&Path>, plans: bool) -> CliResult<ExitCode> {
    let output = run_compile(paths, metadata, &EmitOptions::default())?;

    if plans {
        for plan in &output.plans {
            println!("{} -> {}", plan.source, plan.target);
            println!("  default: {}", plan.default_expression);
            for factory in &plan.factories {
                println!("  {} [{}]", factory.declaration, factory.digest);
                for stage in [Some(&factory.params_stage), factory.vars_stage.as_ref(), Some(&factory.final_stage)]
                    .into_iter()
                    .flatten()
                {
                    println!("    {stage}");
                }
            }
        }
    }

    if output.has_errors() {
        return Err(CliError::failure(summary(&output)));
    }
    println!("✓ {} map(s) checked", output.plans.len());
    Ok(ExitCode::SUCCESS)
}

/// Lex and display tokens.
pub fn lex_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let file_name = path.display().to_string();
    let tokens = lexer::lex(&source).map_err(|errs| {
        let msg: String = errs
            .iter()
            .map(|err| diagnostics::format_error(&file_name, &source, err))
            .collect();
        CliError::failure(msg.trim_end())
    })?;

    for tok in &tokens {
        println!("{:?}", tok);
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse and display the AST.
pub fn parse_file(path: &Path) -> CliResult<ExitCode> {
    let source = read_source(path)?;
    let file_name = path.display().to_string();
    let format_all = |errs: Vec<diagnostics::CompileError>| {
        let msg: String = errs
            .iter()
            .map(|err| diagnostics::format_error(&file_name, &source, err))
            .collect();
        CliError::failure(msg.trim_end())
    };
    let tokens = lexer::lex(&source).map_err(format_all)?;
    let program = parser::parse(&tokens).map_err(format_all)?;
    println!("{:#?}", program);
    Ok(ExitCode::SUCCESS)
}
