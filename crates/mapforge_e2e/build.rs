//! Build script for the generated mappers.
//!
//! Compiles every `.map` file under `tests/fixtures/valid` against `metadata/types.json` and writes the result to
//! `OUT_DIR/mappers.rs`, which `src/lib.rs` includes next to the compiled `app` types.

use std::path::Path;
use std::{env, fs};

use mapforge::{EmitOptions, SourceInput, compile_with};
use mapforge_runtime::CompiledType;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let fixtures = Path::new(&manifest_dir).join("../../tests/fixtures/valid");
    let metadata = Path::new(&manifest_dir).join("metadata/types.json");

    let mut paths: Vec<_> = fs::read_dir(&fixtures)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|e| e == "map"))
        .collect();
    // Deterministic input order
    paths.sort();

    let inputs = paths
        .iter()
        .map(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap().to_string();
            SourceInput::new(name, fs::read_to_string(path).unwrap())
        })
        .collect();
    let compiled: Vec<CompiledType> = serde_json::from_str(&fs::read_to_string(&metadata).unwrap()).unwrap();

    let output = compile_with(inputs, compiled, &EmitOptions::default()).unwrap();
    if output.has_errors() {
        let errors: Vec<String> = output.errors.iter().map(|e| format!("{e:?}")).collect();
        let diagnostics: Vec<String> = output.diagnostics.iter().map(ToString::to_string).collect();
        panic!("mapping fixtures do not compile: {errors:?} {diagnostics:?}");
    }
    let code = output.code.unwrap();
    fs::write(Path::new(&out_dir).join("mappers.rs"), code).unwrap();

    println!("cargo:rerun-if-changed={}", fixtures.display());
    for path in &paths {
        println!("cargo:rerun-if-changed={}", path.display());
    }
    println!("cargo:rerun-if-changed={}", metadata.display());
}
