//! One compile pass: parse, resolve, discover, analyze, stage and emit.
//!
//! Problems come in two tiers:
//!
//! - [`SourceError`]s (syntax, unknown types, bad decorators) stop emission, because the generated code could not
//!   compile. Analysis still runs so a `check` reports as much as possible.
//! - [`MapDiagnostic`]s (SM codes) only drop the offending factory. The rest of the pass is emitted.

use mapforge_runtime::{CompiledType, MapPlan};
use mapforge_syntax::parser::parse_source;
use miette::Report;

use crate::backend::{self, EmitError, EmitOptions, MapUnit};
use crate::diagnostics::MapDiagnostic;
use crate::discovery::discover;
use crate::mapping::{Map, build_map};
use crate::resolve::{Compilation, SourceError, SourceModule};

/// A source file handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    pub file: String,
    pub source: String,
}

impl SourceInput {
    pub fn new(file: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug)]
pub struct CompileOutput {
    /// Inputs in pass order; error and diagnostic module indices point into this list.
    pub inputs: Vec<SourceInput>,
    pub errors: Vec<SourceError>,
    pub diagnostics: Vec<MapDiagnostic>,
    pub maps: Vec<Map>,
    /// One plan per map, same order as `maps`.
    pub plans: Vec<MapPlan>,
    /// Generated Rust, absent when there are source errors.
    pub code: Option<String>,
}

impl CompileOutput {
    /// Any error-severity problem, either tier.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.error.is_error()) || self.diagnostics.iter().any(MapDiagnostic::is_error)
    }

    /// The plan mapping `source` to `target` (qualified names).
    pub fn plan(&self, source: &str, target: &str) -> Option<&MapPlan> {
        self.plans.iter().find(|p| p.source == source && p.target == target)
    }

    /// Every problem as a `miette` report, source errors first.
    pub fn reports(&self) -> Vec<Report> {
        let input = |module: usize| self.inputs.get(module).map(|i| (i.file.as_str(), i.source.as_str()));
        let errors = self.errors.iter().filter_map(|e| {
            let (file, source) = input(e.module)?;
            Some(e.error.to_report(file, source))
        });
        let diagnostics = self.diagnostics.iter().filter_map(|d| {
            let (file, source) = input(d.module)?;
            Some(d.to_report(file, source))
        });
        errors.chain(diagnostics).collect()
    }
}

/// Compile `inputs` against the `compiled` type metadata, emitting with [`EmitOptions::default`].
pub fn compile(inputs: Vec<SourceInput>, compiled: Vec<CompiledType>) -> Result<CompileOutput, EmitError> {
    compile_with(inputs, compiled, &EmitOptions::default())
}

/// Compile `inputs` against the `compiled` type metadata.
///
/// Only an emission failure is an `Err`; every other problem is reported in the output.
#[tracing::instrument(skip_all, fields(inputs = inputs.len(), compiled = compiled.len()))]
pub fn compile_with(
    inputs: Vec<SourceInput>,
    compiled: Vec<CompiledType>,
    options: &EmitOptions,
) -> Result<CompileOutput, EmitError> {
    let mut output = CompileOutput {
        inputs: Vec::new(),
        errors: Vec::new(),
        diagnostics: Vec::new(),
        maps: Vec::new(),
        plans: Vec::new(),
        code: None,
    };

    let mut modules = Vec::new();
    for (m, input) in inputs.iter().enumerate() {
        match parse_source(&input.source) {
            Ok(program) => modules.push(SourceModule {
                file: input.file.clone(),
                source: input.source.clone(),
                program,
            }),
            Err(errors) => output
                .errors
                .extend(errors.into_iter().map(|error| SourceError { module: m, error })),
        }
    }
    output.inputs = inputs;
    if !output.errors.is_empty() {
        tracing::debug!(errors = output.errors.len(), "syntax errors; stopping before resolution");
        return Ok(output);
    }

    let compilation = Compilation::new(modules, compiled);
    let (requests, discovery_errors) = discover(&compilation);
    output.errors.extend(compilation.errors());
    output.errors.extend(discovery_errors);

    for request in &requests {
        let (map, diagnostics) = build_map(&compilation, request.source, request.target);
        output.diagnostics.extend(diagnostics);
        let (plan, diagnostics) = backend::plan_map(&compilation, &map);
        output.diagnostics.extend(diagnostics);
        output.maps.push(map);
        output.plans.push(plan);
    }
    tracing::debug!(
        maps = output.maps.len(),
        errors = output.errors.len(),
        diagnostics = output.diagnostics.len(),
        "analysis finished"
    );

    if output.errors.iter().any(|e| e.error.is_error()) {
        return Ok(output);
    }
    let units: Vec<MapUnit<'_>> = output
        .maps
        .iter()
        .zip(&output.plans)
        .map(|(map, plan)| MapUnit { map, plan })
        .collect();
    let code = backend::emit(&compilation, &units, options)?;
    output.code = Some(code);
    Ok(output)
}
