//! Factory analysis: validate a `map` method and split its body for staging.
//!
//! The final construction must be expressible as pure expression trees over the source. The analyzer enforces the
//! shape that makes that possible:
//!
//! 1. The first parameter is the source type (SM0001).
//! 2. The body ends with `return new Target(...)` (SM0002).
//! 3. Named initializers of that construction that name a target property become [`MapFactoryProperty`]s.
//! 4. Every earlier statement is classified with a growing set of *tainted* locals:
//!    - a `let` binding whose initializer reads the source parameter becomes a [`MapFactoryVariable`] and taints
//!      its name;
//!    - any other statement that reads the source parameter is rejected (SM0003);
//!    - any statement that reads a tainted local is rejected (SM0004);
//!    - everything else is a residual statement, replayed before the stages.
//! 5. Residuals replay before the variables are evaluated. A local read before its `let`, or changed after a
//!    variable read it, would observe a different value, so both are rejected (SM0007).
//! 6. A tainted local may be read at most once in the final construction (SM0004).
//! 7. Loops and early returns are rejected (SM0006) once the other statement checks pass.
//!
//! Every problem of a method is reported, not just the first.

use mapforge_syntax::ast::{Binding, Expr, LetStmt, NewExpr, Span, Spanned, Statement};

use crate::diagnostics::{FactorySite, MapDiagnostic};
use crate::digest::digest;
use crate::mapping::typing::TypeEnv;
use crate::mapping::{Map, MapFactory, MapFactoryProperty, MapFactoryVariable, ResidualLocal};
use crate::model::{DeclaredType, MethodDescriptor, TypeInfo, TypeRef, is_type};
use crate::resolve::Compilation;

/// An identifier read and where it happens.
type Read<'a> = (&'a str, Span);

#[tracing::instrument(skip_all, fields(method = %method.declaration()))]
pub fn analyze(
    compilation: &Compilation,
    map: &Map,
    source: &(impl TypeInfo + ?Sized),
    target: &DeclaredType,
    method: &MethodDescriptor,
) -> Result<MapFactory, Vec<MapDiagnostic>> {
    let site = FactorySite {
        target: target.name(),
        method: &method.name,
        module: target.module,
    };

    let source_param = match method.parameters.first() {
        Some(p) if is_type(source, &p.ty) => p,
        Some(p) => return Err(vec![site.invalid_first_parameter(&map.source.to_string(), p.span)]),
        None => return Err(vec![site.invalid_first_parameter(&map.source.to_string(), method.span)]),
    };
    let src = source_param.name.as_str();

    let body: &[Spanned<Statement>] = method.body.as_deref().unwrap_or_default();
    let generics: Vec<String> = target.type_params().iter().map(|t| t.name.clone()).collect();
    let (prefix, new) = match split_terminal(body) {
        Some(found) => found,
        None => {
            let span = body.last().map_or(method.span, |s| s.span);
            return Err(vec![site.no_return(span)]);
        }
    };
    let built = compilation.resolve_type(target.module, &new.ty, &generics, &mut Vec::new());
    if !is_type(target, &built) {
        return Err(vec![site.wrong_return_type(&built.to_string(), new.ty.span)]);
    }

    let mut env = TypeEnv::new(compilation, target.module, &generics);
    for p in &method.parameters {
        env.bind(p.name.clone(), p.ty.clone());
    }

    let mut diagnostics = Vec::new();
    let mut tainted: Vec<String> = Vec::new();
    let mut variables = Vec::new();
    let mut residuals = Vec::new();
    let mut residual_locals = Vec::new();

    // Residuals run before the variables are evaluated, so every local a variable reads must be settled by then.
    let locals: Vec<&str> = prefix
        .iter()
        .filter_map(|stmt| match &stmt.node {
            Statement::Let(let_stmt) => Some(let_stmt.bindings.iter().map(|b| b.name.node.as_str())),
            _ => None,
        })
        .flatten()
        .collect();
    let mut declared: Vec<&str> = method.parameters.iter().map(|p| p.name.as_str()).collect();
    // (local, variable that read it)
    let mut staged: Vec<(&str, &str)> = Vec::new();

    for stmt in prefix {
        match &stmt.node {
            Statement::Let(let_stmt) => {
                for binding in &let_stmt.bindings {
                    let name = binding.name.node.as_str();
                    let mut reads = Vec::new();
                    if let Some(value) = &binding.value {
                        expr_reads(value, &mut reads);
                    }
                    let tainted_read = reads.iter().find(|(n, _)| tainted.iter().any(|t| t == n));
                    let early_read = reads.iter().find(|(n, _)| declared_later(n, &locals, &declared));
                    let problem = if let Some((read, span)) = tainted_read {
                        Some(site.invalid_variable_reference(read, src, *span))
                    } else if let Some((read, span)) = early_read {
                        Some(site.read_before_declaration(read, *span))
                    } else {
                        staged
                            .iter()
                            .find(|(local, _)| *local == name)
                            .map(|(local, variable)| site.changed_after_staging(local, variable, binding.name.span))
                    };
                    declared.push(name);
                    if let Some(diagnostic) = problem {
                        diagnostics.push(diagnostic);
                        continue;
                    }
                    let ty = binding_type(compilation, target.module, &generics, &env, binding);
                    env.bind(binding.name.node.clone(), ty.clone());
                    match &binding.value {
                        Some(init) if reads.iter().any(|(n, _)| *n == src) => {
                            staged.extend(reads.iter().filter(|(n, _)| *n != src).map(|(n, _)| (*n, name)));
                            tainted.push(binding.name.node.clone());
                            variables.push(MapFactoryVariable {
                                name: binding.name.node.clone(),
                                ty,
                                init: init.clone(),
                                span: binding.name.span,
                            });
                        }
                        _ => {
                            residual_locals.push(ResidualLocal {
                                name: binding.name.node.clone(),
                                ty,
                            });
                            residuals.push(Spanned::new(
                                Statement::Let(LetStmt {
                                    bindings: vec![binding.clone()],
                                }),
                                stmt.span,
                            ));
                        }
                    }
                }
            }
            Statement::Pass => {}
            _ => {
                let mut reads = Vec::new();
                stmt_reads(stmt, &mut reads);
                let hit = reads
                    .iter()
                    .find(|(n, _)| *n == src || tainted.iter().any(|t| t == n));
                match hit {
                    Some((name, _)) if *name == src => diagnostics.push(site.unsupported_statement(src, stmt.span)),
                    Some((name, span)) => diagnostics.push(site.invalid_variable_reference(name, src, *span)),
                    None => {
                        let mut assigned = Vec::new();
                        assignments(stmt, &mut assigned);
                        let early = reads.iter().find(|(n, _)| declared_later(n, &locals, &declared));
                        let changed = assigned
                            .iter()
                            .find_map(|(n, span)| staged.iter().find(|(local, _)| local == n).map(|s| (s, *span)));
                        if let Some((name, span)) = early {
                            diagnostics.push(site.read_before_declaration(name, *span));
                        } else if let Some(((local, variable), span)) = changed {
                            diagnostics.push(site.changed_after_staging(local, variable, span));
                        } else if let Some((what, span)) = control_flow(stmt) {
                            diagnostics.push(site.unsupported_control_flow(what, span));
                        } else {
                            residuals.push(stmt.clone());
                        }
                    }
                }
            }
        }
    }

    let mut properties: Vec<MapFactoryProperty> = Vec::new();
    for arg in &new.args {
        let Some(name) = &arg.name else {
            continue;
        };
        let Some(prop) = target.property(&name.node) else {
            tracing::debug!(name = %name.node, "initializer does not name a target property");
            continue;
        };
        if properties.iter().any(|p| p.target.name == prop.name) {
            tracing::debug!(name = %name.node, "repeated initializer ignored");
            continue;
        }
        properties.push(MapFactoryProperty {
            target: prop.clone(),
            init: arg.value.clone(),
        });
    }

    let mut consumed: Vec<&str> = Vec::new();
    for prop in &properties {
        let mut reads = Vec::new();
        expr_reads(&prop.init, &mut reads);
        for (name, span) in reads {
            if !tainted.iter().any(|t| t == name) {
                continue;
            }
            if consumed.contains(&name) {
                diagnostics.push(site.invalid_variable_reference(name, src, span));
            } else {
                consumed.push(name);
            }
        }
    }

    if !diagnostics.is_empty() {
        return Err(diagnostics);
    }

    let declaration = method.declaration();
    Ok(MapFactory {
        method: method.clone(),
        source_param: src.to_string(),
        parameters: method.parameters[1..].to_vec(),
        variables,
        properties,
        residuals,
        residual_locals,
        digest: digest(&declaration),
        declaration,
    })
}

/// Split off a terminal `return new T(...)`.
fn split_terminal(body: &[Spanned<Statement>]) -> Option<(&[Spanned<Statement>], &NewExpr)> {
    let (last, prefix) = body.split_last()?;
    let Statement::Return(Some(value)) = &last.node else {
        return None;
    };
    let mut expr = &value.node;
    while let Expr::Paren(inner) = expr {
        expr = &inner.node;
    }
    match expr {
        Expr::New(new) => Some((prefix, new)),
        _ => None,
    }
}

fn binding_type(
    compilation: &Compilation,
    module: usize,
    generics: &[String],
    env: &TypeEnv<'_>,
    binding: &Binding,
) -> TypeRef {
    if let Some(annotation) = &binding.ty {
        let mut errors = Vec::new();
        let ty = compilation.resolve_type(module, annotation, generics, &mut errors);
        for error in errors {
            tracing::warn!(local = %binding.name.node, "{}", error.message);
        }
        return ty;
    }
    match &binding.value {
        Some(value) => env.infer(&value.node),
        None => TypeRef::any(),
    }
}

/// Identifier reads of an expression, in pre-order.
pub fn expr_reads<'a>(expr: &'a Spanned<Expr>, out: &mut Vec<Read<'a>>) {
    match &expr.node {
        Expr::Ident(name) => out.push((name, expr.span)),
        Expr::Literal(_) => {}
        Expr::Field(base, _) => expr_reads(base, out),
        Expr::MethodCall(receiver, _, args) => {
            expr_reads(receiver, out);
            for arg in args {
                expr_reads(arg, out);
            }
        }
        Expr::Call(callee, args) => {
            expr_reads(callee, out);
            for arg in args {
                expr_reads(arg, out);
            }
        }
        Expr::If(ife) => {
            expr_reads(&ife.then_branch, out);
            expr_reads(&ife.condition, out);
            expr_reads(&ife.else_branch, out);
        }
        Expr::Binary(lhs, _, rhs) => {
            expr_reads(lhs, out);
            expr_reads(rhs, out);
        }
        Expr::Unary(_, operand) => expr_reads(operand, out),
        Expr::New(new) => {
            for arg in &new.args {
                expr_reads(&arg.value, out);
            }
        }
        Expr::Paren(inner) => expr_reads(inner, out),
    }
}

/// Identifier reads of a statement, in pre-order. An assignment target counts as a read.
fn stmt_reads<'a>(stmt: &'a Spanned<Statement>, out: &mut Vec<Read<'a>>) {
    match &stmt.node {
        Statement::Let(let_stmt) => {
            for value in let_stmt.bindings.iter().filter_map(|b| b.value.as_ref()) {
                expr_reads(value, out);
            }
        }
        Statement::Assign(assign) => {
            out.push((&assign.target.node, assign.target.span));
            expr_reads(&assign.value, out);
        }
        Statement::Expr(expr) => expr_reads(expr, out),
        Statement::If(if_stmt) => {
            expr_reads(&if_stmt.condition, out);
            block_reads(&if_stmt.then_body, out);
            for (condition, body) in &if_stmt.elif_branches {
                expr_reads(condition, out);
                block_reads(body, out);
            }
            if let Some(body) = &if_stmt.else_body {
                block_reads(body, out);
            }
        }
        Statement::While(while_stmt) => {
            expr_reads(&while_stmt.condition, out);
            block_reads(&while_stmt.body, out);
        }
        Statement::Return(Some(value)) => expr_reads(value, out),
        Statement::Return(None) | Statement::Pass => {}
    }
}

fn block_reads<'a>(body: &'a [Spanned<Statement>], out: &mut Vec<Read<'a>>) {
    for stmt in body {
        stmt_reads(stmt, out);
    }
}

/// A top-level local whose `let` has not been reached yet.
fn declared_later(name: &str, locals: &[&str], declared: &[&str]) -> bool {
    locals.contains(&name) && !declared.contains(&name)
}

/// Assignment targets of a statement, including those inside branches and loops.
fn assignments<'a>(stmt: &'a Spanned<Statement>, out: &mut Vec<Read<'a>>) {
    match &stmt.node {
        Statement::Assign(assign) => out.push((&assign.target.node, assign.target.span)),
        Statement::If(if_stmt) => {
            let bodies = if_stmt
                .then_body
                .iter()
                .chain(if_stmt.elif_branches.iter().flat_map(|(_, body)| body.iter()))
                .chain(if_stmt.else_body.iter().flatten());
            for inner in bodies {
                assignments(inner, out);
            }
        }
        Statement::While(while_stmt) => {
            for inner in &while_stmt.body {
                assignments(inner, out);
            }
        }
        _ => {}
    }
}

/// First loop or early return inside a statement.
fn control_flow(stmt: &Spanned<Statement>) -> Option<(&'static str, Span)> {
    match &stmt.node {
        Statement::While(_) => Some(("'while' loops cannot be staged", stmt.span)),
        Statement::Return(_) => Some(("'return' is only allowed as the final statement", stmt.span)),
        Statement::If(if_stmt) => if_stmt
            .then_body
            .iter()
            .chain(if_stmt.elif_branches.iter().flat_map(|(_, body)| body.iter()))
            .chain(if_stmt.else_body.iter().flatten())
            .find_map(control_flow),
        _ => None,
    }
}
