//! Maps between a source and a target type.
//!
//! A [`Map`] always has a default property mapping (same-named properties, see [`build_default`]) and zero or more
//! [`MapFactory`]s analyzed from the target's `map` methods. A factory that fails analysis is dropped; its
//! diagnostics are returned next to the map and the default mapping stays available.

pub mod analyzer;
pub mod typing;

use mapforge_core::lang::conventions::FACTORY_METHOD_NAME;
use mapforge_syntax::ast::{Expr, Span, Spanned, Statement};

use crate::diagnostics::MapDiagnostic;
use crate::model::{DeclaredType, MethodDescriptor, ParameterDescriptor, PropertyDescriptor, TypeInfo, TypeRef};
use crate::resolve::Compilation;

/// A same-named property pair of the default mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MapProperty {
    pub source: PropertyDescriptor,
    pub target: PropertyDescriptor,
}

/// An explicit `name = expr` initializer of a factory's final construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFactoryProperty {
    pub target: PropertyDescriptor,
    pub init: Spanned<Expr>,
}

/// A factory local whose initializer reads the source parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFactoryVariable {
    pub name: String,
    pub ty: TypeRef,
    pub init: Spanned<Expr>,
    pub span: Span,
}

/// A local declared by a residual statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualLocal {
    pub name: String,
    pub ty: TypeRef,
}

/// A validated factory method.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFactory {
    pub method: MethodDescriptor,
    pub source_param: String,
    /// Parameters after the source parameter.
    pub parameters: Vec<ParameterDescriptor>,
    pub variables: Vec<MapFactoryVariable>,
    pub properties: Vec<MapFactoryProperty>,
    /// Source-independent statements, replayed in order before the stages run.
    pub residuals: Vec<Spanned<Statement>>,
    pub residual_locals: Vec<ResidualLocal>,
    pub declaration: String,
    pub digest: String,
}

impl MapFactory {
    /// No extra parameters, no variables and nothing to replay: the factory is the default mapping plus its
    /// explicit initializers.
    pub fn is_degenerate(&self) -> bool {
        self.parameters.is_empty() && self.variables.is_empty() && self.residuals.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    pub source: TypeRef,
    pub target: TypeRef,
    /// Module that declares the target.
    pub module: usize,
    pub span: Span,
    pub properties: Vec<MapProperty>,
    pub factories: Vec<MapFactory>,
}

/// Same-named property pairs, in target property order.
///
/// Only target properties that are readable and writable take part, and the source property must be readable.
/// Target properties without a match are skipped.
pub fn build_default(source: &(impl TypeInfo + ?Sized), target: &(impl TypeInfo + ?Sized)) -> Vec<MapProperty> {
    target
        .properties()
        .iter()
        .filter(|t| t.readable && t.writable)
        .filter_map(|t| {
            let s = source.property(&t.name).filter(|s| s.readable)?;
            Some(MapProperty {
                source: s.clone(),
                target: t.clone(),
            })
        })
        .collect()
}

/// Build the map for one (source, target) pair, analyzing every `map` method of the target.
#[tracing::instrument(skip_all, fields(source = %source.key(), target = %target.key()))]
pub fn build_map(
    compilation: &Compilation,
    source: &(impl TypeInfo + ?Sized),
    target: &DeclaredType,
) -> (Map, Vec<MapDiagnostic>) {
    let mut map = Map {
        source: TypeRef::new(source.namespace(), source.name()).with_args(source.type_params().to_vec()),
        target: TypeRef::new(target.namespace(), target.name()).with_args(target.type_params().to_vec()),
        module: target.module,
        span: target.span,
        properties: build_default(source, target),
        factories: Vec::new(),
    };
    let mut diagnostics = Vec::new();

    for method in target.methods().iter().filter(|m| m.name == FACTORY_METHOD_NAME) {
        if method.body.is_none() {
            tracing::debug!(declaration = %method.declaration(), "skipping body-less factory");
            continue;
        }
        match analyzer::analyze(compilation, &map, source, target, method) {
            Ok(factory) => {
                tracing::debug!(digest = %factory.digest, declaration = %factory.declaration, "factory accepted");
                map.factories.push(factory);
            }
            Err(found) => {
                tracing::debug!(count = found.len(), declaration = %method.declaration(), "factory rejected");
                diagnostics.extend(found);
            }
        }
    }
    (map, diagnostics)
}
