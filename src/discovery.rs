//! Find mapping targets: declared classes carrying `@map_from(Source)`.
//!
//! Discovery feeds the mapping builder a resolved list of (source, target) pairs. The builder never looks at
//! decorators itself.

use mapforge_core::lang::conventions::MAP_FROM_DECORATOR;
use mapforge_core::naming;
use mapforge_syntax::ast::Span;
use mapforge_syntax::diagnostics::errors;

use crate::model::{DeclaredType, TypeDescriptor, TypeInfo};
use crate::resolve::{Compilation, SourceError};

/// One `@map_from` pair.
#[derive(Debug, Clone, Copy)]
pub struct MapRequest<'a> {
    pub source: &'a TypeDescriptor,
    pub target: &'a DeclaredType,
    /// Span of the decorator.
    pub span: Span,
}

/// Every `@map_from` pair of the pass, in module then declaration order.
///
/// A decorator without exactly one type argument, or whose type does not resolve, is reported and skipped. A
/// source named twice on the same class is only used once.
#[tracing::instrument(skip_all, fields(modules = compilation.modules().len()))]
pub fn discover(compilation: &Compilation) -> (Vec<MapRequest<'_>>, Vec<SourceError>) {
    let mut requests: Vec<MapRequest<'_>> = Vec::new();
    let mut found = Vec::new();

    for (m, module) in compilation.modules().iter().enumerate() {
        let namespace = module.program.namespace();
        for (class, _) in module.program.classes() {
            let qualified = naming::qualify(&namespace, &class.name);
            let Some(target) = compilation.descriptor_by_name(&qualified).and_then(TypeDescriptor::as_declared) else {
                continue;
            };
            // A duplicate declaration lost the index; its decorators are not used either.
            if target.module != m {
                continue;
            }
            for decorator in &class.decorators {
                if decorator.node.name != MAP_FROM_DECORATOR {
                    tracing::debug!(class = %qualified, decorator = %decorator.node.name, "ignoring decorator");
                    continue;
                }
                let [arg] = decorator.node.args.as_slice() else {
                    found.push(SourceError {
                        module: m,
                        error: errors::bad_decorator_arguments(MAP_FROM_DECORATOR, decorator.span),
                    });
                    continue;
                };
                let mut resolve_errors = Vec::new();
                let source_ref = compilation.resolve_type(m, arg, &[], &mut resolve_errors);
                found.extend(resolve_errors.into_iter().map(|error| SourceError { module: m, error }));
                let Some(source) = compilation.descriptor(&source_ref) else {
                    continue;
                };
                let repeated = requests
                    .iter()
                    .any(|r| r.target.key() == target.key() && r.source.key() == source.key());
                if repeated {
                    tracing::warn!(class = %qualified, source = %source_ref, "source listed twice; using it once");
                    continue;
                }
                tracing::debug!(class = %qualified, source = %source_ref, "map requested");
                requests.push(MapRequest {
                    source,
                    target,
                    span: decorator.span,
                });
            }
        }
    }
    (requests, found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::SourceModule;
    use mapforge_syntax::parser::parse_source;

    fn compilation(source: &str) -> Compilation {
        Compilation::new(
            vec![SourceModule {
                file: "m.map".to_string(),
                program: parse_source(source).unwrap(),
                source: source.to_string(),
            }],
            vec![],
        )
    }

    #[test]
    fn test_repeatable_decorator() {
        let c = compilation(
            "namespace app\n\nclass A:\n    x: int\n\nclass B:\n    x: int\n\n@map_from(A)\n@map_from(B)\n@map_from(A)\nclass Dto:\n    x: int\n",
        );
        let (requests, errors) = discover(&c);
        assert!(errors.is_empty());
        let pairs: Vec<(String, String)> = requests
            .iter()
            .map(|r| (r.source.name().to_string(), r.target.name().to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![("A".to_string(), "Dto".to_string()), ("B".to_string(), "Dto".to_string())]
        );
    }

    #[test]
    fn test_bad_decorators_are_reported() {
        let c = compilation("@map_from()\nclass Dto:\n    x: int\n\n@map_from(Missing)\nclass Other:\n    x: int\n");
        let (requests, errors) = discover(&c);
        assert!(requests.is_empty());
        assert_eq!(errors.len(), 2);
        assert!(errors[0].error.message.contains("@map_from"));
        assert!(errors[1].error.message.contains("Missing"));
    }

    #[test]
    fn test_other_decorators_are_ignored() {
        let c = compilation("class A:\n    x: int\n\n@sealed\nclass Dto:\n    x: int\n");
        let (requests, errors) = discover(&c);
        assert!(requests.is_empty());
        assert!(errors.is_empty());
    }
}
