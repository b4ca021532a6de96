//! Name resolution for one compiler pass.
//!
//! A [`Compilation`] owns the parsed source modules and the compiled-type metadata of the pass. It answers two
//! questions: "what does this written type refer to in this module" ([`Compilation::resolve_type`]) and "what is
//! known about that type" ([`Compilation::descriptor`]).
//!
//! ## Notes
//! - Lookup order for a single-segment name: type parameter, builtin, same namespace, explicit import (or alias),
//!   glob import. Qualified paths are looked up as written.
//! - Per-module [`ResolutionContext`]s are computed on first use and cached for the rest of the pass.
//! - The type table is built in one step on first use and is immutable afterwards.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use mapforge_core::lang::types;
use mapforge_core::naming;
use mapforge_runtime::CompiledType;
use mapforge_syntax::ast::{Declaration, ImportKind, Program, Span, Spanned, Type};
use mapforge_syntax::diagnostics::{CompileError, errors};

use crate::model::{DeclaredType, ResolvedType, TypeDescriptor, TypeInfo, TypeRef};

/// A parsed source file taking part in the pass.
#[derive(Debug, Clone)]
pub struct SourceModule {
    pub file: String,
    pub source: String,
    pub program: Program,
}

/// A compile error located in a module of the pass.
#[derive(Debug, Clone)]
pub struct SourceError {
    pub module: usize,
    pub error: CompileError,
}

/// What a module can see by short name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    pub namespace: String,
    /// `(bound name, qualified path)` for every explicit import, in declaration order.
    pub imports: Vec<(String, String)>,
    /// Namespaces imported with `*`.
    pub globs: Vec<String>,
}

impl ResolutionContext {
    pub fn from_program(program: &Program) -> Self {
        let mut ctx = ResolutionContext {
            namespace: program.namespace(),
            ..Default::default()
        };
        for decl in program.imports() {
            let Declaration::Import(import) = &decl.node else {
                continue;
            };
            let path = import.path.join("::");
            match &import.kind {
                ImportKind::Glob => ctx.globs.push(path),
                ImportKind::Item { .. } => {
                    if let Some(bound) = import.bound_name() {
                        ctx.imports.push((bound.to_string(), path));
                    }
                }
            }
        }
        ctx
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeLocation {
    Declared { module: usize, class: usize },
    Compiled(usize),
}

/// All descriptors of the pass, keyed by qualified name.
#[derive(Debug, Default)]
struct TypeTable {
    types: BTreeMap<String, TypeDescriptor>,
    errors: Vec<SourceError>,
}

/// One compiler pass worth of inputs and caches.
#[derive(Debug)]
pub struct Compilation {
    modules: Vec<SourceModule>,
    compiled: Vec<CompiledType>,
    index: BTreeMap<String, TypeLocation>,
    index_errors: Vec<SourceError>,
    contexts: Vec<OnceCell<ResolutionContext>>,
    table: OnceCell<TypeTable>,
}

impl Compilation {
    /// Index every declared and compiled type. Declared types shadow compiled types of the same name.
    #[tracing::instrument(skip_all, fields(modules = modules.len(), compiled = compiled.len()))]
    pub fn new(modules: Vec<SourceModule>, compiled: Vec<CompiledType>) -> Self {
        let mut index = BTreeMap::new();
        let mut index_errors = Vec::new();

        for (m, module) in modules.iter().enumerate() {
            let namespace = module.program.namespace();
            for (c, (class, span)) in module.program.classes().enumerate() {
                let qualified = naming::qualify(&namespace, &class.name);
                if index.contains_key(&qualified) {
                    index_errors.push(SourceError {
                        module: m,
                        error: errors::duplicate_type(&qualified, span),
                    });
                    continue;
                }
                index.insert(qualified, TypeLocation::Declared { module: m, class: c });
            }
        }
        for (i, ty) in compiled.iter().enumerate() {
            let qualified = ty.qualified_name();
            match index.get(&qualified) {
                Some(TypeLocation::Declared { .. }) => {
                    tracing::debug!(ty = %qualified, "declared type shadows compiled metadata");
                }
                Some(TypeLocation::Compiled(_)) => {
                    tracing::warn!(ty = %qualified, "duplicate compiled metadata ignored");
                }
                None => {
                    index.insert(qualified, TypeLocation::Compiled(i));
                }
            }
        }

        let contexts = modules.iter().map(|_| OnceCell::new()).collect();
        Self {
            modules,
            compiled,
            index,
            index_errors,
            contexts,
            table: OnceCell::new(),
        }
    }

    pub fn modules(&self) -> &[SourceModule] {
        &self.modules
    }

    pub fn module(&self, index: usize) -> Option<&SourceModule> {
        self.modules.get(index)
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.index.contains_key(qualified)
    }

    /// The resolution context of a module, computed on first request.
    pub fn context(&self, module: usize) -> Option<&ResolutionContext> {
        let cell = self.contexts.get(module)?;
        let program = &self.modules.get(module)?.program;
        Some(cell.get_or_init(|| ResolutionContext::from_program(program)))
    }

    /// Descriptor of a resolved type reference, if the pass knows the type.
    pub fn descriptor(&self, ty: &TypeRef) -> Option<&TypeDescriptor> {
        self.table().types.get(&ty.qualified_name())
    }

    pub fn descriptor_by_name(&self, qualified: &str) -> Option<&TypeDescriptor> {
        self.table().types.get(qualified)
    }

    /// Every descriptor of the pass, ordered by qualified name.
    pub fn descriptors(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.table().types.values()
    }

    /// Errors found while indexing and building descriptors.
    pub fn errors(&self) -> Vec<SourceError> {
        let mut out = self.index_errors.clone();
        out.extend(self.table().errors.iter().cloned());
        out
    }

    fn table(&self) -> &TypeTable {
        self.table.get_or_init(|| self.build_table())
    }

    #[tracing::instrument(skip_all)]
    fn build_table(&self) -> TypeTable {
        let mut table = TypeTable::default();
        for (qualified, location) in &self.index {
            let descriptor = match *location {
                TypeLocation::Compiled(i) => match self.compiled.get(i) {
                    Some(ty) => TypeDescriptor::Resolved(ResolvedType::from_compiled(ty)),
                    None => continue,
                },
                TypeLocation::Declared { module, class } => {
                    let Some(m) = self.modules.get(module) else {
                        continue;
                    };
                    let Some((decl, span)) = m.program.classes().nth(class) else {
                        continue;
                    };
                    let namespace = m.program.namespace();
                    let mut errors = Vec::new();
                    let declared = DeclaredType::build(decl, span, &namespace, module, |ty, generics| {
                        self.resolve_type(module, ty, generics, &mut errors)
                    });
                    table
                        .errors
                        .extend(errors.into_iter().map(|error| SourceError { module, error }));
                    TypeDescriptor::Declared(declared)
                }
            };
            tracing::trace!(ty = %qualified, "built type descriptor");
            table.types.insert(qualified.clone(), descriptor);
        }
        table
    }

    fn type_param_count(&self, qualified: &str) -> Option<usize> {
        match *self.index.get(qualified)? {
            TypeLocation::Compiled(i) => self.compiled.get(i).map(|t| t.type_params.len()),
            TypeLocation::Declared { module, class } => self
                .modules
                .get(module)?
                .program
                .classes()
                .nth(class)
                .map(|(c, _)| c.type_params.len()),
        }
    }

    /// Resolve a written type in `module`. Problems are pushed to `errors`; the result is always usable.
    pub fn resolve_type(
        &self,
        module: usize,
        ty: &Spanned<Type>,
        generics: &[String],
        errors: &mut Vec<CompileError>,
    ) -> TypeRef {
        let args: Vec<TypeRef> = ty
            .node
            .args()
            .iter()
            .map(|arg| self.resolve_type(module, arg, generics, errors))
            .collect();
        let Some(base) = self.lookup(module, ty.node.path(), ty.span, generics, errors) else {
            return TypeRef::new("", ty.node.path().join("::")).with_args(args);
        };

        let expected = match base.builtin_id() {
            Some(id) => Some(types::type_param_count(id)),
            None if base.namespace.is_empty() && generics.contains(&base.name) => Some(0),
            None => self.type_param_count(&base.qualified_name()),
        };
        if let Some(expected) = expected.filter(|n| *n != args.len()) {
            errors.push(errors::wrong_type_argument_count(
                &base.qualified_name(),
                expected,
                args.len(),
                ty.span,
            ));
        }
        base.with_args(args)
    }

    fn lookup(
        &self,
        module: usize,
        path: &[String],
        span: Span,
        generics: &[String],
        errors: &mut Vec<CompileError>,
    ) -> Option<TypeRef> {
        let name = match path {
            [name] => name,
            [] => return None,
            _ => {
                let qualified = path.join("::");
                if self.contains(&qualified) {
                    return Some(TypeRef::from_qualified(&qualified));
                }
                errors.push(errors::unknown_type(&qualified, span));
                return None;
            }
        };

        if generics.contains(name) {
            return Some(TypeRef::new("", name.clone()));
        }
        if let Some(id) = types::from_str(name) {
            return Some(TypeRef::builtin(id));
        }

        let ctx = self.context(module)?;
        let local = naming::qualify(&ctx.namespace, name);
        if self.contains(&local) {
            return Some(TypeRef::from_qualified(&local));
        }
        if let Some((_, target)) = ctx.imports.iter().find(|(bound, _)| bound == name) {
            if self.contains(target) {
                return Some(TypeRef::from_qualified(target));
            }
            errors.push(errors::unknown_type(target, span));
            return None;
        }
        let candidates: Vec<String> = ctx
            .globs
            .iter()
            .map(|ns| naming::qualify(ns, name))
            .filter(|q| self.contains(q))
            .collect();
        match candidates.as_slice() {
            [one] => Some(TypeRef::from_qualified(one)),
            [] => {
                errors.push(errors::unknown_type(name, span));
                None
            }
            _ => {
                errors.push(errors::ambiguous_type(name, &candidates, span));
                None
            }
        }
    }

    /// Type of a named member of `owner`, with the owner's type arguments substituted.
    pub fn property_type(&self, owner: &TypeRef, property: &str) -> Option<TypeRef> {
        let descriptor = self.descriptor(owner)?;
        let prop = descriptor.property(property)?;
        Some(substitute(&prop.ty, descriptor.type_params(), &owner.args))
    }
}

/// Replace type parameters by the arguments of a generic application.
pub fn substitute(ty: &TypeRef, params: &[TypeRef], args: &[TypeRef]) -> TypeRef {
    if ty.namespace.is_empty() && ty.args.is_empty() {
        let arg = params
            .iter()
            .position(|p| p.name == ty.name)
            .and_then(|i| args.get(i));
        if let Some(arg) = arg {
            return arg.clone();
        }
    }
    TypeRef {
        namespace: ty.namespace.clone(),
        name: ty.name.clone(),
        args: ty.args.iter().map(|a| substitute(a, params, args)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapforge_runtime::CompiledProperty;
    use mapforge_syntax::parser::parse_source;

    fn module(file: &str, source: &str) -> SourceModule {
        SourceModule {
            file: file.to_string(),
            source: source.to_string(),
            program: parse_source(source).unwrap(),
        }
    }

    fn compiled(namespace: &str, name: &str) -> CompiledType {
        CompiledType {
            name: name.to_string(),
            namespace: namespace.to_string(),
            type_params: vec![],
            properties: vec![CompiledProperty {
                name: "name".to_string(),
                ty: "str".to_string(),
                readable: true,
                writable: true,
            }],
            methods: vec![],
        }
    }

    fn field_types(compilation: &Compilation, qualified: &str) -> Vec<String> {
        compilation
            .descriptor_by_name(qualified)
            .unwrap()
            .properties()
            .iter()
            .map(|p| p.ty.to_string())
            .collect()
    }

    #[test]
    fn test_import_alias_glob_and_same_namespace() {
        let compilation = Compilation::new(
            vec![
                module(
                    "models.map",
                    "namespace app::models\n\nimport app::entities::User as U\nimport app::other::*\n\nclass Dto:\n    a: U\n    b: Local\n    c: Thing\n    d: List[app::entities::User]\n",
                ),
                module("local.map", "namespace app::models\n\nclass Local:\n    x: int\n"),
            ],
            vec![compiled("app::entities", "User"), compiled("app::other", "Thing")],
        );
        assert!(compilation.errors().is_empty(), "{:?}", compilation.errors());
        assert_eq!(
            field_types(&compilation, "app::models::Dto"),
            vec!["app::entities::User", "app::models::Local", "app::other::Thing", "List[app::entities::User]"]
        );
    }

    #[test]
    fn test_unknown_type_keeps_written_name() {
        let compilation = Compilation::new(vec![module("a.map", "class A:\n    x: Missing\n")], vec![]);
        assert_eq!(field_types(&compilation, "A"), vec!["Missing"]);
        let errors = compilation.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].error.message.contains("Unknown type 'Missing'"));
    }

    #[test]
    fn test_ambiguous_glob() {
        let compilation = Compilation::new(
            vec![module("a.map", "import one::*\nimport two::*\n\nclass A:\n    x: User\n")],
            vec![compiled("one", "User"), compiled("two", "User")],
        );
        let errors = compilation.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].error.message.contains("ambiguous"));
        assert_eq!(errors[0].error.notes, vec!["candidates: one::User, two::User".to_string()]);
    }

    #[test]
    fn test_wrong_argument_count() {
        let compilation = Compilation::new(
            vec![module("a.map", "class Page[T]:\n    items: List[T]\n\nclass B:\n    p: Page\n    q: int[str]\n")],
            vec![],
        );
        let messages: Vec<_> = compilation.errors().into_iter().map(|e| e.error.message).collect();
        assert_eq!(
            messages,
            vec![
                "Type 'Page' takes 1 type argument(s), found 0".to_string(),
                "Type 'int' takes 0 type argument(s), found 1".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_declared_type_first_wins() {
        let compilation = Compilation::new(
            vec![
                module("a.map", "class A:\n    x: int\n"),
                module("b.map", "class A:\n    y: int\n"),
            ],
            vec![],
        );
        let errors = compilation.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].module, 1);
        assert_eq!(compilation.descriptor_by_name("A").unwrap().properties()[0].name, "x");
    }

    #[test]
    fn test_context_is_cached() {
        let compilation = Compilation::new(vec![module("a.map", "namespace n\nimport m::T\n")], vec![]);
        let first = compilation.context(0).unwrap() as *const ResolutionContext;
        let second = compilation.context(0).unwrap() as *const ResolutionContext;
        assert_eq!(first, second);
        assert_eq!(compilation.context(0).unwrap().imports, vec![("T".to_string(), "m::T".to_string())]);
    }

    #[test]
    fn test_property_type_substitutes_arguments() {
        let compilation = Compilation::new(vec![module("a.map", "class Page[T]:\n    items: List[T]\n")], vec![]);
        let page = TypeRef::new("", "Page").with_args(vec![TypeRef::new("", "int")]);
        assert_eq!(compilation.property_type(&page, "items").unwrap().to_string(), "List[int]");
    }
}
