//! Emit planned maps as Rust source.
//!
//! The output is one module per namespace (`app::models` becomes `pub mod app { pub mod models { .. } }`), all
//! wrapped in a single generated module (`mappers` by default) so the tree never collides with the consumer's own
//! namespace roots. A namespace module holds:
//!
//! - one struct per declared class, deriving `Reflect` so mappers can build it,
//! - one `{T}Mapper` per planned map, whose surfaces delegate to a lazily built [`mapforge_runtime::Mapper`].
//!
//! The plan itself is embedded as constructor calls, so the expression trees exist as data in the generated crate.
//!
//! ## Notes
//! - Tokens are built with `quote!`, parsed with `syn` and formatted with `prettyplease`; the same input always
//!   produces the same bytes.
//! - Compiled types live in the consumer's crate and are imported from [`EmitOptions::source_root`]
//!   (`use crate::app::entities::*;`). Declared types of other namespaces are imported relative to the generated
//!   module (`use super::super::app::cards::*;`), so the file can be included anywhere.
//! - Imports are collected per module in an [`EmissionContext`].

use std::collections::{BTreeMap, BTreeSet};

use mapforge_core::lang::conventions::{GENERATED_MODULE, MAPPER_SUFFIX, SOURCE_ROOT};
use mapforge_core::lang::rust_keywords;
use mapforge_core::lang::types::BuiltinTypeId;
use mapforge_core::naming::to_snake_case;
use mapforge_runtime::{Expr, FactoryPlan, Lambda, MapPlan, RecordShape, Stmt, Value};
use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::{format_ident, quote};

use super::errors::EmitError;
use crate::mapping::{Map, MapFactory};
use crate::model::{DeclaredType, TypeInfo, TypeRef};
use crate::resolve::Compilation;

const HEADER: &str = "// @generated by mapforge. Do not edit.\n\n";

/// Where the generated tree goes and where it finds compiled types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Module wrapping every generated namespace. Empty puts the namespaces at the top of the file.
    pub module: String,
    /// Rust path compiled namespaces hang off: with `crate`, `app::entities::User` is
    /// `crate::app::entities::User`.
    pub source_root: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            module: GENERATED_MODULE.to_string(),
            source_root: SOURCE_ROOT.to_string(),
        }
    }
}

/// A planned map ready for emission.
#[derive(Debug, Clone, Copy)]
pub struct MapUnit<'a> {
    pub map: &'a Map,
    pub plan: &'a MapPlan,
}

/// Where a referenced type is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// Declared in mapping sources; emitted into the generated tree.
    Generated,
    /// Compiled metadata; lives under the source root.
    Compiled,
}

/// Namespaces referenced by the items of one generated module.
#[derive(Debug, Clone, Default)]
pub struct EmissionContext {
    namespace: String,
    referenced: BTreeSet<(Origin, String)>,
}

impl EmissionContext {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            referenced: BTreeSet::new(),
        }
    }

    /// Record the namespace `ty` lives in, unless no import is needed to name it.
    pub fn reference(&mut self, ty: &TypeRef, origin: Origin) {
        if ty.builtin_id().is_some() || ty.namespace.is_empty() {
            return;
        }
        if origin == Origin::Generated && ty.namespace == self.namespace {
            return;
        }
        self.referenced.insert((origin, ty.namespace.clone()));
    }

    /// Referenced namespaces, generated ones first, each group sorted.
    pub fn namespaces(&self) -> impl Iterator<Item = (Origin, &str)> {
        self.referenced.iter().map(|(origin, ns)| (*origin, ns.as_str()))
    }

    /// Nesting of this module below the generated root.
    pub fn depth(&self) -> usize {
        self.namespace.split("::").filter(|s| !s.is_empty()).count()
    }

    /// Path prefix from this module back to the generated root.
    fn up(&self) -> TokenStream {
        match self.depth() {
            0 => quote!(self::),
            depth => {
                let supers = (0..depth).map(|_| quote!(super));
                quote!(#(#supers ::)*)
            }
        }
    }

    fn use_items(&self, source_root: &syn::Path) -> Result<Vec<TokenStream>, EmitError> {
        self.namespaces()
            .map(|(origin, ns)| {
                let segments = path_segments(ns)?;
                Ok(match origin {
                    Origin::Generated => {
                        let up = self.up();
                        quote! { use #up #(#segments)::* ::*; }
                    }
                    Origin::Compiled => quote! { use #source_root #(:: #segments)* ::*; },
                })
            })
            .collect()
    }
}

/// Pass-wide facts every emitted item consults.
struct Scope<'a> {
    compilation: &'a Compilation,
    source_root: syn::Path,
}

impl Scope<'_> {
    fn origin(&self, ty: &TypeRef) -> Origin {
        match self.compilation.descriptor_by_name(&ty.qualified_name()) {
            Some(descriptor) if descriptor.as_declared().is_some() => Origin::Generated,
            _ => Origin::Compiled,
        }
    }
}

#[derive(Default)]
struct ModuleTree {
    context: EmissionContext,
    items: Vec<TokenStream>,
    children: BTreeMap<String, ModuleTree>,
}

impl ModuleTree {
    fn node(&mut self, namespace: &str) -> &mut ModuleTree {
        let mut node = self;
        let mut path = String::new();
        for segment in namespace.split("::").filter(|s| !s.is_empty()) {
            if !path.is_empty() {
                path.push_str("::");
            }
            path.push_str(segment);
            let child_path = path.clone();
            node = node.children.entry(segment.to_string()).or_insert_with(|| ModuleTree {
                context: EmissionContext::new(child_path),
                ..ModuleTree::default()
            });
        }
        node
    }

    fn to_tokens(&self, source_root: &syn::Path) -> Result<TokenStream, EmitError> {
        let uses = self.context.use_items(source_root)?;
        let items = &self.items;
        let children = self
            .children
            .iter()
            .map(|(name, child)| {
                let name = ident(name, "namespace segment")?;
                let inner = child.to_tokens(source_root)?;
                Ok(quote! { pub mod #name { #inner } })
            })
            .collect::<Result<Vec<_>, EmitError>>()?;
        Ok(quote! {
            #(#uses)*
            #(#items)*
            #(#children)*
        })
    }
}

/// Emit every declared class of `compilation` and a mapper per unit.
#[tracing::instrument(skip_all, fields(units = units.len(), module = %options.module))]
pub fn emit(compilation: &Compilation, units: &[MapUnit<'_>], options: &EmitOptions) -> Result<String, EmitError> {
    let source_root = syn::parse_str::<syn::Path>(&options.source_root).map_err(|_| EmitError::InvalidOption {
        option: "source root",
        value: options.source_root.clone(),
    })?;
    let scope = Scope {
        compilation,
        source_root,
    };
    let mut root = ModuleTree::default();

    let mut declared: Vec<&DeclaredType> = compilation.descriptors().filter_map(|d| d.as_declared()).collect();
    declared.sort_by(|a, b| a.key().cmp(b.key()));
    for ty in declared {
        let node = root.node(ty.namespace());
        let item = emit_struct(&mut node.context, &scope, ty)?;
        node.items.push(item);
    }

    let mut sources_per_target: BTreeMap<String, usize> = BTreeMap::new();
    for unit in units {
        *sources_per_target.entry(unit.map.target.qualified_name()).or_default() += 1;
    }
    let mut ordered: Vec<&MapUnit<'_>> = units.iter().collect();
    ordered.sort_by_key(|u| (u.map.target.key(), u.map.source.qualified_name()));
    for unit in ordered {
        let map = unit.map;
        if !map.target.args.is_empty() || !map.source.args.is_empty() {
            tracing::warn!(source = %map.source, map = %map.target, "generic maps are not emitted");
            continue;
        }
        let shared = sources_per_target.get(&map.target.qualified_name()).copied().unwrap_or(1) > 1;
        let node = root.node(&map.target.namespace);
        let item = emit_mapper(&mut node.context, &scope, unit, shared)?;
        node.items.push(item);
    }

    let mut tokens = root.to_tokens(&scope.source_root)?;
    if !options.module.is_empty() {
        let module = ident(&options.module, "generated module")?;
        tokens = quote! { pub mod #module { #tokens } };
    }
    let syntax_tree = syn::parse2::<syn::File>(tokens)?;
    let formatted = prettyplease::unparse(&syntax_tree);
    Ok(format!("{HEADER}{formatted}"))
}

/// Name of the generated container for `map`. Targets mapped from several sources get one container per source.
pub fn mapper_name(map: &Map, shared: bool) -> String {
    if shared {
        format!("{}From{}{MAPPER_SUFFIX}", map.target.name, map.source.name)
    } else {
        format!("{}{MAPPER_SUFFIX}", map.target.name)
    }
}

// ============================================================================
// Identifiers and types
// ============================================================================

/// A Rust identifier for `name`; keywords become raw identifiers. `what` names the construct in errors.
fn ident(name: &str, what: &str) -> Result<Ident, EmitError> {
    if rust_keywords::is_keyword(name) {
        if !rust_keywords::can_be_raw(name) {
            return Err(EmitError::identifier(what, name));
        }
        return Ok(Ident::new_raw(name, Span::call_site()));
    }
    syn::parse_str::<Ident>(name).map_err(|_| EmitError::identifier(what, name))
}

fn path_segments(namespace: &str) -> Result<Vec<Ident>, EmitError> {
    namespace
        .split("::")
        .filter(|s| !s.is_empty())
        .map(|s| ident(s, "namespace segment"))
        .collect()
}

fn rust_type(
    ctx: &mut EmissionContext,
    scope: &Scope<'_>,
    ty: &TypeRef,
    generics: &[TypeRef],
) -> Result<TokenStream, EmitError> {
    let arg = |ctx: &mut EmissionContext, i: usize| match ty.args.get(i) {
        Some(arg) => rust_type(ctx, scope, arg, generics),
        None => Ok(quote!(::mapforge_runtime::Value)),
    };
    match ty.builtin_id() {
        Some(BuiltinTypeId::Str) => return Ok(quote!(String)),
        Some(BuiltinTypeId::Int) => return Ok(quote!(i64)),
        Some(BuiltinTypeId::Float) => return Ok(quote!(f64)),
        Some(BuiltinTypeId::Bool) => return Ok(quote!(bool)),
        Some(BuiltinTypeId::Any) => return Ok(quote!(::mapforge_runtime::Value)),
        Some(BuiltinTypeId::List) => {
            let inner = arg(ctx, 0)?;
            return Ok(quote!(Vec<#inner>));
        }
        Some(BuiltinTypeId::Option) => {
            let inner = arg(ctx, 0)?;
            return Ok(quote!(Option<#inner>));
        }
        None => {}
    }
    let name = ident(&ty.name, "type")?;
    if ty.namespace.is_empty() && generics.iter().any(|g| g.name == ty.name) {
        return Ok(quote!(#name));
    }
    let origin = scope.origin(ty);
    ctx.reference(ty, origin);
    // Types of a root namespace are not glob-imported.
    let path = match origin {
        Origin::Compiled if ty.namespace.is_empty() => {
            let root = &scope.source_root;
            quote!(#root::#name)
        }
        Origin::Generated if ty.namespace.is_empty() && ctx.depth() > 0 => {
            let up = ctx.up();
            quote!(#up #name)
        }
        _ => quote!(#name),
    };
    if ty.args.is_empty() {
        return Ok(path);
    }
    let args = ty
        .args
        .iter()
        .map(|a| rust_type(ctx, scope, a, generics))
        .collect::<Result<Vec<_>, EmitError>>()?;
    Ok(quote!(#path<#(#args),*>))
}

// ============================================================================
// Declared classes
// ============================================================================

fn emit_struct(ctx: &mut EmissionContext, scope: &Scope<'_>, ty: &DeclaredType) -> Result<TokenStream, EmitError> {
    let name = ident(ty.name(), "class")?;
    let namespace = ty.namespace();
    let generics = ty.type_params();
    let params = generics
        .iter()
        .map(|g| ident(&g.name, "type parameter"))
        .collect::<Result<Vec<_>, _>>()?;
    let generics_tokens = if params.is_empty() {
        quote!()
    } else {
        quote!(<#(#params),*>)
    };
    let fields = ty
        .properties()
        .iter()
        .map(|p| {
            let field = ident(&p.name, "property")?;
            let field_ty = rust_type(ctx, scope, &p.ty, generics)?;
            let access = match (p.readable, p.writable) {
                (true, false) => quote!(#[reflect(readonly)]),
                (false, true) => quote!(#[reflect(writeonly)]),
                _ => quote!(),
            };
            Ok(quote! { #access pub #field: #field_ty })
        })
        .collect::<Result<Vec<_>, EmitError>>()?;
    Ok(quote! {
        #[derive(Debug, Clone, PartialEq, Default, ::mapforge_runtime::Reflect)]
        #[reflect(namespace = #namespace)]
        pub struct #name #generics_tokens {
            #(#fields),*
        }
    })
}

// ============================================================================
// Mappers
// ============================================================================

fn emit_mapper(
    ctx: &mut EmissionContext,
    scope: &Scope<'_>,
    unit: &MapUnit<'_>,
    shared: bool,
) -> Result<TokenStream, EmitError> {
    let map = unit.map;
    let mapper = ident(&mapper_name(map, shared), "mapper")?;
    let source = rust_type(ctx, scope, &map.source, &[])?;
    let target = rust_type(ctx, scope, &map.target, &[])?;
    let to = format!("to_{}", to_snake_case(&map.target.name));
    let to_fn = ident(&to, "mapper function")?;
    let to_query = format_ident!("{}_query", to);
    let to_iter = format_ident!("{}_iter", to);
    let plan = plan_tokens(unit.plan).map_err(|e| e.in_place(&format!("the plan of '{}'", map.target)))?;
    let doc = format!(" Maps `{}` to `{}`.", map.source, map.target);

    let mut factories = Vec::new();
    for plan in &unit.plan.factories {
        let Some(factory) = map.factories.iter().find(|f| f.digest == plan.digest) else {
            continue;
        };
        factories.push(emit_factory_surfaces(ctx, scope, factory, plan, &source, &target, &to)?);
    }

    Ok(quote! {
        #[doc = #doc]
        pub struct #mapper;

        impl #mapper {
            pub fn plan() -> ::mapforge_runtime::MapPlan {
                #plan
            }

            pub fn mapper() -> &'static ::mapforge_runtime::Mapper {
                static MAPPER: ::std::sync::OnceLock<::mapforge_runtime::Mapper> = ::std::sync::OnceLock::new();
                MAPPER.get_or_init(|| ::mapforge_runtime::Mapper::new(Self::plan()))
            }

            pub fn map(source: &#source) -> ::std::result::Result<#target, ::mapforge_runtime::MapError> {
                Self::mapper().map_typed(source)
            }

            pub fn new_func() -> ::mapforge_runtime::MapFn {
                Self::mapper().callable()
            }

            pub fn new_expression() -> &'static ::mapforge_runtime::Lambda {
                Self::mapper().expression()
            }

            pub fn #to_fn(source: &#source) -> ::std::result::Result<#target, ::mapforge_runtime::MapError> {
                Self::map(source)
            }

            pub fn #to_query(query: ::mapforge_runtime::Query) -> ::mapforge_runtime::Query {
                Self::mapper().project(query)
            }

            pub fn #to_iter<I>(source: I) -> ::mapforge_runtime::MapIter<I::IntoIter, #target>
            where
                I: IntoIterator<Item = #source>,
            {
                Self::mapper().map_iter_typed(source)
            }

            #(#factories)*
        }
    })
}

/// `map_<d>`, `to_t_<d>`, `to_t_query_<d>` and `to_t_iter_<d>` for one factory.
fn emit_factory_surfaces(
    ctx: &mut EmissionContext,
    scope: &Scope<'_>,
    factory: &MapFactory,
    plan: &FactoryPlan,
    source: &TokenStream,
    target: &TokenStream,
    to: &str,
) -> Result<TokenStream, EmitError> {
    let digest = &plan.digest;
    let map_fn = format_ident!("map_{}", digest);
    let to_fn = format_ident!("{}_{}", to, digest);
    let to_query = format_ident!("{}_query_{}", to, digest);
    let to_iter = format_ident!("{}_iter_{}", to, digest);
    let args_fn = format_ident!("args_{}", digest);

    let mut names = Vec::new();
    let mut decls = Vec::new();
    let mut pushes = Vec::new();
    for param in &factory.parameters {
        let name = if matches!(param.name.as_str(), "source" | "query") {
            format_ident!("{}_arg", param.name)
        } else {
            ident(&param.name, "factory parameter")?
        };
        let ty = rust_type(ctx, scope, &param.ty, &[])?;
        if param.default.is_some() {
            decls.push(quote!(#name: Option<#ty>));
            pushes.push(quote!(.optional(#name.as_ref().map(::mapforge_runtime::FieldValue::to_value))));
        } else {
            decls.push(quote!(#name: #ty));
            pushes.push(quote!(.arg(::mapforge_runtime::FieldValue::to_value(&#name))));
        }
        names.push(name);
    }
    let doc = format!(" `{}`", plan.declaration);

    Ok(quote! {
        fn #args_fn(#(#decls),*) -> ::mapforge_runtime::Args {
            ::mapforge_runtime::Args::new() #(#pushes)*
        }

        #[doc = #doc]
        pub fn #map_fn(
            source: &#source,
            #(#decls),*
        ) -> ::std::result::Result<#target, ::mapforge_runtime::MapError> {
            Self::mapper().map_typed_with(#digest, source, &Self::#args_fn(#(#names),*))
        }

        #[doc = #doc]
        pub fn #to_fn(
            source: &#source,
            #(#decls),*
        ) -> ::std::result::Result<#target, ::mapforge_runtime::MapError> {
            Self::#map_fn(source, #(#names),*)
        }

        #[doc = #doc]
        pub fn #to_query(
            query: ::mapforge_runtime::Query,
            #(#decls),*
        ) -> ::std::result::Result<::mapforge_runtime::Query, ::mapforge_runtime::MapError> {
            Self::mapper().project_with(#digest, query, &Self::#args_fn(#(#names),*))
        }

        #[doc = #doc]
        pub fn #to_iter<I>(
            source: I,
            #(#decls),*
        ) -> ::std::result::Result<::mapforge_runtime::MapIter<I::IntoIter, #target>, ::mapforge_runtime::MapError>
        where
            I: IntoIterator<Item = #source>,
        {
            Self::mapper().map_iter_typed_with(#digest, source, &Self::#args_fn(#(#names),*))
        }
    })
}

// ============================================================================
// Plans as constructor calls
// ============================================================================

fn plan_tokens(plan: &MapPlan) -> Result<TokenStream, EmitError> {
    let source = &plan.source;
    let target = &plan.target;
    let default = lambda_tokens(&plan.default_expression)?;
    let factories = plan
        .factories
        .iter()
        .map(factory_tokens)
        .collect::<Result<Vec<_>, EmitError>>()?;
    Ok(quote! {
        ::mapforge_runtime::MapPlan {
            source: #source.to_string(),
            target: #target.to_string(),
            default_expression: #default,
            factories: vec![#(#factories),*],
        }
    })
}

fn factory_tokens(plan: &FactoryPlan) -> Result<TokenStream, EmitError> {
    let declaration = &plan.declaration;
    let digest = &plan.digest;
    let parameters = plan
        .parameters
        .iter()
        .map(|p| {
            let name = &p.name;
            let ty = &p.ty;
            let default = option_tokens(p.default.as_ref().map(expr_tokens).transpose()?);
            Ok(quote! {
                ::mapforge_runtime::ParameterPlan {
                    name: #name.to_string(),
                    ty: #ty.to_string(),
                    default: #default,
                }
            })
        })
        .collect::<Result<Vec<_>, EmitError>>()?;
    let residuals = plan
        .residuals
        .iter()
        .map(stmt_tokens)
        .collect::<Result<Vec<_>, EmitError>>()?;
    let captures = plan.captures.iter().map(|c| {
        let (name, ty) = (&c.name, &c.ty);
        quote!(::mapforge_runtime::ShapeField::new(#name, #ty))
    });
    let params_shape = shape_tokens(&plan.params_shape);
    let vars_shape = option_tokens(plan.vars_shape.as_ref().map(shape_tokens));
    let params_stage = lambda_tokens(&plan.params_stage)?;
    let vars_stage = option_tokens(plan.vars_stage.as_ref().map(lambda_tokens).transpose()?);
    let final_stage = lambda_tokens(&plan.final_stage)?;
    Ok(quote! {
        ::mapforge_runtime::FactoryPlan {
            declaration: #declaration.to_string(),
            digest: #digest.to_string(),
            parameters: vec![#(#parameters),*],
            residuals: vec![#(#residuals),*],
            captures: vec![#(#captures),*],
            params_shape: #params_shape,
            vars_shape: #vars_shape,
            params_stage: #params_stage,
            vars_stage: #vars_stage,
            final_stage: #final_stage,
        }
    })
}

fn option_tokens(value: Option<TokenStream>) -> TokenStream {
    match value {
        Some(tokens) => quote!(Some(#tokens)),
        None => quote!(None),
    }
}

fn shape_tokens(shape: &RecordShape) -> TokenStream {
    let type_name = &shape.type_name;
    let fields = shape.fields.iter().map(|f| {
        let (name, ty) = (&f.name, &f.ty);
        quote!(::mapforge_runtime::ShapeField::new(#name, #ty))
    });
    quote! {
        ::mapforge_runtime::RecordShape {
            type_name: #type_name.to_string(),
            fields: vec![#(#fields),*],
        }
    }
}

fn lambda_tokens(lambda: &Lambda) -> Result<TokenStream, EmitError> {
    let param = &lambda.param;
    let body = expr_tokens(&lambda.body)?;
    Ok(quote!(::mapforge_runtime::Lambda::new(#param, #body)))
}

fn expr_tokens(expr: &Expr) -> Result<TokenStream, EmitError> {
    Ok(match expr {
        Expr::Constant(value) => {
            let value = value_tokens(value)?;
            quote!(::mapforge_runtime::Expr::Constant(#value))
        }
        Expr::Parameter(name) => quote!(::mapforge_runtime::Expr::param(#name)),
        Expr::Member(base, name) => {
            let base = expr_tokens(base)?;
            quote!(#base.member(#name))
        }
        Expr::Call(receiver, method, args) => {
            let receiver = expr_tokens(receiver)?;
            let method = format_ident!("{}", method.variant_name());
            let args = args.iter().map(expr_tokens).collect::<Result<Vec<_>, _>>()?;
            quote!(#receiver.call(::mapforge_runtime::BuiltinMethodId::#method, vec![#(#args),*]))
        }
        Expr::Conditional(test, then, otherwise) => {
            let test = expr_tokens(test)?;
            let then = expr_tokens(then)?;
            let otherwise = expr_tokens(otherwise)?;
            quote!(::mapforge_runtime::Expr::conditional(#test, #then, #otherwise))
        }
        Expr::Binary(op, lhs, rhs) => {
            let op = format_ident!("{}", op.variant_name());
            let lhs = expr_tokens(lhs)?;
            let rhs = expr_tokens(rhs)?;
            quote!(::mapforge_runtime::Expr::binary(::mapforge_runtime::BinaryOp::#op, #lhs, #rhs))
        }
        Expr::Unary(op, operand) => {
            let op = format_ident!("{}", op.variant_name());
            let operand = expr_tokens(operand)?;
            quote!(::mapforge_runtime::Expr::unary(::mapforge_runtime::UnaryOp::#op, #operand))
        }
        Expr::MemberInit(type_name, bindings) => {
            let bindings = bindings
                .iter()
                .map(|(name, value)| {
                    let value = expr_tokens(value)?;
                    Ok(quote!((#name.to_string(), #value)))
                })
                .collect::<Result<Vec<_>, EmitError>>()?;
            quote!(::mapforge_runtime::Expr::member_init(#type_name, vec![#(#bindings),*]))
        }
    })
}

fn stmt_tokens(stmt: &Stmt) -> Result<TokenStream, EmitError> {
    let block = |stmts: &[Stmt]| -> Result<TokenStream, EmitError> {
        let stmts = stmts.iter().map(stmt_tokens).collect::<Result<Vec<_>, _>>()?;
        Ok(quote!(vec![#(#stmts),*]))
    };
    Ok(match stmt {
        Stmt::Let { name, ty, value } => {
            let ty = option_tokens(ty.as_ref().map(|t| quote!(#t.to_string())));
            let value = option_tokens(value.as_ref().map(expr_tokens).transpose()?);
            quote!(::mapforge_runtime::Stmt::Let { name: #name.to_string(), ty: #ty, value: #value })
        }
        Stmt::Assign(name, value) => {
            let value = expr_tokens(value)?;
            quote!(::mapforge_runtime::Stmt::Assign(#name.to_string(), #value))
        }
        Stmt::If(test, then, otherwise) => {
            let test = expr_tokens(test)?;
            let then = block(then)?;
            let otherwise = block(otherwise)?;
            quote!(::mapforge_runtime::Stmt::If(#test, #then, #otherwise))
        }
        Stmt::Eval(expr) => {
            let expr = expr_tokens(expr)?;
            quote!(::mapforge_runtime::Stmt::Eval(#expr))
        }
    })
}

fn value_tokens(value: &Value) -> Result<TokenStream, EmitError> {
    Ok(match value {
        Value::Null => quote!(::mapforge_runtime::Value::Null),
        Value::Bool(b) => quote!(::mapforge_runtime::Value::Bool(#b)),
        Value::Int(i) => {
            let abs = Literal::u64_unsuffixed(i.unsigned_abs());
            if *i < 0 {
                quote!(::mapforge_runtime::Value::Int(-#abs))
            } else {
                quote!(::mapforge_runtime::Value::Int(#abs))
            }
        }
        Value::Float(x) => {
            if !x.is_finite() {
                return Err(EmitError::NonFiniteFloat {
                    value: *x,
                    place: String::new(),
                });
            }
            let abs = Literal::f64_suffixed(x.abs());
            if x.is_sign_negative() {
                quote!(::mapforge_runtime::Value::Float(-#abs))
            } else {
                quote!(::mapforge_runtime::Value::Float(#abs))
            }
        }
        Value::Str(s) => quote!(::mapforge_runtime::Value::Str(#s.to_string())),
        Value::List(items) => {
            let items = items.iter().map(value_tokens).collect::<Result<Vec<_>, _>>()?;
            quote!(::mapforge_runtime::Value::List(vec![#(#items),*]))
        }
        Value::Record(record) => {
            let type_name = &record.type_name;
            let fields = record
                .fields
                .iter()
                .map(|(name, value)| {
                    let value = value_tokens(value)?;
                    Ok(quote!((#name.to_string(), #value)))
                })
                .collect::<Result<Vec<_>, EmitError>>()?;
            quote! {
                ::mapforge_runtime::Value::Record(::mapforge_runtime::Record {
                    type_name: #type_name.to_string(),
                    fields: vec![#(#fields),*],
                })
            }
        }
    })
}
