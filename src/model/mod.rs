//! Type/member model shared by compiled metadata and declarations being compiled.
//!
//! Analysis never cares where a type came from. [`TypeInfo`] is the one member surface, and [`TypeDescriptor`] has
//! two variants behind it:
//!
//! - [`ResolvedType`]: built from [`CompiledType`] metadata. Methods have no body.
//! - [`DeclaredType`]: built from a `class` in a source module. Methods keep their body, and the type parameters are
//!   the ones written in the declaration.
//!
//! ## Notes
//! - Identity is structural: two types are the same iff name and namespace match ([`is_type`], [`same_type`]). A
//!   compiled `User` and a declared `User` in the same namespace are the same type.
//! - Descriptors are built once, fully, and never mutated afterwards.

mod type_string;

pub use type_string::parse_type_string;

use std::collections::BTreeSet;
use std::fmt;

use mapforge_core::lang::conventions;
use mapforge_core::lang::types::{self, BuiltinTypeId};
use mapforge_core::naming;
use mapforge_runtime::CompiledType;
use mapforge_syntax::ast::{ClassDecl, Span, Spanned, Statement, Type};

// ============================================================================
// Type identity and references
// ============================================================================

/// Identity of a nominal type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TypeKey {
    pub namespace: String,
    pub name: String,
}

impl TypeKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn qualified_name(&self) -> String {
        naming::qualify(&self.namespace, &self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// A use of a type: identity plus generic arguments.
///
/// Builtins, type parameters and unresolved names all live in the empty namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub namespace: String,
    pub name: String,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn from_qualified(path: &str) -> Self {
        let (namespace, name) = naming::split_qualified(path);
        Self::new(namespace, name)
    }

    pub fn builtin(id: BuiltinTypeId) -> Self {
        Self::new("", types::as_str(id))
    }

    pub fn any() -> Self {
        Self::new("", conventions::ANY_TYPE_NAME)
    }

    pub fn with_args(mut self, args: Vec<TypeRef>) -> Self {
        self.args = args;
        self
    }

    pub fn key(&self) -> TypeKey {
        TypeKey::new(self.namespace.clone(), self.name.clone())
    }

    pub fn qualified_name(&self) -> String {
        naming::qualify(&self.namespace, &self.name)
    }

    pub fn builtin_id(&self) -> Option<BuiltinTypeId> {
        if self.namespace.is_empty() {
            types::from_str(&self.name)
        } else {
            None
        }
    }

    pub fn is_any(&self) -> bool {
        self.builtin_id() == Some(BuiltinTypeId::Any)
    }

    pub fn is_str(&self) -> bool {
        self.builtin_id() == Some(BuiltinTypeId::Str)
    }

    pub fn is_numeric(&self) -> bool {
        self.builtin_id().is_some_and(types::is_numeric)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())?;
        if !self.args.is_empty() {
            f.write_str("[")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

// ============================================================================
// Members
// ============================================================================

/// A parameter default, kept as written and, for declarations, as syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultValue {
    pub text: String,
    pub expr: Option<Spanned<mapforge_syntax::ast::Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub default: Option<DefaultValue>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub declaring: TypeKey,
    pub name: String,
    pub return_type: Option<TypeRef>,
    pub parameters: Vec<ParameterDescriptor>,
    /// Only declared methods with a written body have one.
    pub body: Option<Vec<Spanned<Statement>>>,
    pub span: Span,
}

impl MethodDescriptor {
    /// Declaration text: `map(app::entities::User user, bool show_name = false)`.
    pub fn declaration(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| match &p.default {
                Some(default) => format!("{} {} = {}", p.ty, p.name, default.text),
                None => format!("{} {}", p.ty, p.name),
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub declaring: TypeKey,
    pub name: String,
    pub ty: TypeRef,
    pub readable: bool,
    pub writable: bool,
    pub getter: Option<MethodDescriptor>,
    pub setter: Option<MethodDescriptor>,
    pub span: Span,
}

impl PropertyDescriptor {
    fn new(declaring: &TypeKey, name: &str, ty: TypeRef, readable: bool, writable: bool, span: Span) -> Self {
        let accessor = |name: String, return_type: Option<TypeRef>, parameters: Vec<ParameterDescriptor>| {
            MethodDescriptor {
                declaring: declaring.clone(),
                name,
                return_type,
                parameters,
                body: None,
                span,
            }
        };
        let getter = readable.then(|| accessor(format!("{}{name}", conventions::GETTER_PREFIX), Some(ty.clone()), vec![]));
        let setter = writable.then(|| {
            accessor(
                format!("{}{name}", conventions::SETTER_PREFIX),
                None,
                vec![ParameterDescriptor {
                    name: "value".to_string(),
                    ty: ty.clone(),
                    default: None,
                    span,
                }],
            )
        });
        Self {
            declaring: declaring.clone(),
            name: name.to_string(),
            ty,
            readable,
            writable,
            getter,
            setter,
            span,
        }
    }
}

// ============================================================================
// The capability interface
// ============================================================================

/// Uniform member surface of a type.
pub trait TypeInfo {
    fn key(&self) -> &TypeKey;

    fn properties(&self) -> &[PropertyDescriptor];

    fn methods(&self) -> &[MethodDescriptor];

    /// Type parameters (generic arguments as declared).
    fn type_params(&self) -> &[TypeRef];

    fn is_generic(&self) -> bool {
        !self.type_params().is_empty()
    }

    fn name(&self) -> &str {
        &self.key().name
    }

    fn namespace(&self) -> &str {
        &self.key().namespace
    }

    fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties().iter().find(|p| p.name == name)
    }
}

/// Does `ty` refer to the type described by `info`? Compares name and namespace only.
pub fn is_type(info: &(impl TypeInfo + ?Sized), ty: &TypeRef) -> bool {
    info.key().name == ty.name && info.key().namespace == ty.namespace
}

pub fn same_type(a: &(impl TypeInfo + ?Sized), b: &(impl TypeInfo + ?Sized)) -> bool {
    a.key() == b.key()
}

/// Namespaces of every non-builtin type the members mention, including generic arguments.
pub fn referenced_namespaces(info: &(impl TypeInfo + ?Sized)) -> BTreeSet<String> {
    fn visit(ty: &TypeRef, out: &mut BTreeSet<String>) {
        if !ty.namespace.is_empty() {
            out.insert(ty.namespace.clone());
        }
        for arg in &ty.args {
            visit(arg, out);
        }
    }
    let mut out = BTreeSet::new();
    for p in info.properties() {
        visit(&p.ty, &mut out);
    }
    for m in info.methods() {
        for p in &m.parameters {
            visit(&p.ty, &mut out);
        }
        if let Some(r) = &m.return_type {
            visit(r, &mut out);
        }
    }
    out
}

/// One-line rendering: `app::models::UserDto { username: str, readonly created: str }`.
pub fn describe(info: &(impl TypeInfo + ?Sized)) -> String {
    let mut out = info.key().qualified_name();
    if info.is_generic() {
        let params: Vec<String> = info.type_params().iter().map(ToString::to_string).collect();
        out.push_str(&format!("[{}]", params.join(", ")));
    }
    let props: Vec<String> = info
        .properties()
        .iter()
        .map(|p| {
            let access = match (p.readable, p.writable) {
                (true, false) => "readonly ",
                (false, true) => "writeonly ",
                _ => "",
            };
            format!("{access}{}: {}", p.name, p.ty)
        })
        .collect();
    if props.is_empty() {
        out.push_str(" {}");
    } else {
        out.push_str(&format!(" {{ {} }}", props.join(", ")));
    }
    out
}

// ============================================================================
// Variants
// ============================================================================

/// A type known only through compiled metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    key: TypeKey,
    type_params: Vec<TypeRef>,
    properties: Vec<PropertyDescriptor>,
    methods: Vec<MethodDescriptor>,
}

impl ResolvedType {
    pub fn from_compiled(compiled: &CompiledType) -> Self {
        let key = TypeKey::new(compiled.namespace.clone(), compiled.name.clone());
        let ty = |text: &str| parse_type_string(text, &compiled.namespace, &compiled.type_params);
        let properties = compiled
            .properties
            .iter()
            .map(|p| PropertyDescriptor::new(&key, &p.name, ty(&p.ty), p.readable, p.writable, Span::default()))
            .collect();
        let methods = compiled
            .methods
            .iter()
            .map(|m| MethodDescriptor {
                declaring: key.clone(),
                name: m.name.clone(),
                return_type: m.return_type.as_deref().map(ty),
                parameters: m
                    .parameters
                    .iter()
                    .map(|p| ParameterDescriptor {
                        name: p.name.clone(),
                        ty: ty(&p.ty),
                        default: p.default.clone().map(|text| DefaultValue { text, expr: None }),
                        span: Span::default(),
                    })
                    .collect(),
                body: None,
                span: Span::default(),
            })
            .collect();
        Self {
            type_params: compiled.type_params.iter().map(|t| TypeRef::new("", t.clone())).collect(),
            key,
            properties,
            methods,
        }
    }
}

/// A type declared in a source module of the current pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredType {
    key: TypeKey,
    /// Index of the declaring module in the compilation.
    pub module: usize,
    pub span: Span,
    type_params: Vec<TypeRef>,
    properties: Vec<PropertyDescriptor>,
    methods: Vec<MethodDescriptor>,
}

impl DeclaredType {
    /// Build the descriptor for `class`, resolving every written type through `resolve`.
    ///
    /// `resolve` receives the written type and the class's type parameter names.
    pub fn build(
        class: &ClassDecl,
        span: Span,
        namespace: &str,
        module: usize,
        mut resolve: impl FnMut(&Spanned<Type>, &[String]) -> TypeRef,
    ) -> Self {
        let key = TypeKey::new(namespace, class.name.clone());
        let generics = &class.type_params;
        let properties = class
            .fields
            .iter()
            .map(|f| {
                let ty = resolve(&f.node.ty, generics);
                PropertyDescriptor::new(
                    &key,
                    &f.node.name,
                    ty,
                    f.node.access.is_readable(),
                    f.node.access.is_writable(),
                    f.span,
                )
            })
            .collect();
        let methods = class
            .methods
            .iter()
            .map(|m| MethodDescriptor {
                declaring: key.clone(),
                name: m.node.name.clone(),
                return_type: m.node.return_type.as_ref().map(|t| resolve(t, generics)),
                parameters: m
                    .node
                    .params
                    .iter()
                    .map(|p| ParameterDescriptor {
                        name: p.node.name.clone(),
                        ty: resolve(&p.node.ty, generics),
                        default: p.node.default.as_ref().map(|d| DefaultValue {
                            text: d.node.to_string(),
                            expr: Some(d.clone()),
                        }),
                        span: p.span,
                    })
                    .collect(),
                body: m.node.body.clone(),
                span: m.span,
            })
            .collect();
        Self {
            type_params: generics.iter().map(|t| TypeRef::new("", t.clone())).collect(),
            key,
            module,
            span,
            properties,
            methods,
        }
    }
}

/// Either backing variant behind the [`TypeInfo`] surface.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Resolved(ResolvedType),
    Declared(DeclaredType),
}

impl TypeDescriptor {
    pub fn as_declared(&self) -> Option<&DeclaredType> {
        match self {
            TypeDescriptor::Declared(d) => Some(d),
            TypeDescriptor::Resolved(_) => None,
        }
    }

    /// A reference to this type with its type parameters as arguments.
    pub fn to_type_ref(&self) -> TypeRef {
        TypeRef::new(self.namespace(), self.name()).with_args(self.type_params().to_vec())
    }
}

macro_rules! impl_type_info {
    ($ty:ty) => {
        impl TypeInfo for $ty {
            fn key(&self) -> &TypeKey {
                &self.key
            }

            fn properties(&self) -> &[PropertyDescriptor] {
                &self.properties
            }

            fn methods(&self) -> &[MethodDescriptor] {
                &self.methods
            }

            fn type_params(&self) -> &[TypeRef] {
                &self.type_params
            }
        }
    };
}

impl_type_info!(ResolvedType);
impl_type_info!(DeclaredType);

impl TypeInfo for TypeDescriptor {
    fn key(&self) -> &TypeKey {
        match self {
            TypeDescriptor::Resolved(t) => t.key(),
            TypeDescriptor::Declared(t) => t.key(),
        }
    }

    fn properties(&self) -> &[PropertyDescriptor] {
        match self {
            TypeDescriptor::Resolved(t) => t.properties(),
            TypeDescriptor::Declared(t) => t.properties(),
        }
    }

    fn methods(&self) -> &[MethodDescriptor] {
        match self {
            TypeDescriptor::Resolved(t) => t.methods(),
            TypeDescriptor::Declared(t) => t.methods(),
        }
    }

    fn type_params(&self) -> &[TypeRef] {
        match self {
            TypeDescriptor::Resolved(t) => t.type_params(),
            TypeDescriptor::Declared(t) => t.type_params(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapforge_runtime::{CompiledMethod, CompiledParameter, CompiledProperty};
    use mapforge_syntax::parser::parse_source;

    fn compiled_user() -> CompiledType {
        CompiledType {
            name: "User".to_string(),
            namespace: "app::entities".to_string(),
            type_params: vec![],
            properties: vec![
                CompiledProperty {
                    name: "name".to_string(),
                    ty: "str".to_string(),
                    readable: true,
                    writable: true,
                },
                CompiledProperty {
                    name: "tags".to_string(),
                    ty: "List[Tag]".to_string(),
                    readable: true,
                    writable: false,
                },
            ],
            methods: vec![CompiledMethod {
                name: "rename".to_string(),
                return_type: None,
                parameters: vec![CompiledParameter {
                    name: "to".to_string(),
                    ty: "str".to_string(),
                    default: Some("\"anon\"".to_string()),
                }],
            }],
        }
    }

    fn declared(source: &str) -> DeclaredType {
        let program = parse_source(source).unwrap();
        let namespace = program.namespace();
        let (class, span) = program.classes().next().unwrap();
        DeclaredType::build(class, span, &namespace, 0, stub_resolve)
    }

    /// Builtins and generics by name, everything else in `app::entities`; arguments are resolved the same way.
    fn stub_resolve(ty: &Spanned<Type>, generics: &[String]) -> TypeRef {
        let base = match ty.node.path() {
            [name] if generics.contains(name) => TypeRef::new("", name.clone()),
            [name] if types::from_str(name).is_some() => TypeRef::new("", name.clone()),
            [name] => TypeRef::new("app::entities", name.clone()),
            path => TypeRef::from_qualified(&path.join("::")),
        };
        let args = ty.node.args().iter().map(|arg| stub_resolve(arg, generics)).collect();
        base.with_args(args)
    }

    #[test]
    fn test_resolved_and_declared_compare_structurally() {
        let resolved = ResolvedType::from_compiled(&compiled_user());
        let declared = declared("namespace app::entities\n\nclass User:\n    name: str\n");
        assert!(same_type(&resolved, &declared));
        assert!(is_type(&declared, &TypeRef::new("app::entities", "User")));
        assert!(!is_type(&declared, &TypeRef::new("app::models", "User")));
    }

    #[test]
    fn test_resolved_members() {
        let user = ResolvedType::from_compiled(&compiled_user());
        let tags = user.property("tags").unwrap();
        assert_eq!(tags.ty.to_string(), "List[app::entities::Tag]");
        assert!(tags.getter.is_some());
        assert!(tags.setter.is_none());
        let rename = &user.methods()[0];
        assert!(rename.body.is_none());
        assert_eq!(rename.declaration(), "rename(str to = \"anon\")");
        assert_eq!(referenced_namespaces(&user).into_iter().collect::<Vec<_>>(), vec!["app::entities"]);
    }

    #[test]
    fn test_declared_members_keep_bodies_and_written_generics() {
        let page = declared(
            "namespace app::models\n\nclass Page[T]:\n    items: List[T]\n    readonly total: int\n\n    def map(user: User) -> Page:\n        return new Page()\n",
        );
        assert!(page.is_generic());
        assert_eq!(page.type_params(), &[TypeRef::new("", "T")]);
        assert_eq!(page.properties()[0].ty.to_string(), "List[T]");
        assert_eq!(page.methods()[0].body.as_ref().map(Vec::len), Some(1));
        assert_eq!(page.methods()[0].declaration(), "map(app::entities::User user)");
        assert_eq!(
            describe(&page),
            "app::models::Page[T] { items: List[T], readonly total: int }"
        );
        let total = page.property("total").unwrap();
        assert_eq!(total.getter.as_ref().map(|g| g.name.as_str()), Some("get_total"));
        assert!(total.setter.is_none());
    }
}
