//! Abstract syntax tree for mapping declarations.
//!
//! A source module is a flat list of declarations: an optional `namespace`, `import`s, and `class`es. Classes carry
//! fields and methods; method bodies use a small statement/expression language that is just large enough to write
//! mapping factories.

use std::fmt;

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

/// A parsed source module.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub declarations: Vec<Spanned<Declaration>>,
}

impl Program {
    /// The namespace declared by this module, or `""` when it declares none.
    pub fn namespace(&self) -> String {
        self.declarations
            .iter()
            .find_map(|d| match &d.node {
                Declaration::Namespace(ns) => Some(ns.path.join("::")),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Iterate over the imports of this module.
    pub fn imports(&self) -> impl Iterator<Item = &Spanned<Declaration>> {
        self.declarations
            .iter()
            .filter(|d| matches!(d.node, Declaration::Import(_)))
    }

    /// Iterate over the classes of this module together with their spans.
    pub fn classes(&self) -> impl Iterator<Item = (&ClassDecl, Span)> {
        self.declarations.iter().filter_map(|d| match &d.node {
            Declaration::Class(class) => Some((class, d.span)),
            _ => None,
        })
    }
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Namespace(NamespaceDecl),
    Import(ImportDecl),
    Class(ClassDecl),
    Docstring(String),
}

// ============================================================================
// Namespaces and imports
// ============================================================================

/// `namespace app::models`
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub path: Vec<Ident>,
}

/// `import app::entities::User [as U]` or `import app::entities::*`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: Vec<Ident>,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportKind {
    /// Import the last path segment, optionally under another name.
    Item { alias: Option<Ident> },
    /// Import every type of the namespace named by `path`.
    Glob,
}

impl ImportDecl {
    /// The name this import binds in the importing module (`None` for globs).
    pub fn bound_name(&self) -> Option<&str> {
        match &self.kind {
            ImportKind::Item { alias: Some(alias) } => Some(alias),
            ImportKind::Item { alias: None } => self.path.last().map(String::as_str),
            ImportKind::Glob => None,
        }
    }
}

// ============================================================================
// Classes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub decorators: Vec<Spanned<Decorator>>,
    pub name: Ident,
    pub type_params: Vec<Ident>,
    pub fields: Vec<Spanned<FieldDecl>>,
    pub methods: Vec<Spanned<MethodDecl>>,
}

/// `@name(Type, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub name: Ident,
    pub args: Vec<Spanned<Type>>,
}

/// How a field may be accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldAccess {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl FieldAccess {
    pub fn is_readable(self) -> bool {
        !matches!(self, FieldAccess::WriteOnly)
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, FieldAccess::ReadOnly)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub access: FieldAccess,
    pub name: Ident,
    pub ty: Spanned<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: Ident,
    pub params: Vec<Spanned<Param>>,
    pub return_type: Option<Spanned<Type>>,
    /// `None` for a body-less declaration (`def f(x: T) -> R: ...`).
    pub body: Option<Vec<Spanned<Statement>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: Spanned<Type>,
    pub default: Option<Spanned<Expr>>,
}

// ============================================================================
// Types
// ============================================================================

/// A written type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// `str`, `User`, `app::entities::User`
    Named(Vec<Ident>),
    /// `List[int]`, `Pair[str, app::Thing]`
    Generic(Vec<Ident>, Vec<Spanned<Type>>),
}

impl Type {
    /// The path segments of the named type.
    pub fn path(&self) -> &[Ident] {
        match self {
            Type::Named(path) | Type::Generic(path, _) => path,
        }
    }

    /// Generic arguments as written (empty for non-generic types).
    pub fn args(&self) -> &[Spanned<Type>] {
        match self {
            Type::Named(_) => &[],
            Type::Generic(_, args) => args,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let a = e, b: T = e`
    Let(LetStmt),
    /// `x = e`
    Assign(AssignStmt),
    Expr(Spanned<Expr>),
    If(IfStmt),
    While(WhileStmt),
    Return(Option<Spanned<Expr>>),
    Pass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub bindings: Vec<Binding>,
}

/// One declarator of a `let` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Spanned<Ident>,
    pub ty: Option<Spanned<Type>>,
    pub value: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: Spanned<Ident>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Spanned<Expr>,
    pub then_body: Vec<Spanned<Statement>>,
    pub elif_branches: Vec<(Spanned<Expr>, Vec<Spanned<Statement>>)>,
    pub else_body: Option<Vec<Spanned<Statement>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Spanned<Expr>,
    pub body: Vec<Spanned<Statement>>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    Literal(Literal),
    /// `a.b`
    Field(Box<Spanned<Expr>>, Ident),
    /// `a.b(args)`
    MethodCall(Box<Spanned<Expr>>, Ident, Vec<Spanned<Expr>>),
    /// `f(args)`
    Call(Box<Spanned<Expr>>, Vec<Spanned<Expr>>),
    /// `then if condition else otherwise`
    If(IfExpr),
    Binary(Box<Spanned<Expr>>, BinaryOp, Box<Spanned<Expr>>),
    Unary(UnaryOp, Box<Spanned<Expr>>),
    /// `new T(name = value, ...)`
    New(NewExpr),
    Paren(Box<Spanned<Expr>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub condition: Box<Spanned<Expr>>,
    pub then_branch: Box<Spanned<Expr>>,
    pub else_branch: Box<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub ty: Spanned<Type>,
    pub args: Vec<NewArg>,
}

/// An entry of an object-construction argument list.
///
/// Only named entries (`name = value`) initialize properties; positional entries are kept so later passes can
/// ignore them explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArg {
    pub name: Option<Spanned<Ident>>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    /// Comparison and logical operators always produce `bool`.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
                | BinaryOp::And
                | BinaryOp::Or
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        f.write_str(s)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("not "),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().join("::"))?;
        if let Type::Generic(_, args) = self {
            write!(f, "[")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg.node)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x:?}"),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Bool(true) => f.write_str("true"),
            Literal::Bool(false) => f.write_str("false"),
            Literal::None => f.write_str("none"),
        }
    }
}

/// Render an operand, parenthesizing compound expressions so the output re-parses to the same tree.
fn fmt_operand(expr: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match expr {
        Expr::Binary(..) | Expr::If(_) | Expr::Unary(..) => write!(f, "({expr})"),
        _ => write!(f, "{expr}"),
    }
}

fn fmt_args(args: &[Spanned<Expr>], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg.node)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => f.write_str(name),
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Field(base, name) => {
                fmt_operand(&base.node, f)?;
                write!(f, ".{name}")
            }
            Expr::MethodCall(base, name, args) => {
                fmt_operand(&base.node, f)?;
                write!(f, ".{name}(")?;
                fmt_args(args, f)?;
                write!(f, ")")
            }
            Expr::Call(callee, args) => {
                fmt_operand(&callee.node, f)?;
                write!(f, "(")?;
                fmt_args(args, f)?;
                write!(f, ")")
            }
            Expr::If(ife) => {
                fmt_operand(&ife.then_branch.node, f)?;
                write!(f, " if ")?;
                fmt_operand(&ife.condition.node, f)?;
                write!(f, " else ")?;
                fmt_operand(&ife.else_branch.node, f)
            }
            Expr::Binary(lhs, op, rhs) => {
                fmt_operand(&lhs.node, f)?;
                write!(f, " {op} ")?;
                fmt_operand(&rhs.node, f)
            }
            Expr::Unary(op, operand) => {
                write!(f, "{op}")?;
                fmt_operand(&operand.node, f)
            }
            Expr::New(new) => {
                write!(f, "new {}(", new.ty.node)?;
                for (i, arg) in new.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match &arg.name {
                        Some(name) => write!(f, "{} = {}", name.node, arg.value.node)?,
                        None => write!(f, "{}", arg.value.node)?,
                    }
                }
                write!(f, ")")
            }
            Expr::Paren(inner) => write!(f, "({})", inner.node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp<T>(node: T) -> Spanned<T> {
        Spanned::new(node, Span::default())
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(4, 9);
        let b = Span::new(1, 6);
        assert_eq!(a.merge(b), Span::new(1, 9));
    }

    #[test]
    fn test_display_nested_conditional() {
        let expr = Expr::If(IfExpr {
            condition: Box::new(sp(Expr::Ident("show".into()))),
            then_branch: Box::new(sp(Expr::Ident("name".into()))),
            else_branch: Box::new(sp(Expr::Field(
                Box::new(sp(Expr::Ident("user".into()))),
                "username".into(),
            ))),
        });
        assert_eq!(expr.to_string(), "name if show else user.username");
    }

    #[test]
    fn test_display_generic_type() {
        let ty = Type::Generic(vec!["List".into()], vec![sp(Type::Named(vec!["app".into(), "Tag".into()]))]);
        assert_eq!(ty.to_string(), "List[app::Tag]");
    }

    #[test]
    fn test_import_bound_name() {
        let import = ImportDecl {
            path: vec!["app".into(), "User".into()],
            kind: ImportKind::Item { alias: None },
        };
        assert_eq!(import.bound_name(), Some("User"));
        let aliased = ImportDecl {
            path: vec!["app".into(), "User".into()],
            kind: ImportKind::Item { alias: Some("U".into()) },
        };
        assert_eq!(aliased.bound_name(), Some("U"));
    }
}
