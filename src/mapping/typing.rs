//! Local type inference for factory variables and residual locals.
//!
//! Record shapes of the staged pipeline need a type per field. Inference is deliberately shallow: it looks at
//! literals, known names, member access on known types, builtin method return kinds, conditionals and operators,
//! and falls back to `any` for everything else.

use mapforge_core::lang::builtins::{self, MethodReturn};
use mapforge_core::lang::types::BuiltinTypeId;
use mapforge_syntax::ast::{BinaryOp, Expr, Literal, UnaryOp};

use crate::model::TypeRef;
use crate::resolve::Compilation;

/// Names in scope with their types, innermost last.
pub struct TypeEnv<'a> {
    compilation: &'a Compilation,
    module: usize,
    generics: &'a [String],
    locals: Vec<(String, TypeRef)>,
}

impl<'a> TypeEnv<'a> {
    pub fn new(compilation: &'a Compilation, module: usize, generics: &'a [String]) -> Self {
        Self {
            compilation,
            module,
            generics,
            locals: Vec::new(),
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, ty: TypeRef) {
        self.locals.push((name.into(), ty));
    }

    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.locals.iter().rev().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn infer(&self, expr: &Expr) -> TypeRef {
        match expr {
            Expr::Literal(lit) => match lit {
                Literal::Int(_) => TypeRef::builtin(BuiltinTypeId::Int),
                Literal::Float(_) => TypeRef::builtin(BuiltinTypeId::Float),
                Literal::String(_) => TypeRef::builtin(BuiltinTypeId::Str),
                Literal::Bool(_) => TypeRef::builtin(BuiltinTypeId::Bool),
                Literal::None => TypeRef::any(),
            },
            Expr::Ident(name) => self.get(name).cloned().unwrap_or_else(TypeRef::any),
            Expr::Field(base, name) => {
                let owner = self.infer(&base.node);
                self.compilation.property_type(&owner, name).unwrap_or_else(TypeRef::any)
            }
            Expr::MethodCall(receiver, name, _) => match builtins::from_str(name) {
                Some(id) => match builtins::info_for(id).returns {
                    MethodReturn::Str => TypeRef::builtin(BuiltinTypeId::Str),
                    MethodReturn::Int => TypeRef::builtin(BuiltinTypeId::Int),
                    MethodReturn::Bool => TypeRef::builtin(BuiltinTypeId::Bool),
                    MethodReturn::Receiver => self.infer(&receiver.node),
                },
                None => TypeRef::any(),
            },
            Expr::Call(..) => TypeRef::any(),
            Expr::If(ife) => join(self.infer(&ife.then_branch.node), self.infer(&ife.else_branch.node)),
            Expr::Binary(lhs, op, rhs) => {
                if op.is_boolean() {
                    return TypeRef::builtin(BuiltinTypeId::Bool);
                }
                let (l, r) = (self.infer(&lhs.node), self.infer(&rhs.node));
                if *op == BinaryOp::Add && (l.is_str() || r.is_str()) {
                    return TypeRef::builtin(BuiltinTypeId::Str);
                }
                if l.is_numeric() && r.is_numeric() {
                    join(l, r)
                } else {
                    TypeRef::any()
                }
            }
            Expr::Unary(UnaryOp::Not, _) => TypeRef::builtin(BuiltinTypeId::Bool),
            Expr::Unary(UnaryOp::Neg, operand) => self.infer(&operand.node),
            Expr::New(new) => self
                .compilation
                .resolve_type(self.module, &new.ty, self.generics, &mut Vec::new()),
            Expr::Paren(inner) => self.infer(&inner.node),
        }
    }
}

/// Common type of two branches.
fn join(a: TypeRef, b: TypeRef) -> TypeRef {
    if a == b {
        return a;
    }
    if a.is_numeric() && b.is_numeric() {
        return TypeRef::builtin(BuiltinTypeId::Float);
    }
    TypeRef::any()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::SourceModule;
    use mapforge_runtime::{CompiledProperty, CompiledType};
    use mapforge_syntax::ast::{Spanned, Statement};
    use mapforge_syntax::parser::parse_source;

    fn compilation() -> Compilation {
        let user = CompiledType {
            name: "User".to_string(),
            namespace: "app".to_string(),
            type_params: vec![],
            properties: vec![
                CompiledProperty {
                    name: "name".to_string(),
                    ty: "str".to_string(),
                    readable: true,
                    writable: true,
                },
                CompiledProperty {
                    name: "age".to_string(),
                    ty: "int".to_string(),
                    readable: true,
                    writable: true,
                },
            ],
            methods: vec![],
        };
        Compilation::new(vec![], vec![user])
    }

    /// Parse `expr` as the value of a return statement.
    fn expr(text: &str) -> Expr {
        let source = format!("class A:\n    def f(x: B) -> A:\n        return {text}\n");
        let program = parse_source(&source).unwrap();
        let (class, _) = program.classes().next().unwrap();
        let body: &[Spanned<Statement>] = class.methods[0].node.body.as_deref().unwrap();
        match &body[0].node {
            Statement::Return(Some(e)) => e.node.clone(),
            other => panic!("expected return, got {other:?}"),
        }
    }

    fn infer(text: &str) -> String {
        let compilation = compilation();
        let mut env = TypeEnv::new(&compilation, 0, &[]);
        env.bind("user", TypeRef::new("app", "User"));
        env.bind("flag", TypeRef::builtin(BuiltinTypeId::Bool));
        env.infer(&expr(text)).to_string()
    }

    #[test]
    fn test_inference_rules() {
        assert_eq!(infer("user.name.upper() if flag else user.name"), "str");
        assert_eq!(infer("user.age + 1"), "int");
        assert_eq!(infer("user.age * 1.5"), "float");
        assert_eq!(infer("user.name + user.age.to_str()"), "str");
        assert_eq!(infer("user.name.len() > 3"), "bool");
        assert_eq!(infer("not flag"), "bool");
        assert_eq!(infer("-user.age"), "int");
        assert_eq!(infer("user.age.abs()"), "int");
        assert_eq!(infer("user"), "app::User");
    }

    #[test]
    fn test_unknowns_fall_back_to_any() {
        assert_eq!(infer("user.missing"), "any");
        assert_eq!(infer("unknown"), "any");
        assert_eq!(infer("f(user)"), "any");
        assert_eq!(infer("user.name if flag else 1"), "any");
        assert_eq!(infer("none"), "any");
    }
}
