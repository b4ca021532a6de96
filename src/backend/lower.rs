//! Lower factory syntax to runtime expression trees and residual statements.
//!
//! Only constructs the translatable tree can express survive lowering. Anything else (free function calls, unknown
//! methods, positional construction arguments, names that are not bound at that point) is reported as SM0005 and
//! replaced by a `none` constant so the rest of the factory is still checked.
//!
//! ## Notes
//! - Lowering is a pure tree-to-tree transform; the input syntax is never modified.
//! - `elif` chains become nested `else` branches. `pass` disappears.

use mapforge_core::lang::builtins;
use mapforge_runtime::{BinaryOp, Expr, Stmt, UnaryOp, Value};
use mapforge_syntax::ast::{self, Literal, Spanned, Statement};

use crate::diagnostics::{FactorySite, MapDiagnostic};
use crate::resolve::Compilation;

/// Lowering state for one factory.
pub struct Lowerer<'a> {
    compilation: &'a Compilation,
    site: FactorySite<'a>,
    generics: &'a [String],
    /// Names that may be read, innermost last.
    bound: Vec<String>,
    diagnostics: Vec<MapDiagnostic>,
}

impl<'a> Lowerer<'a> {
    pub fn new(compilation: &'a Compilation, site: FactorySite<'a>, generics: &'a [String]) -> Self {
        Self {
            compilation,
            site,
            generics,
            bound: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn bind(&mut self, name: impl Into<String>) {
        self.bound.push(name.into());
    }

    /// Run `f` with extra names in scope.
    pub fn scoped<T>(&mut self, names: &[String], f: impl FnOnce(&mut Self) -> T) -> T {
        let depth = self.bound.len();
        self.bound.extend(names.iter().cloned());
        let out = f(self);
        self.bound.truncate(depth);
        out
    }

    pub fn into_diagnostics(self) -> Vec<MapDiagnostic> {
        self.diagnostics
    }

    fn reject(&mut self, expr: &Spanned<ast::Expr>, reason: &str) -> Expr {
        let diagnostic = self.site.untranslatable(&expr.node.to_string(), reason, expr.span);
        self.diagnostics.push(diagnostic);
        Expr::Constant(Value::Null)
    }

    pub fn expr(&mut self, expr: &Spanned<ast::Expr>) -> Expr {
        match &expr.node {
            ast::Expr::Literal(lit) => Expr::Constant(literal(lit)),
            ast::Expr::Ident(name) => {
                if self.bound.iter().any(|b| b == name) {
                    Expr::param(name.clone())
                } else {
                    self.reject(expr, &format!("'{name}' is not bound here"))
                }
            }
            ast::Expr::Field(base, name) => self.expr(base).member(name.clone()),
            ast::Expr::MethodCall(receiver, name, args) => {
                let Some(id) = builtins::from_str(name) else {
                    return self.reject(expr, &format!("'{name}' is not a builtin method"));
                };
                let arity = builtins::info_for(id).arity;
                if args.len() != arity {
                    return self.reject(
                        expr,
                        &format!("'{name}' takes {arity} argument(s), found {}", args.len()),
                    );
                }
                let receiver = self.expr(receiver);
                let args = args.iter().map(|a| self.expr(a)).collect();
                receiver.call(id, args)
            }
            ast::Expr::Call(..) => self.reject(expr, "only builtin methods can be called"),
            ast::Expr::If(ife) => {
                let test = self.expr(&ife.condition);
                let then = self.expr(&ife.then_branch);
                let otherwise = self.expr(&ife.else_branch);
                Expr::conditional(test, then, otherwise)
            }
            ast::Expr::Binary(lhs, op, rhs) => {
                let lhs = self.expr(lhs);
                let rhs = self.expr(rhs);
                Expr::binary(binary_op(*op), lhs, rhs)
            }
            ast::Expr::Unary(op, operand) => {
                let operand = self.expr(operand);
                let op = match op {
                    ast::UnaryOp::Neg => UnaryOp::Neg,
                    ast::UnaryOp::Not => UnaryOp::Not,
                };
                Expr::unary(op, operand)
            }
            ast::Expr::New(new) => {
                if new.args.iter().any(|a| a.name.is_none()) {
                    return self.reject(expr, "construction arguments must be named");
                }
                let ty = self
                    .compilation
                    .resolve_type(self.site.module, &new.ty, self.generics, &mut Vec::new());
                let bindings = new
                    .args
                    .iter()
                    .filter_map(|a| a.name.as_ref().map(|n| (n.node.clone(), &a.value)))
                    .map(|(name, value)| (name, self.expr(value)))
                    .collect();
                Expr::member_init(ty.qualified_name(), bindings)
            }
            ast::Expr::Paren(inner) => self.expr(inner),
        }
    }

    /// Lower a statement list. Names declared by `let` stay bound for the following statements.
    pub fn block(&mut self, body: &[Spanned<Statement>]) -> Vec<Stmt> {
        let mut out = Vec::new();
        for stmt in body {
            self.stmt(stmt, &mut out);
        }
        out
    }

    fn stmt(&mut self, stmt: &Spanned<Statement>, out: &mut Vec<Stmt>) {
        match &stmt.node {
            Statement::Let(let_stmt) => {
                for binding in &let_stmt.bindings {
                    let value = binding.value.as_ref().map(|v| self.expr(v));
                    let ty = binding.ty.as_ref().map(|t| {
                        self.compilation
                            .resolve_type(self.site.module, t, self.generics, &mut Vec::new())
                            .to_string()
                    });
                    self.bind(binding.name.node.clone());
                    out.push(Stmt::Let {
                        name: binding.name.node.clone(),
                        ty,
                        value,
                    });
                }
            }
            Statement::Assign(assign) => {
                if !self.bound.iter().any(|b| *b == assign.target.node) {
                    let diagnostic = self.site.untranslatable(
                        &assign.target.node,
                        &format!("'{}' is not bound here", assign.target.node),
                        assign.target.span,
                    );
                    self.diagnostics.push(diagnostic);
                    return;
                }
                let value = self.expr(&assign.value);
                out.push(Stmt::Assign(assign.target.node.clone(), value));
            }
            Statement::Expr(expr) => {
                let expr = self.expr(expr);
                out.push(Stmt::Eval(expr));
            }
            Statement::If(if_stmt) => {
                let test = self.expr(&if_stmt.condition);
                let then = self.scoped(&[], |l| l.block(&if_stmt.then_body));
                let mut otherwise = match &if_stmt.else_body {
                    Some(body) => self.scoped(&[], |l| l.block(body)),
                    None => Vec::new(),
                };
                for (condition, body) in if_stmt.elif_branches.iter().rev() {
                    let test = self.expr(condition);
                    let branch = self.scoped(&[], |l| l.block(body));
                    otherwise = vec![Stmt::If(test, branch, otherwise)];
                }
                out.push(Stmt::If(test, then, otherwise));
            }
            Statement::While(_) => {
                let diagnostic = self.site.unsupported_control_flow("'while' loops cannot be staged", stmt.span);
                self.diagnostics.push(diagnostic);
            }
            Statement::Return(_) => {
                let diagnostic = self
                    .site
                    .unsupported_control_flow("'return' is only allowed as the final statement", stmt.span);
                self.diagnostics.push(diagnostic);
            }
            Statement::Pass => {}
        }
    }
}

pub fn literal(lit: &Literal) -> Value {
    match lit {
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(x) => Value::Float(*x),
        Literal::String(s) => Value::Str(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::None => Value::Null,
    }
}

fn binary_op(op: ast::BinaryOp) -> BinaryOp {
    match op {
        ast::BinaryOp::Add => BinaryOp::Add,
        ast::BinaryOp::Sub => BinaryOp::Sub,
        ast::BinaryOp::Mul => BinaryOp::Mul,
        ast::BinaryOp::Div => BinaryOp::Div,
        ast::BinaryOp::Mod => BinaryOp::Mod,
        ast::BinaryOp::Eq => BinaryOp::Eq,
        ast::BinaryOp::NotEq => BinaryOp::NotEq,
        ast::BinaryOp::Lt => BinaryOp::Lt,
        ast::BinaryOp::LtEq => BinaryOp::LtEq,
        ast::BinaryOp::Gt => BinaryOp::Gt,
        ast::BinaryOp::GtEq => BinaryOp::GtEq,
        ast::BinaryOp::And => BinaryOp::And,
        ast::BinaryOp::Or => BinaryOp::Or,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapforge_syntax::parser::parse_source;

    const SITE: FactorySite<'static> = FactorySite {
        target: "A",
        method: "map",
        module: 0,
    };

    fn body(statements: &str) -> Vec<Spanned<Statement>> {
        let source = format!("class A:\n    def map(x: B) -> A:\n{statements}");
        let program = parse_source(&source).unwrap();
        let (class, _) = program.classes().next().unwrap();
        class.methods[0].node.body.clone().unwrap()
    }

    fn lower_return(text: &str, bound: &[&str]) -> (String, Vec<String>) {
        let stmts = body(&format!("        return {text}\n"));
        let Statement::Return(Some(expr)) = &stmts[0].node else {
            panic!("expected return");
        };
        let compilation = Compilation::new(vec![], vec![]);
        let mut lowerer = Lowerer::new(&compilation, SITE, &[]);
        for name in bound {
            lowerer.bind(*name);
        }
        let lowered = lowerer.expr(expr);
        let messages = lowerer.into_diagnostics().into_iter().map(|d| d.to_string()).collect();
        (lowered.to_string(), messages)
    }

    #[test]
    fn test_translatable_expressions() {
        let (expr, errors) = lower_return("user.name.upper() if flag else user.username + \"!\"", &["user", "flag"]);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(expr, "(flag ? user.name.upper() : (user.username + \"!\"))");
        let (expr, _) = lower_return("not (a.len() > 2)", &["a"]);
        assert_eq!(expr, "!(a.len() > 2)");
    }

    #[test]
    fn test_untranslatable_expressions() {
        let (_, errors) = lower_return("f(user)", &["user", "f"]);
        assert_eq!(
            errors,
            vec!["SM0005: Expression 'f(user)' in method 'A.map' cannot be translated: only builtin methods can be called"]
        );
        let (_, errors) = lower_return("user.shout()", &["user"]);
        assert!(errors[0].contains("'shout' is not a builtin method"));
        let (_, errors) = lower_return("user.replace(\"a\")", &["user"]);
        assert!(errors[0].contains("takes 2 argument(s), found 1"));
        let (_, errors) = lower_return("missing + 1", &[]);
        assert!(errors[0].contains("'missing' is not bound here"));
    }

    #[test]
    fn test_nested_construction_is_member_init() {
        let (expr, errors) = lower_return("new Address(street = user.street)", &["user"]);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(expr, "new Address { street = user.street }");
        let (_, errors) = lower_return("new Address(user.street)", &["user"]);
        assert!(errors[0].contains("construction arguments must be named"));
    }

    #[test]
    fn test_statements_with_elif_chain() {
        let stmts = body(
            "        let s: str = \"\"\n        if n > 1:\n            s = \"many\"\n        elif n == 1:\n            s = \"one\"\n        else:\n            pass\n        return new A()\n",
        );
        let compilation = Compilation::new(vec![], vec![]);
        let mut lowerer = Lowerer::new(&compilation, SITE, &[]);
        lowerer.bind("n");
        let lowered = lowerer.block(&stmts[..2]);
        assert!(lowerer.into_diagnostics().is_empty());
        assert_eq!(lowered.len(), 2);
        assert!(matches!(&lowered[0], Stmt::Let { ty: Some(ty), .. } if ty == "str"));
        let Stmt::If(_, then, otherwise) = &lowered[1] else {
            panic!("expected if");
        };
        assert_eq!(then.len(), 1);
        assert!(matches!(&otherwise[..], [Stmt::If(_, _, rest)] if rest.is_empty()));
    }
}
