//! Residual statements replayed ahead of a factory's stages.
//!
//! These never touch the source value (the analyzer guarantees it), so running them once per call with the
//! caller's arguments in scope is enough to produce the constants Stage P captures.

use std::fmt;

use crate::error::EvalError;
use crate::eval::{Scope, eval};
use crate::expr::Expr;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name[: ty] = value`. A declaration without initializer binds `none`.
    Let {
        name: String,
        ty: Option<String>,
        value: Option<Expr>,
    },
    Assign(String, Expr),
    If(Expr, Vec<Stmt>, Vec<Stmt>),
    Eval(Expr),
}

impl Stmt {
    /// Run the statement against `scope`.
    pub fn exec(&self, scope: &mut Scope) -> Result<(), EvalError> {
        match self {
            Stmt::Let { name, ty, value } => {
                let v = match value {
                    Some(e) => eval(e, scope)?,
                    None => Value::Null,
                };
                let v = match ty {
                    Some(ty) => v.coerce_to(ty),
                    None => v,
                };
                scope.bind(name.clone(), v);
                Ok(())
            }
            Stmt::Assign(name, value) => {
                let v = eval(value, scope)?;
                scope.assign(name, v)
            }
            Stmt::If(test, then, otherwise) => {
                let cond = eval(test, scope)?;
                let branch = match cond {
                    Value::Bool(true) => then,
                    Value::Bool(false) => otherwise,
                    other => {
                        return Err(EvalError::TypeMismatch {
                            context: "if condition".to_string(),
                            expected: "bool",
                            found: other.kind(),
                        });
                    }
                };
                exec_all(branch, scope)
            }
            Stmt::Eval(e) => eval(e, scope).map(|_| ()),
        }
    }
}

/// Run statements in order, stopping at the first error.
pub fn exec_all(stmts: &[Stmt], scope: &mut Scope) -> Result<(), EvalError> {
    for stmt in stmts {
        stmt.exec(scope)?;
    }
    Ok(())
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, ty, value } => {
                write!(f, "let {name}")?;
                if let Some(ty) = ty {
                    write!(f, ": {ty}")?;
                }
                if let Some(value) = value {
                    write!(f, " = {value}")?;
                }
                Ok(())
            }
            Stmt::Assign(name, value) => write!(f, "{name} = {value}"),
            Stmt::If(test, then, otherwise) => {
                write!(f, "if {test} {{")?;
                for s in then {
                    write!(f, " {s};")?;
                }
                f.write_str(" }")?;
                if !otherwise.is_empty() {
                    f.write_str(" else {")?;
                    for s in otherwise {
                        write!(f, " {s};")?;
                    }
                    f.write_str(" }")?;
                }
                Ok(())
            }
            Stmt::Eval(e) => write!(f, "{e}"),
        }
    }
}
