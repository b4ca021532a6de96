//! Translatable expression trees.
//!
//! An [`Expr`] is pure data: no closures, no statements. That is what lets a [`crate::Query`] hand a pipeline of
//! [`Lambda`]s to a provider for translation instead of executing opaque code.
//!
//! ## Notes
//! - Rewriting is a pure tree-to-tree transform ([`Expr::rewrite_parameters`]); the input tree is never mutated.
//! - The `Display` form is the stable textual "translation" of a tree and is what snapshots compare.

use std::fmt;

use mapforge_core::lang::builtins::{self, BuiltinMethodId};

use crate::value::Value;

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
    /// Variant name as spelled in Rust paths.
    pub fn variant_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::Mul => "Mul",
            BinaryOp::Div => "Div",
            BinaryOp::Mod => "Mod",
            BinaryOp::Eq => "Eq",
            BinaryOp::NotEq => "NotEq",
            BinaryOp::Lt => "Lt",
            BinaryOp::LtEq => "LtEq",
            BinaryOp::Gt => "Gt",
            BinaryOp::GtEq => "GtEq",
            BinaryOp::And => "And",
            BinaryOp::Or => "Or",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
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
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn variant_name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "Neg",
            UnaryOp::Not => "Not",
        }
    }
}

/// A node of a translatable expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Value),
    /// A free name, bound by the enclosing [`Lambda`] or evaluation scope.
    Parameter(String),
    Member(Box<Expr>, String),
    /// Builtin method call on a receiver.
    Call(Box<Expr>, BuiltinMethodId, Vec<Expr>),
    /// `test ? then : otherwise`
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    /// Record construction with ordered member bindings.
    MemberInit(String, Vec<(String, Expr)>),
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Expr::Parameter(name.into())
    }

    pub fn member(self, name: impl Into<String>) -> Self {
        Expr::Member(Box::new(self), name.into())
    }

    pub fn call(self, method: BuiltinMethodId, args: Vec<Expr>) -> Self {
        Expr::Call(Box::new(self), method, args)
    }

    pub fn conditional(test: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Conditional(Box::new(test), Box::new(then), Box::new(otherwise))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn member_init(type_name: impl Into<String>, bindings: Vec<(String, Expr)>) -> Self {
        Expr::MemberInit(type_name.into(), bindings)
    }

    /// Produce a new tree where every [`Expr::Parameter`] for which `replace` returns `Some` is substituted.
    pub fn rewrite_parameters(&self, replace: &impl Fn(&str) -> Option<Expr>) -> Expr {
        match self {
            Expr::Constant(v) => Expr::Constant(v.clone()),
            Expr::Parameter(name) => replace(name).unwrap_or_else(|| Expr::Parameter(name.clone())),
            Expr::Member(base, name) => Expr::Member(Box::new(base.rewrite_parameters(replace)), name.clone()),
            Expr::Call(recv, method, args) => Expr::Call(
                Box::new(recv.rewrite_parameters(replace)),
                *method,
                args.iter().map(|a| a.rewrite_parameters(replace)).collect(),
            ),
            Expr::Conditional(test, then, otherwise) => Expr::conditional(
                test.rewrite_parameters(replace),
                then.rewrite_parameters(replace),
                otherwise.rewrite_parameters(replace),
            ),
            Expr::Binary(op, lhs, rhs) => {
                Expr::binary(*op, lhs.rewrite_parameters(replace), rhs.rewrite_parameters(replace))
            }
            Expr::Unary(op, operand) => Expr::unary(*op, operand.rewrite_parameters(replace)),
            Expr::MemberInit(ty, bindings) => Expr::MemberInit(
                ty.clone(),
                bindings
                    .iter()
                    .map(|(name, value)| (name.clone(), value.rewrite_parameters(replace)))
                    .collect(),
            ),
        }
    }

    /// Free parameter names in first-occurrence order, without duplicates.
    pub fn parameters(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_parameters(&mut out);
        out
    }

    fn collect_parameters<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Parameter(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Member(base, _) => base.collect_parameters(out),
            Expr::Call(recv, _, args) => {
                recv.collect_parameters(out);
                for a in args {
                    a.collect_parameters(out);
                }
            }
            Expr::Conditional(a, b, c) => {
                a.collect_parameters(out);
                b.collect_parameters(out);
                c.collect_parameters(out);
            }
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_parameters(out);
                rhs.collect_parameters(out);
            }
            Expr::Unary(_, operand) => operand.collect_parameters(out),
            Expr::MemberInit(_, bindings) => {
                for (_, value) in bindings {
                    value.collect_parameters(out);
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{v}"),
            Expr::Parameter(name) => f.write_str(name),
            Expr::Member(base, name) => write!(f, "{base}.{name}"),
            Expr::Call(recv, method, args) => {
                write!(f, "{recv}.{}(", builtins::as_str(*method))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Conditional(test, then, otherwise) => write!(f, "({test} ? {then} : {otherwise})"),
            Expr::Binary(op, lhs, rhs) => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Unary(UnaryOp::Neg, operand) => write!(f, "-{operand}"),
            Expr::Unary(UnaryOp::Not, operand) => write!(f, "!{operand}"),
            Expr::MemberInit(ty, bindings) => {
                write!(f, "new {ty} {{")?;
                for (i, (name, value)) in bindings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {name} = {value}")?;
                }
                if !bindings.is_empty() {
                    f.write_str(" ")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A one-parameter function expressed as a tree: `param => body`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub param: String,
    pub body: Expr,
}

impl Lambda {
    pub fn new(param: impl Into<String>, body: Expr) -> Self {
        Self {
            param: param.into(),
            body,
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.param, self.body)
    }
}
